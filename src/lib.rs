//! Block-by-block GIF decoder
//!
//! The [`Decoder`] parses the header and then one top-level block per call,
//! returning it as a [`Decoded`] record: extensions, graphic control data and
//! images whose LZW data is already expanded into a plane of palette indices.
//! Compositing frames and playback are left to the caller.
//!
//! ```no_run
//! use gif_stream::{Decoded, Decoder};
//! # fn main() -> Result<(), gif_stream::DecodingError> {
//! let data = std::fs::read("image.gif")?;
//! for block in Decoder::new(&data[..]) {
//!     if let Decoded::Image(image) = block? {
//!         println!("{}x{} at {},{}", image.width, image.height, image.left, image.top);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A [`ParseTask`] does the same for a [`BlockHandler`] and returns after
//! every block, so several streams can be stepped alternately.

#[macro_use]
extern crate enum_primitive;

mod frames;
mod reader;
mod traits;
mod types;

pub use crate::traits::{BlockHandler, HasParameters, Parameter};
pub use crate::types::{
    table_entries, ApplicationExtension, Block, ColorTable, Comment, DisposalMethod, Extension,
    GraphicControl, Header, ImageBlock, LoopExtension, PlainText, Repeat, UnknownExtension,
    LOOP_IDENTIFIER,
};

pub use crate::frames::{Frame, Frames};
pub use crate::reader::{Decoded, Decoder, DecodingError, ParseTask, Progress, Step, SIGNATURE};
/// Decoder configuration parameters
pub use crate::reader::MemoryLimit;
pub use crate::reader::{parse, ByteCursor};

/// Building blocks of the decoder
pub mod codec {
    pub use crate::reader::{
        bits_to_uint, byte_to_bits, decode_lzw, deinterlace, interlaced_rows, read_color_table,
        read_sub_blocks, LzwDecoder,
    };
}

#[cfg(test)]
#[test]
fn decode_sample() {
    use std::fs::File;
    use std::io::prelude::*;
    let mut data = vec![];
    File::open("tests/samples/interlaced.gif")
        .unwrap()
        .read_to_end(&mut data)
        .unwrap();
    let frames = Decoder::new(&*data)
        .into_frames()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(frames.len(), 1);
    let image = &frames[0].image;
    assert!(image.interlaced);
    assert_eq!((image.width, image.height), (10, 13));
    for (i, &index) in image.pixels.iter().enumerate() {
        let (x, y) = (i % 10, i / 10);
        assert_eq!(usize::from(index), (x * y) % 8);
    }
}
