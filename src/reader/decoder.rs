use std::borrow::Cow;
use std::io;
use std::io::prelude::*;
use std::iter::FusedIterator;

use enum_primitive::FromPrimitive;
use log::{debug, warn};
use thiserror::Error;

use crate::frames::Frames;
use crate::traits::{HasParameters, Parameter};
use crate::types::{
    table_entries, ApplicationExtension, Block, Comment, DisposalMethod, Extension,
    GraphicControl, Header, ImageBlock, LoopExtension, PlainText, UnknownExtension,
    LOOP_IDENTIFIER,
};

use super::bits::FlagBits;
use super::blocks::{read_color_table, read_sub_blocks};
use super::cursor::ByteCursor;
use super::interlace::deinterlace;
use super::lzw::LzwDecoder;

/// Expected value of the first three bytes
pub const SIGNATURE: &str = "GIF";

/// Errors that end a parse
#[derive(Debug, Error)]
pub enum DecodingError {
    /// Attempted to read past the end of the data
    #[error("attempted to read past end of stream at offset {offset}")]
    OutOfBounds { offset: usize },
    /// Malformed GIF data
    #[error("{0}")]
    Format(&'static str),
    #[error("unknown block 0x{sentinel:02x} at offset {offset}")]
    UnknownBlock { sentinel: u8, offset: usize },
    /// A code beyond the next free dictionary slot
    #[error("invalid LZW code {code}, next free index is {next}")]
    InvalidCode { code: u16, next: usize },
    /// A buffer would grow past the configured [`MemoryLimit`]
    #[error("memory limit of {limit} bytes exceeded")]
    LimitsExceeded { limit: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Upper bound in bytes for a single pixel plane or extension payload
///
/// `None`, the default, does not limit anything. LZW decoding of an image
/// stops at `width * height` bytes either way.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MemoryLimit(pub Option<usize>);

impl<'a> Parameter<Decoder<'a>> for MemoryLimit {
    fn set_param(self, this: &mut Decoder<'a>) {
        this.memory_limit = self
    }
}

/// Indicates the progress of decoding
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Nothing read yet
    Start,
    /// Header done, next byte starts a block
    BlockStart,
    /// Trailer reached
    Trailer,
    /// Stopped at an error
    Failed,
}

/// A fully parsed block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Header(Header),
    GraphicControl(GraphicControl),
    Comment(Comment),
    PlainText(PlainText),
    Application(ApplicationExtension),
    Loop(LoopExtension),
    Image(ImageBlock),
    UnknownExtension(UnknownExtension),
    Trailer,
}

/// GIF decoder that parses one block per call
///
/// The header is the first block. Every call to [`next_block`](Decoder::next_block),
/// or to `next` of the `Iterator` impl, parses exactly one block and returns it
/// completely; nothing is suspended half way through a block, so a huge image
/// is decoded within a single call. After the trailer or the first error no
/// further blocks are produced.
#[derive(Debug)]
pub struct Decoder<'a> {
    cursor: ByteCursor<'a>,
    progress: Progress,
    memory_limit: MemoryLimit,
}

impl<'a> HasParameters for Decoder<'a> {}

impl<'a> Decoder<'a> {
    pub fn new<D: Into<Cow<'a, [u8]>>>(data: D) -> Decoder<'a> {
        Decoder {
            cursor: ByteCursor::new(data),
            progress: Progress::Start,
            memory_limit: MemoryLimit::default(),
        }
    }

    /// Reads all of `reader` into memory and decodes from there
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Decoder<'static>, DecodingError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Decoder::new(data))
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Offset of the next unread byte
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Pairs images with their graphic control extensions
    pub fn into_frames(self) -> Frames<'a> {
        Frames::new(self)
    }

    /// Parses the next block. Returns `Ok(None)` once the trailer was returned
    /// or after an error.
    pub fn next_block(&mut self) -> Result<Option<Decoded>, DecodingError> {
        let result = match self.progress {
            Progress::Start => self.read_header().map(Decoded::Header),
            Progress::BlockStart => self.read_block(),
            Progress::Trailer | Progress::Failed => return Ok(None),
        };
        match result {
            Ok(block) => {
                self.progress = match block {
                    Decoded::Trailer => Progress::Trailer,
                    _ => Progress::BlockStart,
                };
                Ok(Some(block))
            }
            Err(err) => {
                self.progress = Progress::Failed;
                Err(err)
            }
        }
    }

    fn read_header(&mut self) -> Result<Header, DecodingError> {
        let signature = self.cursor.read_string(3)?;
        if signature != SIGNATURE {
            return Err(DecodingError::Format("not a GIF file"));
        }
        let version = self.cursor.read_string(3)?;
        let width = self.cursor.read_u16_le()?;
        let height = self.cursor.read_u16_le()?;

        let mut flags = FlagBits::new(self.cursor.read_byte()?);
        let global_color_table_flag = flags.flag();
        let color_resolution = flags.uint(3);
        let sorted = flags.flag();
        let global_color_table_size = flags.uint(3);

        let background_color = self.cursor.read_byte()?;
        let pixel_aspect_ratio = self.cursor.read_byte()?;
        let global_color_table = if global_color_table_flag {
            let entries = table_entries(global_color_table_size);
            Some(read_color_table(&mut self.cursor, entries)?)
        } else {
            None
        };
        debug!(
            "GIF{} header, {}x{}, global table: {}",
            version,
            width,
            height,
            global_color_table.as_ref().map_or(0, |t| t.len())
        );
        Ok(Header {
            signature,
            version,
            width,
            height,
            global_color_table_flag,
            color_resolution,
            sorted,
            global_color_table_size,
            background_color,
            pixel_aspect_ratio,
            global_color_table,
        })
    }

    fn read_block(&mut self) -> Result<Decoded, DecodingError> {
        let offset = self.cursor.position();
        let sentinel = self.cursor.read_byte()?;
        match Block::from_u8(sentinel) {
            Some(Block::Extension) => self.read_extension(offset),
            Some(Block::Image) => self.read_image(offset).map(Decoded::Image),
            Some(Block::Trailer) => {
                debug!("trailer at {}", offset);
                if self.cursor.remaining() > 0 {
                    debug!("{} bytes after trailer", self.cursor.remaining());
                }
                Ok(Decoded::Trailer)
            }
            None => Err(DecodingError::UnknownBlock { sentinel, offset }),
        }
    }

    fn read_extension(&mut self, offset: usize) -> Result<Decoded, DecodingError> {
        let label = self.cursor.read_byte()?;
        let limit = self.memory_limit.0;
        let block = match Extension::from_u8(label) {
            Some(Extension::Control) => Decoded::GraphicControl(self.read_control()?),
            Some(Extension::Comment) => Decoded::Comment(Comment {
                data: read_sub_blocks(&mut self.cursor, limit)?,
            }),
            Some(Extension::Text) => {
                let _block_size = self.cursor.read_byte()?;
                let header = self.cursor.read_array::<12>()?;
                Decoded::PlainText(PlainText {
                    header,
                    data: read_sub_blocks(&mut self.cursor, limit)?,
                })
            }
            Some(Extension::Application) => self.read_application()?,
            None => Decoded::UnknownExtension(UnknownExtension {
                label,
                data: read_sub_blocks(&mut self.cursor, limit)?,
            }),
        };
        debug!("extension 0x{:02x} at {}", label, offset);
        Ok(block)
    }

    fn read_control(&mut self) -> Result<GraphicControl, DecodingError> {
        let _block_size = self.cursor.read_byte()?;
        let mut flags = FlagBits::new(self.cursor.read_byte()?);
        let reserved = flags.uint(3);
        let disposal = flags.uint(3);
        let user_input = flags.flag();
        let transparency_given = flags.flag();
        let dispose = DisposalMethod::from_u8(disposal).unwrap_or_else(|| {
            debug!("unknown disposal method {}", disposal);
            DisposalMethod::Any
        });

        let delay = self.cursor.read_u16_le()?;
        let transparent_index = self.cursor.read_byte()?;
        let terminator = self.cursor.read_byte()?;
        if terminator != 0 {
            warn!("graphic control extension terminator is {}", terminator);
        }
        Ok(GraphicControl {
            reserved,
            dispose,
            user_input,
            transparency_given,
            delay,
            transparent_index,
            terminator,
        })
    }

    fn read_application(&mut self) -> Result<Decoded, DecodingError> {
        let _block_size = self.cursor.read_byte()?;
        let identifier = self.cursor.read_string(8)?;
        let auth_code = self.cursor.read_string(3)?;
        if identifier == LOOP_IDENTIFIER {
            let _block_size = self.cursor.read_byte()?;
            let unknown = self.cursor.read_byte()?;
            let iterations = self.cursor.read_u16_le()?;
            let terminator = self.cursor.read_byte()?;
            Ok(Decoded::Loop(LoopExtension {
                auth_code,
                unknown,
                iterations,
                terminator,
            }))
        } else {
            let data = read_sub_blocks(&mut self.cursor, self.memory_limit.0)?;
            Ok(Decoded::Application(ApplicationExtension {
                identifier,
                auth_code,
                data,
            }))
        }
    }

    fn read_image(&mut self, offset: usize) -> Result<ImageBlock, DecodingError> {
        let left = self.cursor.read_u16_le()?;
        let top = self.cursor.read_u16_le()?;
        let width = self.cursor.read_u16_le()?;
        let height = self.cursor.read_u16_le()?;

        let mut flags = FlagBits::new(self.cursor.read_byte()?);
        let local_color_table_flag = flags.flag();
        let interlaced = flags.flag();
        let sorted = flags.flag();
        let reserved = flags.uint(2);
        let local_color_table_size = flags.uint(3);

        let local_color_table = if local_color_table_flag {
            let entries = table_entries(local_color_table_size);
            Some(read_color_table(&mut self.cursor, entries)?)
        } else {
            None
        };

        let lzw_min_code_size = self.cursor.read_byte()?;
        let limit = self.memory_limit.0;
        let expected = usize::from(width) * usize::from(height);
        if let Some(limit) = limit {
            if expected > limit {
                return Err(DecodingError::LimitsExceeded { limit });
            }
        }
        let data = read_sub_blocks(&mut self.cursor, limit)?;
        let mut pixels = LzwDecoder::new(lzw_min_code_size)?
            .with_limit(limit)
            .stop_after(Some(expected))
            .decode(&data, expected)?;
        if pixels.len() != expected {
            warn!(
                "image at {} decoded to {} bytes, expected {}",
                offset,
                pixels.len(),
                expected
            );
            pixels.resize(expected, 0);
        }
        if interlaced {
            pixels = deinterlace(&pixels, usize::from(width));
        }
        debug!(
            "image at {}, {}x{}+{}+{}, {} bytes of LZW data{}",
            offset,
            width,
            height,
            left,
            top,
            data.len(),
            if interlaced { ", interlaced" } else { "" }
        );
        Ok(ImageBlock {
            left,
            top,
            width,
            height,
            local_color_table_flag,
            interlaced,
            sorted,
            reserved,
            local_color_table_size,
            local_color_table,
            lzw_min_code_size,
            pixels,
        })
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = Result<Decoded, DecodingError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_block().transpose()
    }
}

impl<'a> FusedIterator for Decoder<'a> {}
