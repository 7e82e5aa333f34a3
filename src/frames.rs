//! Images paired with their graphic control extensions
use std::iter::FusedIterator;

use log::debug;

use crate::reader::{Decoded, Decoder, DecodingError};
use crate::types::{DisposalMethod, GraphicControl, Header, ImageBlock, Repeat};

/// An image together with the graphic control extension preceding it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub control: Option<GraphicControl>,
    pub image: ImageBlock,
}

impl Frame {
    /// Frame delay in units of 10 ms
    pub fn delay(&self) -> u16 {
        self.control.as_ref().map_or(0, |c| c.delay)
    }

    pub fn dispose(&self) -> DisposalMethod {
        self.control.as_ref().map_or(DisposalMethod::Any, |c| c.dispose)
    }

    /// Transparent color index
    pub fn transparent(&self) -> Option<u8> {
        self.control.as_ref().and_then(|c| c.transparent())
    }

    pub fn needs_user_input(&self) -> bool {
        self.control.as_ref().map_or(false, |c| c.user_input)
    }
}

/// Iterator over the frames of a stream
///
/// Other extensions are skipped. A graphic control extension is used up by the
/// image that follows it; one that is not followed by an image is dropped at the
/// trailer.
#[derive(Debug)]
pub struct Frames<'a> {
    decoder: Decoder<'a>,
    header: Option<Header>,
    control: Option<GraphicControl>,
    repeat: Option<Repeat>,
}

impl<'a> Frames<'a> {
    pub fn new(decoder: Decoder<'a>) -> Frames<'a> {
        Frames {
            decoder,
            header: None,
            control: None,
            repeat: None,
        }
    }

    /// The header, once the first frame has been requested
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Loop count of the last loop extension seen so far
    pub fn repeat(&self) -> Option<Repeat> {
        self.repeat
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, DecodingError> {
        while let Some(block) = self.decoder.next_block()? {
            match block {
                Decoded::Header(header) => self.header = Some(header),
                Decoded::GraphicControl(control) => {
                    if self.control.is_some() {
                        debug!("graphic control extension without image replaced");
                    }
                    self.control = Some(control)
                }
                Decoded::Loop(ext) => self.repeat = Some(ext.repeat()),
                Decoded::Image(image) => {
                    return Ok(Some(Frame {
                        control: self.control.take(),
                        image,
                    }))
                }
                Decoded::Trailer => {
                    self.control = None;
                    return Ok(None);
                }
                _ => (),
            }
        }
        Ok(None)
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<Frame, DecodingError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

impl<'a> FusedIterator for Frames<'a> {}

#[cfg(test)]
mod test {
    use super::*;

    fn stream(blocks: &[&[u8]]) -> Vec<u8> {
        let mut data = b"GIF89a\x01\x00\x01\x00\x00\x00\x00".to_vec();
        for block in blocks {
            data.extend_from_slice(block);
        }
        data.push(0x3B);
        data
    }

    /// 1x1 image of index 0: clear, 0, end with 2 bit codes
    const IMAGE: &[u8] = &[0x2C, 0, 0, 0, 0, 1, 0, 1, 0, 0, 2, 2, 0x44, 0x01, 0];

    fn control(delay: u8, flags: u8) -> Vec<u8> {
        vec![0x21, 0xF9, 4, flags, delay, 0, 7, 0]
    }

    #[test]
    fn control_applies_to_next_image_only() {
        let data = stream(&[&control(5, 0b0000_1001)[..], IMAGE, IMAGE]);
        let frames: Vec<Frame> = Decoder::new(data)
            .into_frames()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].delay(), 5);
        assert_eq!(frames[0].dispose(), DisposalMethod::Background);
        assert_eq!(frames[0].transparent(), Some(7));
        assert_eq!(frames[0].image.pixels, vec![0]);
        assert_eq!(frames[1].control, None);
        assert_eq!(frames[1].delay(), 0);
        assert_eq!(frames[1].transparent(), None);
    }

    #[test]
    fn later_control_wins() {
        let data = stream(&[&control(1, 0)[..], &control(2, 0b0000_0010)[..], IMAGE]);
        let mut frames = Decoder::new(data).into_frames();
        let frame = frames.next().unwrap().unwrap();
        assert_eq!(frame.delay(), 2);
        assert!(frame.needs_user_input());
        assert!(frames.next().is_none());
    }

    #[test]
    fn header_and_loop_count() {
        let data = stream(&[&b"\x21\xFF\x0BNETSCAPE2.0\x03\x01\x02\x00\x00"[..], IMAGE]);
        let mut frames = Decoder::new(data).into_frames();
        assert!(frames.header().is_none());
        assert!(frames.next().unwrap().is_ok());
        assert_eq!(frames.header().map(|h| h.width), Some(1));
        assert_eq!(frames.repeat(), Some(Repeat::Finite(2)));
    }

    #[test]
    fn error_ends_iteration() {
        let mut data = stream(&[IMAGE]);
        let end = data.len() - 1;
        data[end] = 0x00;
        let mut frames = Decoder::new(data).into_frames();
        assert!(frames.next().unwrap().is_ok());
        assert!(matches!(
            frames.next(),
            Some(Err(DecodingError::UnknownBlock { sentinel: 0, .. }))
        ));
        assert!(frames.next().is_none());
    }
}
