//! Block records produced by the decoder
use std::borrow::Cow;

/// Identifier of the application extension that carries the loop count
pub const LOOP_IDENTIFIER: &str = "NETSCAPE";

enum_from_primitive!{
/// Known block types
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Block {
    Image = 0x2C,
    Extension = 0x21,
    Trailer = 0x3B
}
}

enum_from_primitive!{
/// Known GIF extensions
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Extension {
    Text = 0x01,
    Control = 0xF9,
    Comment = 0xFE,
    Application = 0xFF
}
}

enum_from_primitive!{
/// Disposal method
///
/// The decoder only reports it; applying it is up to whoever composites the frames.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DisposalMethod {
    Any = 0,
    Keep = 1,
    Background = 2,
    Previous = 3
}
}

impl Default for DisposalMethod {
    fn default() -> DisposalMethod {
        DisposalMethod::Any
    }
}

/// Number of entries of a color table with the given size exponent
pub fn table_entries(size_exp: u8) -> usize {
    1 << (usize::from(size_exp & 0b111) + 1)
}

/// A global or local color table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorTable {
    pub entries: Vec<[u8; 3]>,
}

impl ColorTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// RGB value of a pixel index
    pub fn get(&self, index: u8) -> Option<[u8; 3]> {
        self.entries.get(usize::from(index)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8; 3]> {
        self.entries.iter()
    }
}

/// Header and logical screen descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub signature: String,
    pub version: String,
    pub width: u16,
    pub height: u16,
    pub global_color_table_flag: bool,
    pub color_resolution: u8,
    pub sorted: bool,
    pub global_color_table_size: u8,
    pub background_color: u8,
    /// If not 0, the aspect ratio is `(pixel_aspect_ratio + 15) / 64`
    pub pixel_aspect_ratio: u8,
    pub global_color_table: Option<ColorTable>,
}

/// Graphic control extension
///
/// Applies to the image block that follows it in the stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphicControl {
    pub reserved: u8,
    pub dispose: DisposalMethod,
    pub user_input: bool,
    pub transparency_given: bool,
    /// Delay time in hundredths of a second
    pub delay: u16,
    pub transparent_index: u8,
    pub terminator: u8,
}

impl GraphicControl {
    /// Transparent color index, if transparency is enabled
    pub fn transparent(&self) -> Option<u8> {
        if self.transparency_given {
            Some(self.transparent_index)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comment {
    pub data: Vec<u8>,
}

impl Comment {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

/// Plain text extension. Only the fixed header is split out, the text is left as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlainText {
    pub header: [u8; 12],
    pub data: Vec<u8>,
}

/// Application extension with an unrecognized identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationExtension {
    pub identifier: String,
    pub auth_code: String,
    pub data: Vec<u8>,
}

/// Number of repetitions of an animation
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Repeat {
    Finite(u16),
    Infinite,
}

/// `NETSCAPE2.0` application extension
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopExtension {
    pub auth_code: String,
    pub unknown: u8,
    pub iterations: u16,
    pub terminator: u8,
}

impl LoopExtension {
    /// An iteration count of 0 loops forever
    pub fn repeat(&self) -> Repeat {
        match self.iterations {
            0 => Repeat::Infinite,
            n => Repeat::Finite(n),
        }
    }
}

/// Extension with a label this crate does not know
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownExtension {
    pub label: u8,
    pub data: Vec<u8>,
}

/// Image descriptor together with its decoded pixel indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageBlock {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub local_color_table_flag: bool,
    pub interlaced: bool,
    pub sorted: bool,
    pub reserved: u8,
    pub local_color_table_size: u8,
    pub local_color_table: Option<ColorTable>,
    pub lzw_min_code_size: u8,
    /// `width * height` palette indices in display row order
    pub pixels: Vec<u8>,
}

impl ImageBlock {
    /// The local table if present, the global one otherwise
    pub fn palette<'a>(&'a self, header: &'a Header) -> Option<&'a ColorTable> {
        self.local_color_table
            .as_ref()
            .or(header.global_color_table.as_ref())
    }
}

#[cfg(test)]
mod test {
    use enum_primitive::FromPrimitive;

    use super::*;

    #[test]
    fn block_labels() {
        assert_eq!(Block::from_u8(0x21), Some(Block::Extension));
        assert_eq!(Block::from_u8(0x2C), Some(Block::Image));
        assert_eq!(Block::from_u8(0x3B), Some(Block::Trailer));
        assert_eq!(Block::from_u8(0x00), None);
        assert_eq!(Extension::from_u8(0xF9), Some(Extension::Control));
        assert_eq!(Extension::from_u8(0x02), None);
    }

    #[test]
    fn table_sizes() {
        assert_eq!(table_entries(0), 2);
        assert_eq!(table_entries(7), 256);
    }

    #[test]
    fn loop_count() {
        let mut ext = LoopExtension::default();
        assert_eq!(ext.repeat(), Repeat::Infinite);
        ext.iterations = 3;
        assert_eq!(ext.repeat(), Repeat::Finite(3));
    }

    #[test]
    fn palette_prefers_local_table() {
        let global = ColorTable { entries: vec![[0, 0, 0], [1, 1, 1]] };
        let local = ColorTable { entries: vec![[9, 9, 9], [8, 8, 8]] };
        let header = Header {
            global_color_table: Some(global.clone()),
            ..Header::default()
        };
        let mut image = ImageBlock::default();
        assert_eq!(image.palette(&header), Some(&global));
        image.local_color_table = Some(local.clone());
        assert_eq!(image.palette(&header), Some(&local));
        assert_eq!(local.get(1), Some([8, 8, 8]));
        assert_eq!(local.get(2), None);
    }
}
