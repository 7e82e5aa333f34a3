use crate::traits::{BlockHandler, HasParameters, Parameter};

mod bits;
mod blocks;
mod cursor;
mod decoder;
mod interlace;
mod lzw;

pub use self::bits::{bits_to_uint, byte_to_bits};
pub use self::blocks::{read_color_table, read_sub_blocks};
pub use self::cursor::ByteCursor;
pub use self::decoder::{Decoded, Decoder, DecodingError, MemoryLimit, Progress, SIGNATURE};
pub use self::interlace::{deinterlace, interlaced_rows};
pub use self::lzw::{decode as decode_lzw, LzwDecoder};

impl Decoded {
    /// Hands the block to the matching handler method
    pub fn dispatch<H: BlockHandler + ?Sized>(self, handler: &mut H) {
        match self {
            Decoded::Header(header) => handler.on_header(header),
            Decoded::GraphicControl(control) => handler.on_graphic_control(control),
            Decoded::Comment(comment) => handler.on_comment(comment),
            Decoded::PlainText(text) => handler.on_plain_text(text),
            Decoded::Application(app) => {
                let identifier = app.identifier.clone();
                handler.on_application(&identifier, app)
            }
            Decoded::Loop(ext) => handler.on_loop(ext),
            Decoded::Image(image) => handler.on_image(image),
            Decoded::UnknownExtension(ext) => handler.on_unknown_extension(ext),
            Decoded::Trailer => handler.on_trailer(),
        }
    }
}

/// Outcome of one [`ParseTask::step`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step {
    /// A block was delivered; call `step` again to continue
    Yielded,
    /// The trailer was delivered, or the task had already ended
    Finished,
}

impl<'a, T, H> Parameter<ParseTask<'a, H>> for T
where
    T: Parameter<Decoder<'a>>,
{
    fn set_param(self, this: &mut ParseTask<'a, H>) {
        this.decoder.set(self);
    }
}

/// A parse that feeds a [`BlockHandler`] one block per turn.
///
/// Each `step` parses one block, calls the handler and returns, leaving it to
/// the caller to schedule the next step. Several tasks over different inputs
/// can be interleaved this way on one thread.
pub struct ParseTask<'a, H> {
    decoder: Decoder<'a>,
    handler: H,
}

impl<'a, H> HasParameters for ParseTask<'a, H> {}

impl<'a, H: BlockHandler> ParseTask<'a, H> {
    pub fn new(decoder: Decoder<'a>, handler: H) -> ParseTask<'a, H> {
        ParseTask { decoder, handler }
    }

    pub fn step(&mut self) -> Result<Step, DecodingError> {
        match self.decoder.next_block()? {
            Some(Decoded::Trailer) => {
                self.handler.on_trailer();
                Ok(Step::Finished)
            }
            Some(block) => {
                block.dispatch(&mut self.handler);
                Ok(Step::Yielded)
            }
            None => Ok(Step::Finished),
        }
    }

    /// Steps until the trailer
    pub fn run(&mut self) -> Result<(), DecodingError> {
        while self.step()? == Step::Yielded {}
        Ok(())
    }

    pub fn progress(&self) -> Progress {
        self.decoder.progress()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }
}

/// Parses `data` to the trailer, calling `handler` for every block
pub fn parse<H: BlockHandler>(data: &[u8], handler: &mut H) -> Result<(), DecodingError> {
    ParseTask::new(Decoder::new(data), handler).run()
}
