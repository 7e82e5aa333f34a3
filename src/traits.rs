//! Traits used in this library
use crate::types::{
    ApplicationExtension, Comment, GraphicControl, Header, ImageBlock, LoopExtension, PlainText,
    UnknownExtension,
};

/// Configuration parameter trait
pub trait Parameter<Object> {
    fn set_param(self, object: &mut Object);
}

/// Object has parameters
pub trait HasParameters: Sized {
    fn set<T: Parameter<Self>>(&mut self, value: T) -> &mut Self {
        value.set_param(self);
        self
    }
}

/// Receives blocks in stream order, right after each one has been parsed.
///
/// Every method defaults to doing nothing, so a handler only implements
/// the blocks it cares about. Blocks are handed over by value and the decoder
/// keeps no reference to them.
///
/// A graphic control extension applies to the next image; handlers that need the
/// pairing have to remember the last one themselves (or use [`Frames`](crate::Frames)).
pub trait BlockHandler {
    fn on_header(&mut self, _header: Header) {}

    fn on_graphic_control(&mut self, _control: GraphicControl) {}

    fn on_comment(&mut self, _comment: Comment) {}

    fn on_plain_text(&mut self, _text: PlainText) {}

    /// Application extension other than the loop extension
    fn on_application(&mut self, _identifier: &str, _app: ApplicationExtension) {}

    /// `NETSCAPE` application extension
    fn on_loop(&mut self, _ext: LoopExtension) {}

    fn on_image(&mut self, _image: ImageBlock) {}

    fn on_unknown_extension(&mut self, _ext: UnknownExtension) {}

    fn on_trailer(&mut self) {}
}

impl<H: BlockHandler + ?Sized> BlockHandler for &mut H {
    fn on_header(&mut self, header: Header) {
        (**self).on_header(header)
    }

    fn on_graphic_control(&mut self, control: GraphicControl) {
        (**self).on_graphic_control(control)
    }

    fn on_comment(&mut self, comment: Comment) {
        (**self).on_comment(comment)
    }

    fn on_plain_text(&mut self, text: PlainText) {
        (**self).on_plain_text(text)
    }

    fn on_application(&mut self, identifier: &str, app: ApplicationExtension) {
        (**self).on_application(identifier, app)
    }

    fn on_loop(&mut self, ext: LoopExtension) {
        (**self).on_loop(ext)
    }

    fn on_image(&mut self, image: ImageBlock) {
        (**self).on_image(image)
    }

    fn on_unknown_extension(&mut self, ext: UnknownExtension) {
        (**self).on_unknown_extension(ext)
    }

    fn on_trailer(&mut self) {
        (**self).on_trailer()
    }
}
