mod amf0;
mod decoder;
mod encoder;

pub use amf0::{markers, Amf0Value};
pub use decoder::Amf0Decoder;
pub use encoder::Amf0Encoder;
