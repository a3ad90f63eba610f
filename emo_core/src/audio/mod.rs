pub mod decoder;
pub mod logmel;
pub mod mel;
pub mod repeat;

pub use decoder::decode_to_mono;
pub use logmel::LogMelExtractor;
pub use repeat::repeat_to_length;
