mod deserializer;

pub use deserializer::{SliceDeserializer, UnexpectedEof};
