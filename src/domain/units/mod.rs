//! Unit value objects shared by config and the pipeline

mod byte_size;
mod duration;

pub use byte_size::ByteSize;
pub use duration::Duration;
