//! Audio library adapter

mod resolver;

pub use resolver::{LibraryEntity, LibraryResolver};
