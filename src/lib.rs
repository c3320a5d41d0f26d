pub mod document;
pub mod error;
pub mod parser;
pub mod flatten;
pub mod codec;
pub mod host;
pub mod merge;
pub mod export;
pub mod protocol;
pub mod api;

pub use api::{export, import};
