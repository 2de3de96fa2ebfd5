//! YAML codec
//!
//! Parsing keeps the source line of every node and recovers head and foot
//! comments; emitting writes them back in block style.

mod comments;
mod emitter;
mod parser;
mod resolve;

pub use emitter::{to_string, write_documents};
pub use parser::{parse_bytes, parse_documents};
