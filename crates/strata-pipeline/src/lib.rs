//! Strata Pipeline
//!
//! Reader / filter / writer composition over resource documents.
//!
//! # Core Concepts
//!
//! - [`Reader`], [`Filter`], [`Writer`]: stage contracts (closures qualify)
//! - [`Pipeline`]: one run binding inputs, filters and outputs
//! - [`InMemoryPipeline`]: a writer-less pipeline that is itself a reader
//! - [`CommandReader`] / [`CommandWriter`]: external program stages
//!
//! # Example
//!
//! ```rust
//! use strata_pipeline::{ByteReader, DocumentBuffer, Pipeline};
//!
//! let mut pipeline = Pipeline::new()
//!     .with_input(ByteReader::new("kind: ConfigMap\n"))
//!     .with_output(DocumentBuffer::new());
//! pipeline.execute().unwrap();
//! ```

mod command;
mod error;
mod filters;
mod pipeline;
mod readers;
mod traits;

pub use command::{CommandReader, CommandWriter, Executor, Runtime};
pub use error::{PipelineError, PipelineResult};
pub use filters::ClearAnnotations;
pub use pipeline::{InMemoryPipeline, Pipeline};
pub use readers::{ByteReader, DocumentBuffer, FileReader};
pub use traits::{Filter, Reader, Writer};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
