//! Pipeline stage contracts
//!
//! A pipeline run reads documents from [`Reader`]s, transforms the sequence
//! through [`Filter`]s and hands it to [`Writer`]s. Closures implement all
//! three so ad-hoc stages need no named type.

use crate::error::PipelineResult;
use strata_document::ResourceDocument;

/// Source of documents
pub trait Reader {
    /// Produce the next batch of documents
    ///
    /// # Errors
    /// Any failure to obtain or decode documents
    fn read(&mut self) -> PipelineResult<Vec<ResourceDocument>>;
}

/// Transformation over the whole document sequence
pub trait Filter {
    /// Transform the sequence; the result may be shorter, longer or reordered
    ///
    /// # Errors
    /// Any failure aborts the pipeline before output
    fn apply(&mut self, documents: Vec<ResourceDocument>) -> PipelineResult<Vec<ResourceDocument>>;
}

/// Sink for the final document sequence
///
/// Writers may mutate documents in place (annotation stripping, sorting);
/// later writers in the same pipeline observe those changes.
pub trait Writer {
    /// Consume the sequence
    ///
    /// # Errors
    /// Any serialization or sink failure
    fn write(&mut self, documents: &mut [ResourceDocument]) -> PipelineResult<()>;
}

impl<F> Reader for F
where
    F: FnMut() -> PipelineResult<Vec<ResourceDocument>>,
{
    fn read(&mut self) -> PipelineResult<Vec<ResourceDocument>> {
        self()
    }
}

impl<F> Filter for F
where
    F: FnMut(Vec<ResourceDocument>) -> PipelineResult<Vec<ResourceDocument>>,
{
    fn apply(&mut self, documents: Vec<ResourceDocument>) -> PipelineResult<Vec<ResourceDocument>> {
        self(documents)
    }
}

impl<F> Writer for F
where
    F: FnMut(&mut [ResourceDocument]) -> PipelineResult<()>,
{
    fn write(&mut self, documents: &mut [ResourceDocument]) -> PipelineResult<()> {
        self(documents)
    }
}
