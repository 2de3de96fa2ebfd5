//! Pipeline runs
//!
//! [`Pipeline`] binds readers, filters and writers for one execution.
//! [`InMemoryPipeline`] runs the read and filter stages only and returns the
//! result from its own [`Reader`] implementation, so pipelines nest.

use crate::error::PipelineResult;
use crate::traits::{Filter, Reader, Writer};
use std::fmt;
use strata_document::ResourceDocument;

/// Read every input, then apply every filter
///
/// Returns `None` when a filter empties the sequence and
/// `continue_on_empty_result` is false.
fn run_stages(
    inputs: &mut [Box<dyn Reader>],
    filters: &mut [Box<dyn Filter>],
    continue_on_empty_result: bool,
) -> PipelineResult<Option<Vec<ResourceDocument>>> {
    let mut documents = Vec::new();
    for input in inputs.iter_mut() {
        documents.extend(input.read()?);
    }
    tracing::debug!("read {} documents from {} inputs", documents.len(), inputs.len());

    for (i, filter) in filters.iter_mut().enumerate() {
        documents = filter.apply(documents)?;
        tracing::debug!("filter {} produced {} documents", i, documents.len());
        if documents.is_empty() && !continue_on_empty_result {
            tracing::debug!("stopping pipeline on empty result");
            return Ok(None);
        }
    }
    Ok(Some(documents))
}

/// A single pipeline execution
#[derive(Default)]
pub struct Pipeline {
    /// Sources, read in order and concatenated
    pub inputs: Vec<Box<dyn Reader>>,
    /// Transformations, applied in order
    pub filters: Vec<Box<dyn Filter>>,
    /// Sinks, each invoked with the same sequence
    pub outputs: Vec<Box<dyn Writer>>,
    /// Keep going (and write) when a filter returns no documents
    pub continue_on_empty_result: bool,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("inputs", &self.inputs.len())
            .field("filters", &self.filters.len())
            .field("outputs", &self.outputs.len())
            .field("continue_on_empty_result", &self.continue_on_empty_result)
            .finish()
    }
}

impl Pipeline {
    /// Create empty pipeline
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input
    #[must_use]
    pub fn with_input(mut self, input: impl Reader + 'static) -> Self {
        self.inputs.push(Box::new(input));
        self
    }

    /// Add a filter
    #[must_use]
    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Add an output
    #[must_use]
    pub fn with_output(mut self, output: impl Writer + 'static) -> Self {
        self.outputs.push(Box::new(output));
        self
    }

    /// Set whether writers still run after a filter empties the sequence
    #[inline]
    #[must_use]
    pub fn with_continue_on_empty_result(mut self, value: bool) -> Self {
        self.continue_on_empty_result = value;
        self
    }

    /// Run the pipeline
    ///
    /// # Errors
    /// The first error from any stage; later stages do not run
    pub fn execute(&mut self) -> PipelineResult<()> {
        let Some(mut documents) =
            run_stages(&mut self.inputs, &mut self.filters, self.continue_on_empty_result)?
        else {
            return Ok(());
        };

        for output in &mut self.outputs {
            output.write(&mut documents)?;
        }
        tracing::debug!("wrote {} documents to {} outputs", documents.len(), self.outputs.len());
        Ok(())
    }
}

/// Pipeline without writers, usable as a [`Reader`]
#[derive(Default)]
pub struct InMemoryPipeline {
    /// Sources, read in order and concatenated
    pub inputs: Vec<Box<dyn Reader>>,
    /// Transformations, applied in order
    pub filters: Vec<Box<dyn Filter>>,
    /// Return the empty result instead of stopping early
    pub continue_on_empty_result: bool,
}

impl fmt::Debug for InMemoryPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryPipeline")
            .field("inputs", &self.inputs.len())
            .field("filters", &self.filters.len())
            .field("continue_on_empty_result", &self.continue_on_empty_result)
            .finish()
    }
}

impl InMemoryPipeline {
    /// Create empty pipeline
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input
    #[must_use]
    pub fn with_input(mut self, input: impl Reader + 'static) -> Self {
        self.inputs.push(Box::new(input));
        self
    }

    /// Add a filter
    #[must_use]
    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Set whether an emptied sequence is still returned as the result
    #[inline]
    #[must_use]
    pub fn with_continue_on_empty_result(mut self, value: bool) -> Self {
        self.continue_on_empty_result = value;
        self
    }
}

impl Reader for InMemoryPipeline {
    fn read(&mut self) -> PipelineResult<Vec<ResourceDocument>> {
        let documents =
            run_stages(&mut self.inputs, &mut self.filters, self.continue_on_empty_result)?;
        Ok(documents.unwrap_or_default())
    }
}
