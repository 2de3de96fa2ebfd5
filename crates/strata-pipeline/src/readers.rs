//! Built-in readers
//!
//! - [`ByteReader`]: a YAML stream held in memory
//! - [`FileReader`]: local files, annotated with their path and index
//! - [`DocumentBuffer`]: documents captured by a previous writer

use crate::error::{PipelineError, PipelineResult};
use crate::traits::{Reader, Writer};
use indexmap::IndexMap;
use std::path::PathBuf;
use strata_document::{yaml, ResourceDocument, INDEX_ANNOTATION, PATH_ANNOTATION};

/// Reads a YAML stream from a byte buffer
#[derive(Debug, Clone, Default)]
pub struct ByteReader {
    input: Vec<u8>,
    omit_reader_annotations: bool,
    set_annotations: IndexMap<String, String>,
}

impl ByteReader {
    /// Create reader over the supplied bytes
    #[inline]
    #[must_use]
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// Do not record the index annotation
    #[inline]
    #[must_use]
    pub fn with_omit_reader_annotations(mut self, omit: bool) -> Self {
        self.omit_reader_annotations = omit;
        self
    }

    /// Set an extra annotation on every document read
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_annotations.insert(key.into(), value.into());
        self
    }
}

impl Reader for ByteReader {
    fn read(&mut self) -> PipelineResult<Vec<ResourceDocument>> {
        let mut documents = yaml::parse_bytes(&self.input)?;
        for (index, document) in documents.iter_mut().enumerate() {
            if !self.omit_reader_annotations {
                document.set_annotation(INDEX_ANNOTATION, index.to_string());
            }
            for (key, value) in &self.set_annotations {
                document.set_annotation(key.clone(), value.clone());
            }
        }
        Ok(documents)
    }
}

/// Reads YAML files from the local file system
#[derive(Debug, Clone, Default)]
pub struct FileReader {
    paths: Vec<PathBuf>,
}

impl FileReader {
    /// Create reader over the supplied paths, read in order
    #[must_use]
    pub fn new<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

impl Reader for FileReader {
    fn read(&mut self) -> PipelineResult<Vec<ResourceDocument>> {
        let mut documents = Vec::new();
        for path in &self.paths {
            let bytes = std::fs::read(path).map_err(|source| PipelineError::Io {
                path: path.clone(),
                source,
            })?;
            let mut reader =
                ByteReader::new(bytes).with_annotation(PATH_ANNOTATION, path.to_string_lossy());
            let read = reader.read()?;
            tracing::debug!("read {} documents from {}", read.len(), path.display());
            documents.extend(read);
        }
        Ok(documents)
    }
}

/// In-memory document sequence
///
/// As a [`Reader`] it returns a copy of its documents; as a [`Writer`] it
/// replaces them with the sequence it is given.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuffer {
    /// Captured documents
    pub documents: Vec<ResourceDocument>,
}

impl DocumentBuffer {
    /// Create empty buffer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl From<Vec<ResourceDocument>> for DocumentBuffer {
    fn from(documents: Vec<ResourceDocument>) -> Self {
        Self { documents }
    }
}

impl Reader for DocumentBuffer {
    fn read(&mut self) -> PipelineResult<Vec<ResourceDocument>> {
        Ok(self.documents.clone())
    }
}

impl Writer for DocumentBuffer {
    fn write(&mut self, documents: &mut [ResourceDocument]) -> PipelineResult<()> {
        self.documents = documents.to_vec();
        Ok(())
    }
}
