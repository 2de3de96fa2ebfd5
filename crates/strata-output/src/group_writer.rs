//! Grouping writer
//!
//! Partitions documents into groups (by default: the file they were read
//! from), orders each group by ordinal and writes every group to its own
//! sink as a YAML stream.

use crate::error::{OutputError, OutputResult};
use crate::whitespace::restore_vertical_whitespace;
use crate::yaml_writer::YamlWriter;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use strata_document::{file_annotations, ResourceDocument, INDEX_ANNOTATION, PATH_ANNOTATION};
use strata_pipeline::{PipelineResult, Writer};

/// Error returned by a classifier
pub type ClassifyError = Box<dyn std::error::Error + Send + Sync>;

/// Group and position of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GroupKey {
    /// Group name; empty means the document is discarded
    pub group: String,
    /// Position within the group
    pub ordinal: String,
}

impl GroupKey {
    /// Create key
    #[inline]
    #[must_use]
    pub fn new(group: impl Into<String>, ordinal: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            ordinal: ordinal.into(),
        }
    }
}

/// Assigns documents to groups
pub trait GroupClassifier {
    /// Compute the group key of a document
    ///
    /// # Errors
    /// Any error aborts the write before output
    fn classify(&mut self, document: &ResourceDocument) -> Result<GroupKey, ClassifyError>;
}

impl<F> GroupClassifier for F
where
    F: FnMut(&ResourceDocument) -> Result<GroupKey, ClassifyError>,
{
    fn classify(&mut self, document: &ResourceDocument) -> Result<GroupKey, ClassifyError> {
        self(document)
    }
}

/// Groups by origin path, ordered by origin index
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAnnotationClassifier;

impl GroupClassifier for FileAnnotationClassifier {
    fn classify(&mut self, document: &ResourceDocument) -> Result<GroupKey, ClassifyError> {
        let (group, ordinal) = file_annotations(document);
        Ok(GroupKey { group, ordinal })
    }
}

/// Opens the sink for a group
pub trait SinkFactory {
    /// Sink for `group`, or `None` to discard the group
    ///
    /// # Errors
    /// Any error aborts the remaining groups
    fn open(&mut self, group: &str) -> io::Result<Option<Box<dyn Write>>>;
}

impl<F> SinkFactory for F
where
    F: FnMut(&str) -> io::Result<Option<Box<dyn Write>>>,
{
    fn open(&mut self, group: &str) -> io::Result<Option<Box<dyn Write>>> {
        self(group)
    }
}

/// Creates (or truncates) the group name as a file path
#[derive(Debug, Clone, Default)]
pub struct FileSinkFactory {
    root: Option<PathBuf>,
}

impl FileSinkFactory {
    /// Create factory resolving relative names against the working directory
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative names against `root`
    #[inline]
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }
}

impl SinkFactory for FileSinkFactory {
    fn open(&mut self, group: &str) -> io::Result<Option<Box<dyn Write>>> {
        if group.is_empty() {
            return Ok(None);
        }
        let path = match &self.root {
            Some(root) => root.join(group),
            None => PathBuf::from(group),
        };
        Ok(Some(Box::new(File::create(path)?)))
    }
}

/// Ordinal order: numeric when both sides are integers, else lexicographic
#[must_use]
pub fn compare_ordinals(left: &str, right: &str) -> Ordering {
    match (left.parse::<i64>(), right.parse::<i64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r),
        _ => left.cmp(right),
    }
}

/// Stable insertion sort by ordinal
///
/// The ordinal order is not transitive across mixed numeric and textual
/// values, so it is applied pairwise rather than through `sort_by`.
fn sort_by_ordinal(entries: &mut [(String, usize)]) {
    for i in 1..entries.len() {
        let mut j = i;
        while j > 0 && compare_ordinals(&entries[j].0, &entries[j - 1].0) == Ordering::Less {
            entries.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Writes each group of documents to its own sink
pub struct GroupWriter {
    classifier: Option<Box<dyn GroupClassifier>>,
    sinks: Box<dyn SinkFactory>,
    keep_reader_annotations: bool,
    clear_annotations: Vec<String>,
    sort: bool,
    restore_vertical_whitespace: bool,
}

impl std::fmt::Debug for GroupWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupWriter")
            .field("default_classifier", &self.classifier.is_none())
            .field("keep_reader_annotations", &self.keep_reader_annotations)
            .field("clear_annotations", &self.clear_annotations)
            .field("sort", &self.sort)
            .field("restore_vertical_whitespace", &self.restore_vertical_whitespace)
            .finish_non_exhaustive()
    }
}

impl Default for GroupWriter {
    fn default() -> Self {
        Self::new(FileSinkFactory::new())
    }
}

impl GroupWriter {
    /// Create writer grouping by origin and opening sinks from `sinks`
    #[must_use]
    pub fn new(sinks: impl SinkFactory + 'static) -> Self {
        Self {
            classifier: None,
            sinks: Box::new(sinks),
            keep_reader_annotations: false,
            clear_annotations: Vec::new(),
            sort: false,
            restore_vertical_whitespace: false,
        }
    }

    /// Use a custom classifier
    #[must_use]
    pub fn with_classifier(mut self, classifier: impl GroupClassifier + 'static) -> Self {
        self.classifier = Some(Box::new(classifier));
        self
    }

    /// Keep reader annotations in the written groups
    #[inline]
    #[must_use]
    pub fn with_keep_reader_annotations(mut self, keep: bool) -> Self {
        self.keep_reader_annotations = keep;
        self
    }

    /// Strip additional annotations
    #[inline]
    #[must_use]
    pub fn with_clear_annotations(mut self, keys: Vec<String>) -> Self {
        self.clear_annotations = keys;
        self
    }

    /// Sort each group by origin before writing
    #[inline]
    #[must_use]
    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    /// Restore blank lines before partitioning
    #[inline]
    #[must_use]
    pub fn with_restore_vertical_whitespace(mut self, restore: bool) -> Self {
        self.restore_vertical_whitespace = restore;
        self
    }

    /// Partition documents into ordered groups, in first-seen group order
    fn partition(&mut self, documents: &[ResourceDocument]) -> OutputResult<IndexMap<String, Vec<usize>>> {
        let mut default = FileAnnotationClassifier;
        let classifier: &mut dyn GroupClassifier = match self.classifier.as_mut() {
            Some(classifier) => classifier.as_mut(),
            None => &mut default,
        };

        let mut groups: IndexMap<String, Vec<(String, usize)>> = IndexMap::new();
        for (position, document) in documents.iter().enumerate() {
            let key = classifier
                .classify(document)
                .map_err(|err| OutputError::classify(position, err.to_string()))?;
            groups.entry(key.group).or_default().push((key.ordinal, position));
        }

        Ok(groups
            .into_iter()
            .map(|(group, mut entries)| {
                sort_by_ordinal(&mut entries);
                (group, entries.into_iter().map(|(_, position)| position).collect())
            })
            .collect())
    }

    /// Write documents, returning output errors unconverted
    ///
    /// # Errors
    /// - `OutputError::Classify` before anything is written
    /// - `OutputError::Sink` when a sink cannot be opened
    /// - any YAML writer error for a group
    pub fn write_documents(&mut self, documents: &mut [ResourceDocument]) -> OutputResult<()> {
        let mut clear_annotations = self.clear_annotations.clone();
        if self.classifier.is_none() && !self.keep_reader_annotations {
            clear_annotations.push(PATH_ANNOTATION.to_string());
            clear_annotations.push(INDEX_ANNOTATION.to_string());
        }

        if self.restore_vertical_whitespace {
            restore_vertical_whitespace(documents);
        }
        let groups = self.partition(documents)?;

        for (group, positions) in groups {
            let Some(sink) = self
                .sinks
                .open(&group)
                .map_err(|source| OutputError::sink(group.clone(), source))?
            else {
                tracing::warn!("discarding {} documents without an output for group '{}'", positions.len(), group);
                continue;
            };

            let mut members: Vec<ResourceDocument> =
                positions.iter().map(|&i| documents[i].clone()).collect();
            let mut writer = YamlWriter::new(sink)
                .with_keep_reader_annotations(self.keep_reader_annotations)
                .with_clear_annotations(clear_annotations.clone())
                .with_sort(self.sort);
            let written = writer.write_documents(&mut members);

            let mut sink = writer.into_inner();
            let flushed = sink.flush();
            drop(sink);

            written?;
            flushed?;
            tracing::info!("wrote {} documents to '{}'", members.len(), group);
        }
        Ok(())
    }
}

impl Writer for GroupWriter {
    fn write(&mut self, documents: &mut [ResourceDocument]) -> PipelineResult<()> {
        Ok(self.write_documents(documents)?)
    }
}
