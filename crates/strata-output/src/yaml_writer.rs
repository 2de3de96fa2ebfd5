//! YAML byte writer

use crate::error::OutputResult;
use std::io::Write;
use strata_document::{sort_documents, yaml, ResourceDocument, INDEX_ANNOTATION};
use strata_pipeline::{PipelineResult, Writer};

/// Strip the listed annotations from every document, in place
///
/// The index annotation is included unless `keep_reader_annotations`.
pub(crate) fn strip_annotations(
    documents: &mut [ResourceDocument],
    keep_reader_annotations: bool,
    clear_annotations: &[String],
) -> OutputResult<()> {
    for document in documents.iter_mut() {
        if !keep_reader_annotations {
            document.clear_annotation(INDEX_ANNOTATION)?;
        }
        for key in clear_annotations {
            document.clear_annotation(key)?;
        }
    }
    Ok(())
}

/// Writes documents as a YAML stream
#[derive(Debug)]
pub struct YamlWriter<W: Write> {
    out: W,
    keep_reader_annotations: bool,
    clear_annotations: Vec<String>,
    sort: bool,
}

impl<W: Write> YamlWriter<W> {
    /// Create writer over a sink
    #[inline]
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            keep_reader_annotations: false,
            clear_annotations: Vec::new(),
            sort: false,
        }
    }

    /// Keep the index annotation in the output
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

    /// Sort by origin before writing
    #[inline]
    #[must_use]
    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    /// Release the sink
    #[inline]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write documents, returning output errors unconverted
    ///
    /// # Errors
    /// Sorting, annotation stripping or sink failures
    pub fn write_documents(&mut self, documents: &mut [ResourceDocument]) -> OutputResult<()> {
        if self.sort {
            sort_documents(documents)?;
        }
        strip_annotations(documents, self.keep_reader_annotations, &self.clear_annotations)?;
        yaml::write_documents(&mut self.out, documents)?;
        Ok(())
    }
}

impl<W: Write> Writer for YamlWriter<W> {
    fn write(&mut self, documents: &mut [ResourceDocument]) -> PipelineResult<()> {
        Ok(self.write_documents(documents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strata_document::PATH_ANNOTATION;
    use strata_test_utils::{parse, with_origin};

    fn render(mut writer: YamlWriter<Vec<u8>>, documents: &mut [ResourceDocument]) -> String {
        writer.write_documents(documents).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn strips_index_by_default() {
        let mut documents: Vec<_> = parse("kind: A\n")
            .into_iter()
            .map(|d| with_origin(d, "a.yaml", "0"))
            .collect();
        let text = render(YamlWriter::new(Vec::new()), &mut documents);
        assert_eq!(
            text,
            "kind: A\nmetadata:\n  annotations:\n    config.kubernetes.io/path: a.yaml\n"
        );
        assert_eq!(documents[0].annotation(INDEX_ANNOTATION), None);
    }

    #[test]
    fn clears_and_keeps() {
        let mut documents: Vec<_> = parse("kind: A\n")
            .into_iter()
            .map(|d| with_origin(d, "a.yaml", "0"))
            .collect();
        let writer = YamlWriter::new(Vec::new())
            .with_keep_reader_annotations(true)
            .with_clear_annotations(vec![PATH_ANNOTATION.to_string()]);
        let text = render(writer, &mut documents);
        assert_eq!(
            text,
            "kind: A\nmetadata:\n  annotations:\n    config.kubernetes.io/index: '0'\n"
        );
    }

    #[test]
    fn sorts_by_origin() {
        let mut documents = vec![
            with_origin(parse("kind: B\n").remove(0), "a.yaml", "1"),
            with_origin(parse("kind: A\n").remove(0), "a.yaml", "0"),
        ];
        let writer = YamlWriter::new(Vec::new())
            .with_sort(true)
            .with_clear_annotations(vec![PATH_ANNOTATION.to_string()]);
        assert_eq!(render(writer, &mut documents), "kind: A\n---\nkind: B\n");
    }

    #[test]
    fn malformed_clear_key_fails() {
        let mut documents = parse("kind: A\n");
        let mut writer =
            YamlWriter::new(Vec::new()).with_clear_annotations(vec!["not valid".to_string()]);
        assert!(writer.write_documents(&mut documents).is_err());
    }
}
