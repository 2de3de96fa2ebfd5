//! JSON writer
//!
//! One compact JSON value per line (`ndjson`), or a single wrapping list
//! object when a wrapping kind is configured (`json`).

use crate::error::OutputResult;
use crate::yaml_writer::strip_annotations;
use std::io::Write;
use strata_document::{json, sort_documents, ResourceDocument};
use strata_pipeline::{PipelineResult, Writer};

/// API version and kind of the list object wrapping every document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapping {
    /// `apiVersion` of the wrapper
    pub api_version: String,
    /// `kind` of the wrapper
    pub kind: String,
}

impl Wrapping {
    /// The `v1` / `List` wrapper
    #[must_use]
    pub fn list() -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "List".to_string(),
        }
    }
}

/// Writes documents as JSON
#[derive(Debug)]
pub struct JsonWriter<W: Write> {
    out: W,
    keep_reader_annotations: bool,
    clear_annotations: Vec<String>,
    wrapping: Option<Wrapping>,
    sort: bool,
}

impl<W: Write> JsonWriter<W> {
    /// Create newline-delimited writer over a sink
    #[inline]
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            keep_reader_annotations: false,
            clear_annotations: Vec::new(),
            wrapping: None,
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

    /// Emit one wrapping object instead of one value per document
    #[inline]
    #[must_use]
    pub fn with_wrapping(mut self, wrapping: Wrapping) -> Self {
        self.wrapping = Some(wrapping);
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
    /// Sorting, annotation stripping, encoding or sink failures
    pub fn write_documents(&mut self, documents: &mut [ResourceDocument]) -> OutputResult<()> {
        if self.sort {
            sort_documents(documents)?;
        }
        strip_annotations(documents, self.keep_reader_annotations, &self.clear_annotations)?;

        match &self.wrapping {
            Some(wrapping) => {
                let list = json::wrap(&wrapping.api_version, &wrapping.kind, documents);
                self.encode(&list)?;
            }
            None => {
                for document in documents.iter() {
                    self.encode(&document.to_json())?;
                }
            }
        }
        Ok(())
    }

    fn encode(&mut self, value: &serde_json::Value) -> OutputResult<()> {
        serde_json::to_writer(&mut self.out, value)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> Writer for JsonWriter<W> {
    fn write(&mut self, documents: &mut [ResourceDocument]) -> PipelineResult<()> {
        Ok(self.write_documents(documents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use strata_document::INDEX_ANNOTATION;
    use strata_test_utils::{deployment, with_origin};

    fn lines(text: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(text)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn ndjson_one_value_per_line() {
        let mut documents = vec![deployment("a", 1), deployment("b", 2)];
        let mut writer = JsonWriter::new(Vec::new());
        writer.write_documents(&mut documents).unwrap();
        let values = lines(&writer.into_inner());
        assert_eq!(values.len(), 2);
        assert_eq!(values[1]["spec"]["replicas"], json!(2));
    }

    #[test]
    fn wrapped_list() {
        let mut documents = vec![deployment("a", 1), deployment("b", 2), deployment("c", 3)];
        let mut writer = JsonWriter::new(Vec::new()).with_wrapping(Wrapping::list());
        writer.write_documents(&mut documents).unwrap();
        let values = lines(&writer.into_inner());
        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["kind"], json!("List"));
        assert_eq!(values[0]["apiVersion"], json!("v1"));
        assert_eq!(values[0]["items"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn index_annotation_is_stripped_in_place() {
        let mut documents = vec![with_origin(deployment("a", 1), "a.yaml", "0")];
        let mut writer = JsonWriter::new(Vec::new());
        writer.write_documents(&mut documents).unwrap();
        assert_eq!(documents[0].annotation(INDEX_ANNOTATION), None);
        let values = lines(&writer.into_inner());
        assert_eq!(
            values[0]["metadata"]["annotations"],
            json!({"config.kubernetes.io/path": "a.yaml"})
        );
    }

    #[test]
    fn malformed_clear_key_aborts() {
        let mut documents = vec![deployment("a", 1)];
        let mut writer = JsonWriter::new(Vec::new()).with_clear_annotations(vec!["a b".into()]);
        assert!(writer.write_documents(&mut documents).is_err());
        assert!(writer.into_inner().is_empty());
    }
}
