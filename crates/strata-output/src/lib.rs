//! Strata Output
//!
//! Writers that turn a resource document sequence into bytes.
//!
//! # Core Concepts
//!
//! - [`OutputFormat`] / [`FormatWriter`]: one writer selected by a format
//!   specifier such as `yaml`, `json`, `env` or `columns=.metadata.name`
//! - [`YamlWriter`], [`JsonWriter`], [`TemplateWriter`], [`EnvWriter`]: the
//!   individual formats
//! - [`GroupWriter`]: regroups documents (by origin file by default) and
//!   writes each group to its own sink
//! - [`RestoreWhitespace`]: re-inserts blank lines lost while parsing
//! - [`OutputOptions`]: serializable writer configuration
//!
//! # Example
//!
//! ```rust
//! use strata_output::{FormatWriter, OutputOptions};
//! use strata_pipeline::{ByteReader, Pipeline};
//!
//! let options = OutputOptions::new("columns=.kind,.metadata.name");
//! let writer = FormatWriter::from_options(&options, Vec::new()).unwrap();
//! let mut pipeline = Pipeline::new()
//!     .with_input(ByteReader::new("kind: ConfigMap\nmetadata:\n  name: app\n"))
//!     .with_output(writer);
//! pipeline.execute().unwrap();
//! ```

mod env_writer;
mod error;
mod format;
mod group_writer;
mod json_writer;
mod options;
mod quote;
mod selector;
mod template_writer;
mod whitespace;
mod yaml_writer;

pub use env_writer::{EnvWriter, Shell};
pub use error::{OutputError, OutputResult};
pub use format::{columns_template, FormatWriter, OutputFormat, NAME_TEMPLATE};
pub use group_writer::{
    compare_ordinals, ClassifyError, FileAnnotationClassifier, FileSinkFactory, GroupClassifier,
    GroupKey, GroupWriter, SinkFactory,
};
pub use json_writer::{JsonWriter, Wrapping};
pub use options::OutputOptions;
pub use quote::quote;
pub use selector::{LabelSelector, Requirement, SelectorError};
pub use template_writer::{TemplateFunction, TemplateFunctions, TemplateWriter};
pub use whitespace::{restore_vertical_whitespace, RestoreWhitespace};
pub use yaml_writer::YamlWriter;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strata_document::yaml;
    use strata_pipeline::{ByteReader, Pipeline};
    use strata_test_utils::SharedBuffer;

    const MANIFEST: &str = "\
kind: ConfigMap
metadata:
  name: app

# settings
data:
  LOG_LEVEL: debug
";

    #[test]
    fn yaml_round_trip_keeps_blank_lines() {
        let mut documents = yaml::parse_documents(MANIFEST).unwrap();
        let mut writer = FormatWriter::new(OutputFormat::Yaml, Vec::new()).with_restore_vertical_whitespace(true);
        writer.write_documents(&mut documents).unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), MANIFEST);
    }

    #[test]
    fn blank_lines_are_lost_without_restoration() {
        let mut documents = yaml::parse_documents(MANIFEST).unwrap();
        let mut writer = FormatWriter::new(OutputFormat::Yaml, Vec::new());
        writer.write_documents(&mut documents).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert!(text.contains("  name: app\n# settings\n"));
    }

    #[test]
    fn pipeline_into_format_writer() {
        let sink = SharedBuffer::new();
        let options = OutputOptions::new("name");
        let mut pipeline = Pipeline::new()
            .with_input(ByteReader::new(MANIFEST))
            .with_output(FormatWriter::from_options(&options, sink.clone()).unwrap());
        pipeline.execute().unwrap();
        assert_eq!(sink.contents(), "configmap/app\n");
    }
}
