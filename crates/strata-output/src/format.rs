//! Format-dispatching writer
//!
//! A format specifier (`<name>[=<argument>]`) is parsed once into an
//! [`OutputFormat`]; [`FormatWriter`] then delegates every write to the
//! matching writer over its sink.

use crate::env_writer::{EnvWriter, Shell};
use crate::error::{OutputError, OutputResult};
use crate::json_writer::{JsonWriter, Wrapping};
use crate::options::OutputOptions;
use crate::template_writer::{TemplateFunctions, TemplateWriter};
use crate::whitespace::restore_vertical_whitespace;
use crate::yaml_writer::YamlWriter;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use strata_document::ResourceDocument;
use strata_pipeline::{PipelineResult, Writer};

/// Template used by the `name` format
pub const NAME_TEMPLATE: &str = "{{ lower(kind) }}/{{ metadata.name }}\n";

/// Parsed output format
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// YAML stream
    #[default]
    Yaml,
    /// Single `List` object
    Json,
    /// One JSON value per line
    NdJson,
    /// Shell variable assignments
    Env,
    /// `kind/name` per document
    Name,
    /// Caller template body
    Template(String),
    /// Tab-separated table of dotted field paths
    Columns(Vec<String>),
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (name, argument) = match spec.split_once('=') {
            Some((name, argument)) => (name, argument),
            None if spec.contains("{{") => return Ok(Self::Template(spec.to_string())),
            None => (spec, ""),
        };

        match name.to_lowercase().as_str() {
            "yaml" | "" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::NdJson),
            "env" => Ok(Self::Env),
            "name" => Ok(Self::Name),
            "template" | "go-template" => Ok(Self::Template(argument.to_string())),
            "columns" | "custom-columns" => parse_columns(spec, argument).map(Self::Columns),
            _ => Err(OutputError::UnknownFormat(spec.to_string())),
        }
    }
}

/// Split a column list into field paths without the leading `.`
fn parse_columns(spec: &str, argument: &str) -> OutputResult<Vec<String>> {
    argument
        .split(',')
        .map(|column| {
            let path = column.trim().trim_start_matches('.');
            if path.is_empty() || path.split('.').any(str::is_empty) {
                return Err(OutputError::InvalidColumn {
                    spec: spec.to_string(),
                    column: column.to_string(),
                });
            }
            Ok(path.to_string())
        })
        .collect()
}

/// Table template for the `columns` format
///
/// The header row is the last segment of every path, uppercased. Cells use
/// subscript lookups so any key text is accepted.
#[must_use]
pub fn columns_template(columns: &[String]) -> String {
    let headers: Vec<String> = columns
        .iter()
        .map(|path| path.rsplit('.').next().unwrap_or(path).to_uppercase())
        .collect();
    let cells: Vec<String> = columns
        .iter()
        .map(|path| {
            let lookup: String = path
                .split('.')
                .map(|segment| format!("[{}]", serde_json::Value::from(segment)))
                .collect();
            format!("{{{{ item{lookup} }}}}")
        })
        .collect();

    format!(
        "{{% if items %}}{}\n{{% for item in items %}}{}\n{{% endfor %}}{{% else %}}No results.\n{{% endif %}}",
        headers.join("\t"),
        cells.join("\t"),
    )
}

/// Writes documents in a configurable format
pub struct FormatWriter<W: Write> {
    format: OutputFormat,
    out: W,
    keep_reader_annotations: bool,
    clear_annotations: Vec<String>,
    sort: bool,
    restore_vertical_whitespace: bool,
    functions: TemplateFunctions,
    shell: Shell,
    unset: bool,
    selector: String,
}

impl<W: Write> fmt::Debug for FormatWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatWriter")
            .field("format", &self.format)
            .field("keep_reader_annotations", &self.keep_reader_annotations)
            .field("clear_annotations", &self.clear_annotations)
            .field("sort", &self.sort)
            .field("restore_vertical_whitespace", &self.restore_vertical_whitespace)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("shell", &self.shell)
            .field("unset", &self.unset)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

impl<W: Write> FormatWriter<W> {
    /// Create writer for a parsed format
    #[must_use]
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self {
            format,
            out,
            keep_reader_annotations: false,
            clear_annotations: Vec::new(),
            sort: false,
            restore_vertical_whitespace: false,
            functions: TemplateFunctions::new(),
            shell: Shell::None,
            unset: false,
            selector: String::new(),
        }
    }

    /// Create writer from options, validating the format specifier
    ///
    /// Without a `shell` option the dialect is taken from `SHELL` here, once.
    ///
    /// # Errors
    /// `OutputError::UnknownFormat` or `OutputError::InvalidColumn`
    pub fn from_options(options: &OutputOptions, out: W) -> OutputResult<Self> {
        let format = options.format.parse()?;
        let shell = options.shell.clone().unwrap_or_else(Shell::from_env);
        Ok(Self::new(format, out)
            .with_keep_reader_annotations(options.keep_reader_annotations)
            .with_clear_annotations(options.clear_annotations.clone())
            .with_sort(options.sort)
            .with_restore_vertical_whitespace(options.restore_vertical_whitespace)
            .with_shell(shell)
            .with_unset(options.unset)
            .with_selector(options.selector.clone()))
    }

    /// Keep reader annotations (`yaml`, `json`, `ndjson`)
    #[inline]
    #[must_use]
    pub fn with_keep_reader_annotations(mut self, keep: bool) -> Self {
        self.keep_reader_annotations = keep;
        self
    }

    /// Strip additional annotations (`yaml`, `json`, `ndjson`)
    #[inline]
    #[must_use]
    pub fn with_clear_annotations(mut self, keys: Vec<String>) -> Self {
        self.clear_annotations = keys;
        self
    }

    /// Sort by origin (`yaml`, `json`, `ndjson`)
    #[inline]
    #[must_use]
    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    /// Restore blank lines (`yaml`)
    #[inline]
    #[must_use]
    pub fn with_restore_vertical_whitespace(mut self, restore: bool) -> Self {
        self.restore_vertical_whitespace = restore;
        self
    }

    /// Extra template functions (`template`, `columns`)
    #[inline]
    #[must_use]
    pub fn with_functions(mut self, functions: TemplateFunctions) -> Self {
        self.functions = functions;
        self
    }

    /// Dialect (`env`)
    #[inline]
    #[must_use]
    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    /// Unset mode (`env`)
    #[inline]
    #[must_use]
    pub fn with_unset(mut self, unset: bool) -> Self {
        self.unset = unset;
        self
    }

    /// Label selector (`env`)
    #[inline]
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    /// Parsed format
    #[inline]
    #[must_use]
    pub fn format(&self) -> &OutputFormat {
        &self.format
    }

    /// Release the sink
    #[inline]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn json(&mut self) -> JsonWriter<&mut W> {
        JsonWriter::new(&mut self.out)
            .with_keep_reader_annotations(self.keep_reader_annotations)
            .with_clear_annotations(self.clear_annotations.clone())
            .with_sort(self.sort)
    }

    /// Write documents, returning output errors unconverted
    ///
    /// # Errors
    /// Whatever the selected writer reports
    pub fn write_documents(&mut self, documents: &mut [ResourceDocument]) -> OutputResult<()> {
        tracing::debug!("writing {} documents as {:?}", documents.len(), self.format);
        match self.format.clone() {
            OutputFormat::Yaml => {
                if self.restore_vertical_whitespace {
                    restore_vertical_whitespace(documents);
                }
                YamlWriter::new(&mut self.out)
                    .with_keep_reader_annotations(self.keep_reader_annotations)
                    .with_clear_annotations(self.clear_annotations.clone())
                    .with_sort(self.sort)
                    .write_documents(documents)
            }
            OutputFormat::Json => self.json().with_wrapping(Wrapping::list()).write_documents(documents),
            OutputFormat::NdJson => self.json().write_documents(documents),
            OutputFormat::Env => EnvWriter::new(&mut self.out)
                .with_shell(self.shell.clone())
                .with_unset(self.unset)
                .with_selector(self.selector.clone())
                .write_documents(documents),
            OutputFormat::Name => TemplateWriter::new(&mut self.out, NAME_TEMPLATE).write_documents(documents),
            OutputFormat::Template(template) => TemplateWriter::new(&mut self.out, template)
                .with_functions(self.functions.clone())
                .write_documents(documents),
            OutputFormat::Columns(columns) => TemplateWriter::new(&mut self.out, columns_template(&columns))
                .with_functions(self.functions.clone())
                .with_wrapping(Wrapping::list())
                .write_documents(documents),
        }
    }
}

impl<W: Write> Writer for FormatWriter<W> {
    fn write(&mut self, documents: &mut [ResourceDocument]) -> PipelineResult<()> {
        Ok(self.write_documents(documents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::value::Value;
    use pretty_assertions::assert_eq;
    use strata_test_utils::{deployment, secret, with_origin};

    fn render(format: &str, documents: &mut [ResourceDocument]) -> String {
        let mut writer = FormatWriter::new(format.parse().unwrap(), Vec::new());
        writer.write_documents(documents).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn parses_specifiers() {
        let parse = |spec: &str| spec.parse::<OutputFormat>().unwrap();
        assert_eq!(parse(""), OutputFormat::Yaml);
        assert_eq!(parse("YAML"), OutputFormat::Yaml);
        assert_eq!(parse("NdJson"), OutputFormat::NdJson);
        assert_eq!(
            parse("go-template={{ .Kind }}={{ x }}"),
            OutputFormat::Template("{{ .Kind }}={{ x }}".into())
        );
        assert_eq!(parse("{{ Kind }}"), OutputFormat::Template("{{ Kind }}".into()));
        assert_eq!(
            parse("custom-columns=.metadata.name, spec.replicas"),
            OutputFormat::Columns(vec!["metadata.name".into(), "spec.replicas".into()])
        );
    }

    #[test]
    fn unknown_format_names_specifier() {
        let err = "xml=1".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err.to_string(), "unknown output format: 'xml=1'");
    }

    #[test]
    fn empty_column_is_rejected() {
        let err = "columns=.metadata.name,,".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, OutputError::InvalidColumn { .. }));
    }

    #[test]
    fn columns_table() {
        let mut documents = vec![deployment("a", 1), deployment("b", 2)];
        assert_eq!(
            render("columns=.metadata.name,.spec.replicas", &mut documents),
            "NAME\tREPLICAS\na\t1\nb\t2\n"
        );
    }

    #[test]
    fn columns_without_documents() {
        assert_eq!(render("columns=.metadata.name", &mut []), "No results.\n");
    }

    #[test]
    fn columns_missing_fields_are_blank() {
        let mut documents = vec![deployment("a", 1)];
        assert_eq!(render("columns=.metadata.name,.status.phase", &mut documents), "NAME\tPHASE\na\t\n");
    }

    #[test]
    fn json_wraps_in_list() {
        let mut documents = vec![deployment("a", 1), deployment("b", 2), deployment("c", 3)];
        let value: serde_json::Value = serde_json::from_str(&render("json", &mut documents)).unwrap();
        assert_eq!(value["kind"], "List");
        assert_eq!(value["apiVersion"], "v1");
        assert_eq!(value["items"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn ndjson_line_per_document() {
        let mut documents = vec![deployment("a", 1), deployment("b", 2)];
        assert_eq!(render("ndjson", &mut documents).lines().count(), 2);
    }

    #[test]
    fn name_format() {
        let mut documents = vec![deployment("a", 1), secret("s", &[])];
        assert_eq!(render("name", &mut documents), "deployment/a\nsecret/s\n");
    }

    #[test]
    fn env_uses_writer_configuration() {
        let mut documents = vec![secret("creds", &[("FOO", "dGVzdA=="), ("app.config", "eA==")])];
        let mut writer = FormatWriter::new(OutputFormat::Env, Vec::new()).with_shell(Shell::Posix("bash".into()));
        writer.write_documents(&mut documents).unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), "export FOO=\"test\"\n");
    }

    #[test]
    fn template_uses_functions() {
        let mut documents = vec![deployment("web", 1)];
        let mut functions = TemplateFunctions::new();
        functions.insert(
            "shout".into(),
            std::sync::Arc::new(|args: &[Value]| -> Result<Value, minijinja::Error> {
                Ok(Value::from(format!("{}!", args[0])))
            }),
        );
        let mut writer = FormatWriter::new("template={{ shout(metadata.name) }}".parse().unwrap(), Vec::new())
            .with_functions(functions);
        writer.write_documents(&mut documents).unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), "web!");
    }

    #[test]
    fn yaml_strips_reader_annotations() {
        let mut documents = vec![with_origin(deployment("a", 1), "a.yaml", "0")];
        let text = render("yaml", &mut documents);
        assert!(!text.contains("config.kubernetes.io/index"));
        assert!(text.contains("name: a"));
    }

    #[test]
    fn from_options_validates_format() {
        let err = FormatWriter::from_options(&OutputOptions::new("toml"), Vec::new()).unwrap_err();
        assert!(matches!(err, OutputError::UnknownFormat(_)));

        let writer = FormatWriter::from_options(&OutputOptions::new("env").with_unset(true), Vec::new()).unwrap();
        assert_eq!(writer.format(), &OutputFormat::Env);
    }
}
