//! Template writer
//!
//! Evaluates a `minijinja` template against the JSON form of each document,
//! or once against a wrapping list object. Undefined lookups chain to an
//! empty value so missing fields render as nothing.

use crate::error::{OutputError, OutputResult};
use crate::json_writer::Wrapping;
use indexmap::IndexMap;
use minijinja::value::{Rest, Value};
use minijinja::{Environment, UndefinedBehavior};
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use strata_document::{json, ResourceDocument};
use strata_pipeline::{PipelineResult, Writer};

/// Caller-supplied template function taking any number of arguments
pub type TemplateFunction =
    Arc<dyn Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync>;

/// Named template functions, in registration order
pub type TemplateFunctions = IndexMap<String, TemplateFunction>;

/// Writes documents through a template
pub struct TemplateWriter<W: Write> {
    out: W,
    template: String,
    functions: TemplateFunctions,
    wrapping: Option<Wrapping>,
}

impl<W: Write> fmt::Debug for TemplateWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateWriter")
            .field("template", &self.template)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("wrapping", &self.wrapping)
            .finish_non_exhaustive()
    }
}

impl<W: Write> TemplateWriter<W> {
    /// Create writer evaluating `template` per document
    #[must_use]
    pub fn new(out: W, template: impl Into<String>) -> Self {
        Self {
            out,
            template: template.into(),
            functions: TemplateFunctions::new(),
            wrapping: None,
        }
    }

    /// Add or override template functions
    #[must_use]
    pub fn with_functions(mut self, functions: TemplateFunctions) -> Self {
        self.functions.extend(functions);
        self
    }

    /// Add or override a single template function
    #[must_use]
    pub fn with_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    /// Evaluate once against a wrapping list object
    #[inline]
    #[must_use]
    pub fn with_wrapping(mut self, wrapping: Wrapping) -> Self {
        self.wrapping = Some(wrapping);
        self
    }

    /// Template source
    #[inline]
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Release the sink
    #[inline]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write documents, returning output errors unconverted
    ///
    /// # Errors
    /// - `OutputError::TemplateCompile` before anything is written
    /// - `OutputError::TemplateRender` on the first failing evaluation;
    ///   output for earlier documents stays written
    pub fn write_documents(&mut self, documents: &[ResourceDocument]) -> OutputResult<()> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.add_function("upper", |value: Value| value.to_string().to_uppercase());
        env.add_function("lower", |value: Value| value.to_string().to_lowercase());
        for (name, function) in &self.functions {
            let function = Arc::clone(function);
            env.add_function(name.clone(), move |args: Rest<Value>| function(&args.0));
        }

        let template =
            env.template_from_str(&self.template)
                .map_err(|source| OutputError::TemplateCompile {
                    template: self.template.clone(),
                    source,
                })?;

        let contexts: Vec<serde_json::Value> = match &self.wrapping {
            Some(wrapping) => vec![json::wrap(&wrapping.api_version, &wrapping.kind, documents)],
            None => documents.iter().map(ResourceDocument::to_json).collect(),
        };
        for context in &contexts {
            let rendered = template.render(context).map_err(OutputError::TemplateRender)?;
            self.out.write_all(rendered.as_bytes())?;
        }

        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Writer for TemplateWriter<W> {
    fn write(&mut self, documents: &mut [ResourceDocument]) -> PipelineResult<()> {
        Ok(self.write_documents(documents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strata_test_utils::deployment;

    fn render(mut writer: TemplateWriter<Vec<u8>>, documents: &[ResourceDocument]) -> OutputResult<String> {
        writer.write_documents(documents)?;
        Ok(String::from_utf8(writer.into_inner()).unwrap())
    }

    #[test]
    fn evaluates_per_document() {
        let writer = TemplateWriter::new(Vec::new(), "{{ metadata.name }}={{ spec.replicas }}\n");
        let text = render(writer, &[deployment("a", 1), deployment("b", 2)]).unwrap();
        assert_eq!(text, "a=1\nb=2\n");
    }

    #[test]
    fn builtin_case_functions() {
        let writer = TemplateWriter::new(Vec::new(), "{{ upper(metadata.name) }} {{ lower(kind) }}\n");
        let text = render(writer, &[deployment("web", 1)]).unwrap();
        assert_eq!(text, "WEB deployment\n");
    }

    #[test]
    fn caller_functions_override_builtins() {
        let writer = TemplateWriter::new(Vec::new(), "{{ upper(kind) }} {{ join(1, 2, 3) }}\n")
            .with_function("upper", |_: &[Value]| Ok(Value::from("overridden")))
            .with_function("join", |args: &[Value]| {
                let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
                Ok(Value::from(parts.join("-")))
            });
        let text = render(writer, &[deployment("web", 1)]).unwrap();
        assert_eq!(text, "overridden 1-2-3\n");
    }

    #[test]
    fn wrapping_evaluates_once() {
        let writer = TemplateWriter::new(Vec::new(), "{{ kind }}:{{ items | length }}\n")
            .with_wrapping(Wrapping::list());
        let text = render(writer, &[deployment("a", 1), deployment("b", 2)]).unwrap();
        assert_eq!(text, "List:2\n");
    }

    #[test]
    fn missing_fields_render_empty() {
        let writer = TemplateWriter::new(Vec::new(), "[{{ status.phase }}]\n");
        let text = render(writer, &[deployment("a", 1)]).unwrap();
        assert_eq!(text, "[]\n");
    }

    #[test]
    fn compile_error_carries_source() {
        let writer = TemplateWriter::new(Vec::new(), "{{ metadata.name ");
        let err = render(writer, &[deployment("a", 1)]).unwrap_err();
        let OutputError::TemplateCompile { template, .. } = err else {
            panic!("expected compile error");
        };
        assert_eq!(template, "{{ metadata.name ");
    }

    #[test]
    fn render_error_keeps_earlier_output() {
        let mut writer = TemplateWriter::new(Vec::new(), "{{ fail(metadata.name) }}\n").with_function(
            "fail",
            |args: &[Value]| {
                if args[0].as_str() == Some("b") {
                    Err(minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, "no b"))
                } else {
                    Ok(args[0].clone())
                }
            },
        );
        let result = writer.write_documents(&[deployment("a", 1), deployment("b", 2)]);
        assert!(matches!(result, Err(OutputError::TemplateRender(_))));
        assert_eq!(writer.into_inner(), b"a\n");
    }
}
