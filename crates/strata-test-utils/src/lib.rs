//! Testing utilities for the Strata workspace
//!
//! Shared manifests, document builders and tracing setup.

#![allow(missing_docs)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::Once;
use strata_document::{yaml, Node, ResourceDocument, INDEX_ANNOTATION, INT_TAG, PATH_ANNOTATION};

/// Two deployments and a service, with comments and blank lines
pub const MANIFESTS: &str = "\
# Frontend
apiVersion: apps/v1
kind: Deployment
metadata:
  name: a
spec:
  replicas: 1
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: b

spec:
  replicas: 2
---
apiVersion: v1
kind: Service
metadata:
  name: web
  labels:
    app: web
";

static TRACING: Once = Once::new();

/// Install a fmt subscriber writing through the test harness
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn parse(input: &str) -> Vec<ResourceDocument> {
    yaml::parse_documents(input).unwrap()
}

pub fn manifests() -> Vec<ResourceDocument> {
    parse(MANIFESTS)
}

pub fn deployment(name: &str, replicas: u32) -> ResourceDocument {
    let mut metadata = Node::mapping();
    metadata.set("name", Node::string(name));
    let mut spec = Node::mapping();
    spec.set("replicas", Node::tagged(replicas.to_string(), INT_TAG));

    let mut root = Node::mapping();
    root.set("apiVersion", Node::string("apps/v1"));
    root.set("kind", Node::string("Deployment"));
    root.set("metadata", metadata);
    root.set("spec", spec);
    ResourceDocument::new(root)
}

pub fn config_map(name: &str, data: &[(&str, &str)]) -> ResourceDocument {
    data_resource("ConfigMap", name, data, &[])
}

pub fn secret(name: &str, data: &[(&str, &str)]) -> ResourceDocument {
    data_resource("Secret", name, data, &[])
}

pub fn data_resource(
    kind: &str,
    name: &str,
    data: &[(&str, &str)],
    labels: &[(&str, &str)],
) -> ResourceDocument {
    let mut metadata = Node::mapping();
    metadata.set("name", Node::string(name));
    if !labels.is_empty() {
        let mut label_map = Node::mapping();
        for (key, value) in labels {
            label_map.set(key, Node::string(*value));
        }
        metadata.set("labels", label_map);
    }
    let mut data_map = Node::mapping();
    for (key, value) in data {
        data_map.set(key, Node::string(*value));
    }

    let mut root = Node::mapping();
    root.set("apiVersion", Node::string("v1"));
    root.set("kind", Node::string(kind));
    root.set("metadata", metadata);
    root.set("data", data_map);
    ResourceDocument::new(root)
}

pub fn with_origin(document: ResourceDocument, path: &str, index: &str) -> ResourceDocument {
    document
        .with_annotation(PATH_ANNOTATION, path)
        .with_annotation(INDEX_ANNOTATION, index)
}

/// In-memory sink that stays readable after being moved into a writer
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
