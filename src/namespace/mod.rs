//! Package namespaces: the model classes of one package, built and bound.

pub mod loader;
pub mod manifest;

pub use loader::NamespaceLoader;
pub use manifest::PackageManifest;

use crate::core::{MoatError, Result};
use crate::model::ModelClass;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Loaded models of one package.
#[derive(Debug)]
pub struct Namespace {
    package_id: String,
    main: PathBuf,
    models: BTreeMap<String, ModelClass>,
    failures: BTreeMap<String, String>,
}

impl Namespace {
    pub(crate) fn new(package_id: &str, main: &Path) -> Self {
        Self {
            package_id: package_id.to_string(),
            main: main.to_path_buf(),
            models: BTreeMap::new(),
            failures: BTreeMap::new(),
        }
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn main(&self) -> &Path {
        &self.main
    }

    pub fn model(&self, name: &str) -> Option<&ModelClass> {
        self.models.get(name)
    }

    /// Like [`Namespace::model`], failing when the model is absent.
    pub fn require_model(&self, name: &str) -> Result<&ModelClass> {
        self.model(name).ok_or_else(|| {
            MoatError::InvalidDescriptor(format!(
                "model '{}' is not defined in package '{}'",
                name, self.package_id
            ))
        })
    }

    pub fn models(&self) -> impl Iterator<Item = (&str, &ModelClass)> {
        self.models.iter().map(|(name, class)| (name.as_str(), class))
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    /// Models that could not be built, with the reason.
    pub fn failures(&self) -> &BTreeMap<String, String> {
        &self.failures
    }

    pub(crate) fn insert_model(&mut self, class: ModelClass) {
        self.models.insert(class.name().to_string(), class);
    }

    pub(crate) fn record_failure(&mut self, model: &str, reason: String) {
        self.failures.insert(model.to_string(), reason);
    }
}
