use super::class::ModelClass;
use super::descriptor::{DescriptorSet, ModelDescriptor};
use super::entity::UID_FIELD;
use crate::core::{MoatError, Result};
use crate::provider::{DEFAULT_PROVIDER, ProviderRegistry};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{Level, event};

lazy_static::lazy_static! {
    static ref MODEL_NAME: Regex = Regex::new(r"^[A-Z][A-Za-z0-9_]*$").unwrap();
    static ref MEMBER_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Names a model may not take; they name framework objects in a namespace.
pub const RESERVED_MODEL_NAMES: &[&str] = &["Runtime", "Config", "Namespace"];

/// Member names taken by the CRUD operations a binding attaches.
pub const RESERVED_MEMBER_NAMES: &[&str] = &[
    UID_FIELD,
    "add",
    "update",
    "updateFields",
    "update_fields",
    "remove",
    "findByUid",
    "find_by_uid",
    "findAllUids",
    "find_all_uids",
    "count",
];

/// Check a model name: CamelCase and not reserved.
pub fn validate_model_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MoatError::InvalidDescriptor(
            "model name must not be empty".to_string(),
        ));
    }
    if !MODEL_NAME.is_match(name) {
        return Err(MoatError::InvalidDescriptor(format!(
            "model name '{}' must start with an upper-case letter and contain only letters, digits or '_'",
            name
        )));
    }
    if RESERVED_MODEL_NAMES.contains(&name) {
        return Err(MoatError::InvalidDescriptor(format!(
            "model name '{}' is reserved",
            name
        )));
    }
    Ok(())
}

fn validate_member_name(model: &str, name: &str) -> Result<()> {
    if !MEMBER_NAME.is_match(name) {
        return Err(MoatError::InvalidDescriptor(format!(
            "'{}.{}' is not a valid identifier",
            model, name
        )));
    }
    if RESERVED_MEMBER_NAMES.contains(&name) {
        return Err(MoatError::InvalidDescriptor(format!(
            "'{}.{}' collides with a reserved member",
            model, name
        )));
    }
    Ok(())
}

/// Turns model descriptors into bound model classes.
pub struct ModelFactory {
    registry: Arc<ProviderRegistry>,
    default_provider: String,
}

impl ModelFactory {
    /// Factory binding to `hash` through the global registry
    pub fn new() -> Self {
        Self::with_registry(ProviderRegistry::global().clone())
    }

    pub fn with_registry(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            default_provider: DEFAULT_PROVIDER.to_string(),
        }
    }

    /// Use another provider for the internal binding of new classes
    pub fn with_default_provider(mut self, provider: &str) -> Self {
        self.default_provider = provider.to_string();
        self
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Build one model class and bind it to the default provider.
    ///
    /// The returned class is `Bound`: its layout is fixed, its values are
    /// writable, and one explicit rebind is still possible.
    pub fn build(&self, name: &str, descriptor: &ModelDescriptor) -> Result<ModelClass> {
        validate_model_name(name)?;
        for attribute in descriptor.attributes.keys() {
            validate_member_name(name, attribute)?;
        }
        for command in descriptor.commands.keys() {
            validate_member_name(name, command)?;
        }

        let class = ModelClass::open(name);
        for (attribute, declared) in &descriptor.attributes {
            class.define_attribute(attribute, declared.attr_type.clone())?;
        }
        for command in descriptor.commands.keys() {
            class.define_command(command)?;
        }
        class.seal()?;
        self.registry.bind(&class, &self.default_provider, true)?;

        event!(
            Level::DEBUG,
            model = %name,
            attributes = descriptor.attributes.len(),
            commands = descriptor.commands.len(),
            "model class built"
        );
        Ok(class)
    }

    /// Build every model of a descriptor set. A failing model does not stop
    /// its siblings.
    pub fn build_all(&self, descriptors: &DescriptorSet) -> BTreeMap<String, Result<ModelClass>> {
        descriptors
            .iter()
            .map(|(name, descriptor)| (name.clone(), self.build(name, descriptor)))
            .collect()
    }
}

impl Default for ModelFactory {
    fn default() -> Self {
        Self::new()
    }
}
