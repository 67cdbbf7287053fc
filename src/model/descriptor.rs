use crate::core::AttributeType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declaration of a single model attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
}

/// Declaration of a remote-invocable command. Carries no data yet; the
/// manifest format reserves the object for future options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {}

/// Manifest entry describing one model: its attributes and its commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeDescriptor>,
    #[serde(default)]
    pub commands: BTreeMap<String, CommandDescriptor>,
}

impl ModelDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an attribute
    pub fn attribute(mut self, name: &str, attr_type: AttributeType) -> Self {
        self.attributes
            .insert(name.to_string(), AttributeDescriptor { attr_type });
        self
    }

    /// Declare a command
    pub fn command(mut self, name: &str) -> Self {
        self.commands
            .insert(name.to_string(), CommandDescriptor::default());
        self
    }
}

/// Model name -> descriptor, as found in a package manifest.
pub type DescriptorSet = BTreeMap<String, ModelDescriptor>;
