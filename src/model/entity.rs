use crate::core::{AttributeType, MoatError, Result, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Name of the identity slot every entity carries outside its attributes.
pub const UID_FIELD: &str = "uid";

/// One declared attribute with its precomputed default.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSlot {
    pub name: String,
    pub attr_type: AttributeType,
    pub default: Value,
}

/// Fixed shape of a model: attribute slots and command names.
///
/// Built once per model class and shared by every entity of that class.
#[derive(Debug, Clone)]
pub struct ModelLayout {
    id: Uuid,
    name: String,
    attributes: Vec<AttributeSlot>,
    commands: Vec<String>,
}

impl ModelLayout {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            attributes: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub(crate) fn push_attribute(&mut self, name: &str, attr_type: AttributeType) {
        let default = attr_type.default_value();
        self.attributes.push(AttributeSlot {
            name: name.to_string(),
            attr_type,
            default,
        });
    }

    pub(crate) fn push_command(&mut self, name: &str) {
        self.commands.push(name.to_string());
    }

    /// Identity of the class this layout belongs to
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[AttributeSlot] {
        &self.attributes
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn find_attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|slot| slot.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.find_attribute_index(name).is_some()
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.iter().any(|c| c == name)
    }
}

/// An instance of a model class.
///
/// Slots are fixed by the layout: declared attributes are writable, nothing
/// else can be added. Cloning an entity never shares mutable state.
#[derive(Debug, Clone)]
pub struct Entity {
    layout: Arc<ModelLayout>,
    uid: Option<String>,
    values: Vec<Value>,
}

impl Entity {
    pub(crate) fn new(layout: Arc<ModelLayout>) -> Self {
        let values = layout
            .attributes
            .iter()
            .map(|slot| slot.default.clone())
            .collect();
        Self {
            layout,
            uid: None,
            values,
        }
    }

    pub fn model_name(&self) -> &str {
        self.layout.name()
    }

    pub fn layout(&self) -> &Arc<ModelLayout> {
        &self.layout
    }

    /// Whether this entity was created by the class owning `layout`.
    pub fn belongs_to(&self, layout: &ModelLayout) -> bool {
        self.layout.id == layout.id
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub fn set_uid(&mut self, uid: impl Into<String>) {
        self.uid = Some(uid.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.layout
            .find_attribute_index(name)
            .map(|idx| &self.values[idx])
    }

    /// Write a declared attribute. Undeclared names are rejected and leave
    /// the entity untouched.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let Some(idx) = self.layout.find_attribute_index(name) else {
            return Err(MoatError::UnknownAttribute(
                name.to_string(),
                self.layout.name.clone(),
            ));
        };

        let slot = &self.layout.attributes[idx];
        if !slot.attr_type.is_compatible(&value) {
            return Err(MoatError::TypeMismatch(format!(
                "Attribute '{}.{}' expects type {}, got {}",
                self.layout.name,
                name,
                slot.attr_type,
                value.type_name()
            )));
        }

        self.values[idx] = value;
        Ok(())
    }

    /// Attribute name/value pairs in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.layout
            .attributes
            .iter()
            .map(|slot| slot.name.as_str())
            .zip(self.values.iter())
    }

    /// Copy the named attributes from `source`. Names are expected to be
    /// validated against the layout; `uid` is skipped.
    pub(crate) fn copy_fields_from(&mut self, source: &Entity, fields: &[String]) {
        for field in fields {
            if let Some(idx) = self.layout.find_attribute_index(field) {
                self.values[idx] = source.values[idx].clone();
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        object.insert(
            UID_FIELD.to_string(),
            self.uid
                .as_ref()
                .map(|uid| serde_json::Value::String(uid.clone()))
                .unwrap_or(serde_json::Value::Null),
        );
        for (name, value) in self.attributes() {
            object.insert(name.to_string(), value.to_json());
        }
        serde_json::Value::Object(object)
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.layout.id == other.layout.id && self.uid == other.uid && self.values == other.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_layout() -> Arc<ModelLayout> {
        let mut layout = ModelLayout::new("Point");
        layout.push_attribute("x", AttributeType::Int32);
        layout.push_attribute("y", AttributeType::Boolean);
        layout.push_attribute("tag", AttributeType::parse("string"));
        Arc::new(layout)
    }

    #[test]
    fn test_new_entity_has_defaults() {
        let entity = Entity::new(point_layout());
        assert_eq!(entity.get("x"), Some(&Value::Integer(0)));
        assert_eq!(entity.get("y"), Some(&Value::Boolean(false)));
        assert_eq!(entity.get("tag"), Some(&Value::Null));
        assert!(entity.uid().is_none());
    }

    #[test]
    fn test_undeclared_attribute_is_rejected() {
        let mut entity = Entity::new(point_layout());
        entity.set("x", 5).unwrap();
        assert_eq!(entity.get("x"), Some(&Value::Integer(5)));

        let err = entity.set("z", 1).unwrap_err();
        assert!(matches!(err, MoatError::UnknownAttribute(ref f, _) if f == "z"));
        assert!(entity.get("z").is_none());
        assert_eq!(entity.attributes().count(), 3);
    }

    #[test]
    fn test_type_mismatch_leaves_value() {
        let mut entity = Entity::new(point_layout());
        assert!(matches!(
            entity.set("y", "yes"),
            Err(MoatError::TypeMismatch(_))
        ));
        assert_eq!(entity.get("y"), Some(&Value::Boolean(false)));
    }

    #[test]
    fn test_clone_does_not_alias() {
        let mut original = Entity::new(point_layout());
        original.set_uid("a");
        let copy = original.clone();
        original.set("x", 9).unwrap();
        assert_eq!(copy.get("x"), Some(&Value::Integer(0)));
        assert_ne!(copy, original);
    }

    #[test]
    fn test_entities_of_different_layouts_never_match() {
        let a = Entity::new(point_layout());
        let b = Entity::new(point_layout());
        assert!(!a.belongs_to(b.layout()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_to_json() {
        let mut entity = Entity::new(point_layout());
        entity.set_uid("p-1");
        entity.set("x", 3).unwrap();
        assert_eq!(
            entity.to_json(),
            serde_json::json!({"uid": "p-1", "x": 3, "y": false, "tag": null})
        );
    }
}
