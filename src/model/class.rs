use super::entity::{Entity, ModelLayout};
use crate::core::{AttributeType, MoatError, Result, Value};
use crate::provider::{Completion, Mapper};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{Level, event};

/// Implementation of a model command, supplied by application service code.
pub type CommandFn = Arc<dyn Fn(&mut Entity, Vec<Value>) -> Result<Value> + Send + Sync>;

/// Lifecycle of a model class.
///
/// `Open -> Sealed -> Bound -> Frozen`; binding may skip `Sealed`, and an
/// explicit bind or `configure` may skip `Bound`. No transition leads back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassState {
    /// Layout still accepts attributes and commands.
    Open,
    /// Layout fixed, no mapper attached.
    Sealed,
    /// Mapper attached by an internal binding; may still be rebound.
    Bound,
    /// Terminal: mapper and command slots are permanent.
    Frozen,
}

impl fmt::Display for ClassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Sealed => "sealed",
            Self::Bound => "bound",
            Self::Frozen => "frozen",
        };
        f.write_str(name)
    }
}

struct ClassInner {
    state: ClassState,
    layout: Arc<ModelLayout>,
    mapper: Option<Arc<dyn Mapper>>,
    provider: Option<String>,
    custom_mapper: Option<Arc<dyn Mapper>>,
    commands: HashMap<String, Option<CommandFn>>,
}

struct ClassShared {
    name: String,
    inner: RwLock<ClassInner>,
}

/// Runtime type of one model.
///
/// Cheap to clone; clones share the same class.
#[derive(Clone)]
pub struct ModelClass {
    shared: Arc<ClassShared>,
}

impl ModelClass {
    /// Start a class with an empty, open layout.
    pub fn open(name: impl Into<String>) -> Self {
        let name = name.into();
        let layout = Arc::new(ModelLayout::new(name.clone()));
        Self {
            shared: Arc::new(ClassShared {
                name,
                inner: RwLock::new(ClassInner {
                    state: ClassState::Open,
                    layout,
                    mapper: None,
                    provider: None,
                    custom_mapper: None,
                    commands: HashMap::new(),
                }),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn state(&self) -> Result<ClassState> {
        Ok(self.shared.inner.read()?.state)
    }

    pub fn layout(&self) -> Result<Arc<ModelLayout>> {
        Ok(self.shared.inner.read()?.layout.clone())
    }

    /// Name of the provider the class is currently bound to.
    pub fn provider(&self) -> Result<Option<String>> {
        Ok(self.shared.inner.read()?.provider.clone())
    }

    pub fn same_class(&self, other: &ModelClass) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn define_attribute(&self, name: &str, attr_type: AttributeType) -> Result<()> {
        let mut inner = self.shared.inner.write()?;
        self.expect_open(&inner)?;
        if inner.layout.has_attribute(name) || inner.layout.has_command(name) {
            return Err(MoatError::InvalidDescriptor(format!(
                "'{}' is declared twice on model '{}'",
                name,
                self.name()
            )));
        }
        Arc::make_mut(&mut inner.layout).push_attribute(name, attr_type);
        Ok(())
    }

    pub fn define_command(&self, name: &str) -> Result<()> {
        let mut inner = self.shared.inner.write()?;
        self.expect_open(&inner)?;
        if inner.layout.has_attribute(name) || inner.layout.has_command(name) {
            return Err(MoatError::InvalidDescriptor(format!(
                "'{}' is declared twice on model '{}'",
                name,
                self.name()
            )));
        }
        Arc::make_mut(&mut inner.layout).push_command(name);
        inner.commands.insert(name.to_string(), None);
        Ok(())
    }

    /// Fix the layout: `Open -> Sealed`.
    pub fn seal(&self) -> Result<()> {
        let mut inner = self.shared.inner.write()?;
        self.expect_open(&inner)?;
        inner.state = ClassState::Sealed;
        Ok(())
    }

    /// Freeze the class permanently, keeping its current binding.
    pub fn configure(&self) -> Result<()> {
        let mut inner = self.shared.inner.write()?;
        match inner.state {
            ClassState::Open => Err(MoatError::NotConfigured(format!(
                "model '{}' is still open",
                self.name()
            ))),
            ClassState::Frozen => Err(MoatError::AlreadyConfigured(format!(
                "model '{}' is frozen",
                self.name()
            ))),
            ClassState::Sealed | ClassState::Bound => {
                inner.state = ClassState::Frozen;
                event!(Level::DEBUG, model = %self.name(), "model frozen");
                Ok(())
            }
        }
    }

    /// Register the mapper used when this class is bound to the `custom`
    /// provider.
    pub fn set_custom_mapper(&self, mapper: Arc<dyn Mapper>) -> Result<()> {
        let mut inner = self.shared.inner.write()?;
        self.expect_not_frozen(&inner)?;
        inner.custom_mapper = Some(mapper);
        Ok(())
    }

    pub(crate) fn custom_mapper(&self) -> Result<Option<Arc<dyn Mapper>>> {
        Ok(self.shared.inner.read()?.custom_mapper.clone())
    }

    /// Attach a mapper. Internal bindings leave the class `Bound`, any other
    /// binding freezes it.
    pub(crate) fn attach_mapper(
        &self,
        mapper: Arc<dyn Mapper>,
        provider: &str,
        is_internal: bool,
    ) -> Result<()> {
        let mut inner = self.shared.inner.write()?;
        self.expect_not_frozen(&inner)?;
        inner.mapper = Some(mapper);
        inner.provider = Some(provider.to_string());
        inner.state = if is_internal {
            ClassState::Bound
        } else {
            ClassState::Frozen
        };
        Ok(())
    }

    /// A new entity carrying the attribute defaults.
    pub fn new_instance(&self) -> Result<Entity> {
        let inner = self.shared.inner.read()?;
        if inner.state == ClassState::Open {
            return Err(MoatError::NotConfigured(format!(
                "model '{}' is still open",
                self.name()
            )));
        }
        Ok(Entity::new(inner.layout.clone()))
    }

    /// Whether `entity` is an instance of this class.
    pub fn is_instance(&self, entity: &Entity) -> Result<bool> {
        Ok(entity.belongs_to(&*self.layout()?))
    }

    /// Install the implementation of a declared command.
    pub fn override_command(&self, name: &str, command: CommandFn) -> Result<()> {
        let mut inner = self.shared.inner.write()?;
        self.expect_not_frozen(&inner)?;
        match inner.commands.get_mut(name) {
            Some(slot) => {
                *slot = Some(command);
                Ok(())
            }
            None => Err(MoatError::InvalidDescriptor(format!(
                "command '{}' is not declared on model '{}'",
                name,
                self.name()
            ))),
        }
    }

    /// Run a command against `entity`.
    pub fn invoke(&self, entity: &mut Entity, name: &str, args: Vec<Value>) -> Result<Value> {
        let command = {
            let inner = self.shared.inner.read()?;
            if !entity.belongs_to(&inner.layout) {
                return Err(MoatError::IncompatibleEntity);
            }
            match inner.commands.get(name) {
                Some(Some(command)) => command.clone(),
                Some(None) => {
                    return Err(MoatError::NotConfigured(format!(
                        "command '{}.{}' has no implementation",
                        self.name(),
                        name
                    )));
                }
                None => {
                    return Err(MoatError::InvalidDescriptor(format!(
                        "command '{}' is not declared on model '{}'",
                        name,
                        self.name()
                    )));
                }
            }
        };
        command(entity, args)
    }

    fn mapper(&self) -> Result<Arc<dyn Mapper>> {
        self.shared.inner.read()?.mapper.clone().ok_or_else(|| {
            MoatError::NotConfigured(format!(
                "model '{}' is not bound to a provider",
                self.name()
            ))
        })
    }

    pub fn add(&self, entity: &mut Entity) -> Result<Completion<Entity>> {
        self.mapper()?.add(entity)
    }

    pub fn update(&self, entity: &Entity) -> Result<Completion<Entity>> {
        self.mapper()?.update(entity)
    }

    pub fn update_fields(
        &self,
        entity: &Entity,
        fields: &[&str],
    ) -> Result<Completion<(Entity, Vec<String>)>> {
        self.mapper()?.update_fields(entity, fields)
    }

    pub fn remove(&self, uid: &str) -> Result<Completion<Entity>> {
        self.mapper()?.remove(uid)
    }

    pub fn find_by_uid(&self, uid: &str) -> Result<Completion<Entity>> {
        self.mapper()?.find_by_uid(uid)
    }

    pub fn find_all_uids(&self) -> Result<Completion<Vec<String>>> {
        self.mapper()?.find_all_uids()
    }

    pub fn count(&self) -> Result<Completion<usize>> {
        self.mapper()?.count()
    }

    fn expect_open(&self, inner: &ClassInner) -> Result<()> {
        if inner.state != ClassState::Open {
            return Err(MoatError::AlreadyConfigured(format!(
                "model '{}' is {}",
                self.name(),
                inner.state
            )));
        }
        Ok(())
    }

    fn expect_not_frozen(&self, inner: &ClassInner) -> Result<()> {
        if inner.state == ClassState::Frozen {
            return Err(MoatError::AlreadyConfigured(format!(
                "model '{}' is frozen",
                self.name()
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("ModelClass");
        debug.field("name", &self.shared.name);
        if let Ok(inner) = self.shared.inner.read() {
            debug
                .field("state", &inner.state)
                .field("provider", &inner.provider)
                .field("attributes", &inner.layout.attributes().len())
                .field("commands", &inner.layout.commands());
        }
        debug.finish()
    }
}
