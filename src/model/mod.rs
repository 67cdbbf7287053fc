pub mod class;
pub mod descriptor;
pub mod entity;
pub mod factory;

pub use class::{ClassState, CommandFn, ModelClass};
pub use descriptor::{AttributeDescriptor, CommandDescriptor, DescriptorSet, ModelDescriptor};
pub use entity::{AttributeSlot, Entity, ModelLayout, UID_FIELD};
pub use factory::{
    ModelFactory, RESERVED_MEMBER_NAMES, RESERVED_MODEL_NAMES, validate_model_name,
};
