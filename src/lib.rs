// ============================================================================
// moatdb Library
// ============================================================================
//
// Descriptor-driven model persistence: packages declare models, the factory
// turns them into bound classes, and each class delegates its CRUD to a
// pluggable provider. `hash` is the in-memory reference provider.

pub mod core;
pub mod gate;
pub mod model;
pub mod namespace;
pub mod provider;
pub mod storage;

// Re-export main types for convenience
pub use core::{AttributeType, MoatError, Result, Value};
pub use gate::{Config, HostSlots, Runtime, RuntimeDescriptor, RuntimeGate};
pub use model::{
    ClassState, CommandFn, DescriptorSet, Entity, ModelClass, ModelDescriptor, ModelFactory,
    ModelLayout,
};
pub use namespace::{Namespace, NamespaceLoader, PackageManifest};
pub use provider::{
    Completion, CorrelationId, Mapper, PersistenceProvider, ProviderOptions, ProviderRegistry,
    StoreOp, bind,
};
pub use storage::{DEFAULT_MAX_SIZE, HashMapper, HashProvider, StoreTable};
