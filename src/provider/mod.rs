//! Persistence provider contract.
//!
//! A provider is a named backend. For every model class it builds a
//! [`Mapper`]: the seven CRUD operations the class delegates to once bound.
//! Mapper operations validate their arguments synchronously and answer
//! through a [`Completion`].

pub mod completion;
pub mod registry;

use crate::core::Result;
use crate::model::{Entity, ModelClass};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use completion::{Completion, CorrelationId, StoreOp};
pub use registry::{
    CUSTOM_PROVIDER, DEFAULT_PROVIDER, PROVIDER_MODULE_PREFIX, ProviderRegistry, bind,
};

/// CRUD operations a provider supplies for one model class.
pub trait Mapper: Send + Sync {
    /// Store a copy of `entity`. Assigns a fresh UUID to the caller's entity
    /// when it has no uid.
    fn add(&self, entity: &mut Entity) -> Result<Completion<Entity>>;

    /// Replace the stored copy at `entity.uid`.
    fn update(&self, entity: &Entity) -> Result<Completion<Entity>>;

    /// Copy only `fields` from `entity` onto the stored record.
    fn update_fields(
        &self,
        entity: &Entity,
        fields: &[&str],
    ) -> Result<Completion<(Entity, Vec<String>)>>;

    fn remove(&self, uid: &str) -> Result<Completion<Entity>>;

    fn find_by_uid(&self, uid: &str) -> Result<Completion<Entity>>;

    fn find_all_uids(&self) -> Result<Completion<Vec<String>>>;

    fn count(&self) -> Result<Completion<usize>>;
}

/// A named persistence backend.
pub trait PersistenceProvider: Send + Sync {
    /// Registration name (`hash`, ...)
    fn name(&self) -> &str;

    /// Configure resources shared by every mapper this provider builds.
    fn init(&self, options: &ProviderOptions) -> Result<()>;

    /// Build the mapper for one model class.
    fn build(&self, class: &ModelClass) -> Result<Arc<dyn Mapper>>;
}

/// Options handed to [`PersistenceProvider::init`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOptions {
    /// Upper bound on the number of records per store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<usize>,
}

impl ProviderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_parse_camel_case() {
        let options: ProviderOptions = serde_json::from_str(r#"{"maxSize": 3}"#).unwrap();
        assert_eq!(options, ProviderOptions::new().max_size(3));

        let empty: ProviderOptions = serde_json::from_str("{}").unwrap();
        assert!(empty.max_size.is_none());
    }
}
