use crate::core::{MoatError, Result};
use crate::namespace::Namespace;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Synchronous HTTP call performed by the host on behalf of a package.
pub type HttpSyncFn =
    Arc<dyn Fn(serde_json::Value) -> Result<serde_json::Value> + Send + Sync>;

/// Looks up an installed package by id.
pub type FindPackageFn = Arc<dyn Fn(&str) -> Result<Option<serde_json::Value>> + Send + Sync>;

/// Wires application services into a freshly loaded namespace:
/// `(package_id, namespace, main_path)`.
pub type ServiceBuilderFn =
    Arc<dyn Fn(&str, &mut Namespace, &Path) -> Result<()> + Send + Sync>;

/// Extension points the host runtime fills in.
///
/// An unbound slot fails with `NotConfigured` when invoked.
#[derive(Clone, Default)]
pub struct HostSlots {
    pub(crate) http_sync: Option<HttpSyncFn>,
    pub(crate) find_package: Option<FindPackageFn>,
    pub(crate) service_builders: Vec<ServiceBuilderFn>,
}

impl HostSlots {
    pub fn http_sync(&self, opts: serde_json::Value) -> Result<serde_json::Value> {
        let handler = self
            .http_sync
            .as_ref()
            .ok_or_else(|| MoatError::NotConfigured("httpSync".to_string()))?;
        handler(opts)
    }

    pub fn find_package(&self, package_id: &str) -> Result<Option<serde_json::Value>> {
        let handler = self
            .find_package
            .as_ref()
            .ok_or_else(|| MoatError::NotConfigured("findPackage".to_string()))?;
        handler(package_id)
    }

    pub fn service_builders(&self) -> &[ServiceBuilderFn] {
        &self.service_builders
    }
}

impl fmt::Debug for HostSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostSlots")
            .field("http_sync", &self.http_sync.is_some())
            .field("find_package", &self.find_package.is_some())
            .field("service_builders", &self.service_builders.len())
            .finish()
    }
}
