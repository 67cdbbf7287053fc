use super::RuntimeGate;
use super::host::{HostSlots, ServiceBuilderFn};
use crate::core::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identity of the running environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeDescriptor {
    pub engine: String,
    pub version: String,
}

/// The activated runtime: identity plus bound host slots.
///
/// Only produced by closing a [`Config`](super::Config); immutable afterwards.
#[derive(Debug)]
pub struct Runtime {
    descriptor: RuntimeDescriptor,
    host: HostSlots,
}

impl Runtime {
    pub(crate) fn new(descriptor: RuntimeDescriptor, host: HostSlots) -> Self {
        Self { descriptor, host }
    }

    /// The runtime installed in the global gate.
    pub fn singleton() -> Result<Arc<Runtime>> {
        RuntimeGate::global().runtime()
    }

    pub fn engine(&self) -> &str {
        &self.descriptor.engine
    }

    pub fn version(&self) -> &str {
        &self.descriptor.version
    }

    pub fn descriptor(&self) -> &RuntimeDescriptor {
        &self.descriptor
    }

    pub fn host(&self) -> &HostSlots {
        &self.host
    }

    pub fn http_sync(&self, opts: serde_json::Value) -> Result<serde_json::Value> {
        self.host.http_sync(opts)
    }

    pub fn find_package(&self, package_id: &str) -> Result<Option<serde_json::Value>> {
        self.host.find_package(package_id)
    }

    pub fn service_builders(&self) -> &[ServiceBuilderFn] {
        self.host.service_builders()
    }
}
