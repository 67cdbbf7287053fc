//! Configuration gate.
//!
//! The host fills a [`Config`] with the runtime identity and its extension
//! points, then closes it. Closing installs the [`Runtime`] exactly once;
//! nothing that needs the runtime works before that, and a second close is
//! refused.

pub mod host;
pub mod runtime;

pub use host::{FindPackageFn, HostSlots, HttpSyncFn, ServiceBuilderFn};
pub use runtime::{Runtime, RuntimeDescriptor};

use crate::core::{MoatError, Result};
use crate::namespace::Namespace;
use lazy_static::lazy_static;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{Level, event};

/// Holder of the process runtime. UNCONFIGURED until a config is closed
/// into it, CONFIGURED forever after.
pub struct RuntimeGate {
    runtime: RwLock<Option<Arc<Runtime>>>,
}

// Global gate used by `Config::close` and `Runtime::singleton`
lazy_static! {
    static ref GLOBAL_RUNTIME_GATE: RuntimeGate = RuntimeGate::new();
}

impl RuntimeGate {
    pub fn new() -> Self {
        Self {
            runtime: RwLock::new(None),
        }
    }

    /// Get the process-wide gate
    pub fn global() -> &'static RuntimeGate {
        &GLOBAL_RUNTIME_GATE
    }

    /// The installed runtime, or `NotConfigured`.
    pub fn runtime(&self) -> Result<Arc<Runtime>> {
        self.runtime
            .read()?
            .clone()
            .ok_or_else(|| MoatError::NotConfigured("Not yet configured.".to_string()))
    }

    pub fn is_configured(&self) -> bool {
        self.runtime
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    fn install(&self, runtime: Runtime) -> bool {
        let mut slot = self.runtime.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            event!(Level::WARN, "Sorry, already configured.");
            return false;
        }
        event!(
            Level::INFO,
            engine = %runtime.engine(),
            version = %runtime.version(),
            "runtime configured"
        );
        *slot = Some(Arc::new(runtime));
        true
    }
}

impl Default for RuntimeGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Open configuration of the runtime.
///
/// `runtime` can be edited field by field until the config is closed;
/// closing consumes it.
#[derive(Debug, Default)]
pub struct Config {
    pub runtime: RuntimeDescriptor,
    host: HostSlots,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine name
    pub fn engine(mut self, engine: &str) -> Self {
        self.runtime.engine = engine.to_string();
        self
    }

    /// Set the engine version
    pub fn version(mut self, version: &str) -> Self {
        self.runtime.version = version.to_string();
        self
    }

    /// Bind the host's synchronous HTTP call
    pub fn http_sync<F>(mut self, handler: F) -> Self
    where
        F: Fn(serde_json::Value) -> Result<serde_json::Value> + Send + Sync + 'static,
    {
        self.host.http_sync = Some(Arc::new(handler));
        self
    }

    /// Bind the host's package lookup
    pub fn find_package<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) -> Result<Option<serde_json::Value>> + Send + Sync + 'static,
    {
        self.host.find_package = Some(Arc::new(handler));
        self
    }

    /// Add a service builder; builders run in registration order.
    pub fn service_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&str, &mut Namespace, &Path) -> Result<()> + Send + Sync + 'static,
    {
        self.host.service_builders.push(Arc::new(builder));
        self
    }

    /// Names of the host slots bound so far. The slots themselves only
    /// become callable through the [`Runtime`] produced by closing.
    pub fn bound_slots(&self) -> Vec<&'static str> {
        let mut slots = Vec::new();
        if self.host.http_sync.is_some() {
            slots.push("httpSync");
        }
        if self.host.find_package.is_some() {
            slots.push("findPackage");
        }
        if !self.host.service_builders.is_empty() {
            slots.push("serviceBuilders");
        }
        slots
    }

    /// Install this configuration into the global gate.
    ///
    /// Returns `true` on the first successful close and `false`, changing
    /// nothing, once the gate is already configured.
    pub fn close(self) -> bool {
        self.close_into(RuntimeGate::global())
    }

    /// Install this configuration into `gate`.
    pub fn close_into(self, gate: &RuntimeGate) -> bool {
        gate.install(Runtime::new(self.runtime, self.host))
    }
}
