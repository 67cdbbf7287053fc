use super::{Mapper, PersistenceProvider, ProviderOptions};
use crate::core::{MoatError, Result};
use crate::model::{ClassState, ModelClass};
use crate::storage::HashProvider;
use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{Level, event};

/// Providers are registered under `persistence-<name>`.
pub const PROVIDER_MODULE_PREFIX: &str = "persistence-";
/// Provider the model factory binds new classes to.
pub const DEFAULT_PROVIDER: &str = "hash";
/// Binding target meaning "the class supplies its own mapper".
pub const CUSTOM_PROVIDER: &str = "custom";

/// Name-indexed set of persistence providers.
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn PersistenceProvider>>>,
    initialized: Mutex<HashSet<(String, ProviderOptions)>>,
}

// Global registry holding the built-in providers
lazy_static! {
    static ref GLOBAL_PROVIDER_REGISTRY: Arc<ProviderRegistry> =
        Arc::new(ProviderRegistry::with_default_providers());
}

impl ProviderRegistry {
    /// Get the process-wide registry
    pub fn global() -> &'static Arc<ProviderRegistry> {
        &GLOBAL_PROVIDER_REGISTRY
    }

    /// An empty registry
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            initialized: Mutex::new(HashSet::new()),
        }
    }

    /// A registry with every built-in provider registered
    pub fn with_default_providers() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(HashProvider::new()));
        registry
    }

    /// Register a provider, replacing any provider of the same name.
    pub fn register(&self, provider: Arc<dyn PersistenceProvider>) {
        let key = module_key(provider.name());
        match self.providers.write() {
            Ok(mut providers) => {
                providers.insert(key, provider);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key, provider);
            }
        }
    }

    /// Look a provider up by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn PersistenceProvider>> {
        self.providers
            .read()?
            .get(&module_key(name))
            .cloned()
            .ok_or_else(|| MoatError::UnsupportedProvider(name.to_string()))
    }

    /// Names of all registered providers
    pub fn provider_names(&self) -> Vec<String> {
        let Ok(providers) = self.providers.read() else {
            return Vec::new();
        };
        let mut names: Vec<String> = providers
            .keys()
            .map(|key| key.trim_start_matches(PROVIDER_MODULE_PREFIX).to_string())
            .collect();
        names.sort();
        names
    }

    /// Run `init` on a provider once per distinct option set.
    ///
    /// Returns `true` when `init` ran, `false` when the same options were
    /// already applied.
    pub fn init_provider(&self, name: &str, options: &ProviderOptions) -> Result<bool> {
        let provider = self.resolve(name)?;
        let key = (name.to_string(), options.clone());
        let mut initialized = self.initialized.lock()?;
        if initialized.contains(&key) {
            return Ok(false);
        }
        provider.init(options)?;
        initialized.insert(key);
        event!(Level::DEBUG, provider = %name, ?options, "provider initialized");
        Ok(true)
    }

    /// Attach the CRUD operations of `provider_name` to `class`.
    ///
    /// Internal bindings leave the class rebindable; every other binding
    /// freezes it.
    pub fn bind(&self, class: &ModelClass, provider_name: &str, is_internal: bool) -> Result<()> {
        if provider_name.is_empty() {
            return Err(MoatError::MissingArgument("providerName".to_string()));
        }
        if class.name().is_empty() {
            return Err(MoatError::MissingArgument("modelClass.name".to_string()));
        }
        if class.state()? == ClassState::Frozen {
            return Err(MoatError::AlreadyConfigured(format!(
                "model '{}' is frozen",
                class.name()
            )));
        }

        let mapper: Arc<dyn Mapper> = if provider_name == CUSTOM_PROVIDER {
            class.custom_mapper()?.ok_or_else(|| {
                MoatError::MissingArgument(format!("custom mapper of '{}'", class.name()))
            })?
        } else {
            self.resolve(provider_name)?.build(class)?
        };

        class.attach_mapper(mapper, provider_name, is_internal)?;
        event!(
            Level::DEBUG,
            model = %class.name(),
            provider = %provider_name,
            internal = is_internal,
            "model bound"
        );
        Ok(())
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Bind `class` to `provider_name` through the global registry.
pub fn bind(class: &ModelClass, provider_name: &str, is_internal: bool) -> Result<()> {
    ProviderRegistry::global().bind(class, provider_name, is_internal)
}

fn module_key(name: &str) -> String {
    format!("{}{}", PROVIDER_MODULE_PREFIX, name)
}
