use super::{Namespace, PackageManifest};
use crate::core::{MoatError, Result};
use crate::gate::{Runtime, RuntimeGate};
use crate::model::ModelFactory;
use crate::provider::ProviderRegistry;
use log::warn;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{Level, event, info_span};

/// Builds package namespaces and caches them by package id.
pub struct NamespaceLoader {
    runtime: Arc<Runtime>,
    factory: ModelFactory,
    cache: Mutex<HashMap<String, Arc<Namespace>>>,
}

impl NamespaceLoader {
    /// Loader bound to an activated runtime and the global provider registry
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self::with_factory(runtime, ModelFactory::new())
    }

    pub fn with_factory(runtime: Arc<Runtime>, factory: ModelFactory) -> Self {
        Self {
            runtime,
            factory,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Loader for the globally configured runtime.
    pub fn from_global() -> Result<Self> {
        Ok(Self::new(RuntimeGate::global().runtime()?))
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    fn registry(&self) -> &Arc<ProviderRegistry> {
        self.factory.registry()
    }

    /// The cached namespace of a package, if it was loaded.
    pub fn cached(&self, package_id: &str) -> Result<Option<Arc<Namespace>>> {
        Ok(self.cache.lock()?.get(package_id).cloned())
    }

    /// Build, bind and wire the models of a package.
    ///
    /// Loading a package id a second time returns the first result. The
    /// cache lock is not held while the namespace is built, so service
    /// builders may load other packages through the same loader.
    pub fn load(&self, manifest: &PackageManifest) -> Result<Arc<Namespace>> {
        if manifest.package_id.is_empty() {
            return Err(MoatError::MissingArgument("packageId".to_string()));
        }
        if let Some(namespace) = self.cached(&manifest.package_id)? {
            return Ok(namespace);
        }

        let namespace = Arc::new(self.build_namespace(manifest)?);

        // A concurrent load of the same package may have finished first.
        let mut cache = self.cache.lock()?;
        let cached = cache
            .entry(manifest.package_id.clone())
            .or_insert(namespace);
        Ok(cached.clone())
    }

    fn build_namespace(&self, manifest: &PackageManifest) -> Result<Namespace> {
        let span = info_span!("namespace.load", package = %manifest.package_id);
        let _enter = span.enter();

        for (provider, options) in &manifest.providers {
            self.registry().init_provider(provider, options)?;
        }

        let mut namespace = Namespace::new(&manifest.package_id, &manifest.main);
        for (name, built) in self.factory.build_all(&manifest.models) {
            match built {
                Ok(class) => namespace.insert_model(class),
                Err(err) => {
                    warn!(
                        "Model '{}' of package '{}' skipped: {}",
                        name, manifest.package_id, err
                    );
                    namespace.record_failure(&name, err.to_string());
                }
            }
        }

        for (model, provider) in &manifest.persistence {
            let Some(class) = namespace.model(model) else {
                if namespace.failures().contains_key(model) {
                    continue;
                }
                return Err(MoatError::InvalidDescriptor(format!(
                    "persistence entry names unknown model '{}'",
                    model
                )));
            };
            self.registry().bind(class, provider, false)?;
        }

        for builder in self.runtime.service_builders() {
            builder(&manifest.package_id, &mut namespace, &manifest.main)?;
        }

        event!(
            Level::INFO,
            models = namespace.models.len(),
            failures = namespace.failures.len(),
            "namespace loaded"
        );
        Ok(namespace)
    }
}
