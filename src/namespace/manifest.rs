use crate::core::{MoatError, Result};
use crate::model::DescriptorSet;
use crate::provider::ProviderOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The part of a package manifest the model layer consumes.
///
/// ```json
/// {
///   "packageId": "urn:moat:demo",
///   "main": "lib/main.js",
///   "models": { "Device": { "attributes": { "x": { "type": "int32" } } } },
///   "persistence": { "Device": "hash" },
///   "providers": { "hash": { "maxSize": 100 } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub package_id: String,
    #[serde(default)]
    pub main: PathBuf,
    #[serde(default)]
    pub models: DescriptorSet,
    /// Model name -> provider the model is explicitly bound to.
    #[serde(default)]
    pub persistence: BTreeMap<String, String>,
    /// Provider name -> options passed to its `init`.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderOptions>,
}

impl PackageManifest {
    pub fn new(package_id: &str) -> Self {
        Self {
            package_id: package_id.to_string(),
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(text)?;
        if manifest.package_id.is_empty() {
            return Err(MoatError::MissingArgument("packageId".to_string()));
        }
        Ok(manifest)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            MoatError::IoError(format!("{}: {}", path.display(), err))
        })?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AttributeType;
    use std::io::Write;

    const MANIFEST: &str = r#"{
        "packageId": "urn:moat:demo",
        "main": "lib/main.js",
        "models": {
            "Device": {
                "attributes": {"x": {"type": "int32"}, "online": {"type": "boolean"}},
                "commands": {"reboot": {}}
            }
        },
        "persistence": {"Device": "hash"},
        "providers": {"hash": {"maxSize": 10}}
    }"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = PackageManifest::from_json(MANIFEST).unwrap();
        assert_eq!(manifest.package_id, "urn:moat:demo");
        assert_eq!(manifest.main, PathBuf::from("lib/main.js"));
        assert_eq!(
            manifest.models["Device"].attributes["online"].attr_type,
            AttributeType::Boolean
        );
        assert_eq!(manifest.persistence["Device"], "hash");
        assert_eq!(manifest.providers["hash"].max_size, Some(10));
    }

    #[test]
    fn test_package_id_is_mandatory() {
        assert!(matches!(
            PackageManifest::from_json(r#"{"packageId": ""}"#),
            Err(MoatError::MissingArgument(_))
        ));
        assert!(matches!(
            PackageManifest::from_json(r#"{"models": {}}"#),
            Err(MoatError::Json(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();
        let manifest = PackageManifest::from_path(file.path()).unwrap();
        assert_eq!(manifest.models.len(), 1);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            PackageManifest::from_path(&missing),
            Err(MoatError::IoError(_))
        ));
    }
}
