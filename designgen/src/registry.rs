//! Persistent naming registry.
//!
//! The registry maps external design names to the identifiers generated for
//! them. It is loaded once at the start of a run, extended by the naming
//! normalizer, and persisted once at the end. Aliases are never removed by a
//! run; removal goes through [`AliasRegistry::remove_component`], which the
//! CLI only calls after explicit confirmation.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default registry filename inside the state directory.
pub const REGISTRY_FILENAME: &str = "registry.json";

/// One external name → identifier mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingAlias {
    /// Name as it appears in the design export.
    pub external_name: String,

    /// Identifier used in generated code.
    pub code_name: String,

    /// Variant name, for aliases scoped to one variant of a component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,

    /// Component belongs to an external library and is never scaffolded.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_external_library: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Ordered collection of aliases, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasRegistry {
    aliases: Vec<NamingAlias>,
}

impl NamingAlias {
    /// Alias for a component.
    pub fn component(external_name: impl Into<String>, code_name: impl Into<String>) -> Self {
        Self {
            external_name: external_name.into(),
            code_name: code_name.into(),
            variant: None,
            is_external_library: false,
        }
    }

    /// Whether this alias names a whole component rather than a variant.
    pub fn is_component(&self) -> bool {
        self.variant.is_none()
    }
}

impl AliasRegistry {
    /// Create a registry from existing aliases.
    pub fn from_aliases(aliases: Vec<NamingAlias>) -> Self {
        Self { aliases }
    }

    /// Load the registry; a missing file yields an empty registry.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let aliases: Vec<NamingAlias> = serde_json::from_str(&content)
            .map_err(|e| StoreError::corrupt(path.to_path_buf(), e.to_string()))?;
        tracing::debug!(path = %path.display(), aliases = aliases.len(), "loaded naming registry");
        Ok(Self { aliases })
    }

    /// Persist the registry as a pretty-printed JSON array.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        write_store(path, &self.to_json())
    }

    /// Serialized store content.
    pub fn to_json(&self) -> String {
        let mut json = serde_json::to_string_pretty(&self.aliases)
            .unwrap_or_else(|_| "[]".to_string());
        json.push('\n');
        json
    }

    /// All aliases in first-seen order.
    pub fn aliases(&self) -> &[NamingAlias] {
        &self.aliases
    }

    /// Number of aliases.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Component alias for an external name.
    pub fn component(&self, external_name: &str) -> Option<&NamingAlias> {
        self.aliases
            .iter()
            .find(|a| a.is_component() && a.external_name == external_name)
    }

    /// Variant alias scoped to a component.
    pub fn variant(&self, external_name: &str, variant: &str) -> Option<&NamingAlias> {
        self.aliases
            .iter()
            .find(|a| a.external_name == external_name && a.variant.as_deref() == Some(variant))
    }

    /// Component alias holding a code name, ignoring ASCII case.
    ///
    /// Stub paths derive from code names, and `AB.tsx` and `Ab.tsx` are one
    /// file on case-insensitive filesystems.
    pub fn component_by_code_name(&self, code_name: &str) -> Option<&NamingAlias> {
        self.aliases
            .iter()
            .find(|a| a.is_component() && a.code_name.eq_ignore_ascii_case(code_name))
    }

    /// Code names already taken by variants of one component.
    pub fn variant_code_names(&self, external_name: &str) -> Vec<&str> {
        self.aliases
            .iter()
            .filter(|a| a.external_name == external_name && !a.is_component())
            .map(|a| a.code_name.as_str())
            .collect()
    }

    /// Append a new alias.
    pub fn insert(&mut self, alias: NamingAlias) {
        self.aliases.push(alias);
    }

    /// Update the external-library flag of a component alias.
    pub fn set_external_library(&mut self, external_name: &str, is_external: bool) {
        if let Some(alias) = self
            .aliases
            .iter_mut()
            .find(|a| a.is_component() && a.external_name == external_name)
        {
            alias.is_external_library = is_external;
        }
    }

    /// Remove a component alias and all of its variant aliases.
    pub fn remove_component(&mut self, external_name: &str) -> Vec<NamingAlias> {
        let (removed, kept) = std::mem::take(&mut self.aliases)
            .into_iter()
            .partition(|a| a.external_name == external_name);
        self.aliases = kept;
        removed
    }
}

/// Write a store file, creating its directory.
pub(crate) fn write_store(path: &Path, content: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Persist {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }
    std::fs::write(path, content).map_err(|e| StoreError::Persist {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> AliasRegistry {
        AliasRegistry::from_aliases(vec![
            NamingAlias::component("Button", "Button"),
            NamingAlias {
                external_name: "Button".into(),
                code_name: "primary".into(),
                variant: Some("Primary".into()),
                is_external_library: false,
            },
            NamingAlias {
                external_name: "Material/Icon".into(),
                code_name: "Icon".into(),
                variant: None,
                is_external_library: true,
            },
        ])
    }

    #[test]
    fn test_store_format_omits_defaults() {
        let json = AliasRegistry::from_aliases(vec![NamingAlias::component("Button", "Button")])
            .to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "externalName": "Button", "codeName": "Button" }])
        );
    }

    #[test]
    fn test_save_and_load_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".designgen/registry.json");

        let registry = sample();
        registry.save(&path).unwrap();

        let loaded = AliasRegistry::load(&path).unwrap();
        assert_eq!(loaded, registry);
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = TempDir::new().unwrap();
        let loaded = AliasRegistry::load(&dir.path().join("none.json")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_corrupt_store_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AliasRegistry::load(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_lookups() {
        let registry = sample();
        assert_eq!(registry.component("Button").unwrap().code_name, "Button");
        assert_eq!(registry.variant("Button", "Primary").unwrap().code_name, "primary");
        assert!(registry.component_by_code_name("Icon").unwrap().is_external_library);
        assert!(registry.component_by_code_name("ICON").unwrap().is_external_library);
        assert_eq!(registry.variant_code_names("Button"), vec!["primary"]);
    }

    #[test]
    fn test_remove_component_takes_variants() {
        let mut registry = sample();
        let removed = registry.remove_component("Button");
        assert_eq!(removed.len(), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.component("Button").is_none());
    }
}
