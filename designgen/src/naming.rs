//! Naming normalizer.
//!
//! Turns external design names into code identifiers. The rules run in a
//! fixed order:
//!
//! 1. strip configured leading prefix segments (exact, case-sensitive);
//! 2. convert the remainder to PascalCase (components) or camelCase
//!    (variant keys);
//! 3. mark names under a configured external-library prefix;
//! 4. on collision with an alias of a different external name, append the
//!    smallest free numeric suffix.
//!
//! Names already present in the [`AliasRegistry`] always reuse their recorded
//! identifier, which is what keeps regeneration stable across runs.

use crate::config::{ExternalLibrary, NamingConfig};
use crate::model::Catalog;
use crate::registry::{AliasRegistry, NamingAlias};
use convert_case::{Case, Casing};
use std::collections::BTreeMap;

/// Fallback identifier when a name has no usable characters.
const FALLBACK_COMPONENT: &str = "Component";
const FALLBACK_VARIANT: &str = "variant";
const FALLBACK_PROPERTY: &str = "prop";

/// A collision resolved by suffixing. Recorded, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingCollision {
    /// Name that received the suffixed identifier.
    pub external_name: String,

    /// Identifier that was already taken.
    pub candidate: String,

    /// Identifier assigned instead.
    pub assigned: String,
}

/// Identifiers resolved for one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentName {
    /// Identifier of the component.
    pub code_name: String,

    /// Where the component is imported from when it is external.
    pub library: Option<LibraryImport>,

    /// Variant name → variant key.
    pub variants: BTreeMap<String, String>,
}

/// Import of an external-library component.
///
/// `export_name` is what the library exports. It differs from the local
/// code name only when that name had to be suffixed, in which case the
/// import is renamed (`import { Button as Button2 }`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryImport {
    /// Module specifier.
    pub module: String,

    /// Name exported by the module.
    pub export_name: String,
}

/// Resolved identifiers for a whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    names: BTreeMap<String, ComponentName>,
}

impl ComponentName {
    /// Whether the component is imported from an external library.
    pub fn is_external(&self) -> bool {
        self.library.is_some()
    }
}

impl NameTable {
    /// Resolved names for an external name.
    pub fn get(&self, external_name: &str) -> Option<&ComponentName> {
        self.names.get(external_name)
    }

    /// Identifier for an external name.
    pub fn code_name(&self, external_name: &str) -> Option<&str> {
        self.names.get(external_name).map(|n| n.code_name.as_str())
    }

    /// Number of resolved components.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Applies the naming rules against a registry.
#[derive(Debug, Clone)]
pub struct Normalizer<'a> {
    config: &'a NamingConfig,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer for the given rules.
    pub fn new(config: &'a NamingConfig) -> Self {
        Self { config }
    }

    /// External library a name belongs to, by prefix.
    pub fn external_library(&self, external_name: &str) -> Option<&'a ExternalLibrary> {
        self.config
            .external_libraries
            .iter()
            .find(|lib| external_name.starts_with(lib.prefix.as_str()))
    }

    /// Identifier before collision handling (rules 1–3).
    pub fn base_identifier(&self, external_name: &str) -> String {
        let name = match self.external_library(external_name) {
            Some(lib) => &external_name[lib.prefix.len()..],
            None => external_name,
        };

        let segments: Vec<&str> = name.split('/').collect();
        let kept = segments
            .iter()
            .position(|s| !self.config.strip_prefixes.iter().any(|p| p == s))
            .unwrap_or(segments.len().saturating_sub(1));

        to_identifier(&segments[kept..].join(" "), Case::Pascal, FALLBACK_COMPONENT)
    }

    /// Resolve the component identifier for one external name.
    ///
    /// Returns the recorded alias when one exists; otherwise assigns a new
    /// identifier, records it in `registry`, and reports a collision if the
    /// base identifier was taken.
    pub fn normalize(
        &self,
        external_name: &str,
        registry: &mut AliasRegistry,
    ) -> (NamingAlias, Option<NamingCollision>) {
        let is_external = self.external_library(external_name).is_some();
        if let Some(mut alias) = registry.component(external_name).cloned() {
            if alias.is_external_library != is_external {
                registry.set_external_library(external_name, is_external);
                alias.is_external_library = is_external;
            }
            return (alias, None);
        }

        let candidate = self.base_identifier(external_name);
        let assigned = first_free(&candidate, |name| registry.component_by_code_name(name).is_some());

        let collision = (assigned != candidate).then(|| {
            let taken_by = registry
                .component_by_code_name(&candidate)
                .map(|a| a.external_name.clone())
                .unwrap_or_default();
            tracing::warn!(
                external_name,
                candidate = %candidate,
                taken_by = %taken_by,
                assigned = %assigned,
                "naming collision resolved with suffix"
            );
            NamingCollision {
                external_name: external_name.to_string(),
                candidate: candidate.clone(),
                assigned: assigned.clone(),
            }
        });

        let alias = NamingAlias {
            external_name: external_name.to_string(),
            code_name: assigned,
            variant: None,
            is_external_library: is_external,
        };
        registry.insert(alias.clone());
        tracing::debug!(external_name, code_name = %alias.code_name, "registered alias");
        (alias, collision)
    }

    /// Resolve the key of one variant, scoped to its component.
    pub fn normalize_variant(
        &self,
        external_name: &str,
        variant: &str,
        registry: &mut AliasRegistry,
    ) -> String {
        if let Some(existing) = registry.variant(external_name, variant) {
            return existing.code_name.clone();
        }

        let candidate = to_identifier(variant, Case::Camel, FALLBACK_VARIANT);
        let taken = registry.variant_code_names(external_name);
        let assigned = first_free(&candidate, |name| taken.contains(&name));

        registry.insert(NamingAlias {
            external_name: external_name.to_string(),
            code_name: assigned.clone(),
            variant: Some(variant.to_string()),
            is_external_library: false,
        });
        assigned
    }

    /// Resolve every entry of a catalog.
    ///
    /// Names already in the registry keep their identifiers. New names are
    /// assigned in lexicographic order of external name, so the outcome does
    /// not depend on catalog order.
    pub fn assign(
        &self,
        catalog: &Catalog,
        mut registry: AliasRegistry,
    ) -> (NameTable, AliasRegistry, Vec<NamingCollision>) {
        let mut external_names: Vec<&str> =
            catalog.entries.iter().map(|e| e.name.as_str()).collect();
        external_names.sort_unstable();

        let mut collisions = Vec::new();
        let mut names = BTreeMap::new();

        for external_name in external_names {
            let (alias, collision) = self.normalize(external_name, &mut registry);
            collisions.extend(collision);
            names.insert(
                external_name.to_string(),
                ComponentName {
                    code_name: alias.code_name,
                    library: self.external_library(external_name).map(|lib| LibraryImport {
                        module: lib.module.clone(),
                        export_name: self.base_identifier(external_name),
                    }),
                    variants: BTreeMap::new(),
                },
            );
        }

        for entry in &catalog.entries {
            if names.get(&entry.name).is_some_and(|n| n.is_external()) {
                continue;
            }
            let mut variant_names: Vec<&str> =
                entry.variants.iter().map(|v| v.name.as_str()).collect();
            variant_names.sort_unstable();

            let mut keys = BTreeMap::new();
            for variant in variant_names {
                let key = self.normalize_variant(&entry.name, variant, &mut registry);
                keys.insert(variant.to_string(), key);
            }
            if let Some(name) = names.get_mut(&entry.name) {
                name.variants = keys;
            }
        }

        tracing::info!(
            components = names.len(),
            collisions = collisions.len(),
            "resolved component names"
        );

        (NameTable { names }, registry, collisions)
    }
}

/// camelCase property keys for declared property names, disambiguated within
/// one component the same way variant keys are.
pub(crate) fn property_keys<'n>(names: impl IntoIterator<Item = &'n str>) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for name in names {
        let candidate = to_identifier(name, Case::Camel, FALLBACK_PROPERTY);
        let key = first_free(&candidate, |k| keys.iter().any(|taken| taken == k));
        keys.push(key);
    }
    keys
}

/// First of `candidate`, `candidate2`, `candidate3`, ... not taken.
fn first_free(candidate: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(candidate) {
        return candidate.to_string();
    }
    (2..)
        .map(|n| format!("{candidate}{n}"))
        .find(|name| !taken(name))
        .unwrap_or_else(|| candidate.to_string())
}

/// Case a free-form name into an identifier.
fn to_identifier(raw: &str, case: Case, fallback: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let ident: String = cleaned
        .to_case(case)
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();

    if ident.is_empty() {
        fallback.to_string()
    } else if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{ident}")
    } else {
        ident
    }
}
