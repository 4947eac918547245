//! Catalog and token document loader.
//!
//! Parses the two input documents and validates them together: token
//! bindings in the catalog are checked against the token document loaded in
//! the same call, so a successful load is always cross-referentially
//! consistent. Any problem is reported as a [`SchemaError`] naming the field
//! path, and nothing downstream runs.

use crate::error::{PipelineError, PipelineResult, SchemaError};
use crate::model::{
    Catalog, CatalogEntry, ChildRef, LayoutDescriptor, LiteralValue, PropertyDef, PropertyKind,
    StyledValue, Token, TokenCategory, TokenSet, Variant,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Validated inputs for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignExport {
    pub catalog: Catalog,
    pub tokens: TokenSet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    name: String,
    #[serde(default, alias = "id")]
    key: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "props")]
    properties: Vec<RawProperty>,
    #[serde(default)]
    variants: Vec<RawVariant>,
    #[serde(default, alias = "autoLayout")]
    layout: Option<RawLayout>,
    #[serde(default)]
    children: Vec<RawChild>,
}

#[derive(Debug, Deserialize)]
struct RawProperty {
    name: String,
    #[serde(default, alias = "type")]
    kind: Option<String>,
    #[serde(default, alias = "allowed")]
    values: Vec<Value>,
    #[serde(default)]
    default: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawVariant {
    name: String,
    #[serde(default, alias = "predicate")]
    when: BTreeMap<String, Value>,
    #[serde(default, alias = "styles")]
    style: BTreeMap<String, RawStyledValue>,
}

#[derive(Debug, Deserialize)]
struct RawLayout {
    #[serde(default)]
    axis: Option<RawStyledValue>,
    #[serde(default)]
    alignment: Option<RawStyledValue>,
    #[serde(default)]
    spacing: Option<RawStyledValue>,
    #[serde(default)]
    padding: Option<RawStyledValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStyledValue {
    Bound {
        #[serde(default)]
        literal: Option<Value>,
        #[serde(default, rename = "tokenName")]
        token_name: Option<String>,
    },
    Bare(Value),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawChild {
    Component {
        #[serde(rename = "componentRef")]
        component_ref: String,
    },
    Content {
        content: String,
    },
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawToken {
    name: String,
    #[serde(default)]
    value: Value,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Load and validate both documents from disk.
pub fn load_files(catalog_path: &Path, tokens_path: &Path) -> PipelineResult<DesignExport> {
    let read = |path: &Path| {
        std::fs::read_to_string(path).map_err(|e| PipelineError::Input {
            path: path.to_path_buf(),
            source: e,
        })
    };
    let catalog = read(catalog_path)?;
    let tokens = read(tokens_path)?;
    Ok(load_documents(&catalog, &tokens)?)
}

/// Load and validate both documents from their JSON text.
pub fn load_documents(catalog_json: &str, tokens_json: &str) -> Result<DesignExport, SchemaError> {
    let tokens_doc: Value = serde_json::from_str(tokens_json)
        .map_err(|e| SchemaError::new("tokens", format!("invalid JSON: {e}")))?;
    let catalog_doc: Value = serde_json::from_str(catalog_json)
        .map_err(|e| SchemaError::new("catalog", format!("invalid JSON: {e}")))?;

    let tokens = load_tokens(&tokens_doc)?;
    let catalog = load_catalog(&catalog_doc, &tokens)?;

    tracing::info!(
        entries = catalog.entries.len(),
        tokens = tokens.len(),
        "loaded design export"
    );

    Ok(DesignExport { catalog, tokens })
}

/// Parse and validate the token document.
pub fn load_tokens(doc: &Value) -> Result<TokenSet, SchemaError> {
    let object = doc
        .as_object()
        .ok_or_else(|| SchemaError::new("tokens", "expected an object of token arrays"))?;

    let mut tokens = TokenSet::default();
    for category in TokenCategory::ALL {
        let collection = category.collection();
        let Some(items) = object.get(collection) else {
            continue;
        };
        let items = items.as_array().ok_or_else(|| {
            SchemaError::new(format!("tokens.{collection}"), "expected an array")
        })?;

        let mut seen = HashSet::new();
        for (index, item) in items.iter().enumerate() {
            let path = format!("tokens.{collection}[{index}]");
            let raw: RawToken = deserialize(&path, item)?;

            if raw.name.trim().is_empty() {
                return Err(SchemaError::new(format!("{path}.name"), "token name is empty"));
            }
            if !seen.insert(raw.name.clone()) {
                return Err(SchemaError::new(
                    format!("{path}.name"),
                    format!("duplicate {} token '{}'", category.label(), raw.name),
                ));
            }
            if raw.value.is_null() && raw.extra.is_empty() {
                return Err(SchemaError::new(
                    format!("{path}.value"),
                    format!("token '{}' has no value", raw.name),
                ));
            }

            tokens.category_mut(category).push(Token {
                name: raw.name,
                value: raw.value,
                extra: raw.extra,
            });
        }
    }

    Ok(tokens)
}

/// Parse and validate the catalog document against an already loaded token set.
pub fn load_catalog(doc: &Value, tokens: &TokenSet) -> Result<Catalog, SchemaError> {
    let items = doc
        .as_array()
        .ok_or_else(|| SchemaError::new("catalog", "expected an array of components"))?;

    let mut raw_entries = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let raw: RawEntry = deserialize(&format!("catalog[{index}]"), item)?;
        raw_entries.push(raw);
    }

    let mut names: HashSet<String> = HashSet::new();
    let mut keys: HashSet<String> = HashSet::new();
    for (index, raw) in raw_entries.iter().enumerate() {
        if raw.name.trim().is_empty() {
            return Err(SchemaError::new(
                format!("catalog[{index}].name"),
                "component name is empty",
            ));
        }
        if !names.insert(raw.name.clone()) {
            return Err(SchemaError::new(
                format!("catalog[{index}].name"),
                format!("duplicate component '{}'", raw.name),
            ));
        }
        let key = raw.key.as_deref().unwrap_or(&raw.name);
        if !keys.insert(key.to_string()) {
            return Err(SchemaError::new(
                format!("catalog[{index}].key"),
                format!("duplicate identity key '{key}'"),
            ));
        }
    }

    let mut entries = Vec::with_capacity(raw_entries.len());
    for (index, raw) in raw_entries.into_iter().enumerate() {
        entries.push(convert_entry(index, raw, &names, tokens)?);
    }

    Ok(Catalog { entries })
}

fn convert_entry(
    index: usize,
    raw: RawEntry,
    names: &HashSet<String>,
    tokens: &TokenSet,
) -> Result<CatalogEntry, SchemaError> {
    let base = format!("catalog[{index}]");

    let mut properties: Vec<PropertyDef> = Vec::with_capacity(raw.properties.len());
    for (p, prop) in raw.properties.into_iter().enumerate() {
        let path = format!("{base}.properties[{p}]");
        if properties.iter().any(|existing| existing.name == prop.name) {
            return Err(SchemaError::new(
                format!("{path}.name"),
                format!("duplicate property '{}'", prop.name),
            ));
        }
        properties.push(convert_property(&path, prop)?);
    }

    let mut variants: Vec<Variant> = Vec::with_capacity(raw.variants.len());
    for (v, variant) in raw.variants.into_iter().enumerate() {
        let path = format!("{base}.variants[{v}]");
        if variants.iter().any(|existing| existing.name == variant.name) {
            return Err(SchemaError::new(
                format!("{path}.name"),
                format!("duplicate variant '{}'", variant.name),
            ));
        }

        let mut predicate = BTreeMap::new();
        for (prop_name, value) in variant.when {
            let value_path = format!("{path}.when.{prop_name}");
            let prop = properties
                .iter()
                .find(|p| p.name == prop_name)
                .ok_or_else(|| {
                    SchemaError::new(&value_path, format!("undeclared property '{prop_name}'"))
                })?;
            let literal = scalar(&value_path, &value)?;
            if !prop.allows(&literal) {
                return Err(SchemaError::new(
                    &value_path,
                    format!("value {literal} is not allowed for property '{prop_name}'"),
                ));
            }
            predicate.insert(prop_name, literal);
        }

        let mut style = BTreeMap::new();
        for (key, value) in variant.style {
            let value_path = format!("{path}.style.{key}");
            style.insert(key, convert_styled(&value_path, value, tokens)?);
        }

        variants.push(Variant {
            name: variant.name,
            predicate,
            style,
        });
    }

    let layout = match raw.layout {
        Some(layout) => {
            let path = format!("{base}.layout");
            let field = |name: &str, value: Option<RawStyledValue>| {
                value
                    .map(|v| convert_styled(&format!("{path}.{name}"), v, tokens))
                    .transpose()
            };
            Some(LayoutDescriptor {
                axis: field("axis", layout.axis)?,
                alignment: field("alignment", layout.alignment)?,
                spacing: field("spacing", layout.spacing)?,
                padding: field("padding", layout.padding)?,
            })
        }
        None => None,
    };

    let mut children = Vec::with_capacity(raw.children.len());
    for (c, child) in raw.children.into_iter().enumerate() {
        children.push(match child {
            RawChild::Component { component_ref } => {
                if !names.contains(component_ref.as_str()) {
                    return Err(SchemaError::new(
                        format!("{base}.children[{c}].componentRef"),
                        format!("unresolved component reference '{component_ref}'"),
                    ));
                }
                ChildRef::Component(component_ref)
            }
            RawChild::Content { content } | RawChild::Text(content) => ChildRef::Content(content),
        });
    }

    Ok(CatalogEntry {
        key: raw.key.unwrap_or_else(|| raw.name.clone()),
        name: raw.name,
        description: raw.description,
        properties,
        variants,
        layout,
        children,
    })
}

fn convert_property(path: &str, raw: RawProperty) -> Result<PropertyDef, SchemaError> {
    let allowed = raw
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| scalar(&format!("{path}.values[{i}]"), v))
        .collect::<Result<Vec<_>, _>>()?;
    let default = raw
        .default
        .as_ref()
        .map(|v| scalar(&format!("{path}.default"), v))
        .transpose()?;

    let kind = match raw.kind.as_deref() {
        Some(kind) => PropertyKind::parse(kind).ok_or_else(|| {
            SchemaError::new(format!("{path}.kind"), format!("unknown property kind '{kind}'"))
        })?,
        None => infer_kind(&allowed, default.as_ref()),
    };

    if kind == PropertyKind::Enum && allowed.is_empty() {
        return Err(SchemaError::new(
            format!("{path}.values"),
            format!("enum property '{}' declares no values", raw.name),
        ));
    }
    for (i, value) in allowed.iter().enumerate() {
        if !kind.accepts(value) {
            return Err(SchemaError::new(
                format!("{path}.values[{i}]"),
                format!("value {value} does not match the property kind"),
            ));
        }
    }

    let prop = PropertyDef {
        name: raw.name,
        kind,
        allowed,
        default,
    };

    if let Some(default) = &prop.default {
        if !prop.allows(default) {
            return Err(SchemaError::new(
                format!("{path}.default"),
                format!(
                    "default {default} is not in the value set of property '{}'",
                    prop.name
                ),
            ));
        }
    }

    Ok(prop)
}

fn infer_kind(allowed: &[LiteralValue], default: Option<&LiteralValue>) -> PropertyKind {
    if !allowed.is_empty() {
        if allowed.iter().all(|v| matches!(v, LiteralValue::Bool(_))) {
            return PropertyKind::Boolean;
        }
        return PropertyKind::Enum;
    }
    match default {
        Some(LiteralValue::Number(_)) => PropertyKind::Number,
        Some(LiteralValue::Bool(_)) => PropertyKind::Boolean,
        _ => PropertyKind::String,
    }
}

fn convert_styled(
    path: &str,
    raw: RawStyledValue,
    tokens: &TokenSet,
) -> Result<StyledValue, SchemaError> {
    match raw {
        RawStyledValue::Bound {
            literal,
            token_name: Some(name),
        } => {
            if tokens.category_of(&name).is_none() {
                return Err(SchemaError::new(
                    format!("{path}.tokenName"),
                    format!("unknown token '{name}'"),
                ));
            }
            let fallback = literal
                .as_ref()
                .map(|v| scalar(&format!("{path}.literal"), v))
                .transpose()?;
            Ok(StyledValue::TokenRef { name, fallback })
        }
        RawStyledValue::Bound {
            literal: Some(literal),
            token_name: None,
        } => Ok(StyledValue::Literal(scalar(
            &format!("{path}.literal"),
            &literal,
        )?)),
        RawStyledValue::Bound {
            literal: None,
            token_name: None,
        } => Err(SchemaError::new(
            path,
            "styled value needs a literal or a tokenName",
        )),
        RawStyledValue::Bare(value) => Ok(StyledValue::Literal(scalar(path, &value)?)),
    }
}

/// Deserialize one record, reporting shape errors at the offending field
/// below `base`.
fn deserialize<'de, T: Deserialize<'de>>(base: &str, value: &'de Value) -> Result<T, SchemaError> {
    serde_path_to_error::deserialize(value).map_err(|e| {
        let path = field_path(base, &e.path().to_string());
        SchemaError::new(path, e.into_inner().to_string())
    })
}

/// Append a serde field path (`properties[0].values`, or `.` for the
/// record itself) to a base path.
fn field_path(base: &str, field: &str) -> String {
    if field.is_empty() || field == "." {
        base.to_string()
    } else if field.starts_with('[') {
        format!("{base}{field}")
    } else {
        format!("{base}.{field}")
    }
}

fn scalar(path: &str, value: &Value) -> Result<LiteralValue, SchemaError> {
    LiteralValue::from_json(value)
        .ok_or_else(|| SchemaError::new(path, format!("expected a string, number or boolean, got {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKENS: &str = r##"{
        "colors": [{ "name": "primary", "value": "#3B82F6" }],
        "spacing": [{ "name": "sm", "value": 8 }]
    }"##;

    fn load(catalog: &str) -> Result<DesignExport, SchemaError> {
        load_documents(catalog, TOKENS)
    }

    #[test]
    fn test_loads_scenario_button() {
        let export = load(
            r#"[{"name":"Button","props":[{"name":"variant","values":["primary","secondary"],"default":"primary"}]}]"#,
        )
        .unwrap();

        let button = &export.catalog.entries[0];
        assert_eq!(button.name, "Button");
        assert_eq!(button.key, "Button");
        assert_eq!(button.properties[0].kind, PropertyKind::Enum);
        assert_eq!(
            button.properties[0].default,
            Some(LiteralValue::String("primary".into()))
        );
        assert_eq!(export.tokens.colors[0].name, "primary");
    }

    #[test]
    fn test_default_outside_value_set_is_rejected() {
        let err = load(
            r#"[{"name":"Button","properties":[{"name":"variant","values":["primary"],"default":"ghost"}]}]"#,
        )
        .unwrap_err();
        assert_eq!(err.path, "catalog[0].properties[0].default");
    }

    #[test]
    fn test_predicate_on_undeclared_property_is_rejected() {
        let err = load(
            r#"[{"name":"Button","variants":[{"name":"Big","when":{"size":"lg"}}]}]"#,
        )
        .unwrap_err();
        assert_eq!(err.path, "catalog[0].variants[0].when.size");
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let err = load(
            r#"[{"name":"Button","variants":[{"name":"A","style":{"fill":{"tokenName":"brand"}}}]}]"#,
        )
        .unwrap_err();
        assert_eq!(err.path, "catalog[0].variants[0].style.fill.tokenName");
    }

    #[test]
    fn test_unresolved_component_ref_is_rejected() {
        let err = load(r#"[{"name":"Card","children":[{"componentRef":"Missing"}]}]"#).unwrap_err();
        assert_eq!(err.path, "catalog[0].children[0].componentRef");
    }

    #[test]
    fn test_duplicate_token_name_is_rejected() {
        let err = load_documents(
            "[]",
            r##"{"colors":[{"name":"a","value":"#000"},{"name":"a","value":"#fff"}]}"##,
        )
        .unwrap_err();
        assert_eq!(err.path, "tokens.colors[1].name");
    }

    #[test]
    fn test_styled_values_become_tagged() {
        let export = load(
            r##"[{"name":"Button","layout":{"axis":"horizontal","spacing":{"tokenName":"sm","literal":4}},
                 "variants":[{"name":"A","style":{"fill":{"literal":"#fff"}}}]}]"##,
        )
        .unwrap();
        let entry = &export.catalog.entries[0];
        let layout = entry.layout.as_ref().unwrap();
        assert_eq!(
            layout.axis,
            Some(StyledValue::Literal(LiteralValue::String("horizontal".into())))
        );
        assert_eq!(
            layout.spacing,
            Some(StyledValue::TokenRef {
                name: "sm".into(),
                fallback: Some(LiteralValue::Number(4.0)),
            })
        );
        assert_eq!(
            entry.variants[0].style["fill"],
            StyledValue::Literal(LiteralValue::String("#fff".into()))
        );
    }

    #[test]
    fn test_children_shapes() {
        let export = load(
            r#"[{"name":"Icon"},{"name":"Card","children":[{"componentRef":"Icon"},{"content":"Title"},"Body"]}]"#,
        )
        .unwrap();
        assert_eq!(
            export.catalog.entries[1].children,
            vec![
                ChildRef::Component("Icon".into()),
                ChildRef::Content("Title".into()),
                ChildRef::Content("Body".into()),
            ]
        );
    }

    #[test]
    fn test_missing_name_reports_entry_path() {
        let err = load(r#"[{"properties":[]}]"#).unwrap_err();
        assert_eq!(err.path, "catalog[0]");
        assert!(err.message.contains("name"));
    }

    #[test]
    fn test_wrong_shape_reports_field_path() {
        let err = load(r#"[{"name":"Button","properties":[{"name":"variant","values":"primary"}]}]"#)
            .unwrap_err();
        assert_eq!(err.path, "catalog[0].properties[0].values");
        assert!(err.message.contains("expected a sequence"));

        let err = load(r#"[{"name":"Icon"},{"name":"Card","variants":[{"name":7}]}]"#).unwrap_err();
        assert_eq!(err.path, "catalog[1].variants[0].name");
    }

    #[test]
    fn test_wrong_token_shape_reports_field_path() {
        let err = load_documents("[]", r##"{"colors":[{"name":3,"value":"#000"}]}"##).unwrap_err();
        assert_eq!(err.path, "tokens.colors[0].name");
    }

    #[test]
    fn test_field_path_joining() {
        assert_eq!(field_path("catalog[0]", "."), "catalog[0]");
        assert_eq!(field_path("catalog[0]", "layout.axis"), "catalog[0].layout.axis");
        assert_eq!(field_path("tokens.colors", "[2]"), "tokens.colors[2]");
    }

    #[test]
    fn test_invalid_json_is_schema_error() {
        let err = load("[{").unwrap_err();
        assert_eq!(err.path, "catalog");
    }
}
