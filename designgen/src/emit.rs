//! Artifact emitter.
//!
//! Produces every output file as an [`Artifact`] in write order: the four
//! token modules, the token re-export, component stubs in build order,
//! preview stories (when enabled) and finally the export manifest. Emission
//! is pure; merging with what is already on disk happens in [`crate::merge`].

use crate::artifact::{Artifact, ArtifactContent, ArtifactKind};
use crate::graph::BuildOrder;
use crate::model::{
    Catalog, CatalogEntry, ChildRef, LiteralValue, PropertyDef, PropertyKind, Token,
    TokenCategory, TokenSet,
};
use crate::naming::{property_keys, ComponentName, NameTable};
use crate::resolver::{Coverage, ResolvedStyles, ResolvedValue, TokenResolver};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

/// Directory of token modules, relative to the output directory.
pub const TOKENS_DIR: &str = "tokens";

/// Directory of component stubs and stories.
pub const COMPONENTS_DIR: &str = "components";

/// Module the stories import their types from.
const STORYBOOK_MODULE: &str = "@storybook/react";

/// Everything emitted for one run.
#[derive(Debug, Clone)]
pub struct Emission {
    /// Artifacts in write order.
    pub artifacts: Vec<Artifact>,

    /// Token coverage over the emitted stubs.
    pub coverage: Coverage,
}

/// Renders artifacts from the validated export and resolved names.
#[derive(Debug, Clone)]
pub struct Emitter<'a> {
    catalog: &'a Catalog,
    tokens: &'a TokenSet,
    names: &'a NameTable,
    stories: bool,
}

impl<'a> Emitter<'a> {
    /// Create an emitter.
    pub fn new(catalog: &'a Catalog, tokens: &'a TokenSet, names: &'a NameTable) -> Self {
        Self {
            catalog,
            tokens,
            names,
            stories: false,
        }
    }

    /// Also emit a preview story per stub.
    pub fn with_stories(mut self, stories: bool) -> Self {
        self.stories = stories;
        self
    }

    /// Emit all artifacts, stubs following `order`.
    pub fn emit(&self, order: &BuildOrder) -> Emission {
        let mut artifacts = Vec::new();

        for category in TokenCategory::ALL {
            artifacts.push(self.token_module(category));
        }
        artifacts.push(self.token_index());

        let mut resolver = TokenResolver::new(self.tokens);
        let mut stubs: Vec<(&CatalogEntry, &ComponentName)> = Vec::new();
        for name in order.names() {
            let Some(entry) = self.catalog.get(name) else {
                continue;
            };
            let Some(component) = self.names.get(name) else {
                continue;
            };
            if component.is_external() {
                tracing::debug!(component = name, "external library component, no stub");
                continue;
            }
            let styles = resolver.resolve_entry(entry);
            artifacts.push(self.stub(entry, component, &styles));
            stubs.push((entry, component));
        }

        if self.stories {
            for (entry, component) in &stubs {
                artifacts.push(self.story(entry, component));
            }
        }

        artifacts.push(self.manifest(&stubs));

        tracing::info!(
            artifacts = artifacts.len(),
            stubs = stubs.len(),
            "emitted artifacts"
        );

        Emission {
            artifacts,
            coverage: resolver.into_coverage(),
        }
    }

    fn token_module(&self, category: TokenCategory) -> Artifact {
        let collection = category.collection();
        let tokens = self.tokens.category(category);

        let mut output = String::new();
        if tokens.is_empty() {
            output.push_str(&format!("export const {collection} = {{}} as const;\n"));
        } else {
            output.push_str(&format!("export const {collection} = {{\n"));
            for token in tokens {
                output.push_str(&format!(
                    "  {}: {},\n",
                    property_key(&token.name),
                    token_value(token)
                ));
            }
            output.push_str("} as const;\n");
        }
        output.push_str(&format!(
            "\nexport type {} = keyof typeof {collection};\n",
            token_type_name(category)
        ));

        Artifact {
            kind: ArtifactKind::TokenModule(category),
            path: PathBuf::from(TOKENS_DIR).join(format!("{collection}.ts")),
            content: ArtifactContent::new(output, ""),
        }
    }

    fn token_index(&self) -> Artifact {
        let mut output = String::new();
        for category in TokenCategory::ALL {
            let collection = category.collection();
            output.push_str(&format!("export {{ {collection} }} from \"./{collection}\";\n"));
            output.push_str(&format!(
                "export type {{ {} }} from \"./{collection}\";\n",
                token_type_name(category)
            ));
        }

        Artifact {
            kind: ArtifactKind::TokenIndex,
            path: PathBuf::from(TOKENS_DIR).join("index.ts"),
            content: ArtifactContent::new(output, ""),
        }
    }

    fn stub(
        &self,
        entry: &CatalogEntry,
        component: &ComponentName,
        styles: &ResolvedStyles,
    ) -> Artifact {
        let code_name = &component.code_name;
        let prefix = lower_first(code_name);
        let keys: HashMap<&str, String> = entry
            .properties
            .iter()
            .map(|p| p.name.as_str())
            .zip(property_keys(entry.properties.iter().map(|p| p.name.as_str())))
            .collect();
        let prop_key = |name: &str| {
            keys.get(name)
                .cloned()
                .unwrap_or_else(|| property_key(name))
        };

        let mut output = String::new();
        output.push_str(&format!(
            "// {code_name}: generated from design component {}.\n",
            Value::String(entry.name.clone())
        ));

        let imports = self.stub_imports(entry, styles);
        if !imports.is_empty() {
            output.push_str(&imports);
        }
        output.push('\n');

        // Props
        if let Some(description) = &entry.description {
            output.push_str(&doc_comment(description));
        }
        if entry.properties.is_empty() {
            output.push_str(&format!("export interface {code_name}Props {{}}\n"));
        } else {
            output.push_str(&format!("export interface {code_name}Props {{\n"));
            for prop in &entry.properties {
                output.push_str(&format!(
                    "  {}?: {};\n",
                    prop_key(&prop.name),
                    property_type(prop)
                ));
            }
            output.push_str("}\n");
        }

        // Defaults
        let defaults: Vec<String> = entry
            .properties
            .iter()
            .filter_map(|p| {
                p.default
                    .as_ref()
                    .map(|d| format!("  {}: {},\n", prop_key(&p.name), d.to_ts()))
            })
            .collect();
        output.push_str(&format!(
            "\nexport const {prefix}Defaults: Partial<{code_name}Props> = {{"
        ));
        if defaults.is_empty() {
            output.push_str("};\n");
        } else {
            output.push('\n');
            output.push_str(&defaults.concat());
            output.push_str("};\n");
        }

        // Variants
        output.push_str(&format!("\nexport const {prefix}Variants = {{"));
        if styles.variants.is_empty() {
            output.push_str("} as const;\n");
        } else {
            output.push('\n');
            for (variant, (name, style)) in entry.variants.iter().zip(&styles.variants) {
                let key = component
                    .variants
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| property_key(name));
                let when: Vec<String> = variant
                    .predicate
                    .iter()
                    .map(|(prop, value)| format!("{}: {}", prop_key(prop), value.to_ts()))
                    .collect();

                output.push_str(&format!("  {}: {{\n", property_key(&key)));
                output.push_str(&format!("    when: {},\n", inline_object(&when)));
                if style.is_empty() {
                    output.push_str("    style: {},\n");
                } else {
                    output.push_str("    style: {\n");
                    for (style_key, value) in style {
                        output.push_str(&format!(
                            "      {}: {},\n",
                            property_key(style_key),
                            resolved_to_ts(style_key, value)
                        ));
                    }
                    output.push_str("    },\n");
                }
                output.push_str("  },\n");
            }
            output.push_str("} as const;\n");
        }

        // Layout
        output.push_str(&format!("\nexport const {prefix}Layout = {{"));
        if styles.layout.is_empty() {
            output.push_str("} as const;\n");
        } else {
            output.push('\n');
            for (field, value) in &styles.layout {
                output.push_str(&format!("  {field}: {},\n", resolved_to_ts(field, value)));
            }
            output.push_str("} as const;\n");
        }

        // Children
        output.push_str(&format!("\nexport const {prefix}Children = ["));
        if entry.children.is_empty() {
            output.push_str("] as const;\n");
        } else {
            output.push('\n');
            for child in &entry.children {
                match child {
                    ChildRef::Component(name) => {
                        let child_name = self.names.code_name(name).unwrap_or(name);
                        output.push_str(&format!("  {{ component: {child_name} }},\n"));
                    }
                    ChildRef::Content(text) => {
                        output.push_str(&format!(
                            "  {{ content: {} }},\n",
                            Value::String(text.clone())
                        ));
                    }
                }
            }
            output.push_str("] as const;\n");
        }

        let scaffold = format!(
            "\nexport function {code_name}(props: {code_name}Props) {{\n  \
             const resolved: {code_name}Props = {{ ...{prefix}Defaults, ...props }};\n  \
             // Render with {prefix}Variants, {prefix}Layout and {prefix}Children.\n  \
             void resolved;\n  \
             return null;\n\
             }}\n"
        );

        tracing::debug!(component = %entry.name, code_name = %code_name, "rendered stub");

        Artifact {
            kind: ArtifactKind::ComponentStub(entry.name.clone()),
            path: PathBuf::from(COMPONENTS_DIR).join(format!("{code_name}.tsx")),
            content: ArtifactContent::new(output, scaffold),
        }
    }

    fn stub_imports(&self, entry: &CatalogEntry, styles: &ResolvedStyles) -> String {
        let categories: BTreeSet<TokenCategory> = styles
            .variants
            .iter()
            .flat_map(|(_, style)| style.values())
            .chain(styles.layout.iter().map(|(_, value)| value))
            .filter_map(|value| match value {
                ResolvedValue::Token { category, .. } => Some(*category),
                ResolvedValue::Unbound(_) => None,
            })
            .collect();

        let mut external: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        let mut local: BTreeSet<&str> = BTreeSet::new();
        for name in entry.component_refs() {
            let Some(child) = self.names.get(name) else {
                continue;
            };
            match &child.library {
                Some(import) => {
                    let specifier = if import.export_name == child.code_name {
                        child.code_name.clone()
                    } else {
                        format!("{} as {}", import.export_name, child.code_name)
                    };
                    external
                        .entry(import.module.as_str())
                        .or_default()
                        .insert(specifier);
                }
                None => {
                    local.insert(child.code_name.as_str());
                }
            }
        }

        let mut output = String::new();
        if !categories.is_empty() {
            let collections: Vec<&str> = categories.iter().map(|c| c.collection()).collect();
            output.push_str(&format!(
                "import {{ {} }} from \"../{TOKENS_DIR}\";\n",
                collections.join(", ")
            ));
        }
        for (module, names) in external {
            let names: Vec<String> = names.into_iter().collect();
            output.push_str(&format!(
                "import {{ {} }} from {};\n",
                names.join(", "),
                Value::String(module.to_string())
            ));
        }
        for name in local {
            output.push_str(&format!("import {{ {name} }} from \"./{name}\";\n"));
        }
        output
    }

    fn story(&self, entry: &CatalogEntry, component: &ComponentName) -> Artifact {
        let code_name = &component.code_name;
        let prefix = lower_first(code_name);

        let mut output = String::new();
        output.push_str(&format!(
            "import type {{ Meta, StoryObj }} from \"{STORYBOOK_MODULE}\";\n"
        ));
        output.push_str(&format!(
            "import {{ {code_name}, {prefix}Defaults, {prefix}Variants }} from \"./{code_name}\";\n"
        ));
        output.push_str(&format!(
            "\nconst meta: Meta<typeof {code_name}> = {{\n  title: {},\n  component: {code_name},\n  args: {prefix}Defaults,\n}};\n",
            Value::String(entry.name.clone())
        ));
        output.push_str("\nexport default meta;\n");
        output.push_str(&format!("\ntype Story = StoryObj<typeof {code_name}>;\n"));
        output.push_str("\nexport const Default: Story = {};\n");

        for variant in &entry.variants {
            let Some(key) = component.variants.get(&variant.name) else {
                continue;
            };
            let mut story_name = upper_first(key);
            if story_name == "Default" {
                story_name.push_str("Variant");
            }
            output.push_str(&format!(
                "\nexport const {story_name}: Story = {{\n  args: {{ ...{prefix}Defaults, ...{prefix}Variants.{key}.when }},\n}};\n"
            ));
        }

        Artifact {
            kind: ArtifactKind::Story(entry.name.clone()),
            path: PathBuf::from(COMPONENTS_DIR).join(format!("{code_name}.stories.tsx")),
            content: ArtifactContent::new(output, ""),
        }
    }

    fn manifest(&self, stubs: &[(&CatalogEntry, &ComponentName)]) -> Artifact {
        let mut output = format!("export * from \"./{TOKENS_DIR}\";\n");
        for (_, component) in stubs {
            output.push_str(&format!(
                "export * from \"./{COMPONENTS_DIR}/{}\";\n",
                component.code_name
            ));
        }

        Artifact {
            kind: ArtifactKind::Manifest,
            path: PathBuf::from("index.ts"),
            content: ArtifactContent::new(output, ""),
        }
    }
}

/// `ColorToken`, `TypographyToken`, ...
fn token_type_name(category: TokenCategory) -> String {
    format!("{}Token", upper_first(category.label()))
}

fn token_value(token: &Token) -> String {
    if token.extra.is_empty() {
        return json_to_ts(&token.value);
    }
    let mut fields = vec![format!("value: {}", json_to_ts(&token.value))];
    fields.extend(
        token
            .extra
            .iter()
            .map(|(key, value)| format!("{}: {}", property_key(key), json_to_ts(value))),
    );
    inline_object(&fields)
}

fn json_to_ts(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(json_to_ts).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{}: {}", property_key(key), json_to_ts(value)))
                .collect();
            inline_object(&fields)
        }
        // JSON scalars are valid TypeScript literals.
        other => other.to_string(),
    }
}

fn inline_object(fields: &[String]) -> String {
    if fields.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", fields.join(", "))
    }
}

fn property_type(prop: &PropertyDef) -> String {
    if prop.kind != PropertyKind::Boolean && !prop.allowed.is_empty() {
        let members: Vec<String> = prop.allowed.iter().map(LiteralValue::to_ts).collect();
        return members.join(" | ");
    }
    match prop.kind {
        PropertyKind::String | PropertyKind::Enum => "string",
        PropertyKind::Number => "number",
        PropertyKind::Boolean => "boolean",
    }
    .to_string()
}

fn resolved_to_ts(key: &str, value: &ResolvedValue) -> String {
    match value {
        ResolvedValue::Token { category, name } => token_access(category.collection(), name),
        ResolvedValue::Unbound(literal) => {
            let text = literal
                .as_ref()
                .map(LiteralValue::to_ts)
                .unwrap_or_else(|| "undefined".to_string());
            if TokenCategory::for_style_key(key).is_some() {
                format!("{text} /* unbound */")
            } else {
                text
            }
        }
    }
}

fn token_access(collection: &str, name: &str) -> String {
    if is_identifier(name) {
        format!("{collection}.{name}")
    } else {
        format!("{collection}[{}]", Value::String(name.to_string()))
    }
}

/// Object key, quoted when it is not a plain identifier.
fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        Value::String(name.to_string()).to_string()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn doc_comment(text: &str) -> String {
    let mut output = String::from("/**\n");
    for line in text.replace("*/", "*\\/").lines() {
        if line.trim().is_empty() {
            output.push_str(" *\n");
        } else {
            output.push_str(&format!(" * {}\n", line.trim_end()));
        }
    }
    output.push_str(" */\n");
    output
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
