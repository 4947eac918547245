//! Validated, strongly-typed view of the design export.
//!
//! Values in this module are only produced by [`crate::loader`], so every
//! invariant checked there (resolvable `componentRef`s, known token names,
//! defaults inside their allowed sets) holds for the rest of the pipeline.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// The validated component catalog, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    /// Entries in first-appearance order.
    pub entries: Vec<CatalogEntry>,
}

/// One design component.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    /// External (design tool) name, e.g. `Components/Button`.
    pub name: String,

    /// Stable identity key from the design tool.
    pub key: String,

    /// Optional description, emitted as a doc comment.
    pub description: Option<String>,

    /// Declared properties, in declaration order.
    pub properties: Vec<PropertyDef>,

    /// Variants, in declaration order.
    pub variants: Vec<Variant>,

    /// Auto-layout descriptor.
    pub layout: Option<LayoutDescriptor>,

    /// Children, in declaration order.
    pub children: Vec<ChildRef>,
}

/// Primitive kind of a declared property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    String,
    Number,
    Boolean,
    Enum,
}

/// A literal value as it appears in the export.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Bool(bool),
}

/// A declared component property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKind,
    /// Allowed literal set; empty means any literal of `kind`.
    pub allowed: Vec<LiteralValue>,
    pub default: Option<LiteralValue>,
}

/// A named variant: a property predicate plus the styles it applies.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub name: String,
    pub predicate: BTreeMap<String, LiteralValue>,
    pub style: BTreeMap<String, StyledValue>,
}

/// Auto-layout descriptor of a component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutDescriptor {
    pub axis: Option<StyledValue>,
    pub alignment: Option<StyledValue>,
    pub spacing: Option<StyledValue>,
    pub padding: Option<StyledValue>,
}

/// A child of a catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildRef {
    /// Literal text content.
    Content(String),
    /// Reference to another catalog entry by external name.
    Component(String),
}

/// A style primitive, either a raw literal or a token binding.
#[derive(Debug, Clone, PartialEq)]
pub enum StyledValue {
    Literal(LiteralValue),
    TokenRef {
        name: String,
        /// Literal used when the token cannot be resolved.
        fallback: Option<LiteralValue>,
    },
}

/// One of the four token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenCategory {
    Color,
    Typography,
    Spacing,
    Effect,
}

/// A named design token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub name: String,
    pub value: Value,
    /// Category-specific fields (`fontFamily`, `fontSize`, ...), sorted by key.
    pub extra: Map<String, Value>,
}

/// The four token mappings, each in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenSet {
    pub colors: Vec<Token>,
    pub typography: Vec<Token>,
    pub spacing: Vec<Token>,
    pub effects: Vec<Token>,
}

impl Catalog {
    /// Look up an entry by external name.
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Position of an entry in the source catalog.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }
}

impl CatalogEntry {
    /// External names referenced through `componentRef` children, in order,
    /// without duplicates.
    pub fn component_refs(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = Vec::new();
        for child in &self.children {
            if let ChildRef::Component(name) = child {
                if !refs.contains(&name.as_str()) {
                    refs.push(name);
                }
            }
        }
        refs
    }

    /// Look up a declared property.
    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }
}

impl PropertyKind {
    /// Parse the kind name used in the catalog document.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" | "text" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" | "bool" => Some(Self::Boolean),
            "enum" | "variant" => Some(Self::Enum),
            _ => None,
        }
    }

    /// Whether a literal is of this kind.
    pub fn accepts(&self, value: &LiteralValue) -> bool {
        match (self, value) {
            (Self::String | Self::Enum, LiteralValue::String(_)) => true,
            (Self::Number, LiteralValue::Number(_)) => true,
            (Self::Boolean, LiteralValue::Bool(_)) => true,
            // Enum sets may mix primitives, e.g. sizes `[1, 2, 3]`.
            (Self::Enum, _) => true,
            _ => false,
        }
    }
}

impl PropertyDef {
    /// Whether `value` is a member of this property's value set.
    pub fn allows(&self, value: &LiteralValue) -> bool {
        if !self.kind.accepts(value) {
            return false;
        }
        if self.kind == PropertyKind::Boolean || self.allowed.is_empty() {
            return true;
        }
        self.allowed.contains(value)
    }
}

impl LiteralValue {
    /// Convert a JSON scalar into a literal.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::Bool(b) => Some(Self::Bool(*b)),
            _ => None,
        }
    }

    /// Render as a TypeScript literal.
    pub fn to_ts(&self) -> String {
        match self {
            Self::String(s) => Value::String(s.clone()).to_string(),
            Self::Number(n) => format_number(*n),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Integral numbers print without a fractional part.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl StyledValue {
    /// Token name, if bound.
    pub fn token_name(&self) -> Option<&str> {
        match self {
            Self::TokenRef { name, .. } => Some(name),
            Self::Literal(_) => None,
        }
    }
}

impl TokenCategory {
    /// All categories in emission order.
    pub const ALL: [TokenCategory; 4] = [
        TokenCategory::Color,
        TokenCategory::Typography,
        TokenCategory::Spacing,
        TokenCategory::Effect,
    ];

    /// Array name in the token document and exported constant name.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Color => "colors",
            Self::Typography => "typography",
            Self::Spacing => "spacing",
            Self::Effect => "effects",
        }
    }

    /// Singular label used in logs and coverage reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Typography => "typography",
            Self::Spacing => "spacing",
            Self::Effect => "effect",
        }
    }

    /// Infer the category a style key is expected to bind to.
    pub fn for_style_key(key: &str) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        const COLOR: &[&str] = &["fill", "color", "background", "stroke", "border"];
        const TYPOGRAPHY: &[&str] = &["font", "typography", "text", "letter", "line"];
        const SPACING: &[&str] = &["padding", "gap", "spacing", "margin", "radius", "width", "height"];
        const EFFECT: &[&str] = &["shadow", "effect", "blur", "opacity"];

        // Order matters: `borderRadius` is spacing, `textColor` is color.
        if SPACING.iter().any(|k| key.contains(k)) {
            Some(Self::Spacing)
        } else if EFFECT.iter().any(|k| key.contains(k)) {
            Some(Self::Effect)
        } else if COLOR.iter().any(|k| key.contains(k)) {
            Some(Self::Color)
        } else if TYPOGRAPHY.iter().any(|k| key.contains(k)) {
            Some(Self::Typography)
        } else {
            None
        }
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TokenSet {
    /// Tokens of one category, in insertion order.
    pub fn category(&self, category: TokenCategory) -> &[Token] {
        match category {
            TokenCategory::Color => &self.colors,
            TokenCategory::Typography => &self.typography,
            TokenCategory::Spacing => &self.spacing,
            TokenCategory::Effect => &self.effects,
        }
    }

    pub(crate) fn category_mut(&mut self, category: TokenCategory) -> &mut Vec<Token> {
        match category {
            TokenCategory::Color => &mut self.colors,
            TokenCategory::Typography => &mut self.typography,
            TokenCategory::Spacing => &mut self.spacing,
            TokenCategory::Effect => &mut self.effects,
        }
    }

    /// Look up a token within a category.
    pub fn get(&self, category: TokenCategory, name: &str) -> Option<&Token> {
        self.category(category).iter().find(|t| t.name == name)
    }

    /// First category (in emission order) that defines `name`.
    pub fn category_of(&self, name: &str) -> Option<TokenCategory> {
        TokenCategory::ALL
            .into_iter()
            .find(|c| self.get(*c, name).is_some())
    }

    /// Total number of tokens.
    pub fn len(&self) -> usize {
        TokenCategory::ALL
            .iter()
            .map(|c| self.category(*c).len())
            .sum()
    }

    /// Whether no tokens are defined.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
