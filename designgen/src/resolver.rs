//! Token resolver.
//!
//! Resolves each [`StyledValue`] of a catalog entry against the token set.
//! A binding whose token exists always wins over its literal; anything else
//! falls back to the literal, marked [`ResolvedValue::Unbound`]. Unbound
//! values are counted per category for the coverage report. The resolver
//! never fails on low coverage.

use crate::model::{CatalogEntry, LiteralValue, StyledValue, TokenCategory, TokenSet};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of resolving one styled value.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    /// Reference to a token.
    Token {
        category: TokenCategory,
        name: String,
    },
    /// Literal with no token binding; `None` when a binding failed and no
    /// fallback literal was given.
    Unbound(Option<LiteralValue>),
}

/// Bound/unbound counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCoverage {
    pub bound: usize,
    pub unbound: usize,
}

/// Token coverage over all resolved values of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coverage {
    categories: BTreeMap<TokenCategory, CategoryCoverage>,
    /// Values whose style key maps to no category.
    pub uncategorized: CategoryCoverage,
}

/// Resolved styles of one entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedStyles {
    /// Variant name → style key → value, in variant declaration order.
    pub variants: Vec<(String, BTreeMap<String, ResolvedValue>)>,
    /// Layout field → value, in `axis, alignment, spacing, padding` order.
    pub layout: Vec<(&'static str, ResolvedValue)>,
}

/// Stateful resolver accumulating coverage across entries.
#[derive(Debug)]
pub struct TokenResolver<'a> {
    tokens: &'a TokenSet,
    coverage: Coverage,
}

impl ResolvedValue {
    /// Whether the value resolved to a token.
    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Token { .. })
    }
}

impl CategoryCoverage {
    /// Total values counted.
    pub fn total(&self) -> usize {
        self.bound + self.unbound
    }

    /// Share of bound values in percent; `None` when nothing was counted.
    pub fn percent(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.bound as f64 * 100.0 / total as f64)
    }
}

impl Coverage {
    /// Counts for one category.
    pub fn category(&self, category: TokenCategory) -> CategoryCoverage {
        self.categories.get(&category).copied().unwrap_or_default()
    }

    /// Total unbound values, uncategorized included.
    pub fn unbound(&self) -> usize {
        self.categories.values().map(|c| c.unbound).sum::<usize>() + self.uncategorized.unbound
    }

    fn record(&mut self, category: Option<TokenCategory>, bound: bool) {
        let slot = match category {
            Some(category) => self.categories.entry(category).or_default(),
            None => &mut self.uncategorized,
        };
        if bound {
            slot.bound += 1;
        } else {
            slot.unbound += 1;
        }
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = TokenCategory::ALL
            .iter()
            .map(|c| {
                let counts = self.category(*c);
                match counts.percent() {
                    Some(p) => format!("{c} {p:.0}% ({}/{})", counts.bound, counts.total()),
                    None => format!("{c} n/a"),
                }
            })
            .collect();
        f.write_str(&parts.join(", "))
    }
}

impl<'a> TokenResolver<'a> {
    /// Create a resolver over a token set.
    pub fn new(tokens: &'a TokenSet) -> Self {
        Self {
            tokens,
            coverage: Coverage::default(),
        }
    }

    /// Resolve one value found under `key` (a style key or layout field).
    pub fn resolve(&mut self, key: &str, value: &StyledValue) -> ResolvedValue {
        let hint = TokenCategory::for_style_key(key);

        let resolved = match value {
            StyledValue::TokenRef { name, fallback } => {
                let category = hint
                    .filter(|c| self.tokens.get(*c, name).is_some())
                    .or_else(|| self.tokens.category_of(name));
                match category {
                    Some(category) => ResolvedValue::Token {
                        category,
                        name: name.clone(),
                    },
                    None => {
                        tracing::warn!(key, token = %name, "token binding did not resolve; using literal");
                        ResolvedValue::Unbound(fallback.clone())
                    }
                }
            }
            StyledValue::Literal(literal) => ResolvedValue::Unbound(Some(literal.clone())),
        };

        match &resolved {
            ResolvedValue::Token { category, .. } => self.coverage.record(Some(*category), true),
            ResolvedValue::Unbound(_) => {
                tracing::trace!(key, "unbound style value");
                self.coverage.record(hint, false);
            }
        }

        resolved
    }

    /// Resolve every styled value of an entry.
    pub fn resolve_entry(&mut self, entry: &CatalogEntry) -> ResolvedStyles {
        let variants = entry
            .variants
            .iter()
            .map(|variant| {
                let style = variant
                    .style
                    .iter()
                    .map(|(key, value)| (key.clone(), self.resolve(key, value)))
                    .collect();
                (variant.name.clone(), style)
            })
            .collect();

        let mut layout = Vec::new();
        if let Some(descriptor) = &entry.layout {
            let fields: [(&'static str, &Option<StyledValue>); 4] = [
                ("axis", &descriptor.axis),
                ("alignment", &descriptor.alignment),
                ("spacing", &descriptor.spacing),
                ("padding", &descriptor.padding),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    layout.push((field, self.resolve(field, value)));
                }
            }
        }

        ResolvedStyles { variants, layout }
    }

    /// Coverage collected so far.
    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    /// Finish and return the coverage.
    pub fn into_coverage(self) -> Coverage {
        self.coverage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_documents;

    const TOKENS: &str = r##"{
        "colors": [{ "name": "primary", "value": "#3B82F6" }],
        "typography": [{ "name": "primary", "value": "Inter" }],
        "spacing": [{ "name": "sm", "value": 8 }]
    }"##;

    #[test]
    fn test_token_preferred_over_literal() {
        let export = load_documents("[]", TOKENS).unwrap();
        let mut resolver = TokenResolver::new(&export.tokens);

        let value = StyledValue::TokenRef {
            name: "primary".into(),
            fallback: Some(LiteralValue::String("#000000".into())),
        };
        assert_eq!(
            resolver.resolve("fill", &value),
            ResolvedValue::Token {
                category: TokenCategory::Color,
                name: "primary".into(),
            }
        );
    }

    #[test]
    fn test_style_key_selects_category() {
        let export = load_documents("[]", TOKENS).unwrap();
        let mut resolver = TokenResolver::new(&export.tokens);

        let value = StyledValue::TokenRef {
            name: "primary".into(),
            fallback: None,
        };
        assert_eq!(
            resolver.resolve("fontFamily", &value),
            ResolvedValue::Token {
                category: TokenCategory::Typography,
                name: "primary".into(),
            }
        );
        // Unrecognised keys fall back to the first defining category.
        assert_eq!(
            resolver.resolve("cursor", &value),
            ResolvedValue::Token {
                category: TokenCategory::Color,
                name: "primary".into(),
            }
        );
    }

    #[test]
    fn test_missing_token_falls_back_to_literal() {
        let tokens = TokenSet::default();
        let mut resolver = TokenResolver::new(&tokens);

        let value = StyledValue::TokenRef {
            name: "primary".into(),
            fallback: Some(LiteralValue::String("#3B82F6".into())),
        };
        assert_eq!(
            resolver.resolve("fill", &value),
            ResolvedValue::Unbound(Some(LiteralValue::String("#3B82F6".into())))
        );
        assert_eq!(resolver.coverage().category(TokenCategory::Color).unbound, 1);
    }

    #[test]
    fn test_coverage_counts_per_category() {
        let export = load_documents(
            r##"[{"name":"Button",
                "layout":{"axis":"horizontal","padding":{"tokenName":"sm"},"spacing":4},
                "variants":[{"name":"A","style":{"fill":{"tokenName":"primary"},"stroke":"#000"}}]}]"##,
            TOKENS,
        )
        .unwrap();
        let mut resolver = TokenResolver::new(&export.tokens);
        let styles = resolver.resolve_entry(&export.catalog.entries[0]);

        assert_eq!(styles.variants.len(), 1);
        assert_eq!(
            styles.layout.iter().map(|(f, _)| *f).collect::<Vec<_>>(),
            vec!["axis", "spacing", "padding"]
        );

        let coverage = resolver.into_coverage();
        assert_eq!(
            coverage.category(TokenCategory::Color),
            CategoryCoverage { bound: 1, unbound: 1 }
        );
        assert_eq!(
            coverage.category(TokenCategory::Spacing),
            CategoryCoverage { bound: 1, unbound: 1 }
        );
        assert_eq!(coverage.uncategorized.unbound, 1);
        assert_eq!(coverage.unbound(), 3);
        assert_eq!(coverage.category(TokenCategory::Color).percent(), Some(50.0));
        assert_eq!(coverage.category(TokenCategory::Effect).percent(), None);
    }
}
