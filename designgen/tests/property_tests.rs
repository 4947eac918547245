//! Property-based tests for designgen.
//!
//! These tests check the ordering, naming and resolution guarantees using
//! the proptest framework.
//!
//! Properties tested:
//! - Property 1: Dependencies Precede Dependents
//! - Property 2: Naming Is Independent of Catalog Order
//! - Property 3: Recorded Names Are Stable
//! - Property 4: Naming Is Idempotent
//! - Property 5: Tokens Win Over Literals
//! - Property 6: Dry Run Safety

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use tempfile::TempDir;

use designgen::{
    config::{Config, NamingConfig},
    graph::DependencyGraph,
    hooks::{HookRunner, HookStatus},
    load_documents,
    model::{LiteralValue, StyledValue, Token, TokenCategory, TokenSet},
    naming::Normalizer,
    resolver::{ResolvedValue, TokenResolver},
    AliasRegistry, Pipeline,
};

// =============================================================================
// Generators for property tests
// =============================================================================

/// Component names that often normalize to the same identifier.
fn arb_component_names() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("(DS/)?[ab][ -]?[ab]?", 1..6)
}

/// Acyclic dependency masks: entry `i` may depend only on entries `j < i`.
fn arb_dag() -> impl Strategy<Value = Vec<Vec<bool>>> {
    prop::collection::vec(prop::collection::vec(any::<bool>(), 8), 1..8)
}

fn catalog_json(names: &[String]) -> String {
    let entries: Vec<Value> = names.iter().map(|n| json!({ "name": n })).collect();
    Value::Array(entries).to_string()
}

/// Catalog of `C0..Cn` following `deps`, written in the order of `shuffle`.
fn dag_catalog(deps: &[Vec<bool>], shuffle: &[u32]) -> String {
    let mut entries: Vec<(u32, Value)> = deps
        .iter()
        .enumerate()
        .map(|(i, mask)| {
            let children: Vec<Value> = (0..i)
                .filter(|j| mask[*j])
                .map(|j| json!({ "componentRef": format!("C{j}") }))
                .collect();
            let rank = shuffle.get(i).copied().unwrap_or_default();
            (rank, json!({ "name": format!("C{i}"), "children": children }))
        })
        .collect();
    entries.sort_by_key(|(rank, _)| *rank);
    Value::Array(entries.into_iter().map(|(_, e)| e).collect()).to_string()
}

fn naming_config() -> NamingConfig {
    NamingConfig {
        strip_prefixes: vec!["DS".into()],
        ..Default::default()
    }
}

fn color(name: &str, value: &str) -> Token {
    Token {
        name: name.into(),
        value: Value::String(value.into()),
        extra: Map::new(),
    }
}

struct NoHooks;

impl HookRunner for NoHooks {
    fn run(&mut self, _hook: &designgen::config::HookConfig) -> std::io::Result<HookStatus> {
        Ok(HookStatus { code: Some(0) })
    }
}

// =============================================================================
// Property 1: Dependencies Precede Dependents
//
// For any acyclic catalog, in any document order, every component appears in
// the build order after all of the components it references.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_dependencies_precede_dependents(
        deps in arb_dag(),
        shuffle in prop::collection::vec(any::<u32>(), 8),
    ) {
        let export = load_documents(&dag_catalog(&deps, &shuffle), "{}").unwrap();
        let graph = DependencyGraph::new(&export.catalog);
        let order = graph.topological_order().unwrap();

        let names: Vec<&str> = order.names().collect();
        let position = |name: String| names.iter().position(|n| *n == name).unwrap();

        prop_assert_eq!(names.len(), deps.len());
        for (i, mask) in deps.iter().enumerate() {
            let dependent = position(format!("C{i}"));
            for j in (0..i).filter(|j| mask[*j]) {
                let dependency = position(format!("C{j}"));
                prop_assert!(
                    dependency < dependent,
                    "C{} must be built before C{}",
                    j,
                    i
                );
            }
        }
    }
}

// =============================================================================
// Property 2: Naming Is Independent of Catalog Order
//
// Starting from an empty registry, the identifiers assigned to a set of
// names do not depend on the order in which the catalog lists them.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_naming_independent_of_order(names in arb_component_names()) {
        let forward: Vec<String> = names.iter().cloned().collect();
        let backward: Vec<String> = names.iter().rev().cloned().collect();

        let a = load_documents(&catalog_json(&forward), "{}").unwrap();
        let b = load_documents(&catalog_json(&backward), "{}").unwrap();

        let config = naming_config();
        let normalizer = Normalizer::new(&config);
        let (table_a, _, collisions_a) = normalizer.assign(&a.catalog, AliasRegistry::default());
        let (table_b, _, collisions_b) = normalizer.assign(&b.catalog, AliasRegistry::default());

        prop_assert_eq!(table_a, table_b);
        prop_assert_eq!(collisions_a, collisions_b);
    }
}

// =============================================================================
// Property 3: Recorded Names Are Stable
//
// Once a name is in the registry, adding further names to the catalog never
// changes its identifier, and identifiers stay unique.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_recorded_names_are_stable(
        first in arb_component_names(),
        later in arb_component_names(),
    ) {
        let config = naming_config();
        let normalizer = Normalizer::new(&config);

        let first_names: Vec<String> = first.iter().cloned().collect();
        let export = load_documents(&catalog_json(&first_names), "{}").unwrap();
        let (before, registry, _) = normalizer.assign(&export.catalog, AliasRegistry::default());

        let all: Vec<String> = later.union(&first).cloned().collect();
        let export = load_documents(&catalog_json(&all), "{}").unwrap();
        let (after, _, _) = normalizer.assign(&export.catalog, registry);

        for name in &first_names {
            prop_assert_eq!(before.code_name(name), after.code_name(name));
        }

        // Unique even ignoring case, so stub paths never clash.
        let identifiers: BTreeSet<String> = all
            .iter()
            .filter_map(|n| after.code_name(n))
            .map(str::to_ascii_lowercase)
            .collect();
        prop_assert_eq!(identifiers.len(), all.len());
    }
}

// =============================================================================
// Property 4: Naming Is Idempotent
//
// Assigning the same catalog again with the registry produced by the first
// assignment changes nothing and reports no collisions.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_naming_is_idempotent(names in arb_component_names()) {
        let names: Vec<String> = names.into_iter().collect();
        let export = load_documents(&catalog_json(&names), "{}").unwrap();

        let config = naming_config();
        let normalizer = Normalizer::new(&config);
        let (table, registry, _) = normalizer.assign(&export.catalog, AliasRegistry::default());
        let (again, registry_again, collisions) = normalizer.assign(&export.catalog, registry.clone());

        prop_assert_eq!(table, again);
        prop_assert_eq!(registry, registry_again);
        prop_assert!(collisions.is_empty());
    }
}

// =============================================================================
// Property 5: Tokens Win Over Literals
//
// A binding to an existing token resolves to that token whatever fallback
// literal accompanies it; a binding to an unknown token resolves to the
// fallback.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_token_preferred_over_literal(
        token in "[a-z]{1,8}",
        other in "[A-Z]{1,8}",
        fallback in any::<i16>(),
        key in prop::sample::select(vec!["fill", "padding", "dropShadow", "opacity", "anything"]),
    ) {
        let tokens = TokenSet {
            colors: vec![color(&token, "#000000")],
            ..Default::default()
        };
        let mut resolver = TokenResolver::new(&tokens);
        let literal = LiteralValue::Number(f64::from(fallback));

        let bound = resolver.resolve(key, &StyledValue::TokenRef {
            name: token.clone(),
            fallback: Some(literal.clone()),
        });
        prop_assert_eq!(bound, ResolvedValue::Token { category: TokenCategory::Color, name: token });

        let unbound = resolver.resolve(key, &StyledValue::TokenRef {
            name: other,
            fallback: Some(literal.clone()),
        });
        prop_assert_eq!(unbound, ResolvedValue::Unbound(Some(literal)));
        prop_assert_eq!(resolver.coverage().unbound(), 1);
    }
}

// =============================================================================
// Property 6: Dry Run Safety
//
// For any valid catalog, a dry run touches neither the output directory nor
// the state directory.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn prop_dry_run_writes_nothing(
        deps in arb_dag(),
        shuffle in prop::collection::vec(any::<u32>(), 8),
    ) {
        let dir = TempDir::new().unwrap();
        let export = load_documents(&dag_catalog(&deps, &shuffle), "{}").unwrap();

        let mut config = Config::default();
        config.output.dir = dir.path().join("out");
        config.output.state_dir = dir.path().join(".designgen");

        let report = Pipeline::new(config)
            .dry_run(true)
            .run_with(&export, Default::default(), &mut NoHooks)
            .unwrap();

        prop_assert!(report.dry_run);
        prop_assert!(report.changed().count() > deps.len());
        prop_assert!(!dir.path().join("out").exists());
        prop_assert!(!dir.path().join(".designgen").exists());
    }
}
