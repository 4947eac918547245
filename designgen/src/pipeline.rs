//! Pipeline orchestration.
//!
//! Stages run in strict sequence on one thread:
//!
//! 1. naming against the loaded alias registry;
//! 2. dependency ordering (a cycle aborts before anything is written);
//! 3. token resolution and artifact emission;
//! 4. merge planning, reading every existing file before the first write;
//! 5. writes, in artifact order;
//! 6. store persistence, then hooks.
//!
//! Stores are loaded once, passed through the stages as values and
//! persisted once (the state is saved a second time only when hooks changed
//! files on disk).

use crate::artifact::{path_key, Artifact, ArtifactContent, ArtifactKind};
use crate::config::Config;
use crate::emit::{Emitter, COMPONENTS_DIR};
use crate::error::{PipelineResult, StoreError};
use crate::graph::{BuildOrder, DependencyGraph};
use crate::hooks::{run_hooks, HookReport, HookRunner};
use crate::loader::{load_files, DesignExport};
use crate::merge::{decide, ManualEditConflict, MergeAction, MergeDecision};
use crate::naming::{NamingCollision, Normalizer};
use crate::registry::{AliasRegistry, NamingAlias, REGISTRY_FILENAME};
use crate::resolver::Coverage;
use crate::state::{GenerationState, STATE_FILENAME};
use crate::writer::FileWriter;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// The persistent stores of one output tree.
#[derive(Debug, Clone, Default)]
pub struct Stores {
    /// Naming registry.
    pub registry: AliasRegistry,
    pub(crate) state: GenerationState,
}

impl Stores {
    /// Stores with a known registry and no generation history.
    pub fn new(registry: AliasRegistry) -> Self {
        Self {
            registry,
            state: GenerationState::default(),
        }
    }

    /// Load both stores from the state directory; missing files are empty.
    pub fn load(state_dir: &Path) -> Result<Self, StoreError> {
        let stores = Self {
            registry: AliasRegistry::load(&state_dir.join(REGISTRY_FILENAME))?,
            state: GenerationState::load(&state_dir.join(STATE_FILENAME))?,
        };
        tracing::debug!(
            state_dir = %state_dir.display(),
            aliases = stores.registry.len(),
            tracked = stores.state.len(),
            "loaded stores"
        );
        Ok(stores)
    }

    /// Persist both stores to the state directory.
    pub fn persist(&self, state_dir: &Path) -> Result<(), StoreError> {
        self.registry.save(&state_dir.join(REGISTRY_FILENAME))?;
        self.state.save(&state_dir.join(STATE_FILENAME))
    }

    /// Number of artifact paths with recorded fingerprints.
    pub fn tracked(&self) -> usize {
        self.state.len()
    }
}

/// What happened to one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOutcome {
    pub kind: ArtifactKind,
    /// Path relative to the output directory.
    pub path: PathBuf,
    pub action: MergeAction,
    /// Bytes written; 0 when nothing was written or in a dry run.
    pub bytes: usize,
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct RunReport {
    /// Generation order of catalog entries.
    pub build_order: BuildOrder,

    /// One outcome per artifact, in write order.
    pub artifacts: Vec<ArtifactOutcome>,

    /// Files left untouched because of hand edits.
    pub conflicts: Vec<ManualEditConflict>,

    /// Names that received a numeric suffix.
    pub collisions: Vec<NamingCollision>,

    /// Token coverage of the emitted stubs.
    pub coverage: Coverage,

    /// Tracked paths this run no longer generates. Never deleted.
    pub stale: Vec<String>,

    /// Hook outcome.
    pub hooks: HookReport,

    /// Whether writes, persistence and hooks were skipped.
    pub dry_run: bool,
}

impl RunReport {
    /// Whether the run completed without a hook failure.
    pub fn is_success(&self) -> bool {
        self.hooks.is_success()
    }

    /// Outcomes that wrote (or, in a dry run, would write) a file.
    pub fn changed(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.artifacts.iter().filter(|a| a.action.writes())
    }

    /// Whether the output tree is already up to date.
    pub fn is_up_to_date(&self) -> bool {
        self.changed().next().is_none() && self.conflicts.is_empty()
    }
}

/// Aliases and files removed by [`remove_component`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Removal {
    /// Component alias first, then its variant aliases.
    pub aliases: Vec<NamingAlias>,

    /// Deleted (or, in a dry run, deletable) files, relative to the output directory.
    pub files: Vec<PathBuf>,
}

impl Removal {
    /// Whether the name was unknown.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Runs the generation pipeline for one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    dry_run: bool,
}

impl Pipeline {
    /// Create a pipeline.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            dry_run: false,
        }
    }

    /// Run every stage but skip writes, store persistence and hooks.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load inputs and stores from the configured locations, then run.
    pub fn run(&self, runner: &mut dyn HookRunner) -> PipelineResult<RunReport> {
        let export = load_files(&self.config.input.catalog, &self.config.input.tokens)?;
        let stores = Stores::load(&self.config.output.state_dir)?;
        self.run_with(&export, stores, runner)
    }

    /// Run on an already loaded export and stores.
    pub fn run_with(
        &self,
        export: &DesignExport,
        stores: Stores,
        runner: &mut dyn HookRunner,
    ) -> PipelineResult<RunReport> {
        let Stores {
            registry,
            mut state,
        } = stores;

        // Naming
        let normalizer = Normalizer::new(&self.config.naming);
        let (names, registry, collisions) = normalizer.assign(&export.catalog, registry);

        // Ordering
        let graph = DependencyGraph::new(&export.catalog);
        let build_order = graph.topological_order()?;
        tracing::info!(entries = build_order.len(), "build order");
        for (line, name) in build_order.log_lines().iter().zip(build_order.names()) {
            tracing::info!("{line}");
            tracing::debug!(component = name, depends_on = ?graph.dependencies(name), "dependencies");
        }

        // Resolution and emission
        let emission = Emitter::new(&export.catalog, &export.tokens, &names)
            .with_stories(self.config.preview.stories)
            .emit(&build_order);
        tracing::info!(coverage = %emission.coverage, "token coverage");

        // Merge planning
        let writer = FileWriter::new(&self.config.output.dir, self.dry_run);
        let mut plan: Vec<(Artifact, MergeDecision)> = Vec::with_capacity(emission.artifacts.len());
        for artifact in emission.artifacts {
            let existing = writer.read(&artifact.path)?;
            let decision = decide(&artifact, existing.as_deref(), state.get(&artifact.key()));
            plan.push((artifact, decision));
        }

        let emitted: BTreeSet<String> = plan.iter().map(|(a, _)| a.key()).collect();
        let stale: Vec<String> = state
            .paths()
            .filter(|path| !emitted.contains(*path))
            .map(str::to_string)
            .collect();
        for path in &stale {
            tracing::warn!(path = %path, "artifact is no longer generated; left in place");
        }

        // Writes
        let mut artifacts = Vec::with_capacity(plan.len());
        let mut conflicts = Vec::new();
        for (artifact, decision) in plan {
            let key = artifact.key();
            let mut bytes = 0;
            match &decision.action {
                MergeAction::Conflict(reason) => {
                    tracing::warn!(path = %key, reason = %reason, "manual edit conflict; file left untouched");
                    conflicts.push(ManualEditConflict {
                        path: artifact.path.clone(),
                        reason: *reason,
                    });
                }
                action => {
                    if let Some(content) = &decision.content {
                        let result = writer.write(&artifact.path, &content.render())?;
                        tracing::debug!(
                            path = %result.path().display(),
                            written = result.was_written(),
                            bytes = result.bytes(),
                            "write"
                        );
                        bytes = result.bytes();
                    }
                    tracing::debug!(path = %key, action = %action, "artifact");
                }
            }
            if let Some(entry) = decision.entry {
                state.record(key, entry);
            }
            artifacts.push(ArtifactOutcome {
                kind: artifact.kind,
                path: artifact.path,
                action: decision.action,
                bytes,
            });
        }

        let state_dir = &self.config.output.state_dir;
        let hooks = if self.dry_run {
            HookReport {
                skipped: self.config.hooks.iter().map(|h| h.name.clone()).collect(),
                ..HookReport::default()
            }
        } else {
            let mut stores = Stores { registry, state };
            stores.persist(state_dir)?;

            let report = run_hooks(&self.config.hooks, runner);
            if !self.config.hooks.is_empty() {
                self.refresh_after_hooks(&writer, &artifacts, &mut stores.state, state_dir)?;
            }
            report
        };

        let report = RunReport {
            build_order,
            artifacts,
            conflicts,
            collisions,
            coverage: emission.coverage,
            stale,
            hooks,
            dry_run: writer.is_dry_run(),
        };
        tracing::info!(
            changed = report.changed().count(),
            conflicts = report.conflicts.len(),
            collisions = report.collisions.len(),
            dry_run = self.dry_run,
            "generation finished"
        );
        Ok(report)
    }

    /// Record the generated regions as hooks left them, so formatting is
    /// not mistaken for a hand edit on the next run.
    fn refresh_after_hooks(
        &self,
        writer: &FileWriter,
        artifacts: &[ArtifactOutcome],
        state: &mut GenerationState,
        state_dir: &Path,
    ) -> PipelineResult<()> {
        let mut changed = false;
        for outcome in artifacts {
            if matches!(outcome.action, MergeAction::Conflict(_)) {
                continue;
            }
            let Some(text) = writer.read(&outcome.path)? else {
                continue;
            };
            match ArtifactContent::parse(&text) {
                Some(content) => {
                    changed |= state.refresh_disk(&path_key(&outcome.path), &content.generated);
                }
                None => {
                    tracing::warn!(path = %outcome.path.display(), "hook removed generated-region markers");
                }
            }
        }
        if changed {
            tracing::debug!("hooks changed generated regions; saving state again");
            state.save(&state_dir.join(STATE_FILENAME))?;
        }
        Ok(())
    }
}

/// Remove a component's aliases and delete its generated stub and story.
///
/// Nothing is deleted or persisted when `dry_run` is set.
pub fn remove_component(
    config: &Config,
    external_name: &str,
    dry_run: bool,
) -> PipelineResult<Removal> {
    let state_dir = &config.output.state_dir;
    let mut stores = Stores::load(state_dir)?;

    let aliases = stores.registry.remove_component(external_name);
    let Some(component) = aliases.iter().find(|a| a.is_component()) else {
        return Ok(Removal::default());
    };

    let writer = FileWriter::new(&config.output.dir, dry_run);
    let mut files = Vec::new();
    for file_name in [
        format!("{}.tsx", component.code_name),
        format!("{}.stories.tsx", component.code_name),
    ] {
        let path = PathBuf::from(COMPONENTS_DIR).join(file_name);
        if writer.remove(&path)? {
            files.push(path.clone());
        }
        stores.state.remove(&path_key(&path));
    }

    if !dry_run {
        stores.persist(state_dir)?;
    }
    tracing::info!(
        external_name,
        aliases = aliases.len(),
        files = files.len(),
        dry_run,
        "removed component"
    );

    let mut aliases = aliases;
    aliases.sort_by_key(|a| !a.is_component());
    Ok(Removal { aliases, files })
}
