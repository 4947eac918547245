//! Generated artifacts as structured (generated, preserved) pairs.
//!
//! Every output file has a machine-owned generated region followed by a
//! human-owned preserved region. The pipeline only ever manipulates the two
//! halves as separate strings; the marker lines below exist solely at the
//! boundary where an artifact is rendered to, or parsed from, a file.

use crate::model::TokenCategory;
use std::fmt;
use std::path::{Path, PathBuf};

/// First line of every generated file.
pub const GENERATED_BEGIN: &str =
    "// <designgen:generated> Edits inside this region are detected and block regeneration.";

/// Line closing the generated region; everything after it is preserved.
pub const GENERATED_END: &str = "// </designgen:generated>";

/// What an artifact is, which also fixes its write order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind {
    /// Token module for one category.
    TokenModule(TokenCategory),
    /// Unified token re-export module.
    TokenIndex,
    /// Component stub for one catalog entry (external name).
    ComponentStub(String),
    /// Preview story for one catalog entry (external name).
    Story(String),
    /// Top-level export manifest.
    Manifest,
}

/// The two regions of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactContent {
    /// Machine-owned region, without markers; always newline-terminated.
    pub generated: String,
    /// Human-owned region following the end marker.
    pub preserved: String,
}

/// One output file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub content: ArtifactContent,
}

impl ArtifactContent {
    /// Create content, normalising the generated region's trailing newline.
    pub fn new(generated: impl Into<String>, preserved: impl Into<String>) -> Self {
        let mut generated = generated.into();
        if !generated.ends_with('\n') {
            generated.push('\n');
        }
        Self {
            generated,
            preserved: preserved.into(),
        }
    }

    /// Same generated region with a different preserved region.
    pub fn with_preserved(&self, preserved: &str) -> Self {
        Self {
            generated: self.generated.clone(),
            preserved: preserved.to_string(),
        }
    }

    /// Serialize to file text.
    pub fn render(&self) -> String {
        format!(
            "{GENERATED_BEGIN}\n{}{GENERATED_END}\n{}",
            self.generated, self.preserved
        )
    }

    /// Split file text into its regions; `None` when the markers are missing
    /// or out of place.
    pub fn parse(text: &str) -> Option<Self> {
        let body = text.strip_prefix(GENERATED_BEGIN)?;
        let body = body
            .strip_prefix("\r\n")
            .or_else(|| body.strip_prefix('\n'))?;

        let mut offset = 0;
        for line in body.split_inclusive('\n') {
            if line.trim_end_matches(['\n', '\r']) == GENERATED_END {
                return Some(Self {
                    generated: body[..offset].to_string(),
                    preserved: body[offset + line.len()..].to_string(),
                });
            }
            offset += line.len();
        }
        None
    }
}

impl Artifact {
    /// Path as used for state keys: relative, `/`-separated.
    pub fn key(&self) -> String {
        path_key(&self.path)
    }
}

/// Relative path rendered with `/` separators.
pub fn path_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenModule(category) => write!(f, "{category} tokens"),
            Self::TokenIndex => f.write_str("token index"),
            Self::ComponentStub(name) => write!(f, "stub for {name}"),
            Self::Story(name) => write!(f, "story for {name}"),
            Self::Manifest => f.write_str("manifest"),
        }
    }
}
