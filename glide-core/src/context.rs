//! Project context model and filesystem probe.
//!
//! A `ProjectContext` classifies where the user is standing: the overall
//! project layout (`DevelopmentMode`) and the position of the working
//! directory inside that layout (`Location`). Consumers take
//! `Option<&ProjectContext>`; `None` means no project was detected at all.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the main checkout in a multi-worktree layout.
pub const MAIN_REPO_DIR: &str = "vcs";
/// Directory holding the additional worktrees in a multi-worktree layout.
pub const WORKTREES_DIR: &str = "worktrees";
/// Project-local declared-command file that marks a standalone project.
pub const PROJECT_FILE: &str = ".glide.yml";

/// Overall project layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DevelopmentMode {
    SingleRepo,
    MultiWorktree,
    Standalone,
    /// No project layout was recognized. Serialized as the empty string.
    #[default]
    #[serde(rename = "")]
    Undetected,
}

impl DevelopmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DevelopmentMode::SingleRepo => "single-repo",
            DevelopmentMode::MultiWorktree => "multi-worktree",
            DevelopmentMode::Standalone => "standalone",
            DevelopmentMode::Undetected => "",
        }
    }

    pub fn is_detected(&self) -> bool {
        !matches!(self, DevelopmentMode::Undetected)
    }
}

impl std::fmt::Display for DevelopmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DevelopmentMode::Undetected => write!(f, "none"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Position of the working directory within the project layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Location {
    Root,
    MainRepo,
    Worktree,
    Project,
    #[default]
    Unknown,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Root => "root",
            Location::MainRepo => "main-repo",
            Location::Worktree => "worktree",
            Location::Project => "project",
            Location::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pre-computed classification of the current working directory.
///
/// Read-only for every consumer in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectContext {
    pub development_mode: DevelopmentMode,
    pub location: Location,
    pub working_dir: PathBuf,
    pub project_root: Option<PathBuf>,
    pub worktree_name: Option<String>,
    /// Whether the Docker daemon answered the last health probe.
    #[serde(default)]
    pub docker_running: bool,
}

impl ProjectContext {
    pub fn new(development_mode: DevelopmentMode, location: Location) -> Self {
        Self {
            development_mode,
            location,
            ..Self::default()
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn with_worktree_name(mut self, name: impl Into<String>) -> Self {
        self.worktree_name = Some(name.into());
        self
    }

    pub fn is_multi_worktree(&self) -> bool {
        self.development_mode == DevelopmentMode::MultiWorktree
    }

    pub fn is_root(&self) -> bool {
        self.is_multi_worktree() && self.location == Location::Root
    }

    pub fn is_worktree(&self) -> bool {
        self.is_multi_worktree() && self.location == Location::Worktree
    }
}

/// Whether `ctx` describes a detected project.
///
/// A missing context and a context with `DevelopmentMode::Undetected` are the
/// same thing to every visibility rule.
pub fn has_project(ctx: Option<&ProjectContext>) -> bool {
    ctx.is_some_and(|c| c.development_mode.is_detected())
}

/// Detect the project context for `dir` by walking its ancestors.
///
/// The nearest multi-worktree root wins over a plain git checkout, since a
/// worktree directory also contains a `.git` entry.
pub fn detect(dir: &Path) -> Option<ProjectContext> {
    for ancestor in dir.ancestors() {
        if is_multi_worktree_root(ancestor) {
            return Some(classify_multi_worktree(dir, ancestor));
        }
    }

    for ancestor in dir.ancestors() {
        if ancestor.join(".git").exists() {
            return Some(
                ProjectContext::new(DevelopmentMode::SingleRepo, Location::Project)
                    .with_working_dir(dir)
                    .with_project_root(ancestor),
            );
        }
        if ancestor.join(PROJECT_FILE).is_file() {
            return Some(
                ProjectContext::new(DevelopmentMode::Standalone, Location::Project)
                    .with_working_dir(dir)
                    .with_project_root(ancestor),
            );
        }
    }

    None
}

fn is_multi_worktree_root(path: &Path) -> bool {
    path.join(MAIN_REPO_DIR).join(".git").exists() && path.join(WORKTREES_DIR).is_dir()
}

fn classify_multi_worktree(dir: &Path, root: &Path) -> ProjectContext {
    let ctx = ProjectContext::new(DevelopmentMode::MultiWorktree, Location::Root)
        .with_working_dir(dir)
        .with_project_root(root);

    let Ok(relative) = dir.strip_prefix(root) else {
        return ctx;
    };
    let mut components = relative.components().map(|c| c.as_os_str().to_string_lossy());

    match components.next().as_deref() {
        None => ctx,
        Some(MAIN_REPO_DIR) => ProjectContext {
            location: Location::MainRepo,
            ..ctx
        },
        Some(WORKTREES_DIR) => match components.next() {
            Some(name) => ProjectContext {
                location: Location::Worktree,
                ..ctx
            }
            .with_worktree_name(name.into_owned()),
            None => ctx,
        },
        Some(_) => ProjectContext {
            location: Location::Unknown,
            ..ctx
        },
    }
}

/// List the worktree names under a multi-worktree root, sorted.
pub fn list_worktrees(root: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(root.join(WORKTREES_DIR))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
