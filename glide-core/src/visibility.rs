//! Context-aware visibility rules for commands and categories.
//!
//! Both checks are pure functions of their arguments and fail open: a tag or
//! category this build does not recognize is always shown.

use crate::category::Category;
use crate::context::{has_project, ProjectContext};
use crate::registry::CommandMetadata;
use serde::{Deserialize, Serialize};

/// Where a command may be shown. A missing tag behaves like `Always`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VisibilityTag {
    Always,
    ProjectOnly,
    WorktreeOnly,
    RootOnly,
    NonRoot,
    /// Tag string this build does not know about.
    Unknown(String),
}

impl VisibilityTag {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "always" => VisibilityTag::Always,
            "project-only" => VisibilityTag::ProjectOnly,
            "worktree-only" => VisibilityTag::WorktreeOnly,
            "root-only" => VisibilityTag::RootOnly,
            "non-root" => VisibilityTag::NonRoot,
            _ => VisibilityTag::Unknown(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            VisibilityTag::Always => "always",
            VisibilityTag::ProjectOnly => "project-only",
            VisibilityTag::WorktreeOnly => "worktree-only",
            VisibilityTag::RootOnly => "root-only",
            VisibilityTag::NonRoot => "non-root",
            VisibilityTag::Unknown(s) => s,
        }
    }

    /// Human-readable requirement, used when refusing a hidden command.
    pub fn requirement(&self) -> &'static str {
        match self {
            VisibilityTag::Always | VisibilityTag::Unknown(_) => "any directory",
            VisibilityTag::ProjectOnly => "a project directory",
            VisibilityTag::WorktreeOnly => "a worktree of a multi-worktree project",
            VisibilityTag::RootOnly => "the root of a multi-worktree project",
            VisibilityTag::NonRoot => "a directory other than the multi-worktree root",
        }
    }
}

impl From<String> for VisibilityTag {
    fn from(s: String) -> Self {
        VisibilityTag::parse(&s)
    }
}

impl From<&str> for VisibilityTag {
    fn from(s: &str) -> Self {
        VisibilityTag::parse(s)
    }
}

impl From<VisibilityTag> for String {
    fn from(tag: VisibilityTag) -> Self {
        tag.as_str().to_string()
    }
}

impl std::fmt::Display for VisibilityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decide whether a command carrying `tag` is shown in `ctx`.
pub fn should_show_command(tag: Option<&VisibilityTag>, ctx: Option<&ProjectContext>) -> bool {
    let Some(tag) = tag else {
        return true;
    };

    match tag {
        VisibilityTag::Always => true,
        VisibilityTag::ProjectOnly => has_project(ctx),
        VisibilityTag::WorktreeOnly => ctx.is_some_and(ProjectContext::is_worktree),
        VisibilityTag::RootOnly => ctx.is_some_and(ProjectContext::is_root),
        VisibilityTag::NonRoot => !ctx.is_some_and(ProjectContext::is_root),
        VisibilityTag::Unknown(_) => true,
    }
}

/// Decide whether commands of `category` are shown in `ctx`.
pub fn should_show_category(category: &Category, ctx: Option<&ProjectContext>) -> bool {
    match category {
        Category::Core | Category::Setup | Category::Help | Category::Plugin => true,
        Category::Global => ctx.is_some_and(ProjectContext::is_multi_worktree),
        Category::Docker | Category::Testing | Category::Developer | Category::Database => {
            has_project(ctx)
        }
        _ => true,
    }
}

/// Combined category and command check for a registered command.
pub fn is_visible(metadata: &CommandMetadata, ctx: Option<&ProjectContext>) -> bool {
    should_show_category(&metadata.category, ctx)
        && should_show_command(metadata.visibility.as_ref(), ctx)
}
