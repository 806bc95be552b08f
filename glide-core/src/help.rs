//! Help composition: the context-filtered, category-ordered command listing.
//!
//! Rendering is left to the front end; this module only decides what is
//! listed and in which order.

use crate::category::Category;
use crate::context::ProjectContext;
use crate::node::{ANNOTATION_CATEGORY, ANNOTATION_VISIBILITY, CommandNode};
use crate::registry::Registry;
use crate::visibility::{VisibilityTag, should_show_category, should_show_command};
use std::collections::BTreeMap;

/// A sub-command of a plugin, listed under its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpChild {
    pub name: String,
    pub description: String,
    pub aliases: Vec<String>,
}

/// One visible top-level command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub name: String,
    pub description: String,
    pub aliases: Vec<String>,
    pub category: Category,
    pub is_plugin: bool,
    pub is_declared: bool,
    /// Registered as hidden; only listed with `show_hidden`.
    pub is_hidden: bool,
    /// Non-hidden sub-commands; only filled for plugin entries.
    pub children: Vec<HelpChild>,
}

/// Entries of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpSection {
    pub category: Category,
    pub entries: Vec<HelpEntry>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HelpOptions {
    /// List commands registered as hidden.
    pub show_hidden: bool,
}

/// Compose the help listing for `nodes` in `ctx` with default options.
pub fn compose_help(
    registry: &Registry,
    nodes: &[CommandNode],
    ctx: Option<&ProjectContext>,
) -> Vec<HelpSection> {
    compose_help_with(registry, nodes, ctx, HelpOptions::default())
}

/// Compose the help listing.
///
/// Sections follow `Category::priority` (ties broken by name) and entries are
/// alphabetical. Metadata from the registry takes precedence over what the
/// node carries, so nodes built outside the registry still group correctly
/// through their annotations.
pub fn compose_help_with(
    registry: &Registry,
    nodes: &[CommandNode],
    ctx: Option<&ProjectContext>,
    options: HelpOptions,
) -> Vec<HelpSection> {
    let mut sections: BTreeMap<(u32, String), HelpSection> = BTreeMap::new();

    for node in nodes {
        if node.hidden && !options.show_hidden {
            continue;
        }

        let metadata = registry.get_metadata(&node.name);
        let category = metadata
            .map(|m| m.category.clone())
            .or_else(|| node.annotation(ANNOTATION_CATEGORY).map(Category::parse))
            .unwrap_or(Category::Core);
        let visibility = match metadata {
            Some(m) => m.visibility.clone(),
            None => node.annotation(ANNOTATION_VISIBILITY).map(VisibilityTag::parse),
        };

        if !should_show_category(&category, ctx) || !should_show_command(visibility.as_ref(), ctx) {
            continue;
        }

        let description = match metadata {
            Some(m) if node.about.is_empty() => m.description.clone(),
            _ => node.about.clone(),
        };
        let aliases = metadata
            .map(|m| m.aliases.clone())
            .unwrap_or_else(|| node.aliases.clone());
        let is_plugin = category == Category::Plugin;
        let children = if is_plugin {
            plugin_children(node)
        } else {
            Vec::new()
        };

        let entry = HelpEntry {
            name: node.name.clone(),
            description,
            aliases,
            category: category.clone(),
            is_plugin,
            is_declared: node.is_declared(),
            is_hidden: node.hidden || metadata.is_some_and(|m| m.hidden),
            children,
        };

        sections
            .entry((category.priority(), category.as_str().to_string()))
            .or_insert_with(|| HelpSection {
                category,
                entries: Vec::new(),
            })
            .entries
            .push(entry);
    }

    sections
        .into_values()
        .map(|mut section| {
            section.entries.sort_by(|a, b| a.name.cmp(&b.name));
            section
        })
        .collect()
}

fn plugin_children(node: &CommandNode) -> Vec<HelpChild> {
    let mut children: Vec<HelpChild> = node
        .children
        .iter()
        .filter(|c| !c.hidden)
        .map(|c| HelpChild {
            name: c.name.clone(),
            description: c.about.clone(),
            aliases: c.aliases.clone(),
        })
        .collect();
    children.sort_by(|a, b| a.name.cmp(&b.name));
    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DevelopmentMode, Location};
    use crate::declared::{DeclaredCommand, add_declared_command};
    use crate::registry::{BuildContext, CommandMetadata};

    fn sample_registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register_fn(
                "help",
                |_| CommandNode::new("help", "Show help"),
                CommandMetadata::new(Category::Help, "Show help"),
            )
            .unwrap();
        registry
            .register_fn(
                "version",
                |_| CommandNode::new("version", "Print the version"),
                CommandMetadata::new(Category::Core, "Print the version"),
            )
            .unwrap();
        registry
            .register_fn(
                "up",
                |_| CommandNode::new("up", "Start containers"),
                CommandMetadata::new(Category::Docker, "Start containers")
                    .with_aliases(["start"])
                    .with_visibility(VisibilityTag::NonRoot),
            )
            .unwrap();
        registry
            .register_fn(
                "down",
                |_| CommandNode::new("down", "Stop containers"),
                CommandMetadata::new(Category::Docker, "Stop containers"),
            )
            .unwrap();
        registry
            .register_fn(
                "global",
                |_| CommandNode::new("global", "Operate on all worktrees"),
                CommandMetadata::new(Category::Global, "Operate on all worktrees")
                    .with_aliases(["g"]),
            )
            .unwrap();
        registry
            .register_fn(
                "internal",
                |_| CommandNode::new("internal", "Internal plumbing"),
                CommandMetadata::new(Category::Debug, "Internal plumbing").with_hidden(true),
            )
            .unwrap();
        registry
            .register_fn(
                "cloud",
                |_| {
                    CommandNode::new("cloud", "Cloud plugin")
                        .child(CommandNode::new("sync", "Sync state").alias("s"))
                        .child(CommandNode::new("deploy", "Deploy"))
                        .child(CommandNode::new("debug-dump", "Dump").hidden(true))
                },
                CommandMetadata::new(Category::Plugin, "Cloud plugin"),
            )
            .unwrap();
        add_declared_command(
            &mut registry,
            "seed",
            DeclaredCommand::new("php artisan db:seed").with_description("Seed the database"),
        )
        .unwrap();
        registry
    }

    fn names(sections: &[HelpSection]) -> Vec<(String, Vec<String>)> {
        sections
            .iter()
            .map(|s| {
                (
                    s.category.as_str().to_string(),
                    s.entries.iter().map(|e| e.name.clone()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_no_project_hides_project_categories() {
        let registry = sample_registry();
        let nodes = registry.create_all(&BuildContext::default());
        let sections = compose_help(&registry, &nodes, None);

        let listed = names(&sections);
        assert_eq!(
            listed,
            vec![
                ("core".to_string(), vec!["version".to_string()]),
                ("yaml".to_string(), vec!["seed".to_string()]),
                ("plugin".to_string(), vec!["cloud".to_string()]),
                ("help".to_string(), vec!["help".to_string()]),
            ]
        );
    }

    #[test]
    fn test_worktree_shows_docker_and_global_sorted() {
        let registry = sample_registry();
        let ctx = ProjectContext::new(DevelopmentMode::MultiWorktree, Location::Worktree);
        let nodes = registry.create_all(&BuildContext::new(Some(&ctx)));
        let sections = compose_help(&registry, &nodes, Some(&ctx));

        let listed = names(&sections);
        assert_eq!(listed[0].0, "core");
        assert_eq!(listed[1], ("global".to_string(), vec!["global".to_string()]));
        assert_eq!(
            listed[2],
            ("docker".to_string(), vec!["down".to_string(), "up".to_string()])
        );

        let up = &sections[2].entries[1];
        assert_eq!(up.aliases, vec!["start".to_string()]);
        assert!(!up.is_plugin);
        assert!(!up.is_declared);
    }

    #[test]
    fn test_root_hides_non_root_commands() {
        let registry = sample_registry();
        let ctx = ProjectContext::new(DevelopmentMode::MultiWorktree, Location::Root);
        let nodes = registry.create_all(&BuildContext::new(Some(&ctx)));
        let sections = compose_help(&registry, &nodes, Some(&ctx));

        let docker = sections
            .iter()
            .find(|s| s.category == Category::Docker)
            .unwrap();
        let docker_names: Vec<&str> = docker.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(docker_names, vec!["down"]);
    }

    #[test]
    fn test_plugin_children_sorted_and_filtered() {
        let registry = sample_registry();
        let nodes = registry.create_all(&BuildContext::default());
        let sections = compose_help(&registry, &nodes, None);

        let plugin = sections
            .iter()
            .find(|s| s.category == Category::Plugin)
            .unwrap();
        let cloud = &plugin.entries[0];
        assert!(cloud.is_plugin);
        let child_names: Vec<&str> = cloud.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(child_names, vec!["deploy", "sync"]);
        assert_eq!(cloud.children[1].aliases, vec!["s".to_string()]);
        assert_eq!(cloud.children[1].description, "Sync state");
    }

    #[test]
    fn test_declared_entries_flagged() {
        let registry = sample_registry();
        let nodes = registry.create_all(&BuildContext::default());
        let sections = compose_help(&registry, &nodes, None);

        let yaml = sections.iter().find(|s| s.category == Category::Yaml).unwrap();
        assert!(yaml.entries[0].is_declared);
        assert_eq!(yaml.entries[0].description, "Seed the database");
    }

    #[test]
    fn test_show_hidden_option() {
        let registry = sample_registry();
        let nodes = registry.create_all(&BuildContext::default());
        let sections = compose_help_with(
            &registry,
            &nodes,
            None,
            HelpOptions { show_hidden: true },
        );
        let debug = sections
            .iter()
            .find(|s| s.category == Category::Debug)
            .unwrap();
        assert!(debug.entries.iter().all(|e| e.is_hidden));

        let all_visible = compose_help(&registry, &nodes, None)
            .into_iter()
            .flat_map(|s| s.entries)
            .all(|e| !e.is_hidden);
        assert!(all_visible);
    }

    #[test]
    fn test_unregistered_node_uses_annotations() {
        let registry = Registry::new();
        let nodes = vec![
            CommandNode::new("mysql", "Open a MySQL shell")
                .annotate(ANNOTATION_CATEGORY, "database")
                .annotate(ANNOTATION_VISIBILITY, "project-only"),
        ];
        assert!(compose_help(&registry, &nodes, None).is_empty());

        let ctx = ProjectContext::new(DevelopmentMode::SingleRepo, Location::Project);
        let sections = compose_help(&registry, &nodes, Some(&ctx));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].category, Category::Database);
    }
}
