//! Integration tests for the plugin lifecycle.
//!
//! Tests load → register → help → unload from the public API, validation,
//! and error handling.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use glide_core::{
    BuildContext, Category, CommandMetadata, CommandNode, DevelopmentMode, Location,
    ProjectContext, Registry, VisibilityTag, compose_help,
};
use glide_plugins::{Plugin, PluginCapability, PluginError, PluginManager, PluginMetadata};

// ── Test plugin implementations ──────────────────────────────────────────

struct TestPlugin {
    name: String,
    aliases: Vec<String>,
    visibility: Option<VisibilityTag>,
    unloads: Arc<AtomicU32>,
}

impl TestPlugin {
    fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            visibility: None,
            unloads: Arc::new(AtomicU32::new(0)),
        }
    }
}

#[async_trait]
impl Plugin for TestPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: self.name.clone(),
            version: "0.1.0".into(),
            description: format!("{} integration", self.name),
            author: Some("Test Author".into()),
            aliases: self.aliases.clone(),
            visibility: self.visibility.clone(),
            min_core_version: None,
            capabilities: vec![PluginCapability::CommandRegistration],
        }
    }

    async fn on_load(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    async fn on_unload(&self) -> Result<(), PluginError> {
        self.unloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn command(&self, _ctx: &BuildContext<'_>) -> CommandNode {
        CommandNode::new(self.name.clone(), format!("{} integration", self.name))
            .child(CommandNode::new("status", "Show sync status").alias("st"))
            .child(CommandNode::new("push", "Push local state"))
            .child(CommandNode::new("internal-gc", "Garbage collect").hidden(true))
    }
}

/// Plugin that fails on load.
struct FailingLoadPlugin;

#[async_trait]
impl Plugin for FailingLoadPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: "failing-plugin".into(),
            version: "1.0.0".into(),
            description: "Always fails to load".into(),
            author: None,
            aliases: Vec::new(),
            visibility: None,
            min_core_version: None,
            capabilities: vec![],
        }
    }

    async fn on_load(&mut self) -> Result<(), PluginError> {
        Err(PluginError::LoadFailed("Load failed".into()))
    }

    fn command(&self, _ctx: &BuildContext<'_>) -> CommandNode {
        CommandNode::new("failing-plugin", "Never built")
    }
}

// ── Lifecycle tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_lifecycle_load_list_unload() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut mgr = PluginManager::new(dir.path());
    assert!(mgr.is_empty());
    assert_eq!(mgr.plugins_dir(), dir.path());

    let plugin = TestPlugin::new("cloud");
    let unloads = Arc::clone(&plugin.unloads);
    mgr.load_from(Box::new(plugin), Some(&dir.path().join("cloud")))
        .await
        .unwrap();

    let state = mgr.get("cloud").unwrap();
    assert_eq!(state.metadata.version, "0.1.0");
    assert!(state.source_path.as_deref().unwrap().ends_with("cloud"));

    mgr.unload("cloud").await.unwrap();
    assert!(mgr.is_empty());
    assert_eq!(unloads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_list_is_sorted_by_name() {
    let mut mgr = PluginManager::new("/tmp/glide-plugins");
    for name in ["zeta", "alpha", "mid"] {
        mgr.load(Box::new(TestPlugin::new(name))).await.unwrap();
    }
    let names: Vec<&str> = mgr.list().iter().map(|s| s.metadata.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
}

#[tokio::test]
async fn test_failing_load_plugin() {
    let mut mgr = PluginManager::new("/tmp/glide-plugins");
    let result = mgr.load(Box::new(FailingLoadPlugin)).await;
    assert!(matches!(result, Err(PluginError::LoadFailed(_))));
    assert!(mgr.is_empty());
}

#[tokio::test]
async fn test_protected_plugin_name_rejected() {
    let mut mgr = PluginManager::new("/tmp/glide-plugins");
    let result = mgr.load(Box::new(TestPlugin::new("config"))).await;
    match result {
        Err(PluginError::SecurityViolation(msg)) => assert!(msg.contains("reserved"), "{msg}"),
        other => panic!("Expected SecurityViolation, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_capability_cap_rejects_plugin() {
    let mut mgr = PluginManager::new("/tmp/glide-plugins").with_max_capabilities(Some(0));
    let result = mgr.load(Box::new(TestPlugin::new("cloud"))).await;
    match result {
        Err(PluginError::SecurityViolation(msg)) => assert!(msg.contains("max: 0"), "{msg}"),
        other => panic!("Expected SecurityViolation, got: {other:?}"),
    }

    let mut mgr = PluginManager::new("/tmp/glide-plugins").with_max_capabilities(Some(1));
    assert!(mgr.load(Box::new(TestPlugin::new("cloud"))).await.is_ok());
}

#[tokio::test]
async fn test_unload_nonexistent_returns_error() {
    let mut mgr = PluginManager::new("/tmp/glide-plugins");
    let result = mgr.unload("ghost").await;
    assert!(matches!(result, Err(PluginError::NotFound(_))));
}

// ── Registry integration ─────────────────────────────────────────────────

#[tokio::test]
async fn test_plugin_alias_conflict_surfaces_registry_error() {
    let mut mgr = PluginManager::new("/tmp/glide-plugins");
    let mut plugin = TestPlugin::new("cloud");
    plugin.aliases = vec!["up".into()];
    mgr.load(Box::new(plugin)).await.unwrap();

    let mut registry = Registry::new();
    registry
        .register_fn(
            "up",
            |_| CommandNode::new("up", "Start containers"),
            CommandMetadata::new(Category::Docker, "Start containers"),
        )
        .unwrap();

    let err = mgr.register_commands(&mut registry).unwrap_err();
    assert!(matches!(err, PluginError::Registration(_)));
    assert!(err.to_string().contains("alias up already registered"));
    assert!(!registry.contains("cloud"));
}

#[tokio::test]
async fn test_help_lists_plugin_children() {
    let mut mgr = PluginManager::new("/tmp/glide-plugins");
    let mut plugin = TestPlugin::new("cloud");
    plugin.aliases = vec!["cl".into()];
    mgr.load(Box::new(plugin)).await.unwrap();

    let mut registry = Registry::new();
    mgr.register_commands(&mut registry).unwrap();
    assert_eq!(registry.resolve_alias("cl"), Some("cloud"));

    let nodes = registry.create_all(&BuildContext::default());
    let sections = compose_help(&registry, &nodes, None);
    assert_eq!(sections.len(), 1);

    let entry = &sections[0].entries[0];
    assert!(entry.is_plugin);
    assert_eq!(entry.aliases, vec!["cl".to_string()]);
    let children: Vec<(&str, &[String])> = entry
        .children
        .iter()
        .map(|c| (c.name.as_str(), c.aliases.as_slice()))
        .collect();
    assert_eq!(
        children,
        vec![("push", &[][..]), ("status", &["st".to_string()][..])]
    );
}

#[tokio::test]
async fn test_plugin_visibility_respected_in_help() {
    let mut mgr = PluginManager::new("/tmp/glide-plugins");
    let mut plugin = TestPlugin::new("fleet");
    plugin.visibility = Some(VisibilityTag::RootOnly);
    mgr.load(Box::new(plugin)).await.unwrap();

    let mut registry = Registry::new();
    mgr.register_commands(&mut registry).unwrap();
    let nodes = registry.create_all(&BuildContext::default());

    let worktree = ProjectContext::new(DevelopmentMode::MultiWorktree, Location::Worktree);
    assert!(compose_help(&registry, &nodes, Some(&worktree)).is_empty());

    let root = ProjectContext::new(DevelopmentMode::MultiWorktree, Location::Root);
    assert_eq!(compose_help(&registry, &nodes, Some(&root)).len(), 1);
}

// ── Manifest plugins ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_load_manifests_from_plugins_dir() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("cloud.toml"),
        r#"
[plugin]
name = "cloud"
version = "0.1.0"
description = "Sync the project"

[[commands]]
name = "push"
description = "Push local state"
run = "cloud-cli push"
"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("setup.toml"),
        "[plugin]\nname = \"setup\"\nversion = \"0.1.0\"\ndescription = \"Shadow\"\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("broken.toml"), "[plugin\n").unwrap();

    let mut mgr = PluginManager::new(dir.path());
    let failures = mgr.load_manifests().await;

    let mut failed: Vec<String> = failures
        .iter()
        .map(|(p, _)| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    failed.sort();
    assert_eq!(failed, vec!["broken.toml", "setup.toml"]);
    assert!(matches!(
        failures.iter().find(|(p, _)| p.ends_with("setup.toml")).unwrap().1,
        PluginError::SecurityViolation(_)
    ));

    assert_eq!(mgr.len(), 1);
    let mut registry = Registry::new();
    mgr.register_commands(&mut registry).unwrap();
    let nodes = registry.create_all(&BuildContext::default());
    let push = nodes[0].find_child("push").unwrap();
    assert_eq!(push.annotation(glide_core::node::ANNOTATION_EXEC), Some("cloud-cli push"));
}
