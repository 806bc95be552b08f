//! Command dispatch and built-in handlers.

use crate::app::App;
use crate::help::{describe_context, render_help};
use crate::runner::{passthrough_line, run_shell};
use crate::tree::{self, Invocation};
use anyhow::Context;
use clap::error::ErrorKind;
use glide_core::config::{user_config_path, workspace_config_path, write_default_config};
use glide_core::context::{WORKTREES_DIR, list_worktrees};
use glide_core::declared::render_template;
use glide_core::node::{ANNOTATION_COMMAND, ANNOTATION_EXEC};
use glide_core::{
    Category, CommandMetadata, CommandNode, HelpOptions, compose_help_with, is_visible,
    should_show_category,
};
use tracing::info;

/// Exit code for usage errors.
const EXIT_USAGE: i32 = 2;

/// Dispatch `argv` (everything after the global flags). Returns the exit code.
pub async fn dispatch(app: &App, argv: &[String]) -> anyhow::Result<i32> {
    let Some(first) = argv.first() else {
        print!("{}", help_screen(app));
        return Ok(0);
    };

    let Some(descriptor) = app.registry.get_descriptor(first) else {
        eprintln!("Unknown command: {first}");
        if let Some(suggestion) = suggestion(app, first) {
            eprintln!("Did you mean '{suggestion}'?");
        }
        eprintln!("Run 'glide help' to see the available commands.");
        return Ok(EXIT_USAGE);
    };

    if !is_visible(&descriptor.metadata, app.context()) {
        eprintln!(
            "Command '{}' is not available in this context (requires {}).",
            descriptor.name,
            requirement(&descriptor.metadata)
        );
        eprintln!("Current context: {}", describe_context(app.context()));
        return Ok(1);
    }

    let nodes = app.visible_nodes();
    let matches = match tree::build_cli(&nodes)
        .try_get_matches_from(std::iter::once("glide").chain(argv.iter().map(String::as_str)))
    {
        Ok(matches) => matches,
        Err(e) => {
            e.print()?;
            return Ok(match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => e.exit_code(),
            });
        }
    };
    let Some(invocation) = tree::invocation(&matches) else {
        print!("{}", help_screen(app));
        return Ok(0);
    };
    let Some(node) = tree::find_node(&nodes, &invocation.path) else {
        anyhow::bail!("no command at {}", invocation.path.join(" "));
    };
    let invocation = if node.disable_flag_parsing {
        tree::verbatim(invocation, argv)
    } else {
        invocation
    };

    info!(command = %invocation.path.join(" "), args = invocation.args.len(), "Dispatching");
    run_node(app, &nodes, node, &invocation).await
}

async fn run_node(
    app: &App,
    nodes: &[CommandNode],
    node: &CommandNode,
    invocation: &Invocation,
) -> anyhow::Result<i32> {
    if node.is_declared() {
        let template = node.annotation(ANNOTATION_COMMAND).unwrap_or_default();
        let script = render_template(template, &invocation.args);
        return run_shell(&script, &app.workspace).await;
    }
    if let Some(exec) = node.annotation(ANNOTATION_EXEC) {
        return run_shell(&passthrough_line(exec, &invocation.args), &app.workspace).await;
    }
    if !node.children.is_empty() {
        if let Some(help) = tree::command_help(nodes, &invocation.path) {
            print!("{help}");
        }
        return Ok(0);
    }

    let path: Vec<&str> = invocation.path.iter().map(String::as_str).collect();
    let args = &invocation.args;
    match path.as_slice() {
        ["help"] => Ok(handle_help(app, nodes, args)),
        ["version"] => {
            println!("glide {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        ["self-update"] => {
            handle_self_update();
            Ok(0)
        }
        ["setup"] | ["config", "init"] => handle_config_init(app),
        ["config", "show"] => {
            println!("{}", toml::to_string_pretty(&app.config)?);
            Ok(0)
        }
        ["config", "path"] => {
            handle_config_path(app);
            Ok(0)
        }
        ["completion"] => {
            handle_completion(app, args.first().map(String::as_str).unwrap_or_default());
            Ok(0)
        }
        ["context"] => handle_context(app, args),
        ["plugins", "list"] => {
            handle_plugins_list(app);
            Ok(0)
        }
        ["plugins", "info"] => handle_plugins_info(app, args),
        ["global", "list"] => handle_global_list(app),
        ["global", "status"] => handle_global_status(app).await,
        _ => {
            // Plugin leaves without a program line have nothing to run.
            eprintln!("Command '{}' has nothing to run.", invocation.path.join(" "));
            Ok(1)
        }
    }
}

fn help_screen(app: &App) -> String {
    let options = HelpOptions {
        show_hidden: app.config.ui.show_hidden,
    };
    let sections = compose_help_with(&app.registry, &app.nodes(), app.context(), options);
    render_help(&sections, app.context(), app.config.ui.show_aliases)
}

/// Closest visible command to an unknown input.
fn suggestion<'a>(app: &'a App, input: &str) -> Option<&'a str> {
    let candidate = app.registry.suggest(input)?;
    app.registry
        .get_metadata(candidate)
        .is_some_and(|m| !m.hidden && is_visible(m, app.context()))
        .then_some(candidate)
}

/// Why a command is hidden in the current context.
fn requirement(metadata: &CommandMetadata) -> &'static str {
    match metadata.category {
        Category::Global => return "a multi-worktree project",
        Category::Docker | Category::Testing | Category::Developer | Category::Database => {
            if metadata.visibility.is_none() {
                return "a project directory";
            }
        }
        _ => {}
    }
    metadata
        .visibility
        .as_ref()
        .map(|tag| tag.requirement())
        .unwrap_or("a project directory")
}

fn handle_help(app: &App, nodes: &[CommandNode], args: &[String]) -> i32 {
    let Some(key) = args.first() else {
        print!("{}", help_screen(app));
        return 0;
    };
    let Some(name) = app
        .registry
        .get_descriptor(key)
        .filter(|d| is_visible(&d.metadata, app.context()))
        .map(|d| d.name.clone())
    else {
        eprintln!("No help for unknown command: {key}");
        return 1;
    };
    let mut path = vec![name];
    path.extend(args[1..].iter().cloned());
    match tree::command_help(nodes, &path) {
        Some(help) => {
            print!("{help}");
            0
        }
        None => {
            eprintln!("No help for: {}", path.join(" "));
            1
        }
    }
}

fn handle_self_update() {
    println!("Glide {} is installed.", env!("CARGO_PKG_VERSION"));
    println!("To install the latest release run:");
    println!("  cargo install glide --locked");
}

fn handle_config_init(app: &App) -> anyhow::Result<i32> {
    match write_default_config(app.config_root())? {
        Some(path) => println!("Created default configuration at: {}", path.display()),
        None => println!(
            "Configuration file already exists at: {}",
            workspace_config_path(app.config_root()).display()
        ),
    }
    Ok(0)
}

fn handle_config_path(app: &App) {
    let describe = |path: &std::path::Path| {
        let state = if path.exists() { "" } else { " (not found)" };
        format!("{}{}", path.display(), state)
    };
    if let Some(user) = user_config_path() {
        println!("user:      {}", describe(&user));
    }
    println!(
        "workspace: {}",
        describe(&workspace_config_path(app.config_root()))
    );
    if let Some(file) = &app.config_file {
        println!("explicit:  {}", describe(file));
    }
}

fn handle_completion(app: &App, prefix: &str) {
    for token in app.registry.completions(prefix) {
        let visible = app
            .registry
            .get_metadata(token)
            .is_some_and(|m| !m.hidden && is_visible(m, app.context()));
        if visible {
            println!("{token}");
        }
    }
}

fn handle_context(app: &App, args: &[String]) -> anyhow::Result<i32> {
    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string_pretty(&app.context)?);
        return Ok(0);
    }
    println!("Context: {}", describe_context(app.context()));
    println!("Working directory: {}", app.workspace.display());
    if let Some(ctx) = app.context() {
        if let Some(root) = &ctx.project_root {
            println!("Project root: {}", root.display());
        }
        if let Some(name) = &ctx.worktree_name {
            println!("Worktree: {name}");
        }
    }
    let gated = [
        Category::Global,
        Category::Docker,
        Category::Testing,
        Category::Developer,
        Category::Database,
    ];
    let hidden: Vec<&str> = gated
        .iter()
        .filter(|c| !should_show_category(c, app.context()))
        .map(|c| c.display_name())
        .collect();
    if !hidden.is_empty() {
        println!("Hidden categories: {}", hidden.join(", "));
    }
    Ok(0)
}

fn handle_plugins_list(app: &App) {
    let plugins = app.plugins.list();
    if plugins.is_empty() {
        println!(
            "No plugins loaded (directory: {}).",
            app.plugins.plugins_dir().display()
        );
        return;
    }
    println!("Loaded plugins ({}):", plugins.len());
    for state in plugins {
        println!(
            "  {:<20} {:<10} {}",
            state.metadata.name, state.metadata.version, state.metadata.description
        );
    }
}

fn handle_plugins_info(app: &App, args: &[String]) -> anyhow::Result<i32> {
    let Some(name) = args.first() else {
        eprintln!("Usage: glide plugins info <NAME>");
        return Ok(EXIT_USAGE);
    };
    match app.plugins.get(name) {
        Some(state) => {
            println!("{}", serde_json::to_string_pretty(state)?);
            Ok(0)
        }
        None => {
            eprintln!("Plugin not found: {name}");
            Ok(1)
        }
    }
}

fn worktree_root(app: &App) -> anyhow::Result<&std::path::Path> {
    app.context()
        .filter(|c| c.is_multi_worktree())
        .and_then(|c| c.project_root.as_deref())
        .context("not inside a multi-worktree project")
}

fn handle_global_list(app: &App) -> anyhow::Result<i32> {
    let root = worktree_root(app)?;
    let current = app.context().and_then(|c| c.worktree_name.as_deref());
    for name in list_worktrees(root).context("listing worktrees")? {
        let marker = if Some(name.as_str()) == current { "*" } else { " " };
        println!("{marker} {name}");
    }
    Ok(0)
}

async fn handle_global_status(app: &App) -> anyhow::Result<i32> {
    let root = worktree_root(app)?;
    let mut worst = 0;
    for name in list_worktrees(root).context("listing worktrees")? {
        println!("== {name} ==");
        let dir = root.join(WORKTREES_DIR).join(&name);
        let code = run_shell("git status --short --branch", &dir).await?;
        worst = worst.max(code);
    }
    Ok(worst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glide_core::{GlideConfig, VisibilityTag};
    use glide_plugins::PluginManager;
    use std::fs;
    use std::path::Path;

    fn app_in(dir: &Path) -> App {
        App::new(
            dir.to_path_buf(),
            None,
            GlideConfig::default(),
            glide_core::context::detect(dir),
            PluginManager::new(dir.join("plugins")),
        )
        .unwrap()
    }

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_requirement_messages() {
        let global = CommandMetadata::new(Category::Global, "g");
        assert_eq!(requirement(&global), "a multi-worktree project");

        let docker = CommandMetadata::new(Category::Docker, "up");
        assert_eq!(requirement(&docker), "a project directory");

        let root_only =
            CommandMetadata::new(Category::Core, "x").with_visibility(VisibilityTag::RootOnly);
        assert_eq!(
            requirement(&root_only),
            VisibilityTag::RootOnly.requirement()
        );
    }

    #[tokio::test]
    async fn test_unknown_command_is_usage_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = app_in(dir.path());
        assert_eq!(dispatch(&app, &argv(&["frobnicate"])).await.unwrap(), EXIT_USAGE);
    }

    #[tokio::test]
    async fn test_invisible_command_is_refused() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = app_in(dir.path());
        assert!(app.registry.contains("up"));
        assert_eq!(dispatch(&app, &argv(&["up"])).await.unwrap(), 1);
    }

    #[test]
    fn test_suggestion_skips_invisible_commands() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = app_in(dir.path());
        assert_eq!(suggestion(&app, "verison"), Some("version"));
        assert_eq!(suggestion(&app, "mysq"), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_declared_command_runs_with_args() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(
            dir.path().join(".glide.yml"),
            "commands:\n  touch-it:\n    cmd: touch $1\n    description: Create a file\n",
        )
        .unwrap();
        let app = app_in(dir.path());

        let code = dispatch(&app, &argv(&["touch-it", "made-by-glide"]))
            .await
            .unwrap();
        assert_eq!(code, 0);
        assert!(dir.path().join("made-by-glide").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_declared_command_receives_double_dash() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(
            dir.path().join(".glide.yml"),
            "commands:\n  first-arg: test \"$1\" = \"--\"\n",
        )
        .unwrap();
        let app = app_in(dir.path());

        let code = dispatch(&app, &argv(&["first-arg", "--", "--dev"]))
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_declared_command_exit_code_propagates() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".glide.yml"), "commands:\n  fail: exit 7\n").unwrap();
        let app = app_in(dir.path());
        assert_eq!(dispatch(&app, &argv(&["fail"])).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_builtin_handlers_succeed() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = app_in(dir.path());
        for cmd in [
            vec!["version"],
            vec!["upgrade"],
            vec!["help"],
            vec!["help", "config"],
            vec!["config"],
            vec!["config", "path"],
            vec!["completion", "co"],
            vec!["context", "--json"],
            vec!["plugins", "list"],
        ] {
            assert_eq!(dispatch(&app, &argv(&cmd)).await.unwrap(), 0, "{cmd:?}");
        }
    }

    #[tokio::test]
    async fn test_config_init_writes_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = app_in(dir.path());
        assert_eq!(dispatch(&app, &argv(&["config", "init"])).await.unwrap(), 0);
        assert!(workspace_config_path(dir.path()).exists());
        assert_eq!(dispatch(&app, &argv(&["setup"])).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_global_list_in_multi_worktree_root() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("vcs/.git")).unwrap();
        fs::create_dir_all(dir.path().join("worktrees/feature-a")).unwrap();
        let app = app_in(dir.path());
        assert_eq!(dispatch(&app, &argv(&["g", "ls"])).await.unwrap(), 0);
    }
}
