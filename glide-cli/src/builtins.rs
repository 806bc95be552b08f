//! Built-in commands.
//!
//! Built-ins are registered before plugins and declared commands, so their
//! names and aliases always win. Passthrough commands carry the program line
//! they forward to in an `exec` annotation.

use glide_core::node::ANNOTATION_EXEC;
use glide_core::{Category, CommandMetadata, CommandNode, Registry, RegistryError, VisibilityTag};

/// A command that forwards its arguments to an external program.
struct Passthrough {
    name: &'static str,
    aliases: &'static [&'static str],
    about: &'static str,
    exec: &'static str,
    category: Category,
    visibility: VisibilityTag,
}

const COMPOSE: &str = "docker compose";

fn passthroughs() -> Vec<Passthrough> {
    vec![
        Passthrough {
            name: "up",
            aliases: &["start"],
            about: "Start the project containers",
            exec: "docker compose up -d",
            category: Category::Docker,
            visibility: VisibilityTag::NonRoot,
        },
        Passthrough {
            name: "down",
            aliases: &["stop"],
            about: "Stop the project containers",
            exec: "docker compose down",
            category: Category::Docker,
            visibility: VisibilityTag::NonRoot,
        },
        Passthrough {
            name: "shell",
            aliases: &["sh"],
            about: "Open a shell in the application container",
            exec: "docker compose exec app sh",
            category: Category::Docker,
            visibility: VisibilityTag::NonRoot,
        },
        Passthrough {
            name: "logs",
            aliases: &[],
            about: "Follow container logs",
            exec: "docker compose logs -f",
            category: Category::Docker,
            visibility: VisibilityTag::NonRoot,
        },
        Passthrough {
            name: "ps",
            aliases: &["status"],
            about: "List the project containers",
            exec: "docker compose ps",
            category: Category::Docker,
            visibility: VisibilityTag::NonRoot,
        },
        Passthrough {
            name: "test",
            aliases: &["t"],
            about: "Run the test suite inside the application container",
            exec: "docker compose exec app vendor/bin/phpunit",
            category: Category::Testing,
            visibility: VisibilityTag::NonRoot,
        },
        Passthrough {
            name: "artisan",
            aliases: &["a"],
            about: "Run an artisan command",
            exec: "docker compose exec app php artisan",
            category: Category::Developer,
            visibility: VisibilityTag::NonRoot,
        },
        Passthrough {
            name: "composer",
            aliases: &["c"],
            about: "Run composer inside the application container",
            exec: "docker compose exec app composer",
            category: Category::Developer,
            visibility: VisibilityTag::NonRoot,
        },
        Passthrough {
            name: "lint",
            aliases: &[],
            about: "Run the code style fixer",
            exec: "docker compose exec app vendor/bin/pint",
            category: Category::Developer,
            visibility: VisibilityTag::NonRoot,
        },
        Passthrough {
            name: "mysql",
            aliases: &["db"],
            about: "Open a MySQL client against the project database",
            exec: "docker compose exec mysql mysql",
            category: Category::Database,
            visibility: VisibilityTag::ProjectOnly,
        },
    ]
}

/// Register every built-in command.
pub fn register_builtins(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_fn(
        "help",
        |_| CommandNode::new("help", "Show help for Glide").disable_flag_parsing(true),
        CommandMetadata::new(Category::Help, "Show help for Glide"),
    )?;
    registry.register_fn(
        "version",
        |_| CommandNode::new("version", "Print the Glide version"),
        CommandMetadata::new(Category::Core, "Print the Glide version"),
    )?;
    registry.register_fn(
        "self-update",
        |_| {
            CommandNode::new("self-update", "Update Glide to the latest release")
                .long_about("Print the steps to install the latest Glide release.")
        },
        CommandMetadata::new(Category::Core, "Update Glide to the latest release")
            .with_aliases(["update", "upgrade"]),
    )?;
    registry.register_fn(
        "setup",
        |_| CommandNode::new("setup", "Create the Glide configuration for this workspace"),
        CommandMetadata::new(Category::Setup, "Create the Glide configuration for this workspace"),
    )?;
    registry.register_fn(
        "config",
        |_| {
            CommandNode::new("config", "Manage configuration")
                .child(CommandNode::new("show", "Print the effective configuration"))
                .child(CommandNode::new("init", "Write the default workspace configuration"))
                .child(CommandNode::new("path", "Print the configuration file locations"))
        },
        CommandMetadata::new(Category::Setup, "Manage configuration"),
    )?;
    registry.register_fn(
        "completion",
        |_| CommandNode::new("completion", "List command names starting with a prefix"),
        CommandMetadata::new(Category::Setup, "List command names starting with a prefix"),
    )?;
    registry.register_fn(
        "context",
        |_| {
            CommandNode::new("context", "Print the detected project context")
                .disable_flag_parsing(true)
        },
        CommandMetadata::new(Category::Debug, "Print the detected project context"),
    )?;
    registry.register_fn(
        "plugins",
        |_| {
            CommandNode::new("plugins", "Manage plugins")
                .child(CommandNode::new("list", "List loaded plugins"))
                .child(CommandNode::new("info", "Show details of a plugin"))
        },
        CommandMetadata::new(Category::Plugin, "Manage plugins").with_aliases(["plugin"]),
    )?;
    registry.register_fn(
        "global",
        |_| {
            CommandNode::new("global", "Commands spanning every worktree")
                .child(CommandNode::new("list", "List the project worktrees").alias("ls"))
                .child(CommandNode::new("status", "Show git status of every worktree"))
        },
        CommandMetadata::new(Category::Global, "Commands spanning every worktree")
            .with_aliases(["g"]),
    )?;

    for cmd in passthroughs() {
        let Passthrough {
            name,
            aliases,
            about,
            exec,
            category,
            visibility,
        } = cmd;
        registry.register_fn(
            name,
            move |_| {
                CommandNode::new(name, about)
                    .disable_flag_parsing(true)
                    .annotate(ANNOTATION_EXEC, exec)
            },
            CommandMetadata::new(category, about)
                .with_aliases(aliases.iter().copied())
                .with_visibility(visibility),
        )?;
    }

    // Debug helper; listed only with `ui.show_hidden`.
    registry.register_fn(
        "compose",
        |_| {
            CommandNode::new("compose", "Run docker compose with project defaults")
                .disable_flag_parsing(true)
                .annotate(ANNOTATION_EXEC, COMPOSE)
        },
        CommandMetadata::new(Category::Debug, "Run docker compose with project defaults")
            .with_hidden(true)
            .with_visibility(VisibilityTag::NonRoot),
    )?;

    Ok(())
}
