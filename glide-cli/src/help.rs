//! Plain-text rendering of the composed help listing.

use glide_core::{HelpSection, ProjectContext};

/// Render the top-level help screen.
pub fn render_help(
    sections: &[HelpSection],
    ctx: Option<&ProjectContext>,
    show_aliases: bool,
) -> String {
    let mut output = String::from("Glide: context-aware development CLI\n\n");
    output.push_str("Usage: glide [OPTIONS] <COMMAND> [ARGS]...\n");
    output.push_str(&format!("\nContext: {}\n", describe_context(ctx)));

    if sections.is_empty() {
        output.push_str("\nNo commands are available in this directory.\n");
    }

    for section in sections {
        output.push_str(&format!("\n  {}:\n", section.category.display_name()));

        for entry in &section.entries {
            let aliases = format_aliases(&entry.aliases, show_aliases);
            let declared = if entry.is_declared { " [project]" } else { "" };
            let hidden = if entry.is_hidden { " [hidden]" } else { "" };
            output.push_str(&format!(
                "    {:<20} {}{}{}{}\n",
                entry.name, entry.description, aliases, declared, hidden
            ));
            for child in &entry.children {
                output.push_str(&format!(
                    "      {:<18} {}{}\n",
                    child.name,
                    child.description,
                    format_aliases(&child.aliases, show_aliases)
                ));
            }
        }
    }

    output.push_str("\nOptions:\n");
    output.push_str("  -w, --workspace <DIR>  Workspace directory\n");
    output.push_str("  -c, --config <FILE>    Configuration file path\n");
    output.push_str("  -v, --verbose          Increase verbosity (-v, -vv, -vvv)\n");
    output.push_str("  -q, --quiet            Only log errors\n");
    output.push_str("  -h, --help             Print help\n");
    output.push_str("\nRun 'glide help <command>' for details on a command.\n");
    output
}

fn format_aliases(aliases: &[String], show: bool) -> String {
    if !show || aliases.is_empty() {
        String::new()
    } else {
        format!(" ({})", aliases.join(", "))
    }
}

/// One-line description of the detected context.
pub fn describe_context(ctx: Option<&ProjectContext>) -> String {
    let Some(ctx) = ctx.filter(|c| c.development_mode.is_detected()) else {
        return "no project detected".to_string();
    };
    match &ctx.worktree_name {
        Some(name) => format!("{} ({} {})", ctx.development_mode, ctx.location, name),
        None => format!("{} ({})", ctx.development_mode, ctx.location),
    }
}
