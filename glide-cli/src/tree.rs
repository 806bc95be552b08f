//! Conversion of command nodes into the clap parser.

use clap::{Arg, ArgMatches, Command};
use glide_core::CommandNode;

/// Id of the trailing argument list every leaf command accepts.
pub const ARGS: &str = "args";

/// A parsed invocation: canonical command path plus trailing arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub path: Vec<String>,
    pub args: Vec<String>,
}

/// Build the top-level parser from already-filtered nodes.
///
/// Global flags are parsed before this parser runs, so the root carries no
/// options of its own.
pub fn build_cli(nodes: &[CommandNode]) -> Command {
    let mut cli = Command::new("glide")
        .bin_name("glide")
        .disable_help_subcommand(true)
        .disable_help_flag(true)
        .disable_version_flag(true);
    for node in nodes {
        cli = cli.subcommand(to_command(node));
    }
    cli
}

fn to_command(node: &CommandNode) -> Command {
    let mut cmd = Command::new(node.name.clone())
        .about(node.about.clone())
        .hide(node.hidden)
        .disable_help_subcommand(true);
    if let Some(long) = &node.long_about {
        cmd = cmd.long_about(long.clone());
    }
    for alias in &node.aliases {
        cmd = cmd.visible_alias(alias.clone());
    }

    if node.children.is_empty() {
        let mut args = Arg::new(ARGS)
            .value_name("ARGS")
            .num_args(0..)
            .trailing_var_arg(true);
        if node.disable_flag_parsing {
            cmd = cmd.disable_help_flag(true);
            args = args.allow_hyphen_values(true);
        }
        cmd = cmd.arg(args);
    } else {
        for child in &node.children {
            cmd = cmd.subcommand(to_command(child));
        }
    }
    cmd
}

/// Walk the matched sub-commands down to the leaf.
pub fn invocation(matches: &ArgMatches) -> Option<Invocation> {
    let (name, mut current) = matches.subcommand()?;
    let mut path = vec![name.to_string()];
    while let Some((name, next)) = current.subcommand() {
        path.push(name.to_string());
        current = next;
    }
    let args = current
        .try_get_many::<String>(ARGS)
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    Some(Invocation { path, args })
}

/// Re-read the trailing arguments of a flag-disabled leaf from `argv`.
///
/// clap drops a leading `--` even when hyphen values are allowed, so the
/// tokens after the command path are taken verbatim instead.
pub fn verbatim(invocation: Invocation, argv: &[String]) -> Invocation {
    let args = argv
        .get(invocation.path.len()..)
        .map(<[String]>::to_vec)
        .unwrap_or_default();
    Invocation { args, ..invocation }
}

/// Find the node addressed by a canonical path.
pub fn find_node<'a>(nodes: &'a [CommandNode], path: &[String]) -> Option<&'a CommandNode> {
    let (first, rest) = path.split_first()?;
    let mut node = nodes.iter().find(|n| &n.name == first)?;
    for segment in rest {
        node = node.find_child(segment)?;
    }
    Some(node)
}

/// Long help of one command, rendered by clap.
pub fn command_help(nodes: &[CommandNode], path: &[String]) -> Option<String> {
    let mut cli = build_cli(nodes);
    let mut cmd = &mut cli;
    for segment in path {
        cmd = cmd.find_subcommand_mut(segment)?;
    }
    Some(cmd.render_long_help().to_string())
}
