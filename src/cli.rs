//! Command-line interface definitions for the `scaffold` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for `scaffold`.
#[derive(Parser, Debug)]
#[command(
    name = "scaffold",
    version,
    about = "Front-end build scaffold: entry discovery, layered config and commit gates"
)]
pub struct Cli {
    /// Project root. Defaults to the directory holding package.json or a
    /// scaffold config, else the enclosing git work tree.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Configuration file replacing scaffold.config.*.
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve and print the application entries.
    Entries {
        /// Build mode (development, production, test). Defaults to NODE_ENV.
        #[arg(long)]
        mode: Option<String>,

        /// Directory scanned for entries, relative to the root.
        #[arg(long)]
        base: Option<PathBuf>,

        /// Always ask which entries to use.
        #[arg(long, short = 'i')]
        inquire: bool,

        /// Print the entry map as JSON.
        #[arg(long)]
        json: bool,

        /// Script-runner flags such as `-e home about` or `-all`, used when
        /// npm_config_argv is not set.
        #[arg(last = true)]
        argv: Vec<String>,
    },

    /// Resolve entries, write the build plan and run the bundler.
    Build {
        /// Build mode (development, production, test). Defaults to NODE_ENV.
        #[arg(long)]
        mode: Option<String>,

        /// Script-runner flags such as `-e home`, `--nc` or `--tmp`.
        #[arg(last = true)]
        argv: Vec<String>,
    },

    /// Run the git-hook actions selected by `--pre-push` / `--commit-msg`.
    Hooks {
        /// Commit message file. Defaults to the first word of HUSKY_GIT_PARAMS.
        #[arg(long)]
        message_file: Option<PathBuf>,

        /// Hook flags, e.g. `-- --commit-msg`.
        #[arg(last = true)]
        argv: Vec<String>,
    },

    /// Inject the runtime tooling into an HTML template.
    Inject {
        /// Build mode (development, production, test). Defaults to NODE_ENV.
        #[arg(long)]
        mode: Option<String>,

        /// Template to inject into.
        html: PathBuf,

        /// Write the result here instead of rewriting the template.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Guard script URL.
        #[arg(long)]
        guard_src: Option<String>,

        /// Do not load the guard script.
        #[arg(long, conflicts_with = "guard_src")]
        no_guard: bool,
    },

    /// Print the resolved configuration, or the value at a dotted path.
    Inspect {
        /// Dotted path such as `gitHooks.level`.
        path: Option<String>,

        /// List the configuration files instead.
        #[arg(long)]
        sources: bool,
    },

    /// Create a build version tag, or print the last one.
    Version {
        /// Reuse the tag already created under this id in this process.
        #[arg(long)]
        id: Option<String>,

        /// Print the last logged tag instead of creating one.
        #[arg(long)]
        last: bool,
    },
}

impl Commands {
    /// Script name used when rebuilding a `run <script> ...` argv.
    #[must_use]
    pub const fn script_name(&self) -> &'static str {
        match self {
            Self::Entries { .. } => "entries",
            Self::Build { .. } => "build",
            Self::Hooks { .. } => "hooks",
            Self::Inject { .. } => "inject",
            Self::Inspect { .. } => "inspect",
            Self::Version { .. } => "version",
        }
    }
}

/// `run <script> <trailing...>`, the shape recorded in npm_config_argv.
#[must_use]
pub fn script_argv(script: &str, trailing: &[String]) -> Vec<String> {
    ["run".to_string(), script.to_string()]
        .into_iter()
        .chain(trailing.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_trailing_script_flags() {
        let cli = Cli::parse_from(["scaffold", "entries", "--json", "--", "-e", "home", "about"]);
        let Commands::Entries { json, argv, .. } = &cli.command else {
            panic!("expected entries");
        };
        assert!(*json);
        assert_eq!(argv, &["-e", "home", "about"]);
        assert_eq!(
            script_argv(cli.command.script_name(), argv),
            vec!["run", "entries", "-e", "home", "about"]
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["scaffold", "hooks", "--verbose", "--root", "/repo", "--", "--commit-msg"]);
        assert!(cli.verbose);
        assert_eq!(cli.root, Some(PathBuf::from("/repo")));
        assert!(matches!(cli.command, Commands::Hooks { ref argv, .. } if argv == &["--commit-msg"]));
    }

    #[test]
    fn test_no_guard_conflicts_with_guard_src() {
        let result = Cli::try_parse_from(["scaffold", "inject", "a.html", "--no-guard", "--guard-src", "x.js"]);
        assert!(result.is_err());
    }
}
