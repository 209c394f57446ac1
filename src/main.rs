//! scaffold: entry discovery, build orchestration and commit gates for a
//! front-end project.
//!
//! USAGE EXAMPLES (from the project root):
//!   scaffold entries -- -e home about
//!   scaffold build --mode production -- --nc
//!   scaffold hooks -- --commit-msg
//!   scaffold inspect gitHooks.level
//!
//! When run through a package script, the script runner's recorded argv
//! (`npm_config_argv`) takes the place of the arguments after `--`.

use anyhow::{Context, Result};
use clap::Parser;
use scaffold_core::cli::{Cli, Commands, script_argv};
use scaffold_core::cli_report::{render_entry_table, render_gate_report, render_sources_table};
use scaffold_core::config::EntrysInquirer;
use scaffold_core::error::ScaffoldError;
use scaffold_core::gate::GateDecision;
use scaffold_core::inject::{DEFAULT_GUARD_SRC, inject_debug_tooling, with_cache_buster};
use scaffold_core::pipeline::BUILD_VERSION_ID;
use scaffold_core::{
    ArgvResolver, BuildMode, BuildPipeline, CommitGate, EntryFilter, EntryResolver, HierarchicalConfig,
    SmartEntryOptions, TerminalPrompter, VersionLog, find_project_root, load_hierarchical_config,
};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if let Some(scaffold_err) = err.downcast_ref::<ScaffoldError>() {
                for suggestion in scaffold_err.suggestions() {
                    eprintln!("  hint: {suggestion}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let root = match &cli.root {
        Some(root) => cwd.join(root),
        None => find_project_root(&cwd),
    };
    tracing::debug!(root = %root.display(), "Project root");

    let config = load_hierarchical_config(&root, cli.config.as_deref())
        .with_context(|| format!("Failed to load configuration for '{}'", root.display()))?;
    let script = cli.command.script_name();

    match cli.command {
        Commands::Entries {
            mode,
            base,
            inquire,
            json,
            argv,
        } => {
            let argv = ArgvResolver::from_env_or(script_argv(script, &argv));
            let mode = BuildMode::resolve(mode.as_deref());
            let mode_config = config.mode_config(mode)?;

            let mut resolver = EntryResolver::new(&root);
            if let Some(base) = base {
                resolver = resolver.with_base_path(base);
            }
            let options = SmartEntryOptions {
                filter: EntryFilter::from_config(&mode_config.app_entrys),
                inquirer: if inquire {
                    EntrysInquirer::Enabled(true)
                } else {
                    mode_config.entrys_inquirer
                },
                remember: true,
                mode,
            };
            let entries = resolver.smart_entrys(&argv, &options, &TerminalPrompter)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print!("{}", render_entry_table(&entries));
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Build { mode, argv } => {
            let argv = ArgvResolver::from_env_or(script_argv(script, &argv));
            let mode = BuildMode::resolve(mode.as_deref());
            let pipeline = BuildPipeline::new(&config, mode, &argv);

            let plan = pipeline.prepare(&TerminalPrompter).context("Failed to prepare the build")?;
            print!("{}", render_entry_table(&plan.entries));
            let ok = pipeline.execute(&plan).context("Build failed")?;
            if ok {
                println!("Built version {} into {}", plan.version, plan.output_dir.display());
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }

        Commands::Hooks { message_file, argv } => {
            let argv = ArgvResolver::from_env_or(script_argv(script, &argv));
            run_hooks(&config, &argv, message_file)
        }

        Commands::Inject {
            mode,
            html,
            output,
            guard_src,
            no_guard,
        } => {
            let mode = BuildMode::resolve(mode.as_deref());
            let template = fs::read_to_string(&html)
                .with_context(|| format!("Failed to read '{}'", html.display()))?;
            let version = VersionLog::new(&root).create_tag(Some(BUILD_VERSION_ID))?;
            let guard = (!no_guard).then(|| {
                guard_src.unwrap_or_else(|| {
                    with_cache_buster(DEFAULT_GUARD_SRC, chrono::Utc::now().timestamp_millis())
                })
            });

            let injected = inject_debug_tooling(&template, mode, &version, guard.as_deref());
            let target = output.unwrap_or(html);
            fs::write(&target, injected).with_context(|| format!("Failed to write '{}'", target.display()))?;
            tracing::info!(path = %target.display(), version = %version, "Injected runtime tooling");
            Ok(ExitCode::SUCCESS)
        }

        Commands::Inspect { path, sources } => {
            if sources {
                print!("{}", render_sources_table(&config));
                return Ok(ExitCode::SUCCESS);
            }
            let value = match path.as_deref() {
                Some(p) => config
                    .value_at(p)
                    .with_context(|| format!("No configuration value at '{p}'"))?,
                None => &config.merged,
            };
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Version { id, last } => {
            let log = VersionLog::new(&root);
            let tag = if last {
                log.last_version(id.as_deref())
                    .context("No build version has been logged yet")?
            } else {
                log.create_tag(id.as_deref())?
            };
            println!("{tag}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_hooks(config: &HierarchicalConfig, argv: &ArgvResolver, message_file: Option<PathBuf>) -> Result<ExitCode> {
    let gate = CommitGate::new(&config.root, config.git_hooks()?);
    let decision = gate
        .run(argv, message_file.as_deref())
        .context("Git hook failed")?;
    print!("{}", render_gate_report(&decision));

    if let GateDecision::Rejected { exit_delay, .. } = &decision {
        // Let the desktop notification surface before git reports the failure.
        std::thread::sleep(*exit_delay);
    }
    Ok(ExitCode::from(u8::try_from(decision.exit_code()).unwrap_or(1)))
}
