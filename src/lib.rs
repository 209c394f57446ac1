//! # Scaffold - front-end build scaffold
//!
//! Scaffold is a CLI tool and library around a front-end bundler. It does not
//! bundle anything itself; it decides *what* to build and *whether* a commit
//! may go in:
//!
//! - **Layered configuration**: a default config file and an optional custom
//!   override, deep-merged into one tree with typed per-mode views
//! - **Entry discovery**: one directory per application, selected by
//!   invocation flags, a configured filter or an interactive prompt whose
//!   answer is remembered per build mode
//! - **Build orchestration**: a JSON build plan handed to the bundler, HTML
//!   post-processing and build version tags
//! - **Commit gates**: modification permissions, line and size limits and a
//!   lint level, checked in that order before a commit is accepted
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line argument parsing
//! - [`config`] - Config file formats, build modes and typed sections
//! - [`config_hierarchy`] - Default/custom config discovery and merging
//! - [`deep_merge`] - Recursive merge of configuration trees
//! - [`argv`] - Script-runner argument decoding (`npm_config_argv`)
//! - [`filter`] - Entry filters (exact, pattern, predicate, any-of)
//! - [`entry`] - Entry discovery and interactive selection
//! - [`rule_filter`] - Glob-keyed file rules
//! - [`level`] - Lint level scale and remarks
//! - [`lint`] - External lint runner
//! - [`check`] - The commit gate checks
//! - [`gate`] - Git-hook orchestration
//! - [`git_utils`] - Changed files, commit messages and pull/merge
//! - [`notify`] - Desktop notifications
//! - [`json_store`] - JSON log documents
//! - [`version`] - Build version tags
//! - [`inject`] - HTML template injection
//! - [`pipeline`] - Build plan assembly and bundler invocation
//! - [`cli_report`] - Terminal tables
//! - [`error`] - Centralized error types for the crate
//!
//! ## Usage as a Library
//!
//! ```rust,no_run
//! use scaffold_core::{ArgvResolver, EntryResolver, SmartEntryOptions, TerminalPrompter};
//!
//! # fn main() -> scaffold_core::Result<()> {
//! let argv = ArgvResolver::from_env();
//! let entries = EntryResolver::new(".").smart_entrys(
//!     &argv,
//!     &SmartEntryOptions::default(),
//!     &TerminalPrompter,
//! )?;
//! for (name, path) in &entries {
//!     println!("{name}: {path}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All functions that can fail return [`Result<T>`], which is a type alias for
//! `std::result::Result<T, ScaffoldError>`. See the [`error`] module for details.

// Module declarations
pub mod argv;
pub mod check;
pub mod cli;
pub mod cli_report;
pub mod config;
pub mod config_hierarchy;
pub mod deep_merge;
pub mod entry;
pub mod error;
pub mod file_utils;
pub mod filter;
pub mod gate;
pub mod git_utils;
pub mod inject;
pub mod json_store;
pub mod level;
pub mod lint;
pub mod notify;
pub mod pipeline;
pub mod rule_filter;
pub mod version;

// Public API exports
pub use crate::argv::{ArgvOrder, ArgvResolver};
pub use crate::check::{CheckContext, CheckOutcome, GateCheck, Rejection};
pub use crate::cli::{Cli, Commands};
pub use crate::deep_merge::{ArrayMerge, merge, merge_obj, value_at_path};
pub use crate::entry::{EntryMap, EntryPrompter, EntryResolver, SmartEntryOptions, TerminalPrompter};
pub use crate::filter::{EntryFilter, get_entrys_by_filter};
pub use crate::gate::{CommitGate, GateDecision};
pub use crate::level::{LevelRef, LevelScale, RandomRemarks, RemarkProvider};
pub use crate::lint::{CommandLintRunner, LintReport, LintRunner};
pub use crate::pipeline::{BuildPipeline, BuildPlan};
pub use crate::rule_filter::{RuleSet, filter_by_rule};
pub use crate::version::VersionLog;

// Config exports
pub use crate::config::{BuildMode, EntrysInquirer, GitHooksConfig, ModeConfig, load_config_from_path};

// Config hierarchy exports
pub use crate::config_hierarchy::{
    ConfigSource, ConfigSourceType, HierarchicalConfig, find_git_repo_root, find_project_root,
    load_hierarchical_config,
};

// Error exports
pub use crate::error::{Result, ScaffoldError as Error};
