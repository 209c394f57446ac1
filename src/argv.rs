//! Decoding of the script-runner invocation arguments.
//!
//! When a command is launched through `npm run <script> [args...]`, npm records
//! the original argument vector as JSON in the `npm_config_argv` environment
//! variable (`{"original": ["run", "dev", "-e", "index"]}`). [`ArgvResolver`]
//! reads that vector (or one supplied directly) and exposes the flag groups
//! that follow the script name.
//!
//! Any token starting with `-` opens a new flag group named after the token
//! without its leading dashes; every following non-flag token is appended to
//! the currently open group. Tokens seen before the first flag are ignored.

use serde::Deserialize;

/// Name of the environment variable npm uses to record the invocation.
pub const NPM_CONFIG_ARGV: &str = "npm_config_argv";

/// Aliases selecting every discovered entry.
pub const ALL_ENTRY_FLAGS: &[&str] = &["all", "allEntry", "allentry", "allEntrys", "allentrys"];

/// Aliases carrying an explicit entry name list.
pub const ENTRY_FLAGS: &[&str] = &["e", "entry", "entrys"];

/// Aliases forcing interactive entry selection.
pub const INQUIRE_FLAGS: &[&str] = &["i", "inquire"];

/// Aliases disabling the bundler's filesystem cache.
pub const NO_CACHE_FLAGS: &[&str] = &["nc", "nocache", "noCache"];

/// Aliases routing build output to a throwaway directory.
pub const TMP_DIR_FLAGS: &[&str] = &["tmp", "tmpdir", "tmpDir"];

/// Decoded invocation: the run-script name and its flag groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgvOrder {
    /// The run-script name, when the invocation was `run <script> ...`.
    pub order: Option<String>,
    /// Flag groups in first-seen order, flag names stripped of dashes.
    pub args: Vec<(String, Vec<String>)>,
}

impl ArgvOrder {
    /// Returns the captured tokens for `flag`, if it was passed.
    #[must_use]
    pub fn get(&self, flag: &str) -> Option<&[String]> {
        self.args
            .iter()
            .find(|(name, _)| name == flag)
            .map(|(_, values)| values.as_slice())
    }
}

#[derive(Debug, Deserialize)]
struct NpmConfigArgv {
    #[serde(default)]
    original: Vec<String>,
}

/// Resolves flags from the raw invocation token sequence.
#[derive(Debug, Clone, Default)]
pub struct ArgvResolver {
    raw: Vec<String>,
    order: ArgvOrder,
}

impl ArgvResolver {
    /// Builds a resolver over an explicit token sequence such as
    /// `["run", "dev", "-e", "index", "docs"]`.
    #[must_use]
    pub fn new(raw: Vec<String>) -> Self {
        let order = parse_run_order(&raw);
        Self { raw, order }
    }

    /// Builds a resolver from `npm_config_argv`.
    ///
    /// A missing or malformed variable yields an empty resolver.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(npm_config_argv().unwrap_or_default())
    }

    /// Uses `npm_config_argv` when it is set, otherwise `fallback`.
    #[must_use]
    pub fn from_env_or(fallback: Vec<String>) -> Self {
        match npm_config_argv() {
            Some(raw) if !raw.is_empty() => Self::new(raw),
            _ => Self::new(fallback),
        }
    }

    /// The raw token sequence.
    #[must_use]
    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    /// The decoded run order.
    #[must_use]
    pub fn order(&self) -> &ArgvOrder {
        &self.order
    }

    /// Returns the tokens captured by the first flag group whose name is one
    /// of `names`, scanning groups in the order they were passed.
    ///
    /// `Some(&[])` means the flag was passed without values.
    #[must_use]
    pub fn get_arg_item_by_filter(&self, names: &[&str]) -> Option<&[String]> {
        self.order
            .args
            .iter()
            .find(|(name, _)| names.contains(&name.as_str()))
            .map(|(_, values)| values.as_slice())
    }

    /// True when `-name` or `--name` appears verbatim anywhere in the raw
    /// tokens. Leading dashes on `name` are ignored.
    #[must_use]
    pub fn has_flag(&self, name: &str) -> bool {
        let bare = name.trim_start_matches('-');
        let short = format!("-{bare}");
        let long = format!("--{bare}");
        self.raw.iter().any(|token| *token == short || *token == long)
    }
}

fn npm_config_argv() -> Option<Vec<String>> {
    let value = std::env::var(NPM_CONFIG_ARGV).ok()?;
    match serde_json::from_str::<NpmConfigArgv>(&value) {
        Ok(parsed) => Some(parsed.original),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed {NPM_CONFIG_ARGV}");
            None
        }
    }
}

fn parse_run_order(raw: &[String]) -> ArgvOrder {
    let mut order = ArgvOrder::default();
    if raw.len() < 2 || raw[0] != "run" {
        return order;
    }
    order.order = Some(raw[1].clone());

    let mut current: Option<usize> = None;
    for token in &raw[2..] {
        if token.starts_with('-') {
            let name = token.trim_start_matches('-').to_string();
            // Re-passing a flag restarts its group in place.
            let idx = match order.args.iter().position(|(n, _)| *n == name) {
                Some(idx) => {
                    order.args[idx].1.clear();
                    idx
                }
                None => {
                    order.args.push((name, Vec::new()));
                    order.args.len() - 1
                }
            };
            current = Some(idx);
        } else if let Some(idx) = current {
            order.args[idx].1.push(token.clone());
        }
    }
    order
}
