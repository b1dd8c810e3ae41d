//! Shared output layer for pretty/text/JSON parity across all commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its result
//! accordingly: pretty output for humans, compact text for agents and
//! pipes, or stable JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / hidden `--json` flag
//! 2. `LM_FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. Default: pretty if stdout is a TTY; text if piped.

use clap::ValueEnum;
use lemma_core::LemmaError;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// Shared width for pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, visual framing).
    Pretty,
    /// Token-efficient plain text for agents and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    #[must_use]
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

fn resolve_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }
    if json_flag {
        return OutputMode::Json;
    }
    if let Some(val) = format_env {
        match val.to_lowercase().as_str() {
            "json" => return OutputMode::Json,
            "text" => return OutputMode::Text,
            "pretty" => return OutputMode::Pretty,
            _ => {} // unknown value — fall through to TTY detection
        }
    }
    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from CLI flags, environment, and TTY defaults.
#[must_use]
pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> OutputMode {
    let env_val = std::env::var("LM_FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_inner(format_flag, json_flag, env_val.as_deref(), is_tty)
}

/// Render a serializable payload: JSON verbatim, or via the human closure
/// for pretty/text modes.
pub fn render<T, F>(mode: OutputMode, payload: &T, human: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce(&T, &mut dyn Write) -> io::Result<()>,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if mode.is_json() {
        serde_json::to_writer(&mut out, payload)?;
        writeln!(out)?;
    } else {
        human(payload, &mut out)?;
    }
    Ok(())
}

/// Render a core error to stderr in the active mode, preserving the
/// machine-stable `error_kind` in JSON.
pub fn render_error(mode: OutputMode, err: &LemmaError) {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    if mode.is_json() {
        if serde_json::to_writer(&mut out, &err.to_json_error()).is_ok() {
            let _ = writeln!(out);
        }
    } else {
        let _ = writeln!(out, "{err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_everything() {
        let mode = resolve_inner(Some(OutputMode::Json), false, Some("pretty"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn json_alias_wins_over_env() {
        let mode = resolve_inner(None, true, Some("pretty"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn env_wins_over_tty_default() {
        let mode = resolve_inner(None, false, Some("json"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn unknown_env_falls_through() {
        assert_eq!(resolve_inner(None, false, Some("yaml"), true), OutputMode::Pretty);
        assert_eq!(resolve_inner(None, false, Some("yaml"), false), OutputMode::Text);
    }

    #[test]
    fn tty_default_is_pretty_piped_is_text() {
        assert_eq!(resolve_inner(None, false, None, true), OutputMode::Pretty);
        assert_eq!(resolve_inner(None, false, None, false), OutputMode::Text);
    }
}
