use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Targets of this workspace; events from other crates are not rendered.
pub const TARGET_PREFIXES: [&str; 4] = ["sdk_chat", "chat_stream", "backend_client", "chat_console"];

/// RFC3339 UTC timer via `chrono`, e.g. `2025-09-12T10:20:30Z`.
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        w.write_str(&now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

fn is_workspace_target(target: &str) -> bool {
    TARGET_PREFIXES.iter().any(|p| target.starts_with(p))
}

/// Formatting layer for this workspace's events only.
///
/// Writes to stderr so log lines stay apart from the conversation on
/// stdout. Compact single-line format with RFC3339 UTC timestamps, target and
/// span close events (durations of instrumented calls). ANSI colors only
/// when stderr is a terminal.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stderr().is_terminal();
    let only_workspace = filter::filter_fn(|meta| is_workspace_target(meta.target()));

    fmt::layer()
        .with_writer(io::stderr)
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact())
        .with_filter(only_workspace)
}

/// Level directives (`chat_stream=debug`, ...) for every workspace target.
pub fn level_directives(level: Level) -> Vec<Directive> {
    let level = level.as_str().to_lowercase();
    TARGET_PREFIXES
        .iter()
        .filter_map(|p| Directive::from_str(&format!("{p}={level}")).ok())
        .collect()
}

/// `RUST_LOG` when set; otherwise `default` globally with `level` for this
/// workspace.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_directives(level)
            .into_iter()
            .fold(EnvFilter::new(default), EnvFilter::add_directive),
    }
}
