//! Append-only file logging.
//!
//! Every event becomes one line: `<timestamp> [<LEVEL>] <target> - <message> <fields>`.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::error::{DbChatError, Result};

/// Line format used for the agent log.
pub struct AgentLogFormat;

impl<S, N> FormatEvent<S, N> for AgentLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        write!(
            writer,
            "{} [{}] {} - ",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            meta.level(),
            meta.target()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Build a subscriber writing [`AgentLogFormat`] lines to `writer`.
pub fn subscriber<W>(writer: W, filter: EnvFilter) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    Box::new(
        tracing_subscriber::registry().with(filter).with(
            tracing_subscriber::fmt::layer()
                .event_format(AgentLogFormat)
                .with_ansi(false)
                .with_writer(writer),
        ),
    )
}

/// Open (or create) the log file in append mode, creating parent directories.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Install the global file logger. `RUST_LOG` overrides the default `info` filter.
pub fn init_logging(path: &Path) -> Result<()> {
    let file = open_log_file(path)?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| DbChatError::Configuration(format!("Failed to create log filter: {e}")))?;

    tracing::subscriber::set_global_default(subscriber(Mutex::new(file), filter))
        .map_err(|e| DbChatError::Configuration(format!("Failed to initialize logging: {e}")))
}
