//! Log format for the long-running scheduler process.
//!
//! Default tracing format: `LEVEL span1:span2: target: message`
//! This format:            `LEVEL HH:MM:SS target: span1:span2: message`
//!
//! The scheduler runs unattended for days between restarts, so every line
//! carries a wall-clock time up front rather than relying on the terminal's
//! own timestamp (if any) or `journalctl -o short-precise`.

use chrono::Local;
use std::fmt;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Event formatter that puts a local timestamp and the target before span
/// context, so a scan cycle's log lines read left-to-right as "when, where,
/// what" instead of the default span-nested layout.
pub struct CycleLogFormat;

impl<S, N> FormatEvent<S, N> for CycleLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        let level = metadata.level();
        let level_style = match *level {
            tracing::Level::ERROR => "\x1b[31m", // Red
            tracing::Level::WARN => "\x1b[33m",  // Yellow
            tracing::Level::INFO => "\x1b[32m",  // Green
            tracing::Level::DEBUG => "\x1b[34m", // Blue
            tracing::Level::TRACE => "\x1b[35m", // Magenta
        };
        write!(writer, "{}{:>5}\x1b[0m ", level_style, level)?;

        write!(writer, "{} ", Local::now().format("%H:%M:%S"))?;

        write!(writer, "{}: ", metadata.target())?;

        if let Some(scope) = ctx.event_scope() {
            let mut first = true;
            for span in scope.from_root() {
                if !first {
                    write!(writer, ":")?;
                }
                write!(writer, "{}", span.name())?;
                first = false;
            }
            if !first {
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}
