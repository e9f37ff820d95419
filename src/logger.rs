//! File logging for tournament runs.
//!
//! Every run that asks for logging gets its own timestamped file next to
//! the working directory, capturing everything down to the per-frame
//! classification traces. Console output is left alone for the operator
//! console.

use std::fs::File;

use time::{
    format_description::{self, parse},
    OffsetDateTime, UtcOffset,
};
use tracing::{subscriber::set_global_default, Level};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, FmtSubscriber};

/// Installs the global file subscriber.
///
/// Panics when the log file cannot be created or another subscriber was
/// already installed; disable logging in the configuration if the binary
/// sets up its own subscriber.
pub(crate) fn init_logger() {
    let file_name = log_file_name();
    let file = File::create(file_name).expect("could not create the log file");
    let writer = BoxMakeWriter::new(file);
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = tracing_subscriber::fmt::time::OffsetTime::new(
        local_offset,
        format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
            .expect("valid time format"),
    );

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(writer)
        .finish();

    set_global_default(subscriber).expect(
        "could not set the global tracing subscriber; disable logging if you already set one",
    );
}

fn log_file_name() -> String {
    let format = parse("[year]-[month]-[day]_[hour]:[minute]:[second]_kumite.log")
        .expect("valid file name format");
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&format).expect("formattable timestamp")
}
