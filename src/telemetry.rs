use crate::prelude::Result;
use tracing::subscriber::set_global_default;
use tracing::{Level, Subscriber};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt::MakeWriter};

/// Maps the number of `-v` flags to the default maximum log level.
///
/// Without the flag only warnings and errors reach the diagnostic channel, so
/// the structured records on stdout stay the only regular output.
///
pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Builds the subscriber behind the diagnostic side channel.
///
/// Lines carry the emitting target, file and line. Debug builds print them
/// compact, release builds as JSON objects with the active span, so both can
/// be kept apart from the records on stdout. `RUST_LOG` replaces the default
/// filter entirely.
///
/// # Arguments
///
/// * `max_level`: Filter used when `RUST_LOG` is unset, usually taken from
///   [`level_from_verbosity`].
/// * `sink`: Writer for the diagnostic lines, `std::io::stderr` in the binary.
///
pub fn get_subscriber<Sink>(max_level: Level, sink: Sink) -> impl Subscriber + Sync + Send
where
    Sink: for<'a> MakeWriter<'a> + Sync + Send + 'static,
{
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_error| EnvFilter::new(max_level.as_str()));

    #[cfg(debug_assertions)]
    let subscriber_builder = tracing_subscriber::fmt().compact();
    #[cfg(not(debug_assertions))]
    let subscriber_builder = tracing_subscriber::fmt().json().with_current_span(true);

    subscriber_builder
        .with_env_filter(env_filter)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_ansi(false)
        .with_writer(sink)
        .finish()
}

/// Installs `subscriber` process-wide and forwards `log` records from
/// dependencies such as `reqwest` into it. Fails when called a second time.
///
pub fn init_subscriber(subscriber: impl Subscriber + Sync + Send) -> Result<()> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}
