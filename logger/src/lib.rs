//! Default logging setup for the cuckoo table demos and tests
#![warn(missing_docs)]

use std::{sync::Mutex, time::Instant};

const TIMESTAMP_STYLE: anstyle::Style =
    anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::BrightBlack)));

const TARGET_STYLE: anstyle::Style =
    anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Magenta)));

/// Environment variable holding the log filter, defaults to `info`.
pub const FILTER_ENV: &str = "CUCKOO_LOG";
/// Environment variable controlling colored output.
pub const STYLE_ENV: &str = "CUCKOO_LOG_STYLE";

fn builder() -> env_logger::Builder {
    let start_time = Instant::now();
    let last_target = Mutex::new(String::new());

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::new()
            .filter_or(FILTER_ENV, "info")
            .write_style(STYLE_ENV),
    );

    builder.format(move |buf, record| {
        use std::io::Write;

        let timestamp = start_time.elapsed();
        let level = record.level();
        let target = record.target();

        let mut last_target = last_target
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Consecutive records from the same module share a single target line
        if target != *last_target {
            last_target.clear();
            last_target.push_str(target);

            writeln!(
                buf,
                "{} {}",
                format_args!("{style}{timestamp:>9.2?}{style:#}", style = TIMESTAMP_STYLE),
                format_args!("{style}{target}{style:#}", style = TARGET_STYLE)
            )?;
        }
        writeln!(
            buf,
            "{} {} {}",
            format_args!("{style}{timestamp:>9.2?}{style:#}", style = TIMESTAMP_STYLE),
            format_args!(
                "{style}{level:<5}{style:#}",
                style = buf.default_level_style(level),
            ),
            record.args(),
        )
    });
    builder
}

/// Perform the default logging setup.
///
/// # Panics
///
/// Panics if a global logger was already installed.
pub fn setup() {
    builder().init();
}

/// Perform the default logging setup, unless a global logger is already installed.
///
/// Intended for tests, where several test functions may each attempt the setup.
pub fn try_setup() -> Result<(), log::SetLoggerError> {
    builder().is_test(true).try_init()
}
