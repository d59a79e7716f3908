use std::sync::Once;

use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::MakeWriterExt;

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub enum OutputType {
    Stdout,
    Log,
}

#[derive(Debug, Clone)]
pub struct TracingFactoryOptions {
    debug: bool,
    output_type: OutputType,
    log_dir: Option<String>,
}

impl TracingFactoryOptions {
    pub fn new(debug: bool, output_type: OutputType, log_dir: Option<String>) -> Self {
        TracingFactoryOptions { debug, output_type, log_dir }
    }

    pub fn new_with_debug(debug: bool) -> Self {
        TracingFactoryOptions { debug, output_type: OutputType::Stdout, log_dir: None }
    }
}

impl Default for TracingFactoryOptions {
    fn default() -> Self {
        TracingFactoryOptions::new_with_debug(false)
    }
}

/// Process-wide `tracing` subscriber setup. Idempotent: the second and later
/// calls in a process are no-ops, since a global subscriber can only be
/// installed once.
#[derive(Debug, Clone, Default)]
pub struct TracingFactory {
    options: TracingFactoryOptions,
}

impl TracingFactory {
    pub fn init(debug: bool) -> Self {
        TracingFactory::init_with_options(TracingFactoryOptions::new_with_debug(debug))
    }

    pub fn init_with_options(options: TracingFactoryOptions) -> Self {
        let level = if options.debug { Level::DEBUG } else { Level::INFO };

        INIT.call_once(|| {
            let format = tracing_subscriber::fmt::format()
                .with_file(true)
                .with_line_number(false)
                .with_target(false)
                .compact();

            match &options.output_type {
                OutputType::Stdout => {
                    let _ = tracing_subscriber::fmt()
                        .with_max_level(level)
                        .event_format(format)
                        .try_init();
                }
                OutputType::Log => {
                    let dir = options.log_dir.clone().unwrap_or_else(|| "/tmp/s3bd/logs".to_string());
                    let file_appender = rolling::never(&dir, "dump.log");
                    let writer = file_appender.and(std::io::stderr);

                    let _ = tracing_subscriber::fmt()
                        .with_max_level(level)
                        .event_format(format)
                        .with_writer(writer)
                        .try_init();
                }
            }
        });

        TracingFactory { options }
    }

    pub fn log_dir(&self) -> Option<&str> {
        self.options.log_dir.as_deref()
    }
}
