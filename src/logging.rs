use std::path::Path;

use flexi_logger::{
    colored_default_format, opt_format, Cleanup, Criterion, Duplicate, FileSpec, Logger,
    LoggerHandle, Naming,
};

use crate::Result;

/// Start logging at `level` unless `RUST_LOG` overrides it
///
/// With a directory, records go to rotating files there and are duplicated
/// to stderr; without one they only go to stderr. Keep the handle alive for
/// the whole run.
pub fn setup_logging(level: &str, log_dir: Option<&Path>) -> Result<LoggerHandle> {
    let logger = Logger::try_with_env_or_str(level)?;
    let handle = match log_dir {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir))
            .format_for_files(opt_format)
            .format_for_stderr(colored_default_format)
            .duplicate_to_stderr(Duplicate::All)
            .rotate(
                Criterion::Size(10 * 1024 * 1024), // 10 MB per file
                Naming::Numbers,
                Cleanup::KeepLogFiles(3),
            )
            .start()?,
        None => logger.format(colored_default_format).start()?,
    };
    Ok(handle)
}
