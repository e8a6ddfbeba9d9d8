
use flexi_logger::{FileSpec, Logger, LoggerHandle, WriteMode, with_thread};

use super::error::*;

///
/// Macros to write to the backing file logger.
///
pub use log::{trace, debug, info, warn, error};

///
/// Initializes the logstream to write to the given file.
///
pub fn initialize (path: & str, filename: & str) -> Result<LoggerHandle>
{
    let file_spec = FileSpec::default()
        .directory(path)
        .basename(filename)
        .use_timestamp(true)
        .suffix("log");

    let logger = Logger::try_with_str("info")?
        .log_to_file(file_spec)
        .write_mode(WriteMode::BufferAndFlush)
        .format_for_files(with_thread)
        .start()?;

    Ok(logger)
}
