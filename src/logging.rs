use anyhow::Result;
use simplelog::{Config, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::Path;

/// Send all log output to a freshly created file
pub fn init_file_logger(path: &Path, level: LevelFilter) -> Result<()> {
    WriteLogger::init(level, Config::default(), File::create(path)?)?;
    log::info!("Logging to {path:?} at {level}");
    Ok(())
}
