//! JSON reading and writing for building descriptions.
//!
//! [`LoggingCodec`] wraps any codec and logs operations before delegating,
//! so file handling shows up in diagnostics without touching call sites.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::building::BuildingFile;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads and writes building descriptions.
pub trait BuildingCodec {
    fn read(&self, input: &str) -> Result<BuildingFile, CodecError>;
    fn read_file(&self, path: &Path) -> Result<BuildingFile, CodecError>;
    fn write(&self, building: &BuildingFile) -> Result<String, CodecError>;
    fn write_file(&self, building: &BuildingFile, path: &Path) -> Result<(), CodecError>;
}

/// Plain serde_json-backed codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeJsonCodec;

impl BuildingCodec for SerdeJsonCodec {
    fn read(&self, input: &str) -> Result<BuildingFile, CodecError> {
        Ok(serde_json::from_str(input)?)
    }

    fn read_file(&self, path: &Path) -> Result<BuildingFile, CodecError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn write(&self, building: &BuildingFile) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(building)?)
    }

    fn write_file(&self, building: &BuildingFile, path: &Path) -> Result<(), CodecError> {
        fs::write(path, self.write(building)?)?;
        Ok(())
    }
}

/// Codec decorator that logs every operation before delegating.
#[derive(Debug, Default)]
pub struct LoggingCodec<C> {
    inner: C,
}

impl<C> LoggingCodec<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C: BuildingCodec> BuildingCodec for LoggingCodec<C> {
    fn read(&self, input: &str) -> Result<BuildingFile, CodecError> {
        log::debug!("reading building description ({} bytes)", input.len());
        let parsed = self.inner.read(input)?;
        log::info!("parsed building description: {}", summary(&parsed));
        Ok(parsed)
    }

    fn read_file(&self, path: &Path) -> Result<BuildingFile, CodecError> {
        log::info!("reading building description from {}", path.display());
        let parsed = self.inner.read_file(path)?;
        log::info!("parsed building description: {}", summary(&parsed));
        Ok(parsed)
    }

    fn write(&self, building: &BuildingFile) -> Result<String, CodecError> {
        log::debug!("serializing building description: {}", summary(building));
        self.inner.write(building)
    }

    fn write_file(&self, building: &BuildingFile, path: &Path) -> Result<(), CodecError> {
        log::info!("writing building description to {}", path.display());
        self.inner.write_file(building, path)
    }
}

fn summary(file: &BuildingFile) -> String {
    match &file.building {
        Some(b) => format!("{:?}, {} level(s), {} room(s)", b.name, b.levels.len(), file.room_count()),
        None => "no building".to_string(),
    }
}
