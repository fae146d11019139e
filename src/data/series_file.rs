use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::PERSISTENCE;
use crate::domain::{Chain, Series};

/// On-disk encoding, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Bincode,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(PERSISTENCE.files.binary_extension) => {
                FileFormat::Bincode
            }
            _ => FileFormat::Json,
        }
    }
}

fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).context(format!("Failed to open file: {}", path.display()))?;
    let reader = BufReader::new(file);
    match FileFormat::from_path(path) {
        FileFormat::Bincode => bincode::deserialize_from(reader)
            .context(format!("Failed to deserialize bincode: {}", path.display())),
        FileFormat::Json => serde_json::from_reader(reader)
            .context(format!("Failed to parse JSON: {}", path.display())),
    }
}

fn write_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create directory: {}", parent.display()))?;
    }
    let file = File::create(path).context(format!("Failed to create file: {}", path.display()))?;
    let writer = BufWriter::new(file);
    match FileFormat::from_path(path) {
        FileFormat::Bincode => bincode::serialize_into(writer, value)
            .context(format!("Failed to serialize bincode to: {}", path.display())),
        FileFormat::Json => serde_json::to_writer_pretty(writer, value)
            .context(format!("Failed to write JSON to: {}", path.display())),
    }
}

/// Named set of series, one per symbol.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct SeriesCollection {
    pub name: String,
    pub series: Vec<Series>,
}

impl SeriesCollection {
    pub fn new(name: impl Into<String>, series: Vec<Series>) -> Self {
        Self {
            name: name.into(),
            series,
        }
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.symbol.as_str()).collect()
    }

    pub fn find(&self, symbol: &str) -> Result<&Series> {
        self.series
            .iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| anyhow!("No series found for symbol {}", symbol))
    }
}

/// Versioned wrapper written by the demo generator and read by the CLI.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SeriesFile {
    pub version: f64,
    pub timestamp_ms: i64,
    pub data: SeriesCollection,
}

impl SeriesFile {
    pub fn new(data: SeriesCollection) -> Self {
        Self {
            version: PERSISTENCE.files.version,
            timestamp_ms: Utc::now().timestamp_millis(),
            data,
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file: Self = read_file(path)?;
        if file.version != PERSISTENCE.files.version {
            log::warn!(
                "{}: file version {} differs from expected {}",
                path.display(),
                file.version,
                PERSISTENCE.files.version
            );
        }
        log::info!(
            "Loaded {} series ({}) from {}",
            file.data.series.len(),
            file.data.name,
            path.display()
        );
        Ok(file)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        write_file(path, self)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChainFile {
    pub version: f64,
    pub timestamp_ms: i64,
    pub chain: Chain,
}

impl ChainFile {
    pub fn new(chain: Chain) -> Self {
        Self {
            version: PERSISTENCE.files.version,
            timestamp_ms: Utc::now().timestamp_millis(),
            chain,
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file: Self = read_file(path)?;
        log::info!(
            "Loaded {} contracts for {} from {}",
            file.chain.contracts.len(),
            file.chain.underlying,
            path.display()
        );
        Ok(file)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        write_file(path, self)
    }
}
