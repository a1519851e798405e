//! Guardian memory: optional JSON and YAML sidecar files merged into one map.

use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub const GUARDIAN_JSON: &str = "guardian_memory.json";
pub const GUARDIAN_YAML: &str = "guardian_memory.yaml";

pub type Memory = Map<String, Value>;

#[derive(Debug, Clone, Copy)]
enum MemoryFormat {
    Json,
    Yaml,
}

/// Locations of the two memory files
#[derive(Debug, Clone)]
pub struct MemoryPaths {
    pub json: PathBuf,
    pub yaml: PathBuf,
}

impl Default for MemoryPaths {
    fn default() -> Self {
        Self {
            json: PathBuf::from(GUARDIAN_JSON),
            yaml: PathBuf::from(GUARDIAN_YAML),
        }
    }
}

impl MemoryPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            json: dir.join(GUARDIAN_JSON),
            yaml: dir.join(GUARDIAN_YAML),
        }
    }
}

/// Load and merge guardian memory
///
/// The JSON file is read first and the YAML file's top-level keys are laid
/// over it. Either file may be absent or malformed; failures are logged and
/// the remaining data is still returned.
pub fn load_memory(paths: &MemoryPaths) -> Memory {
    let mut memory = Memory::new();

    for (path, format, label) in [
        (&paths.json, MemoryFormat::Json, "JSON"),
        (&paths.yaml, MemoryFormat::Yaml, "YAML"),
    ] {
        if !path.exists() {
            tracing::debug!("{} memory file {} not found", label, path.display());
            continue;
        }

        match read_memory_file(path, format) {
            Ok(entries) => {
                memory.extend(entries);
                tracing::info!("Loaded {}", path.display());
            }
            Err(e) => {
                tracing::error!("Error loading {}: {}", label, e);
            }
        }
    }

    if memory.is_empty() {
        tracing::warn!("No memory files loaded. Please check paths.");
    }

    memory
}

/// Keys are kept exactly as written in the file.
fn read_memory_file(path: &Path, format: MemoryFormat) -> crate::Result<Memory> {
    let reader = BufReader::new(File::open(path)?);

    let memory: Memory = match format {
        MemoryFormat::Json => serde_json::from_reader(reader)?,
        MemoryFormat::Yaml => serde_yaml::from_reader(reader)?,
    };
    Ok(memory)
}
