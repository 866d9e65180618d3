//! Resolution pipeline: reads data files, converts them into catalog types.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, deserialization
//! helpers and the top-level [`load_game_data`] entry point.

use crate::schema::{EffectValueData, TechnologyData, VisualValueData};
use formica_core::fixed::f64_to_fixed64;
use formica_core::id::TechId;
use formica_engine::EngineConfig;
use formica_tech_tree::{
    EffectValue, TechCatalog, TechCategory, TechTreeError, TechnologyNode, VisualValue,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Base name of the required technology list.
pub const TECHNOLOGIES_FILE: &str = "technologies";

/// Base name of the optional engine config.
pub const ENGINE_CONFIG_FILE: &str = "engine";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// Two technologies share an id.
    #[error("duplicate technology id '{id}' in {file}")]
    DuplicateId { file: PathBuf, id: TechId },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &'static str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name,
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Read a file and deserialize it according to its format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. TOML has no top-level arrays, so for TOML
/// the array is read from `toml_key` of the top-level table.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| DataLoadError::Parse {
                    file: path.to_path_buf(),
                    detail: format!("missing key '{toml_key}' in TOML file"),
                })?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Resolution
// ===========================================================================

fn resolve_node(data: TechnologyData) -> TechnologyNode {
    let category = TechCategory::from_name(&data.category);
    let mut node = TechnologyNode::new(data.id, category, data.cost)
        .with_description(data.description)
        .with_prerequisites(data.prerequisites);
    if let Some(name) = data.name {
        node = node.with_name(name);
    }

    for (key, value) in data.effects {
        let value = match value {
            EffectValueData::Flag(b) => EffectValue::Flag(b),
            EffectValueData::Number(n) => EffectValue::Number(f64_to_fixed64(n)),
            EffectValueData::List(names) => EffectValue::List(names),
            EffectValueData::Text(s) => EffectValue::Text(s),
            EffectValueData::Other(_) => {
                trace!(tech = %node.id, %key, "skipping effect of unsupported shape");
                continue;
            }
        };
        node.effects.insert(key, value);
    }

    for (key, value) in data.visual_changes {
        let value = match value {
            VisualValueData::Flag(b) => VisualValue::Flag(b),
            VisualValueData::Number(n) => VisualValue::Number(f64_to_fixed64(n)),
            VisualValueData::Text(s) => VisualValue::Text(s),
            VisualValueData::Other(_) => {
                trace!(tech = %node.id, %key, "skipping visual change of unsupported shape");
                continue;
            }
        };
        node.visual_changes.insert(key, value);
    }

    node
}

/// Build a catalog from parsed definitions, in file order.
///
/// Duplicate ids are an error. Prerequisites naming an id that is not in the
/// file are kept and logged: the evaluators treat them as never satisfied.
pub fn resolve_technologies(
    data: Vec<TechnologyData>,
    file: &Path,
) -> Result<TechCatalog, DataLoadError> {
    let mut catalog = TechCatalog::new();
    for entry in data {
        catalog
            .register(resolve_node(entry))
            .map_err(|e| match e {
                TechTreeError::DuplicateId(id) => DataLoadError::DuplicateId {
                    file: file.to_path_buf(),
                    id,
                },
            })?;
    }
    for (tech, prerequisite) in catalog.unknown_prerequisites() {
        warn!(%tech, %prerequisite, file = %file.display(), "unknown prerequisite");
    }
    Ok(catalog)
}

// ===========================================================================
// Entry points
// ===========================================================================

/// Load the required technology list from `dir`.
pub fn load_catalog(dir: &Path) -> Result<TechCatalog, DataLoadError> {
    let path = require_data_file(dir, TECHNOLOGIES_FILE)?;
    let data: Vec<TechnologyData> = deserialize_list(&path, "technologies")?;
    let catalog = resolve_technologies(data, &path)?;
    debug!(file = %path.display(), technologies = catalog.len(), "loaded catalog");
    Ok(catalog)
}

/// Load the engine config from `dir`, or the defaults when there is none.
pub fn load_engine_config(dir: &Path) -> Result<EngineConfig, DataLoadError> {
    match find_data_file(dir, ENGINE_CONFIG_FILE)? {
        Some(path) => deserialize_file(&path),
        None => Ok(EngineConfig::default()),
    }
}

/// Everything a game directory defines.
#[derive(Debug, Clone)]
pub struct GameData {
    pub catalog: TechCatalog,
    pub config: EngineConfig,
}

/// Load the catalog and engine config from `dir`.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    Ok(GameData {
        catalog: load_catalog(dir)?,
        config: load_engine_config(dir)?,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
