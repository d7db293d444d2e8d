use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;
use crate::printf::PrintfFormat;

/// Static description of one log call site.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FormatInfo {
    /// printf-like format string of the original call
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub level: Option<String>,
}

impl FormatInfo {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            file: None,
            line: None,
            level: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SchemaEntry {
    id: u32,
    #[serde(flatten)]
    info: FormatInfo,
}

#[derive(Debug, Deserialize)]
struct Schema {
    formats: Vec<SchemaEntry>,
}

/// A call site whose format string has been parsed.
#[derive(Debug, Clone)]
pub struct RegisteredFormat {
    pub info: FormatInfo,
    pub printf: PrintfFormat,
}

/// Declarative list of call sites, indexed densely by format id.
///
/// The registry is produced on the encoder side (one entry per log call
/// site) and shipped next to the compressed log as JSON:
///
/// ```json
/// { "formats": [ { "id": 0, "format": "Opened %s", "file": "io.cc", "line": 12 } ] }
/// ```
///
/// Ids may appear in any order but must cover `0..n` exactly once.
///
/// # Examples
///
/// ```
/// # use binary_log_decoder::FormatRegistry;
/// let registry = FormatRegistry::from_json(r#"{
///     "formats": [
///         { "id": 1, "format": "value=%d" },
///         { "id": 0, "format": "started" }
///     ]
/// }"#).unwrap();
///
/// assert_eq!(registry.len(), 2);
/// assert_eq!(registry.get(1).unwrap().info.format, "value=%d");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: Vec<RegisteredFormat>,
}

impl FormatRegistry {
    /// Loads a registry from a JSON schema file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, Error> {
        let schema: Schema =
            serde_json::from_str(text).map_err(|e| Error::Schema(e.to_string()))?;
        Self::from_entries(schema.formats.into_iter().map(|e| (e.id, e.info)))
    }

    /// Builds a registry from `(id, info)` pairs, parsing every format string.
    pub fn from_entries<I>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (u32, FormatInfo)>,
    {
        let mut entries: Vec<(u32, FormatInfo)> = entries.into_iter().collect();
        entries.sort_by_key(|(id, _)| *id);

        let mut formats = Vec::with_capacity(entries.len());
        for (expected, (id, info)) in entries.into_iter().enumerate() {
            if id as usize != expected {
                return Err(Error::Schema(format!(
                    "format ids must be dense and zero-based: expected id {}, found {}",
                    expected, id
                )));
            }
            let printf = PrintfFormat::parse(&info.format)
                .map_err(|e| Error::Schema(format!("format id {}: {}", id, e)))?;
            formats.push(RegisteredFormat { info, printf });
        }
        Ok(Self { formats })
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    pub fn get(&self, format_id: u32) -> Option<&RegisteredFormat> {
        self.formats.get(format_id as usize)
    }

    pub fn into_formats(self) -> Vec<RegisteredFormat> {
        self.formats
    }
}
