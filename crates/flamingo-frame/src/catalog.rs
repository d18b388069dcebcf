//! Named command codes.
//!
//! The NUC only knows integer command codes. Operator tooling names them
//! through a plain-text catalog, one `NAME = CODE` entry per line:
//!
//! ```text
//! # stage
//! STAGE_POSITION_SET = 24580
//! CAMERA_WORK_FLOW_START = 0x3004
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Errors raised while loading a command catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("line {line}: expected `NAME = CODE`")]
    Malformed { line: usize },

    #[error("line {line}: invalid command code `{value}`")]
    InvalidCode { line: usize, value: String },

    #[error("line {line}: duplicate command name `{name}`")]
    Duplicate { line: usize, name: String },
}

/// Bidirectional map between command names and codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandCatalog {
    by_name: BTreeMap<String, u32>,
}

impl CommandCatalog {
    /// Parse catalog text.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let mut by_name = BTreeMap::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let entry = raw.split('#').next().unwrap_or_default().trim();
            if entry.is_empty() {
                continue;
            }

            let (name, value) = entry
                .split_once('=')
                .ok_or(CatalogError::Malformed { line })?;
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(CatalogError::Malformed { line });
            }

            let code = parse_code(value).ok_or_else(|| CatalogError::InvalidCode {
                line,
                value: value.to_string(),
            })?;

            if by_name.insert(name.to_string(), code).is_some() {
                return Err(CatalogError::Duplicate {
                    line,
                    name: name.to_string(),
                });
            }
        }

        Ok(Self { by_name })
    }

    /// Read and parse a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Code registered under `name`.
    pub fn code(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// First name (alphabetically) registered for `code`.
    pub fn name(&self, code: u32) -> Option<&str> {
        self.by_name
            .iter()
            .find(|(_, c)| **c == code)
            .map(|(name, _)| name.as_str())
    }

    /// All entries, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.by_name.iter().map(|(name, code)| (name.as_str(), *code))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn parse_code(value: &str) -> Option<u32> {
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# motion
STAGE_MOVE = 100   # absolute move
STAGE_HOME=0x65

LASER_ON = 200
";

    #[test]
    fn parses_decimal_hex_and_comments() {
        let catalog = CommandCatalog::parse(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.code("STAGE_MOVE"), Some(100));
        assert_eq!(catalog.code("STAGE_HOME"), Some(0x65));
        assert_eq!(catalog.code("LASER_ON"), Some(200));
        assert_eq!(catalog.code("MISSING"), None);
    }

    #[test]
    fn reverse_lookup() {
        let catalog = CommandCatalog::parse(SAMPLE).unwrap();
        assert_eq!(catalog.name(200), Some("LASER_ON"));
        assert_eq!(catalog.name(7), None);
    }

    #[test]
    fn iter_is_sorted_by_name() {
        let catalog = CommandCatalog::parse(SAMPLE).unwrap();
        let names: Vec<&str> = catalog.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["LASER_ON", "STAGE_HOME", "STAGE_MOVE"]);
    }

    #[test]
    fn rejects_malformed_lines() {
        let err = CommandCatalog::parse("A = 1\nnot an entry\n").unwrap_err();
        assert!(matches!(err, CatalogError::Malformed { line: 2 }));

        let err = CommandCatalog::parse("TWO WORDS = 1").unwrap_err();
        assert!(matches!(err, CatalogError::Malformed { line: 1 }));

        let err = CommandCatalog::parse("A = banana").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCode { line: 1, .. }));

        let err = CommandCatalog::parse("A = -1").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCode { .. }));
    }

    #[test]
    fn rejects_duplicates() {
        let err = CommandCatalog::parse("A = 1\nB = 2\nA = 3\n").unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate { line: 3, ref name } if name == "A"));
    }

    #[test]
    fn load_reads_file() {
        let dir = std::env::temp_dir().join(format!("flamingo-catalog-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("commands.txt");
        std::fs::write(&path, SAMPLE).unwrap();

        let catalog = CommandCatalog::load(&path).unwrap();
        assert_eq!(catalog.code("STAGE_MOVE"), Some(100));

        let missing = CommandCatalog::load(dir.join("nope.txt")).unwrap_err();
        assert!(matches!(missing, CatalogError::Read { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_catalog() {
        let catalog = CommandCatalog::parse("# nothing\n\n").unwrap();
        assert!(catalog.is_empty());
    }
}
