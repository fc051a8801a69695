#![forbid(unsafe_code)]

//! Resource tables for the demo window.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use relocale::{I18nError, LanguageInfo, StringCatalog};

/// Tables shipped with the binary.
pub const BUILTIN_RESOURCES: &str = r#"{
  "en": {
    "WindowTitle": "Localization demo",
    "Greeting": "Hello",
    "SwitchLanguage": "Switch language",
    "SwitchLanguageHint": "Toggle between English and German"
  },
  "de": {
    "WindowTitle": "Lokalisierungsdemo",
    "Greeting": "Hallo",
    "SwitchLanguage": "Sprache wechseln",
    "SwitchLanguageHint": "Zwischen Englisch und Deutsch umschalten"
  }
}"#;

/// Failure loading resource tables.
#[derive(Debug)]
pub enum ResourceError {
    Io { path: PathBuf, source: io::Error },
    Parse { origin: String, source: I18nError },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Parse { origin, source } => write!(f, "bad resources in {origin}: {source}"),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Load tables from `path`, or the built-in ones. The default language is
/// always the final fallback.
pub fn load_catalog(path: Option<&Path>) -> Result<StringCatalog, ResourceError> {
    let (origin, json) = match path {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|source| ResourceError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            (path.display().to_string(), json)
        }
        None => ("built-in tables".to_string(), BUILTIN_RESOURCES.to_string()),
    };

    let mut catalog =
        StringCatalog::from_json_str(&json).map_err(|source| ResourceError::Parse { origin, source })?;
    catalog.set_fallback_chain(vec![LanguageInfo::DEFAULT.code.to_string()]);
    Ok(catalog)
}
