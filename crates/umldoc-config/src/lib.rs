//! Configuration management for umldoc.
//!
//! Parses `umldoc.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. The host tool can
//! also construct a [`Config`] programmatically via [`Config::new`].
//!
//! Recognized options:
//! - `destination_dir`: root directory of the generated documentation
//! - `encoding`: text encoding of the generated pages (`utf8` or `latin1`)
//! - `always_qualified_names`: never shorten class names inside package
//!   scopes
//! - `[[external_links]]`: externally hosted apidoc roots, each either
//!   online style (`apidoc` only) or offline style (`apidoc` plus
//!   `package_list`)

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "umldoc.toml";

/// Text encoding of the generated documentation pages.
///
/// UTF-8 decoding is strict: invalid bytes are a read failure. Latin-1
/// decodes byte-per-char and substitutes `?` for characters outside the
/// Latin-1 range when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageEncoding {
    #[default]
    Utf8,
    Latin1,
}

impl PageEncoding {
    /// Decode raw page bytes into text.
    ///
    /// Returns `None` when the bytes are not valid in this encoding
    /// (only possible for UTF-8; every byte sequence is valid Latin-1).
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            PageEncoding::Utf8 => String::from_utf8(bytes.to_vec()).ok(),
            PageEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    /// Encode text back into page bytes.
    #[must_use]
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            PageEncoding::Utf8 => text.as_bytes().to_vec(),
            PageEncoding::Latin1 => text
                .chars()
                .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
                .collect(),
        }
    }
}

/// One external apidoc declaration.
///
/// `apidoc` alone is the online style: the package list is expected at
/// `<apidoc>/package-list` and resolved references carry the external
/// marker. Supplying `package_list` selects the offline style, for setups
/// where the list is not reachable from the same root as the documents.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalLinkSpec {
    /// Base URI of the externally hosted documentation.
    pub apidoc: String,
    /// Independent package-list location (offline style).
    #[serde(default)]
    pub package_list: Option<String>,
}

/// Raw configuration as parsed from TOML (paths as strings).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigRaw {
    destination_dir: Option<String>,
    encoding: PageEncoding,
    always_qualified_names: bool,
    external_links: Vec<ExternalLinkSpec>,
}

/// Application configuration with resolved paths.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the generated documentation. Diagram files are
    /// written below it and pages are postprocessed within it.
    pub destination_dir: PathBuf,
    /// Text encoding of the generated pages.
    pub encoding: PageEncoding,
    /// When set, class names are never shortened inside package scopes.
    pub always_qualified_names: bool,
    /// Externally hosted apidoc roots for cross-reference resolution.
    pub external_links: Vec<ExternalLinkSpec>,
}

impl Config {
    /// Create a configuration with defaults for the given destination.
    #[must_use]
    pub fn new(destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            destination_dir: destination_dir.into(),
            encoding: PageEncoding::default(),
            always_qualified_names: false,
            external_links: Vec::new(),
        }
    }

    /// Load configuration by searching for `umldoc.toml` in `start_dir`
    /// and its ancestors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] when no config file exists in any
    /// ancestor, or any error from [`Config::load_from`].
    pub fn load(start_dir: &Path) -> Result<Self, ConfigError> {
        let mut dir = Some(start_dir);
        while let Some(current) = dir {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Self::load_from(&candidate);
            }
            dir = current.parent();
        }
        Err(ConfigError::NotFound(start_dir.join(CONFIG_FILENAME)))
    }

    /// Load configuration from a specific TOML file.
    ///
    /// Relative paths in the file are resolved against the file's parent
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read,
    /// [`ConfigError::Parse`] on malformed TOML, and
    /// [`ConfigError::Validation`] on invalid option values.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let raw: ConfigRaw = toml::from_str(&text)?;
        let base = path.parent().unwrap_or(Path::new("."));
        let config = Self::resolve(raw, base);
        config.validate()?;
        Ok(config)
    }

    fn resolve(raw: ConfigRaw, base: &Path) -> Self {
        let destination = raw
            .destination_dir
            .map_or_else(|| base.to_path_buf(), |d| base.join(d));
        Self {
            destination_dir: destination,
            encoding: raw.encoding,
            always_qualified_names: raw.always_qualified_names,
            external_links: raw.external_links,
        }
    }

    /// Validate option values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when an external-link
    /// declaration is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for link in &self.external_links {
            if link.apidoc.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "external_links.apidoc cannot be empty".to_owned(),
                ));
            }
            if link.package_list.as_deref().is_some_and(|p| p.trim().is_empty()) {
                return Err(ConfigError::Validation(
                    "external_links.package_list cannot be empty when present".to_owned(),
                ));
            }
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("configuration error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::new("docs/api");
        assert_eq!(config.destination_dir, PathBuf::from("docs/api"));
        assert_eq!(config.encoding, PageEncoding::Utf8);
        assert!(!config.always_qualified_names);
        assert!(config.external_links.is_empty());
    }

    #[test]
    fn test_load_from_full() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
destination_dir = "build/apidocs"
encoding = "latin1"
always_qualified_names = true

[[external_links]]
apidoc = "https://docs.example.org/api/"

[[external_links]]
apidoc = "https://docs.example.org/other/"
package_list = "lists/other-packages.txt"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.destination_dir, dir.path().join("build/apidocs"));
        assert_eq!(config.encoding, PageEncoding::Latin1);
        assert!(config.always_qualified_names);
        assert_eq!(config.external_links.len(), 2);
        assert_eq!(config.external_links[0].package_list, None);
        assert_eq!(
            config.external_links[1].package_list.as_deref(),
            Some("lists/other-packages.txt")
        );
    }

    #[test]
    fn test_load_searches_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = Config::load(&nested).unwrap();

        // destination_dir defaults to the config file's directory.
        assert_eq!(config.destination_dir, dir.path());
    }

    #[test]
    fn test_load_not_found() {
        let dir = tempfile::tempdir().unwrap();
        // tempdir ancestors ("/tmp", "/") should not carry a umldoc.toml;
        // if they do, this test environment is broken anyway.
        let result = Config::load(dir.path());
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_empty_apidoc_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[[external_links]]\napidoc = \"  \"\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_utf8_roundtrip() {
        let encoding = PageEncoding::Utf8;
        let text = "héllo — ünïcode";
        assert_eq!(encoding.decode(&encoding.encode(text)).unwrap(), text);
    }

    #[test]
    fn test_utf8_invalid_bytes() {
        assert_eq!(PageEncoding::Utf8.decode(&[0xff, 0xfe]), None);
    }

    #[test]
    fn test_latin1_decode_encode() {
        let encoding = PageEncoding::Latin1;
        let decoded = encoding.decode(&[0x68, 0xe9, 0x6c]).unwrap();
        assert_eq!(decoded, "hél");
        assert_eq!(encoding.encode(&decoded), vec![0x68, 0xe9, 0x6c]);
        // Characters outside Latin-1 degrade to '?'.
        assert_eq!(encoding.encode("h€"), vec![b'h', b'?']);
    }
}
