//! Catalog of SymSpell frequency dictionaries.
//!
//! Always available: only static metadata and path helpers live here.
//! Downloading requires the `model-download` feature (see `download`).

use crate::config::CorrectionConfig;
use crate::workspace::Workspace;
use std::path::PathBuf;

/// Metadata for a SymSpell frequency dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryInfo {
    /// Language code (e.g., "en").
    pub language: &'static str,
    pub display_name: &'static str,
    pub filename: &'static str,
    /// Raw GitHub URL for download.
    pub url: &'static str,
    /// Approximate download size in KB.
    pub size_kb: u32,
    /// SHA-256 checksum of the dictionary file.
    pub sha256: &'static str,
}

/// Transcripts are English, so is the dictionary.
pub const DEFAULT_LANGUAGE: &str = "en";

pub const DICTIONARIES: &[DictionaryInfo] = &[DictionaryInfo {
    language: "en",
    display_name: "English",
    filename: "en-80k.txt",
    url: "https://raw.githubusercontent.com/wolfgarbe/SymSpell/master/SymSpell.FrequencyDictionary/en-80k.txt",
    size_kb: 900,
    sha256: "f84bfae717ff3a4a3b90c824ed06ea08e4b2ed2746f7bba63d4e52f2c8bf85c3",
}];

/// Look up a dictionary by language code.
pub fn get_dictionary(lang: &str) -> Option<&'static DictionaryInfo> {
    DICTIONARIES.iter().find(|d| d.language == lang)
}

pub fn list_dictionaries() -> &'static [DictionaryInfo] {
    DICTIONARIES
}

/// Where a catalog dictionary lands once installed.
pub fn installed_path(workspace: &Workspace, info: &DictionaryInfo) -> PathBuf {
    workspace.dictionaries_dir().join(info.filename)
}

pub fn is_installed(workspace: &Workspace, info: &DictionaryInfo) -> bool {
    installed_path(workspace, info).is_file()
}

/// Dictionary the word corrector should load: the configured file, or the
/// installed default. `None` when neither exists.
pub fn resolve_dictionary(workspace: &Workspace, config: &CorrectionConfig) -> Option<PathBuf> {
    if let Some(path) = &config.dictionary {
        return path.is_file().then(|| path.clone());
    }
    let info = get_dictionary(DEFAULT_LANGUAGE)?;
    let path = installed_path(workspace, info);
    path.is_file().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn english_dictionary_is_listed() {
        let dict = get_dictionary("en").unwrap();
        assert_eq!(dict.filename, "en-80k.txt");
        assert!(dict.url.ends_with(dict.filename));
        assert_eq!(dict.sha256.len(), 64);
        assert!(get_dictionary("xx").is_none());
        assert_eq!(list_dictionaries().len(), 1);
    }

    #[test]
    fn installed_path_is_under_weights() {
        let ws = Workspace::new("/data/lips");
        let path = installed_path(&ws, get_dictionary("en").unwrap());
        assert_eq!(path, PathBuf::from("/data/lips/weights/dictionaries/en-80k.txt"));
    }

    #[test]
    fn resolve_prefers_configured_file() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        let custom = dir.path().join("grid.txt");
        std::fs::write(&custom, "bin 10\n").unwrap();

        let config = CorrectionConfig {
            dictionary: Some(custom.clone()),
            ..CorrectionConfig::default()
        };
        assert_eq!(resolve_dictionary(&ws, &config), Some(custom));
    }

    #[test]
    fn resolve_falls_back_to_installed_default() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        let config = CorrectionConfig::default();
        assert_eq!(resolve_dictionary(&ws, &config), None);

        let info = get_dictionary("en").unwrap();
        std::fs::create_dir_all(ws.dictionaries_dir()).unwrap();
        std::fs::write(installed_path(&ws, info), "bin 10\n").unwrap();
        assert!(is_installed(&ws, info));
        assert_eq!(resolve_dictionary(&ws, &config), Some(installed_path(&ws, info)));
    }

    #[test]
    fn missing_configured_file_resolves_to_none() {
        let dir = TempDir::new().unwrap();
        let config = CorrectionConfig {
            dictionary: Some(dir.path().join("absent.txt")),
            ..CorrectionConfig::default()
        };
        assert_eq!(resolve_dictionary(&Workspace::new(dir.path()), &config), None);
    }
}
