//! SymSpell word corrector.
//!
//! Compound lookup against a frequency dictionary: fixes misspelled words,
//! merges split words and splits run-together ones in a single pass.

use crate::correction::corrector::Corrector;
use crate::error::{LipreadError, Result};
use std::path::Path;
use symspell::{SymSpell, UnicodeStringStrategy};

/// The dictionary is indexed for this many edits, so lookups cannot exceed it.
const MAX_INDEXED_EDIT_DISTANCE: i64 = 2;

pub struct SymSpellCorrector {
    symspell: SymSpell<UnicodeStringStrategy>,
    max_edit_distance: i64,
    words: usize,
}

impl std::fmt::Debug for SymSpellCorrector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymSpellCorrector")
            .field("max_edit_distance", &self.max_edit_distance)
            .field("words", &self.words)
            .finish_non_exhaustive()
    }
}

impl SymSpellCorrector {
    /// Load a `word frequency` dictionary, one entry per line.
    ///
    /// Malformed lines are skipped.
    pub fn from_file(path: &Path, max_edit_distance: i64) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LipreadError::Correction {
            message: format!("Failed to read dictionary '{}': {}", path.display(), e),
        })?;

        let mut symspell: SymSpell<UnicodeStringStrategy> = SymSpell::default();
        let mut words = 0;
        for line in content.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 2
                && let Ok(freq) = parts[1].parse::<i64>()
            {
                symspell.load_dictionary_line(&format!("{} {}", parts[0], freq), 0, 1, " ");
                words += 1;
            }
        }

        let clamped = max_edit_distance.clamp(0, MAX_INDEXED_EDIT_DISTANCE);
        if clamped != max_edit_distance {
            tracing::warn!(
                requested = max_edit_distance,
                used = clamped,
                "correction.max_edit_distance out of range"
            );
        }
        tracing::debug!(path = %path.display(), words, "loaded SymSpell dictionary");

        Ok(Self {
            symspell,
            max_edit_distance: clamped,
            words,
        })
    }

    pub fn dictionary_size(&self) -> usize {
        self.words
    }
}

impl Corrector for SymSpellCorrector {
    fn correct(&mut self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let suggestions = self.symspell.lookup_compound(text, self.max_edit_distance);
        if let Some(suggestion) = suggestions.first() {
            Ok(suggestion.term.clone())
        } else {
            Ok(text.to_string())
        }
    }

    fn name(&self) -> &str {
        "symspell"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn grid_dictionary() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for (word, freq) in [
            ("bin", 900000),
            ("blue", 800000),
            ("at", 2000000),
            ("place", 700000),
            ("red", 750000),
            ("in", 3000000),
            ("now", 1200000),
            ("please", 600000),
            ("again", 500000),
            ("soon", 400000),
        ] {
            writeln!(file, "{word} {freq}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_dictionary() {
        let file = grid_dictionary();
        let corrector = SymSpellCorrector::from_file(file.path(), 2).unwrap();
        assert_eq!(corrector.dictionary_size(), 10);
    }

    #[test]
    fn missing_dictionary_is_error() {
        let err = SymSpellCorrector::from_file(Path::new("/nonexistent/dict.txt"), 2).unwrap_err();
        assert!(matches!(err, LipreadError::Correction { .. }));
        assert!(err.to_string().contains("Failed to read dictionary"));
    }

    #[test]
    fn correct_sentence_passes_through() {
        let file = grid_dictionary();
        let mut corrector = SymSpellCorrector::from_file(file.path(), 2).unwrap();
        assert_eq!(corrector.correct("place red in a").unwrap().split(' ').next(), Some("place"));
        assert_eq!(corrector.correct("bin blue at now").unwrap(), "bin blue at now");
    }

    #[test]
    fn misspelled_words_are_fixed() {
        let file = grid_dictionary();
        let mut corrector = SymSpellCorrector::from_file(file.path(), 2).unwrap();
        assert_eq!(corrector.correct("bim bleu at now").unwrap(), "bin blue at now");
    }

    #[test]
    fn empty_input_stays_empty() {
        let file = grid_dictionary();
        let mut corrector = SymSpellCorrector::from_file(file.path(), 2).unwrap();
        assert_eq!(corrector.correct("").unwrap(), "");
        assert_eq!(corrector.correct("   ").unwrap(), "");
    }

    #[test]
    fn edit_distance_is_clamped() {
        let file = grid_dictionary();
        let corrector = SymSpellCorrector::from_file(file.path(), 9).unwrap();
        assert_eq!(corrector.max_edit_distance, 2);
        let corrector = SymSpellCorrector::from_file(file.path(), -1).unwrap();
        assert_eq!(corrector.max_edit_distance, 0);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hello 1000000").unwrap();
        writeln!(file, "single_word_no_freq").unwrap();
        writeln!(file, "world notanumber").unwrap();
        writeln!(file, "good 500000").unwrap();
        file.flush().unwrap();
        let corrector = SymSpellCorrector::from_file(file.path(), 2).unwrap();
        assert_eq!(corrector.dictionary_size(), 2);
    }
}
