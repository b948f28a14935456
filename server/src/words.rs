//! Dictionary loading and word selection.

use rand::Rng;
use std::io;
use std::path::Path;

/// A cyclable word source: each round takes the next word, wrapping
/// around at the end. Loading picks a random starting point so restarts
/// do not replay the same opening word.
#[derive(Debug, Clone)]
pub struct Dictionary {
    words: Vec<String>,
    cursor: usize,
}

impl Dictionary {
    /// Loads a word list from a file, one word per line.
    ///
    /// Entries are lowercased; lines that are empty or contain anything
    /// other than ASCII letters are skipped. Fails if no usable words
    /// remain.
    pub fn load(path: &Path) -> io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let words: Vec<String> = contents
            .lines()
            .map(|line| line.trim().to_ascii_lowercase())
            .filter(|w| !w.is_empty() && w.bytes().all(|b| b.is_ascii_lowercase()))
            .collect();

        if words.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("no usable words in {}", path.display()),
            ));
        }

        let cursor = rand::thread_rng().gen_range(0..words.len());
        Ok(Self { words, cursor })
    }

    /// Builds a dictionary from an explicit word list, starting at the
    /// first entry. Used by tests to make rounds deterministic.
    pub fn from_words(words: Vec<String>) -> Self {
        assert!(!words.is_empty(), "dictionary must contain at least one word");
        Self { words, cursor: 0 }
    }

    /// The next candidate word, advancing the cycle.
    pub fn next_word(&mut self) -> &str {
        let i = self.cursor;
        self.cursor = (self.cursor + 1) % self.words.len();
        &self.words[i]
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycles_in_order_and_wraps() {
        let mut dict =
            Dictionary::from_words(vec!["apple".to_string(), "zebra".to_string()]);
        assert_eq!(dict.next_word(), "apple");
        assert_eq!(dict.next_word(), "zebra");
        assert_eq!(dict.next_word(), "apple");
    }

    #[test]
    fn test_load_filters_unusable_lines() {
        let path = std::env::temp_dir().join("wordsrv_test_dict.txt");
        std::fs::write(&path, "Apple\ncat-5\n\n  zebra  \ndon't\n").unwrap();
        let mut dict = Dictionary::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // "Apple" is lowercased, "zebra" trimmed; the rest are dropped.
        assert_eq!(dict.len(), 2);
        let mut seen = vec![dict.next_word().to_string(), dict.next_word().to_string()];
        seen.sort();
        assert_eq!(seen, vec!["apple", "zebra"]);
    }

    #[test]
    fn test_load_empty_file_fails() {
        let path = std::env::temp_dir().join("wordsrv_test_empty_dict.txt");
        std::fs::write(&path, "123\n!!\n").unwrap();
        let result = Dictionary::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(Dictionary::load(Path::new("/nonexistent/words.txt")).is_err());
    }
}
