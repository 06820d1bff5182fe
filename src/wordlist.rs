use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::rngs::OsRng;
use rand::Rng;

/// BIP39 wordlists are exactly 2048 entries (11 bits per word).
pub const WORDLIST_LEN: usize = 2048;

/// A validated 2048-word vocabulary loaded from a line-delimited file.
#[derive(Debug, Clone)]
pub struct Wordlist {
    words: Vec<String>,
}

impl Wordlist {
    /// Load and validate a wordlist file. Any problem here is fatal to the run.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read wordlist {}", path.display()))?;
        let words = contents
            .lines()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self::from_words(words)
            .with_context(|| format!("malformed wordlist {}", path.display()))
    }

    pub fn from_words(words: Vec<String>) -> Result<Self> {
        if words.len() != WORDLIST_LEN {
            bail!("expected {} words, found {}", WORDLIST_LEN, words.len());
        }
        let distinct: HashSet<&str> = words.iter().map(String::as_str).collect();
        if distinct.len() != WORDLIST_LEN {
            bail!("wordlist contains {} duplicate words", WORDLIST_LEN - distinct.len());
        }
        Ok(Self { words })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// Early-2013-style mnemonic: uniform random words, no checksum.
    pub fn random_phrase(&self, word_count: usize) -> Result<String> {
        if word_count != 12 && word_count != 24 {
            bail!("word count must be 12 or 24, got {}", word_count);
        }
        let mut rng = OsRng;
        let phrase: Vec<&str> = (0..word_count)
            .map(|_| self.words[rng.gen_range(0..WORDLIST_LEN)].as_str())
            .collect();
        Ok(phrase.join(" "))
    }
}
