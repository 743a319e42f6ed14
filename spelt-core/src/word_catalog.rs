use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// One spoken word of a round. The spelling stays server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: String,
    pub audio_ref: String,
    pub spelling: String,
}

impl Word {
    pub fn new(id: &str, audio_ref: &str, spelling: &str) -> Self {
        Self {
            id: id.to_string(),
            audio_ref: audio_ref.to_string(),
            spelling: spelling.to_string(),
        }
    }

    /// Check a typed answer against this word
    pub fn is_spelled_by(&self, input: &str) -> bool {
        spelling_matches(input, &self.spelling)
    }
}

/// Case-insensitive exact comparison. Whitespace is significant and no accent
/// or punctuation folding is applied.
pub fn spelling_matches(input: &str, canonical: &str) -> bool {
    input.to_lowercase() == canonical.to_lowercase()
}

/// Ordered, non-empty list of the words presented in one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCatalog {
    words: Vec<Word>,
}

impl WordCatalog {
    pub fn new(words: Vec<Word>) -> Result<Self> {
        if words.is_empty() {
            return Err(anyhow!("Word catalog must contain at least one word"));
        }
        if let Some(word) = words.iter().find(|w| w.spelling.is_empty()) {
            return Err(anyhow!("Word {} has an empty spelling", word.id));
        }

        Ok(Self { words })
    }

    /// The five words shipped with the game, in play order
    pub fn standard() -> Self {
        Self {
            words: vec![
                Word::new("word_1", "spelt_accommodate.mp3", "accommodate"),
                Word::new("word_2", "spelt_definitely.mp3", "definitely"),
                Word::new("word_3", "spelt_mischievous.mp3", "mischievous"),
                Word::new("word_4", "spelt_embarrass.mp3", "embarrass"),
                Word::new("word_5", "spelt_conscientious.mp3", "conscientious"),
            ],
        }
    }

    /// Parse a manifest with one `id,audio_ref,spelling` line per word.
    /// Blank lines and `#` comments are skipped.
    pub fn from_manifest(manifest: &str) -> Result<Self> {
        let mut words = Vec::new();

        for (line_number, line) in manifest.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            match fields.as_slice() {
                [id, audio_ref, spelling] if !id.is_empty() && !audio_ref.is_empty() => {
                    words.push(Word::new(id, audio_ref, spelling));
                }
                _ => {
                    return Err(anyhow!(
                        "Malformed catalog line {}: expected id,audio_ref,spelling",
                        line_number + 1
                    ));
                }
            }
        }

        Self::new(words)
    }

    pub fn get(&self, index: usize) -> Option<&Word> {
        self.words.get(index)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }
}

impl Default for WordCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_order() {
        let catalog = WordCatalog::standard();
        assert_eq!(catalog.len(), 5);

        let spellings: Vec<&str> = catalog.words().iter().map(|w| w.spelling.as_str()).collect();
        assert_eq!(
            spellings,
            vec!["accommodate", "definitely", "mischievous", "embarrass", "conscientious"]
        );
        assert_eq!(catalog.get(0).unwrap().audio_ref, "spelt_accommodate.mp3");
        assert!(catalog.get(5).is_none());
    }

    #[test]
    fn test_spelling_is_case_insensitive() {
        assert!(spelling_matches("accommodate", "accommodate"));
        assert!(spelling_matches("ACCOMMODATE", "accommodate"));
        assert!(spelling_matches("AcCoMmOdAtE", "accommodate"));
        assert!(!spelling_matches("acommodate", "accommodate"));
    }

    #[test]
    fn test_spelling_keeps_whitespace_and_punctuation() {
        // Input is compared literally apart from case
        assert!(!spelling_matches(" accommodate", "accommodate"));
        assert!(!spelling_matches("accommodate ", "accommodate"));
        assert!(!spelling_matches("", "accommodate"));
        assert!(!spelling_matches("   ", "accommodate"));
        assert!(!spelling_matches("accommodate.", "accommodate"));
        assert!(!spelling_matches("naïve", "naive"));
    }

    #[test]
    fn test_manifest_parsing() {
        let manifest = "# round one\nword_a, a.mp3, apple\n\n  \nword_b,b.mp3,Banana\n";
        let catalog = WordCatalog::from_manifest(manifest).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap(), &Word::new("word_a", "a.mp3", "apple"));
        assert!(catalog.get(1).unwrap().is_spelled_by("banana"));
    }

    #[test]
    fn test_manifest_rejects_bad_input() {
        let result = WordCatalog::from_manifest("");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("at least one word"));

        let result = WordCatalog::from_manifest("word_a,a.mp3\n");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("line 1"));

        let result = WordCatalog::from_manifest("word_a,a.mp3,\n");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty spelling"));
    }
}
