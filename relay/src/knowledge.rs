//! Curated knowledge base
//!
//! Exact-match question → answer table loaded once at startup. Read-only
//! afterwards, so it is shared across requests without a lock.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cache::normalize;

/// One record of the knowledge base file
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,
}

/// Knowledge base keyed by normalized question text
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    entries: HashMap<String, String>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from entries. When two questions normalize to the same key the
    /// later entry wins.
    pub fn from_entries(entries: impl IntoIterator<Item = KnowledgeEntry>) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            let key = normalize(&entry.question);
            if map.insert(key, entry.answer).is_some() {
                tracing::warn!(
                    "Duplicate knowledge base question {:?}, keeping the later answer",
                    entry.question.trim()
                );
            }
        }
        Self { entries: map }
    }

    /// Load from a JSON array of `{question, answer}` records.
    ///
    /// A missing file yields an empty knowledge base; a file that exists but
    /// cannot be parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(
                "No knowledge base at {}, continuing without one",
                path.display()
            );
            return Ok(Self::empty());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge base {}", path.display()))?;
        let entries: Vec<KnowledgeEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse knowledge base {}", path.display()))?;

        let kb = Self::from_entries(entries);
        tracing::info!("Loaded {} knowledge base entries from {}", kb.len(), path.display());
        Ok(kb)
    }

    /// Exact lookup after trimming and lowercasing
    pub fn lookup(&self, question: &str) -> Option<&str> {
        self.entries.get(&normalize(question)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entry(q: &str, a: &str) -> KnowledgeEntry {
        KnowledgeEntry {
            question: q.to_string(),
            answer: a.to_string(),
        }
    }

    #[test]
    fn test_lookup_normalizes_both_sides() {
        let kb = KnowledgeBase::from_entries(vec![entry("  What is Rust? ", "A language.")]);
        assert_eq!(kb.lookup("what is rust?"), Some("A language."));
        assert_eq!(kb.lookup("WHAT IS RUST?\n"), Some("A language."));
    }

    #[test]
    fn test_no_fuzzy_or_substring_match() {
        let kb = KnowledgeBase::from_entries(vec![entry("what is rust?", "A language.")]);
        assert_eq!(kb.lookup("what is rust"), None);
        assert_eq!(kb.lookup("rust"), None);
        assert_eq!(kb.lookup("so, what is rust?"), None);
    }

    #[test]
    fn test_duplicate_questions_last_wins() {
        let kb = KnowledgeBase::from_entries(vec![
            entry("Hello", "first"),
            entry("hello ", "second"),
        ]);
        assert_eq!(kb.len(), 1);
        assert_eq!(kb.lookup("hello"), Some("second"));
    }

    #[test]
    fn test_missing_file_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let kb = KnowledgeBase::load(&dir.path().join("absent.json")).unwrap();
        assert!(kb.is_empty());
        assert_eq!(kb.lookup("anything"), None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"question": "ما هو الذكاء الاصطناعي؟", "answer": "فرع من علوم الحاسوب."}},
               {{"question": "Opening hours", "answer": "9 to 5"}}]"#
        )
        .unwrap();

        let kb = KnowledgeBase::load(file.path()).unwrap();
        assert_eq!(kb.len(), 2);
        assert_eq!(
            kb.lookup("ما هو الذكاء الاصطناعي؟"),
            Some("فرع من علوم الحاسوب.")
        );
        assert_eq!(kb.lookup("opening HOURS"), Some("9 to 5"));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"question": "not a list"}}"#).unwrap();
        assert!(KnowledgeBase::load(file.path()).is_err());
    }
}
