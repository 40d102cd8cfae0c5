use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::parser::TranslationEntry;

/// Target-language code -> gloss.
pub type Translations = BTreeMap<String, String>;
/// Lexical category code -> translations.
pub type CategoryMap = BTreeMap<String, Translations>;
/// Source-language code -> categories.
pub type LanguageMap = BTreeMap<String, CategoryMap>;

/// word -> source language -> category -> target language -> gloss.
///
/// Every level is ordered, so serialization is stable across runs.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordIndex {
    words: BTreeMap<String, LanguageMap>,
}

impl WordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one translation entry in; an existing value at the same
    /// word/language/category path is replaced.
    pub fn insert(&mut self, entry: TranslationEntry) {
        self.insert_at(entry.word, entry.language, entry.category, entry.glosses);
    }

    /// Insert at `[word][language][category]`, creating intermediate levels.
    pub fn insert_at(
        &mut self,
        word: String,
        language: String,
        category: String,
        translations: Translations,
    ) {
        self.words
            .entry(word)
            .or_default()
            .entry(language)
            .or_default()
            .insert(category, translations);
    }

    pub fn get(&self, word: &str) -> Option<&LanguageMap> {
        self.words.get(word)
    }

    /// Per-word view restricted to one source language.
    pub fn filter_language<'a>(
        &'a self,
        iso: &'a str,
    ) -> BTreeMap<&'a str, BTreeMap<&'a str, &'a CategoryMap>> {
        self.words
            .iter()
            .filter_map(|(word, languages)| {
                let categories = languages.get(iso)?;
                Some((word.as_str(), BTreeMap::from([(iso, categories)])))
            })
            .collect()
    }

    /// Source-language codes present anywhere in the index.
    pub fn languages(&self) -> BTreeSet<&str> {
        self.words
            .values()
            .flat_map(|languages| languages.keys().map(String::as_str))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LanguageMap)> + '_ {
        self.words.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of unique words.
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

    fn entry(word: &str, language: &str, category: &str, glosses: &[(&str, &str)]) -> TranslationEntry {
        TranslationEntry {
            word: word.into(),
            language: language.into(),
            category: category.into(),
            glosses: glosses
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn insert_creates_nested_levels() {
        let mut index = WordIndex::new();
        index.insert(entry("dog", "en", "Q1084", &[("de", "Hund")]));
        index.insert(entry("dog", "en", "Q24905", &[("de", "verfolgen")]));
        index.insert(entry("dog", "sv", "Q1084", &[("en", "a dog")]));

        let languages = index.get("dog").unwrap();
        assert_eq!(languages.len(), 2);
        assert_eq!(languages["en"].len(), 2);
        assert_eq!(languages["en"]["Q1084"]["de"], "Hund");
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn last_write_wins_per_path() {
        let mut index = WordIndex::new();
        index.insert(entry("dog", "en", "Q1084", &[("de", "Hund"), ("fr", "chien")]));
        index.insert(entry("dog", "en", "Q1084", &[("sv", "hund")]));

        let translations = &index.get("dog").unwrap()["en"]["Q1084"];
        assert_eq!(translations.len(), 1);
        assert_eq!(translations["sv"], "hund");
    }

    #[test]
    fn filter_keeps_only_requested_language() {
        let mut index = WordIndex::new();
        index.insert(entry("dog", "en", "Q1084", &[("de", "Hund")]));
        index.insert(entry("dog", "sv", "Q1084", &[("en", "dog")]));
        index.insert(entry("katt", "sv", "Q1084", &[("en", "cat")]));
        index.insert(entry("cat", "en", "Q1084", &[("de", "Katze")]));

        let view = index.filter_language("sv");
        assert_eq!(view.keys().copied().collect::<Vec<_>>(), vec!["dog", "katt"]);
        assert!(view.values().all(|langs| langs.keys().eq(["sv"].iter())));
        assert_eq!(
            index.languages().into_iter().collect::<Vec<_>>(),
            vec!["en", "sv"]
        );
    }
}
