//! Turns one raw dump line into an extraction result.
//!
//! Parsing is pure: the parser borrows the registry and category table and
//! returns an owned [`Extraction`], so lines can be parsed on any thread and
//! folded afterwards by whoever owns the index.

use std::collections::BTreeMap;

use lexeme_types::{CategoryTable, LexemeRecord};
use tracing::trace;

use crate::error::RecordParseError;
use crate::registry::LanguageRegistry;

/// Which aggregation a run performs.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ParseMode {
    /// Build the word -> language -> category -> translations index.
    #[default]
    Translations,
    /// Count lexemes per language and category.
    Total,
}

/// Glosses of one lexeme keyed by target-language code.
pub type Glosses = BTreeMap<String, String>;

/// Data to insert at `[word][language][category]`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TranslationEntry {
    pub word: String,
    pub language: String,
    pub category: String,
    pub glosses: Glosses,
}

/// One lexeme counted towards `(language, category)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CategoryHit {
    pub language: String,
    pub category: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Extraction {
    Translation(TranslationEntry),
    Category(CategoryHit),
}

pub struct EntryParser<'a> {
    registry: &'a LanguageRegistry,
    categories: &'a CategoryTable,
    mode: ParseMode,
}

impl<'a> EntryParser<'a> {
    pub fn new(
        registry: &'a LanguageRegistry,
        categories: &'a CategoryTable,
        mode: ParseMode,
    ) -> Self {
        Self {
            registry,
            categories,
            mode,
        }
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Parse one dump line.
    ///
    /// `Ok(None)` means the line is valid but out of scope (missing fields,
    /// unknown language or category). `Err` means the line is not a lexeme
    /// object at all.
    pub fn parse_line(&self, line: &str) -> Result<Option<Extraction>, RecordParseError> {
        let record: LexemeRecord = serde_json::from_str(strip_line(line))?;
        let extraction = match self.mode {
            ParseMode::Translations => self.translation(&record).map(Extraction::Translation),
            ParseMode::Total => self.category_hit(&record).map(Extraction::Category),
        };
        Ok(extraction)
    }

    /// Translation-mode extraction from an already parsed record.
    pub fn translation(&self, record: &LexemeRecord) -> Option<TranslationEntry> {
        let category = record
            .lexical_category
            .as_deref()
            .filter(|c| !c.is_empty())?;
        // Only the first lemma anchors the entry; other lemmas are not indexed.
        let Some((_, lemma)) = record.first_lemma() else {
            trace!("skipping lexeme without lemmas");
            return None;
        };

        let word = lemma.value.as_deref().unwrap_or_default().to_lowercase();
        let language = lemma.language.as_deref().unwrap_or_default();
        if word.is_empty() || !self.registry.contains(language) {
            trace!("skipping lemma {word:?} in {language:?}");
            return None;
        }

        let mut glosses = Glosses::new();
        for sense in record.senses() {
            for (code, gloss) in sense.glosses() {
                if !self.registry.contains(code) {
                    continue;
                }
                if let Some(value) = &gloss.value {
                    glosses.insert(code.to_string(), value.clone());
                }
            }
        }
        if glosses.is_empty() {
            return None;
        }

        Some(TranslationEntry {
            word,
            language: language.to_string(),
            category: category.to_string(),
            glosses,
        })
    }

    /// Total-mode extraction: one hit per lexeme, for the first in-scope lemma.
    pub fn category_hit(&self, record: &LexemeRecord) -> Option<CategoryHit> {
        let code = record.lexical_category.as_deref()?;
        let category = self.categories.name_for(code)?;
        record
            .lemmas()
            .filter_map(|(_, lemma)| lemma.language.as_deref())
            .find(|language| self.registry.contains(language))
            .map(|language| CategoryHit {
                language: language.to_string(),
                category: category.to_string(),
            })
    }
}

/// Trim whitespace and one trailing comma left over from array formatting.
pub fn strip_line(line: &str) -> &str {
    let trimmed = line.trim();
    trimmed.strip_suffix(',').unwrap_or(trimmed).trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexeme_types::LanguageTable;

    fn registry() -> LanguageRegistry {
        let table = LanguageTable::from_json_str(
            r#"{"english": {"iso": "en"}, "german": {"iso": "de"}, "french": {"iso": "fr"}}"#,
        )
        .unwrap();
        LanguageRegistry::build(&table, None)
    }

    fn categories() -> CategoryTable {
        CategoryTable::from_json_str(r#"{"nouns": "Q1084", "verbs": "Q24905"}"#).unwrap()
    }

    #[test]
    fn extracts_lowercased_anchor_with_known_glosses() {
        let registry = registry();
        let categories = categories();
        let parser = EntryParser::new(&registry, &categories, ParseMode::Translations);
        let line = r#"{"lemmas":{"en":{"value":"Dog","language":"en"}},"lexicalCategory":"Q1084","senses":[{"glosses":{"de":{"value":"Hund"},"xx":{"value":"?"}}},{"glosses":{"fr":{"value":"chien"}}}]},"#;

        let Some(Extraction::Translation(entry)) = parser.parse_line(line).unwrap() else {
            panic!("expected a translation");
        };
        assert_eq!(entry.word, "dog");
        assert_eq!(entry.language, "en");
        assert_eq!(entry.category, "Q1084");
        assert_eq!(
            entry.glosses,
            Glosses::from([
                ("de".to_string(), "Hund".to_string()),
                ("fr".to_string(), "chien".to_string()),
            ])
        );
    }

    #[test]
    fn later_senses_override_earlier_glosses() {
        let registry = registry();
        let categories = categories();
        let parser = EntryParser::new(&registry, &categories, ParseMode::Translations);
        let line = r#"{"lemmas":{"en":{"value":"run","language":"en"}},"lexicalCategory":"Q24905","senses":[{"glosses":{"de":{"value":"laufen"}}},{"glosses":{"de":{"value":"rennen"}}}]}"#;
        let Some(Extraction::Translation(entry)) = parser.parse_line(line).unwrap() else {
            panic!("expected a translation");
        };
        assert_eq!(entry.glosses["de"], "rennen");
    }

    #[test]
    fn skips_out_of_scope_records() {
        let registry = registry();
        let categories = categories();
        let parser = EntryParser::new(&registry, &categories, ParseMode::Translations);

        let no_lemmas = r#"{"lexicalCategory":"Q1084","senses":[{"glosses":{"de":{"value":"x"}}}]}"#;
        let no_category = r#"{"lemmas":{"en":{"value":"a","language":"en"}},"senses":[{"glosses":{"de":{"value":"x"}}}]}"#;
        let unknown_language = r#"{"lemmas":{"xx":{"value":"a","language":"xx"}},"lexicalCategory":"Q1084","senses":[{"glosses":{"de":{"value":"x"}}}]}"#;
        let empty_word = r#"{"lemmas":{"en":{"value":"","language":"en"}},"lexicalCategory":"Q1084","senses":[{"glosses":{"de":{"value":"x"}}}]}"#;
        let no_known_glosses = r#"{"lemmas":{"en":{"value":"a","language":"en"}},"lexicalCategory":"Q1084","senses":[{"glosses":{"xx":{"value":"x"}}}]}"#;

        for line in [no_lemmas, no_category, unknown_language, empty_word, no_known_glosses] {
            assert_eq!(parser.parse_line(line).unwrap(), None, "{line}");
        }
    }

    #[test]
    fn only_first_lemma_anchors_the_entry() {
        let registry = registry();
        let categories = categories();
        let parser = EntryParser::new(&registry, &categories, ParseMode::Translations);
        let line = r#"{"lemmas":{"xx":{"value":"foo","language":"xx"},"en":{"value":"bar","language":"en"}},"lexicalCategory":"Q1084","senses":[{"glosses":{"de":{"value":"x"}}}]}"#;
        assert_eq!(parser.parse_line(line).unwrap(), None);
    }

    #[test]
    fn valueless_glosses_do_not_drop_the_lexeme() {
        let registry = registry();
        let categories = categories();
        let line = r#"{"lemmas":{"en":{"value":"dog","language":"en"}},"lexicalCategory":"Q1084","senses":[{"glosses":{"de":{"value":"Hund"},"xx":{"language":"xx"},"fr":{"language":"fr"}}}]}"#;

        let translations = EntryParser::new(&registry, &categories, ParseMode::Translations);
        let Some(Extraction::Translation(entry)) = translations.parse_line(line).unwrap() else {
            panic!("expected a translation");
        };
        assert_eq!(
            entry.glosses,
            Glosses::from([("de".to_string(), "Hund".to_string())])
        );

        let totals = EntryParser::new(&registry, &categories, ParseMode::Total);
        assert_eq!(
            totals.parse_line(line).unwrap(),
            Some(Extraction::Category(CategoryHit {
                language: "en".into(),
                category: "nouns".into(),
            }))
        );
    }

    #[test]
    fn total_mode_ignores_sense_shape() {
        let registry = registry();
        let categories = categories();
        let parser = EntryParser::new(&registry, &categories, ParseMode::Total);
        let line = r#"{"lemmas":{"en":{"value":"run","language":"en"}},"lexicalCategory":"Q24905","senses":{}}"#;
        assert_eq!(
            parser.parse_line(line).unwrap(),
            Some(Extraction::Category(CategoryHit {
                language: "en".into(),
                category: "verbs".into(),
            }))
        );
    }

    #[test]
    fn malformed_field_error_names_the_expected_shape() {
        let registry = registry();
        let categories = categories();
        let parser = EntryParser::new(&registry, &categories, ParseMode::Translations);
        let err = parser
            .parse_line(r#"{"lemmas":"dog","lexicalCategory":"Q1084"}"#)
            .unwrap_err();
        assert!(
            err.to_string().contains("an object keyed by language code"),
            "{err}"
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        let registry = registry();
        let categories = categories();
        let parser = EntryParser::new(&registry, &categories, ParseMode::Translations);
        assert!(parser.parse_line(r#"{"lemmas": {"en": "#).is_err());
        assert!(parser.parse_line("not json").is_err());
    }

    #[test]
    fn total_mode_counts_first_registry_lemma_once() {
        let registry = registry();
        let categories = categories();
        let parser = EntryParser::new(&registry, &categories, ParseMode::Total);
        let line = r#"{"lemmas":{"xx":{"value":"a","language":"xx"},"de":{"value":"b","language":"de"},"en":{"value":"c","language":"en"}},"lexicalCategory":"Q24905"}"#;
        assert_eq!(
            parser.parse_line(line).unwrap(),
            Some(Extraction::Category(CategoryHit {
                language: "de".into(),
                category: "verbs".into(),
            }))
        );
    }

    #[test]
    fn total_mode_requires_known_category() {
        let registry = registry();
        let categories = categories();
        let parser = EntryParser::new(&registry, &categories, ParseMode::Total);
        let line = r#"{"lemmas":{"en":{"value":"c","language":"en"}},"lexicalCategory":"Q99"}"#;
        assert_eq!(parser.parse_line(line).unwrap(), None);
    }

    #[test]
    fn strips_whitespace_and_one_trailing_comma() {
        assert_eq!(strip_line("  {\"a\":1},\n"), "{\"a\":1}");
        assert_eq!(strip_line("{}"), "{}");
        assert_eq!(strip_line("{},,"), "{},");
    }
}
