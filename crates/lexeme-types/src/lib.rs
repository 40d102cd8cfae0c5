//! Typed views over the Wikidata lexeme dump and its static lookup tables.
//!
//! Only the subset of the lexeme schema that indexing consumes is modelled:
//! lemmas, the lexical category code, and per-sense glosses. Every field is
//! optional so a record deserializes from any object; deciding what is
//! required is left to the parser consuming it.
//!
//! Map-shaped fields keep the order they appear in the source JSON
//! ([`IndexMap`]), because "the first lemma" and "the first language in the
//! table" are meaningful.
//!
//! ```rust
//! use lexeme_types::{CategoryTable, LexemeRecord};
//!
//! let line = r#"{"lemmas":{"en":{"value":"Dog","language":"en"}},"lexicalCategory":"Q1084"}"#;
//! let record: LexemeRecord = serde_json::from_str(line).unwrap();
//! let (code, lemma) = record.first_lemma().unwrap();
//! assert_eq!(code, "en");
//! assert_eq!(lemma.value.as_deref(), Some("Dog"));
//!
//! let categories = CategoryTable::bundled();
//! assert_eq!(categories.name_for("Q1084"), Some("nouns"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::de::{IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};

const BUNDLED_LANGUAGES: &str = include_str!("data/language_metadata.json");
const BUNDLED_CATEGORIES: &str = include_str!("data/data_type_metadata.json");

/// One lexeme object from the dump.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LexemeRecord {
    #[serde(default, deserialize_with = "lenient_map")]
    pub lemmas: Option<IndexMap<String, Lemma>>,
    #[serde(rename = "lexicalCategory")]
    pub lexical_category: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub senses: Option<Vec<Sense>>,
}

impl LexemeRecord {
    /// The lemma listed first in the source object, keyed by its map code.
    pub fn first_lemma(&self) -> Option<(&str, &Lemma)> {
        self.lemmas
            .as_ref()?
            .first()
            .map(|(code, lemma)| (code.as_str(), lemma))
    }

    /// Iterate lemmas in source order.
    pub fn lemmas(&self) -> impl Iterator<Item = (&str, &Lemma)> + '_ {
        self.lemmas
            .iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Iterate senses in source order.
    pub fn senses(&self) -> impl Iterator<Item = &Sense> + '_ {
        self.senses.iter().flatten()
    }
}

/// Citation form of a lexeme in one language.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Lemma {
    pub value: Option<String>,
    pub language: Option<String>,
}

/// One meaning of a lexeme with its per-language glosses.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Sense {
    #[serde(default, deserialize_with = "lenient_map")]
    pub glosses: Option<IndexMap<String, Gloss>>,
}

impl Sense {
    pub fn glosses(&self) -> impl Iterator<Item = (&str, &Gloss)> + '_ {
        self.glosses
            .iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

/// Gloss text in one language. Glosses without a `value` are kept here and
/// ignored by consumers.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Gloss {
    pub value: Option<String>,
    pub language: Option<String>,
}

// Wikibase serializes empty objects as `[]` and, occasionally, empty arrays
// as `{}`. Both wrappers accept the other shape as empty; anything else is an
// error naming the expected shape. Element errors surface unchanged.
struct LenientMap<V>(IndexMap<String, V>);
struct LenientSeq<V>(Vec<V>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for LenientMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for MapVisitor<V> {
            type Value = LenientMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object keyed by language code (or an empty array)")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> Result<Self::Value, A::Error> {
                let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0).min(64));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.insert(key, value);
                }
                Ok(LenientMap(map))
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut access: A,
            ) -> Result<Self::Value, A::Error> {
                while access.next_element::<IgnoredAny>()?.is_some() {}
                Ok(LenientMap(IndexMap::new()))
            }
        }

        deserializer.deserialize_any(MapVisitor(PhantomData))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for LenientSeq<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeqVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for SeqVisitor<V> {
            type Value = LenientSeq<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an array of senses (or an empty object)")
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut access: A,
            ) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0).min(64));
                while let Some(item) = access.next_element()? {
                    items.push(item);
                }
                Ok(LenientSeq(items))
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> Result<Self::Value, A::Error> {
                while access.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(LenientSeq(Vec::new()))
            }
        }

        deserializer.deserialize_any(SeqVisitor(PhantomData))
    }
}

fn lenient_map<'de, D, V>(deserializer: D) -> Result<Option<IndexMap<String, V>>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    Ok(Option::<LenientMap<V>>::deserialize(deserializer)?.map(|m| m.0))
}

fn lenient_seq<'de, D, V>(deserializer: D) -> Result<Option<Vec<V>>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    Ok(Option::<LenientSeq<V>>::deserialize(deserializer)?.map(|s| s.0))
}

/// Language metadata: canonical language name -> codes, in table order.
///
/// A language either carries its own `iso` code or a `sub_languages` table
/// whose entries carry theirs (or both).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct LanguageTable {
    languages: IndexMap<String, LanguageInfo>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LanguageInfo {
    pub iso: Option<String>,
    pub qid: Option<String>,
    #[serde(default)]
    pub sub_languages: IndexMap<String, SubLanguageInfo>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SubLanguageInfo {
    pub iso: Option<String>,
    pub qid: Option<String>,
}

impl LanguageTable {
    /// Table compiled into the crate.
    pub fn bundled() -> Self {
        Self::from_json_str(BUNDLED_LANGUAGES).expect("bundled language metadata is valid")
    }

    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LanguageInfo)> + '_ {
        self.languages.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

/// Lexical category table: human-readable name -> category code (a Wikidata QID).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(from = "IndexMap<String, String>")]
pub struct CategoryTable {
    by_name: IndexMap<String, String>,
    by_code: HashMap<String, usize>,
}

impl From<IndexMap<String, String>> for CategoryTable {
    fn from(by_name: IndexMap<String, String>) -> Self {
        let mut by_code = HashMap::with_capacity(by_name.len());
        for (idx, code) in by_name.values().enumerate() {
            // first name listed for a code wins
            by_code.entry(code.clone()).or_insert(idx);
        }
        Self { by_name, by_code }
    }
}

impl CategoryTable {
    /// Table compiled into the crate.
    pub fn bundled() -> Self {
        Self::from_json_str(BUNDLED_CATEGORIES).expect("bundled category metadata is valid")
    }

    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Resolve a category code to its name.
    pub fn name_for(&self, code: &str) -> Option<&str> {
        let idx = *self.by_code.get(code)?;
        self.by_name.get_index(idx).map(|(name, _)| name.as_str())
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.by_name.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
