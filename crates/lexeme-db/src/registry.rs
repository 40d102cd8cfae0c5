//! ISO code -> canonical language name lookup derived from [`LanguageTable`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use lexeme_types::LanguageTable;
use tracing::{debug, warn};

/// Where an ISO code came from in the language table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegistryEntry {
    /// Canonical (top-level) language name, used for output grouping.
    pub name: String,
    /// Sub-language name when the code was declared in a `sub_languages` table.
    pub sub_language: Option<String>,
}

/// Immutable set of languages in scope for a run.
///
/// Codes collide rarely (the table is curated), and when they do the first
/// entry in table order is kept.
#[derive(Clone, Debug, Default)]
pub struct LanguageRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl LanguageRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the registry, optionally restricted to one target language.
    ///
    /// `target` matches, case-insensitively, a top-level language name or
    /// code (selecting it and all of its sub-languages) or a sub-language
    /// name or code (selecting just that one).
    pub fn build(table: &LanguageTable, target: Option<&str>) -> Self {
        let mut registry = Self::empty();
        let target = target.map(|t| t.trim().to_lowercase());

        for (name, info) in table.iter() {
            let whole_language = match target.as_deref() {
                None => true,
                Some(t) => {
                    name.to_lowercase() == t
                        || info.iso.as_deref().is_some_and(|iso| iso.to_lowercase() == t)
                }
            };

            if whole_language && let Some(iso) = info.iso.as_deref() {
                registry.insert(iso, name, None);
            }
            for (sub_name, sub) in &info.sub_languages {
                let Some(iso) = sub.iso.as_deref() else {
                    continue;
                };
                let selected = whole_language
                    || target.as_deref().is_some_and(|t| {
                        sub_name.to_lowercase() == t || iso.to_lowercase() == t
                    });
                if selected {
                    registry.insert(iso, name, Some(sub_name));
                }
            }
        }

        if let Some(t) = target.as_deref()
            && registry.is_empty()
        {
            warn!("target language {t:?} not found in language metadata");
        }
        registry
    }

    fn insert(&mut self, iso: &str, name: &str, sub_language: Option<&str>) {
        if let Some(existing) = self.entries.get(iso) {
            debug!(
                "iso code {iso} already registered for {}, ignoring {name}",
                existing.name
            );
            return;
        }
        self.entries.insert(
            iso.to_string(),
            RegistryEntry {
                name: name.to_string(),
                sub_language: sub_language.map(str::to_string),
            },
        );
    }

    pub fn contains(&self, iso: &str) -> bool {
        self.entries.contains_key(iso)
    }

    /// Canonical language name for a code.
    pub fn name(&self, iso: &str) -> Option<&str> {
        self.entries.get(iso).map(|e| e.name.as_str())
    }

    pub fn entry(&self, iso: &str) -> Option<&RegistryEntry> {
        self.entries.get(iso)
    }

    /// Relative directory that per-language output for `iso` is written to.
    pub fn scoped_dir(&self, iso: &str) -> Option<PathBuf> {
        let entry = self.entries.get(iso)?;
        let mut dir = PathBuf::from(&entry.name);
        if let Some(sub) = &entry.sub_language {
            dir.push(sub);
        }
        Some(dir)
    }

    /// Registered codes in sorted order.
    pub fn codes(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
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

    fn table() -> LanguageTable {
        LanguageTable::from_json_str(
            r#"{
                "english": {"iso": "en"},
                "norwegian": {"sub_languages": {"bokmål": {"iso": "nb"}, "nynorsk": {"iso": "nn"}}},
                "swedish": {"iso": "sv"},
                "anglish": {"iso": "en"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn unrestricted_registry_covers_top_level_and_nested_codes() {
        let registry = LanguageRegistry::build(&table(), None);
        assert_eq!(registry.codes().collect::<Vec<_>>(), vec!["en", "nb", "nn", "sv"]);
        assert_eq!(registry.name("nb"), Some("norwegian"));
        assert_eq!(registry.name("nn"), Some("norwegian"));
        assert_eq!(registry.name("sv"), Some("swedish"));
    }

    #[test]
    fn first_entry_wins_on_collision() {
        let registry = LanguageRegistry::build(&table(), None);
        assert_eq!(registry.name("en"), Some("english"));
    }

    #[test]
    fn target_by_name_selects_sub_languages() {
        let registry = LanguageRegistry::build(&table(), Some("Norwegian"));
        assert_eq!(registry.codes().collect::<Vec<_>>(), vec!["nb", "nn"]);
        assert_eq!(
            registry.entry("nb"),
            Some(&RegistryEntry {
                name: "norwegian".into(),
                sub_language: Some("bokmål".into()),
            })
        );
    }

    #[test]
    fn target_by_code_selects_one_language() {
        let registry = LanguageRegistry::build(&table(), Some("sv"));
        assert_eq!(registry.codes().collect::<Vec<_>>(), vec!["sv"]);

        let registry = LanguageRegistry::build(&table(), Some("nn"));
        assert_eq!(registry.codes().collect::<Vec<_>>(), vec!["nn"]);
        assert_eq!(registry.name("nn"), Some("norwegian"));
    }

    #[test]
    fn unknown_target_or_empty_table_yields_empty_registry() {
        assert!(LanguageRegistry::build(&table(), Some("klingon")).is_empty());
        assert!(LanguageRegistry::build(&LanguageTable::default(), None).is_empty());
    }

    #[test]
    fn scoped_dir_nests_sub_languages() {
        let registry = LanguageRegistry::build(&table(), None);
        assert_eq!(registry.scoped_dir("sv"), Some(PathBuf::from("swedish")));
        assert_eq!(
            registry.scoped_dir("nb"),
            Some(PathBuf::from("norwegian").join("bokmål"))
        );
        assert_eq!(registry.scoped_dir("xx"), None);
    }
}
