use indexmap::IndexMap;

use crate::parser::CategoryHit;

/// Lexeme counts per language and category name, in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct CategoryTally {
    counts: IndexMap<String, IndexMap<String, u64>>,
}

impl CategoryTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, hit: CategoryHit) {
        *self
            .counts
            .entry(hit.language)
            .or_default()
            .entry(hit.category)
            .or_insert(0) += 1;
    }

    pub fn count(&self, language: &str, category: &str) -> u64 {
        self.counts
            .get(language)
            .and_then(|c| c.get(category))
            .copied()
            .unwrap_or(0)
    }

    /// Languages in the order they were first counted.
    pub fn languages(&self) -> impl Iterator<Item = &str> + '_ {
        self.counts.keys().map(String::as_str)
    }

    /// Categories for `language`, highest count first; ties keep first-seen order.
    pub fn most_common(&self, language: &str) -> Vec<(&str, u64)> {
        let Some(categories) = self.counts.get(language) else {
            return Vec::new();
        };
        let mut ranked: Vec<(&str, u64)> = categories
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
