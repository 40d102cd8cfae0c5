use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use lexeme_db::{IndexStore, LanguageRegistry};
use lexeme_types::{CategoryTable, LanguageTable};

fn main() -> Result<()> {
    let index_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p lexeme-db --example stats -- <path-to-index.json>")?;

    let languages = LanguageTable::bundled();
    let categories = CategoryTable::bundled();
    let registry = LanguageRegistry::build(&languages, None);

    let mut store = IndexStore::new(Arc::new(registry));
    store
        .load(&index_path)
        .with_context(|| format!("loading index from {}", index_path.display()))?;

    let mut entries = 0usize;
    let mut translations = 0usize;
    for (_, by_language) in store.index().iter() {
        for by_category in by_language.values() {
            entries += by_category.len();
            translations += by_category.values().map(|t| t.len()).sum::<usize>();
        }
    }

    println!("Index: {}", index_path.display());
    println!("Words       : {}", store.len());
    println!("Entries     : {}", entries);
    println!("Translations: {}", translations);
    for iso in store.index().languages() {
        let name = store.registry().name(iso).unwrap_or("(unknown)");
        println!("  {iso:<8} {name}");
    }

    // Spot-check a couple of words.
    for word in ["dog", "hund"] {
        let found = store.lookup(word);
        let kinds: Vec<&str> = found
            .values()
            .flat_map(|c| c.keys())
            .map(|code| categories.name_for(code).unwrap_or(code.as_str()))
            .collect();
        println!("'{word}' -> {kinds:?}");
    }

    Ok(())
}
