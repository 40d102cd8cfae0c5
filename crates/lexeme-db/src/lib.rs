//! Build a language-partitioned translation index from a Wikidata lexeme dump.
//!
//! The dump (`latest-lexemes.json.bz2`) is one JSON array with one lexeme
//! object per line. This crate streams it line by line without holding more
//! than one batch in memory, folds every in-scope lexeme into a
//! [`WordIndex`] (or a [`CategoryTally`] when only counting), and persists
//! the index as stable, key-sorted JSON.
//!
//! # Pieces
//! - [`LanguageRegistry`]: ISO code -> canonical language name, optionally
//!   restricted to one language and its sub-languages.
//! - [`EntryParser`]: one line -> [`Extraction`]; malformed lines are errors
//!   the caller logs and skips, out-of-scope lexemes are `None`.
//! - [`DumpReader`]: bzip2 decompression, structural-line skipping, batching.
//! - [`IndexStore`]: owns the index; `save`, `save_language`, `load`,
//!   `lookup`.
//! - [`Pipeline`]: runs all of the above for one [`RunConfig`] and returns a
//!   [`RunReport`] whose `Display` is the run summary.
//!
//! # Example
//! ```no_run
//! use lexeme_db::{Pipeline, RunConfig};
//! use lexeme_types::{CategoryTable, LanguageTable};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = RunConfig {
//!     dump_path: "latest-lexemes.json.bz2".into(),
//!     language: Some("swedish".into()),
//!     ..RunConfig::default()
//! };
//! let mut pipeline = Pipeline::new(config, &LanguageTable::bundled(), CategoryTable::bundled());
//! let report = pipeline.run()?;
//! println!("{report}");
//! println!("{:?}", pipeline.store().lookup("hund"));
//! # Ok(()) }
//! ```

pub mod diagnostics;
pub mod error;
pub mod index;
pub mod parser;
pub mod pipeline;
pub mod reader;
pub mod registry;
pub mod store;
pub mod tally;
pub mod tables;

pub use diagnostics::DiagnosticLog;
pub use error::{ConfigError, PersistenceError, RecordParseError, RunError};
pub use index::{CategoryMap, LanguageMap, Translations, WordIndex};
pub use parser::{CategoryHit, EntryParser, Extraction, ParseMode, TranslationEntry};
pub use pipeline::{INDEX_FILE_NAME, Pipeline, RunConfig, RunOutcome, RunReport, RunStats};
pub use reader::{AVERAGE_ENTRY_BYTES, DEFAULT_BATCH_SIZE, DumpReader, RawLine};
pub use registry::{LanguageRegistry, RegistryEntry};
pub use store::IndexStore;
pub use tally::CategoryTally;
