//! Wires registry, parser, aggregators, reader and store together for one run.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{HumanCount, ProgressBar, ProgressStyle};
use lexeme_types::{CategoryTable, LanguageTable};
use rayon::prelude::*;
use tracing::{error, info};

use crate::diagnostics::DiagnosticLog;
use crate::error::{ConfigError, RecordParseError, RunError};
use crate::parser::{EntryParser, Extraction, ParseMode};
use crate::reader::{DEFAULT_BATCH_SIZE, DumpReader, RawLine};
use crate::registry::LanguageRegistry;
use crate::store::IndexStore;
use crate::tally::CategoryTally;

pub const INDEX_FILE_NAME: &str = "lexeme_index_translations.json";
const DEFAULT_DUMP: &str = "latest-lexemes.json.bz2";
const DEFAULT_OUTPUT_DIR: &str = "lexeme_index_export";

/// Everything a run needs to know; nothing in the pipeline reads globals.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub dump_path: PathBuf,
    pub output_dir: PathBuf,
    pub batch_size: usize,
    /// Restrict to one language (name or ISO code); `None` for all.
    pub language: Option<String>,
    pub mode: ParseMode,
    pub progress: bool,
    /// Parse each batch on the rayon pool; folding stays sequential.
    pub parallel: bool,
    /// Also write the unfiltered index next to the per-language files.
    pub save_combined: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dump_path: PathBuf::from(DEFAULT_DUMP),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            batch_size: DEFAULT_BATCH_SIZE,
            language: None,
            mode: ParseMode::Translations,
            progress: true,
            parallel: true,
            save_combined: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RunStats {
    /// Non-structural lines handed to the parser.
    pub processed_entries: u64,
    pub malformed_lines: u64,
    pub unique_words: usize,
    pub elapsed: Duration,
}

#[derive(Clone, Debug)]
pub enum RunOutcome {
    /// Translation mode: index files written, in write order.
    Persisted { files: Vec<PathBuf> },
    /// Total mode: category counts, nothing written.
    Reported { tally: CategoryTally },
}

/// Result of a run; `Display` renders the human-readable summary.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub stats: RunStats,
    pub outcome: RunOutcome,
    registry: Arc<LanguageRegistry>,
}

pub struct Pipeline {
    config: RunConfig,
    registry: Arc<LanguageRegistry>,
    categories: CategoryTable,
    log: DiagnosticLog,
    store: IndexStore,
    tally: CategoryTally,
}

impl Pipeline {
    pub fn new(config: RunConfig, languages: &LanguageTable, categories: CategoryTable) -> Self {
        let registry = Arc::new(LanguageRegistry::build(
            languages,
            config.language.as_deref(),
        ));
        Self {
            store: IndexStore::new(Arc::clone(&registry)),
            tally: CategoryTally::new(),
            config,
            registry,
            categories,
            log: DiagnosticLog::disabled(),
        }
    }

    /// Send diagnostics for this pipeline's runs to `log`.
    pub fn with_log(mut self, log: DiagnosticLog) -> Self {
        self.log = log;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// The index built by the last run. Still populated after a failed save.
    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn tally(&self) -> &CategoryTally {
        &self.tally
    }

    /// Path of the combined index; per-language files share its file name.
    pub fn index_path(&self) -> PathBuf {
        self.config.output_dir.join(INDEX_FILE_NAME)
    }

    /// Stream the dump, aggregate, and persist (translation mode) or tally
    /// (total mode).
    pub fn run(&mut self) -> Result<RunReport, RunError> {
        let log = self.log.clone();
        log.in_scope(|| self.run_logged())
            .inspect_err(|e| log.in_scope(|| error!("run failed: {e}")))
    }

    fn run_logged(&mut self) -> Result<RunReport, RunError> {
        let start = Instant::now();
        let mode = self.config.mode;
        info!(
            "starting {mode:?} run over {} ({} languages in scope)",
            self.config.dump_path.display(),
            self.registry.len()
        );

        self.store = IndexStore::new(Arc::clone(&self.registry));
        self.tally = CategoryTally::new();

        if mode == ParseMode::Translations {
            fs::create_dir_all(&self.config.output_dir).map_err(|source| {
                ConfigError::OutputDir {
                    path: self.config.output_dir.clone(),
                    source,
                }
            })?;
        }

        let mut reader = DumpReader::open(&self.config.dump_path, self.config.batch_size)?;
        let progress = self.progress_bar(reader.estimated_entries());
        let parser = EntryParser::new(&self.registry, &self.categories, mode);
        let mut stats = RunStats::default();

        while let Some(batch) = reader.next_batch().inspect_err(|_| progress.abandon())? {
            let results = parse_batch(&parser, &batch, self.config.parallel);
            for (line, result) in batch.iter().zip(results) {
                match result {
                    Ok(Some(Extraction::Translation(entry))) => self.store.insert(entry),
                    Ok(Some(Extraction::Category(hit))) => self.tally.record(hit),
                    Ok(None) => {}
                    Err(e) => {
                        stats.malformed_lines += 1;
                        error!("error processing line {}: {e}", line.number);
                    }
                }
            }
            stats.processed_entries += batch.len() as u64;
            progress.inc(batch.len() as u64);
        }
        progress.finish_and_clear();

        stats.elapsed = start.elapsed();
        stats.unique_words = self.store.len();
        info!(
            "processed {} entries ({} malformed) in {:.2}s, {} unique words",
            stats.processed_entries,
            stats.malformed_lines,
            stats.elapsed.as_secs_f64(),
            stats.unique_words
        );

        let outcome = match mode {
            ParseMode::Translations => RunOutcome::Persisted {
                files: self.persist()?,
            },
            ParseMode::Total => RunOutcome::Reported {
                tally: self.tally.clone(),
            },
        };

        Ok(RunReport {
            stats,
            outcome,
            registry: Arc::clone(&self.registry),
        })
    }

    fn persist(&self) -> Result<Vec<PathBuf>, RunError> {
        let index_path = self.index_path();
        let mut files = Vec::new();
        if self.config.save_combined {
            files.push(self.store.save(&index_path)?);
        }
        for iso in self.store.index().languages() {
            if let Some(path) = self.store.save_language(&index_path, iso)? {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn progress_bar(&self, estimated_entries: u64) -> ProgressBar {
        if !self.config.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(estimated_entries);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner} Processing entries [{elapsed_precise}] [{bar:40}] {human_pos}/~{human_len} ({per_sec})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    }
}

/// Parse a batch, preserving line order in the result.
fn parse_batch(
    parser: &EntryParser<'_>,
    batch: &[RawLine],
    parallel: bool,
) -> Vec<Result<Option<Extraction>, RecordParseError>> {
    if parallel {
        batch
            .par_iter()
            .map(|line| parser.parse_line(&line.text))
            .collect()
    } else {
        batch.iter().map(|line| parser.parse_line(&line.text)).collect()
    }
}

impl RunReport {
    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }
}

fn write_tally_header(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
        f,
        "{:<20} {:<25} {:<25}",
        "Language", "Data Type", "Total Wikidata Lexemes"
    )?;
    writeln!(f, "{}", "=".repeat(70))
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Processed {} entries in {:.2} seconds",
            HumanCount(self.stats.processed_entries),
            self.stats.elapsed.as_secs_f64()
        )?;

        match &self.outcome {
            RunOutcome::Persisted { files } => {
                writeln!(
                    f,
                    "Found {} words in total",
                    HumanCount(self.stats.unique_words as u64)
                )?;
                for file in files {
                    writeln!(f, "Saved index to {}", file.display())?;
                }
            }
            RunOutcome::Reported { tally } => {
                write_tally_header(f)?;
                for (i, language) in tally.languages().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                        write_tally_header(f)?;
                    }
                    let name = self.registry.name(language).unwrap_or(language);
                    let rows = tally.most_common(language).into_iter().enumerate();
                    for (row, (category, count)) in rows {
                        let label = if row == 0 { name } else { "" };
                        writeln!(f, "{label:<20} {category:<25} {}", HumanCount(count))?;
                    }
                }
            }
        }
        Ok(())
    }
}
