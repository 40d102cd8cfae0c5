//! Owns the [`WordIndex`] for a run and persists it as JSON.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

use crate::error::PersistenceError;
use crate::index::{LanguageMap, WordIndex};
use crate::parser::TranslationEntry;
use crate::registry::LanguageRegistry;

static EMPTY: LanguageMap = BTreeMap::new();

pub struct IndexStore {
    index: WordIndex,
    registry: Arc<LanguageRegistry>,
}

impl IndexStore {
    pub fn new(registry: Arc<LanguageRegistry>) -> Self {
        Self {
            index: WordIndex::new(),
            registry,
        }
    }

    pub fn index(&self) -> &WordIndex {
        &self.index
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Translation aggregator fold.
    pub fn insert(&mut self, entry: TranslationEntry) {
        self.index.insert(entry);
    }

    /// Languages, categories and translations for `word` (case-insensitive);
    /// empty when the word is unknown.
    pub fn lookup(&self, word: &str) -> &LanguageMap {
        self.index.get(&word.to_lowercase()).unwrap_or(&EMPTY)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Write the whole index to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<PathBuf, PersistenceError> {
        let path = path.as_ref();
        info!("saving complete index to {}", path.display());
        write_json(path, &self.index)?;
        Ok(path.to_path_buf())
    }

    /// Write only `iso`'s entries to `<dir of path>/<language dir>/<file name>`.
    ///
    /// Returns `Ok(None)` without touching the filesystem when `iso` is not in
    /// the registry.
    pub fn save_language(
        &self,
        path: impl AsRef<Path>,
        iso: &str,
    ) -> Result<Option<PathBuf>, PersistenceError> {
        let Some(scoped_dir) = self.registry.scoped_dir(iso) else {
            warn!("unknown ISO code {iso}, skipping save");
            return Ok(None);
        };
        let path = path.as_ref();
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .unwrap_or_else(|| OsStr::new("index.json"));
        let target = parent.join(scoped_dir).join(file_name);

        info!(
            "saving {} index to {}",
            self.registry.name(iso).unwrap_or(iso),
            target.display()
        );
        write_json(&target, &self.index.filter_language(iso))?;
        Ok(Some(target))
    }

    /// Replace the index with the contents of `path`.
    ///
    /// On any failure the store is left empty.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        info!("loading index from {}", path.display());
        self.index = WordIndex::new();
        let loaded = read_json(path).inspect_err(|e| error!("{e}"))?;
        self.index = loaded;
        Ok(())
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let write_err = |source: io::Error| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(write_err)?;

    let mut temp = NamedTempFile::new_in(parent).map_err(write_err)?;
    {
        let mut writer = BufWriter::new(&mut temp);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|source| {
            PersistenceError::Encode {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writer.write_all(b"\n").map_err(write_err)?;
        writer.flush().map_err(write_err)?;
    }
    temp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn read_json(path: &Path) -> Result<WordIndex, PersistenceError> {
    let file = File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => PersistenceError::NotFound {
            path: path.to_path_buf(),
        },
        _ => PersistenceError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| {
        if source.is_io() {
            PersistenceError::Read {
                path: path.to_path_buf(),
                source: source.into(),
            }
        } else {
            PersistenceError::Corrupt {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}
