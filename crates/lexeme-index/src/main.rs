use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use lexeme_db::{
    DEFAULT_BATCH_SIZE, DiagnosticLog, IndexStore, LanguageRegistry, ParseMode, Pipeline,
    RunConfig, tables,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use lexeme_index::{AppState, router};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_DUMP: &str = "latest-lexemes.json.bz2";
const DEFAULT_OUTPUT_DIR: &str = "lexeme_index_export";
const DEFAULT_LOG_FILE: &str = "lexeme_processor.log";
const ALL_LANGUAGES: &str = "all";

#[derive(Parser)]
#[command(
    name = "lexeme-index",
    version,
    about = "Build and query translation indexes from Wikidata lexeme dumps"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream a lexeme dump into per-language index files or a category tally.
    Parse(ParseArgs),
    /// Print the translations stored for one word.
    Lookup(LookupArgs),
    /// Serve an index over HTTP.
    Serve(ServeArgs),
}

#[derive(Args)]
struct ParseArgs {
    #[arg(long, env = "LEXEME_DUMP", default_value = DEFAULT_DUMP)]
    dump: PathBuf,
    #[arg(long, env = "LEXEME_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
    /// Language name or ISO code, or "all".
    #[arg(long, env = "LEXEME_LANGUAGE", default_value = ALL_LANGUAGES)]
    language: String,
    #[arg(long, value_enum, default_value_t = Mode::Translations)]
    mode: Mode,
    #[arg(long, env = "LEXEME_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
    #[arg(long, env = "LEXEME_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
    /// Replace the bundled language table.
    #[arg(long, env = "LEXEME_LANGUAGE_METADATA")]
    language_metadata: Option<PathBuf>,
    /// Replace the bundled lexical category table.
    #[arg(long, env = "LEXEME_CATEGORY_METADATA")]
    category_metadata: Option<PathBuf>,
    /// Also write the combined index for every language.
    #[arg(long)]
    combined: bool,
    #[arg(long)]
    no_progress: bool,
    /// Parse on the calling thread only.
    #[arg(long)]
    sequential: bool,
}

#[derive(Args)]
struct LookupArgs {
    #[arg(long, env = "LEXEME_INDEX")]
    index: PathBuf,
    word: String,
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "LEXEME_INDEX")]
    index: PathBuf,
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    #[arg(long)]
    no_cache: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Translations,
    Total,
}

impl From<Mode> for ParseMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Translations => ParseMode::Translations,
            Mode::Total => ParseMode::Total,
        }
    }
}

fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Command::Parse(args) => parse(args),
        Command::Lookup(args) => {
            init_tracing();
            lookup(args)
        }
        Command::Serve(args) => {
            init_tracing();
            serve(args)
        }
    }
}

fn parse(args: ParseArgs) -> anyhow::Result<()> {
    let log = DiagnosticLog::open(&args.log_file, Level::INFO)
        .with_context(|| format!("opening log file {}", args.log_file.display()))?;
    let (languages, categories) = log.in_scope(|| {
        anyhow::Ok((
            tables::language_table(args.language_metadata.as_deref())?,
            tables::category_table(args.category_metadata.as_deref())?,
        ))
    })?;

    let language = Some(args.language.trim())
        .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case(ALL_LANGUAGES))
        .map(str::to_string);
    match &language {
        Some(l) => println!("Processing lexemes for {l}..."),
        None => println!("Processing lexemes for all languages..."),
    }

    let config = RunConfig {
        dump_path: args.dump,
        output_dir: args.output_dir,
        batch_size: args.batch_size,
        language,
        mode: args.mode.into(),
        progress: !args.no_progress,
        parallel: !args.sequential,
        save_combined: args.combined,
    };
    let mut pipeline = Pipeline::new(config, &languages, categories).with_log(log);
    let report = pipeline.run()?;
    print!("{report}");
    Ok(())
}

fn load_store(path: &Path) -> anyhow::Result<IndexStore> {
    let start = Instant::now();
    let mut store = IndexStore::new(Arc::new(LanguageRegistry::empty()));
    store
        .load(path)
        .with_context(|| format!("loading index {}", path.display()))?;
    info!(
        "index loaded in {} ms ({} words)",
        start.elapsed().as_millis(),
        store.len()
    );
    Ok(store)
}

fn lookup(args: LookupArgs) -> anyhow::Result<()> {
    let store = load_store(&args.index)?;
    let translations = store.lookup(&args.word);
    if translations.is_empty() {
        info!("no translations for {:?}", args.word);
    }
    println!("{}", serde_json::to_string_pretty(translations)?);
    Ok(())
}

#[tokio::main]
async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("binding to {}:{}", args.host, args.port);
    if args.no_cache {
        info!("cache headers disabled");
    }

    let state = AppState {
        store: Arc::new(load_store(&args.index)?),
        disable_cache: args.no_cache,
    };
    let app = router(state).layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("invalid listen address")?;
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();
}
