// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use lexicat::app_config::{self, Config, ScanMode, StoreDriverKind};
use lexicat::batch::{self, BatchReport};
use lexicat::cache::DatabaseSharedCache;
use lexicat::catalog::{Catalog, OpenOptions};
use lexicat::database::Language;
use lexicat::language_utils;
use lexicat::scanner::ScanOptions;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for StoreDriverKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliStoreDriver {
    Json,
    CodeArray,
}

impl From<CliStoreDriver> for StoreDriverKind {
    fn from(cli_driver: CliStoreDriver) -> Self {
        match cli_driver {
            CliStoreDriver::Json => StoreDriverKind::Json,
            CliStoreDriver::CodeArray => StoreDriverKind::CodeArray,
        }
    }
}

/// CLI Wrapper for ScanMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliScanMode {
    AutoCreate,
    InsertThenExport,
}

impl From<CliScanMode> for ScanMode {
    fn from(cli_mode: CliScanMode) -> Self {
        match cli_mode {
            CliScanMode::AutoCreate => ScanMode::AutoCreate,
            CliScanMode::InsertThenExport => ScanMode::InsertThenExport,
        }
    }
}

/// Scope and locale selection shared by export, import and sync
#[derive(Args, Debug, Clone, Default)]
struct SelectionArgs {
    /// Comma-separated scopes (default: every configured scope)
    #[arg(short, long, value_delimiter = ',')]
    scope: Vec<String>,

    /// Process every configured scope
    #[arg(long)]
    all: bool,

    /// Comma-separated locales replacing the active set for this run
    #[arg(long, value_delimiter = ',')]
    locales: Vec<String>,
}

impl SelectionArgs {
    fn locales(&self) -> Option<&[String]> {
        if self.locales.is_empty() {
            None
        } else {
            Some(self.locales.as_slice())
        }
    }
}

/// Key discovery options shared by scan and sync
#[derive(Args, Debug, Clone)]
struct DiscoveryArgs {
    /// Directories to scan (default: configured scan paths)
    #[arg(long = "scan-path", value_name = "DIR")]
    scan_paths: Vec<PathBuf>,

    /// Comma-separated file extensions (default: configured extensions)
    #[arg(long, value_delimiter = ',', value_name = "EXT")]
    ext: Vec<String>,

    /// Comma-separated directory names or relative paths to skip
    #[arg(long, value_delimiter = ',', value_name = "DIR")]
    exclude: Vec<String>,

    /// Extract and report only, register nothing
    #[arg(long)]
    dry: bool,

    /// How new keys are registered
    #[arg(long, value_enum)]
    mode: Option<CliScanMode>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

impl DiscoveryArgs {
    /// Overlay the command-line overrides on configured scan options
    fn apply(&self, root: &Path, options: &mut ScanOptions) {
        if !self.scan_paths.is_empty() {
            options.roots = self.scan_paths.iter().map(|p| root.join(p)).collect();
        }
        if !self.ext.is_empty() {
            options.extensions = self.ext.clone();
        }
        if !self.exclude.is_empty() {
            options.exclude = self.exclude.clone();
        }
        if let Some(mode) = &self.mode {
            options.mode = mode.clone().into();
        }
        options.dry = self.dry;
        options.progress = !self.no_progress;
    }
}

#[derive(Subcommand, Debug)]
enum LanguageCommand {
    /// List registry languages
    List,

    /// Add or rename a language in the record store
    Add {
        /// Locale code (e.g., 'en', 'uz')
        code: String,
        /// Display name (default: ISO 639 name)
        name: Option<String>,
    },

    /// Mark a language active
    Activate { code: String },

    /// Mark a language inactive
    Deactivate { code: String },
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover keys in source files and register the new ones
    Scan {
        /// Scope new keys are registered under
        #[arg(short, long)]
        scope: Option<String>,

        #[command(flatten)]
        discovery: DiscoveryArgs,
    },

    /// Write catalog files from the record store
    Export {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Load catalog files into the record store
    Import {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Truncate keys and translations before the first scope
        #[arg(long)]
        truncate: bool,
    },

    /// Scan, then export
    Sync {
        /// Scope new keys are registered under
        #[arg(long)]
        scan_scope: Option<String>,

        #[command(flatten)]
        discovery: DiscoveryArgs,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Import every scope when the record store is empty
    Seed,

    /// Resolve a key for a locale
    Resolve {
        key: String,
        #[arg(short, long, default_value = "")]
        scope: String,
        #[arg(short, long)]
        locale: String,
        /// Do not create missing keys or write files
        #[arg(long)]
        read_only: bool,
    },

    /// Store a translation for a key
    Translate {
        key: String,
        value: String,
        #[arg(short, long, default_value = "")]
        scope: String,
        #[arg(short, long)]
        locale: String,
    },

    /// Delete a key and its translations
    Delete {
        key: String,
        #[arg(short, long, default_value = "")]
        scope: String,
    },

    /// Manage the language registry
    Languages {
        #[command(subcommand)]
        action: LanguageCommand,
    },

    /// Show record store statistics
    Stats,

    /// Remove expired entries from the database-backed shared cache
    PurgeCache,

    /// Generate shell completions for lexicat
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// lexicat - multi-locale text catalog
///
/// Keeps scoped catalog files and a SQLite record store of keys and
/// translations in sync across locales.
#[derive(Parser, Debug)]
#[command(name = "lexicat")]
#[command(version)]
#[command(about = "Multi-locale text catalog")]
#[command(long_about = "lexicat keeps per-scope catalog files and a record store of keys and translations in sync.

EXAMPLES:
    lexicat scan --scope app                    # Register keys found in source files
    lexicat export --all                        # Write every scope for every active locale
    lexicat export -s app,admin --locales uz    # Write two scopes for 'uz' only
    lexicat import --all --truncate             # Rebuild the record store from files
    lexicat sync --dry                          # Report keys without registering them
    lexicat scan --ext php,vue --exclude vendor # Narrow the scan
    lexicat resolve Hello -l uz                 # Look up a key
    lexicat translate Hello Salom -l uz         # Store a translation
    lexicat completions bash > lexicat.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in lexicat.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "lexicat.json", global = true)]
    config_path: String,

    /// Project root that relative paths are resolved against
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// File store driver override
    #[arg(long, value_enum, global = true)]
    driver: Option<CliStoreDriver>,

    /// File store base directory override
    #[arg(long, global = true)]
    path: Option<PathBuf>,

    /// Record store database override
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Set logging level
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Marker and color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, emoji) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is applied once config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "lexicat", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let options = OpenOptions {
        driver: cli.driver.clone().map(Into::into),
        store_path: cli.path.clone(),
        database_path: cli.database.clone(),
    };

    match cli.command {
        Commands::Stats => {
            let db = Catalog::connect(&config, &cli.root, &options)?;
            let stats = db.stats().context("Failed to read record store statistics")?;
            println!("{}", stats);
            println!("Database: {:?}", db.path());
            Ok(())
        }
        Commands::PurgeCache => {
            let db = Catalog::connect(&config, &cli.root, &options)?;
            let purged = DatabaseSharedCache::new(db).purge_expired()?;
            info!("Purged {} expired shared cache entries", purged);
            Ok(())
        }
        command => {
            let catalog = Catalog::open(config, &cli.root, options)?;
            run_command(&catalog, &cli.root, command)
        }
    }
}

/// Load the config file, creating a default one when it is missing
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let config_path = Path::new(&cli.config_path);

    let mut config = match Config::load(config_path)? {
        Some(config) => config,
        None => {
            warn!("Config file not found at '{}', creating default config.", cli.config_path);
            let config = Config::default();
            config
                .save(config_path)
                .context(format!("Failed to write default config to file: {}", cli.config_path))?;
            config
        }
    };

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    Ok(config)
}

fn run_command(catalog: &Catalog, root: &Path, command: Commands) -> Result<()> {
    match command {
        Commands::Scan { scope, discovery } => {
            let options = scan_options(catalog, root, scope.as_deref(), &discovery);
            let report = batch::scan(catalog, &options)?;
            info!(
                "Scan finished: {} files, {} keys, {} inserted, {} skipped",
                report.files_scanned, report.keys_found, report.inserted, report.skipped
            );
            if report.exported == Some(false) {
                return Err(anyhow!("Keys were inserted but the export failed"));
            }
            Ok(())
        }
        Commands::Export { selection } => {
            let scopes = batch::resolve_scopes(catalog, &selection.scope, selection.all);
            let report = batch::export(catalog, &scopes, selection.locales());
            finish_batch("Export", &report)
        }
        Commands::Import { selection, truncate } => {
            let scopes = batch::resolve_scopes(catalog, &selection.scope, selection.all);
            let report = batch::import(catalog, &scopes, selection.locales(), truncate);
            finish_batch("Import", &report)
        }
        Commands::Sync {
            scan_scope,
            discovery,
            selection,
        } => {
            let options = scan_options(catalog, root, scan_scope.as_deref(), &discovery);
            let scopes = batch::resolve_scopes(catalog, &selection.scope, selection.all);
            let report = batch::sync(catalog, &options, &scopes, selection.locales())?;
            info!(
                "Scan: {} keys found, {} inserted",
                report.scan.keys_found, report.scan.inserted
            );
            match &report.export {
                Some(export) => finish_batch("Export", export),
                None => Ok(()),
            }
        }
        Commands::Seed => match batch::restore(catalog) {
            Some(report) => finish_batch("Restore", &report),
            None => {
                info!("Record store already populated or restore disabled, nothing to do");
                Ok(())
            }
        },
        Commands::Resolve {
            key,
            scope,
            locale,
            read_only,
        } => {
            let mut ctx = catalog.context();
            let value = if read_only {
                ctx.resolve_read_only(&key, &scope, &locale)
            } else {
                ctx.resolve(&key, &scope, &locale)
            };
            println!("{}", value);
            Ok(())
        }
        Commands::Translate {
            key,
            value,
            scope,
            locale,
        } => {
            let locale = language_utils::normalize_locale(&locale);
            if !catalog.registry().is_allowed(&locale) {
                warn!("Locale '{}' is not active; the catalog file will not be updated", locale);
            }
            let written = catalog.context().translate(&key, &scope, &locale, &value)?;
            if !written {
                warn!("Translation stored but the catalog file was not updated");
            }
            Ok(())
        }
        Commands::Delete { key, scope } => {
            if catalog.context().delete(&scope, &key)? {
                info!("Deleted '{}'", key);
            } else {
                warn!("Key '{}' not found", key);
            }
            Ok(())
        }
        Commands::Languages { action } => run_languages(catalog, action),
        Commands::Stats | Commands::PurgeCache | Commands::Completions { .. } => Ok(()),
    }
}

fn run_languages(catalog: &Catalog, action: LanguageCommand) -> Result<()> {
    let records = catalog.records();

    match action {
        LanguageCommand::List => {
            let active = catalog.registry().active_codes();
            let stored = records.all_languages()?;

            for code in &active {
                let name = stored
                    .iter()
                    .find(|l| &l.code == code)
                    .map(|l| l.name.clone())
                    .or_else(|| language_utils::display_name(code))
                    .unwrap_or_else(|| code.clone());
                println!("* {:<8} {}", code, name);
            }
            for language in stored.iter().filter(|l| !active.contains(&l.code)) {
                println!("  {:<8} {}", language.code, language.name);
            }
            Ok(())
        }
        LanguageCommand::Add { code, name } => {
            let code = language_utils::normalize_locale(&code);
            if code.is_empty() {
                return Err(anyhow!("Invalid locale code"));
            }
            let name = name
                .or_else(|| language_utils::display_name(&code))
                .unwrap_or_else(|| code.clone());
            records.upsert_language(&Language::new(&code, &name))?;
            info!("Language '{}' ({}) saved", code, name);
            Ok(())
        }
        LanguageCommand::Activate { code } => set_active(catalog, &code, true),
        LanguageCommand::Deactivate { code } => set_active(catalog, &code, false),
    }
}

fn set_active(catalog: &Catalog, code: &str, active: bool) -> Result<()> {
    let code = language_utils::normalize_locale(code);
    if !catalog.records().set_language_active(&code, active)? {
        return Err(anyhow!("Language '{}' is not in the record store", code));
    }
    info!("Language '{}' {}", code, if active { "activated" } else { "deactivated" });
    Ok(())
}

fn scan_options(catalog: &Catalog, root: &Path, scope: Option<&str>, args: &DiscoveryArgs) -> ScanOptions {
    let config = catalog.config();
    let scope = scope.unwrap_or(&config.default_scope);
    let mut options = ScanOptions::from_config(&config.scan, root, scope);

    args.apply(root, &mut options);
    options
}

fn finish_batch(label: &str, report: &BatchReport) -> Result<()> {
    for (scope, outcome) in &report.scopes {
        if outcome.success() {
            info!("{} {}: ok ({} keys)", label, scope, outcome.keys);
        } else {
            warn!(
                "{} {}: failed for {:?}{}",
                label,
                scope,
                outcome.failed_locales(),
                outcome.error.as_deref().map(|e| format!(" ({})", e)).unwrap_or_default()
            );
        }
    }

    if report.success() {
        Ok(())
    } else {
        Err(anyhow!("{} failed for scopes: {}", label, report.failed_scopes().join(", ")))
    }
}
