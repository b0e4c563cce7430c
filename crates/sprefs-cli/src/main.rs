//! sprefs: command-line access to an encrypted preference file
//!
//! Commands:
//!   get <key> [--type T]          - read a value (prints the default if unreadable)
//!   put <key> <value> [--type T]  - write a value
//!   put-set <key> <values...>     - write a string set
//!   get-set <key>                 - read a string set
//!   remove <key>                  - delete a value
//!   clear                         - delete everything
//!   contains <key>                - exit 0 if the key has an entry, 1 otherwise
//!   list                          - decrypted values by obfuscated key
//!   dump                          - raw encrypted file contents
//!   obfuscate <key>               - print the storage key for a logical key
//!   config show                   - print the active configuration
//!
//! The passphrase is read from SPREFS_PASSPHRASE, or prompted for.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use sprefs_core::SprefsConfig;
use sprefs_crypto::{device_salt, obfuscate_key, resolve_device_id, KdfParams};
use sprefs_store::{Editor, JsonFileProvider, SecurePreferences, StorageProvider};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "sprefs",
    version,
    about = "Encrypted preference store",
    long_about = "sprefs: read and write typed values in a preference file whose keys are hashed and values encrypted"
)]
struct Cli {
    /// Path to sprefs.toml configuration file
    #[arg(long, short = 'c', env = "SPREFS_CONFIG", default_value = "sprefs.toml")]
    config: PathBuf,

    /// Preference file (overrides config store.path)
    #[arg(long, short = 's', env = "SPREFS_STORE")]
    store: Option<PathBuf>,

    /// Installation identifier used for the salt (overrides config salt.device_id)
    #[arg(long, env = "SPREFS_DEVICE_ID")]
    device_id: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides config log.level
    #[arg(long, env = "SPREFS_LOG")]
    log: Option<String>,

    /// Log format; overrides config log.format
    #[arg(long, env = "SPREFS_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a value
    Get {
        key: String,
        #[arg(long, short = 't', default_value = "string")]
        r#type: ValueType,
        /// Printed when the value is missing or unreadable
        #[arg(long, short = 'd')]
        default: Option<String>,
    },

    /// Write a value
    Put {
        key: String,
        value: String,
        #[arg(long, short = 't', default_value = "string")]
        r#type: ValueType,
        /// Return without waiting for the write to reach disk
        #[arg(long)]
        no_wait: bool,
    },

    /// Write a set of strings
    #[command(name = "put-set")]
    PutSet { key: String, values: Vec<String> },

    /// Read a set of strings, one per line
    #[command(name = "get-set")]
    GetSet { key: String },

    /// Delete a value
    Remove { key: String },

    /// Delete every value
    Clear,

    /// Check whether a key has an entry
    Contains { key: String },

    /// Print every value, decrypted, keyed by obfuscated key
    List,

    /// Print the raw encrypted contents of the preference file
    Dump,

    /// Print the storage key a logical key maps to
    Obfuscate { key: String },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ValueType {
    String,
    Bool,
    Int,
    Long,
    Float,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;

    if let Some(store) = &cli.store {
        config.store.path = store.clone();
    }
    if let Some(device_id) = &cli.device_id {
        config.salt.device_id = Some(device_id.clone());
    }
    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match cli.log_format {
        Some(format) => format,
        None if config.log.format.eq_ignore_ascii_case("json") => LogFormat::Json,
        None => LogFormat::Text,
    };
    init_logging(&level, format);

    match cli.command {
        Commands::Get { key, r#type, default } => {
            cmd_get(&open_store(&config)?, &key, r#type, default.as_deref())
        }
        Commands::Put { key, value, r#type, no_wait } => {
            cmd_put(&open_store(&config)?, &key, &value, r#type, no_wait)
        }
        Commands::PutSet { key, values } => {
            let prefs = open_store(&config)?;
            finish(prefs.edit().put_string_set(&key, values), false)
        }
        Commands::GetSet { key } => {
            let prefs = open_store(&config)?;
            for value in prefs.get_string_set(&key, BTreeSet::new()) {
                println!("{value}");
            }
            Ok(())
        }
        Commands::Remove { key } => finish(open_store(&config)?.edit().remove(&key), false),
        Commands::Clear => finish(open_store(&config)?.edit().clear(), false),
        Commands::Contains { key } => {
            let found = open_store(&config)?.contains(&key);
            println!("{found}");
            if !found {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::List => {
            let all = open_store(&config)?.get_all();
            println!("{}", serde_json::to_string_pretty(&all)?);
            Ok(())
        }
        Commands::Dump => cmd_dump(&config),
        Commands::Obfuscate { key } => {
            println!("{}", obfuscate_key(&key));
            Ok(())
        }
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_config(path: &Path) -> Result<SprefsConfig> {
    SprefsConfig::load(path).with_context(|| format!("loading config: {}", path.display()))
}

fn read_passphrase() -> Result<SecretString> {
    if let Ok(passphrase) = std::env::var("SPREFS_PASSPHRASE") {
        return Ok(SecretString::from(passphrase));
    }
    let passphrase = rpassword::prompt_password("Passphrase: ").context("reading passphrase")?;
    Ok(SecretString::from(passphrase))
}

fn open_store(config: &SprefsConfig) -> Result<SecurePreferences<JsonFileProvider>> {
    let provider = JsonFileProvider::open(&config.store.path)
        .with_context(|| format!("opening store: {}", config.store.path.display()))?;

    let device_id = resolve_device_id(&config.salt);
    let salt = device_salt(device_id.as_deref());
    let passphrase = read_passphrase()?;

    tracing::info!(store = %config.store.path.display(), "deriving store keys");
    SecurePreferences::new(provider, &passphrase, &salt, &KdfParams::from(&config.crypto))
        .context("deriving store keys")
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_get<P: StorageProvider>(
    prefs: &SecurePreferences<P>,
    key: &str,
    value_type: ValueType,
    default: Option<&str>,
) -> Result<()> {
    let value = match value_type {
        ValueType::String => prefs.get_opt::<String>(key),
        ValueType::Bool => prefs.get_opt::<bool>(key).map(|v| v.to_string()),
        ValueType::Int => prefs.get_opt::<i32>(key).map(|v| v.to_string()),
        ValueType::Long => prefs.get_opt::<i64>(key).map(|v| v.to_string()),
        ValueType::Float => prefs.get_opt::<f32>(key).map(|v| v.to_string()),
    };
    match value.as_deref().or(default) {
        Some(value) => {
            println!("{value}");
            Ok(())
        }
        None => anyhow::bail!("no readable value for key: {key}"),
    }
}

fn cmd_put<P: StorageProvider>(
    prefs: &SecurePreferences<P>,
    key: &str,
    value: &str,
    value_type: ValueType,
    no_wait: bool,
) -> Result<()> {
    let editor = prefs.edit();
    let editor = match value_type {
        ValueType::String => editor.put_string(key, value),
        ValueType::Bool => editor.put_bool(key, parse_value(value, "bool")?),
        ValueType::Int => editor.put_i32(key, parse_value(value, "int")?),
        ValueType::Long => editor.put_i64(key, parse_value(value, "long")?),
        ValueType::Float => editor.put_f32(key, parse_value(value, "float")?),
    };
    finish(editor, no_wait)
}

fn parse_value<T: std::str::FromStr>(value: &str, kind: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid {kind} value {value:?}: {e}"))
}

fn finish<P: StorageProvider>(editor: Editor<'_, P>, no_wait: bool) -> Result<()> {
    if no_wait {
        editor.apply();
        return Ok(());
    }
    if !editor.commit() {
        anyhow::bail!("commit failed (see log for details)");
    }
    Ok(())
}

fn cmd_dump(config: &SprefsConfig) -> Result<()> {
    let provider = JsonFileProvider::open(&config.store.path)
        .with_context(|| format!("opening store: {}", config.store.path.display()))?;
    let all = provider.get_all();
    if all.is_empty() {
        println!("EMPTY");
        return Ok(());
    }
    for (key, value) in all {
        println!("prefkey: {key}");
        println!("prefvalue: {}", serde_json::to_string(&value)?);
        println!();
    }
    Ok(())
}

fn cmd_config_show(config: &SprefsConfig, path: &Path) -> Result<()> {
    println!("# config: {}", path.display());
    print!("{}", toml::to_string_pretty(config).context("rendering config")?);
    Ok(())
}
