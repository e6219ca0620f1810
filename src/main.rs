use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
mod auth;
use keyseal::{
    Key, PassphraseKeyStore, Storage, default_key_dir, format, key_file_storage, peek_address,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

#[derive(Debug, Parser)]
#[command(name = "keyseal")]
#[command(
    version,
    about = "Passphrase-protected private key files (scrypt + AES-128-CTR)."
)]
struct Cli {
    /// Directory for key files created without --out
    #[arg(long, global = true, value_name = "DIR", env = "KEYSEAL_DIR")]
    dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(
        long,
        global = true,
        env = "KEYSEAL_LOG",
        default_value = "warn",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        ignore_case = true
    )]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generates a new key and seals it under a passphrase
    New {
        /// Where to write the key file (default: <dir>/<address>.json)
        #[arg(long, short, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Seals an existing private key under a passphrase
    Import {
        /// Hex-encoded 32-byte private key
        #[arg(env = "KEYSEAL_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,

        #[arg(long, short, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Shows version and address of a key file without unlocking it
    #[command(arg_required_else_help = true)]
    Inspect { file: PathBuf },

    /// Decrypts a key file and prints its address
    #[command(arg_required_else_help = true)]
    Unlock {
        file: PathBuf,

        /// Also print the private key
        #[arg(long, default_value_t = false)]
        reveal: bool,
    },

    /// Re-encrypts a key file under a new passphrase
    #[command(arg_required_else_help = true)]
    Passwd { file: PathBuf },
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level.to_lowercase())
            .with_context(|| format!("invalid log level: {log_level}"))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn resolve_out(out: Option<PathBuf>, dir: Option<PathBuf>, key: &Key) -> Result<Storage> {
    match out {
        Some(p) => Ok(Storage::new(p)),
        None => {
            let dir = match dir {
                Some(d) => d,
                None => default_key_dir()?,
            };
            Ok(key_file_storage(dir, key.address()))
        }
    }
}

fn seal_and_write(key: &Key, storage: &Storage) -> Result<()> {
    if storage.exists() {
        anyhow::bail!("key file already exists: {}", storage.path().display());
    }
    let passphrase = auth::read_new_passphrase_with_confirmation(auth::PASSPHRASE_ENV)?;

    let sealed = PassphraseKeyStore::default()
        .encrypt_key(key, passphrase.as_bytes())
        .context("failed to encrypt key")?;
    drop(passphrase);

    storage.create(&sealed)?;
    info!(address = %key.address(), path = %storage.path().display(), "key file written");

    println!("address: {}", key.address());
    println!("key file: {}", storage.path().display());
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    match args.command {
        Commands::New { out } => {
            let key = Key::generate()?;
            let storage = resolve_out(out, args.dir, &key)?;
            seal_and_write(&key, &storage)?;
        }
        Commands::Import { private_key, out } => {
            let private_key = Zeroizing::new(private_key);
            let key = Key::from_private_key_hex(&private_key).context("invalid private key")?;
            let storage = resolve_out(out, args.dir, &key)?;
            seal_and_write(&key, &storage)?;
        }
        Commands::Inspect { file } => {
            let data = Storage::new(file).load()?;
            let envelope = format::decode(&data)?;
            println!("version: {}", envelope.version);
            println!("address: {}", envelope.address);
        }
        Commands::Unlock { file, reveal } => {
            let data = Storage::new(file).load()?;
            let passphrase = auth::read_passphrase("Passphrase: ")?;
            let key = PassphraseKeyStore::default().decrypt_key(&data, passphrase.as_bytes())?;
            drop(passphrase);

            println!("address: {}", key.address());
            if reveal {
                println!("private key: {}", key.private_key_hex().as_str());
            }
        }
        Commands::Passwd { file } => {
            let storage = Storage::new(file);
            let data = storage.load()?;

            let old = auth::read_passphrase("Current passphrase: ")?;
            let new = auth::read_new_passphrase_with_confirmation(auth::NEW_PASSPHRASE_ENV)?;

            let sealed = PassphraseKeyStore::default().change_passphrase(
                &data,
                old.as_bytes(),
                new.as_bytes(),
            )?;
            storage.save(&sealed)?;
            println!("passphrase changed for {}", peek_address(&sealed)?);
        }
    }

    Ok(())
}
