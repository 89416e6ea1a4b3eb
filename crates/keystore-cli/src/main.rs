//! keystore CLI - save, read and delete secrets in the OS keychain
//!
//! Secrets go to stdout and nothing else does, so output can be piped.
//! Logs and errors are written to stderr.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::debug;

use keystore_core::{
    BackendKind, CredentialError, CredentialKey, CredentialStore, ErrorKind, SettingsManager,
};

/// keystore - store secrets by service and account in the platform keychain
#[derive(Parser, Debug)]
#[command(name = "keystore")]
#[command(version)]
#[command(about = "Store secrets by service and account in the platform keychain")]
struct Args {
    /// Storage backend (overrides settings); only `keychain` persists
    /// between invocations, so it is the only one accepted
    #[arg(long, env = "KEYSTORE_BACKEND")]
    backend: Option<BackendKind>,

    /// Namespace prepended to service names (overrides settings)
    #[arg(long)]
    prefix: Option<String>,

    /// Directory holding settings.json
    #[arg(long)]
    settings_dir: Option<PathBuf>,

    /// Report backend failures from delete instead of ignoring them
    #[arg(long)]
    strict_delete: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct KeyArgs {
    /// Service name
    #[arg(long)]
    service: String,

    /// Account within the service
    #[arg(long)]
    account: String,
}

impl KeyArgs {
    fn key(&self) -> CredentialKey {
        CredentialKey::new(&self.service, &self.account)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save a secret, replacing any existing one
    Save {
        #[command(flatten)]
        key: KeyArgs,

        /// Secret text (prompted for if neither --value nor --hex is given)
        #[arg(long, conflicts_with = "hex")]
        value: Option<OsString>,

        /// Secret bytes as hex
        #[arg(long)]
        hex: Option<String>,
    },
    /// Print a stored secret
    Get {
        #[command(flatten)]
        key: KeyArgs,

        /// Print the raw bytes as hex instead of text
        #[arg(long)]
        raw: bool,
    },
    /// Delete a stored secret (succeeds if absent)
    Delete {
        #[command(flatten)]
        key: KeyArgs,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr so stdout only carries secrets
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let manager = match &args.settings_dir {
        Some(dir) => SettingsManager::open(dir)?,
        None => SettingsManager::in_default_dir()?,
    };

    let mut settings = manager.get().clone();
    if let Some(backend) = args.backend {
        settings.backend = backend;
    }
    if let Some(prefix) = args.prefix.clone() {
        settings.service_prefix = Some(prefix);
    }
    settings.strict_delete |= args.strict_delete;

    if let Err(e) = require_persistent(settings.backend) {
        eprintln!("keystore: {}", e);
        return Ok(ExitCode::from(EXIT_USAGE));
    }

    let store = settings.open_store();
    debug!("Using {} backend", store.backend_name());

    match run(&store, args.command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(CliError::Credential(e)) => {
            eprintln!("keystore: {}", e);
            Ok(ExitCode::from(exit_code(e.kind())))
        }
        Err(CliError::Input(message)) => {
            eprintln!("keystore: {}", message);
            Ok(ExitCode::from(EXIT_USAGE))
        }
        Err(CliError::Io(e)) => Err(e.into()),
    }
}

/// Exit status for unusable command-line input
const EXIT_USAGE: u8 = 64;

/// Failures of a single command
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("{0}")]
    Input(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Each command is a separate process, so the store must outlive it
fn require_persistent(backend: BackendKind) -> Result<(), CliError> {
    match backend {
        BackendKind::Keychain => Ok(()),
        BackendKind::Memory => Err(CliError::Input(
            "the memory backend does not persist between commands; use keychain".to_string(),
        )),
    }
}

async fn run(store: &CredentialStore, command: Command) -> Result<(), CliError> {
    match command {
        Command::Save { key, value, hex } => {
            let key = key.key();
            match (value, hex) {
                (Some(value), _) => store.save_os_str(&key, &value).await?,
                (None, Some(encoded)) => {
                    let bytes = hex::decode(encoded.trim())
                        .map_err(|e| CliError::Input(format!("invalid hex: {}", e)))?;
                    store.save(&key, bytes).await?
                }
                (None, None) => {
                    let secret = zeroize::Zeroizing::new(rpassword::prompt_password(format!(
                        "Secret for {}: ",
                        key
                    ))?);
                    store.save_text(&key, &secret).await?
                }
            }
        }
        Command::Get { key, raw } => {
            let key = key.key();
            let output = if raw {
                let value = store.get(&key).await?;
                zeroize::Zeroizing::new(hex::encode(value.expose()))
            } else {
                zeroize::Zeroizing::new(store.get_text(&key).await?)
            };
            writeln!(std::io::stdout().lock(), "{}", output.as_str())?;
        }
        Command::Delete { key } => store.delete(&key.key()).await?,
    }

    Ok(())
}

/// Exit status for a failed credential operation
fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::StorageFailure => 1,
        ErrorKind::NotFound => 2,
        ErrorKind::UnexpectedData => 3,
        ErrorKind::EncodingFailure => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystore_core::StoreSettings;

    fn memory_store() -> CredentialStore {
        StoreSettings {
            backend: BackendKind::Memory,
            ..StoreSettings::default()
        }
        .open_store()
    }

    fn key_args() -> KeyArgs {
        KeyArgs {
            service: "app.token".to_string(),
            account: "user1".to_string(),
        }
    }

    #[test]
    fn test_parse_save() {
        let args = Args::try_parse_from([
            "keystore", "--backend", "memory", "save", "--service", "svc", "--account", "acct",
            "--value", "abc",
        ])
        .unwrap();

        assert_eq!(args.backend, Some(BackendKind::Memory));
        match args.command {
            Command::Save { key, value, hex } => {
                assert_eq!(key.key(), CredentialKey::new("svc", "acct"));
                assert_eq!(value, Some(OsString::from("abc")));
                assert!(hex.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_value_conflicts_with_hex() {
        let result = Args::try_parse_from([
            "keystore", "save", "--service", "s", "--account", "a", "--value", "x", "--hex", "00",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_exit_codes() {
        let kinds = [
            ErrorKind::NotFound,
            ErrorKind::UnexpectedData,
            ErrorKind::StorageFailure,
            ErrorKind::EncodingFailure,
        ];
        let mut codes: Vec<u8> = kinds.iter().map(|k| exit_code(*k)).collect();
        codes.push(EXIT_USAGE);
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len() + 1);
        assert!(!codes.contains(&0));
        assert_eq!(exit_code(ErrorKind::NotFound), 2);
    }

    #[test]
    fn test_memory_backend_rejected() {
        assert!(require_persistent(BackendKind::Keychain).is_ok());
        assert!(matches!(
            require_persistent(BackendKind::Memory),
            Err(CliError::Input(_))
        ));
    }

    #[tokio::test]
    async fn test_run_save_get_delete() {
        let store = memory_store();

        run(
            &store,
            Command::Save {
                key: key_args(),
                value: None,
                hex: Some("616263".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(store.get_text(&key_args().key()).await.unwrap(), "abc");

        run(&store, Command::Delete { key: key_args() }).await.unwrap();

        let err = run(
            &store,
            Command::Get {
                key: key_args(),
                raw: false,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Credential(CredentialError::NotFound)));
    }

    #[tokio::test]
    async fn test_run_rejects_bad_hex() {
        let store = memory_store();
        let err = run(
            &store,
            Command::Save {
                key: key_args(),
                value: None,
                hex: Some("zz".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Input(_)));
    }
}
