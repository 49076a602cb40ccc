use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use edsign::crypto::keys::Keypair;
use edsign::{store, Password, SignConfig};

#[derive(Parser)]
#[command(name = "edsign")]
#[command(about = "Ed25519 signing and verification for files of any size")]
#[command(version)]
struct Cli {
    /// TOML file overriding KDF and hashing parameters
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Private key password. Unset means the empty password.
    #[arg(long, env = "EDSIGN_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a keypair as <BASENAME>.pub and <BASENAME>.key
    Generate {
        basename: PathBuf,
        #[arg(short, long, default_value = "")]
        comment: String,
    },
    /// Sign a file
    Sign {
        /// Encrypted private key file
        #[arg(short, long)]
        key: PathBuf,
        file: PathBuf,
        /// Signature output; defaults to <FILE>.sig
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Verify a file against a signature
    Verify {
        /// Public key file
        #[arg(short, long)]
        pubkey: PathBuf,
        file: PathBuf,
        signature: PathBuf,
    },
}

fn sig_path_for(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(".sig");
    PathBuf::from(name)
}

fn password(cli_value: Option<String>) -> Password {
    match cli_value {
        Some(pw) => Password::from(pw),
        None => {
            warn!("No password supplied; using the empty password");
            Password::default()
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => SignConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SignConfig::default(),
    };

    match cli.command {
        Commands::Generate { basename, comment } => {
            let pw = password(cli.password);
            let kp = Keypair::generate().context("generating keypair")?;
            let files = store::write_keypair(&kp, &basename, &comment, &pw, &config)
                .with_context(|| format!("writing keypair {}", basename.display()))?;
            println!("{}\n{}", files.public.display(), files.private.display());
            Ok(true)
        }
        Commands::Sign { key, file, output } => {
            let pw = password(cli.password);
            let sk = store::read_private_key(&key, &pw)
                .with_context(|| format!("reading private key {}", key.display()))?;
            drop(pw);

            let sig = store::sign_path(&sk, &file, &config)
                .with_context(|| format!("signing {}", file.display()))?;
            let out = output.unwrap_or_else(|| sig_path_for(&file));
            store::write_signature(&out, &sig, &file.display().to_string())
                .with_context(|| format!("writing signature {}", out.display()))?;
            println!("{}", out.display());
            Ok(true)
        }
        Commands::Verify {
            pubkey,
            file,
            signature,
        } => {
            let pk = store::read_public_key(&pubkey)
                .with_context(|| format!("reading public key {}", pubkey.display()))?;
            let sig = store::read_signature(&signature)
                .with_context(|| format!("reading signature {}", signature.display()))?;
            if !sig.is_key_hint_match(&pk) {
                warn!("Signature key hint does not name this public key");
            }
            let ok = store::verify_path(&pk, &file, &sig, &config)
                .with_context(|| format!("verifying {}", file.display()))?;
            println!("{}: {}", file.display(), if ok { "OK" } else { "FAILED" });
            Ok(ok)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("edsign: {e:#}");
            ExitCode::from(2)
        }
    }
}
