use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "biosig", about = "Biometric-gated signing keys")]
pub struct Cli {
    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Key alias, overrides the configured one
    #[arg(long, global = true)]
    pub alias: Option<String>,

    /// Current biometric enrollment id, overrides the configured one
    #[arg(long, global = true)]
    pub enrollment: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show authenticator availability and key state
    Status,

    /// Generate a new key pair, replacing any existing one
    CreateKey {
        /// Keep the key usable after the enrolled biometrics change
        #[arg(long)]
        keep_on_enrollment_change: bool,
    },

    /// Sign a payload
    Sign {
        #[arg(long)]
        payload: String,
    },

    /// Verify a base64 signature over a payload
    Verify {
        #[arg(long)]
        payload: String,
        #[arg(long)]
        signature: String,
    },

    /// Report whether the key was lost to a biometric enrollment change
    CheckChanged,

    /// Delete the key pair
    DeleteKey,

    /// Print the public key
    PublicKey {
        /// PEM instead of single-line base64
        #[arg(long)]
        pem: bool,
    },
}
