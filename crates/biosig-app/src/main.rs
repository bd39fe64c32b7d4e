mod cli;
mod commands;
mod console;
mod setup;

use anyhow::Result;
use biosig_core::config::AppConfig;
use biosig_core::lifecycle;
use clap::Parser;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    lifecycle::init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::load_or_default(cli.config.as_deref());
    if let Some(alias) = cli.alias {
        config.keystore.alias = alias;
    }
    if let Some(enrollment) = cli.enrollment {
        config.authenticator.enrollment_id = enrollment;
    }

    let ctx = setup::build_context(config)?;

    let succeeded = match cli.command {
        Commands::Status => commands::status(&ctx)?,
        Commands::CreateKey {
            keep_on_enrollment_change,
        } => commands::create_key(&ctx, keep_on_enrollment_change).await?,
        Commands::Sign { payload } => commands::sign(&ctx, payload).await?,
        Commands::Verify { payload, signature } => {
            commands::verify(&ctx, payload, signature).await?
        }
        Commands::CheckChanged => commands::check_changed(&ctx)?,
        Commands::DeleteKey => commands::delete_key(&ctx)?,
        Commands::PublicKey { pem } => commands::public_key(&ctx, pem)?,
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
