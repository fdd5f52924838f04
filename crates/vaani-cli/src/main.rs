//! Binary entry point: flag parsing, logging setup, handler dispatch.
//!
//! Command dispatch routes to handlers; narration rules (budgets,
//! fallback, session degradation) live in the vaani library.

use clap::Parser;

use vaani_cli::{CacheCommand, Cli, Commands, ModelsCommand, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // --verbose wins over RUST_LOG
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("vaani=debug,vaani_cli=debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let Some(command) = cli.command else {
        // Bare invocation: print help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Say {
            text,
            language,
            endpoint,
            budget_ms,
            no_cache,
            cache_dir,
            model_dir,
        } => {
            let args = handlers::say::SayArgs {
                text,
                language,
                endpoint,
                budget_ms,
                no_cache,
                cache_dir,
                model_dir,
            };
            handlers::say::execute(args).await?;
        }
        Commands::Voices { model_dir } => {
            handlers::voices::execute(model_dir)?;
        }
        Commands::Models { command } => match command {
            ModelsCommand::Ensure {
                language,
                model_dir,
            } => {
                handlers::models::ensure(language, model_dir).await?;
            }
            ModelsCommand::Status { model_dir } => {
                handlers::models::status(model_dir)?;
            }
        },
        Commands::Cache { command } => match command {
            CacheCommand::Status { cache_dir } => {
                handlers::cache::status(cache_dir).await?;
            }
            CacheCommand::Clear { cache_dir } => {
                handlers::cache::clear(cache_dir).await?;
            }
        },
    }

    Ok(())
}
