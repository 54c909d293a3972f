pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod search;
pub mod services;
pub mod state;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{CacheCommands, Cli, Commands};
pub use config::Config;
pub use state::SharedState;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    init_logging(&config);

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Search {
            query,
            prefectures,
            years,
            types,
            photos,
            videos,
            session,
            page,
        } => {
            cli::cmd_search(
                config,
                &query,
                prefectures,
                years,
                types,
                photos,
                videos,
                session,
                page,
            )
            .await
        }

        Commands::Near {
            lat,
            lng,
            radius,
            photos,
            videos,
            page,
        } => cli::cmd_near(config, lat, lng, radius, photos, videos, page).await,

        Commands::Architect { slug, page } => cli::cmd_architect(config, &slug, page).await,

        Commands::Building { slug, lang, json } => {
            cli::cmd_building(config, &slug, lang, json).await
        }

        Commands::Popular {
            page,
            limit,
            query,
            search_type,
            json,
        } => cli::cmd_popular(config, page, limit, query.as_deref(), search_type, json).await,

        Commands::Cache { command } => match command {
            CacheCommands::Clear => cli::cmd_cache_clear(config).await,
            CacheCommands::Stats { json } => cli::cmd_cache_stats(config, json).await,
        },

        Commands::Import { path } => cli::cmd_import(&config, &path).await,

        Commands::Prune { days } => cli::cmd_prune(config, days).await,

        Commands::Init => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides `general.log_level`.
fn init_logging(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Logs go to stderr so command output stays pipeable.
    if config.general.log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    debug!(
        log_level = %config.general.log_level,
        log_format = %config.general.log_format,
        "Logging initialized"
    );
}
