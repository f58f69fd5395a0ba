mod report;
mod settings;

use clap::{Parser, Subcommand};
use postpulse_core::{LeaderboardSort, MediaType, TenantId};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "postpulse-cli")]
#[command(about = "PostPulse command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Sync the tenant's configured channel for the current week
    Sync {
        #[arg(long, env = "POSTPULSE_TENANT")]
        tenant: TenantId,
    },
    /// List the weeks that have stored posts
    Weeks {
        #[arg(long, env = "POSTPULSE_TENANT")]
        tenant: TenantId,
    },
    /// Print a markdown author leaderboard for one week
    Report {
        #[arg(long, env = "POSTPULSE_TENANT")]
        tenant: TenantId,
        /// Week index (defaults to the current week)
        #[arg(long)]
        week: Option<i32>,
        #[arg(long, default_value = "total_views")]
        sort_by: LeaderboardSort,
        /// Only count posts of this media type
        #[arg(long)]
        media_type: Option<MediaType>,
        #[arg(long, default_value_t = 0)]
        min_views: u64,
        #[arg(long, default_value_t = 0)]
        min_avg_views: u64,
        /// Keep only the first N authors (0 keeps all)
        #[arg(long, default_value_t = 0)]
        top: usize,
    },
    /// Per-tenant settings
    Settings {
        #[command(subcommand)]
        command: settings::SettingsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("postpulse-cli: run with --help to list commands");
        return Ok(());
    };

    let config = postpulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = postpulse_db::PoolConfig::from_app_config(&config);
    let pool = postpulse_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            postpulse_db::ping(&pool).await?;
            println!("database ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = postpulse_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Sync { tenant } => run_sync(pool, &config, &tenant).await?,
        Commands::Weeks { tenant } => report::run_weeks(&pool, &tenant).await?,
        Commands::Report {
            tenant,
            week,
            sort_by,
            media_type,
            min_views,
            min_avg_views,
            top,
        } => {
            let options = postpulse_core::LeaderboardOptions {
                sort: sort_by,
                media_type,
                min_views,
                min_avg_views,
                top_n: top,
            };
            report::run_report(&pool, &tenant, week, &options).await?;
        }
        Commands::Settings { command } => settings::run(&pool, command).await?,
    }

    Ok(())
}

async fn run_sync(
    pool: sqlx::PgPool,
    config: &postpulse_core::AppConfig,
    tenant: &TenantId,
) -> anyhow::Result<()> {
    let service = postpulse_sync::SyncService::new(pool, config)?;
    tracing::info!(tenant = %tenant, "starting sync");
    let report = service.run(tenant, "cli").await?;
    let outcome = &report.outcome;

    println!(
        "sync {}: {} new, {} updated, {} unchanged, {} skipped, {} failed, {} pruned ({} links in {} messages)",
        report.run_public_id,
        outcome.synced_count,
        outcome.updated,
        outcome.unchanged,
        outcome.skipped,
        outcome.failed,
        outcome.pruned,
        outcome.unique_links,
        outcome.scanned_messages,
    );
    Ok(())
}
