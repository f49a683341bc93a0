//! CLI administration tool for link-router.
//!
//! Provides link-owner operations (links, targeting rules, experiments),
//! destination checks, statistics and database diagnostics without going
//! through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create a link with a custom alias
//! cargo run --bin admin -- link create https://example.com/page --alias promo
//!
//! # Show a link with its targets, experiment and click totals
//! cargo run --bin admin -- link show promo
//!
//! # Send German visitors elsewhere
//! cargo run --bin admin -- target add --link 1 --type COUNTRY --value de --url https://example.de/
//!
//! # Run an experiment
//! cargo run --bin admin -- experiment create --link 1 --name headline --plan PRO
//! cargo run --bin admin -- variant add --test 1 --name B --url https://example.com/b --weight 50 --plan PRO
//!
//! # Check a URL against the SSRF rules (no database needed)
//! cargo run --bin admin -- check-url http://169.254.169.254/
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required except for `check-url`): PostgreSQL connection string
//! - `BASE_URL` (optional): public origin used to print short URLs

use link_router::application::services::{
    AddTarget, AddVariant, CreateLink, ExperimentService, LinkService, TargetingService,
    short_url,
};
use link_router::domain::entities::{CloakMode, CloakSettings, Link, TargetType};
use link_router::domain::plan::Plan;
use link_router::domain::repositories::{AbTestRepository, ClickRepository, TargetRepository};
use link_router::infrastructure::persistence::{
    PgAbTestRepository, PgClickRepository, PgLinkRepository, PgTargetRepository,
};
use link_router::utils::code_generator::DEFAULT_CODE_LENGTH;
use link_router::utils::ssrf_guard::{validate_for_ssrf, validate_webhook_url};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing link-router.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage short links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Manage targeting rules
    Target {
        #[command(subcommand)]
        action: TargetAction,
    },

    /// Manage A/B experiments
    Experiment {
        #[command(subcommand)]
        action: ExperimentAction,
    },

    /// Manage experiment variants
    Variant {
        #[command(subcommand)]
        action: VariantAction,
    },

    /// Check a URL against the SSRF rules
    CheckUrl {
        url: String,

        /// Apply the stricter webhook rules
        #[arg(long)]
        webhook: bool,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum LinkAction {
    /// Show a link by short code or alias
    Show { code: String },

    /// Create a new short link
    Create {
        url: String,

        #[arg(long)]
        alias: Option<String>,

        #[arg(long)]
        owner: Option<i64>,

        /// Cloak mode: IFRAME, JAVASCRIPT or META_REFRESH
        #[arg(long)]
        cloak: Option<CloakMode>,

        /// Page title for cloaked links
        #[arg(long, requires = "cloak")]
        title: Option<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TargetAction {
    /// Add a targeting rule to a link
    Add {
        #[arg(long)]
        link: i64,

        /// COUNTRY, DEVICE, OS, BROWSER or LANGUAGE
        #[arg(long = "type")]
        target_type: TargetType,

        #[arg(long)]
        value: String,

        #[arg(long)]
        url: String,

        #[arg(long, default_value_t = 0)]
        priority: i32,
    },
}

#[derive(Subcommand)]
enum ExperimentAction {
    /// Start an experiment on a link
    Create {
        #[arg(long)]
        link: i64,

        #[arg(long)]
        name: String,

        /// Owner plan: FREE, STARTER, PRO, BUSINESS or ENTERPRISE
        #[arg(long, default_value = "FREE")]
        plan: Plan,
    },
}

#[derive(Subcommand)]
enum VariantAction {
    /// Add a weighted variant to an experiment
    Add {
        #[arg(long)]
        test: i64,

        #[arg(long)]
        name: String,

        #[arg(long)]
        url: String,

        #[arg(long, allow_negative_numbers = true)]
        weight: i64,

        #[arg(long, default_value = "FREE")]
        plan: Plan,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Link { action } => handle_link_action(action, connect().await?).await?,
        Commands::Target { action } => handle_target_action(action, connect().await?).await?,
        Commands::Experiment { action } => {
            handle_experiment_action(action, connect().await?).await?
        }
        Commands::Variant { action } => handle_variant_action(action, connect().await?).await?,
        Commands::CheckUrl { url, webhook } => check_url(&url, webhook)?,
        Commands::Stats => handle_stats(&*connect().await?).await?,
        Commands::Db { action } => handle_db_action(action, &*connect().await?).await?,
    }

    Ok(())
}

async fn connect() -> Result<Arc<PgPool>> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    Ok(Arc::new(pool))
}

fn base_url() -> String {
    std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

async fn handle_link_action(action: LinkAction, pool: Arc<PgPool>) -> Result<()> {
    let links = Arc::new(PgLinkRepository::new(pool.clone()));

    match action {
        LinkAction::Show { code } => show_link(links, pool, &code).await?,
        LinkAction::Create {
            url,
            alias,
            owner,
            cloak,
            title,
            yes,
        } => {
            let request = CreateLink {
                url,
                custom_alias: alias,
                owner_id: owner,
                expires_at: None,
                cloak: cloak.map(|mode| CloakSettings {
                    mode,
                    title,
                    favicon_url: None,
                }),
            };
            create_link(LinkService::new(links, DEFAULT_CODE_LENGTH), request, yes).await?;
        }
    }

    Ok(())
}

/// Creates a link after showing what will be stored.
async fn create_link(
    service: LinkService<PgLinkRepository>,
    request: CreateLink,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🔗 Create Short Link".bright_blue().bold());
    println!();
    println!("  Destination: {}", request.url.cyan());
    if let Some(alias) = &request.custom_alias {
        println!("  Alias:       {}", alias.cyan());
    }
    if let Some(cloak) = &request.cloak {
        println!("  Cloak:       {}", cloak.mode.to_string().cyan());
    }
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this link?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let link = service
        .create_short_link(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create link: {}", e))?;

    println!("{}", "✅ Link created".green().bold());
    println!();
    print_link(&link);
    println!();

    Ok(())
}

fn print_link(link: &Link) {
    let status = if link.is_active {
        "ACTIVE".green()
    } else {
        "INACTIVE".red()
    };

    println!("  ID:          {}", link.id.to_string().bright_black());
    println!(
        "  Short URL:   {}",
        short_url(&base_url(), &link.short_code).bright_yellow().bold()
    );
    println!("  Destination: {}", link.destination_url.cyan());
    println!("  Status:      {}", status);
    if let Some(expires_at) = link.expires_at {
        println!(
            "  Expires:     {}",
            expires_at.format("%Y-%m-%d %H:%M").to_string().bright_black()
        );
    }
    if let Some(cloak) = &link.cloak {
        println!("  Cloak:       {}", cloak.mode.to_string().cyan());
    }
}

/// Shows a link with its targets, running experiment and click totals.
async fn show_link(links: Arc<PgLinkRepository>, pool: Arc<PgPool>, code: &str) -> Result<()> {
    let service = LinkService::new(links, DEFAULT_CODE_LENGTH);
    let link = service
        .get_link_by_code(code)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("{}", "🔗 Link".bright_blue().bold());
    println!();
    print_link(&link);
    println!();

    let targets = PgTargetRepository::new(pool.clone())
        .list_for_link(link.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list targets: {}", e))?;

    if !targets.is_empty() {
        println!("{}", "Targets:".bright_white().bold());
        println!(
            "  {:<5} {:<9} {:<8} {:<8} {}",
            "ID".bright_white().bold(),
            "Type".bright_white().bold(),
            "Value".bright_white().bold(),
            "Priority".bright_white().bold(),
            "Destination".bright_white().bold()
        );
        println!("  {}", "─".repeat(75).bright_black());
        for target in &targets {
            let line = format!(
                "  {:<5} {:<9} {:<8} {:<8} {}",
                target.id, target.target_type, target.value, target.priority, target.destination_url
            );
            if target.is_active {
                println!("{}", line);
            } else {
                println!("{}", line.bright_black());
            }
        }
        println!();
    }

    let running = PgAbTestRepository::new(pool.clone())
        .find_running_for_link(link.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load experiment: {}", e))?;

    if let Some(running) = running {
        println!(
            "{} {} (#{})",
            "Experiment:".bright_white().bold(),
            running.test.name.cyan(),
            running.test.id
        );
        for variant in &running.variants {
            println!(
                "  {:<5} {:<20} weight {:<5} {}",
                variant.id, variant.name, variant.weight, variant.destination_url
            );
        }
        println!();
    }

    let clicks = PgClickRepository::new(pool);
    let total = clicks
        .count_for_link(link.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to count clicks: {}", e))?;
    println!("  Clicks: {}", total.to_string().bright_green().bold());

    for row in clicks
        .count_by_variant(link.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to count clicks: {}", e))?
    {
        let label = row
            .variant_id
            .map(|id| format!("variant #{id}"))
            .unwrap_or_else(|| "no variant".to_string());
        println!("    {:<16} {}", label, row.clicks);
    }
    println!();

    Ok(())
}

async fn handle_target_action(action: TargetAction, pool: Arc<PgPool>) -> Result<()> {
    let TargetAction::Add {
        link,
        target_type,
        value,
        url,
        priority,
    } = action;

    let service = TargetingService::new(
        Arc::new(PgLinkRepository::new(pool.clone())),
        Arc::new(PgTargetRepository::new(pool)),
    );

    let target = service
        .add_target(AddTarget {
            link_id: link,
            target_type,
            value,
            destination_url: url,
            priority,
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to add target: {}", e))?;

    println!("{}", "✅ Target added".green().bold());
    println!(
        "  #{} {} = {} → {}",
        target.id,
        target.target_type,
        target.value.cyan(),
        target.destination_url
    );

    Ok(())
}

fn experiment_service(pool: Arc<PgPool>) -> ExperimentService<PgLinkRepository, PgAbTestRepository> {
    ExperimentService::new(
        Arc::new(PgLinkRepository::new(pool.clone())),
        Arc::new(PgAbTestRepository::new(pool)),
    )
}

async fn handle_experiment_action(action: ExperimentAction, pool: Arc<PgPool>) -> Result<()> {
    let ExperimentAction::Create { link, name, plan } = action;

    let test = experiment_service(pool)
        .create_test(link, &name, plan)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create experiment: {}", e))?;

    println!("{}", "✅ Experiment started".green().bold());
    println!("  #{} {} on link {}", test.id, test.name.cyan(), test.link_id);
    println!();
    println!(
        "  Add variants with: {} admin -- variant add --test {} ...",
        "cargo run --bin".bright_cyan(),
        test.id
    );

    Ok(())
}

async fn handle_variant_action(action: VariantAction, pool: Arc<PgPool>) -> Result<()> {
    let VariantAction::Add {
        test,
        name,
        url,
        weight,
        plan,
    } = action;

    let variant = experiment_service(pool)
        .add_variant(
            AddVariant {
                test_id: test,
                name,
                destination_url: url,
                weight,
            },
            plan,
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to add variant: {}", e))?;

    println!("{}", "✅ Variant added".green().bold());
    println!(
        "  #{} {} weight {} → {}",
        variant.id,
        variant.name.cyan(),
        variant.weight,
        variant.destination_url
    );

    Ok(())
}

/// Reports whether a URL passes the destination or webhook SSRF rules.
fn check_url(url: &str, webhook: bool) -> Result<()> {
    let check = if webhook {
        validate_webhook_url(url)
    } else {
        validate_for_ssrf(url)
    };

    if check.safe {
        println!("{} {}", "✅ Safe:".green().bold(), url);
        return Ok(());
    }

    println!("{} {}", "🚫 Blocked:".red().bold(), url);
    anyhow::bail!(check.reason.unwrap_or_else(|| "unsafe URL".to_string()))
}

/// Displays system statistics.
///
/// Shows:
/// - Total and active links
/// - Running experiments
/// - Total clicks
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let links_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
        .fetch_one(pool)
        .await?;

    let active_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE is_active")
        .fetch_one(pool)
        .await?;

    let tests_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM ab_tests WHERE status = 'RUNNING'")
            .fetch_one(pool)
            .await?;

    let clicks_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM link_clicks")
        .fetch_one(pool)
        .await?;

    println!(
        "  Links:             {}",
        links_count.to_string().bright_green().bold()
    );
    println!(
        "  Active links:      {}",
        active_count.to_string().bright_green().bold()
    );
    println!(
        "  Running tests:     {}",
        tests_count.to_string().bright_green().bold()
    );
    println!(
        "  Clicks:            {}",
        clicks_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}
