use clap::{Parser, Subcommand};
use pinboard_search::{
    analytics::{SearchAnalytics, TracingSink},
    config::Config,
    models::{Member, PinColor},
    search::{normalize, SearchConfig, SearchQuery, SearchResponse, SearchService, SortField},
    store::{create_store, MemberStore, SortDirection},
    AppError, Result,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pinboard-search")]
#[command(about = "Pinboard member search", long_about = None, version)]
struct Cli {
    /// Configuration file overriding the embedded defaults
    #[arg(short, long, env = "PINBOARD_SEARCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search members loaded from a JSON file
    Search {
        #[arg(value_name = "TEXT", default_value = "")]
        text: String,

        /// JSON array of members
        #[arg(short, long)]
        members: PathBuf,

        #[arg(long = "pin-color")]
        pin_colors: Vec<PinColor>,

        #[arg(long = "company")]
        companies: Vec<String>,

        #[arg(long = "role")]
        roles: Vec<String>,

        /// relevance, name, company, role or updated_at
        #[arg(short, long, default_value = "relevance")]
        sort: SortField,

        #[arg(short, long, default_value = "desc")]
        direction: SortDirection,

        #[arg(short, long)]
        limit: Option<usize>,

        #[arg(short, long, default_value = "0")]
        offset: usize,
    },

    /// Print autocomplete suggestions
    Suggest {
        #[arg(value_name = "TEXT")]
        text: String,

        /// JSON array of members
        #[arg(short, long)]
        members: PathBuf,
    },

    /// Print the token query for raw input
    Normalize {
        #[arg(value_name = "TEXT")]
        text: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(&path.to_string_lossy())?,
        None => Config::load()?,
    };
    init_tracing(&config);

    if config.observability.prometheus_enabled {
        if let Err(e) = pinboard_search::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
        }
    }

    match cli.command {
        Commands::Normalize { text } => {
            println!("{}", normalize(&text));
        }

        Commands::Suggest { text, members } => {
            let service = build_service(&config, &members).await?;
            for suggestion in service.suggest(&text).await {
                println!("{}", suggestion);
            }
            service.shutdown();
        }

        Commands::Search {
            text,
            members,
            pin_colors,
            companies,
            roles,
            sort,
            direction,
            limit,
            offset,
        } => {
            let service = build_service(&config, &members).await?;
            let analytics = if config.analytics.enabled {
                Some(SearchAnalytics::start(Arc::new(TracingSink), &config.analytics)?)
            } else {
                None
            };

            let mut query = SearchQuery::new(text).with_sort(sort, direction).with_page(
                limit.unwrap_or(config.search.default_limit),
                offset,
            );
            if !pin_colors.is_empty() {
                query = query.with_pin_colors(pin_colors);
            }
            if !companies.is_empty() {
                query = query.with_companies(companies);
            }
            if !roles.is_empty() {
                query = query.with_roles(roles);
            }

            let outcome = service.search(&query).await;
            if let (Some(analytics), Ok(result)) = (&analytics, &outcome) {
                analytics.track_result(&query, result);
            }

            let response = SearchResponse::from(outcome);
            println!("{}", serde_json::to_string_pretty(&response)?);

            if let Some(analytics) = analytics {
                analytics.shutdown().await;
            }
            service.shutdown();
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("pinboard_search={}", config.observability.log_level).into()
    });

    // Logs go to stderr so stdout stays machine-readable
    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Create the configured store, load members into it and wrap it in a service
async fn build_service(config: &Config, members_path: &Path) -> Result<SearchService> {
    let raw = tokio::fs::read_to_string(members_path).await?;
    let members: Vec<Member> = serde_json::from_str(&raw)?;

    let store = create_store(&config.store)?;
    let loaded = store.upsert_members(&members).await?;
    tracing::info!(loaded, path = %members_path.display(), "Loaded members");

    let service = SearchService::new(store, SearchConfig::from(&config.search))
        .map_err(AppError::from)?;
    Ok(service)
}
