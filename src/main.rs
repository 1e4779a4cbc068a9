//! modqueue - moderation queue client
//!
//! ## Usage
//!
//! ```bash
//! # First page of the pending queue
//! modqueue list "status=pending"
//!
//! # One listing, refreshed until interrupted
//! modqueue show 42 --follow
//!
//! # Bulk decisions
//! modqueue approve 1 2 3
//! modqueue reject --reason wrong-category --comment "move to Транспорт" 4 5
//!
//! # New-items notices for the first page
//! modqueue watch
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use modqueue::{
    api::{HttpModerationApi, ModerationApi},
    cache::{create_cache, QueryCache},
    config::{preferences::PreferenceStore, Config},
    filters::{decode, MemoryHistory},
    models::{Ad, AdsPage, Decision, DecisionPayload, StatsPeriod},
    services::{
        AdDetailSource, BulkActionCoordinator, BulkOutcome, DecisionService, DetailState,
        ListDataSource, QueueView, StatsService,
    },
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "modqueue")]
#[command(about = "Moderation queue client")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "modqueue.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of listings for a filter query string
    List {
        /// Query string, e.g. "status=pending&page=2"
        #[arg(default_value = "")]
        query: String,
    },
    /// Print one listing
    Show {
        id: i64,
        /// Keep refreshing until the listing disappears or Ctrl-C
        #[arg(short, long)]
        follow: bool,
    },
    /// Approve listings
    Approve {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Reject listings
    Reject {
        #[arg(short, long)]
        reason: String,
        #[arg(long)]
        comment: Option<String>,
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Send listings back to their sellers for changes
    RequestChanges {
        #[arg(short, long)]
        reason: String,
        #[arg(long)]
        comment: Option<String>,
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Show a page and report new items until Ctrl-C
    Watch {
        #[arg(default_value = "")]
        query: String,
    },
    /// Print moderator statistics
    Stats {
        /// today, week or month
        #[arg(short, long, default_value = "week")]
        period: StatsPeriod,
    },
    /// Show or toggle the color mode
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

// ============================================================================
// Wiring
// ============================================================================

struct App {
    config: Config,
    api: Arc<dyn ModerationApi>,
    list: Arc<ListDataSource>,
    details: Arc<QueryCache<Arc<Ad>>>,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let api: Arc<dyn ModerationApi> = Arc::new(HttpModerationApi::new(&config.api)?);
        let list = Arc::new(ListDataSource::new(api.clone(), create_cache(&config.cache)));
        let details = create_cache(&config.cache);
        Ok(Self {
            config,
            api,
            list,
            details,
        })
    }

    fn detail_source(&self) -> AdDetailSource {
        AdDetailSource::new(
            self.api.clone(),
            self.details.clone(),
            self.config.polling.detail_interval(),
        )
    }

    fn bulk(&self) -> BulkActionCoordinator {
        BulkActionCoordinator::new(self.api.clone(), self.list.clone())
            .with_detail_cache(self.details.clone())
    }

    fn decisions(&self) -> DecisionService {
        DecisionService::new(self.api.clone(), self.list.clone(), self.details.clone())
    }

    /// One id goes through the single-decision path, several through bulk
    async fn decide(&self, ids: &[i64], decision: Decision) -> Result<()> {
        if let [id] = ids {
            self.decisions().decide(*id, decision).await?;
            println!("#{}: done", id);
            return Ok(());
        }
        let outcome = self.bulk().apply(ids, decision).await;
        print_outcome(&outcome);
        outcome.into_result()?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "modqueue=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = Config::load_with_env(&args.config)?;
    config.validate().context("Invalid configuration")?;
    tracing::info!("Configuration loaded, API at {}", config.api.base_url);

    let app = App::new(config)?;

    match args.command {
        Command::List { query } => {
            let page = app.list.fetch(&decode(&query)).await?;
            print_page(&page);
        }
        Command::Show { id, follow } => show(&app, id, follow).await?,
        Command::Approve { ids } => app.decide(&ids, Decision::Approve).await?,
        Command::Reject { reason, comment, ids } => {
            let payload = DecisionPayload::parse(&reason, comment.as_deref())?;
            app.decide(&ids, Decision::Reject(payload)).await?;
        }
        Command::RequestChanges { reason, comment, ids } => {
            let payload = DecisionPayload::parse(&reason, comment.as_deref())?;
            app.decide(&ids, Decision::RequestChanges(payload)).await?;
        }
        Command::Watch { query } => watch(&app, &query).await?,
        Command::Stats { period } => {
            let stats = StatsService::new(app.api.clone(), create_cache(&app.config.cache))
                .load(period)
                .await?;
            println!("Period: {}", stats.period);
            println!("Reviewed: {}", stats.summary.total_reviewed);
            println!("Average review time: {:.1} min", stats.summary.average_review_time);
            let (approved, rejected, changes) = stats.decision_shares();
            println!(
                "Approved {:.0} / rejected {:.0} / changes requested {:.0}",
                approved, rejected, changes
            );
            for (category, count) in stats.ranked_categories() {
                println!("  {:<24} {}", category, count);
            }
        }
        Command::Theme { toggle } => {
            let mut store = PreferenceStore::open(&app.config.preferences.path);
            let mode = if toggle {
                store.toggle_color_mode()?
            } else {
                store.color_mode()
            };
            println!("{}", mode);
        }
    }

    Ok(())
}

async fn show(app: &App, id: i64, follow: bool) -> Result<()> {
    let source = app.detail_source();
    if !follow {
        let ad = source.fetch_one(id).await?;
        print_ad(&ad);
        return Ok(());
    }

    let mut watch = source.watch(id);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            state = watch.changed() => match state {
                Some(DetailState::Ready(ad)) => print_ad(&ad),
                Some(DetailState::Failed(message)) => {
                    eprintln!("Failed to load #{}: {}", id, message)
                }
                Some(DetailState::NotFound) => {
                    println!("#{} no longer exists", id);
                    break;
                }
                Some(DetailState::Loading) => {}
                None => break,
            },
        }
    }
    Ok(())
}

async fn watch(app: &App, query: &str) -> Result<()> {
    let mut view = QueueView::new(
        MemoryHistory::new(query),
        app.api.clone(),
        app.list.clone(),
        app.config.polling.new_items_interval(),
    )
    .with_detail_cache(app.details.clone());

    let page = view.open().await?;
    print_page(&page);

    let Some(mut updates) = view.subscribe_new_items() else {
        println!("New-items check only runs on page 1 without search or category");
        return Ok(());
    };
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let fresh = view.new_items_available().await;
                if fresh > 0 {
                    println!("{} new item(s), refreshing", fresh);
                    let page = view.refresh().await?;
                    print_page(&page);
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_page(page: &AdsPage) {
    for ad in &page.ads {
        println!(
            "#{:<6} {:<9} {:<7} {:>12.2}  {}",
            ad.id,
            ad.status.as_str(),
            ad.priority.to_string(),
            ad.price,
            ad.title
        );
    }
    let p = &page.pagination;
    println!(
        "page {}/{} ({} items)",
        p.current_page, p.total_pages, p.total_items
    );
}

fn print_ad(ad: &Ad) {
    println!("#{} {} [{}]", ad.id, ad.title, ad.status);
    println!(
        "{:.2} | {} | seller {} ({:.1})",
        ad.price, ad.category, ad.seller.name, ad.seller.rating
    );
    println!("{}", ad.description);
    for (key, value) in &ad.characteristics {
        println!("  {}: {}", key, value);
    }
    if let Some(last) = ad.last_decision() {
        println!(
            "Last decision: {:?} by {} at {}",
            last.action, last.moderator_name, last.timestamp
        );
    }
}

fn print_outcome(outcome: &BulkOutcome) {
    println!("{:?}: {} succeeded", outcome.action, outcome.succeeded.len());
    for failure in &outcome.failed {
        println!("  #{} failed: {}", failure.id, failure.message);
    }
}
