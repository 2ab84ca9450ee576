use std::sync::Arc;

use clap::{Parser, Subcommand};

use searchify::app::{router, AppState};
use searchify::config::Settings;
use searchify::db::repository::{MongoPageRepository, PageRepository};
use searchify::db::schema_repository::{MongoPageTypeRepository, PageTypeRepository};
use searchify::db::settings_repository::{MongoSiteConfigRepository, SiteConfigRepository};
use searchify::error::AppError;
use searchify::search::client::IndexApi;
use searchify::search::indextank::IndextankClient;
use searchify::sync::service::SyncService;

#[derive(Parser)]
#[command(name = "searchify", about = "Keep a hosted search index in sync with the site tree")]
struct Cli {
    /// Path to a configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve search and lifecycle hooks over HTTP
    Serve,
    /// Index every publicly visible page, then exit
    Reindex,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.clone().into()),
        )
        .init();

    if let Err(e) = settings.validate() {
        abort(&e);
    }
    let bind_addr = settings.bind_addr.clone();
    let service = match connect(settings).await {
        Ok(service) => service,
        Err(e) if e.is_fatal() => abort(&e),
        Err(e) => return Err(e.into()),
    };

    match cli.command {
        Command::Serve => {
            let app = router(AppState::new(service));

            tracing::info!("Listening on http://{}", bind_addr);
            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Command::Reindex => {
            let indexed = service.index_all().await?;
            println!("Indexed {indexed} pages");
        }
    }

    Ok(())
}

/// Exit status for configuration errors (sysexits `EX_CONFIG`).
const EXIT_CONFIG: i32 = 78;

fn abort(err: &AppError) -> ! {
    tracing::error!("{err}");
    eprintln!("searchify: {err}");
    std::process::exit(EXIT_CONFIG);
}

async fn connect(settings: Settings) -> Result<SyncService, AppError> {
    // Connect to MongoDB
    let mongo_client = mongodb::Client::with_uri_str(&settings.mongodb_uri)
        .await
        .map_err(|e| AppError::Database(format!("Failed to connect to MongoDB: {e}")))?;
    let mongo_db = mongo_client.database(&settings.mongodb_database);
    let pages: Arc<dyn PageRepository> = Arc::new(MongoPageRepository::new(&mongo_db));
    let page_types: Arc<dyn PageTypeRepository> = Arc::new(MongoPageTypeRepository::new(&mongo_db));
    let site: Arc<dyn SiteConfigRepository> = Arc::new(MongoSiteConfigRepository::new(&mongo_db));

    tracing::info!("Connected to MongoDB at {}", settings.mongodb_uri);

    let client: Arc<dyn IndexApi> = Arc::new(IndextankClient::new(
        &settings.api_url,
        settings.request_timeout(),
    )?);

    SyncService::connect(client, pages, page_types, site, settings).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutting down");
}
