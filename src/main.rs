use clap::Parser;
use miette::{IntoDiagnostic, Result};
use shopcart::application::admin::CatalogAdmin;
use shopcart::application::storefront::Storefront;
use shopcart::config::Settings;
use shopcart::domain::ports::{CatalogStoreRef, SessionStoreRef};
use shopcart::infrastructure::cache::CachedCatalogStore;
use shopcart::infrastructure::in_memory::{InMemoryCatalogStore, InMemorySessionStore};
use shopcart::interfaces::csv::report_writer::ReportKind;
use shopcart::interfaces::script::ScriptRunner;
use shopcart::telemetry::setup_tracing;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Storefront commands CSV file (action, session, product, quantity)
    input: PathBuf,

    /// Catalog CSV to import before running (id, title, price, stock, category)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// State to print once all commands have run
    #[arg(long, value_enum, default_value_t = ReportKind::Stock)]
    report: ReportKind,

    /// Seconds category and page listings stay cached
    #[arg(long)]
    cache_ttl_secs: Option<u64>,

    /// Seconds of inactivity before an in-memory session expires
    #[arg(long)]
    session_idle_secs: Option<u64>,

    /// Maximum number of in-memory sessions
    #[arg(long)]
    max_sessions: Option<u64>,
}

fn open_stores(
    db_path: Option<PathBuf>,
    settings: &Settings,
) -> Result<(CatalogStoreRef, SessionStoreRef)> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => {
            use shopcart::infrastructure::rocksdb::RocksDBStore;

            let store = RocksDBStore::open(db_path).into_diagnostic()?;
            let catalog: CatalogStoreRef = Arc::new(store.clone());
            let sessions: SessionStoreRef = Arc::new(store);
            Ok((catalog, sessions))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => Err(miette::miette!(
            "--db-path requires building with the `storage-rocksdb` feature"
        )),
        None => {
            let catalog: CatalogStoreRef = Arc::new(InMemoryCatalogStore::new());
            let sessions: SessionStoreRef = Arc::new(InMemorySessionStore::from_settings(settings));
            Ok((catalog, sessions))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();
    let settings = Settings::with_overrides(cli.cache_ttl_secs, cli.session_idle_secs, cli.max_sessions);

    let (catalog, sessions) = open_stores(cli.db_path, &settings)?;
    let catalog: CatalogStoreRef = Arc::new(CachedCatalogStore::new(catalog, settings.navigation_ttl));

    let storefront = Storefront::new(catalog.clone(), sessions);
    let mut runner = ScriptRunner::new(storefront, CatalogAdmin::new(catalog));

    if let Some(path) = cli.catalog {
        let file = File::open(path).into_diagnostic()?;
        runner.seed_catalog(file).await.into_diagnostic()?;
    }

    let file = File::open(cli.input).into_diagnostic()?;
    runner.run(file).await;

    let stdout = io::stdout();
    runner
        .write_report(cli.report, stdout.lock())
        .await
        .into_diagnostic()?;

    Ok(())
}
