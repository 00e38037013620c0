use std::net::SocketAddr;
use std::sync::Arc;

use station_api::{app, AppState, AuthConfig};
use station_catalog::CatalogHandle;
use station_purchase::{OfferApplicator, OfferService};
use station_store::{app_config::Config, DbClient, MemoryStore, PgStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "station_api=debug,station_purchase=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Station API on port {}", config.server.port);

    let catalog = CatalogHandle::open(config.catalog.offers_dir.clone());
    let batch_timeout = config.purchase.batch_timeout();

    let service: Arc<dyn OfferService> = match DbClient::from_config(&config.database).await? {
        Some(db) => {
            db.migrate().await?;
            let store = Arc::new(PgStore::new(db.pool.clone()));
            Arc::new(OfferApplicator::new(store, catalog).with_batch_timeout(batch_timeout))
        }
        None => {
            tracing::warn!("No database configured, user state is kept in memory only");
            let store = Arc::new(MemoryStore::new());
            Arc::new(OfferApplicator::new(store, catalog).with_batch_timeout(batch_timeout))
        }
    };

    let app_state = AppState {
        service,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
