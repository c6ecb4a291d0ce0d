//! storefront-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use storefront_gateway::app_state::{AppState, BackendInfo};
use storefront_gateway::build_app;
use storefront_gateway::chain::{ChainClient, InMemoryChain, JsonRpcChainClient};
use storefront_gateway::config::{
    ChainBackend, DeletedShopsBackend, GatewayConfig, IpfsBackend, LogFormat,
};
use storefront_gateway::domain::EventBus;
use storefront_gateway::ipfs::{
    GatewayUploader, IpfsUploader, LocalNodeUploader, PinataUploader, PlaceholderUploader,
};
use storefront_gateway::persistence::{
    DeletedShopStore, JsonFileDeletedShops, MemoryDeletedShops, PostgresDeletedShops,
};
use storefront_gateway::service::Session;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = GatewayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting storefront-gateway");

    // Build adapters
    let chain = build_chain(&config)?;
    let deleted_store = build_deleted_store(&config).await?;
    let uploader = build_uploader(&config)?;
    let backends = BackendInfo {
        chain: config.chain_backend.as_str(),
        ipfs: config.ipfs_backend.as_str(),
        deleted_shops: config.deleted_shops_backend.as_str(),
    };
    tracing::info!(
        chain = backends.chain,
        ipfs = backends.ipfs,
        deleted_shops = backends.deleted_shops,
        "backends ready"
    );

    // Build service layer
    let event_bus = EventBus::new(config.event_bus_capacity);
    let session = Arc::new(Session::open(chain, deleted_store, event_bus).await);

    // Build router
    let app = build_app(
        AppState::new(session, uploader, backends),
        config.request_timeout(),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_chain(config: &GatewayConfig) -> Result<Arc<dyn ChainClient>, Box<dyn std::error::Error>> {
    match config.chain_backend {
        ChainBackend::Memory => {
            tracing::warn!("using the in-memory chain; state is lost on restart");
            Ok(Arc::new(InMemoryChain::new()))
        }
        ChainBackend::Rpc => {
            let registry = config
                .registry_address
                .ok_or("REGISTRY_ADDRESS is required for the rpc chain backend")?;
            Ok(Arc::new(JsonRpcChainClient::new(
                config.rpc_url.clone(),
                registry,
                config.confirmation_poll_interval(),
            )))
        }
    }
}

async fn build_deleted_store(
    config: &GatewayConfig,
) -> Result<Arc<dyn DeletedShopStore>, Box<dyn std::error::Error>> {
    Ok(match config.deleted_shops_backend {
        DeletedShopsBackend::Memory => Arc::new(MemoryDeletedShops::new()),
        DeletedShopsBackend::File => {
            Arc::new(JsonFileDeletedShops::new(config.deleted_shops_path.clone()))
        }
        DeletedShopsBackend::Postgres => Arc::new(
            PostgresDeletedShops::connect(
                &config.database_url,
                config.database_max_connections,
                config.database_connect_timeout(),
            )
            .await?,
        ),
    })
}

fn build_uploader(
    config: &GatewayConfig,
) -> Result<Arc<dyn IpfsUploader>, Box<dyn std::error::Error>> {
    let gateway = config.ipfs_gateway_url.clone();
    Ok(match config.ipfs_backend {
        IpfsBackend::Placeholder => Arc::new(PlaceholderUploader::new(gateway)),
        IpfsBackend::Pinata => {
            let jwt = config
                .pinata_jwt
                .clone()
                .ok_or("PINATA_JWT is required for the pinata backend")?;
            Arc::new(PinataUploader::new(jwt, gateway))
        }
        IpfsBackend::Gateway => {
            let upload_url = config
                .ipfs_upload_url
                .clone()
                .ok_or("IPFS_UPLOAD_URL is required for the gateway backend")?;
            Arc::new(GatewayUploader::new(
                upload_url,
                config.ipfs_upload_token.clone(),
                gateway,
            ))
        }
        IpfsBackend::Local => Arc::new(LocalNodeUploader::new(config.ipfs_node_url.clone(), gateway)),
    })
}
