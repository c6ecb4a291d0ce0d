//! REST API layer: route handlers, DTOs, extractors and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; system endpoints at the
//! root. With the `swagger-ui` feature the OpenAPI document is served at
//! `/api-docs/openapi.json` and browsable at `/swagger-ui`.

pub mod dto;
pub mod extract;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "storefront-gateway",
        description = "Synchronizes on-chain shops and products and pins media to IPFS."
    ),
    paths(
        handlers::shops::create_shop,
        handlers::shops::list_shops,
        handlers::shops::get_shop,
        handlers::shops::delete_shop,
        handlers::shops::restore_shop,
        handlers::shops::hidden_shops,
        handlers::shops::update_configuration,
        handlers::shops::rename_shop,
        handlers::shops::set_published,
        handlers::products::list_products,
        handlers::products::add_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::storefront::get_storefront,
        handlers::storefront::owner_sales,
        handlers::uploads::upload_image,
        handlers::session::last_error,
        handlers::session::clear_error,
        handlers::session::end_session,
        handlers::system::health_handler,
        handlers::system::backends_handler,
    ),
    tags(
        (name = "Shops", description = "Shop lifecycle and visibility"),
        (name = "Products", description = "Items of a shop"),
        (name = "Storefront", description = "Public reads"),
        (name = "Uploads", description = "IPFS media"),
        (name = "Session", description = "Session state"),
        (name = "System", description = "Health and configuration"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
