//! OpenAPI documentation aggregator.
//!
//! Collects the `#[utoipa::path]`-annotated handlers into a single OpenAPI
//! spec, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "query-relay API",
        version = "0.1.0",
        description = "Relay SQL queries to AWS Athena and return normalized responses.",
    ),
    tags(
        (name = "Health", description = "Server readiness"),
        (name = "Query", description = "SQL query relay to Athena"),
    ),
    paths(
        crate::api::health::health,
        crate::api::query::query,
    )
)]
pub struct ApiDoc;
