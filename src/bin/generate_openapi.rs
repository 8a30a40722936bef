//! Prints the OpenAPI document for the HTTP surface.
//!
//! Usage:
//!   cargo run --bin generate_openapi > openapi.json

use tambak_monitor_service::api::handlers::ApiDoc;
use utoipa::OpenApi;

fn main() {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .expect("Failed to serialise OpenAPI spec");
    println!("{json}");
}
