//! Prints the qrflow OpenAPI document as JSON.
//!
//! Usage:
//!   cargo run -p qrflow-api --bin generate-openapi > openapi.json

use qrflow_api::ApiDoc;
use utoipa::OpenApi;

fn main() {
    match serde_json::to_string_pretty(&ApiDoc::openapi()) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize OpenAPI document: {}", e);
            std::process::exit(1);
        }
    }
}
