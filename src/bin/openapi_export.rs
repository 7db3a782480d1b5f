// Exports the OpenAPI schema as JSON to stdout
// Run with: cargo run --bin openapi_export > openapi.json

use modvault_api::api::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() {
    match ApiDoc::openapi().to_pretty_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize OpenAPI schema: {}", e);
            std::process::exit(1);
        }
    }
}
