//! Runs one property search and writes the raw records to a file.
//!
//! ```text
//! realzen-search-dump <location> [output]
//! ```
//!
//! The output defaults to `example_results.json`.

#[macro_use]
extern crate tracing;

use std::env;
use std::process::ExitCode;

use realzen_agent::Configuration;
use realzen_agent::tools::{PropertySearchTool, SearchParameters};

const DEFAULT_OUTPUT: &str = "example_results.json";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let Some(location) = args.next() else {
        eprintln!("usage: realzen-search-dump <location> [output]");
        return ExitCode::FAILURE;
    };
    let output = args.next().unwrap_or_else(|| DEFAULT_OUTPUT.to_owned());

    let tool = match Configuration::from_env()
        .and_then(|config| PropertySearchTool::new(&config))
    {
        Ok(tool) => tool,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let results = match tool.search(SearchParameters::new(location)).await {
        Ok(results) => results,
        Err(err) => {
            eprintln!("search failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let json = match serde_json::to_string_pretty(&results) {
        Ok(json) => json,
        Err(err) => {
            eprintln!("cannot encode results: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = tokio::fs::write(&output, json).await {
        eprintln!("cannot write {output}: {err}");
        return ExitCode::FAILURE;
    }
    info!(count = results.len(), %output, "wrote search results");
    ExitCode::SUCCESS
}
