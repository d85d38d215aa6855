//! WebAssembly bindings for nginx-conf
//!
//! Enables reading nginx configuration in the browser. There is no file
//! system there, so included files are passed in alongside the entry file.

use nginx_conf::{Http, MemorySource, ParseError, ParseOptions, Reader};
use serde::Serialize;
use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Result of parsing
#[derive(Serialize, Debug, PartialEq)]
struct ParseSummary {
    success: bool,
    servers: Vec<String>,
    upstreams: Vec<String>,
    error: Option<String>,
}

impl ParseSummary {
    fn from_http(result: Result<Option<Http>, ParseError>) -> Self {
        match result {
            Ok(http) => {
                let servers = http.as_ref().map(Http::servers_list).unwrap_or_default();
                let mut upstreams: Vec<String> = http
                    .map(|h| h.upstreams.into_keys().collect())
                    .unwrap_or_default();
                upstreams.sort();

                Self {
                    success: true,
                    servers,
                    upstreams,
                    error: None,
                }
            }
            Err(e) => Self {
                success: false,
                servers: vec![],
                upstreams: vec![],
                error: Some(e.to_string()),
            },
        }
    }
}

/// Parse a complete configuration; `include` directives are ignored
///
/// # Returns
/// A JavaScript object with:
/// - `success`: boolean indicating if parsing succeeded
/// - `servers`: `name:http` / `name:https` entries
/// - `upstreams`: upstream names
/// - `error`: error message (if failed)
#[wasm_bindgen]
pub fn parse_config(config: &str) -> JsValue {
    to_js(&summarize_config(config))
}

/// Parse the body of an http block; `include` directives are ignored
#[wasm_bindgen]
pub fn parse_http(config: &str) -> JsValue {
    to_js(&summarize_http(config))
}

/// Parse `entry` out of a set of files, following includes between them
///
/// # Arguments
/// * `entry` - Path of the main file inside `files`
/// * `files` - Object mapping paths to file content
#[wasm_bindgen]
pub fn parse_files(entry: &str, files: JsValue) -> JsValue {
    let files: BTreeMap<String, String> = match serde_wasm_bindgen::from_value(files) {
        Ok(files) => files,
        Err(e) => {
            return to_js(&ParseSummary {
                success: false,
                servers: vec![],
                upstreams: vec![],
                error: Some(format!("Invalid file set: {}", e)),
            })
        }
    };

    to_js(&summarize_files(entry, files))
}

fn summarize_config(config: &str) -> ParseSummary {
    ParseSummary::from_http(detached_reader().parse_str(config).map(|c| c.http))
}

fn summarize_http(config: &str) -> ParseSummary {
    ParseSummary::from_http(detached_reader().parse_part_str(config).map(Some))
}

fn summarize_files(entry: &str, files: BTreeMap<String, String>) -> ParseSummary {
    let mut source = MemorySource::new();
    for (path, content) in files {
        source.insert(path, content);
    }

    ParseSummary::from_http(Reader::with_source(source).read(entry).map(|c| c.http))
}

fn detached_reader() -> Reader<MemorySource> {
    // Can't follow includes without the included files
    Reader::with_source(MemorySource::new()).options(ParseOptions {
        follow_includes: false,
        ..Default::default()
    })
}

fn to_js(summary: &ParseSummary) -> JsValue {
    serde_wasm_bindgen::to_value(summary).unwrap_or(JsValue::NULL)
}
