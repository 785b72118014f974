// src/fetch/mod.rs
// =============================================================================
// This module handles all outgoing HTTP traffic.
//
// Submodules:
// - http: Downloads sitemap documents and performs HEAD reachability checks
//
// This file (mod.rs) is the module root - it re-exports the public API that
// other parts of our application use.
// =============================================================================

mod http;

// Re-export public items from the submodule
// This lets users write `fetch::Fetcher` instead of `fetch::http::Fetcher`
pub use http::{FetchError, Fetcher};
