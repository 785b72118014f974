// src/fetch/http.rs
// =============================================================================
// This module downloads sitemap documents and checks links over HTTP.
//
// Key functionality:
// - Fetches a document as raw bytes (GET), treating non-2xx as an error
// - Transparently gunzips payloads whose URL path ends in .gz
// - Performs HEAD reachability checks without following redirects
// - Sends a recognizable browser User-Agent (some servers answer
//   differently to unknown clients)
//
// Rust concepts:
// - async/await: For network I/O
// - Result<T, E>: For error handling
// - thiserror: Derive macro that writes Display/Error impls for us
// =============================================================================

use std::io::Read;
use std::time::Duration;

use flate2::read::GzDecoder;
use reqwest::{redirect, Client};
use thiserror::Error;
use url::Url;

// A desktop browser User-Agent string
// Plenty of servers serve sitemaps fine to browsers but reject bots
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/49.0.2623.110 Safari/537.36";

// Every request gets the same bounded timeout so an unresponsive server
// can never hang the run
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// Errors that can occur while fetching a document or checking a link
//
// thiserror generates the Display and std::error::Error impls from the
// #[error(...)] attributes
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request itself failed (DNS, refused connection, timeout, TLS, ...)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered, but with a non-success status code
    #[error("HTTP {0}")]
    Status(u16),

    /// The URL said .gz but the payload did not decompress
    #[error("invalid gzip payload: {0}")]
    Gzip(std::io::Error),
}

// Shared HTTP client wrapper used by both the resolver and the sampler
//
// We keep two reqwest clients because they need different redirect policies:
// document fetches follow a few redirects like a browser would, while HEAD
// checks must report 3xx codes instead of chasing them.
//
// Clone is cheap: reqwest::Client is a reference-counted handle internally,
// so cloned Fetchers share the same connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    document_client: Client,
    check_client: Client,
}

impl Fetcher {
    // Builds the two clients
    //
    // Client construction can fail (e.g. TLS backend initialization), so we
    // propagate that instead of panicking
    pub fn new() -> Result<Self, FetchError> {
        let document_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .redirect(redirect::Policy::limited(5))
            .build()?;

        let check_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            document_client,
            check_client,
        })
    }

    // Fetches a sitemap document and returns its (decompressed) bytes
    //
    // Parameters:
    //   url: the document URL
    //
    // Returns: the raw XML bytes, gunzipped if the URL path ends in .gz
    pub async fn fetch_document(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.document_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?.to_vec();

        if is_gzip_url(url) {
            println!("📦 Unpacking {} ...", url);
            return gunzip(&bytes);
        }

        Ok(bytes)
    }

    // Performs a single HEAD request and returns the raw status code
    //
    // Redirects are NOT followed here: a 3xx answer is part of the result,
    // not a detour to take
    pub async fn head_status(&self, url: &str) -> Result<u16, FetchError> {
        let response = self.check_client.head(url).send().await?;
        Ok(response.status().as_u16())
    }
}

// Checks whether a URL points at a gzipped file
//
// We look at the URL *path* so query strings like ?v=1.gz can't fool us.
// If the URL doesn't parse at all we fall back to a plain suffix check;
// the fetch itself will surface the real problem.
fn is_gzip_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().ends_with(".gz"),
        Err(_) => url.ends_with(".gz"),
    }
}

// Decompresses a gzip payload into plain bytes
fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, FetchError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(FetchError::Gzip)?;
    Ok(out)
}
