// src/sampler/check.rs
// =============================================================================
// This module spot-checks a random sample of collected URLs.
//
// Key functionality:
// - Draws N URLs with replacement (the same link can come up twice, which
//   is fine: every draw is an independent check)
// - Runs the HEAD checks with at most C in flight at any moment
// - Prints each result the moment it completes, colored by status bucket
// - Returns per-bucket tallies once every check has finished
//
// Rust concepts:
// - async/await: For concurrent network I/O
// - Streams: buffer_unordered() is our worker pool
// - Enums: To represent the status buckets
// =============================================================================

use futures::stream::{self, StreamExt};
use rand::seq::SliceRandom;

use crate::fetch::Fetcher;

// Classic ANSI escape codes for the result lines
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const RED: &str = "\x1b[91m";
const BLUE: &str = "\x1b[94m";
const MAGENTA: &str = "\x1b[95m";
const END: &str = "\x1b[39m";

// Where a check result lands, by HTTP status class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBucket {
    /// 2xx
    Success,
    /// 3xx (reported, never followed)
    Redirect,
    /// 4xx
    ClientError,
    /// 5xx and anything else the server managed to send
    ServerError,
    /// No HTTP answer at all: DNS failure, refused connection, timeout
    Unreachable,
}

impl StatusBucket {
    // Buckets a raw status code
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => StatusBucket::Success,
            300..=399 => StatusBucket::Redirect,
            400..=499 => StatusBucket::ClientError,
            _ => StatusBucket::ServerError,
        }
    }

    fn color(&self) -> &'static str {
        match self {
            StatusBucket::Success => GREEN,
            StatusBucket::Redirect => YELLOW,
            StatusBucket::ClientError => RED,
            StatusBucket::ServerError => BLUE,
            StatusBucket::Unreachable => MAGENTA,
        }
    }
}

// The outcome of one HEAD check
//
// Produced by a worker, printed immediately, then folded into the summary;
// individual results are not kept around
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub url: String,
    pub bucket: StatusBucket,
    /// None when the request never got an HTTP answer
    pub status: Option<u16>,
}

// Per-bucket tallies for one sampling run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleSummary {
    pub checked: usize,
    pub success: usize,
    pub redirect: usize,
    pub client_error: usize,
    pub server_error: usize,
    pub unreachable: usize,
}

impl SampleSummary {
    fn record(&mut self, bucket: StatusBucket) {
        self.checked += 1;
        match bucket {
            StatusBucket::Success => self.success += 1,
            StatusBucket::Redirect => self.redirect += 1,
            StatusBucket::ClientError => self.client_error += 1,
            StatusBucket::ServerError => self.server_error += 1,
            StatusBucket::Unreachable => self.unreachable += 1,
        }
    }
}

// Checks `count` random URLs from `pool` with at most `connections` requests
// in flight
//
// The call returns only after every draw has been checked, but results are
// printed as they complete, so slow servers don't dam up the output. The
// completion order across workers is whatever the network makes it.
//
// An empty pool is an explicit no-op: there is nothing to draw from, so we
// say so and return a zero summary instead of sampling from nothing.
pub async fn sample_check(
    fetcher: &Fetcher,
    pool: &[String],
    count: usize,
    connections: usize,
) -> SampleSummary {
    if pool.is_empty() {
        println!("   No URLs collected, nothing to check");
        return SampleSummary::default();
    }

    let connections = connections.max(1);

    // Draw everything up front; the pool is immutable from here on.
    // The rng is scoped so it's gone before the first await
    let draws: Vec<String> = {
        let mut rng = rand::thread_rng();
        (0..count)
            .filter_map(|_| pool.choose(&mut rng).cloned())
            .collect()
    };

    // One future per draw; buffer_unordered caps how many run at once.
    // Each task gets its own Fetcher handle, which shares the underlying
    // connection pool
    let checks = draws.into_iter().map(|url| {
        let fetcher = fetcher.clone();
        async move { check_url(&fetcher, url).await }
    });

    let mut results = stream::iter(checks).buffer_unordered(connections);

    let mut summary = SampleSummary::default();
    while let Some(result) = results.next().await {
        print_check(&result);
        summary.record(result.bucket);
    }
    summary
}

// Performs one HEAD check and classifies the answer
//
// A transport failure is a result like any other, not a crash: the worker
// reports Unreachable and moves on
async fn check_url(fetcher: &Fetcher, url: String) -> CheckResult {
    match fetcher.head_status(&url).await {
        Ok(status) => CheckResult {
            url,
            bucket: StatusBucket::from_status(status),
            status: Some(status),
        },
        Err(_) => CheckResult {
            url,
            bucket: StatusBucket::Unreachable,
            status: None,
        },
    }
}

// Prints one result line: a colored status tag, then the URL
fn print_check(result: &CheckResult) {
    let tag = match result.status {
        Some(status) => status.to_string(),
        None => "ERR".to_string(),
    };
    println!("[{}{}{}] {}", result.bucket.color(), tag, END, result.url);
}
