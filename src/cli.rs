// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Derive macros: Automatically generate code for our types
// =============================================================================

use clap::Parser;

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "sitemap-sentinel",
    version = "0.1.0",
    about = "A CLI tool to validate XML sitemaps and spot-check the links they list",
    long_about = "sitemap-sentinel downloads a sitemap or sitemap index, follows nested sitemaps, \
                  reports per-document download/parse status, and can spot-check a random sample \
                  of the collected page and image links over HTTP."
)]
pub struct Cli {
    /// Sitemap URLs to be processed
    ///
    /// One or more root URLs, each pointing at a sitemap or a sitemap index.
    /// These are positional arguments (required, no flag needed)
    #[arg(value_name = "URL", required = true)]
    pub urls: Vec<String>,

    /// Max number of simultaneous connections when checking links
    ///
    /// Only used for the random link checks; sitemap resolution itself
    /// always runs one request at a time
    #[arg(short, long, value_name = "C", default_value_t = 5)]
    pub connections: usize,

    /// Check N random links from each collected pool
    ///
    /// Links are drawn with replacement, so the same URL can come up twice.
    /// 0 disables the check entirely (the default)
    #[arg(short, long, value_name = "N", default_value_t = 0)]
    pub random_check: usize,

    /// Output the document report in JSON format instead of a table
    ///
    /// This is an optional flag: --json
    #[arg(long)]
    pub json: bool,
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why no subcommands here?
//    - The tool does exactly one job: process sitemap URLs
//    - So the arguments live directly on the Cli struct
//    - clap still generates --help, --version, and validation for us
//
// 2. What does default_value_t do?
//    - Provides a default when the flag is not given
//    - The _t suffix means "typed": the default is a Rust value, not a string
//
// 3. Why Vec<String> for urls?
//    - A positional argument can repeat, so clap collects every value
//    - required = true means at least one URL must be present
// -----------------------------------------------------------------------------
