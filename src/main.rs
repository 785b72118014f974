// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Resolve every sitemap root URL, one after the other
// 3. Print the per-document report (table or JSON)
// 4. Optionally spot-check random page and image links
// 5. Exit with proper code (0 = run completed, 2 = internal error)
//
// Per-document problems (a 404, broken XML) are rows in the report, not
// process failures: the exit code stays 0 so the report itself is the
// verdict. Ctrl-C stops the run promptly but still prints whatever the
// report has collected up to that point.
//
// Rust concepts used:
// - async/await: Because we make many network requests
// - Result<T, E>: For error handling (T = success type, E = error type)
// - tokio::select!: To race the real work against the interrupt signal
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli; // src/cli.rs - command-line parsing
mod fetch; // src/fetch/ - HTTP downloads and HEAD checks
mod sampler; // src/sampler/ - random link spot-checking
mod sitemap; // src/sitemap/ - XML parsing and the recursive resolver

// Import items we need from our modules
use clap::Parser; // Parser trait enables the parse() method
use cli::Cli;
use fetch::Fetcher;
use sampler::SampleSummary;
use sitemap::{DocumentRecord, Resolver};

// anyhow::Result is like std::result::Result but simpler for applications
// It lets us return any error type with the ? operator
use anyhow::Result;

// The #[tokio::main] attribute transforms our async main into a real main
// function. It creates a tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// This is the main application logic
async fn run() -> Result<i32> {
    // Parse command-line arguments into our Cli struct
    // This will automatically handle --help, --version, etc.
    let cli = Cli::parse();

    let fetcher = Fetcher::new()?;
    let mut resolver = Resolver::new(fetcher.clone());

    // Resolve each root sequentially, racing against Ctrl-C.
    // If the signal wins, the in-flight node is abandoned where it stands;
    // its report row keeps whatever status it had reached
    let mut interrupted = false;
    for url in &cli.urls {
        tokio::select! {
            _ = resolver.resolve(url) => {}
            _ = tokio::signal::ctrl_c() => {
                println!("\n🛑 Got keyboard interrupt. Exiting");
                interrupted = true;
            }
        }
        if interrupted {
            break;
        }
    }

    // The report covers everything reached so far, interrupt or not
    print_report(&resolver.report, cli.json)?;

    if !interrupted && cli.random_check > 0 {
        tokio::select! {
            _ = run_sampling(&fetcher, &resolver, cli.random_check, cli.connections) => {}
            _ = tokio::signal::ctrl_c() => {
                println!("\n🛑 Got keyboard interrupt. Exiting");
            }
        }
    }

    Ok(0)
}

// Spot-checks random links from both pools, pages first, then images
async fn run_sampling(fetcher: &Fetcher, resolver: &Resolver, count: usize, connections: usize) {
    println!("\n🔗 Checking {} random page links...", count);
    let pages = sampler::sample_check(fetcher, &resolver.page_urls, count, connections).await;
    print_sample_summary(&pages);

    println!("\n🖼️  Checking {} random image links...", count);
    let images = sampler::sample_check(fetcher, &resolver.image_urls, count, connections).await;
    print_sample_summary(&images);
}

// Prints the report either as a table or JSON
fn print_report(records: &[DocumentRecord], json: bool) -> Result<()> {
    if json {
        // Serialize records to JSON and print
        let json_output = serde_json::to_string_pretty(records)?;
        println!("{}", json_output);
    } else {
        print_table(records);
    }
    Ok(())
}

// Prints the report as a right-aligned table in the terminal
fn print_table(records: &[DocumentRecord]) {
    println!();
    println!(
        "{:>30}{:>10}{:>7}{:>9}{:>14}{:>11}{:>12}",
        "URL", "Download", "Parse", "Type", "Sitemap urls", "Page urls", "Image urls"
    );

    for record in records {
        println!(
            "{:>30}{:>10}{:>7}{:>9}{:>14}{:>11}{:>12}",
            truncate_url(&record.url),
            record.download,
            record.parse,
            record.doc_type,
            count_cell(record.sitemap_urls),
            count_cell(record.page_urls),
            count_cell(record.image_urls),
        );
    }
}

// Formats an optional count for its table cell
fn count_cell(count: Option<usize>) -> String {
    match count {
        Some(n) => n.to_string(),
        None => "-".to_string(),
    }
}

// Shortens a URL to its last 27 characters so the table stays aligned
//
// The interesting end of a sitemap URL is the file name, so we keep the
// tail. Counting chars (not bytes) keeps this safe for non-ASCII URLs.
fn truncate_url(url: &str) -> String {
    const TAIL: usize = 27;

    let len = url.chars().count();
    if len <= TAIL + 3 {
        return url.to_string();
    }

    let tail: String = url.chars().skip(len - TAIL).collect();
    format!("...{}", tail)
}

// Prints the closing tallies for one sampling run
fn print_sample_summary(summary: &SampleSummary) {
    println!();
    println!("📊 Checked {} link(s):", summary.checked);
    println!("   ✅ 2xx: {}", summary.success);
    println!("   🔀 3xx: {}", summary.redirect);
    println!("   ❌ 4xx: {}", summary.client_error);
    println!("   💥 5xx: {}", summary.server_error);
    println!("   🔌 unreachable: {}", summary.unreachable);
}
