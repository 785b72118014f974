// src/sitemap/resolver.rs
// =============================================================================
// This module walks a sitemap hierarchy depth-first and builds the report.
//
// How it works:
// 1. Every URL gets a fresh DocumentRecord appended to the report
// 2. The document is fetched, (maybe) gunzipped, and parsed
// 3. An index recurses into its children, one at a time, in document order
// 4. A url set pours its page and image URLs into the shared pools
//
// Failures stay local to their node: a child that 404s or ships broken XML
// is recorded and skipped, and its siblings are still visited. A parent
// that fails simply never discovers its children.
//
// Resolution is deliberately sequential. Concurrency belongs to the link
// sampler, not to the tree walk, and a strict depth-first order keeps the
// report rows readable.
//
// Rust concepts:
// - BoxFuture: An async fn cannot call itself directly; boxing the returned
//   future breaks the infinitely-sized type cycle
// - Struct-held state: The report and URL pools live on the Resolver and
//   are threaded through the recursion via &mut self
// =============================================================================

use futures::future::BoxFuture;
use serde::Serialize;
use std::fmt;

use crate::fetch::Fetcher;
use crate::sitemap::parse::{parse_sitemap, SitemapDocument};

// Sitemap trees are shallow in practice (one index level, sometimes two).
// The cap only exists so a sitemap that lists itself cannot recurse forever;
// nothing legitimate comes close to it.
const MAX_DEPTH: usize = 16;

// Download/parse state of one document, as shown in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Not attempted (yet, or the node was skipped earlier in the pipeline)
    Pending,
    Ok,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Pending => "-",
            Status::Ok => "ok",
            Status::Error => "error",
        })
    }
}

// What kind of document a URL turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    /// Never determined (download or parse failed first)
    Undetermined,
    Index,
    Sitemap,
    Unknown,
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocType::Undetermined => "-",
            DocType::Index => "index",
            DocType::Sitemap => "sitemap",
            DocType::Unknown => "unknown",
        })
    }
}

// One report row per visited document
//
// Rows are appended when processing begins and filled in as it progresses,
// so an interrupted run still shows every document it reached. The counts
// cover the document's DIRECT children only; totals across the whole tree
// live in the Resolver's URL pools.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub url: String,
    pub download: Status,
    pub parse: Status,
    #[serde(rename = "type")]
    pub doc_type: DocType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitemap_urls: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_urls: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<usize>,
}

impl DocumentRecord {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            download: Status::Pending,
            parse: Status::Pending,
            doc_type: DocType::Undetermined,
            sitemap_urls: None,
            page_urls: None,
            image_urls: None,
        }
    }
}

// How processing one node ended
//
// Callers use this to decide what to do next; for siblings in an index the
// answer is always "keep going", which is exactly why this is a value and
// not an error that would bubble up the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOutcome {
    /// Document handled fully (including all of an index's children)
    Resolved,
    DownloadFailed,
    ParseFailed,
    UnknownType,
    /// Nesting exceeded MAX_DEPTH; the subtree was not visited
    DepthCapped,
}

// Walks sitemap hierarchies and accumulates the run's results
//
// The Resolver owns all mutable run state: the report rows and the two URL
// pools. After the run they are read-only inputs for printing and sampling.
pub struct Resolver {
    fetcher: Fetcher,
    pub report: Vec<DocumentRecord>,
    pub page_urls: Vec<String>,
    pub image_urls: Vec<String>,
}

impl Resolver {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            report: Vec::new(),
            page_urls: Vec::new(),
            image_urls: Vec::new(),
        }
    }

    // Resolves one root URL and everything reachable beneath it
    pub async fn resolve(&mut self, url: &str) -> NodeOutcome {
        self.resolve_at(url.to_string(), 1).await
    }

    // The recursive worker
    //
    // Returns a boxed future because the function awaits itself for index
    // children. The borrow of self lives inside the box, so recursion
    // happens strictly one child at a time.
    fn resolve_at(&mut self, url: String, depth: usize) -> BoxFuture<'_, NodeOutcome> {
        Box::pin(async move {
            // The row exists from the first moment, whatever happens next
            let idx = self.report.len();
            self.report.push(DocumentRecord::new(&url));

            if depth > MAX_DEPTH {
                eprintln!(
                    "⚠️  Sitemaps nested deeper than {} levels, not descending into {}",
                    MAX_DEPTH, url
                );
                return NodeOutcome::DepthCapped;
            }

            println!("\n⬇️  Downloading {} ...", url);
            let bytes = match self.fetcher.fetch_document(&url).await {
                Ok(bytes) => {
                    self.report[idx].download = Status::Ok;
                    bytes
                }
                Err(e) => {
                    eprintln!("   Error: {}", e);
                    eprintln!("   Skipping");
                    self.report[idx].download = Status::Error;
                    return NodeOutcome::DownloadFailed;
                }
            };

            let text = String::from_utf8_lossy(&bytes);
            let document = match parse_sitemap(&text) {
                Ok(document) => {
                    println!("🧩 XML successfully parsed");
                    self.report[idx].parse = Status::Ok;
                    document
                }
                Err(e) => {
                    eprintln!("   Error: {}", e);
                    eprintln!("   Skipping");
                    self.report[idx].parse = Status::Error;
                    return NodeOutcome::ParseFailed;
                }
            };

            match document {
                SitemapDocument::Unknown { root_tag } => {
                    println!("   Unknown document type <{}>. Skipping", root_tag);
                    self.report[idx].doc_type = DocType::Unknown;
                    NodeOutcome::UnknownType
                }

                SitemapDocument::Index { sitemaps } => {
                    self.report[idx].doc_type = DocType::Index;
                    self.report[idx].sitemap_urls = Some(sitemaps.len());
                    println!("   {} sitemap URL(s) found", sitemaps.len());

                    // Children are independent: one failing never stops the
                    // rest, and the outcome of each is already captured in
                    // its own report row
                    for child in sitemaps {
                        let _ = self.resolve_at(child, depth + 1).await;
                    }
                    NodeOutcome::Resolved
                }

                SitemapDocument::UrlSet { entries } => {
                    self.report[idx].doc_type = DocType::Sitemap;
                    self.report[idx].page_urls = Some(entries.len());

                    let mut image_count = 0;
                    for entry in entries {
                        self.page_urls.push(entry.loc);
                        image_count += entry.images.len();
                        self.image_urls.extend(entry.images);
                    }
                    self.report[idx].image_urls = Some(image_count);
                    NodeOutcome::Resolved
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn url_set(locs: &[(&str, &[&str])]) -> String {
        let mut body = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
                    xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">"#,
        );
        for (loc, images) in locs {
            body.push_str("<url>");
            body.push_str(&format!("<loc>{}</loc>", loc));
            for image in *images {
                body.push_str(&format!(
                    "<image:image><image:loc>{}</image:loc></image:image>",
                    image
                ));
            }
            body.push_str("</url>");
        }
        body.push_str("</urlset>");
        body
    }

    async fn mount_xml(server: &MockServer, at: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(at.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_index_with_one_broken_child() {
        let server = MockServer::start().await;

        let index = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <sitemap><loc>{0}/pages.xml</loc></sitemap>
                <sitemap><loc>{0}/gone.xml</loc></sitemap>
            </sitemapindex>"#,
            server.uri()
        );
        mount_xml(&server, "/sitemap_index.xml", index).await;
        mount_xml(
            &server,
            "/pages.xml",
            url_set(&[
                ("https://example.com/", &["https://example.com/hero.jpg"]),
                ("https://example.com/about", &[]),
            ]),
        )
        .await;
        // /gone.xml has no mock, so wiremock answers 404

        let mut resolver = Resolver::new(Fetcher::new().unwrap());
        let outcome = resolver
            .resolve(&format!("{}/sitemap_index.xml", server.uri()))
            .await;
        assert_eq!(outcome, NodeOutcome::Resolved);

        // Three rows: the index plus both children, in traversal order
        assert_eq!(resolver.report.len(), 3);

        let index_row = &resolver.report[0];
        assert_eq!(index_row.download, Status::Ok);
        assert_eq!(index_row.parse, Status::Ok);
        assert_eq!(index_row.doc_type, DocType::Index);
        assert_eq!(index_row.sitemap_urls, Some(2));

        let pages_row = &resolver.report[1];
        assert_eq!(pages_row.doc_type, DocType::Sitemap);
        assert_eq!(pages_row.page_urls, Some(2));
        assert_eq!(pages_row.image_urls, Some(1));

        // The broken child is recorded and nothing more
        let gone_row = &resolver.report[2];
        assert_eq!(gone_row.download, Status::Error);
        assert_eq!(gone_row.parse, Status::Pending);
        assert_eq!(gone_row.doc_type, DocType::Undetermined);
        assert_eq!(gone_row.sitemap_urls, None);

        // The healthy child still fed the pools
        assert_eq!(
            resolver.page_urls,
            vec!["https://example.com/", "https://example.com/about"]
        );
        assert_eq!(resolver.image_urls, vec!["https://example.com/hero.jpg"]);
    }

    #[tokio::test]
    async fn test_unknown_document_type() {
        let server = MockServer::start().await;
        mount_xml(
            &server,
            "/feed.xml",
            "<rss version=\"2.0\"><channel></channel></rss>".to_string(),
        )
        .await;

        let mut resolver = Resolver::new(Fetcher::new().unwrap());
        let outcome = resolver
            .resolve(&format!("{}/feed.xml", server.uri()))
            .await;

        assert_eq!(outcome, NodeOutcome::UnknownType);
        assert_eq!(resolver.report.len(), 1);
        assert_eq!(resolver.report[0].doc_type, DocType::Unknown);
        assert_eq!(resolver.report[0].download, Status::Ok);
        assert_eq!(resolver.report[0].parse, Status::Ok);
        assert!(resolver.page_urls.is_empty());
    }

    #[tokio::test]
    async fn test_broken_xml_marks_parse_error() {
        let server = MockServer::start().await;
        mount_xml(&server, "/bad.xml", "<urlset><url></urlset>".to_string()).await;

        let mut resolver = Resolver::new(Fetcher::new().unwrap());
        let outcome = resolver.resolve(&format!("{}/bad.xml", server.uri())).await;

        assert_eq!(outcome, NodeOutcome::ParseFailed);
        assert_eq!(resolver.report[0].download, Status::Ok);
        assert_eq!(resolver.report[0].parse, Status::Error);
        assert_eq!(resolver.report[0].doc_type, DocType::Undetermined);
    }

    #[tokio::test]
    async fn test_duplicate_children_are_each_visited() {
        let server = MockServer::start().await;

        let index = format!(
            r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <sitemap><loc>{0}/pages.xml</loc></sitemap>
                <sitemap><loc>{0}/pages.xml</loc></sitemap>
            </sitemapindex>"#,
            server.uri()
        );
        mount_xml(&server, "/index.xml", index).await;
        mount_xml(
            &server,
            "/pages.xml",
            url_set(&[("https://example.com/solo", &[])]),
        )
        .await;

        let mut resolver = Resolver::new(Fetcher::new().unwrap());
        resolver
            .resolve(&format!("{}/index.xml", server.uri()))
            .await;

        // No dedup: the same child listed twice is fetched twice and its
        // pages land in the pool twice
        assert_eq!(resolver.report.len(), 3);
        assert_eq!(resolver.page_urls.len(), 2);
    }

    #[tokio::test]
    async fn test_self_referencing_index_hits_depth_cap() {
        let server = MockServer::start().await;

        let index = format!(
            r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <sitemap><loc>{}/loop.xml</loc></sitemap>
            </sitemapindex>"#,
            server.uri()
        );
        mount_xml(&server, "/loop.xml", index).await;

        let mut resolver = Resolver::new(Fetcher::new().unwrap());
        let outcome = resolver
            .resolve(&format!("{}/loop.xml", server.uri()))
            .await;

        // The walk terminates: MAX_DEPTH visited rows plus the capped one
        assert_eq!(outcome, NodeOutcome::Resolved);
        assert_eq!(resolver.report.len(), MAX_DEPTH + 1);

        let capped = resolver.report.last().unwrap();
        assert_eq!(capped.download, Status::Pending);
        assert_eq!(capped.doc_type, DocType::Undetermined);
    }

    #[tokio::test]
    async fn test_gzipped_sitemap_is_unpacked_before_parsing() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let server = MockServer::start().await;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(url_set(&[("https://example.com/zipped", &[])]).as_bytes())
            .unwrap();
        let body = encoder.finish().unwrap();

        Mock::given(method("GET"))
            .and(path("/sitemap.xml.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&server)
            .await;

        let mut resolver = Resolver::new(Fetcher::new().unwrap());
        let outcome = resolver
            .resolve(&format!("{}/sitemap.xml.gz", server.uri()))
            .await;

        assert_eq!(outcome, NodeOutcome::Resolved);
        assert_eq!(resolver.report[0].doc_type, DocType::Sitemap);
        assert_eq!(resolver.page_urls, vec!["https://example.com/zipped"]);
    }
}
