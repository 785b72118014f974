// src/sitemap/parse.rs
// =============================================================================
// This module parses sitemap XML into a classified document.
//
// We use the `quick-xml` crate with its NsReader, which resolves XML
// namespaces while streaming events. That matters here: sitemap documents
// mix up to three namespaces (the core sitemap schema, Google's image
// extension, and xhtml for alternate-language links), and an element only
// counts if it sits in the right one.
//
// Classification rule:
// - The ROOT tag is compared by local name only, with any namespace prefix
//   stripped: <sitemapindex> is an index, <urlset> is a sitemap, anything
//   else is unknown.
// - Every CHILD lookup binds to the exact namespace URI, not the bare name.
//
// Rust concepts:
// - Enums with data: SitemapDocument carries different payloads per variant
// - Pattern matching: The event loop is one big match
// - &[u8] vs &str: quick-xml hands us raw bytes for tag names
// =============================================================================

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use thiserror::Error;

// The two namespace URIs our element lookups bind to.
// The xhtml namespace (http://www.w3.org/1999/xhtml) also shows up in real
// sitemaps for <xhtml:link> alternates; those elements simply fall through
// the match arms below and are ignored.
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const IMAGE_NS: &str = "http://www.google.com/schemas/sitemap-image/1.1";

// Errors produced while parsing a document
#[derive(Debug, Error)]
pub enum ParseError {
    /// The XML itself is broken (mismatched tags, bad syntax, ...)
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// The input contained no root element at all
    #[error("document has no root element")]
    NoRoot,
}

// One <url> entry of a sitemap: the page location plus any image locations
// nested under it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub loc: String,
    pub images: Vec<String>,
}

// A parsed and classified sitemap document
//
// This is a transient value: it only lives long enough for the resolver to
// pull the URLs out of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// A sitemap index: it lists other sitemap documents
    Index { sitemaps: Vec<String> },
    /// A regular sitemap: it lists page URLs (with optional images)
    UrlSet { entries: Vec<PageEntry> },
    /// Valid XML, but the root tag is neither of the above
    Unknown { root_tag: String },
}

// Which <loc> element the cursor is currently inside, if any
enum Capture {
    None,
    SitemapLoc,
    PageLoc,
    ImageLoc,
}

// What the root element turned out to be
enum Root {
    Index,
    UrlSet,
    Unknown(String),
}

// Parses sitemap XML into a SitemapDocument
//
// Parameters:
//   xml: the document text
//
// Returns: the classified document, or ParseError if the XML is broken
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, ParseError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<Root> = None;

    // Index payload
    let mut sitemaps: Vec<String> = Vec::new();

    // Url set payload
    let mut entries: Vec<PageEntry> = Vec::new();
    let mut current_page: Option<String> = None;
    let mut current_images: Vec<String> = Vec::new();

    // Cursor state
    let mut in_sitemap = false; // inside <sitemap> (index)
    let mut in_url = false; // inside <url> (url set)
    let mut in_image = false; // inside <image:image>
    let mut capture = Capture::None;

    loop {
        match reader.read_resolved_event() {
            Err(e) => return Err(ParseError::Malformed(e.to_string())),

            // A self-closing element can still be the root (an empty
            // <urlset/> is a valid, if useless, sitemap), but it opens no
            // scope, so it must not touch the cursor flags below
            Ok((_, Event::Empty(e))) => {
                if root.is_none() {
                    let local = e.local_name();
                    root = Some(classify_root(local.as_ref()));
                }
            }

            Ok((ns, Event::Start(e))) => {
                let local = e.local_name();
                let local = local.as_ref();

                match &root {
                    // The first element is the root: classify by local name,
                    // prefix stripped, regardless of namespace
                    None => {
                        root = Some(classify_root(local));
                    }

                    Some(Root::Index) => {
                        if in_ns(&ns, SITEMAP_NS) {
                            if local == b"sitemap" {
                                in_sitemap = true;
                            } else if local == b"loc" && in_sitemap {
                                capture = Capture::SitemapLoc;
                            }
                        }
                    }

                    Some(Root::UrlSet) => {
                        if in_ns(&ns, SITEMAP_NS) && local == b"url" {
                            in_url = true;
                            current_page = None;
                            current_images.clear();
                        } else if in_url {
                            if in_ns(&ns, IMAGE_NS) && local == b"image" {
                                in_image = true;
                            } else if in_ns(&ns, IMAGE_NS) && local == b"loc" && in_image {
                                capture = Capture::ImageLoc;
                            } else if in_ns(&ns, SITEMAP_NS) && local == b"loc" && !in_image {
                                capture = Capture::PageLoc;
                            }
                        }
                    }

                    // Nothing inside an unknown document interests us
                    Some(Root::Unknown(_)) => {}
                }
            }

            Ok((_, Event::Text(t))) => {
                let text = t.unescape().unwrap_or_default().trim().to_string();
                if text.is_empty() {
                    continue;
                }
                match capture {
                    Capture::SitemapLoc => sitemaps.push(text),
                    Capture::PageLoc => current_page = Some(text),
                    Capture::ImageLoc => current_images.push(text),
                    Capture::None => {}
                }
            }

            Ok((ns, Event::End(e))) => {
                let local = e.local_name();
                let local = local.as_ref();

                if local == b"loc" {
                    capture = Capture::None;
                }
                if in_ns(&ns, SITEMAP_NS) && local == b"sitemap" {
                    in_sitemap = false;
                }
                if in_ns(&ns, IMAGE_NS) && local == b"image" {
                    in_image = false;
                }
                if in_ns(&ns, SITEMAP_NS) && local == b"url" && in_url {
                    // An entry without a <loc> contributes nothing, not even
                    // its images: there is no page to attach them to
                    if let Some(loc) = current_page.take() {
                        entries.push(PageEntry {
                            loc,
                            images: std::mem::take(&mut current_images),
                        });
                    }
                    current_images.clear();
                    in_url = false;
                }
            }

            Ok((_, Event::Eof)) => break,
            Ok(_) => {}
        }
    }

    match root {
        None => Err(ParseError::NoRoot),
        Some(Root::Index) => Ok(SitemapDocument::Index { sitemaps }),
        Some(Root::UrlSet) => Ok(SitemapDocument::UrlSet { entries }),
        Some(Root::Unknown(root_tag)) => Ok(SitemapDocument::Unknown { root_tag }),
    }
}

// Maps a namespace-stripped root tag to its document kind
fn classify_root(local: &[u8]) -> Root {
    match local {
        b"sitemapindex" => Root::Index,
        b"urlset" => Root::UrlSet,
        other => Root::Unknown(String::from_utf8_lossy(other).into_owned()),
    }
}

// True if the element's resolved namespace is exactly `uri`
fn in_ns(ns: &ResolveResult<'_>, uri: &str) -> bool {
    match ns {
        ResolveResult::Bound(Namespace(bound)) => *bound == uri.as_bytes(),
        _ => false,
    }
}
