//! Sitemap module: URL list input
//!
//! - `parse_sitemap`: XML to an ordered list of page URLs
//! - `fetch_sitemap`: download through a chain of proxy prefixes

mod fetcher;
mod parser;

pub use fetcher::{build_sitemap_client, fetch_sitemap, proxied_url};
pub use parser::parse_sitemap;
