// src/catalog.rs

//! Release catalog client
//!
//! This module provides functionality for:
//! - Listing the published release versions, newest first
//! - Listing the downloadable packages of a release with their
//!   platform/feature tags
//!
//! Wire format: `GET <root>/releases` returns a JSON array of version
//! strings, `GET <root>/release/<version>` a JSON array of `{name, url}`
//! objects where `name` is `<feature-tag>/<package-file>`.

use crate::error::{Error, Result};
use crate::platform::HostProfile;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::cmp::Ordering;
use std::time::Duration;
use tracing::{info, warn};

/// Default catalog root; deployment-specific, overridable via --catalog-url
pub const DEFAULT_CATALOG_ROOT: &str = "http://terark.com/download/terarkdb";

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum retry attempts for failed catalog requests
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// Catalog entry as it appears on the wire
#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
    url: String,
}

/// One downloadable artifact of a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Package file name, e.g. `terarkdb-0.13.8-linux.tgz`
    pub name: String,
    /// Download URL
    pub url: String,
    /// OS token found in the catalog entry (`linux`, `darwin`, or empty)
    pub platform_tag: String,
    /// Feature tier directory prefix, e.g. `bmi2-0`
    pub feature_tag: String,
}

impl PackageDescriptor {
    fn from_raw(raw: RawPackage) -> Self {
        let lower = raw.name.to_lowercase();
        let platform_tag = if lower.contains("linux") {
            "linux"
        } else if lower.contains("darwin") || lower.contains("osx") || lower.contains("macos") {
            "darwin"
        } else {
            ""
        };

        let (feature_tag, file) = match raw.name.split_once('/') {
            Some((tag, file)) => (tag.to_string(), file.to_string()),
            None => (String::new(), raw.name.clone()),
        };

        PackageDescriptor {
            name: file,
            url: raw.url,
            platform_tag: platform_tag.to_string(),
            feature_tag,
        }
    }

    /// A package is eligible iff its platform tag matches the host OS and its
    /// feature tag carries the host's exact BMI tier. No fallback across
    /// tiers: a BMI build never runs on a non-BMI CPU, and the non-BMI build
    /// is deliberately not offered to BMI hosts.
    pub fn matches(&self, host: &HostProfile) -> bool {
        self.platform_tag == host.os.tag() && self.feature_tag.contains(host.feature_tier())
    }
}

/// HTTP client for the release catalog, with bounded retries
pub struct CatalogClient {
    client: Client,
    root: String,
    max_retries: u32,
}

impl CatalogClient {
    /// Create a client for the catalog rooted at `root`
    pub fn new(root: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::CatalogUnavailable(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            root: root.trim_end_matches('/').to_string(),
            max_retries: MAX_RETRIES,
        })
    }

    /// List release versions, newest first
    pub fn list_versions(&self) -> Result<Vec<String>> {
        let url = format!("{}/releases", self.root);
        info!("Fetching release catalog from {}", url);
        let body = self.fetch(&url)?;
        parse_versions_body(&body)
    }

    /// List the downloadable packages of `version`
    pub fn list_packages(&self, version: &str) -> Result<Vec<PackageDescriptor>> {
        let url = format!("{}/release/{}", self.root, version);
        info!("Fetching package list for release {}", version);
        let body = self.fetch(&url)?;
        parse_packages_body(&body)
    }

    /// GET a catalog URL with retry support, returning the response body
    fn fetch(&self, url: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send() {
                Ok(response) => {
                    if !response.status().is_success() {
                        return Err(Error::CatalogUnavailable(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }

                    return response.text().map_err(|e| {
                        Error::CatalogUnavailable(format!("failed to read response body: {}", e))
                    });
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::CatalogUnavailable(format!(
                            "failed to fetch {} after {} attempts: {}",
                            url, attempt, e
                        )));
                    }
                    warn!("catalog fetch attempt {} failed: {}, retrying...", attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }
}

/// Parse a releases response body into a descending-ordered catalog
pub fn parse_versions_body(body: &str) -> Result<Vec<String>> {
    let mut versions: Vec<String> = serde_json::from_str(body)
        .map_err(|e| Error::CatalogUnavailable(format!("invalid releases response: {}", e)))?;
    sort_versions_desc(&mut versions);
    Ok(versions)
}

/// Parse a release response body into package descriptors, catalog order
pub fn parse_packages_body(body: &str) -> Result<Vec<PackageDescriptor>> {
    let raw: Vec<RawPackage> = serde_json::from_str(body)
        .map_err(|e| Error::CatalogUnavailable(format!("invalid release response: {}", e)))?;
    Ok(raw.into_iter().map(PackageDescriptor::from_raw).collect())
}

/// Order versions newest-first
///
/// Releases are published as semver-ish strings; plain string ordering would
/// put `0.13.8` ahead of `0.13.10`, so entries that parse as semver are
/// compared numerically and anything else falls back to string order.
pub fn sort_versions_desc(versions: &mut [String]) {
    versions.sort_by(|a, b| compare_versions_desc(a, b));
}

fn compare_versions_desc(a: &str, b: &str) -> Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(va), Ok(vb)) => vb.cmp(&va),
        _ => b.cmp(a),
    }
}
