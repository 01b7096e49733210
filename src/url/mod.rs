//! URL handling utilities
//!
//! This module handles resolution of directory entity links against the site
//! origin, light normalization for deduplication, and recovery of a batch
//! token from a profile URL.

use crate::{UrlError, UrlResult};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Resolves an entity-card href to a fully-qualified profile URL
///
/// Only hrefs under the configured entity path prefix are accepted; anything
/// else on the listing page (filters, footer links, ads) is rejected.
/// Relative hrefs are resolved against the listing URL's origin, fragments
/// are dropped, and the result is returned as a canonical string suitable
/// for use as a unique key.
///
/// # Arguments
///
/// * `href` - The raw href attribute from an entity-card anchor
/// * `base` - The listing URL the href was found on
/// * `entity_prefix` - Path prefix that identifies profile pages (e.g. "/companies/")
pub fn resolve_entity_url(href: &str, base: &Url, entity_prefix: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || !href.starts_with(entity_prefix) {
        return None;
    }

    match base.join(href) {
        Ok(mut resolved) => {
            resolved.set_fragment(None);
            Some(resolved.to_string())
        }
        Err(_) => None,
    }
}

/// Parses a string into a URL, requiring an http(s) scheme and a host
pub fn parse_http_url(s: &str) -> UrlResult<Url> {
    let parsed = Url::parse(s).map_err(|e| UrlError::Parse(e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UrlError::InvalidScheme(parsed.scheme().to_string()));
    }

    if parsed.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(parsed)
}

fn batch_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([sw]\d{2})(/|$)").expect("batch token pattern is valid")
    })
}

/// Recovers a batch token from a profile URL
///
/// Profile URLs sometimes carry a trailing season/year token (e.g.
/// `/companies/foo/w25`). The match is case-insensitive and the token is
/// normalized to upper case ("W25"). Returns None when the URL carries no
/// such token.
pub fn batch_from_url(url: &str) -> Option<String> {
    let lowered = url.to_lowercase();

    batch_token_pattern()
        .captures(&lowered)
        .map(|caps| caps[1].to_uppercase())
}
