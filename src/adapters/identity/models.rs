//! Identity service API models
//!
//! Wire shapes for the token endpoint and the paginated search responses.
//! These are kept apart from the domain types and converted at the edge.

use crate::domain::Resource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Link relation that continues a paginated search
pub const NEXT_RELATION: &str = "next";

/// Body POSTed to the token endpoint
#[derive(Serialize)]
pub(crate) struct TokenRequest<'a> {
    #[serde(rename = "Username")]
    pub username: &'a str,
    #[serde(rename = "Password")]
    pub password: &'a str,
    #[serde(rename = "AppName")]
    pub app_name: &'a str,
    #[serde(rename = "AppKey")]
    pub app_key: &'a str,
    pub scope: &'a str,
}

/// Bearer token returned by the token endpoint
///
/// Cached for the life of the process. `Debug` never prints the token.
#[derive(Clone)]
pub struct BearerCredential {
    token: String,
}

impl BearerCredential {
    /// Parses a token endpoint body
    ///
    /// The body is the token itself, optionally wrapped as a JSON string
    /// literal. Returns `None` for an empty token.
    pub fn from_body(body: &str) -> Option<Self> {
        let trimmed = body.trim();
        let token = if trimmed.starts_with('"') {
            serde_json::from_str::<String>(trimmed).ok()?
        } else {
            trimmed.to_string()
        };

        if token.is_empty() {
            None
        } else {
            Some(Self { token })
        }
    }

    /// `Authorization` header value
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerCredential([REDACTED])")
    }
}

/// One page of a search response (`entry[]` plus `link[]`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub entry: Vec<SearchEntry>,

    #[serde(default)]
    pub link: Vec<SearchLink>,
}

/// A search entry; entries without a resource are skipped
#[derive(Debug, Clone, Deserialize)]
pub struct SearchEntry {
    #[serde(default)]
    pub resource: Option<Resource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchLink {
    pub relation: String,
    pub url: String,
}

impl SearchPage {
    /// URL of the first `next` link, if any
    ///
    /// Later `next` links on the same page are ignored; an empty URL ends
    /// pagination.
    pub fn next_url(&self) -> Option<&str> {
        self.link
            .iter()
            .find(|link| link.relation == NEXT_RELATION)
            .map(|link| link.url.as_str())
            .filter(|url| !url.trim().is_empty())
    }

    /// Consumes the page and returns its resources in entry order
    pub fn into_resources(self) -> impl Iterator<Item = Resource> {
        self.entry.into_iter().filter_map(|entry| entry.resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_from_plain_body() {
        let credential = BearerCredential::from_body("  abc.def.ghi\n").unwrap();
        assert_eq!(credential.header_value(), "Bearer abc.def.ghi");
    }

    #[test]
    fn test_credential_from_json_string_body() {
        let credential = BearerCredential::from_body("\"abc.def\"").unwrap();
        assert_eq!(credential.header_value(), "Bearer abc.def");
        assert!(BearerCredential::from_body("").is_none());
        assert!(BearerCredential::from_body("\"\"").is_none());
    }

    #[test]
    fn test_credential_debug_redacted() {
        let credential = BearerCredential::from_body("secret-token").unwrap();
        assert!(!format!("{credential:?}").contains("secret-token"));
    }

    #[test]
    fn test_only_first_next_link_is_honored() {
        let page: SearchPage = serde_json::from_str(
            r#"{ "link": [
                { "relation": "self", "url": "http://x/1" },
                { "relation": "next", "url": "http://x/2" },
                { "relation": "next", "url": "http://x/3" } ] }"#,
        )
        .unwrap();
        assert_eq!(page.next_url(), Some("http://x/2"));
    }

    #[test]
    fn test_empty_links_end_pagination() {
        let page: SearchPage = serde_json::from_str(r#"{ "entry": [], "link": [] }"#).unwrap();
        assert_eq!(page.next_url(), None);

        let page: SearchPage = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(page.next_url(), None);
    }

    #[test]
    fn test_entries_without_resource_are_skipped() {
        let page: SearchPage = serde_json::from_str(
            r#"{ "entry": [ { "resource": { "id": "1" } }, { "fullUrl": "x" }, { "resource": { "id": "2" } } ] }"#,
        )
        .unwrap();
        let ids: Vec<String> = page
            .into_resources()
            .filter_map(|r| r.id().map(str::to_string))
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
