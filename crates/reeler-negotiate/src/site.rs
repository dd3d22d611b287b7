//! Authenticated HTTP session against the streaming platform.

use reeler_config::Credentials;
use reqwest::header::REFERER;
use serde_json::Value;
use tracing::debug;

use crate::error::{NegotiateError, NegotiateResult};

/// Cookie-backed HTTP client for the platform's site endpoints.
pub struct SiteClient {
    http: reqwest::Client,
    base_url: String,
}

impl SiteClient {
    /// Build a client with a fresh cookie store for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> NegotiateResult<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|source| NegotiateError::Http {
                operation: "client.build",
                source,
            })?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// Base URL the client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Establish an authenticated session.
    ///
    /// The rules-acceptance request must precede the login post, and a failed
    /// login is detected from the returned markup (the site echoes the login
    /// form back), not from the status code.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails or the credentials are rejected.
    pub async fn login(&self, credentials: &Credentials) -> NegotiateResult<()> {
        let base = &self.base_url;
        self.http
            .get(format!("{base}/site/accept_rules/yes?ref={base}/site/log_in"))
            .header(REFERER, format!("{base}/site/accept_rules?ref={base}/site/log_in"))
            .send()
            .await
            .map_err(|source| NegotiateError::Http {
                operation: "login.accept_rules",
                source,
            })?;

        let response = self
            .http
            .post(format!("{base}/site/log_in?ref={base}/TransList/fullList"))
            .header(REFERER, format!("{base}/site/log_in"))
            .form(&[
                ("email", credentials.email.as_str()),
                ("password", credentials.password.as_str()),
                ("remember", ""),
                ("submitLogin", "Zaloguj"),
            ])
            .send()
            .await
            .map_err(|source| NegotiateError::Http {
                operation: "login.submit",
                source,
            })?;
        let body = response
            .text()
            .await
            .map_err(|source| NegotiateError::Http {
                operation: "login.read",
                source,
            })?;

        if login_was_rejected(&body) {
            return Err(NegotiateError::LoginRejected);
        }
        debug!("site session established");
        Ok(())
    }

    /// Fetch the currently-online target listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the listing payload cannot be
    /// interpreted.
    pub async fn online_targets(&self) -> NegotiateResult<Vec<String>> {
        let response = self
            .http
            .get(format!("{}/site/favorites", self.base_url))
            .header(REFERER, self.base_url.clone())
            .send()
            .await
            .map_err(|source| NegotiateError::Http {
                operation: "listing.fetch",
                source,
            })?;
        let body = response
            .text()
            .await
            .map_err(|source| NegotiateError::Http {
                operation: "listing.read",
                source,
            })?;

        let listing: Value =
            serde_json::from_str(&body).map_err(|source| NegotiateError::Json {
                operation: "listing.parse",
                source,
            })?;
        let list = listing
            .get("list")
            .and_then(Value::as_str)
            .ok_or(NegotiateError::ListingUnavailable {
                reason: "missing list field",
            })?;

        Ok(parse_listing(list))
    }

    /// Fetch a target's page markup.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn target_page(&self, target: &str) -> NegotiateResult<String> {
        let response = self
            .http
            .get(format!("{}/{target}", self.base_url))
            .send()
            .await
            .map_err(|source| NegotiateError::Http {
                operation: "page.fetch",
                source,
            })?;
        response
            .text()
            .await
            .map_err(|source| NegotiateError::Http {
                operation: "page.read",
                source,
            })
    }
}

/// The listing is `;`-separated entries whose second `,`-separated column is
/// the target name; blank entries are dropped.
pub(crate) fn parse_listing(list: &str) -> Vec<String> {
    list.split(';')
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| entry.split(',').nth(1))
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub(crate) fn login_was_rejected(body: &str) -> bool {
    body.contains(r#"name="submitLogin""#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_entries_yield_their_second_column() {
        let names = parse_listing("12,alpha;34,beta;;56,gamma");
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn malformed_listing_entries_are_dropped() {
        let names = parse_listing("12;;34,;56,delta");
        assert_eq!(names, vec!["delta"]);
    }

    #[test]
    fn empty_listing_yields_nothing() {
        assert!(parse_listing("").is_empty());
    }

    #[test]
    fn echoed_login_form_means_rejection() {
        assert!(login_was_rejected(
            r#"<form><input name="submitLogin" type="submit"></form>"#
        ));
        assert!(!login_was_rejected("<html><body>welcome back</body></html>"));
    }

    #[test]
    fn base_url_is_normalized() {
        let client = SiteClient::new("https://stream.example/").expect("client builds");
        assert_eq!(client.base_url(), "https://stream.example");
    }
}
