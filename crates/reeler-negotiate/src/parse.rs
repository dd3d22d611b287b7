//! Typed extraction of negotiation parameters from target pages.
//!
//! The platform embeds the session credential and the push endpoint in the
//! target's page markup. Each expected marker that is absent aborts the
//! negotiation with a named [`NegotiateError::ParameterNotFound`] instead of
//! propagating an undefined value.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{NegotiateError, NegotiateResult};

static USER_UID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"var user = new User\(([\s\S]+?),").expect("static regex compiles"));

static CHILD_SESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"startChildBug\(user\.uid, '([\s\S]+?)', '([\s\S]+?)'")
        .expect("static regex compiles")
});

/// Known push-endpoint hostnames and their published addresses.
const ENDPOINT_ADDRESSES: &[(&str, &str)] = &[
    ("j11.showup.tv", "94.23.171.115"),
    ("j12.showup.tv", "94.23.171.122"),
    ("j13.showup.tv", "94.23.171.121"),
    ("j14.showup.tv", "94.23.171.120"),
];

/// Session credential presented on the push connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionCredential {
    pub(crate) uid: String,
    pub(crate) password: String,
}

/// Parameters recovered from one target page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageParams {
    pub(crate) credential: SessionCredential,
    pub(crate) endpoint: String,
}

/// Extract the session credential and push endpoint from page markup.
pub(crate) fn extract_page_params(html: &str) -> NegotiateResult<PageParams> {
    let uid = capture(&USER_UID, html, 1).ok_or(NegotiateError::ParameterNotFound {
        marker: "user.uid",
    })?;

    let session = CHILD_SESSION
        .captures(html)
        .ok_or(NegotiateError::ParameterNotFound {
            marker: "session.handoff",
        })?;
    let password = session
        .get(1)
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(NegotiateError::ParameterNotFound {
            marker: "session.password",
        })?;
    let endpoint = session
        .get(2)
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(NegotiateError::ParameterNotFound {
            marker: "push.endpoint",
        })?;

    Ok(PageParams {
        credential: SessionCredential { uid, password },
        endpoint,
    })
}

/// Rewrite known push-endpoint hostnames to their published addresses and
/// prefix the websocket scheme.
pub(crate) fn normalize_endpoint(endpoint: &str) -> String {
    let mut parts = endpoint.splitn(2, ':');
    let host = parts.next().unwrap_or(endpoint);
    let port = parts.next();

    ENDPOINT_ADDRESSES
        .iter()
        .find(|(name, _)| *name == host)
        .map_or_else(
            || format!("ws://{endpoint}"),
            |(_, address)| {
                port.map_or_else(
                    || format!("ws://{address}"),
                    |port| format!("ws://{address}:{port}"),
                )
            },
        )
}

fn capture(regex: &Regex, html: &str, group: usize) -> Option<String> {
    regex
        .captures(html)
        .and_then(|captures| captures.get(group))
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r"
        <script>
        var user = new User(482913, 'viewer');
        startChildBug(user.uid, 'ws-pass-01', 'j12.showup.tv:8081');
        </script>
    ";

    #[test]
    fn extracts_all_parameters_from_a_sample_page() {
        let params = extract_page_params(SAMPLE_PAGE).expect("sample page parses");
        assert_eq!(params.credential.uid, "482913");
        assert_eq!(params.credential.password, "ws-pass-01");
        assert_eq!(params.endpoint, "j12.showup.tv:8081");
    }

    #[test]
    fn missing_uid_marker_is_named() {
        let page = "startChildBug(user.uid, 'ws-pass-01', 'j12.showup.tv:8081'";
        let err = extract_page_params(page).expect_err("uid should be missing");
        assert!(matches!(
            err,
            NegotiateError::ParameterNotFound { marker: "user.uid" }
        ));
    }

    #[test]
    fn missing_session_marker_is_named() {
        let page = "var user = new User(482913,";
        let err = extract_page_params(page).expect_err("session should be missing");
        assert!(matches!(
            err,
            NegotiateError::ParameterNotFound {
                marker: "session.handoff"
            }
        ));
    }

    #[test]
    fn known_endpoint_hosts_are_rewritten() {
        assert_eq!(
            normalize_endpoint("j12.showup.tv:8081"),
            "ws://94.23.171.122:8081"
        );
        assert_eq!(
            normalize_endpoint("j14.showup.tv:9090"),
            "ws://94.23.171.120:9090"
        );
    }

    #[test]
    fn unknown_endpoints_pass_through() {
        assert_eq!(
            normalize_endpoint("edge.example.net:7070"),
            "ws://edge.example.net:7070"
        );
        assert_eq!(normalize_endpoint("bare-host"), "ws://bare-host");
    }
}
