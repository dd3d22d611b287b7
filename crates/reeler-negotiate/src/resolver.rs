//! Seam implementation producing this cycle's eligible targets.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use reeler_capture::{ResolvedTarget, TargetResolver};
use reeler_config::{Credentials, TargetAllowList};
use tokio::time::timeout;
use tracing::debug;

use crate::NEGOTIATION_TIMEOUT;
use crate::error::NegotiateError;
use crate::site::SiteClient;

/// Resolver that logs in, fetches the online listing, and applies the
/// configured allow-list.
pub struct SiteResolver {
    site: Arc<SiteClient>,
    credentials: Credentials,
    allow: TargetAllowList,
}

impl SiteResolver {
    /// Construct a resolver sharing the authenticated site session.
    #[must_use]
    pub const fn new(site: Arc<SiteClient>, credentials: Credentials, allow: TargetAllowList) -> Self {
        Self {
            site,
            credentials,
            allow,
        }
    }
}

#[async_trait]
impl TargetResolver for SiteResolver {
    async fn resolve(&self) -> anyhow::Result<Vec<ResolvedTarget>> {
        let names = timeout(NEGOTIATION_TIMEOUT, async {
            // Sessions expire between cycles; log in fresh each time.
            self.site.login(&self.credentials).await?;
            self.site.online_targets().await
        })
        .await
        .map_err(|_elapsed| NegotiateError::Timeout {
            operation: "resolve online targets".to_string(),
            after_secs: NEGOTIATION_TIMEOUT.as_secs(),
        })??;

        let eligible = eligible_targets(names, &self.allow);
        debug!(eligible = eligible.len(), "resolved candidate targets");
        Ok(eligible)
    }
}

/// Deduplicate the listing and apply the allow-list, preserving name order.
pub(crate) fn eligible_targets(
    names: Vec<String>,
    allow: &TargetAllowList,
) -> Vec<ResolvedTarget> {
    let mut seen = BTreeSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .filter(|name| allow.permits(name))
        .map(ResolvedTarget::named)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_collapsed() {
        let allow = TargetAllowList::compile(&[]).expect("empty allow-list");
        let names = vec!["alpha".to_string(), "beta".to_string(), "alpha".to_string()];
        let eligible = eligible_targets(names, &allow);
        let names: Vec<_> = eligible.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn allow_list_filters_candidates() {
        let allow =
            TargetAllowList::compile(&["beta_*".to_string()]).expect("allow-list compiles");
        let names = vec![
            "alpha".to_string(),
            "beta_one".to_string(),
            "beta_two".to_string(),
        ];
        let eligible = eligible_targets(names, &allow);
        let names: Vec<_> = eligible.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["beta_one", "beta_two"]);
    }

    #[test]
    fn candidates_carry_no_descriptor_hint() {
        let allow = TargetAllowList::compile(&[]).expect("empty allow-list");
        let eligible = eligible_targets(vec!["alpha".to_string()], &allow);
        assert!(eligible[0].descriptor_hint.is_none());
    }
}
