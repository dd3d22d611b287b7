//! Seam implementation that turns a target name into a capture descriptor.

use std::sync::Arc;

use async_trait::async_trait;
use reeler_capture::{CaptureDescriptor, StreamNegotiator};
use tokio::time::timeout;
use tracing::debug;

use crate::NEGOTIATION_TIMEOUT;
use crate::error::{NegotiateError, NegotiateResult};
use crate::handshake::negotiate_over_websocket;
use crate::parse::{extract_page_params, normalize_endpoint};
use crate::site::SiteClient;

/// Negotiator backed by the platform's page markup and push protocol.
pub struct PushNegotiator {
    site: Arc<SiteClient>,
}

impl PushNegotiator {
    /// Construct a negotiator sharing the authenticated site session.
    #[must_use]
    pub const fn new(site: Arc<SiteClient>) -> Self {
        Self { site }
    }

    async fn negotiate_inner(&self, target: &str) -> NegotiateResult<CaptureDescriptor> {
        let page = self.site.target_page(target).await?;
        let params = extract_page_params(&page)?;
        let endpoint = normalize_endpoint(&params.endpoint);
        debug!(target_name = %target, endpoint = %endpoint, "opening push-protocol handshake");
        negotiate_over_websocket(&endpoint, &params.credential, target).await
    }
}

#[async_trait]
impl StreamNegotiator for PushNegotiator {
    async fn negotiate(&self, target: &str) -> anyhow::Result<CaptureDescriptor> {
        let descriptor = timeout(NEGOTIATION_TIMEOUT, self.negotiate_inner(target))
            .await
            .map_err(|_elapsed| NegotiateError::Timeout {
                operation: format!("negotiate {target}"),
                after_secs: NEGOTIATION_TIMEOUT.as_secs(),
            })??;
        Ok(descriptor)
    }
}
