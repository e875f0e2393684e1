use super::{session, BridgeState};
use crate::broker::BrokerHandle;
use crate::config::RetryConfig;
use crate::error::{BrokerError, BrokerResult};
use pagewire_protocol::Direction;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A bridge is identified by the page it mirrors and the peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct LinkKey {
    pub(crate) url: String,
    pub(crate) host: String,
}

impl LinkKey {
    pub(crate) fn new(url: &str, host: &str) -> Self {
        Self {
            url: url.to_string(),
            host: host.to_string(),
        }
    }
}

/// The outbound side of a bridge. Runs until cancelled.
pub(crate) struct Link {
    pub(crate) key: LinkKey,
    pub(crate) id: u64,
    pub(crate) direction: Direction,
    pub(crate) retry: RetryConfig,
    pub(crate) connect_timeout: Duration,
    pub(crate) broker: BrokerHandle,
    pub(crate) cancel: CancellationToken,
    /// Answered after the first connect attempt.
    pub(crate) first_attempt: Option<oneshot::Sender<BrokerResult<()>>>,
}

impl Link {
    pub(crate) async fn run(mut self) {
        let mut failures: u32 = 0;

        while !self.cancel.is_cancelled() {
            self.report(BridgeState::Connecting).await;

            let connected = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                res = session::connect(
                    &self.key.host,
                    &self.key.url,
                    self.direction,
                    self.connect_timeout,
                ) => res,
            };

            match connected {
                Ok(ws) => {
                    info!(url = %self.key.url, host = %self.key.host, "bridge connected");
                    self.report(BridgeState::Connected).await;
                    self.resolve_first(Ok(()));
                    failures = 0;

                    let result = session::mirror(
                        ws,
                        &self.key.url,
                        self.direction,
                        &self.broker,
                        &self.cancel,
                    )
                    .await;
                    match result {
                        Ok(()) => break,
                        Err(e) => {
                            warn!(url = %self.key.url, host = %self.key.host, error = %e, "bridge connection lost");
                        }
                    }
                }
                Err(e) => {
                    debug!(url = %self.key.url, host = %self.key.host, error = %e, "bridge connect failed");
                    self.resolve_first(Err(e));
                }
            }

            failures = failures.saturating_add(1);
            let delay = self.retry.delay_for_attempt(failures);
            self.report(BridgeState::BackingOff).await;
            debug!(url = %self.key.url, host = %self.key.host, ?delay, "bridge backing off");

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.resolve_first(Err(BrokerError::Closed));
        debug!(url = %self.key.url, host = %self.key.host, "bridge task finished");
    }

    async fn report(&self, state: BridgeState) {
        self.broker
            .report_bridge_state(&self.key, self.id, state)
            .await;
    }

    fn resolve_first(&mut self, result: BrokerResult<()>) {
        if let Some(reply) = self.first_attempt.take() {
            let _ = reply.send(result);
        }
    }
}
