//! GitOps sync trigger.
//!
//! Right after a manifest is committed the GitOps controller may not have
//! picked up the application yet, and the platform answers the sync with
//! a 500 carrying [`NOT_VISIBLE_YET`]. That one response is retried on a
//! fixed interval; every other non-200 is final.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{ControlError, ControlResult};
use crate::platform::{AppSyncRequest, PlatformClient};
use crate::remote::PollPolicy;
use crate::transport::ApiResponse;

/// Body fragment (matched case-insensitively) meaning the controller has
/// not seen the application yet.
pub const NOT_VISIBLE_YET: &str = "could not find any argocd applications";

const OPERATION: &str = "sync application";

/// How a sync response is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncResponse {
    /// Accepted.
    Accepted,
    /// The controller cannot see the application yet; retry.
    NotVisibleYet,
    /// Any other failure.
    Rejected,
}

impl SyncResponse {
    /// Classify a sync response.
    #[must_use]
    pub fn classify(response: &ApiResponse) -> Self {
        match response.status {
            200 => Self::Accepted,
            500 if response.text.to_lowercase().contains(NOT_VISIBLE_YET) => Self::NotVisibleYet,
            _ => Self::Rejected,
        }
    }
}

/// Sends sync requests, retrying while the application is not visible.
pub struct SyncTrigger {
    client: Arc<PlatformClient>,
    clock: Arc<dyn Clock>,
    policy: PollPolicy,
}

impl SyncTrigger {
    /// Create a trigger. `policy.max_attempts` bounds the retries.
    #[must_use]
    pub fn new(client: Arc<PlatformClient>, clock: Arc<dyn Clock>, policy: PollPolicy) -> Self {
        Self {
            client,
            clock,
            policy,
        }
    }

    /// Request a sync. Returns the number of requests sent.
    ///
    /// Attempt `n` is retried while `n <= max_attempts`, so a phrase that
    /// never clears costs `max_attempts + 1` requests before failing with
    /// [`ControlError::ResourceNotFoundYet`].
    pub async fn sync(
        &self,
        request: &AppSyncRequest,
        cancel: &CancellationToken,
    ) -> ControlResult<u32> {
        let mut attempt = 1;

        loop {
            if cancel.is_cancelled() {
                return Err(ControlError::cancelled(OPERATION));
            }

            let response = self.client.sync_application(request).await?;
            match SyncResponse::classify(&response) {
                SyncResponse::Accepted => {
                    info!(application = %request.application_name, attempt, "sync accepted");
                    return Ok(attempt);
                }
                SyncResponse::NotVisibleYet if attempt <= self.policy.max_attempts => {
                    warn!(
                        application = %request.application_name,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        "application not visible to controller yet, retrying"
                    );
                    tokio::select! {
                        () = cancel.cancelled() => return Err(ControlError::cancelled(OPERATION)),
                        () = self.clock.sleep(self.policy.interval) => {}
                    }
                    attempt += 1;
                }
                SyncResponse::NotVisibleYet => {
                    return Err(ControlError::ResourceNotFoundYet {
                        operation: OPERATION.to_owned(),
                        attempts: attempt,
                    });
                }
                SyncResponse::Rejected => return Err(ControlError::remote(OPERATION, &response)),
            }
        }
    }
}

impl std::fmt::Debug for SyncTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncTrigger")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
