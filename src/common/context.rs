//! Per-request context threaded through every SCM client operation.
//!
//! A [`RequestContext`] carries the caller's correlation identifier (used only
//! for log correlation), a cancellation token and an optional deadline. All
//! outbound provider requests are run through [`RequestContext::guard`], so a
//! cancelled or expired context aborts in-flight I/O promptly.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::common::error::ScmClientError;
use crate::common::result::ScmResult;

#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: Uuid,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(Uuid::new_v4())
    }
}

impl RequestContext {
    /// Create a context with no deadline and a fresh cancellation token
    pub fn new(correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Use the caller's cancellation token instead of a private one
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Set an absolute deadline
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Cancel this context and every clone sharing its token
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Fail fast if the context is already cancelled or past its deadline.
    pub fn check(&self) -> ScmResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(ScmClientError::Canceled);
        }
        if matches!(self.deadline, Some(deadline) if Instant::now() >= deadline) {
            return Err(ScmClientError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Run `future` until it completes, the context is cancelled, or the
    /// deadline passes, whichever happens first.
    pub async fn guard<F, T>(&self, future: F) -> ScmResult<T>
    where
        F: Future<Output = ScmResult<T>>,
    {
        self.check()?;

        let cancellable = async {
            tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => Err(ScmClientError::Canceled),
                result = future => result,
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, cancellable)
                .await
                .unwrap_or(Err(ScmClientError::DeadlineExceeded)),
            None => cancellable.await,
        }
    }
}
