//! Execution context carrying a cancellation signal and an optional deadline
//!
//! Every call that reaches out to the environment or to STS runs through
//! [`Context::run`], so a cancelled or expired context aborts it promptly.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{BootstrapError, Result};

/// Cancellation/deadline scope for bootstrap operations
#[derive(Debug, Clone)]
pub struct Context {
    cancelled: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

/// Handle that cancels every [`Context`] derived from the same root
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        let (_, cancelled) = watch::channel(false);
        Self {
            cancelled,
            deadline: None,
        }
    }

    /// A context plus the handle that cancels it
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (sender, cancelled) = watch::channel(false);
        (
            Self {
                cancelled,
                deadline: None,
            },
            CancelHandle { sender },
        )
    }

    /// Derive a context that expires at `deadline`, or earlier if the parent does
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            cancelled: self.cancelled.clone(),
            deadline: Some(deadline),
        }
    }

    /// Derive a context that expires `timeout` from now
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Check the context without running anything
    pub fn check(&self, operation: &'static str) -> Result<()> {
        if self.is_cancelled() {
            return Err(BootstrapError::Cancelled { operation });
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(BootstrapError::DeadlineExceeded { operation })
            }
            _ => Ok(()),
        }
    }

    /// Drive `future` to completion unless the context is cancelled or expires first.
    ///
    /// An already-cancelled or expired context never polls `future`.
    pub async fn run<F>(&self, operation: &'static str, future: F) -> Result<F::Output>
    where
        F: Future,
    {
        self.check(operation)?;

        let mut cancelled = self.cancelled.clone();
        let cancellation = async move {
            let closed = cancelled.wait_for(|c| *c).await.is_err();
            // A dropped sender can never cancel, so wait forever
            if closed {
                std::future::pending::<()>().await;
            }
        };
        let expiry = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancellation => Err(BootstrapError::Cancelled { operation }),
            _ = expiry => Err(BootstrapError::DeadlineExceeded { operation }),
            output = future => Ok(output),
        }
    }
}
