//! Per-call cancellation.
//!
//! Every call observes exactly one [`EffectiveSignal`]. It merges the caller's
//! [`CancellationToken`] with at most one timeout, picked from the call
//! options or, failing that, the client default. No timer task is spawned:
//! the deadline is only slept on inside [`EffectiveSignal::fired`], so the
//! timer goes away as soon as that future resolves or is dropped.

use crate::config::{CallOptions, ClientConfig, Timeout};
use std::fmt;
use std::future::pending;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Why a call was aborted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbortReason {
    /// The caller's cancellation token was cancelled
    Caller,
    /// The call's timeout elapsed
    Timeout,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Caller => f.write_str("cancelled by caller"),
            Self::Timeout => f.write_str("timed out"),
        }
    }
}

/// The single cancellation signal a call observes.
///
/// Clones share the same outcome: once any clone has seen the signal fire,
/// all of them report the same [`AbortReason`].
#[derive(Clone, Debug)]
pub struct EffectiveSignal {
    external: Option<CancellationToken>,
    deadline: Option<Instant>,
    fired: Arc<OnceLock<AbortReason>>,
}

impl EffectiveSignal {
    /// Merge an optional caller token with an optional timeout.
    ///
    /// The timeout starts counting now. A timeout too large to be
    /// represented as a deadline never fires.
    pub fn new(external: Option<CancellationToken>, timeout: Option<Duration>) -> Self {
        Self {
            external,
            deadline: timeout.and_then(|t| Instant::now().checked_add(t)),
            fired: Arc::new(OnceLock::new()),
        }
    }

    /// A signal that never fires
    pub fn never() -> Self {
        Self::new(None, None)
    }

    /// Build the signal for a call from the client defaults and call options
    pub fn from_options(config: &ClientConfig, options: &CallOptions) -> Self {
        Self::new(
            options.signal.clone(),
            effective_timeout(config.timeout, options.timeout),
        )
    }

    /// Deadline of the active timeout, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The reason the signal fired, if it already has.
    ///
    /// This does not wait; it checks both sources as of now.
    pub fn reason(&self) -> Option<AbortReason> {
        if let Some(reason) = self.fired.get() {
            return Some(*reason);
        }
        let reason = if self.external.as_ref().is_some_and(|t| t.is_cancelled()) {
            AbortReason::Caller
        } else if self.deadline.is_some_and(|d| d <= Instant::now()) {
            AbortReason::Timeout
        } else {
            return None;
        };
        Some(*self.fired.get_or_init(|| reason))
    }

    /// Whether the signal has fired
    pub fn is_fired(&self) -> bool {
        self.reason().is_some()
    }

    /// Wait until the signal fires.
    ///
    /// Never resolves when there is neither a token nor a timeout.
    pub async fn fired(&self) -> AbortReason {
        if let Some(reason) = self.reason() {
            return reason;
        }
        let reason = tokio::select! {
            biased;
            _ = cancelled(self.external.as_ref()) => AbortReason::Caller,
            _ = elapsed(self.deadline) => AbortReason::Timeout,
        };
        *self.fired.get_or_init(|| reason)
    }
}

/// Pick the single timeout that applies to a call.
///
/// A per-call duration wins over the client default, and `Disabled` turns
/// timeouts off entirely. A zero duration on either level means no timeout.
pub fn effective_timeout(default: Option<Duration>, call: Option<Timeout>) -> Option<Duration> {
    match call {
        Some(Timeout::Disabled) => None,
        Some(Timeout::After(duration)) => Some(duration),
        None => default,
    }
    .filter(|d| !d.is_zero())
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => pending().await,
    }
}

async fn elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
