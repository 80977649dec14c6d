//! Login flow state machine
//!
//! A flow moves strictly forward:
//! `Started -> CallbackReceived -> Exchanged -> Verified -> Resolved -> Issued`.
//! Any non-terminal state may move to `Failed`. Flows that start from
//! client-held tokens enter at `Exchanged`.

use std::fmt;

use moneymon_domain::AuthProvider;
use tracing::debug;

use super::errors::{AuthFlowError, AuthResult};

/// Position of one login attempt in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowState {
    Started,
    CallbackReceived,
    Exchanged,
    Verified,
    Resolved,
    Issued,
    Failed,
}

impl FlowState {
    /// Lowercase label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::CallbackReceived => "callback_received",
            Self::Exchanged => "exchanged",
            Self::Verified => "verified",
            Self::Resolved => "resolved",
            Self::Issued => "issued",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Issued | Self::Failed)
    }

    /// Whether `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (_, Self::Failed)
                | (Self::Started, Self::CallbackReceived)
                | (Self::CallbackReceived, Self::Exchanged)
                | (Self::Exchanged, Self::Verified)
                | (Self::Verified, Self::Resolved)
                | (Self::Resolved, Self::Issued)
        )
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of the states one flow has passed through.
#[derive(Debug, Clone)]
pub struct FlowTrace {
    provider: AuthProvider,
    history: Vec<FlowState>,
}

impl FlowTrace {
    /// Trace for a flow that just issued an authorization URL.
    #[must_use]
    pub fn started(provider: AuthProvider) -> Self {
        Self { provider, history: vec![FlowState::Started] }
    }

    /// Trace for a callback whose `Started` half ran in an earlier request.
    #[must_use]
    pub fn from_callback(provider: AuthProvider) -> Self {
        Self { provider, history: vec![FlowState::Started, FlowState::CallbackReceived] }
    }

    /// Trace for a flow entered with tokens already in hand.
    #[must_use]
    pub fn from_tokens(provider: AuthProvider) -> Self {
        Self { provider, history: vec![FlowState::Exchanged] }
    }

    #[must_use]
    pub const fn provider(&self) -> AuthProvider {
        self.provider
    }

    #[must_use]
    pub fn current(&self) -> FlowState {
        self.history.last().copied().unwrap_or(FlowState::Started)
    }

    #[must_use]
    pub fn history(&self) -> &[FlowState] {
        &self.history
    }

    /// Move to `next`.
    ///
    /// # Errors
    /// Returns `AuthFlowError::InternalFailure` for an illegal transition;
    /// the trace is left unchanged.
    pub fn advance(&mut self, next: FlowState) -> AuthResult<()> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(AuthFlowError::InternalFailure(format!(
                "illegal flow transition {current} -> {next}"
            )));
        }
        debug!(provider = %self.provider, from = %current, to = %next, "flow transition");
        self.history.push(next);
        Ok(())
    }

    /// Mark the flow failed unless it already reached a terminal state.
    pub fn fail(&mut self) {
        if !self.current().is_terminal() {
            self.history.push(FlowState::Failed);
        }
    }
}
