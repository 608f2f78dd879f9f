//! Handler replies and outcome status resolution.
//!
//! Handlers return a `Reply` rather than an arbitrarily shaped value, so
//! status resolution is a plain match: an explicit status wins, anything
//! else is an implicit success.

/// Status recorded when a handler returns without an explicit status.
pub const IMPLICIT_SUCCESS_STATUS: u16 = 200;

/// Status recorded when a handler faults before attaching a status.
pub const FAULT_STATUS: u16 = 500;

/// Result body of a handler, optionally carrying an explicit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<B> {
    /// Bare body; recorded as `200`.
    Body(B),
    /// Body plus an explicit status code, e.g. `(body, 201)`.
    WithStatus(B, u16),
}

impl<B> Reply<B> {
    /// Bare body with implicit success.
    pub fn new(body: B) -> Self {
        Self::Body(body)
    }

    /// Body with an explicit status code.
    pub fn with_status(body: B, status: u16) -> Self {
        Self::WithStatus(body, status)
    }

    /// Borrow the body.
    pub fn body(&self) -> &B {
        match self {
            Self::Body(b) | Self::WithStatus(b, _) => b,
        }
    }

    /// Split into body and explicit status.
    pub fn into_parts(self) -> (B, Option<u16>) {
        match self {
            Self::Body(b) => (b, None),
            Self::WithStatus(b, s) => (b, Some(s)),
        }
    }

    /// Transform the body, keeping the status.
    pub fn map<C>(self, f: impl FnOnce(B) -> C) -> Reply<C> {
        match self {
            Self::Body(b) => Reply::Body(f(b)),
            Self::WithStatus(b, s) => Reply::WithStatus(f(b), s),
        }
    }
}

impl<B> From<(B, u16)> for Reply<B> {
    fn from((body, status): (B, u16)) -> Self {
        Self::WithStatus(body, status)
    }
}

/// Anything a handler may return that can expose an explicit status.
pub trait ResponseStatus {
    /// The explicit status carried by this value, if any.
    fn explicit_status(&self) -> Option<u16>;

    /// Status to record for a normal return.
    fn resolved_status(&self) -> u16 {
        resolve_status(self.explicit_status())
    }
}

impl<B> ResponseStatus for Reply<B> {
    fn explicit_status(&self) -> Option<u16> {
        match self {
            Self::Body(_) => None,
            Self::WithStatus(_, s) => Some(*s),
        }
    }
}

/// Resolve the status of a normal return: explicit, else `200`.
pub fn resolve_status(explicit: Option<u16>) -> u16 {
    explicit.unwrap_or(IMPLICIT_SUCCESS_STATUS)
}
