//! Route-access predicate.
//!
//! Pure decision logic: given a destination and the current session, either
//! allow rendering or redirect to the login entry point. Kept free of any
//! I/O so every consumer (CLI today, anything else later) gates access the
//! same way.

use chrono::{DateTime, Utc};

use crate::models::Session;

/// Navigable surfaces of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
    Upload,
    JobHistory,
}

impl Route {
    pub fn is_protected(self) -> bool {
        !matches!(self, Route::Login | Route::Signup)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectToLogin,
}

/// A protected route renders only for a present, non-expired session.
pub fn resolve(route: Route, session: Option<&Session>, now: DateTime<Utc>) -> RouteDecision {
    if !route.is_protected() {
        return RouteDecision::Allow;
    }
    match session {
        Some(session) if !session.is_expired(now) => RouteDecision::Allow,
        _ => RouteDecision::RedirectToLogin,
    }
}
