//! Route guards, evaluated against the live session on every render.
//!
//! Guards are declarative per-route data; nothing is decided at mount time.
//! A view calls [`RouteGuard::evaluate`] with the current [`SessionState`]
//! before rendering children, and again whenever the session store signals a
//! transition.

use parcelflow_core::Role;
use parcelflow_client::SessionState;
use tracing::debug;

/// Where unauthenticated visitors to protected views are sent.
pub const LOGIN_ROUTE: &str = "/auth/login";
/// Neutral route for authenticated users whose role does not match.
pub const HOME_ROUTE: &str = "/";

/// Access requirements for one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteGuard {
    require_auth: bool,
    allowed_roles: Option<&'static [Role]>,
}

impl RouteGuard {
    /// No requirements; always renders.
    #[must_use]
    pub const fn public() -> Self {
        Self {
            require_auth: false,
            allowed_roles: None,
        }
    }

    /// Requires a session, any role.
    #[must_use]
    pub const fn authenticated() -> Self {
        Self {
            require_auth: true,
            allowed_roles: None,
        }
    }

    /// Requires a session with one of the given roles. Sub-routes share the
    /// same guard, so an admin stays on any admin page they navigate to.
    #[must_use]
    pub const fn roles(allowed: &'static [Role]) -> Self {
        Self {
            require_auth: true,
            allowed_roles: Some(allowed),
        }
    }

    /// Decide whether the guarded view may render for this session state.
    #[must_use]
    pub fn evaluate(&self, session: &SessionState) -> GuardDecision {
        if !self.require_auth {
            return GuardDecision::Allow;
        }

        match session {
            SessionState::Anonymous => {
                debug!("unauthenticated access to protected route");
                GuardDecision::RedirectToLogin
            }
            // A login (or restore) is in progress; hold rendering rather
            // than flashing a redirect.
            SessionState::Authenticating => GuardDecision::Pending,
            SessionState::Authenticated(session) => match self.allowed_roles {
                Some(allowed) if !allowed.contains(&session.role()) => {
                    debug!(role = %session.role(), "role not permitted on route");
                    GuardDecision::RedirectHome
                }
                _ => GuardDecision::Allow,
            },
        }
    }
}

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the guarded children.
    Allow,
    /// Session resolution in progress; render nothing yet.
    Pending,
    /// Not authenticated; leave before any child data loads.
    RedirectToLogin,
    /// Authenticated but wrong role; send to the neutral route.
    RedirectHome,
}

impl GuardDecision {
    /// The route to navigate to, when the decision is a redirect.
    #[must_use]
    pub const fn redirect_target(&self) -> Option<&'static str> {
        match self {
            Self::RedirectToLogin => Some(LOGIN_ROUTE),
            Self::RedirectHome => Some(HOME_ROUTE),
            Self::Allow | Self::Pending => None,
        }
    }
}
