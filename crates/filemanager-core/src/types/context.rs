//! Request context carrying the caller identity for security logging.

use serde::{Deserialize, Serialize};

/// Who is calling into an adapter.
///
/// Authorization happens before the adapter is reached; this context only
/// names the caller in security events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Authenticated user identifier, if any.
    pub user: Option<String>,
    /// IP address of the request origin.
    pub ip_address: Option<String>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user: Option<String>, ip_address: Option<String>) -> Self {
        Self { user, ip_address }
    }

    /// User for log fields.
    pub fn user_label(&self) -> &str {
        self.user.as_deref().unwrap_or("anonymous")
    }

    /// IP for log fields.
    pub fn ip_label(&self) -> &str {
        self.ip_address.as_deref().unwrap_or("unknown")
    }
}
