use axum::http::HeaderMap;

pub const SUBJECT_HEADER: &str = "x-authenticated-subject";
pub const ROLE_HEADER: &str = "x-authenticated-role";

/// Authenticated caller identity, produced upstream (the authenticating
/// reverse proxy) and read-only here. One role per identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub role: String,
}

impl Identity {
    pub fn new(subject: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            role: role.into(),
        }
    }

    /// Recover the identity the authentication layer attached to the
    /// request. Both headers must be present and non-empty; anything less
    /// is treated as an unauthenticated request.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let subject = headers.get(SUBJECT_HEADER)?.to_str().ok()?.trim();
        let role = headers.get(ROLE_HEADER)?.to_str().ok()?.trim();
        if subject.is_empty() || role.is_empty() {
            return None;
        }
        Some(Self::new(subject, role))
    }
}
