use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// A credential is refreshed once it gets this close to expiry.
pub const SAFETY_MARGIN_SECS: i64 = 60;

/// Platform access token plus its absolute expiry.
#[derive(Clone)]
pub struct Credential {
    token: String,
    expires_in: u64,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// Credential issued now, valid for `expires_in` seconds.
    pub fn new(token: impl Into<String>, expires_in: u64) -> Self {
        Self::issued_at(token, expires_in, Utc::now())
    }

    pub fn issued_at(token: impl Into<String>, expires_in: u64, issued_at: DateTime<Utc>) -> Self {
        let ttl = i64::try_from(expires_in)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            token: token.into(),
            expires_in,
            issued_at,
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }

    pub fn issued_at_time(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True while `now` is more than the safety margin before expiry.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        match now.checked_add_signed(Duration::seconds(SAFETY_MARGIN_SECS)) {
            Some(deadline) => deadline < self.expires_at,
            None => false,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.is_usable_at(Utc::now())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_is_issue_plus_ttl() {
        let issued = Utc::now();
        let cred = Credential::issued_at("tok", 7200, issued);
        assert_eq!(cred.expires_at() - issued, Duration::seconds(7200));
        assert_eq!(cred.expires_in(), 7200);
    }

    #[test]
    fn test_usable_outside_margin() {
        let issued = Utc::now();
        let cred = Credential::issued_at("tok", 7200, issued);
        assert!(cred.is_usable_at(issued));
        assert!(cred.is_usable_at(issued + Duration::seconds(7200 - SAFETY_MARGIN_SECS - 1)));
    }

    #[test]
    fn test_unusable_at_or_inside_margin() {
        let issued = Utc::now();
        let cred = Credential::issued_at("tok", 7200, issued);
        assert!(!cred.is_usable_at(issued + Duration::seconds(7200 - SAFETY_MARGIN_SECS)));
        assert!(!cred.is_usable_at(issued + Duration::seconds(7200)));
        assert!(!cred.is_usable_at(issued + Duration::seconds(9000)));
    }

    #[test]
    fn test_short_ttl_never_usable() {
        let cred = Credential::new("tok", 30);
        assert!(!cred.is_usable());
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let cred = Credential::new("tok", u64::MAX);
        assert!(cred.is_usable());
    }

    #[test]
    fn test_debug_redacts_token() {
        let cred = Credential::new("super-secret-token", 7200);
        let debug = format!("{:?}", cred);
        assert!(!debug.contains("super-secret-token"));
    }
}
