// src/sync.rs

//! Signed-in identity and the cloud sync hook.
//!
//! There is no remote backend yet: [`LoggingSync`] only records who would
//! have been synced. Local writes never wait on or fail because of sync.

use crate::db::{Medium, USER_KEY};
use crate::error::{EcoError, Result};
use crate::models::LogEntry;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Identity claims taken from the provider's ID token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub sub: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub picture: String,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Upload failed: {0}")]
    Upload(String),
}

pub trait CloudSync {
    fn upload(&self, entries: &[LogEntry]) -> std::result::Result<(), SyncError>;
}

pub struct LoggingSync {
    identity: Option<Identity>,
}

impl LoggingSync {
    pub fn new(identity: Option<Identity>) -> Self {
        Self { identity }
    }
}

impl CloudSync for LoggingSync {
    fn upload(&self, entries: &[LogEntry]) -> std::result::Result<(), SyncError> {
        let identity = self.identity.as_ref().ok_or(SyncError::NotSignedIn)?;
        info!(email = %identity.email, entries = entries.len(), "syncing data");
        Ok(())
    }
}

/// Runs after a successful local write. Failures are logged and dropped.
pub fn sync_after_write(sync: &dyn CloudSync, entries: &[LogEntry]) {
    if let Err(e) = sync.upload(entries) {
        warn!(error = %e, "auto-sync failed");
    }
}

/// Reads the claims from the payload segment of a JWT. The signature is not
/// checked; the token comes straight from the identity provider.
pub fn decode_identity_token(token: &str) -> Result<Identity> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| EcoError::InvalidToken("expected three dot-separated segments".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| EcoError::InvalidToken(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| EcoError::InvalidToken(e.to_string()))
}

pub fn signed_in_user(medium: &Medium) -> Option<Identity> {
    let raw = medium.get_item_or_warn(USER_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(identity) => Some(identity),
        Err(e) => {
            warn!(error = %e, "stored identity is malformed, treating as signed out");
            None
        }
    }
}

pub fn sign_in(medium: &Medium, identity: &Identity) -> Result<()> {
    medium.set_item(USER_KEY, &serde_json::to_string(identity)?)?;
    info!(email = %identity.email, "signed in");
    Ok(())
}

/// Returns whether a user was signed in.
pub fn sign_out(medium: &Medium) -> Result<bool> {
    medium.remove_item(USER_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn token_for(claims: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[test]
    fn decode_reads_payload_claims() {
        let token = token_for(
            r#"{"sub":"1234","name":"Sam Grower","email":"sam@example.com","picture":"https://x/p.png","aud":"app"}"#,
        );
        let identity = decode_identity_token(&token).unwrap();
        assert_eq!(identity.sub, "1234");
        assert_eq!(identity.email, "sam@example.com");
        assert_eq!(identity.name, "Sam Grower");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_identity_token("nodots"), Err(EcoError::InvalidToken(_))));
        assert!(matches!(decode_identity_token("a.!!!.c"), Err(EcoError::InvalidToken(_))));
        let no_email = token_for(r#"{"sub":"1"}"#);
        assert!(decode_identity_token(&no_email).is_err());
    }

    #[test]
    fn sign_in_round_trips_through_medium() {
        let medium = Medium::open_in_memory().unwrap();
        assert_eq!(signed_in_user(&medium), None);

        let identity = Identity {
            sub: "1".to_string(),
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            picture: String::new(),
        };
        sign_in(&medium, &identity).unwrap();
        assert_eq!(signed_in_user(&medium), Some(identity));

        assert!(sign_out(&medium).unwrap());
        assert_eq!(signed_in_user(&medium), None);
    }

    #[test]
    fn upload_requires_identity() {
        assert!(matches!(LoggingSync::new(None).upload(&[]), Err(SyncError::NotSignedIn)));
    }

    struct FailingSync {
        calls: Cell<u32>,
    }

    impl CloudSync for FailingSync {
        fn upload(&self, _: &[LogEntry]) -> std::result::Result<(), SyncError> {
            self.calls.set(self.calls.get() + 1);
            Err(SyncError::Upload("offline".to_string()))
        }
    }

    #[test]
    fn sync_failures_are_swallowed() {
        let sync = FailingSync { calls: Cell::new(0) };
        sync_after_write(&sync, &[]);
        assert_eq!(sync.calls.get(), 1);
    }
}
