//! Signed, time-bounded equipment tokens for public cleaning registration.
//!
//! A token binds an equipment id to an expiry instant:
//!
//! ```text
//! {equipment_id}:{expiry_unix_seconds}:{signature_hex}
//! ```
//!
//! where the signature is the first [`SIGNATURE_HEX_LENGTH`] hex characters
//! of `HMAC-SHA256(secret, "{equipment_id}:{expiry}")`. Validation is
//! stateless: no database row is consulted. Temporary links and the
//! token persisted on the equipment row differ only in [`TokenPolicy`].
//!
//! Callers outside this module must treat tokens as opaque strings.

use std::fmt;
use std::str::FromStr;

use chrono::TimeZone;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of hex characters kept from the HMAC digest (64 bits).
pub const SIGNATURE_HEX_LENGTH: usize = 16;

/// Lifetime of an on-demand temporary token.
pub const TEMPORARY_TTL_MINUTES: i64 = 5;

/// Default lifetime of the token persisted on the equipment row.
pub const DEFAULT_PERSISTED_TTL_MINUTES: i64 = 5;

/// Longest lifetime any token may be issued with: ten years. Long enough
/// for a printed QR label, small enough that the expiry stays a valid
/// timestamp.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 366 * 10;

const FIELD_SEPARATOR: char = ':';

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Issuance policy
// ---------------------------------------------------------------------------

/// Where an issued token lives after issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Handed out once, recorded only in the issuance audit log.
    Temporary,
    /// Stored on the equipment row as `public_token` (printed QR labels).
    Persisted,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Temporary => "temporary",
            TokenKind::Persisted => "persisted",
        }
    }
}

impl FromStr for TokenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temporary" => Ok(TokenKind::Temporary),
            "persisted" => Ok(TokenKind::Persisted),
            other => Err(format!("Unknown token kind '{other}'")),
        }
    }
}

/// Issuance policy: how long a token lives and whether it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    pub kind: TokenKind,
    pub ttl_minutes: i64,
}

impl TokenPolicy {
    /// Short-lived link generated on demand by a manager.
    pub fn temporary() -> Self {
        Self {
            kind: TokenKind::Temporary,
            ttl_minutes: TEMPORARY_TTL_MINUTES,
        }
    }

    /// Token stored on the equipment row with the given lifetime.
    pub fn persisted(ttl_minutes: i64) -> Self {
        Self {
            kind: TokenKind::Persisted,
            ttl_minutes,
        }
    }

    pub fn persists_on_equipment(&self) -> bool {
        self.kind == TokenKind::Persisted
    }
}

/// Check a token lifetime against `1..=MAX_TTL_MINUTES`.
pub fn validate_ttl_minutes(ttl_minutes: i64) -> Result<(), CoreError> {
    if !(1..=MAX_TTL_MINUTES).contains(&ttl_minutes) {
        return Err(CoreError::Validation(format!(
            "Token TTL must be between 1 and {MAX_TTL_MINUTES} minutes, got {ttl_minutes}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Signer
// ---------------------------------------------------------------------------

/// A freshly issued token and its expiry instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: Timestamp,
}

/// Why a token was rejected. Only for diagnostics: [`TokenSigner::validate`]
/// collapses every cause into [`CoreError::InvalidToken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Malformed,
    Expired,
    BadSignature,
}

/// Issues and validates equipment tokens with a server-held secret.
///
/// The secret must stay stable across restarts for persisted tokens to keep
/// validating. It is never embedded in tokens and never printed: the
/// [`Debug`] impl redacts it.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl TokenSigner {
    /// Build a signer from the configured secret. Empty secrets are rejected.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, CoreError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(CoreError::Validation(
                "Token signing secret must not be empty".into(),
            ));
        }
        Ok(Self { secret })
    }

    /// Issue a token for `equipment_id` that expires `ttl_minutes` after `now`.
    ///
    /// `ttl_minutes` must lie in `1..=MAX_TTL_MINUTES`.
    pub fn issue(
        &self,
        equipment_id: DbId,
        ttl_minutes: i64,
        now: Timestamp,
    ) -> Result<IssuedToken, CoreError> {
        validate_ttl_minutes(ttl_minutes)?;
        let expiry = ttl_minutes
            .checked_mul(60)
            .and_then(|secs| now.timestamp().checked_add(secs))
            .ok_or_else(|| CoreError::Validation("Token expiry is out of range".into()))?;
        let signature = self.sign(equipment_id, expiry);
        Ok(IssuedToken {
            token: format!("{equipment_id}{FIELD_SEPARATOR}{expiry}{FIELD_SEPARATOR}{signature}"),
            expires_at: unix_to_timestamp(expiry),
        })
    }

    /// Validate a token at `now`, returning the embedded equipment id.
    ///
    /// Malformed, expired, and forged tokens all yield
    /// [`CoreError::InvalidToken`].
    pub fn validate(&self, token: &str, now: Timestamp) -> Result<DbId, CoreError> {
        self.check(token, now).map_err(|_| CoreError::InvalidToken)
    }

    /// Like [`validate`](Self::validate) but reports the rejection cause.
    pub fn check(&self, token: &str, now: Timestamp) -> Result<DbId, TokenRejection> {
        let (equipment_id, expiry, signature) = parse_fields(token).ok_or(TokenRejection::Malformed)?;

        if now.timestamp() > expiry {
            return Err(TokenRejection::Expired);
        }

        let provided = hex::decode_lower(signature).ok_or(TokenRejection::BadSignature)?;
        if provided.len() * 2 != SIGNATURE_HEX_LENGTH {
            return Err(TokenRejection::BadSignature);
        }

        self.mac_for(equipment_id, expiry)
            .verify_truncated_left(&provided)
            .map_err(|_| TokenRejection::BadSignature)?;

        Ok(equipment_id)
    }

    fn sign(&self, equipment_id: DbId, expiry: i64) -> String {
        let digest = self.mac_for(equipment_id, expiry).finalize().into_bytes();
        let mut signature = hex::encode(digest);
        signature.truncate(SIGNATURE_HEX_LENGTH);
        signature
    }

    fn mac_for(&self, equipment_id: DbId, expiry: i64) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(format!("{equipment_id}{FIELD_SEPARATOR}{expiry}").as_bytes());
        mac
    }
}

// ---------------------------------------------------------------------------
// Introspection
// ---------------------------------------------------------------------------

/// Display-only view of a token's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub equipment_id: DbId,
    pub expiry_timestamp: i64,
    pub expires_at: Timestamp,
    pub seconds_remaining: i64,
    pub is_expired: bool,
}

/// Decode a token for UI display without checking its signature.
///
/// Returns `None` for malformed input, including expiries too far from
/// `now` to subtract. This is not an access-control decision; use
/// [`TokenSigner::validate`] for that.
pub fn describe(token: &str, now: Timestamp) -> Option<TokenInfo> {
    let (equipment_id, expiry, _) = parse_fields(token)?;
    let seconds_remaining = expiry.checked_sub(now.timestamp())?;
    Some(TokenInfo {
        equipment_id,
        expiry_timestamp: expiry,
        expires_at: unix_to_timestamp(expiry),
        seconds_remaining,
        is_expired: seconds_remaining < 0,
    })
}

/// Split a token into its three fields. Numeric fields must be in canonical
/// decimal form so that no two strings carry the same signed message.
fn parse_fields(token: &str) -> Option<(DbId, i64, &str)> {
    let mut parts = token.split(FIELD_SEPARATOR);
    let (id_str, expiry_str, signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let equipment_id: DbId = id_str.parse().ok()?;
    let expiry: i64 = expiry_str.parse().ok()?;
    if equipment_id.to_string() != id_str || expiry.to_string() != expiry_str {
        return None;
    }

    Some((equipment_id, expiry, signature))
}

fn unix_to_timestamp(secs: i64) -> Timestamp {
    chrono::Utc
        .timestamp_opt(secs, 0)
        .single()
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC)
}

// ---------------------------------------------------------------------------
// hex helpers (no extra dep)
// ---------------------------------------------------------------------------

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a lowercase hex string. Uppercase digits are rejected so that
    /// every signature has exactly one valid spelling.
    pub fn decode_lower(s: &str) -> Option<Vec<u8>> {
        if s.is_empty() || s.len() % 2 != 0 {
            return None;
        }
        s.as_bytes()
            .chunks(2)
            .map(|pair| Some(nibble(pair[0])? << 4 | nibble(pair[1])?))
            .collect()
    }

    fn nibble(c: u8) -> Option<u8> {
        match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'a'..=b'f' => Some(c - b'a' + 10),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
