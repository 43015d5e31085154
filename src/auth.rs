//! Auth gateway: registration, login, bearer-token validation, logout.
//!
//! Passwords are stored as Argon2 PHC strings. Login issues an opaque
//! bearer token (32 random bytes, URL-safe base64); only its SHA-256 digest
//! is kept in the sessions table, so a leaked data file does not leak live
//! tokens. Tokens expire after `auth.token_ttl_minutes` and are revoked by
//! logout. Expired sessions are purged on every login.

use crate::config::AuthConfig;
use crate::db::{Database, SessionRecord, Table, UserRecord};
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Longest accepted name or email.
const MAX_FIELD_LEN: usize = 255;

/// Random bytes behind each bearer token.
const TOKEN_BYTES: usize = 32;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("authentication required")]
    Unauthenticated,
    #[error("token is invalid or expired")]
    TokenInvalid,
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

impl From<&UserRecord> for User {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            email: record.email.clone(),
        }
    }
}

/// Registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A freshly issued bearer token. The raw token exists only here.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

fn validation(field: &'static str, message: impl Into<String>) -> AuthError {
    AuthError::Validation {
        field,
        message: message.into(),
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal structural check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let labels = domain.split('.').filter(|part| !part.is_empty()).count();
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && labels >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Hex SHA-256 digest of a bearer token, used as the session key.
fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

fn verify_password(stored_hash: &str, password: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Extract the token from an `Authorization` value.
///
/// Accepts `Bearer <token>` (scheme case-insensitive) or a bare token.
pub fn parse_bearer(value: &str) -> Result<&str, AuthError> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Unauthenticated);
    }
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        Some(_) => return Err(AuthError::TokenInvalid),
        None => value,
    };
    if token.is_empty() {
        return Err(AuthError::Unauthenticated);
    }
    if token.chars().any(char::is_whitespace) {
        return Err(AuthError::TokenInvalid);
    }
    Ok(token)
}

/// Create a user account.
#[instrument(skip(db, registration, config), fields(email = %registration.email))]
pub fn register(
    db: &mut Database,
    registration: &Registration,
    config: &AuthConfig,
    now: DateTime<Utc>,
) -> Result<User, AuthError> {
    let name = registration.name.trim();
    if name.is_empty() {
        return Err(validation("name", "is required"));
    }
    if name.chars().count() > MAX_FIELD_LEN {
        return Err(validation("name", "must be at most 255 characters"));
    }

    let email = normalize_email(&registration.email);
    if email.is_empty() {
        return Err(validation("email", "is required"));
    }
    if email.chars().count() > MAX_FIELD_LEN {
        return Err(validation("email", "must be at most 255 characters"));
    }
    if !is_plausible_email(&email) {
        return Err(validation("email", "must be a valid email address"));
    }
    if db.user_by_email(&email).is_some() {
        return Err(validation("email", "has already been taken"));
    }

    let min = config.min_password_length;
    if registration.password.chars().count() < min {
        let message = format!("must be at least {min} characters");
        return Err(validation("password", message));
    }

    let password_hash = hash_password(&registration.password)?;
    let id = db.next_id(Table::Users);
    let record = UserRecord {
        id,
        name: name.to_string(),
        email,
        password_hash,
        created_at: now,
        updated_at: now,
    };
    let user = User::from(&record);
    db.users.insert(id, record);
    info!(user_id = id, "user registered");
    Ok(user)
}

/// Exchange email + password for a bearer token.
#[instrument(skip(db, password, config))]
pub fn login(
    db: &mut Database,
    email: &str,
    password: &str,
    config: &AuthConfig,
    now: DateTime<Utc>,
) -> Result<IssuedToken, AuthError> {
    let email = normalize_email(email);
    let Some(user) = db.user_by_email(&email) else {
        warn!("login rejected: unknown email");
        return Err(AuthError::InvalidCredentials);
    };
    if !verify_password(&user.password_hash, password)? {
        warn!(user_id = user.id, "login rejected: wrong password");
        return Err(AuthError::InvalidCredentials);
    }
    let user_id = user.id;

    let purged = purge_expired_sessions(db, now);
    let token = generate_token();
    let expires_at = now + Duration::minutes(i64::from(config.token_ttl_minutes));
    db.sessions.insert(
        token_digest(&token),
        SessionRecord {
            user_id,
            issued_at: now,
            expires_at,
        },
    );
    info!(user_id, purged, "token issued");
    Ok(IssuedToken { token, expires_at })
}

/// Resolve a bearer value to its user.
///
/// `None` (no token presented) is [`AuthError::Unauthenticated`]; a token
/// that is malformed, unknown, expired or belongs to a deleted user is
/// [`AuthError::TokenInvalid`].
pub fn authenticate(
    db: &Database,
    bearer: Option<&str>,
    now: DateTime<Utc>,
) -> Result<User, AuthError> {
    let token = parse_bearer(bearer.ok_or(AuthError::Unauthenticated)?)?;
    let session = db
        .sessions
        .get(&token_digest(token))
        .ok_or(AuthError::TokenInvalid)?;
    if session.expires_at <= now {
        return Err(AuthError::TokenInvalid);
    }
    db.users
        .get(&session.user_id)
        .map(User::from)
        .ok_or(AuthError::TokenInvalid)
}

/// Revoke the presented token.
#[instrument(skip_all)]
pub fn logout(
    db: &mut Database,
    bearer: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    let user = authenticate(db, bearer, now)?;
    let token = parse_bearer(bearer.ok_or(AuthError::Unauthenticated)?)?;
    db.sessions.remove(&token_digest(token));
    info!(user_id = user.id, "token revoked");
    Ok(())
}

/// Drop every session whose expiry has passed. Returns how many were removed.
pub fn purge_expired_sessions(db: &mut Database, now: DateTime<Utc>) -> usize {
    let before = db.sessions.len();
    db.sessions.retain(|_, session| session.expires_at > now);
    before - db.sessions.len()
}
