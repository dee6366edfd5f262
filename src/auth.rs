use crate::error::CliError;
use crate::model::{new_id, Db, Session, User};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use rand_core::OsRng;

const MIN_PASSWORD_LEN: usize = 8;

/// User fields safe to print.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            email: u.email.clone(),
            name: u.name.clone(),
            created_at: u.created_at,
        }
    }
}

fn normalize_email(email: &str) -> Result<String, CliError> {
    let e = email.trim().to_lowercase();
    let valid = match e.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    };
    if !valid {
        return Err(CliError::usage(format!("Invalid email: {}", email)));
    }
    Ok(e)
}

fn hash_password(password: &str) -> Result<String, CliError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            CliError::io("Failed to store credentials")
        })
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            false
        }
    }
}

/// Creates the account and opens a session for it.
pub fn sign_up(
    db: &mut Db,
    email: &str,
    password: &str,
    name: &str,
    now: DateTime<Utc>,
) -> Result<User, CliError> {
    let email = normalize_email(email)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::usage("Name is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CliError::usage(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if db.users.iter().any(|u| u.email == email) {
        return Err(CliError::usage("Email already registered"));
    }

    let user = User {
        id: new_id(),
        email,
        name: name.to_string(),
        password_hash: hash_password(password)?,
        created_at: now,
    };
    db.users.push(user.clone());
    db.session = Some(Session {
        user_id: user.id.clone(),
        created_at: now,
    });

    tracing::info!(user_id = %user.id, "account created");
    Ok(user)
}

pub fn sign_in(
    db: &mut Db,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<User, CliError> {
    let email = email.trim().to_lowercase();
    let user = db
        .users
        .iter()
        .find(|u| u.email == email)
        .filter(|u| verify_password(password, &u.password_hash))
        .cloned()
        .ok_or_else(|| CliError::auth("Invalid credentials"))?;

    db.session = Some(Session {
        user_id: user.id.clone(),
        created_at: now,
    });

    tracing::info!(user_id = %user.id, "signed in");
    Ok(user)
}

pub fn sign_out(db: &mut Db) -> Result<User, CliError> {
    let user = current_user(db)?.clone();
    db.session = None;
    tracing::info!(user_id = %user.id, "signed out");
    Ok(user)
}

/// The signed-in user. A session pointing at a vanished account counts as
/// no session.
pub fn current_user(db: &Db) -> Result<&User, CliError> {
    let session = db
        .session
        .as_ref()
        .ok_or_else(|| CliError::auth("Not signed in"))?;
    db.users
        .iter()
        .find(|u| u.id == session.user_id)
        .ok_or_else(|| CliError::auth("Not signed in"))
}
