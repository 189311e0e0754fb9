//! Authentication and profile handlers: `register`, `login`,
//! `update_profile`, `get_users`.

use chatline_proto::response::{Response, UserEntry};
use chrono::Utc;

use crate::auth;
use crate::handlers::user_entry;
use crate::presence;
use crate::store::{Store, StoreError, users};

/// Creates a user account. The username pattern and password policy are
/// enforced server-side even though clients pre-validate.
pub fn register(store: &Store, username: &str, password: &str) -> Result<Response, StoreError> {
    if username.is_empty() || password.is_empty() {
        return Ok(Response::error("Username and password required"));
    }
    if let Err(reason) = auth::validate_username(username) {
        return Ok(Response::error(reason));
    }
    if let Err(reason) = auth::validate_password(password) {
        return Ok(Response::error(reason));
    }
    let password_hash = auth::hash_password(password);
    store.with_tx(|tx| {
        if users::find_by_username(tx, username)?.is_some() {
            return Ok(Response::error("Username already exists"));
        }
        let user_id = users::insert(tx, username, &password_hash, Utc::now())?;
        tracing::info!(user_id, username, "user registered");
        Ok(Response::success().with_message("User registered successfully"))
    })
}

/// Authenticates a user, marking them online with fresh liveness evidence.
pub fn login(store: &Store, username: &str, password: &str) -> Result<Response, StoreError> {
    store.with_tx(|tx| {
        let Some(user) = users::find_by_username(tx, username)? else {
            return Ok(Response::error("Invalid credentials"));
        };
        if !auth::verify_password(password, &user.password_hash) {
            return Ok(Response::error("Invalid credentials"));
        }
        users::set_presence(tx, user.id, true, Some(Utc::now()))?;
        tracing::info!(user_id = user.id, username, "user logged in");
        Ok(Response::success()
            .with_message("Login successful")
            .with_field("user_id", user.id)
            .with_field("name", user.display_name()))
    })
}

/// The optionally-combined mutations of one `update_profile` call.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// User being modified.
    pub user_id: i64,
    /// New display name, applied unconditionally.
    pub new_name: Option<String>,
    /// New username; requires `password`.
    pub new_username: Option<String>,
    /// Current password, verified before a username change.
    pub password: Option<String>,
    /// New password; requires `old_password`.
    pub new_password: Option<String>,
    /// Current password, verified before a password change.
    pub old_password: Option<String>,
}

/// Applies up to three profile mutations in one unit of work. Every
/// precondition is checked before any write, so a failure aborts the whole
/// call with nothing applied.
pub fn update_profile(store: &Store, update: &ProfileUpdate) -> Result<Response, StoreError> {
    store.with_tx(|tx| {
        let Some(user) = users::find_by_id(tx, update.user_id)? else {
            return Ok(Response::error("User not found"));
        };

        if let Some(new_username) = update.new_username.as_deref() {
            if let Err(reason) = auth::validate_username(new_username) {
                return Ok(Response::error(reason));
            }
            if let Some(existing) = users::find_by_username(tx, new_username)? {
                if existing.id != user.id {
                    return Ok(Response::error("Username already exists"));
                }
            }
            let verified = update
                .password
                .as_deref()
                .is_some_and(|p| auth::verify_password(p, &user.password_hash));
            if !verified {
                return Ok(Response::error("Invalid password"));
            }
        }
        if update.new_password.is_some() {
            let verified = update
                .old_password
                .as_deref()
                .is_some_and(|p| auth::verify_password(p, &user.password_hash));
            if !verified {
                return Ok(Response::error("Invalid current password"));
            }
        }

        let mut response = Response::success();
        if let Some(new_name) = update.new_name.as_deref() {
            users::update_name(tx, user.id, new_name)?;
            response = response.with_field("new_name", new_name);
        }
        if let Some(new_username) = update.new_username.as_deref() {
            users::update_username(tx, user.id, new_username)?;
            response = response.with_field("new_username", new_username);
        }
        if let Some(new_password) = update.new_password.as_deref() {
            users::update_password_hash(tx, user.id, &auth::hash_password(new_password))?;
        }
        tracing::info!(user_id = user.id, "profile updated");
        Ok(response)
    })
}

/// Lists every registered user. With `force_update`, presence is recomputed
/// from `last_seen` and flips are persisted before answering.
pub fn get_users(store: &Store, force_update: bool) -> Result<Response, StoreError> {
    store.with_tx(|tx| {
        let now = Utc::now();
        let mut all = users::list_all(tx)?;
        if force_update {
            presence::refresh(tx, &mut all, now)?;
        }
        let entries: Vec<UserEntry> = all.iter().map(user_entry).collect();
        Ok(Response::success()
            .with_serialized("users", &entries)?
            .with_field("timestamp", now.to_rfc3339()))
    })
}
