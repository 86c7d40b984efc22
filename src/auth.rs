use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode};
use tower_sessions::Session;
use uuid::Uuid;

use crate::app::AppState;
use crate::constants::*;
use crate::database::Db;
use crate::models::{LoginPayload, PublicUser, RegisterPayload, User};
use crate::utils::{ApiResult, bad_request};

const SESSION_USER_ID: &str = "user_id";
const SESSION_USERNAME: &str = "username";

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

pub async fn create_user(db: &Db, username: &str, password: &str) -> anyhow::Result<PublicUser> {
    let hash = hash_password(password)?;
    let id = Uuid::new_v4().to_string();
    let conn = db.write().await;

    conn.execute(
        "INSERT INTO users (id, name, password_hash) VALUES (?, ?, ?)",
        (id.as_str(), username, hash.as_str()),
    )
    .await?;

    Ok(PublicUser {
        id,
        username: username.to_string(),
    })
}

pub fn validate_registration(payload: &RegisterPayload) -> ApiResult<()> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(bad_request("Username cannot be empty"));
    }
    if username.len() < MIN_USERNAME_LENGTH || username.len() > MAX_USERNAME_LENGTH {
        return Err(bad_request(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        )));
    }
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Err(bad_request(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(bad_request(
            "Username can only contain alphanumeric characters, underscores, and hyphens",
        ));
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    validate_registration(&payload)?;

    let user = create_user(&state.main_db, payload.username.trim(), &payload.password)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                (StatusCode::CONFLICT, "Username already exists".to_string())
            } else {
                tracing::error!(error = %e, "user registration failed");
                (StatusCode::INTERNAL_SERVER_ERROR, ERR_DATABASE_OPERATION.to_string())
            }
        })?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user_by_username(db: &Db, username: &str) -> anyhow::Result<Option<User>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, name, password_hash FROM users WHERE name = ?",
            [username],
        )
        .await?;

    if let Some(row) = rows.next().await? {
        Ok(Some(User {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
        }))
    } else {
        Ok(None)
    }
}

pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginPayload>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    if payload.username.trim().is_empty() {
        return Err(bad_request("Username cannot be empty"));
    }
    if payload.password.is_empty() {
        return Err(bad_request("Password cannot be empty"));
    }

    let internal = |e: anyhow::Error| {
        tracing::error!(error = %e, "login lookup failed");
        (StatusCode::INTERNAL_SERVER_ERROR, ERR_DATABASE_OPERATION.to_string())
    };

    let user = get_user_by_username(&state.main_db, payload.username.trim())
        .await
        .map_err(internal)?;

    let Some(user) = user else {
        tracing::warn!("login rejected: unknown username");
        return Err((StatusCode::UNAUTHORIZED, ERR_INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(&payload.password, &user.password_hash).map_err(internal)? {
        tracing::warn!(user_id = %user.id, "login rejected: wrong password");
        return Err((StatusCode::UNAUTHORIZED, ERR_INVALID_CREDENTIALS.to_string()));
    }

    let session_error = |e: tower_sessions::session::Error| {
        tracing::error!(error = %e, "session write failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Session error".to_string())
    };
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(SESSION_USER_ID, &user.id)
        .await
        .map_err(session_error)?;
    session
        .insert(SESSION_USERNAME, &user.username)
        .await
        .map_err(session_error)?;

    tracing::info!(user_id = %user.id, "user logged in");
    Ok((
        StatusCode::OK,
        Json(PublicUser {
            id: user.id,
            username: user.username,
        }),
    ))
}

/// Resolves the logged-in user. Handlers call this once and pass the id on
/// explicitly.
pub async fn get_current_user(session: &Session) -> ApiResult<PublicUser> {
    let session_error = |_| (StatusCode::INTERNAL_SERVER_ERROR, "Session error".to_string());

    let user_id: Option<String> = session.get(SESSION_USER_ID).await.map_err(session_error)?;
    let username: Option<String> = session.get(SESSION_USERNAME).await.map_err(session_error)?;

    match (user_id, username) {
        (Some(id), Some(name)) => Ok(PublicUser { id, username: name }),
        _ => Err((StatusCode::UNAUTHORIZED, ERR_UNAUTHORIZED.to_string())),
    }
}

pub async fn me(session: Session) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    let user = get_current_user(&session).await?;
    Ok((StatusCode::OK, Json(user)))
}

pub async fn logout(session: Session) -> ApiResult<StatusCode> {
    session.flush().await.map_err(|e| {
        tracing::error!(error = %e, "session flush failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Session error".to_string())
    })?;

    Ok(StatusCode::NO_CONTENT)
}
