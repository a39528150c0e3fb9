use actix_web::{
    dev::ServiceRequest, error::InternalError, http::StatusCode, web, Error, HttpMessage,
};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{models::ROLE_ADMIN, respond, state::AppState};

/// Authenticated caller, resolved from the bearer token and attached to the
/// request by the validators below.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Creates a session row and returns its token.
pub async fn issue_session(db: &SqlitePool, user_id: &str) -> Result<String, sqlx::Error> {
    let token = Uuid::new_v4().simple().to_string();
    sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(db)
        .await?;
    Ok(token)
}

pub async fn revoke_session(db: &SqlitePool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn session_user(db: &SqlitePool, token: &str) -> Option<AuthUser> {
    let row = sqlx::query_as::<_, (String, String, String)>(
        r#"SELECT u.id, u.name, u.role
           FROM sessions s
           JOIN users u ON s.user_id = u.id
           WHERE s.token = ?
           LIMIT 1"#,
    )
    .bind(token)
    .fetch_optional(db)
    .await
    .ok()??;

    Some(AuthUser {
        id: row.0,
        name: row.1,
        role: row.2,
    })
}

async fn authenticate(req: &ServiceRequest, credentials: &BearerAuth) -> Result<AuthUser, Error> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| unauthorized("Unauthorized"))?;
    session_user(&state.db, credentials.token())
        .await
        .ok_or_else(|| unauthorized("Invalid or expired session"))
}

pub async fn bearer_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

pub async fn admin_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials).await {
        Ok(user) => {
            if !user.is_admin() {
                return Err((forbidden("Admin access required"), req));
            }
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

fn unauthorized(message: &str) -> Error {
    InternalError::from_response(
        message.to_string(),
        respond::fail(StatusCode::UNAUTHORIZED, message),
    )
    .into()
}

fn forbidden(message: &str) -> Error {
    InternalError::from_response(
        message.to_string(),
        respond::fail(StatusCode::FORBIDDEN, message),
    )
    .into()
}
