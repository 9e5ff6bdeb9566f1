use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, PublicUser,
            RegisterRequest, RegisterResponse,
        },
        extractors::{ApiJson, AuthUser},
        jwt::JwtKeys,
        password::{hash_blocking, verify_blocking},
    },
    error::ApiError,
    state::AppState,
    users::NewUser,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/cambiar-contrasena", post(change_password))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Rejects absent or blank fields.
fn required(field: Option<String>) -> Result<String, ApiError> {
    field
        .filter(|v| !v.trim().is_empty())
        .ok_or(ApiError::MissingFields)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn index() -> &'static str {
    "Backend de Padel funcionando ✅"
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let name = required(payload.nombre)?;
    let email = normalize_email(&required(payload.correo)?);
    let password = required(payload.contrasena)?;

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::InvalidEmail);
    }

    let hash = hash_blocking(password, state.config.bcrypt_cost).await?;

    let user = state
        .users
        .create(NewUser {
            name: name.trim(),
            email: &email,
            password_hash: &hash,
        })
        .await
        .map_err(|e| {
            warn!(email = %email, error = %e, "create user failed");
            ApiError::from(e)
        })?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            mensaje: "Usuario registrado correctamente",
            usuario: PublicUser::from(user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = normalize_email(&required(payload.correo)?);
    let password = required(payload.contrasena)?;

    let user = state.users.find_by_email(&email).await?.ok_or_else(|| {
        warn!(email = %email, "login unknown email");
        ApiError::UserNotFound
    })?;

    if !verify_blocking(password, user.password_hash.clone()).await? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::WrongPassword);
    }

    let token = JwtKeys::from_ref(&state).sign(&user)?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(LoginResponse {
        mensaje: "Login correcto",
        token,
        usuario: PublicUser::from(user),
    }))
}

/// Issued tokens stay valid until they expire; changing the password does
/// not revoke them.
#[instrument(skip(state, claims, payload), fields(user_id = claims.id))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let current = required(payload.contrasena_actual)?;
    let new_password = required(payload.nueva_contrasena)?;

    let user = state
        .users
        .find_by_id(claims.id)
        .await?
        .ok_or(ApiError::AccountNotFound)?;

    if !verify_blocking(current, user.password_hash).await? {
        warn!("change password with wrong current password");
        return Err(ApiError::WrongCurrentPassword);
    }

    let hash = hash_blocking(new_password, state.config.bcrypt_cost).await?;
    if !state.users.update_password(user.id, &hash).await? {
        return Err(ApiError::AccountNotFound);
    }

    info!("password changed");
    Ok(Json(MessageResponse {
        mensaje: "Contraseña actualizada correctamente",
    }))
}
