use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::users::StoreError;

/// Every way a request can fail. Messages are the client-facing text.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Faltan campos obligatorios")]
    MissingFields,
    #[error("Correo no válido")]
    InvalidEmail,
    #[error("Correo ya registrado")]
    EmailTaken,
    #[error("Usuario no encontrado")]
    UserNotFound,
    #[error("Contraseña incorrecta")]
    WrongPassword,
    #[error("Contraseña actual incorrecta")]
    WrongCurrentPassword,
    #[error("Token no proporcionado")]
    MissingToken,
    #[error("Token inválido o expirado")]
    InvalidToken,
    #[error("Usuario no encontrado")]
    AccountNotFound,
    #[error("Error en la base de datos")]
    Internal(anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields
            | Self::InvalidEmail
            | Self::EmailTaken
            | Self::UserNotFound
            | Self::WrongPassword
            | Self::WrongCurrentPassword => StatusCode::BAD_REQUEST,
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::InvalidToken => StatusCode::FORBIDDEN,
            Self::AccountNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EmailTaken => Self::EmailTaken,
            StoreError::Database(e) => Self::Internal(e.into()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref e) = self {
            error!(error = ?e, "request failed");
        }
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (self.status(), body).into_response()
    }
}
