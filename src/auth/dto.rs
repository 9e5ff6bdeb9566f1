use serde::{Deserialize, Serialize};

use crate::users::User;

/// Request body for registration. Fields are optional so that a missing
/// field is reported as a validation error instead of a JSON rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub nombre: Option<String>,
    pub correo: Option<String>,
    pub contrasena: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub correo: Option<String>,
    pub contrasena: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub contrasena_actual: Option<String>,
    pub nueva_contrasena: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub mensaje: &'static str,
    pub usuario: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub mensaje: &'static str,
    pub token: String,
    pub usuario: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub mensaje: &'static str,
}

/// Public part of the account returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i32,
    pub nombre: String,
    pub correo: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            nombre: user.name,
            correo: user.email,
        }
    }
}
