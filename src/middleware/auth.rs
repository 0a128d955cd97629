//! Middleware de autenticación JWT
//!
//! Extrae el token Bearer, lo verifica con el secreto configurado e inyecta
//! el `AuthenticatedUser` en las extensions de la request.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Extension,
};

use crate::{
    models::user::{AuthenticatedUser, UserRole},
    state::AppState,
    utils::{
        errors::{forbidden_error, AppError},
        jwt::{extract_token_from_header, verify_token, JwtConfig},
    },
};

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, &JwtConfig::from(&state.config))?;
    let user = AuthenticatedUser::try_from(claims)?;

    tracing::debug!(user_id = %user.user_id, role = user.role.as_str(), "Request authenticated");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Solo clientes
pub async fn customer_only_middleware(
    Extension(user): Extension<AuthenticatedUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_role(&user, UserRole::Customer)?;
    Ok(next.run(request).await)
}

/// Solo propietarios
pub async fn owner_only_middleware(
    Extension(user): Extension<AuthenticatedUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_role(&user, UserRole::Owner)?;
    Ok(next.run(request).await)
}

/// Verifica el rol dentro de un handler cuando la ruta mezcla métodos públicos y privados
pub fn require_role(user: &AuthenticatedUser, role: UserRole) -> Result<(), AppError> {
    if user.role != role {
        return Err(forbidden_error(
            "access this resource",
            &format!("requires role '{}'", role.as_str()),
        ));
    }
    Ok(())
}
