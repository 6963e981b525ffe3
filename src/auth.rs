//! Request identity extraction.
//!
//! Authentication happens upstream (API gateway terminates the session and
//! forwards the verified identity). This service trusts the `x-user-id` and
//! `x-user-role` headers; requests without them are rejected as anonymous.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Staff,
}

/// The authenticated caller, extracted from gateway-forwarded headers.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    /// Staff-only guard for operational endpoints.
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Forbidden("staff role required".into()))
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or(AppError::Unauthorized)?;

        let role = match parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
        {
            Some("staff") | Some("admin") => Role::Staff,
            _ => Role::Customer,
        };

        Ok(AuthUser { id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_guard() {
        let staff = AuthUser {
            id: Uuid::nil(),
            role: Role::Staff,
        };
        let customer = AuthUser {
            id: Uuid::nil(),
            role: Role::Customer,
        };
        assert!(staff.require_staff().is_ok());
        assert!(customer.require_staff().is_err());
    }
}
