use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use common::config::{AuthConfig, Role};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::{
    api::ApiError,
    error::{StorefrontError, StorefrontResult},
    model::Order,
};

/// The caller behind a bearer credential.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> StorefrontResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(StorefrontError::Forbidden)
        }
    }

    pub fn can_view(&self, order: &Order) -> bool {
        self.is_admin() || order.customer_email == self.email
    }
}

/// Bearer tokens issued through configuration.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: HashMap<String, Principal>,
}

impl TokenRegistry {
    pub fn from_config(config: &AuthConfig) -> Self {
        let tokens = config
            .tokens
            .iter()
            .map(|t| {
                (
                    t.token.clone(),
                    Principal {
                        email: t.email.trim().to_lowercase(),
                        role: t.role,
                    },
                )
            })
            .collect();
        Self { tokens }
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> StorefrontResult<Principal> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(StorefrontError::Unauthorized)?;

        let principal = self.tokens.get(token).cloned().ok_or(StorefrontError::Unauthorized)?;
        debug!(email = %principal.email, role = ?principal.role, "Authenticated request");
        Ok(principal)
    }
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    Arc<TokenRegistry>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let registry = Arc::<TokenRegistry>::from_ref(state);
        Ok(registry.authenticate(&parts.headers)?)
    }
}
