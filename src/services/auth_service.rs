use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{generate_jwt, hash_password, validate_jwt, verify_password, Claims};
use crate::config::SecurityConfig;
use crate::database::models::{Actor, NewActor, Role};
use crate::database::store::{Store, UniqueField};
use crate::error::ApiError;
use crate::validation::{Validator, STRING_MAX_LENGTH};

/// Name recorded on every issued access token
pub const TOKEN_NAME: &str = "api_token";

const PASSWORD_MIN_LENGTH: usize = 6;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token plus the actor it belongs to
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: Actor,
}

/// The actor behind a verified bearer token
#[derive(Debug, Clone)]
pub struct CurrentActor {
    pub actor: Actor,
    pub token_id: Uuid,
}

pub struct AuthService<'a> {
    store: &'a dyn Store,
    security: &'a SecurityConfig,
}

impl<'a> AuthService<'a> {
    pub fn new(store: &'a dyn Store, security: &'a SecurityConfig) -> Self {
        Self { store, security }
    }

    /// Creates a `user` actor and signs it in
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, ApiError> {
        let mut v = Validator::new();

        let name = v.required("name", request.name.as_deref());
        if let Some(name) = name {
            v.max_len("name", name, STRING_MAX_LENGTH);
        }

        let email = v.required("email", request.email.as_deref());
        if let Some(email) = email {
            v.email("email", email).max_len("email", email, STRING_MAX_LENGTH);
        }

        // Passwords are not trimmed
        let password = request.password.as_deref().filter(|p| !p.is_empty());
        match password {
            None => {
                v.add("password", "The password field is required.");
            }
            Some(password) => {
                v.min_len("password", password, PASSWORD_MIN_LENGTH);
                if request.password_confirmation.as_deref() != Some(password) {
                    v.add("password", "The password field confirmation does not match.");
                }
            }
        }

        let role = match request.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            None | Some("user") => Role::User,
            Some(_) => {
                v.add("role", "The selected role is invalid.");
                Role::User
            }
        };

        if let Some(email) = email.filter(|_| !v.has("email")) {
            if self.store.find_actor_by_email(email).await?.is_some() {
                v.add("email", UniqueField::Email.taken_message());
            }
        }

        v.finish()?;

        let (Some(name), Some(email), Some(password)) = (name, email, password) else {
            return Err(ApiError::internal("register: validated field missing"));
        };

        let password_hash = hash_password(password).map_err(ApiError::internal)?;
        let actor = self
            .store
            .insert_actor(NewActor {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                role,
            })
            .await?;

        info!("Registered actor {} ({})", actor.id, actor.email);
        self.issue_session(actor).await
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, ApiError> {
        let mut v = Validator::new();
        let email = v.required("email", request.email.as_deref());
        if let Some(email) = email {
            v.email("email", email);
        }
        let password = request.password.as_deref().filter(|p| !p.is_empty());
        if password.is_none() {
            v.add("password", "The password field is required.");
        }
        v.finish()?;

        let (Some(email), Some(password)) = (email, password) else {
            return Err(ApiError::internal("login: validated field missing"));
        };

        let actor = match self.store.find_actor_by_email(email).await? {
            Some(actor) if verify_password(password, &actor.password_hash) => actor,
            _ => {
                warn!("Rejected login for {}", email);
                return Err(ApiError::invalid_credentials());
            }
        };

        info!("Actor {} logged in", actor.id);
        self.issue_session(actor).await
    }

    /// Revokes only the presenting token
    pub async fn logout(&self, current: &CurrentActor) -> Result<(), ApiError> {
        self.store.delete_token(current.token_id).await?;
        info!("Actor {} logged out token {}", current.actor.id, current.token_id);
        Ok(())
    }

    /// Resolves a bearer credential; every failure is a plain 401
    pub async fn authenticate(&self, bearer: &str) -> Result<CurrentActor, ApiError> {
        let claims = validate_jwt(bearer, &self.security.jwt_secret).map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            ApiError::unauthenticated()
        })?;

        let token = self.store.use_token(claims.jti).await?.ok_or_else(|| {
            warn!("Bearer token {} has been revoked", claims.jti);
            ApiError::unauthenticated()
        })?;

        if token.actor_id != claims.sub {
            warn!("Bearer token {} does not belong to actor {}", token.id, claims.sub);
            return Err(ApiError::unauthenticated());
        }

        let actor = self
            .store
            .find_actor(token.actor_id)
            .await?
            .ok_or_else(ApiError::unauthenticated)?;

        Ok(CurrentActor {
            actor,
            token_id: token.id,
        })
    }

    async fn issue_session(&self, actor: Actor) -> Result<AuthSession, ApiError> {
        let token = self.store.insert_token(actor.id, TOKEN_NAME).await?;
        let claims = Claims::new(actor.id, token.id, self.security.jwt_expiry_hours);
        let jwt = generate_jwt(&claims, &self.security.jwt_secret).map_err(ApiError::internal)?;

        Ok(AuthSession { token: jwt, user: actor })
    }
}
