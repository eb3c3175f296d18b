//! Account endpoints: register, login, profile, game lists.

use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::domain::{AuthUser, GameSession};
use crate::error::ClientError;

/// Body of `POST /users/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    /// Login name.
    pub username: String,
    /// Plain-text password, sent over the API's transport.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Body of `PUT /users/profile`.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

impl ApiClient {
    /// Creates an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns the server's error, e.g. a taken username.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthUser, ClientError> {
        self.post("users/register", request).await
    }

    /// Logs in, fetches the profile and stores both in the session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthorized`] on bad credentials, or any
    /// transport or session-file error.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthUser, ClientError> {
        let LoginResponse { token } = self
            .post("users/login", &LoginRequest { username, password })
            .await?;
        let user: AuthUser = self
            .get_with_token("users/profile", &token)
            .await?;
        self.session().login(user.clone(), token)?;
        tracing::info!(user = %user.username, "logged in");
        Ok(user)
    }

    /// Tells the server to end the session, then clears it locally.
    ///
    /// The local session is cleared even if the server call fails.
    ///
    /// # Errors
    ///
    /// Returns the server or session-file error after clearing.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let remote = self.post_unit::<()>("users/logout", None).await;
        self.session().logout()?;
        remote
    }

    /// Fetches the current user's profile and refreshes the session copy.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn profile(&self) -> Result<AuthUser, ClientError> {
        let user: AuthUser = self.get("users/profile").await?;
        self.session().set_profile(user.clone())?;
        Ok(user)
    }

    /// Updates the current user's names.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<AuthUser, ClientError> {
        let user: AuthUser = self.put("users/profile", update).await?;
        self.session().set_profile(user.clone())?;
        Ok(user)
    }

    /// Deletes the current account and clears the session.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn delete_account(&self) -> Result<(), ClientError> {
        self.delete("users/profile").await?;
        self.session().logout()
    }

    /// Lists games the current user hosts.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn hosted_games(&self) -> Result<Vec<GameSession>, ClientError> {
        self.get("users/games/hosted").await
    }

    /// Lists games the current user has played.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error.
    pub async fn played_games(&self) -> Result<Vec<GameSession>, ClientError> {
        self.get("users/games/played").await
    }
}
