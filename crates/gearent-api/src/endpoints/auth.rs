//! `/api/auth/*`: sign-in, sign-up, session user and token refresh.
//!
//! A successful login or refresh stores the access token on the client, so
//! every later call on any clone is authenticated. Logout clears it even
//! when the backend call fails.

use reqwest::Method;
use tracing::{debug, info, warn};

use crate::client::{ApiClient, Auth};
use crate::error::{ApiError, ApiResult};
use crate::wire::{self, AuthBody, LoginRequest, RefreshRequest, RegisterRequest, UserBody};
use gearent_core::{AuthTokens, User};

/// Token pair plus the signed-in user.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub tokens: AuthTokens,
    pub user: Option<User>,
}

/// Sign-up form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
}

/// What the backend returned for a sign-up. Some deployments log the new
/// user in straight away (`session`), others expect a separate login.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub user: Option<User>,
    pub session: Option<Session>,
}

pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Signs in and stores the access token.
    ///
    /// When the response carries no user the session user is fetched from
    /// `/api/auth/me`; a failure there leaves `user` empty.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        let body = self
            .client
            .call(Method::POST, "/api/auth/login", Auth::Anonymous, |rb| {
                rb.json(&LoginRequest { email, password })
            })
            .await?;

        let (tokens, user) = wire::decode_entity::<AuthBody>(&body)?.into_parts();
        let tokens =
            tokens.ok_or_else(|| ApiError::Decode("login response carried no token".into()))?;

        self.client
            .set_token(Some(tokens.access_token.clone()))
            .await;

        let user = match user {
            Some(user) => Some(user),
            None => match self.me().await {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Signed in but could not load the session user");
                    None
                }
            },
        };

        info!(user_id = ?user.as_ref().map(|u| u.id.to_string()), "Signed in");
        Ok(Session { tokens, user })
    }

    pub async fn register(&self, account: &NewAccount) -> ApiResult<Registration> {
        let request = RegisterRequest {
            email: account.email.clone(),
            password: account.password.clone(),
            name: account.name.clone(),
            phone: account.phone.clone(),
        };
        let body = self
            .client
            .call(Method::POST, "/api/auth/register", Auth::Anonymous, |rb| {
                rb.json(&request)
            })
            .await?;

        // Some backends answer a bare user, others an auth body.
        let (tokens, user) = match wire::decode_entity::<AuthBody>(&body) {
            Ok(auth) => {
                let (tokens, user) = auth.into_parts();
                if tokens.is_none() && user.is_none() {
                    (None, Some(wire::decode_entity::<UserBody>(&body)?.into()))
                } else {
                    (tokens, user)
                }
            }
            Err(_) => (None, Some(wire::decode_entity::<UserBody>(&body)?.into())),
        };

        let session = match tokens {
            Some(tokens) => {
                self.client
                    .set_token(Some(tokens.access_token.clone()))
                    .await;
                Some(Session {
                    tokens,
                    user: user.clone(),
                })
            }
            None => None,
        };

        debug!(email = %account.email, signed_in = session.is_some(), "Registered account");
        Ok(Registration { user, session })
    }

    pub async fn me(&self) -> ApiResult<User> {
        let body = self
            .client
            .call(Method::GET, "/api/auth/me", Auth::Required, |rb| rb)
            .await?;
        Ok(wire::decode_entity::<UserBody>(&body)?.into())
    }

    /// Notifies the backend and clears the stored token either way.
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self
            .client
            .call(Method::POST, "/api/auth/logout", Auth::IfAvailable, |rb| rb)
            .await;
        self.client.set_token(None).await;

        if let Err(e) = &result {
            warn!(error = %e, "Logout request failed, token cleared locally");
        }
        result.map(|_| ())
    }

    /// Exchanges a refresh token for a new access token and stores it.
    ///
    /// The old refresh token is kept when the response doesn't rotate it.
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<AuthTokens> {
        let body = self
            .client
            .call(Method::POST, "/api/auth/refresh", Auth::Anonymous, |rb| {
                rb.json(&RefreshRequest { refresh_token })
            })
            .await?;

        let mut tokens = wire::decode_entity::<AuthBody>(&body)?
            .tokens()
            .ok_or_else(|| ApiError::Decode("refresh response carried no token".into()))?;
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = Some(refresh_token.to_string());
        }

        self.client
            .set_token(Some(tokens.access_token.clone()))
            .await;
        debug!("Access token refreshed");
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{client_for, serve};
    use gearent_core::{Id, UserRole};

    #[tokio::test]
    async fn test_login_stores_token_and_user() {
        let (base, server) = serve(vec![(
            200,
            r#"{"data": {"accessToken": "acc-1", "refreshToken": "ref-1",
                "user": {"id": 7, "email": "kim@gearent.kr", "name": "Kim", "role": "ADMIN"}}}"#,
        )])
        .await;
        let api = client_for(&base);

        let session = api.auth().login("kim@gearent.kr", "secret123").await.unwrap();
        assert_eq!(session.tokens.access_token, "acc-1");
        assert_eq!(session.tokens.refresh_token.as_deref(), Some("ref-1"));
        let user = session.user.unwrap();
        assert_eq!(user.id, Id::from(7));
        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(api.token().await.as_deref(), Some("acc-1"));

        let seen = server.await.unwrap();
        assert_eq!(seen[0].method, "POST");
        assert_eq!(seen[0].path, "/api/auth/login");
        assert_eq!(seen[0].header("authorization"), None);
        assert_eq!(seen[0].json()["email"], "kim@gearent.kr");
        assert_eq!(seen[0].json()["password"], "secret123");
    }

    #[tokio::test]
    async fn test_login_without_user_fetches_me() {
        let (base, server) = serve(vec![
            (200, r#"{"token": "acc-2"}"#),
            (200, r#"{"user": {"id": "u-9", "email": "lee@gearent.kr"}}"#),
        ])
        .await;
        let api = client_for(&base);

        let session = api.auth().login("lee@gearent.kr", "pw123456").await.unwrap();
        let user = session.user.unwrap();
        assert_eq!(user.name, "lee");
        assert_eq!(session.tokens.refresh_token, None);

        let seen = server.await.unwrap();
        assert_eq!(seen[1].path, "/api/auth/me");
        assert_eq!(seen[1].header("authorization"), Some("Bearer acc-2"));
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let (base, _server) =
            serve(vec![(401, r#"{"message": "Invalid credentials"}"#)]).await;
        let api = client_for(&base);

        let err = api.auth().login("kim@gearent.kr", "wrong").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Invalid credentials"));
        assert!(!api.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_register_bare_user() {
        let (base, _server) =
            serve(vec![(201, r#"{"id": 12, "email": "park@gearent.kr", "name": "Park"}"#)]).await;
        let api = client_for(&base);

        let registration = api
            .auth()
            .register(&NewAccount {
                email: "park@gearent.kr".into(),
                password: "pw123456".into(),
                name: "Park".into(),
                phone: None,
            })
            .await
            .unwrap();
        assert!(registration.session.is_none());
        assert_eq!(registration.user.unwrap().name, "Park");
        assert!(!api.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_logout_clears_token_even_on_failure() {
        let (base, server) = serve(vec![(500, "boom")]).await;
        let api = client_for(&base);
        api.set_token(Some("acc".into())).await;

        let err = api.auth().logout().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(!api.is_authenticated().await);

        let seen = server.await.unwrap();
        assert_eq!(seen[0].header("authorization"), Some("Bearer acc"));
    }

    #[tokio::test]
    async fn test_refresh_keeps_old_refresh_token() {
        let (base, server) = serve(vec![(200, r#"{"access_token": "acc-3"}"#)]).await;
        let api = client_for(&base);

        let tokens = api.auth().refresh("ref-1").await.unwrap();
        assert_eq!(tokens.access_token, "acc-3");
        assert_eq!(tokens.refresh_token.as_deref(), Some("ref-1"));
        assert_eq!(api.token().await.as_deref(), Some("acc-3"));

        let seen = server.await.unwrap();
        assert_eq!(seen[0].json()["refreshToken"], "ref-1");
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let api = client_for("http://127.0.0.1:9");
        assert!(matches!(api.auth().me().await, Err(ApiError::MissingToken)));
    }
}
