//! Identity provider abstraction for `TaskDeck`.
//!
//! Defines the [`AuthProvider`] trait covering the hosted identity service
//! and [`AuthSession`], the client-side wrapper that validates input before
//! calling the provider and cleans up provider error messages.

pub mod memory;

use tokio::sync::watch;

use taskdeck_proto::task::UserId;

/// Minimum password length accepted at sign-up, checked client-side.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Errors that can occur during authentication operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Password shorter than [`MIN_PASSWORD_LENGTH`]; rejected before any
    /// provider call.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    /// The provider rejected the operation. Human-readable message.
    #[error("{0}")]
    Provider(String),
}

/// Async interface to the hosted identity service.
///
/// The current user is published through a [`watch`] channel: `None` while
/// signed out, `Some` after a successful sign-in. Subscribers observe every
/// sign-in state change.
pub trait AuthProvider: Send + Sync {
    /// Register a new account and sign it in.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<UserId, AuthError>> + Send;

    /// Sign in with an existing email/password account.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<UserId, AuthError>> + Send;

    /// Sign in through the provider's federated flow.
    fn sign_in_federated(
        &self,
    ) -> impl std::future::Future<Output = Result<UserId, AuthError>> + Send;

    /// Sign out the current user. A no-op when nobody is signed in.
    fn sign_out(&self) -> impl std::future::Future<Output = Result<(), AuthError>> + Send;

    /// Subscribe to the current-user value.
    fn subscribe(&self) -> watch::Receiver<Option<UserId>>;
}

/// Client-side session over any [`AuthProvider`].
///
/// Enforces the password length floor before the provider is called and
/// strips provider error-code wrappers (`auth/some-code: message`) so only
/// the human-readable part surfaces.
pub struct AuthSession<P> {
    provider: P,
}

impl<P: AuthProvider> AuthSession<P> {
    /// Wraps a provider in a session.
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Register a new account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PasswordTooShort`] without calling the provider
    /// if the password is under [`MIN_PASSWORD_LENGTH`] characters, or the
    /// provider's (cleaned) rejection otherwise.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::PasswordTooShort);
        }
        let user = self
            .provider
            .sign_up(email, password)
            .await
            .map_err(clean_error)?;
        tracing::info!(user = %user, "signed up");
        Ok(user)
    }

    /// Sign in with an existing account.
    ///
    /// # Errors
    ///
    /// Returns the provider's (cleaned) rejection.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let user = self
            .provider
            .sign_in(email, password)
            .await
            .map_err(clean_error)?;
        tracing::info!(user = %user, "signed in");
        Ok(user)
    }

    /// Sign in through the provider's federated flow.
    ///
    /// # Errors
    ///
    /// Returns the provider's (cleaned) rejection.
    pub async fn sign_in_federated(&self) -> Result<UserId, AuthError> {
        let user = self
            .provider
            .sign_in_federated()
            .await
            .map_err(clean_error)?;
        tracing::info!(user = %user, "signed in (federated)");
        Ok(user)
    }

    /// Sign out the current user.
    ///
    /// # Errors
    ///
    /// Returns the provider's (cleaned) rejection.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await.map_err(clean_error)?;
        tracing::info!("signed out");
        Ok(())
    }

    /// Subscribe to the current-user value.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.provider.subscribe()
    }

    /// Return the currently signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<UserId> {
        self.provider.subscribe().borrow().clone()
    }
}

/// Strips the provider's error-code wrapper from a rejection message.
fn clean_error(err: AuthError) -> AuthError {
    match err {
        AuthError::Provider(message) => {
            AuthError::Provider(strip_provider_code(&message).to_string())
        }
        other => other,
    }
}

/// Reduces `auth/some-code: message` to `message`. Messages without the
/// wrapper pass through unchanged.
fn strip_provider_code(message: &str) -> &str {
    if let Some(rest) = message.strip_prefix("auth/")
        && let Some((_code, human)) = rest.split_once(": ")
    {
        return human;
    }
    message
}
