//! In-memory identity provider for tests and demo mode.
//!
//! Email/password registry with duplicate-email rejection and a
//! [`watch`]-based current-user feed. Rejection messages carry the same
//! `auth/code: message` wrapper the hosted provider uses, so the session's
//! stripping logic is exercised against this provider too.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::watch;
use uuid::Uuid;

use taskdeck_proto::task::UserId;

use super::{AuthError, AuthProvider};

/// Identity used by the federated sign-in flow.
const FEDERATED_USER: &str = "federated-user";

struct Account {
    password: String,
    user_id: UserId,
}

/// In-process identity provider.
///
/// Passwords are stored verbatim; this provider exists for tests and the
/// offline demo, never for real credentials.
pub struct MemoryAuth {
    accounts: RwLock<HashMap<String, Account>>,
    current: watch::Sender<Option<UserId>>,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuth {
    /// Creates a provider with no accounts and nobody signed in.
    #[must_use]
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: RwLock::new(HashMap::new()),
            current,
        }
    }
}

impl AuthProvider for MemoryAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let mut accounts = self.accounts.write();
        if accounts.contains_key(email) {
            return Err(AuthError::Provider(
                "auth/email-already-in-use: Email already in use".to_string(),
            ));
        }
        let user_id = UserId::new(Uuid::now_v7().to_string());
        accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user_id: user_id.clone(),
            },
        );
        drop(accounts);
        self.current.send_replace(Some(user_id.clone()));
        Ok(user_id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let accounts = self.accounts.read();
        let Some(account) = accounts.get(email) else {
            return Err(AuthError::Provider(
                "auth/invalid-credential: Invalid email or password".to_string(),
            ));
        };
        if account.password != password {
            return Err(AuthError::Provider(
                "auth/invalid-credential: Invalid email or password".to_string(),
            ));
        }
        let user_id = account.user_id.clone();
        drop(accounts);
        self.current.send_replace(Some(user_id.clone()));
        Ok(user_id)
    }

    async fn sign_in_federated(&self) -> Result<UserId, AuthError> {
        let user_id = UserId::new(FEDERATED_USER);
        self.current.send_replace(Some(user_id.clone()));
        Ok(user_id)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.current.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.current.subscribe()
    }
}
