//! Session state management.
//!
//! The session manager is the single authoritative source of "who is the
//! current user". It exchanges provider credentials (or the backend-gated
//! developer shortcut) for a bearer token, revalidates persisted
//! credentials on startup, and owns the forced-logout path taken when the
//! backend rejects a token.
//!
//! # State machine
//!
//! `Unknown → Validating → {Authenticated, Anonymous}`, with
//! `Authenticated → Anonymous` on logout or an authorization rejection and
//! `Anonymous → Authenticated` on a successful login. `Validating` is a
//! real state, not an inference: the UI renders it as loading and disables
//! auth-dependent actions while a round-trip is outstanding.
//!
//! # Persistence
//!
//! The token and cached profile are two store keys written and cleared as
//! a pair - one is never left behind without the other. Credentials are
//! purged only on an explicit authorization rejection; a transient network
//! failure during revalidation keeps the session, so a flaky connection
//! never logs anyone out.

mod error;

pub use error::SessionError;

use secrecy::{ExposeSecret, SecretString};

use crate::api::AuthGateway;
use crate::api::types::{DevLoginRequest, ProviderLoginRequest, SessionGrant, UserProfile};
use crate::store::{KeyValueStore, StoreError, keys};

/// Authentication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Not yet initialized.
    #[default]
    Unknown,
    /// A credential round-trip is outstanding.
    Validating,
    /// A token is held and has not been invalidated.
    Authenticated,
    /// No valid credentials.
    Anonymous,
}

/// A credential obtained from the identity provider's login prompt.
#[derive(Debug, Clone)]
pub enum ProviderCredential {
    /// The provider issued an ID token.
    IdToken(String),
    /// The user dismissed the prompt. Not an error.
    Cancelled,
}

/// Result of a provider login attempt.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// Logged in as the contained profile.
    LoggedIn(UserProfile),
    /// The user cancelled; nothing changed.
    Cancelled,
}

/// Owner of authentication state.
#[derive(Debug)]
pub struct SessionManager<G, S> {
    gateway: G,
    store: S,
    state: AuthState,
    token: Option<SecretString>,
    user: Option<UserProfile>,
}

impl<G: AuthGateway, S: KeyValueStore> SessionManager<G, S> {
    /// Create a manager in the [`AuthState::Unknown`] state.
    pub const fn new(gateway: G, store: S) -> Self {
        Self {
            gateway,
            store,
            state: AuthState::Unknown,
            token: None,
            user: None,
        }
    }

    /// Hydrate the session from the durable store and revalidate it.
    ///
    /// With no (or incomplete) persisted credentials the session goes
    /// straight to `Anonymous`. Otherwise it is optimistically
    /// `Authenticated` while one revalidation round-trip runs: an
    /// authorization rejection purges the credentials and drops to
    /// `Anonymous`; a transient failure keeps them - only the backend
    /// saying "no" logs a user out.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable store cannot be read.
    pub async fn initialize(&mut self) -> Result<(), SessionError> {
        let token = self.store.get(keys::SESSION_TOKEN)?;
        let user = match self.store.get_json::<UserProfile>(keys::SESSION_USER) {
            Ok(user) => user,
            Err(StoreError::Serialize(e)) => {
                tracing::warn!(error = %e, "Corrupt cached profile, discarding session");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let (Some(token), Some(user)) = (token, user) else {
            // Half a credential pair is as good as none
            self.purge();
            self.state = AuthState::Anonymous;
            return Ok(());
        };

        self.token = Some(SecretString::from(token.clone()));
        self.user = Some(user);
        self.state = AuthState::Validating;

        match self.gateway.current_user(&token).await {
            Ok(profile) => {
                // Refresh the cached profile; the backend may have updated it
                self.store.set_json(keys::SESSION_USER, &profile)?;
                self.user = Some(profile);
                self.state = AuthState::Authenticated;
                tracing::debug!("Session revalidated");
            }
            Err(e) if e.is_auth_rejection() => {
                tracing::warn!(error = %e, "Stored session rejected, clearing credentials");
                self.purge();
                self.state = AuthState::Anonymous;
            }
            Err(e) => {
                // Transient failure: keep the session rather than logging
                // the user out over a flaky connection
                tracing::warn!(error = %e, "Session revalidation unavailable, keeping credentials");
                self.state = AuthState::Authenticated;
            }
        }

        Ok(())
    }

    /// Exchange a provider credential for a backend session.
    ///
    /// A cancelled prompt is a silent no-op. On success the token and
    /// profile are persisted and the state becomes `Authenticated`; on
    /// failure nothing changes and the error is surfaced for the UI to
    /// report.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails or the credentials cannot be
    /// persisted.
    pub async fn login_with_provider(
        &mut self,
        credential: ProviderCredential,
    ) -> Result<LoginOutcome, SessionError> {
        let ProviderCredential::IdToken(id_token) = credential else {
            tracing::debug!("Provider login prompt dismissed");
            return Ok(LoginOutcome::Cancelled);
        };

        let previous = self.state;
        self.state = AuthState::Validating;

        let request = ProviderLoginRequest { token: id_token };
        match self.gateway.login_with_provider(&request).await {
            Ok(grant) => {
                let profile = self.install(grant)?;
                Ok(LoginOutcome::LoggedIn(profile))
            }
            Err(e) => {
                self.state = previous;
                Err(e.into())
            }
        }
    }

    /// Mint a session without provider proof.
    ///
    /// Only available while the backend advertises its development flag;
    /// the flag is checked on every call, never assumed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::DevLoginDisabled`] when the backend reports
    /// the flag off, or an error if the login or persistence fails.
    pub async fn login_as_developer(
        &mut self,
        request: DevLoginRequest,
    ) -> Result<UserProfile, SessionError> {
        if !self.gateway.dev_mode().await? {
            return Err(SessionError::DevLoginDisabled);
        }

        let previous = self.state;
        self.state = AuthState::Validating;

        match self.gateway.login_as_developer(&request).await {
            Ok(grant) => self.install(grant),
            Err(e) => {
                self.state = previous;
                Err(e.into())
            }
        }
    }

    /// Sign out: unconditionally purge local credentials.
    ///
    /// The backend session is a stateless bearer token with no revocation
    /// endpoint, so sign-out is local credential destruction; provider
    /// sign-out belongs to the identity layer and its failures are ignored.
    pub fn logout(&mut self) {
        self.purge();
        self.state = AuthState::Anonymous;
        tracing::info!("Logged out");
    }

    /// The forced-logout path for an authorization rejection from any API
    /// call. Idempotent: once the session is anonymous further rejections
    /// change nothing, so a burst of failing requests cannot loop.
    pub fn handle_auth_rejection(&mut self) {
        if matches!(self.state, AuthState::Authenticated | AuthState::Validating) {
            tracing::warn!("Session rejected by backend, signing out");
            self.purge();
            self.state = AuthState::Anonymous;
        }
    }

    /// Current authentication state.
    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    /// Profile of the current user, if authenticated.
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// The bearer token, if one is held.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(ExposeSecret::expose_secret)
    }

    /// Whether a token is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Whether the current user is an authenticated admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.user.as_ref().is_some_and(|u| u.role.is_admin())
    }

    /// Persist a granted session and adopt it in memory.
    fn install(&mut self, grant: SessionGrant) -> Result<UserProfile, SessionError> {
        self.persist_pair(&grant.access_token, &grant.user)?;

        self.token = Some(SecretString::from(grant.access_token));
        self.user = Some(grant.user.clone());
        self.state = AuthState::Authenticated;
        tracing::info!(user = %grant.user.email, "Logged in");

        Ok(grant.user)
    }

    /// Write the token and profile as a pair: if the second write fails the
    /// first is rolled back, so the store never holds one without the other.
    fn persist_pair(&mut self, token: &str, user: &UserProfile) -> Result<(), StoreError> {
        self.store.set(keys::SESSION_TOKEN, token)?;
        if let Err(e) = self.store.set_json(keys::SESSION_USER, user) {
            let _ = self.store.remove(keys::SESSION_TOKEN);
            return Err(e);
        }
        Ok(())
    }

    /// Best-effort removal of both persisted keys and the in-memory copy.
    fn purge(&mut self) {
        for key in [keys::SESSION_TOKEN, keys::SESSION_USER] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(key, error = %e, "Failed to clear stored credential");
            }
        }
        self.token = None;
        self.user = None;
    }
}
