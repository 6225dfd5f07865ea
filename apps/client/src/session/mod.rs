//! Session Store — the authenticated user's state and its synchronization with the API.
//!
//! One `Session` is owned by the application shell and shared as `Arc<Session>`.
//! State lives behind a `tokio::sync::RwLock` that is only ever held for a read or a
//! synchronous patch, never across a network await. Concurrent operations therefore
//! interleave freely; the last response applied wins.
//!
//! Every state change bumps `epoch`. A response is applied only if the epoch it was
//! issued under is still current, so a reply landing after logout (or after a new
//! login) never resurrects the previous user.
//!
//! Token storage writes happen under `commit` together with the state change they
//! belong to, so stored tokens and the in-memory token cannot disagree once both
//! operations return.

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use url::Url;

use crate::api_client::ApiClient;
use crate::errors::AppError;
use crate::models::{AccessToken, Credentials, NewAccount, ProfileRecord, UserProfile};
use crate::tokens::TokenManager;

pub mod hydration;
mod mutations;

pub use hydration::{HydrationEvent, HydrationState};
pub use mutations::{encode_avatar, MAX_AVATAR_BYTES};

#[derive(Debug, Default)]
struct SessionState {
    user: Option<UserProfile>,
    token: Option<AccessToken>,
    hydration: HydrationState,
    epoch: u64,
}

impl SessionState {
    fn reset(&mut self, event: HydrationEvent) {
        self.user = None;
        self.token = None;
        self.hydration = self.hydration.next(event);
        self.epoch += 1;
    }

    /// Resets only if `epoch` is still current. Returns whether it did.
    fn reset_if(&mut self, epoch: u64, event: HydrationEvent) -> bool {
        if self.epoch != epoch {
            return false;
        }
        self.reset(event);
        true
    }
}

/// Request context captured when an operation starts.
struct Context {
    token: AccessToken,
    epoch: u64,
}

pub struct Session {
    api: ApiClient,
    tokens: TokenManager,
    state: RwLock<SessionState>,
    commit: Mutex<()>,
}

impl Session {
    pub fn new(api: ApiClient, tokens: TokenManager) -> Self {
        Self {
            api,
            tokens,
            state: RwLock::new(SessionState::default()),
            commit: Mutex::new(()),
        }
    }

    // ── accessors ───────────────────────────────────────────────────────────

    /// Snapshot of the current user.
    pub async fn user(&self) -> Option<UserProfile> {
        self.state.read().await.user.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.state.read().await.user.is_some()
    }

    pub async fn hydration_state(&self) -> HydrationState {
        self.state.read().await.hydration
    }

    /// Absolute download URL of the last generated résumé, if any.
    pub async fn resume_url(&self) -> Result<Option<Url>, AppError> {
        let state = self.state.read().await;
        let Some(path) = state
            .user
            .as_ref()
            .and_then(|u| u.record.pdf_data.as_deref())
        else {
            return Ok(None);
        };
        Ok(Some(self.api.resolve_asset_url(path)?))
    }

    // ── lifecycle ───────────────────────────────────────────────────────────

    /// Startup restore: adopt a stored access token and hydrate from it.
    /// Without a stored token the session stays logged out and no call is made.
    pub async fn restore(&self) -> Result<(), AppError> {
        let token = match self.tokens.restore().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read stored tokens, starting logged out: {e}");
                self.logout().await;
                return Err(e);
            }
        };

        let Some(token) = token else {
            info!("No stored session");
            return Ok(());
        };

        self.adopt_token(token).await;
        self.fetch_profile().await
    }

    /// Logs in, persists the token pair, then hydrates the session.
    /// A rejected login leaves the session untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), AppError> {
        let pair = self.api.login(credentials).await?;
        {
            let _commit = self.commit.lock().await;
            self.tokens.persist(&pair).await?;
            self.adopt_token(AccessToken::from(&pair)).await;
        }
        info!("Logged in as {}", credentials.email);
        self.fetch_profile().await
    }

    /// Creates an account. Does not log in.
    pub async fn sign_up(&self, account: &NewAccount) -> Result<ProfileRecord, AppError> {
        let record = self.api.sign_up(account).await?;
        info!("Created account {}", record.email);
        Ok(record)
    }

    /// Clears the user, the request token and stored tokens. Idempotent.
    pub async fn logout(&self) {
        self.end_session(HydrationEvent::LoggedOut, None).await;
        info!("Logged out");
    }

    /// Clears memory and storage. With `epoch` set, does nothing unless that epoch
    /// is still current when the write lock is taken.
    async fn end_session(&self, event: HydrationEvent, epoch: Option<u64>) -> bool {
        let _commit = self.commit.lock().await;
        {
            let mut state = self.state.write().await;
            let ended = match epoch {
                Some(epoch) => state.reset_if(epoch, event),
                None => {
                    state.reset(event);
                    true
                }
            };
            if !ended {
                return false;
            }
        }
        self.tokens.clear().await;
        true
    }

    // ── hydration ───────────────────────────────────────────────────────────

    /// Loads profile, skills and experiences concurrently and replaces the user
    /// wholesale. Any failure logs the session out; nothing partial is committed.
    pub async fn fetch_profile(&self) -> Result<(), AppError> {
        let ctx = self.begin_hydration().await?;
        let result = self.load_profile(&ctx.token).await;
        self.finish_hydration(ctx.epoch, result).await
    }

    /// Generates a résumé, then re-hydrates so `pdf_data`/`pdf_date` reflect it.
    /// Fails closed like `fetch_profile`.
    pub async fn generate_resume(&self) -> Result<(), AppError> {
        let ctx = self.begin_hydration().await?;
        // The direct reply is not used; pdf fields arrive with the re-fetch.
        let result = match self.api.generate_resume(&ctx.token).await {
            Ok(_) => self.load_profile(&ctx.token).await,
            Err(e) => Err(e.into()),
        };
        self.finish_hydration(ctx.epoch, result).await
    }

    async fn load_profile(&self, token: &AccessToken) -> Result<UserProfile, AppError> {
        let (record, skills, experiences) = tokio::try_join!(
            self.api.fetch_profile(token),
            self.api.fetch_skills(token),
            self.api.fetch_experiences(token),
        )?;
        Ok(UserProfile::assemble(record, skills, experiences))
    }

    async fn begin_hydration(&self) -> Result<Context, AppError> {
        let token = {
            let mut state = self.state.write().await;
            match state.token.clone() {
                Some(token) => {
                    state.hydration = state.hydration.next(HydrationEvent::Started);
                    Some(Context {
                        token,
                        epoch: state.epoch,
                    })
                }
                None => None,
            }
        };

        match token {
            Some(ctx) => Ok(ctx),
            None => {
                warn!("Hydration requested without a token");
                self.logout().await;
                Err(AppError::NotAuthenticated)
            }
        }
    }

    async fn finish_hydration(
        &self,
        epoch: u64,
        result: Result<UserProfile, AppError>,
    ) -> Result<(), AppError> {
        match result {
            Ok(profile) => {
                let mut state = self.state.write().await;
                if state.epoch != epoch {
                    return Err(AppError::NotAuthenticated);
                }
                info!(
                    "Session hydrated for user {} ({} skills, {} experiences)",
                    profile.record.id,
                    profile.skills.len(),
                    profile.experiences.len()
                );
                state.user = Some(profile);
                state.hydration = state.hydration.next(HydrationEvent::Succeeded);
                Ok(())
            }
            Err(e) => {
                if self.end_session(HydrationEvent::Failed, Some(epoch)).await {
                    warn!("Could not confirm identity, logged out: {e}");
                }
                Err(e)
            }
        }
    }

    async fn adopt_token(&self, token: AccessToken) {
        let mut state = self.state.write().await;
        state.user = None;
        state.token = Some(token);
        state.hydration = state.hydration.next(HydrationEvent::TokenReplaced);
        state.epoch += 1;
    }

    // ── helpers shared with mutations ───────────────────────────────────────

    async fn context(&self) -> Result<Context, AppError> {
        let state = self.state.read().await;
        state
            .token
            .clone()
            .map(|token| Context {
                token,
                epoch: state.epoch,
            })
            .ok_or(AppError::NotAuthenticated)
    }

    /// Applies `patch` to the user if the session is still the one the call was
    /// issued under and a user is present. Otherwise the server reply is dropped.
    async fn patch_user<F>(&self, epoch: u64, patch: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut UserProfile) -> Result<(), AppError>,
    {
        let mut state = self.state.write().await;
        if state.epoch != epoch {
            return Ok(());
        }
        match state.user.as_mut() {
            Some(user) => patch(user),
            None => Ok(()),
        }
    }
}
