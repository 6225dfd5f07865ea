//! API Client — the single point of entry for all calls to the marketplace REST API.
//!
//! One method per endpoint. Every call is a single round trip: no retry, no backoff.
//! Authenticated calls take the caller's `AccessToken`; the client itself holds no
//! credentials, so two sessions can share one `ApiClient`.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::models::{
    AccessToken, Credentials, Experience, ExperienceInput, NewAccount, ProfilePatch,
    ProfileRecord, Skill, TokenPair,
};

mod envelope;

use envelope::{error_message, unwrap_raw, unwrap_result};

pub const DEFAULT_API_URL: &str = "https://test.ionsapp.com/api/v1";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Serialize)]
struct SkillBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct AvatarBody<'a> {
    avatar: &'a str,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// Resolves a server-relative asset path (e.g. a generated résumé's `pdfData`)
    /// against the API origin. Absolute URLs are returned unchanged.
    pub fn resolve_asset_url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    // ── auth ────────────────────────────────────────────────────────────────

    /// POST /users
    pub async fn sign_up(&self, account: &NewAccount) -> Result<ProfileRecord, ApiError> {
        let body = self
            .execute(self.request(Method::POST, "/users", None).json(account))
            .await?;
        unwrap_raw(&body)
    }

    /// POST /auth/login
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair, ApiError> {
        let body = self
            .execute(self.request(Method::POST, "/auth/login", None).json(credentials))
            .await?;
        unwrap_raw(&body)
    }

    // ── profile ─────────────────────────────────────────────────────────────

    /// GET /users
    pub async fn fetch_profile(&self, token: &AccessToken) -> Result<ProfileRecord, ApiError> {
        let body = self
            .execute(self.request(Method::GET, "/users", Some(token)))
            .await?;
        unwrap_result(&body)
    }

    /// PUT /users — returns the field map the server echoed back.
    pub async fn update_profile(
        &self,
        token: &AccessToken,
        patch: &ProfilePatch,
    ) -> Result<Map<String, Value>, ApiError> {
        let body = self
            .execute(self.request(Method::PUT, "/users", Some(token)).json(patch))
            .await?;
        unwrap_result(&body)
    }

    /// PUT /users with only the `avatar` field set.
    pub async fn upload_avatar(
        &self,
        token: &AccessToken,
        data_url: &str,
    ) -> Result<Map<String, Value>, ApiError> {
        let body = self
            .execute(
                self.request(Method::PUT, "/users", Some(token))
                    .json(&AvatarBody { avatar: data_url }),
            )
            .await?;
        unwrap_result(&body)
    }

    /// POST /users/resume
    pub async fn generate_resume(&self, token: &AccessToken) -> Result<Value, ApiError> {
        let body = self
            .execute(self.request(Method::POST, "/users/resume", Some(token)))
            .await?;
        unwrap_result(&body)
    }

    // ── skills ──────────────────────────────────────────────────────────────

    /// GET /user/skills
    pub async fn fetch_skills(&self, token: &AccessToken) -> Result<Vec<Skill>, ApiError> {
        let body = self
            .execute(self.request(Method::GET, "/user/skills", Some(token)))
            .await?;
        unwrap_result(&body)
    }

    /// POST /user/skills
    pub async fn create_skill(&self, token: &AccessToken, name: &str) -> Result<Skill, ApiError> {
        let body = self
            .execute(
                self.request(Method::POST, "/user/skills", Some(token))
                    .json(&SkillBody { name }),
            )
            .await?;
        unwrap_result(&body)
    }

    /// DELETE /user/skills/{id}
    pub async fn delete_skill(&self, token: &AccessToken, skill_id: i64) -> Result<(), ApiError> {
        let path = format!("/user/skills/{skill_id}");
        self.execute(self.request(Method::DELETE, &path, Some(token)))
            .await?;
        Ok(())
    }

    /// GET /user/skills/list — every known skill name, for autocomplete.
    pub async fn fetch_skill_catalog(&self, token: &AccessToken) -> Result<Vec<String>, ApiError> {
        let body = self
            .execute(self.request(Method::GET, "/user/skills/list", Some(token)))
            .await?;
        unwrap_result(&body)
    }

    // ── experiences ─────────────────────────────────────────────────────────

    /// GET /user/experiences
    pub async fn fetch_experiences(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<Experience>, ApiError> {
        let body = self
            .execute(self.request(Method::GET, "/user/experiences", Some(token)))
            .await?;
        unwrap_result(&body)
    }

    /// POST /user/experiences
    pub async fn create_experience(
        &self,
        token: &AccessToken,
        input: &ExperienceInput,
    ) -> Result<Experience, ApiError> {
        let body = self
            .execute(
                self.request(Method::POST, "/user/experiences", Some(token))
                    .json(input),
            )
            .await?;
        unwrap_result(&body)
    }

    /// PUT /user/experiences/{id}
    pub async fn update_experience(
        &self,
        token: &AccessToken,
        experience_id: i64,
        input: &ExperienceInput,
    ) -> Result<Experience, ApiError> {
        let path = format!("/user/experiences/{experience_id}");
        let body = self
            .execute(self.request(Method::PUT, &path, Some(token)).json(input))
            .await?;
        unwrap_result(&body)
    }

    /// DELETE /user/experiences/{id}
    pub async fn delete_experience(
        &self,
        token: &AccessToken,
        experience_id: i64,
    ) -> Result<(), ApiError> {
        let path = format!("/user/experiences/{experience_id}");
        self.execute(self.request(Method::DELETE, &path, Some(token)))
            .await?;
        Ok(())
    }

    // ── plumbing ────────────────────────────────────────────────────────────

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str, token: Option<&AccessToken>) -> RequestBuilder {
        debug!("{} {}", method, path);
        let builder = self.client.request(method, self.endpoint(path));
        match token {
            Some(token) => builder.header(AUTHORIZATION, token.bearer()),
            None => builder,
        }
    }

    /// Sends the request once and returns the body of a 2xx response.
    async fn execute(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!("API returned {}: {}", status, body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(body)
    }
}
