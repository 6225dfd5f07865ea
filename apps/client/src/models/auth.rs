use std::fmt;

use serde::{Deserialize, Serialize};

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /users`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Token pair issued by the login endpoint and persisted between runs.
/// Field names double as the storage keys.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Bearer credential attached to every authenticated request.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

impl From<&TokenPair> for AccessToken {
    fn from(pair: &TokenPair) -> Self {
        AccessToken::new(pair.access_token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header_value() {
        assert_eq!(AccessToken::new("abc").bearer(), "Bearer abc");
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let pair = TokenPair {
            access_token: "secret-a".to_string(),
            refresh_token: "secret-b".to_string(),
        };
        let rendered = format!("{pair:?} {:?}", AccessToken::from(&pair));
        assert!(!rendered.contains("secret-a"));
        assert!(!rendered.contains("secret-b"));
    }

    #[test]
    fn test_token_pair_uses_storage_key_names() {
        let pair: TokenPair =
            serde_json::from_str(r#"{"accessToken":"a","refreshToken":"b"}"#).unwrap();
        assert_eq!(pair.access_token, "a");
        assert_eq!(pair.refresh_token, "b");
    }
}
