use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::ApiError;

/// Conventional wrapper around every read/write payload: `{ "result": T }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

/// Decodes a `{ "result": T }` body.
pub(crate) fn unwrap_result<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    Ok(envelope.result)
}

/// Decodes a bare `T` body (auth endpoints).
pub(crate) fn unwrap_raw<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    Ok(serde_json::from_str(body)?)
}

/// Pulls a human-readable message out of an error body.
/// Understands `{ "message": "..." }` and `{ "message": ["...", "..."] }`;
/// anything else is returned as-is.
pub(crate) fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    match value.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Skill;

    #[test]
    fn test_unwrap_result_envelope() {
        let skill: Skill = unwrap_result(r#"{"result":{"id":4,"name":"Go"}}"#).unwrap();
        assert_eq!(
            skill,
            Skill {
                id: 4,
                name: "Go".to_string()
            }
        );
    }

    #[test]
    fn test_missing_envelope_is_a_decode_error() {
        let err = unwrap_result::<Skill>(r#"{"id":4,"name":"Go"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_error_message_variants() {
        assert_eq!(error_message(r#"{"message":"Unauthorized"}"#), "Unauthorized");
        assert_eq!(
            error_message(r#"{"message":["email must be an email","password too short"]}"#),
            "email must be an email, password too short"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(r#"{"error":"x"}"#), r#"{"error":"x"}"#);
    }
}
