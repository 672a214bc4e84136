//! Remote notes-service session

use serde::Deserialize;
use std::fmt;

/// Connection settings for the remote notes service
///
/// Held in memory only. The access token never appears in `Debug` output.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Any URL on the remote service; only its origin and version hint are used
    pub open_api: String,
    pub access_token: String,
}

impl Session {
    /// Both fields must be non-blank
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.open_api.trim().is_empty() || self.access_token.trim().is_empty() {
            return Err("openApi and accessToken are required");
        }
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("open_api", &self.open_api)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let session = Session {
            open_api: "https://memos.example.com/api/v1".to_string(),
            access_token: "secret-token".to_string(),
        };
        let printed = format!("{:?}", session);
        assert!(printed.contains("memos.example.com"));
        assert!(!printed.contains("secret-token"));
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let session = Session {
            open_api: "https://memos.example.com".to_string(),
            access_token: "  ".to_string(),
        };
        assert!(session.validate().is_err());
    }
}
