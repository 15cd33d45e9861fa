use serde::{Deserialize, Serialize};

/// Session token payload issued by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,           // provider user ID
    pub exp: usize,            // expires at (unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,    // issued at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,   // issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>, // primary email address
}
