use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OAuth2 token exchange
// ---------------------------------------------------------------------------

/// Claim set of the signed service-account assertion sent to the token
/// endpoint.
#[derive(Debug, Serialize)]
pub struct Claims<'a> {
    pub iss: &'a str,
    pub scope: &'a str,
    pub aud: &'a str,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds. Google caps assertion lifetime at one hour.
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

// ---------------------------------------------------------------------------
// Realtime Database REST
// ---------------------------------------------------------------------------

/// Response of a push (`POST`) to a collection node: the generated child key.
#[derive(Debug, Deserialize)]
pub struct PushResponse {
    pub name: String,
}
