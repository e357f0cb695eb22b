//! Cookie name constants.

/// Cookie names used for the credential pair.
pub struct CookieNames;

impl CookieNames {
    /// Access token, sent as the bearer credential
    pub const ACCESS_TOKEN: &'static str = "tessera.token";

    /// Refresh token, exchanged for a new pair when the access token expires
    pub const REFRESH_TOKEN: &'static str = "tessera.refreshToken";

    /// Both names, access token first.
    pub const ALL: [&'static str; 2] = [Self::ACCESS_TOKEN, Self::REFRESH_TOKEN];
}
