//! Authorization header formatting for Xbox Live services.

/// Header name carrying the credential.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Header naming the contract version a request was written against.
pub const CONTRACT_VERSION_HEADER: &str = "x-xbl-contract-version";

/// Scheme prefix of the Xbox Live authorization value.
pub const XBL_SCHEME_PREFIX: &str = "XBL3.0 x=-;";

/// Formats a raw token as an `Authorization` header value.
///
/// Format: `XBL3.0 x=-;<token>`
///
/// # Example
///
/// ```
/// use xbldev_auth::header::authorization_value;
///
/// assert_eq!(authorization_value("eyJ0..."), "XBL3.0 x=-;eyJ0...");
/// ```
#[must_use]
pub fn authorization_value(token: &str) -> String {
    format!("{XBL_SCHEME_PREFIX}{token}")
}
