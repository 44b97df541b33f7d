const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of an `Authorization` header value.
///
/// The `Bearer ` prefix is case-sensitive; a missing header, another scheme or
/// an empty token all yield `None`.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix(BEARER_PREFIX)?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
