/// Why a proxy request failed the host token check.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no bearer token in the Authorization header")]
    MissingToken,
    #[error("host token failed verification")]
    InvalidToken,
    #[error("token signed with a key the host does not publish")]
    UnknownKey,
    #[error("could not load the host signing keys")]
    KeyFetch,
}

impl AuthError {
    // Key loading is our failure, everything else is the caller's
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, AuthError::KeyFetch)
    }
}
