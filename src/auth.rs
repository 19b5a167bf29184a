mod error;
mod jwks;
mod jwt;
mod layer;

pub use error::AuthError;
pub use jwks::JwksCache;
pub use jwt::{AuthContext, JwtAuth};
pub use layer::*;

type AuthResult<T> = Result<T, error::AuthError>;
