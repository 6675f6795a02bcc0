pub mod errors;
pub mod issuer;
pub mod models;
pub mod policy;

pub use errors::PolicyError;
pub use errors::TokenError;
pub use errors::UnknownScopeError;
pub use issuer::TokenIssuer;
pub use issuer::TOKEN_PLAINTEXT_LEN;
pub use models::Token;
pub use models::TokenHash;
pub use models::TokenScope;
pub use policy::ExpiryPolicy;
