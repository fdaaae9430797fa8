//! Authentication and authorization module

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, TokenKind, TokenRejection, TokenService};
pub use middleware::{
    authentication_gate, extract_bearer_token, AuthenticatedPrincipal, AuthenticationGate,
};
pub use password::PasswordHasher;
