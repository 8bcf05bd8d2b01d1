//! # learnhub-auth
//!
//! Access token issuance/validation and password hashing. Deliberately
//! lean: stateless HS256 access tokens, no session or refresh machinery.

pub mod jwt;
pub mod password;

pub use jwt::{AccessClaims, JwtDecoder, JwtEncoder};
pub use password::PasswordHasher;
