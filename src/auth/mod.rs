//! Registration, log in and the bearer token check for protected routes.

mod endpoints;
mod extractor;
mod service;
mod token;

pub use endpoints::{Credentials, log_in_endpoint, register_user_endpoint};
pub use extractor::AuthUser;
pub use service::AuthService;
pub use token::{Claims, SessionToken, decode_token, encode_token};
