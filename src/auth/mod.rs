pub mod auth;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod session;
