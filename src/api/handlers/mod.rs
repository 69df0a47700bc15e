//! Route handlers: JSON endpoints under `/api` and the placeholder pages.

pub mod config;
pub mod health;
pub mod pages;
pub mod session;

pub use self::config::config;
pub use self::health::health;
