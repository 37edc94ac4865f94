//! Request middleware: authentication extractor.

pub mod auth;

pub use auth::RequireToken;
