//! HTTP request handlers, one module per resource.

pub mod character;
pub mod generation;
pub mod project;
pub mod scene;
pub mod shot;
pub mod webhook;
