//! HTTP API: router, access gate, and request/response mapping.

pub mod app;
pub mod config;
pub mod cookies;
pub mod middleware;
