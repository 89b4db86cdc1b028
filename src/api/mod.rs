//! HTTP API - handlers and router

pub mod handlers;
pub mod routes;
