//! HTTP route handlers

pub mod models;
pub mod upload;
