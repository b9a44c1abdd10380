//! TaskTrack backend library
//!
//! Authentication core (credential hashing, access tokens, refresh token
//! rotation, request gate), the gated Kanban task board and the HTTP surface
//! around them. Exposed as a library for the integration tests.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
