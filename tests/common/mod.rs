//! Shared e2e test harness.
//!
//! Each test spawns an isolated server with its own catalog and user
//! databases and a scripted gateway, then talks to it over HTTP.

#![allow(dead_code)] // Not every test binary uses every helper

pub mod client;
pub mod constants;
pub mod fixtures;
pub mod server;

pub use client::TestClient;
pub use fixtures::TestUsers;
pub use server::{ScriptedGateway, TestServer};
