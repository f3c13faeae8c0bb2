//! Authenticated JSON gateway over the business workflows.

pub mod auth;
pub mod server;
pub mod types;

pub use server::{GatewayState, start_server};
