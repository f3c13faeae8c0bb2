//! Inbound surfaces. Only the HTTP gateway exists today.

pub mod web;
