//! Freelancedesk: a business desk for freelancers.
//!
//! Projects, clients, team members, invoices, contracts and testimonials are
//! kept in a user-scoped store behind the [`db::Database`] trait. Multi-step
//! workflows (cascading deletes, status changes, invoice creation) live in
//! [`business`], and [`channels::web`] exposes them over an authenticated
//! JSON gateway.

pub mod business;
pub mod channels;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
