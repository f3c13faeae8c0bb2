//! Domain workflows layered over the `Database` trait.
//!
//! Handlers in `channels::web` call into these modules rather than the stores
//! directly whenever an operation spans more than one store call.

pub mod activity;
pub mod billing;
pub mod cascade;
pub mod filter;
pub mod format;
pub mod status;

pub use cascade::{CascadeReport, DeleteOutcome, delete_project, delete_team_member};
pub use filter::{Filterable, ListFilter, StatusFilter};
pub use status::{StatusOption, StatusOptions};
