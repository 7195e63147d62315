//! Check-in / check-out reconciliation and its collaborators.

pub mod clock;
pub mod photo;
pub mod reconcile;
pub mod store;
