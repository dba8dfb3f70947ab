//! # Repository Module
//!
//! SQLite repositories for the register.
//!
//! ## Available Repositories
//!
//! - [`PendingOrderRepository`](pending_order::PendingOrderRepository) -
//!   the in-progress order snapshot, one row per snapshot key

pub mod pending_order;
