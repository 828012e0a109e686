//! Core types for Emporium.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod pagination;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{AmountError, MAX_AMOUNT, parse_amount, round_cents};
pub use pagination::Pagination;
