//! Emporium Core - Domain types and business rules.
//!
//! This crate provides the pieces shared by every Emporium component:
//! - `storefront` - JSON API over `PostgreSQL`
//! - `cli` - Migrations, catalog seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types, rules and state machines - no I/O, no
//! database access, no HTTP. Everything here is deterministic: the current
//! time is always passed in by the caller.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, money rounding and pagination
//! - [`pricing`] - Shipping cost, delivery estimate and payment fee rules
//! - [`cart`] - Cart reducer and the sign-in guard for adding items
//! - [`address`] - Address validation and default-address planning
//! - [`review`] - Review validation, helpful-vote toggling, rating summaries
//! - [`catalog`] - Product drafts and listing sort orders
//! - [`checkout`] - Four-step checkout wizard

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod pricing;
pub mod review;
pub mod types;

pub use types::*;
