//! Core business logic for Claimflow.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Approval rules, step evaluation and the expense approval lifecycle live here.
//!
//! # Modules
//!
//! - `approval` - Approval rules engine and workflow controller

pub mod approval;
