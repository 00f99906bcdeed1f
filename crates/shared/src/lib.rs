//! Shared types, errors, and configuration for Claimflow.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

pub use config::{AppConfig, ApprovalConfig, LoggingConfig};
pub use error::{AppError, AppResult};
pub use types::{ApprovalRuleId, CompanyId, ExpenseId, UserId};
