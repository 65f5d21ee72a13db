// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Domain models and types for Quarry.
//!
//! This module contains the core domain models, types, and business rules.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Scope types** ([`ScopeToken`], [`ScopeKind`], [`Organization`], [`Scope`])
//! - **Work units** ([`ReportTarget`], [`InclusionSpec`])
//! - **Report registry** ([`ReportKind`], [`OutputMode`], [`ReportPayload`])
//! - **Error types** ([`QuarryError`], [`PlatformError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Quarry uses the newtype pattern for scope tokens to keep opaque backend
//! identifiers from mixing with ordinary strings:
//!
//! ```rust
//! use quarry::domain::{ScopeToken, ScopeKind};
//!
//! let token = ScopeToken::new("a1b2c3d4");
//! assert!(ScopeKind::Product.is_coarser_than(ScopeKind::Project));
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, QuarryError>`]:
//!
//! ```rust
//! use quarry::domain::{QuarryError, Result};
//!
//! fn example() -> Result<()> {
//!     let kind = quarry::domain::ReportKind::parse("vulnerability")?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod report;
pub mod result;
pub mod scope;

// Re-export commonly used types for convenience
pub use errors::{PlatformError, QuarryError};
pub use report::{
    parse_extra_arg, ExtraArgValue, ExtraArgs, OutputMode, Record, ReportDescriptor, ReportKind,
    ReportPayload,
};
pub use result::Result;
pub use scope::{InclusionSpec, Organization, ReportTarget, Scope, ScopeKind, ScopeToken};
