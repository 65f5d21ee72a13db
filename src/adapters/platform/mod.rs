// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Reporting platform adapter
//!
//! The [`PlatformApi`] trait is the seam between the pipeline and the
//! backend; [`PlatformClient`] is its HTTP implementation.

pub mod api;
pub mod client;
pub mod models;

pub use api::PlatformApi;
pub use client::PlatformClient;
