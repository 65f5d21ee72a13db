// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! External integrations
//!
//! Adapters wrap everything outside the process boundary. The pipeline
//! depends only on the traits defined here, never on concrete transports.

pub mod platform;
