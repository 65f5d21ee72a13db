// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! CLI command implementations

pub mod export;
pub mod init;
pub mod validate;
