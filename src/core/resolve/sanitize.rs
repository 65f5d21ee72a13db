// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Filename sanitization
//!
//! Scope display names come from operators and can contain anything; every
//! name that ends up in a path goes through [`sanitize`] first.

/// Characters that are unsafe in filenames on at least one supported
/// filesystem
const INVALID_FS_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replaces filesystem-unsafe characters with underscores
///
/// Pure function over a fixed denylist; everything else passes through
/// unchanged, including whitespace and unicode.
///
/// # Examples
///
/// ```
/// use quarry::core::resolve::sanitize;
///
/// assert_eq!(sanitize("a/b:c"), "a_b_c");
/// assert_eq!(sanitize("Payments Platform"), "Payments Platform");
/// ```
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if INVALID_FS_CHARS.contains(&c) { '_' } else { c })
        .collect()
}
