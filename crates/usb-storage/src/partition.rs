// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Partition naming convention

/// Returns true if `name` is a numbered partition of `block` (e.g. `sda1` of `sda`).
///
/// The whole of `block` must prefix `name` and the remainder must be all digits.
/// No other parent/child relation is inferred from naming.
pub fn is_partition_of(name: &str, block: &str) -> bool {
    name.strip_prefix(block)
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

/// Returns true if `name` is `block` itself or one of its numbered partitions.
pub fn is_same_family(name: &str, block: &str) -> bool {
    name == block || is_partition_of(name, block)
}
