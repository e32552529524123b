// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::io;

use thiserror::Error;

/// Errors raised by the fallible building blocks of discovery.
///
/// None of these escape a poll: the discovery entry points downgrade them to
/// absent or empty results for the affected device.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occurred
    #[error("io: {0}")]
    IO(#[from] io::Error),

    /// A `major:minor` pair could not be parsed
    #[error("invalid device number: {0:?}")]
    InvalidDeviceNumber(String),

    /// A mount table line did not have the expected shape
    #[error("invalid mountinfo line: {0:?}")]
    InvalidMountInfoLine(String),
}
