// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Parsing of the live mount table (`/proc/self/mountinfo`)
//!
//! Each line has the shape
//!
//! ```text
//! 36 35 8:1 / /mnt/usb\040stick rw,relatime shared:1 - ext4 /dev/sda1 rw
//! ```
//!
//! with a variable number of optional fields before the `-` separator.

use std::{fs, path::PathBuf, str::FromStr};

use log::debug;

use crate::{DeviceNumber, Error, Sysroot};

/// Fields every well-formed line carries
const MIN_FIELDS: usize = 10;

/// Index of the first optional field; the separator cannot appear earlier
const OPTIONAL_FIELDS: usize = 6;

/// A single row of the mount table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Device number of the mounted filesystem
    pub device: DeviceNumber,
    /// Mount point, with escape sequences decoded
    pub mount_point: PathBuf,
    /// Mount source (e.g. `/dev/sda1`), when the line carries one
    pub source: Option<String>,
}

impl FromStr for MountEntry {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_FIELDS {
            return Err(Error::InvalidMountInfoLine(line.to_owned()));
        }

        let source = fields
            .iter()
            .skip(OPTIONAL_FIELDS)
            .position(|f| *f == "-")
            .and_then(|i| fields.get(OPTIONAL_FIELDS + i + 2))
            .map(|s| unescape(s));

        Ok(Self {
            device: fields[2].parse()?,
            mount_point: PathBuf::from(unescape(fields[4])),
            source,
        })
    }
}

/// Snapshot of the mount table, read once per poll
#[derive(Debug, Clone, Default)]
pub struct MountTable {
    entries: Vec<MountEntry>,
}

impl MountTable {
    /// Reads the mount table of the given sysroot
    pub fn read(sysroot: &Sysroot) -> Result<Self, Error> {
        let contents = fs::read_to_string(sysroot.mountinfo())?;
        Ok(Self::parse(&contents))
    }

    /// Parses mountinfo text. Malformed lines are skipped.
    pub fn parse(contents: &str) -> Self {
        let entries = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match line.parse() {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("skipping mount entry: {e}");
                    None
                }
            })
            .collect();
        Self { entries }
    }

    /// Returns the entries in mount table order
    pub fn entries(&self) -> &[MountEntry] {
        &self.entries
    }
}

/// Decodes the `\ooo` octal escapes the kernel uses for space, tab, newline and backslash.
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] == b'\\' && index + 3 < bytes.len() {
            let digits = &bytes[index + 1..index + 4];
            if digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
                let value = digits.iter().fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
                if let Ok(byte) = u8::try_from(value) {
                    output.push(byte);
                    index += 4;
                    continue;
                }
            }
        }

        output.push(bytes[index]);
        index += 1;
    }

    String::from_utf8_lossy(&output).into_owned()
}
