// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Kernel device numbers (`major:minor`) of a block device and its partitions

use std::{collections::BTreeSet, fmt, str::FromStr};

use log::debug;

use crate::{partition, sysfs, Error, Sysroot};

/// A kernel device number, unique to one device node at a point in time.
///
/// Numbers are reassigned when a device is unplugged and plugged back in, so
/// they are only ever compared within a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceNumber {
    pub major: u32,
    pub minor: u32,
}

impl FromStr for DeviceNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidDeviceNumber(s.to_owned());
        let (major, minor) = s.trim().split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// Collects the device numbers of `block` and every numbered partition below it.
///
/// Missing or unreadable `dev` files are skipped, so a device that is still
/// settling yields a partial set rather than an error.
pub fn device_numbers(sysroot: &Sysroot, block: &str) -> BTreeSet<DeviceNumber> {
    let node = sysroot.block_dir().join(block);
    let mut numbers: BTreeSet<DeviceNumber> = BTreeSet::new();

    if let Some(number) = sysfs::read(&node, "dev") {
        numbers.insert(number);
    }

    numbers.extend(
        sysfs::subdirectories(&node)
            .into_iter()
            .filter(|(name, _)| partition::is_partition_of(name, block))
            .filter_map(|(_, path)| sysfs::read::<DeviceNumber>(&path, "dev")),
    );

    debug!("{block}: device numbers {numbers:?}");
    numbers
}
