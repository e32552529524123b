// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Correlation of block devices with the mount table
//!
//! A mount entry belongs to a block device if any of these hold:
//!
//! * its device number is one of the device's (or its partitions') numbers
//! * its `/dev` source resolves to the device or one of its partitions
//! * its `/dev` source resolves to a device-mapper volume stacked on the device
//!
//! The checks are independent; any one of them is enough.

use std::{
    collections::{BTreeSet, HashSet},
    path::PathBuf,
};

use log::debug;
use serde::Serialize;

use crate::{
    devno::device_numbers,
    mountinfo::{MountEntry, MountTable},
    partition::is_same_family,
    sysfs, DeviceNumber, Sysroot,
};

/// Prefix of kernel names given to device-mapper volumes
const DM_PREFIX: &str = "dm-";

/// Where a mount point attributed to a block device comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MountOrigin {
    /// The device itself or one of its partitions is mounted
    Direct,
    /// A device-mapper volume stacked on the device is mounted (e.g. an encrypted container)
    DeviceMapper {
        /// Kernel name of the volume (e.g. `dm-0`)
        volume: String,
        /// Mapper name of the volume (e.g. `luks-usb`), if the kernel exposes one
        mapped_name: Option<String>,
    },
}

/// A mount point attributed to a block device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountPoint {
    pub path: PathBuf,
    pub origin: MountOrigin,
}

/// Returns every current mount point of `block`, in mount table order.
///
/// An unreadable mount table yields an empty list.
pub fn mount_points(sysroot: &Sysroot, block: &str) -> Vec<MountPoint> {
    match MountTable::read(sysroot) {
        Ok(table) => correlate(sysroot, &table, block),
        Err(e) => {
            debug!("cannot read mount table {:?}: {e}", sysroot.mountinfo());
            Vec::new()
        }
    }
}

/// Returns the mount points of `block` found in an already parsed mount table.
pub fn correlate(sysroot: &Sysroot, table: &MountTable, block: &str) -> Vec<MountPoint> {
    let numbers = device_numbers(sysroot, block);
    let mounts: Vec<_> = table
        .entries()
        .iter()
        .filter_map(|entry| {
            let origin = match_entry(sysroot, entry, block, &numbers)?;
            Some(MountPoint {
                path: entry.mount_point.clone(),
                origin,
            })
        })
        .collect();

    debug!("{block}: mount points {:?}", mounts.iter().map(|m| &m.path).collect::<Vec<_>>());
    mounts
}

fn match_entry(
    sysroot: &Sysroot,
    entry: &MountEntry,
    block: &str,
    numbers: &BTreeSet<DeviceNumber>,
) -> Option<MountOrigin> {
    if numbers.contains(&entry.device) {
        return Some(MountOrigin::Direct);
    }

    let name = source_name(sysroot, entry.source.as_deref()?)?;
    if is_same_family(&name, block) {
        return Some(MountOrigin::Direct);
    }

    dm_backed_by_block(sysroot, &name, block).then(|| MountOrigin::DeviceMapper {
        mapped_name: sysfs::read(&sysroot.block_dir().join(&name), "dm/name"),
        volume: name,
    })
}

/// Resolves a `/dev/...` mount source to the kernel name of the node it points at.
fn source_name(sysroot: &Sysroot, source: &str) -> Option<String> {
    if !source.starts_with("/dev/") {
        return None;
    }
    sysfs::resolved_name(&sysroot.dev_path(source))
}

/// Returns true if the `/dev` path resolves to `block` or one of its numbered partitions.
pub fn device_path_matches_block(sysroot: &Sysroot, source: &str, block: &str) -> bool {
    source_name(sysroot, source).is_some_and(|name| is_same_family(&name, block))
}

/// Returns true if device-mapper volume `dm` is stacked on `block` or one of its partitions.
///
/// Slaves are followed through further device-mapper layers (e.g. LVM inside LUKS).
pub fn dm_backed_by_block(sysroot: &Sysroot, dm: &str, block: &str) -> bool {
    if !dm.starts_with(DM_PREFIX) {
        return false;
    }

    let mut pending = vec![dm.to_owned()];
    let mut seen = HashSet::new();

    while let Some(volume) = pending.pop() {
        if !seen.insert(volume.clone()) {
            continue;
        }
        for slave in sysfs::entry_names(&sysroot.block_dir().join(&volume).join("slaves")) {
            if is_same_family(&slave, block) {
                return true;
            }
            if slave.starts_with(DM_PREFIX) {
                pending.push(slave);
            }
        }
    }

    false
}
