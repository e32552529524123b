// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Discovery of USB-attached block storage.
//!
//! Finds the block devices that sit behind a USB controller, reads the link speed
//! each one negotiated, and attributes to each the mount points the kernel reports
//! for it, including those of device-mapper volumes stacked on top of it.
//!
//! Everything is read-only and derived from scratch on every call. Failures to read
//! an individual pseudo-file degrade to absent values for the affected device.

use std::path::{Path, PathBuf};

mod device;
mod devno;
mod error;
pub mod mountinfo;
pub mod mounts;
pub mod partition;
pub mod snapshot;
pub mod speed;
mod sysfs;
pub mod topology;

#[cfg(test)]
pub(crate) mod mock;

pub use device::{enumerate, enumerate_in_sysroot, StorageDevice, UsbBlockDevice};
pub use devno::{device_numbers, DeviceNumber};
pub use error::Error;
pub use mounts::{mount_points, MountOrigin, MountPoint};
pub use snapshot::{ChangeDetector, Snapshot};
pub use speed::{format_speed, link_speed, LinkSpeed, SpeedClass};
pub use topology::{usb_bus_path, UsbBusPath};

const SYSFS_BLOCK_DIR: &str = "sys/block";
const SYSFS_USB_DEVICES_DIR: &str = "sys/bus/usb/devices";
const PROC_MOUNTINFO: &str = "proc/self/mountinfo";

/// Root of the filesystem tree the engine reads sysfs, procfs and devfs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sysroot {
    root: PathBuf,
}

impl Default for Sysroot {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Sysroot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Block device registry, one entry per block device
    pub fn block_dir(&self) -> PathBuf {
        self.root.join(SYSFS_BLOCK_DIR)
    }

    /// USB device registry, one entry per bus path
    pub fn usb_devices_dir(&self) -> PathBuf {
        self.root.join(SYSFS_USB_DEVICES_DIR)
    }

    /// Live mount table
    pub fn mountinfo(&self) -> PathBuf {
        self.root.join(PROC_MOUNTINFO)
    }

    /// Maps an absolute device path such as `/dev/sda1` into this sysroot
    pub fn dev_path(&self, device: &str) -> PathBuf {
        self.root.join(device.trim_start_matches('/'))
    }
}
