// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Enumeration of USB-attached block devices

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::{
    mounts::{correlate, MountPoint},
    mountinfo::MountTable,
    speed::{format_speed, link_speed, LinkSpeed},
    sysfs,
    topology::{usb_bus_path, UsbBusPath},
    Sysroot,
};

/// A block device attached over USB, together with its negotiated link speed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbBlockDevice {
    /// Kernel name (e.g. sda)
    pub name: String,
    /// USB port the device is attached to
    pub bus_path: UsbBusPath,
    /// Negotiated link speed, if readable
    pub speed: Option<LinkSpeed>,
}

/// A USB storage device with everything the indicator displays for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageDevice {
    /// Kernel name (e.g. sda)
    pub name: String,
    /// USB port the device is attached to
    pub bus_path: UsbBusPath,
    /// Negotiated link speed in Mbps, if readable
    #[serde(rename = "speed_mbps")]
    pub speed: Option<LinkSpeed>,
    /// Mount points of the device, its partitions and volumes stacked on it
    pub mount_points: Vec<MountPoint>,
}

impl fmt::Display for StorageDevice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.name, format_speed(self.speed))?;

        for (i, mount) in self.mount_points.iter().enumerate() {
            let sep = if i == 0 { " - " } else { ", " };
            write!(f, "{sep}{}", mount.path.display())?;
        }

        Ok(())
    }
}

/// Lists the USB-attached block devices on the running system.
pub fn enumerate() -> Vec<UsbBlockDevice> {
    enumerate_in_sysroot(&Sysroot::default())
}

/// Lists the USB-attached block devices in a specified sysroot, sorted by name.
///
/// Devices that do not resolve to a USB port are left out. A missing or
/// unreadable block directory yields an empty list.
pub fn enumerate_in_sysroot(sysroot: &Sysroot) -> Vec<UsbBlockDevice> {
    let block_dir = sysroot.block_dir();
    if !block_dir.is_dir() {
        debug!("block directory {block_dir:?} is not available");
        return Vec::new();
    }

    let mut devices: Vec<_> = sysfs::subdirectories(&block_dir)
        .into_iter()
        .filter_map(|(name, _)| {
            let Some(bus_path) = usb_bus_path(sysroot, &name) else {
                debug!("block {name} is not USB, skipping");
                return None;
            };
            let speed = link_speed(sysroot, &bus_path);
            debug!("USB block {name} path {bus_path} speed {speed:?}");
            Some(UsbBlockDevice { name, bus_path, speed })
        })
        .collect();
    devices.sort_by(|a, b| a.name.cmp(&b.name));
    devices
}

impl StorageDevice {
    /// Discovers all USB storage devices and their mount points on the running system.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// for device in usb_storage::StorageDevice::discover() {
    ///     println!("{device}");
    /// }
    /// ```
    pub fn discover() -> Vec<StorageDevice> {
        Self::discover_in_sysroot(&Sysroot::default())
    }

    /// Discovers USB storage devices in a specified sysroot.
    ///
    /// The mount table is read once and correlated against every device.
    pub fn discover_in_sysroot(sysroot: &Sysroot) -> Vec<StorageDevice> {
        let devices = enumerate_in_sysroot(sysroot);
        if devices.is_empty() {
            return Vec::new();
        }

        let table = MountTable::read(sysroot).unwrap_or_else(|e| {
            debug!("cannot read mount table {:?}: {e}", sysroot.mountinfo());
            MountTable::default()
        });

        devices
            .into_iter()
            .map(|device| StorageDevice {
                mount_points: correlate(sysroot, &table, &device.name),
                name: device.name,
                bus_path: device.bus_path,
                speed: device.speed,
            })
            .collect()
    }
}
