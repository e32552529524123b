// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Change detection between polls

use std::path::PathBuf;

use crate::{LinkSpeed, StorageDevice};

/// One device as seen by change detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRow {
    pub name: String,
    pub speed: Option<LinkSpeed>,
    /// Mount points, sorted
    pub mount_points: Vec<PathBuf>,
}

/// Comparable state of all devices at one poll.
///
/// Equality is order-sensitive on devices and order-insensitive on each device's
/// mount points. The origin of a mount point does not take part in the comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    rows: Vec<SnapshotRow>,
}

impl Snapshot {
    pub fn rows(&self) -> &[SnapshotRow] {
        &self.rows
    }
}

impl From<&[StorageDevice]> for Snapshot {
    fn from(devices: &[StorageDevice]) -> Self {
        let rows = devices
            .iter()
            .map(|device| {
                let mut mount_points: Vec<_> = device.mount_points.iter().map(|m| m.path.clone()).collect();
                mount_points.sort();
                SnapshotRow {
                    name: device.name.clone(),
                    speed: device.speed,
                    mount_points,
                }
            })
            .collect();
        Self { rows }
    }
}

/// Holds the last rendered snapshot for whoever drives the poll loop.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<Snapshot>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `snapshot` and returns true if it differs from the previous one.
    ///
    /// The first snapshot always counts as a change.
    pub fn update(&mut self, snapshot: Snapshot) -> bool {
        if self.last.as_ref() == Some(&snapshot) {
            return false;
        }
        self.last = Some(snapshot);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mock::MockSysroot, MountOrigin, MountPoint, UsbBusPath};
    use test_log::test;

    fn device(name: &str, speed: Option<u32>, mounts: &[&str]) -> StorageDevice {
        StorageDevice {
            name: name.to_owned(),
            bus_path: UsbBusPath::new("1-1"),
            speed: speed.map(LinkSpeed::from_mbps),
            mount_points: mounts
                .iter()
                .map(|m| MountPoint {
                    path: PathBuf::from(m),
                    origin: MountOrigin::Direct,
                })
                .collect(),
        }
    }

    #[test]
    fn test_mount_order_is_ignored() {
        let a = Snapshot::from(&[device("sda", Some(5000), &["/b", "/a"])][..]);
        let b = Snapshot::from(&[device("sda", Some(5000), &["/a", "/b"])][..]);
        assert_eq!(a, b);
        assert_eq!(a.rows()[0].mount_points, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    }

    #[test]
    fn test_device_order_matters() {
        let a = Snapshot::from(&[device("sda", None, &[]), device("sdb", None, &[])][..]);
        let b = Snapshot::from(&[device("sdb", None, &[]), device("sda", None, &[])][..]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_speed_change_is_detected() {
        let mut detector = ChangeDetector::new();
        assert!(detector.update(Snapshot::from(&[device("sda", Some(480), &[])][..])));
        assert!(!detector.update(Snapshot::from(&[device("sda", Some(480), &[])][..])));
        assert!(detector.update(Snapshot::from(&[device("sda", Some(5000), &[])][..])));
        assert!(detector.update(Snapshot::default()));
        assert!(!detector.update(Snapshot::default()));
    }

    #[test]
    fn test_repeated_discovery_is_stable() {
        let mock = MockSysroot::new();
        mock.add_usb_disk("sdc", "3-1", "8:32")
            .add_usb_disk("sda", "2-3", "8:0")
            .set_speed("2-3", "5000")
            .add_partition("sda", "sda1", "8:1")
            .add_partition("sda", "sda2", "8:2")
            .set_mountinfo(
                "60 25 8:2 / /run/media/b rw - ext4 /dev/sda2 rw\n\
                 61 25 8:1 / /run/media/a rw - vfat /dev/sda1 rw\n",
            );

        let sysroot = mock.sysroot();
        let first = Snapshot::from(StorageDevice::discover_in_sysroot(&sysroot).as_slice());
        let second = Snapshot::from(StorageDevice::discover_in_sysroot(&sysroot).as_slice());
        assert_eq!(first, second);
        assert_eq!(first.rows().len(), 2);

        let mut detector = ChangeDetector::new();
        assert!(detector.update(first));
        assert!(!detector.update(second));
    }
}
