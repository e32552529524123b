// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Mock sysroot for testing.
//!
//! Builds a throwaway directory tree that mirrors the parts of sysfs, devfs and
//! procfs the engine reads, so discovery can be tested without USB hardware.

use std::{
    fs,
    os::unix::fs::symlink,
    path::{Path, PathBuf},
    process,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::Sysroot;

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// PCI controller that every mock device hangs off.
const PCI_ROOT: &str = "sys/devices/pci0000:00";

/// A synthetic sysroot, removed again when dropped.
#[derive(Debug)]
pub struct MockSysroot {
    root: PathBuf,
}

impl MockSysroot {
    /// Creates an empty mock sysroot in the temporary directory
    pub fn new() -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
        let root = std::env::temp_dir().join(format!("usb-storage-mock-{}-{id}", process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).expect("Failed to create mock sysroot");
        Self { root }
    }

    /// Returns the root directory of the mock tree
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Returns a [`Sysroot`] pointing at the mock tree
    pub fn sysroot(&self) -> Sysroot {
        Sysroot::new(&self.root)
    }

    /// Creates a directory (and its parents) relative to the root
    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.root.join(rel);
        fs::create_dir_all(&path).expect("Failed to create mock directory");
        path
    }

    /// Writes a file relative to the root, creating parent directories
    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create mock directory");
        }
        fs::write(path, contents).expect("Failed to write mock file");
    }

    /// Creates a symlink at `rel` pointing at `target`
    pub fn link(&self, rel: &str, target: impl AsRef<Path>) {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create mock directory");
        }
        symlink(target, path).expect("Failed to create mock symlink");
    }

    /// Adds a whole disk attached to the USB port `bus_path` (e.g. "2-3")
    pub fn add_usb_disk(&self, name: &str, bus_path: &str, dev: &str) -> &Self {
        let bus = bus_path.split('-').next().unwrap_or("1");
        let usb_dev = format!("{PCI_ROOT}/0000:00:14.0/usb{bus}/{bus_path}");
        let scsi = format!("{usb_dev}/{bus_path}:1.0/host6/target6:0:0/6:0:0:0");
        self.mkdir(&scsi);
        self.add_block(name, &scsi, dev);
        self.link(&format!("sys/bus/usb/devices/{bus_path}"), self.root.join(usb_dev));
        self
    }

    /// Adds a whole disk that is not behind any USB controller
    pub fn add_internal_disk(&self, name: &str, dev: &str) -> &Self {
        let nvme = format!("{PCI_ROOT}/0000:00:1d.0/0000:3d:00.0/nvme/nvme0");
        self.mkdir(&nvme);
        self.add_block(name, &nvme, dev);
        self
    }

    /// Registers a block device below `parent` and links it into `sys/block`
    fn add_block(&self, name: &str, parent: &str, dev: &str) {
        let node = format!("{parent}/block/{name}");
        self.write(&format!("{node}/dev"), &format!("{dev}\n"));
        self.link(&format!("{node}/device"), self.root.join(parent));
        self.link(&format!("sys/block/{name}"), self.root.join(node));
        self.write(&format!("dev/{name}"), "");
    }

    /// Sets the negotiated speed reported for a USB port
    pub fn set_speed(&self, bus_path: &str, speed: &str) -> &Self {
        self.write(&format!("sys/bus/usb/devices/{bus_path}/speed"), &format!("{speed}\n"));
        self
    }

    /// Adds a partition directory below an existing disk
    pub fn add_partition(&self, disk: &str, name: &str, dev: &str) -> &Self {
        self.write(&format!("sys/block/{disk}/{name}/dev"), &format!("{dev}\n"));
        self.write(&format!("sys/block/{disk}/{name}/partition"), "1\n");
        self.write(&format!("dev/{name}"), "");
        self
    }

    /// Adds a device-mapper volume backed by `slaves`
    pub fn add_dm(&self, name: &str, dev: &str, slaves: &[&str]) -> &Self {
        let node = format!("sys/devices/virtual/block/{name}");
        self.write(&format!("{node}/dev"), &format!("{dev}\n"));
        self.mkdir(&format!("{node}/slaves"));
        for slave in slaves {
            self.link(&format!("{node}/slaves/{slave}"), format!("../../../../../block/{slave}"));
        }
        self.link(&format!("sys/block/{name}"), self.root.join(node));
        self.write(&format!("dev/{name}"), "");
        self
    }

    /// Adds a `/dev/mapper` alias for a device-mapper volume
    pub fn add_mapper(&self, alias: &str, dm: &str) -> &Self {
        self.link(&format!("dev/mapper/{alias}"), format!("../{dm}"));
        self
    }

    /// Replaces the mount table
    pub fn set_mountinfo(&self, contents: &str) -> &Self {
        self.write("proc/self/mountinfo", contents);
        self
    }
}

impl Drop for MockSysroot {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}
