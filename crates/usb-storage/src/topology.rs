// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! USB topology resolution
//!
//! A USB-backed block device links its `device` node to a path below the USB host
//! controller, e.g. `.../0000:00:14.0/usb2/2-3/2-3:1.0/host6/...`. The segment
//! following the `usbN` root hub is the port the device is attached to.

use std::{
    fmt, fs,
    path::{Component, Path},
    sync::OnceLock,
};

use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::Sysroot;

/// Regex pattern matching a root hub segment (e.g. usb2)
static ROOT_HUB_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Position of a device on the USB bus tree (e.g. `2-3` or `1-4.2`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UsbBusPath(String);

impl UsbBusPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UsbBusPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the USB bus path from a fully resolved sysfs device path.
///
/// Scans the segments in order for the first `usb<digits>` root hub and returns the
/// segment after it. Returns `None` if there is no such pair.
pub fn bus_path_from_target(target: &Path) -> Option<UsbBusPath> {
    let regex =
        ROOT_HUB_PATTERN.get_or_init(|| Regex::new(r"^usb\d+$").expect("Failed to initialise known-working regex"));

    let mut segments = target.components().filter_map(|c| match c {
        Component::Normal(s) => Some(s),
        _ => None,
    });

    segments.find(|s| s.to_str().is_some_and(|s| regex.is_match(s)))?;
    let port = segments.next()?.to_str()?;
    Some(UsbBusPath(port.to_owned()))
}

/// Resolves a block device name (e.g. `sda`) to the USB port it is attached to.
///
/// Devices without a `device` link, links that cannot be resolved, and devices that
/// are not behind a USB controller (internal disks, loop, dm) all yield `None`.
pub fn usb_bus_path(sysroot: &Sysroot, block: &str) -> Option<UsbBusPath> {
    let link = sysroot.block_dir().join(block).join("device");
    let target = match fs::canonicalize(&link) {
        Ok(target) => target,
        Err(e) => {
            debug!("{block}: cannot resolve {link:?}: {e}");
            return None;
        }
    };
    bus_path_from_target(&target)
}
