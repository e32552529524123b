// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Negotiated USB link speed

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::{sysfs, Sysroot, UsbBusPath};

/// Negotiated link speed in Mbps, as reported by the USB device's `speed` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LinkSpeed(u32);

/// USB signalling rate a link speed corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedClass {
    /// USB 1.1, 12 Mbps
    Full,
    /// USB 2.0, 480 Mbps
    High,
    /// USB 3.2 Gen 1, 5 Gbps
    Super,
    /// USB 3.2 Gen 2, 10 Gbps
    SuperPlus,
    /// USB 3.2 Gen 2x2, 20 Gbps
    SuperPlusDual,
}

impl fmt::Display for SpeedClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SpeedClass::Full => "Full Speed",
            SpeedClass::High => "High Speed",
            SpeedClass::Super => "SuperSpeed",
            SpeedClass::SuperPlus => "SuperSpeed+",
            SpeedClass::SuperPlusDual => "SuperSpeed+ 2x2",
        };
        f.write_str(name)
    }
}

impl LinkSpeed {
    pub fn from_mbps(mbps: u32) -> Self {
        Self(mbps)
    }

    pub fn mbps(&self) -> u32 {
        self.0
    }

    /// Returns the USB signalling class, if the rate is one the kernel reports for a known class.
    pub fn class(&self) -> Option<SpeedClass> {
        match self.0 {
            12 => Some(SpeedClass::Full),
            480 => Some(SpeedClass::High),
            5000 => Some(SpeedClass::Super),
            10000 => Some(SpeedClass::SuperPlus),
            20000 => Some(SpeedClass::SuperPlusDual),
            _ => None,
        }
    }
}

impl fmt::Display for LinkSpeed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            mbps @ 10000.. => write!(f, "{} Gbps", mbps / 1000),
            mbps @ 1000.. => write!(f, "{:.1} Gbps", mbps as f64 / 1000.0),
            mbps => write!(f, "{mbps} Mbps"),
        }
    }
}

/// Formats an optional link speed for display, using `?` when it is unknown.
pub fn format_speed(speed: Option<LinkSpeed>) -> String {
    speed.map_or_else(|| "?".to_owned(), |s| s.to_string())
}

/// Reads the negotiated speed of the USB device at `bus_path`.
///
/// A missing attribute or a non-integer value (low speed devices report `1.5`)
/// yields `None`; the file may also vanish while a device is being unplugged.
pub fn link_speed(sysroot: &Sysroot, bus_path: &UsbBusPath) -> Option<LinkSpeed> {
    let node = sysroot.usb_devices_dir().join(bus_path.as_str());
    let speed = sysfs::read::<u32>(&node, "speed").map(LinkSpeed);
    if speed.is_none() {
        debug!("{bus_path}: speed unavailable");
    }
    speed
}
