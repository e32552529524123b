// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{path::PathBuf, thread, time::Duration};

use clap::Parser;
use itertools::Itertools;
use log::{debug, info};

use usb_storage::{format_speed, ChangeDetector, MountOrigin, Snapshot, StorageDevice, Sysroot};

/// How often the device list is refreshed
const REFRESH_INTERVAL: Duration = Duration::from_millis(3000);

/// Command line options
#[derive(Debug, Parser)]
#[command(name = "usb-speed-watch", about = "Show the link speed and mount points of USB storage")]
struct Options {
    /// Log at debug level
    #[arg(long)]
    debug: bool,
    /// Poll once and exit
    #[arg(long)]
    once: bool,
    /// Print each refresh as a JSON line
    #[arg(long)]
    json: bool,
    /// Alternative root to read sysfs and procfs from
    #[arg(long)]
    sysroot: Option<PathBuf>,
}

/// Renders one device as a single line, e.g. `sda: 5.0 Gbps (SuperSpeed) - /mnt/usb`
fn render_row(device: &StorageDevice) -> String {
    let mut row = format!("{}: {}", device.name, format_speed(device.speed));

    if let Some(class) = device.speed.and_then(|s| s.class()) {
        row.push_str(&format!(" ({class})"));
    }

    if !device.mount_points.is_empty() {
        let mounts = device
            .mount_points
            .iter()
            .map(|m| match &m.origin {
                MountOrigin::Direct => m.path.display().to_string(),
                MountOrigin::DeviceMapper { volume, mapped_name } => {
                    let via = mapped_name.as_deref().unwrap_or(volume);
                    format!("{} (via {via})", m.path.display())
                }
            })
            .join(", ");
        row.push_str(" - ");
        row.push_str(&mounts);
    }

    row
}

fn render(devices: &[StorageDevice], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(devices)?);
    } else if devices.is_empty() {
        println!("No USB storage");
    } else {
        for device in devices {
            println!("{}", render_row(device));
        }
        println!();
    }
    Ok(())
}

/// Polls USB storage on a fixed interval and prints the device list whenever it changes.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = Options::parse();

    let mut logger = pretty_env_logger::formatted_timed_builder();
    logger.filter_level(log::LevelFilter::Info).parse_default_env();
    if options.debug {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let sysroot = options.sysroot.as_ref().map(Sysroot::new).unwrap_or_default();
    info!(
        "Watching USB storage under {} every {} ms",
        sysroot.path().display(),
        REFRESH_INTERVAL.as_millis()
    );

    let mut detector = ChangeDetector::new();
    loop {
        let devices = StorageDevice::discover_in_sysroot(&sysroot);
        if detector.update(Snapshot::from(devices.as_slice())) {
            debug!("{} device(s), refreshed", devices.len());
            render(&devices, options.json)?;
        }

        if options.once {
            break;
        }
        thread::sleep(REFRESH_INTERVAL);
    }

    Ok(())
}
