// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Helper functions for interacting with Linux sysfs interfaces

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Reads a value from a sysfs node and attempts to parse it to type T
///
/// # Arguments
///
/// * `node` - Path to the sysfs node
/// * `key` - Name of the sysfs attribute to read
///
/// # Returns
///
/// * `Some(T)` if the value was successfully read and parsed
/// * `None` if the file could not be read or parsed
pub(crate) fn read<T>(node: &Path, key: &str) -> Option<T>
where
    T: FromStr,
{
    let path = node.join(key);
    fs::read_to_string(&path).ok()?.trim().parse().ok()
}

/// Lists the directory entries of `dir` as `(name, path)` pairs.
///
/// Symlinks are followed when deciding whether an entry is a directory, which
/// matters for `/sys/block` where every entry is a link into `/sys/devices`.
/// Entries that are not directories, or that vanish while being listed, are skipped.
pub(crate) fn subdirectories(dir: &Path) -> Vec<(String, PathBuf)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .filter_map(Result::ok)
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_owned();
            let path = e.path();
            path.is_dir().then_some((name, path))
        })
        .collect()
}

/// Lists the names of every entry in `dir`, regardless of type.
pub(crate) fn entry_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .filter_map(Result::ok)
        .filter_map(|e| Some(e.file_name().to_str()?.to_owned()))
        .collect()
}

/// Returns the final component name of `path` once every symlink is resolved.
///
/// Falls back to the link target, then to the literal path, when the fully
/// resolved file does not exist (e.g. a mount source whose node was removed).
pub(crate) fn resolved_name(path: &Path) -> Option<String> {
    let resolved = fs::canonicalize(path)
        .or_else(|_| fs::read_link(path))
        .unwrap_or_else(|_| path.to_owned());
    Some(resolved.file_name()?.to_str()?.to_owned())
}
