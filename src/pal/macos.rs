//! `darwin.sh` prints one block of `key: value` lines per disk, separated by blank lines:
//!
//! ```text
//! device: /dev/disk0
//! raw: /dev/rdisk0
//! description: "APPLE SSD AP0512Q"
//! size: 500277790720
//! mountpoints:
//!   - path: "/"
//!     label: "Macintosh HD"
//! isRemovable: False
//! ```

use super::{
    is_card_bus, is_scsi_bus, is_virtual_bus, non_empty, parse_flag, parse_size, unquote,
};
use crate::device::{DeviceDescriptor, MountPoint};

pub(crate) fn parse(raw: &str) -> Result<Vec<DeviceDescriptor>, String> {
    blocks(raw).into_iter().map(parse_block).collect()
}

/// Group non-blank lines into blocks separated by blank lines.
fn blocks(raw: &str) -> Vec<Vec<&str>> {
    let mut res = Vec::new();
    let mut cur = Vec::new();

    for line in raw.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if !cur.is_empty() {
                res.push(std::mem::take(&mut cur));
            }
        } else {
            cur.push(line);
        }
    }

    if !cur.is_empty() {
        res.push(cur);
    }

    res
}

/// Split `key: value`, where key is a plain identifier.
fn pair(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();

    let valid = key.starts_with(|c: char| c.is_ascii_alphabetic())
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    valid.then_some((key, value))
}

fn parse_block(lines: Vec<&str>) -> Result<DeviceDescriptor, String> {
    let mut device = DeviceDescriptor {
        enumerator: "diskutil".to_string(),
        ..Default::default()
    };
    let mut framed = false;
    let mut in_mountpoints = false;

    for line in &lines {
        let indented = line.starts_with(char::is_whitespace);
        let line = line.trim();

        if let Some(item) = line.strip_prefix('-') {
            if in_mountpoints {
                let item = item.trim();
                let path = match pair(item) {
                    Some(("path", value)) => unquote(value),
                    _ => unquote(item),
                };
                if !path.is_empty() {
                    device.mountpoints.push(MountPoint::new(path));
                }
            }
            continue;
        }

        let Some((key, value)) = pair(line) else {
            tracing::trace!(line, "Skipping unrecognised line");
            continue;
        };

        if indented && in_mountpoints {
            if key == "label"
                && let Some(mp) = device.mountpoints.last_mut()
            {
                mp.label = non_empty(unquote(value));
            }
            continue;
        }

        framed = true;
        in_mountpoints = key == "mountpoints";
        apply(&mut device, key, value);
    }

    if !framed {
        return Err(format!(
            "no `key: value` pairs in block starting with {:?}",
            lines.first().copied().unwrap_or_default()
        ));
    }

    if device.raw.is_empty() {
        device.raw = device.device.clone();
    }

    if let Some(bus) = device.bus_type.as_deref() {
        device.is_usb |= bus == "USB";
        device.is_scsi |= is_scsi_bus(bus);
        device.is_card |= is_card_bus(bus);
        device.is_virtual |= is_virtual_bus(bus);
    }

    Ok(device)
}

fn apply(device: &mut DeviceDescriptor, key: &str, value: &str) {
    match key {
        "device" => device.device = unquote(value),
        "raw" => device.raw = unquote(value),
        "description" => device.description = unquote(value),
        "size" => device.size = parse_size(value).unwrap_or_default(),
        "blockSize" => {
            if let Some(x) = parse_size(value).and_then(|x| u32::try_from(x).ok()) {
                device.block_size = x;
            }
        }
        "logicalBlockSize" => {
            if let Some(x) = parse_size(value).and_then(|x| u32::try_from(x).ok()) {
                device.logical_block_size = x;
            }
        }
        "busType" => device.bus_type = non_empty(unquote(value).to_uppercase()),
        "partitionTableType" => device.partition_table_type = non_empty(unquote(value)),
        "isReadOnly" | "protected" => device.is_readonly = parse_flag(value),
        "isSystem" | "system" => device.is_system = parse_flag(value),
        "isRemovable" | "removable" => device.is_removable = parse_flag(value),
        "isVirtual" => device.is_virtual = parse_flag(value),
        "isUSB" => device.is_usb = parse_flag(value),
        "isSCSI" => device.is_scsi = parse_flag(value),
        "isCard" => device.is_card = parse_flag(value),
        // Items follow on the next lines
        "mountpoints" => {}
        _ => tracing::trace!(key, "Ignoring unknown key"),
    }
}
