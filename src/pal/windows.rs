//! `win32.bat` prints a wmic style table. Column names carry no spaces, and a column starts at
//! the offset of its header and runs up to the next header:
//!
//! ```text
//! DeviceID            Caption               Size          MediaType              BusType  ReadOnly  System  Mountpoints
//! \\.\PHYSICALDRIVE0  Samsung SSD 970 EVO   500105249280  Fixed hard disk media  NVMe     False     True    C:\,D:\
//! ```

use super::{
    is_card_bus, is_scsi_bus, is_virtual_bus, non_empty, parse_flag, parse_size, unquote,
};
use crate::device::{DeviceDescriptor, MountPoint};

/// Offsets are counted in chars, the script pads by character rather than by byte.
struct Column<'a> {
    name: &'a str,
    start: usize,
    end: Option<usize>,
}

fn columns(header: &str) -> Vec<Column<'_>> {
    let mut starts = Vec::new();
    let mut prev = ' ';

    for (i, c) in header.chars().enumerate() {
        if !c.is_whitespace() && prev.is_whitespace() {
            starts.push(i);
        }
        prev = c;
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied();
            let name_end = end.map(|e| byte_offset(header, e)).unwrap_or(header.len());
            Column {
                name: header[byte_offset(header, start)..name_end].trim(),
                start,
                end,
            }
        })
        .collect()
}

/// Byte offset of the `idx`th char, clamped to the end of `s`.
fn byte_offset(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map(|(b, _)| b).unwrap_or(s.len())
}

/// Slice a row by char offsets, tolerating short rows.
fn cell<'a>(row: &'a str, col: &Column<'_>) -> &'a str {
    let start = byte_offset(row, col.start);
    let end = col.end.map(|e| byte_offset(row, e)).unwrap_or(row.len());

    row[start..end].trim()
}

pub(crate) fn parse(raw: &str) -> Result<Vec<DeviceDescriptor>, String> {
    let mut lines = raw
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty());

    let header = lines.next().unwrap_or_default();
    let columns = columns(header);

    if !columns.iter().any(|c| c.name.eq_ignore_ascii_case("DeviceID")) {
        return Err(format!("expected a DeviceID column in header {header:?}"));
    }

    Ok(lines
        .filter(|l| !l.trim().chars().all(|c| c == '-' || c.is_whitespace()))
        .map(|row| parse_row(&columns, row))
        .collect())
}

fn parse_row(columns: &[Column<'_>], row: &str) -> DeviceDescriptor {
    let mut device = DeviceDescriptor {
        enumerator: "wmic".to_string(),
        ..Default::default()
    };
    let mut media_type = String::new();

    for col in columns {
        let value = cell(row, col);

        match col.name.to_ascii_lowercase().as_str() {
            "deviceid" => device.device = unquote(value),
            "caption" | "model" => device.description = unquote(value),
            "size" => device.size = parse_size(value).unwrap_or_default(),
            "mediatype" => media_type = unquote(value),
            "bustype" => device.bus_type = non_empty(unquote(value).to_uppercase()),
            "readonly" => device.is_readonly = parse_flag(value),
            "system" => device.is_system = parse_flag(value),
            "mountpoints" => {
                device.mountpoints = value
                    .split(',')
                    .map(unquote)
                    .filter(|x| !x.is_empty())
                    .map(MountPoint::new)
                    .collect()
            }
            _ => tracing::trace!(column = col.name, "Ignoring unknown column"),
        }
    }

    device.raw = device.device.clone();
    device.is_removable = media_type.contains("Removable") || media_type.contains("External");

    if let Some(bus) = device.bus_type.as_deref() {
        device.is_usb = bus == "USB";
        device.is_scsi = is_scsi_bus(bus);
        device.is_card = is_card_bus(bus);
        device.is_virtual = is_virtual_bus(bus);
    }

    device
}
