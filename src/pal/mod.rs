//! Decoders for the text each platform script writes to stdout.
//!
//! Each submodule exposes `parse(&str) -> Result<Vec<DeviceDescriptor>, String>` where the error
//! is only returned when the text cannot be framed into records at all.

mod linux;
mod macos;
mod windows;

use std::collections::HashSet;

use crate::{DeviceDescriptor, ParseError, Platform};

pub(crate) fn parse(platform: Platform, raw: &str) -> Result<Vec<DeviceDescriptor>, ParseError> {
    // Some consoles prefix a byte order mark
    let raw = raw.trim_start_matches('\u{feff}');

    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let drives = match platform {
        Platform::Linux => linux::parse(raw),
        Platform::Macos => macos::parse(raw),
        Platform::Windows => windows::parse(raw),
    }
    .map_err(|reason| ParseError::new(platform, reason))?;

    Ok(dedup(drives))
}

/// Keep the first record for every device identifier. Records without one are all kept.
fn dedup(drives: Vec<DeviceDescriptor>) -> Vec<DeviceDescriptor> {
    let mut seen = HashSet::with_capacity(drives.len());

    drives
        .into_iter()
        .filter(|d| {
            let first = d.device.is_empty() || seen.insert(d.device.clone());
            if !first {
                tracing::debug!(device = %d.device, "Dropping duplicate device");
            }
            first
        })
        .collect()
}

// UTILS

static SCSI_TYPE_NAMES: [&str; 6] = ["SATA", "SCSI", "ATA", "IDE", "PCI", "SAS"];
static CARD_TYPE_NAMES: [&str; 3] = ["SD", "SDCARD", "MMC"];
static VIRTUAL_TYPE_NAMES: [&str; 2] = ["VIRTUAL", "FILEBACKEDVIRTUAL"];

fn is_scsi_bus(bus: &str) -> bool {
    SCSI_TYPE_NAMES.contains(&bus)
}

fn is_card_bus(bus: &str) -> bool {
    CARD_TYPE_NAMES.contains(&bus)
}

fn is_virtual_bus(bus: &str) -> bool {
    VIRTUAL_TYPE_NAMES.contains(&bus)
}

/// Trim whitespace and strip one level of matching quotes.
fn unquote(value: &str) -> String {
    let value = value.trim();

    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner.replace(&format!("\\{quote}"), &quote.to_string());
        }
    }

    value.to_string()
}

/// Empty values count as absent.
fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn parse_size(value: &str) -> Option<u64> {
    let value = unquote(value);
    let res = value.parse::<u64>().ok();
    if res.is_none() && !value.is_empty() {
        tracing::trace!(%value, "Unparsable size");
    }
    res
}

fn parse_flag(value: &str) -> bool {
    matches!(
        unquote(value).to_ascii_lowercase().as_str(),
        "true" | "yes" | "1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquote_strips_one_level() {
        assert_eq!(unquote("  \"Samsung SSD\" "), "Samsung SSD");
        assert_eq!(unquote("'single'"), "single");
        assert_eq!(unquote(r#""say \"hi\"""#), "say \"hi\"");
        assert_eq!(unquote("\"unterminated"), "\"unterminated");
        assert_eq!(unquote("plain"), "plain");
    }

    #[test]
    fn sizes_degrade_to_unknown() {
        assert_eq!(parse_size(" 512 "), Some(512));
        assert_eq!(parse_size("\"1024\""), Some(1024));
        assert_eq!(parse_size("-1"), None);
        assert_eq!(parse_size("12G"), None);
        assert_eq!(parse_size(""), None);
    }

    #[test]
    fn flags() {
        assert!(parse_flag("True"));
        assert!(parse_flag("yes"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("False"));
        assert!(!parse_flag("garbage"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn blank_text_is_zero_devices() {
        for platform in [Platform::Linux, Platform::Macos, Platform::Windows] {
            assert_eq!(parse(platform, "").unwrap(), Vec::new());
            assert_eq!(parse(platform, " \n\r\n\t").unwrap(), Vec::new());
        }
    }

    #[test]
    fn duplicates_keep_first() {
        let drives = vec![
            DeviceDescriptor {
                device: "/dev/sda".to_string(),
                description: "first".to_string(),
                ..Default::default()
            },
            DeviceDescriptor {
                device: "/dev/sdb".to_string(),
                ..Default::default()
            },
            DeviceDescriptor {
                device: "/dev/sda".to_string(),
                description: "second".to_string(),
                ..Default::default()
            },
        ];

        let drives = dedup(drives);

        assert_eq!(drives.len(), 2);
        assert_eq!(drives[0].description, "first");
        assert_eq!(drives[1].device, "/dev/sdb");
    }

    #[test]
    fn nameless_devices_are_all_kept() {
        let drives = parse(
            Platform::Linux,
            r#"{"blockdevices": [{"size": 1}, {"size": 2}, {"name": "/dev/sda"}, {"name": "/dev/sda"}]}"#,
        )
        .unwrap();

        assert_eq!(drives.len(), 3);
        assert_eq!(drives[0].device, "");
        assert_eq!(drives[0].size, 1);
        assert_eq!(drives[1].device, "");
        assert_eq!(drives[1].size, 2);
        assert_eq!(drives[2].device, "/dev/sda");
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let raw = "\u{feff}DeviceID            Caption\r\n\\\\.\\PHYSICALDRIVE0  Samsung SSD\r\n";
        let drives = parse(Platform::Windows, raw).unwrap();

        assert_eq!(drives.len(), 1);
        assert_eq!(drives[0].device, r"\\.\PHYSICALDRIVE0");
        assert_eq!(drives[0].description, "Samsung SSD");

        assert!(parse(Platform::Windows, "\u{feff}").unwrap().is_empty());
    }

    #[test]
    fn noise_is_rejected_everywhere() {
        let noise = "Lorem ipsum dolor sit amet\nconsectetur adipiscing elit";
        for platform in [Platform::Linux, Platform::Macos, Platform::Windows] {
            let err = parse(platform, noise).unwrap_err();
            assert_eq!(err.platform(), platform);
        }
    }
}
