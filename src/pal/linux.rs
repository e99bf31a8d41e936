use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{non_empty, parse_flag, parse_size};
use crate::device::{DeviceDescriptor, MountPoint};

#[derive(Deserialize, Debug)]
struct Devices {
    blockdevices: Vec<Value>,
}

/// One entry of the lsblk tree. Disks and their partitions share the same columns.
///
/// Older lsblk releases print numbers and flags as strings, so every column goes through a
/// lenient decoder and falls back to its default.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct Device {
    #[serde(deserialize_with = "uint")]
    size: Option<u64>,
    #[serde(deserialize_with = "string")]
    kname: Option<String>,
    #[serde(deserialize_with = "string")]
    name: Option<String>,
    #[serde(deserialize_with = "string")]
    tran: Option<String>,
    #[serde(deserialize_with = "string")]
    subsystems: Option<String>,
    #[serde(deserialize_with = "flag")]
    ro: bool,
    #[serde(deserialize_with = "flag")]
    rm: bool,
    #[serde(deserialize_with = "flag")]
    hotplug: bool,
    #[serde(rename = "phy-sec", deserialize_with = "uint")]
    phy_sec: Option<u64>,
    #[serde(rename = "log-sec", deserialize_with = "uint")]
    log_sec: Option<u64>,
    #[serde(deserialize_with = "string")]
    pttype: Option<String>,
    #[serde(deserialize_with = "string")]
    label: Option<String>,
    #[serde(deserialize_with = "string")]
    partlabel: Option<String>,
    #[serde(deserialize_with = "string")]
    vendor: Option<String>,
    #[serde(deserialize_with = "string")]
    model: Option<String>,
    #[serde(deserialize_with = "string")]
    mountpoint: Option<String>,
    #[serde(deserialize_with = "strings")]
    mountpoints: Vec<String>,
    #[serde(deserialize_with = "uint")]
    fssize: Option<u64>,
    #[serde(deserialize_with = "uint")]
    fsavail: Option<u64>,
    #[serde(deserialize_with = "devices")]
    children: Vec<Device>,
}

impl Device {
    fn from_value(value: Value) -> Self {
        Self::deserialize(value).unwrap_or_else(|e| {
            tracing::trace!("Defaulting malformed lsblk entry: {e}");
            Self::default()
        })
    }

    fn is_scsi(&self) -> bool {
        let subsystems = self.subsystems.as_deref().unwrap_or_default();
        ["sata", "scsi", "ata", "ide", "pci"]
            .iter()
            .any(|s| subsystems.contains(s))
    }

    fn is_usb(&self) -> bool {
        self.subsystems
            .as_deref()
            .is_some_and(|s| s.contains("usb"))
    }

    fn is_card(&self) -> bool {
        self.tran.as_deref() == Some("mmc")
            || self
                .subsystems
                .as_deref()
                .is_some_and(|s| s.contains("mmc"))
    }

    fn description(&self) -> String {
        [&self.label, &self.vendor, &self.model]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Unknown subsystems are treated as a physical device.
    fn is_virtual(&self) -> bool {
        self.subsystems
            .as_deref()
            .is_some_and(|s| !s.contains("block"))
    }

    fn is_removable(&self) -> bool {
        self.rm || self.hotplug || self.is_virtual()
    }

    fn is_system(&self) -> bool {
        !(self.is_removable() || self.is_virtual())
    }

    /// Mount points of this entry followed by those of its descendants, in tree order.
    fn collect_mountpoints(&self, out: &mut Vec<MountPoint>) {
        for path in self.mountpoint.iter().chain(&self.mountpoints) {
            // Pseudo mounts like [SWAP]
            if path.starts_with('[') || out.iter().any(|m| &m.path == path) {
                continue;
            }

            out.push(MountPoint {
                path: path.clone(),
                label: self.label.clone().or_else(|| self.partlabel.clone()),
                total_bytes: self.fssize,
                available_bytes: self.fsavail,
            });
        }

        for child in &self.children {
            child.collect_mountpoints(out);
        }
    }
}

impl From<Device> for DeviceDescriptor {
    fn from(value: Device) -> Self {
        let is_scsi = value.is_scsi();
        let is_usb = value.is_usb();
        let is_card = value.is_card();
        let description = value.description();
        let is_virtual = value.is_virtual();
        let is_removable = value.is_removable();
        let is_system = value.is_system();

        let mut mountpoints = Vec::new();
        value.collect_mountpoints(&mut mountpoints);

        let defaults = DeviceDescriptor::default();

        Self {
            enumerator: "lsblk:json".to_string(),
            bus_type: value.tran.as_deref().map(str::to_uppercase),
            device: value
                .name
                .clone()
                .or_else(|| value.kname.clone())
                .unwrap_or_default(),
            raw: value.kname.or(value.name).unwrap_or_default(),
            description,
            partition_table_type: value.pttype,
            size: value.size.unwrap_or_default(),
            block_size: value
                .phy_sec
                .and_then(|x| u32::try_from(x).ok())
                .unwrap_or(defaults.block_size),
            logical_block_size: value
                .log_sec
                .and_then(|x| u32::try_from(x).ok())
                .unwrap_or(defaults.logical_block_size),
            mountpoints,
            is_readonly: value.ro,
            is_system,
            is_card,
            is_scsi,
            is_usb,
            is_virtual,
            is_removable,
        }
    }
}

fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => non_empty(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|x| match x {
                Value::String(s) => non_empty(s.trim().to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn uint<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_size(&s),
        _ => None,
    })
}

fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_u64().is_some_and(|n| n != 0),
        Value::String(s) => parse_flag(&s),
        _ => false,
    })
}

fn devices<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Device>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items.into_iter().map(Device::from_value).collect(),
        _ => Vec::new(),
    })
}

pub(crate) fn parse(raw: &str) -> Result<Vec<DeviceDescriptor>, String> {
    let res: Devices =
        serde_json::from_str(raw).map_err(|e| format!("expected lsblk json: {e}"))?;

    Ok(res
        .blockdevices
        .into_iter()
        .map(Device::from_value)
        .map(Into::into)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::parse;

    const TWO_DISKS: &str = r#"{
   "blockdevices": [
      {
         "name": "/dev/sda", "kname": "/dev/sda", "size": 500107862016, "ro": false,
         "rm": false, "hotplug": false, "tran": "sata", "subsystems": "block:scsi:pci",
         "vendor": "ATA     ", "model": "Samsung SSD 860", "pttype": "gpt",
         "phy-sec": 4096, "log-sec": 512, "mountpoint": null,
         "children": [
            {"name": "/dev/sda1", "kname": "/dev/sda1", "mountpoint": "/boot/efi", "label": "EFI", "fssize": 535805952, "fsavail": 500000000},
            {"name": "/dev/sda2", "kname": "/dev/sda2", "mountpoint": "/", "fssize": "490000000000", "fsavail": "1000"},
            {"name": "/dev/sda3", "kname": "/dev/sda3", "mountpoint": "[SWAP]"}
         ]
      },
      {
         "name": "/dev/sdb", "kname": "/dev/sdb", "size": 31457280000, "ro": false,
         "rm": true, "hotplug": true, "tran": "usb", "subsystems": "block:scsi:usb:pci",
         "vendor": "SanDisk", "model": "Ultra", "pttype": "dos",
         "children": [
            {"name": "/dev/sdb1", "kname": "/dev/sdb1", "mountpoints": ["/media/usb", null], "partlabel": "DATA"}
         ]
      }
   ]
}"#;

    #[test]
    fn two_disks() {
        let drives = parse(TWO_DISKS).unwrap();
        assert_eq!(drives.len(), 2);

        let sda = &drives[0];
        assert_eq!(sda.device, "/dev/sda");
        assert_eq!(sda.raw, "/dev/sda");
        assert_eq!(sda.description, "ATA Samsung SSD 860");
        assert_eq!(sda.size, 500107862016);
        assert_eq!(sda.block_size, 4096);
        assert_eq!(sda.logical_block_size, 512);
        assert_eq!(sda.bus_type.as_deref(), Some("SATA"));
        assert_eq!(sda.partition_table_type.as_deref(), Some("gpt"));
        assert!(sda.is_scsi);
        assert!(!sda.is_usb);
        assert!(!sda.is_removable);
        assert!(sda.is_system);
        assert_eq!(sda.mountpoints.len(), 2);
        assert_eq!(sda.mountpoints[0].path, "/boot/efi");
        assert_eq!(sda.mountpoints[0].label.as_deref(), Some("EFI"));
        assert_eq!(sda.mountpoints[1].path, "/");
        assert_eq!(sda.mountpoints[1].total_bytes, Some(490000000000));

        let sdb = &drives[1];
        assert_eq!(sdb.device, "/dev/sdb");
        assert!(sdb.is_removable);
        assert!(sdb.is_usb);
        assert!(!sdb.is_system);
        assert_eq!(sdb.mountpoints.len(), 1);
        assert_eq!(sdb.mountpoints[0].path, "/media/usb");
        assert_eq!(sdb.mountpoints[0].label.as_deref(), Some("DATA"));
    }

    #[test]
    fn legacy_string_columns() {
        let raw = r#"{"blockdevices": [
            {"name": "/dev/mmcblk0", "kname": "/dev/mmcblk0", "size": "15931539456",
             "ro": "0", "rm": "1", "hotplug": "0", "tran": null, "subsystems": "block:mmc:mmc_host:platform"}
        ]}"#;

        let drives = parse(raw).unwrap();
        assert_eq!(drives.len(), 1);
        assert_eq!(drives[0].size, 15931539456);
        assert!(drives[0].is_removable);
        assert!(!drives[0].is_readonly);
        assert!(drives[0].is_card);
        assert_eq!(drives[0].bus_type, None);
    }

    #[test]
    fn missing_and_garbled_fields_default() {
        let raw = r#"{"blockdevices": [
            {"name": "/dev/sdc", "size": "unknown", "ro": {"nested": true}, "children": 5},
            42
        ]}"#;

        let drives = parse(raw).unwrap();
        assert_eq!(drives.len(), 2);

        assert_eq!(drives[0].device, "/dev/sdc");
        assert_eq!(drives[0].raw, "/dev/sdc");
        assert_eq!(drives[0].size, 0);
        assert_eq!(drives[0].description, "");
        assert!(!drives[0].is_readonly);
        assert!(!drives[0].is_removable);
        assert!(drives[0].mountpoints.is_empty());

        assert_eq!(drives[1].device, "");
        assert_eq!(drives[1].size, 0);
        assert_eq!(drives[1].block_size, 512);
    }

    #[test]
    fn empty_list() {
        assert!(parse(r#"{"blockdevices": []}"#).unwrap().is_empty());
    }

    #[test]
    fn unframed() {
        assert!(parse("NAME MAJ:MIN RM SIZE").is_err());
        assert!(parse(r#"{"devices": []}"#).is_err());
        assert!(parse(r#"[1, 2, 3]"#).is_err());
    }
}
