use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MountPoint {
    pub path: String,
    pub label: Option<String>,
    pub total_bytes: Option<u64>,
    pub available_bytes: Option<u64>,
}

impl MountPoint {
    pub fn new(path: impl ToString) -> Self {
        Self {
            path: path.to_string(),
            label: None,
            total_bytes: None,
            available_bytes: None,
        }
    }
}

/// A single block device as reported by the platform enumeration script.
///
/// Every field has a default so a partially reported device still yields a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    /// Name of the decoder that produced this record
    pub enumerator: String,
    pub bus_type: Option<String>,
    /// Device node or drive identifier, e.g. `/dev/sda` or `\\.\PHYSICALDRIVE0`
    pub device: String,
    /// Platform-native path, e.g. `/dev/rdisk2` on macOS
    pub raw: String,
    pub description: String,
    pub partition_table_type: Option<String>,
    /// Size in bytes, `0` when unknown
    pub size: u64,
    pub block_size: u32,
    pub logical_block_size: u32,
    pub mountpoints: Vec<MountPoint>,
    /// Device is read-only
    #[serde(rename = "isReadOnly")]
    pub is_readonly: bool,
    /// Device is a system drive
    pub is_system: bool,
    /// Device is an SD-card
    pub is_card: bool,
    /// Connected via the Small Computer System Interface (SCSI)
    #[serde(rename = "isSCSI")]
    pub is_scsi: bool,
    /// Connected via Universal Serial Bus (USB)
    #[serde(rename = "isUSB")]
    pub is_usb: bool,
    /// Device is a virtual storage device
    pub is_virtual: bool,
    /// Device is removable from the running system
    pub is_removable: bool,
}

impl Default for DeviceDescriptor {
    fn default() -> Self {
        Self {
            block_size: 512,
            logical_block_size: 512,
            enumerator: Default::default(),
            bus_type: Default::default(),
            device: Default::default(),
            raw: Default::default(),
            description: Default::default(),
            partition_table_type: Default::default(),
            size: Default::default(),
            mountpoints: Default::default(),
            is_readonly: Default::default(),
            is_system: Default::default(),
            is_card: Default::default(),
            is_scsi: Default::default(),
            is_usb: Default::default(),
            is_virtual: Default::default(),
            is_removable: Default::default(),
        }
    }
}
