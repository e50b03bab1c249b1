//! Read-only NAS inventory: physical disks, Samba shares and system users.
//!
//! These back the dashboard's storage, shares and users pages. Nothing here
//! needs root; values the kernel does not expose without privileges (SMART
//! health, drive temperature) are reported as placeholders.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::telemetry::is_likely_disk_device;

const SECTOR_BYTES: u64 = 512;
const TIB: f64 = 1024.0 * 1024.0 * 1024.0 * 1024.0;
const BASE_DISK_TEMP_C: f64 = 32.0;
const PASSWD_TAIL: usize = 10;
const SYSTEM_ACCOUNTS: [&str; 3] = ["root", "daemon", "bin"];
const RESERVED_SHARES: [&str; 3] = ["global", "printers", "print$"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiskKind {
    #[serde(rename = "SSD")]
    Ssd,
    #[serde(rename = "HDD")]
    Hdd,
    #[serde(rename = "NVMe")]
    Nvme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiskHealth {
    Healthy,
    Warning,
    Critical,
    Uninitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiskStatus {
    #[serde(rename = "In Pool")]
    InPool,
    Available,
}

/// One physical drive bay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDisk {
    pub id: String,
    pub model: String,
    pub serial_number: String,
    pub firmware_version: String,
    #[serde(rename = "type")]
    pub kind: DiskKind,
    /// Human-readable size, e.g. `"3.6 TB"` (binary units).
    pub capacity: String,
    pub health: DiskHealth,
    /// °C. Placeholder: drive sensors need SMART access.
    pub temperature: f64,
    pub status: DiskStatus,
    /// 1-based position in the listing.
    pub slot: u32,
}

/// Format a byte count the way the storage page shows it.
pub fn format_capacity(bytes: u64) -> String {
    format!("{:.1} TB", bytes as f64 / TIB)
}

/// Device names (e.g. `sda1`, `nvme0n1p2`) that appear as mount sources in
/// `/proc/mounts` content.
pub fn mounted_devices(mounts: &str) -> Vec<String> {
    mounts
        .lines()
        .filter_map(|l| l.split_whitespace().next())
        .filter_map(|src| src.strip_prefix("/dev/"))
        .map(|dev| dev.rsplit('/').next().unwrap_or(dev).to_string())
        .collect()
}

/// Whether `dev` is the disk `disk` itself or one of its partitions.
///
/// `sda` owns `sda1` but not `sdaa1`; `nvme0n1` owns `nvme0n1p2` but not
/// `nvme0n10p1`.
fn belongs_to_disk(dev: &str, disk: &str) -> bool {
    let Some(rest) = dev.strip_prefix(disk) else {
        return false;
    };
    let digits = if disk.ends_with(|c: char| c.is_ascii_digit()) {
        match rest.strip_prefix('p') {
            Some(d) => d,
            None => return rest.is_empty(),
        }
    } else {
        rest
    };
    rest.is_empty() || (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn read_attr(dir: &Path, rel: &str) -> Option<String> {
    let raw = std::fs::read_to_string(dir.join(rel)).ok()?;
    let v = raw.trim();
    (!v.is_empty()).then(|| v.to_string())
}

/// List physical disks under a `/sys/block`-style directory.
///
/// `mounts` is the content of `/proc/mounts`; a disk is `In Pool` when any of
/// its partitions (or the whole device) is mounted.
pub fn list_disks(sys_block: &Path, mounts: &str) -> std::io::Result<Vec<StorageDisk>> {
    let mut names: Vec<String> = std::fs::read_dir(sys_block)?
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| is_likely_disk_device(n))
        .collect();
    names.sort();

    let mounted = mounted_devices(mounts);
    let mut disks = Vec::new();
    for name in names {
        let dir = sys_block.join(&name);
        let sectors = read_attr(&dir, "size")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        // Empty card readers and detached virtual disks.
        if sectors == 0 {
            continue;
        }
        let kind = if name.starts_with("nvme") {
            DiskKind::Nvme
        } else if read_attr(&dir, "queue/rotational").as_deref() == Some("1") {
            DiskKind::Hdd
        } else {
            DiskKind::Ssd
        };
        let serial = read_attr(&dir, "device/serial");
        let slot = disks.len() as u32 + 1;
        let in_pool = mounted.iter().any(|m| belongs_to_disk(m, &name));
        disks.push(StorageDisk {
            id: serial.clone().unwrap_or_else(|| format!("disk-{}", slot - 1)),
            model: read_attr(&dir, "device/model").unwrap_or_else(|| name.clone()),
            serial_number: serial.unwrap_or_else(|| "N/A".to_string()),
            firmware_version: read_attr(&dir, "device/firmware_rev")
                .or_else(|| read_attr(&dir, "device/rev"))
                .unwrap_or_else(|| "N/A".to_string()),
            kind,
            capacity: format_capacity(sectors.saturating_mul(SECTOR_BYTES)),
            health: DiskHealth::Healthy,
            temperature: BASE_DISK_TEMP_C + f64::from(slot - 1),
            status: if in_pool {
                DiskStatus::InPool
            } else {
                DiskStatus::Available
            },
            slot,
        });
    }
    log::debug!("inventory: {} disk(s) under {}", disks.len(), sys_block.display());
    Ok(disks)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareProtocol {
    #[serde(rename = "SMB")]
    Smb,
    #[serde(rename = "NFS")]
    Nfs,
    #[serde(rename = "AFP")]
    Afp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareStatus {
    Active,
    Locked,
    Hidden,
}

/// A network share as listed on the shares page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    pub id: String,
    pub name: String,
    pub path: String,
    pub protocol: ShareProtocol,
    pub status: ShareStatus,
    pub is_private: bool,
    pub authorized_users: Vec<String>,
    pub size_used: u64,
    pub size_total: u64,
}

/// Share sections of an `smb.conf`, skipping `[global]` and printer sections.
pub fn parse_smb_shares(conf: &str) -> Vec<Share> {
    conf.lines()
        .map(str::trim)
        .filter(|l| !l.starts_with('#') && !l.starts_with(';'))
        .filter_map(|l| l.strip_prefix('[')?.split_once(']').map(|(name, _)| name.trim()))
        .filter(|name| {
            !name.is_empty()
                && !RESERVED_SHARES
                    .iter()
                    .any(|r| r.eq_ignore_ascii_case(name))
        })
        .enumerate()
        .map(|(i, name)| Share {
            id: format!("share-{i}"),
            name: name.to_string(),
            path: format!("/srv/samba/{name}"),
            protocol: ShareProtocol::Smb,
            status: ShareStatus::Active,
            is_private: false,
            authorized_users: Vec::new(),
            size_used: 0,
            size_total: 1000,
        })
        .collect()
}

/// Shares from an `smb.conf` on disk; an unreadable file means no shares.
pub fn read_smb_shares(path: &Path) -> Vec<Share> {
    match std::fs::read_to_string(path) {
        Ok(conf) => parse_smb_shares(&conf),
        Err(e) => {
            log::debug!("inventory: cannot read {}: {e}", path.display());
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    User,
    Guest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    Disabled,
}

/// A local account as listed on the users page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub last_login: String,
    pub groups: Vec<String>,
}

/// The last ten `/etc/passwd` accounts, minus `root`, `daemon` and `bin`.
pub fn parse_passwd_users(passwd: &str) -> Vec<User> {
    let names: Vec<&str> = passwd
        .lines()
        .filter(|l| !l.trim_start().starts_with('#'))
        .filter_map(|l| l.split(':').next())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect();
    let tail = &names[names.len().saturating_sub(PASSWD_TAIL)..];

    tail.iter()
        .filter(|n| !SYSTEM_ACCOUNTS.contains(*n))
        .enumerate()
        .map(|(i, name)| User {
            id: format!("u-{i}"),
            username: (*name).to_string(),
            role: UserRole::User,
            status: UserStatus::Active,
            last_login: "System User".to_string(),
            groups: vec!["users".to_string()],
        })
        .collect()
}

/// Users from a passwd file on disk; an unreadable file means no users.
pub fn read_users(path: &Path) -> Vec<User> {
    match std::fs::read_to_string(path) {
        Ok(passwd) => parse_passwd_users(&passwd),
        Err(e) => {
            log::debug!("inventory: cannot read {}: {e}", path.display());
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn smb_sections_become_shares() {
        let conf = "\
[global]
   workgroup = WORKGROUP
# [commented]
[media]
   path = /srv/media
[ Backups ]
[printers]
[print$]
";
        let shares = parse_smb_shares(conf);
        let names: Vec<&str> = shares.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["media", "Backups"]);
        assert_eq!(shares[1].id, "share-1");
        assert_eq!(shares[0].path, "/srv/samba/media");
    }

    #[test]
    fn share_json_shape() {
        let share = &parse_smb_shares("[data]\n")[0];
        let json = serde_json::to_value(share).unwrap();
        assert_eq!(json["protocol"], "SMB");
        assert_eq!(json["isPrivate"], false);
        assert_eq!(json["sizeTotal"], 1000);
        assert_eq!(json["authorizedUsers"], serde_json::json!([]));
    }

    #[test]
    fn missing_smb_conf_is_empty() {
        assert!(read_smb_shares(Path::new("/nonexistent/smb.conf")).is_empty());
    }

    #[test]
    fn passwd_keeps_last_ten_minus_system_accounts() {
        let mut passwd = String::from("root:x:0:0::/root:/bin/sh\n");
        for i in 0..12 {
            passwd.push_str(&format!("user{i}:x:{}:100::/home/user{i}:/bin/sh\n", 1000 + i));
        }
        let users = parse_passwd_users(&passwd);
        assert_eq!(users.len(), 10);
        assert_eq!(users[0].username, "user2");
        assert_eq!(users[0].id, "u-0");
        assert_eq!(users[9].username, "user11");
    }

    #[test]
    fn passwd_filters_within_tail() {
        let passwd = "root:x:0:0:::\ndaemon:x:1:1:::\nbin:x:2:2:::\nalice:x:1000:1000:::\n";
        let users = parse_passwd_users(passwd);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "alice");
        let json = serde_json::to_value(&users[0]).unwrap();
        assert_eq!(json["lastLogin"], "System User");
        assert_eq!(json["groups"], serde_json::json!(["users"]));
    }

    #[test]
    fn capacity_is_binary_terabytes() {
        assert_eq!(format_capacity(4_000_787_030_016), "3.6 TB");
        assert_eq!(format_capacity(0), "0.0 TB");
    }

    #[test]
    fn mount_sources_are_device_names() {
        let mounts = "/dev/sda1 / ext4 rw 0 0\nproc /proc proc rw 0 0\n/dev/mapper/vg-data /data ext4 rw 0 0\n";
        assert_eq!(mounted_devices(mounts), ["sda1", "vg-data"]);
    }

    #[test]
    fn partitions_match_their_own_disk_only() {
        assert!(belongs_to_disk("sda", "sda"));
        assert!(belongs_to_disk("sda1", "sda"));
        assert!(belongs_to_disk("sda12", "sda"));
        assert!(!belongs_to_disk("sdaa1", "sda"));
        assert!(!belongs_to_disk("sdb1", "sda"));
        assert!(belongs_to_disk("nvme0n1p2", "nvme0n1"));
        assert!(belongs_to_disk("nvme0n1", "nvme0n1"));
        assert!(!belongs_to_disk("nvme0n10p1", "nvme0n1"));
        assert!(!belongs_to_disk("nvme0n1p", "nvme0n1"));
        assert!(belongs_to_disk("mmcblk0p1", "mmcblk0"));
    }

    #[test]
    fn similar_names_do_not_put_a_disk_in_the_pool() {
        let tmp = tempfile::tempdir().unwrap();
        fake_disk(tmp.path(), "sda", 1_000, "1\n", None);
        fake_disk(tmp.path(), "nvme0n1", 1_000, "0\n", None);
        let mounts = "/dev/sdaa1 /a ext4 rw 0 0\n/dev/nvme0n10p1 /b ext4 rw 0 0\n";
        let disks = list_disks(tmp.path(), mounts).unwrap();
        assert_eq!(disks.len(), 2);
        assert!(disks.iter().all(|d| d.status == DiskStatus::Available));
    }

    fn fake_disk(root: &Path, name: &str, sectors: u64, rotational: &str, model: Option<&str>) {
        let dir = root.join(name);
        fs::create_dir_all(dir.join("queue")).unwrap();
        fs::create_dir_all(dir.join("device")).unwrap();
        fs::write(dir.join("size"), format!("{sectors}\n")).unwrap();
        fs::write(dir.join("queue/rotational"), rotational).unwrap();
        if let Some(model) = model {
            fs::write(dir.join("device/model"), format!("{model}   \n")).unwrap();
        }
    }

    #[test]
    fn lists_physical_disks_from_sysfs() {
        let tmp = tempfile::tempdir().unwrap();
        fake_disk(tmp.path(), "sda", 7_814_037_168, "1\n", Some("WDC WD40EFRX"));
        fake_disk(tmp.path(), "sdb", 976_773_168, "0\n", None);
        fake_disk(tmp.path(), "nvme0n1", 1_953_525_168, "0\n", Some("Samsung 970"));
        fs::write(tmp.path().join("nvme0n1/device/serial"), "S4EWNX0N\n").unwrap();
        fake_disk(tmp.path(), "loop0", 100, "0\n", None);
        fake_disk(tmp.path(), "sr0", 0, "1\n", None);

        let disks = list_disks(tmp.path(), "/dev/nvme0n1p2 / ext4 rw 0 0\n").unwrap();
        assert_eq!(disks.len(), 3);

        let nvme = &disks[0];
        assert_eq!(nvme.kind, DiskKind::Nvme);
        assert_eq!(nvme.id, "S4EWNX0N");
        assert_eq!(nvme.status, DiskStatus::InPool);
        assert_eq!(nvme.slot, 1);

        let sda = &disks[1];
        assert_eq!(sda.kind, DiskKind::Hdd);
        assert_eq!(sda.model, "WDC WD40EFRX");
        assert_eq!(sda.serial_number, "N/A");
        assert_eq!(sda.capacity, "3.6 TB");
        assert_eq!(sda.status, DiskStatus::Available);

        let sdb = &disks[2];
        assert_eq!(sdb.kind, DiskKind::Ssd);
        assert_eq!(sdb.model, "sdb");
        assert_eq!(sdb.id, "disk-2");
        assert_eq!(sdb.temperature, 34.0);

        let json = serde_json::to_value(nvme).unwrap();
        assert_eq!(json["type"], "NVMe");
        assert_eq!(json["status"], "In Pool");
        assert_eq!(json["serialNumber"], "S4EWNX0N");
    }
}
