//! Direct OS-resource accessors: disk capacity, backlight brightness,
//! interface addresses, readiness marker. Single queries with no recovery
//! beyond an empty/boolean result.

use crate::process::run_enumeration;
use crate::traits::FilesystemOps;
use std::path::Path;

// ---------------------------------------------------------------------------
// Disk capacity
// ---------------------------------------------------------------------------

/// Free space on the filesystem holding `mount`, in whole GiB. Zero when the
/// query fails.
pub fn free_space_gb(mount: &str) -> u64 {
    df_usage(mount).map(|(_, avail)| avail / (1024 * 1024)).unwrap_or(0)
}

/// Human-readable usage summary, e.g. `"12GB/58GB (20%)"`, or `"N/A"` when
/// the filesystem cannot be queried or reports a zero size.
pub fn free_space_info(mount: &str) -> String {
    match df_usage(mount) {
        Some((total_kib, avail_kib)) => format_usage(total_kib, avail_kib),
        None => "N/A".to_string(),
    }
}

fn format_usage(total_kib: u64, avail_kib: u64) -> String {
    let total = total_kib / (1024 * 1024);
    let free = avail_kib / (1024 * 1024);
    if total == 0 {
        return "N/A".to_string();
    }

    let used = total - free;
    let percent = used * 100 / total;
    format!("{}GB/{}GB ({}%)", used, total, percent)
}

/// Below two GiB free the appliance starts refusing bulky operations.
pub fn is_free_space_low(mount: &str) -> bool {
    free_space_gb(mount) < 2
}

fn df_usage(mount: &str) -> Option<(u64, u64)> {
    parse_df_output(&run_enumeration(&format!("df -Pk {}", mount)))
}

/// Extract `(total KiB, available KiB)` from POSIX `df -Pk` output.
fn parse_df_output(lines: &[String]) -> Option<(u64, u64)> {
    let fields: Vec<&str> = lines.get(1)?.split_whitespace().collect();
    let total = fields.get(1)?.parse().ok()?;
    let avail = fields.get(3)?.parse().ok()?;
    Some((total, avail))
}

// ---------------------------------------------------------------------------
// Network interfaces
// ---------------------------------------------------------------------------

/// First address on a LAN interface (`eth*`/`wlan*`), IPv4 preferred with an
/// IPv6 fallback, or `"NOT CONNECTED"`.
pub fn ip_address() -> String {
    for family in ["-4", "-6"] {
        let lines = run_enumeration(&format!("ip -o {} addr show", family));
        if let Some(addr) = first_lan_address(&lines) {
            return addr;
        }
    }
    "NOT CONNECTED".to_string()
}

/// Scan `ip -o addr show` output for a LAN interface address.
fn first_lan_address(lines: &[String]) -> Option<String> {
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (Some(iface), Some(addr)) = (fields.get(1), fields.get(3)) else {
            continue;
        };
        if iface.contains("eth") || iface.contains("wlan") {
            return Some(addr.split('/').next().unwrap_or(addr).to_string());
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Backlight brightness
// ---------------------------------------------------------------------------

/// Current backlight brightness as a percentage of the panel maximum.
pub fn brightness(fs: &dyn FilesystemOps, value_path: &Path, max_path: &Path) -> Option<u8> {
    let max = read_sysfs_value(fs, max_path)?;
    if max == 0 {
        return None;
    }
    let value = read_sysfs_value(fs, value_path)?;
    Some(((value as f32 / max as f32) * 100.0) as u8)
}

/// Write a brightness percentage, clamped to 5..=100 so the panel can never
/// be turned fully dark, scaled to the panel's raw range.
pub fn set_brightness(
    fs: &dyn FilesystemOps,
    value_path: &Path,
    max_path: &Path,
    percent: u8,
) -> bool {
    let Some(max) = read_sysfs_value(fs, max_path) else {
        return false;
    };
    if max == 0 {
        return false;
    }

    let raw = scale_brightness(percent, max);
    match fs.write_file(value_path, format!("{}\n", raw).as_bytes()) {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(path = %value_path.display(), %err, "cannot set brightness");
            false
        }
    }
}

fn scale_brightness(percent: u8, max: u32) -> u32 {
    let percent = percent.clamp(5, 100);
    (percent as f32 / 100.0 * max as f32) as u32
}

fn read_sysfs_value(fs: &dyn FilesystemOps, path: &Path) -> Option<u32> {
    let data = fs.read_file(path).ok()?;
    String::from_utf8_lossy(&data).trim().parse().ok()
}

// ---------------------------------------------------------------------------
// Readiness marker
// ---------------------------------------------------------------------------

/// Create or remove the zero-byte sentinel telling external watchers the
/// application has finished initializing.
pub fn set_ready_flag(fs: &dyn FilesystemOps, path: &Path, ready: bool) {
    if ready {
        if let Err(err) = fs.write_file(path, b"") {
            tracing::warn!(path = %path.display(), %err, "cannot set ready flag");
        }
    } else {
        let _ = fs.remove_file(path);
    }
}

pub fn is_ready_flag_set(fs: &dyn FilesystemOps, path: &Path) -> bool {
    fs.exists(path)
}

/// First line of the release version file, if present.
pub fn version(fs: &dyn FilesystemOps, path: &Path) -> Option<String> {
    let data = fs.read_file(path).ok()?;
    let text = String::from_utf8_lossy(&data);
    text.lines().next().map(|l| l.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::StdFilesystem;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn df_output_parses_totals() {
        let out = lines(&[
            "Filesystem     1024-blocks    Used Available Capacity Mounted on",
            "/dev/sda1         60817408 12582912  48234496      21% /data",
        ]);
        assert_eq!(parse_df_output(&out), Some((60817408, 48234496)));
    }

    #[test]
    fn df_garbage_is_none() {
        assert_eq!(parse_df_output(&[]), None);
        assert_eq!(parse_df_output(&lines(&["header only"])), None);
    }

    #[test]
    fn usage_summary_formats_or_collapses() {
        // 58 GiB total, 46 GiB free -> 12 used, 20%.
        assert_eq!(format_usage(60817408, 48234496), "12GB/58GB (20%)");
        // A filesystem smaller than a GiB reports N/A.
        assert_eq!(format_usage(512 * 1024, 256 * 1024), "N/A");
    }

    #[test]
    fn unqueryable_mount_is_not_available() {
        assert_eq!(free_space_info("/definitely/not/a/mount"), "N/A");
    }

    #[test]
    fn lan_address_is_found_and_stripped() {
        let out = lines(&[
            "1: lo    inet 127.0.0.1/8 scope host lo",
            "2: eth0    inet 192.168.1.10/24 brd 192.168.1.255 scope global eth0",
        ]);
        assert_eq!(first_lan_address(&out).as_deref(), Some("192.168.1.10"));
    }

    #[test]
    fn loopback_only_is_not_connected() {
        let out = lines(&["1: lo    inet 127.0.0.1/8 scope host lo"]);
        assert_eq!(first_lan_address(&out), None);
    }

    #[test]
    fn brightness_scales_and_clamps() {
        assert_eq!(scale_brightness(50, 255), 127);
        assert_eq!(scale_brightness(100, 255), 255);
        // Never below the 5% floor.
        assert_eq!(scale_brightness(0, 255), 12);
        assert_eq!(scale_brightness(200, 255), 255);
    }

    #[test]
    fn brightness_roundtrip_through_sysfs_files() {
        let dir = tempfile::tempdir().unwrap();
        let value = dir.path().join("brightness");
        let max = dir.path().join("max_brightness");
        std::fs::write(&max, "255\n").unwrap();
        std::fs::write(&value, "127\n").unwrap();

        let fs = StdFilesystem;
        assert_eq!(brightness(&fs, &value, &max), Some(49));

        assert!(set_brightness(&fs, &value, &max, 100));
        assert_eq!(std::fs::read_to_string(&value).unwrap(), "255\n");
    }

    #[test]
    fn ready_flag_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let flag = dir.path().join("ready");
        let fs = StdFilesystem;

        assert!(!is_ready_flag_set(&fs, &flag));
        set_ready_flag(&fs, &flag, true);
        assert!(is_ready_flag_set(&fs, &flag));
        assert_eq!(std::fs::metadata(&flag).unwrap().len(), 0);
        set_ready_flag(&fs, &flag, false);
        assert!(!is_ready_flag_set(&fs, &flag));
    }

    #[test]
    fn version_takes_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("version");
        std::fs::write(&file, "41.2 2026/06/01\nbuild cafe\n").unwrap();

        let fs = StdFilesystem;
        assert_eq!(version(&fs, &file).as_deref(), Some("41.2 2026/06/01"));
        assert_eq!(version(&fs, &dir.path().join("missing")), None);
    }
}
