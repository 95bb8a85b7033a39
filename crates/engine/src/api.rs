//! The maintenance-operation catalog: every privileged helper the
//! application can drive, expressed over the runner, parser, cache, and
//! handoff components.

use crate::assets::AssetCache;
use crate::context::AppContext;
use crate::download;
use crate::handoff::HandoffController;
use crate::process::{self, OutputObserver};
use crate::reports;
use crate::system;
use crate::types::*;
use std::path::{Path, PathBuf};

/// Longest observer line the package-install helpers may emit; longer lines
/// used to crash the message box that renders them.
const MAX_PACKAGE_LINE: usize = 48;

pub struct MaintenanceApi<'a> {
    ctx: &'a AppContext,
}

impl<'a> MaintenanceApi<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    fn log_path(&self, name: &str) -> PathBuf {
        self.ctx.settings().log_dir.join(name)
    }

    // -----------------------------------------------------------------------
    // Streaming operations
    // -----------------------------------------------------------------------

    pub fn update_system(&self, observer: Option<OutputObserver<'_>>) -> CommandOutcome {
        process::run_streamed("bosun-upgrade", Some(&self.log_path("upgrade.log")), observer)
    }

    pub fn backup_system(
        &self,
        device: &str,
        observer: Option<OutputObserver<'_>>,
    ) -> CommandOutcome {
        process::run_streamed(
            &format!("bosun-sync sync {}", device),
            Some(&self.log_path("sync.log")),
            observer,
        )
    }

    pub fn install_system(
        &self,
        device: &str,
        architecture: &str,
        observer: Option<OutputObserver<'_>>,
    ) -> CommandOutcome {
        process::run_streamed(
            &format!("bosun-install install {} {}", device, architecture),
            Some(&self.log_path("install.log")),
            observer,
        )
    }

    /// Run the media scraper. Only `"GAME: "` progress lines reach the
    /// observer; the full output still goes to the log.
    pub fn scrape(&self, mut observer: Option<OutputObserver<'_>>) -> CommandOutcome {
        process::run_streamed(
            "bosun-scraper",
            Some(&self.log_path("scraper.log")),
            Some(&mut |line: &str| {
                if line.starts_with("GAME: ") {
                    if let Some(func) = observer.as_mut() {
                        func(line);
                    }
                }
            }),
        )
    }

    // -----------------------------------------------------------------------
    // Enumerations
    // -----------------------------------------------------------------------

    pub fn storage_devices(&self) -> Vec<String> {
        process::run_enumeration("bosun-config storage list")
    }

    pub fn backup_devices(&self) -> Vec<String> {
        process::run_enumeration("bosun-sync list")
    }

    pub fn install_devices(&self) -> Vec<String> {
        process::run_enumeration("bosun-install list-disks")
    }

    pub fn install_architectures(&self) -> Vec<String> {
        process::run_enumeration("bosun-install list-archs")
    }

    pub fn video_modes(&self) -> Vec<String> {
        process::run_enumeration("bosun-resolution list-modes")
    }

    pub fn video_output_devices(&self) -> Vec<String> {
        process::run_enumeration("bosun-config list-outputs")
    }

    pub fn audio_output_devices(&self) -> Vec<String> {
        process::run_enumeration("bosun-audio list")
    }

    pub fn overclock_profiles(&self) -> Vec<String> {
        process::run_enumeration("bosun-overclock list")
    }

    pub fn system_information(&self) -> Vec<String> {
        process::run_enumeration("bosun-info")
    }

    pub fn bluetooth_devices(&self) -> Vec<String> {
        process::run_enumeration("bosun-bluetooth list")
    }

    pub fn wifi_networks(&self, scan: bool) -> Vec<String> {
        process::run_enumeration(if scan {
            "bosun-wifi scanlist"
        } else {
            "bosun-wifi list"
        })
    }

    /// Installable theme packages: only `[A]`vailable and `[I]`nstalled
    /// lines, other helper chatter is dropped.
    pub fn themes(&self) -> Vec<String> {
        filter_package_lines(process::run_enumeration("bosun-themes list"))
    }

    /// Installable per-system overlay sets, same line filter as themes.
    pub fn overlay_sets(&self) -> Vec<String> {
        filter_package_lines(process::run_enumeration("bosun-overlays list"))
    }

    /// Update availability with the exit status preserved: `Some(output)`
    /// only when the check helper reported an update.
    pub fn can_update(&self) -> Option<Vec<String>> {
        let mut lines = Vec::new();
        let outcome = process::run_streamed(
            "bosun-config canupdate",
            None,
            Some(&mut |line: &str| lines.push(line.to_string())),
        );

        if outcome.success() {
            tracing::info!("update available");
            Some(lines)
        } else {
            tracing::info!("no update available");
            None
        }
    }

    // -----------------------------------------------------------------------
    // Package installs
    // -----------------------------------------------------------------------

    pub fn install_theme(
        &self,
        name: &str,
        observer: Option<OutputObserver<'_>>,
    ) -> CommandOutcome {
        self.run_package_op(&format!("bosun-themes install {}", name), observer)
    }

    pub fn install_overlays(
        &self,
        system: &str,
        observer: Option<OutputObserver<'_>>,
    ) -> CommandOutcome {
        tracing::info!(system, "installing overlays");
        self.run_package_op(&format!("bosun-overlays install {}", system), observer)
    }

    pub fn remove_overlays(
        &self,
        system: &str,
        observer: Option<OutputObserver<'_>>,
    ) -> CommandOutcome {
        self.run_package_op(&format!("bosun-overlays remove {}", system), observer)
    }

    fn run_package_op(
        &self,
        command: &str,
        mut observer: Option<OutputObserver<'_>>,
    ) -> CommandOutcome {
        process::run_streamed(
            command,
            None,
            Some(&mut |line: &str| {
                if let Some(func) = observer.as_mut() {
                    func(&truncate_package_line(line));
                }
            }),
        )
    }

    // -----------------------------------------------------------------------
    // Boolean script operations
    // -----------------------------------------------------------------------

    pub fn set_overscan(&self, enable: bool) -> bool {
        process::run_script(&format!(
            "bosun-config overscan {}",
            if enable { "enable" } else { "disable" }
        ))
    }

    pub fn set_overclock(&self, profile: &str) -> bool {
        if profile.is_empty() {
            return false;
        }
        process::run_script(&format!("bosun-overclock set {}", profile))
    }

    pub fn set_storage(&self, device: &str) -> bool {
        process::run_script(&format!("bosun-config storage {}", device))
    }

    pub fn enable_wifi(&self, ssid: &str, key: &str) -> bool {
        process::run_script(&format!("bosun-wifi enable \"{}\" \"{}\"", ssid, key))
    }

    pub fn disable_wifi(&self) -> bool {
        process::run_script("bosun-wifi disable")
    }

    pub fn pair_bluetooth(&self) -> bool {
        process::run_script("bosun-bluetooth trust")
    }

    pub fn remove_bluetooth_device(&self, name: &str) -> bool {
        process::run_script(&format!("bosun-bluetooth remove {}", name))
    }

    pub fn forget_bluetooth_controllers(&self) -> bool {
        process::run_script("bosun-bluetooth forget")
    }

    pub fn generate_support_file(&self) -> bool {
        process::run_script("bosun-support")
    }

    pub fn ping(&self) -> bool {
        process::run_script("timeout 1 ping -c 1 google.com")
    }

    // -----------------------------------------------------------------------
    // Single-line queries
    // -----------------------------------------------------------------------

    pub fn current_storage(&self) -> String {
        process::run_single_line("bosun-config storage current")
            .unwrap_or_else(|| "INTERNAL".to_string())
    }

    pub fn root_password(&self) -> String {
        process::run_single_line("bosun-config root-password").unwrap_or_default()
    }

    pub fn current_audio_output_device(&self) -> String {
        process::run_single_line("bosun-audio get").unwrap_or_default()
    }

    /// Switch audio output. The mixer is torn down around the helper so the
    /// device can actually be released.
    pub fn set_audio_output_device(&self, device: &str) -> bool {
        self.ctx.audio().suspend();
        let ok = process::run_script(&format!("bosun-audio set '{}'", device));
        self.ctx.audio().resume();
        ok
    }

    // -----------------------------------------------------------------------
    // Structured reports
    // -----------------------------------------------------------------------

    pub fn firmware_report(&self) -> Vec<FirmwareReport> {
        reports::parse_firmware_report(&process::run_enumeration("bosun-systems"))
    }

    pub fn achievements(&self, username: &str) -> AchievementProfile {
        let lines = process::run_enumeration(&format!("bosun-achievements {}", username));
        if lines.is_empty() {
            return AchievementProfile::from_error(
                "Error accessing 'bosun-achievements' helper",
            );
        }

        let cache = AssetCache::new(
            self.ctx.settings().cache_dir.clone(),
            self.ctx.fs(),
            self.ctx.downloader(),
        );
        reports::parse_achievements(&lines, &cache)
    }

    /// CRC32 of a file as reported by `7zr`, optionally of an archive's
    /// contents instead of the archive itself.
    pub fn file_checksum(&self, file: &str, from_archive_contents: bool) -> String {
        let ext = Path::new(file)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let command = if from_archive_contents && (ext == "7z" || ext == "zip") {
            format!("7zr l -slt \"{}\"", file)
        } else {
            format!("7zr h \"{}\"", file)
        };

        let name = Path::new(file)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        parse_checksum_lines(&process::run_enumeration(&command), &name)
    }

    // -----------------------------------------------------------------------
    // Foreground handoffs
    // -----------------------------------------------------------------------

    pub fn launch_media_center(&self) -> HandoffOutcome {
        self.handoff("mediacenterlauncher")
    }

    pub fn launch_file_manager(&self) -> HandoffOutcome {
        self.handoff("filemanagerlauncher")
    }

    fn handoff(&self, command: &str) -> HandoffOutcome {
        HandoffController::new(self.ctx.audio(), self.ctx.display()).run(command)
    }

    // -----------------------------------------------------------------------
    // Downloads
    // -----------------------------------------------------------------------

    pub fn download_file(
        &self,
        url: &str,
        dest: &Path,
        label: &str,
        observer: Option<OutputObserver<'_>>,
    ) -> bool {
        download::download_file(self.ctx.downloader(), url, dest, label, observer)
    }

    // -----------------------------------------------------------------------
    // Direct accessors
    // -----------------------------------------------------------------------

    pub fn free_space_gb(&self) -> u64 {
        system::free_space_gb(&self.ctx.settings().data_mount)
    }

    pub fn free_space_info(&self) -> String {
        system::free_space_info(&self.ctx.settings().data_mount)
    }

    pub fn is_free_space_low(&self) -> bool {
        system::is_free_space_low(&self.ctx.settings().data_mount)
    }

    pub fn version(&self) -> String {
        system::version(self.ctx.fs(), &self.ctx.settings().version_file).unwrap_or_default()
    }

    pub fn ip_address(&self) -> String {
        system::ip_address()
    }

    pub fn brightness(&self) -> Option<u8> {
        let s = self.ctx.settings();
        system::brightness(self.ctx.fs(), &s.backlight_value, &s.backlight_max)
    }

    pub fn set_brightness(&self, percent: u8) -> bool {
        let s = self.ctx.settings();
        system::set_brightness(self.ctx.fs(), &s.backlight_value, &s.backlight_max, percent)
    }

    pub fn set_ready_flag(&self, ready: bool) {
        system::set_ready_flag(self.ctx.fs(), &self.ctx.settings().ready_flag, ready);
    }

    pub fn is_ready_flag_set(&self) -> bool {
        system::is_ready_flag_set(self.ctx.fs(), &self.ctx.settings().ready_flag)
    }
}

/// Keep only `[A]`vailable / `[I]`nstalled package lines.
fn filter_package_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .filter(|l| l.starts_with("[A]") || l.starts_with("[I]"))
        .collect()
}

fn truncate_package_line(line: &str) -> String {
    if line.chars().count() > MAX_PACKAGE_LINE {
        line.chars().take(MAX_PACKAGE_LINE - 1).collect()
    } else {
        line.to_string()
    }
}

/// Pull a CRC32 out of `7zr` output: either an explicit `"CRC = "` field or
/// the checksum column of the listing line ending in the file name.
fn parse_checksum_lines(lines: &[String], file_name: &str) -> String {
    let mut crc = String::new();
    for line in lines {
        if let Some(idx) = line.find("CRC = ") {
            crc = line[idx + 6..].to_string();
        } else if !file_name.is_empty()
            && line.ends_with(file_name)
            && line.len() > 9
            && line.as_bytes()[9] == b' '
        {
            crc = line.chars().take(8).collect();
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_lines_are_filtered() {
        let lines = vec![
            "[A] nightfall".to_string(),
            "[I] classic".to_string(),
            "[?] broken entry".to_string(),
            "fetching index...".to_string(),
        ];
        assert_eq!(
            filter_package_lines(lines),
            vec!["[A] nightfall", "[I] classic"]
        );
    }

    #[test]
    fn long_package_lines_are_cut() {
        let long = "x".repeat(80);
        assert_eq!(truncate_package_line(&long).chars().count(), MAX_PACKAGE_LINE - 1);
        assert_eq!(truncate_package_line("short"), "short");
    }

    #[test]
    fn checksum_from_crc_field() {
        let lines = vec!["Path = game.bin".to_string(), "CRC = A1B2C3D4".to_string()];
        assert_eq!(parse_checksum_lines(&lines, "game.bin"), "A1B2C3D4");
    }

    #[test]
    fn checksum_from_listing_column() {
        let lines = vec!["A1B2C3D4  game.bin".to_string()];
        assert_eq!(parse_checksum_lines(&lines, "game.bin"), "A1B2C3D4");
    }

    #[test]
    fn no_checksum_yields_empty() {
        assert_eq!(parse_checksum_lines(&[], "x.bin"), "");
        assert_eq!(
            parse_checksum_lines(&["nothing useful".to_string()], "x.bin"),
            ""
        );
    }
}
