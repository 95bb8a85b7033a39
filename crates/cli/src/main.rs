//! `bosunctl` – headless maintenance console for the bosun appliance.
//!
//! Drives the same engine logic that powers the GUI frontend, but from a
//! terminal: updates, backups, installs, package management, network setup,
//! and the structured firmware/achievement reports.

use bosun_engine::types::HandoffOutcome;
use bosun_engine::{AppContext, MaintenanceApi, Settings};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

// ===========================================================================
// CLI definition
// ===========================================================================

#[derive(Parser)]
#[command(
    name = "bosunctl",
    version,
    about = "Maintenance console for the bosun appliance"
)]
struct Cli {
    /// Settings file overriding the built-in appliance paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output machine-readable JSON where the command supports it.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the system update helper, streaming its progress.
    Update,

    /// Check whether an update is available.
    CheckUpdate,

    /// Sync the user data onto a backup device.
    Backup {
        /// Backup device, as listed by `list backup-devices`.
        device: String,
    },

    /// Install the system onto a disk. Destructive; asks for confirmation.
    Install {
        /// Target disk, as listed by `list install-devices`.
        device: String,
        /// Target architecture, as listed by `list install-archs`.
        architecture: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Run the media scraper, showing per-game progress.
    Scrape,

    /// Enumerate devices, modes, packages, or networks.
    List {
        target: ListTarget,
        /// For wifi: actively rescan instead of listing known networks.
        #[arg(long)]
        scan: bool,
    },

    /// Firmware scan report, grouped by system.
    Firmware,

    /// Achievement profile for a player.
    Achievements { username: String },

    /// Install a theme package.
    Theme {
        /// Theme name, as listed by `list themes`.
        name: String,
    },

    /// Manage per-system overlay sets.
    Overlays {
        #[command(subcommand)]
        command: OverlayCommands,
    },

    /// Configure wireless networking.
    Wifi {
        #[command(subcommand)]
        command: WifiCommands,
    },

    /// Manage bluetooth pairings.
    Bluetooth {
        #[command(subcommand)]
        command: BluetoothCommands,
    },

    /// Show or select the active storage device.
    Storage {
        #[command(subcommand)]
        command: StorageCommands,
    },

    /// Show or select the audio output device.
    Audio {
        #[command(subcommand)]
        command: AudioCommands,
    },

    /// Show the backlight brightness, or set it when a value is given.
    Brightness {
        /// Percentage (5-100).
        percent: Option<u8>,
    },

    /// Overscan compensation on or off.
    Overscan { enable: bool },

    /// Apply an overclock profile.
    Overclock {
        /// Profile name, as listed by `list overclock`.
        profile: String,
    },

    /// Data partition usage.
    Space,

    /// Release version of the appliance image.
    Version,

    /// Address of the first LAN interface.
    Ip,

    /// Check internet connectivity.
    Ping,

    /// Print the root password for the support console.
    RootPassword,

    /// CRC32 of a file via the archive helper.
    Checksum {
        file: String,
        /// Checksum the contents of a .zip/.7z instead of the archive file.
        #[arg(long)]
        archive_contents: bool,
    },

    /// Download a file with progress output.
    Download {
        url: String,
        dest: PathBuf,
        #[arg(long, default_value = "file")]
        label: String,
    },

    /// Hand the foreground to an interactive program.
    Launch { program: LaunchTarget },

    /// Generate a diagnostic support archive.
    Support,

    /// Manage the "finished initializing" readiness marker.
    Ready {
        #[command(subcommand)]
        command: ReadyCommands,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ListTarget {
    StorageDevices,
    BackupDevices,
    InstallDevices,
    InstallArchs,
    VideoModes,
    VideoOutputs,
    AudioOutputs,
    Overclock,
    Bluetooth,
    Wifi,
    Themes,
    Overlays,
    Info,
}

#[derive(Subcommand)]
enum OverlayCommands {
    Install { system: String },
    Remove { system: String },
}

#[derive(Subcommand)]
enum WifiCommands {
    Enable {
        ssid: String,
        /// Passphrase; prompted for interactively when omitted.
        #[arg(long)]
        key: Option<String>,
    },
    Disable,
}

#[derive(Subcommand)]
enum BluetoothCommands {
    /// Trust and pair nearby devices.
    Pair,
    Remove { name: String },
    /// Drop all paired controllers.
    Forget,
}

#[derive(Subcommand)]
enum StorageCommands {
    Current,
    Set { device: String },
}

#[derive(Subcommand)]
enum AudioCommands {
    Current,
    Set { device: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum LaunchTarget {
    MediaCenter,
    FileManager,
}

#[derive(Subcommand)]
enum ReadyCommands {
    Set,
    Clear,
    Check,
}

// ===========================================================================
// Main
// ===========================================================================

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref());
    let ctx = AppContext::default_platform(settings);
    let api = MaintenanceApi::new(&ctx);

    let ok = run(&cli, &api);
    if !ok {
        std::process::exit(1);
    }
}

fn run(cli: &Cli, api: &MaintenanceApi<'_>) -> bool {
    let mut echo = |line: &str| println!("{}", line);

    match &cli.command {
        Commands::Update => {
            let outcome = api.update_system(Some(&mut echo));
            report_outcome("update", &outcome.last_line, outcome.success())
        }

        Commands::CheckUpdate => match api.can_update() {
            Some(lines) => {
                for line in lines {
                    println!("{}", line);
                }
                true
            }
            None => {
                println!("no update available");
                false
            }
        },

        Commands::Backup { device } => {
            let outcome = api.backup_system(device, Some(&mut echo));
            report_outcome("backup", &outcome.last_line, outcome.success())
        }

        Commands::Install {
            device,
            architecture,
            yes,
        } => {
            if !*yes && !confirm_install(device) {
                return false;
            }
            let outcome = api.install_system(device, architecture, Some(&mut echo));
            report_outcome("install", &outcome.last_line, outcome.success())
        }

        Commands::Scrape => {
            let outcome = api.scrape(Some(&mut echo));
            report_outcome("scrape", &outcome.last_line, outcome.success())
        }

        Commands::List { target, scan } => {
            let lines = list_lines(api, *target, *scan);
            if cli.json {
                print_json(&lines);
            } else {
                for line in &lines {
                    println!("{}", line);
                }
            }
            true
        }

        Commands::Firmware => {
            let reports = api.firmware_report();
            if cli.json {
                print_json(&reports);
            } else {
                for report in &reports {
                    println!("{}", report.system);
                    for f in &report.files {
                        println!("  {:8} {} {}", f.status, f.checksum, f.path);
                    }
                }
            }
            true
        }

        Commands::Achievements { username } => {
            let profile = api.achievements(username);
            if cli.json {
                print_json(&profile);
            } else if let Some(error) = &profile.error {
                eprintln!("error: {}", error);
                return false;
            } else {
                println!(
                    "{} — {} points, rank {}, registered {}",
                    profile.username, profile.total_points, profile.rank, profile.registered
                );
                for game in &profile.games {
                    println!(
                        "  {}: {} achievements, {} points, last played {}",
                        game.name, game.achievements, game.points, game.last_played
                    );
                }
            }
            !profile.is_error()
        }

        Commands::Theme { name } => {
            let outcome = api.install_theme(name, Some(&mut echo));
            report_outcome("theme install", &outcome.last_line, outcome.success())
        }

        Commands::Overlays { command } => {
            let outcome = match command {
                OverlayCommands::Install { system } => {
                    api.install_overlays(system, Some(&mut echo))
                }
                OverlayCommands::Remove { system } => {
                    api.remove_overlays(system, Some(&mut echo))
                }
            };
            report_outcome("overlays", &outcome.last_line, outcome.success())
        }

        Commands::Wifi { command } => match command {
            WifiCommands::Enable { ssid, key } => {
                let key = match key {
                    Some(k) => k.clone(),
                    None => match prompt_passphrase(ssid) {
                        Some(k) => k,
                        None => return false,
                    },
                };
                api.enable_wifi(ssid, &key)
            }
            WifiCommands::Disable => api.disable_wifi(),
        },

        Commands::Bluetooth { command } => match command {
            BluetoothCommands::Pair => api.pair_bluetooth(),
            BluetoothCommands::Remove { name } => api.remove_bluetooth_device(name),
            BluetoothCommands::Forget => api.forget_bluetooth_controllers(),
        },

        Commands::Storage { command } => match command {
            StorageCommands::Current => {
                println!("{}", api.current_storage());
                true
            }
            StorageCommands::Set { device } => api.set_storage(device),
        },

        Commands::Audio { command } => match command {
            AudioCommands::Current => {
                println!("{}", api.current_audio_output_device());
                true
            }
            AudioCommands::Set { device } => api.set_audio_output_device(device),
        },

        Commands::Brightness { percent } => match percent {
            Some(p) => api.set_brightness(*p),
            None => match api.brightness() {
                Some(p) => {
                    println!("{}%", p);
                    true
                }
                None => {
                    eprintln!("no backlight on this device");
                    false
                }
            },
        },

        Commands::Overscan { enable } => api.set_overscan(*enable),

        Commands::Overclock { profile } => api.set_overclock(profile),

        Commands::Space => {
            println!("{}", api.free_space_info());
            if api.is_free_space_low() {
                eprintln!("warning: free space is low");
            }
            true
        }

        Commands::Version => {
            println!("{}", api.version());
            true
        }

        Commands::Ip => {
            println!("{}", api.ip_address());
            true
        }

        Commands::Ping => {
            let ok = api.ping();
            println!("{}", if ok { "online" } else { "offline" });
            ok
        }

        Commands::RootPassword => {
            let password = api.root_password();
            if password.is_empty() {
                eprintln!("password helper unavailable");
                return false;
            }
            println!("{}", password);
            true
        }

        Commands::Checksum {
            file,
            archive_contents,
        } => {
            let crc = api.file_checksum(file, *archive_contents);
            if crc.is_empty() {
                eprintln!("no checksum reported for {}", file);
                return false;
            }
            println!("{}", crc);
            true
        }

        Commands::Download { url, dest, label } => {
            api.download_file(url, dest, label, Some(&mut echo))
        }

        Commands::Launch { program } => {
            let outcome = match program {
                LaunchTarget::MediaCenter => api.launch_media_center(),
                LaunchTarget::FileManager => api.launch_file_manager(),
            };
            match outcome {
                HandoffOutcome::RebootRequested => println!("reboot requested"),
                HandoffOutcome::ShutdownRequested => println!("shutdown requested"),
                HandoffOutcome::Completed { exit_code } => {
                    tracing::debug!(exit_code, "foreground program finished")
                }
            }
            outcome.succeeded()
        }

        Commands::Support => {
            if api.generate_support_file() {
                println!("support archive generated");
                true
            } else {
                eprintln!("support helper failed");
                false
            }
        }

        Commands::Ready { command } => match command {
            ReadyCommands::Set => {
                api.set_ready_flag(true);
                true
            }
            ReadyCommands::Clear => {
                api.set_ready_flag(false);
                true
            }
            ReadyCommands::Check => {
                let set = api.is_ready_flag_set();
                println!("{}", if set { "ready" } else { "not ready" });
                set
            }
        },
    }
}

fn list_lines(api: &MaintenanceApi<'_>, target: ListTarget, scan: bool) -> Vec<String> {
    match target {
        ListTarget::StorageDevices => api.storage_devices(),
        ListTarget::BackupDevices => api.backup_devices(),
        ListTarget::InstallDevices => api.install_devices(),
        ListTarget::InstallArchs => api.install_architectures(),
        ListTarget::VideoModes => api.video_modes(),
        ListTarget::VideoOutputs => api.video_output_devices(),
        ListTarget::AudioOutputs => api.audio_output_devices(),
        ListTarget::Overclock => api.overclock_profiles(),
        ListTarget::Bluetooth => api.bluetooth_devices(),
        ListTarget::Wifi => api.wifi_networks(scan),
        ListTarget::Themes => api.themes(),
        ListTarget::Overlays => api.overlay_sets(),
        ListTarget::Info => api.system_information(),
    }
}

// ===========================================================================
// Helpers
// ===========================================================================

fn load_settings(path: Option<&std::path::Path>) -> Settings {
    let mut builder = config::Config::builder()
        .add_source(config::File::with_name("/etc/bosun/bosun").required(false));

    if let Some(p) = path {
        builder = builder.add_source(config::File::from(p.to_path_buf()));
    }
    builder = builder.add_source(config::Environment::with_prefix("BOSUN"));

    match builder.build().and_then(|c| c.try_deserialize()) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(%err, "cannot load settings, using defaults");
            Settings::default()
        }
    }
}

fn confirm_install(device: &str) -> bool {
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(format!(
            "Installing will erase everything on {}. Continue?",
            device
        ))
        .default(false)
        .interact()
        .unwrap_or(false);
    if !confirmed {
        eprintln!("aborted");
    }
    confirmed
}

fn prompt_passphrase(ssid: &str) -> Option<String> {
    dialoguer::Password::new()
        .with_prompt(format!("Passphrase for '{}'", ssid))
        .interact()
        .ok()
}

fn report_outcome(operation: &str, last_line: &str, ok: bool) -> bool {
    if ok {
        println!("{} finished", operation);
    } else {
        eprintln!("{} failed: {}", operation, last_line);
    }
    ok
}

fn print_json<T: serde::Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}
