//! Parsers turning raw helper output into typed reports.
//!
//! The achievements helper changed its output format over time: current
//! versions emit an XML document, older deployed versions emit `@`-delimited
//! text. Both must keep working, so the parse is an explicit two-variant
//! attempt — XML first, legacy text only on a structural XML failure.

use crate::assets::AssetCache;
use crate::types::{AchievementGame, AchievementProfile, FirmwareFile, FirmwareReport};

/// Marker opening a new system group in the firmware scan output.
const SYSTEM_MARKER: &str = "> ";

/// Parse the firmware scan report: `"> <system>"` header lines open groups,
/// every other line is `status checksum path...`. Lines before the first
/// header and lines with fewer than three tokens are discarded.
pub fn parse_firmware_report(lines: &[String]) -> Vec<FirmwareReport> {
    let mut reports = Vec::new();
    let mut current: Option<FirmwareReport> = None;

    for line in lines {
        if let Some(name) = line.strip_prefix(SYSTEM_MARKER) {
            if let Some(done) = current.take() {
                reports.push(done);
            }
            current = Some(FirmwareReport {
                system: name.to_string(),
                files: Vec::new(),
            });
            continue;
        }

        let Some(report) = current.as_mut() else {
            continue;
        };

        let tokens: Vec<&str> = line.split(' ').collect();
        if tokens.len() >= 3 {
            report.files.push(FirmwareFile {
                status: tokens[0].to_string(),
                checksum: tokens[1].to_string(),
                // File paths may legitimately contain spaces.
                path: tokens[2..].join(" "),
            });
        }
    }

    if let Some(done) = current.take() {
        reports.push(done);
    }
    reports
}

/// Parse the achievements helper output into a profile, caching any
/// referenced remote images through `cache`.
pub fn parse_achievements(lines: &[String], cache: &AssetCache<'_>) -> AchievementProfile {
    let data = lines.join("\n");
    match roxmltree::Document::parse(&data) {
        Ok(doc) => parse_structured(&doc, cache),
        // Structural failure only — an XML document with missing fields
        // still parses as XML and never reaches the legacy branch.
        Err(_) => parse_legacy(lines),
    }
}

fn parse_structured(doc: &roxmltree::Document<'_>, cache: &AssetCache<'_>) -> AchievementProfile {
    let mut profile = AchievementProfile::default();

    let root = doc.root_element();
    if root.tag_name().name() != "achievements" {
        tracing::error!("achievements report has no <achievements> element");
        return profile;
    }

    for node in root.children().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "error" => {
                profile.error = Some(node.text().unwrap_or("").to_string());
                // Error is exclusive with data.
                break;
            }
            "username" => profile.username = node.text().unwrap_or("").to_string(),
            "totalpoints" => profile.total_points = node.text().unwrap_or("").to_string(),
            "rank" => profile.rank = node.text().unwrap_or("").to_string(),
            "registered" => profile.registered = node.text().unwrap_or("").to_string(),
            "userpic" => {
                let url = node.text().unwrap_or("");
                if !url.is_empty() {
                    profile.avatar = cache
                        .ensure_local(url)
                        .map(|p| p.display().to_string());
                }
            }
            "game" => {
                let game = parse_structured_game(&node, cache);
                if !game.name.is_empty() {
                    profile.games.push(game);
                }
            }
            _ => {}
        }
    }

    profile
}

fn parse_structured_game(
    node: &roxmltree::Node<'_, '_>,
    cache: &AssetCache<'_>,
) -> AchievementGame {
    let mut game = AchievementGame::default();

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "name" => game.name = child.text().unwrap_or("").to_string(),
            "achievements" => game.achievements = child.text().unwrap_or("").to_string(),
            "points" => game.points = child.text().unwrap_or("").to_string(),
            "lastplayed" => game.last_played = child.text().unwrap_or("").to_string(),
            "badge" => {
                let url = child.text().unwrap_or("");
                if !url.is_empty() {
                    game.badge = cache.ensure_local(url).map(|p| p.display().to_string());
                }
            }
            _ => {}
        }
    }

    game
}

/// Legacy `@`-delimited format kept for older helper deployments.
fn parse_legacy(lines: &[String]) -> AchievementProfile {
    // A lone non-XML line is the helper reporting an error in prose.
    if lines.len() == 1 {
        return AchievementProfile::from_error(lines[0].clone());
    }

    let mut profile = AchievementProfile::default();

    for line in lines {
        let tokens: Vec<&str> = line.split('@').collect();

        if tokens.len() == 1 {
            // Header line, e.g. "User Frodo (1234 points) is 56 (of 9999)".
            if profile.username.is_empty() {
                let words: Vec<&str> = line.split(' ').collect();
                if words.len() > 2 {
                    profile.username = words[1].to_string();
                }

                let parts: Vec<&str> = line.split(['(', ')']).collect();
                if parts.len() > 3 {
                    profile.total_points = parts[1].to_string();
                    profile.rank =
                        format!("{} ({})", parts[2].replace(" is ", ""), parts[3]);
                }
            }
            continue;
        }

        let mut game = AchievementGame {
            name: tokens[0].to_string(),
            achievements: tokens[1].replace(" achievements", ""),
            ..AchievementGame::default()
        };
        if tokens.len() >= 4 {
            game.points = tokens[2].replace(" points", "");
            game.last_played = tokens[3].replace("Last played ", "");
        }
        profile.games.push(game);
    }

    profile
}
