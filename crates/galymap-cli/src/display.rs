//! Console output formatting with colored display

use std::fmt::Write as _;

use galymap_core::game::{GroundItem, ItemQuality, Mob};
use galymap_core::{Difficulty, Position, Snapshot, UiFlags};
use owo_colors::OwoColorize;

const BORDER_WIDTH: usize = 60;

/// Mobs listed per snapshot; bosses are always shown first.
const MAX_MOBS_SHOWN: usize = 12;

/// Format a snapshot as a boxed, colored multi-line block.
pub fn format_snapshot(snapshot: &Snapshot) -> String {
    let mut output = String::new();
    let border = "━".repeat(BORDER_WIDTH);
    let border_dim = border.dimmed();

    let Some(player) = snapshot.player.as_ref().filter(|_| snapshot.in_game) else {
        let _ = write!(
            output,
            "{} {}",
            format!("#{}", snapshot.generation).dimmed(),
            "Not in game".dimmed()
        );
        return output;
    };

    let _ = writeln!(output, "{}", border_dim);
    let _ = writeln!(
        output,
        "  {} [{} Lv.{}]  {}",
        player.name.bold(),
        format_colored_difficulty(player.difficulty),
        player.progress.level,
        format!("#{}", snapshot.generation).dimmed()
    );
    let _ = writeln!(output, "{}", border_dim);
    let _ = writeln!(output, "  AREA   : {}", player.level_no);
    let _ = writeln!(output, "  POS    : {}", format_position(&player.position));
    let _ = writeln!(output, "  SEED   : {}", player.map_seed);
    let _ = writeln!(output, "  EXP    : {}", player.progress.experience);
    let _ = writeln!(output, "  UI     : {}", format_ui(&snapshot.ui));

    if let Some(mob) = &snapshot.hovered_mob {
        let _ = writeln!(output, "  HOVER  : {}", format_mob(mob, &player.position));
    }

    if !snapshot.mobs.is_empty() {
        let mut mobs: Vec<&Mob> = snapshot.mobs.iter().filter(|mob| !mob.is_dead()).collect();
        mobs.sort_by(|a, b| {
            b.is_boss.cmp(&a.is_boss).then_with(|| {
                a.position
                    .distance_to(&player.position)
                    .total_cmp(&b.position.distance_to(&player.position))
            })
        });
        let _ = writeln!(
            output,
            "  MOBS   : {} alive / {} total",
            mobs.len(),
            snapshot.mobs.len()
        );
        for mob in mobs.iter().take(MAX_MOBS_SHOWN) {
            let _ = writeln!(output, "    {}", format_mob(mob, &player.position));
        }
        if mobs.len() > MAX_MOBS_SHOWN {
            let _ = writeln!(
                output,
                "    {}",
                format!("... {} more", mobs.len() - MAX_MOBS_SHOWN).dimmed()
            );
        }
    }

    if !snapshot.items.is_empty() {
        let _ = writeln!(output, "  ITEMS  : {}", snapshot.items.len());
        for item in &snapshot.items {
            let _ = writeln!(output, "    {}", format_item(item));
        }
    }

    if !snapshot.other_players.is_empty() {
        let _ = writeln!(output, "  PLAYERS:");
        for other in &snapshot.other_players {
            let mut line = other.name.clone();
            if other.is_corpse {
                line.push_str(" (corpse)");
            }
            if other.from_roster {
                let _ = writeln!(output, "    {} {}", line.dimmed(), "[roster]".dimmed());
            } else {
                let _ = writeln!(output, "    {} {}", line, format_position(&other.position));
            }
        }
    }

    if !snapshot.party.is_empty() {
        let _ = writeln!(output, "  PARTY  :");
        for member in &snapshot.party {
            let _ = writeln!(
                output,
                "    {} Lv.{} area {}",
                member.name, member.player_level, member.area
            );
        }
    }

    let _ = write!(output, "{}", border_dim);
    output
}

/// Format difficulty with color
fn format_colored_difficulty(difficulty: Difficulty) -> String {
    let name = difficulty.to_string();
    match difficulty {
        Difficulty::Normal => name.green().to_string(),
        Difficulty::Nightmare => name.yellow().to_string(),
        Difficulty::Hell => name.red().to_string(),
    }
}

fn format_mob(mob: &Mob, origin: &Position) -> String {
    let name = mob
        .title
        .clone()
        .or_else(|| mob.town_npc.clone())
        .unwrap_or_else(|| format!("monster #{}", mob.txt_file_no));
    let name = if mob.is_boss {
        name.bold().purple().to_string()
    } else if mob.is_player_minion {
        name.dimmed().to_string()
    } else {
        name
    };

    let mut line = format!(
        "{} {}/{} {:.0}y",
        name,
        mob.hp,
        mob.max_hp,
        mob.position.distance_to(origin)
    );
    let immunities = mob.immunities.immune_to();
    if !immunities.is_empty() {
        let colored: Vec<String> = immunities.into_iter().map(format_colored_immunity).collect();
        let _ = write!(line, " immune: {}", colored.join(","));
    }
    if mob.is_hovered {
        line.push_str(" *");
    }
    line
}

/// Format immunity with color
fn format_colored_immunity(name: &str) -> String {
    match name {
        "physical" => name.truecolor(200, 160, 100).to_string(),
        "magic" => name.truecolor(255, 140, 0).to_string(),
        "fire" => name.red().to_string(),
        "lightning" => name.yellow().to_string(),
        "cold" => name.blue().to_string(),
        "poison" => name.green().to_string(),
        _ => name.to_string(),
    }
}

fn format_item(item: &GroundItem) -> String {
    let label = match item.quality() {
        Some(quality) => format!("{} #{}", quality, item.txt_file_no),
        None => format!("item #{}", item.txt_file_no),
    };
    let label = match item.quality() {
        Some(ItemQuality::Unique) => label.truecolor(199, 179, 119).to_string(),
        Some(ItemQuality::Set) => label.green().to_string(),
        Some(ItemQuality::Rare) => label.yellow().to_string(),
        Some(ItemQuality::Magic) => label.blue().to_string(),
        Some(ItemQuality::Crafted) => label.truecolor(255, 165, 0).to_string(),
        Some(ItemQuality::Inferior) => label.dimmed().to_string(),
        _ => label,
    };

    let mut flags = Vec::new();
    if item.flags.ethereal() {
        flags.push("eth");
    }
    if item.flags.socketed() {
        flags.push("sock");
    }
    if item.flags.runeword() {
        flags.push("rw");
    }
    if !item.flags.identified() {
        flags.push("unid");
    }

    let mut line = format!("{} {}", label, format_position(&item.position));
    if !flags.is_empty() {
        let _ = write!(line, " [{}]", flags.join(","));
    }
    if item.alerted {
        let _ = write!(line, " {}", "ALERT".bold().red());
    }
    line
}

fn format_position(position: &Position) -> String {
    format!("({:.1}, {:.1})", position.x, position.y)
}

fn format_ui(ui: &UiFlags) -> String {
    let mut open = Vec::new();
    if ui.left_panel() {
        open.push("left");
    }
    if ui.right_panel() {
        open.push("right");
    }
    if ui.menu_shown() {
        open.push("menu");
    }
    if open.is_empty() {
        "-".to_string()
    } else {
        open.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_in_game_is_single_line() {
        let snapshot = Snapshot {
            generation: 4,
            ..Snapshot::default()
        };
        let output = format_snapshot(&snapshot);
        assert!(output.contains("Not in game"));
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_format_ui_lists_open_panels() {
        let ui = UiFlags {
            inventory: true,
            ..UiFlags::default()
        };
        assert_eq!(format_ui(&UiFlags::default()), "-");
        assert!(format_ui(&ui).contains("right"));
    }
}
