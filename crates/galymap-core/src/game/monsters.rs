//! Monster id tables.
//!
//! Keyed by the unit's txt file number, except super-unique names which are
//! keyed by the super-unique id stored in the monster data block.

/// Act and uber bosses.
pub fn boss_name(txt_file_no: u32) -> Option<&'static str> {
    Some(match txt_file_no {
        156 => "Andariel",
        211 => "Duriel",
        229 => "Radament",
        242 => "Mephisto",
        243 => "Diablo",
        250 => "Summoner",
        256 => "Izual",
        267 => "Bloodraven",
        333 => "Diabloclone",
        365 => "Griswold",
        526 => "Nihlathak",
        544 => "Baal",
        570 => "Baalclone",
        704 => "Uber Mephisto",
        705 => "Uber Diablo",
        706 => "Uber Izual",
        707 => "Uber Andariel",
        708 => "Uber Duriel",
        709 => "Uber Baal",
        _ => return None,
    })
}

/// Mercenaries, summons and other units fighting for a player.
pub fn player_minion_name(txt_file_no: u32) -> Option<&'static str> {
    Some(match txt_file_no {
        271 => "roguehire",
        338 => "act2hire",
        359 => "act3hire",
        560 => "act5hire1",
        561 => "act5hire2",
        289 => "ClayGolem",
        290 => "BloodGolem",
        291 => "IronGolem",
        292 => "FireGolem",
        357 => "Valkyrie",
        363 => "NecroSkeleton",
        364 => "NecroMage",
        417 => "ShadowWarrior",
        418 => "ShadowMaster",
        419 => "DruidHawk",
        420 => "DruidSpiritWolf",
        421 => "DruidFenris",
        423 => "HeartOfWolverine",
        424 => "OakSage",
        428 => "DruidBear",
        _ => return None,
    })
}

pub fn super_unique_name(unique_id: u16) -> Option<&'static str> {
    Some(match unique_id {
        0 => "Bonebreak",
        5 => "Corpsefire",
        11 => "Pitspawn Fouldog",
        20 => "Rakanishu",
        24 => "Treehead WoodFist",
        31 => "Fire Eye",
        45 => "The Countess",
        47 => "Sarina the Battlemaid",
        62 => "Baal Subject 1",
        66 => "Flamespike the Crawler",
        75 => "Fangskin",
        83 => "Bloodwitch the Wild",
        92 => "Beetleburst",
        97 => "Leatherarm",
        103 => "Ancient Kaa the Soulless",
        105 => "Baal Subject 2",
        120 => "The Tormentor",
        125 => "Web Mage the Burning",
        129 => "Stormtree",
        138 => "Icehawk Riftwing",
        160 => "Coldcrow",
        276 => "Boneash",
        281 => "Witch Doctor Endugu",
        284 => "Coldworm the Burrower",
        299 => "Taintbreeder",
        306 => "Grand Vizier of Chaos",
        308 => "Riftwraith the Cannibal",
        312 => "Lord De Seis",
        345..=347 => "Council Member",
        362 => "Winged Death",
        402 => "The Smith",
        409 => "The Feature Creep",
        437 => "Bonesaw Breaker",
        440 => "Pindleskin",
        443 => "Threash Socket",
        449 => "Frozenstein",
        453 => "Megaflow Rectifier",
        472 => "Anodized Elite",
        475 => "Vinvear Molech",
        479 => "Siege Boss",
        481 => "Sharp Tooth Sayer",
        494 => "Dac Farren",
        496 => "Magma Torquer",
        501 => "Snapchip Shatter",
        508 => "Axe Dweller",
        529 => "Eyeback Unleashed",
        533 => "Blaze Ripper",
        540 => "Ancient Barbarian 1",
        541 => "Ancient Barbarian 2",
        542 => "Ancient Barbarian 3",
        557 => "Baal Subject 3",
        558 => "Baal Subject 4",
        571 => "Baal Subject 5",
        735 => "The Cow King",
        736 => "Dark Elder",
        _ => return None,
    })
}

pub fn town_npc_name(txt_file_no: u32) -> Option<&'static str> {
    Some(match txt_file_no {
        146 | 244 | 245 | 246 | 265 | 520 => "DeckardCain",
        147 => "Gheed",
        148 => "Akara",
        150 => "Kashya",
        154 => "Charsi",
        155 | 175 => "Warriv",
        176 => "Atma",
        177 => "Drognan",
        178 => "Fara",
        198 => "Greiz",
        199 => "Elzix",
        200 => "Geglash",
        201 => "Jerhyn",
        202 => "Lysander",
        210 | 264 => "Meshif",
        251 | 367 | 521 => "Tyrael",
        252 => "Asheara",
        253 => "Hratli",
        254 => "Alkor",
        255 => "Ormus",
        257 => "Halbu",
        266 => "navi",
        297 => "Natalya",
        331 => "Kaelan",
        405 => "Jamella",
        406 => "Izual",
        408 => "Malachai",
        511 => "Larzuk",
        512 | 527 => "Drehya",
        513 => "Malah",
        514 => "Nihlathak Town",
        515 => "Qual-Kehk",
        _ => return None,
    })
}

/// Ambient NPCs and critters that are never worth showing.
pub fn is_hidden_npc(txt_file_no: u32) -> bool {
    matches!(
        txt_file_no,
        149 | 151
            | 152
            | 153
            | 157
            | 158
            | 159
            | 179
            | 185
            | 195
            | 196
            | 197
            | 203
            | 204
            | 205
            | 227
            | 268
            | 269
            | 272
            | 283
            | 293
            | 294
            | 296
            | 318..=330
            | 332
            | 339
            | 344
            | 351
            | 352
            | 353
            | 355
            | 366
            | 370
            | 377
            | 378
            | 392
            | 393
            | 401
            | 410
            | 411
            | 412
            | 414
            | 415
            | 416
            | 543
            | 567
            | 568
            | 569
            | 711
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups() {
        assert_eq!(boss_name(156), Some("Andariel"));
        assert_eq!(boss_name(1), None);
        assert_eq!(player_minion_name(271), Some("roguehire"));
        assert_eq!(super_unique_name(346), Some("Council Member"));
        assert_eq!(town_npc_name(520), Some("DeckardCain"));
    }

    #[test]
    fn test_hidden_npcs() {
        assert!(is_hidden_npc(149));
        assert!(is_hidden_npc(325));
        assert!(!is_hidden_npc(331));
        assert!(!is_hidden_npc(156));
    }
}
