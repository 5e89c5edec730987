//! Built-in game list and the catalog a fresh store starts with.

use chrono::NaiveDate;
use creative_core::{Creative, CreativeId, Dimension, Game, MediaKind};

pub fn seed_games() -> Vec<Game> {
    [
        ("g1", "Neon Vanguard", "Sci-Fi Shooter"),
        ("g2", "Puzzle Paradise", "Match-3"),
        ("g3", "Fantasy Quest", "RPG"),
    ]
    .into_iter()
    .map(|(id, name, genre)| Game {
        id: id.into(),
        name: name.into(),
        genre: genre.into(),
    })
    .collect()
}

pub fn find_game(games: &[Game], id: &str) -> Option<Game> {
    games.iter().find(|g| g.id == id).cloned()
}

fn thumb_for(game_id: &str) -> &'static str {
    match game_id {
        "g1" => "/assets/img_scifi.png",
        "g2" => "/assets/img_puzzle.png",
        _ => "/assets/img_fantasy.png",
    }
}

fn seeded(
    id: u32,
    game_id: &str,
    name: &str,
    kind: MediaKind,
    dims: &[&str],
    owner: &str,
    (month, day): (u32, u32),
) -> Creative {
    Creative {
        id: CreativeId::from(id),
        game_id: game_id.into(),
        name: name.into(),
        kind,
        dimensions: dims.iter().map(|d| Dimension::from(*d)).collect(),
        owner: owner.into(),
        created_on: NaiveDate::from_ymd_opt(2025, month, day).unwrap_or_default(),
        thumb: thumb_for(game_id).into(),
        platforms: None,
        fingerprint: None,
        meta_image_hash: None,
    }
}

/// Default catalog used when nothing has been persisted yet.
pub fn seed_creatives() -> Vec<Creative> {
    use MediaKind::*;
    vec![
        seeded(1, "g1", "Hero Gameplay v1", Video, &["9:16", "1:1", "16:9"], "Itai User", (10, 24)),
        seeded(2, "g1", "Level 3 Playable", Playable, &["HTML5"], "Dev Team", (10, 22)),
        seeded(3, "g1", "Character Reveal", Video, &["9:16"], "Itai User", (10, 21)),
        seeded(11, "g1", "Boss Fight Teaser", Video, &["9:16", "1:1"], "Itai User", (10, 26)),
        seeded(12, "g1", "Endless Mode Ad", Image, &["1:1", "9:16", "4:5"], "Sarah Design", (10, 27)),
        seeded(4, "g2", "Summer Sale Banner", Image, &["1:1", "4:5"], "Sarah Design", (10, 23)),
        seeded(5, "g2", "Win Back Promo", Image, &["1:1", "9:16"], "Sarah Design", (10, 20)),
        seeded(13, "g2", "Level 50 Challenge", Video, &["9:16"], "Itai User", (10, 28)),
        seeded(14, "g2", "Cute Characters", Image, &["1:1", "4:5"], "Sarah Design", (10, 29)),
        seeded(6, "g3", "Dragon Boss Fight", Video, &["9:16", "16:9"], "Itai User", (10, 25)),
        seeded(7, "g3", "Guild Wars Teaser", Video, &["1:1"], "Itai User", (10, 19)),
        seeded(15, "g3", "Epic Gear Showcase", Video, &["9:16", "16:9"], "Itai User", (10, 30)),
        seeded(16, "g3", "PvP Arena Clip", Video, &["9:16"], "Dev Team", (11, 1)),
        seeded(17, "g3", "Fairy Event Playable", Playable, &["HTML5"], "Dev Team", (11, 2)),
    ]
}
