use crate::cause::{normalize, Cause};
use crate::parse::{KillBreakdown, RawStats};
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

/// Reaching this biome means the Work was completed.
pub const VICTORY_BIOME: &str = "boss_victoryroom";

/// Areas of the required main path; anything else is a side trip.
pub const MAINLINE_BIOMES: [&str; 11] = [
    "coalmine",
    "excavationsite",
    "snowcave",
    "snowcastle",
    "rainforest",
    "rainforest_open",
    "vault",
    "crypt",
    "boss_arena",
    "holymountain",
    VICTORY_BIOME,
];

/// Areas that count as "deep" for the altar ending.
pub const DEEP_BIOMES: [&str; 4] = ["crypt", "vault", "boss_arena", "rainforest"];

const BOSS_ARENA: (f64, f64) = (6419.0, 15106.0);
const BOSS_RADIUS: f64 = 1000.0;
const ALTAR: (f64, f64) = (787.0, -1136.0);
const ALTAR_RADIUS: f64 = 500.0;

/// Sessions shorter than this with few kills are throwaway seeds.
pub const TEST_RUN_MAX_PLAYTIME: f64 = 120.0;
pub const TEST_RUN_MAX_KILLS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Victory,
    Death,
    TestRun,
    Unfinished,
}

impl Outcome {
    /// Victories and deaths are finished runs; the rest never reached an end.
    pub fn is_completed(self) -> bool {
        matches!(self, Outcome::Victory | Outcome::Death)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    fn near(&self, (cx, cy): (f64, f64), radius: f64) -> bool {
        (self.x - cx).abs() < radius && (self.y - cy).abs() < radius
    }
}

/// Session identifier as found in the file name, e.g. `20250314-223015`.
/// Lexicographic order is chronological order.
pub type SessionId = String;

pub fn parse_session_time(id: &str) -> Option<NaiveDateTime> {
    let stamp = id.get(..15)?;
    NaiveDateTime::parse_from_str(stamp, "%Y%m%d-%H%M%S").ok()
}

/// One classified play session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: SessionId,
    pub started_at: Option<NaiveDateTime>,
    pub playtime: f64,
    pub gold_all: i64,
    pub gold_rem: i64,
    pub gold_spent: i64,
    pub enemies_killed: i64,
    pub dead: bool,
    pub killed_by_raw: String,
    pub killed_by: Cause,
    pub death_pos: Position,
    pub kicks: i64,
    pub teleports: i64,
    pub wands_edited: i64,
    pub projectiles_shot: i64,
    pub damage_taken: f64,
    pub healed: f64,
    pub hp_max: f64,
    pub items_picked: i64,
    pub gold_infinite: bool,
    pub world_seed: String,
    pub biomes: Vec<String>,
    pub biomes_with_wands: i64,
    pub places_visited: i64,
    pub outcome: Outcome,
    pub side_biomes_count: usize,
    pub kills: KillBreakdown,
}

impl SessionRecord {
    pub fn classify(id: impl Into<SessionId>, raw: &RawStats, kills: Option<KillBreakdown>) -> Self {
        let id = id.into();
        let killed_by_raw = raw.text("killed_by").to_string();
        let killed_by = normalize(&killed_by_raw);
        let gold_all = raw.int("gold_all");
        let gold_rem = raw.int("gold");

        let mut biomes: Vec<String> = Vec::with_capacity(raw.biomes.len());
        for biome in &raw.biomes {
            if !biomes.contains(biome) {
                biomes.push(biome.clone());
            }
        }
        let side_biomes_count = biomes
            .iter()
            .filter(|b| !MAINLINE_BIOMES.contains(&b.as_str()))
            .count();

        let mut record = Self {
            started_at: parse_session_time(&id),
            id,
            playtime: raw.float("playtime"),
            gold_all,
            gold_rem,
            gold_spent: gold_all - gold_rem,
            enemies_killed: raw.int("enemies_killed"),
            dead: raw.flag("dead"),
            killed_by_raw,
            killed_by,
            death_pos: Position {
                x: raw.float("death_pos.x"),
                y: raw.float("death_pos.y"),
            },
            kicks: raw.int("kicks"),
            teleports: raw.int("teleports"),
            wands_edited: raw.int("wands_edited"),
            projectiles_shot: raw.int("projectiles_shot"),
            damage_taken: raw.float("damage_taken"),
            healed: raw.float("healed"),
            hp_max: raw.float("hp"),
            items_picked: raw.int("items"),
            gold_infinite: raw.flag("gold_infinite"),
            world_seed: raw.text("world_seed").trim().to_string(),
            biomes,
            biomes_with_wands: raw.int("biomes_visited_with_wands"),
            places_visited: raw.int("places_visited"),
            outcome: Outcome::Unfinished,
            side_biomes_count,
            kills: kills.unwrap_or_default(),
        };
        record.outcome = record.derive_outcome();
        record
    }

    fn visited(&self, biome: &str) -> bool {
        self.biomes.iter().any(|b| b == biome)
    }

    fn is_victory(&self) -> bool {
        if self.visited(VICTORY_BIOME) || self.killed_by == Cause::GoldTransmutation {
            return true;
        }
        if !self.dead {
            return false;
        }
        let deep = DEEP_BIOMES.iter().any(|b| self.visited(b));
        self.death_pos.near(BOSS_ARENA, BOSS_RADIUS)
            || (deep && self.death_pos.near(ALTAR, ALTAR_RADIUS))
    }

    fn derive_outcome(&self) -> Outcome {
        if self.is_victory() {
            Outcome::Victory
        } else if self.dead {
            Outcome::Death
        } else if self.playtime < TEST_RUN_MAX_PLAYTIME && self.enemies_killed < TEST_RUN_MAX_KILLS {
            Outcome::TestRun
        } else {
            Outcome::Unfinished
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.started_at.map(|t| t.year())
    }

    pub fn hour(&self) -> Option<u32> {
        self.started_at.map(|t| t.hour())
    }
}
