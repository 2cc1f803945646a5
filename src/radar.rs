//! Six 0-100 "ability" scores summarising play style.
//!
//! Each score divides a median or counter by a fixed mastery ceiling; anything
//! past the ceiling saturates at 100.

use crate::aggregate::SummaryAggregate;
use crate::finalize::Medians;
use crate::util::bounded_score;
use serde::Serialize;

const KILL_CEILING: f64 = 30.0;
const GOLD_CEILING: f64 = 7_000.0;
const SPEND_CEILING: f64 = 3_000.0;
const GOLD_WEIGHT: f64 = 40.0;
const SPEND_WEIGHT: f64 = 60.0;
const SIDE_BIOME_CEILING: f64 = 5.0;
const PLAYTIME_CEILING_S: f64 = 360_000.0;
const ACTIVE_DAYS_CEILING: f64 = 60.0;
const BIOME_CEILING: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RadarDimension {
    KillDrive,
    MoneyControl,
    ExplorationDrive,
    SurvivalRate,
    Grind,
    Knowledge,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RadarScores {
    pub kill_drive: u8,
    pub money_control: u8,
    pub exploration_drive: u8,
    pub survival_rate: u8,
    pub grind: u8,
    pub knowledge: u8,
}

impl RadarScores {
    pub fn iter(&self) -> impl Iterator<Item = (RadarDimension, u8)> {
        [
            (RadarDimension::KillDrive, self.kill_drive),
            (RadarDimension::MoneyControl, self.money_control),
            (RadarDimension::ExplorationDrive, self.exploration_drive),
            (RadarDimension::SurvivalRate, self.survival_rate),
            (RadarDimension::Grind, self.grind),
            (RadarDimension::Knowledge, self.knowledge),
        ]
        .into_iter()
    }
}

pub fn compute(agg: &SummaryAggregate, medians: &Medians) -> RadarScores {
    let victories = agg.session_types.victory as f64;
    let finished = (agg.session_types.victory + agg.session_types.death).max(1) as f64;

    let money = medians.gold_no_poly.min(GOLD_CEILING) / GOLD_CEILING * GOLD_WEIGHT
        + medians.gold_spent_no_poly.min(SPEND_CEILING) / SPEND_CEILING * SPEND_WEIGHT;
    let grind = agg.total_playtime_s / PLAYTIME_CEILING_S * 50.0
        + agg.active_days() as f64 / ACTIVE_DAYS_CEILING * 50.0;

    RadarScores {
        kill_drive: bounded_score(medians.kills / KILL_CEILING * 100.0),
        money_control: bounded_score(money),
        exploration_drive: bounded_score(medians.side_biomes / SIDE_BIOME_CEILING * 100.0),
        survival_rate: bounded_score(victories / finished * 100.0),
        grind: bounded_score(grind),
        knowledge: bounded_score(agg.biomes_visited.len() as f64 / BIOME_CEILING * 100.0),
    }
}
