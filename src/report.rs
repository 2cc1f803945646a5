use crate::aggregate::{
    Behavioral, DeathGroup, Progression, Ranked, Records, Scope, SessionTypes, Suffering,
    SummaryAggregate, Tally, TimeDistribution,
};
use crate::badges::{self, Badge};
use crate::cause::Cause;
use crate::finalize::{finalize, Medians, Nemesis};
use crate::radar::{self, RadarScores};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

pub const TOP_DEATH_CAUSES: usize = 12;
pub const TOP_ALL_DEATH_CAUSES: usize = 12;
pub const TOP_BIOMES: usize = 15;
pub const TOP_ENEMY_KINDS: usize = 30;
pub const TOP_FATAL_SPOTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveDay {
    pub date: NaiveDate,
    pub count: u64,
}

/// Headline for the behavioral section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlayStyle {
    /// Tunes wands more than one edit per hundred shots
    Builder,
    Tactician,
    Destroyer,
}

impl PlayStyle {
    pub fn from_behavior(b: &Behavioral) -> Self {
        if b.total_wands_edited as f64 > b.total_projectiles_shot as f64 / 100.0 {
            PlayStyle::Builder
        } else if b.total_kicks > 500 {
            PlayStyle::Tactician
        } else {
            PlayStyle::Destroyer
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecords {
    #[serde(flatten)]
    pub holders: Records,
    pub most_active_day: Option<ActiveDay>,
    pub nemesis: Nemesis,
    pub max_win_streak: u32,
    pub max_loss_streak: u32,
}

/// Final, read-only summary handed to presentation and export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub year: Scope,
    pub total_sessions: u64,
    pub total_playtime_s: f64,
    pub total_gold_collected: i64,
    pub total_gold_spent: i64,
    pub total_enemies_killed: i64,
    pub total_fodder_killed: u64,
    pub session_types: SessionTypes,
    pub death_causes: Vec<Ranked<Cause>>,
    pub all_death_causes: Vec<Ranked<Cause>>,
    pub biomes_visited: Vec<Ranked<String>>,
    pub distinct_biomes: usize,
    pub enemies_killed_breakdown: Vec<Ranked<String>>,
    pub fatal_spots: Vec<Ranked<String>>,
    pub death_groups: Tally<DeathGroup>,
    pub death_locations: Vec<(f64, f64)>,
    pub time_distribution: TimeDistribution,
    pub daily_activity: BTreeMap<NaiveDate, u64>,
    pub records: ReportRecords,
    pub behavioral: Behavioral,
    pub play_style: PlayStyle,
    pub suffering: Suffering,
    pub progression: Progression,
    pub medians: Medians,
    pub badges: Vec<Badge>,
    pub radar_stats: RadarScores,
}

/// Busiest day; equal counts go to the earliest date.
pub fn most_active_day(daily: &BTreeMap<NaiveDate, u64>) -> Option<ActiveDay> {
    daily
        .iter()
        .fold(None::<ActiveDay>, |best, (date, count)| match best {
            Some(top) if top.count >= *count => best,
            _ => Some(ActiveDay {
                date: *date,
                count: *count,
            }),
        })
}

impl Report {
    /// Snapshot `agg` and derive everything that needs the full picture.
    /// The aggregate itself is left untouched.
    pub fn assemble(agg: &SummaryAggregate) -> Self {
        let snapshot = agg.clone();
        let stats = finalize(&snapshot);
        let badges = badges::evaluate(&snapshot, &stats);
        let radar_stats = radar::compute(&snapshot, &stats.medians);

        let mut progression = snapshot.progression;
        progression.unique_seeds = snapshot.seeds.len();

        Self {
            year: snapshot.scope,
            total_sessions: snapshot.total_sessions,
            total_playtime_s: snapshot.total_playtime_s,
            total_gold_collected: snapshot.total_gold_collected,
            total_gold_spent: snapshot.total_gold_spent,
            total_enemies_killed: snapshot.total_enemies_killed,
            total_fodder_killed: snapshot.total_fodder_killed,
            session_types: snapshot.session_types,
            death_causes: snapshot.death_causes.top(TOP_DEATH_CAUSES),
            all_death_causes: snapshot.all_death_causes.top(TOP_ALL_DEATH_CAUSES),
            biomes_visited: snapshot.biomes_visited.top(TOP_BIOMES),
            distinct_biomes: snapshot.biomes_visited.len(),
            enemies_killed_breakdown: snapshot.enemies_killed_breakdown.top(TOP_ENEMY_KINDS),
            fatal_spots: snapshot.fatal_spots.top(TOP_FATAL_SPOTS),
            death_groups: snapshot.death_groups,
            death_locations: snapshot.death_locations,
            time_distribution: snapshot.time_distribution,
            records: ReportRecords {
                holders: snapshot.records,
                most_active_day: most_active_day(&snapshot.daily_activity),
                nemesis: stats.nemesis,
                max_win_streak: stats.streaks.max_win_streak,
                max_loss_streak: stats.streaks.max_loss_streak,
            },
            daily_activity: snapshot.daily_activity,
            play_style: PlayStyle::from_behavior(&snapshot.behavioral),
            behavioral: snapshot.behavioral,
            suffering: snapshot.suffering,
            progression,
            medians: stats.medians,
            badges,
            radar_stats,
        }
    }

    pub fn kills_excluding_fodder(&self) -> i64 {
        self.total_enemies_killed
            .saturating_sub(i64::try_from(self.total_fodder_killed).unwrap_or(i64::MAX))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::raw;
    use crate::session::SessionRecord;

    fn sample_aggregate() -> SummaryAggregate {
        let mut agg = SummaryAggregate::new(Scope::Year(2025));
        let sessions = [
            ("20250101-100000", vec![("dead", "1"), ("killed_by", "Lava"), ("world_seed", "1")]),
            ("20250101-110000", vec![("dead", "1"), ("killed_by", "Lava"), ("world_seed", "2")]),
            ("20250102-110000", vec![("dead", "1"), ("killed_by", "Acid"), ("world_seed", "2")]),
            ("20250103-110000", vec![("playtime", "600"), ("world_seed", "")]),
        ];
        for (id, pairs) in sessions {
            agg.ingest(&SessionRecord::classify(id, &raw(&pairs, &["coalmine"]), None));
        }
        agg
    }

    #[test]
    fn assembling_leaves_aggregate_untouched() {
        let agg = sample_aggregate();
        let before = agg.clone();
        let first = Report::assemble(&agg);
        let second = Report::assemble(&agg);
        assert_eq!(agg, before);
        assert_eq!(first, second);
    }

    #[test]
    fn truncated_maps_match_full_maps() {
        let mut agg = SummaryAggregate::default();
        for i in 0..40u64 {
            agg.enemies_killed_breakdown.add(format!("kind{i:02}"), i % 7);
        }
        let report = Report::assemble(&agg);
        assert_eq!(report.enemies_killed_breakdown.len(), TOP_ENEMY_KINDS);
        assert_eq!(report.enemies_killed_breakdown, agg.enemies_killed_breakdown.top(TOP_ENEMY_KINDS));
        assert_eq!(report.enemies_killed_breakdown[0].count, 6);
    }

    #[test]
    fn unique_seeds_and_active_day() {
        let report = Report::assemble(&sample_aggregate());
        assert_eq!(report.progression.unique_seeds, 2);
        let day = report.records.most_active_day.unwrap();
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(day.count, 2);
        assert_eq!(report.records.nemesis.name, "lava");
        assert_eq!(report.death_causes[0].name, Cause::Lava);
    }

    #[test]
    fn active_day_ties_go_to_earliest() {
        let mut daily = BTreeMap::new();
        daily.insert(NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(), 4);
        daily.insert(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), 4);
        let day = most_active_day(&daily).unwrap();
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(most_active_day(&BTreeMap::new()), None);
    }

    #[test]
    fn play_style_headline() {
        let mut b = Behavioral {
            total_projectiles_shot: 100_000,
            total_wands_edited: 2_000,
            ..Behavioral::default()
        };
        assert_eq!(PlayStyle::from_behavior(&b), PlayStyle::Builder);
        b.total_wands_edited = 10;
        b.total_kicks = 800;
        assert_eq!(PlayStyle::from_behavior(&b), PlayStyle::Tactician);
        b.total_kicks = 0;
        assert_eq!(PlayStyle::from_behavior(&b), PlayStyle::Destroyer);
    }

    #[test]
    fn serializes_to_json() {
        let json = Report::assemble(&sample_aggregate()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["year"], "2025");
        assert_eq!(value["total_sessions"], 4);
        assert_eq!(value["death_causes"][0]["name"], "lava");
        assert_eq!(value["radar_stats"]["survival_rate"], 0);
        assert!(value["records"]["longest_session"]["session"].is_string());
    }
}
