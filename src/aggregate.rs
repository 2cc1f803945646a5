use crate::cause::Cause;
use crate::error::ScopeParseError;
use crate::parse::KillBreakdown;
use crate::session::{Outcome, SessionId, SessionRecord, TEST_RUN_MAX_PLAYTIME};
use chrono::{Datelike, NaiveDate, Timelike};
use itertools::Itertools;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Enemy kind killed in bulk by accident; reported separately.
pub const FODDER_KIND: &str = "pollen";

/// Edge length of the square buckets used to find fatal spots.
pub const FATAL_SPOT_SIZE: f64 = 500.0;

/// Shortest-session candidates must last longer than this.
pub const SHORTEST_SESSION_FLOOR: f64 = 60.0;

/// Which sessions feed the time-of-day, month and daily histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Scope {
    #[default]
    All,
    Year(i32),
}

impl Scope {
    pub fn includes(&self, year: i32) -> bool {
        match self {
            Scope::All => true,
            Scope::Year(y) => *y == year,
        }
    }

    /// Checks the year prefix of a session identifier.
    pub fn includes_id(&self, id: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Year(_) => id
                .get(..4)
                .and_then(|y| y.parse::<i32>().ok())
                .is_some_and(|y| self.includes(y)),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str("all"),
            Scope::Year(y) => write!(f, "{y}"),
        }
    }
}

impl FromStr for Scope {
    type Err = ScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Scope::All);
        }
        if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(y) = s.parse() {
                return Ok(Scope::Year(y));
            }
        }
        Err(ScopeParseError(s.to_string()))
    }
}

impl TryFrom<String> for Scope {
    type Error = ScopeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked<K> {
    pub name: K,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Count {
    n: u64,
    /// Position of the key's first appearance
    first_seen: usize,
}

/// Counter keyed by `K`. Ranking ties go to the key that appeared first;
/// sessions are ingested in id order, so that is the earliest session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally<K: Ord> {
    counts: BTreeMap<K, Count>,
}

impl<K: Ord> Default for Tally<K> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Serialize> Serialize for Tally<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.counts.iter().map(|(k, c)| (k, c.n)))
    }
}

impl<K: Ord + Clone> Tally<K> {
    pub fn add(&mut self, key: K, n: u64) {
        let next = self.counts.len();
        self.counts
            .entry(key)
            .or_insert(Count {
                n: 0,
                first_seen: next,
            })
            .n += n;
    }

    pub fn get(&self, key: &K) -> u64 {
        self.counts.get(key).map_or(0, |c| c.n)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts.iter().map(|(k, c)| (k, c.n))
    }

    /// Entries by descending count, then by first appearance.
    pub fn ranked(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts
            .iter()
            .sorted_by_key(|(_, c)| (std::cmp::Reverse(c.n), c.first_seen))
            .map(|(k, c)| (k, c.n))
    }

    /// The `n` largest entries, highest count first.
    pub fn top(&self, n: usize) -> Vec<Ranked<K>> {
        self.ranked()
            .take(n)
            .map(|(name, count)| Ranked {
                name: name.clone(),
                count,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefer {
    /// An empty slot starts at zero; the first holder must beat it.
    Highest,
    Lowest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Held<T> {
    pub value: f64,
    #[serde(flatten)]
    pub entry: T,
}

/// Best-so-far holder for one metric. Only a strictly better value replaces
/// the holder, so the first session to reach a value keeps it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordSlot<T> {
    #[serde(skip)]
    prefer: Prefer,
    best: Option<Held<T>>,
}

impl<T> RecordSlot<T> {
    pub fn new(prefer: Prefer) -> Self {
        Self { prefer, best: None }
    }

    pub fn offer(&mut self, value: f64, entry: impl FnOnce() -> T) -> bool {
        let better = match (&self.best, self.prefer) {
            (None, Prefer::Highest) => value > 0.0,
            (None, Prefer::Lowest) => true,
            (Some(held), Prefer::Highest) => value > held.value,
            (Some(held), Prefer::Lowest) => value < held.value,
        };
        if better {
            self.best = Some(Held {
                value,
                entry: entry(),
            });
        }
        better
    }

    pub fn get(&self) -> Option<&Held<T>> {
        self.best.as_ref()
    }

    pub fn value(&self) -> f64 {
        self.best.as_ref().map_or(0.0, |h| h.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRef {
    pub session: SessionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LateNight {
    pub session: SessionId,
    pub time: String,
    pub date: NaiveDate,
}

/// Compact copy of the run with the most items picked up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendaryRun {
    pub session: SessionId,
    pub items: i64,
    pub playtime: f64,
    pub gold: i64,
    pub kills: i64,
    pub killed_by: Cause,
    pub is_victory: bool,
    pub seed: String,
    pub places: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Records {
    pub longest_session: RecordSlot<SessionRef>,
    pub shortest_session: RecordSlot<SessionRef>,
    pub late_night_owl: RecordSlot<LateNight>,
    pub richest_run: RecordSlot<SessionRef>,
    pub most_extravagant_run: RecordSlot<SessionRef>,
    pub bloodiest_run: RecordSlot<SessionRef>,
    pub legendary_run: RecordSlot<LegendaryRun>,
}

impl Default for Records {
    fn default() -> Self {
        Self {
            longest_session: RecordSlot::new(Prefer::Highest),
            shortest_session: RecordSlot::new(Prefer::Lowest),
            late_night_owl: RecordSlot::new(Prefer::Highest),
            richest_run: RecordSlot::new(Prefer::Highest),
            most_extravagant_run: RecordSlot::new(Prefer::Highest),
            bloodiest_run: RecordSlot::new(Prefer::Highest),
            legendary_run: RecordSlot::new(Prefer::Highest),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionTypes {
    pub victory: u64,
    pub death: u64,
    pub death_poly: u64,
    pub unfinished: u64,
    pub test_run: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Behavioral {
    pub total_kicks: i64,
    pub total_teleports: i64,
    pub total_wands_edited: i64,
    pub total_projectiles_shot: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Suffering {
    pub total_damage_taken: f64,
    pub total_healed: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Progression {
    pub total_items_picked_up: i64,
    /// Filled in when the report is assembled.
    pub unique_seeds: usize,
    pub gold_infinite_runs: u64,
    pub no_wand_runs: u64,
    pub peak_exploration: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimeDistribution {
    pub hourly: [u64; 24],
    pub monthly: [u64; 12],
}

/// Coarse bucket for how a finished run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeathGroup {
    Victory,
    SelfInflictedArt,
    Environment,
    Enemy,
}

impl DeathGroup {
    pub fn of(record: &SessionRecord) -> Option<Self> {
        match record.outcome {
            Outcome::Victory => Some(DeathGroup::Victory),
            Outcome::Death if record.killed_by == Cause::SelfInflicted => {
                Some(DeathGroup::SelfInflictedArt)
            }
            Outcome::Death if record.killed_by.is_hazard() => Some(DeathGroup::Environment),
            Outcome::Death => Some(DeathGroup::Enemy),
            Outcome::TestRun | Outcome::Unfinished => None,
        }
    }
}

/// Values kept from finished runs (victory or death, at least two minutes long)
/// for the median pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MedianSamples {
    pub playtimes: Vec<f64>,
    pub golds: Vec<f64>,
    pub golds_spent: Vec<f64>,
    pub golds_no_poly: Vec<f64>,
    pub golds_spent_no_poly: Vec<f64>,
    pub kills: Vec<f64>,
    pub side_biomes: Vec<f64>,
}

/// One row of the append-only ingestion log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: SessionId,
    pub outcome: Outcome,
    pub playtime: f64,
    pub gold_all: i64,
    pub enemies_killed: i64,
    pub killed_by: Cause,
}

/// Running totals for one scan. Every field is written by `ingest` only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryAggregate {
    pub scope: Scope,
    pub total_sessions: u64,
    pub total_playtime_s: f64,
    pub total_gold_collected: i64,
    pub total_gold_spent: i64,
    pub total_enemies_killed: i64,
    pub total_fodder_killed: u64,
    pub session_types: SessionTypes,
    pub death_causes: Tally<Cause>,
    pub all_death_causes: Tally<Cause>,
    pub death_groups: Tally<DeathGroup>,
    pub biomes_visited: Tally<String>,
    pub enemies_killed_breakdown: Tally<String>,
    pub fatal_spots: Tally<String>,
    pub death_locations: Vec<(f64, f64)>,
    pub time_distribution: TimeDistribution,
    pub daily_activity: BTreeMap<NaiveDate, u64>,
    pub records: Records,
    pub behavioral: Behavioral,
    pub suffering: Suffering,
    pub progression: Progression,
    pub seeds: BTreeSet<String>,
    pub samples: MedianSamples,
    pub session_log: Vec<LogEntry>,
}

impl Default for SummaryAggregate {
    fn default() -> Self {
        Self::new(Scope::All)
    }
}

fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

impl SummaryAggregate {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            total_sessions: 0,
            total_playtime_s: 0.0,
            total_gold_collected: 0,
            total_gold_spent: 0,
            total_enemies_killed: 0,
            total_fodder_killed: 0,
            session_types: SessionTypes::default(),
            death_causes: Tally::default(),
            all_death_causes: Tally::default(),
            death_groups: Tally::default(),
            biomes_visited: Tally::default(),
            enemies_killed_breakdown: Tally::default(),
            fatal_spots: Tally::default(),
            death_locations: Vec::new(),
            time_distribution: TimeDistribution::default(),
            daily_activity: BTreeMap::new(),
            records: Records::default(),
            behavioral: Behavioral::default(),
            suffering: Suffering::default(),
            progression: Progression::default(),
            seeds: BTreeSet::new(),
            samples: MedianSamples::default(),
            session_log: Vec::new(),
        }
    }

    /// Fold one session in. Callers must not ingest the same session twice.
    pub fn ingest(&mut self, record: &SessionRecord) {
        self.total_sessions += 1;
        self.total_playtime_s += record.playtime;
        self.total_enemies_killed = self.total_enemies_killed.saturating_add(record.enemies_killed);
        if !record.gold_infinite {
            self.total_gold_collected = self.total_gold_collected.saturating_add(record.gold_all);
        }
        if record.outcome.is_completed() {
            self.total_gold_spent = self.total_gold_spent.saturating_add(record.gold_spent);
        }

        self.add_counters(record);
        self.add_time(record);
        self.add_outcome(record);
        self.add_samples(record);
        self.add_records(record);
        self.add_kills(&record.kills);

        for biome in &record.biomes {
            self.biomes_visited.add(biome.clone(), 1);
        }

        self.session_log.push(LogEntry {
            id: record.id.clone(),
            outcome: record.outcome,
            playtime: record.playtime,
            gold_all: record.gold_all,
            enemies_killed: record.enemies_killed,
            killed_by: record.killed_by.clone(),
        });
    }

    fn add_counters(&mut self, record: &SessionRecord) {
        let b = &mut self.behavioral;
        b.total_kicks = b.total_kicks.saturating_add(record.kicks);
        b.total_teleports = b.total_teleports.saturating_add(record.teleports);
        b.total_wands_edited = b.total_wands_edited.saturating_add(record.wands_edited);
        b.total_projectiles_shot = b.total_projectiles_shot.saturating_add(record.projectiles_shot);

        self.suffering.total_damage_taken += record.damage_taken;
        self.suffering.total_healed += record.healed;

        let p = &mut self.progression;
        p.total_items_picked_up = p.total_items_picked_up.saturating_add(record.items_picked);
        p.peak_exploration = p.peak_exploration.max(record.places_visited);
        if record.gold_infinite {
            p.gold_infinite_runs += 1;
        }
        if record.outcome == Outcome::Victory && record.biomes_with_wands == 0 {
            p.no_wand_runs += 1;
        }

        if !record.world_seed.is_empty() {
            self.seeds.insert(record.world_seed.clone());
        }
    }

    fn add_time(&mut self, record: &SessionRecord) {
        let Some(started) = record.started_at else {
            return;
        };
        if !self.scope.includes(started.year()) {
            return;
        }

        let hour = started.hour();
        self.time_distribution.hourly[hour as usize] += 1;
        self.time_distribution.monthly[started.month0() as usize] += 1;
        *self.daily_activity.entry(started.date()).or_insert(0) += 1;

        if hour < 5 {
            let minute = started.minute();
            self.records
                .late_night_owl
                .offer(f64::from(hour * 60 + minute), || LateNight {
                    session: record.id.clone(),
                    time: format!("{hour:02}:{minute:02}"),
                    date: started.date(),
                });
        }
    }

    fn add_outcome(&mut self, record: &SessionRecord) {
        let types = &mut self.session_types;
        match record.outcome {
            Outcome::Victory => types.victory += 1,
            Outcome::Death => {
                types.death += 1;
                if record.killed_by == Cause::Polymorph {
                    types.death_poly += 1;
                }
            }
            Outcome::TestRun => types.test_run += 1,
            Outcome::Unfinished => types.unfinished += 1,
        }

        if record.outcome == Outcome::Death {
            let pos = record.death_pos;
            self.death_locations.push((round_tenth(pos.x), round_tenth(pos.y)));
            let spot = format!(
                "{},{}",
                (pos.x / FATAL_SPOT_SIZE).floor() as i64,
                (pos.y / FATAL_SPOT_SIZE).floor() as i64
            );
            self.fatal_spots.add(spot, 1);
            self.death_causes.add(record.killed_by.clone(), 1);
        }

        if record.outcome.is_completed() {
            self.all_death_causes.add(record.killed_by.clone(), 1);
        }
        if let Some(group) = DeathGroup::of(record) {
            self.death_groups.add(group, 1);
        }
    }

    fn add_samples(&mut self, record: &SessionRecord) {
        if !record.outcome.is_completed() || record.playtime < TEST_RUN_MAX_PLAYTIME {
            return;
        }
        let s = &mut self.samples;
        s.playtimes.push(record.playtime);
        s.golds.push(record.gold_all as f64);
        s.golds_spent.push(record.gold_spent as f64);
        if record.killed_by != Cause::Polymorph {
            s.golds_no_poly.push(record.gold_all as f64);
            s.golds_spent_no_poly.push(record.gold_spent as f64);
        }
        s.kills.push(record.enemies_killed as f64);
        s.side_biomes.push(record.side_biomes_count as f64);
    }

    fn add_records(&mut self, record: &SessionRecord) {
        let r = &mut self.records;
        let holder = || SessionRef {
            session: record.id.clone(),
        };

        r.longest_session.offer(record.playtime, holder);
        if record.outcome != Outcome::TestRun && record.playtime > SHORTEST_SESSION_FLOOR {
            r.shortest_session.offer(record.playtime, holder);
        }
        r.richest_run.offer(record.gold_all as f64, holder);
        r.most_extravagant_run.offer(record.gold_spent as f64, holder);
        r.bloodiest_run.offer(record.enemies_killed as f64, holder);

        if record.outcome != Outcome::TestRun {
            r.legendary_run.offer(record.items_picked as f64, || LegendaryRun {
                session: record.id.clone(),
                items: record.items_picked,
                playtime: record.playtime,
                gold: record.gold_all,
                kills: record.enemies_killed,
                killed_by: record.killed_by.clone(),
                is_victory: record.outcome == Outcome::Victory,
                seed: record.world_seed.clone(),
                places: record.places_visited,
            });
        }
    }

    fn add_kills(&mut self, kills: &KillBreakdown) {
        for (kind, count) in kills {
            if kind == FODDER_KIND {
                self.total_fodder_killed += count;
            }
            self.enemies_killed_breakdown.add(kind.clone(), *count);
        }
    }

    pub fn kills_excluding_fodder(&self) -> i64 {
        self.total_enemies_killed
            .saturating_sub(i64::try_from(self.total_fodder_killed).unwrap_or(i64::MAX))
    }

    pub fn active_days(&self) -> usize {
        self.daily_activity.len()
    }
}
