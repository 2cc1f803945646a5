use crate::aggregate::SummaryAggregate;
use crate::finalize::FinalStats;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub icon: &'static str,
    pub name: &'static str,
    #[serde(rename = "desc")]
    pub description: &'static str,
}

struct BadgeRule {
    badge: Badge,
    earned: fn(&SummaryAggregate, &FinalStats) -> bool,
}

const fn rule(
    icon: &'static str,
    name: &'static str,
    description: &'static str,
    earned: fn(&SummaryAggregate, &FinalStats) -> bool,
) -> BadgeRule {
    BadgeRule {
        badge: Badge {
            icon,
            name,
            description,
        },
        earned,
    }
}

const RULES: &[BadgeRule] = &[
    rule("🧙", "Grand Alchemist", "200+ runs attempted", |a, _| {
        a.total_sessions >= 200
    }),
    rule("⌛", "Iron Will", "Held out in a single run for over 3 hours", |a, _| {
        a.records.longest_session.value() > 10_800.0
    }),
    rule("👑", "The Great Work", "Completed the Work 10+ times", |a, _| {
        a.session_types.victory >= 10
    }),
    rule("🦵", "Golden Boot", "1000+ kicks", |a, _| {
        a.behavioral.total_kicks > 1_000
    }),
    rule("🛠", "Master Tinkerer", "3000+ wand edits", |a, _| {
        a.behavioral.total_wands_edited > 3_000
    }),
    rule("💀", "God of Slaughter", "10000+ kills, pollen excluded", |a, _| {
        a.kills_excluding_fodder() >= 10_000
    }),
    rule("💰", "Richer Than Kingdoms", "Held a billion gold in one run", |a, _| {
        a.records.richest_run.value() >= 1e9
    }),
    rule("🔥", "Undefeated", "A streak of 10+ victories", |_, f| {
        f.streaks.max_win_streak >= 10
    }),
    rule("🌌", "World Eater", "Reached 33+ places in one run", |a, _| {
        a.progression.peak_exploration >= 33
    }),
    rule("🌀", "Void Walker", "500+ teleports", |a, _| {
        a.behavioral.total_teleports >= 500
    }),
];

/// Every badge whose threshold the finished aggregate meets, in rule order.
pub fn evaluate(agg: &SummaryAggregate, stats: &FinalStats) -> Vec<Badge> {
    RULES
        .iter()
        .filter(|rule| (rule.earned)(agg, stats))
        .map(|rule| rule.badge)
        .collect()
}
