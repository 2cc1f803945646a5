use crate::aggregate::{LogEntry, SummaryAggregate};
use crate::session::Outcome;
use crate::util::median;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Medians {
    pub playtime: f64,
    pub gold: f64,
    pub gold_spent: f64,
    pub gold_no_poly: f64,
    pub gold_spent_no_poly: f64,
    pub kills: f64,
    pub side_biomes: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streaks {
    pub max_win_streak: u32,
    pub max_loss_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nemesis {
    pub name: String,
    pub count: u64,
}

impl Nemesis {
    pub fn none() -> Self {
        Self {
            name: "none".to_string(),
            count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalStats {
    pub medians: Medians,
    pub streaks: Streaks,
    pub nemesis: Nemesis,
}

pub fn medians(agg: &SummaryAggregate) -> Medians {
    let s = &agg.samples;
    Medians {
        playtime: median(&s.playtimes),
        gold: median(&s.golds),
        gold_spent: median(&s.golds_spent),
        gold_no_poly: median(&s.golds_no_poly),
        gold_spent_no_poly: median(&s.golds_spent_no_poly),
        kills: median(&s.kills),
        side_biomes: median(&s.side_biomes),
    }
}

/// Longest victory and death runs over the sessions in chronological order.
/// Session ids sort chronologically, so arrival order does not matter.
/// Test runs and unfinished sessions neither extend nor break a streak.
pub fn streaks(log: &[LogEntry]) -> Streaks {
    let mut ordered: Vec<&LogEntry> = log.iter().collect();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));

    let (mut win, mut loss) = (0u32, 0u32);
    let mut best = Streaks::default();
    for entry in ordered {
        match entry.outcome {
            Outcome::Victory => {
                win += 1;
                loss = 0;
            }
            Outcome::Death => {
                loss += 1;
                win = 0;
            }
            Outcome::TestRun | Outcome::Unfinished => {}
        }
        best.max_win_streak = best.max_win_streak.max(win);
        best.max_loss_streak = best.max_loss_streak.max(loss);
    }
    best
}

/// Most frequent killer. Equal counts go to the cause seen first.
pub fn nemesis(agg: &SummaryAggregate) -> Nemesis {
    agg.death_causes
        .ranked()
        .find(|(cause, _)| cause.is_nemesis_candidate())
        .map(|(cause, count)| Nemesis {
            name: cause.to_string(),
            count,
        })
        .unwrap_or_else(Nemesis::none)
}

/// Post-pass over a completed aggregate.
pub fn finalize(agg: &SummaryAggregate) -> FinalStats {
    FinalStats {
        medians: medians(agg),
        streaks: streaks(&agg.session_log),
        nemesis: nemesis(agg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cause::Cause;
    use crate::session::tests::raw;
    use crate::session::SessionRecord;

    fn entry(id: &str, outcome: Outcome) -> LogEntry {
        LogEntry {
            id: id.to_string(),
            outcome,
            playtime: 0.0,
            gold_all: 0,
            enemies_killed: 0,
            killed_by: Cause::Unknown,
        }
    }

    fn log(outcomes: &[Outcome]) -> Vec<LogEntry> {
        outcomes
            .iter()
            .enumerate()
            .map(|(i, o)| entry(&format!("20250101-{:06}", i), *o))
            .collect()
    }

    #[test]
    fn streak_scenario() {
        use Outcome::*;
        let outcomes = [
            Victory, Victory, Death, Victory, Victory, Victory, Death, Death, Victory, Victory,
            Victory, Victory,
        ];
        let s = streaks(&log(&outcomes));
        assert_eq!(s.max_win_streak, 4);
        assert_eq!(s.max_loss_streak, 2);
    }

    #[test]
    fn other_outcomes_do_not_break_streaks() {
        use Outcome::*;
        let s = streaks(&log(&[Victory, TestRun, Unfinished, Victory, Death]));
        assert_eq!(s.max_win_streak, 2);
        assert_eq!(s.max_loss_streak, 1);
    }

    #[test]
    fn streaks_follow_timestamps_not_arrival() {
        use Outcome::*;
        let mut shuffled = log(&[Victory, Victory, Victory, Death]);
        shuffled.swap(1, 3);
        assert_eq!(streaks(&shuffled).max_win_streak, 3);
        assert_eq!(streaks(&[]), Streaks::default());
    }

    #[test]
    fn nemesis_skips_non_enemies() {
        let mut agg = SummaryAggregate::default();
        for (i, cause) in ["Minä", "Minä", "Minä", "Midas", "Hiisi", "Hiisi", "Lava"]
            .into_iter()
            .enumerate()
        {
            let record = SessionRecord::classify(
                format!("20250101-{:06}", i),
                &raw(&[("dead", "1"), ("killed_by", cause)], &[]),
                None,
            );
            agg.ingest(&record);
        }
        let n = nemesis(&agg);
        assert_eq!(n.name, "Hiisi");
        assert_eq!(n.count, 2);
    }

    #[test]
    fn nemesis_tie_goes_to_earliest_cause() {
        let mut agg = SummaryAggregate::default();
        for (id, cause) in [("20250101-120000", "Hiisi"), ("20250102-120000", "Lava")] {
            let record =
                SessionRecord::classify(id, &raw(&[("dead", "1"), ("killed_by", cause)], &[]), None);
            agg.ingest(&record);
        }
        let n = nemesis(&agg);
        assert_eq!(n.name, "Hiisi");
        assert_eq!(n.count, 1);
    }

    #[test]
    fn nemesis_none_when_no_candidates() {
        let agg = SummaryAggregate::default();
        assert_eq!(nemesis(&agg), Nemesis::none());
    }

    #[test]
    fn medians_of_empty_aggregate_are_zero() {
        let m = medians(&SummaryAggregate::default());
        assert_eq!(m, Medians::default());
    }
}
