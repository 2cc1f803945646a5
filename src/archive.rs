//! Plain-text archive of a finished report, plus a CSV dump of the session log.

use crate::aggregate::LogEntry;
use crate::report::Report;
use std::fmt::Write as _;
use std::io;
use unicode_width::UnicodeWidthStr;

const NAME_COLUMN: usize = 20;
const MAX_KILL_ROWS: usize = 50;

/// Pad to a display width so CJK names line up with latin ones.
fn pad(name: &str, width: usize) -> String {
    let shown = UnicodeWidthStr::width(name);
    format!("{name}{}", " ".repeat(width.saturating_sub(shown)))
}

pub fn render(report: &Report) -> Result<String, std::fmt::Error> {
    let mut txt = String::new();
    write_archive(&mut txt, report)?;
    Ok(txt)
}

fn write_archive(txt: &mut String, r: &Report) -> std::fmt::Result {
    let records = &r.records;
    let types = &r.session_types;

    writeln!(txt, "=== NOITA RECAP ARCHIVE ({}) ===", r.year)?;
    writeln!(txt)?;

    writeln!(txt, "[Core]")?;
    writeln!(txt, "- Sessions: {}", r.total_sessions)?;
    writeln!(txt, "- Playtime: {:.2} hours", r.total_playtime_s / 3600.0)?;
    writeln!(txt, "- Kills: {} ({} without pollen)", r.total_enemies_killed, r.kills_excluding_fodder())?;
    writeln!(txt, "- Gold collected: {}", r.total_gold_collected)?;
    writeln!(txt, "- Gold spent: {}", r.total_gold_spent)?;
    writeln!(
        txt,
        "- Victory/Death/Test/Unfinished: {}/{}/{}/{}",
        types.victory, types.death, types.test_run, types.unfinished
    )?;
    writeln!(txt)?;

    let b = &r.behavioral;
    writeln!(txt, "[Behavior: {}]", r.play_style)?;
    writeln!(txt, "- Kicks: {}", b.total_kicks)?;
    writeln!(txt, "- Teleports: {}", b.total_teleports)?;
    writeln!(txt, "- Wands edited: {}", b.total_wands_edited)?;
    writeln!(txt, "- Projectiles shot: {}", b.total_projectiles_shot)?;
    writeln!(txt)?;

    writeln!(txt, "[Records]")?;
    writeln!(txt, "- Longest run: {:.1} minutes", records.holders.longest_session.value() / 60.0)?;
    writeln!(txt, "- Richest run: {} gold", records.holders.richest_run.value())?;
    writeln!(txt, "- Bloodiest run: {} kills", records.holders.bloodiest_run.value())?;
    writeln!(txt, "- Peak exploration: {} places", r.progression.peak_exploration)?;
    writeln!(txt, "- Best win/loss streak: {}/{}", records.max_win_streak, records.max_loss_streak)?;
    if let Some(day) = &records.most_active_day {
        writeln!(txt, "- Most active day: {} ({} runs)", day.date, day.count)?;
    }
    if let Some(owl) = records.holders.late_night_owl.get() {
        writeln!(txt, "- Latest night start: {} {}", owl.entry.date, owl.entry.time)?;
    }
    writeln!(txt)?;

    writeln!(txt, "[Survival]")?;
    writeln!(txt, "- Damage taken: {}", r.suffering.total_damage_taken.floor())?;
    writeln!(txt, "- Healed: {}", r.suffering.total_healed.floor())?;
    writeln!(txt, "- Nemesis: {} (killed you {} times)", records.nemesis.name, records.nemesis.count)?;
    writeln!(txt, "- Unique seeds: {}", r.progression.unique_seeds)?;
    writeln!(txt, "- No-wand clears: {}", r.progression.no_wand_runs)?;
    writeln!(txt)?;

    writeln!(txt, "[Radar]")?;
    for (dimension, score) in r.radar_stats.iter() {
        writeln!(txt, "{}: {score}", pad(&dimension.to_string(), NAME_COLUMN))?;
    }
    writeln!(txt)?;

    writeln!(txt, "[Badges]")?;
    if r.badges.is_empty() {
        writeln!(txt, "(none yet)")?;
    }
    for badge in &r.badges {
        writeln!(txt, "{} {}: {}", badge.icon, badge.name, badge.description)?;
    }
    writeln!(txt)?;

    writeln!(txt, "[Kills (top {MAX_KILL_ROWS})]")?;
    for entry in r.enemies_killed_breakdown.iter().take(MAX_KILL_ROWS) {
        writeln!(txt, "{}: {}", pad(&entry.name, NAME_COLUMN), entry.count)?;
    }

    writeln!(txt)?;
    writeln!(txt, "[Death causes]")?;
    for entry in &r.all_death_causes {
        writeln!(txt, "{}: {}", pad(entry.name.label(), NAME_COLUMN), entry.count)?;
    }

    writeln!(txt)?;
    writeln!(txt, "[Biomes visited]")?;
    for entry in &r.biomes_visited {
        writeln!(txt, "{}: {}", pad(&entry.name, NAME_COLUMN), entry.count)?;
    }

    writeln!(txt)?;
    write!(txt, "--- The truth is not found, it is lived ---")
}

/// Write the ingestion log as CSV, oldest session first.
pub fn write_session_log<W: io::Write>(log: &[LogEntry], writer: W) -> Result<(), csv::Error> {
    let mut rows: Vec<&LogEntry> = log.iter().collect();
    rows.sort_by(|a, b| a.id.cmp(&b.id));

    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::SummaryAggregate;
    use crate::cause::Cause;
    use crate::session::tests::raw;
    use crate::session::{Outcome, SessionRecord};

    fn report() -> (SummaryAggregate, Report) {
        let mut agg = SummaryAggregate::default();
        agg.ingest(&SessionRecord::classify(
            "20250105-230000",
            &raw(&[("dead", "1"), ("killed_by", "岩浆"), ("playtime", "3600")], &["coalmine"]),
            None,
        ));
        agg.ingest(&SessionRecord::classify(
            "20250104-020000",
            &raw(&[("playtime", "7200")], &["boss_victoryroom"]),
            None,
        ));
        let report = Report::assemble(&agg);
        (agg, report)
    }

    #[test]
    fn pads_by_display_width() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("岩浆", 6), "岩浆  ");
        assert_eq!(pad("toolongname", 4), "toolongname");
    }

    #[test]
    fn render_is_deterministic() {
        let (_, r) = report();
        assert_eq!(render(&r).unwrap(), render(&r).unwrap());
    }

    #[test]
    fn render_contains_core_numbers() {
        let (_, r) = report();
        let txt = render(&r).unwrap();
        assert!(txt.starts_with("=== NOITA RECAP ARCHIVE (all) ==="));
        assert!(txt.contains("- Sessions: 2"));
        assert!(txt.contains("- Playtime: 3.00 hours"));
        assert!(txt.contains("- Victory/Death/Test/Unfinished: 1/1/0/0"));
        assert!(txt.contains("- Best win/loss streak: 1/1"));
        assert!(txt.contains("lava"));
        assert!(txt.contains("(none yet)"));
    }

    #[test]
    fn session_log_csv_is_sorted() {
        let (agg, _) = report();
        let mut out = Vec::new();
        write_session_log(&agg.session_log, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,outcome,playtime,gold_all,enemies_killed,killed_by");
        assert!(lines[1].starts_with("20250104-020000,victory"));
        assert!(lines[2].starts_with("20250105-230000,death"));
        assert!(lines[2].ends_with("lava"));
        assert_eq!(agg.session_log[0].outcome, Outcome::Death);
        assert_eq!(agg.session_log[0].killed_by, Cause::Lava);
    }
}
