//! Plain-text rendering of single-match and aggregate reports for terminals.

use gap_core::analysis::positioning::format_ratio;
use gap_core::analysis::{RankEstimate, Trend, TrendLine};
use gap_core::{AggregateReport, AnalysisReport};
use std::fmt::Write;

pub fn render(report: &AnalysisReport) -> String {
    let mut out = String::new();
    // Writing into a String never fails.
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &AnalysisReport) -> std::fmt::Result {
    let o = &report.overview;
    writeln!(out, "Gap analysis: {} on {}", report.player, report.map_name)?;
    writeln!(out)?;
    writeln!(out, "  K/D            {} / {} ({})", o.kills, o.deaths, format_ratio(o.kd_ratio))?;
    writeln!(out, "  Headshots      {:.1}%", o.headshot_rate_pct)?;
    writeln!(out, "  Aim offset     {:.1}° avg, {:.1}% bad", o.avg_aim_offset_deg, o.bad_aim_pct)?;
    writeln!(out, "  Avoidable      {:.1}% of deaths", o.avoidable_death_pct)?;
    writeln!(out, "  Flashes        {} ({:.1}% useful)", o.flashes, o.flash_useful_pct)?;
    writeln!(out, "  Value lost     ${} (net {})", o.total_value_lost, o.net_economy)?;
    if o.skipped_events > 0 {
        writeln!(out, "  Skipped        {} incomplete events", o.skipped_events)?;
    }

    writeln!(out)?;
    if report.findings.is_empty() {
        writeln!(out, "No priority findings.")?;
    } else {
        writeln!(out, "Priority findings:")?;
        for (i, f) in report.findings.iter().enumerate() {
            writeln!(out, "  {}. {} [{:.1}] {}", i + 1, f.label, f.severity, f.statistic)?;
            writeln!(out, "     {}", f.recommendation)?;
        }
    }

    if let Some(rank) = &report.rank {
        write_rank(out, rank)?;
    }

    if !report.positioning.recommendations.is_empty() {
        writeln!(out)?;
        writeln!(out, "Positioning:")?;
        for line in &report.positioning.recommendations {
            writeln!(out, "  - {}", line)?;
        }
    }

    if !report.highlights.is_empty() {
        writeln!(out)?;
        writeln!(out, "Review:")?;
        for h in report.highlights.iter().take(5) {
            let round = h.round.map(|r| format!("R{} ", r)).unwrap_or_default();
            writeln!(out, "  {}{} {}", round, h.clock, h.description)?;
        }
    }

    Ok(())
}

fn write_rank(out: &mut String, rank: &RankEstimate) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "Estimated rank: {} (~{} Elo, {:?} confidence)", rank.label, rank.elo_estimate, rank.confidence)?;
    if !rank.strengths.is_empty() {
        writeln!(out, "  Strengths      {}", rank.strengths.join(", "))?;
    }
    if !rank.weaknesses.is_empty() {
        writeln!(out, "  Weaknesses     {}", rank.weaknesses.join(", "))?;
    }
    if let Some(next) = &rank.progression {
        let gaps = next.gaps.iter().filter(|g| g.needs_improvement).count();
        writeln!(out, "  Next           {} ({} metrics to improve)", next.next_label, gaps)?;
    }
    Ok(())
}

pub fn render_aggregate(report: &AggregateReport) -> String {
    let mut out = String::new();
    // Writing into a String never fails.
    let _ = write_aggregate(&mut out, report);
    out
}

fn trend_text(line: &TrendLine) -> String {
    let word = match line.trend {
        Trend::Improving => "improving",
        Trend::Declining => "declining",
        Trend::Stable => "stable",
    };
    format!("{} ({:+.1})", word, line.change)
}

fn write_aggregate(out: &mut String, report: &AggregateReport) -> std::fmt::Result {
    let s = &report.summary;
    writeln!(out, "Gap analysis: {} over {} matches on {}", report.player, report.demos.len(), report.map_name)?;
    writeln!(out)?;
    writeln!(
        out,
        "  K/D            {:.2} avg ({} / {}), {:?} consistency",
        s.avg_kd_ratio, s.total_kills, s.total_deaths, s.kd_consistency
    )?;
    writeln!(out, "  Headshots      {:.1}% avg, {:?} consistency", s.avg_headshot_rate_pct, s.headshot_consistency)?;
    writeln!(out, "  Aim offset     {:.1}° avg, {:.1}% bad", s.avg_aim_offset_deg, s.avg_bad_aim_pct)?;
    writeln!(out, "  Avoidable      {:.1}% of deaths", report.deaths.avoidable_pct)?;
    writeln!(out, "  Flashes        {} ({:.1}% useful)", report.utility.flashes, report.utility.useful_pct)?;
    writeln!(out, "  Value lost     ${}", s.total_value_lost)?;

    if !report.findings.is_empty() {
        writeln!(out)?;
        writeln!(out, "Recurring findings:")?;
        for (i, f) in report.findings.iter().enumerate() {
            writeln!(
                out,
                "  {}. {} [{:.1}] in {}/{} matches",
                i + 1,
                f.label,
                f.avg_severity,
                f.appearances,
                report.demos.len()
            )?;
        }
    }

    if let Some(trends) = &report.trends {
        writeln!(out)?;
        writeln!(out, "Trends:")?;
        writeln!(out, "  K/D            {}", trend_text(&trends.kd_ratio))?;
        writeln!(out, "  Headshots      {}", trend_text(&trends.headshot_rate))?;
        writeln!(out, "  Bad aim        {}", trend_text(&trends.bad_aim))?;
    }

    let st = &report.standouts;
    writeln!(out)?;
    writeln!(
        out,
        "Best K/D {} ({:.2}), worst {} ({:.2})",
        st.best_kd.demo, st.best_kd.value, st.worst_kd.demo, st.worst_kd.value
    )?;

    if let Some(rank) = &report.rank {
        write_rank(out, rank)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gap_core::{analyze_match, AnalysisConfig, DeathRecord, MatchData, PlayerFrame, Vec3};

    fn report() -> AnalysisReport {
        let data = MatchData {
            map_name: "de_dust2".into(),
            frames: vec![
                PlayerFrame::new(0, "me").with_team("CT"),
                PlayerFrame::new(0, "them").with_team("T"),
            ],
            kills: vec![DeathRecord::new(64, "them", "me", "ak47")
                .in_round(1, 20.0)
                .with_victim_position(Vec3::new(100.0, 0.0, 0.0))
                .with_attacker_position(Vec3::new(0.0, 0.0, 0.0))
                .with_attacker_angles(0.0, 0.0)
                .with_headshot(true)],
            ..MatchData::default()
        };
        analyze_match(&data, "me", &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_render_flawless_ratio() {
        let text = render(&report());
        assert!(text.starts_with("Gap analysis: me on de_dust2"));
        assert!(text.contains("1 / 0 (∞)"));
    }

    #[test]
    fn test_render_shows_rank() {
        let text = render(&report());
        assert!(text.contains("Estimated rank: "));
        assert!(text.contains(" Elo, "));
    }

    #[test]
    fn test_render_aggregate_with_trends() {
        let reports = vec![("first".to_string(), report()), ("second".to_string(), report())];
        let agg = gap_core::aggregate_reports(&reports, &gap_core::RankTable::default()).unwrap();
        let text = render_aggregate(&agg);
        assert!(text.starts_with("Gap analysis: me over 2 matches on de_dust2"));
        assert!(text.contains("K/D            stable (+0.0)"));
        assert!(text.contains("Best K/D second (1.00), worst first (1.00)"));
    }

    #[test]
    fn test_render_lists_perfect_kill() {
        let text = render(&report());
        assert!(text.contains("Review:"));
        assert!(text.contains("R1 0:20 Headshot with 0° pre-aim on them"));
    }
}
