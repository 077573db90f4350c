use std::fmt::Write;

use crate::analyzer::{Finding, FindingKind};
use crate::format::{format_bytes, truncate_unicode};
use crate::system::snapshot::{
    Attribute, CombinedSnapshot, ProcessSnapshot, ProcessStatus, SystemSnapshot,
};
use crate::ui::theme::{Theme, Tone};

const RULE_WIDTH: usize = 60;
const CPU_MODEL_WIDTH: usize = 50;

const OPEN_FILES_THRESHOLD: u64 = 100;
const CONNECTIONS_THRESHOLD: u64 = 50;
const CHILDREN_THRESHOLD: u64 = 10;

/// The human-readable report: snapshot sections followed by the findings.
pub fn render_report(snapshot: &CombinedSnapshot, findings: &[Finding], theme: &Theme) -> String {
    let mut out = String::with_capacity(2048);
    let process = &snapshot.process;

    let title = format!("INSPEKTOR - Process {} ({})", process.pid, process.name);
    let _ = writeln!(out, "{}", theme.bold(&title, theme.title));
    let _ = writeln!(out, "{}", theme.paint(&"─".repeat(RULE_WIDTH), theme.separator));

    render_process(&mut out, process, theme);
    render_resources(&mut out, process, theme);
    render_system(&mut out, &snapshot.system, theme);
    out.push('\n');
    render_findings(&mut out, findings, theme);
    out
}

fn section(out: &mut String, name: &str, theme: &Theme) {
    let _ = writeln!(
        out,
        "{}",
        theme.badge(&format!(" {name} "), theme.section_fg, theme.section_bg)
    );
}

fn row(out: &mut String, key: &str, value: &str, theme: &Theme) {
    let _ = writeln!(out, "  {} {}", theme.paint(&format!("{key}:"), theme.key), value);
}

fn render_process(out: &mut String, process: &ProcessSnapshot, theme: &Theme) {
    section(out, "PROCESS", theme);

    let status_tone = match process.status {
        ProcessStatus::Running => Tone::Good,
        ProcessStatus::Zombie | ProcessStatus::Stopped => Tone::Alert,
        ProcessStatus::Sleeping | ProcessStatus::Unknown => Tone::Plain,
    };
    row(out, "Status", &theme.tone(process.status.label(), status_tone), theme);

    for (key, value) in [
        ("Command", &process.command_line),
        ("Executable", &process.executable),
        ("Working Dir", &process.working_dir),
    ] {
        if !value.is_empty() {
            row(out, key, &theme.tone(value, Tone::Plain), theme);
        }
    }

    if process.is_available(Attribute::StartTime) {
        let started = process.started_at.format("%b %d, %H:%M:%S UTC").to_string();
        row(out, "Started", &theme.tone(&started, Tone::Plain), theme);
    }
}

fn render_resources(out: &mut String, process: &ProcessSnapshot, theme: &Theme) {
    section(out, "RESOURCES", theme);

    row(out, "CPU Usage", &cpu_value(process.cpu_percent, theme), theme);

    let memory = format!(
        "{} ({:.1}%)",
        format_bytes(process.memory_rss),
        process.memory_percent
    );
    row(
        out,
        "Memory",
        &theme.tone(&memory, band(process.memory_percent, 10.0, 5.0)),
        theme,
    );
    row(
        out,
        "Virtual Memory",
        &theme.tone(&format_bytes(process.memory_vms), Tone::Plain),
        theme,
    );
    row(
        out,
        "Open Files",
        &count_value(process.open_files, OPEN_FILES_THRESHOLD, theme),
        theme,
    );
    row(
        out,
        "Connections",
        &count_value(process.connections, CONNECTIONS_THRESHOLD, theme),
        theme,
    );
    row(
        out,
        "Child Processes",
        &count_value(process.children, CHILDREN_THRESHOLD, theme),
        theme,
    );
}

fn render_system(out: &mut String, system: &SystemSnapshot, theme: &Theme) {
    section(out, "SYSTEM", theme);

    let cpu = format!("{} cores, {}", system.cpu_cores, cpu_value(system.cpu_percent, theme));
    row(out, "CPU", &cpu, theme);

    let memory = format!(
        "{} / {} ({:.1}%)",
        format_bytes(system.memory_used),
        format_bytes(system.memory_total),
        system.memory_percent
    );
    row(
        out,
        "Memory",
        &theme.tone(&memory, band(system.memory_percent, 85.0, 70.0)),
        theme,
    );
    row(
        out,
        "CPU Model",
        &theme.tone(&truncate_unicode(&system.cpu_model, CPU_MODEL_WIDTH), Tone::Plain),
        theme,
    );
}

fn render_findings(out: &mut String, findings: &[Finding], theme: &Theme) {
    if findings.is_empty() {
        let _ = writeln!(out, "{}", theme.bold("✓ All systems healthy", theme.good));
        return;
    }

    let warnings: Vec<&Finding> = findings
        .iter()
        .filter(|f| f.kind == FindingKind::Warning)
        .collect();
    let recommendations: Vec<&Finding> = findings
        .iter()
        .filter(|f| f.kind == FindingKind::Recommendation)
        .collect();

    if !warnings.is_empty() {
        let _ = writeln!(out, "{}", theme.badge(" WARNINGS ", theme.alert, theme.alert_bg));
        for (i, finding) in warnings.iter().enumerate() {
            let line = format!("  {}. {}", i + 1, finding);
            let _ = writeln!(out, "{}", theme.paint(&line, theme.alert));
        }
        out.push('\n');
    }

    if !recommendations.is_empty() {
        let _ = writeln!(
            out,
            "{}",
            theme.badge(" RECOMMENDATIONS ", theme.recommend, theme.recommend_bg)
        );
        for (i, finding) in recommendations.iter().enumerate() {
            let line = format!("  {}. {}", i + 1, finding);
            let _ = writeln!(out, "{}", theme.paint(&line, theme.recommend));
        }
        out.push('\n');
    }
}

fn band(value: f64, alert_above: f64, notice_above: f64) -> Tone {
    if value > alert_above {
        Tone::Alert
    } else if value > notice_above {
        Tone::Notice
    } else {
        Tone::Plain
    }
}

fn cpu_value(percent: f64, theme: &Theme) -> String {
    theme.tone(&format!("{percent:.1}%"), band(percent, 80.0, 50.0))
}

fn count_value(count: u64, threshold: u64, theme: &Theme) -> String {
    let tone = if count > threshold {
        Tone::Alert
    } else if count > threshold / 2 {
        Tone::Notice
    } else {
        Tone::Plain
    };
    theme.tone(&count.to_string(), tone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(band(81.0, 80.0, 50.0), Tone::Alert);
        assert_eq!(band(80.0, 80.0, 50.0), Tone::Notice);
        assert_eq!(band(50.0, 80.0, 50.0), Tone::Plain);
    }

    #[test]
    fn counts_notice_above_half_threshold() {
        let theme = Theme::dark();
        assert_eq!(count_value(5, CHILDREN_THRESHOLD, &theme), theme.tone("5", Tone::Plain));
        assert_eq!(count_value(10, CHILDREN_THRESHOLD, &theme), theme.tone("10", Tone::Notice));
        assert_eq!(count_value(11, CHILDREN_THRESHOLD, &theme), theme.tone("11", Tone::Alert));
    }
}
