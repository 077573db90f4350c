use std::fmt::Write;

use super::{Finding, FindingKind};
use crate::format::{format_bytes, format_duration};
use crate::system::snapshot::{Attribute, CombinedSnapshot};

const WARNING_PREFIX: &str = "WARNING:";
const RECOMMEND_PREFIX: &str = "RECOMMEND:";
const HEALTHY_PREFIX: &str = "HEALTHY:";
const UNKNOWN: &str = "unknown";

pub const MAX_ITEMS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    /// The model explicitly reported no issues.
    Healthy,
    Findings(Vec<Finding>),
    /// Nothing in the reply matched the expected line format.
    Unrecognized,
}

pub fn build_prompt(snapshot: &CombinedSnapshot) -> String {
    let process = &snapshot.process;
    let system = &snapshot.system;
    let mut prompt = String::with_capacity(4096);

    prompt.push_str(
        "You are a senior systems administrator reviewing a single running process and the \
         host it runs on. Point out real problems and give concrete, actionable advice.\n\n",
    );

    prompt.push_str("PROCESS\n");
    let fact = |prompt: &mut String, label: &str, attribute: Attribute, value: String| {
        let value = if process.is_available(attribute) {
            value
        } else {
            UNKNOWN.to_string()
        };
        let _ = writeln!(prompt, "- {label}: {value}");
    };
    let _ = writeln!(prompt, "- PID: {}", process.pid);
    fact(&mut prompt, "Name", Attribute::Name, process.name.clone());
    fact(
        &mut prompt,
        "Status",
        Attribute::Status,
        process.status.label().to_lowercase(),
    );
    fact(
        &mut prompt,
        "Executable",
        Attribute::Executable,
        process.executable.clone(),
    );
    fact(
        &mut prompt,
        "Command",
        Attribute::CommandLine,
        process.command_line.clone(),
    );
    fact(
        &mut prompt,
        "Working directory",
        Attribute::WorkingDir,
        process.working_dir.clone(),
    );
    fact(
        &mut prompt,
        "Process age",
        Attribute::StartTime,
        format_duration(snapshot.process_age()),
    );
    fact(
        &mut prompt,
        "CPU usage",
        Attribute::CpuPercent,
        format!("{:.2}%", process.cpu_percent),
    );
    let rss = format_bytes(process.memory_rss);
    let rss = match (
        process.is_available(Attribute::Memory),
        process.is_available(Attribute::MemoryPercent),
    ) {
        (true, true) => format!("{rss} ({:.2}% of system)", process.memory_percent),
        (true, false) => rss,
        (false, _) => UNKNOWN.to_string(),
    };
    let _ = writeln!(prompt, "- Memory RSS: {rss}");
    fact(
        &mut prompt,
        "Memory VMS",
        Attribute::Memory,
        format_bytes(process.memory_vms),
    );
    fact(
        &mut prompt,
        "Open files",
        Attribute::OpenFiles,
        process.open_files.to_string(),
    );
    fact(
        &mut prompt,
        "Network connections",
        Attribute::Connections,
        process.connections.to_string(),
    );
    fact(
        &mut prompt,
        "Child processes",
        Attribute::Children,
        process.children.to_string(),
    );

    prompt.push_str("\nHOST\n");
    let _ = writeln!(prompt, "- CPU cores: {}", system.cpu_cores);
    let _ = writeln!(prompt, "- CPU model: {}", system.cpu_model);
    let _ = writeln!(prompt, "- System CPU usage: {:.2}%", system.cpu_percent);
    let _ = writeln!(prompt, "- Total memory: {}", format_bytes(system.memory_total));
    let _ = writeln!(
        prompt,
        "- Used memory: {} ({:.2}%)",
        format_bytes(system.memory_used),
        system.memory_percent
    );
    let _ = writeln!(prompt, "- Free memory: {}", format_bytes(system.memory_free));

    prompt.push_str(
        "\nWHAT TO CHECK\n\
         1. Whether CPU and memory use fit this kind of process (web server, database, \
         system daemon, batch job) and whether exhaustion is near.\n\
         2. Zombie or stopped state, descriptor or connection counts that suggest leaks, \
         and child counts that suggest runaway spawning.\n\
         3. How the process affects host stability, including OOM risk and whether the \
         host needs more capacity.\n\
         4. Preventive measures: resource limits (ulimit, cgroups, systemd), monitoring \
         thresholds, tuning, and capacity planning.\n\
         5. Specific commands or configuration changes where they apply, immediate \
         actions before long-term ones.\n",
    );

    let _ = write!(
        prompt,
        "\nRESPONSE FORMAT\n\
         - One item per line.\n\
         - Start issues that need attention with \"{WARNING_PREFIX}\".\n\
         - Start preventive measures and best practices with \"{RECOMMEND_PREFIX}\".\n\
         - If nothing is wrong, reply only with \"{HEALTHY_PREFIX} No issues detected\".\n\
         - At most {MAX_ITEMS} items in total, most critical first, warnings before \
         recommendations.\n\
         - No other text.\n\n\
         EXAMPLE\n\
         {WARNING_PREFIX} High CPU usage (85%) may indicate a hot loop or a performance bottleneck\n\
         {RECOMMEND_PREFIX} Cap CPU with systemd (CPUQuota=80%) to protect the rest of the host\n\
         {WARNING_PREFIX} 1500 open files - possible file descriptor leak\n\
         {RECOMMEND_PREFIX} Inspect with 'lsof -p {pid}' and raise 'ulimit -n' only after fixing the leak\n\n\
         YOUR ANALYSIS:\n",
        pid = process.pid,
    );

    prompt
}

/// Parse a backend reply line by line. A `HEALTHY:` line anywhere wins over
/// everything else; lines without a known prefix are ignored.
pub fn parse_response(reply: &str) -> ParsedResponse {
    let mut findings = Vec::new();
    for line in reply.lines().map(str::trim) {
        if line.starts_with(HEALTHY_PREFIX) {
            return ParsedResponse::Healthy;
        }
        if let Some(text) = line.strip_prefix(WARNING_PREFIX) {
            push_nonempty(&mut findings, FindingKind::Warning, text);
        } else if let Some(text) = line.strip_prefix(RECOMMEND_PREFIX) {
            push_nonempty(&mut findings, FindingKind::Recommendation, text);
        }
    }
    if findings.is_empty() {
        ParsedResponse::Unrecognized
    } else {
        ParsedResponse::Findings(findings)
    }
}

fn push_nonempty(findings: &mut Vec<Finding>, kind: FindingKind, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        findings.push(Finding {
            kind,
            message: text.to_string(),
        });
    }
}
