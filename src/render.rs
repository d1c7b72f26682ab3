//! MarkdownV2 message building for the operator channel.
//!
//! One block-builder per metric kind; the orchestrator joins blocks from
//! several servers with a blank line for ALL-target reports. Interpolated
//! values are escaped for MarkdownV2; values inside code spans are left
//! as-is (code entities do not interpret markdown).

use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::{BackupReport, CpuRamSample, ProcessEntry, ProcessSource};
use crate::analyzers::cpu_ram::Status;

/// Escape every character MarkdownV2 treats as markup.
pub fn escape_markdown(text: &str) -> String {
    static SPECIALS: OnceLock<Regex> = OnceLock::new();
    let specials = SPECIALS
        .get_or_init(|| Regex::new(r"([_*\[\]()~`>#+=|{}.!-])").expect("valid escape pattern"));
    specials.replace_all(text, r"\$1").into_owned()
}

pub fn humanize_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{value:.1} {}", UNITS[unit])
}

pub fn humanize_seconds(secs: u64) -> String {
    if secs < 60 {
        return format!("{secs} s");
    }

    let (minutes, rest) = (secs / 60, secs % 60);
    if rest == 0 {
        format!("{minutes} min")
    } else {
        format!("{minutes} min {rest} s")
    }
}

pub fn status_label(status: Status) -> &'static str {
    match status {
        Status::Normal => "✅ *NORMAL* ✅",
        Status::Warning => "⚠️ *WARNING* ⚠️",
        Status::Alarm => "🚨 *OVERLOAD* 🚨",
    }
}

pub fn cpu_ram_block(name: &str, status: Status, sample: &CpuRamSample) -> String {
    let name = escape_markdown(name);
    let label = status_label(status);

    let load = sample
        .load
        .as_ref()
        .map(|load| {
            format!(
                "`{:.2}`, `{:.2}`, `{:.2}`",
                load.one, load.five, load.fifteen
            )
        })
        .unwrap_or_else(|| "`n/a`".to_string());

    format!(
        "*{name}*\n{label}\n\n🖥 *CPU*: `{:.1} %`\n💻 *RAM*: `{:.1} %`\n📈 *Load Avg*: {load}",
        sample.cpu, sample.ram
    )
}

pub fn disk_block(name: &str, alerted: bool, usage_percent: f64, total_gb: f64) -> String {
    let name = escape_markdown(name);
    let state = if alerted {
        "⚠️ *OVER THRESHOLD* ⚠️"
    } else {
        "✅ *NORMAL* ✅"
    };

    let used_gb = total_gb * usage_percent / 100.0;

    format!(
        "*{name}*\n{state}\n\n💽 Disk: `{used_gb:.1}/{total_gb} GB` at `{usage_percent:.1} %`"
    )
}

fn source_lines(entries: &[ProcessEntry], source: ProcessSource) -> String {
    let names: Vec<String> = entries
        .iter()
        .filter(|entry| entry.source == source)
        .map(|entry| format!("  \\- `{}`", entry.name))
        .collect();

    if names.is_empty() {
        format!("• {source}: ✅ ok")
    } else {
        format!("• {source}:\n{}", names.join("\n"))
    }
}

pub fn processes_block(name: &str, failed: &[ProcessEntry], miners: &[ProcessEntry]) -> String {
    let name = escape_markdown(name);

    if failed.is_empty() && miners.is_empty() {
        return format!("*{name}*\n✅ No crashed services\n⛏️ No miners detected");
    }

    let mut block = vec![format!("*{name}*\n")];

    if failed.is_empty() {
        block.push("✅ No crashed services".to_string());
    } else {
        block.push("❌ *Services with errors:*".to_string());
        block.push(source_lines(failed, ProcessSource::Sct));
        block.push(source_lines(failed, ProcessSource::Pm2));
    }

    if miners.is_empty() {
        block.push("⛏️ No miners detected".to_string());
    } else {
        block.push("⛏️ *⚠️ATTENTION⚠️: miners detected\\!*".to_string());
        block.push(source_lines(miners, ProcessSource::Sct));
        block.push(source_lines(miners, ProcessSource::Pm2));
    }

    block.join("\n")
}

pub fn updates_block(name: &str, packages: &[String]) -> String {
    let name = escape_markdown(name);

    if packages.is_empty() {
        return format!("*{name}*\n✅ No pending updates");
    }

    let lines: Vec<String> = packages.iter().map(|pkg| format!("• `{pkg}`")).collect();
    format!("*{name}*\n📦 Pending updates:\n{}", lines.join("\n"))
}

const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn backup_timing_line(report: &BackupReport) -> Option<String> {
    let started = report.started_at.as_deref()?.trim();
    let finished = report.finished_at.as_deref()?.trim();
    if started.is_empty() || finished.is_empty() {
        return None;
    }

    let parsed = NaiveDateTime::parse_from_str(started, BACKUP_TIMESTAMP_FORMAT).and_then(|t1| {
        NaiveDateTime::parse_from_str(finished, BACKUP_TIMESTAMP_FORMAT).map(|t2| (t1, t2))
    });

    Some(match parsed {
        Ok((t1, t2)) => {
            let duration = (t2 - t1).num_seconds().max(0) as u64;
            format!(
                "🕒 Started `{}`, took `{}`",
                t1.format("%d.%m.%Y %H:%M:%S"),
                humanize_seconds(duration)
            )
        }
        Err(_) => format!("🕒 Started `{started}`, finished `{finished}`"),
    })
}

pub fn backup_block(name: &str, report: &BackupReport) -> String {
    let name = escape_markdown(name);

    let status_line = if report.succeeded() {
        "✅ *Backup completed successfully*"
    } else {
        "❌ *Backup failed*"
    };

    let mut lines = vec![format!("*{name}*\n"), status_line.to_string()];

    if let Some(timing) = backup_timing_line(report) {
        lines.push(timing);
    }

    if report.parts.is_empty() {
        lines.push("❌ No data about backup parts".to_string());
    } else {
        for (key, part) in &report.parts {
            let label = if key.eq_ignore_ascii_case("database") {
                "Database".to_string()
            } else {
                format!("Folder {}", escape_markdown(key))
            };
            let mark = if part.ok { "✅" } else { "❌" };
            let size = humanize_size(part.size_bytes.unwrap_or(0));
            lines.push(format!("{mark} {label}: `{size}`"));
        }
    }

    let upload_ok = report
        .upload
        .as_deref()
        .is_some_and(|upload| upload.eq_ignore_ascii_case("ok"));
    lines.push(if upload_ok {
        "✅☁️ Cloud upload succeeded".to_string()
    } else {
        "❌☁️ Cloud upload failed".to_string()
    });

    lines.join("\n")
}

pub fn site_problem(url: &str) -> String {
    format!("🌐 *Site problem:*\n\n{}", escape_markdown(url))
}

pub fn site_recovered(url: &str) -> String {
    format!("🌐 *Site recovered:*\n\n{}", escape_markdown(url))
}

pub fn sites_snapshot(results: &[(String, bool)]) -> String {
    let lines: Vec<String> = results
        .iter()
        .map(|(url, is_up)| {
            let mark = if *is_up { "✅" } else { "❌" };
            format!("{mark} {}", escape_markdown(url))
        })
        .collect();

    format!("🌐 *Site check results:*\n\n{}", lines.join("\n"))
}
