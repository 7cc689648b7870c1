//! Resident and virtual memory of this process, for the start/end of run log lines.

use log::info;

#[derive(Debug, Clone, Copy)]
pub struct MemoryStats {
    pub rss_mb: f64,
    pub virtual_mb: f64,
    pub percent_of_system: Option<f64>,
}

#[cfg(target_os = "linux")]
pub fn current() -> Option<MemoryStats> {
    use std::fs::read_to_string;

    fn kb_field(contents: &str, key: &str) -> Option<f64> {
        contents
            .lines()
            .find(|line| line.starts_with(key))
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|kb| kb.parse::<f64>().ok())
    }

    let status = read_to_string("/proc/self/status").ok()?;
    let rss_kb = kb_field(&status, "VmRSS:")?;
    let virtual_kb = kb_field(&status, "VmSize:")?;
    let percent_of_system = read_to_string("/proc/meminfo")
        .ok()
        .and_then(|meminfo| kb_field(&meminfo, "MemTotal:"))
        .filter(|total_kb| *total_kb > 0.0)
        .map(|total_kb| rss_kb / total_kb * 100.0);

    Some(MemoryStats {
        rss_mb: rss_kb / 1024.0,
        virtual_mb: virtual_kb / 1024.0,
        percent_of_system,
    })
}

#[cfg(target_os = "macos")]
pub fn current() -> Option<MemoryStats> {
    use std::process::Command;

    fn ps_kb(column: &str) -> Option<f64> {
        let pid = std::process::id().to_string();
        let output = Command::new("ps")
            .args(["-o", column, "-p", &pid])
            .output()
            .ok()?;
        String::from_utf8_lossy(&output.stdout).trim().parse().ok()
    }

    let rss_kb = ps_kb("rss=")?;
    let virtual_kb = ps_kb("vsz=")?;
    let percent_of_system = Command::new("sysctl")
        .args(["-n", "hw.memsize"])
        .output()
        .ok()
        .and_then(|output| String::from_utf8_lossy(&output.stdout).trim().parse::<f64>().ok())
        .filter(|total_bytes| *total_bytes > 0.0)
        .map(|total_bytes| rss_kb * 1024.0 / total_bytes * 100.0);

    Some(MemoryStats {
        rss_mb: rss_kb / 1024.0,
        virtual_mb: virtual_kb / 1024.0,
        percent_of_system,
    })
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn current() -> Option<MemoryStats> {
    None
}

pub fn log_memory_usage(note: &str) {
    match current() {
        Some(stats) => {
            let percent = stats
                .percent_of_system
                .map_or_else(|| "N/A".to_string(), |p| format!("{:.1}%", p));
            info!(
                "Memory usage ({}): {:.1} MB physical (RSS), {:.1} MB virtual, {} of system memory",
                note, stats.rss_mb, stats.virtual_mb, percent
            );
        }
        None => info!(
            "Memory usage tracking not available on this platform ({})",
            std::env::consts::OS
        ),
    }
}
