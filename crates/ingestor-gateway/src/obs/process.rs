//! Best-effort process gauges read from `/proc/self`.
//!
//! Anything that cannot be read (non-Linux, sandboxing) is simply omitted.

use std::fs;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use ingestor_core::metrics::render_gauge;

pub struct ProcessCollector {
    start_unix_secs: f64,
    started: Instant,
}

impl ProcessCollector {
    pub fn new() -> Self {
        let start_unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        Self {
            start_unix_secs,
            started: Instant::now(),
        }
    }

    pub fn render(&self, out: &mut String) {
        render_gauge(
            "process_start_time_seconds",
            "Start time of the process since unix epoch in seconds.",
            self.start_unix_secs.floor(),
            out,
        );
        render_gauge(
            "process_uptime_seconds",
            "Seconds since the process started.",
            self.started.elapsed().as_secs_f64(),
            out,
        );

        if let Ok(status) = fs::read_to_string("/proc/self/status") {
            if let Some(kb) = status_field(&status, "VmRSS") {
                render_gauge(
                    "process_resident_memory_bytes",
                    "Resident memory size in bytes.",
                    (kb * 1024) as f64,
                    out,
                );
            }
            if let Some(kb) = status_field(&status, "VmSize") {
                render_gauge(
                    "process_virtual_memory_bytes",
                    "Virtual memory size in bytes.",
                    (kb * 1024) as f64,
                    out,
                );
            }
            if let Some(n) = status_field(&status, "Threads") {
                render_gauge("process_threads", "Number of OS threads in the process.", n as f64, out);
            }
        }

        if let Ok(dir) = fs::read_dir("/proc/self/fd") {
            let open = dir.filter_map(|e| e.ok()).count();
            render_gauge(
                "process_open_fds",
                "Number of open file descriptors.",
                open as f64,
                out,
            );
        }

        if let Some(max) = fs::read_to_string("/proc/self/limits")
            .ok()
            .as_deref()
            .and_then(max_open_files)
        {
            render_gauge(
                "process_max_fds",
                "Maximum number of open file descriptors.",
                max as f64,
                out,
            );
        }
    }
}

impl Default for ProcessCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Numeric value of a `/proc/<pid>/status` field (`VmRSS:\t  1234 kB` -> 1234).
pub fn status_field(status: &str, key: &str) -> Option<u64> {
    status.lines().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        if k.trim() != key {
            return None;
        }
        v.split_whitespace().next()?.parse().ok()
    })
}

/// Soft limit from the `Max open files` row of `/proc/<pid>/limits`.
pub fn max_open_files(limits: &str) -> Option<u64> {
    let line = limits.lines().find(|l| l.starts_with("Max open files"))?;
    line["Max open files".len()..]
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}
