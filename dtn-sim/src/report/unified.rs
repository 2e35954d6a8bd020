use crate::report::{fmt_time, ReportRecord};
use std::fmt::Write;

/// Per-message lifecycle log, one line per event:
///
/// ```text
/// CREATE <time> <id> <from> <to> <size>
/// RELAY <time> <id> <sender> <receiver>
/// DELIVER <time> <id> <from> <to> <hops> <latency> <path>
/// DROP <time> <id> <host>
/// ```
///
/// where `<path>` is the hop path as `a>b>c`.
#[derive(Default)]
pub struct UnifiedReport {
    buffer: String,
}

impl UnifiedReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_record(&mut self, record: &ReportRecord) {
        match record {
            ReportRecord::Created {
                time,
                id,
                from,
                to,
                size,
            } => {
                _ = writeln!(
                    self.buffer,
                    "CREATE {} {id} {from} {to} {size}",
                    fmt_time(*time)
                );
            }
            ReportRecord::Relayed { time, id, from, to } => {
                _ = writeln!(self.buffer, "RELAY {} {id} {from} {to}", fmt_time(*time));
            }
            ReportRecord::Delivered {
                time,
                id,
                from,
                to,
                hops,
                latency,
                path,
                ..
            } => {
                let path: Vec<String> = path.iter().map(|a| a.to_string()).collect();
                _ = writeln!(
                    self.buffer,
                    "DELIVER {} {id} {from} {to} {hops} {} {}",
                    fmt_time(*time),
                    fmt_time(*latency),
                    path.join(">")
                );
            }
            ReportRecord::Dropped { time, id, host } => {
                _ = writeln!(self.buffer, "DROP {} {id} {host}", fmt_time(*time));
            }
        }
    }

    pub fn output(&self) -> &str {
        &self.buffer
    }
}
