use crate::report::ReportRecord;
use serde::Serialize;
use std::fmt;

/// Accumulates message lifecycle records into the end-of-run summary.
#[derive(Default)]
pub struct StatsCollector {
    created: u64,
    relayed: u64,
    delivered: u64,
    dropped: u64,
    latencies: Vec<f64>,
    hop_counts: Vec<u32>,
}

impl StatsCollector {
    pub fn observe(&mut self, record: &ReportRecord) {
        match record {
            ReportRecord::Created { .. } => self.created += 1,
            ReportRecord::Relayed { .. } => self.relayed += 1,
            ReportRecord::Delivered { hops, latency, .. } => {
                self.delivered += 1;
                self.latencies.push(*latency);
                self.hop_counts.push(*hops);
            }
            ReportRecord::Dropped { .. } => self.dropped += 1,
        }
    }

    pub fn finish(&self, sim_time: f64) -> SimulationStats {
        let mut latencies = self.latencies.clone();
        latencies.sort_by(f64::total_cmp);

        SimulationStats {
            sim_time,
            created: self.created,
            relayed: self.relayed,
            delivered: self.delivered,
            dropped: self.dropped,
            delivery_prob: if self.created > 0 {
                self.delivered as f64 / self.created as f64
            } else {
                0.0
            },
            overhead_ratio: (self.delivered > 0)
                .then(|| (self.relayed - self.delivered) as f64 / self.delivered as f64),
            latency_avg: (!latencies.is_empty())
                .then(|| latencies.iter().sum::<f64>() / latencies.len() as f64),
            latency_med: (!latencies.is_empty()).then(|| latencies[latencies.len() / 2]),
            hopcount_avg: (!self.hop_counts.is_empty()).then(|| {
                self.hop_counts.iter().map(|&h| h as f64).sum::<f64>()
                    / self.hop_counts.len() as f64
            }),
        }
    }
}

/// Summary of one run, printed by the driver and optionally serialized to
/// JSON.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationStats {
    pub sim_time: f64,
    pub created: u64,
    pub relayed: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub delivery_prob: f64,
    /// (relayed − delivered) / delivered; how many transfers each delivery
    /// cost.
    pub overhead_ratio: Option<f64>,
    pub latency_avg: Option<f64>,
    pub latency_med: Option<f64>,
    pub hopcount_avg: Option<f64>,
}

impl fmt::Display for SimulationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "* Simulated time: {:.2}s", self.sim_time)?;
        writeln!(f, "* Messages created: {}", self.created)?;
        writeln!(f, "* Messages relayed: {}", self.relayed)?;
        writeln!(f, "* Messages dropped: {}", self.dropped)?;
        writeln!(
            f,
            "* Messages delivered: {} ({:.2}% of created)",
            self.delivered,
            self.delivery_prob * 100.0
        )?;
        if let Some(overhead) = self.overhead_ratio {
            writeln!(f, "* Overhead ratio: {overhead:.2}")?;
        }
        if let (Some(avg), Some(med)) = (self.latency_avg, self.latency_med) {
            writeln!(f, "* Latency: {avg:.2}s avg, {med:.2}s median")?;
        }
        if let Some(hops) = self.hopcount_avg {
            writeln!(f, "* Hop count: {hops:.2} avg")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{HostAddress, MessageId};

    #[test]
    fn summary_counts_and_ratios() {
        let mut collector = StatsCollector::default();
        for id in 0..4 {
            collector.observe(&ReportRecord::Created {
                time: 0.0,
                id: MessageId(id),
                from: HostAddress(0),
                to: HostAddress(1),
                size: 100,
            });
        }
        for (id, latency, hops) in [(0, 2.0, 1), (1, 4.0, 3)] {
            collector.observe(&ReportRecord::Relayed {
                time: latency,
                id: MessageId(id),
                from: HostAddress(0),
                to: HostAddress(1),
            });
            collector.observe(&ReportRecord::Delivered {
                time: latency,
                id: MessageId(id),
                from: HostAddress(0),
                to: HostAddress(1),
                size: 100,
                hops,
                latency,
                path: vec![],
            });
        }
        collector.observe(&ReportRecord::Relayed {
            time: 5.0,
            id: MessageId(2),
            from: HostAddress(0),
            to: HostAddress(1),
        });

        let stats = collector.finish(60.0);
        assert_eq!(stats.created, 4);
        assert_eq!(stats.relayed, 3);
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.delivery_prob, 0.5);
        assert_eq!(stats.overhead_ratio, Some(0.5));
        assert_eq!(stats.latency_avg, Some(3.0));
        assert_eq!(stats.hopcount_avg, Some(2.0));
    }

    #[test]
    fn empty_run_has_no_latency_stats() {
        let stats = StatsCollector::default().finish(10.0);
        assert_eq!(stats.delivery_prob, 0.0);
        assert!(stats.latency_avg.is_none());
        assert!(stats.overhead_ratio.is_none());
    }
}
