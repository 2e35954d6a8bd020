use crate::network::interface::CommunicationMode;
use crate::network::{HostAddress, World};
use crate::sim::event::Event;
use fastrand::Rng;
use std::collections::BTreeMap;

/// Interval the generators wait before retrying when no candidate pair is
/// currently available.
const POLLING_INTERVAL: f64 = 1.0;

/// Bound on rejection-sampling draws per call; past it the generator falls
/// back to the polling path instead of spinning.
const MAX_DRAWS: u32 = 128;

/// Workload producer. Each call returns the next externally scheduled event;
/// a generator signals exhaustion with a `SimEnd` at infinity, which lets
/// in-flight messages propagate until the scenario's end time.
pub enum Generator {
    ActiveHost(ActiveHostGenerator),
    StaticPairs(StaticPairGenerator),
}

impl Generator {
    pub fn next_event(&mut self, world: &World) -> (f64, Event) {
        match self {
            Generator::ActiveHost(g) => g.next_event(world),
            Generator::StaticPairs(g) => g.next_event(world),
        }
    }
}

/// Draws host pairs uniformly at call time, capping the number of messages
/// per distance bin.
pub struct ActiveHostGenerator {
    rng: Rng,
    message_size: u64,
    interval: f64,
    bin_width: u32,
    count_per_bin: u32,
    /// Messages emitted so far per bin index ⌊round(d)/W⌋.
    bins: Vec<u32>,
    from_range: (u32, u32),
    to_range: (u32, u32),
    next_time: f64,
}

impl ActiveHostGenerator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rng: Rng,
        message_size: u64,
        interval: f64,
        bin_width: u32,
        count_per_bin: u32,
        max_distance: u32,
        from_range: (u32, u32),
        to_range: (u32, u32),
    ) -> Self {
        Self {
            rng,
            message_size,
            interval,
            bin_width,
            count_per_bin,
            bins: vec![0; (max_distance / bin_width) as usize],
            from_range,
            to_range,
            next_time: 0.0,
        }
    }

    fn next_event(&mut self, world: &World) -> (f64, Event) {
        if self.bins.iter().all(|b| *b >= self.count_per_bin) {
            return (f64::INFINITY, Event::SimEnd);
        }

        for _ in 0..MAX_DRAWS {
            let from = HostAddress(self.rng.u32(self.from_range.0..self.from_range.1));
            let to = HostAddress(self.rng.u32(self.to_range.0..self.to_range.1));
            if from == to {
                continue;
            }
            let from_host = world.host(from);
            let to_host = world.host(to);
            if !from_host.is_movement_active() || !to_host.is_movement_active() {
                continue;
            }

            let distance = from_host.location.distance(to_host.location);
            let bin = distance.round() as u32 / self.bin_width;
            let Some(slot) = self.bins.get_mut(bin as usize) else {
                continue;
            };
            if *slot >= self.count_per_bin {
                continue;
            }
            *slot += 1;

            let time = self.next_time;
            self.next_time += self.interval;
            return (
                time,
                Event::MessageCreate {
                    from,
                    to,
                    size: self.message_size,
                    response_size: 0,
                },
            );
        }

        self.next_time += POLLING_INTERVAL;
        (self.next_time, Event::Poll)
    }
}

/// Pre-materializes every eligible ordered host pair on the first call, then
/// draws uniformly from the non-empty buckets until all budgets are spent.
pub struct StaticPairGenerator {
    rng: Rng,
    message_size: u64,
    interval: f64,
    count_per_bucket: u32,
    /// Group pairs into distance bins of this width; without it every pair is
    /// its own bucket.
    bin_width: Option<u32>,
    /// Restrict pairs to the same cluster (intra) or different clusters
    /// (inter).
    mode: Option<CommunicationMode>,
    buckets: Option<Vec<Bucket>>,
    next_time: f64,
}

struct Bucket {
    remaining: u32,
    pairs: Vec<(HostAddress, HostAddress)>,
}

impl StaticPairGenerator {
    pub fn new(
        rng: Rng,
        message_size: u64,
        interval: f64,
        count_per_bucket: u32,
        bin_width: Option<u32>,
        mode: Option<CommunicationMode>,
    ) -> Self {
        Self {
            rng,
            message_size,
            interval,
            count_per_bucket,
            bin_width,
            mode,
            buckets: None,
            next_time: 0.0,
        }
    }

    fn next_event(&mut self, world: &World) -> (f64, Event) {
        if self.buckets.is_none() {
            self.buckets = Some(self.build_buckets(world));
        }
        let buckets = self.buckets.as_mut().expect("buckets just built");

        let non_empty: Vec<usize> = buckets
            .iter()
            .enumerate()
            .filter(|(_, b)| b.remaining > 0)
            .map(|(i, _)| i)
            .collect();
        if non_empty.is_empty() {
            return (f64::INFINITY, Event::SimEnd);
        }

        let bucket = &mut buckets[non_empty[self.rng.usize(..non_empty.len())]];
        let (from, to) = bucket.pairs[self.rng.usize(..bucket.pairs.len())];
        bucket.remaining -= 1;

        let time = self.next_time;
        self.next_time += self.interval;
        (
            time,
            Event::MessageCreate {
                from,
                to,
                size: self.message_size,
                response_size: 0,
            },
        )
    }

    fn build_buckets(&self, world: &World) -> Vec<Bucket> {
        let mut pairs = Vec::new();
        for from in world.addresses() {
            for to in world.addresses() {
                if from == to {
                    continue;
                }
                if !self.pair_allowed(world, from, to) {
                    continue;
                }
                pairs.push((from, to));
            }
        }

        match self.bin_width {
            Some(width) => {
                // Bucket order is bin index; only occupied bins get a bucket.
                let mut binned: BTreeMap<u32, Vec<(HostAddress, HostAddress)>> = BTreeMap::new();
                for (from, to) in pairs {
                    let distance = world
                        .host(from)
                        .location
                        .distance(world.host(to).location);
                    binned
                        .entry(distance.round() as u32 / width)
                        .or_default()
                        .push((from, to));
                }
                binned
                    .into_values()
                    .map(|pairs| Bucket {
                        remaining: self.count_per_bucket,
                        pairs,
                    })
                    .collect()
            }
            None => pairs
                .into_iter()
                .map(|pair| Bucket {
                    remaining: self.count_per_bucket,
                    pairs: vec![pair],
                })
                .collect(),
        }
    }

    fn pair_allowed(&self, world: &World, from: HostAddress, to: HostAddress) -> bool {
        if !world.host(from).is_movement_active() || !world.host(to).is_movement_active() {
            return false;
        }
        match self.mode {
            None => true,
            Some(CommunicationMode::Intra) => {
                matches!(
                    (world.host(from).cluster, world.host(to).cluster),
                    (Some(a), Some(b)) if a == b
                )
            }
            Some(CommunicationMode::Inter) => {
                !matches!(
                    (world.host(from).cluster, world.host(to).cluster),
                    (Some(a), Some(b)) if a == b
                )
            }
        }
    }
}
