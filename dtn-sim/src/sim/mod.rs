pub mod event;
pub mod generator;

pub use event::{Event, EventQueue};
pub use generator::Generator;

use crate::error::ScenarioError;
use crate::network::{host, router, HostAddress, World};
use crate::report::Reporter;
use crate::stats::{SimulationStats, StatsCollector};
use std::io;
use std::path::{Path, PathBuf};

/// The single-threaded simulation loop.
///
/// Simulation time advances monotonically by interleaving two sources:
/// externally scheduled events (message creations from the generator) and a
/// periodic tick that updates every host. Within a tick, hosts run in
/// ascending address order and each sees the same simulation time.
pub struct Simulation {
    pub world: World,
    queue: EventQueue,
    generator: Option<Generator>,
    reporters: Vec<Reporter>,
    update_interval: f64,
    end_time: f64,
    clock: f64,
    cancelled: bool,
    stats: StatsCollector,
}

impl Simulation {
    pub fn new(
        world: World,
        generator: Option<Generator>,
        reporters: Vec<Reporter>,
        update_interval: f64,
        end_time: f64,
    ) -> Self {
        Self {
            world,
            queue: EventQueue::new(),
            generator,
            reporters,
            update_interval,
            end_time,
            clock: 0.0,
            cancelled: false,
            stats: StatsCollector::default(),
        }
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Schedules an external event directly, alongside (or instead of) a
    /// generator's workload.
    pub fn schedule(&mut self, time: f64, event: Event) {
        self.queue.push(time, event);
    }

    pub fn reporters(&self) -> &[Reporter] {
        &self.reporters
    }

    /// Writes every configured report to `dir`, named after the scenario.
    pub fn write_reports(&self, dir: &Path, scenario_name: &str) -> io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        self.reporters
            .iter()
            .map(|r| r.write_to(dir, scenario_name))
            .collect()
    }

    /// Runs the scenario to its end time (or until cancelled by a SimEnd
    /// event) and returns the run summary.
    pub fn run(&mut self) -> Result<SimulationStats, ScenarioError> {
        self.pull_generator();

        let mut next_tick = self.update_interval;
        while !self.cancelled {
            match self.queue.peek_time() {
                // The event horizon comes first: dispatch events up to and
                // including the next tick boundary before ticking
                Some(time) if time <= next_tick => {
                    if time > self.end_time {
                        break;
                    }
                    let scheduled = self.queue.pop().expect("peeked event vanished");
                    self.clock = scheduled.time;
                    self.dispatch(scheduled.event)?;
                    if scheduled.from_generator && !self.cancelled {
                        self.pull_generator();
                    }
                }
                _ => {
                    if next_tick > self.end_time {
                        break;
                    }
                    self.clock = next_tick;
                    self.tick()?;
                    next_tick += self.update_interval;
                }
            }
        }

        self.drain_records();
        Ok(self.stats.finish(self.clock))
    }

    fn dispatch(&mut self, event: Event) -> Result<(), ScenarioError> {
        match event {
            Event::MessageCreate {
                from,
                to,
                size,
                response_size,
            } => {
                router::create_message(&mut self.world, from, to, size, response_size, self.clock)?;
            }
            Event::Poll => {}
            Event::SimEnd => {
                self.cancelled = true;
            }
        }
        self.drain_records();
        Ok(())
    }

    /// Keeps exactly one pending generator event in the queue.
    fn pull_generator(&mut self) {
        if let Some(generator) = self.generator.as_mut() {
            let (time, event) = generator.next_event(&self.world);
            self.queue.push_generated(time, event);
        }
    }

    fn tick(&mut self) -> Result<(), ScenarioError> {
        let host_count = self.world.hosts.len() as u32;
        for address in 0..host_count {
            host::update(&mut self.world, HostAddress(address), self.clock)?;
        }
        self.world.validate_connections()?;
        self.drain_records();
        for reporter in &mut self.reporters {
            reporter.on_tick(&self.world, self.clock);
        }
        Ok(())
    }

    fn drain_records(&mut self) {
        for record in std::mem::take(&mut self.world.records) {
            self.stats.observe(&record);
            for reporter in &mut self.reporters {
                reporter.on_record(&record);
            }
        }
    }
}
