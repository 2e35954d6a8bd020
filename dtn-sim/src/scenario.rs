use crate::error::ConfigError;
use crate::map::{placement, ClusterCell, Room};
use crate::network::interface::CommunicationMode;
use crate::network::optimizer::ConnectivityGrid;
use crate::network::{Host, HostAddress, RadioInterface, Router, World};
use crate::report::{AdjacencyMatrixReport, Reporter, UnifiedReport};
use crate::rng::RngService;
use crate::settings::Settings;
use crate::sim::generator::{ActiveHostGenerator, Generator, StaticPairGenerator};
use crate::sim::Simulation;
use std::path::PathBuf;

/// Buffer capacity used when the scenario does not configure one.
const DEFAULT_BUFFER_BYTES: u64 = 2_000_000;
const DEFAULT_EVENT_INTERVAL: f64 = 1.0;

/// A fully assembled run: settings resolved, rooms loaded, hosts placed,
/// workload and reporters wired up. All registries live inside the value, so
/// "resetting" between runs is just building a new scenario.
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    pub report_dir: Option<PathBuf>,
    pub simulation: Simulation,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("seed", &self.seed)
            .field("report_dir", &self.report_dir)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    pub fn build(settings: &Settings) -> Result<Scenario, ConfigError> {
        let name = settings.require("Scenario.name")?.to_string();
        let update_interval = settings.require_f64("Scenario.updateInterval")?;
        let end_time = settings.require_f64("Scenario.endTime")?;
        let seed = settings.require_u64("MovementModel.rngSeed")?;
        let rng = RngService::new(seed);

        let rooms = build_rooms(settings)?;

        let host_count = settings.require_u32("Group1.nrofHosts")?;
        let buffer_size = settings
            .opt_u64("Group1.bufferSize")?
            .unwrap_or(DEFAULT_BUFFER_BYTES);
        let router = build_router(settings)?;

        let interface = settings.opt_u32("Group1.nrofInterfaces")?.unwrap_or(1);
        if interface != 1 {
            return Err(ConfigError::InterfaceCount(interface));
        }
        let prefix = settings.require("Group1.interface1")?.to_string();
        let transmit_range = settings.require_f64(&format!("{prefix}.transmitRange"))?;
        let max_parallel = settings
            .opt_u32(&format!("{prefix}.maximumParallelConnections"))?
            .unwrap_or(u32::MAX) as usize;
        let churn_rate = settings
            .opt_f64(&format!("{prefix}.churnRate"))?
            .unwrap_or(0.0);
        let mode = parse_mode(settings, &format!("{prefix}.communicationMode"))?;

        let hosts = place_hosts(
            settings,
            &rooms,
            &rng,
            host_count,
            buffer_size,
            router,
            transmit_range,
            max_parallel,
            churn_rate,
            mode,
        )?;

        let locations: Vec<_> = hosts.iter().map(|h| (h.address, h.location)).collect();
        let grid = ConnectivityGrid::build(&locations, transmit_range.max(1.0));
        let world = World::new(rooms, hosts, grid);

        let generator = build_generator(settings, host_count, &rng)?;
        let (reporters, report_dir) = build_reporters(settings, update_interval)?;

        Ok(Scenario {
            name,
            seed,
            report_dir,
            simulation: Simulation::new(world, generator, reporters, update_interval, end_time),
        })
    }
}

/// Rooms come from WKT files when configured; otherwise the world rectangle
/// is the single room.
fn build_rooms(settings: &Settings) -> Result<Vec<Room>, ConfigError> {
    let count = settings.opt_u32("Room.nrofRooms")?.unwrap_or(0);
    if count == 0 {
        let (width, height) = world_size(settings)?;
        return Ok(vec![Room::rectangle(width, height)?]);
    }

    (1..=count)
        .map(|i| {
            let path = settings.require(&format!("Room.roomFile{i}"))?;
            Room::from_wkt_file(path.as_ref())
        })
        .collect()
}

fn world_size(settings: &Settings) -> Result<(f64, f64), ConfigError> {
    let key = "MovementModel.worldSize";
    let raw = settings.require(key)?;
    let invalid = || ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        expected: "a `width, height` pair in meters",
    };
    let (width, height) = raw.split_once(',').ok_or_else(invalid)?;
    Ok((
        width.trim().parse().map_err(|_| invalid())?,
        height.trim().parse().map_err(|_| invalid())?,
    ))
}

fn build_router(settings: &Settings) -> Result<Router, ConfigError> {
    match settings.require("Group1.router")? {
        "EpidemicRouter" => Ok(Router::Epidemic {
            evict_delivered: settings
                .opt_bool("EpidemicRouter.evictDelivered")?
                .unwrap_or(false),
        }),
        "SprayAndWaitRouter" => Ok(Router::SprayAndWait {
            initial_copies: settings
                .opt_u32("SprayAndWaitRouter.nrofCopies")?
                .unwrap_or(6),
        }),
        other => Err(ConfigError::UnknownClass {
            kind: "router",
            name: other.to_string(),
        }),
    }
}

fn parse_mode(settings: &Settings, key: &str) -> Result<Option<CommunicationMode>, ConfigError> {
    match settings.opt_u32(key)? {
        None => Ok(None),
        Some(0) => Ok(Some(CommunicationMode::Intra)),
        Some(1) => Ok(Some(CommunicationMode::Inter)),
        Some(other) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: other.to_string(),
            expected: "0 (intra-cluster) or 1 (inter-cluster)",
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn place_hosts(
    settings: &Settings,
    rooms: &[Room],
    rng: &RngService,
    host_count: u32,
    buffer_size: u64,
    router: Router,
    transmit_range: f64,
    max_parallel: usize,
    churn_rate: f64,
    mode: Option<CommunicationMode>,
) -> Result<Vec<Host>, ConfigError> {
    let mut movement_rng = rng.stream("movement");
    let make_host = |address: u32, location, cluster| {
        Host::new(
            HostAddress(address),
            location,
            cluster,
            RadioInterface::new(
                transmit_range,
                max_parallel,
                churn_rate,
                mode,
                rng.stream(&format!("churn/{address}")),
            ),
            router,
            buffer_size,
        )
    };

    let mut hosts = Vec::with_capacity(host_count as usize);
    match settings.require("Group1.movementModel")? {
        "RandomStationaryConstrained" => {
            for address in 0..host_count {
                let room = &rooms[movement_rng.usize(..rooms.len())];
                let location = placement::random_location_in_room(room, &mut movement_rng);
                hosts.push(make_host(address, location, None));
            }
        }
        "RandomStationaryCluster" => {
            let cluster_size = settings.require_f64("Group1.clusterSize")?;
            let hosts_per_cluster = settings.require_u32("Group1.hostsPerCluster")?;
            let cluster_count = settings.require_u32("Group1.nrofClusters")?;
            let offset_x = settings.opt_f64("Group1.offsetX")?.unwrap_or(0.0);
            let offset_y = settings.opt_f64("Group1.offsetY")?.unwrap_or(0.0);

            if cluster_count * hosts_per_cluster != host_count {
                return Err(ConfigError::ClusterArithmetic {
                    clusters: cluster_count,
                    hosts_per_cluster,
                    hosts: host_count,
                });
            }

            // The cluster grid lives in the first room
            let room = &rooms[0];
            let cells: Vec<ClusterCell> = (0..cluster_count)
                .map(|id| {
                    ClusterCell::place(id, hosts_per_cluster, cluster_size, room, offset_x, offset_y)
                })
                .collect::<Result<_, _>>()?;

            for address in 0..host_count {
                let cluster_id = address / hosts_per_cluster;
                let cell = &cells[cluster_id as usize];
                let location = placement::random_location_in_cluster(room, cell, &mut movement_rng);
                hosts.push(make_host(address, location, Some(cluster_id)));
            }
        }
        other => {
            return Err(ConfigError::UnknownClass {
                kind: "movement model",
                name: other.to_string(),
            })
        }
    }
    Ok(hosts)
}

fn build_generator(
    settings: &Settings,
    host_count: u32,
    rng: &RngService,
) -> Result<Option<Generator>, ConfigError> {
    let Some(class) = settings.get("Events1.class") else {
        return Ok(None);
    };
    let class = class.to_string();

    let size = settings.require_u64("Events1.size")?;
    let interval = settings
        .opt_f64("Events1.interval")?
        .unwrap_or(DEFAULT_EVENT_INTERVAL);
    let count = settings.require_u32("Events1.count")?;
    let events_rng = rng.stream("events");

    let generator = match class.as_str() {
        "ActiveHostMessageGenerator" => {
            let bin_size = require_bin_size(settings)?;
            let max_distance = settings.require_u32("Events1.maxDistance")?;
            let from_range = host_range(settings, "Events1.hosts", host_count, (0, host_count))?;
            let to_range = host_range(settings, "Events1.toHosts", host_count, from_range)?;
            Generator::ActiveHost(ActiveHostGenerator::new(
                events_rng,
                size,
                interval,
                bin_size,
                count,
                max_distance,
                from_range,
                to_range,
            ))
        }
        "StaticHostMessageGenerator" => Generator::StaticPairs(StaticPairGenerator::new(
            events_rng,
            size,
            interval,
            count,
            opt_bin_size(settings)?,
            parse_mode(settings, "Events1.mode")?,
        )),
        "ClusterMessageGenerator" => {
            let key = "Events1.mode";
            let Some(mode) = parse_mode(settings, key)? else {
                return Err(ConfigError::MissingKey(key.to_string()));
            };
            Generator::StaticPairs(StaticPairGenerator::new(
                events_rng,
                size,
                interval,
                count,
                opt_bin_size(settings)?,
                Some(mode),
            ))
        }
        other => {
            return Err(ConfigError::UnknownClass {
                kind: "generator",
                name: other.to_string(),
            })
        }
    };
    Ok(Some(generator))
}

fn require_bin_size(settings: &Settings) -> Result<u32, ConfigError> {
    opt_bin_size(settings)?.ok_or_else(|| ConfigError::MissingKey("Events1.binSize".to_string()))
}

fn opt_bin_size(settings: &Settings) -> Result<Option<u32>, ConfigError> {
    match settings.opt_u32("Events1.binSize")? {
        Some(0) => Err(ConfigError::InvalidValue {
            key: "Events1.binSize".to_string(),
            value: "0".to_string(),
            expected: "a positive bin width in meters",
        }),
        other => Ok(other),
    }
}

fn host_range(
    settings: &Settings,
    key: &str,
    host_count: u32,
    default: (u32, u32),
) -> Result<(u32, u32), ConfigError> {
    let (start, end) = if settings.contains(key) {
        settings.require_range(key)?
    } else {
        default
    };
    if start >= end || end > host_count {
        return Err(ConfigError::BadHostRange {
            start,
            end,
            hosts: host_count,
        });
    }
    Ok((start, end))
}

fn build_reporters(
    settings: &Settings,
    update_interval: f64,
) -> Result<(Vec<Reporter>, Option<PathBuf>), ConfigError> {
    let count = settings.opt_u32("Report.nrofReports")?.unwrap_or(0);
    if count == 0 {
        return Ok((Vec::new(), None));
    }

    let report_dir = PathBuf::from(settings.require("Report.reportDir")?);
    let granularity = settings
        .opt_f64("Report.granularity")?
        .unwrap_or(update_interval);

    let reporters = (1..=count)
        .map(|i| {
            let key = format!("Report.report{i}");
            match settings.require(&key)? {
                "UnifiedReport" => Ok(Reporter::Unified(UnifiedReport::new())),
                "AdjacencyMatrixReport" => Ok(Reporter::Adjacency(AdjacencyMatrixReport::new(
                    granularity,
                ))),
                other => Err(ConfigError::UnknownClass {
                    kind: "report",
                    name: other.to_string(),
                }),
            }
        })
        .collect::<Result<_, _>>()?;

    Ok((reporters, Some(report_dir)))
}
