use crate::error::ScenarioError;
use crate::network::connection::{self, Connection};
use crate::network::{ConnectionId, HostAddress, World};
use fastrand::Rng;
use std::collections::BTreeSet;

/// Channel bandwidth of the modelled radio, Hz.
pub const BANDWIDTH_HZ: f64 = 1_000_000.0;
pub const TX_POWER_DBM: f64 = 0.0;
pub const PATH_LOSS_EXPONENT: f64 = 2.0;
pub const REFERENCE_DISTANCE_M: f64 = 1.0;
/// Empirical path loss at the 1 m reference distance for 2.4 GHz.
pub const PATH_LOSS_AT_REF_DB: f64 = 40.0;
/// Noise floor at 1 MHz bandwidth, dBm.
pub const NOISE_FLOOR_DBM: f64 = -85.0;
/// Cap on the reported link rate, bps.
pub const MAX_BITRATE_BPS: f64 = 1_000_000.0;

/// Restricts which cluster a radio may talk to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommunicationMode {
    /// Only peers in the same cluster.
    Intra,
    /// No cluster restriction.
    Inter,
}

/// A host's short-range radio.
#[derive(Debug)]
pub struct RadioInterface {
    pub transmit_range: f64,
    pub max_parallel: usize,
    /// Per-tick probability that an established connection drops for good.
    pub churn_rate: f64,
    pub mode: Option<CommunicationMode>,
    /// Open connections in creation order.
    pub connections: Vec<ConnectionId>,
    /// Peers lost to churn. Absorbing: a blacklisted peer is never
    /// re-connected.
    pub blacklist: BTreeSet<HostAddress>,
    churn_rng: Rng,
}

impl RadioInterface {
    pub fn new(
        transmit_range: f64,
        max_parallel: usize,
        churn_rate: f64,
        mode: Option<CommunicationMode>,
        churn_rng: Rng,
    ) -> Self {
        Self {
            transmit_range,
            max_parallel,
            churn_rate,
            mode,
            connections: Vec::new(),
            blacklist: BTreeSet::new(),
            churn_rng,
        }
    }

    fn has_connection_capacity(&self) -> bool {
        self.connections.len() < self.max_parallel
    }
}

/// Path loss in dB at the given distance; distances below the reference are
/// clamped up to it.
fn path_loss_db(distance: f64) -> f64 {
    let distance = distance.max(REFERENCE_DISTANCE_M);
    PATH_LOSS_AT_REF_DB
        + 10.0 * PATH_LOSS_EXPONENT * (distance / REFERENCE_DISTANCE_M).log10()
}

fn snr(distance: f64) -> f64 {
    let received_dbm = TX_POWER_DBM - path_loss_db(distance);
    let snr_db = received_dbm - NOISE_FLOOR_DBM;
    10.0_f64.powf(snr_db / 10.0)
}

/// Shannon-capacity bitrate at the given distance, scaled so that capacity at
/// the 1 m reference is exactly [`MAX_BITRATE_BPS`], then clamped to it.
pub fn bitrate_bps(distance: f64) -> f64 {
    let capacity = BANDWIDTH_HZ * (1.0 + snr(distance)).log2();
    let capacity_at_ref = BANDWIDTH_HZ * (1.0 + snr(REFERENCE_DISTANCE_M)).log2();
    let scaled = capacity * (MAX_BITRATE_BPS / capacity_at_ref);
    scaled.min(MAX_BITRATE_BPS)
}

/// The rate one side quotes for a peer at `distance`: 0 outside the transmit
/// range, whole bps otherwise.
pub fn transmit_speed_bps(distance: f64, transmit_range: f64) -> u64 {
    if distance >= transmit_range {
        0
    } else {
        bitrate_bps(distance).floor() as u64
    }
}

/// One tick of a host's radio: tear down connections whose link predicate no
/// longer holds (or that churned away), attempt new connections to nearby
/// candidates, then advance every surviving connection this side initiated.
pub(crate) fn update(
    world: &mut World,
    address: HostAddress,
    now: f64,
) -> Result<(), ScenarioError> {
    let open: Vec<ConnectionId> = world.host(address).interface.connections.clone();
    for id in open {
        let Some(conn) = world.connections.get(&id) else {
            // The peer tore this one down earlier in the tick
            world
                .host_mut(address)
                .interface
                .connections
                .retain(|c| *c != id);
            continue;
        };
        let peer = conn.other_end(address);

        let here = world.host(address).location;
        let there = world.host(peer).location;
        let in_range = here.distance(there) <= world.host(address).interface.transmit_range;
        let radios_up = world.host(address).radio_active && world.host(peer).radio_active;
        let clear = world.line_of_sight_clear(here, there);

        let interface = &mut world.host_mut(address).interface;
        let churned = interface.churn_rate > 0.0
            && interface.churn_rng.f64() < interface.churn_rate;
        if churned {
            interface.blacklist.insert(peer);
        }

        if churned || !in_range || !radios_up || !clear {
            connection::teardown(world, id);
        }
    }

    let here = world.host(address).location;
    for candidate in world.grid.near(here) {
        if candidate != address {
            try_connect(world, address, candidate, now);
        }
    }

    let initiated: Vec<ConnectionId> = world
        .host(address)
        .interface
        .connections
        .iter()
        .copied()
        .filter(|id| {
            world
                .connections
                .get(id)
                .is_some_and(|c| c.initiator() == address)
        })
        .collect();
    for id in initiated {
        connection::update(world, id, now)?;
    }
    Ok(())
}

/// Installs a connection between the two hosts if the full neighbour
/// predicate holds. The line-of-sight test runs last: it is O(rooms × edges)
/// while everything before it is O(1).
fn try_connect(world: &mut World, a: HostAddress, b: HostAddress, now: f64) {
    let host_a = world.host(a);
    let host_b = world.host(b);

    if !host_a.radio_active || !host_b.radio_active {
        return;
    }
    if !host_a.is_scanning() || !host_b.is_scanning() {
        return;
    }

    let distance = host_a.location.distance(host_b.location);
    if distance > host_a.interface.transmit_range || distance > host_b.interface.transmit_range {
        return;
    }

    if !host_a.interface.has_connection_capacity() || !host_b.interface.has_connection_capacity() {
        return;
    }
    if host_a.interface.blacklist.contains(&b) || host_b.interface.blacklist.contains(&a) {
        return;
    }
    if already_connected(world, a, b) {
        return;
    }
    if host_a.interface.mode == Some(CommunicationMode::Intra) {
        match (host_a.cluster, host_b.cluster) {
            (Some(mine), Some(theirs)) if mine == theirs => {}
            _ => return,
        }
    }

    if !world.line_of_sight_clear(host_a.location, host_b.location) {
        return;
    }

    let id = world.next_connection_id();
    world.connections.insert(id, Connection::new(id, a, b, now));
    world.host_mut(a).interface.connections.push(id);
    world.host_mut(b).interface.connections.push(id);
}

fn already_connected(world: &World, a: HostAddress, b: HostAddress) -> bool {
    world
        .host(a)
        .interface
        .connections
        .iter()
        .filter_map(|id| world.connections.get(id))
        .any(|conn| conn.other_end(a) == b)
}
