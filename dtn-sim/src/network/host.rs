use crate::error::ScenarioError;
use crate::geometry::Coord;
use crate::network::buffer::MessageBuffer;
use crate::network::{interface, router, HostAddress, MessageId, RadioInterface, Router};
use std::collections::BTreeSet;

/// A simulated node: a fixed location, one radio, a router and a bounded
/// message buffer. Hosts are passive aggregates; all behavior lives in the
/// interface and router tick functions.
pub struct Host {
    pub address: HostAddress,
    pub location: Coord,
    /// Cluster the host was placed in, when the scenario clusters hosts.
    pub cluster: Option<u32>,
    pub radio_active: bool,
    pub interface: RadioInterface,
    pub router: Router,
    pub buffer: MessageBuffer,
    /// Messages this host was the destination of and has received.
    pub delivered: BTreeSet<MessageId>,
    /// Messages currently being received, to refuse parallel transfers of
    /// the same message.
    pub incoming: BTreeSet<MessageId>,
    /// Messages currently being sent, so the same message is never started
    /// on two of this host's connections at once.
    pub outgoing: BTreeSet<MessageId>,
}

impl Host {
    pub fn new(
        address: HostAddress,
        location: Coord,
        cluster: Option<u32>,
        interface: RadioInterface,
        router: Router,
        buffer_capacity: u64,
    ) -> Self {
        Self {
            address,
            location,
            cluster,
            radio_active: true,
            interface,
            router,
            buffer: MessageBuffer::new(address, buffer_capacity),
            delivered: BTreeSet::new(),
            incoming: BTreeSet::new(),
            outgoing: BTreeSet::new(),
        }
    }

    /// Stationary hosts scan for neighbours continuously.
    pub fn is_scanning(&self) -> bool {
        true
    }

    /// Whether the host takes part in workload generation.
    pub fn is_movement_active(&self) -> bool {
        true
    }
}

/// One tick of a host. The interface runs first so the router sees an
/// up-to-date connection set.
pub(crate) fn update(
    world: &mut crate::network::World,
    address: HostAddress,
    now: f64,
) -> Result<(), ScenarioError> {
    interface::update(world, address, now)?;
    router::update(world, address, now)
}
