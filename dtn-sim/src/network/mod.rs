pub mod buffer;
pub mod connection;
pub mod host;
pub mod interface;
pub mod message;
pub mod optimizer;
pub mod router;

pub use connection::Connection;
pub use host::Host;
pub use interface::RadioInterface;
pub use message::{Message, MessageChunk, MessageId};
pub use router::{Admission, Router};

use crate::geometry::Coord;
use crate::map::Room;
use crate::report::ReportRecord;
use optimizer::ConnectivityGrid;
use std::collections::BTreeMap;
use std::fmt;

/// Stable address of a host; doubles as the index into the world's host
/// arena, so the address-to-host mapping is injective by construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostAddress(pub u32);

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The world arena. Hosts, connections and rooms are owned here; everything
/// else refers to them through ids, which keeps the host ↔ interface ↔
/// connection graph acyclic in ownership terms.
///
/// The connection arena is ordered so that whole-world iteration is
/// deterministic; per-interface connection lists preserve creation order.
pub struct World {
    pub rooms: Vec<Room>,
    pub hosts: Vec<Host>,
    pub connections: BTreeMap<ConnectionId, Connection>,
    pub grid: ConnectivityGrid,
    /// Lifecycle records produced since the scheduler last drained them.
    pub records: Vec<ReportRecord>,
    next_connection_id: u64,
    next_message_id: u64,
}

impl World {
    pub fn new(rooms: Vec<Room>, hosts: Vec<Host>, grid: ConnectivityGrid) -> Self {
        Self {
            rooms,
            hosts,
            connections: BTreeMap::new(),
            grid,
            records: Vec::new(),
            next_connection_id: 0,
            next_message_id: 0,
        }
    }

    pub fn host(&self, address: HostAddress) -> &Host {
        &self.hosts[address.0 as usize]
    }

    pub fn host_mut(&mut self, address: HostAddress) -> &mut Host {
        &mut self.hosts[address.0 as usize]
    }

    pub fn addresses(&self) -> impl Iterator<Item = HostAddress> {
        (0..self.hosts.len() as u32).map(HostAddress)
    }

    /// True iff no room polygon edge intersects the segment between the two
    /// coordinates.
    pub fn line_of_sight_clear(&self, a: Coord, b: Coord) -> bool {
        !self.rooms.iter().any(|room| room.crosses(a, b))
    }

    pub(crate) fn next_connection_id(&mut self) -> ConnectionId {
        let id = ConnectionId(self.next_connection_id);
        self.next_connection_id += 1;
        id
    }

    pub(crate) fn next_message_id(&mut self) -> MessageId {
        self.next_message_id += 1;
        MessageId(self.next_message_id)
    }

    pub(crate) fn record(&mut self, record: ReportRecord) {
        self.records.push(record);
    }

    /// Checks that every open connection is listed by both of its endpoints.
    /// Connections are owned jointly: one side holding a link the other has
    /// dropped is a fatal scenario error.
    pub fn validate_connections(&self) -> Result<(), crate::error::ScenarioError> {
        for (id, conn) in &self.connections {
            let (a, b) = conn.endpoints();
            let listed = |addr: HostAddress| self.host(addr).interface.connections.contains(id);
            if !listed(a) || !listed(b) {
                return Err(crate::error::ScenarioError::AsymmetricConnection { a, b });
            }
        }
        Ok(())
    }
}
