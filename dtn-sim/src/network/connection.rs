use crate::error::ScenarioError;
use crate::network::message::{split_into_chunks, Message, MessageChunk, MessageId};
use crate::network::{interface, router, Admission, ConnectionId, HostAddress, World};

/// Maximum bytes transferred per chunk, modelling a BLE 4.2+ link layer.
pub const PATH_MTU: u64 = 247;

/// A live radio link between two hosts, able to carry one message at a time.
///
/// Both endpoints refer to the connection by id; the arena entry is removed
/// when either side tears the link down or a transfer completes, which keeps
/// the two sides consistent by construction.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    from: HostAddress,
    to: HostAddress,
    speed_bps: u64,
    last_update: f64,
    transfer: Option<Transfer>,
}

#[derive(Debug)]
struct Transfer {
    message: Message,
    sender: HostAddress,
    size: u64,
    sent: u64,
    full_chunks_remaining: u64,
    tail_remaining: u64,
    chunks: Vec<MessageChunk>,
    next_full_chunk: usize,
}

impl Connection {
    pub fn new(id: ConnectionId, from: HostAddress, to: HostAddress, now: f64) -> Self {
        Self {
            id,
            from,
            to,
            speed_bps: 0,
            last_update: now,
            transfer: None,
        }
    }

    /// The endpoint that created the connection; it drives the per-tick
    /// update so each connection is updated exactly once per tick.
    pub fn initiator(&self) -> HostAddress {
        self.from
    }

    pub fn endpoints(&self) -> (HostAddress, HostAddress) {
        (self.from, self.to)
    }

    pub fn other_end(&self, address: HostAddress) -> HostAddress {
        if address == self.from {
            self.to
        } else {
            self.from
        }
    }

    pub fn involves(&self, address: HostAddress) -> bool {
        self.from == address || self.to == address
    }

    /// The link rate computed at the most recent update, bps.
    pub fn speed_bps(&self) -> u64 {
        self.speed_bps
    }

    pub fn is_transferring(&self) -> bool {
        self.transfer.is_some()
    }

    pub fn transferring(&self) -> Option<MessageId> {
        self.transfer.as_ref().map(|t| t.message.id)
    }

    pub fn remaining_byte_count(&self) -> u64 {
        self.transfer
            .as_ref()
            .map(|t| t.size.saturating_sub(t.sent))
            .unwrap_or(0)
    }
}

/// Replicates `message_id` from the sender's buffer onto this connection,
/// after asking the receiving router for admission. At most one message may
/// be in flight per connection; a second start is a fatal scenario error.
pub(crate) fn start_transfer(
    world: &mut World,
    id: ConnectionId,
    sender: HostAddress,
    message_id: MessageId,
    now: f64,
) -> Result<Admission, ScenarioError> {
    let conn = &world.connections[&id];
    if conn.transfer.is_some() {
        return Err(ScenarioError::TransferInFlight { connection: id });
    }
    let receiver = conn.other_end(sender);

    let replica = world
        .host(sender)
        .buffer
        .get(message_id)
        .expect("sender no longer holds the message it offered")
        .replicate();

    let admission = router::admission(world, receiver, &replica);
    if admission != Admission::RcvOk {
        return Ok(admission);
    }

    world.host_mut(receiver).incoming.insert(message_id);
    world.host_mut(sender).outgoing.insert(message_id);

    let size = replica.size;
    let chunks = split_into_chunks(size, PATH_MTU, now);
    let conn = world.connections.get_mut(&id).expect("connection vanished");
    conn.transfer = Some(Transfer {
        message: replica,
        sender,
        size,
        sent: 0,
        full_chunks_remaining: size / PATH_MTU,
        tail_remaining: size % PATH_MTU,
        chunks,
        next_full_chunk: 0,
    });

    Ok(Admission::RcvOk)
}

/// One tick of progress: recompute the link rate from the two endpoints'
/// quotes, spend the byte budget accumulated since the last update on whole
/// chunks (then the tail if it still fits), and finalize the transfer once
/// every byte is across.
pub(crate) fn update(world: &mut World, id: ConnectionId, now: f64) -> Result<(), ScenarioError> {
    let conn = &world.connections[&id];
    let (from, to) = conn.endpoints();
    let distance = world.host(from).location.distance(world.host(to).location);
    let speed = interface::transmit_speed_bps(distance, world.host(from).interface.transmit_range)
        .min(interface::transmit_speed_bps(
            distance,
            world.host(to).interface.transmit_range,
        ));

    let conn = world.connections.get_mut(&id).expect("connection vanished");
    conn.speed_bps = speed;
    let elapsed = now - conn.last_update;
    conn.last_update = now;

    let mut completed = false;
    if let Some(transfer) = conn.transfer.as_mut() {
        let budget = speed as f64 * elapsed;
        transfer.spend(budget, now);
        completed = transfer.sent >= transfer.size;
    }

    if completed {
        finalize(world, id, now)?;
    }
    Ok(())
}

impl Transfer {
    /// Deducts whole chunks while the budget allows, then the residual tail
    /// chunk if it fits. Chunk order does not affect the total, so the tail
    /// may cross before remaining full chunks.
    fn spend(&mut self, budget: f64, now: f64) {
        let mut total: u64 = 0;

        let mut taken: u64 = 0;
        while taken < self.full_chunks_remaining && (total + PATH_MTU) as f64 <= budget {
            total += PATH_MTU;
            taken += 1;
        }
        self.full_chunks_remaining -= taken;
        for _ in 0..taken {
            self.chunks[self.next_full_chunk].received = Some(now);
            self.next_full_chunk += 1;
        }

        if self.tail_remaining > 0 && (total + self.tail_remaining) as f64 <= budget {
            total += self.tail_remaining;
            self.tail_remaining = 0;
            if let Some(tail) = self.chunks.last_mut() {
                tail.received = Some(now);
            }
        }

        self.sent += total;
    }
}

/// Commits a completed transfer to the receiving router and destroys the
/// connection; the link may re-form on the next tick.
fn finalize(world: &mut World, id: ConnectionId, now: f64) -> Result<(), ScenarioError> {
    let conn = world.connections.get_mut(&id).expect("connection vanished");
    let transfer = conn.transfer.take().expect("finalize without a transfer");
    let receiver = conn.other_end(transfer.sender);

    world.host_mut(receiver).incoming.remove(&transfer.message.id);
    world
        .host_mut(transfer.sender)
        .outgoing
        .remove(&transfer.message.id);
    teardown(world, id);
    router::message_transferred(world, transfer.sender, receiver, transfer.message, now)
}

/// Removes the connection from the arena and from both endpoints' lists; an
/// aborted in-flight transfer releases the receiver's incoming slot.
pub(crate) fn teardown(world: &mut World, id: ConnectionId) {
    let Some(conn) = world.connections.remove(&id) else {
        return;
    };
    let (a, b) = (conn.from, conn.to);
    world.host_mut(a).interface.connections.retain(|c| *c != id);
    world.host_mut(b).interface.connections.retain(|c| *c != id);

    if let Some(transfer) = conn.transfer {
        let receiver = if transfer.sender == a { b } else { a };
        world
            .host_mut(receiver)
            .incoming
            .remove(&transfer.message.id);
        world
            .host_mut(transfer.sender)
            .outgoing
            .remove(&transfer.message.id);
    }
}
