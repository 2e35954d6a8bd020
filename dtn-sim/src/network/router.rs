use crate::error::ScenarioError;
use crate::network::{connection, ConnectionId, HostAddress, Message, MessageId, World};
use crate::report::ReportRecord;
use tracing::warn;

/// Forwarding policy of a host. Dispatch is by match; there is one router
/// value per host so policies could be mixed, though scenarios configure a
/// single class for the whole group.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Router {
    Epidemic {
        /// Whether the destination drops a message from its buffer once it
        /// has been delivered. Off by default: epidemic routing keeps
        /// delivered messages around, at the cost of buffer bloat.
        evict_delivered: bool,
    },
    SprayAndWait {
        /// Copy budget a freshly created message starts with.
        initial_copies: u32,
    },
}

/// Outcome of asking a router to accept an incoming message.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Admission {
    RcvOk,
    /// Already in the receiver's buffer, or already delivered to it.
    DeniedOld,
    /// The message alone exceeds the receiver's buffer capacity.
    DeniedNoSpace,
    /// The receiver's radio is off.
    DeniedUnreachable,
    /// The receiver is currently receiving this message on another link.
    TryLater,
}

/// Checks whether `receiver` would accept the message right now. Transient
/// refusals are normal return codes, not errors.
pub fn admission(world: &World, receiver: HostAddress, message: &Message) -> Admission {
    let host = world.host(receiver);
    if !host.radio_active {
        return Admission::DeniedUnreachable;
    }
    if host.delivered.contains(&message.id) || host.buffer.contains(message.id) {
        return Admission::DeniedOld;
    }
    if host.incoming.contains(&message.id) {
        return Admission::TryLater;
    }
    if !host.buffer.fits(message.size) {
        return Admission::DeniedNoSpace;
    }
    Admission::RcvOk
}

/// One routing tick: offer buffered messages over every idle open connection.
/// A connection carries one message at a time, so the first accepted offer
/// occupies it until the transfer completes.
pub(crate) fn update(
    world: &mut World,
    address: HostAddress,
    now: f64,
) -> Result<(), ScenarioError> {
    let open: Vec<ConnectionId> = world.host(address).interface.connections.clone();
    for id in open {
        let Some(conn) = world.connections.get(&id) else {
            continue;
        };
        if conn.is_transferring() {
            continue;
        }
        let peer = conn.other_end(address);

        let offers: Vec<(MessageId, HostAddress, Option<u32>)> = world
            .host(address)
            .buffer
            .iter()
            .map(|m| (m.id, m.to, m.copies))
            .collect();

        for (message_id, to, copies) in offers {
            // One outbound transfer per message at a time, or a spray
            // budget captured at start would be handed out twice
            if world.host(address).outgoing.contains(&message_id) {
                continue;
            }
            let peer_host = world.host(peer);
            if peer_host.buffer.contains(message_id) || peer_host.delivered.contains(&message_id)
            {
                continue;
            }
            // A spray-and-wait message down to its last copy waits for the
            // destination itself.
            if matches!(copies, Some(budget) if budget <= 1) && peer != to {
                continue;
            }

            match connection::start_transfer(world, id, address, message_id, now)? {
                Admission::RcvOk => break,
                _ => continue,
            }
        }
    }
    Ok(())
}

/// Finalizes a completed transfer at the receiving host: append the hop,
/// split the spray budget, count a delivery when the replica reached its
/// destination, and store the replica per the router's retention policy.
pub(crate) fn message_transferred(
    world: &mut World,
    sender: HostAddress,
    receiver: HostAddress,
    mut replica: Message,
    now: f64,
) -> Result<(), ScenarioError> {
    replica.hop_path.push(receiver);

    if let Some(budget) = replica.copies {
        replica.copies = Some(budget / 2);
        if let Some(kept) = world.host_mut(sender).buffer.get_mut(replica.id) {
            kept.copies = Some(budget - budget / 2);
        }
    }

    world.record(ReportRecord::Relayed {
        time: now,
        id: replica.id,
        from: sender,
        to: receiver,
    });

    let is_destination = receiver == replica.to;
    if is_destination {
        world.host_mut(receiver).delivered.insert(replica.id);
        world.record(ReportRecord::Delivered {
            time: now,
            id: replica.id,
            from: replica.from,
            to: replica.to,
            size: replica.size,
            hops: replica.hop_count(),
            latency: now - replica.created,
            path: replica.hop_path.clone(),
        });
    }

    let store = match world.host(receiver).router {
        Router::Epidemic { evict_delivered } => !(is_destination && evict_delivered),
        Router::SprayAndWait { .. } => true,
    };
    if store {
        let evicted = world.host_mut(receiver).buffer.insert(replica)?;
        for dropped in evicted {
            world.record(ReportRecord::Dropped {
                time: now,
                id: dropped.id,
                host: receiver,
            });
        }
    }

    Ok(())
}

/// Creates a fresh message at `from` and admits it to the local buffer,
/// evicting oldest-first if needed.
pub(crate) fn create_message(
    world: &mut World,
    from: HostAddress,
    to: HostAddress,
    size: u64,
    response_size: u64,
    now: f64,
) -> Result<(), ScenarioError> {
    let id = world.next_message_id();
    let mut message = Message::new(id, from, to, size, response_size, now);
    if let Router::SprayAndWait { initial_copies } = world.host(from).router {
        message.copies = Some(initial_copies);
    }

    if !world.host(from).buffer.fits(size) {
        warn!("host {from} cannot hold a new {size} B message, skipping creation");
        return Ok(());
    }

    world.record(ReportRecord::Created {
        time: now,
        id,
        from,
        to,
        size,
    });
    let evicted = world.host_mut(from).buffer.insert(message)?;
    for dropped in evicted {
        world.record(ReportRecord::Dropped {
            time: now,
            id: dropped.id,
            host: from,
        });
    }
    Ok(())
}
