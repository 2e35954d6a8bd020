use crate::network::HostAddress;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.0)
    }
}

/// A message travelling through the overlay.
///
/// The identity fields never change after creation. The hop path belongs to
/// each replica: forwarding clones the message and the *receiver's* copy gets
/// the new hop appended, so a forward can never mutate what the sender holds.
#[derive(Clone, Debug)]
pub struct Message {
    pub id: MessageId,
    pub from: HostAddress,
    pub to: HostAddress,
    pub size: u64,
    pub created: f64,
    /// Size of the reply the destination would send; 0 means one-way.
    pub response_size: u64,
    /// Spray-and-wait copy budget of this replica; `None` under epidemic
    /// routing.
    pub copies: Option<u32>,
    pub hop_path: Vec<HostAddress>,
}

impl Message {
    pub fn new(
        id: MessageId,
        from: HostAddress,
        to: HostAddress,
        size: u64,
        response_size: u64,
        created: f64,
    ) -> Self {
        Self {
            id,
            from,
            to,
            size,
            created,
            response_size,
            copies: None,
            hop_path: vec![from],
        }
    }

    /// Copy-on-forward: the replica starts out identical and diverges from
    /// the original as it travels.
    pub fn replicate(&self) -> Message {
        self.clone()
    }

    pub fn hop_count(&self) -> u32 {
        (self.hop_path.len() - 1) as u32
    }
}

/// An indexed fragment of a message as it crosses a PDU-limited link.
#[derive(Clone, Debug)]
pub struct MessageChunk {
    pub index: u32,
    pub size: u64,
    pub created: f64,
    /// Simulation time at which the chunk finished crossing the link.
    pub received: Option<f64>,
}

/// Splits `size` bytes into MTU-sized chunks plus a residual tail.
pub fn split_into_chunks(size: u64, mtu: u64, now: f64) -> Vec<MessageChunk> {
    let full = size / mtu;
    let tail = size % mtu;
    let mut chunks = Vec::with_capacity((full + u64::from(tail > 0)) as usize);
    for index in 0..full {
        chunks.push(MessageChunk {
            index: index as u32,
            size: mtu,
            created: now,
            received: None,
        });
    }
    if tail > 0 {
        chunks.push(MessageChunk {
            index: full as u32,
            size: tail,
            created: now,
            received: None,
        });
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiple_has_no_tail() {
        let chunks = split_into_chunks(3 * 247, 247, 0.0);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.size == 247));
    }

    #[test]
    fn one_byte_over_gets_a_one_byte_tail() {
        let chunks = split_into_chunks(3 * 247 + 1, 247, 0.0);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[3].size, 1);
        assert_eq!(chunks[3].index, 3);
    }

    #[test]
    fn small_message_is_a_single_tail_chunk() {
        let chunks = split_into_chunks(100, 247, 2.5);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].size, 100);
        assert_eq!(chunks[0].created, 2.5);
        assert_eq!(chunks[0].received, None);
    }

    #[test]
    fn replica_hop_path_diverges_from_the_original() {
        let original = Message::new(
            MessageId(1),
            HostAddress(0),
            HostAddress(2),
            1024,
            0,
            0.0,
        );
        let mut replica = original.replicate();
        replica.hop_path.push(HostAddress(1));
        assert_eq!(original.hop_path, vec![HostAddress(0)]);
        assert_eq!(replica.hop_count(), 1);
    }
}
