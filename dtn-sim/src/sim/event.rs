use crate::network::HostAddress;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// An externally scheduled event. Ticks are not queued: the scheduler
/// synthesizes them at the fixed update interval.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    MessageCreate {
        from: HostAddress,
        to: HostAddress,
        size: u64,
        response_size: u64,
    },
    /// The generator had nothing to emit yet; try again at the event's time.
    Poll,
    /// Workload exhausted; the scheduler exits after processing everything up
    /// to the event's time.
    SimEnd,
}

#[derive(Debug)]
pub struct ScheduledEvent {
    pub time: f64,
    pub event: Event,
    /// Whether the generator produced this event (and should be asked for
    /// its next one once this one is dispatched).
    pub from_generator: bool,
    seq: u64,
}

/// Time-ordered event queue: a min-heap keyed by (time, insertion sequence),
/// so events at equal times pop in FIFO order.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<ScheduledEvent>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: f64, event: Event) {
        self.insert(time, event, false);
    }

    pub(crate) fn push_generated(&mut self, time: f64, event: Event) {
        self.insert(time, event, true);
    }

    fn insert(&mut self, time: f64, event: Event, from_generator: bool) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(ScheduledEvent {
            time,
            event,
            from_generator,
            seq,
        });
    }

    pub fn pop(&mut self) -> Option<ScheduledEvent> {
        self.heap.pop()
    }

    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.time)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

impl Eq for ScheduledEvent {}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the earliest (time, seq) is the heap's max
        other
            .time
            .total_cmp(&self.time)
            .then(other.seq.cmp(&self.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_order() {
        let mut queue = EventQueue::new();
        queue.push(3.0, Event::Poll);
        queue.push(1.0, Event::Poll);
        queue.push(2.0, Event::Poll);

        let times: Vec<f64> = std::iter::from_fn(|| queue.pop().map(|e| e.time)).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn equal_times_pop_fifo() {
        let mut queue = EventQueue::new();
        queue.push(1.0, Event::SimEnd);
        queue.push(
            1.0,
            Event::MessageCreate {
                from: HostAddress(0),
                to: HostAddress(1),
                size: 10,
                response_size: 0,
            },
        );

        assert_eq!(queue.pop().unwrap().event, Event::SimEnd);
        assert!(matches!(
            queue.pop().unwrap().event,
            Event::MessageCreate { .. }
        ));
    }

    #[test]
    fn infinity_sorts_last() {
        let mut queue = EventQueue::new();
        queue.push(f64::INFINITY, Event::SimEnd);
        queue.push(5.0, Event::Poll);
        assert_eq!(queue.pop().unwrap().time, 5.0);
        assert_eq!(queue.peek_time(), Some(f64::INFINITY));
    }
}
