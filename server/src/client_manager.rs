//! Per-connection bookkeeping: input queues and sequence tracking,
//! generalizing the teacher's `ClientManager`/`Client` pair
//! (`jakobhuuse-Netcode-in-Rust/server/src/client_manager.rs`) from an
//! unbounded sorted-by-sequence `Vec` to the bounded, front-drop-on-overflow
//! FIFO the design calls for (§3 `InputQueue`, §4.F).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use shared::InputState;

/// Input queues are capped at ~2 seconds of 8 ms-cadence samples.
pub const INPUT_QUEUE_CAPACITY: usize = 120;

/// A connected client: identity plus its bounded input queue and the
/// highest sequence number integrated into its physics state so far.
#[derive(Debug)]
pub struct Client {
    pub id: u32,
    pub last_seen: Instant,
    pub last_processed_sequence: u64,
    queue: VecDeque<InputState>,
}

impl Client {
    pub fn new(id: u32) -> Self {
        Self { id, last_seen: Instant::now(), last_processed_sequence: 0, queue: VecDeque::with_capacity(INPUT_QUEUE_CAPACITY) }
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Appends one input, applying the ingestion rules from §4.F: drop if
    /// `sequence <= last_processed_sequence`, coalesce a duplicate of the
    /// last queued sequence, and drop the *front* of the queue on overflow
    /// rather than rejecting the new sample.
    pub fn enqueue_input(&mut self, input: InputState) {
        if input.sequence <= self.last_processed_sequence {
            return;
        }
        if let Some(last) = self.queue.back_mut() {
            if last.sequence == input.sequence {
                *last = input;
                return;
            }
        }
        if self.queue.len() == INPUT_QUEUE_CAPACITY {
            self.queue.pop_front();
        }
        self.queue.push_back(input);
    }

    /// Drains the front of the queue for one physics tick, or `None` if
    /// empty (the caller reuses the last-applied input, per §4.C).
    pub fn drain_one(&mut self) -> Option<InputState> {
        let next = self.queue.pop_front();
        if let Some(input) = next {
            self.last_processed_sequence = self.last_processed_sequence.max(input.sequence);
        }
        next
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

/// The full set of connected clients, keyed by server-assigned id.
#[derive(Debug, Default)]
pub struct ClientManager {
    clients: std::collections::HashMap<u32, Client>,
    next_client_id: u32,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self { clients: std::collections::HashMap::new(), next_client_id: 1, max_clients }
    }

    /// Registers a new client, returning its id, or `None` if at capacity.
    /// Ids are never reused, matching the teacher's monotonic-id guarantee.
    pub fn add_client(&mut self) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }
        let id = self.next_client_id;
        self.next_client_id += 1;
        self.clients.insert(id, Client::new(id));
        Some(id)
    }

    pub fn remove_client(&mut self, id: u32) -> Option<Client> {
        self.clients.remove(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Client> {
        self.clients.get_mut(&id)
    }

    pub fn get(&self, id: u32) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn enqueue_input(&mut self, id: u32, input: InputState) -> bool {
        if let Some(client) = self.clients.get_mut(&id) {
            client.touch();
            client.enqueue_input(input);
            true
        } else {
            false
        }
    }

    pub fn ids(&self) -> Vec<u32> {
        self.clients.keys().copied().collect()
    }

    pub fn last_processed_sequences(&self) -> std::collections::HashMap<u32, u64> {
        self.clients.iter().map(|(&id, c)| (id, c.last_processed_sequence)).collect()
    }

    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<u32> {
        let timed_out: Vec<u32> = self.clients.values().filter(|c| c.is_timed_out(timeout)).map(|c| c.id).collect();
        for id in &timed_out {
            self.clients.remove(id);
        }
        timed_out
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
