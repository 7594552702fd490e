//! The transport abstraction. Generalizes the teacher's `ServerMessage`/
//! `GameMessage` mpsc channel pair (`jakobhuuse-Netcode-in-Rust/server/src/
//! network.rs`) — which ties outgoing fan-out directly to a `UdpSocket` —
//! into a trait any reliable, ordered, per-client channel can implement.
//! Real socket framing is out of scope; [`ChannelRoom`] is the in-process
//! `tokio::sync::mpsc` implementation used by tests and the bundled demo.

use std::collections::HashMap;

use tokio::sync::mpsc;

use shared::protocol::{ClientMessage, ServerMessage};

/// One room's outbound/inbound fan-out. A client is "in" the room once
/// [`Room::register_client`] has been called for its id; sends to an id
/// that was never registered, or already removed, are silently dropped —
/// matching the teacher's `send_packet_impl` treating a failed send as a
/// logged, non-fatal event rather than a panic.
pub trait Room: Send {
    /// Registers a new client, returning the receiving half of its
    /// outbound channel (what a connection-handling task would forward to
    /// the actual socket).
    fn register_client(&mut self, client_id: u32) -> mpsc::UnboundedReceiver<ServerMessage>;

    fn remove_client(&mut self, client_id: u32);

    fn send_to(&self, client_id: u32, message: ServerMessage);

    fn broadcast(&self, message: ServerMessage, exclude: Option<u32>);

    /// Pulls one inbound message if available; non-blocking, used by the
    /// scheduler's tick loop between physics steps.
    fn try_recv(&mut self) -> Option<(u32, ClientMessage)>;

    /// A sender any producer (a mock connection, a real socket task) can
    /// clone to inject inbound messages addressed to this room.
    fn inbound_sender(&self) -> mpsc::UnboundedSender<(u32, ClientMessage)>;
}

/// In-process implementation: one outbound queue per client, one shared
/// inbound queue multiplexing every client's messages.
pub struct ChannelRoom {
    outbound: HashMap<u32, mpsc::UnboundedSender<ServerMessage>>,
    inbound_tx: mpsc::UnboundedSender<(u32, ClientMessage)>,
    inbound_rx: mpsc::UnboundedReceiver<(u32, ClientMessage)>,
}

impl Default for ChannelRoom {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRoom {
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self { outbound: HashMap::new(), inbound_tx, inbound_rx }
    }
}

impl Room for ChannelRoom {
    fn register_client(&mut self, client_id: u32) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outbound.insert(client_id, tx);
        rx
    }

    fn remove_client(&mut self, client_id: u32) {
        self.outbound.remove(&client_id);
    }

    fn send_to(&self, client_id: u32, message: ServerMessage) {
        if let Some(tx) = self.outbound.get(&client_id) {
            let _ = tx.send(message);
        }
    }

    fn broadcast(&self, message: ServerMessage, exclude: Option<u32>) {
        for (&id, tx) in &self.outbound {
            if Some(id) == exclude {
                continue;
            }
            let _ = tx.send(message.clone());
        }
    }

    fn try_recv(&mut self) -> Option<(u32, ClientMessage)> {
        self.inbound_rx.try_recv().ok()
    }

    fn inbound_sender(&self) -> mpsc::UnboundedSender<(u32, ClientMessage)> {
        self.inbound_tx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_client_receives_direct_send() {
        let mut room = ChannelRoom::new();
        let mut rx = room.register_client(1);
        room.send_to(1, ServerMessage::SoccerGameStarted);
        let msg = rx.try_recv().unwrap();
        assert!(matches!(msg, ServerMessage::SoccerGameStarted));
    }

    #[test]
    fn broadcast_excludes_the_named_client() {
        let mut room = ChannelRoom::new();
        let mut rx1 = room.register_client(1);
        let mut rx2 = room.register_client(2);
        room.broadcast(ServerMessage::SoccerGameStarted, Some(1));
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn inbound_sender_round_trips_into_try_recv() {
        let mut room = ChannelRoom::new();
        let tx = room.inbound_sender();
        tx.send((7, ClientMessage::SoccerRequestGameState)).unwrap();
        let (id, msg) = room.try_recv().unwrap();
        assert_eq!(id, 7);
        assert!(matches!(msg, ClientMessage::SoccerRequestGameState));
    }

    #[test]
    fn send_to_unregistered_client_is_silently_dropped() {
        let room = ChannelRoom::new();
        room.send_to(99, ServerMessage::SoccerGameStarted);
    }
}
