use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::RoomEvent;

/// Buffered events per room before slow receivers start lagging.
const ROOM_CAPACITY: usize = 64;

/// Registry of per-user broadcast rooms. A room exists while at least one
/// connection is subscribed; publishing into a room with no subscribers
/// drops the event. Rooms are independent, the mutex only guards the map.
#[derive(Clone, Default)]
pub struct Rooms {
    inner: Arc<Mutex<HashMap<Uuid, broadcast::Sender<RoomEvent>>>>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a connection to the room named by `user_id`, creating the
    /// room on first join.
    pub fn join(&self, user_id: Uuid) -> broadcast::Receiver<RoomEvent> {
        let mut rooms = self.inner.lock().expect("rooms registry lock");
        rooms
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Deliver an event to every connection currently in the room. Returns
    /// the number of receivers; zero means the event went nowhere, which is
    /// the documented behavior when the owner is not connected.
    pub fn publish(&self, user_id: Uuid, event: RoomEvent) -> usize {
        let rooms = self.inner.lock().expect("rooms registry lock");
        match rooms.get(&user_id) {
            Some(tx) => tx.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Remove the room once its last subscriber has disconnected.
    pub fn prune(&self, user_id: Uuid) {
        let mut rooms = self.inner.lock().expect("rooms registry lock");
        if let Some(tx) = rooms.get(&user_id) {
            if tx.receiver_count() == 0 {
                rooms.remove(&user_id);
            }
        }
    }

    #[cfg(test)]
    pub fn room_count(&self) -> usize {
        self.inner.lock().expect("rooms registry lock").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_event(msg: &str) -> RoomEvent {
        RoomEvent::ProcessingError {
            msg: msg.into(),
            error: "e".into(),
        }
    }

    #[tokio::test]
    async fn joined_connection_receives_published_event() {
        let rooms = Rooms::new();
        let user = Uuid::new_v4();
        let mut rx = rooms.join(user);

        let delivered = rooms.publish(user, error_event("hello"));
        assert_eq!(delivered, 1);

        match rx.recv().await.unwrap() {
            RoomEvent::ProcessingError { msg, .. } => assert_eq!(msg, "hello"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped() {
        let rooms = Rooms::new();
        assert_eq!(rooms.publish(Uuid::new_v4(), error_event("lost")), 0);
        assert_eq!(rooms.room_count(), 0);
    }

    #[tokio::test]
    async fn rooms_are_isolated_per_user() {
        let rooms = Rooms::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut alice_rx = rooms.join(alice);
        let mut bob_rx = rooms.join(bob);

        rooms.publish(alice, error_event("for alice"));

        match alice_rx.recv().await.unwrap() {
            RoomEvent::ProcessingError { msg, .. } => assert_eq!(msg, "for alice"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(
            bob_rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn all_connections_in_a_room_receive_the_event() {
        let rooms = Rooms::new();
        let user = Uuid::new_v4();
        let mut first = rooms.join(user);
        let mut second = rooms.join(user);

        assert_eq!(rooms.publish(user, error_event("fanout")), 2);
        assert!(first.recv().await.is_ok());
        assert!(second.recv().await.is_ok());
    }

    #[tokio::test]
    async fn prune_removes_empty_rooms_only() {
        let rooms = Rooms::new();
        let user = Uuid::new_v4();
        let rx = rooms.join(user);

        rooms.prune(user);
        assert_eq!(rooms.room_count(), 1);

        drop(rx);
        rooms.prune(user);
        assert_eq!(rooms.room_count(), 0);
    }
}
