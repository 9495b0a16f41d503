//! Outbound fan-out to connected sessions

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::ws::protocol::ServerMsg;

use super::ConnId;

/// Recipients of a server message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// A single connection
    One(ConnId),
    /// Every connection
    All,
    /// Every connection but one (usually the sender)
    AllExcept(ConnId),
}

impl Audience {
    fn includes(&self, conn_id: &ConnId) -> bool {
        match self {
            Audience::One(id) => id == conn_id,
            Audience::All => true,
            Audience::AllExcept(id) => id != conn_id,
        }
    }
}

/// Outbound channels of every open WebSocket session.
///
/// Sessions register themselves on upgrade and unregister on close; the
/// arena only ever reads from it. Delivery is at-most-once: a full or
/// closed channel drops the message.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<ConnId, mpsc::Sender<ServerMsg>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, conn_id: ConnId, outbound: mpsc::Sender<ServerMsg>) {
        self.sessions.insert(conn_id, outbound);
    }

    pub fn unregister(&self, conn_id: &ConnId) {
        self.sessions.remove(conn_id);
    }

    /// Number of open sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Fire-and-forget delivery to every matching session
    pub fn deliver(&self, audience: Audience, msg: ServerMsg) {
        if let Audience::One(conn_id) = audience {
            if let Some(tx) = self.sessions.get(&conn_id) {
                Self::push(&conn_id, tx.value(), msg);
            }
            return;
        }

        for entry in self.sessions.iter() {
            if audience.includes(entry.key()) {
                Self::push(entry.key(), entry.value(), msg.clone());
            }
        }
    }

    fn push(conn_id: &ConnId, tx: &mpsc::Sender<ServerMsg>, msg: ServerMsg) {
        match tx.try_send(msg) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn_id = %conn_id, "Outbound queue full, dropping message");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(conn_id = %conn_id, "Outbound queue closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn session(registry: &SessionRegistry) -> (ConnId, mpsc::Receiver<ServerMsg>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(8);
        registry.register(id, tx);
        (id, rx)
    }

    #[test]
    fn audiences_route_correctly() {
        let registry = SessionRegistry::new();
        let (a, mut rx_a) = session(&registry);
        let (_b, mut rx_b) = session(&registry);

        registry.deliver(Audience::One(a), ServerMsg::YouDied);
        registry.deliver(Audience::AllExcept(a), ServerMsg::Pong { t: 1 });
        registry.deliver(Audience::All, ServerMsg::Pong { t: 2 });

        assert_eq!(rx_a.try_recv().unwrap(), ServerMsg::YouDied);
        assert_eq!(rx_a.try_recv().unwrap(), ServerMsg::Pong { t: 2 });
        assert!(rx_a.try_recv().is_err());

        assert_eq!(rx_b.try_recv().unwrap(), ServerMsg::Pong { t: 1 });
        assert_eq!(rx_b.try_recv().unwrap(), ServerMsg::Pong { t: 2 });
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(1);
        registry.register(id, tx);

        registry.deliver(Audience::All, ServerMsg::Pong { t: 1 });
        registry.deliver(Audience::All, ServerMsg::Pong { t: 2 });

        assert_eq!(rx.try_recv().unwrap(), ServerMsg::Pong { t: 1 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unregistered_session_receives_nothing() {
        let registry = SessionRegistry::new();
        let (a, mut rx_a) = session(&registry);
        registry.unregister(&a);
        registry.deliver(Audience::All, ServerMsg::YouDied);
        assert!(rx_a.try_recv().is_err());
        assert!(registry.is_empty());
    }
}
