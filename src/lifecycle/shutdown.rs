//! Shutdown coordination for background loops.

use tokio::sync::broadcast;

/// Broadcast stop signal for long-running tasks.
///
/// Each health monitor loop subscribes when it is spawned. A trigger reaches
/// every current subscriber; loops spawned afterwards are unaffected, which lets
/// a registry be initialized again after `shutdown()`.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal all current subscribers. Returns how many were listening.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_current_subscribers_only() {
        let shutdown = Shutdown::new();
        assert_eq!(shutdown.trigger(), 0);

        let mut early = shutdown.subscribe();
        assert_eq!(shutdown.trigger(), 1);
        assert!(early.recv().await.is_ok());

        let mut late = shutdown.subscribe();
        assert!(late.try_recv().is_err());
        assert_eq!(shutdown.trigger(), 2);
        assert!(late.recv().await.is_ok());
    }
}
