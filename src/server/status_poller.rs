use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::docker::DockerClient;
use crate::web::models::WsMessage;

/// Periodically lists every container from the engine and pushes the full
/// list to all connected WebSocket clients.
pub struct StatusPoller {
    docker: DockerClient,
    ws_broadcaster: broadcast::Sender<WsMessage>,
    interval: Duration,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nobody is listening; the engine was not queried.
    Idle,
    Broadcast { containers: usize },
    /// The engine call failed. Clients keep their previous list.
    Failed,
}

impl StatusPoller {
    pub fn new(
        docker: DockerClient,
        ws_broadcaster: broadcast::Sender<WsMessage>,
        interval: Duration,
    ) -> Self {
        Self {
            docker,
            ws_broadcaster,
            interval,
        }
    }

    pub async fn poll_once(&self) -> PollOutcome {
        if self.ws_broadcaster.receiver_count() == 0 {
            return PollOutcome::Idle;
        }

        match self.docker.list_containers().await {
            Ok(containers) => {
                let count = containers.len();
                if let Err(e) = self.ws_broadcaster.send(WsMessage::StatusUpdate(containers)) {
                    // All subscribers left between the check and the send.
                    debug!("Failed to broadcast status update (no subscribers?): {}", e);
                }
                PollOutcome::Broadcast { containers: count }
            }
            Err(e) => {
                debug!(error = %e, "Status poll failed; clients keep stale data.");
                PollOutcome::Failed
            }
        }
    }

    /// Spawns the polling loop onto the runtime.
    pub fn run(self) -> JoinHandle<()> {
        info!(interval_ms = self.interval.as_millis() as u64, "Status poller started.");
        tokio::spawn(async move {
            let mut interval = time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.poll_once().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::testing::{summary, RecordingBridge};

    fn poller(bridge: &RecordingBridge) -> (StatusPoller, broadcast::Sender<WsMessage>) {
        let (tx, _) = broadcast::channel(8);
        let docker = DockerClient::with_bridge(bridge.clone(), 10);
        (
            StatusPoller::new(docker, tx.clone(), Duration::from_millis(2000)),
            tx,
        )
    }

    #[tokio::test]
    async fn test_idle_without_clients() {
        let bridge = RecordingBridge::default();
        let (poller, _tx) = poller(&bridge);

        assert_eq!(poller.poll_once().await, PollOutcome::Idle);
        assert!(bridge.calls().is_empty());
    }

    #[tokio::test]
    async fn test_broadcasts_full_list_to_every_client() {
        let bridge = RecordingBridge::default();
        bridge.set_containers(vec![
            summary("a", "postgresql-1", "running"),
            summary("b", "redis-2", "exited"),
        ]);
        let (poller, tx) = poller(&bridge);
        let mut first = tx.subscribe();
        let mut second = tx.subscribe();

        assert_eq!(
            poller.poll_once().await,
            PollOutcome::Broadcast { containers: 2 }
        );
        assert_eq!(bridge.calls(), vec!["list all=true".to_string()]);

        for rx in [&mut first, &mut second] {
            let WsMessage::StatusUpdate(containers) = rx.recv().await.unwrap();
            assert_eq!(containers.len(), 2);
            assert_eq!(containers[1].id.as_deref(), Some("b"));
        }
    }

    #[tokio::test]
    async fn test_engine_failure_is_swallowed() {
        let bridge = RecordingBridge::default();
        bridge.fail_list("Cannot connect to the Docker daemon");
        let (poller, tx) = poller(&bridge);
        let mut rx = tx.subscribe();

        assert_eq!(poller.poll_once().await, PollOutcome::Failed);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_on_interval() {
        let bridge = RecordingBridge::default();
        let (poller, tx) = poller(&bridge);
        let mut rx = tx.subscribe();

        let handle = poller.run();
        // The first tick fires immediately, the next after one interval.
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        handle.abort();

        assert_eq!(bridge.calls().len(), 2);
    }
}
