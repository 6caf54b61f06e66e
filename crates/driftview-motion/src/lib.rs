pub mod anchor;
pub mod integrator;
pub mod listener;
pub mod orientation;
pub mod protocol;
pub mod trajectory;
pub mod types;

use anyhow::Result;
use listener::{dispatch_sensor_event, InertialPipeline};
use protocol::ProtocolParser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use trajectory::TrajectoryStore;
use types::{FeedMessage, PoseFrame, Position2D};

/// Commands sent to the feed processing task.
enum FeedCommand {
    ResetInertial,
}

/// A per-frame pose provider, pulled by the render loop.
pub trait PoseSource {
    /// The newest pose frame not yet returned, if any arrived since the last call.
    fn poll_pose(&mut self) -> Option<PoseFrame>;
}

/// Client for the companion device's sensor and pose stream.
///
/// Connects over TCP, parses the framed packet stream, and runs the
/// dead-reckoning pipeline on a background task that is the only writer of
/// the inertial state. Pose frames are published for the render loop to pull.
pub struct FeedClient {
    inertial_tx: Arc<watch::Sender<Position2D>>,
    inertial_rx: watch::Receiver<Position2D>,
    pose_rx: watch::Receiver<Option<PoseFrame>>,
    command_tx: mpsc::UnboundedSender<FeedCommand>,
    _task: tokio::task::JoinHandle<()>,
}

impl FeedClient {
    /// Connect to the companion device and start processing.
    pub async fn connect(
        addr: &str,
        timeout: Duration,
        store: Arc<TrajectoryStore>,
    ) -> Result<Self> {
        tracing::info!(%addr, "Connecting to sensor feed");

        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| anyhow::anyhow!("Timed out connecting to {addr}"))??;
        tracing::info!("Connected to sensor feed");

        let (inertial_tx, inertial_rx) = watch::channel(Position2D::ZERO);
        let inertial_tx = Arc::new(inertial_tx);
        let (pose_tx, pose_rx) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(feed_read_loop(
            stream,
            InertialPipeline::new(store),
            inertial_tx.clone(),
            pose_tx,
            command_rx,
        ));

        Ok(Self {
            inertial_tx,
            inertial_rx,
            pose_rx,
            command_tx,
            _task: task,
        })
    }

    /// Create a mock client for running without a companion device.
    ///
    /// Nothing is ever produced: both paths stay at the origin.
    pub fn mock() -> Self {
        let (inertial_tx, inertial_rx) = watch::channel(Position2D::ZERO);
        let (pose_tx, pose_rx) = watch::channel(None);
        let (command_tx, _) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            // Keep the pose sender alive so `has_changed` reports no change.
            let _tx = pose_tx;
            std::future::pending::<()>().await;
        });
        Self {
            inertial_tx: Arc::new(inertial_tx),
            inertial_rx,
            pose_rx,
            command_tx,
            _task: task,
        }
    }

    /// Latest dead-reckoned position (non-blocking).
    pub fn inertial_position(&self) -> Position2D {
        *self.inertial_rx.borrow()
    }

    /// Zero the inertial integrator and clear the dead-reckoning path; the
    /// integrator re-seeds on its next sample.
    ///
    /// The published position reads zero immediately. The feed task applies
    /// the reset before handling any further input.
    pub fn reset_inertial(&self) {
        self.inertial_tx.send_replace(Position2D::ZERO);
        let _ = self.command_tx.send(FeedCommand::ResetInertial);
    }
}

impl PoseSource for FeedClient {
    fn poll_pose(&mut self) -> Option<PoseFrame> {
        if !self.pose_rx.has_changed().unwrap_or(false) {
            return None;
        }
        *self.pose_rx.borrow_and_update()
    }
}

/// Background task: read TCP stream, parse packets, integrate, publish.
async fn feed_read_loop(
    mut stream: TcpStream,
    mut pipeline: InertialPipeline,
    inertial_tx: Arc<watch::Sender<Position2D>>,
    pose_tx: watch::Sender<Option<PoseFrame>>,
    mut command_rx: mpsc::UnboundedReceiver<FeedCommand>,
) {
    let mut parser = ProtocolParser::new();
    let mut buf = [0u8; 4096];
    let mut sample_count: u64 = 0;

    loop {
        // Commands first, so a pending reset lands before any buffered samples.
        tokio::select! {
            biased;

            Some(cmd) = command_rx.recv() => {
                match cmd {
                    FeedCommand::ResetInertial => {
                        pipeline.reset();
                        let _ = inertial_tx.send(pipeline.latest());
                        tracing::info!("Inertial integrator reset");
                    }
                }
            }
            result = stream.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        tracing::warn!("Sensor feed connection closed");
                        break;
                    }
                    Ok(n) => {
                        parser.push_data(&buf[..n]);

                        // Drain all available messages.
                        while let Some(result) = parser.next_message() {
                            match result {
                                Ok(FeedMessage::Sensor(event)) => {
                                    dispatch_sensor_event(&mut pipeline, &event);
                                    let _ = inertial_tx.send(pipeline.latest());
                                    sample_count += 1;
                                    if sample_count % 1000 == 0 {
                                        tracing::debug!(sample_count, "Sensor samples processed");
                                    }
                                }
                                Ok(FeedMessage::Pose(frame)) => {
                                    let _ = pose_tx.send(Some(frame));
                                }
                                Err(e) => {
                                    tracing::trace!(?e, "Skipping malformed packet");
                                }
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(?e, "Sensor feed read error");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use protocol::encode_message;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use types::{SensorEvent, SensorType, TrackingState};

    const SEC: i64 = 1_000_000_000;

    fn accel(t: i64, x: f32) -> FeedMessage {
        FeedMessage::Sensor(SensorEvent {
            timestamp_nanos: t,
            sensor: SensorType::LinearAcceleration,
            values: vec![x, 0.0, 0.0],
        })
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    async fn connected_pair(
        store: Arc<TrajectoryStore>,
    ) -> (FeedClient, tokio::net::TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (client, accepted) = tokio::join!(
            FeedClient::connect(&addr, Duration::from_secs(2), store),
            listener.accept()
        );
        (client.unwrap(), accepted.unwrap().0)
    }

    #[tokio::test]
    async fn streamed_samples_reach_the_store() {
        let store = Arc::new(TrajectoryStore::new());
        let (client, mut device) = connected_pair(store.clone()).await;

        device.write_all(&encode_message(&accel(0, 0.0))).await.unwrap();
        device.write_all(&encode_message(&accel(SEC, 1.0))).await.unwrap();

        wait_for(|| store.snapshot().inertial.len() == 2).await;
        assert_eq!(store.snapshot().inertial.last(), Vec2::new(1.0, 0.0));
        wait_for(|| client.inertial_position() == Vec2::new(1.0, 0.0)).await;
    }

    #[tokio::test]
    async fn pose_frames_are_pulled_once() {
        let store = Arc::new(TrajectoryStore::new());
        let (mut client, mut device) = connected_pair(store).await;
        assert!(client.poll_pose().is_none());

        let frame = PoseFrame::new(1, TrackingState::Tracking, Vec3::new(1.0, 0.0, 2.0));
        device
            .write_all(&encode_message(&FeedMessage::Pose(frame)))
            .await
            .unwrap();

        let mut received = None;
        for _ in 0..200 {
            received = client.poll_pose();
            if received.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(received, Some(frame));
        assert!(client.poll_pose().is_none());
    }

    #[tokio::test]
    async fn reset_command_reseeds_integrator() {
        let store = Arc::new(TrajectoryStore::new());
        let (client, mut device) = connected_pair(store.clone()).await;

        device.write_all(&encode_message(&accel(0, 0.0))).await.unwrap();
        device.write_all(&encode_message(&accel(SEC, 1.0))).await.unwrap();
        wait_for(|| client.inertial_position() == Vec2::new(1.0, 0.0)).await;

        client.reset_inertial();
        wait_for(|| client.inertial_position() == Vec2::ZERO).await;

        // First sample after reset only seeds; second integrates from rest.
        device.write_all(&encode_message(&accel(10 * SEC, 1.0))).await.unwrap();
        device.write_all(&encode_message(&accel(11 * SEC, 2.0))).await.unwrap();
        wait_for(|| client.inertial_position() == Vec2::new(2.0, 0.0)).await;
    }

    #[tokio::test]
    async fn reset_with_buffered_samples_restarts_path_from_rest() {
        let store = Arc::new(TrajectoryStore::new());
        let (mut client, mut device) = connected_pair(store.clone()).await;

        // Ten samples at 1 m/s^2, one second apart: x reaches 45.
        for i in 0..10 {
            device.write_all(&encode_message(&accel(i * SEC, 1.0))).await.unwrap();
        }
        wait_for(|| client.inertial_position() == Vec2::new(45.0, 0.0)).await;

        // Ten more queued on the socket while the reset is pending.
        let mut pending = Vec::new();
        for i in 10..20 {
            pending.extend(encode_message(&accel(i * SEC, 1.0)));
        }
        device.write_all(&pending).await.unwrap();
        client.reset_inertial();
        store.reset();

        // The marker is sent after the reset, so the reset is handled first.
        let marker = PoseFrame::new(99, TrackingState::Stopped, Vec3::ZERO);
        device
            .write_all(&encode_message(&FeedMessage::Pose(marker)))
            .await
            .unwrap();
        let mut seen = None;
        for _ in 0..200 {
            seen = client.poll_pose();
            if seen.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(seen, Some(marker));

        // Whatever survived the reset was integrated from rest: nine steps at
        // most, so x can never exceed 45.
        let snapshot = store.snapshot();
        assert_eq!(snapshot.inertial.points()[0], Vec2::ZERO);
        assert!(snapshot.inertial.len() <= 10, "{} points", snapshot.inertial.len());
        for p in snapshot.inertial.points() {
            assert!(p.x <= 45.0 + 1e-3, "stale point {p}");
        }
        assert!(client.inertial_position().x <= 45.0 + 1e-3);
    }

    #[tokio::test]
    async fn reset_publishes_zero_immediately() {
        let store = Arc::new(TrajectoryStore::new());
        let (client, mut device) = connected_pair(store.clone()).await;

        device.write_all(&encode_message(&accel(0, 0.0))).await.unwrap();
        device.write_all(&encode_message(&accel(SEC, 1.0))).await.unwrap();
        wait_for(|| client.inertial_position() == Vec2::new(1.0, 0.0)).await;

        client.reset_inertial();
        assert_eq!(client.inertial_position(), Vec2::ZERO);
        wait_for(|| store.snapshot().inertial.len() == 1).await;
    }

    #[tokio::test]
    async fn extreme_timestamps_keep_feed_alive() {
        let store = Arc::new(TrajectoryStore::new());
        let (client, mut device) = connected_pair(store.clone()).await;

        device.write_all(&encode_message(&accel(i64::MAX, 1.0))).await.unwrap();
        device.write_all(&encode_message(&accel(i64::MIN, 1.0))).await.unwrap();
        device.write_all(&encode_message(&accel(-5 * SEC, 0.0))).await.unwrap();
        wait_for(|| store.snapshot().inertial.len() == 3).await;

        // The task is still running and answers commands.
        client.reset_inertial();
        wait_for(|| store.snapshot().inertial.len() == 1).await;
        device.write_all(&encode_message(&accel(0, 0.0))).await.unwrap();
        device.write_all(&encode_message(&accel(SEC, 2.0))).await.unwrap();
        wait_for(|| client.inertial_position() == Vec2::new(2.0, 0.0)).await;
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let store = Arc::new(TrajectoryStore::new());
        let result = FeedClient::connect(&addr, Duration::from_secs(2), store).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn mock_client_produces_nothing() {
        let mut client = FeedClient::mock();
        assert!(client.poll_pose().is_none());
        assert_eq!(client.inertial_position(), Vec2::ZERO);
        client.reset_inertial();
    }
}
