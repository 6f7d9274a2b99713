//! Event-loop driver tying the gateway to the selection machine.
//!
//! [`RiskMap`] is owned by a single task. Gateway calls run as spawned
//! tasks that never touch map state: each posts a [`Completion`] to a
//! channel, and the owner applies completions one at a time through
//! [`RiskMap::next_event`]. All mutation therefore happens on the owner's
//! turn, and token gating in the machine is the only ordering rule
//! needed.
//!
//! The current prediction and heatmap tasks are also watched directly: a
//! task that ends without posting (it panicked) is turned into a failed
//! completion so the map never waits on it forever.

use std::sync::Arc;

use road_risk_gateway::{GatewayError, RiskGateway};
use road_risk_models::{
    Coordinate, GridSize, HeatmapPoint, InvalidCoordinateError, PredictionResult, SeverityBucket,
};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use crate::machine::{
    Failure, RequestToken, SelectionMachine, SelectionState, StaleResult, Transition,
};
use crate::notify::{Notification, NotificationLevel, Notifications};
use crate::surface::{MapSurface, Scene};
use crate::view::{self, ViewState};
use crate::{CancelPolicy, MapConfig};

/// Result of a gateway call, posted back to the owning task.
enum Completion {
    Prediction {
        token: RequestToken,
        result: Result<PredictionResult, GatewayError>,
    },
    Heatmap {
        generation: u64,
        result: Result<Vec<HeatmapPoint>, GatewayError>,
    },
}

/// What applying one completion did.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The current selection resolved.
    PredictionResolved {
        /// Request that resolved.
        token: RequestToken,
    },
    /// The current selection failed.
    PredictionFailed {
        /// Request that failed.
        token: RequestToken,
        /// Cause.
        failure: Failure,
    },
    /// A superseded reply was dropped.
    PredictionDiscarded(StaleResult),
    /// The heatmap point set was replaced.
    HeatmapLoaded {
        /// Number of points now held.
        points: usize,
    },
    /// The heatmap fetch failed; the previous point set is kept.
    HeatmapFailed {
        /// Human-readable cause.
        message: String,
    },
    /// A superseded heatmap reply was dropped.
    HeatmapDiscarded {
        /// Generation the reply belonged to.
        generation: u64,
    },
}

/// Interactive risk map controller.
pub struct RiskMap {
    gateway: Arc<dyn RiskGateway>,
    cancel_policy: CancelPolicy,
    grid_size: GridSize,
    surface: MapSurface,
    machine: SelectionMachine,
    prediction_task: Option<(RequestToken, JoinHandle<()>)>,
    heatmap: Vec<HeatmapPoint>,
    heatmap_generation: u64,
    heatmap_loading: bool,
    heatmap_task: Option<(u64, JoinHandle<()>)>,
    show_heatmap: bool,
    bucket: SeverityBucket,
    notifications: Notifications,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl RiskMap {
    /// Creates an idle map with an empty heatmap.
    #[must_use]
    pub fn new(gateway: Arc<dyn RiskGateway>, config: &MapConfig) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        Self {
            gateway,
            cancel_policy: config.cancel_policy,
            grid_size: config.grid_size,
            surface: MapSurface::new(config),
            machine: SelectionMachine::new(),
            prediction_task: None,
            heatmap: Vec::new(),
            heatmap_generation: 0,
            heatmap_loading: false,
            heatmap_task: None,
            show_heatmap: true,
            bucket: SeverityBucket::All,
            notifications: Notifications::default(),
            completions_tx,
            completions_rx,
        }
    }

    /// Handles a raw click on the map surface.
    ///
    /// The click is captured as a [`Coordinate`] by
    /// [`MapSurface::on_click`] and forwarded to [`Self::select`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] for an out-of-range click; the
    /// selection is left unchanged and nothing is requested.
    pub fn click(
        &mut self,
        latitude: f64,
        longitude: f64,
    ) -> Result<RequestToken, InvalidCoordinateError> {
        let coordinate = MapSurface::on_click(latitude, longitude)?;
        Ok(self.select(coordinate))
    }

    /// Makes `coordinate` the current selection and
    /// requests its prediction in the background.
    ///
    /// Returns immediately; the reply is applied by a later
    /// [`Self::next_event`]. Must be called within a Tokio runtime.
    pub fn select(&mut self, coordinate: Coordinate) -> RequestToken {
        let token = self.machine.select(coordinate);

        let gateway = Arc::clone(&self.gateway);
        let tx = self.completions_tx.clone();
        let task = tokio::spawn(async move {
            let result = gateway.fetch_prediction(coordinate).await;
            // A closed channel means the map was dropped.
            let _ = tx.send(Completion::Prediction { token, result });
        });

        if let Some((_, previous)) = self.prediction_task.replace((token, task)) {
            self.supersede(&previous, "prediction");
        }

        token
    }

    /// Starts (or restarts) the clustered heatmap fetch. A reload
    /// supersedes any fetch still in flight.
    pub fn load_heatmap(&mut self, grid_size: GridSize) {
        self.heatmap_generation += 1;
        self.heatmap_loading = true;
        self.grid_size = grid_size;

        let generation = self.heatmap_generation;
        let gateway = Arc::clone(&self.gateway);
        let tx = self.completions_tx.clone();
        let task = tokio::spawn(async move {
            let result = gateway.fetch_clustered_heatmap(grid_size).await;
            let _ = tx.send(Completion::Heatmap { generation, result });
        });

        log::debug!("Loading heatmap (generation {generation}, grid size {grid_size})");

        if let Some((_, previous)) = self.heatmap_task.replace((generation, task)) {
            self.supersede(&previous, "heatmap");
        }
    }

    fn supersede(&self, task: &JoinHandle<()>, what: &str) {
        match self.cancel_policy {
            CancelPolicy::AbortSuperseded => {
                log::debug!("Aborting superseded {what} request");
                task.abort();
            }
            CancelPolicy::LetRun => {}
        }
    }

    /// Waits for the next gateway reply and applies it.
    ///
    /// Pends until some request completes; check
    /// [`Self::has_pending_work`] first if nothing may be in flight.
    pub async fn next_event(&mut self) -> Option<MapEvent> {
        loop {
            let lost = tokio::select! {
                biased;
                completion = self.completions_rx.recv() => {
                    return Some(self.apply(completion?));
                }
                joined = join(&mut self.prediction_task) => self.lost_prediction(joined),
                joined = join(&mut self.heatmap_task) => self.lost_heatmap(joined),
            };

            if let Some(completion) = lost {
                return Some(self.apply(completion));
            }
        }
    }

    /// Reaps the finished prediction task. Its reply is already queued
    /// unless the task panicked.
    fn lost_prediction(&mut self, joined: Result<(), JoinError>) -> Option<Completion> {
        let (token, _) = self.prediction_task.take()?;
        let e = joined.err()?;
        log::error!("Prediction task {token} ended without a reply: {e}");

        Some(Completion::Prediction {
            token,
            result: Err(GatewayError::Network {
                message: format!("request task ended unexpectedly ({e})"),
            }),
        })
    }

    fn lost_heatmap(&mut self, joined: Result<(), JoinError>) -> Option<Completion> {
        let (generation, _) = self.heatmap_task.take()?;
        let e = joined.err()?;
        log::error!("Heatmap task (generation {generation}) ended without a reply: {e}");

        Some(Completion::Heatmap {
            generation,
            result: Err(GatewayError::Network {
                message: format!("request task ended unexpectedly ({e})"),
            }),
        })
    }

    /// Applies a reply if one is already waiting.
    pub fn try_next_event(&mut self) -> Option<MapEvent> {
        let completion = self.completions_rx.try_recv().ok()?;
        Some(self.apply(completion))
    }

    /// Processes replies until neither the current selection nor the
    /// heatmap is waiting on the network.
    pub async fn settle(&mut self) -> Vec<MapEvent> {
        let mut events = Vec::new();
        while self.has_pending_work() {
            let Some(event) = self.next_event().await else {
                break;
            };
            events.push(event);
        }
        events
    }

    /// Whether the current selection or the heatmap is in flight.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        self.heatmap_loading || matches!(self.machine.state(), SelectionState::Selecting { .. })
    }

    fn apply(&mut self, completion: Completion) -> MapEvent {
        match completion {
            Completion::Prediction { token, result } => {
                match self.machine.complete(token, result) {
                    Ok(Transition::Resolved) => {
                        self.prediction_task = None;
                        log::info!("Prediction {token} resolved");
                        self.notifications
                            .push(NotificationLevel::Success, "Risk prediction completed!");
                        MapEvent::PredictionResolved { token }
                    }
                    Ok(Transition::Failed(failure)) => {
                        self.prediction_task = None;
                        log::warn!("Prediction {token} failed: {}", failure.message);
                        self.notifications.push(
                            NotificationLevel::Error,
                            "Failed to predict risk for this location",
                        );
                        MapEvent::PredictionFailed { token, failure }
                    }
                    Err(stale) => {
                        log::debug!("{stale}");
                        MapEvent::PredictionDiscarded(stale)
                    }
                }
            }
            Completion::Heatmap { generation, .. } if generation != self.heatmap_generation => {
                log::debug!(
                    "Discarded heatmap generation {generation} (current {})",
                    self.heatmap_generation
                );
                MapEvent::HeatmapDiscarded { generation }
            }
            Completion::Heatmap { result, .. } => {
                self.heatmap_loading = false;
                self.heatmap_task = None;
                match result {
                    Ok(points) => {
                        log::info!("Loaded {} heatmap points", points.len());
                        self.heatmap = points;
                        self.notifications
                            .push(NotificationLevel::Success, "Heatmap loaded successfully!");
                        MapEvent::HeatmapLoaded {
                            points: self.heatmap.len(),
                        }
                    }
                    Err(e) => {
                        log::warn!("Error loading heatmap: {e}");
                        self.notifications
                            .push(NotificationLevel::Error, "Failed to load heatmap data");
                        MapEvent::HeatmapFailed {
                            message: e.user_message(),
                        }
                    }
                }
            }
        }
    }

    /// Closes the report or failure message. No-op (returns `false`)
    /// unless the selection is resolved or failed.
    pub fn dismiss(&mut self) -> bool {
        self.machine.dismiss()
    }

    /// Collapses the report without discarding it.
    pub fn minimize(&mut self) -> bool {
        self.machine.minimize()
    }

    /// Re-expands a minimized report.
    pub fn restore(&mut self) -> bool {
        self.machine.restore()
    }

    /// Selects which severity bucket of heatmap points is shown.
    pub fn set_severity_bucket(&mut self, bucket: SeverityBucket) {
        log::debug!("Severity filter: {bucket}");
        self.bucket = bucket;
    }

    /// Shows or hides the heatmap layer.
    pub fn set_heatmap_visible(&mut self, visible: bool) {
        self.show_heatmap = visible;
    }

    /// Active severity filter.
    #[must_use]
    pub const fn severity_bucket(&self) -> SeverityBucket {
        self.bucket
    }

    /// Whether the heatmap layer is shown.
    #[must_use]
    pub const fn heatmap_visible(&self) -> bool {
        self.show_heatmap
    }

    /// Whether the heatmap fetch is in flight.
    #[must_use]
    pub const fn heatmap_loading(&self) -> bool {
        self.heatmap_loading
    }

    /// Grid size of the most recent heatmap load.
    #[must_use]
    pub const fn grid_size(&self) -> GridSize {
        self.grid_size
    }

    /// Every loaded heatmap point, unfiltered.
    #[must_use]
    pub fn heatmap_points(&self) -> &[HeatmapPoint] {
        &self.heatmap
    }

    /// Current selection state.
    #[must_use]
    pub const fn state(&self) -> &SelectionState {
        self.machine.state()
    }

    /// Map configuration and icons.
    #[must_use]
    pub const fn surface(&self) -> &MapSurface {
        &self.surface
    }

    /// Panel layout for the current state.
    #[must_use]
    pub fn view(&self) -> ViewState {
        view::derive(self.machine.state(), self.bucket, self.show_heatmap)
    }

    /// Map content for the current state.
    #[must_use]
    pub fn scene(&self) -> Scene {
        self.surface
            .render(&self.heatmap, self.bucket, self.show_heatmap, self.machine.state())
    }

    /// Pending notifications, oldest first.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    /// Removes and returns every pending notification.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.take()
    }

    /// Dismisses one notification.
    pub fn dismiss_notification(&mut self, id: u64) -> bool {
        self.notifications.dismiss(id)
    }
}

/// Resolves when the watched task finishes; pends forever if there is none.
async fn join<T>(task: &mut Option<(T, JoinHandle<()>)>) -> Result<(), JoinError> {
    match task {
        Some((_, handle)) => handle.await,
        None => std::future::pending().await,
    }
}

impl Drop for RiskMap {
    fn drop(&mut self) {
        if let Some((_, task)) = self.prediction_task.take() {
            task.abort();
        }
        if let Some((_, task)) = self.heatmap_task.take() {
            task.abort();
        }
    }
}
