// src/services/proximity.rs
// DOCUMENTATION: Arrival detection for a navigated-to restaurant
// PURPOSE: One-shot proximity trigger, rating prompt and per-user session tasks

use crate::errors::FoodieError;
use crate::models::{Coordinate, Destination, VisitRating, VisitRecord};
use crate::services::geo::distance_meters;
use crate::services::visit_recorder::VisitRecorder;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

/// Arrival radius used when none is configured
pub const DEFAULT_THRESHOLD_M: f64 = 100.0;

/// Buffered position samples per session
const POSITION_BUFFER: usize = 32;
const COMMAND_BUFFER: usize = 8;

/// Sending half of a position stream
#[derive(Clone)]
pub struct PositionFeed {
    tx: mpsc::Sender<Coordinate>,
}

impl PositionFeed {
    /// Queue a sample. Returns false once the subscription has been cancelled.
    pub async fn push(&self, position: Coordinate) -> bool {
        self.tx.send(position).await.is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of a position stream
/// DOCUMENTATION: Cancelling closes the stream; cancelling twice is a no-op.
pub struct PositionSubscription {
    rx: Option<mpsc::Receiver<Coordinate>>,
}

impl PositionSubscription {
    pub fn channel(capacity: usize) -> (PositionFeed, PositionSubscription) {
        let (tx, rx) = mpsc::channel(capacity);
        (PositionFeed { tx }, PositionSubscription { rx: Some(rx) })
    }

    pub async fn next(&mut self) -> Option<Coordinate> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    pub fn cancel(&mut self) {
        if let Some(mut rx) = self.rx.take() {
            rx.close();
        }
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    Idle,
    Armed,
    Triggered,
    Resolved,
}

/// State of one armed destination
struct ProximitySession {
    destination: Destination,
    subscription: PositionSubscription,
    utc_offset: FixedOffset,
    prompted: bool,
    prompt_open: bool,
    last_distance_m: Option<f64>,
}

/// Client-facing view of a watcher
#[derive(Debug, Clone, Serialize)]
pub struct ProximitySnapshot {
    pub user_id: String,
    pub state: WatchState,
    pub destination: Option<Destination>,
    pub distance_m: Option<f64>,
    pub prompt_open: bool,
    pub visited_place_names: Vec<String>,
}

impl ProximitySnapshot {
    pub fn idle(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            state: WatchState::Idle,
            destination: None,
            distance_m: None,
            prompt_open: false,
            visited_place_names: Vec::new(),
        }
    }
}

fn sorted(names: &HashSet<String>) -> Vec<String> {
    let mut names: Vec<String> = names.iter().cloned().collect();
    names.sort();
    names
}

/// Proximity watcher
/// DOCUMENTATION: Idle -> Armed -> Triggered -> Resolved. The trigger fires at
/// most once per armed session; Triggered never goes back to Armed.
pub struct ProximityWatcher {
    user_id: String,
    threshold_m: f64,
    recorder: Arc<dyn VisitRecorder>,
    state: WatchState,
    session: Option<ProximitySession>,
    /// Places rated in the current session; reset on every arm
    visited_place_names: HashSet<String>,
}

impl ProximityWatcher {
    pub fn new(user_id: impl Into<String>, recorder: Arc<dyn VisitRecorder>, threshold_m: f64) -> Self {
        Self {
            user_id: user_id.into(),
            threshold_m,
            recorder,
            state: WatchState::Idle,
            session: None,
            visited_place_names: HashSet::new(),
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.session
            .as_ref()
            .map_or(false, |s| s.subscription.is_active())
    }

    /// Next sample of the armed session; None when there is nothing to listen to
    pub async fn next_fix(&mut self) -> Option<Coordinate> {
        match self.session.as_mut() {
            Some(session) => session.subscription.next().await,
            None => None,
        }
    }

    /// Start watching a destination, replacing any previous session
    pub fn arm(
        &mut self,
        destination: Destination,
        subscription: PositionSubscription,
        utc_offset: FixedOffset,
    ) {
        self.clear_route();
        self.visited_place_names.clear();

        log::info!(
            "Proximity armed for {}: '{}' at ({}, {})",
            self.user_id,
            destination.name,
            destination.position.lat,
            destination.position.lng
        );

        self.session = Some(ProximitySession {
            destination,
            subscription,
            utc_offset,
            prompted: false,
            prompt_open: false,
            last_distance_m: None,
        });
        self.state = WatchState::Armed;
    }

    /// Handle one position sample.
    /// Returns true iff this sample moved the watcher from Armed to Triggered.
    pub async fn on_position(&mut self, fix: Coordinate, now: DateTime<Utc>) -> bool {
        let threshold_m = self.threshold_m;
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        let distance = distance_meters(fix, session.destination.position);
        session.last_distance_m = Some(distance);

        if self.state != WatchState::Armed
            || session.prompted
            || !session.destination.is_named()
            || distance >= threshold_m
        {
            return false;
        }

        session.prompted = true;
        self.state = WatchState::Triggered;

        let place_name = session.destination.name.clone();
        let utc_offset = session.utc_offset;

        log::info!(
            "{} arrived at '{}' ({:.1} m)",
            self.user_id,
            place_name,
            distance
        );

        if self.already_visited(&place_name, now, utc_offset).await {
            log::info!("'{}' already rated today by {}; no prompt", place_name, self.user_id);
            self.resolve();
        } else if let Some(session) = self.session.as_mut() {
            session.prompt_open = true;
        }

        true
    }

    async fn already_visited(
        &self,
        place_name: &str,
        now: DateTime<Utc>,
        utc_offset: FixedOffset,
    ) -> bool {
        if self.visited_place_names.contains(place_name) {
            return true;
        }

        match self
            .recorder
            .has_visited_today(&self.user_id, place_name, now, utc_offset)
            .await
        {
            Ok(visited) => visited,
            Err(e) => {
                log::warn!(
                    "Visit history check failed for {}; allowing a rating: {}",
                    self.user_id,
                    e
                );
                false
            }
        }
    }

    /// Record the user's decision for the open prompt.
    /// A failed write leaves the prompt open so the same submission can be retried.
    pub async fn submit_rating(
        &mut self,
        rating: VisitRating,
        now: DateTime<Utc>,
    ) -> Result<VisitRecord, FoodieError> {
        if !rating.is_decision() {
            return Err(FoodieError::ValidationError(
                "rating must be liked (1) or disliked (0)".to_string(),
            ));
        }

        let session = match self.session.as_ref() {
            Some(session) if self.state == WatchState::Triggered && session.prompt_open => session,
            _ => {
                return Err(FoodieError::InvalidState(
                    "no rating prompt is open".to_string(),
                ))
            }
        };

        let visit = VisitRecord::for_destination(&self.user_id, &session.destination, rating, now);
        self.recorder.record(visit.clone()).await?;

        log::info!(
            "{} rated '{}': {:?}",
            self.user_id,
            visit.place_name,
            rating
        );

        self.visited_place_names.insert(visit.place_name.clone());
        self.resolve();
        Ok(visit)
    }

    /// Close the open prompt without rating
    pub fn dismiss(&mut self) -> Result<(), FoodieError> {
        let prompt_open = self.session.as_ref().map_or(false, |s| s.prompt_open);
        if self.state != WatchState::Triggered || !prompt_open {
            return Err(FoodieError::InvalidState(
                "no rating prompt is open".to_string(),
            ));
        }
        self.resolve();
        Ok(())
    }

    /// Tear everything down and go back to Idle. Safe to call in any state.
    pub fn clear_route(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.subscription.cancel();
            log::debug!("Proximity session cleared for {}", self.user_id);
        }
        self.state = WatchState::Idle;
    }

    fn resolve(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.prompt_open = false;
            session.subscription.cancel();
        }
        self.state = WatchState::Resolved;
    }

    pub fn snapshot(&self) -> ProximitySnapshot {
        ProximitySnapshot {
            user_id: self.user_id.clone(),
            state: self.state,
            destination: self.session.as_ref().map(|s| s.destination.clone()),
            distance_m: self.session.as_ref().and_then(|s| s.last_distance_m),
            prompt_open: self.session.as_ref().map_or(false, |s| s.prompt_open),
            visited_place_names: sorted(&self.visited_place_names),
        }
    }
}

/// Control messages for a session task
enum Command {
    Submit {
        rating: VisitRating,
        reply: oneshot::Sender<Result<VisitRecord, FoodieError>>,
    },
    Dismiss {
        reply: oneshot::Sender<Result<ProximitySnapshot, FoodieError>>,
    },
    Snapshot {
        reply: oneshot::Sender<ProximitySnapshot>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
}

/// Session task loop
/// DOCUMENTATION: Owns the watcher and handles one event at a time. Position
/// samples are polled first so a sample queued before a command is seen first.
async fn run_session(mut watcher: ProximityWatcher, mut commands: mpsc::Receiver<Command>) {
    loop {
        tokio::select! {
            biased;

            Some(fix) = watcher.next_fix(), if watcher.is_listening() => {
                watcher.on_position(fix, Utc::now()).await;
            }

            command = commands.recv() => match command {
                Some(Command::Submit { rating, reply }) => {
                    let _ = reply.send(watcher.submit_rating(rating, Utc::now()).await);
                }
                Some(Command::Dismiss { reply }) => {
                    let result = watcher.dismiss().map(|_| watcher.snapshot());
                    let _ = reply.send(result);
                }
                Some(Command::Snapshot { reply }) => {
                    let _ = reply.send(watcher.snapshot());
                }
                Some(Command::Clear { reply }) => {
                    watcher.clear_route();
                    let _ = reply.send(());
                    return;
                }
                None => {
                    watcher.clear_route();
                    return;
                }
            }
        }
    }
}

struct SessionHandle {
    feed: PositionFeed,
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Stop the task once it has finished its current event
    async fn shut_down(self) {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::Clear { reply }).await.is_ok() {
            let _ = response.await;
        }
        let _ = self.task.await;
    }
}

/// Per-user proximity sessions
/// DOCUMENTATION: At most one session per user. Arming a new destination
/// clears the previous session first. The map lock is never held while a
/// session task is being stopped.
pub struct ProximityRegistry {
    recorder: Arc<dyn VisitRecorder>,
    threshold_m: f64,
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

fn no_session(user_id: &str) -> FoodieError {
    FoodieError::InvalidState(format!("No armed destination for {}", user_id))
}

impl ProximityRegistry {
    pub fn new(recorder: Arc<dyn VisitRecorder>, threshold_m: f64) -> Self {
        Self {
            recorder,
            threshold_m,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Arm `destination` for `user_id` and feed the starting fix
    pub async fn arm(
        &self,
        user_id: &str,
        destination: Destination,
        initial_fix: Coordinate,
        utc_offset: FixedOffset,
    ) -> Result<ProximitySnapshot, FoodieError> {
        let previous = self.sessions.lock().await.remove(user_id);
        if let Some(previous) = previous {
            log::info!("Replacing proximity session for {}", user_id);
            previous.shut_down().await;
        }

        let (feed, subscription) = PositionSubscription::channel(POSITION_BUFFER);
        let mut watcher = ProximityWatcher::new(user_id, self.recorder.clone(), self.threshold_m);
        watcher.arm(destination, subscription, utc_offset);

        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(run_session(watcher, command_rx));

        let handle = SessionHandle {
            feed: feed.clone(),
            commands,
            task,
        };
        // A concurrent arm for the same user may have landed in between
        let displaced = self.sessions.lock().await.insert(user_id.to_string(), handle);
        if let Some(displaced) = displaced {
            displaced.shut_down().await;
        }

        feed.push(initial_fix).await;
        self.snapshot(user_id).await
    }

    async fn session_parts(&self, user_id: &str) -> Option<(PositionFeed, mpsc::Sender<Command>)> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(user_id)
            .map(|s| (s.feed.clone(), s.commands.clone()))
    }

    async fn request<T>(
        &self,
        user_id: &str,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, FoodieError> {
        let (_, commands) = self
            .session_parts(user_id)
            .await
            .ok_or_else(|| no_session(user_id))?;

        let (reply, response) = oneshot::channel();
        commands
            .send(build(reply))
            .await
            .map_err(|_| no_session(user_id))?;
        response.await.map_err(|_| no_session(user_id))
    }

    /// Feed a position sample, then report the resulting state
    pub async fn report_position(
        &self,
        user_id: &str,
        position: Coordinate,
    ) -> Result<ProximitySnapshot, FoodieError> {
        let (feed, _) = self
            .session_parts(user_id)
            .await
            .ok_or_else(|| no_session(user_id))?;

        if !feed.push(position).await {
            log::debug!("Sample for {} ignored; session no longer listening", user_id);
        }
        self.snapshot(user_id).await
    }

    pub async fn submit_rating(
        &self,
        user_id: &str,
        rating: VisitRating,
    ) -> Result<VisitRecord, FoodieError> {
        self.request(user_id, |reply| Command::Submit { rating, reply })
            .await?
    }

    pub async fn dismiss(&self, user_id: &str) -> Result<ProximitySnapshot, FoodieError> {
        self.request(user_id, |reply| Command::Dismiss { reply }).await?
    }

    /// Current state; users without a session are Idle
    pub async fn snapshot(&self, user_id: &str) -> Result<ProximitySnapshot, FoodieError> {
        match self.request(user_id, |reply| Command::Snapshot { reply }).await {
            Ok(snapshot) => Ok(snapshot),
            Err(_) => Ok(ProximitySnapshot::idle(user_id)),
        }
    }

    /// Drop the user's session. Idempotent.
    pub async fn clear(&self, user_id: &str) -> ProximitySnapshot {
        let previous = self.sessions.lock().await.remove(user_id);
        if let Some(previous) = previous {
            previous.shut_down().await;
        }
        ProximitySnapshot::idle(user_id)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
