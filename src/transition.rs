//! Two-phase scene transitions.
//!
//! A transition builds a [`PendingScene`], waits until the host reports it
//! ready, then commits it in a single swap that hands back every handle the
//! caller must dispose. Nothing in [`AppStatus`] changes before the commit,
//! so a failed build or load leaves the previous scene active.
//!
//! The machine is generic over the scene handle so the ordering rules can be
//! exercised without an ECS world.

use std::time::Duration;

use thiserror::Error;

use crate::app_state::GameState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceLoadReason {
    #[error("asset failed to load: {0}")]
    Failed(String),
    #[error("not ready after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no transition from {from:?} to {to:?}")]
    InvalidTransition { from: GameState, to: GameState },
    #[error("transition to {in_flight:?} already in progress")]
    Busy { in_flight: GameState },
    #[error("scene for {target:?} did not load: {reason}")]
    ResourceLoad {
        target: GameState,
        reason: ResourceLoadReason,
    },
    #[error("could not build scene for {target:?}: {reason}")]
    Build { target: GameState, reason: String },
}

/// The committed scene and the state it was built for.
#[derive(Debug)]
pub struct AppStatus<H> {
    active: H,
    state: GameState,
}

impl<H> AppStatus<H> {
    pub fn active(&self) -> &H {
        &self.active
    }

    pub fn state(&self) -> GameState {
        self.state
    }
}

/// A fully built scene that has not been activated yet.
#[derive(Debug)]
pub struct PendingScene<H> {
    handle: H,
    target: GameState,
}

impl<H> PendingScene<H> {
    pub fn new(handle: H, target: GameState) -> Self {
        Self { handle, target }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn target(&self) -> GameState {
        self.target
    }

    pub fn into_handle(self) -> H {
        self.handle
    }
}

/// A pending scene the machine refused, returned so the caller can dispose it.
#[derive(Debug)]
pub struct Rejected<H> {
    pub pending: PendingScene<H>,
    pub error: TransitionError,
}

/// Load status of the in-flight scene as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Loading,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Idle,
    Waiting,
    Commit,
    Abort(TransitionError),
}

/// Result of a commit: the new state and every handle that is no longer live.
#[derive(Debug)]
pub struct Committed<H> {
    pub state: GameState,
    pub dispose: Vec<H>,
}

#[derive(Debug)]
struct InFlight<H> {
    pending: PendingScene<H>,
    started: Duration,
}

#[derive(Debug)]
pub struct SceneStateMachine<H> {
    status: Option<AppStatus<H>>,
    in_flight: Option<InFlight<H>>,
    preloaded: Option<PendingScene<H>>,
    timeout: Duration,
}

impl<H> SceneStateMachine<H> {
    pub fn new(timeout: Duration) -> Self {
        Self {
            status: None,
            in_flight: None,
            preloaded: None,
            timeout,
        }
    }

    pub fn status(&self) -> Option<&AppStatus<H>> {
        self.status.as_ref()
    }

    /// Committed state; `Loading` until the first commit.
    pub fn state(&self) -> GameState {
        self.status
            .as_ref()
            .map(AppStatus::state)
            .unwrap_or(GameState::Loading)
    }

    pub fn active(&self) -> Option<&H> {
        self.status.as_ref().map(AppStatus::active)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight_target(&self) -> Option<GameState> {
        self.in_flight.as_ref().map(|f| f.pending.target)
    }

    pub fn in_flight_handle(&self) -> Option<&H> {
        self.in_flight.as_ref().map(|f| &f.pending.handle)
    }

    pub fn preloaded(&self) -> Option<&PendingScene<H>> {
        self.preloaded.as_ref()
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Check that `target` can be entered from the committed state right now.
    pub fn validate(&self, target: GameState) -> Result<(), TransitionError> {
        if let Some(in_flight) = self.in_flight_target() {
            return Err(TransitionError::Busy { in_flight });
        }
        let from = self.state();
        if !from.allows(target) {
            return Err(TransitionError::InvalidTransition { from, to: target });
        }
        Ok(())
    }

    /// Record a built scene as the in-flight transition.
    pub fn stage(&mut self, pending: PendingScene<H>, now: Duration) -> Result<(), Rejected<H>> {
        if let Err(error) = self.validate(pending.target) {
            return Err(Rejected { pending, error });
        }
        self.in_flight = Some(InFlight {
            pending,
            started: now,
        });
        Ok(())
    }

    /// Decide what to do with the in-flight transition this frame.
    pub fn poll(&self, readiness: Readiness, now: Duration) -> Step {
        let Some(in_flight) = &self.in_flight else {
            return Step::Idle;
        };
        let target = in_flight.pending.target;
        match readiness {
            Readiness::Ready => Step::Commit,
            Readiness::Failed(reason) => Step::Abort(TransitionError::ResourceLoad {
                target,
                reason: ResourceLoadReason::Failed(reason),
            }),
            Readiness::Loading => {
                let waited = now.saturating_sub(in_flight.started);
                if waited >= self.timeout {
                    Step::Abort(TransitionError::ResourceLoad {
                        target,
                        reason: ResourceLoadReason::Timeout(waited),
                    })
                } else {
                    Step::Waiting
                }
            }
        }
    }

    /// Swap the in-flight scene in. Returns `None` when nothing is in flight.
    pub fn commit(&mut self) -> Option<Committed<H>> {
        let InFlight { pending, .. } = self.in_flight.take()?;
        let state = pending.target;
        let mut dispose = Vec::new();

        let previous = self.status.replace(AppStatus {
            active: pending.handle,
            state,
        });
        if let Some(previous) = previous {
            dispose.push(previous.active);
        }
        // A preload only lives while the level select screen is up.
        if state != GameState::SoloMenu
            && let Some(stale) = self.preloaded.take()
        {
            dispose.push(stale.handle);
        }

        Some(Committed { state, dispose })
    }

    /// Drop the in-flight transition, returning its handle for disposal.
    pub fn abort(&mut self) -> Option<H> {
        self.in_flight.take().map(|f| f.pending.handle)
    }

    /// Keep a built gameplay scene around without activating it. Returns the
    /// handle of a preload it replaced.
    pub fn preload(&mut self, pending: PendingScene<H>) -> Result<Option<H>, Rejected<H>> {
        if !pending.target.is_gameplay() {
            let error = TransitionError::InvalidTransition {
                from: self.state(),
                to: pending.target,
            };
            return Err(Rejected { pending, error });
        }
        if let Err(error) = self.validate(pending.target) {
            return Err(Rejected { pending, error });
        }
        Ok(self.preloaded.replace(pending).map(|p| p.handle))
    }

    pub fn discard_preload(&mut self) -> Option<H> {
        self.preloaded.take().map(|p| p.handle)
    }

    /// Hand the preloaded scene over for activation as `target`.
    pub fn take_preload(&mut self, target: GameState) -> Option<PendingScene<H>> {
        self.preloaded.take().map(|mut p| {
            p.target = target;
            p
        })
    }
}
