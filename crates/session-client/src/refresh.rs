//! Single-flight token refresh coordination.
//!
//! ```text
//!            admit() [leader]
//!   Idle ───────────────────────► Refreshing { queue }
//!    ▲                                │   ▲
//!    │        complete(outcome)       │   │ admit() [follower]
//!    └────────────────────────────────┘   └── appended to queue
//! ```
//!
//! The leader's own waiter is the first queue entry, so every admitted request
//! (leader included) is settled by the same `complete` call, in arrival order.
//! The coordinator does not perform the refresh itself; the client runs it and
//! reports the outcome.
//!
//! Waking waiters in order does not make them run in order, so a successful
//! refresh also hands every waiter a [`ReplayTurn`]. Turn `i` opens once turn
//! `i - 1` is released, which keeps replays going out in arrival order on any
//! runtime flavor.

use crate::RefreshError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// The new access token, or why there is none.
pub type RefreshOutcome = Result<String, RefreshError>;

type Settlement = Result<Resumed, RefreshError>;

enum RefreshState {
    Idle,
    Refreshing {
        queue: Vec<oneshot::Sender<Settlement>>,
    },
}

/// A waiter's place in the replay sequence after a successful refresh.
///
/// Dropping the turn releases the next one, so a waiter that gives up never
/// stalls the rest of the queue.
#[derive(Debug)]
pub struct ReplayTurn {
    previous: Option<oneshot::Receiver<()>>,
    next: Option<oneshot::Sender<()>>,
}

impl ReplayTurn {
    fn chain(len: usize) -> Vec<ReplayTurn> {
        let mut turns = Vec::with_capacity(len);
        let mut previous = None;
        for _ in 0..len {
            let (next, opened) = oneshot::channel();
            turns.push(ReplayTurn {
                previous: previous.take(),
                next: Some(next),
            });
            previous = Some(opened);
        }
        turns
    }

    /// Wait until every earlier waiter has released its turn.
    pub async fn ready(&mut self) {
        if let Some(previous) = self.previous.as_mut() {
            // An error means the earlier turn was dropped, which also releases it.
            let _ = previous.await;
            self.previous = None;
        }
    }

    /// Let the next waiter go.
    pub fn release(&mut self) {
        if let Some(next) = self.next.take() {
            let _ = next.send(());
        }
    }
}

impl Drop for ReplayTurn {
    fn drop(&mut self) {
        self.release();
    }
}

/// What a waiter gets back from a successful refresh.
#[derive(Debug)]
pub struct Resumed {
    pub token: String,
    pub turn: ReplayTurn,
}

/// A waiter's handle on the in-flight refresh.
#[derive(Debug)]
pub struct PendingRefresh {
    receiver: oneshot::Receiver<Settlement>,
    position: usize,
}

impl PendingRefresh {
    /// Zero-based arrival position in the queue.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The new token together with this waiter's replay turn.
    pub async fn resume(self) -> Result<Resumed, RefreshError> {
        self.receiver.await.unwrap_or(Err(RefreshError::Abandoned))
    }

    /// The new token only. The replay turn is released immediately.
    pub async fn wait(self) -> RefreshOutcome {
        self.resume().await.map(|resumed| resumed.token)
    }
}

/// Result of asking to take part in a refresh.
#[derive(Debug)]
pub enum Admission {
    /// No refresh was running; the caller must start one.
    Leader(PendingRefresh),
    /// A refresh is already running; the caller only waits.
    Follower(PendingRefresh),
}

impl Admission {
    pub fn is_leader(&self) -> bool {
        matches!(self, Admission::Leader(_))
    }

    pub fn into_pending(self) -> PendingRefresh {
        match self {
            Admission::Leader(pending) | Admission::Follower(pending) => pending,
        }
    }
}

/// Owns the `Idle | Refreshing` state and the waiter queue.
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    started: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RefreshState::Idle),
            started: AtomicU64::new(0),
        }
    }

    /// Join the current refresh, or become the leader of a new one.
    ///
    /// The state check and the transition happen under one lock, so exactly
    /// one caller per refresh cycle is told it leads.
    pub fn admit(&self) -> Admission {
        let (sender, receiver) = oneshot::channel();
        let mut state = self.state.lock();
        if let RefreshState::Refreshing { queue } = &mut *state {
            let position = queue.len();
            queue.push(sender);
            debug!(position, "Queued behind in-flight refresh");
            return Admission::Follower(PendingRefresh { receiver, position });
        }

        *state = RefreshState::Refreshing {
            queue: vec![sender],
        };
        let cycle = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(cycle, "Refresh started");
        Admission::Leader(PendingRefresh {
            receiver,
            position: 0,
        })
    }

    /// Settle every waiter with `outcome`, in arrival order, and return to idle.
    ///
    /// Returns how many waiters were settled.
    pub fn complete(&self, outcome: RefreshOutcome) -> usize {
        let queue = match std::mem::replace(&mut *self.state.lock(), RefreshState::Idle) {
            RefreshState::Refreshing { queue } => queue,
            RefreshState::Idle => {
                warn!("Refresh completed while idle");
                return 0;
            }
        };

        let settled = queue.len();
        match &outcome {
            Ok(_) => debug!(settled, "Refresh succeeded, resuming queue"),
            Err(e) => debug!(settled, error = %e, "Refresh failed, rejecting queue"),
        }
        match outcome {
            Ok(token) => {
                for (waiter, turn) in queue.into_iter().zip(ReplayTurn::chain(settled)) {
                    // A dropped receiver is a caller that stopped waiting; the
                    // returned turn is dropped and so released.
                    let _ = waiter.send(Ok(Resumed {
                        token: token.clone(),
                        turn,
                    }));
                }
            }
            Err(e) => {
                for waiter in queue {
                    let _ = waiter.send(Err(e.clone()));
                }
            }
        }
        settled
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock(), RefreshState::Refreshing { .. })
    }

    /// Number of waiters in the current cycle, leader included.
    pub fn queued(&self) -> usize {
        match &*self.state.lock() {
            RefreshState::Refreshing { queue } => queue.len(),
            RefreshState::Idle => 0,
        }
    }

    /// Number of refresh cycles started so far.
    pub fn refreshes_started(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_admission_leads() {
        let coordinator = RefreshCoordinator::new();
        assert!(!coordinator.is_refreshing());

        let first = coordinator.admit();
        let second = coordinator.admit();
        assert!(first.is_leader());
        assert!(!second.is_leader());
        assert!(coordinator.is_refreshing());
        assert_eq!(coordinator.queued(), 2);
        assert_eq!(coordinator.refreshes_started(), 1);
    }

    #[tokio::test]
    async fn test_complete_settles_everyone_with_same_token() {
        let coordinator = RefreshCoordinator::new();
        let waiters: Vec<_> = (0..5).map(|_| coordinator.admit().into_pending()).collect();

        assert_eq!(coordinator.complete(Ok("t-2".to_string())), 5);
        assert!(!coordinator.is_refreshing());

        for waiter in waiters {
            assert_eq!(waiter.wait().await, Ok("t-2".to_string()));
        }
    }

    #[tokio::test]
    async fn test_failure_rejects_every_waiter() {
        let coordinator = RefreshCoordinator::new();
        let waiters: Vec<_> = (0..3).map(|_| coordinator.admit().into_pending()).collect();

        coordinator.complete(Err(RefreshError::Rejected { status: 401 }));
        for waiter in waiters {
            assert_eq!(
                waiter.wait().await,
                Err(RefreshError::Rejected { status: 401 })
            );
        }
    }

    #[test]
    fn test_positions_follow_arrival() {
        let coordinator = RefreshCoordinator::new();
        let positions: Vec<_> = (0..4)
            .map(|_| coordinator.admit().into_pending().position())
            .collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_new_cycle_after_completion() {
        let coordinator = RefreshCoordinator::new();
        let _ = coordinator.admit();
        coordinator.complete(Ok("t-1".to_string()));

        assert!(coordinator.admit().is_leader());
        assert_eq!(coordinator.refreshes_started(), 2);
    }

    #[test]
    fn test_complete_while_idle_is_noop() {
        let coordinator = RefreshCoordinator::new();
        assert_eq!(coordinator.complete(Ok("t".to_string())), 0);
    }

    #[test]
    fn test_concurrent_admissions_elect_one_leader() {
        let coordinator = std::sync::Arc::new(RefreshCoordinator::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let coordinator = coordinator.clone();
                std::thread::spawn(move || coordinator.admit())
            })
            .collect();

        let admissions: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(admissions.iter().filter(|a| a.is_leader()).count(), 1);
        assert_eq!(coordinator.queued(), 16);
    }

    #[tokio::test]
    async fn test_turns_open_in_arrival_order() {
        let coordinator = RefreshCoordinator::new();
        let first = coordinator.admit().into_pending();
        let second = coordinator.admit().into_pending();
        coordinator.complete(Ok("t-2".to_string()));

        let mut first = first.resume().await.unwrap();
        let mut second = second.resume().await.unwrap();
        assert_eq!(second.token, "t-2");

        let blocked =
            tokio::time::timeout(std::time::Duration::from_millis(20), second.turn.ready()).await;
        assert!(blocked.is_err());

        first.turn.ready().await;
        first.turn.release();
        second.turn.ready().await;
    }

    #[tokio::test]
    async fn test_dropped_turn_releases_the_next() {
        let coordinator = RefreshCoordinator::new();
        let first = coordinator.admit().into_pending();
        let second = coordinator.admit().into_pending();
        coordinator.complete(Ok("t-2".to_string()));

        drop(first);
        let mut second = second.resume().await.unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), second.turn.ready())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_coordinator_queue_reports_abandoned() {
        let coordinator = RefreshCoordinator::new();
        let waiter = coordinator.admit().into_pending();
        drop(coordinator);
        assert_eq!(waiter.wait().await, Err(RefreshError::Abandoned));
    }
}
