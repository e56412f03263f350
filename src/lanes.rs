// ABOUTME: Execution lanes: dedicated single-threaded runtimes that requests and client work are pinned to
// ABOUTME: Provides round-robin lane selection, lane identity, task spawning and orderly shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 mongodb-axum contributors

//! # Execution Lanes
//!
//! A [`LaneGroup`] owns a fixed number of OS threads, each driving its own
//! current-thread Tokio runtime. An [`ExecutionLane`] is a cheap handle to one
//! of those runtimes. Work spawned on a lane is polled only by that lane's
//! thread, so a request pinned to a lane and every client operation bound to
//! the same lane complete on the same thread.

use crate::errors::LaneError;
use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::io;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::thread;
use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT_LANE: Cell<Option<LaneId>> = const { Cell::new(None) };
}

/// Identity of a lane: the group it belongs to and its position in the group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneId {
    group: u64,
    index: usize,
}

impl LaneId {
    /// Group this lane belongs to
    #[must_use]
    pub const fn group(self) -> u64 {
        self.group
    }

    /// Position of the lane within its group
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.index)
    }
}

/// Handle to one execution lane
///
/// Two handles are equal when they refer to the same lane.
#[derive(Clone)]
pub struct ExecutionLane {
    id: LaneId,
    handle: Handle,
}

impl ExecutionLane {
    /// Identity of this lane
    #[must_use]
    pub const fn id(&self) -> LaneId {
        self.id
    }

    /// Position of this lane within its group
    #[must_use]
    pub const fn index(&self) -> usize {
        self.id.index
    }

    /// Lane whose thread is executing the caller, if any
    #[must_use]
    pub fn current() -> Option<LaneId> {
        CURRENT_LANE.with(Cell::get)
    }

    /// Whether the caller is running on this lane's thread
    #[must_use]
    pub fn is_current(&self) -> bool {
        Self::current() == Some(self.id)
    }

    /// Run `future` to completion on this lane
    ///
    /// The returned [`LaneTask`] resolves to the future's output, or to a
    /// [`LaneError`] when the lane has shut down or the future panicked.
    pub fn spawn<F>(&self, future: F) -> LaneTask<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        LaneTask {
            lane: self.id,
            handle: self.handle.spawn(future),
        }
    }
}

impl PartialEq for ExecutionLane {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ExecutionLane {}

impl fmt::Debug for ExecutionLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionLane").field("id", &self.id).finish()
    }
}

/// Future of a task spawned with [`ExecutionLane::spawn`]
#[derive(Debug)]
pub struct LaneTask<T> {
    lane: LaneId,
    handle: JoinHandle<T>,
}

impl<T> LaneTask<T> {
    /// Lane the task runs on
    #[must_use]
    pub const fn lane(&self) -> LaneId {
        self.lane
    }

    /// Cancel the task
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Cancel the task if the returned future is dropped before it completes
    #[must_use]
    pub fn abort_on_drop(self) -> AbortOnDrop<T> {
        AbortOnDrop { task: self }
    }
}

/// A [`LaneTask`] that cancels its task when dropped
///
/// Lets a caller's cancellation reach work it handed to a lane.
#[derive(Debug)]
pub struct AbortOnDrop<T> {
    task: LaneTask<T>,
}

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, LaneError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().task).poll(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        // No-op once the task has finished
        self.task.abort();
    }
}

impl<T> Future for LaneTask<T> {
    type Output = Result<T, LaneError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let lane = this.lane;
        Pin::new(&mut this.handle)
            .poll(cx)
            .map(|result| result.map_err(|error| lane_error(lane, &error)))
    }
}

fn lane_error(lane: LaneId, error: &JoinError) -> LaneError {
    if error.is_panic() {
        LaneError::Panicked(lane)
    } else {
        LaneError::ShutDown(lane)
    }
}

struct LaneWorker {
    shutdown: oneshot::Sender<()>,
    thread: thread::JoinHandle<()>,
}

struct LaneGroupInner {
    id: u64,
    lanes: Vec<ExecutionLane>,
    next: AtomicUsize,
    workers: Mutex<Vec<LaneWorker>>,
}

impl Drop for LaneGroupInner {
    fn drop(&mut self) {
        let workers = std::mem::take(
            self.workers
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for worker in workers {
            // Threads exit on their own once signalled; they are not joined here
            let _ = worker.shutdown.send(());
        }
    }
}

/// A fixed set of execution lanes
///
/// Cloning is cheap and shares the lanes. Lanes stop when [`shutdown`] is
/// called or the last clone is dropped.
///
/// [`shutdown`]: LaneGroup::shutdown
#[derive(Clone)]
pub struct LaneGroup {
    inner: Arc<LaneGroupInner>,
}

impl LaneGroup {
    /// Start `count` lanes (at least one)
    ///
    /// # Errors
    ///
    /// Returns an error if a runtime or its thread cannot be created
    pub fn new(count: usize) -> io::Result<Self> {
        let count = count.max(1);
        let group = NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed);
        let mut lanes = Vec::with_capacity(count);
        let mut workers = Vec::with_capacity(count);

        for index in 0..count {
            let id = LaneId { group, index };
            let runtime = Builder::new_current_thread().enable_all().build()?;
            let handle = runtime.handle().clone();
            let (shutdown, stopped) = oneshot::channel::<()>();

            let thread = thread::Builder::new()
                .name(format!("lane-{index}"))
                .spawn(move || {
                    CURRENT_LANE.with(|current| current.set(Some(id)));
                    runtime.block_on(async {
                        // A dropped sender also stops the lane
                        let _ = stopped.await;
                    });
                    drop(runtime);
                    debug!(lane = %id, "execution lane stopped");
                })?;

            lanes.push(ExecutionLane { id, handle });
            workers.push(LaneWorker { shutdown, thread });
        }

        info!(group, lanes = count, "started execution lanes");

        Ok(Self {
            inner: Arc::new(LaneGroupInner {
                id: group,
                lanes,
                next: AtomicUsize::new(0),
                workers: Mutex::new(workers),
            }),
        })
    }

    /// Start one lane per available CPU
    ///
    /// # Errors
    ///
    /// Returns an error if a runtime or its thread cannot be created
    pub fn with_available_parallelism() -> io::Result<Self> {
        Self::new(available_parallelism())
    }

    /// Group identifier shared by all its [`LaneId`]s
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Number of lanes
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lanes.len()
    }

    /// Always false: a group has at least one lane
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lanes.is_empty()
    }

    /// All lanes in index order
    #[must_use]
    pub fn lanes(&self) -> &[ExecutionLane] {
        &self.inner.lanes
    }

    /// Lane at `index`
    #[must_use]
    pub fn lane(&self, index: usize) -> Option<&ExecutionLane> {
        self.inner.lanes.get(index)
    }

    /// Next lane in round-robin order
    #[must_use]
    pub fn next(&self) -> ExecutionLane {
        let position = self.inner.next.fetch_add(1, Ordering::Relaxed) % self.inner.lanes.len();
        self.inner.lanes[position].clone()
    }

    /// Stop every lane and wait for its thread to exit
    ///
    /// Tasks still running on a lane are cancelled and later spawns resolve to
    /// [`LaneError::ShutDown`]. Blocks the calling thread; from async code use
    /// `tokio::task::spawn_blocking`. Calling it again is a no-op.
    pub fn shutdown(&self) {
        let workers = std::mem::take(
            &mut *self
                .inner
                .workers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if workers.is_empty() {
            return;
        }

        let threads: Vec<_> = workers
            .into_iter()
            .map(|worker| {
                let _ = worker.shutdown.send(());
                worker.thread
            })
            .collect();

        let caller = thread::current().id();
        for thread in threads {
            // A lane cannot wait for its own thread to exit
            if thread.thread().id() == caller {
                continue;
            }
            if thread.join().is_err() {
                warn!(group = self.inner.id, "execution lane thread panicked");
            }
        }
        info!(group = self.inner.id, "execution lanes shut down");
    }
}

impl fmt::Debug for LaneGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaneGroup")
            .field("id", &self.inner.id)
            .field("lanes", &self.inner.lanes.len())
            .finish()
    }
}

/// Number of CPUs available to the process, at least one
#[must_use]
pub fn available_parallelism() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_cycles_through_lanes() {
        let group = LaneGroup::new(3).unwrap();
        let picked: Vec<usize> = (0..6).map(|_| group.next().index()).collect();
        assert_eq!(picked, vec![0, 1, 2, 0, 1, 2]);
        group.shutdown();
    }

    #[test]
    fn test_zero_lanes_rounds_up_to_one() {
        let group = LaneGroup::new(0).unwrap();
        assert_eq!(group.len(), 1);
        assert!(!group.is_empty());
        group.shutdown();
    }

    #[test]
    fn test_lane_equality_is_by_identity() {
        let group = LaneGroup::new(2).unwrap();
        let other = LaneGroup::new(2).unwrap();

        assert_eq!(group.lanes()[0], group.lanes()[0].clone());
        assert_ne!(group.lanes()[0], group.lanes()[1]);
        assert_ne!(group.lanes()[0], other.lanes()[0]);

        group.shutdown();
        other.shutdown();
    }

    struct NotifyOnDrop(std::sync::mpsc::Sender<()>);

    impl Drop for NotifyOnDrop {
        fn drop(&mut self) {
            let _ = self.0.send(());
        }
    }

    #[test]
    fn test_dropping_abort_guard_cancels_task() {
        let group = LaneGroup::new(1).unwrap();
        let (sender, receiver) = std::sync::mpsc::channel();

        let notify = NotifyOnDrop(sender);
        let task = group.lanes()[0]
            .spawn(async move {
                let _notify = notify;
                std::future::pending::<()>().await;
            })
            .abort_on_drop();
        drop(task);

        assert!(receiver
            .recv_timeout(std::time::Duration::from_secs(5))
            .is_ok());
        group.shutdown();
    }

    #[test]
    fn test_caller_is_not_on_a_lane() {
        assert_eq!(ExecutionLane::current(), None);
    }
}
