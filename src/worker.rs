//! Background execution of a combination run.
//!
//! The engine runs on its own thread and streams [`CombineEvent`]s back over
//! an unbounded channel, so a front end can keep rendering progress while the
//! run reads and writes workbooks. The save-location question is answered
//! through [`CombineTask::provide_save_location`].

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};

use crate::engine::{run_combination, CombineError, CombineRequest, CombineSummary};
use crate::progress::{CancelFlag, CombineObserver, Progress, SaveLocation};

/// Message from a running combination.
#[derive(Debug, Clone, PartialEq)]
pub enum CombineEvent {
    Progress(Progress),
    /// The run is waiting for a save directory
    SaveLocationRequested,
    Completed(CombineSummary),
    Failed(CombineError),
    Cancelled,
}

impl CombineEvent {
    /// True for the last event a run emits.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CombineEvent::Completed(_) | CombineEvent::Failed(_) | CombineEvent::Cancelled
        )
    }
}

/// Handle to a combination running on a background thread.
pub struct CombineTask {
    events: Option<UnboundedReceiver<CombineEvent>>,
    replies: mpsc::Sender<SaveLocation>,
    cancel: CancelFlag,
    handle: Option<JoinHandle<()>>,
}

impl CombineTask {
    /// Event stream of the run. Available once.
    pub fn take_events(&mut self) -> Option<UnboundedReceiver<CombineEvent>> {
        self.events.take()
    }

    /// Answer a pending (or upcoming) save-location request.
    /// Returns false if the run has already finished.
    pub fn provide_save_location(&self, location: SaveLocation) -> bool {
        self.replies.send(location).is_ok()
    }

    /// Request cancellation. Also releases a pending save-location wait.
    pub fn cancel(&self) {
        self.cancel.cancel();
        let _ = self.replies.send(SaveLocation::Cancelled);
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Wait for the worker thread to exit.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("combination worker panicked");
            }
        }
    }
}

/// Observer that forwards progress to the event channel and waits on the
/// reply channel for the save directory.
struct ChannelObserver {
    events: UnboundedSender<CombineEvent>,
    replies: mpsc::Receiver<SaveLocation>,
    timeout: Duration,
}

impl CombineObserver for ChannelObserver {
    fn on_progress(&mut self, progress: &Progress) {
        let _ = self
            .events
            .unbounded_send(CombineEvent::Progress(progress.clone()));
    }

    fn request_save_location(&mut self) -> SaveLocation {
        let _ = self.events.unbounded_send(CombineEvent::SaveLocationRequested);
        match self.replies.recv_timeout(self.timeout) {
            Ok(location) => location,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "no save location received within {}s",
                    self.timeout.as_secs()
                );
                SaveLocation::NotProvided
            }
            Err(RecvTimeoutError::Disconnected) => SaveLocation::NotProvided,
        }
    }
}

/// Start `request` on a background thread.
pub fn spawn_combination(request: CombineRequest) -> CombineTask {
    let (tx, rx) = unbounded();
    let (reply_tx, reply_rx) = mpsc::channel();
    let cancel = CancelFlag::new();
    let worker_cancel = cancel.clone();

    let handle = std::thread::spawn(move || {
        let mut observer = ChannelObserver {
            events: tx.clone(),
            replies: reply_rx,
            timeout: request.options.save_location_timeout,
        };
        let event = match run_combination(&request, &mut observer, &worker_cancel) {
            Ok(summary) => CombineEvent::Completed(summary),
            Err(CombineError::Cancelled) => CombineEvent::Cancelled,
            Err(e) => CombineEvent::Failed(e),
        };
        let _ = tx.unbounded_send(event);
    });

    CombineTask {
        events: Some(rx),
        replies: reply_tx,
        cancel,
        handle: Some(handle),
    }
}
