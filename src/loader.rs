use crate::effect::Registration;
use crate::error::{panic_message, CoreError};
use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Builds a plugin. Runs on a loader thread, never on the render loop.
pub type Factory = fn() -> anyhow::Result<Registration>;

enum Loaded {
    Ready(Registration),
    Failed(CoreError),
}

/// Loads effects asynchronously by path.
///
/// Factories run off the render loop, but registrations are handed out in
/// the order `load` was called: a finished load waits until every earlier
/// one has finished or failed. Failures are logged and never retried.
pub struct Loader {
    catalog: HashMap<String, Factory>,
    tx: Sender<(u64, Loaded)>,
    rx: Receiver<(u64, Loaded)>,
    next_seq: u64,
    release_seq: u64,
    /// Finished out of order; `None` marks a failure holding its slot.
    finished: BTreeMap<u64, Option<Registration>>,
    in_flight: usize,
}

impl Loader {
    pub fn new<I, S>(catalog: I) -> Self
    where
        I: IntoIterator<Item = (S, Factory)>,
        S: Into<String>,
    {
        let (tx, rx) = mpsc::channel();
        Self {
            catalog: catalog.into_iter().map(|(k, f)| (k.into(), f)).collect(),
            tx,
            rx,
            next_seq: 0,
            release_seq: 0,
            finished: BTreeMap::new(),
            in_flight: 0,
        }
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty::<(String, Factory)>())
    }

    /// Starts loading `path`. Unknown paths fail immediately (logged).
    pub fn load(&mut self, path: &str) {
        let Some(factory) = self.catalog.get(path).copied() else {
            let err = CoreError::LoadFailed {
                path: path.to_string(),
                reason: "no such effect module".to_string(),
            };
            error!("{err}");
            return;
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        let tx = self.tx.clone();
        let owned = path.to_string();
        let spawned = thread::Builder::new()
            .name(format!("load:{path}"))
            .spawn(move || {
                let msg = match panic::catch_unwind(AssertUnwindSafe(factory)) {
                    Ok(Ok(reg)) => Loaded::Ready(reg),
                    Ok(Err(e)) => Loaded::Failed(CoreError::LoadFailed {
                        path: owned,
                        reason: format!("{e:#}"),
                    }),
                    Err(payload) => Loaded::Failed(CoreError::LoadFailed {
                        path: owned,
                        reason: panic_message(payload.as_ref()),
                    }),
                };
                let _ = tx.send((seq, msg));
            });

        match spawned {
            Ok(_) => {
                self.in_flight += 1;
                debug!(path, seq, "effect load started");
            }
            Err(e) => {
                error!(path, "could not start effect load: {e}");
                self.finished.insert(seq, None);
            }
        }
    }

    /// Registrations that are ready to hand out, without blocking.
    pub fn poll(&mut self) -> Vec<Registration> {
        while let Ok((seq, msg)) = self.rx.try_recv() {
            self.accept(seq, msg);
        }
        self.release()
    }

    /// Blocks until every started load finished or `timeout` passed.
    pub fn wait(&mut self, timeout: Duration) -> Vec<Registration> {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(left) {
                Ok((seq, msg)) => self.accept(seq, msg),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.release()
    }

    /// Loads started but not yet handed out.
    pub fn pending(&self) -> usize {
        self.in_flight + self.finished.values().filter(|r| r.is_some()).count()
    }

    fn accept(&mut self, seq: u64, msg: Loaded) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let slot = match msg {
            Loaded::Ready(reg) => Some(reg),
            Loaded::Failed(err) => {
                error!("{err}");
                None
            }
        };
        self.finished.insert(seq, slot);
    }

    fn release(&mut self) -> Vec<Registration> {
        let mut ready = Vec::new();
        while let Some(slot) = self.finished.remove(&self.release_seq) {
            self.release_seq += 1;
            ready.extend(slot);
        }
        ready
    }
}
