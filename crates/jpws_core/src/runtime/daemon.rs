//! Periodic service daemon posting work into the UI loop.

use crate::runtime::{LoopResult, UiHandle};
use log::{debug, info, warn};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Default)]
struct StopFlag {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopFlag {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.stopped
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn stop(&self) {
        *self.lock() = true;
        self.wake.notify_all();
    }

    /// Sleeps up to `period`; returns `true` once stopped.
    fn wait(&self, period: Duration) -> bool {
        let stopped = self.lock();
        if *stopped {
            return true;
        }
        let (stopped, _) = self
            .wake
            .wait_timeout_while(stopped, period, |stopped| !*stopped)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *stopped
    }
}

/// Thread that posts `task` into the loop every `period`.
///
/// The daemon never runs the task itself; it only queues it. It stops on
/// request, on drop, or when the loop has gone away.
pub struct ServiceDaemon {
    name: String,
    flag: Arc<StopFlag>,
    handle: Option<JoinHandle<()>>,
}

impl ServiceDaemon {
    pub fn start<S, F>(name: &str, period: Duration, ui: UiHandle<S>, task: F) -> LoopResult<Self>
    where
        S: 'static,
        F: Fn(&mut S) + Send + Sync + 'static,
    {
        let flag = Arc::new(StopFlag::default());
        let thread_flag = Arc::clone(&flag);
        let task = Arc::new(task);
        let thread_name = name.to_string();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            let mut ticks: u64 = 0;
            while !thread_flag.wait(period) {
                ticks += 1;
                let task = Arc::clone(&task);
                if ui.post(move |state| (*task)(state)).is_err() {
                    warn!(
                        "event=daemon_tick module=runtime status=disconnected name={thread_name}"
                    );
                    break;
                }
            }
            debug!("event=daemon_exit module=runtime name={thread_name} ticks={ticks}");
        })?;
        info!(
            "event=daemon_start module=runtime status=ok name={name} period_ms={}",
            period.as_millis()
        );
        Ok(Self {
            name: name.to_string(),
            flag,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops and joins the daemon thread.
    pub fn stop(&mut self) {
        self.flag.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ServiceDaemon {
    fn drop(&mut self) {
        self.stop();
    }
}
