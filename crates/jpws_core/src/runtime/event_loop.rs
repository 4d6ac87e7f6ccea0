//! Single-threaded UI task loop.

use crate::runtime::{LoopError, LoopResult};
use log::{debug, error, info};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, JoinHandle, ThreadId};

type Task<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

enum LoopMsg<S> {
    Run(Task<S>),
    Shutdown,
}

/// Owner of the loop thread. Dropping it stops and joins the loop.
pub struct EventLoop<S: 'static> {
    sender: mpsc::Sender<LoopMsg<S>>,
    thread_id: ThreadId,
    handle: Option<JoinHandle<()>>,
}

impl<S: 'static> EventLoop<S> {
    /// Starts the loop; `factory` builds the loop state on the loop thread,
    /// so the state itself does not need to be `Send`.
    pub fn spawn<F>(name: &str, factory: F) -> LoopResult<Self>
    where
        F: FnOnce() -> S + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<LoopMsg<S>>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_loop(factory(), receiver))?;
        info!("event=loop_start module=runtime status=ok name={name}");
        Ok(Self {
            sender,
            thread_id: handle.thread().id(),
            handle: Some(handle),
        })
    }

    pub fn handle(&self) -> UiHandle<S> {
        UiHandle {
            sender: self.sender.clone(),
            loop_thread: self.thread_id,
        }
    }

    /// Processes already queued tasks, then stops and joins the loop.
    pub fn shutdown(mut self) -> LoopResult<()> {
        self.stop()
    }

    fn stop(&mut self) -> LoopResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let _ = self.sender.send(LoopMsg::Shutdown);
        handle.join().map_err(|_| LoopError::TaskPanicked)?;
        info!("event=loop_stop module=runtime status=ok");
        Ok(())
    }
}

impl<S: 'static> Drop for EventLoop<S> {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Cloneable sender of tasks into the loop.
pub struct UiHandle<S: 'static> {
    sender: mpsc::Sender<LoopMsg<S>>,
    loop_thread: ThreadId,
}

impl<S: 'static> Clone for UiHandle<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            loop_thread: self.loop_thread,
        }
    }
}

impl<S: 'static> UiHandle<S> {
    /// Queues `task` without waiting for it.
    pub fn post(&self, task: impl FnOnce(&mut S) + Send + 'static) -> LoopResult<()> {
        self.sender
            .send(LoopMsg::Run(Box::new(task)))
            .map_err(|_| LoopError::Disconnected)
    }

    /// Runs `task` on the loop and blocks until it returns.
    pub fn execute_and_wait<R, F>(&self, task: F) -> LoopResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        if self.is_loop_thread() {
            return Err(LoopError::WouldDeadlock);
        }
        let (reply, result) = mpsc::sync_channel(1);
        self.post(move |state| {
            let _ = reply.send(task(state));
        })?;
        result.recv().map_err(|_| LoopError::TaskPanicked)
    }

    pub fn is_loop_thread(&self) -> bool {
        thread::current().id() == self.loop_thread
    }
}

fn run_loop<S>(mut state: S, receiver: mpsc::Receiver<LoopMsg<S>>) {
    let mut processed: u64 = 0;
    while let Ok(message) = receiver.recv() {
        match message {
            LoopMsg::Run(task) => {
                processed += 1;
                if catch_unwind(AssertUnwindSafe(|| task(&mut state))).is_err() {
                    error!("event=loop_task module=runtime status=panic task={processed}");
                }
            }
            LoopMsg::Shutdown => break,
        }
    }
    debug!("event=loop_exit module=runtime processed={processed}");
}

#[cfg(test)]
mod tests {
    use super::EventLoop;
    use crate::runtime::LoopError;

    #[test]
    fn execute_and_wait_returns_task_result() {
        let event_loop = EventLoop::spawn("test-loop", || 40_u32).unwrap();
        let handle = event_loop.handle();
        handle.post(|state| *state += 1).unwrap();
        let value = handle
            .execute_and_wait(|state| {
                *state += 1;
                *state
            })
            .unwrap();
        assert_eq!(value, 42);
        event_loop.shutdown().unwrap();
    }

    #[test]
    fn panicking_task_does_not_stop_the_loop() {
        let event_loop = EventLoop::spawn("test-loop", Vec::<u8>::new).unwrap();
        let handle = event_loop.handle();
        let failed = handle.execute_and_wait(|_: &mut Vec<u8>| -> u8 { panic!("boom") });
        assert!(matches!(failed, Err(LoopError::TaskPanicked)));

        let len = handle
            .execute_and_wait(|state: &mut Vec<u8>| {
                state.push(1);
                state.len()
            })
            .unwrap();
        assert_eq!(len, 1);
    }

    #[test]
    fn waiting_on_the_loop_thread_is_refused() {
        let event_loop = EventLoop::spawn("test-loop", || ()).unwrap();
        let handle = event_loop.handle();
        let inner = handle.clone();
        let nested = handle
            .execute_and_wait(move |_| inner.execute_and_wait(|_| ()).is_err())
            .unwrap();
        assert!(nested);
    }

    #[test]
    fn post_after_shutdown_is_disconnected() {
        let event_loop = EventLoop::spawn("test-loop", || ()).unwrap();
        let handle = event_loop.handle();
        event_loop.shutdown().unwrap();
        assert!(matches!(handle.post(|_| {}), Err(LoopError::Disconnected)));
    }
}
