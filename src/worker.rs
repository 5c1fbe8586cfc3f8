//! Thread-backed serialized worker (requires the `std` feature)
//!
//! [`Worker::spawn`] moves an attached [`Tester`] onto a dedicated thread.
//! Triggers only bump the shared [`TriggerQueue`] and wake the thread, so an
//! operator surface never blocks on a run and never sees two runs overlap.
//!
//! # Example
//!
//! ```ignore
//! let tester = Tester::attach(&mut dma, &mut pool, TesterConfig::new(), StdDelay, rng)?;
//! let worker = Worker::spawn(tester)?;
//!
//! let trigger = worker.trigger_handle();
//! trigger.trigger()?; // returns at once; result goes to the log
//!
//! let tester = worker.shutdown().expect("worker panicked");
//! tester.detach(&mut dma, &mut pool);
//! ```

#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle, Thread};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use rand_core::RngCore;

use crate::driver::error::{SetupError, SetupResult};
use crate::driver::tester::Tester;
use crate::hal::DmaChannel;
use crate::sync::TriggerQueue;

/// [`DelayNs`] backed by [`std::thread::sleep`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        thread::sleep(Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Cloneable trigger for operator surfaces on other threads
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    queue: Arc<TriggerQueue>,
    thread: Thread,
}

impl TriggerHandle {
    /// Queue one test iteration and return immediately.
    ///
    /// Fails with [`SetupError::Detached`] once shutdown has begun.
    pub fn trigger(&self) -> SetupResult<()> {
        if self.queue.trigger() {
            self.thread.unpark();
            Ok(())
        } else {
            Err(SetupError::Detached)
        }
    }
}

/// Dedicated thread that owns a tester and runs queued iterations
pub struct Worker;

impl Worker {
    /// Move `tester` onto a new thread and start servicing triggers.
    pub fn spawn<C, D, R>(tester: Tester<C, D, R>) -> io::Result<WorkerHandle<C, D, R>>
    where
        C: DmaChannel + Send + 'static,
        D: DelayNs + Send + 'static,
        R: RngCore + Send + 'static,
    {
        let queue = Arc::new(TriggerQueue::new());
        let worker_queue = Arc::clone(&queue);

        let thread = thread::Builder::new()
            .name("axidma-tester".into())
            .spawn(move || run_worker(tester, &worker_queue))?;

        Ok(WorkerHandle { queue, thread })
    }
}

fn run_worker<C, D, R>(mut tester: Tester<C, D, R>, queue: &TriggerQueue) -> Tester<C, D, R>
where
    C: DmaChannel,
    D: DelayNs,
    R: RngCore,
{
    log::debug!("worker started");
    loop {
        tester.service(queue);
        if queue.is_closed() {
            // Close happened after the last take; pick up the stragglers
            tester.service(queue);
            break;
        }
        thread::park();
    }
    log::debug!("worker stopped after {} runs", tester.stats().runs);
    tester
}

/// Owner side of a running [`Worker`]
pub struct WorkerHandle<C: DmaChannel, D: DelayNs, R: RngCore> {
    queue: Arc<TriggerQueue>,
    thread: JoinHandle<Tester<C, D, R>>,
}

impl<C: DmaChannel, D: DelayNs, R: RngCore> WorkerHandle<C, D, R> {
    /// Queue one test iteration and return immediately.
    pub fn trigger(&self) -> SetupResult<()> {
        self.trigger_handle().trigger()
    }

    /// Trigger usable from other threads
    pub fn trigger_handle(&self) -> TriggerHandle {
        TriggerHandle {
            queue: Arc::clone(&self.queue),
            thread: self.thread.thread().clone(),
        }
    }

    /// Iterations queued and not yet started
    pub fn pending(&self) -> u32 {
        self.queue.pending()
    }

    /// Refuse new triggers, finish every queued iteration, and hand the
    /// tester back for detach.
    pub fn shutdown(self) -> thread::Result<Tester<C, D, R>> {
        self.queue.close();
        self.thread.thread().unpark();
        self.thread.join()
    }
}
