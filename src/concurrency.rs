use anyhow::{anyhow, bail};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;
use tracing::{debug, error};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// How long a worker above the minimum waits for a job before it exits.
const IDLE_RETIRE: Duration = Duration::from_secs(60);

struct Shared {
    receiver: Mutex<Receiver<Job>>,
    /// Workers free to take a job that no queued job has claimed yet.
    idle: AtomicUsize,
    live: AtomicUsize,
    min_workers: usize,
}

impl Shared {
    /// Claims one unreserved idle worker, if there is one.
    fn claim_idle(&self) -> bool {
        self.idle
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// An idle worker may leave while the pool is above its minimum and no
    /// queued job is counting on it.
    fn try_retire(&self) -> bool {
        let above_min = self
            .live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n > self.min_workers).then(|| n - 1)
            })
            .is_ok();
        if !above_min {
            return false;
        }
        if self.claim_idle() {
            return true;
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        false
    }
}

struct Worker {
    id: usize,
    thread: thread::JoinHandle<()>,
}

impl Worker {
    fn new(id: usize, shared: Arc<Shared>) -> std::io::Result<Worker> {
        let thread = thread::Builder::new()
            .name(format!("worker-{id}"))
            .spawn(move || {
                loop {
                    let message = match shared.receiver.lock() {
                        Ok(rx) => rx.recv_timeout(IDLE_RETIRE),
                        Err(_) => break,
                    };
                    match message {
                        Ok(job) => {
                            job();
                            shared.idle.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            if shared.try_retire() {
                                debug!(worker = id, "idle worker retired");
                                return;
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                shared.live.fetch_sub(1, Ordering::SeqCst);
                debug!(worker = id, "worker stopped");
            })?;

        Ok(Worker { id, thread })
    }
}

/// Worker threads fed from one job queue. The pool keeps `min_workers`
/// threads warm and starts another one whenever a job arrives while every
/// worker is busy, so a long-running job never delays a later one. Extra
/// workers exit after sitting idle for a while. Dropping the pool closes
/// the queue and waits for every worker to finish its current job.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<Worker>>,
    next_id: AtomicUsize,
    sender: Option<Sender<Job>>,
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        drop(self.sender.take());

        let workers = match self.workers.get_mut() {
            Ok(workers) => std::mem::take(workers),
            Err(poisoned) => std::mem::take(poisoned.into_inner()),
        };
        for worker in workers {
            if worker.thread.join().is_err() {
                error!(worker = worker.id, "worker panicked");
            }
        }
    }
}

impl ThreadPool {
    pub fn new(min_workers: usize) -> anyhow::Result<Self> {
        if min_workers == 0 {
            bail!("thread pool needs at least one worker");
        }

        let (sender, receiver) = mpsc::channel();
        let pool = ThreadPool {
            shared: Arc::new(Shared {
                receiver: Mutex::new(receiver),
                idle: AtomicUsize::new(0),
                live: AtomicUsize::new(0),
                min_workers,
            }),
            workers: Mutex::new(Vec::with_capacity(min_workers)),
            next_id: AtomicUsize::new(0),
            sender: Some(sender),
        };

        for _ in 0..min_workers {
            pool.spawn_worker()?;
            pool.shared.idle.fetch_add(1, Ordering::SeqCst);
        }

        Ok(pool)
    }

    /// Workers currently alive, busy or idle.
    pub fn size(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }

    /// Queues `f`, starting a new worker for it unless an idle one is free.
    pub fn execute<F>(&self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| anyhow!("thread pool is shut down"))?;

        if !self.shared.claim_idle() {
            self.spawn_worker()?;
        }

        let job = Box::new(f) as Job;
        sender
            .send(job)
            .map_err(|_| anyhow!("all workers have stopped"))
    }

    fn spawn_worker(&self) -> anyhow::Result<()> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.shared.live.fetch_add(1, Ordering::SeqCst);

        let worker = match Worker::new(id, Arc::clone(&self.shared)) {
            Ok(worker) => worker,
            Err(e) => {
                self.shared.live.fetch_sub(1, Ordering::SeqCst);
                return Err(anyhow!(e).context("Can't start worker thread"));
            }
        };

        let mut workers = self
            .workers
            .lock()
            .map_err(|_| anyhow!("worker list is poisoned"))?;
        workers.retain(|w| !w.thread.is_finished());
        workers.push(worker);
        Ok(())
    }
}
