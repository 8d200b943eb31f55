use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::io::domain::frame_source::FrameSource;
use crate::io::domain::presenter::Presenter;
use crate::pipeline::frame_analyzer::FrameAnalyzer;
use crate::pipeline::pipeline_logger::PipelineLogger;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,
}

/// Everything one analysis cycle touches. Moved into the worker thread on
/// `start` and handed back on `stop` so the scheduler can be restarted.
pub struct PipelineComponents {
    pub source: Box<dyn FrameSource>,
    pub analyzer: Box<dyn FrameAnalyzer>,
    pub presenter: Box<dyn Presenter>,
    pub logger: Box<dyn PipelineLogger>,
}

/// Fixed-interval sampling loop with at most one analysis cycle in flight.
///
/// Layout: `ticker → [busy gate] → worker`. The ticker fires at the
/// configured cadence and attempts a compare-and-swap on the `busy` flag;
/// if the swap fails the tick is dropped, not queued, so inference latency
/// spikes degrade the effective frame rate instead of building a backlog. The worker runs the admitted cycle (acquire → analyze →
/// present) and clears `busy` when it finishes, success or failure.
///
/// Errors inside a cycle are absorbed and logged; they never reach the
/// timer. A failure streak is reported once at `warn`, repeats at `debug`,
/// recovery at `info`.
pub struct FrameScheduler {
    busy: Arc<AtomicBool>,
    dropped_ticks: Arc<AtomicU64>,
    completed_cycles: Arc<AtomicU64>,
    components: Option<PipelineComponents>,
    ticker: Option<TickerHandle>,
    worker: Option<JoinHandle<PipelineComponents>>,
}

struct TickerHandle {
    stop_tx: crossbeam_channel::Sender<()>,
    handle: JoinHandle<()>,
}

impl FrameScheduler {
    pub fn new(
        source: Box<dyn FrameSource>,
        analyzer: Box<dyn FrameAnalyzer>,
        presenter: Box<dyn Presenter>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            dropped_ticks: Arc::new(AtomicU64::new(0)),
            completed_cycles: Arc::new(AtomicU64::new(0)),
            components: Some(PipelineComponents {
                source,
                analyzer,
                presenter,
                logger,
            }),
            ticker: None,
            worker: None,
        }
    }

    /// Begins periodic ticking. Fails if called again without a matching
    /// [`stop`](Self::stop).
    pub fn start(&mut self, interval: Duration) -> Result<(), SchedulerError> {
        if self.ticker.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }
        let components = self.components.take().ok_or(SchedulerError::AlreadyRunning)?;

        // Capacity 1 is enough: the busy gate guarantees at most one
        // admitted-but-unfinished cycle, so `send` never blocks the ticker.
        let (work_tx, work_rx) = crossbeam_channel::bounded::<()>(1);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        self.worker = Some(spawn_worker(
            components,
            work_rx,
            self.busy.clone(),
            self.dropped_ticks.clone(),
            self.completed_cycles.clone(),
        ));
        self.ticker = Some(TickerHandle {
            stop_tx,
            handle: spawn_ticker(
                interval,
                work_tx,
                stop_rx,
                self.busy.clone(),
                self.dropped_ticks.clone(),
            ),
        });
        Ok(())
    }

    /// Cancels the timer. An in-flight cycle is allowed to finish; no new
    /// ticks fire after this returns. Idempotent.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            let _ = ticker.stop_tx.send(());
            let _ = ticker.handle.join();
        }
        if let Some(worker) = self.worker.take() {
            if let Ok(components) = worker.join() {
                self.components = Some(components);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Ticks that fired while a cycle was in flight, since construction.
    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks.load(Ordering::Relaxed)
    }

    /// Cycles that ran to successful presentation, since construction.
    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles.load(Ordering::Relaxed)
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_ticker(
    interval: Duration,
    work_tx: crossbeam_channel::Sender<()>,
    stop_rx: crossbeam_channel::Receiver<()>,
    busy: Arc<AtomicBool>,
    dropped_ticks: Arc<AtomicU64>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let ticks = crossbeam_channel::tick(interval);
        loop {
            crossbeam_channel::select! {
                recv(ticks) -> _ => {
                    // The CAS is the single-flight gate: only a tick that
                    // flips busy false→true may admit a cycle.
                    if busy
                        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        if work_tx.send(()).is_err() {
                            break;
                        }
                    } else {
                        dropped_ticks.fetch_add(1, Ordering::Relaxed);
                        log::trace!("tick dropped: analysis cycle still in flight");
                    }
                }
                recv(stop_rx) -> _ => break,
            }
        }
    })
}

fn spawn_worker(
    mut components: PipelineComponents,
    work_rx: crossbeam_channel::Receiver<()>,
    busy: Arc<AtomicBool>,
    dropped_ticks: Arc<AtomicU64>,
    completed_cycles: Arc<AtomicU64>,
) -> JoinHandle<PipelineComponents> {
    std::thread::spawn(move || {
        let mut failing = false;
        let mut drops_seen: u64 = 0;

        for _ in &work_rx {
            match run_cycle(&mut components) {
                Ok(()) => {
                    let completed = completed_cycles.fetch_add(1, Ordering::Relaxed) + 1;
                    components.logger.cycle(completed);
                    if failing {
                        log::info!("pipeline recovered, cycles presenting again");
                        failing = false;
                    }
                }
                Err(e) => {
                    if failing {
                        log::debug!("cycle skipped: {e}");
                    } else {
                        log::warn!("cycle skipped: {e} (repeats logged at debug)");
                        failing = true;
                    }
                }
            }

            let drops_total = dropped_ticks.load(Ordering::Relaxed);
            components
                .logger
                .metric("dropped_ticks", (drops_total - drops_seen) as f64);
            drops_seen = drops_total;

            busy.store(false, Ordering::Release);
        }

        components.logger.summary();
        components
    })
}

/// One full unit of work: acquire → analyze → present.
fn run_cycle(c: &mut PipelineComponents) -> Result<(), Box<dyn std::error::Error>> {
    let (width, height) = c.analyzer.input_size();
    let format = c.analyzer.pixel_format();

    let started = Instant::now();
    let frame = c.source.acquire_frame(format, width, height)?;
    c.logger.timing("acquire", elapsed_ms(started));

    let started = Instant::now();
    let image = c.analyzer.analyze(&frame)?;
    c.logger.timing("analyze", elapsed_ms(started));

    let started = Instant::now();
    c.presenter.present(image)?;
    c.logger.timing("present", elapsed_ms(started));

    Ok(())
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
