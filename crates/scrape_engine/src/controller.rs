use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use scrape_core::{
    update, Effect, Generation, Msg, ProceedPaths, QueryPair, RenderPass, ScrapeOptions,
    ScrapeState, ScrapeView, Variables,
};
use scrape_logging::{scrape_debug, scrape_error};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

use crate::executor::QueryExecutor;
use crate::sink::{ChannelViewSink, ViewSink};
use crate::ScrapeEvent;

/// Most events a handle buffers for its caller. Older events stay queued and
/// newer ones are dropped; `view()` always reflects the latest state.
pub const EVENT_BACKLOG: usize = 32;

// Upper bound on one blocking wait inside `wait_settled`.
const SETTLE_POLL: Duration = Duration::from_millis(50);

enum ControllerCommand {
    Start {
        variables: Variables,
        pass: RenderPass,
    },
    Detach,
    Deliver(Msg),
    Shutdown,
}

/// Live scrape session running on its own thread.
///
/// Every `start` opens a new generation; pages still in flight for an older
/// generation are aborted and, should they arrive anyway, discarded. Dropping
/// the handle detaches the session and stops the thread.
pub struct ScrapeHandle {
    cmd_tx: mpsc::Sender<ControllerCommand>,
    event_rx: mpsc::Receiver<ScrapeEvent>,
    latest: Arc<Mutex<ScrapeView>>,
    // Start and Detach each bump the generation by one, in send order.
    generation: AtomicU64,
}

impl ScrapeHandle {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        query: QueryPair,
        paths: ProceedPaths,
        options: ScrapeOptions,
    ) -> io::Result<Self> {
        let runtime = Runtime::new()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::sync_channel(EVENT_BACKLOG);
        let latest = Arc::new(Mutex::new(ScrapeView::default()));

        let worker = Worker {
            runtime,
            executor,
            cmd_tx: cmd_tx.clone(),
            sink: ChannelViewSink::new(event_tx),
            latest: latest.clone(),
            in_flight: HashMap::new(),
        };
        let state = ScrapeState::new(query, paths, options);
        thread::Builder::new()
            .name("scrape-controller".to_string())
            .spawn(move || worker.run(state, cmd_rx))?;

        Ok(Self {
            cmd_tx,
            event_rx,
            latest,
            generation: AtomicU64::new(0),
        })
    }

    pub fn start(&self, variables: Variables) {
        self.start_with(variables, RenderPass::Interactive);
    }

    pub fn start_with(&self, variables: Variables, pass: RenderPass) {
        self.send(ControllerCommand::Start { variables, pass });
    }

    pub fn detach(&self) {
        self.send(ControllerCommand::Detach);
    }

    /// Latest published view.
    pub fn view(&self) -> ScrapeView {
        match self.latest.lock() {
            Ok(view) => view.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn try_recv(&self) -> Option<ScrapeEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ScrapeEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Blocks until the most recently started generation completes or errors.
    ///
    /// Consumes events while waiting. Returns `None` on timeout, which is also
    /// what a deferred non-interactive start produces.
    pub fn wait_settled(&self, timeout: Duration) -> Option<ScrapeView> {
        // Events may be dropped once the backlog is full, so the latest view
        // is the source of truth and events only serve as wake-ups.
        let target = self.generation.load(Ordering::SeqCst);
        let deadline = Instant::now() + timeout;

        loop {
            let current = self.view();
            if current.generation == target && current.is_settled() {
                return Some(current);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            match self.event_rx.recv_timeout(remaining.min(SETTLE_POLL)) {
                Ok(_) | Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    thread::sleep(remaining.min(SETTLE_POLL));
                }
            }
        }
    }

    fn send(&self, command: ControllerCommand) {
        if matches!(
            command,
            ControllerCommand::Start { .. } | ControllerCommand::Detach
        ) {
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        let _ = self.cmd_tx.send(command);
    }
}

impl Drop for ScrapeHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(ControllerCommand::Shutdown);
    }
}

struct Worker {
    runtime: Runtime,
    executor: Arc<dyn QueryExecutor>,
    cmd_tx: mpsc::Sender<ControllerCommand>,
    sink: ChannelViewSink,
    latest: Arc<Mutex<ScrapeView>>,
    in_flight: HashMap<Generation, JoinHandle<()>>,
}

impl Worker {
    fn run(mut self, mut state: ScrapeState, cmd_rx: mpsc::Receiver<ControllerCommand>) {
        while let Ok(command) = cmd_rx.recv() {
            let msg = match command {
                ControllerCommand::Start { variables, pass } => Msg::Start { variables, pass },
                ControllerCommand::Detach => Msg::Detach,
                ControllerCommand::Deliver(msg) => {
                    if let Msg::PageLoaded { generation, .. } | Msg::PageFailed { generation, .. } =
                        &msg
                    {
                        self.in_flight.remove(generation);
                    }
                    msg
                }
                ControllerCommand::Shutdown => break,
            };

            let (next, effects) = update(state, msg);
            state = next;
            for effect in effects {
                self.run_effect(effect);
            }
            if state.consume_dirty() {
                self.publish(state.view());
            }
        }

        for (_, task) in self.in_flight.drain() {
            task.abort();
        }
        self.runtime.shutdown_background();
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Execute {
                generation,
                page,
                request,
            } => {
                let executor = self.executor.clone();
                let cmd_tx = self.cmd_tx.clone();
                self.sink.emit(ScrapeEvent::Requested { generation, page });
                let task = self.runtime.spawn(async move {
                    let msg = match executor.execute(&request).await {
                        Ok(response) => Msg::PageLoaded {
                            generation,
                            page,
                            response,
                        },
                        Err(error) => Msg::PageFailed {
                            generation,
                            page,
                            error,
                        },
                    };
                    let _ = cmd_tx.send(ControllerCommand::Deliver(msg));
                });
                self.in_flight.insert(generation, task);
            }
            Effect::Cancel { generation } => {
                if let Some(task) = self.in_flight.remove(&generation) {
                    scrape_debug!("aborting in-flight request for generation={}", generation);
                    task.abort();
                }
            }
        }
    }

    fn publish(&self, view: ScrapeView) {
        match self.latest.lock() {
            Ok(mut latest) => *latest = view.clone(),
            Err(_) => scrape_error!("latest view lock poisoned; event still emitted"),
        }
        self.sink.emit(ScrapeEvent::ViewChanged(view));
    }
}
