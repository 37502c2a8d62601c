//! Deferred work for the lazyworktree event loop.
//!
//! [update](crate::app::Model::update) never blocks. Anything that talks to git, gh or the
//! filesystem is wrapped in a [Task] and returned as a [Command]. The event loop hands tasks to
//! the [Workers] pool; each task produces exactly one [Message] on the shared result channel,
//! which the loop feeds back into the model.
//!
//! Requests flow in over one unbounded channel and every worker thread competes for them, so
//! two fetches for different branches can complete in any order. Consumers key their writes and
//! never rely on arrival order.
//!
//! # Caution:
//! [Message] is the protocol between this module and the state machine. Adding a task kind
//! usually means adding a variant there and a handler in `app/state.rs`.

use crate::app::Message;
use crate::core::cancel::CancelToken;
use crate::core::proc::InteractiveCommand;

use crossbeam_channel::{Receiver, Sender, unbounded};

use std::fmt;
use std::thread;

type Work = Box<dyn FnOnce(&CancelToken) -> Message + Send + 'static>;

/// A unit of blocking work that reports back exactly one [Message].
pub struct Task {
    label: String,
    work: Work,
}

impl Task {
    pub fn new<F>(label: impl Into<String>, work: F) -> Self
    where
        F: FnOnce(&CancelToken) -> Message + Send + 'static,
    {
        Self {
            label: label.into(),
            work: Box::new(work),
        }
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Runs the work on the calling thread.
    pub fn run(self, token: &CancelToken) -> Message {
        (self.work)(token)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("label", &self.label).finish()
    }
}

/// What the state machine asks the event loop to do next.
#[derive(Debug)]
pub enum Command {
    /// Run on the worker pool.
    Task(Task),
    /// Suspend the TUI and run a terminal-owning process.
    Exec(InteractiveCommand),
    Batch(Vec<Command>),
    Quit,
}

impl Command {
    pub fn task<F>(label: impl Into<String>, work: F) -> Self
    where
        F: FnOnce(&CancelToken) -> Message + Send + 'static,
    {
        Command::Task(Task::new(label, work))
    }

    /// Folds optional commands into one, collapsing empty and single-element batches.
    pub fn batch<I>(cmds: I) -> Option<Command>
    where
        I: IntoIterator<Item = Option<Command>>,
    {
        let mut cmds: Vec<Command> = cmds.into_iter().flatten().collect();
        match cmds.len() {
            0 => None,
            1 => cmds.pop(),
            _ => Some(Command::Batch(cmds)),
        }
    }

    /// Labels of every task in this command, in order.
    pub fn task_labels(&self) -> Vec<&str> {
        match self {
            Command::Task(t) => vec![t.label()],
            Command::Batch(cmds) => cmds.iter().flat_map(Command::task_labels).collect(),
            _ => Vec::new(),
        }
    }
}

/// Pool of worker threads executing [Task]s.
pub struct Workers {
    task_tx: Sender<(Task, CancelToken)>,
    result_tx: Sender<Message>,
    result_rx: Receiver<Message>,
}

impl Workers {
    /// Spawns `threads` workers (at least one) sharing a single request queue.
    pub fn spawn(threads: usize) -> Self {
        let (task_tx, task_rx) = unbounded::<(Task, CancelToken)>();
        let (result_tx, result_rx) = unbounded::<Message>();

        for id in 0..threads.max(1) {
            start_worker(id, task_rx.clone(), result_tx.clone());
        }

        Self {
            task_tx,
            result_tx,
            result_rx,
        }
    }

    /// Pool sized to the machine, never fewer than four threads so slow `gh` calls
    /// cannot starve local git work.
    pub fn with_default_size() -> Self {
        let n = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .max(4);
        Self::spawn(n)
    }

    pub fn submit(&self, task: Task, token: CancelToken) {
        tracing::debug!(task = task.label(), "dispatching task");
        if self.task_tx.send((task, token)).is_err() {
            let _ = self
                .result_tx
                .send(Message::Error("worker pool is gone".to_string()));
        }
    }

    #[inline]
    pub fn result_rx(&self) -> &Receiver<Message> {
        &self.result_rx
    }
}

fn start_worker(id: usize, task_rx: Receiver<(Task, CancelToken)>, result_tx: Sender<Message>) {
    let spawned = thread::Builder::new()
        .name(format!("lw-worker-{id}"))
        .spawn(move || {
            while let Ok((task, token)) = task_rx.recv() {
                let label = task.label.clone();
                let msg = task.run(&token);
                tracing::debug!(task = %label, "task finished");
                if result_tx.send(msg).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "failed to spawn worker thread");
    }
}
