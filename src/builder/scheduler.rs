//! The parallel compile scheduler.
//!
//! A fixed pool of N workers pulls jobs off a shared queue in order and
//! fails fast: after the first nonzero exit no further compiler is spawned,
//! while in-flight compiles finish naturally. A single lock serializes the
//! progress log so counters and per-job output interleave cleanly.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use crate::core::component::CompileJob;
use crate::error::BuildError;
use crate::util::process::{ProcessBuilder, SpawnError};
use crate::util::shell::{CompileReport, Shell};

struct SchedulerState<'a> {
    jobs: &'a [CompileJob],
    component: &'a str,
    shell: &'a Shell,
    /// Next queue index to hand out.
    next: AtomicUsize,
    /// Set once on the first failure; gates dispatch and success logging.
    error_observed: AtomicBool,
    first_error: Mutex<Option<BuildError>>,
    /// Completion counter, also the log lock.
    completed: Mutex<usize>,
}

/// Compile every job of one component, with at most `parallelism` compilers
/// running at a time.
pub fn run_compile_jobs(
    component: &str,
    jobs: &[CompileJob],
    parallelism: usize,
    shell: &Shell,
) -> Result<(), BuildError> {
    if jobs.is_empty() {
        return Ok(());
    }

    let workers = parallelism.max(1).min(jobs.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| BuildError::WorkerPoolFailed {
            message: e.to_string(),
        })?;

    let state = SchedulerState {
        jobs,
        component,
        shell,
        next: AtomicUsize::new(0),
        error_observed: AtomicBool::new(false),
        first_error: Mutex::new(None),
        completed: Mutex::new(0),
    };

    pool.scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|_| worker_loop(&state));
        }
    });

    match state
        .first_error
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
    {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// One worker: pull jobs in queue order until the queue drains or a failure
/// is observed.
fn worker_loop(state: &SchedulerState<'_>) {
    loop {
        if state.error_observed.load(Ordering::SeqCst) {
            return;
        }
        let index = state.next.fetch_add(1, Ordering::SeqCst);
        let Some(job) = state.jobs.get(index) else {
            return;
        };
        if !execute_job(state, job) {
            return;
        }
    }
}

/// Run one compile job. Returns false when the worker should stop.
fn execute_job(state: &SchedulerState<'_>, job: &CompileJob) -> bool {
    let started = Instant::now();
    let command = ProcessBuilder::new(job.compiler.location()).args(&job.argv);
    let result = command.exec();
    let seconds = started.elapsed().as_secs_f64();
    let total = state.jobs.len();

    match result {
        Ok(out) if out.success() => {
            // Successful results after the first failure are dropped from
            // the log.
            if state.error_observed.load(Ordering::SeqCst) {
                return false;
            }
            let mut completed = state
                .completed
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *completed += 1;
            let file_name = job
                .source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            state.shell.compile_line(&CompileReport {
                index: *completed,
                total,
                seconds,
                component: state.component,
                success: true,
                path: &file_name,
                message: &out.output,
            });
            true
        }
        Ok(out) => {
            {
                let mut completed = state
                    .completed
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                *completed += 1;
                state.shell.compile_line(&CompileReport {
                    index: *completed,
                    total,
                    seconds,
                    component: state.component,
                    success: false,
                    path: &job.source.to_string_lossy(),
                    message: &out.output,
                });
                state
                    .shell
                    .error(format!("command: {}", command.display_command()));
            }
            record_failure(state, job, &command);
            false
        }
        Err(spawn_err) => {
            let message = match spawn_err {
                SpawnError::NotFound => "compiler not found".to_string(),
                SpawnError::Other(e) => e.to_string(),
            };
            state.shell.error(format!(
                "failed to run `{}`: {}",
                job.compiler.location(),
                message
            ));
            record_failure(state, job, &command);
            false
        }
    }
}

fn record_failure(state: &SchedulerState<'_>, job: &CompileJob, command: &ProcessBuilder) {
    state.error_observed.store(true, Ordering::SeqCst);
    let mut slot = state
        .first_error
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    slot.get_or_insert(BuildError::CompileFailed {
        component: state.component.to_string(),
        source_path: job.source.clone(),
        command: command.display_command(),
    });
}
