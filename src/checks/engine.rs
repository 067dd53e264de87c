//! Concurrent execution engine
//!
//! Every selected check runs as its own job on a rayon pool sized to the
//! number of checks (or the configured cap). The calling thread only collects
//! completion events and enforces the optional per-check timeout.
//!
//! Isolation rules:
//! - a body returning `Err` or panicking is recorded as a `HC-CRASH` failure
//! - a body that outlives the timeout is recorded as a `HC-TIMEOUT` failure and
//!   its scope is sealed, so anything it records afterwards is dropped
//! - a body that returns `Ok` is recorded as a success, which the report
//!   ignores if the body already recorded an issue

use super::trait_def::{Check, CheckScope};
use crate::core::config::TargetConfig;
use crate::core::error::HostcheckResult;
use crate::report::Report;
use crate::ui::progress::CheckProgress;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Code recorded when a check body errors or panics
pub const CRASH_CODE: &str = "HC-CRASH";

/// Code recorded when a check body exceeds the timeout
pub const TIMEOUT_CODE: &str = "HC-TIMEOUT";

/// Engine settings
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
  /// Per-check wall-clock limit, measured from the moment the body starts
  pub timeout: Option<Duration>,
  /// Maximum concurrent checks (None = one worker per check)
  pub max_parallel: Option<usize>,
  /// Draw a progress bar on stderr
  pub progress: bool,
}

/// Counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub selected: usize,
  pub completed: usize,
  pub crashed: usize,
  pub timed_out: usize,
}

enum Finish {
  Normal,
  Crashed,
}

enum Event {
  Started(usize),
  Finished(usize, Finish),
}

#[derive(Clone, Copy)]
enum Unit {
  Queued,
  Running(Instant),
  Done,
  /// Timed out while still holding a worker
  Abandoned,
}

/// Runs checks against a shared report
pub struct Engine {
  options: EngineOptions,
}

impl Engine {
  pub fn new(options: EngineOptions) -> Self {
    Self { options }
  }

  /// Run every check concurrently and wait for each to finish or time out
  pub fn run(&self, config: Arc<TargetConfig>, checks: &[Arc<dyn Check>], report: &Arc<Report>) -> HostcheckResult<RunSummary> {
    let mut summary = RunSummary {
      selected: checks.len(),
      ..RunSummary::default()
    };
    if checks.is_empty() {
      tracing::warn!("no checks selected, the report will be empty");
      return Ok(summary);
    }

    let workers = self.options.max_parallel.unwrap_or(checks.len()).clamp(1, checks.len());
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(workers)
      .thread_name(|i| format!("hostcheck-worker-{}", i))
      .build()?;
    tracing::info!(checks = checks.len(), workers, "running checks");

    let scopes: Vec<CheckScope> = checks
      .iter()
      .map(|check| CheckScope::new(check.name(), check.tags(), Arc::clone(&config), Arc::clone(report)))
      .collect();

    let (tx, rx) = mpsc::channel();
    for (index, (check, scope)) in checks.iter().zip(&scopes).enumerate() {
      let check = Arc::clone(check);
      let scope = scope.clone();
      let tx = tx.clone();
      pool.spawn(move || {
        tx.send(Event::Started(index)).ok();
        let finish = run_isolated(check.as_ref(), &scope);
        tx.send(Event::Finished(index, finish)).ok();
      });
    }
    drop(tx);

    let mut progress = self.options.progress.then(|| CheckProgress::new(checks.len(), "Checks"));
    let mut units = vec![Unit::Queued; checks.len()];
    let mut remaining = checks.len();

    while remaining > 0 {
      let deadline = self.next_deadline(&units);
      let event = match deadline {
        Some(deadline) => match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
          Ok(event) => Some(event),
          Err(RecvTimeoutError::Timeout) => None,
          Err(RecvTimeoutError::Disconnected) => break,
        },
        None => match rx.recv() {
          Ok(event) => Some(event),
          Err(_) => break,
        },
      };

      match event {
        Some(Event::Started(index)) => {
          if let Unit::Queued = units[index] {
            units[index] = Unit::Running(Instant::now());
            tracing::debug!(check = %scopes[index].name(), "check started");
          }
        }
        Some(Event::Finished(index, finish)) => match units[index] {
          Unit::Running(started) => {
            units[index] = Unit::Done;
            remaining -= 1;
            match finish {
              Finish::Normal => summary.completed += 1,
              Finish::Crashed => summary.crashed += 1,
            }
            tracing::debug!(check = %scopes[index].name(), elapsed_ms = started.elapsed().as_millis() as u64, "check finished");
            if let Some(p) = progress.as_mut() {
              p.inc();
            }
          }
          Unit::Abandoned => {
            units[index] = Unit::Done;
            tracing::debug!(check = %scopes[index].name(), "timed-out check released its worker");
          }
          Unit::Queued | Unit::Done => {}
        },
        None => {
          let timed_out = self.expire(&mut units, &scopes, report, workers);
          remaining -= timed_out;
          summary.timed_out += timed_out;
          if let Some(p) = progress.as_mut() {
            for _ in 0..timed_out {
              p.inc();
            }
          }
        }
      }
    }

    tracing::info!(
      selected = summary.selected,
      completed = summary.completed,
      crashed = summary.crashed,
      timed_out = summary.timed_out,
      "check run finished"
    );
    Ok(summary)
  }

  fn next_deadline(&self, units: &[Unit]) -> Option<Instant> {
    let timeout = self.options.timeout?;
    units
      .iter()
      .filter_map(|unit| match unit {
        Unit::Running(started) => Some(*started + timeout),
        _ => None,
      })
      .min()
  }

  /// Time out every running check past its deadline. Returns how many units
  /// were resolved.
  fn expire(&self, units: &mut [Unit], scopes: &[CheckScope], report: &Report, workers: usize) -> usize {
    let Some(timeout) = self.options.timeout else {
      return 0;
    };
    let now = Instant::now();
    let mut resolved = 0;

    for (unit, scope) in units.iter_mut().zip(scopes) {
      if let Unit::Running(started) = *unit
        && started + timeout <= now
      {
        scope.seal();
        *unit = Unit::Abandoned;
        resolved += 1;
        tracing::warn!(check = %scope.name(), timeout_secs = timeout.as_secs_f64(), "check timed out");
        report.record_failure(
          scope.name(),
          &format!("check did not finish within {:.1}s", timeout.as_secs_f64()),
          TIMEOUT_CODE,
          scope.tags(),
          None,
        );
      }
    }

    // Queued checks can never start once every worker is held by an
    // abandoned body.
    let abandoned = units.iter().filter(|u| matches!(u, Unit::Abandoned)).count();
    if abandoned >= workers {
      for (unit, scope) in units.iter_mut().zip(scopes) {
        if let Unit::Queued = *unit {
          scope.seal();
          *unit = Unit::Done;
          resolved += 1;
          tracing::warn!(check = %scope.name(), "check never started, all workers are held by timed-out checks");
          report.record_failure(
            scope.name(),
            "check never started: every worker is held by a timed-out check",
            TIMEOUT_CODE,
            scope.tags(),
            None,
          );
        }
      }
    }
    resolved
  }
}

/// Run one body, turning errors and panics into crash failures
fn run_isolated(check: &dyn Check, scope: &CheckScope) -> Finish {
  match panic::catch_unwind(AssertUnwindSafe(|| check.run(scope))) {
    Ok(Ok(())) => {
      scope.succeed();
      Finish::Normal
    }
    Ok(Err(err)) => {
      tracing::warn!(check = %scope.name(), error = %format!("{:#}", err), "check returned an error");
      scope.fail(format!("check raised an error: {:#}", err), CRASH_CODE);
      Finish::Crashed
    }
    Err(payload) => {
      let message = panic_message(payload.as_ref());
      tracing::warn!(check = %scope.name(), panic = %message, "check panicked");
      scope.fail(format!("check panicked: {}", message), CRASH_CODE);
      Finish::Crashed
    }
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    s.to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic payload".to_string()
  }
}
