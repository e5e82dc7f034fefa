//! Demo, benchmark, and stress-test runners for the dispatcher.

use std::time::Duration;

use crate::dispatcher::{
    DEFAULT_MAX_DELAY_MS, DEFAULT_TASKS, DEFAULT_WORKERS, DispatchConfig, DispatchReport, dispatch,
};
use crate::error::DispatchError;

// Benchmarks default to short work so sweeps finish quickly.
const BENCH_MAX_DELAY_MS: u64 = 5;

const CSV_HEADER: &str = "workers,tasks,capacity,elapsed_ms,throughput_tasks_per_s,cpu_user_s,cpu_sys_s,completed,duplicates,missing,workers_terminated";

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    // SAFETY: rusage is plain old data and getrusage only writes into it.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// Aggregated metrics from a single benchmark run.
#[derive(Debug)]
pub struct BenchResult {
    pub workers: usize,
    pub tasks: usize,
    pub capacity: usize,
    pub elapsed_ms: f64,
    pub throughput: f64,
    pub cpu_user_s: Option<f64>,
    pub cpu_sys_s: Option<f64>,
    pub completed: usize,
    pub duplicates: usize,
    pub missing: usize,
    pub workers_terminated: usize,
}

impl BenchResult {
    fn from_report(config: &DispatchConfig, report: &DispatchReport, cpu: Option<(f64, f64)>) -> Self {
        let elapsed_ms = report.elapsed.as_secs_f64() * 1000.0;
        let completed = report.completed();
        let throughput = if elapsed_ms > 0.0 {
            completed as f64 / (elapsed_ms / 1000.0)
        } else {
            0.0
        };
        Self {
            workers: config.workers,
            tasks: config.tasks,
            capacity: config.queue_capacity(),
            elapsed_ms,
            throughput,
            cpu_user_s: cpu.map(|(user, _)| user),
            cpu_sys_s: cpu.map(|(_, sys)| sys),
            completed,
            duplicates: report.duplicate_ids().len(),
            missing: report.missing_ids(config.tasks).len(),
            workers_terminated: report.workers_terminated(),
        }
    }

    pub fn csv_row(&self) -> String {
        let na = |v: Option<f64>| v.map(|v| format!("{v:.4}")).unwrap_or_else(|| "NA".to_string());
        format!(
            "{},{},{},{:.2},{:.2},{},{},{},{},{},{}",
            self.workers,
            self.tasks,
            self.capacity,
            self.elapsed_ms,
            self.throughput,
            na(self.cpu_user_s),
            na(self.cpu_sys_s),
            self.completed,
            self.duplicates,
            self.missing,
            self.workers_terminated
        )
    }

    /// Invariant breaches, one `# violation,...` line each.
    pub fn violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.duplicates > 0 {
            out.push(format!("# violation,duplicate_tasks,{}", self.duplicates));
        }
        if self.missing > 0 {
            out.push(format!("# violation,missing_tasks,{}", self.missing));
        }
        if self.workers_terminated != self.workers {
            out.push(format!(
                "# violation,workers_terminated,{}/{}",
                self.workers_terminated, self.workers
            ));
        }
        out
    }
}

fn benchmark_once(config: DispatchConfig) -> Result<BenchResult, DispatchError> {
    let cpu_start = cpu_times_seconds();
    let report = dispatch(config.clone())?;
    let cpu = match (cpu_start, cpu_times_seconds()) {
        (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
            Some((user_end - user_start, sys_end - sys_start))
        }
        _ => None,
    };
    Ok(BenchResult::from_report(&config, &report, cpu))
}

fn print_result(result: &BenchResult, validate: bool) {
    println!("{}", result.csv_row());
    if validate {
        for line in result.violations() {
            eprintln!("{line}");
        }
    }
}

/// Run the default dispatch: 20 workers, 10 tasks, up to 100ms of work each.
pub fn run_demo() -> Result<DispatchReport, DispatchError> {
    tracing::debug!("[DEMO] start");
    let config = DispatchConfig::new(DEFAULT_WORKERS, DEFAULT_TASKS)
        .with_max_delay(Duration::from_millis(DEFAULT_MAX_DELAY_MS));
    let tasks = config.tasks;
    let report = dispatch(config)?;

    println!("DEMO SUMMARY");
    println!("workers={DEFAULT_WORKERS} tasks_total={tasks}");
    println!("tasks_completed={}", report.completed());
    println!("workers_terminated={}", report.workers_terminated());
    println!("tasks_per_worker={:?}", report.tasks_per_worker());
    println!("duplicates={:?}", report.duplicate_ids());
    println!("missing={:?}", report.missing_ids(tasks));
    println!("elapsed_ms={}", report.elapsed.as_millis());
    Ok(report)
}

/// Run a single benchmark with optional parameter overrides.
pub fn run_benchmark(
    workers: Option<usize>,
    tasks: Option<usize>,
    capacity: Option<usize>,
    max_delay_ms: Option<u64>,
    validate: bool,
) {
    let mut config = DispatchConfig::new(workers.unwrap_or(4), tasks.unwrap_or(100))
        .with_max_delay(Duration::from_millis(max_delay_ms.unwrap_or(BENCH_MAX_DELAY_MS)));
    if let Some(capacity) = capacity {
        config = config.with_capacity(capacity);
    }
    match benchmark_once(config) {
        Ok(result) => {
            println!("{CSV_HEADER}");
            print_result(&result, validate);
        }
        Err(err) => eprintln!("benchmark error: {err}"),
    }
}

/// Sweep worker and task counts and print CSV output.
pub fn run_stress(
    worker_sets: Option<Vec<usize>>,
    task_sets: Option<Vec<usize>>,
    max_delay_ms: Option<u64>,
    validate: bool,
) {
    let default_worker_sets = [1usize, 2, 4, 8, 20];
    let default_task_sets = [0usize, 10, 50, 100];
    let max_delay = Duration::from_millis(max_delay_ms.unwrap_or(BENCH_MAX_DELAY_MS));

    let worker_sets = worker_sets.unwrap_or_else(|| default_worker_sets.to_vec());
    let task_sets = task_sets.unwrap_or_else(|| default_task_sets.to_vec());
    if worker_sets.iter().any(|&workers| workers == 0) {
        eprintln!("stress error: worker_sets must be > 0");
        return;
    }

    println!("{CSV_HEADER}");
    for workers in worker_sets {
        for tasks in task_sets.iter().copied() {
            let config = DispatchConfig::new(workers, tasks).with_max_delay(max_delay);
            match benchmark_once(config) {
                Ok(result) => print_result(&result, validate),
                Err(err) => eprintln!("stress error: workers={workers} tasks={tasks}: {err}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benchmark_reports_clean_run() {
        let config = DispatchConfig::new(3, 30).with_max_delay(Duration::ZERO);
        let result = benchmark_once(config).expect("benchmark");
        assert_eq!(result.completed, 30);
        assert_eq!(result.capacity, 30);
        assert_eq!(result.workers_terminated, 3);
        assert!(result.violations().is_empty());
        assert_eq!(result.csv_row().split(',').count(), CSV_HEADER.split(',').count());
    }

    #[test]
    fn benchmark_surfaces_config_errors() {
        let err = benchmark_once(DispatchConfig::new(0, 5)).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidConfig(_)));
        assert!(err.to_string().contains("zero workers"), "{err}");
    }

    #[test]
    fn violations_name_each_breach() {
        let result = BenchResult {
            workers: 4,
            tasks: 10,
            capacity: 10,
            elapsed_ms: 1.0,
            throughput: 0.0,
            cpu_user_s: None,
            cpu_sys_s: None,
            completed: 9,
            duplicates: 1,
            missing: 2,
            workers_terminated: 3,
        };
        let lines = result.violations();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("# violation,duplicate_tasks"));
        assert!(lines[1].starts_with("# violation,missing_tasks"));
        assert_eq!(lines[2], "# violation,workers_terminated,3/4");
        assert!(result.csv_row().contains(",NA,NA,"));
    }
}
