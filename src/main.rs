use task_dispatch::{clock, logging, sim};

// Sample inputs formatted when `clock` is given no minutes.
const SAMPLE_MINUTES: [u32; 2] = [500, 330];

fn parse_usize_list(arg: &str) -> Option<Vec<usize>> {
    if arg == "-" {
        return None;
    }
    let mut values = Vec::new();
    for part in arg.split(',') {
        if part.trim().is_empty() {
            return None;
        }
        let value = part.trim().parse::<usize>().ok()?;
        values.push(value);
    }
    Some(values)
}

fn print_usage(program: &str) {
    println!("Task dispatcher CLI");
    println!("Usage:");
    println!("  {program} (run demo)");
    println!("  {program} bench [workers] [tasks] [capacity] [max_delay_ms] [validate]");
    println!("  {program} stress [worker_sets] [task_sets] [max_delay_ms] [validate]");
    println!("  {program} clock [minutes...]");
    println!("  {program} --help");
    println!();
    println!("Sets are comma-separated lists (e.g., 1,2,4). Use \"-\" to keep a default set or value.");
    println!("Defaults:");
    println!("  demo   workers=20 tasks=10 max_delay_ms=100");
    println!("  bench  workers=4 tasks=100 capacity=tasks max_delay_ms=5");
    println!("  stress workers=1,2,4,8,20 tasks=0,10,50,100 max_delay_ms=5");
    println!("  clock  minutes=500 330");
    println!("Flags:");
    println!("  validate  report duplicate/missing tasks and unterminated workers");
    println!("Logging is controlled with RUST_LOG (e.g. RUST_LOG=task_dispatch=debug).");
}

fn exit_with_usage(program: &str, message: &str) -> ! {
    eprintln!("{message}");
    print_usage(program);
    std::process::exit(2);
}

/// Parse an optional positional value; `-` means "use the default".
fn parse_opt<T: std::str::FromStr>(program: &str, name: &str, arg: Option<String>) -> Option<T> {
    match arg.as_deref() {
        None | Some("-") => None,
        Some(raw) => match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => exit_with_usage(program, &format!("invalid {name} value: {raw}")),
        },
    }
}

fn main() {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "task_dispatch".to_string());
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("bench") => {
            logging::init("task_dispatch=warn");
            let mut positional = Vec::new();
            let mut validate = false;
            for arg in args {
                match arg.as_str() {
                    "validate" => validate = true,
                    _ => positional.push(arg),
                }
            }
            if positional.len() > 4 {
                exit_with_usage(&program, &format!("bench: unexpected argument: {}", positional[4]));
            }
            let mut positional = positional.into_iter();
            let workers = parse_opt(&program, "workers", positional.next());
            let tasks = parse_opt(&program, "tasks", positional.next());
            let capacity = parse_opt(&program, "capacity", positional.next());
            let max_delay_ms = parse_opt(&program, "max_delay_ms", positional.next());
            sim::run_benchmark(workers, tasks, capacity, max_delay_ms, validate);
        }
        Some("stress") => {
            logging::init("task_dispatch=warn");
            let mut worker_sets: Option<Vec<usize>> = None;
            let mut task_sets: Option<Vec<usize>> = None;
            let mut max_delay_ms: Option<u64> = None;
            let mut worker_sets_seen = false;
            let mut task_sets_seen = false;
            let mut max_delay_seen = false;
            let mut validate = false;

            for arg in args {
                if arg == "validate" {
                    validate = true;
                    continue;
                }
                if !worker_sets_seen {
                    worker_sets_seen = true;
                    if arg != "-" {
                        worker_sets = Some(parse_usize_list(&arg).unwrap_or_else(|| {
                            exit_with_usage(&program, &format!("stress: invalid worker_sets value: {arg}"))
                        }));
                    }
                    continue;
                }
                if !task_sets_seen {
                    task_sets_seen = true;
                    if arg != "-" {
                        task_sets = Some(parse_usize_list(&arg).unwrap_or_else(|| {
                            exit_with_usage(&program, &format!("stress: invalid task_sets value: {arg}"))
                        }));
                    }
                    continue;
                }
                if !max_delay_seen {
                    max_delay_seen = true;
                    max_delay_ms = parse_opt(&program, "max_delay_ms", Some(arg));
                    continue;
                }
                exit_with_usage(&program, &format!("stress: unexpected argument: {arg}"));
            }

            sim::run_stress(worker_sets, task_sets, max_delay_ms, validate);
        }
        Some("clock") => {
            let minutes: Vec<u32> = args
                .map(|arg| {
                    arg.parse::<u32>().unwrap_or_else(|_| {
                        exit_with_usage(&program, &format!("clock: invalid minutes value: {arg}"))
                    })
                })
                .collect();
            let minutes = if minutes.is_empty() {
                SAMPLE_MINUTES.to_vec()
            } else {
                minutes
            };
            for value in minutes {
                println!("{}", clock::minutes_to_clock(value));
            }
        }
        Some("--help") | Some("-h") | Some("help") => print_usage(&program),
        Some(other) => {
            exit_with_usage(&program, &format!("unknown command: {other}"));
        }
        None => {
            logging::init("task_dispatch=info");
            if let Err(err) = sim::run_demo() {
                tracing::error!(error = %err, "demo failed");
                eprintln!("demo error: {err}");
            }
        }
    }
}
