use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::time::{Duration, Instant};
use wheel_core::view::WheelView;
use wheel_core::{wedge_index, MOCK_ENTRIES};
use wheel_host::config::parse_entries;
use wheel_host::{SpinCoordinator, SpinState, WheelConfig, WheelEvent};

/// Saved simulation log
#[derive(Serialize, Deserialize)]
struct SpinLog {
    entries: Vec<String>,
    seed: Option<u64>,
    spins: Vec<SpinState>,
}

#[derive(Debug)]
struct SimulateOptions {
    spins: u32,
    duration_ms: u64,
    seed: Option<u64>,
    entries: Vec<String>,
    output: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let command = &args[1];

    match command.as_str() {
        "simulate" => {
            let options = parse_simulate_options(&args[2..]).unwrap_or_else(|e| {
                eprintln!("❌ Error: {}", e);
                std::process::exit(1);
            });
            simulate_command(options);
        }

        "winner" => {
            if args.len() < 3 {
                eprintln!("Usage: {} winner <rotation> [--entries a,b,c]", args[0]);
                eprintln!("Error: Missing required argument");
                std::process::exit(1);
            }

            let rotation: u64 = args[2].parse().unwrap_or_else(|e| {
                eprintln!("❌ Invalid rotation '{}': {}", args[2], e);
                std::process::exit(1);
            });

            let entries = match args.get(3).map(String::as_str) {
                Some("--entries") | Some("-e") => match args.get(4) {
                    Some(list) => parse_entries(list),
                    None => {
                        eprintln!("❌ Error: --entries requires a comma-separated list");
                        std::process::exit(1);
                    }
                },
                Some(other) => {
                    eprintln!("❌ Unknown option: {}", other);
                    std::process::exit(1);
                }
                None => default_entries(),
            };

            winner_command(rotation, &entries);
        }

        "--help" | "-h" => {
            print_usage(&args[0]);
            std::process::exit(0);
        }

        _ => {
            eprintln!("❌ Unknown command: {}", command);
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command> [options]", program);
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  simulate [--spins N] [--duration-ms MS] [--seed S] [--entries a,b,c] [--output FILE]");
    eprintln!("      Run spins against an in-process coordinator and watch them settle");
    eprintln!("      - --spins: number of spins (default 3)");
    eprintln!("      - --duration-ms: spin duration (default 5000)");
    eprintln!("      - --seed: RNG seed for reproducible rotations");
    eprintln!("      - --output: save every settled state as JSON");
    eprintln!();
    eprintln!("  winner <rotation> [--entries a,b,c]");
    eprintln!("      Show which entry sits under the pointer for a rotation");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  {} simulate --spins 2 --duration-ms 500 --seed 42", program);
    eprintln!("  {} winner 3959", program);
}

fn default_entries() -> Vec<String> {
    MOCK_ENTRIES.iter().map(|e| e.to_string()).collect()
}

fn parse_simulate_options(args: &[String]) -> Result<SimulateOptions, String> {
    let mut options = SimulateOptions {
        spins: 3,
        duration_ms: 5_000,
        seed: None,
        entries: default_entries(),
        output: None,
    };

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} requires a value", flag))
        };
        match flag.as_str() {
            "--spins" | "-n" => {
                options.spins = value()?.parse().map_err(|e| format!("--spins: {}", e))?;
            }
            "--duration-ms" | "-d" => {
                options.duration_ms = value()?
                    .parse()
                    .map_err(|e| format!("--duration-ms: {}", e))?;
            }
            "--seed" | "-s" => {
                options.seed = Some(value()?.parse().map_err(|e| format!("--seed: {}", e))?);
            }
            "--entries" | "-e" => {
                options.entries = parse_entries(&value()?);
            }
            "--output" | "-o" => {
                options.output = Some(value()?);
            }
            other => return Err(format!("Unknown option: {}", other)),
        }
    }

    Ok(options)
}

fn simulate_command(options: SimulateOptions) {
    println!("🎡 Giveaway Wheel Simulation");
    println!("{}", "=".repeat(70));
    println!("  Entries: {}", options.entries.join(", "));
    println!("  Spins: {}", options.spins);
    println!("  Spin duration: {} ms", options.duration_ms);
    println!();

    let config = WheelConfig {
        spin_duration: Duration::from_millis(options.duration_ms),
        stale_after: Duration::from_millis(options.duration_ms.saturating_mul(2).max(1)),
        entries: options.entries.clone(),
        ..WheelConfig::default()
    };

    let rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let coordinator = SpinCoordinator::with_rng(config, rng).unwrap_or_else(|e| {
        eprintln!("❌ Invalid configuration: {}", e);
        std::process::exit(1);
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("❌ Failed to start runtime: {}", e);
            std::process::exit(1);
        });

    let settled = runtime.block_on(run_spins(&coordinator, options.spins));

    let log = SpinLog {
        entries: options.entries,
        seed: options.seed,
        spins: settled,
    };

    println!();
    println!("✅ {} spin(s) completed", log.spins.len());

    if let Some(path) = options.output {
        match save_log(&log, &path) {
            Ok(()) => println!("💾 Spin log saved to: {}", path),
            Err(e) => {
                eprintln!("❌ Error saving spin log: {}", e);
                std::process::exit(1);
            }
        }
    }
    println!("{}", "=".repeat(70));
}

async fn run_spins(coordinator: &SpinCoordinator, spins: u32) -> Vec<SpinState> {
    let mut view = WheelView::new(coordinator.entries().to_vec());
    let mut subscription = coordinator.subscribe();
    view.on_open();
    if let Some(WheelEvent::State(initial)) = subscription.try_recv() {
        view.apply(&initial);
    }

    let mut settled = Vec::new();

    for n in 1..=spins {
        let start = Instant::now();
        let started = match coordinator.request_spin() {
            Ok(state) => state,
            Err(e) => {
                eprintln!("❌ Spin {} failed: {}", n, e);
                continue;
            }
        };
        println!("🔄 Spin {}: rotating to {}°", n, started.rotation);

        while let Some(event) = subscription.recv().await {
            let WheelEvent::State(state) = event else {
                continue;
            };
            view.apply(&state);
            if state.is_spinning {
                continue;
            }

            let winner = view.on_transition_end().unwrap_or("<none>").to_string();
            println!(
                "  Settled at {}° ({}° on the face) after {:.2}s",
                state.rotation,
                state.rotation % 360,
                start.elapsed().as_secs_f64()
            );
            println!("  🏆 Winner: {}", winner);
            settled.push(state);
            break;
        }
    }

    settled
}

fn winner_command(rotation: u64, entries: &[String]) {
    match wedge_index(rotation, entries.len()) {
        Some(index) => {
            println!("🎯 Rotation {}° ({}° on the face)", rotation, rotation % 360);
            println!("  Wedge: {} of {}", index, entries.len());
            println!("  Winner: {}", entries[index]);
        }
        None => {
            eprintln!("❌ No entries to pick from");
            std::process::exit(1);
        }
    }
}

fn save_log(log: &SpinLog, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(log)?;
    fs::write(path, json)?;
    Ok(())
}
