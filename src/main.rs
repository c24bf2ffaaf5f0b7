//! Fixed-Partition Memory Simulator - Command Line Interface
//!
//! Usage:
//!   pm-sim simulate [OPTIONS] <WORKLOAD>   Run the tick-by-tick simulation
//!   pm-sim sweep [OPTIONS] <WORKLOAD>      Sweep memory configurations
//!   pm-sim info [OPTIONS] <WORKLOAD>       Show configuration and workload info

use clap::{Parser, Subcommand};
use colored::*;

use paged_memory_sim::frames_for_demand;
use paged_memory_sim::prelude::*;

#[derive(Parser)]
#[command(name = "pm-sim")]
#[command(about = "Discrete-time simulator for a fixed-partition paged memory manager")]
#[command(version)]
struct Cli {
    /// Output results in JSON format (for machine parsing)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tick-by-tick simulation
    Simulate {
        /// Workload file: count, then `pid arrival lifetime nseg seg...`
        workload: String,

        /// Total memory size in bytes
        #[arg(short, long, default_value = "2000")]
        memory: u64,

        /// Page/frame size in bytes
        #[arg(short, long, default_value = "100")]
        page: u64,

        /// Tick ceiling before the run is declared deadlocked
        #[arg(long, default_value = "100000")]
        max_ticks: u64,

        /// Load the memory configuration from a TOML file instead of flags
        #[arg(short, long)]
        config: Option<String>,

        /// Print the input queue and memory map after each tick's events
        #[arg(long)]
        map: bool,
    },

    /// Evaluate the workload under a family of configurations
    Sweep {
        /// Workload file
        workload: String,

        /// Memory sizes to sweep
        #[arg(long, value_delimiter = ',', default_value = "2000")]
        memories: Vec<u64>,

        /// Page sizes to sweep
        #[arg(long, value_delimiter = ',', default_value = "100,200,400")]
        pages: Vec<u64>,

        /// Tick ceiling per configuration
        #[arg(long, default_value = "100000")]
        max_ticks: u64,
    },

    /// Show memory geometry and workload summary without simulating
    Info {
        /// Workload file
        workload: String,

        /// Total memory size in bytes
        #[arg(short, long, default_value = "2000")]
        memory: u64,

        /// Page/frame size in bytes
        #[arg(short, long, default_value = "100")]
        page: u64,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let json_output = cli.json;

    match cli.command {
        Commands::Simulate { workload, memory, page, max_ticks, config, map } => {
            run_simulate(&workload, memory, page, max_ticks, config.as_deref(), map, json_output);
        }
        Commands::Sweep { workload, memories, pages, max_ticks } => {
            run_sweep(&workload, memories, pages, max_ticks, json_output);
        }
        Commands::Info { workload, memory, page } => {
            run_info(&workload, memory, page, json_output);
        }
    }
}

fn fail(message: &str, json_output: bool) -> ! {
    if json_output {
        eprintln!("{{\"error\": \"{}\"}}", message);
    } else {
        eprintln!("{}: {}", "Error".red(), message);
    }
    std::process::exit(1);
}

fn load_workload(path: &str, json_output: bool) -> Workload {
    match Workload::from_path(path) {
        Ok(workload) => workload,
        Err(e) => fail(&format!("could not read workload {}: {}", path, e), json_output),
    }
}

fn resolve_config(
    memory: u64,
    page: u64,
    max_ticks: u64,
    config_path: Option<&str>,
    json_output: bool,
) -> SimConfig {
    let config = match config_path {
        Some(path) => match SimConfig::load(path) {
            Ok(config) => config,
            Err(e) => fail(&format!("could not load config {}: {}", path, e), json_output),
        },
        None => SimConfig { memory_size: memory, page_size: page, max_ticks },
    };

    if !config.is_valid() {
        fail(
            &format!(
                "invalid configuration: memory size {} must be a positive multiple of page size {}",
                config.memory_size, config.page_size
            ),
            json_output,
        );
    }
    config
}

/// Writes the reference-style trace: the first event of a tick carries a
/// `t = N:` prefix, later events of the same tick are indented.
struct TraceWriter {
    last_announcement: Option<u64>,
}

impl TraceWriter {
    fn new() -> Self {
        TraceWriter { last_announcement: None }
    }

    fn line(&mut self, event: &Event) -> String {
        let prefix = if self.last_announcement == Some(event.tick) {
            "\t".to_string()
        } else {
            format!("t = {}: ", event.tick)
        };
        self.last_announcement = Some(event.tick);

        let text = match event.kind {
            EventKind::Arrived => format!("Process {} arrives", event.pid),
            EventKind::Admitted => format!("MM moves Process {} to memory", event.pid),
            EventKind::Completed => format!("Process {} completes", event.pid),
        };
        format!("{}{}", prefix, text)
    }
}

fn print_queue(sim: &SimulationEngine) {
    let pids: Vec<String> = sim
        .queue
        .iter()
        .map(|index| sim.registry.get(index).pid.to_string())
        .collect();
    println!("\tInput queue: [ {} ]", pids.join(" "));
}

fn print_map(sim: &SimulationEngine) {
    println!("\tMemory map:");
    for entry in sim.frames.describe() {
        println!("\t\t{}", entry);
    }
}

/// JSON output structure for simulation results
#[derive(serde::Serialize)]
struct SimulationOutput {
    config: SimConfig,
    num_frames: usize,
    outcome: Outcome,
    report: SimulationReport,
    stats: SimulationStats,
    trace: Vec<Event>,
    wall_clock_seconds: f64,
}

fn run_simulate(
    workload_path: &str,
    memory: u64,
    page: u64,
    max_ticks: u64,
    config_path: Option<&str>,
    map: bool,
    json_output: bool,
) {
    let config = resolve_config(memory, page, max_ticks, config_path, json_output);
    let workload = load_workload(workload_path, json_output);

    if !json_output {
        println!("{}", "╔══════════════════════════════════════════════════════╗".cyan());
        println!("{}", "║        Fixed-Partition Memory Simulator              ║".cyan());
        println!("{}", "╚══════════════════════════════════════════════════════╝".cyan());
        println!();
        println!("Configuration:");
        println!("  • Memory size: {} bytes", config.memory_size);
        println!("  • Page size: {} bytes", config.page_size);
        println!("  • Frames: {}", config.num_frames());
        println!("  • Processes: {}", workload.len());
        println!("  • Tick ceiling: {}", config.max_ticks);
        println!();
    }

    let mut sim = SimulationEngine::new(config.clone(), workload.processes());
    let start = std::time::Instant::now();

    if json_output {
        let outcome = sim.run();
        let elapsed = start.elapsed();
        let output = SimulationOutput {
            num_frames: config.num_frames(),
            config,
            outcome,
            report: sim.report(),
            stats: sim.stats.clone(),
            trace: sim.trace().to_vec(),
            wall_clock_seconds: elapsed.as_secs_f64(),
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return;
    }

    let mut writer = TraceWriter::new();
    while sim.outcome().is_none() {
        let events = sim.step();
        for event in &events {
            println!("{}", writer.line(event));
        }
        if map && !events.is_empty() {
            print_queue(&sim);
            print_map(&sim);
        }
    }
    let elapsed = start.elapsed();

    println!();
    match sim.outcome() {
        Some(Outcome::Completed) => println!("{}", "Simulation complete!".green()),
        _ => println!("{}", "DEADLOCK: Max time reached.".red()),
    }
    println!();
    println!("{}", sim.report());
    println!("Wall-clock time: {:.3}s", elapsed.as_secs_f64());
}

/// JSON output for a configuration sweep
#[derive(serde::Serialize)]
struct SweepOutput {
    points: Vec<SweepPoint>,
    best: Option<SweepPoint>,
}

fn run_sweep(
    workload_path: &str,
    memories: Vec<u64>,
    pages: Vec<u64>,
    max_ticks: u64,
    json_output: bool,
) {
    let workload = load_workload(workload_path, json_output);
    let space = SweepSpace { memory_sizes: memories, page_sizes: pages };

    if space.enumerate(max_ticks).is_empty() {
        fail("no valid memory/page combination to sweep", json_output);
    }

    if !json_output {
        println!("{}", "╔══════════════════════════════════════════════════════╗".cyan());
        println!("{}", "║        Memory Configuration Sweep                    ║".cyan());
        println!("{}", "╚══════════════════════════════════════════════════════╝".cyan());
        println!();
        println!("Sweeping {} configuration(s)...", space.enumerate(max_ticks).len());
        println!();
    }

    let explorer = ConfigExplorer::new(space, workload, max_ticks);
    let points = explorer.explore();
    let best = explorer.find_best(&points).cloned();

    if json_output {
        let output = SweepOutput { points, best };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return;
    }

    println!("{:^10} {:^8} {:^8} {:^12} {:^14}", "Memory", "Page", "Frames", "Outcome", "Avg Turnaround");
    println!("──────────────────────────────────────────────────────────");
    for point in &points {
        let avg = match point.average_turnaround {
            Some(avg) => format!("{:.2}", avg),
            None => "-".to_string(),
        };
        println!(
            "{:^10} {:^8} {:^8} {:^12} {:^14}",
            point.config.memory_size,
            point.config.page_size,
            point.config.num_frames(),
            point.outcome.to_string(),
            avg,
        );
    }
    println!();

    match best {
        Some(best) => println!(
            "{} memory={} page={} (average turnaround {:.2})",
            "Best:".green(),
            best.config.memory_size,
            best.config.page_size,
            best.average_turnaround.unwrap_or(f64::NAN),
        ),
        None => println!("{}", "Every configuration deadlocked.".yellow()),
    }
}

/// JSON output for configuration/workload info
#[derive(serde::Serialize)]
struct InfoOutput {
    config: SimConfig,
    num_frames: usize,
    total_capacity: u64,
    processes: usize,
    total_demand: u64,
    max_demand: u64,
    max_demand_frames: usize,
    feasible: bool,
}

fn run_info(workload_path: &str, memory: u64, page: u64, json_output: bool) {
    let config = resolve_config(memory, page, DEFAULT_MAX_TICKS, None, json_output);
    let workload = load_workload(workload_path, json_output);

    let feasible = workload.max_demand() <= config.total_capacity();

    if json_output {
        let info = InfoOutput {
            num_frames: config.num_frames(),
            total_capacity: config.total_capacity(),
            processes: workload.len(),
            total_demand: workload.total_demand(),
            max_demand: workload.max_demand(),
            max_demand_frames: frames_for_demand(workload.max_demand(), config.page_size),
            feasible,
            config,
        };
        println!("{}", serde_json::to_string_pretty(&info).unwrap());
        return;
    }

    println!("{}", "╔══════════════════════════════════════════════════════╗".cyan());
    println!("{}", "║        Configuration & Workload Info                 ║".cyan());
    println!("{}", "╚══════════════════════════════════════════════════════╝".cyan());
    println!();
    println!("Memory geometry:");
    println!("  • Memory size: {} bytes", config.memory_size);
    println!("  • Page size: {} bytes", config.page_size);
    println!("  • Frames: {}", config.num_frames());
    println!();
    println!("Workload:");
    println!("  • Processes: {}", workload.len());
    println!("  • Total demand: {} bytes", workload.total_demand());
    println!(
        "  • Largest demand: {} bytes ({} frame(s))",
        workload.max_demand(),
        frames_for_demand(workload.max_demand(), config.page_size)
    );
    println!();

    if feasible {
        println!("{}", "Every process fits in memory on its own.".green());
    } else {
        println!(
            "{} largest demand {} exceeds capacity {}; the run will deadlock.",
            "Warning:".yellow(),
            workload.max_demand(),
            config.total_capacity()
        );
    }
}
