use std::error::Error;
use std::fs;
use std::process;

use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pcs::convergence::default_criteria;
use pcs::network::{Activation, Matrix, Network};
use pcs::observer::ResultAdapter;
use pcs::simulation::{run, ExecutionTier, PcsConfig, SimulationResult, Termination};

/// Network description accepted by `pcs run`.
///
/// Only `matrix` is required. Missing vectors default to the source-node
/// setup: all-zero initial state and resting levels, node 0 clamped at 1.0.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NetworkFile {
    matrix: Matrix,
    #[serde(default)]
    initial_state: Option<Vec<Activation>>,
    #[serde(default)]
    resting_levels: Option<Vec<Activation>>,
    #[serde(default)]
    reset: Option<Vec<Activation>>,
    #[serde(default)]
    node_names: Option<Vec<String>>,
    /// Option nodes for the decision read-out.
    #[serde(default)]
    options: Vec<usize>,
    #[serde(default)]
    config: PcsConfig,
}

impl NetworkFile {
    fn into_network(self) -> Result<(Network, PcsConfig, Vec<usize>), Box<dyn Error>> {
        let defaults = Network::from_matrix(self.matrix.clone());
        let mut network = Network::new(
            self.matrix,
            self.initial_state
                .unwrap_or_else(|| defaults.initial_state().to_vec()),
            self.resting_levels
                .unwrap_or_else(|| defaults.resting_levels().to_vec()),
            self.reset.unwrap_or_else(|| defaults.reset().to_vec()),
        )?;
        if let Some(names) = self.node_names {
            network = network.with_node_names(names)?;
        }
        Ok((network, self.config, self.options))
    }
}

struct RunArgs {
    path: String,
    json: bool,
    every: usize,
    max_iterations: Option<usize>,
    tier: Option<ExecutionTier>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let outcome = match args.get(1).map(String::as_str) {
        None | Some("--help" | "-h" | "help") => {
            print_help();
            Ok(())
        }
        Some("demo") => run_demo(),
        Some("run") => parse_run_args(&args[2..]).and_then(run_file),
        Some(other) => {
            eprintln!("Unknown command: {other}");
            print_help();
            process::exit(2);
        }
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn print_help() {
    println!(
        "pcs - Parallel Constraint Satisfaction network simulation

USAGE:
    pcs demo
    pcs run <network.json> [--json] [--every N] [--max-iterations N] [--tier scalar|parallel]
    pcs help

COMMANDS:
    demo    Run the built-in cue/option network and print its trajectory
    run     Simulate a network described in a JSON file

OPTIONS (run):
    --json               Print the full result as JSON
    --every N            Print every N-th iteration in the table (default 1)
    --max-iterations N   Stop after iteration N even if not converged
    --tier T             Net-input execution tier

Set RUST_LOG=pcs=debug (or trace) for simulation logs."
    );
}

fn parse_run_args(args: &[String]) -> Result<RunArgs, Box<dyn Error>> {
    let mut path = None;
    let mut json = false;
    let mut every = 1;
    let mut max_iterations = None;
    let mut tier = None;

    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--every" => every = next_value(&mut it, "--every")?.parse::<usize>()?.max(1),
            "--max-iterations" => {
                max_iterations = Some(next_value(&mut it, "--max-iterations")?.parse::<usize>()?)
            }
            "--tier" => {
                tier = Some(match next_value(&mut it, "--tier")? {
                    "scalar" => ExecutionTier::Scalar,
                    "parallel" => ExecutionTier::Parallel,
                    other => return Err(format!("unknown tier `{other}`").into()),
                })
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option `{flag}`").into()),
            file => path = Some(file.to_string()),
        }
    }

    Ok(RunArgs {
        path: path.ok_or("missing network file")?,
        json,
        every,
        max_iterations,
        tier,
    })
}

fn next_value<'a>(
    it: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<&'a str, Box<dyn Error>> {
    it.next()
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} needs a value").into())
}

fn run_file(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let text = fs::read_to_string(&args.path)?;
    let file: NetworkFile = serde_json::from_str(&text)?;
    let (network, mut cfg, options) = file.into_network()?;

    if let Some(max) = args.max_iterations {
        cfg = cfg.with_max_iterations(max);
    }
    if let Some(tier) = args.tier {
        cfg = cfg.with_execution_tier(tier);
        if tier.effective() != tier {
            warn!("parallel tier requested but the `parallel` feature is off; using scalar");
        }
    }

    info!(path = %args.path, nodes = network.dim(), "loaded network");
    let result = run(&network, &cfg, default_criteria())?;

    if args.json {
        let mut report = serde_json::to_value(result.to_report())?;
        if !options.is_empty() {
            report["decision"] =
                serde_json::to_value(ResultAdapter::new(&result).decision(&options, "default"))?;
        }
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&result, args.every);
        print_summary(&result, &options);
    }
    Ok(())
}

fn run_demo() -> Result<(), Box<dyn Error>> {
    // Source node, four cues of decreasing validity, two competing options.
    let mut m = Matrix::zeros(7);
    for (cue, w) in [0.1015, 0.0470, 0.0126, 0.0034].into_iter().enumerate() {
        m.link(0, cue + 1, w);
    }
    for cue in 1..=3 {
        m.link(cue, 5, 0.01);
        m.link(cue, 6, -0.01);
    }
    m.link(4, 5, -0.01);
    m.link(4, 6, 0.01);
    m.link(5, 6, -0.2);

    let names = ["source", "cue_1", "cue_2", "cue_3", "cue_4", "option_a", "option_b"];
    let network =
        Network::from_matrix(m).with_node_names(names.iter().map(|s| s.to_string()).collect())?;

    let result = run(&network, &PcsConfig::default(), default_criteria())?;
    print_table(&result, 10);
    print_summary(&result, &[5, 6]);
    Ok(())
}

fn print_table(result: &SimulationResult, every: usize) {
    let columns = result.iterations.column_names();
    println!("{}", columns.join("\t"));

    let last = result.iterations_run();
    for row in result.iterations.rows() {
        if row.iteration % every != 0 && row.iteration != last {
            continue;
        }
        let cells: Vec<String> = row.activations.iter().map(|a| format!("{a:+.6}")).collect();
        println!("{}\t{:+.6}\t{}", row.iteration, row.energy, cells.join("\t"));
    }
}

fn print_summary(result: &SimulationResult, options: &[usize]) {
    println!();
    match result.termination {
        Termination::Converged => println!("converged after {} iterations", result.iterations_run()),
        Termination::MaxIterations => println!(
            "stopped at the iteration cap ({}) without converging",
            result.iterations_run()
        ),
        Termination::EmptyNetwork => println!("empty network"),
    }
    for (name, iteration) in &result.convergence {
        println!("  criterion {name:<12} {iteration}");
    }
    println!("final energy {:+.6}", result.final_energy());

    if !options.is_empty() {
        let snap = ResultAdapter::new(result).decision(options, "default");
        println!(
            "choice {}  confidence {:.6}",
            snap.choice.as_deref().unwrap_or("(tie)"),
            snap.confidence
        );
    }
}
