use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use topic_assignment::{input, report, solve_assignments};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Assign topics to students via LSAP & LBAP
#[derive(Parser)]
#[command(name = "topic-assign")]
#[command(version)]
#[command(
    long_about = "Seats every student on a topic twice: once minimizing the sum of preference ranks (LSAP) and once minimizing the worst rank any student gets (LBAP). Both assignments are exact optima."
)]
struct Cli {
    /// CSV with header: id,name,capacity (capacity optional, defaults to 1)
    topics_file: PathBuf,

    /// CSV with header: name,prio1,prio2,... (each prio is a topic id from topics_file)
    priorities_file: PathBuf,

    /// Output file to write results to, in addition to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("topic_assignment=debug,info")
        } else {
            EnvFilter::new("topic_assignment=warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let topics = input::parse_topics_file(&cli.topics_file)?;
    let priorities = input::parse_priorities_file(&cli.priorities_file, &topics)?;
    input::validate(&topics, &priorities)?;
    info!(
        "{} topics, {} students",
        topics.ids.len(),
        priorities.students.len()
    );

    let assignments = solve_assignments(&topics.ids, &topics.capacities, &priorities.preferences)
        .context("assignment failed")?;
    let text = report::render(&topics, &priorities, &assignments);

    if let Some(path) = &cli.output {
        std::fs::write(path, &text)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    print!("{}", text);
    Ok(())
}
