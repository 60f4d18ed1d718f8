use colored::Colorize;
use filtering_sequence::exercises::{catalog, run_all};
use filtering_sequence::ChapterConfig;
use std::env;
use std::process::ExitCode;

// Usage: filtering_chapter [config.toml]
#[tokio::main]
async fn main() -> ExitCode {
    let config = match env::args().nth(1) {
        Some(path) => match ChapterConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{} {}", "error:".red().bold(), err);
                return ExitCode::FAILURE;
            }
        },
        None => ChapterConfig::default(),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_filter))
        .init();

    for name in &config.exercises {
        if !catalog().iter().any(|exercise| exercise.name == name.as_str()) {
            eprintln!("{} unknown exercise '{}'", "warning:".yellow().bold(), name);
        }
    }

    println!("{}", "Chapter 3: filtering a sequence".bold());
    let reports = run_all(&config).await;

    let mut failed = 0usize;
    for report in &reports {
        match &report.outcome {
            Ok(elapsed) => println!("  {} {} ({:?})", "PASS".green().bold(), report.name, elapsed),
            Err(err) => {
                failed += 1;
                println!("  {} {}: {}", "FAIL".red().bold(), report.name, err);
            }
        }
    }

    let summary = format!("{} passed, {} failed", reports.len() - failed, failed);
    if failed == 0 {
        println!("{}", summary.green());
        ExitCode::SUCCESS
    } else {
        println!("{}", summary.red());
        ExitCode::FAILURE
    }
}
