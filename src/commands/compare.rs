use anyhow::Result;
use colored::*;
use std::path::PathBuf;

use crate::core::{Priority, Severity};
use crate::engine::{ComparisonEngine, ComparisonOutput, RunOptions};

#[derive(Debug, Clone)]
pub struct CompareConfig {
    pub project_root: PathBuf,
    pub docs: PathBuf,
    pub output: PathBuf,
    pub status_file: Option<PathBuf>,
    pub generate_scripts: bool,
    pub scripts_output: PathBuf,
    pub no_validation: bool,
    pub verbosity: u8,
}

pub fn run_compare(config: CompareConfig) -> Result<()> {
    let verbose = config.verbosity > 0;
    if verbose {
        println!("{}", "Structure Comparison".bold());
        println!("  Project root: {}", config.project_root.display());
        println!("  Documents:    {}", config.docs.display());
        println!("  Report:       {}", config.output.display());
        if let Some(status_file) = &config.status_file {
            println!("  Status file:  {}", status_file.display());
        }
        if config.generate_scripts {
            println!("  Migration scripts: {}", config.scripts_output.display());
        }
        println!();
    }

    let mut engine = ComparisonEngine::from_project(&config.project_root, &config.docs);
    if let Some(status_file) = &config.status_file {
        engine = engine.with_status_file(status_file);
    }

    let output = engine.run_comparison(RunOptions {
        generate_migration_scripts: config.generate_scripts,
        check_validation: !config.no_validation,
    })?;

    engine.save_report(&output.report, &config.output)?;

    if config.generate_scripts && !output.migration_scripts.is_empty() {
        let written = engine.save_migration_scripts(&output.migration_scripts, &config.scripts_output)?;
        println!(
            "{}",
            format!(
                "{} migration scripts saved to {}/",
                written.len(),
                config.scripts_output.display()
            )
            .green()
        );
    }

    print_summary(&output, verbose);
    println!();
    println!(
        "{}",
        format!("Comparison report saved to {}", config.output.display()).green()
    );
    Ok(())
}

fn print_summary(output: &ComparisonOutput, verbose: bool) {
    let comparison = &output.comparison;
    println!();
    println!("{}", "Comparison Summary".bold());
    println!(
        "Overall completion: {:.1}%",
        comparison.completion_percentage
    );
    println!("  {}", format!("Implemented: {}", comparison.implemented_count).green());
    println!("  {}", format!("Partial: {}", comparison.partial_count).yellow());
    println!("  {}", format!("Missing: {}", comparison.missing_count).red());

    if !output.gaps.is_empty() {
        println!();
        println!("{}", format!("Identified {} gaps", output.gaps.len()).bold());
        for tier in Priority::ALL {
            let count = output.gaps.iter().filter(|g| g.priority == tier).count();
            if count == 0 {
                continue;
            }
            let line = format!("{} priority: {}", tier, count);
            let line = match tier {
                Priority::High => line.red(),
                Priority::Medium => line.yellow(),
                Priority::Low => line.blue(),
            };
            println!("  {}", line);
        }
    }

    if !output.conflicts.is_empty() {
        println!();
        println!(
            "{}",
            format!("Found {} potential conflicts", output.conflicts.len()).yellow()
        );
        for tier in Severity::ALL {
            let count = output.conflicts.iter().filter(|c| c.severity == tier).count();
            if count > 0 {
                println!("  {} severity: {}", tier, count);
            }
        }
    }

    if let Some(validation) = &output.validation {
        if !validation.superseded.is_empty() {
            println!();
            println!(
                "{}",
                format!("Found {} superseded suggestions", validation.superseded.len()).blue()
            );
        }
        if !validation.inapplicable.is_empty() {
            println!();
            println!(
                "{}",
                format!(
                    "Found {} potentially inapplicable suggestions",
                    validation.inapplicable.len()
                )
                .yellow()
            );
        }
    }

    if verbose {
        println!();
        println!(
            "Planned {} tasks in {} work packages ({} quick wins)",
            output.tasks.len(),
            output.work_packages.len(),
            output.quick_wins.len()
        );
        for degradation in &output.degradations {
            println!("  {}", degradation.to_string().dimmed());
        }
    }
}
