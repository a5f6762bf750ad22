//! Runtime Tester - cluster diagnostic checks from the command line
//!
//! ## Usage
//!
//! ```bash
//! # Run a plan and print a table report
//! runtime-tester run plans/sample.yaml
//!
//! # Override variables, skip checks, write JSON
//! runtime-tester run plans/sample.yaml --var ZK_HOST=zk1 --skip gateway -f json -o report.json
//!
//! # Show the checks of a plan in display order
//! runtime-tester list plans/sample.yaml --detailed
//!
//! # Validate a plan
//! runtime-tester validate plans/sample.yaml
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

mod cli;

use cli::Args;
use runtime_tester::config::{self, AppConfig, ConfigFile, EnvConfig, TestPlan};
use runtime_tester::executor::{callback, BoundedPool, RuntimeTester};
use runtime_tester::output::{write_report_to_file, OutputFormat, ResultFormatter, RunReport};
use runtime_tester::utils::logger::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let mut config = AppConfig::resolve()?;
    if args.no_color {
        config.color = false;
    }

    init_logger(LogLevel::resolve(args.verbose, &config.log_level));

    match args.command {
        cli::Command::Run(run_args) => run_plan(run_args, &config).await,
        cli::Command::List(list_args) => {
            list_checks(list_args, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        cli::Command::Validate(validate_args) => {
            validate_plan(validate_args)?;
            Ok(ExitCode::SUCCESS)
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_plan(args: cli::RunArgs, config: &AppConfig) -> Result<ExitCode> {
    let plan = TestPlan::load(&args.plan)?;
    for (id, dependency) in plan.unknown_dependencies() {
        warn!("Check '{}' depends on unknown check '{}'", id, dependency);
    }

    let format_name = args.format.as_deref().unwrap_or(&config.format);
    let format = OutputFormat::from_str(format_name)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {format_name}"))?;

    let mut target = plan.target.clone();
    target.variables.extend(cli::parse_vars(&args.vars)?);
    target.disabled.extend(args.skip.iter().cloned());
    target.resolve_timeout(args.timeout, config.connect_timeout_secs);
    let target_name = target.name.clone();

    let max_concurrent = args.concurrent.unwrap_or(config.max_concurrent);
    let tester = RuntimeTester::new(Arc::new(BoundedPool::current(max_concurrent)))
        .with_tests(plan.build_tests());

    info!(
        "Testing {} with {} checks ({} at a time)",
        target_name,
        tester.tests().len(),
        max_concurrent
    );

    let progress = if args.quiet {
        callback::no_progress()
    } else {
        let formatter = ResultFormatter::new(format).no_color();
        callback::callback(move |snapshot| {
            if !snapshot.done {
                info!("{}", formatter.format_progress(&snapshot));
            }
        })
    };

    let last = tester.run(Arc::new(target), progress).await?;
    let report = RunReport::new(target_name, last);

    let mut formatter = ResultFormatter::new(format).with_comparator(config.comparator());
    if !config.color {
        formatter = formatter.no_color();
    }
    println!("{}", formatter.format_report(&report)?);

    if let Some(output) = &args.output {
        write_report_to_file(output, &report, format, config.comparator())?;
        info!("Report saved to {}", output);
    }

    if report.counts.failed > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn list_checks(args: cli::ListArgs, config: &AppConfig) -> Result<()> {
    let plan = TestPlan::load(&args.plan)?;
    let mut units = plan.units();
    config.comparator().sort_units(&mut units);

    println!("\nChecks for {} ({} total)", plan.target.name, units.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut current_module = "";
    for unit in &units {
        if unit.module != current_module {
            println!("\n{}:", unit.module);
            println!("──────────────────────────────────────────────────────────────────────");
            current_module = &unit.module;
        }

        if args.detailed {
            let kind = plan
                .checks
                .iter()
                .find(|c| c.id == unit.id)
                .map(|c| c.kind.name())
                .unwrap_or("?");
            let init = if unit.config_init { " [init]" } else { "" };
            println!("  {:20} {:30} ({}){}", unit.id, unit.name, kind, init);
            if !unit.dependencies.is_empty() {
                let deps: Vec<&str> = unit.dependencies.iter().map(String::as_str).collect();
                println!("  {:20} after: {}", "", deps.join(", "));
            }
        } else {
            println!("  {:20} {}", unit.id, unit.name);
        }
    }
    println!();

    Ok(())
}

fn validate_plan(args: cli::ValidateArgs) -> Result<()> {
    match TestPlan::load(&args.plan) {
        Ok(plan) => {
            println!(
                "✓ Plan is valid: {} ({} checks)",
                args.plan,
                plan.checks.len()
            );
            for (id, dependency) in plan.unknown_dependencies() {
                println!("  ! '{id}' depends on unknown check '{dependency}' and will never run");
            }
            Ok(())
        }
        Err(e) => {
            println!("✗ Plan is invalid: {}", args.plan);
            println!("  Error: {e:#}");
            Err(e)
        }
    }
}

fn manage_config(args: cli::ConfigArgs) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = output
                .map(|o| config::expand_path(&o))
                .unwrap_or_else(ConfigFile::user_path);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {}. Use --force to overwrite.",
                    path.display()
                );
            }

            ConfigFile::default().save(&path)?;
            println!("✓ Configuration file created: {}", path.display());
        }

        cli::ConfigAction::Show { env, format } => {
            if env {
                config::print_env_help();
                let current = EnvConfig::load();
                if current.has_any() {
                    println!("\nCurrently set:\n  {current:?}");
                }
            } else {
                let mut file = match ConfigFile::find() {
                    Some(path) => {
                        println!("# {}", display_path(&path));
                        ConfigFile::load(&path)?
                    }
                    None => ConfigFile::default(),
                };
                EnvConfig::load().apply(&mut file.app);

                let output = if format == "json" {
                    serde_json::to_string_pretty(&file)?
                } else {
                    serde_yaml::to_string(&file)?
                };
                println!("{output}");
            }
        }
    }

    Ok(())
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
