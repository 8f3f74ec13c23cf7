mod cli;
#[cfg(test)]
mod cli_tests;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, JobOverrides, OutputFormat};
use gridpoint::extract::{PointQuery, import_series};
use gridpoint::info::{
    get_file_info, print_file_info_csv, print_file_info_human, print_file_info_json,
    print_file_info_yaml,
};
use gridpoint::input::JobConfig;
use gridpoint::log::{config_echo, show_farewell_with_timing, show_greeting, show_trend_report};
use gridpoint::series::TimeSeries;
use gridpoint::{RunOptions, run_job};
use log::{LevelFilter, info};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = dispatch(cli) {
        eprintln!("{}", failure_message(&e));
        std::process::exit(1);
    }
}

/// One line naming the failure and every context layer above it.
fn failure_message(err: &anyhow::Error) -> String {
    format!("Error: {:#}", err)
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            point,
            plot_output,
            parquet_output,
            rounding,
            dry_run,
        } => {
            let overrides = JobOverrides {
                point,
                plot_output,
                parquet_output,
                rounding,
            };
            run(cli.config.as_ref(), &overrides, dry_run, cli.quiet)
        }
        Commands::Extract {
            directory,
            filter,
            variable,
            point,
            format,
            group,
            axis_order,
            rounding,
            no_rounding,
        } => {
            let mut layout = gridpoint::input::DatasetFormat::from(format).layout();
            if let Some(group) = group {
                layout.group = if group.is_empty() { None } else { Some(group) };
            }
            if let Some(order) = axis_order {
                layout.axis_order = order.into();
            }
            let query = PointQuery {
                target: point,
                layout,
                rounding: if no_rounding { None } else { Some(rounding) },
                progress: !cli.quiet,
            };
            let series = import_series(&directory, &filter, &variable, &query)
                .with_context(|| format!("Failed to extract '{}' from {}", variable, directory.display()))?;
            print_series(&series, cli.output_format)
        }
        Commands::Info {
            file,
            detailed,
            variable,
            format,
        } => {
            let info = get_file_info(&file, variable.as_deref(), detailed)?;
            match format.unwrap_or(cli.output_format) {
                OutputFormat::Human => print_file_info_human(&info),
                OutputFormat::Json => print_file_info_json(&info)?,
                OutputFormat::Yaml => print_file_info_yaml(&info)?,
                OutputFormat::Csv => print_file_info_csv(&info)?,
            }
            Ok(())
        }
        Commands::Validate {
            config_file,
            detailed,
        } => validate(config_file.or(cli.config), detailed, cli.quiet),
        Commands::Template {
            template_type,
            output,
            format,
        } => {
            let text = cli::render_template(template_type, format)?;
            write_output(output, &text)
        }
        Commands::Completions { shell, output } => {
            let mut buffer = Vec::new();
            clap_complete::generate(shell, &mut Cli::command(), "gridpoint", &mut buffer);
            write_output(output, &String::from_utf8_lossy(&buffer))
        }
    }
}

fn run(
    config_path: Option<&PathBuf>,
    overrides: &JobOverrides,
    dry_run: bool,
    quiet: bool,
) -> Result<()> {
    let start_time = Instant::now();

    if !quiet {
        let shown = config_path
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        show_greeting(&shown);
    }

    let config = cli::load_job(config_path, overrides)?;
    config.validate().context("Invalid job file")?;
    if !quiet {
        config_echo(&config);
    }

    let options = RunOptions {
        progress: !quiet,
        skip_outputs: dry_run,
    };
    let report = run_job(&config, &options)?;

    if !quiet {
        show_trend_report(&report.series);
        if let Some(chart) = &report.chart {
            println!("\nChart written to: {}", chart);
        }
        if let Some(parquet) = &report.parquet {
            println!("Series exported to: {}", parquet);
        }
        show_farewell_with_timing(start_time.elapsed());
    }
    Ok(())
}

fn validate(config_path: Option<PathBuf>, detailed: bool, quiet: bool) -> Result<()> {
    let Some(path) = config_path else {
        bail!("No job file given; pass a path or use --config");
    };
    let config = JobConfig::from_file(&path)
        .with_context(|| format!("Failed to load job file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Job file {} is invalid", path.display()))?;

    if detailed {
        let missing = config.missing_directories();
        if !missing.is_empty() {
            let listed: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
            bail!("Dataset directories not found: {}", listed.join(", "));
        }
    }

    info!("Validated {}", path.display());
    if !quiet {
        println!("✓ {} is valid", path.display());
    }
    Ok(())
}

fn print_series(series: &TimeSeries, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for (time, value) in series.iter() {
                println!("{}  {}", time.format("%Y-%m-%d %H:%M:%S"), value);
            }
            println!("{} samples", series.len());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(series)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(series)?),
        OutputFormat::Csv => {
            println!("time,value");
            for (time, value) in series.iter() {
                println!("{},{}", time.format("%Y-%m-%dT%H:%M:%S"), value);
            }
        }
    }
    Ok(())
}

fn write_output(output: Option<PathBuf>, text: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(&path, text)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            Ok(())
        }
    }
}
