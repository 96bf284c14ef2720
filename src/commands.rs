use crate::model::{month_matrix, parse_date, start_of_week, week_days};
use crate::storage::{save_config, CalendarConfig};
use crate::ui;
use anyhow::{bail, Result};
use chrono::{Datelike, Local, NaiveDate};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("config already exists at {} (use --force to overwrite)", path.display());
    }
    save_config(path, &CalendarConfig::default())?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

pub fn show(config: &CalendarConfig, date: Option<String>, week: bool) -> Result<()> {
    let selected = selected_date(date.as_deref())?;
    let labels = config.week_starts_on.labels();
    if week {
        let start = start_of_week(selected, config.week_starts_on);
        println!("Week of {}", start.format("%Y-%m-%d"));
        println!("{}", labels.map(|l| format!("{:>4}", l)).join(""));
        let row: String = week_days(start)
            .into_iter()
            .map(|d| format_cell(d, selected, true))
            .collect();
        println!("{}", row);
        return Ok(());
    }
    println!("{}", selected.format("%B %Y"));
    println!("{}", labels.map(|l| format!("{:>4}", l)).join(""));
    for row in month_matrix(selected, config.week_starts_on).chunks(7) {
        let line: String = row
            .iter()
            .map(|cell| format_cell(cell.date, selected, cell.in_month))
            .collect();
        println!("{}", line);
    }
    Ok(())
}

pub fn tui(config: CalendarConfig, date: Option<String>) -> Result<()> {
    let selected = selected_date(date.as_deref())?;
    ui::run(config, selected)
}

pub fn init_logging(config: &CalendarConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&config.log_level);
    let filter = EnvFilter::try_new(level.to_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"));
    let file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", config.log_file, e);
            return;
        }
    };
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn selected_date(input: Option<&str>) -> Result<NaiveDate> {
    match input {
        Some(raw) => Ok(parse_date(raw)?),
        None => Ok(Local::now().date_naive()),
    }
}

fn format_cell(date: NaiveDate, selected: NaiveDate, in_month: bool) -> String {
    if date == selected {
        format!(" [{:>2}", date.day())
    } else if in_month {
        format!("{:>4}", date.day())
    } else {
        format!("{:>4}", "·")
    }
}
