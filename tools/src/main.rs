//! churn-runner: headless churn analytics dashboard.
//!
//! Usage:
//!   churn-runner --seed 71313 --customers 1200
//!   churn-runner --data customers.json --contract "Month-to-month" --tenure-max 12
//!   churn-runner --config analytics.json --ipc-mode

use anyhow::{Context, Result};
use churn_core::{
    command::DashboardCommand,
    config::AnalyticsConfig,
    customer::{load_collection, Contract, InternetService},
    dashboard::{ChurnDashboard, DashboardView},
    explain::explain,
    filter::{FilterCriteria, Selection},
    what_if::WhatIfParams,
};
use serde::de::DeserializeOwned;
use std::env;
use std::io::{self, BufRead, Write};
use std::time::Duration;

const KPI_TIMEOUT: Duration = Duration::from_secs(2);
const SUMMARY_RISK_ROWS: usize = 10;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Command { command: DashboardCommand },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");

    let mut config = match string_arg(&args, "--config") {
        Some(path) => AnalyticsConfig::load(path)?,
        None => AnalyticsConfig::default(),
    };
    config.dataset.seed = parse_arg(&args, "--seed", config.dataset.seed);
    config.dataset.size = parse_arg(&args, "--customers", config.dataset.size);

    let mut dashboard = match string_arg(&args, "--data") {
        Some(path) => {
            let rows = load_collection(path).with_context(|| format!("loading {path}"))?;
            ChurnDashboard::new(config, rows)
        }
        None => ChurnDashboard::demo(config),
    }
    .with_offload()?;

    dashboard.set_filters(filters_from_args(&args)?);
    let defaults = WhatIfParams::from_config(&dashboard.config.what_if);
    dashboard.set_what_if(WhatIfParams {
        pct_to_one_year:     parse_arg(&args, "--to-one-year", defaults.pct_to_one_year),
        pct_to_two_year:     parse_arg(&args, "--to-two-year", defaults.pct_to_two_year),
        cost_per_conversion: parse_arg(&args, "--cost", defaults.cost_per_conversion),
    });
    let cutoff = parse_arg(&args, "--risk-cut", dashboard.config.risk.cutoff);
    dashboard.set_risk_cutoff(cutoff);

    if ipc_mode {
        run_ipc_loop(&mut dashboard)?;
    } else {
        let view = settled_view(&mut dashboard)?;
        print_summary(&dashboard, &view);
    }

    Ok(())
}

fn settled_view(dashboard: &mut ChurnDashboard) -> Result<DashboardView> {
    let mut view = dashboard.recompute()?;
    if let Some(kpis) = dashboard.settle_kpis(KPI_TIMEOUT)? {
        // Settled KPIs answer the request this recompute submitted.
        view.kpis = Some(kpis);
        view.kpi_seq = view.pending_seq;
    } else {
        log::warn!("KPI worker did not answer within {KPI_TIMEOUT:?}");
    }
    Ok(view)
}

fn run_ipc_loop(dashboard: &mut ChurnDashboard) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => {
                let view = settled_view(dashboard)?;
                writeln!(stdout, "{}", serde_json::to_string(&view)?)?;
            }
            IpcCommand::Command { command } => {
                if let Err(e) = dashboard.apply(command) {
                    write_error(&mut stdout, &e.to_string())?;
                    continue;
                }
                let view = settled_view(dashboard)?;
                writeln!(stdout, "{}", serde_json::to_string(&view)?)?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn write_error(out: &mut impl Write, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(out, "{}", err_json)?;
    out.flush()?;
    Ok(())
}

fn print_summary(dashboard: &ChurnDashboard, view: &DashboardView) {
    println!("Churn Desk — churn-runner");
    println!("  customers loaded: {}", dashboard.data().len());
    println!("  filters:          {}", serde_json::to_string(&view.filters).unwrap_or_default());
    println!();

    println!("=== KPIs ===");
    match view.kpis {
        Some(k) => {
            println!("  customers:   {}", k.count);
            println!("  churn:       {:.1}%", k.churn);
            println!("  avg monthly: ${:.2}", k.avg_monthly);
        }
        None => println!("  (worker pending)"),
    }

    println!();
    println!("=== COHORTS (churn %, n) ===");
    for (title, stats) in [
        ("tenure", &view.cohorts.tenure),
        ("contract", &view.cohorts.contract),
        ("internet", &view.cohorts.internet),
    ] {
        let cells: Vec<String> = stats
            .iter()
            .map(|s| {
                if s.n == 0 {
                    format!("{}: —", s.label)
                } else {
                    format!("{}: {:.0}% (n={})", s.label, s.churn_rate, s.n)
                }
            })
            .collect();
        println!("  {title:<9} {}", cells.join(" | "));
    }

    println!();
    println!("=== DRIVERS (baseline {:.1}%) ===", view.baseline_churn);
    if view.drivers.is_empty() {
        println!("  (no segment with enough customers)");
    }
    for (rank, d) in view.drivers.iter().enumerate() {
        println!(
            "  {}. {}: {:.1}% churn (lift x{:.2}, n={})",
            rank + 1, d.name, d.rate, d.lift, d.n
        );
    }

    println!();
    println!("=== HIGHEST RISK (cutoff {}) ===", view.risk_cutoff);
    for row in view.risk_table.iter().take(SUMMARY_RISK_ROWS) {
        let c = &row.customer;
        println!(
            "  {} score={:>3} at_risk={:<3} {:<14} tenure={:>2} ${:>6.2} {:<11} churned={}",
            c.id,
            row.score,
            if row.at_risk { "yes" } else { "no" },
            c.contract.label(),
            c.tenure_months,
            c.monthly_charge,
            c.internet_service.label(),
            if c.churned { "yes" } else { "no" },
        );
    }

    if let Some(top) = view.risk_table.first() {
        let explanation = explain(&top.customer);
        println!();
        println!("=== WHY {} SCORES {} ===", explanation.customer_id, explanation.total);
        for f in explanation.visible_factors() {
            println!("  {:<28} +{}", f.label, f.points);
        }
    }

    let r = &view.roi;
    println!();
    println!(
        "=== WHAT-IF ({}% → one year, {}% → two year, ${:.2}/conversion) ===",
        view.what_if.pct_to_one_year, view.what_if.pct_to_two_year, view.what_if.cost_per_conversion
    );
    println!("  current churn:   {:.1}%", r.current);
    println!("  simulated churn: {:.1}%", r.simulated);
    println!("  delta:           −{:.1} pts", r.delta_pts);
    println!("  saved customers: {}", r.saved_customers);
    println!("  converted:       {}", r.converted_count);
    match r.roi {
        Some(roi) => println!("  ROI:             {roi:.0}%"),
        None => println!("  ROI:             —"),
    }
}

fn filters_from_args(args: &[String]) -> Result<FilterCriteria> {
    let defaults = FilterCriteria::default();
    Ok(FilterCriteria {
        contract:         selection_arg::<Contract>(args, "--contract")?,
        internet_service: selection_arg::<InternetService>(args, "--internet")?,
        tenure_min:       parse_arg(args, "--tenure-min", defaults.tenure_min),
        tenure_max:       parse_arg(args, "--tenure-max", defaults.tenure_max),
    })
}

/// Parse a categorical filter using its wire name ("All", "Month-to-month", ...).
fn selection_arg<T: DeserializeOwned>(args: &[String], flag: &str) -> Result<Selection<T>> {
    match string_arg(args, flag) {
        Some(raw) => serde_json::from_value(serde_json::Value::String(raw.to_string()))
            .with_context(|| format!("invalid value for {flag}: {raw}")),
        None => Ok(Selection::All),
    }
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
