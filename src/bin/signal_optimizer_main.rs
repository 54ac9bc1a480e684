use signal_timing::config::load_cycle_config;
use signal_timing::global_variables::{ALLOCATION_LOG_FILE, COMPARISON_CHART_FILE};
use signal_timing::monitoring::report::{
    draw_comparison_chart, format_comparison, format_durations, log_allocation, read_demand_csv,
};
use signal_timing::optimizer::optimize;
use signal_timing::shared_data::{current_timestamp, CycleConfig, DemandVector};
use std::env;
use std::error::Error;

fn run(demand_path: Option<&str>, config_path: Option<&str>) -> Result<(), Box<dyn Error>> {
    let demand = match demand_path {
        Some(path) => read_demand_csv(path)?,
        None => DemandVector::default_intersection(),
    };
    let config = match config_path {
        Some(path) => load_cycle_config(path)?,
        None => CycleConfig::default(),
    };

    let allocation = optimize(&demand, &config)?;

    println!("Optimized Green Light Durations:");
    print!("{}", format_durations(&allocation));
    println!("\nTarget vs Optimized:");
    print!("{}", format_comparison(&allocation));
    println!("Total deviation: {:.2}s", allocation.total_deviation());

    log_allocation(ALLOCATION_LOG_FILE, "cli", current_timestamp(), &allocation)?;
    if let Err(e) = draw_comparison_chart(&allocation, COMPARISON_CHART_FILE) {
        eprintln!("Could not draw comparison chart: {}", e);
    }
    Ok(())
}

// Usage: signal_optimizer_main [demand.csv] [cycle.json]
fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(e) = run(
        args.first().map(String::as_str),
        args.get(1).map(String::as_str),
    ) {
        eprintln!("Signal optimizer error: {}", e);
        std::process::exit(1);
    }
}
