use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::optimizer::validation::validate_demand;
use crate::shared_data::{Allocation, DemandVector, DirectionReading};

/// One row of the allocation log: a single direction of a single solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub timestamp: u64,
    pub intersection: String,
    pub direction: String,
    pub demand: f64,
    pub ideal: f64,
    pub green: f64,
    pub deviation: f64,
}

/// Reads `direction,volume` rows into a demand vector, keeping file order.
pub fn read_demand_csv(path: impl AsRef<Path>) -> Result<DemandVector, Box<dyn Error>> {
    let file = File::open(path.as_ref())?;
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut readings = Vec::new();
    for result in rdr.deserialize() {
        let reading: DirectionReading = result?;
        readings.push(reading);
    }
    let demand = DemandVector::from(readings);
    validate_demand(&demand)?;
    Ok(demand)
}

// Appends records to a CSV file, writing the header only for a new file.
fn log_to_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<(), Box<dyn Error>> {
    let file_exists = path.exists();
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn allocation_records(
    intersection: &str,
    timestamp: u64,
    allocation: &Allocation,
) -> Vec<AllocationRecord> {
    allocation
        .timings()
        .iter()
        .map(|t| AllocationRecord {
            timestamp,
            intersection: intersection.to_string(),
            direction: t.direction.to_string(),
            demand: t.demand,
            ideal: t.ideal,
            green: t.green,
            deviation: t.deviation(),
        })
        .collect()
}

pub fn log_allocation(
    path: impl AsRef<Path>,
    intersection: &str,
    timestamp: u64,
    allocation: &Allocation,
) -> Result<(), Box<dyn Error>> {
    log_to_csv(
        path.as_ref(),
        &allocation_records(intersection, timestamp, allocation),
    )
}

pub fn read_allocation_log(path: impl AsRef<Path>) -> Result<Vec<AllocationRecord>, Box<dyn Error>> {
    let mut rdr = csv::Reader::from_path(path.as_ref())?;
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: AllocationRecord = result?;
        records.push(record);
    }
    Ok(records)
}

/// "North: 27.27 seconds", one line per direction.
pub fn format_durations(allocation: &Allocation) -> String {
    let mut out = String::new();
    for t in allocation.timings() {
        let _ = writeln!(out, "{}: {:.2} seconds", t.direction, t.green);
    }
    out
}

/// "North: Ideal = 27.27s | Optimized = 27.27s", one line per direction.
pub fn format_comparison(allocation: &Allocation) -> String {
    let mut out = String::new();
    for t in allocation.timings() {
        let _ = writeln!(
            out,
            "{}: Ideal = {:.2}s | Optimized = {:.2}s",
            t.direction, t.ideal, t.green
        );
    }
    out
}

/// Grouped bar chart of ideal vs optimized green time per direction.
pub fn draw_comparison_chart(
    allocation: &Allocation,
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn Error>> {
    if allocation.is_empty() {
        return Err("nothing to plot: allocation has no directions".into());
    }

    let names: Vec<String> = allocation.directions().map(|d| d.to_string()).collect();
    let n = names.len();
    let y_max = allocation
        .timings()
        .iter()
        .map(|t| t.ideal.max(t.green))
        .fold(0.0, f64::max)
        * 1.15;

    let backend = BitMapBackend::new(path.as_ref(), (800, 600));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Ideal vs Optimized Green Time", ("sans-serif", 20))
        .margin(30)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), 0.0..y_max.max(1.0))?;

    // Only whole-number ticks sit under a bar group.
    let direction_label = |x: &f64| {
        let idx = x.round();
        if (x - idx).abs() < 1e-6 && idx >= 0.0 && (idx as usize) < n {
            names[idx as usize].clone()
        } else {
            String::new()
        }
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&direction_label)
        .y_desc("seconds")
        .draw()?;

    let ideal_style = BLUE.mix(0.5).filled();
    let green_style = GREEN.mix(0.8).filled();

    chart
        .draw_series(allocation.timings().iter().enumerate().map(|(i, t)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x, t.ideal)], ideal_style)
        }))?
        .label("ideal")
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], ideal_style));

    chart
        .draw_series(allocation.timings().iter().enumerate().map(|(i, t)| {
            let x = i as f64;
            Rectangle::new([(x, 0.0), (x + 0.4, t.green)], green_style)
        }))?
        .label("optimized")
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], green_style));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    log::info!("Comparison chart saved to {}", path.as_ref().display());
    Ok(())
}
