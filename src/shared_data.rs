// src/shared_data.rs

use crate::global_variables::{DEFAULT_MIN_GREEN_TIME, DEFAULT_TOTAL_CYCLE_TIME};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Opaque identifier of one independently timed phase (e.g. "North").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Direction(pub String);

impl Direction {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Direction {
    fn from(name: &str) -> Self {
        Direction(name.to_string())
    }
}

impl From<String> for Direction {
    fn from(name: String) -> Self {
        Direction(name)
    }
}

/// Vehicles observed on one direction over the reporting interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionReading {
    pub direction: Direction,
    pub volume: f64,
}

/// Per-direction demand, kept in the order the caller supplied it.
///
/// Construction does not validate; `optimize` rejects empty, duplicated,
/// negative or all-zero vectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DemandVector {
    readings: Vec<DirectionReading>,
}

impl DemandVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four-way intersection used by the reference scenario.
    pub fn default_intersection() -> Self {
        [("North", 50.0), ("East", 80.0), ("South", 60.0), ("West", 30.0)]
            .into_iter()
            .collect()
    }

    pub fn push(&mut self, direction: impl Into<Direction>, volume: f64) {
        self.readings.push(DirectionReading {
            direction: direction.into(),
            volume,
        });
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectionReading> {
        self.readings.iter()
    }

    pub fn directions(&self) -> impl Iterator<Item = &Direction> {
        self.readings.iter().map(|r| &r.direction)
    }

    pub fn volume(&self, direction: &Direction) -> Option<f64> {
        self.readings
            .iter()
            .find(|r| &r.direction == direction)
            .map(|r| r.volume)
    }

    pub fn total_volume(&self) -> f64 {
        self.readings.iter().map(|r| r.volume).sum()
    }
}

impl<D: Into<Direction>> FromIterator<(D, f64)> for DemandVector {
    fn from_iter<I: IntoIterator<Item = (D, f64)>>(iter: I) -> Self {
        let mut demand = DemandVector::new();
        for (direction, volume) in iter {
            demand.push(direction, volume);
        }
        demand
    }
}

impl From<Vec<DirectionReading>> for DemandVector {
    fn from(readings: Vec<DirectionReading>) -> Self {
        Self { readings }
    }
}

/// Lower bound on each direction's green time: one value for all, or one per direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinGreenTime {
    Uniform(f64),
    PerDirection(BTreeMap<Direction, f64>),
}

impl MinGreenTime {
    pub fn for_direction(&self, direction: &Direction) -> Option<f64> {
        match self {
            MinGreenTime::Uniform(value) => Some(*value),
            MinGreenTime::PerDirection(map) => map.get(direction).copied(),
        }
    }
}

impl Default for MinGreenTime {
    fn default() -> Self {
        MinGreenTime::Uniform(DEFAULT_MIN_GREEN_TIME)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Seconds all greens must add up to.
    pub total_cycle_time: f64,
    pub min_green_time: MinGreenTime,
}

impl CycleConfig {
    pub fn new(total_cycle_time: f64, min_green_time: f64) -> Self {
        Self {
            total_cycle_time,
            min_green_time: MinGreenTime::Uniform(min_green_time),
        }
    }

    pub fn with_min_green_per_direction(
        total_cycle_time: f64,
        minimums: impl IntoIterator<Item = (Direction, f64)>,
    ) -> Self {
        Self {
            total_cycle_time,
            min_green_time: MinGreenTime::PerDirection(minimums.into_iter().collect()),
        }
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            total_cycle_time: DEFAULT_TOTAL_CYCLE_TIME,
            min_green_time: MinGreenTime::default(),
        }
    }
}

/// Outcome for one direction: what it asked for, what it would ideally get, what it got.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionTiming {
    pub direction: Direction,
    pub demand: f64,
    pub min_green: f64,
    pub ideal: f64,
    pub green: f64,
}

impl DirectionTiming {
    pub fn deviation(&self) -> f64 {
        (self.green - self.ideal).abs()
    }
}

/// Green time per direction for one cycle, in the same order as the demand it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub cycle_time: f64,
    timings: Vec<DirectionTiming>,
}

impl Allocation {
    pub(crate) fn new(cycle_time: f64, timings: Vec<DirectionTiming>) -> Self {
        Self {
            cycle_time,
            timings,
        }
    }

    pub fn timings(&self) -> &[DirectionTiming] {
        &self.timings
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    pub fn directions(&self) -> impl Iterator<Item = &Direction> {
        self.timings.iter().map(|t| &t.direction)
    }

    pub fn timing(&self, direction: &Direction) -> Option<&DirectionTiming> {
        self.timings.iter().find(|t| &t.direction == direction)
    }

    pub fn green(&self, direction: &Direction) -> Option<f64> {
        self.timing(direction).map(|t| t.green)
    }

    pub fn ideal(&self, direction: &Direction) -> Option<f64> {
        self.timing(direction).map(|t| t.ideal)
    }

    pub fn total_green(&self) -> f64 {
        self.timings.iter().map(|t| t.green).sum()
    }

    /// Sum of |green - ideal|, the quantity the optimizer minimizes.
    pub fn total_deviation(&self) -> f64 {
        self.timings.iter().map(DirectionTiming::deviation).sum()
    }
}

/// A demand sample for one intersection, as published by the sensor side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandReport {
    pub intersection: String,
    pub timestamp: u64,
    pub readings: DemandVector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedPhase {
    pub direction: Direction,
    /// Offset into the cycle at which this direction turns green.
    pub start: f64,
    pub green: f64,
}

impl PlannedPhase {
    pub fn end(&self) -> f64 {
        self.start + self.green
    }
}

/// An allocation laid out as consecutive phases within one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPlan {
    pub intersection: String,
    pub timestamp: u64,
    pub cycle_time: f64,
    pub phases: Vec<PlannedPhase>,
}

impl SignalPlan {
    pub fn from_allocation(intersection: &str, timestamp: u64, allocation: &Allocation) -> Self {
        let mut start = 0.0;
        let mut phases = Vec::with_capacity(allocation.len());
        for timing in allocation.timings() {
            phases.push(PlannedPhase {
                direction: timing.direction.clone(),
                start,
                green: timing.green,
            });
            start += timing.green;
        }

        Self {
            intersection: intersection.to_string(),
            timestamp,
            cycle_time: allocation.cycle_time,
            phases,
        }
    }
}

pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
