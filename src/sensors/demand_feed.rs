// demand_feed.rs

use rand::Rng;

use crate::shared_data::{current_timestamp, DemandReport, DemandVector, Direction};

pub const COMPASS_DIRECTIONS: [&str; 4] = ["North", "East", "South", "West"];

/// Draws a whole-vehicle count in [0.5 * base, 1.5 * base] for every direction.
pub fn simulate_readings<R: Rng>(
    directions: &[Direction],
    base_volume: f64,
    rng: &mut R,
) -> DemandVector {
    let base = base_volume.max(0.0);
    directions
        .iter()
        .map(|direction| {
            let volume = if base > 0.0 {
                rng.random_range(0.5 * base..=1.5 * base).round()
            } else {
                0.0
            };
            (direction.clone(), volume)
        })
        .collect()
}

pub fn simulate_report<R: Rng>(
    intersection: &str,
    directions: &[Direction],
    base_volume: f64,
    rng: &mut R,
) -> DemandReport {
    DemandReport {
        intersection: intersection.to_string(),
        timestamp: current_timestamp(),
        readings: simulate_readings(directions, base_volume, rng),
    }
}

pub fn compass_directions() -> Vec<Direction> {
    COMPASS_DIRECTIONS.iter().map(|&d| Direction::from(d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn readings_stay_within_band() {
        let mut rng = StdRng::seed_from_u64(7);
        let directions = compass_directions();
        for _ in 0..50 {
            let demand = simulate_readings(&directions, 60.0, &mut rng);
            assert_eq!(demand.len(), 4);
            for reading in demand.iter() {
                assert!((30.0..=90.0).contains(&reading.volume));
                assert_eq!(reading.volume, reading.volume.round());
            }
        }
    }

    #[test]
    fn zero_base_yields_zero_volumes() {
        let mut rng = StdRng::seed_from_u64(1);
        let demand = simulate_readings(&compass_directions(), 0.0, &mut rng);
        assert_eq!(demand.total_volume(), 0.0);
    }

    #[test]
    fn report_carries_intersection_name() {
        let mut rng = StdRng::seed_from_u64(3);
        let report = simulate_report("A", &compass_directions(), 40.0, &mut rng);
        assert_eq!(report.intersection, "A");
        assert_eq!(report.readings.len(), 4);
    }
}
