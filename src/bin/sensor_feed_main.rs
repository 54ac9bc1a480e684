use signal_timing::config::service_config_or_default;
use signal_timing::sensors::demand_feed::{compass_directions, simulate_report};
use signal_timing::service::optimizer_service::publish_demand_report;
use std::env;
use tokio::time::{sleep, Duration};

const INTERSECTIONS: [&str; 4] = ["A", "B", "C", "D"];
const BASE_VOLUME: f64 = 50.0;

#[tokio::main]
async fn main() {
    env_logger::init();

    let path = env::args().nth(1);
    let config = match service_config_or_default(path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return;
        }
    };

    println!("Publishing synthetic demand to '{}'...", config.demand_queue);
    let directions = compass_directions();
    loop {
        for intersection in INTERSECTIONS {
            let report = {
                let mut rng = rand::rng();
                simulate_report(intersection, &directions, BASE_VOLUME, &mut rng)
            };
            log::debug!("Publishing {:?}", report);
            if let Err(e) = publish_demand_report(&config, &report) {
                eprintln!("Error publishing demand report: {}", e);
            }
        }
        sleep(Duration::from_secs(5)).await;
    }
}
