use signal_timing::config::service_config_or_default;
use signal_timing::control_system::traffic_light_controller::TrafficLightController;
use signal_timing::service::optimizer_service::start_optimizer_service;
use std::env;
use std::sync::{Arc, Mutex};

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

    println!("Starting signal optimizer service...");
    let controller = Arc::new(Mutex::new(TrafficLightController::new()));
    tokio::spawn(TrafficLightController::run_update_loop(Arc::clone(&controller)));
    if let Err(e) = start_optimizer_service(config, controller).await {
        eprintln!("Optimizer service error: {}", e);
    }
}
