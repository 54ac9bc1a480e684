// optimizer_service.rs

use amiquip::{
    Connection, ConsumerMessage, ConsumerOptions, Exchange, Publish, QueueDeclareOptions,
    Result as AmiquipResult,
};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::task;

use crate::config::ServiceConfig;
use crate::control_system::traffic_light_controller::TrafficLightController;
use crate::error::OptimizeResult;
use crate::monitoring::report::log_allocation;
use crate::optimizer::optimize_with_timeout;
use crate::shared_data::{Allocation, DemandReport, SignalPlan};

/// Optimizes one report and lays the result out as a plan for its intersection.
pub async fn process_report(
    report: &DemandReport,
    config: &ServiceConfig,
) -> OptimizeResult<(Allocation, SignalPlan)> {
    let allocation = optimize_with_timeout(
        report.readings.clone(),
        config.cycle.clone(),
        config.solve_timeout(),
    )
    .await?;
    let plan = SignalPlan::from_allocation(&report.intersection, report.timestamp, &allocation);
    Ok((allocation, plan))
}

pub fn decode_report(body: &[u8]) -> Result<DemandReport, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Consumes demand reports and publishes a signal plan for each one that solves.
///
/// Reports that fail to decode or optimize are logged and acknowledged; the
/// service never retries them.
pub async fn start_optimizer_service(
    config: ServiceConfig,
    controller: Arc<Mutex<TrafficLightController>>,
) -> Result<(), Box<dyn Error>> {
    let handle = Handle::current();
    task::spawn_blocking(move || -> AmiquipResult<()> {
        let mut connection = Connection::insecure_open(&config.amqp_url)?;
        let channel = connection.open_channel(None)?;
        let exchange = Exchange::direct(&channel);
        let demand_queue =
            channel.queue_declare(config.demand_queue.as_str(), QueueDeclareOptions::default())?;
        let consumer = demand_queue.consume(ConsumerOptions::default())?;
        channel.queue_declare(config.plan_queue.as_str(), QueueDeclareOptions::default())?;
        log::info!(
            "[OptimizerService] Waiting for demand reports on '{}'...",
            config.demand_queue
        );

        for message in consumer.receiver() {
            match message {
                ConsumerMessage::Delivery(delivery) => {
                    match decode_report(&delivery.body) {
                        Ok(report) => {
                            log::debug!("[OptimizerService] Got DemandReport: {:?}", report);
                            match handle.block_on(process_report(&report, &config)) {
                                Ok((allocation, plan)) => {
                                    if let Err(e) = log_allocation(
                                        &config.plan_log_path,
                                        &report.intersection,
                                        report.timestamp,
                                        &allocation,
                                    ) {
                                        log::error!("Error logging allocation: {}", e);
                                    }
                                    match serde_json::to_string(&plan) {
                                        Ok(plan_json) => {
                                            exchange.publish(Publish::new(
                                                plan_json.as_bytes(),
                                                config.plan_queue.as_str(),
                                            ))?;
                                            log::info!(
                                                "[OptimizerService] Published plan for {} ({} phases)",
                                                plan.intersection,
                                                plan.phases.len()
                                            );
                                        }
                                        Err(e) => log::error!("Error encoding plan: {}", e),
                                    }
                                    match controller.lock() {
                                        Ok(mut ctrl) => ctrl.apply_plan(plan),
                                        Err(_) => log::error!("Controller lock poisoned"),
                                    }
                                }
                                Err(e) => log::warn!(
                                    "[OptimizerService] No plan for {}: {}",
                                    report.intersection,
                                    e
                                ),
                            }
                        }
                        Err(e) => log::warn!("[OptimizerService] Undecodable demand report: {}", e),
                    }
                    consumer.ack(delivery)?;
                }
                other => {
                    log::info!("[OptimizerService] Consumer ended: {:?}", other);
                    break;
                }
            }
        }
        connection.close()
    })
    .await??;
    Ok(())
}

/// Publishes one demand report to the configured demand queue.
pub fn publish_demand_report(config: &ServiceConfig, report: &DemandReport) -> AmiquipResult<()> {
    let mut connection = Connection::insecure_open(&config.amqp_url)?;
    let channel = connection.open_channel(None)?;
    let exchange = Exchange::direct(&channel);
    channel.queue_declare(config.demand_queue.as_str(), QueueDeclareOptions::default())?;
    match serde_json::to_string(report) {
        Ok(payload) => {
            exchange.publish(Publish::new(payload.as_bytes(), config.demand_queue.as_str()))?;
        }
        Err(e) => log::error!("Error encoding demand report: {}", e),
    }
    connection.close()
}
