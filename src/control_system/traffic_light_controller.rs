use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};

use crate::shared_data::{Direction, SignalPlan};

/// Runs one intersection through its current plan, second by second.
#[derive(Debug, Clone)]
pub struct IntersectionController {
    pub plan: SignalPlan,
    pub elapsed_in_cycle: f64,
}

impl IntersectionController {
    pub fn new(plan: SignalPlan) -> Self {
        Self {
            plan,
            elapsed_in_cycle: 0.0,
        }
    }

    // Advances the cycle clock, wrapping at the end of the cycle.
    pub fn update(&mut self, seconds: f64) {
        if self.plan.cycle_time <= 0.0 {
            return;
        }
        self.elapsed_in_cycle = (self.elapsed_in_cycle + seconds).rem_euclid(self.plan.cycle_time);
    }

    /// Direction holding the green `t` seconds into the cycle (wrapped).
    pub fn green_direction_at(&self, t: f64) -> Option<&Direction> {
        if self.plan.cycle_time <= 0.0 {
            return None;
        }
        let offset = t.rem_euclid(self.plan.cycle_time);
        self.plan
            .phases
            .iter()
            .find(|phase| offset >= phase.start && offset < phase.end())
            .map(|phase| &phase.direction)
    }

    pub fn current_direction(&self) -> Option<&Direction> {
        self.green_direction_at(self.elapsed_in_cycle)
    }

    // Swaps in a new plan, keeping the position within the cycle when it still fits.
    pub fn replace_plan(&mut self, plan: SignalPlan) {
        if plan.cycle_time > 0.0 {
            self.elapsed_in_cycle = self.elapsed_in_cycle.rem_euclid(plan.cycle_time);
        } else {
            self.elapsed_in_cycle = 0.0;
        }
        log::info!(
            "Intersection {} switching to plan from t={} ({} phases over {:.2}s)",
            plan.intersection,
            plan.timestamp,
            plan.phases.len(),
            plan.cycle_time
        );
        self.plan = plan;
    }
}

/// Latest signal plan per intersection, keyed by intersection name.
#[derive(Debug, Default)]
pub struct TrafficLightController {
    pub controllers: HashMap<String, IntersectionController>,
}

impl TrafficLightController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `plan`, replacing whatever the intersection ran before.
    /// Plans older than the one already installed are ignored.
    pub fn apply_plan(&mut self, plan: SignalPlan) {
        match self.controllers.get_mut(&plan.intersection) {
            Some(ctrl) => {
                if plan.timestamp < ctrl.plan.timestamp {
                    log::debug!(
                        "Ignoring stale plan for {} (t={} < t={})",
                        plan.intersection,
                        plan.timestamp,
                        ctrl.plan.timestamp
                    );
                    return;
                }
                ctrl.replace_plan(plan);
            }
            None => {
                log::info!("Intersection {} now under plan control", plan.intersection);
                self.controllers
                    .insert(plan.intersection.clone(), IntersectionController::new(plan));
            }
        }
    }

    pub fn plan_for(&self, intersection: &str) -> Option<&SignalPlan> {
        self.controllers.get(intersection).map(|ctrl| &ctrl.plan)
    }

    pub fn green_direction_at(&self, intersection: &str, t: f64) -> Option<&Direction> {
        self.controllers.get(intersection)?.green_direction_at(t)
    }

    pub fn current_green(&self, intersection: &str) -> Option<&Direction> {
        self.controllers.get(intersection)?.current_direction()
    }

    pub fn update_all(&mut self, seconds: f64) {
        for controller in self.controllers.values_mut() {
            controller.update(seconds);
        }
    }

    /// Advances every intersection's cycle clock once per second.
    /// Stops if the controller lock is poisoned.
    pub async fn run_update_loop(controller: Arc<Mutex<Self>>) {
        loop {
            {
                let mut ctrl = match controller.lock() {
                    Ok(ctrl) => ctrl,
                    Err(_) => {
                        log::error!("Controller lock poisoned, stopping update loop");
                        return;
                    }
                };
                ctrl.update_all(1.0);
                for (intersection, state) in &ctrl.controllers {
                    if let Some(direction) = state.current_direction() {
                        log::debug!(
                            "[{}] {:.0}s into cycle, green: {}",
                            intersection,
                            state.elapsed_in_cycle,
                            direction
                        );
                    }
                }
            }
            sleep(Duration::from_secs(1)).await;
        }
    }
}
