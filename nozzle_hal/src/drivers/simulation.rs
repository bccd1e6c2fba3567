//! Simulation driver.
//!
//! A software rotary stage for development and testing without hardware.
//! Moves complete instantly; the reported position is always the last
//! commanded one.

use nozzle_common::actuator::{ActuatorError, ActuatorPort};
use nozzle_common::config::ActuatorConfig;
use tracing::{debug, info};

/// Registered driver name.
pub const DRIVER_NAME: &str = "simulation";

/// Number of axes the simulated controller exposes.
pub const SIM_AXES: usize = 4;

/// Simulated stage implementing the `ActuatorPort` trait.
#[derive(Debug)]
pub struct SimulationDriver {
    positions: [f64; SIM_AXES],
    velocity_limit: f64,
    acceleration_limit: f64,
    /// Number of relative moves issued (diagnostics).
    move_count: u64,
    closed: bool,
}

impl SimulationDriver {
    /// Create a stage with every axis at 0°.
    pub fn new() -> Self {
        Self {
            positions: [0.0; SIM_AXES],
            velocity_limit: 0.0,
            acceleration_limit: 0.0,
            move_count: 0,
            closed: false,
        }
    }

    /// Configured `(velocity, acceleration)` limits.
    pub fn limits(&self) -> (f64, f64) {
        (self.velocity_limit, self.acceleration_limit)
    }

    /// Number of `move_by` calls served.
    pub fn move_count(&self) -> u64 {
        self.move_count
    }

    /// Whether `close()` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn axis_mut(&mut self, axis: usize) -> Result<&mut f64, ActuatorError> {
        if self.closed {
            return Err(ActuatorError::Closed);
        }
        self.positions.get_mut(axis).ok_or_else(|| {
            ActuatorError::CommunicationError(format!(
                "axis {axis} out of range (simulated stage has {SIM_AXES})"
            ))
        })
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for SimulationDriver {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn configure(
        &mut self,
        velocity_limit: f64,
        acceleration_limit: f64,
    ) -> Result<(), ActuatorError> {
        if self.closed {
            return Err(ActuatorError::Closed);
        }
        self.velocity_limit = velocity_limit;
        self.acceleration_limit = acceleration_limit;
        info!(
            "Simulated stage limits: velocity={} acceleration={}",
            velocity_limit, acceleration_limit
        );
        Ok(())
    }

    fn move_to(&mut self, axis: usize, angle: f64) -> Result<(), ActuatorError> {
        *self.axis_mut(axis)? = angle;
        debug!("sim move_to axis={} angle={}", axis, angle);
        Ok(())
    }

    fn move_by(&mut self, axis: usize, delta: f64) -> Result<(), ActuatorError> {
        *self.axis_mut(axis)? += delta;
        self.move_count += 1;
        Ok(())
    }

    fn get_position(&mut self, axis: usize) -> Result<f64, ActuatorError> {
        self.axis_mut(axis).map(|p| *p)
    }

    fn close(&mut self) -> Result<(), ActuatorError> {
        if self.closed {
            return Err(ActuatorError::Closed);
        }
        self.closed = true;
        info!(
            "Simulated stage closed after {} relative moves",
            self.move_count
        );
        Ok(())
    }
}

/// Factory function to create a simulation driver instance.
pub fn create_driver(_config: &ActuatorConfig) -> Result<Box<dyn ActuatorPort>, ActuatorError> {
    Ok(Box::new(SimulationDriver::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_update_position() {
        let mut sim = SimulationDriver::new();
        sim.configure(500.0, 250.0).unwrap();
        assert_eq!(sim.limits(), (500.0, 250.0));

        sim.move_to(0, -32.0).unwrap();
        assert_eq!(sim.get_position(0).unwrap(), -32.0);

        sim.move_by(0, 360.0).unwrap();
        assert_eq!(sim.get_position(0).unwrap(), 328.0);
        assert_eq!(sim.move_count(), 1);

        // Other axes untouched.
        assert_eq!(sim.get_position(1).unwrap(), 0.0);
    }

    #[test]
    fn zero_delta_is_noop() {
        let mut sim = SimulationDriver::new();
        sim.move_to(0, 148.0).unwrap();
        sim.move_by(0, 0.0).unwrap();
        assert_eq!(sim.get_position(0).unwrap(), 148.0);
    }

    #[test]
    fn axis_out_of_range() {
        let mut sim = SimulationDriver::new();
        assert!(matches!(
            sim.move_by(SIM_AXES, 1.0),
            Err(ActuatorError::CommunicationError(_))
        ));
    }

    #[test]
    fn closed_stage_rejects_commands() {
        let mut sim = SimulationDriver::new();
        sim.close().unwrap();
        assert!(sim.is_closed());
        assert!(matches!(sim.get_position(0), Err(ActuatorError::Closed)));
        assert!(matches!(sim.close(), Err(ActuatorError::Closed)));
    }
}
