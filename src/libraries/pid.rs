//! PID controller with speed-dependent gain scheduling
//!
//! The brushless commutation loop needs different gains when holding a
//! position than when chasing a fast-moving reference. The controller blends
//! a low-speed and a high-speed gain set by the current speed ratio, either
//! continuously or with a hard switchover.

/// One set of PID gains
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl PidGains {
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }
}

/// How the low-speed and high-speed gain sets are blended
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GainSchedule {
    /// Linear interpolation over the full speed range
    Linear,
    /// Hard switchover at the given speed ratio
    Switch { threshold: f32 },
}

impl Default for GainSchedule {
    fn default() -> Self {
        GainSchedule::Linear
    }
}

/// PID controller whose effective gains follow the speed ratio
#[derive(Debug, Default)]
pub struct GainScheduledPid {
    schedule: GainSchedule,
    integral: f32,
    last_error: f32,
    initialized: bool,
}

impl GainScheduledPid {
    pub fn new(schedule: GainSchedule) -> Self {
        Self {
            schedule,
            integral: 0.0,
            last_error: 0.0,
            initialized: false,
        }
    }

    /// Drop all accumulated state. The next update produces no derivative
    /// kick.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
        self.initialized = false;
    }

    /// Effective gains at the given speed ratio in `[0, 1]`
    fn scheduled_gains(&self, low: &PidGains, high: &PidGains, speed_ratio: f32) -> PidGains {
        match self.schedule {
            GainSchedule::Linear => {
                let r = speed_ratio.clamp(0.0, 1.0);
                PidGains::new(
                    low.kp * (1.0 - r) + high.kp * r,
                    low.ki * (1.0 - r) + high.ki * r,
                    low.kd * (1.0 - r) + high.kd * r,
                )
            }
            GainSchedule::Switch { threshold } => {
                if speed_ratio < threshold {
                    *low
                } else {
                    *high
                }
            }
        }
    }

    /// Run one controller cycle and return the output, clamped to
    /// `[out_min, out_max]`.
    ///
    /// `low` applies at standstill, `high` at the motor's maximum speed;
    /// `speed_ratio` selects between them. A non-positive `dt` leaves all
    /// state untouched and yields 0.
    pub fn update(
        &mut self,
        low: &PidGains,
        high: &PidGains,
        out_min: f32,
        out_max: f32,
        speed_ratio: f32,
        error: f32,
        dt: f32,
    ) -> f32 {
        if dt <= 0.0 {
            return 0.0;
        }

        let gains = self.scheduled_gains(low, high, speed_ratio);

        self.integral += error * dt;
        if gains.ki > 0.0 {
            // Anti-windup: the integral term alone never exceeds the output
            // range.
            self.integral = self.integral.clamp(out_min / gains.ki, out_max / gains.ki);
        }

        let derivative = if self.initialized {
            (error - self.last_error) / dt
        } else {
            0.0
        };
        self.last_error = error;
        self.initialized = true;

        let out = gains.kp * error + gains.ki * self.integral + gains.kd * derivative;
        out.clamp(out_min, out_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOW: PidGains = PidGains::new(2.0, 0.0, 0.0);
    const HIGH: PidGains = PidGains::new(1.0, 0.0, 0.0);

    #[test]
    fn test_proportional_only() {
        let mut pid = GainScheduledPid::new(GainSchedule::Linear);
        let out = pid.update(&LOW, &HIGH, -10.0, 10.0, 0.0, 1.5, 0.01);
        assert_eq!(out, 3.0, "pure P at standstill uses the low-speed gains");
    }

    #[test]
    fn test_linear_schedule_blends_gains() {
        let mut pid = GainScheduledPid::new(GainSchedule::Linear);
        let out = pid.update(&LOW, &HIGH, -10.0, 10.0, 0.5, 1.0, 0.01);
        assert!((out - 1.5).abs() < 1e-6, "halfway ratio blends kp to 1.5");
    }

    #[test]
    fn test_switch_schedule() {
        let mut pid = GainScheduledPid::new(GainSchedule::Switch { threshold: 0.5 });
        let below = pid.update(&LOW, &HIGH, -10.0, 10.0, 0.4, 1.0, 0.01);
        pid.reset();
        let above = pid.update(&LOW, &HIGH, -10.0, 10.0, 0.6, 1.0, 0.01);
        assert_eq!(below, 2.0);
        assert_eq!(above, 1.0);
    }

    #[test]
    fn test_output_clamped() {
        let mut pid = GainScheduledPid::new(GainSchedule::Linear);
        let out = pid.update(&LOW, &HIGH, -1.0, 1.0, 0.0, 100.0, 0.01);
        assert_eq!(out, 1.0);
    }

    #[test]
    fn test_integral_antiwindup() {
        let gains = PidGains::new(0.0, 1.0, 0.0);
        let mut pid = GainScheduledPid::new(GainSchedule::Linear);
        for _ in 0..1000 {
            pid.update(&gains, &gains, -1.0, 1.0, 0.0, 10.0, 0.1);
        }
        // After the error flips, the clamped integral unwinds immediately
        // instead of grinding down a huge accumulator.
        let out = pid.update(&gains, &gains, -1.0, 1.0, 0.0, -10.0, 0.1);
        assert!(out < 1.0, "integral was clamped to the output range");
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut pid = GainScheduledPid::new(GainSchedule::Linear);
        assert_eq!(pid.update(&LOW, &HIGH, -10.0, 10.0, 0.0, 5.0, 0.0), 0.0);
        assert_eq!(pid.update(&LOW, &HIGH, -10.0, 10.0, 0.0, 5.0, -0.01), 0.0);
    }

    #[test]
    fn test_no_derivative_kick_after_reset() {
        let dgains = PidGains::new(0.0, 0.0, 1.0);
        let mut pid = GainScheduledPid::new(GainSchedule::Linear);
        pid.update(&dgains, &dgains, -100.0, 100.0, 0.0, 50.0, 0.01);
        pid.reset();
        let out = pid.update(&dgains, &dgains, -100.0, 100.0, 0.0, 1.0, 0.01);
        assert_eq!(out, 0.0, "first cycle after reset has no derivative term");
    }
}
