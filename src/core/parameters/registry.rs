//! Parameter registry for the external tuning collaborator
//!
//! A minimal name-indexed view over the tunable subset of [`Config`]. The
//! interactive tuning layer (serial menu, ground station) mutates values here
//! by name, inside bounds; the control loop keeps reading its typed `Config`,
//! which is refreshed between cycles via [`ParameterRegistry::apply`]. Gains
//! hot-swap without a controller reset.
//!
//! Persistence is not handled here; whoever owns the stored copy calls
//! `load_from`/`apply` around it.

use heapless::Vec;

use super::Config;

/// Maximum number of registered parameters
const MAX_PARAMS: usize = 32;

/// Parameter metadata (definition and current value)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParamMetadata {
    /// Parameter name (max 16 characters)
    pub name: &'static str,
    /// Current value
    pub value: f32,
    /// Default value
    pub default: f32,
    /// Minimum allowed value
    pub min: f32,
    /// Maximum allowed value
    pub max: f32,
    /// True if changed since the last `clear_modified`
    pub modified: bool,
}

impl ParamMetadata {
    pub const fn new(name: &'static str, default: f32, min: f32, max: f32) -> Self {
        Self {
            name,
            value: default,
            default,
            min,
            max,
            modified: false,
        }
    }
}

/// Parameter registry error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// No parameter with that name
    NotFound,
    /// Value outside the parameter's bounds
    InvalidValue,
    /// Registry is full
    Full,
    /// Parameter with that name already registered
    Duplicate,
}

/// Name-indexed registry over the tunable configuration values
#[derive(Debug, Default)]
pub struct ParameterRegistry {
    params: Vec<ParamMetadata, MAX_PARAMS>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Registry pre-populated with every tunable of the balance core
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let config = Config::default();
        let defaults = [
            ParamMetadata::new("BAL_ANGLE_W", config.balance.angle_weight, 0.0, 200.0),
            ParamMetadata::new("BAL_GYRO_W", config.balance.angular_speed_weight, 0.0, 200.0),
            ParamMetadata::new("BAL_BALL_POS_W", config.balance.ball_position_weight, 0.0, 50.0),
            ParamMetadata::new("BAL_BALL_VEL_W", config.balance.ball_velocity_weight, 0.0, 50.0),
            ParamMetadata::new("BAL_BALL_ACC_W", config.balance.ball_accel_weight, 0.0, 50.0),
            ParamMetadata::new("BAL_BODY_POS_W", config.balance.body_position_weight, 0.0, 50.0),
            ParamMetadata::new("BAL_BODY_VEL_W", config.balance.body_velocity_weight, 0.0, 50.0),
            ParamMetadata::new("BAL_BODY_ACC_W", config.balance.body_accel_weight, 0.0, 50.0),
            ParamMetadata::new("BAL_OMEGA_W", config.balance.omega_weight, 0.0, 50.0),
            ParamMetadata::new("BAL_POS_I_W", config.balance.position_integral_weight, 0.0, 50.0),
            ParamMetadata::new("MOT_POS_P", config.motor.pid_position.kp, 0.0, 20.0),
            ParamMetadata::new("MOT_POS_I", config.motor.pid_position.ki, 0.0, 20.0),
            ParamMetadata::new("MOT_POS_D", config.motor.pid_position.kd, 0.0, 1.0),
            ParamMetadata::new("MOT_SPD_P", config.motor.pid_speed.kp, 0.0, 20.0),
            ParamMetadata::new("MOT_SPD_I", config.motor.pid_speed.ki, 0.0, 20.0),
            ParamMetadata::new("MOT_SPD_D", config.motor.pid_speed.kd, 0.0, 1.0),
            ParamMetadata::new("MOT_LFT_P", config.motor.pid_lifter.kp, 0.0, 20.0),
            ParamMetadata::new("MOT_LFT_I", config.motor.pid_lifter.ki, 0.0, 20.0),
            ParamMetadata::new("MOT_LFT_D", config.motor.pid_lifter.kd, 0.0, 1.0),
            ParamMetadata::new("IMU_NULL_X", config.imu.null_offset_x, -0.3, 0.3),
            ParamMetadata::new("IMU_NULL_Y", config.imu.null_offset_y, -0.3, 0.3),
            ParamMetadata::new("IMU_KAL_VAR", config.imu.kalman_noise_variance, 0.001, 1.0),
        ];
        for param in defaults {
            // Capacity and uniqueness are static facts of the list above.
            registry.register(param).ok();
        }
        registry
    }

    /// Register a parameter definition
    pub fn register(&mut self, param: ParamMetadata) -> Result<(), RegistryError> {
        if self.get_by_name(param.name).is_some() {
            return Err(RegistryError::Duplicate);
        }
        self.params.push(param).map_err(|_| RegistryError::Full)
    }

    /// Number of registered parameters
    pub fn count(&self) -> usize {
        self.params.len()
    }

    /// Look up a parameter by name
    pub fn get_by_name(&self, name: &str) -> Option<&ParamMetadata> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Look up a parameter by registration index
    pub fn get_by_index(&self, index: usize) -> Option<&ParamMetadata> {
        self.params.get(index)
    }

    /// Set a parameter value, enforcing its bounds
    pub fn set_by_name(&mut self, name: &str, value: f32) -> Result<(), RegistryError> {
        let param = self
            .params
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or(RegistryError::NotFound)?;
        if !(param.min..=param.max).contains(&value) {
            return Err(RegistryError::InvalidValue);
        }
        param.value = value;
        param.modified = true;
        Ok(())
    }

    /// True if any parameter changed since the last `clear_modified`
    pub fn has_modified(&self) -> bool {
        self.params.iter().any(|p| p.modified)
    }

    /// Clear all modified flags (after the owner persisted the values)
    pub fn clear_modified(&mut self) {
        for param in self.params.iter_mut() {
            param.modified = false;
        }
    }

    /// Write all registry values into the typed configuration
    pub fn apply(&self, config: &mut Config) {
        for param in self.params.iter() {
            if let Some(field) = config_field_mut(config, param.name) {
                *field = param.value;
            }
        }
    }

    /// Refresh registry values from the typed configuration
    pub fn load_from(&mut self, config: &Config) {
        for param in self.params.iter_mut() {
            if let Some(value) = config_field(config, param.name) {
                param.value = value;
            }
        }
    }
}

fn config_field_mut<'a>(config: &'a mut Config, name: &str) -> Option<&'a mut f32> {
    Some(match name {
        "BAL_ANGLE_W" => &mut config.balance.angle_weight,
        "BAL_GYRO_W" => &mut config.balance.angular_speed_weight,
        "BAL_BALL_POS_W" => &mut config.balance.ball_position_weight,
        "BAL_BALL_VEL_W" => &mut config.balance.ball_velocity_weight,
        "BAL_BALL_ACC_W" => &mut config.balance.ball_accel_weight,
        "BAL_BODY_POS_W" => &mut config.balance.body_position_weight,
        "BAL_BODY_VEL_W" => &mut config.balance.body_velocity_weight,
        "BAL_BODY_ACC_W" => &mut config.balance.body_accel_weight,
        "BAL_OMEGA_W" => &mut config.balance.omega_weight,
        "BAL_POS_I_W" => &mut config.balance.position_integral_weight,
        "MOT_POS_P" => &mut config.motor.pid_position.kp,
        "MOT_POS_I" => &mut config.motor.pid_position.ki,
        "MOT_POS_D" => &mut config.motor.pid_position.kd,
        "MOT_SPD_P" => &mut config.motor.pid_speed.kp,
        "MOT_SPD_I" => &mut config.motor.pid_speed.ki,
        "MOT_SPD_D" => &mut config.motor.pid_speed.kd,
        "MOT_LFT_P" => &mut config.motor.pid_lifter.kp,
        "MOT_LFT_I" => &mut config.motor.pid_lifter.ki,
        "MOT_LFT_D" => &mut config.motor.pid_lifter.kd,
        "IMU_NULL_X" => &mut config.imu.null_offset_x,
        "IMU_NULL_Y" => &mut config.imu.null_offset_y,
        "IMU_KAL_VAR" => &mut config.imu.kalman_noise_variance,
        _ => return None,
    })
}

fn config_field(config: &Config, name: &str) -> Option<f32> {
    // Read-only twin of `config_field_mut`; a transient copy keeps the
    // borrow checker out of the way without unsafe.
    let mut copy = *config;
    config_field_mut(&mut copy, name).map(|f| *f)
}
