//! Omniwheel kinematics
//!
//! Maps between body-frame motion (vx, vy, omega) and the angular speeds of
//! the three omniwheels riding on the ball. The fixed construction matrix
//! encodes the wheel geometry; a tilt rotation compensates the shift of the
//! ball-contact point when the body leans. The tilt matrix is memoized on
//! the tilt pair, since the transform runs twice per control cycle with
//! identical tilt.

use core::f32::consts::PI;

use libm::{cosf, sinf, sqrtf};
use nalgebra::{Matrix3, Vector3};

use crate::core::parameters::PhysicalConstants;

/// Determinant magnitude below which the wheel geometry is rejected
const SINGULARITY_EPSILON: f32 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KinematicsError {
    /// The construction matrix is not invertible; the configured wheel
    /// geometry is physically impossible
    SingularMatrix,
}

impl core::fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            KinematicsError::SingularMatrix => write!(f, "singular construction matrix"),
        }
    }
}

#[derive(Debug)]
pub struct Kinematics {
    construction: Matrix3<f32>,
    inverse_construction: Matrix3<f32>,
    ball_radius: f32,
    tilt_cache: Option<(f32, f32)>,
    tilt_rotation: Matrix3<f32>,
}

impl Kinematics {
    pub fn new(physics: &PhysicalConstants) -> Result<Self, KinematicsError> {
        let a = -1.0 / physics.wheel_radius;
        let cos_rake = cosf(physics.wheel_rake_angle);
        let sin_rake = sinf(physics.wheel_rake_angle);
        let half_sqrt3 = sqrtf(3.0) / 2.0;

        #[rustfmt::skip]
        let construction = Matrix3::new(
            0.0,                       a * cos_rake,        -a * sin_rake,
            -a * half_sqrt3 * cos_rake, -a * cos_rake / 2.0, -a * sin_rake,
            a * half_sqrt3 * cos_rake,  -a * cos_rake / 2.0, -a * sin_rake,
        );

        if construction.determinant().abs() < SINGULARITY_EPSILON {
            return Err(KinematicsError::SingularMatrix);
        }
        let inverse_construction = construction
            .try_inverse()
            .ok_or(KinematicsError::SingularMatrix)?;

        Ok(Self {
            construction,
            inverse_construction,
            ball_radius: physics.ball_radius,
            tilt_cache: None,
            tilt_rotation: Matrix3::identity(),
        })
    }

    /// Rotation of the ball-contact frame under body tilt, memoized
    fn tilt_rotation(&mut self, tilt_x: f32, tilt_y: f32) -> Matrix3<f32> {
        if self.tilt_cache != Some((tilt_x, tilt_y)) {
            let (sin_x, cos_x) = (sinf(tilt_y), cosf(tilt_y));
            let (sin_y, cos_y) = (sinf(tilt_x), cosf(tilt_x));
            #[rustfmt::skip]
            let rotation = Matrix3::new(
                cos_y,          0.0,   sin_y,
                sin_x * sin_y,  cos_x, -sin_x * cos_y,
                -cos_x * sin_y, sin_x, cos_x * cos_y,
            );
            self.tilt_rotation = rotation;
            self.tilt_cache = Some((tilt_x, tilt_y));
        }
        self.tilt_rotation
    }

    /// Inverse kinematics: body motion to wheel speeds [rev/s]
    pub fn compute_wheel_speed(
        &mut self,
        vx: f32,
        vy: f32,
        omega: f32,
        tilt_x: f32,
        tilt_y: f32,
    ) -> [f32; 3] {
        let rotation = self.tilt_rotation(tilt_x, tilt_y);
        let body = Vector3::new(vy, -vx, -omega * self.ball_radius);
        let wheel = self.construction * (rotation.transpose() * body);
        [
            wheel[0] / (2.0 * PI),
            wheel[1] / (2.0 * PI),
            wheel[2] / (2.0 * PI),
        ]
    }

    /// Forward kinematics: wheel speeds [rev/s] to body motion
    pub fn compute_actual_speed(
        &mut self,
        wheel_speed: [f32; 3],
        tilt_x: f32,
        tilt_y: f32,
    ) -> (f32, f32, f32) {
        let rotation = self.tilt_rotation(tilt_x, tilt_y);
        let wheel = Vector3::new(
            wheel_speed[0] * 2.0 * PI,
            wheel_speed[1] * 2.0 * PI,
            wheel_speed[2] * 2.0 * PI,
        );
        let body = rotation * (self.inverse_construction * wheel);
        (-body[1], body[0], -body[2] / self.ball_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinematics() -> Kinematics {
        Kinematics::new(&PhysicalConstants::default()).unwrap()
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let mut kin = kinematics();
        let cases = [
            (0.5, 0.0, 0.0, 0.0, 0.0),
            (0.0, -0.8, 0.0, 0.0, 0.0),
            (0.0, 0.0, 2.0, 0.0, 0.0),
            (0.3, -0.4, 1.5, 0.05, -0.08),
            (-1.2, 0.7, -3.0, -0.1, 0.1),
        ];
        for (vx, vy, omega, tx, ty) in cases {
            let wheels = kin.compute_wheel_speed(vx, vy, omega, tx, ty);
            let (rx, ry, romega) = kin.compute_actual_speed(wheels, tx, ty);
            assert!(
                (rx - vx).abs() < 1e-4 && (ry - vy).abs() < 1e-4 && (romega - omega).abs() < 1e-4,
                "round trip of ({vx}, {vy}, {omega}) gave ({rx}, {ry}, {romega})"
            );
        }
    }

    #[test]
    fn test_zero_tilt_matches_pure_construction_transform() {
        let mut kin = kinematics();
        let rotation = kin.tilt_rotation(0.0, 0.0);
        assert_eq!(rotation, Matrix3::identity());
    }

    #[test]
    fn test_pure_rotation_drives_all_wheels_equally() {
        let mut kin = kinematics();
        let wheels = kin.compute_wheel_speed(0.0, 0.0, 3.0, 0.0, 0.0);
        assert!(
            (wheels[0] - wheels[1]).abs() < 1e-5 && (wheels[1] - wheels[2]).abs() < 1e-5,
            "spin in place loads the wheels symmetrically: {wheels:?}"
        );
        assert!(wheels[0].abs() > 1e-3, "wheels actually turn");
    }

    #[test]
    fn test_zero_motion_stops_all_wheels() {
        let mut kin = kinematics();
        let wheels = kin.compute_wheel_speed(0.0, 0.0, 0.0, 0.1, -0.05);
        for w in wheels {
            assert_eq!(w, 0.0);
        }
    }

    #[test]
    fn test_tilt_changes_the_transform() {
        let mut kin = kinematics();
        let flat = kin.compute_wheel_speed(0.5, 0.0, 0.0, 0.0, 0.0);
        let tilted = kin.compute_wheel_speed(0.5, 0.0, 0.0, 0.15, 0.0);
        assert!(
            flat.iter()
                .zip(tilted.iter())
                .any(|(a, b)| (a - b).abs() > 1e-4),
            "tilt compensation alters the wheel speeds"
        );
    }

    #[test]
    fn test_memoization_keeps_results_stable() {
        let mut kin = kinematics();
        let first = kin.compute_wheel_speed(0.2, 0.3, 0.5, 0.07, 0.02);
        let second = kin.compute_wheel_speed(0.2, 0.3, 0.5, 0.07, 0.02);
        assert_eq!(first, second);
    }

    #[test]
    fn test_degenerate_geometry_is_rejected() {
        let physics = PhysicalConstants {
            wheel_rake_angle: 0.0,
            ..Default::default()
        };
        assert_eq!(
            Kinematics::new(&physics).err(),
            Some(KinematicsError::SingularMatrix)
        );
    }
}
