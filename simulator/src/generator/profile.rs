use anyhow::{bail, Context};
use geodrawcore::math::{CameraFrame, CameraPose, GeodesyHelper};
use geodrawcore::model::{Coordinate, LocationFix};
use nalgebra::{UnitQuaternion, Vector3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Eye height of the simulated device above the AR origin.
const EYE_HEIGHT: f32 = 1.5;

/// Configuration for generating a synthetic walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub waypoints: Vec<Coordinate>,
    pub steps_per_leg: usize,
    pub accuracy_m: f64,
    pub accuracy_jitter_m: f64,
    pub position_noise_m: f64,
    /// Share of fixes reported with `poor_accuracy_m`.
    pub poor_fix_ratio: f64,
    pub poor_accuracy_m: f64,
    pub seed: u64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        let start = Coordinate::new(45.5017, -73.5673);
        Self {
            waypoints: vec![start, GeodesyHelper::offset_north(start, 40.0), start],
            steps_per_leg: 10,
            accuracy_m: 5.0,
            accuracy_jitter_m: 2.0,
            position_noise_m: 0.5,
            poor_fix_ratio: 0.1,
            poor_accuracy_m: 35.0,
            seed: 0,
        }
    }
}

fn jitter(rng: &mut StdRng, amplitude: f64) -> f64 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..amplitude)
    } else {
        0.0
    }
}

fn interpolate(from: Coordinate, to: Coordinate, t: f64) -> Coordinate {
    Coordinate::new(
        from.latitude + (to.latitude - from.latitude) * t,
        from.longitude + (to.longitude - from.longitude) * t,
    )
}

/// Builds a jittered fix trace walking through every waypoint, one fix per second.
pub fn build_fix_trace(config: &RouteConfig) -> anyhow::Result<Vec<LocationFix>> {
    let Some(last) = config.waypoints.last().copied() else {
        bail!("route has no waypoints");
    };
    let steps = config.steps_per_leg.max(1);
    let legs = config.waypoints.len().saturating_sub(1);
    let capacity = legs
        .checked_mul(steps)
        .and_then(|count| count.checked_add(1))
        .context("overflow computing fix count for route")?;

    let mut positions = Vec::with_capacity(capacity);
    for leg in config.waypoints.windows(2) {
        for step in 0..steps {
            positions.push(interpolate(leg[0], leg[1], step as f64 / steps as f64));
        }
    }
    positions.push(last);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let poor_ratio = config.poor_fix_ratio.clamp(0.0, 1.0);
    let fixes = positions
        .into_iter()
        .enumerate()
        .map(|(index, position)| {
            let north = jitter(&mut rng, config.position_noise_m);
            let east = jitter(&mut rng, config.position_noise_m);
            let coordinate =
                GeodesyHelper::offset_east(GeodesyHelper::offset_north(position, north), east);
            let accuracy = if rng.gen_bool(poor_ratio) {
                config.poor_accuracy_m
            } else {
                (config.accuracy_m + jitter(&mut rng, config.accuracy_jitter_m)).max(0.0)
            };
            LocationFix::new(coordinate, accuracy, index as f64)
        })
        .collect();

    Ok(fixes)
}

/// Camera standing at the AR origin, looking down -Z.
pub fn idle_frame(time: f64) -> CameraFrame {
    CameraFrame::new(
        CameraPose::from_parts(Vector3::new(0.0, EYE_HEIGHT, 0.0), UnitQuaternion::identity()),
        time,
    )
}

/// Half orbit around the origin with the camera facing the centre.
pub fn orbit_frames(radius: f32, count: usize, start_time: f64) -> Vec<CameraFrame> {
    let count = count.max(1);
    (0..count)
        .map(|index| {
            let angle = PI * index as f32 / count as f32;
            let position = Vector3::new(radius * angle.sin(), EYE_HEIGHT, radius * angle.cos());
            let orientation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle);
            CameraFrame::new(
                CameraPose::from_parts(position, orientation),
                start_time + index as f64 / 60.0,
            )
        })
        .collect()
}
