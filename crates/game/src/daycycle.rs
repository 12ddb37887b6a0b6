//! Day/night cycle: a slowly turning sun and the lighting derived from it.

use engine_core::Vec3;
use glam::Quat;

const GODRAY_DUSK: u32 = 0xFFAA67;
const AMBIENT_NIGHT: u32 = 0x16228F;
const WATER: u32 = 0x2D7493;

fn hex_color(rgb: u32) -> Vec3 {
    Vec3::new(
        ((rgb >> 16) & 0xFF) as f32 / 255.0,
        ((rgb >> 8) & 0xFF) as f32 / 255.0,
        (rgb & 0xFF) as f32 / 255.0,
    )
}

/// Gamma 2.2 to linear.
fn to_linear(color: Vec3) -> Vec3 {
    Vec3::new(color.x.powf(2.2), color.y.powf(2.2), color.z.powf(2.2))
}

/// Everything the renderer needs from the time of day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    /// 0 at night, 1 at full day.
    pub daylight: f32,
    pub fog_density: f32,
    pub light_intensity: f32,
    /// Specular strength of the sun, 0..=1.
    pub specular: f32,
    pub godray_color: Vec3,
    pub ambient_color: Vec3,
    pub ambient_ground_color: Vec3,
    pub water_color: Vec3,
    /// Direction the sunlight travels.
    pub light_direction: Vec3,
}

#[derive(Debug, Clone, Copy)]
pub struct DayCycle {
    /// Sun position relative to the viewer; only its direction matters.
    pub sun: Vec3,
    /// Sky shader clock.
    pub game_time: f32,
    /// Radians per 60 Hz frame about X, then Y.
    pub pitch_rate: f32,
    pub yaw_rate: f32,
}

impl Default for DayCycle {
    fn default() -> Self {
        Self {
            sun: Vec3::new(0.0, 0.5, 1.0),
            game_time: 0.0,
            pitch_rate: -0.0004,
            yaw_rate: -0.0002,
        }
    }
}

impl DayCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn the sun by `dt` seconds and return the new lighting.
    pub fn advance(&mut self, dt: f32) -> Lighting {
        let frames = if dt.is_finite() { dt.max(0.0) * 60.0 } else { 0.0 };
        self.game_time += 0.00002 * frames;
        self.sun = Quat::from_rotation_x(self.pitch_rate * frames) * self.sun;
        self.sun = Quat::from_rotation_y(self.yaw_rate * frames) * self.sun;
        self.lighting()
    }

    pub fn daylight(&self) -> f32 {
        (0.1 + self.sun.y).max(0.0).sqrt()
    }

    pub fn lighting(&self) -> Lighting {
        let d = self.daylight();
        let night = 1.0 - d;
        let specular = (-3.4 + d * 8.0).clamp(0.0, 1.0);
        let ambient_color = Vec3::ONE * d + to_linear(hex_color(AMBIENT_NIGHT)) * night;
        Lighting {
            daylight: d,
            fog_density: d * 0.003,
            light_intensity: d,
            specular,
            godray_color: Vec3::ONE * d + to_linear(hex_color(GODRAY_DUSK)) * night,
            ambient_color,
            ambient_ground_color: ambient_color * 0.5,
            water_color: hex_color(WATER) * (d * 2.0).clamp(0.0, 1.0),
            light_direction: (-self.sun).normalize_or_zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_daylight() {
        let cycle = DayCycle::new();
        let light = cycle.lighting();
        assert!((light.daylight - 0.6_f32.sqrt()).abs() < 1e-6);
        assert!((light.fog_density - light.daylight * 0.003).abs() < 1e-9);
        assert!((light.light_direction - -Vec3::new(0.0, 0.5, 1.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn night_is_dark_and_blue() {
        let cycle = DayCycle {
            sun: Vec3::new(0.0, -1.0, 0.0),
            ..Default::default()
        };
        let light = cycle.lighting();
        assert_eq!(light.daylight, 0.0);
        assert_eq!(light.specular, 0.0);
        assert_eq!(light.water_color, Vec3::ZERO);
        assert_eq!(light.ambient_color, to_linear(hex_color(AMBIENT_NIGHT)));
        assert!(light.ambient_color.z > light.ambient_color.x);
    }

    #[test]
    fn noon_saturates_specular_and_water() {
        let cycle = DayCycle {
            sun: Vec3::new(0.0, 0.9, 0.0),
            ..Default::default()
        };
        let light = cycle.lighting();
        assert!((light.daylight - 1.0).abs() < 1e-6);
        assert_eq!(light.specular, 1.0);
        assert!((light.water_color - hex_color(WATER)).length() < 1e-6);
    }

    #[test]
    fn sun_turns_but_keeps_its_distance() {
        let mut cycle = DayCycle::new();
        let start = cycle.sun;
        for _ in 0..600 {
            cycle.advance(1.0 / 60.0);
        }
        assert!((cycle.sun.length() - start.length()).abs() < 1e-4);
        assert!(cycle.sun != start);
        assert!((cycle.game_time - 0.012).abs() < 1e-5);
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(hex_color(0xFF0000), Vec3::new(1.0, 0.0, 0.0));
        let water = hex_color(WATER);
        assert!((water.x - 45.0 / 255.0).abs() < 1e-6);
    }
}
