//! Cosmetic effects: slash strokes and particle bursts. Nothing here feeds back into scoring.

use rand::Rng;

use super::tuning::GameTuning;

/// Orientation of the drawn stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashDirection {
    Horizontal,
    Vertical,
}

impl SlashDirection {
    /// Follow the dominant axis of the last cursor movement
    pub fn from_motion(dx: f32, dy: f32) -> Self {
        if dy.abs() > dx.abs() {
            SlashDirection::Vertical
        } else {
            SlashDirection::Horizontal
        }
    }
}

/// A fading slash stroke
#[derive(Debug, Clone)]
pub struct SlashEffect {
    pub x: f32,
    pub y: f32,
    pub direction: SlashDirection,
    /// Seconds since the slash
    pub time: f32,
    pub max_time: f32,
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    /// 1.0 at birth, removed at 0
    pub life: f32,
    pub size: f32,
    /// Hue in degrees
    pub hue: f32,
}

/// Shape of a burst
#[derive(Debug, Clone, Copy)]
pub struct BurstSpec {
    pub count: usize,
    /// Velocity components are drawn from ±spread/2
    pub spread: f32,
    pub hue_min: f32,
    pub hue_span: f32,
    /// Sizes are drawn from min..min+1 when `size_span` is zero
    pub size_min: f32,
    pub size_span: f32,
}

impl BurstSpec {
    pub fn cut(count: usize) -> Self {
        Self {
            count,
            spread: 8.0,
            hue_min: 15.0,
            hue_span: 60.0,
            size_min: 1.0,
            size_span: 3.0,
        }
    }

    pub fn slash(count: usize) -> Self {
        Self {
            count,
            spread: 10.0,
            hue_min: 30.0,
            hue_span: 60.0,
            size_min: 2.0,
            size_span: 0.0,
        }
    }
}

/// All live cosmetic effects
#[derive(Debug, Default)]
pub struct Effects {
    pub slashes: Vec<SlashEffect>,
    pub particles: Vec<Particle>,
}

impl Effects {
    pub fn add_slash(&mut self, x: f32, y: f32, direction: SlashDirection, tuning: &GameTuning) {
        self.slashes.push(SlashEffect {
            x,
            y,
            direction,
            time: 0.0,
            max_time: tuning.slash_lifetime,
        });
    }

    pub fn burst<R: Rng + ?Sized>(&mut self, rng: &mut R, x: f32, y: f32, spec: BurstSpec) {
        self.particles.extend((0..spec.count).map(|_| Particle {
            x,
            y,
            vel_x: (rng.gen::<f32>() - 0.5) * spec.spread,
            vel_y: (rng.gen::<f32>() - 0.5) * spec.spread,
            life: 1.0,
            size: spec.size_min + rng.gen::<f32>() * spec.size_span,
            hue: spec.hue_min + rng.gen::<f32>() * spec.hue_span,
        }));
    }

    /// Age every effect by one step and drop the expired ones
    pub fn step(&mut self, dt: f32, tuning: &GameTuning) {
        for slash in &mut self.slashes {
            slash.time += dt;
        }
        self.slashes.retain(|s| s.time < s.max_time);

        for p in &mut self.particles {
            p.x += p.vel_x;
            p.y += p.vel_y;
            p.life -= tuning.particle_decay;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn clear(&mut self) {
        self.slashes.clear();
        self.particles.clear();
    }
}
