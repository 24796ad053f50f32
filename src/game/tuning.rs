/// Gameplay tuning for the shared canvas.
///
/// Keep this separate from runtime configuration (addresses, buffer sizes). Distances are in
/// render-surface units, velocities in units per logical step.

#[derive(Debug, Clone, Copy)]
pub struct GameTuning {
    /// Render surface width
    pub width: f32,
    /// Render surface height
    pub height: f32,

    /// Round length in whole seconds
    pub round_secs: u32,
    /// Points for each cut fruit, to the global score and to the credited participant
    pub points_per_fruit: u32,
    /// Every this-many consecutive cuts earns the combo bonus
    pub combo_every: u32,
    /// Flat bonus added to the global score only
    pub combo_bonus: u32,

    /// Slash reach, both for cutting fruit and for finding the scorer
    pub hit_radius: f32,
    /// Participants silent for longer than this are evicted
    pub stale_after_ms: u64,

    /// Downward acceleration applied to cut fruit
    pub gravity: f32,
    /// Off-surface distance past the right/bottom edge before a fruit is dropped
    pub despawn_margin: f32,
    /// Spawn x, left of the visible surface
    pub spawn_x: f32,
    /// Keep spawns this far from the top and bottom edges
    pub spawn_margin: f32,
    /// Collision box edge of every fruit
    pub fruit_size: f32,

    /// How long a slash stroke stays on screen, in seconds
    pub slash_lifetime: f32,
    /// Seconds over which a cut fruit fades out
    pub cut_fade: f32,
    /// Particles emitted where a fruit is cut
    pub cut_particles: usize,
    /// Particles emitted at every slash
    pub slash_particles: usize,
    /// Life lost by each particle per step, from 1.0
    pub particle_decay: f32,
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            round_secs: 60,
            points_per_fruit: 10,
            combo_every: 5,
            combo_bonus: 50,
            hit_radius: 60.0,
            stale_after_ms: 5000,
            gravity: 0.5,
            despawn_margin: 50.0,
            spawn_x: -50.0,
            spawn_margin: 50.0,
            fruit_size: 40.0,
            slash_lifetime: 0.3,
            cut_fade: 0.5,
            cut_particles: 15,
            slash_particles: 10,
            particle_decay: 0.02,
        }
    }
}

impl GameTuning {
    /// Same tuning on a different surface
    pub fn with_surface(self, width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }
}
