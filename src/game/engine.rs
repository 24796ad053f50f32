//! The simulation authority: applies relay events, runs the fixed step, owns round lifecycle
//!
//! `Game` is owned by a single task. Relay events are folded in as they arrive; slashes are
//! queued and only resolved inside [`Game::step`], so every collision sees the fruit positions
//! of one consistent frame.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::ws::protocol::{PeerId, ServerMsg};

use super::effects::{BurstSpec, Effects, SlashDirection};
use super::fruit::{Fruit, FruitKind};
use super::physics::PhysicsSystem;
use super::ranking::RoundSummary;
use super::registry::{denormalize, ParticipantRegistry};
use super::round::{Round, RoundPhase};
use super::tuning::GameTuning;

/// A slash waiting for the next step, already in surface coordinates
#[derive(Debug, Clone, Copy)]
struct PendingSlash {
    from: PeerId,
    x: f32,
    y: f32,
    direction: SlashDirection,
}

/// Outcome of one cut, for logging
#[derive(Debug, Clone, PartialEq)]
pub struct CutEvent {
    pub kind: FruitKind,
    pub slashed_by: PeerId,
    pub credited: Option<PeerId>,
    pub bonus: u32,
}

pub struct Game {
    tuning: GameTuning,
    rng: ChaCha8Rng,
    round: Round,
    fruits: Vec<Fruit>,
    effects: Effects,
    registry: ParticipantRegistry,
    pending: Vec<PendingSlash>,
}

impl Game {
    pub fn new(tuning: GameTuning, seed: u64) -> Self {
        Self {
            round: Round::new(&tuning),
            tuning,
            rng: ChaCha8Rng::seed_from_u64(seed),
            fruits: Vec::new(),
            effects: Effects::default(),
            registry: ParticipantRegistry::new(),
            pending: Vec::new(),
        }
    }

    pub fn tuning(&self) -> &GameTuning {
        &self.tuning
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn phase(&self) -> RoundPhase {
        self.round.phase
    }

    pub fn is_running(&self) -> bool {
        self.round.is_running()
    }

    pub fn fruits(&self) -> &[Fruit] {
        &self.fruits
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    /// Fold one relay event into the registry, queueing slashes for the next step
    pub fn apply(&mut self, msg: &ServerMsg, now_ms: u64) {
        match msg {
            ServerMsg::Join { id, name } => {
                self.registry
                    .join(&mut self.rng, *id, name, now_ms, &self.tuning);
            }
            ServerMsg::Aim(pointer) => {
                self.registry
                    .aim(&mut self.rng, pointer, now_ms, &self.tuning);
            }
            ServerMsg::Slash(pointer) => {
                self.registry.touch_slash(pointer, now_ms, &self.tuning);
                let (x, y) = denormalize(pointer.x, pointer.y, &self.tuning);
                let direction = self
                    .registry
                    .get(&pointer.id)
                    .map(|p| p.heading())
                    .unwrap_or(SlashDirection::Horizontal);
                self.pending.push(PendingSlash {
                    from: pointer.id,
                    x,
                    y,
                    direction,
                });
            }
            ServerMsg::Leave { id } => {
                self.registry.leave(id);
            }
        }
    }

    /// One logical frame. Stale participants are swept in every phase; everything else only
    /// moves while running, and slashes queued outside a running round are discarded.
    pub fn step(&mut self, now_ms: u64, dt: f32) -> Vec<CutEvent> {
        self.registry
            .sweep_stale(now_ms, self.tuning.stale_after_ms);

        let pending = std::mem::take(&mut self.pending);
        if !self.round.is_running() {
            if !pending.is_empty() {
                debug!(count = pending.len(), phase = ?self.round.phase, "Dropped slashes outside a running round");
            }
            return Vec::new();
        }

        let mut cuts = Vec::new();
        for slash in pending {
            self.resolve_slash(slash, &mut cuts);
        }

        let tuning = self.tuning;
        for fruit in &mut self.fruits {
            PhysicsSystem::step_fruit(fruit, &tuning, dt);
        }
        self.fruits
            .retain(|f| !PhysicsSystem::is_off_surface(f, &tuning));
        self.effects.step(dt, &tuning);

        cuts
    }

    fn resolve_slash(&mut self, slash: PendingSlash, cuts: &mut Vec<CutEvent>) {
        let tuning = self.tuning;
        self.effects
            .add_slash(slash.x, slash.y, slash.direction, &tuning);

        for fruit in &mut self.fruits {
            if fruit.cut
                || !PhysicsSystem::within_reach(slash.x, slash.y, fruit.x, fruit.y, tuning.hit_radius)
            {
                continue;
            }
            fruit.mark_cut();

            let credited = self
                .registry
                .first_within(slash.x, slash.y, tuning.hit_radius);
            if let Some(id) = credited {
                self.registry
                    .credit(&id, fruit.kind.symbol(), tuning.points_per_fruit);
            }
            let bonus = self.round.record_cut(&tuning);

            self.effects.burst(
                &mut self.rng,
                fruit.x,
                fruit.y,
                BurstSpec::cut(tuning.cut_particles),
            );
            cuts.push(CutEvent {
                kind: fruit.kind,
                slashed_by: slash.from,
                credited,
                bonus,
            });
        }

        self.effects.burst(
            &mut self.rng,
            slash.x,
            slash.y,
            BurstSpec::slash(tuning.slash_particles),
        );
    }

    /// Spawn one fruit at the left edge. No-op unless running.
    pub fn spawn_fruit(&mut self) -> bool {
        if !self.round.is_running() {
            return false;
        }
        let kind = FruitKind::random(&mut self.rng);
        let band = (self.tuning.height - 2.0 * self.tuning.spawn_margin).max(0.0);
        let y = self.rng.gen::<f32>() * band + self.tuning.spawn_margin;
        self.fruits
            .push(Fruit::new(kind, self.tuning.spawn_x, y, self.tuning.fruit_size));
        true
    }

    /// One countdown second. Returns the frozen summary when this tick ended the round.
    pub fn tick_countdown(&mut self) -> Option<&RoundSummary> {
        if !self.round.tick_countdown() {
            return None;
        }
        let summary = RoundSummary::build(self.round.score, self.round.combo, self.registry.iter());
        info!(
            score = summary.final_score,
            combo = summary.final_combo,
            participants = summary.ranking.len(),
            "Round ended"
        );
        self.round.finish(summary);
        self.round.summary.as_ref()
    }

    /// Start a fresh round from idle or ended. Returns false in any other phase.
    pub fn start(&mut self) -> bool {
        if !matches!(self.round.phase, RoundPhase::Idle | RoundPhase::Ended) {
            return false;
        }
        self.round.begin(&self.tuning);
        self.clear_field();
        self.registry.reset_scores();
        info!(round_secs = self.tuning.round_secs, "Round started");
        true
    }

    pub fn restart(&mut self) -> bool {
        self.start()
    }

    pub fn toggle_pause(&mut self) -> RoundPhase {
        let phase = self.round.toggle_pause();
        info!(phase = ?phase, "Pause toggled");
        phase
    }

    /// Back to idle from any phase. Participant scores survive.
    pub fn reset(&mut self) {
        self.round.reset(&self.tuning);
        self.clear_field();
        info!("Round reset");
    }

    fn clear_field(&mut self) {
        self.fruits.clear();
        self.effects.clear();
        self.pending.clear();
    }

    #[cfg(test)]
    fn place_fruit(&mut self, kind: FruitKind, x: f32, y: f32) {
        self.fruits
            .push(Fruit::new(kind, x, y, self.tuning.fruit_size));
    }
}
