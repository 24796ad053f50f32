//! Participant registry, built from relay events on the rendering side
//!
//! Records are keyed by connection id in a `BTreeMap` so every scan (scorer lookup, ranking,
//! drawing) walks participants in ascending id order.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, info};

use crate::ws::protocol::{PeerId, PeerPointer};

use super::effects::SlashDirection;
use super::physics::PhysicsSystem;
use super::tuning::GameTuning;

/// Avatars handed out at first sighting
pub const AVATARS: [&str; 8] = ["🐞", "🐝", "🐛", "🕷️", "🦋", "🦗", "🦂", "🕸️"];

/// One tracked participant
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: PeerId,
    pub name: String,
    pub avatar: &'static str,

    // Scoring
    pub score: u32,
    /// Symbols of the fruit credited to this participant, in order
    pub scored: Vec<&'static str>,

    // Cursor in surface coordinates
    pub x: f32,
    pub y: f32,
    /// Last cursor movement, used to orient slash strokes
    pub motion: (f32, f32),

    /// Wall clock of the last event, unix ms
    pub updated_ms: u64,
}

impl Participant {
    fn new(id: PeerId, avatar: &'static str, x: f32, y: f32, now_ms: u64) -> Self {
        Self {
            id,
            name: String::new(),
            avatar,
            score: 0,
            scored: Vec::new(),
            x,
            y,
            motion: (0.0, 0.0),
            updated_ms: now_ms,
        }
    }

    pub fn heading(&self) -> SlashDirection {
        SlashDirection::from_motion(self.motion.0, self.motion.1)
    }

    fn move_to(&mut self, x: f32, y: f32, now_ms: u64) {
        self.motion = (x - self.x, y - self.y);
        self.x = x;
        self.y = y;
        self.updated_ms = now_ms;
    }

    fn credit(&mut self, symbol: &'static str, points: u32) {
        self.score += points;
        self.scored.push(symbol);
    }
}

/// Map a normalized pointer onto the surface
pub fn denormalize(x: f64, y: f64, tuning: &GameTuning) -> (f32, f32) {
    (x as f32 * tuning.width, y as f32 * tuning.height)
}

#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    participants: BTreeMap<PeerId, Participant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A peer announced its name. New records start at the surface center with a zero score.
    pub fn join<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        id: PeerId,
        name: &str,
        now_ms: u64,
        tuning: &GameTuning,
    ) {
        let participant = self.participants.entry(id).or_insert_with(|| {
            info!(conn_id = %id, name = %name, "Participant joined");
            Participant::new(
                id,
                random_avatar(rng),
                tuning.width / 2.0,
                tuning.height / 2.0,
                now_ms,
            )
        });
        participant.name = name.to_string();
        participant.updated_ms = now_ms;
    }

    /// Cursor moved. Creates the record when the id is unseen.
    pub fn aim<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        pointer: &PeerPointer,
        now_ms: u64,
        tuning: &GameTuning,
    ) {
        let (x, y) = denormalize(pointer.x, pointer.y, tuning);
        let participant = self.participants.entry(pointer.id).or_insert_with(|| {
            debug!(conn_id = %pointer.id, "Participant first seen by aim");
            Participant::new(pointer.id, random_avatar(rng), x, y, now_ms)
        });
        participant.name = pointer.name.clone();
        participant.move_to(x, y, now_ms);
    }

    /// Slash from a tracked id refreshes its cursor. Unknown ids are not created.
    pub fn touch_slash(&mut self, pointer: &PeerPointer, now_ms: u64, tuning: &GameTuning) {
        if let Some(participant) = self.participants.get_mut(&pointer.id) {
            let (x, y) = denormalize(pointer.x, pointer.y, tuning);
            participant.move_to(x, y, now_ms);
        }
    }

    pub fn leave(&mut self, id: &PeerId) -> Option<Participant> {
        let removed = self.participants.remove(id);
        if removed.is_some() {
            info!(conn_id = %id, "Participant left");
        }
        removed
    }

    /// Drop every record whose last event is more than `stale_after_ms` old. Returns how many.
    pub fn sweep_stale(&mut self, now_ms: u64, stale_after_ms: u64) -> usize {
        let before = self.participants.len();
        self.participants.retain(|id, p| {
            let keep = now_ms.saturating_sub(p.updated_ms) <= stale_after_ms;
            if !keep {
                info!(conn_id = %id, "Participant evicted as stale");
            }
            keep
        });
        before - self.participants.len()
    }

    /// First participant in id order whose cursor is strictly within `radius`
    pub fn first_within(&self, x: f32, y: f32, radius: f32) -> Option<PeerId> {
        self.participants
            .values()
            .find(|p| PhysicsSystem::within_reach(x, y, p.x, p.y, radius))
            .map(|p| p.id)
    }

    /// Add points and a history entry to a tracked participant
    pub fn credit(&mut self, id: &PeerId, symbol: &'static str, points: u32) -> bool {
        match self.participants.get_mut(id) {
            Some(participant) => {
                participant.credit(symbol, points);
                true
            }
            None => false,
        }
    }

    /// Zero every score and history for a fresh round
    pub fn reset_scores(&mut self) {
        for participant in self.participants.values_mut() {
            participant.score = 0;
            participant.scored.clear();
        }
    }

    pub fn get(&self, id: &PeerId) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

fn random_avatar<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    AVATARS[rng.gen_range(0..AVATARS.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use uuid::Uuid;

    fn pointer(id: PeerId, x: f64, y: f64, name: &str) -> PeerPointer {
        PeerPointer {
            id,
            x,
            y,
            name: name.to_string(),
        }
    }

    fn setup() -> (ParticipantRegistry, ChaCha8Rng, GameTuning) {
        (
            ParticipantRegistry::new(),
            ChaCha8Rng::seed_from_u64(7),
            GameTuning::default().with_surface(1000.0, 500.0),
        )
    }

    #[test]
    fn aim_creates_and_denormalizes() {
        let (mut registry, mut rng, tuning) = setup();
        let id = Uuid::new_v4();
        registry.aim(&mut rng, &pointer(id, 0.25, 0.5, "Ann"), 1_000, &tuning);

        let p = registry.get(&id).unwrap();
        assert_eq!((p.x, p.y), (250.0, 250.0));
        assert_eq!(p.name, "Ann");
        assert_eq!(p.score, 0);
        assert!(AVATARS.contains(&p.avatar));
        assert_eq!(p.updated_ms, 1_000);
    }

    #[test]
    fn join_keeps_avatar_and_score_of_known_id() {
        let (mut registry, mut rng, tuning) = setup();
        let id = Uuid::new_v4();
        registry.join(&mut rng, id, "first", 0, &tuning);
        let p = registry.get(&id).unwrap();
        assert_eq!((p.x, p.y), (500.0, 250.0));
        let avatar = p.avatar;

        registry.credit(&id, "🍎", 10);
        for _ in 0..20 {
            registry.join(&mut rng, id, "second", 10, &tuning);
        }
        let p = registry.get(&id).unwrap();
        assert_eq!(p.avatar, avatar);
        assert_eq!(p.score, 10);
        assert_eq!(p.name, "second");
    }

    #[test]
    fn slash_does_not_create() {
        let (mut registry, _, tuning) = setup();
        let id = Uuid::new_v4();
        registry.touch_slash(&pointer(id, 0.5, 0.5, ""), 0, &tuning);
        assert!(registry.is_empty());
    }

    #[test]
    fn slash_refreshes_tracked_cursor() {
        let (mut registry, mut rng, tuning) = setup();
        let id = Uuid::new_v4();
        registry.aim(&mut rng, &pointer(id, 0.1, 0.1, ""), 0, &tuning);
        registry.touch_slash(&pointer(id, 0.1, 0.75, ""), 4_000, &tuning);

        let p = registry.get(&id).unwrap();
        assert_eq!(p.y, 375.0);
        assert_eq!(p.updated_ms, 4_000);
        assert_eq!(p.heading(), SlashDirection::Vertical);
    }

    #[test]
    fn staleness_threshold_is_strict() {
        let (mut registry, mut rng, tuning) = setup();
        let old = Uuid::new_v4();
        let fresh = Uuid::new_v4();
        registry.aim(&mut rng, &pointer(old, 0.1, 0.1, ""), 10_000, &tuning);
        registry.aim(&mut rng, &pointer(fresh, 0.1, 0.1, ""), 10_002, &tuning);

        assert_eq!(registry.sweep_stale(15_001, 5_000), 1);
        assert!(registry.get(&old).is_none());
        assert!(registry.get(&fresh).is_some());

        // exactly at the threshold stays
        assert_eq!(registry.sweep_stale(15_002, 5_000), 0);
    }

    #[test]
    fn first_within_walks_ascending_ids() {
        let (mut registry, mut rng, tuning) = setup();
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        // high is closer but low comes first
        registry.aim(&mut rng, &pointer(high, 0.5, 0.5, ""), 0, &tuning);
        registry.aim(&mut rng, &pointer(low, 0.54, 0.5, ""), 0, &tuning);

        assert_eq!(registry.first_within(500.0, 250.0, 60.0), Some(low));
        assert_eq!(registry.first_within(900.0, 250.0, 60.0), None);
    }

    #[test]
    fn reset_scores_clears_history() {
        let (mut registry, mut rng, tuning) = setup();
        let id = Uuid::new_v4();
        registry.join(&mut rng, id, "x", 0, &tuning);
        registry.credit(&id, "🍉", 10);
        registry.reset_scores();

        let p = registry.get(&id).unwrap();
        assert_eq!(p.score, 0);
        assert!(p.scored.is_empty());
        assert!(!registry.credit(&Uuid::new_v4(), "🍉", 10));
    }
}
