//! Frame projection
//!
//! Builds a drawable description of one frame from the engine state. Nothing here mutates the
//! game; a frame can be serialized and handed to any drawing backend, or summarized into logs.

use serde::Serialize;

use crate::game::effects::SlashDirection;
use crate::game::ranking::display_name;
use crate::game::{Game, RoundPhase, RoundSummary};

/// Most rows shown on the live scoreboard
pub const SCOREBOARD_ROWS: usize = 8;

/// Half length of a drawn slash stroke
const STROKE_HALF: f32 = 50.0;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub width: f32,
    pub height: f32,
    pub hud: Hud,
    pub fruits: Vec<FruitSprite>,
    pub slashes: Vec<SlashStroke>,
    pub particles: Vec<Dot>,
    pub cursors: Vec<CursorSprite>,
    pub scoreboard: Vec<ScoreRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_over: Option<GameOver>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hud {
    pub phase: &'static str,
    pub score: u32,
    pub combo: u32,
    pub time_left: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FruitSprite {
    pub symbol: &'static str,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Drawn split in two halves
    pub cut: bool,
    pub alpha: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlashStroke {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub alpha: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dot {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub hue: f32,
    pub alpha: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CursorSprite {
    pub avatar: &'static str,
    pub x: f32,
    pub y: f32,
    /// Only set when the participant has a name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Only set once the participant has scored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub avatar: &'static str,
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOver {
    pub final_score: u32,
    pub final_combo: u32,
    pub ranking: Vec<RankRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankRow {
    pub place: usize,
    pub avatar: &'static str,
    pub name: String,
    pub score: u32,
    pub scored: String,
}

impl From<&RoundSummary> for GameOver {
    fn from(summary: &RoundSummary) -> Self {
        Self {
            final_score: summary.final_score,
            final_combo: summary.final_combo,
            ranking: summary
                .ranking
                .iter()
                .enumerate()
                .map(|(i, e)| RankRow {
                    place: i + 1,
                    avatar: e.avatar,
                    name: e.name.clone(),
                    score: e.score,
                    scored: e.scored.concat(),
                })
                .collect(),
        }
    }
}

pub fn phase_label(phase: RoundPhase) -> &'static str {
    match phase {
        RoundPhase::Idle => "idle",
        RoundPhase::Running => "running",
        RoundPhase::Paused => "paused",
        RoundPhase::Ended => "ended",
    }
}

impl Hud {
    pub fn of(game: &Game) -> Self {
        let round = game.round();
        Self {
            phase: phase_label(round.phase),
            score: round.score,
            combo: round.combo,
            time_left: round.time_left,
        }
    }
}

/// Project the current engine state into a frame
pub fn compose(game: &Game) -> Frame {
    let tuning = game.tuning();

    let fruits = game
        .fruits()
        .iter()
        .map(|f| FruitSprite {
            symbol: f.kind.symbol(),
            x: f.x,
            y: f.y,
            width: f.width,
            height: f.height,
            cut: f.cut,
            alpha: if f.cut {
                (1.0 - f.cut_time / tuning.cut_fade).max(0.0)
            } else {
                1.0
            },
        })
        .collect();

    let slashes = game
        .effects()
        .slashes
        .iter()
        .map(|s| {
            let (from, to) = match s.direction {
                SlashDirection::Horizontal => ((s.x - STROKE_HALF, s.y), (s.x + STROKE_HALF, s.y)),
                SlashDirection::Vertical => ((s.x, s.y - STROKE_HALF), (s.x, s.y + STROKE_HALF)),
            };
            SlashStroke {
                from,
                to,
                alpha: (1.0 - s.time / s.max_time).max(0.0),
            }
        })
        .collect();

    let particles = game
        .effects()
        .particles
        .iter()
        .map(|p| Dot {
            x: p.x,
            y: p.y,
            size: p.size,
            hue: p.hue,
            alpha: p.life.clamp(0.0, 1.0),
        })
        .collect();

    let cursors = game
        .registry()
        .iter()
        .map(|p| CursorSprite {
            avatar: p.avatar,
            x: p.x,
            y: p.y,
            label: (!p.name.is_empty()).then(|| p.name.clone()),
            score: (p.score > 0).then_some(p.score),
        })
        .collect();

    let mut scoreboard: Vec<ScoreRow> = game
        .registry()
        .iter()
        .map(|p| ScoreRow {
            avatar: p.avatar,
            name: display_name(&p.name).to_string(),
            score: p.score,
        })
        .collect();
    scoreboard.sort_by(|a, b| b.score.cmp(&a.score));
    scoreboard.truncate(SCOREBOARD_ROWS);

    Frame {
        width: tuning.width,
        height: tuning.height,
        hud: Hud::of(game),
        fruits,
        slashes,
        particles,
        cursors,
        scoreboard,
        game_over: game.round().summary.as_ref().map(GameOver::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameTuning;
    use crate::ws::protocol::{PeerPointer, ServerMsg};
    use uuid::Uuid;

    fn aim(game: &mut Game, n: u128, name: &str) {
        game.apply(
            &ServerMsg::Aim(PeerPointer {
                id: Uuid::from_u128(n),
                x: 0.1 * n as f64 / 20.0,
                y: 0.5,
                name: name.to_string(),
            }),
            0,
        );
    }

    #[test]
    fn idle_frame_is_empty() {
        let game = Game::new(GameTuning::default(), 0);
        let frame = compose(&game);
        assert_eq!(
            frame.hud,
            Hud {
                phase: "idle",
                score: 0,
                combo: 0,
                time_left: 60
            }
        );
        assert!(frame.fruits.is_empty() && frame.cursors.is_empty() && frame.game_over.is_none());
    }

    #[test]
    fn spawned_fruit_drawn_at_catalog_size() {
        let mut game = Game::new(GameTuning::default(), 7);
        game.start();
        assert!(game.spawn_fruit());

        let frame = compose(&game);
        assert_eq!(frame.fruits.len(), 1);
        let sprite = &frame.fruits[0];
        assert_eq!((sprite.width, sprite.height), (40.0, 40.0));
        assert_eq!(sprite.alpha, 1.0);
        assert!(!sprite.cut);
    }

    #[test]
    fn scoreboard_caps_rows_and_cursors_hide_zero_scores() {
        let mut game = Game::new(GameTuning::default(), 0);
        for n in 1..=10 {
            aim(&mut game, n, if n % 2 == 0 { "even" } else { "" });
        }
        let frame = compose(&game);

        assert_eq!(frame.cursors.len(), 10);
        assert_eq!(frame.scoreboard.len(), SCOREBOARD_ROWS);
        assert_eq!(frame.scoreboard[0].name, "Anonymous");
        assert!(frame.cursors.iter().all(|c| c.score.is_none()));
        assert_eq!(frame.cursors[0].label, None);
        assert_eq!(frame.cursors[1].label.as_deref(), Some("even"));
    }

    #[test]
    fn game_over_and_json_shape() {
        let mut game = Game::new(
            GameTuning {
                round_secs: 1,
                ..GameTuning::default()
            },
            0,
        );
        aim(&mut game, 1, "solo");
        game.start();
        game.tick_countdown();

        let frame = compose(&game);
        let over = frame.game_over.as_ref().unwrap();
        assert_eq!(over.ranking[0].place, 1);
        assert_eq!(over.ranking[0].name, "solo");

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["hud"]["phase"], "ended");
        assert_eq!(json["hud"]["timeLeft"], 0);
        assert_eq!(json["gameOver"]["finalScore"], 0);
    }
}
