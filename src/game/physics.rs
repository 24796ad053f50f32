//! Fruit motion and reach tests

use super::fruit::Fruit;
use super::tuning::GameTuning;

/// Physics system for the fixed logical step
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance one fruit by one step.
    /// Uncut fruit only drifts right; cut fruit also falls and accelerates downward.
    pub fn step_fruit(fruit: &mut Fruit, tuning: &GameTuning, dt: f32) {
        fruit.x += fruit.vel_x;

        if fruit.cut {
            fruit.cut_time += dt;
            fruit.y += fruit.vel_y;
            fruit.vel_y += tuning.gravity;
        }
    }

    /// Past the right or bottom edge, plus margin
    pub fn is_off_surface(fruit: &Fruit, tuning: &GameTuning) -> bool {
        fruit.x > tuning.width + tuning.despawn_margin
            || fruit.y > tuning.height + tuning.despawn_margin
    }

    /// Strictly closer than `radius`
    pub fn within_reach(x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) -> bool {
        let dx = x2 - x1;
        let dy = y2 - y1;
        (dx * dx + dy * dy).sqrt() < radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fruit::FruitKind;

    #[test]
    fn uncut_fruit_only_drifts_right() {
        let tuning = GameTuning::default();
        let mut fruit = Fruit::new(FruitKind::Apple, -50.0, 200.0, 40.0);
        PhysicsSystem::step_fruit(&mut fruit, &tuning, 0.016);
        PhysicsSystem::step_fruit(&mut fruit, &tuning, 0.016);
        assert_eq!((fruit.x, fruit.y), (-46.0, 200.0));
        assert_eq!(fruit.cut_time, 0.0);
    }

    #[test]
    fn cut_fruit_falls_under_gravity() {
        let tuning = GameTuning::default();
        let mut fruit = Fruit::new(FruitKind::Apple, 100.0, 200.0, 40.0);
        fruit.mark_cut();

        PhysicsSystem::step_fruit(&mut fruit, &tuning, 0.016);
        assert_eq!(fruit.y, 200.0);
        assert_eq!(fruit.vel_y, 0.5);

        PhysicsSystem::step_fruit(&mut fruit, &tuning, 0.016);
        assert_eq!(fruit.y, 200.5);
        assert_eq!(fruit.vel_y, 1.0);
        assert_eq!(fruit.x, 104.0);
    }

    #[test]
    fn leaves_surface_only_past_margin() {
        let tuning = GameTuning::default().with_surface(800.0, 600.0);
        let mut fruit = Fruit::new(FruitKind::Apple, 850.0, 300.0, 40.0);
        assert!(!PhysicsSystem::is_off_surface(&fruit, &tuning));
        fruit.x = 850.5;
        assert!(PhysicsSystem::is_off_surface(&fruit, &tuning));

        fruit.x = 10.0;
        fruit.y = 651.0;
        assert!(PhysicsSystem::is_off_surface(&fruit, &tuning));
    }

    #[test]
    fn reach_is_strict() {
        assert!(PhysicsSystem::within_reach(0.0, 0.0, 59.9, 0.0, 60.0));
        assert!(!PhysicsSystem::within_reach(0.0, 0.0, 60.0, 0.0, 60.0));
        assert!(!PhysicsSystem::within_reach(0.0, 0.0, 36.0, 48.0, 60.0));
        assert!(PhysicsSystem::within_reach(0.0, 0.0, 35.0, 48.0, 60.0));
    }
}
