//! Per-Player Simulation Step
//!
//! Integrates one fixed-rate tick of platformer movement for a single
//! player: fold queued actions into velocity, apply gravity, integrate,
//! resolve the ground plane, clamp to the map, derive the visual state.

use crate::game::player::{Action, Facing, Player, VisualState};

/// Horizontal movement speed, px/s.
pub const MOVE_SPEED: f32 = 200.0;
/// Initial jump velocity, px/s. Negative because y grows downward.
pub const JUMP_VELOCITY: f32 = -450.0;
/// Gravity, px/s².
pub const GRAVITY: f32 = 900.0;
/// The ground line.
pub const GROUND_Y: f32 = 500.0;
/// Map width, pixels.
pub const MAP_WIDTH: f32 = 1280.0;
/// Map height, pixels.
pub const MAP_HEIGHT: f32 = 720.0;

/// Grounded check with a small tolerance so a player resting exactly on the
/// line can always jump.
#[inline]
fn on_ground(y: f32) -> bool {
    y >= GROUND_Y - 0.1
}

/// Advance one player by one tick of `dt` seconds.
///
/// Consumes and clears the pending action buffer. For the horizontal axis,
/// later actions in the buffer win; a jump only fires while grounded.
pub fn step(p: &mut Player, dt: f32) {
    if p.health <= 0 {
        p.state = VisualState::Dead;
        p.vx = 0.0;
        p.pending_actions.clear();
        return;
    }

    // Fold queued actions into velocity.
    p.vx = 0.0;
    for action in p.pending_actions.iter() {
        match action {
            Action::Left => {
                p.vx = -MOVE_SPEED;
                p.facing = Facing::Left;
            }
            Action::Right => {
                p.vx = MOVE_SPEED;
                p.facing = Facing::Right;
            }
            Action::Jump => {
                if on_ground(p.y) {
                    p.vy = JUMP_VELOCITY;
                }
            }
        }
    }

    // Integrate.
    p.vy += GRAVITY * dt;
    p.x += p.vx * dt;
    p.y += p.vy * dt;

    // Ground plane.
    if p.y >= GROUND_Y {
        p.y = GROUND_Y;
        p.vy = 0.0;
    }

    // Horizontal bounds. No ceiling clamp.
    p.x = p.x.clamp(0.0, MAP_WIDTH);

    p.state = if !on_ground(p.y) {
        if p.vy < 0.0 {
            VisualState::Jumping
        } else {
            VisualState::Falling
        }
    } else if p.vx.abs() > 0.1 {
        VisualState::Running
    } else {
        VisualState::Idle
    };

    p.pending_actions.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.05; // 20 Hz

    fn grounded_player() -> Player {
        let mut p = Player::new("p1", "A");
        p.spawn(200.0, GROUND_Y);
        p
    }

    #[test]
    fn test_idle_grounded_is_fixed_point() {
        let mut p = grounded_player();
        p.state = VisualState::Running;

        step(&mut p, DT);

        assert_eq!(p.x, 200.0);
        assert_eq!(p.y, GROUND_Y);
        assert_eq!(p.vy, 0.0);
        assert_eq!(p.state, VisualState::Idle);

        // And stays there.
        for _ in 0..10 {
            step(&mut p, DT);
        }
        assert_eq!((p.x, p.y, p.vy), (200.0, GROUND_Y, 0.0));
    }

    #[test]
    fn test_run_right_then_left_overrides() {
        let mut p = grounded_player();
        p.pending_actions = vec![Action::Right, Action::Left];

        step(&mut p, DT);

        // Later action wins the horizontal axis.
        assert_eq!(p.vx, -MOVE_SPEED);
        assert_eq!(p.facing, Facing::Left);
        assert_eq!(p.x, 200.0 - MOVE_SPEED * DT);
        assert_eq!(p.state, VisualState::Running);
        assert!(p.pending_actions.is_empty());
    }

    #[test]
    fn test_jump_arc() {
        let mut p = grounded_player();
        p.pending_actions = vec![Action::Jump];

        step(&mut p, DT);

        // Jump sets vy, gravity pulls it back before integration.
        assert!((p.vy - (JUMP_VELOCITY + GRAVITY * DT)).abs() < 1e-3);
        assert!((p.y - (GROUND_Y + (JUMP_VELOCITY + GRAVITY * DT) * DT)).abs() < 1e-3);
        assert_eq!(p.state, VisualState::Jumping);

        // Rises, falls, and lands again well within a second.
        let mut landed_at = None;
        for tick in 2..=25 {
            step(&mut p, DT);
            if p.y == GROUND_Y && p.vy == 0.0 {
                landed_at = Some(tick);
                break;
            }
            assert!(matches!(p.state, VisualState::Jumping | VisualState::Falling));
        }
        assert!(landed_at.is_some(), "player never landed");
        assert_eq!(p.state, VisualState::Idle);
    }

    #[test]
    fn test_jump_denied_in_air() {
        let mut p = grounded_player();
        p.pending_actions = vec![Action::Jump];
        step(&mut p, DT);
        let airborne_vy = p.vy;

        // A second jump mid-air must not reset vy.
        p.pending_actions = vec![Action::Jump];
        step(&mut p, DT);
        assert!(p.vy > airborne_vy, "gravity kept acting, no second launch");
    }

    #[test]
    fn test_x_clamped_to_map() {
        let mut p = grounded_player();
        p.x = 2.0;
        p.pending_actions = vec![Action::Left];
        step(&mut p, DT);
        assert_eq!(p.x, 0.0);

        p.x = MAP_WIDTH - 2.0;
        p.pending_actions = vec![Action::Right];
        step(&mut p, DT);
        assert_eq!(p.x, MAP_WIDTH);
    }

    #[test]
    fn test_dead_player_frozen() {
        let mut p = grounded_player();
        p.health = 0;
        p.vx = 100.0;
        p.pending_actions = vec![Action::Right, Action::Jump];

        step(&mut p, DT);

        assert_eq!(p.state, VisualState::Dead);
        assert_eq!(p.vx, 0.0);
        assert_eq!(p.x, 200.0);
        assert_eq!(p.y, GROUND_Y);
        assert!(p.pending_actions.is_empty());
    }

    #[test]
    fn test_falling_state_when_dropping() {
        let mut p = grounded_player();
        p.y = 300.0;
        p.vy = 10.0;
        step(&mut p, DT);
        assert_eq!(p.state, VisualState::Falling);
    }
}
