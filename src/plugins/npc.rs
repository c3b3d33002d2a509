//! Rabbits: wandering, facing, and pickup by players.

use bevy::prelude::*;
use micromegas_tracing::prelude::{info, span_fn, span_scope};

use crate::ai::wander::{reroll, step_toward};
use crate::app_state::GameSet;
use crate::components::{
    CollectLatch, Hitbox, MoveSpeed, MoveState, Player, Rabbit, Velocity, Wander,
};
use crate::config::GameConfig;
use crate::events::RabbitCollected;
use crate::motion::{boxes_overlap, limit_to_world, move_state_for};
use crate::plugins::sprites::{AnimationSet, animated_bundle};

pub const RABBIT_SIZE: Vec2 = Vec2::new(1.0, 1.0);
pub const RABBIT_HITBOX: Vec2 = Vec2::new(0.5, 0.5);

pub struct NpcPlugin;

impl Plugin for NpcPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, wander_rabbits.in_set(GameSet::Motion));
        app.add_systems(Update, face_rabbits.in_set(GameSet::Animation));
        app.add_systems(Update, collect_rabbits.in_set(GameSet::Collision));
    }
}

pub fn rabbit_bundle(
    position: Vec2,
    config: &GameConfig,
    animations: AnimationSet,
) -> impl Bundle {
    (
        Rabbit,
        MoveSpeed(config.npc_speed),
        Velocity::default(),
        MoveState::default(),
        Wander::new(config.wander_interval_secs),
        CollectLatch::default(),
        Hitbox(RABBIT_HITBOX),
        animated_bundle(animations, RABBIT_SIZE),
        Transform::from_xyz(position.x, position.y, 5.0),
    )
}

/// Re-roll destinations on each wander tick and walk toward them.
#[span_fn]
fn wander_rabbits(
    time: Res<Time>,
    config: Option<Res<GameConfig>>,
    mut rabbits: Query<
        (&mut Wander, &MoveSpeed, &mut Velocity, &mut Transform, &CollectLatch),
        With<Rabbit>,
    >,
) {
    let config = config.map(|c| c.clone()).unwrap_or_default();
    let mut rng = rand::thread_rng();
    for (mut wander, speed, mut velocity, mut transform, latch) in &mut rabbits {
        if latch.triggered {
            velocity.0 = Vec2::ZERO;
            continue;
        }
        wander.timer.tick(time.delta());
        for _ in 0..wander.timer.times_finished_this_tick() {
            wander.destination = reroll(wander.destination, &mut rng, config.world_bound);
        }
        let position = transform.translation.truncate();
        let step = step_toward(position, wander.destination, speed.0, config.arrival_radius);
        velocity.0 = step;
        let limited = limit_to_world(position, step, config.world_bound);
        transform.translation.x += limited.x;
        transform.translation.y += limited.y;
    }
}

#[span_fn]
fn face_rabbits(mut rabbits: Query<(&Velocity, &mut MoveState), With<Rabbit>>) {
    for (velocity, mut state) in &mut rabbits {
        state.set_if_neq(move_state_for(velocity.0));
    }
}

/// First touch by any player collects the rabbit and hides it. The latch
/// keeps later overlaps from counting again. Player one is credited when
/// both touch in the same tick.
#[span_fn]
fn collect_rabbits(
    mut commands: Commands,
    players: Query<(&Player, &Transform, &Hitbox), Without<Rabbit>>,
    mut rabbits: Query<
        (Entity, &Transform, &Hitbox, &mut CollectLatch, &mut Visibility),
        With<Rabbit>,
    >,
) {
    for (rabbit, transform, hitbox, mut latch, mut visibility) in &mut rabbits {
        if latch.triggered {
            continue;
        }
        let position = transform.translation.truncate();
        let Some((player, _, _)) = players
            .iter()
            .filter(|(_, t, h)| boxes_overlap(position, hitbox.0, t.translation.truncate(), h.0))
            .min_by_key(|(p, _, _)| p.slot)
        else {
            continue;
        };
        latch.triggered = true;
        *visibility = Visibility::Hidden;
        info!("rabbit {:?} collected by player {}", rabbit, player.slot + 1);
        commands.trigger(RabbitCollected {
            rabbit,
            slot: player.slot,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Resource, Default)]
    struct Collected(Vec<(Entity, usize)>);

    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.init_resource::<Collected>();
        app.add_systems(
            Update,
            (wander_rabbits, face_rabbits, collect_rabbits).chain(),
        );
        app.add_observer(|event: On<RabbitCollected>, mut seen: ResMut<Collected>| {
            seen.0.push((event.rabbit, event.slot));
        });
        app
    }

    fn spawn_rabbit(app: &mut App, at: Vec2, destination: Option<Vec2>) -> Entity {
        app.world_mut()
            .spawn((
                Rabbit,
                MoveSpeed(0.05),
                Velocity::default(),
                MoveState::default(),
                Wander {
                    destination,
                    timer: Timer::from_seconds(1000.0, TimerMode::Repeating),
                },
                CollectLatch::default(),
                Hitbox(RABBIT_HITBOX),
                Visibility::default(),
                Transform::from_xyz(at.x, at.y, 5.0),
            ))
            .id()
    }

    fn spawn_player(app: &mut App, slot: usize, at: Vec2) -> Entity {
        app.world_mut()
            .spawn((
                Player { slot },
                Hitbox(Vec2::splat(0.5)),
                Transform::from_xyz(at.x, at.y, 10.0),
            ))
            .id()
    }

    #[test]
    fn rabbit_walks_toward_far_destination() {
        let mut app = setup_app();
        let rabbit = spawn_rabbit(&mut app, Vec2::ZERO, Some(Vec2::new(5.0, 0.0)));
        app.update();
        let t = app.world().get::<Transform>(rabbit).unwrap();
        assert!((t.translation.x - 0.05).abs() < 1e-6);
        assert_eq!(
            *app.world().get::<MoveState>(rabbit).unwrap(),
            MoveState::WalkingRight
        );
    }

    #[test]
    fn rabbit_idles_near_destination_and_keeps_it() {
        let mut app = setup_app();
        let target = Vec2::new(0.0, 0.5);
        let rabbit = spawn_rabbit(&mut app, Vec2::ZERO, Some(target));
        app.update();
        let t = app.world().get::<Transform>(rabbit).unwrap();
        assert_eq!(t.translation.truncate(), Vec2::ZERO);
        assert_eq!(
            app.world().get::<Wander>(rabbit).unwrap().destination,
            Some(target)
        );
        assert_eq!(
            *app.world().get::<MoveState>(rabbit).unwrap(),
            MoveState::Watching
        );
    }

    #[test]
    fn collection_fires_once_and_hides() {
        let mut app = setup_app();
        let rabbit = spawn_rabbit(&mut app, Vec2::ZERO, None);
        spawn_player(&mut app, 1, Vec2::new(0.5, 0.0));
        app.update();
        app.update();
        app.update();

        assert_eq!(app.world().resource::<Collected>().0, vec![(rabbit, 1)]);
        assert!(app.world().get::<CollectLatch>(rabbit).unwrap().triggered);
        assert_eq!(
            *app.world().get::<Visibility>(rabbit).unwrap(),
            Visibility::Hidden
        );
    }

    #[test]
    fn simultaneous_touch_credits_the_lower_slot() {
        let mut app = setup_app();
        let rabbit = spawn_rabbit(&mut app, Vec2::ZERO, None);
        spawn_player(&mut app, 1, Vec2::new(0.5, 0.0));
        spawn_player(&mut app, 0, Vec2::new(-0.5, 0.0));
        app.update();
        app.update();

        assert_eq!(app.world().resource::<Collected>().0, vec![(rabbit, 0)]);
    }

    #[test]
    fn distant_player_collects_nothing() {
        let mut app = setup_app();
        spawn_rabbit(&mut app, Vec2::ZERO, None);
        spawn_player(&mut app, 0, Vec2::new(3.0, 0.0));
        app.update();
        assert!(app.world().resource::<Collected>().0.is_empty());
    }
}
