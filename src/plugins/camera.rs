//! Scene cameras: a plain camera for menus, one eased follow camera per
//! player, and a UI-only camera that draws the HUD over split viewports.

use bevy::camera::Viewport;
use bevy::camera::visibility::RenderLayers;
use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::app_state::GameSet;
use crate::components::{FollowCamera, Player, UiCamera};

/// Orthographic scale: one world unit spans 48 pixels.
pub const WORLD_SCALE: f32 = 1.0 / 48.0;

/// Fraction of the remaining distance a follow camera covers per tick.
pub const CAMERA_EASING: f32 = 0.1;

/// Layer nothing in the world is drawn on; the UI camera sees only UI.
const UI_LAYER: usize = 31;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (follow_players, split_viewports).in_set(GameSet::Presentation),
        );
    }
}

// ---------------------------------------------------------------------------
// Bundles
// ---------------------------------------------------------------------------

/// Camera for menu and end screens. Activated when its scene is committed.
pub fn screen_camera() -> impl Bundle {
    (
        Camera2d,
        Camera {
            is_active: false,
            ..default()
        },
    )
}

pub fn follow_camera(slot: usize, start: Vec2) -> impl Bundle {
    (
        Camera2d,
        Camera {
            order: slot as isize,
            is_active: false,
            ..default()
        },
        Projection::Orthographic(OrthographicProjection {
            scale: WORLD_SCALE,
            ..OrthographicProjection::default_2d()
        }),
        FollowCamera { slot },
        Transform::from_xyz(start.x, start.y, 0.0),
    )
}

pub fn ui_camera() -> impl Bundle {
    (
        Camera2d,
        Camera {
            order: 10,
            is_active: false,
            clear_color: ClearColorConfig::None,
            ..default()
        },
        RenderLayers::layer(UI_LAYER),
        UiCamera,
    )
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

pub fn ease_toward(current: Vec2, target: Vec2, factor: f32) -> Vec2 {
    current + (target - current) * factor
}

#[span_fn]
fn follow_players(
    players: Query<(&Player, &Transform), Without<FollowCamera>>,
    mut cameras: Query<(&FollowCamera, &mut Transform)>,
) {
    for (follow, mut camera) in &mut cameras {
        let Some((_, target)) = players.iter().find(|(p, _)| p.slot == follow.slot) else {
            continue;
        };
        let eased = ease_toward(
            camera.translation.truncate(),
            target.translation.truncate(),
            CAMERA_EASING,
        );
        camera.translation.x = eased.x;
        camera.translation.y = eased.y;
    }
}

/// Left or right half of the window for `slot` when two players share it.
pub fn split_viewport(window: UVec2, slot: usize, players: usize) -> Option<Viewport> {
    if players < 2 || window.x < 2 {
        return None;
    }
    let half = window.x / 2;
    Some(Viewport {
        physical_position: UVec2::new(if slot == 0 { 0 } else { half }, 0),
        physical_size: UVec2::new(half, window.y),
        ..default()
    })
}

#[span_fn]
fn split_viewports(windows: Query<&Window>, mut cameras: Query<(&FollowCamera, &mut Camera)>) {
    let Ok(window) = windows.single() else {
        return;
    };
    let size = window.physical_size();
    let players = cameras.iter().count();
    for (follow, mut camera) in &mut cameras {
        let viewport = split_viewport(size, follow.slot, players);
        let unchanged = match (&camera.viewport, &viewport) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.physical_position == b.physical_position && a.physical_size == b.physical_size
            }
            _ => false,
        };
        if !unchanged {
            camera.viewport = viewport;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_closes_a_tenth() {
        let eased = ease_toward(Vec2::ZERO, Vec2::new(10.0, -5.0), CAMERA_EASING);
        assert!((eased - Vec2::new(1.0, -0.5)).length() < 1e-6);
    }

    #[test]
    fn solo_uses_whole_window() {
        assert!(split_viewport(UVec2::new(1280, 720), 0, 1).is_none());
    }

    #[test]
    fn two_players_split_left_and_right() {
        let left = split_viewport(UVec2::new(1280, 720), 0, 2).unwrap();
        let right = split_viewport(UVec2::new(1280, 720), 1, 2).unwrap();
        assert_eq!(left.physical_position, UVec2::ZERO);
        assert_eq!(left.physical_size, UVec2::new(640, 720));
        assert_eq!(right.physical_position, UVec2::new(640, 0));
        assert_eq!(right.physical_size, UVec2::new(640, 720));
    }

    #[test]
    fn camera_follows_its_player() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_systems(Update, follow_players);
        app.world_mut()
            .spawn((Player { slot: 1 }, Transform::from_xyz(10.0, 0.0, 1.0)));
        app.world_mut()
            .spawn((Player { slot: 0 }, Transform::from_xyz(-10.0, 0.0, 1.0)));
        let camera = app
            .world_mut()
            .spawn((FollowCamera { slot: 1 }, Transform::default()))
            .id();
        app.update();
        let t = app.world().get::<Transform>(camera).unwrap();
        assert!((t.translation.x - 1.0).abs() < 1e-6);
    }
}
