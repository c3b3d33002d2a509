//! Frame-level telemetry: frame time, and the state of the running session.

use bevy::prelude::*;
use micromegas_tracing::prelude::{fmetric, imetric, span_scope};

use crate::app_state::{GameSet, in_gameplay};
use crate::components::{CollectLatch, Rabbit};
use crate::scoring::ScoreTracker;

pub struct TelemetryPlugin;

impl Plugin for TelemetryPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Last, frame_telemetry);
        app.add_systems(
            Update,
            session_telemetry
                .in_set(GameSet::Presentation)
                .run_if(in_gameplay),
        );
    }
}

fn frame_telemetry(time: Res<Time>) {
    span_scope!("frame");
    let dt_ms = time.delta_secs_f64() * 1000.0;
    fmetric!("frame_time_ms", "ms", dt_ms);
}

/// Remaining time and rabbits still loose.
fn session_telemetry(score: Option<Res<ScoreTracker>>, rabbits: Query<&CollectLatch, With<Rabbit>>) {
    let Some(score) = score else {
        return;
    };
    fmetric!("session_remaining_s", "s", f64::from(score.remaining()));
    let loose = rabbits.iter().filter(|latch| !latch.triggered).count();
    imetric!("rabbits_loose", "count", loose as u64);
}
