//! Bridge from `tracing` spans to Micromegas thread-local spans.
//!
//! Bevy (with the `trace` feature) emits a `tracing` span for every schedule
//! run, and the scene director emits one per committed transition. This
//! layer forwards both kinds as Micromegas named scopes so schedules and
//! scene swaps line up on the same timeline. Every other span is ignored.

use micromegas_tracing::dispatch::{on_begin_named_scope, on_end_named_scope};
use micromegas_tracing::intern_string::intern_string;
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Span emitted by the scene director around a commit.
pub const SCENE_TRANSITION_SPAN: &str = "scene_transition";

micromegas_tracing::static_span_location!(BRIDGE_LOCATION);

struct BridgedSpan {
    name: &'static str,
}

/// Captures the `name` field of a span.
struct NameVisitor {
    name: Option<String>,
}

impl Visit for NameVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "name" {
            self.name = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "name" {
            self.name = Some(format!("{:?}", value));
        }
    }
}

/// Scope label for a span, or `None` when the span is not bridged.
///
/// Schedule spans keep the bare schedule name; scene transitions are
/// prefixed so they stand apart from schedules.
pub fn scope_label(span_name: &str, name_field: Option<&str>) -> Option<String> {
    let field = name_field.unwrap_or_default();
    match span_name {
        "schedule" => Some(field.to_string()),
        SCENE_TRANSITION_SPAN => Some(format!("scene:{}", field)),
        _ => None,
    }
}

/// `tracing_subscriber` layer that turns schedule and scene-transition
/// spans into Micromegas named-scope events.
pub struct MicromegasBridgeLayer;

impl<S> Layer<S> for MicromegasBridgeLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let span_name = attrs.metadata().name();
        if span_name != "schedule" && span_name != SCENE_TRANSITION_SPAN {
            return;
        }
        let mut visitor = NameVisitor { name: None };
        attrs.record(&mut visitor);
        let Some(label) = scope_label(span_name, visitor.name.as_deref()) else {
            return;
        };
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(BridgedSpan {
                name: intern_string(&label),
            });
        }
    }

    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            let extensions = span.extensions();
            if let Some(data) = extensions.get::<BridgedSpan>() {
                on_begin_named_scope(&BRIDGE_LOCATION, data.name);
            }
        }
    }

    fn on_exit(&self, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            let extensions = span.extensions();
            if let Some(data) = extensions.get::<BridgedSpan>() {
                on_end_named_scope(&BRIDGE_LOCATION, data.name);
            }
        }
    }
}
