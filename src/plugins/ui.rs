//! Shared widget bundles for menus, the HUD and end screens.

use bevy::prelude::*;

pub const BACKGROUND: Color = Color::srgb(0.05, 0.11, 0.07);
pub const ACCENT: Color = Color::srgb(1.0, 0.85, 0.0);
pub const MUTED: Color = Color::srgb(0.7, 0.75, 0.7);
pub const BUTTON_IDLE: Color = Color::srgb(0.16, 0.3, 0.18);
pub const BUTTON_HOVER: Color = Color::srgb(0.22, 0.42, 0.25);
pub const BUTTON_PRESSED: Color = Color::srgb(0.35, 0.6, 0.3);

/// Full-window column that centres its children.
pub fn screen(background: Color) -> impl Bundle {
    (
        Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            flex_direction: FlexDirection::Column,
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            row_gap: Val::Px(20.0),
            ..default()
        },
        BackgroundColor(background),
    )
}

pub fn label(text: impl Into<String>, size: f32, color: Color) -> impl Bundle {
    (
        Text::new(text),
        TextColor(color),
        TextFont {
            font_size: size,
            ..default()
        },
    )
}

pub fn button<A: Component>(action: A, text: impl Into<String>) -> impl Bundle {
    (
        Button,
        action,
        Node {
            min_width: Val::Px(220.0),
            padding: UiRect::axes(Val::Px(24.0), Val::Px(10.0)),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        BackgroundColor(BUTTON_IDLE),
        children![label(text, 26.0, Color::WHITE)],
    )
}

pub fn small_button<A: Component>(action: A, text: impl Into<String>) -> impl Bundle {
    (
        Button,
        action,
        Node {
            width: Val::Px(48.0),
            height: Val::Px(48.0),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        BackgroundColor(BUTTON_IDLE),
        children![label(text, 26.0, Color::WHITE)],
    )
}

/// Tint buttons by interaction.
pub fn button_feedback(
    mut buttons: Query<(&Interaction, &mut BackgroundColor), (Changed<Interaction>, With<Button>)>,
) {
    for (interaction, mut color) in &mut buttons {
        color.0 = match interaction {
            Interaction::Pressed => BUTTON_PRESSED,
            Interaction::Hovered => BUTTON_HOVER,
            Interaction::None => BUTTON_IDLE,
        };
    }
}
