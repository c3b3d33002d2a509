pub mod audio;
pub mod camera;
pub mod environment;
pub mod game_over;
pub mod hud;
pub mod menu;
pub mod npc;
pub mod player;
pub mod scene_flow;
pub mod sprites;
pub mod telemetry;
pub mod ui;
