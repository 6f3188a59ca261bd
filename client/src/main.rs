// Support configuring Bevy lints within code.
#![cfg_attr(bevy_lint, feature(register_tool), register_tool(bevy))]
// Disable console on Windows for non-dev builds.
#![cfg_attr(not(feature = "dev"), windows_subsystem = "windows")]

mod camera;
mod config;
mod convert;
mod input;
mod interact;
mod physics;
mod render;
mod scene;
mod world;

use bevy::picking::prelude::*;
use bevy::prelude::*;

fn main() -> AppExit {
    App::new().add_plugins(AppPlugin).run()
}

pub struct AppPlugin;
impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Window {
                    title: "Physics Scene".to_string(),
                    fit_canvas_to_parent: true,
                    ..default()
                }
                .into(),
                ..default()
            }),
            MeshPickingPlugin,
        ));

        // `config` first: the physics runtime is built from it.
        app.add_plugins((
            config::plugin,
            physics::plugin,
            render::plugin,
            camera::plugin,
            world::plugin,
            scene::plugin,
            input::plugin,
            interact::plugin,
        ));
    }
}
