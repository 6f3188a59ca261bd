//! Render profile: the scene's deferred render-side module.
//!
//! The profile is loaded through the shared module loader on the async compute pool and
//! applied to the camera and lights once it settles. The scene renders with defaults
//! until then.

use crate::{camera::SceneCamera, physics::SceneRuntime};
use bevy::{
    camera::Exposure,
    prelude::*,
    tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future},
};
use scene_shared::{BoxFuture, LoadError, ModuleKind, ModuleSource};
use serde::{Deserialize, Serialize};
use std::{io::ErrorKind, path::PathBuf, sync::Arc};

/// Default location of the profile, relative to the working directory.
pub const RENDER_PROFILE_PATH: &str = "assets/render_profile.ron";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderProfile {
    pub exposure_ev100: f32,
    /// Distance at which fog fully hides geometry (meters).
    pub fog_visibility: f32,
    pub shadows: bool,
}

impl Default for RenderProfile {
    fn default() -> Self {
        Self {
            exposure_ev100: Exposure::EV100_INDOOR,
            fog_visibility: 120.0,
            shadows: true,
        }
    }
}

/// Reads the profile from disk. A missing file yields the default profile.
#[derive(Clone, Debug)]
pub struct RenderProfileSource {
    pub path: PathBuf,
}

impl Default for RenderProfileSource {
    fn default() -> Self {
        Self {
            path: PathBuf::from(RENDER_PROFILE_PATH),
        }
    }
}

impl ModuleSource for RenderProfileSource {
    type Module = RenderProfile;

    fn load(&self) -> BoxFuture<'static, Result<RenderProfile, LoadError>> {
        let path = self.path.clone();
        Box::pin(async move {
            match std::fs::read_to_string(&path) {
                Ok(text) => ron::from_str(&text).map_err(|err| {
                    LoadError::import(ModuleKind::Render, format!("{}: {err}", path.display()))
                }),
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    debug!("no render profile at {}; using defaults", path.display());
                    Ok(RenderProfile::default())
                }
                Err(err) => Err(LoadError::import(
                    ModuleKind::Render,
                    format!("{}: {err}", path.display()),
                )),
            }
        })
    }
}

#[derive(Component)]
struct RenderProfileTask(Task<Result<Arc<RenderProfile>, LoadError>>);

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, start_render_profile_load);
    app.add_systems(Update, apply_render_profile);
}

pub(crate) fn start_render_profile_load(
    mut commands: Commands,
    runtime: Option<Res<SceneRuntime>>,
) {
    let Some(runtime) = runtime else {
        return;
    };
    let load = runtime.loader.load_render_module();
    let task = AsyncComputeTaskPool::get().spawn(load);
    commands.spawn(RenderProfileTask(task));
}

fn apply_render_profile(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut RenderProfileTask)>,
    mut camera: Query<(&mut Exposure, &mut DistanceFog), With<SceneCamera>>,
    mut lights: Query<&mut PointLight>,
) {
    for (entity, mut task) in &mut tasks {
        let Some(result) = block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();

        let profile = match result {
            Ok(profile) => profile,
            Err(err) => {
                // Cosmetic only; keep rendering with defaults.
                warn!("render profile unavailable: {err}");
                continue;
            }
        };

        for (mut exposure, mut fog) in &mut camera {
            exposure.ev100 = profile.exposure_ev100;
            fog.falloff = FogFalloff::from_visibility_colors(
                profile.fog_visibility,
                Color::srgb(0.35, 0.5, 0.66),
                Color::srgb(0.8, 0.8, 0.7),
            );
        }
        for mut light in &mut lights {
            light.shadows_enabled = profile.shadows;
        }
        info!("render profile applied: {profile:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_profile_parses() {
        let text = include_str!("../assets/render_profile.ron");
        let profile: RenderProfile = ron::from_str(text).unwrap();
        assert!(profile.fog_visibility > 0.0);
    }

    #[test]
    fn missing_profile_file_uses_defaults() {
        let source = RenderProfileSource {
            path: PathBuf::from("does/not/exist.ron"),
        };
        let profile = block_on(source.load()).unwrap();
        assert_eq!(profile, RenderProfile::default());
    }

    #[test]
    fn no_profile_load_without_runtime() {
        let mut app = App::new();
        app.add_systems(Startup, start_render_profile_load);
        app.update();

        let tasks = app
            .world_mut()
            .query::<&RenderProfileTask>()
            .iter(app.world())
            .count();
        assert_eq!(tasks, 0);
    }
}
