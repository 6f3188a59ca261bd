use crate::render::RenderProfile;
use bevy::{camera::Exposure, prelude::*};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, add_camera);
}

#[derive(Component)]
pub struct SceneCamera;

const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 3.0, 8.0);
const CAMERA_LOOK_AT: Vec3 = Vec3::new(0.0, 0.5, 0.0);

fn add_camera(mut commands: Commands) {
    // Defaults until the render profile settles.
    let profile = RenderProfile::default();
    commands.spawn((
        SceneCamera,
        Name::new("camera"),
        Exposure {
            ev100: profile.exposure_ev100,
        },
        bevy::core_pipeline::tonemapping::Tonemapping::AcesFitted,
        Camera3d::default(),
        Transform::from_translation(CAMERA_POSITION).looking_at(CAMERA_LOOK_AT, Vec3::Y),
        DistanceFog {
            color: Color::srgba(0.35, 0.48, 0.66, 1.0),
            directional_light_color: Color::srgba(1.0, 0.95, 0.85, 0.5),
            directional_light_exponent: 30.0,
            falloff: FogFalloff::from_visibility_colors(
                profile.fog_visibility,
                Color::srgb(0.35, 0.5, 0.66),
                Color::srgb(0.8, 0.8, 0.7),
            ),
        },
    ));
}
