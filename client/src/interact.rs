use crate::{
    camera::SceneCamera,
    config::SceneConfig,
    convert::{isometry_from, to_point, to_vector},
    input::SceneAction,
    physics::{PhysicsBody, PhysicsScene, physics_ready},
    scene::SceneAsset,
};
use bevy::{picking::pointer::PointerInteraction, prelude::*};
use leafwing_input_manager::prelude::ActionState;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use scene_shared::{ImpulseOutcome, SceneMesh, apply_impulse};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (push_clicked_mesh, reset_scene).run_if(physics_ready),
    );
}

/// A picked entity as seen by the impulse utility.
struct PickedMesh<'a> {
    name: &'a Name,
    transform: &'a GlobalTransform,
}

impl SceneMesh for PickedMesh<'_> {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn world_position(&self) -> Point3<f32> {
        to_point(self.transform.translation())
    }
}

fn push_clicked_mesh(
    actions: Res<ActionState<SceneAction>>,
    interactions: Query<&PointerInteraction>,
    meshes: Query<(&Name, &GlobalTransform)>,
    camera: Single<&GlobalTransform, With<SceneCamera>>,
    config: Res<SceneConfig>,
    mut scene: ResMut<PhysicsScene>,
) {
    if !actions.just_pressed(&SceneAction::Push) {
        return;
    }
    let Ok(interaction) = interactions.single() else {
        return;
    };
    let Some((entity, _hit)) = interaction.get_nearest_hit() else {
        return;
    };
    let Ok((name, transform)) = meshes.get(*entity) else {
        return;
    };

    let PhysicsScene { world, bodies } = &mut *scene;
    let Some(world) = world.as_mut() else {
        return;
    };
    let target = PickedMesh { name, transform };
    let source = isometry_from(*camera);

    match apply_impulse(
        &target,
        &source,
        bodies,
        &mut world.bodies,
        config.impulse_strength,
    ) {
        ImpulseOutcome::Applied { impulse, .. } => debug!("pushed `{name}` with {impulse:?}"),
        ImpulseOutcome::NoBody => {}
    }
}

fn reset_scene(
    actions: Res<ActionState<SceneAction>>,
    assets: Query<(&SceneAsset, &PhysicsBody)>,
    mut scene: ResMut<PhysicsScene>,
) {
    if !actions.just_pressed(&SceneAction::Reset) {
        return;
    }
    let Some(world) = scene.world.as_mut() else {
        return;
    };

    for (asset, body) in &assets {
        let Some(rb) = world.bodies.get_mut(body.0) else {
            continue;
        };
        rb.set_translation(to_vector(asset.home), true);
        rb.set_rotation(UnitQuaternion::identity(), true);
        rb.set_linvel(Vector3::zeros(), true);
        rb.set_angvel(Vector3::zeros(), true);
    }
    info!("scene reset");
}
