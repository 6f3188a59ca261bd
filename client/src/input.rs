use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneAction {
    /// Push the mesh under the cursor away from the camera.
    Push,
    /// Put every asset back where it spawned.
    Reset,
}

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<SceneAction>::default());

    app.register_type::<SceneAction>();

    let mut input_map = InputMap::<SceneAction>::default();
    input_map.insert(SceneAction::Push, MouseButton::Left);
    input_map.insert(SceneAction::Reset, KeyCode::KeyR);
    app.insert_resource(input_map);
    app.insert_resource(ActionState::<SceneAction>::default());
}
