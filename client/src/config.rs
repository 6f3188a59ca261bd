use bevy::prelude::*;
use scene_shared::{FailurePolicy, IMPULSE_STRENGTH};
use std::path::PathBuf;

/// Startup options for the scene.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct SceneConfig {
    /// RON asset catalog; the built-in catalog when unset.
    pub catalog: Option<PathBuf>,
    /// Retry a failed module load once instead of keeping the first failure.
    pub retry_load: bool,
    pub impulse_strength: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            retry_load: false,
            impulse_strength: IMPULSE_STRENGTH,
        }
    }
}

impl SceneConfig {
    pub fn failure_policy(&self) -> FailurePolicy {
        if self.retry_load {
            FailurePolicy::Retry { max_attempts: 2 }
        } else {
            FailurePolicy::default()
        }
    }
}

pub(super) fn plugin(app: &mut App) {
    let config = read_config_from_cli_env(std::env::args().skip(1), |key| std::env::var(key).ok());
    info!("scene config: {config:?}");
    app.insert_resource(config);
}

/// Reads the scene config from CLI args, falling back to the environment.
///
/// Supported:
///   --catalog <path> / --catalog=<path>    or SCENE_CATALOG
///   --retry-load                           or SCENE_RETRY_LOAD=1
///   --impulse <f32> / --impulse=<f32>      or SCENE_IMPULSE
fn read_config_from_cli_env(
    args: impl IntoIterator<Item = String>,
    env: impl Fn(&str) -> Option<String>,
) -> SceneConfig {
    let mut catalog = None;
    let mut retry_load = false;
    let mut impulse = None;

    let mut args = args.into_iter();
    let mut pending_key: Option<&'static str> = None;

    while let Some(arg) = args.next() {
        if let Some(key) = pending_key.take() {
            if key == "catalog" {
                catalog = Some(PathBuf::from(arg));
            } else if key == "impulse" {
                impulse = Some(arg);
            }
        } else if arg == "--catalog" {
            pending_key = Some("catalog");
        } else if let Some(path) = arg.strip_prefix("--catalog=") {
            catalog = Some(PathBuf::from(path));
        } else if arg == "--retry-load" {
            retry_load = true;
        } else if arg == "--impulse" {
            pending_key = Some("impulse");
        } else if let Some(val) = arg.strip_prefix("--impulse=") {
            impulse = Some(val.to_string());
        }
    }

    let catalog = catalog.or_else(|| env("SCENE_CATALOG").map(PathBuf::from));
    let retry_load = retry_load
        || env("SCENE_RETRY_LOAD").is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes"));
    let impulse_strength = impulse
        .or_else(|| env("SCENE_IMPULSE"))
        .and_then(|raw| match raw.trim().parse::<f32>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
            _ => {
                warn!("ignoring invalid impulse strength `{raw}`");
                None
            }
        })
        .unwrap_or(IMPULSE_STRENGTH);

    SceneConfig {
        catalog,
        retry_load,
        impulse_strength,
    }
}
