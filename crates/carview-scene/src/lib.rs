//! Carview Scene - Bevy rendering for the car viewer
//!
//! This crate wires `carview-core` into a Bevy app: glTF loading and placement,
//! the paint adapter over `StandardMaterial` assets, lights, ground and the
//! orbit camera. The egui overlay lives in the viewer crate.

pub mod camera;
pub mod models;
pub mod paint;
pub mod scene;
pub mod types;

use bevy::prelude::*;
use carview_core::{VariantConfig, ViewerConfig};

/// Plugin that sets up the car scene for one starting variant
pub struct CarviewScenePlugin {
    pub config: ViewerConfig,
    pub variant: VariantConfig,
}

impl Plugin for CarviewScenePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ViewerSettings(self.config.clone()))
            .insert_resource(ActiveVariant(self.variant.clone()))
            .insert_resource(CarSession::new(&self.variant))
            .add_message::<PaintCommand>()
            .add_message::<ToggleLight>()
            .add_message::<SwitchVariant>()
            .add_plugins(camera::CameraPlugin)
            .add_plugins(scene::SceneSetupPlugin)
            .add_plugins(models::ModelsPlugin)
            .add_systems(Update, paint::apply_paint_commands.after(models::capture_car_model));
    }
}

// Re-export commonly used types
pub use types::*;
pub use camera::CameraSettings;
pub use paint::{BevyPaintScene, CarParts};
