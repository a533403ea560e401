//! Bevy application setup

use anyhow::Context;
use bevy::prelude::*;
use bevy::winit::WinitSettings;
use bevy_egui::EguiPlugin;
use bevy_picking::{DefaultPickingPlugins, prelude::MeshPickingPlugin};
use carview_core::{VariantConfig, ViewerConfig};
use carview_scene::CarviewScenePlugin;

use crate::ui::UiPlugin;

/// Variants shipped with the viewer
const EMBEDDED_CONFIG: &str = include_str!("../carview.toml");

fn load_config() -> anyhow::Result<ViewerConfig> {
    ViewerConfig::from_toml_str(EMBEDDED_CONFIG).context("embedded carview.toml is invalid")
}

/// Value of the `?variant=` query parameter of the page URL
fn requested_variant() -> Option<String> {
    #[cfg(target_arch = "wasm32")]
    {
        let href = web_sys::window()?.location().href().ok()?;
        let url = web_sys::Url::new(&href).ok()?;
        url.search_params().get("variant")
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        None
    }
}

/// Pick the starting variant, falling back to built-in defaults on a bad config
fn startup_variant(config: &ViewerConfig, requested: Option<&str>) -> VariantConfig {
    match config.resolve(requested) {
        Ok(variant) => variant.clone(),
        Err(e) => {
            tracing::error!("No usable variant in configuration: {}", e);
            VariantConfig::showroom()
        }
    }
}

pub fn run() {
    let config = load_config().unwrap_or_else(|e| {
        tracing::error!("{:#}, using built-in variants", e);
        ViewerConfig::default()
    });
    let requested = requested_variant();
    let variant = startup_variant(&config, requested.as_deref());
    tracing::info!("Starting viewer with variant '{}'", variant.name);

    App::new()
        .insert_resource(WinitSettings::default())
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: variant.display_title().to_string(),
                    canvas: Some("#viewer-canvas".to_string()),
                    fit_canvas_to_parent: true,
                    prevent_default_event_handling: true,
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                // Models are served from the page root
                file_path: "".to_string(),
                // Don't look for .meta files - server doesn't have them
                meta_check: bevy::asset::AssetMetaCheck::Never,
                ..default()
            })
        )
        // bevy_egui looks for bevy_picking's PickingPlugin, so add picking before it
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(MeshPickingPlugin)
        .add_plugins(EguiPlugin::default())
        .add_plugins(CarviewScenePlugin { config, variant })
        .add_plugins(UiPlugin)
        .run();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_matches_builtin_variants() {
        let config = load_config().unwrap();
        let classic = config.variant("classic").unwrap();
        let showroom = config.variant("showroom").unwrap();

        assert_eq!(classic.rules, VariantConfig::classic().rules);
        assert_eq!(classic.framing, VariantConfig::classic().framing);
        assert_eq!(classic.ambient_intensity, 0.6);
        assert!(!classic.show_price);
        assert_eq!(showroom.rules, VariantConfig::showroom().rules);
        assert_eq!(showroom.prices, VariantConfig::showroom().prices);
        assert!(showroom.show_price);
    }

    #[test]
    fn test_startup_variant_resolution() {
        let config = load_config().unwrap();
        assert_eq!(startup_variant(&config, None).name, "showroom");
        assert_eq!(startup_variant(&config, Some("classic")).name, "classic");
        assert_eq!(startup_variant(&config, Some("unknown")).name, "showroom");
    }
}
