//! Viewer configuration loading and validation

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::classify::PaintRules;
use crate::framing::FramingMode;
use crate::pricing::PriceTable;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Unknown viewer variant: {0}")]
    UnknownVariant(String),
    #[error("No viewer variants configured")]
    NoVariants,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Variant shown when none is requested
    #[serde(default = "default_variant_name")]
    pub default_variant: String,
    #[serde(default = "default_variants", rename = "variant")]
    pub variants: Vec<VariantConfig>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_variant: default_variant_name(),
            variants: default_variants(),
        }
    }
}

/// One car viewer: which asset to load and how to present it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantConfig {
    pub name: String,
    /// Caption in the header bar
    #[serde(default)]
    pub title: String,
    /// glTF/GLB asset path relative to the served root
    pub asset_path: String,
    /// Show the price badge
    #[serde(default)]
    pub show_price: bool,
    /// Remove textures from painted slots so the preset color shows flat
    #[serde(default)]
    pub flat_paint: bool,
    /// Uniform scale applied to the loaded model
    #[serde(default = "default_scale")]
    pub model_scale: f32,
    /// Spawn a ground plane under the car
    #[serde(default)]
    pub ground_plane: bool,
    /// Clear color as `0xRRGGBB`
    #[serde(default = "default_background")]
    pub background: u32,
    /// Ambient light intensity, relative to the key light's 0.8
    #[serde(default = "default_ambient")]
    pub ambient_intensity: f32,
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    #[serde(default)]
    pub framing: FramingMode,
    #[serde(default)]
    pub rules: PaintRules,
    #[serde(default)]
    pub prices: PriceTable,
}

fn default_variant_name() -> String {
    "showroom".to_string()
}

fn default_scale() -> f32 {
    1.0
}

fn default_background() -> u32 {
    0xffffff
}

fn default_ambient() -> f32 {
    0.8
}

fn default_fov() -> f32 {
    50.0
}

fn default_variants() -> Vec<VariantConfig> {
    vec![VariantConfig::classic(), VariantConfig::showroom()]
}

impl VariantConfig {
    /// Original viewer: grounded car on a plane, body/paint material names only
    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            title: "Car Viewer".to_string(),
            asset_path: "car.glb".to_string(),
            show_price: false,
            flat_paint: false,
            model_scale: 2.0,
            ground_plane: true,
            background: 0xeeeeee,
            ambient_intensity: 0.6,
            fov_degrees: default_fov(),
            framing: FramingMode::Fixed {
                factor: 15.0,
                min_distance: 5.0,
                max_distance: 1500.0,
            },
            rules: PaintRules::material_only(&["body", "paint"]),
            prices: PriceTable::default(),
        }
    }

    /// Second viewer: fitted camera, full classifier and price display
    pub fn showroom() -> Self {
        Self {
            name: "showroom".to_string(),
            title: "Car Viewer 2".to_string(),
            asset_path: "nissan.glb".to_string(),
            show_price: true,
            flat_paint: false,
            model_scale: 1.0,
            ground_plane: false,
            background: default_background(),
            ambient_intensity: default_ambient(),
            fov_degrees: default_fov(),
            framing: FramingMode::default(),
            rules: PaintRules::default(),
            prices: PriceTable::default(),
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.name
        } else {
            &self.title
        }
    }
}

impl ViewerConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!("Loaded viewer configuration from {:?}", path);
        Ok(config)
    }

    /// Load configuration or fall back to defaults if the file doesn't exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!("No config at {:?}, using built-in variants", path);
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.variants.is_empty() {
            return Err(ConfigError::NoVariants);
        }
        if self.variant(&self.default_variant).is_none() {
            return Err(ConfigError::UnknownVariant(self.default_variant.clone()));
        }
        Ok(())
    }

    pub fn variant(&self, name: &str) -> Option<&VariantConfig> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Resolve a requested variant, falling back to the default one
    pub fn resolve(&self, requested: Option<&str>) -> Result<&VariantConfig, ConfigError> {
        if let Some(name) = requested {
            match self.variant(name) {
                Some(variant) => return Ok(variant),
                None => tracing::warn!("Unknown variant '{}', using '{}'", name, self.default_variant),
            }
        }
        self.variant(&self.default_variant)
            .or_else(|| self.variants.first())
            .ok_or(ConfigError::NoVariants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassifierPass;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ViewerConfig::default();
        assert_eq!(config.variants.len(), 2);
        let showroom = config.resolve(None).unwrap();
        assert_eq!(showroom.asset_path, "nissan.glb");
        assert!(showroom.show_price);
        let classic = config.resolve(Some("classic")).unwrap();
        assert_eq!(classic.model_scale, 2.0);
        assert!(!classic.rules.fallback);
    }

    #[test]
    fn test_resolve_unknown_falls_back() {
        let config = ViewerConfig::default();
        assert_eq!(config.resolve(Some("limo")).unwrap().name, "showroom");
    }

    #[test]
    fn test_parse_partial_variant() {
        let config = ViewerConfig::from_toml_str(
            r#"
            default_variant = "coupe"

            [[variant]]
            name = "coupe"
            asset_path = "coupe.glb"
            show_price = true
            background = 0x202020

            [variant.framing]
            mode = "fixed"
            factor = 3.0

            [variant.rules]
            primary_keywords = ["shell"]
            fallback = false

            [variant.prices]
            original = 40000
            red = 41000
            "#,
        )
        .unwrap();

        let coupe = config.resolve(None).unwrap();
        assert_eq!(coupe.background, 0x202020);
        assert_eq!(coupe.model_scale, 1.0);
        assert_eq!(coupe.ambient_intensity, 0.8);
        assert_eq!(coupe.prices.price_for("red"), 41_000);
        assert_eq!(coupe.prices.price_for("blue"), 40_000);
        assert!(coupe.rules.match_mesh_names);
        assert!(!coupe.rules.exclusion_keywords.is_empty());
        assert_eq!(
            coupe.framing,
            FramingMode::Fixed {
                factor: 3.0,
                min_distance: 5.0,
                max_distance: 1500.0
            }
        );
        let classified = coupe.rules.classify(&[crate::classify::SlotName::new("Mesh1", "Mat1", true)]);
        assert_eq!(classified.pass, ClassifierPass::Unmatched);
    }

    #[test]
    fn test_unknown_default_variant_rejected() {
        let err = ViewerConfig::from_toml_str("default_variant = \"missing\"").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownVariant(name) if name == "missing"));
    }

    #[test]
    fn test_empty_variant_list_rejected() {
        let err = ViewerConfig::from_toml_str("variant = []").unwrap_err();
        assert!(matches!(err, ConfigError::NoVariants));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "default_variant = \"classic\"\n[[variant]]\nname = \"classic\"\nasset_path = \"car.glb\""
        )
        .unwrap();

        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.resolve(None).unwrap().asset_path, "car.glb");

        let missing = file.path().with_extension("absent.toml");
        let fallback = ViewerConfig::load_or_default(&missing).unwrap();
        assert_eq!(fallback.variants.len(), 2);
    }
}
