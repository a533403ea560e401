//! Paint classification state and the color applicator
//!
//! [`PaintState`] is computed once per loaded model. It holds, keyed by part
//! identity rather than stored on scene nodes:
//! - the paintable slot indices of every part
//! - the original color (and texture) of every colored slot, captured before any
//!   mutation and never written afterwards
//!
//! The 3D engine is reached through [`PaintableScene`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::classify::{ClassifierPass, PaintRules, SlotName};
use crate::color::Rgb;

/// One material slot as seen by the classifier
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSurvey<T> {
    /// Material name, empty when the material is unnamed or missing
    pub material_name: String,
    /// Current base color, `None` when the material has no mutable color
    pub color: Option<Rgb>,
    /// Current base color texture
    pub texture: Option<T>,
}

/// One mesh part and its material slots, in slot order
#[derive(Debug, Clone, PartialEq)]
pub struct PartSurvey<P, T> {
    pub id: P,
    pub mesh_name: String,
    pub slots: Vec<SlotSurvey<T>>,
}

/// What the paint logic needs from a 3D engine
///
/// Implementations are expected to flag a material for re-upload whenever one of
/// the setters changes it.
pub trait PaintableScene {
    /// Stable identity of a part for the lifetime of the loaded model
    type PartId: Copy + Eq + Hash + fmt::Debug;
    /// Handle to a texture, cloned into snapshots
    type Texture: Clone + PartialEq + fmt::Debug;

    /// Every mesh part of the model in traversal order
    fn survey(&self) -> Vec<PartSurvey<Self::PartId, Self::Texture>>;

    /// Set a slot's base color. Returns false if the slot does not exist or its
    /// material has no mutable color.
    fn set_slot_color(&mut self, part: Self::PartId, slot: usize, color: Rgb) -> bool;

    /// Replace a slot's base color texture. Returns false if the slot does not exist.
    fn set_slot_texture(
        &mut self,
        part: Self::PartId,
        slot: usize,
        texture: Option<Self::Texture>,
    ) -> bool;
}

/// Appearance of a slot at load time
#[derive(Debug, Clone, PartialEq)]
pub struct SlotAppearance<T> {
    pub color: Rgb,
    pub texture: Option<T>,
}

/// Per-slot record kept for diagnosing assets with unusual naming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialLogEntry {
    pub mesh: String,
    pub material: String,
    pub has_color: bool,
    pub has_map: bool,
}

/// Paint classification plus original appearance snapshot of one loaded model
#[derive(Debug, Clone)]
pub struct PaintState<P, T> {
    /// Parts in traversal order
    order: Vec<P>,
    paint_slots: HashMap<P, Vec<usize>>,
    originals: HashMap<P, Vec<Option<SlotAppearance<T>>>>,
    pass: ClassifierPass,
    material_log: Vec<MaterialLogEntry>,
}

impl<P, T> PaintState<P, T>
where
    P: Copy + Eq + Hash + fmt::Debug,
    T: Clone + PartialEq + fmt::Debug,
{
    /// Classify all slots and snapshot their appearance in one traversal
    ///
    /// Must be called exactly once per loaded model, before any color change.
    pub fn capture<S>(scene: &S, rules: &PaintRules) -> Self
    where
        S: PaintableScene<PartId = P, Texture = T>,
    {
        let parts = scene.survey();

        let names: Vec<SlotName<'_>> = parts
            .iter()
            .flat_map(|part| {
                part.slots.iter().map(move |slot| {
                    SlotName::new(&part.mesh_name, &slot.material_name, slot.color.is_some())
                })
            })
            .collect();
        let classified = rules.classify(&names);

        let mut order = Vec::with_capacity(parts.len());
        let mut paint_slots = HashMap::with_capacity(parts.len());
        let mut originals = HashMap::with_capacity(parts.len());
        let mut material_log = Vec::with_capacity(names.len());
        let mut flags = classified.paintable.iter();

        for part in &parts {
            let mut indices = Vec::new();
            let mut snapshot = Vec::with_capacity(part.slots.len());

            for (idx, slot) in part.slots.iter().enumerate() {
                if flags.next().copied().unwrap_or(false) {
                    indices.push(idx);
                }
                snapshot.push(slot.color.map(|color| SlotAppearance {
                    color,
                    texture: slot.texture.clone(),
                }));
                material_log.push(MaterialLogEntry {
                    mesh: display_name(&part.mesh_name, "<noname-mesh>"),
                    material: display_name(&slot.material_name, "<noname-mat>"),
                    has_color: slot.color.is_some(),
                    has_map: slot.texture.is_some(),
                });
            }

            // A part can show up twice if the engine reports it twice; keep the first
            if paint_slots.contains_key(&part.id) {
                tracing::debug!("Part {:?} surveyed more than once, ignoring repeat", part.id);
                continue;
            }
            order.push(part.id);
            paint_slots.insert(part.id, indices);
            originals.insert(part.id, snapshot);
        }

        let state = Self {
            order,
            paint_slots,
            originals,
            pass: classified.pass,
            material_log,
        };
        state.report();
        state
    }

    fn report(&self) {
        match self.pass {
            ClassifierPass::Primary => {}
            ClassifierPass::Fallback | ClassifierPass::Unmatched => {
                let listing = serde_json::to_string(&self.material_log)
                    .unwrap_or_else(|_| format!("{:?}", self.material_log));
                tracing::warn!(
                    "No paint materials found using keyword heuristics. Materials: {}",
                    listing
                );
            }
        }

        if self.paintable_count() == 0 {
            tracing::warn!(
                "Still no paintable materials detected ({} slots surveyed), color changes will have no effect",
                self.material_log.len()
            );
        } else {
            tracing::info!(
                "Paintable material slots found: {} ({:?} pass)",
                self.paintable_count(),
                self.pass
            );
        }
    }

    /// Which classifier pass produced the paintable set
    pub fn pass(&self) -> ClassifierPass {
        self.pass
    }

    /// Paintable slot indices of a part, empty for unknown parts
    pub fn paint_slots(&self, part: P) -> &[usize] {
        self.paint_slots.get(&part).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of paintable slots across the model
    pub fn paintable_count(&self) -> usize {
        self.paint_slots.values().map(Vec::len).sum()
    }

    /// Appearance of a slot at load time, `None` for colorless slots
    pub fn original(&self, part: P, slot: usize) -> Option<&SlotAppearance<T>> {
        self.originals
            .get(&part)
            .and_then(|slots| slots.get(slot))
            .and_then(Option::as_ref)
    }

    /// Parts in traversal order
    pub fn parts(&self) -> &[P] {
        &self.order
    }

    pub fn material_log(&self) -> &[MaterialLogEntry] {
        &self.material_log
    }

    /// Paint every classified slot with `color`
    ///
    /// With `flat_paint` the slot's texture is dropped as well, which only a reset
    /// can undo. Returns the number of slots recolored.
    pub fn apply_color<S>(&self, scene: &mut S, color: Rgb, flat_paint: bool) -> usize
    where
        S: PaintableScene<PartId = P, Texture = T>,
    {
        let mut written = 0;
        for part in &self.order {
            for &slot in self.paint_slots(*part) {
                if scene.set_slot_color(*part, slot, color) {
                    written += 1;
                }
                if flat_paint {
                    scene.set_slot_texture(*part, slot, None);
                }
            }
        }
        written
    }

    /// Restore every snapshotted slot to its load-time appearance
    ///
    /// Covers all colored slots, not only paintable ones. Textures are restored
    /// only with `flat_paint`, since nothing else removes them. Returns the number
    /// of slots restored.
    pub fn reset_color<S>(&self, scene: &mut S, flat_paint: bool) -> usize
    where
        S: PaintableScene<PartId = P, Texture = T>,
    {
        let mut restored = 0;
        for part in &self.order {
            let Some(slots) = self.originals.get(part) else {
                continue;
            };
            for (slot, original) in slots.iter().enumerate() {
                let Some(original) = original else { continue };
                if scene.set_slot_color(*part, slot, original.color) {
                    restored += 1;
                }
                if flat_paint {
                    scene.set_slot_texture(*part, slot, original.texture.clone());
                }
            }
        }
        restored
    }
}

fn display_name(name: &str, placeholder: &str) -> String {
    if name.is_empty() {
        placeholder.to_string()
    } else {
        name.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MaterialBinding, Model, SurfaceMaterial, TextureRef};

    const RED: u32 = 0x7f0000;

    /// Body with a painted shell and a light housing sharing one mesh, glass, and
    /// a chrome wheel rim.
    fn sedan() -> (Model, Vec<crate::model::NodeId>) {
        let mut model = Model::new("sedan");
        let paint = model.add_material(
            SurfaceMaterial::new("Body_Paint_01")
                .with_color(Rgb::from_hex(0x224466))
                .with_map(TextureRef::new("paint_flakes.png")),
        );
        let housing = model.add_material(SurfaceMaterial::new("Housing").with_color(Rgb::from_hex(0x101010)));
        let glass = model.add_material(SurfaceMaterial::new("Glass_Windshield").with_color(Rgb::WHITE));
        let chrome = model.add_material(SurfaceMaterial::new("chrome").with_color(Rgb::from_hex(0xcccccc)));

        let root = model.root();
        let bumper = model.add_mesh(root, "bumper", MaterialBinding::Multi(vec![housing, paint]), None);
        let windshield = model.add_mesh(root, "windshield", MaterialBinding::Single(glass), None);
        let rim = model.add_mesh(root, "wheel_rim", MaterialBinding::Single(chrome), None);
        (model, vec![bumper, windshield, rim])
    }

    fn colors(model: &Model) -> Vec<Option<Rgb>> {
        model.materials().iter().map(|m| m.color).collect()
    }

    #[test]
    fn test_partial_multi_slot_classification() {
        let (model, parts) = sedan();
        let state = PaintState::capture(&model, &PaintRules::default());

        assert_eq!(state.pass(), ClassifierPass::Primary);
        assert_eq!(state.paint_slots(parts[0]), &[1]);
        assert!(state.paint_slots(parts[1]).is_empty());
        assert!(state.paint_slots(parts[2]).is_empty());
        assert_eq!(state.paintable_count(), 1);
        assert_eq!(state.material_log().len(), 4);
    }

    #[test]
    fn test_snapshot_matches_load_time_and_never_drifts() {
        let (mut model, parts) = sedan();
        let before = colors(&model);
        let state = PaintState::capture(&model, &PaintRules::default());

        let original = state.original(parts[0], 1).unwrap().clone();
        assert_eq!(Some(original.color), before[0]);
        assert_eq!(original.texture, Some(TextureRef::new("paint_flakes.png")));

        state.apply_color(&mut model, Rgb::from_hex(RED), true);
        state.apply_color(&mut model, Rgb::from_hex(0x005300), false);
        assert_eq!(state.original(parts[0], 1), Some(&original));
        assert_eq!(Some(state.original(parts[2], 0).unwrap().color), before[3]);
    }

    #[test]
    fn test_apply_isolates_non_paint_slots() {
        let (mut model, _) = sedan();
        let before = colors(&model);
        let state = PaintState::capture(&model, &PaintRules::default());

        for hex in [RED, 0x005300, 0x000082, 0x666666] {
            let written = state.apply_color(&mut model, Rgb::from_hex(hex), false);
            assert_eq!(written, 1);
            let after = colors(&model);
            assert_eq!(after[0], Some(Rgb::from_hex(hex)));
            // housing, glass and chrome keep their colors
            assert_eq!(after[1..], before[1..]);
        }
    }

    #[test]
    fn test_apply_then_reset_round_trip() {
        let (mut model, _) = sedan();
        let before = colors(&model);
        let state = PaintState::capture(&model, &PaintRules::default());

        state.apply_color(&mut model, Rgb::new(0.123, 0.456, 0.789), false);
        assert_ne!(colors(&model), before);
        state.reset_color(&mut model, false);
        assert_eq!(colors(&model), before);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let (mut model, _) = sedan();
        let state = PaintState::capture(&model, &PaintRules::default());

        state.apply_color(&mut model, Rgb::from_hex(RED), true);
        assert_eq!(state.reset_color(&mut model, true), 4);
        let once: Vec<_> = model.materials().to_vec();
        state.reset_color(&mut model, true);
        let twice: Vec<_> = model.materials().to_vec();

        let strip = |m: &[SurfaceMaterial]| m.iter().map(|m| (m.color, m.map.clone())).collect::<Vec<_>>();
        assert_eq!(strip(&once[..]), strip(&twice[..]));
    }

    #[test]
    fn test_flat_paint_drops_and_restores_texture() {
        let (mut model, _) = sedan();
        let state = PaintState::capture(&model, &PaintRules::default());

        state.apply_color(&mut model, Rgb::from_hex(RED), true);
        assert_eq!(model.materials()[0].map, None);
        state.reset_color(&mut model, true);
        assert_eq!(model.materials()[0].map, Some(TextureRef::new("paint_flakes.png")));
    }

    #[test]
    fn test_textures_kept_without_flat_paint() {
        let (mut model, _) = sedan();
        let state = PaintState::capture(&model, &PaintRules::default());

        state.apply_color(&mut model, Rgb::from_hex(RED), false);
        assert_eq!(model.materials()[0].map, Some(TextureRef::new("paint_flakes.png")));
    }

    #[test]
    fn test_apply_marks_material_dirty() {
        let (mut model, _) = sedan();
        let state = PaintState::capture(&model, &PaintRules::default());

        let version = model.materials()[0].version;
        state.apply_color(&mut model, Rgb::from_hex(RED), false);
        assert!(model.materials()[0].version > version);
        assert_eq!(model.materials()[2].version, 0);
    }

    #[test]
    fn test_fallback_marks_generic_names() {
        let mut model = Model::new("generic");
        let mat1 = model.add_material(SurfaceMaterial::new("Mat1").with_color(Rgb::from_hex(0x808080)));
        let tyre = model.add_material(SurfaceMaterial::new("Mat2").with_color(Rgb::from_hex(0x111111)));
        let root = model.root();
        let mesh1 = model.add_mesh(root, "Mesh1", MaterialBinding::Single(mat1), None);
        let tyre_mesh = model.add_mesh(root, "Tyre_FL", MaterialBinding::Single(tyre), None);

        let state = PaintState::capture(&model, &PaintRules::default());
        assert_eq!(state.pass(), ClassifierPass::Fallback);
        assert_eq!(state.paint_slots(mesh1), &[0]);
        assert!(state.paint_slots(tyre_mesh).is_empty());

        state.apply_color(&mut model, Rgb::from_hex(RED), false);
        assert_eq!(model.materials()[0].color, Some(Rgb::from_hex(RED)));
        assert_eq!(model.materials()[1].color, Some(Rgb::from_hex(0x111111)));
    }

    #[test]
    fn test_nothing_paintable_is_a_no_op() {
        let mut model = Model::new("parts");
        let glass = model.add_material(SurfaceMaterial::new("glass").with_color(Rgb::WHITE));
        let root = model.root();
        model.add_mesh(root, "window", MaterialBinding::Single(glass), None);

        let state = PaintState::capture(&model, &PaintRules::default());
        assert_eq!(state.pass(), ClassifierPass::Unmatched);
        assert_eq!(state.apply_color(&mut model, Rgb::from_hex(RED), true), 0);
        assert_eq!(model.materials()[0].color, Some(Rgb::WHITE));
    }

    #[test]
    fn test_colorless_slots_are_not_snapshotted() {
        let mut model = Model::new("unlit");
        let decal = model.add_material(SurfaceMaterial::new("body_decal"));
        let root = model.root();
        let part = model.add_mesh(root, "body", MaterialBinding::Single(decal), None);

        let state = PaintState::capture(&model, &PaintRules::default());
        assert!(state.original(part, 0).is_none());
        assert!(state.paint_slots(part).is_empty());
        assert_eq!(state.reset_color(&mut model, true), 0);
    }
}
