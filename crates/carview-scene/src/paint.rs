//! Paint adapter over spawned glTF scenes
//!
//! Bevy's glTF loader spawns one entity per node (carrying the node `Name`) with
//! one child entity per mesh primitive. A car part is a node entity; its
//! material slots are its primitive children in `Children` order.

use bevy::gltf::GltfMaterialName;
use bevy::prelude::*;
use carview_core::{PaintableScene, PartSurvey, Rgb, SlotSurvey};

use crate::types::{CarSession, PaintCommand};

/// One primitive of a car part and the material it renders with
#[derive(Debug, Clone)]
pub struct PaintSlot {
    pub entity: Entity,
    pub material_name: String,
    /// `None` when the primitive uses a material other than `StandardMaterial`
    pub material: Option<Handle<StandardMaterial>>,
}

#[derive(Debug, Clone)]
pub struct PaintPart {
    pub entity: Entity,
    pub mesh_name: String,
    pub slots: Vec<PaintSlot>,
}

/// Part layout of the spawned car, collected once when the scene is ready
#[derive(Debug, Clone, Default, Resource)]
pub struct CarParts {
    pub parts: Vec<PaintPart>,
}

impl CarParts {
    /// Walk the spawned scene below `root`, parents before children
    pub fn collect(
        root: Entity,
        children_query: &Query<&Children>,
        name_query: &Query<&Name>,
        primitive_query: &Query<(Option<&GltfMaterialName>, Option<&MeshMaterial3d<StandardMaterial>>), With<Mesh3d>>,
    ) -> Self {
        let mut parts = Vec::new();
        collect_parts(root, children_query, name_query, primitive_query, &mut parts);
        Self { parts }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn clear(&mut self) {
        self.parts.clear();
    }
}

fn collect_parts(
    entity: Entity,
    children_query: &Query<&Children>,
    name_query: &Query<&Name>,
    primitive_query: &Query<(Option<&GltfMaterialName>, Option<&MeshMaterial3d<StandardMaterial>>), With<Mesh3d>>,
    parts: &mut Vec<PaintPart>,
) {
    let Ok(children) = children_query.get(entity) else {
        return;
    };

    let slots: Vec<PaintSlot> = children
        .iter()
        .filter_map(|child| {
            let (material_name, material) = primitive_query.get(child).ok()?;
            Some(PaintSlot {
                entity: child,
                material_name: material_name.map(|n| n.0.clone()).unwrap_or_default(),
                material: material.map(|m| m.0.clone()),
            })
        })
        .collect();

    if !slots.is_empty() {
        parts.push(PaintPart {
            entity,
            mesh_name: name_query.get(entity).map(|n| n.to_string()).unwrap_or_default(),
            slots,
        });
    }

    for child in children.iter() {
        if primitive_query.contains(child) {
            continue;
        }
        collect_parts(child, children_query, name_query, primitive_query, parts);
    }
}

/// [`PaintableScene`] view of the car's parts over the material assets
pub struct BevyPaintScene<'a> {
    parts: &'a [PaintPart],
    materials: &'a mut Assets<StandardMaterial>,
}

impl<'a> BevyPaintScene<'a> {
    pub fn new(parts: &'a [PaintPart], materials: &'a mut Assets<StandardMaterial>) -> Self {
        Self { parts, materials }
    }

    fn slot_handle(&self, part: Entity, slot: usize) -> Option<&'a Handle<StandardMaterial>> {
        let parts: &'a [PaintPart] = self.parts;
        parts
            .iter()
            .find(|p| p.entity == part)?
            .slots
            .get(slot)?
            .material
            .as_ref()
    }
}

fn to_rgb(color: Color) -> Rgb {
    let srgba = color.to_srgba();
    Rgb::new(srgba.red, srgba.green, srgba.blue)
}

impl PaintableScene for BevyPaintScene<'_> {
    type PartId = Entity;
    type Texture = Handle<Image>;

    fn survey(&self) -> Vec<PartSurvey<Entity, Handle<Image>>> {
        self.parts
            .iter()
            .map(|part| PartSurvey {
                id: part.entity,
                mesh_name: part.mesh_name.clone(),
                slots: part
                    .slots
                    .iter()
                    .map(|slot| {
                        let material = slot.material.as_ref().and_then(|h| self.materials.get(h));
                        SlotSurvey {
                            material_name: slot.material_name.clone(),
                            color: material.map(|m| to_rgb(m.base_color)),
                            texture: material.and_then(|m| m.base_color_texture.clone()),
                        }
                    })
                    .collect(),
            })
            .collect()
    }

    fn set_slot_color(&mut self, part: Entity, slot: usize, color: Rgb) -> bool {
        let Some(handle) = self.slot_handle(part, slot) else {
            return false;
        };
        // get_mut flags the asset as modified so the render world re-extracts it
        if let Some(material) = self.materials.get_mut(handle) {
            let alpha = material.base_color.alpha();
            material.base_color = Color::srgba(color.r, color.g, color.b, alpha);
            true
        } else {
            false
        }
    }

    fn set_slot_texture(&mut self, part: Entity, slot: usize, texture: Option<Handle<Image>>) -> bool {
        let Some(handle) = self.slot_handle(part, slot) else {
            return false;
        };
        if let Some(material) = self.materials.get_mut(handle) {
            material.base_color_texture = texture;
            true
        } else {
            false
        }
    }
}

/// Apply queued preset selections to the car
pub fn apply_paint_commands(
    mut paint_commands: MessageReader<PaintCommand>,
    mut session: ResMut<CarSession>,
    parts: Res<CarParts>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for PaintCommand(preset) in paint_commands.read().copied() {
        let mut scene = BevyPaintScene::new(&parts.parts, &mut materials);
        let price = session.0.select_preset(&mut scene, preset);
        tracing::debug!("Selected {} paint, price {}", preset, price);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use carview_core::{ClassifierPass, ColorPreset, PaintRules, PaintState};

    struct Fixture {
        materials: Assets<StandardMaterial>,
        parts: Vec<PaintPart>,
        paint: Handle<StandardMaterial>,
        glass: Handle<StandardMaterial>,
        flakes: Handle<Image>,
    }

    fn fixture() -> Fixture {
        let mut world = World::new();
        let mut images = Assets::<Image>::default();
        let flakes = images.add(Image::default());

        let mut materials = Assets::<StandardMaterial>::default();
        let paint = materials.add(StandardMaterial {
            base_color: Color::srgba(0.25, 0.5, 0.75, 0.5),
            base_color_texture: Some(flakes.clone()),
            ..default()
        });
        let trim = materials.add(StandardMaterial {
            base_color: Color::srgb(0.1, 0.1, 0.1),
            ..default()
        });
        let glass = materials.add(StandardMaterial {
            base_color: Color::WHITE,
            ..default()
        });

        let door = world.spawn_empty().id();
        let window = world.spawn_empty().id();
        let slot = |world: &mut World, name: &str, handle: &Handle<StandardMaterial>| PaintSlot {
            entity: world.spawn_empty().id(),
            material_name: name.to_string(),
            material: Some(handle.clone()),
        };
        let parts = vec![
            PaintPart {
                entity: door,
                mesh_name: "Door_L".to_string(),
                slots: vec![slot(&mut world, "Trim", &trim), slot(&mut world, "Body_Paint", &paint)],
            },
            PaintPart {
                entity: window,
                mesh_name: "Window_L".to_string(),
                slots: vec![
                    slot(&mut world, "Glass", &glass),
                    PaintSlot {
                        entity: world.spawn_empty().id(),
                        material_name: "Custom".to_string(),
                        material: None,
                    },
                ],
            },
        ];

        Fixture {
            materials,
            parts,
            paint,
            glass,
            flakes,
        }
    }

    #[test]
    fn test_survey_reports_names_colors_and_textures() {
        let mut fx = fixture();
        let scene = BevyPaintScene::new(&fx.parts, &mut fx.materials);
        let survey = scene.survey();

        assert_eq!(survey.len(), 2);
        assert_eq!(survey[0].mesh_name, "Door_L");
        assert_eq!(survey[0].slots[1].material_name, "Body_Paint");
        assert_eq!(survey[0].slots[1].color, Some(Rgb::new(0.25, 0.5, 0.75)));
        assert_eq!(survey[0].slots[1].texture, Some(fx.flakes.clone()));
        // Non-standard material reports no color
        assert_eq!(survey[1].slots[1].color, None);
    }

    #[test]
    fn test_paint_keeps_alpha_and_isolates_glass() {
        let mut fx = fixture();
        let red = ColorPreset::Red.color().unwrap();

        let mut scene = BevyPaintScene::new(&fx.parts, &mut fx.materials);
        let state = PaintState::capture(&scene, &PaintRules::default());
        assert_eq!(state.pass(), ClassifierPass::Primary);
        assert_eq!(state.apply_color(&mut scene, red, false), 1);

        let paint = fx.materials.get(&fx.paint).unwrap();
        let srgba = paint.base_color.to_srgba();
        assert!((srgba.red - red.r).abs() < 1e-6);
        assert_eq!(srgba.alpha, 0.5);
        assert_eq!(fx.materials.get(&fx.glass).unwrap().base_color, Color::WHITE);
    }

    #[test]
    fn test_reset_restores_paint_and_texture() {
        let mut fx = fixture();
        let before = fx.materials.get(&fx.paint).unwrap().base_color.to_srgba();

        let mut scene = BevyPaintScene::new(&fx.parts, &mut fx.materials);
        let state = PaintState::capture(&scene, &PaintRules::default());
        state.apply_color(&mut scene, ColorPreset::Blue.color().unwrap(), true);
        assert_eq!(state.reset_color(&mut scene, true), 3);

        let paint = fx.materials.get(&fx.paint).unwrap();
        let after = paint.base_color.to_srgba();
        assert!((after.red - before.red).abs() < 1e-6);
        assert!((after.green - before.green).abs() < 1e-6);
        assert!((after.blue - before.blue).abs() < 1e-6);
        assert_eq!(paint.base_color_texture, Some(fx.flakes.clone()));
    }

    #[test]
    fn test_missing_slots_are_rejected() {
        let mut fx = fixture();
        let window = fx.parts[1].entity;
        let mut scene = BevyPaintScene::new(&fx.parts, &mut fx.materials);
        assert!(!scene.set_slot_color(window, 1, Rgb::WHITE));
        assert!(!scene.set_slot_color(window, 7, Rgb::WHITE));
        assert!(!scene.set_slot_texture(Entity::PLACEHOLDER, 0, None));
    }

    #[test]
    fn test_collect_parts_from_spawned_hierarchy() {
        let mut world = World::new();
        let primitive = |name: &str| {
            (
                Mesh3d(Handle::default()),
                MeshMaterial3d::<StandardMaterial>(Handle::default()),
                GltfMaterialName(name.to_string()),
            )
        };

        let root = world.spawn(Name::new("root")).id();
        let body = world
            .spawn((Name::new("Body"), ChildOf(root)))
            .with_children(|parent| {
                parent.spawn(primitive("Body_Paint"));
                parent.spawn(primitive("Chrome"));
            })
            .id();
        let group = world.spawn((Name::new("Wheels"), ChildOf(root))).id();
        let wheel = world
            .spawn((Name::new("Wheel_FL"), ChildOf(group)))
            .with_children(|parent| {
                parent.spawn(primitive("Tyre"));
            })
            .id();

        let parts = world
            .run_system_once(
                move |children: Query<&Children>,
                      names: Query<&Name>,
                      primitives: Query<
                    (Option<&GltfMaterialName>, Option<&MeshMaterial3d<StandardMaterial>>),
                    With<Mesh3d>,
                >| CarParts::collect(root, &children, &names, &primitives),
            )
            .unwrap();

        assert_eq!(parts.parts.len(), 2);
        assert_eq!(parts.parts[0].entity, body);
        assert_eq!(parts.parts[0].mesh_name, "Body");
        let names: Vec<_> = parts.parts[0].slots.iter().map(|s| s.material_name.as_str()).collect();
        assert_eq!(names, vec!["Body_Paint", "Chrome"]);
        assert_eq!(parts.parts[1].entity, wheel);
        assert_eq!(parts.parts[1].slots.len(), 1);
    }
}
