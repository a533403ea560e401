//! Car model loading, placement and paint capture
//!
//! A load goes through three frames at least:
//! 1. `begin_model_load` asks the asset server for the glTF and takes a ticket
//! 2. `load_models` polls the load state and spawns the default scene, hidden
//! 3. `capture_car_model` waits for the scene to instantiate, places the car on
//!    the ground, frames the camera and hands the parts to the session
//!
//! Every step checks its ticket against the session, so a model that finishes
//! loading after a variant switch is dropped.

use bevy::asset::{LoadState, RecursiveDependencyLoadState};
use bevy::gltf::{Gltf, GltfMaterialName};
use bevy::mesh::VertexAttributeValues;
use bevy::prelude::*;
use carview_core::{Bounds, LoadError, LoadTicket, Placement, VariantConfig};

use crate::camera::CameraSettings;
use crate::paint::{BevyPaintScene, CarParts};
use crate::types::{ActiveVariant, CarSession, SwitchVariant, ViewerSettings};

/// Root entity of a spawned car scene
#[derive(Component)]
pub struct CarModel {
    pub generation: u64,
}

/// A glTF asset requested but not yet spawned
pub struct PendingModel {
    pub ticket: LoadTicket,
    pub path: String,
    pub handle: Handle<Gltf>,
}

/// A spawned scene waiting to be captured
pub struct SpawnedModel {
    pub ticket: LoadTicket,
    pub root: Entity,
}

/// In-flight model load
#[derive(Resource, Default)]
pub struct ModelCache {
    pub loading: Option<PendingModel>,
    pub spawned: Option<SpawnedModel>,
}

/// Plugin for model loading
pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModelCache>()
            .init_resource::<CarParts>()
            .add_systems(Startup, start_initial_load)
            .add_systems(
                Update,
                (handle_switch_variant, load_models, capture_car_model).chain(),
            );
    }
}

/// Normalize a configured asset path for the asset server
fn normalize_model_path(path: &str) -> String {
    // Absolute URLs go through Bevy's https asset source untouched
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    path.trim_start_matches('/').to_string()
}

fn begin_model_load(
    variant: &VariantConfig,
    session: &mut CarSession,
    cache: &mut ModelCache,
    asset_server: &AssetServer,
) {
    let ticket = session.0.begin_load();
    let path = normalize_model_path(&variant.asset_path);
    tracing::info!("Starting to load model: {}", path);
    let handle: Handle<Gltf> = asset_server.load(&path);
    cache.loading = Some(PendingModel { ticket, path, handle });
    cache.spawned = None;
}

fn start_initial_load(
    variant: Res<ActiveVariant>,
    mut session: ResMut<CarSession>,
    mut cache: ResMut<ModelCache>,
    asset_server: Res<AssetServer>,
) {
    begin_model_load(&variant.0, &mut session, &mut cache, &asset_server);
}

/// Tear down the current car and load another variant
fn handle_switch_variant(
    mut commands: Commands,
    mut switches: MessageReader<SwitchVariant>,
    settings: Res<ViewerSettings>,
    mut active: ResMut<ActiveVariant>,
    mut session: ResMut<CarSession>,
    mut cache: ResMut<ModelCache>,
    mut parts: ResMut<CarParts>,
    asset_server: Res<AssetServer>,
    car_query: Query<Entity, With<CarModel>>,
) {
    // Only the last request of the frame matters
    let Some(SwitchVariant(name)) = switches.read().last().cloned() else {
        return;
    };
    let Some(variant) = settings.0.variant(&name).cloned() else {
        tracing::warn!("Unknown variant '{}', keeping '{}'", name, active.0.name);
        return;
    };

    for entity in car_query.iter() {
        commands.entity(entity).despawn();
    }
    parts.clear();
    session.0.switch_variant(&variant);
    begin_model_load(&variant, &mut session, &mut cache, &asset_server);
    active.0 = variant;
}

/// Check loading state and spawn the scene of a loaded glTF
fn load_models(
    mut commands: Commands,
    mut cache: ResMut<ModelCache>,
    mut session: ResMut<CarSession>,
    variant: Res<ActiveVariant>,
    asset_server: Res<AssetServer>,
    gltf_assets: Res<Assets<Gltf>>,
) {
    let Some(pending) = cache.loading.as_ref() else {
        return;
    };
    if !session.0.is_current(pending.ticket) {
        tracing::debug!("Dropping superseded load of {}", pending.path);
        cache.loading = None;
        return;
    }

    match asset_server.get_load_state(pending.handle.id()) {
        Some(LoadState::Loaded) => {
            // Wait for meshes, materials and textures, but don't block on a broken texture
            match asset_server.get_recursive_dependency_load_state(pending.handle.id()) {
                Some(RecursiveDependencyLoadState::Loaded) => {}
                Some(RecursiveDependencyLoadState::Failed(err)) => {
                    tracing::warn!("Some dependencies of {} failed to load: {}", pending.path, err);
                }
                _ => return,
            }

            let Some(pending) = cache.loading.take() else {
                return;
            };
            let scene = gltf_assets
                .get(&pending.handle)
                .and_then(|gltf| gltf.default_scene.clone().or_else(|| gltf.scenes.first().cloned()));
            let Some(scene_handle) = scene else {
                let error = LoadError {
                    path: pending.path,
                    reason: "glTF has no scenes".to_string(),
                };
                let _ = session.0.fail_load(pending.ticket, &error);
                return;
            };

            tracing::info!("Model loaded: {}", pending.path);
            let root = commands
                .spawn((
                    SceneRoot(scene_handle),
                    Transform::from_scale(Vec3::splat(variant.0.model_scale)),
                    // Hidden until placed, so the car never flashes at the wrong spot
                    Visibility::Hidden,
                    CarModel {
                        generation: pending.ticket.generation(),
                    },
                ))
                .id();
            cache.spawned = Some(SpawnedModel {
                ticket: pending.ticket,
                root,
            });
        }
        Some(LoadState::Failed(err)) => {
            let Some(pending) = cache.loading.take() else {
                return;
            };
            let error = LoadError {
                path: pending.path,
                reason: err.to_string(),
            };
            let _ = session.0.fail_load(pending.ticket, &error);
        }
        _ => {
            // Still loading
        }
    }
}

/// Model-space bounds of every mesh below `root`, excluding the root's own transform
pub fn model_bounds(
    root: Entity,
    children_query: &Query<&Children>,
    transform_query: &Query<&Transform>,
    mesh_query: &Query<&Mesh3d>,
    mesh_assets: &Assets<Mesh>,
) -> Option<Bounds> {
    fn collect_bounds(
        entity: Entity,
        parent: Mat4,
        children_query: &Query<&Children>,
        transform_query: &Query<&Transform>,
        mesh_query: &Query<&Mesh3d>,
        mesh_assets: &Assets<Mesh>,
        bounds: &mut Option<Bounds>,
    ) {
        let Ok(children) = children_query.get(entity) else {
            return;
        };
        for child in children.iter() {
            let local = transform_query
                .get(child)
                .map(|t| Mat4::from_scale_rotation_translation(t.scale, t.rotation, t.translation))
                .unwrap_or(Mat4::IDENTITY);
            let world = parent * local;

            if let Some(mesh_bounds) = mesh_query
                .get(child)
                .ok()
                .and_then(|mesh| mesh_assets.get(&mesh.0))
                .and_then(mesh_local_bounds)
            {
                let corners = mesh_bounds.corners().map(|c| world.transform_point3(c));
                if let Some(placed) = Bounds::from_points(corners) {
                    *bounds = Some(match bounds {
                        Some(b) => b.union(&placed),
                        None => placed,
                    });
                }
            }

            collect_bounds(child, world, children_query, transform_query, mesh_query, mesh_assets, bounds);
        }
    }

    let mut bounds = None;
    collect_bounds(
        root,
        Mat4::IDENTITY,
        children_query,
        transform_query,
        mesh_query,
        mesh_assets,
        &mut bounds,
    );
    bounds
}

fn mesh_local_bounds(mesh: &Mesh) -> Option<Bounds> {
    match mesh.attribute(Mesh::ATTRIBUTE_POSITION)? {
        VertexAttributeValues::Float32x3(positions) => {
            Bounds::from_points(positions.iter().map(|p| Vec3::from_array(*p)))
        }
        _ => None,
    }
}

/// Place, frame and classify a spawned car once its scene has instantiated
pub fn capture_car_model(
    mut commands: Commands,
    mut cache: ResMut<ModelCache>,
    mut session: ResMut<CarSession>,
    variant: Res<ActiveVariant>,
    mut camera: ResMut<CameraSettings>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mesh_assets: Res<Assets<Mesh>>,
    children_query: Query<&Children>,
    name_query: Query<&Name>,
    transform_query: Query<&Transform>,
    mesh_query: Query<&Mesh3d>,
    primitive_query: Query<(Option<&GltfMaterialName>, Option<&MeshMaterial3d<StandardMaterial>>), With<Mesh3d>>,
) {
    let Some(spawned) = cache.spawned.as_ref() else {
        return;
    };
    let (ticket, root) = (spawned.ticket, spawned.root);
    if !session.0.is_current(ticket) {
        commands.entity(root).try_despawn();
        cache.spawned = None;
        return;
    }
    // The scene spawner has not run yet
    if !children_query.contains(root) {
        return;
    }
    cache.spawned = None;

    let parts = CarParts::collect(root, &children_query, &name_query, &primitive_query);
    let scale = variant.0.model_scale;

    let mut transform = Transform::from_scale(Vec3::splat(scale));
    match model_bounds(root, &children_query, &transform_query, &mesh_query, &mesh_assets) {
        Some(bounds) => {
            let placement = Placement::new(&bounds, scale, variant.0.framing, variant.0.fov_degrees.to_radians());
            transform.translation = placement.translation;
            camera.apply_framing(&placement.framing);
            tracing::info!(
                "Placed model: size {:?}, camera at {:?}",
                placement.placed.size(),
                placement.framing.position
            );
        }
        None => tracing::warn!("Model has no mesh bounds, skipping placement"),
    }
    commands.entity(root).insert((transform, Visibility::Inherited));

    let scene = BevyPaintScene::new(&parts.parts, &mut materials);
    match session.0.complete_load(ticket, &scene) {
        Ok(pass) => {
            tracing::info!("Captured {} car parts ({:?} pass)", parts.parts.len(), pass);
            commands.insert_resource(parts);
        }
        Err(e) => {
            tracing::debug!("Discarding spawned model: {}", e);
            commands.entity(root).try_despawn();
        }
    }
}
