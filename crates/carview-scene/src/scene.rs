//! Scene setup - camera, lights, ground and background

use bevy::prelude::*;
use carview_core::{Rgb, VariantConfig};

use crate::camera::MainCamera;
use crate::types::{ActiveVariant, CarSession, ToggleLight};

/// Illuminance of one unit of relative light intensity
pub const LUX_PER_UNIT: f32 = 10_000.0;
/// Ambient brightness of one unit of relative light intensity
pub const AMBIENT_PER_UNIT: f32 = 500.0;

const KEY_LIGHT_INTENSITY: f32 = 0.8;
const CAR_LIGHT_INTENSITY: f32 = 2.0;
const GROUND_SIZE: f32 = 500.0;
const GROUND_COLOR: u32 = 0x999999;

/// Marker component for the main directional light
#[derive(Component)]
pub struct MainDirectionalLight;

/// Marker for the toggleable light aimed at the car
#[derive(Component)]
pub struct CarLight;

/// Marker for the ground plane
#[derive(Component)]
pub struct GroundPlane;

/// Plugin for scene setup
pub struct SceneSetupPlugin;

impl Plugin for SceneSetupPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_scene)
            .add_systems(Update, (handle_toggle_light, sync_car_light).chain())
            .add_systems(Update, apply_variant_environment);
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::srgb(rgb.r, rgb.g, rgb.b)
}

fn setup_scene(mut commands: Commands, variant: Res<ActiveVariant>) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: variant.0.fov_degrees.to_radians(),
            near: 0.01,
            far: 10_000.0,
            ..default()
        }),
        Transform::from_xyz(0.0, 2.0, 8.0).looking_at(Vec3::ZERO, Vec3::Y),
        MainCamera,
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: KEY_LIGHT_INTENSITY * LUX_PER_UNIT,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(20.0, 50.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
        MainDirectionalLight,
    ));

    // Off until the user turns it on
    commands.spawn((
        DirectionalLight {
            illuminance: CAR_LIGHT_INTENSITY * LUX_PER_UNIT,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(0.0, 20.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
        Visibility::Hidden,
        CarLight,
    ));
}

/// Background, ambient light and ground plane for the active variant
fn apply_variant_environment(
    mut commands: Commands,
    variant: Res<ActiveVariant>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    ground_query: Query<Entity, With<GroundPlane>>,
    mut projection_query: Query<&mut Projection, With<MainCamera>>,
) {
    if !variant.is_changed() {
        return;
    }
    let variant: &VariantConfig = &variant.0;

    commands.insert_resource(ClearColor(to_color(Rgb::from_hex(variant.background))));
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: variant.ambient_intensity * AMBIENT_PER_UNIT,
        ..default()
    });

    if let Ok(mut projection) = projection_query.single_mut() {
        if let Projection::Perspective(perspective) = projection.as_mut() {
            perspective.fov = variant.fov_degrees.to_radians();
        }
    }

    for entity in ground_query.iter() {
        commands.entity(entity).despawn();
    }
    if variant.ground_plane {
        commands.spawn((
            Mesh3d(meshes.add(Plane3d::default().mesh().size(GROUND_SIZE, GROUND_SIZE))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: to_color(Rgb::from_hex(GROUND_COLOR)),
                perceptual_roughness: 1.0,
                ..default()
            })),
            Transform::IDENTITY,
            GroundPlane,
        ));
    }
    tracing::debug!("Applied environment for variant '{}'", variant.name);
}

fn handle_toggle_light(mut toggles: MessageReader<ToggleLight>, mut session: ResMut<CarSession>) {
    for _ in toggles.read() {
        let visible = session.0.toggle_light();
        tracing::debug!("Car light {}", if visible { "on" } else { "off" });
    }
}

/// Mirror the session's light state onto the light entity
fn sync_car_light(session: Res<CarSession>, mut light_query: Query<&mut Visibility, With<CarLight>>) {
    if !session.is_changed() {
        return;
    }
    let visibility = if session.0.light().is_visible() {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };
    for mut light_visibility in light_query.iter_mut() {
        light_visibility.set_if_neq(visibility);
    }
}
