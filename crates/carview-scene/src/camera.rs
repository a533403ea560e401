//! Orbit camera around the car

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy_egui::EguiContexts;
use carview_core::CameraFraming;
use std::f32::consts::FRAC_PI_2;

/// Keeps the eye off the poles where `look_at` with +Y up degenerates
const POLE_MARGIN: f32 = 1e-3;

/// Orbit camera state. Angles are in radians, Y is up.
///
/// `target_*` fields are where input wants the camera; the current values
/// follow them with exponential damping.
#[derive(Debug, Clone, Resource)]
pub struct CameraSettings {
    pub distance: f32,
    pub target_distance: f32,
    pub azimuth: f32,
    pub target_azimuth: f32,
    pub elevation: f32,
    pub target_elevation: f32,
    pub target: Vec3,
    pub target_focus: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_elevation: f32,
    pub max_elevation: f32,
    pub allow_pan: bool,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub smooth_factor: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 8.0,
            target_distance: 8.0,
            azimuth: 0.0,
            target_azimuth: 0.0,
            elevation: 0.3,
            target_elevation: 0.3,
            target: Vec3::ZERO,
            target_focus: Vec3::ZERO,
            min_distance: 0.2,
            max_distance: 1500.0,
            min_elevation: -FRAC_PI_2 + POLE_MARGIN,
            max_elevation: FRAC_PI_2 - POLE_MARGIN,
            allow_pan: true,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            smooth_factor: 0.07,
        }
    }
}

impl CameraSettings {
    /// Jump to a framing computed for a freshly placed model
    pub fn apply_framing(&mut self, framing: &CameraFraming) {
        let offset = framing.position - framing.target;
        let distance = framing.initial_distance();

        // Polar angles are measured from +Y, elevation from the horizon
        self.min_elevation = (FRAC_PI_2 - framing.max_polar).max(-FRAC_PI_2 + POLE_MARGIN);
        self.max_elevation = (FRAC_PI_2 - framing.min_polar).min(FRAC_PI_2 - POLE_MARGIN);
        self.min_distance = framing.min_distance;
        self.max_distance = framing.max_distance;
        self.allow_pan = framing.allow_pan;
        self.smooth_factor = framing.damping;

        let horizontal = Vec2::new(offset.x, offset.z).length();
        let elevation = offset.y.atan2(horizontal).clamp(self.min_elevation, self.max_elevation);
        let azimuth = offset.x.atan2(offset.z);

        self.distance = distance;
        self.target_distance = distance;
        self.elevation = elevation;
        self.target_elevation = elevation;
        self.azimuth = azimuth;
        self.target_azimuth = azimuth;
        self.target = framing.target;
        self.target_focus = framing.target;
    }

    /// Rotate by a pointer drag in pixels
    pub fn orbit(&mut self, delta: Vec2) {
        self.target_azimuth -= delta.x * self.sensitivity;
        self.target_elevation = (self.target_elevation + delta.y * self.sensitivity)
            .clamp(self.min_elevation, self.max_elevation);
    }

    /// Move the orbit target in the view plane by a pointer drag in pixels
    pub fn pan(&mut self, delta: Vec2) {
        if !self.allow_pan {
            return;
        }
        let right = Vec3::new(self.azimuth.cos(), 0.0, -self.azimuth.sin());
        let pan_speed = self.distance * 0.002;
        self.target_focus -= right * delta.x * pan_speed;
        self.target_focus += Vec3::Y * delta.y * pan_speed;
    }

    /// Zoom by wheel lines; positive values move closer
    pub fn zoom(&mut self, lines: f32) {
        let factor = (1.0 - lines * self.zoom_speed).max(0.1);
        self.scale_distance(factor);
    }

    /// Multiply the target distance, clamped to the orbit limits
    pub fn scale_distance(&mut self, factor: f32) {
        self.target_distance = (self.target_distance * factor).clamp(self.min_distance, self.max_distance);
    }

    /// Advance the damped values by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        let lerp_factor = 1.0 - (-self.smooth_factor * 60.0 * dt).exp();
        self.distance += (self.target_distance - self.distance) * lerp_factor;
        self.azimuth += (self.target_azimuth - self.azimuth) * lerp_factor;
        self.elevation += (self.target_elevation - self.elevation) * lerp_factor;
        self.target += (self.target_focus - self.target) * lerp_factor;
    }

    /// Current eye position
    pub fn eye(&self) -> Vec3 {
        let horizontal = self.distance * self.elevation.cos();
        self.target
            + Vec3::new(
                horizontal * self.azimuth.sin(),
                self.distance * self.elevation.sin(),
                horizontal * self.azimuth.cos(),
            )
    }
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Plugin for camera controls
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraSettings>()
            .add_systems(Update, update_camera);
    }
}

fn update_camera(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    mut settings: ResMut<CameraSettings>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    time: Res<Time>,
    mut contexts: EguiContexts,
) {
    // Check if egui wants the mouse - if so, don't process camera controls
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input() || ctx.is_pointer_over_area())
        .unwrap_or(false);

    let total_motion: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();
    let scroll_lines: f32 = mouse_wheel
        .read()
        .map(|scroll| match scroll.unit {
            MouseScrollUnit::Line => scroll.y,
            MouseScrollUnit::Pixel => scroll.y / 100.0,
        })
        .sum();

    if !egui_wants_pointer {
        if mouse_button.pressed(MouseButton::Left) {
            settings.orbit(total_motion);
        }
        if mouse_button.pressed(MouseButton::Right) {
            settings.pan(total_motion);
        }
        if scroll_lines != 0.0 {
            settings.zoom(scroll_lines);
        }

        let touches: Vec<_> = touch_input.iter().collect();
        match touches.as_slice() {
            [touch] => settings.orbit(touch.delta()),
            [t1, t2] => {
                // Pinch to zoom
                let curr_dist = t1.position().distance(t2.position());
                let prev_dist = (t1.position() - t1.delta()).distance(t2.position() - t2.delta());
                settings.scale_distance(prev_dist / curr_dist.max(1.0));
            }
            _ => {}
        }
    }

    settings.step(time.delta_secs());

    if let Ok(mut transform) = camera_query.single_mut() {
        transform.translation = settings.eye();
        transform.look_at(settings.target, Vec3::Y);
    }
}
