//! Shared resources and messages for the car viewer

use bevy::prelude::*;
use carview_core::{ColorPreset, VariantConfig, ViewerConfig, ViewerSession};

/// All configured variants
#[derive(Debug, Clone, Resource)]
pub struct ViewerSettings(pub ViewerConfig);

/// The variant currently on screen
#[derive(Debug, Clone, Resource)]
pub struct ActiveVariant(pub VariantConfig);

/// Viewer session keyed by glTF node entities, snapshotting base color textures
pub type CarViewerSession = ViewerSession<Entity, Handle<Image>>;

/// The one viewer session of the app
#[derive(Resource)]
pub struct CarSession(pub CarViewerSession);

impl CarSession {
    pub fn new(variant: &VariantConfig) -> Self {
        Self(ViewerSession::new(variant))
    }
}

/// Request to paint the car with a preset; `Original` restores the load-time paint
#[derive(Debug, Clone, Copy, Message)]
pub struct PaintCommand(pub ColorPreset);

/// Request to flip the car light
#[derive(Debug, Clone, Copy, Default, Message)]
pub struct ToggleLight;

/// Request to tear down the current car and show another variant
#[derive(Debug, Clone, Message)]
pub struct SwitchVariant(pub String);

