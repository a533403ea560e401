//! Carview Core - Paint classification, color application and viewer session state
//!
//! This crate holds everything in Carview that does not need a renderer:
//! - Paint classification heuristics over mesh/material names
//! - Original appearance snapshots and the color applicator
//! - Color presets, the display price table and the spotlight toggle
//! - Bounding volumes, model placement and camera framing math
//! - Viewer configuration (TOML) and the per-session state machine
//!
//! The 3D engine is reached through the [`PaintableScene`] trait. [`Model`] is an
//! in-memory implementation used by tests and tooling; `carview-scene` implements
//! it on top of Bevy.

pub mod classify;
pub mod color;
pub mod config;
pub mod framing;
pub mod light;
pub mod model;
pub mod paint;
pub mod pricing;
pub mod session;

pub use classify::{ClassifierPass, PaintRules, SlotName};
pub use color::{ColorPreset, Rgb};
pub use config::{ConfigError, VariantConfig, ViewerConfig};
pub use framing::{Bounds, CameraFraming, FramingMode, Placement};
pub use light::Spotlight;
pub use model::{MaterialBinding, MaterialId, Model, NodeId, SurfaceMaterial, TextureRef};
pub use paint::{MaterialLogEntry, PaintState, PaintableScene, PartSurvey, SlotAppearance, SlotSurvey};
pub use pricing::{format_price, PriceTable};
pub use session::{LoadError, LoadTicket, ModelPhase, SessionError, ViewerSession};
