//! Viewer session: one loaded model, its paint state, selection and light
//!
//! The session owns all mutable viewer state and enforces the lifecycle
//! `begin_load -> complete_load | fail_load -> teardown`. Color operations are
//! no-ops until a model is ready.

use std::fmt;
use std::hash::Hash;
use thiserror::Error;

use crate::classify::{ClassifierPass, PaintRules};
use crate::color::{ColorPreset, Rgb};
use crate::config::VariantConfig;
use crate::light::Spotlight;
use crate::paint::{PaintState, PaintableScene};
use crate::pricing::PriceTable;

/// Identifies one load request; completions carrying an older ticket are stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelPhase {
    #[default]
    Empty,
    Loading,
    Ready,
    Failed,
}

/// A model asset that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub path: String,
    pub reason: String,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load '{}': {}", self.path, self.reason)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Load generation {ticket} superseded by generation {current}")]
    StaleLoad { ticket: u64, current: u64 },
}

pub struct ViewerSession<P, T> {
    rules: PaintRules,
    flat_paint: bool,
    prices: PriceTable,
    show_price: bool,
    generation: u64,
    phase: ModelPhase,
    paint: Option<PaintState<P, T>>,
    selection: ColorPreset,
    light: Spotlight,
}

impl<P, T> ViewerSession<P, T>
where
    P: Copy + Eq + Hash + fmt::Debug,
    T: Clone + PartialEq + fmt::Debug,
{
    pub fn new(variant: &VariantConfig) -> Self {
        Self {
            rules: variant.rules.clone(),
            flat_paint: variant.flat_paint,
            prices: variant.prices.clone(),
            show_price: variant.show_price,
            generation: 0,
            phase: ModelPhase::Empty,
            paint: None,
            selection: ColorPreset::Original,
            light: Spotlight::default(),
        }
    }

    /// Start loading a model, discarding any previous one
    pub fn begin_load(&mut self) -> LoadTicket {
        self.clear_model();
        self.generation += 1;
        self.phase = ModelPhase::Loading;
        tracing::debug!("Model load generation {} started", self.generation);
        LoadTicket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.generation && self.phase == ModelPhase::Loading
    }

    fn check_ticket(&self, ticket: LoadTicket) -> Result<(), SessionError> {
        if self.is_current(ticket) {
            Ok(())
        } else {
            Err(SessionError::StaleLoad {
                ticket: ticket.generation,
                current: self.generation,
            })
        }
    }

    /// Classify and snapshot a freshly loaded model
    pub fn complete_load<S>(&mut self, ticket: LoadTicket, scene: &S) -> Result<ClassifierPass, SessionError>
    where
        S: PaintableScene<PartId = P, Texture = T>,
    {
        if let Err(e) = self.check_ticket(ticket) {
            tracing::debug!("Ignoring model load: {}", e);
            return Err(e);
        }
        let state = PaintState::capture(scene, &self.rules);
        let pass = state.pass();
        self.paint = Some(state);
        self.phase = ModelPhase::Ready;
        Ok(pass)
    }

    /// Record a failed load; the viewer stays usable with an empty scene
    pub fn fail_load(&mut self, ticket: LoadTicket, error: &LoadError) -> Result<(), SessionError> {
        if let Err(e) = self.check_ticket(ticket) {
            tracing::debug!("Ignoring load failure: {}", e);
            return Err(e);
        }
        tracing::error!("GLTF load error: {}", error);
        self.phase = ModelPhase::Failed;
        Ok(())
    }

    /// Drop the current model and invalidate any load in flight
    pub fn teardown(&mut self) {
        self.clear_model();
        self.generation += 1;
        self.phase = ModelPhase::Empty;
    }

    /// Tear down and adopt another variant's paint rules and prices
    ///
    /// The load generation keeps counting so tickets issued for the previous
    /// variant stay stale. The light keeps its state.
    pub fn switch_variant(&mut self, variant: &VariantConfig) {
        self.teardown();
        self.rules = variant.rules.clone();
        self.flat_paint = variant.flat_paint;
        self.prices = variant.prices.clone();
        self.show_price = variant.show_price;
        tracing::info!("Switched to variant '{}'", variant.name);
    }

    fn clear_model(&mut self) {
        self.paint = None;
        self.selection = ColorPreset::Original;
    }

    pub fn phase(&self) -> ModelPhase {
        self.phase
    }

    pub fn paint_state(&self) -> Option<&PaintState<P, T>> {
        self.paint.as_ref()
    }

    pub fn selection(&self) -> ColorPreset {
        self.selection
    }

    pub fn light(&self) -> Spotlight {
        self.light
    }

    pub fn show_price(&self) -> bool {
        self.show_price
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Paint all classified slots. Returns the number of slots written.
    pub fn apply_color<S>(&mut self, scene: &mut S, color: Rgb) -> usize
    where
        S: PaintableScene<PartId = P, Texture = T>,
    {
        match &self.paint {
            Some(state) => state.apply_color(scene, color, self.flat_paint),
            None => {
                tracing::debug!("No model loaded, ignoring color change");
                0
            }
        }
    }

    /// Restore the load-time appearance. Returns the number of slots restored.
    pub fn reset_color<S>(&mut self, scene: &mut S) -> usize
    where
        S: PaintableScene<PartId = P, Texture = T>,
    {
        match &self.paint {
            Some(state) => state.reset_color(scene, self.flat_paint),
            None => 0,
        }
    }

    /// Switch to a color preset and return the price to display
    ///
    /// Without a loaded model the selection is left alone and the current
    /// price is returned.
    pub fn select_preset<S>(&mut self, scene: &mut S, preset: ColorPreset) -> u32
    where
        S: PaintableScene<PartId = P, Texture = T>,
    {
        if self.paint.is_none() {
            tracing::debug!("No model loaded, ignoring preset '{}'", preset.key());
            return self.prices.price(self.selection);
        }
        match preset.color() {
            Some(color) => {
                self.apply_color(scene, color);
            }
            None => {
                self.reset_color(scene);
            }
        }
        self.selection = preset;
        self.prices.price(preset)
    }

    /// Same as [`Self::select_preset`] for a preset key coming from the UI
    ///
    /// Unknown keys reset to the original paint.
    pub fn select_preset_key<S>(&mut self, scene: &mut S, key: &str) -> u32
    where
        S: PaintableScene<PartId = P, Texture = T>,
    {
        let preset = ColorPreset::from_key(key).unwrap_or_else(|| {
            tracing::warn!("Unknown color preset '{}', resetting", key);
            ColorPreset::Original
        });
        self.select_preset(scene, preset)
    }

    /// Toggle the car light and return its new visibility
    pub fn toggle_light(&mut self) -> bool {
        self.light.toggle()
    }

    /// Price for the current selection, `None` when prices are hidden
    pub fn displayed_price(&self) -> Option<u32> {
        self.show_price.then(|| self.prices.price(self.selection))
    }
}
