//! Name-based paint classification
//!
//! Artists name body panels inconsistently, so paintability is decided by two
//! tiers of substring rules over lower-cased mesh and material names:
//! - the primary pass includes a slot when either name contains a paint keyword
//! - the fallback pass, used only when the primary pass found nothing anywhere in
//!   the model, includes every colored slot whose names avoid the exclusion list
//!
//! Both tiers are plain functions over [`SlotName`] tuples so they can be tested
//! without a scene graph.

use serde::{Deserialize, Serialize};

/// Keywords that mark a mesh or material as body paint
pub const PAINT_KEYWORDS: [&str; 8] = [
    "body", "paint", "car", "panel", "painted", "outer", "base", "coat",
];

/// Keywords that rule a slot out during the fallback pass
pub const EXCLUDE_KEYWORDS: [&str; 13] = [
    "glass",
    "window",
    "windshield",
    "tyre",
    "tire",
    "wheel",
    "rim",
    "lamp",
    "head",
    "light",
    "mirror",
    "chrome",
    "metal",
];

/// The names and color capability of one material slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotName<'a> {
    pub mesh_name: &'a str,
    pub material_name: &'a str,
    /// Whether the slot's material exposes a mutable base color
    pub has_color: bool,
}

impl<'a> SlotName<'a> {
    pub fn new(mesh_name: &'a str, material_name: &'a str, has_color: bool) -> Self {
        Self {
            mesh_name,
            material_name,
            has_color,
        }
    }
}

/// Which pass produced the final classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierPass {
    Primary,
    Fallback,
    /// Neither pass matched a single slot
    Unmatched,
}

/// Result of classifying a flat list of slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// One flag per input slot, in input order
    pub paintable: Vec<bool>,
    pub pass: ClassifierPass,
}

impl Classified {
    pub fn matched(&self) -> usize {
        self.paintable.iter().filter(|p| **p).count()
    }
}

/// Keyword sets driving the classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaintRules {
    /// Substrings that make a slot paintable in the primary pass
    #[serde(default = "default_primary_keywords")]
    pub primary_keywords: Vec<String>,
    /// Also match primary keywords against the mesh name, not just the material
    #[serde(default = "default_true")]
    pub match_mesh_names: bool,
    /// Run the exclusion-based fallback when the primary pass finds nothing
    #[serde(default = "default_true")]
    pub fallback: bool,
    #[serde(default = "default_exclusion_keywords")]
    pub exclusion_keywords: Vec<String>,
}

fn default_primary_keywords() -> Vec<String> {
    PAINT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_exclusion_keywords() -> Vec<String> {
    EXCLUDE_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Default for PaintRules {
    fn default() -> Self {
        Self {
            primary_keywords: default_primary_keywords(),
            match_mesh_names: true,
            fallback: true,
            exclusion_keywords: default_exclusion_keywords(),
        }
    }
}

impl PaintRules {
    /// Material-name-only rule without fallback ("body" or "paint")
    pub fn material_only(keywords: &[&str]) -> Self {
        Self {
            primary_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            match_mesh_names: false,
            fallback: false,
            exclusion_keywords: default_exclusion_keywords(),
        }
    }

    /// Primary pass rule for a single slot
    pub fn primary_match(&self, slot: SlotName<'_>) -> bool {
        if !slot.has_color {
            return false;
        }
        let material = slot.material_name.to_lowercase();
        let mesh = slot.mesh_name.to_lowercase();
        self.primary_keywords.iter().any(|kw| {
            let kw = kw.to_lowercase();
            material.contains(&kw) || (self.match_mesh_names && mesh.contains(&kw))
        })
    }

    /// Fallback pass rule for a single slot
    ///
    /// Matches against the concatenation `mesh + material`, so a keyword split
    /// across the two names still excludes the slot.
    pub fn fallback_match(&self, slot: SlotName<'_>) -> bool {
        if !slot.has_color {
            return false;
        }
        let combined = format!("{}{}", slot.mesh_name, slot.material_name).to_lowercase();
        !self
            .exclusion_keywords
            .iter()
            .any(|kw| combined.contains(&kw.to_lowercase()))
    }

    /// Classify every slot of a model at once
    ///
    /// The fallback is triggered by a zero count over the whole input, not per
    /// part.
    pub fn classify(&self, slots: &[SlotName<'_>]) -> Classified {
        let paintable: Vec<bool> = slots.iter().map(|s| self.primary_match(*s)).collect();
        if paintable.iter().any(|p| *p) {
            return Classified {
                paintable,
                pass: ClassifierPass::Primary,
            };
        }

        if self.fallback {
            let paintable: Vec<bool> = slots.iter().map(|s| self.fallback_match(*s)).collect();
            if paintable.iter().any(|p| *p) {
                return Classified {
                    paintable,
                    pass: ClassifierPass::Fallback,
                };
            }
        }

        Classified {
            paintable: vec![false; slots.len()],
            pass: ClassifierPass::Unmatched,
        }
    }
}

/// Primary rule with the default keyword set
pub fn primary_match(mesh_name: &str, material_name: &str, has_color: bool) -> bool {
    PaintRules::default().primary_match(SlotName::new(mesh_name, material_name, has_color))
}

/// Fallback rule with the default exclusion set
pub fn fallback_match(mesh_name: &str, material_name: &str, has_color: bool) -> bool {
    PaintRules::default().fallback_match(SlotName::new(mesh_name, material_name, has_color))
}
