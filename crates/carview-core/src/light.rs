//! The toggleable car spotlight

/// Visibility of the light aimed at the car; off until the user turns it on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Spotlight {
    visible: bool,
}

impl Spotlight {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Flip visibility and return the new state
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    /// Caption for the toggle button
    pub fn button_label(&self) -> &'static str {
        if self.visible {
            "Turn Light Off"
        } else {
            "Turn Light On"
        }
    }
}
