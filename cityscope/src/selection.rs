//! Selected-entity state.
//!
//! At most one entity is selected at a time. Selection follows identity,
//! not payload: a refresh that keeps the selected identity in view refreshes
//! the stored payload, while a refresh or filter change that drops it
//! clears the selection so no dependent action can target a ghost.

use crate::entity::GeoEntity;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selection {
    #[default]
    Empty,
    Selected(GeoEntity),
}

/// Tracks which entity, if any, the user currently has selected.
#[derive(Debug, Default)]
pub struct SelectionController {
    current: Selection,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a marker click. Returns true when the selected identity
    /// changed, including the first selection.
    pub fn click(&mut self, entity: GeoEntity) -> bool {
        let changed = match self.selected() {
            Some(current) => current.key() != entity.key(),
            None => true,
        };
        self.current = Selection::Selected(entity);
        changed
    }

    /// Clears the selection. Returns true when something was selected.
    pub fn deselect(&mut self) -> bool {
        match self.current {
            Selection::Empty => false,
            Selection::Selected(_) => {
                self.current = Selection::Empty;
                true
            }
        }
    }

    pub fn selected(&self) -> Option<&GeoEntity> {
        match &self.current {
            Selection::Empty => None,
            Selection::Selected(entity) => Some(entity),
        }
    }

    /// Reconciles the selection against the current filtered view.
    ///
    /// If the selected identity is still in view, the stored payload is
    /// refreshed from it. If it vanished, the selection is cleared and
    /// true is returned.
    pub fn retain_present(&mut self, view: &[GeoEntity]) -> bool {
        let Some(current) = self.selected() else {
            return false;
        };
        let key = current.key();

        match view.iter().find(|entity| entity.key() == key) {
            Some(fresh) => {
                self.current = Selection::Selected(fresh.clone());
                false
            }
            None => {
                debug!(key = %key, "Cleared selection of entity no longer in view");
                self.current = Selection::Empty;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SafetyLevel;
    use crate::geo::LatLng;

    fn restaurant(name: &str, price: &str) -> GeoEntity {
        GeoEntity::Restaurant {
            position: LatLng::new(37.7749, -122.4194).unwrap(),
            name: name.to_string(),
            price: price.to_string(),
        }
    }

    fn safety_zone() -> GeoEntity {
        GeoEntity::Safety {
            position: LatLng::new(37.7831, -122.4039).unwrap(),
            level: SafetyLevel::High,
        }
    }

    #[test]
    fn test_first_click_selects() {
        let mut selection = SelectionController::new();

        assert!(selection.click(restaurant("Taco Town", "$")));
        assert_eq!(selection.selected(), Some(&restaurant("Taco Town", "$")));
    }

    #[test]
    fn test_click_same_identity_is_not_a_change() {
        let mut selection = SelectionController::new();
        selection.click(restaurant("Taco Town", "$"));

        // Same identity, fresher payload
        assert!(!selection.click(restaurant("Taco Town", "$$")));
        assert_eq!(selection.selected(), Some(&restaurant("Taco Town", "$$")));
    }

    #[test]
    fn test_click_different_identity_changes() {
        let mut selection = SelectionController::new();
        selection.click(restaurant("Taco Town", "$"));

        assert!(selection.click(safety_zone()));
        assert_eq!(selection.selected(), Some(&safety_zone()));
    }

    #[test]
    fn test_deselect() {
        let mut selection = SelectionController::new();
        assert!(!selection.deselect());

        selection.click(safety_zone());
        assert!(selection.deselect());
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn test_retain_present_keeps_and_refreshes() {
        let mut selection = SelectionController::new();
        selection.click(restaurant("Taco Town", "$"));

        let view = vec![safety_zone(), restaurant("Taco Town", "$$")];
        assert!(!selection.retain_present(&view));
        assert_eq!(selection.selected(), Some(&restaurant("Taco Town", "$$")));
    }

    #[test]
    fn test_retain_present_clears_vanished_selection() {
        let mut selection = SelectionController::new();
        selection.click(restaurant("Taco Town", "$"));

        let view = vec![safety_zone()];
        assert!(selection.retain_present(&view));
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn test_retain_present_with_empty_selection_is_noop() {
        let mut selection = SelectionController::new();
        assert!(!selection.retain_present(&[safety_zone()]));
    }
}
