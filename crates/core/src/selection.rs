//! Set of games marked for borrowing.

/// Game ids the user has ticked in the catalog.
///
/// Membership is all that matters; ids are kept in toggle order only so
/// iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<String>,
}

impl SelectionSet {
    /// Add `id` when absent, remove it when present. Returns the new membership.
    pub fn toggle(&mut self, id: &str) -> bool {
        if let Some(pos) = self.ids.iter().position(|existing| existing == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id.to_string());
            true
        }
    }

    /// Whether `id` is selected.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    /// Remove `id` if present.
    pub fn remove(&mut self, id: &str) {
        self.ids.retain(|existing| existing != id);
    }

    /// Number of selected games.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drop every selection.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Selected ids.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_membership() {
        let mut selection = SelectionSet::default();
        selection.toggle("BG-002");
        let before = selection.clone();

        assert!(selection.toggle("BG-005"));
        assert!(!selection.toggle("BG-005"));
        assert_eq!(selection, before);

        assert!(!selection.toggle("BG-002"));
        assert!(selection.is_empty());
    }

    #[test]
    fn tracks_membership_and_count() {
        let mut selection = SelectionSet::default();
        selection.toggle("BG-001");
        selection.toggle("BG-003");
        assert_eq!(selection.len(), 2);
        assert!(selection.contains("BG-001"));
        assert!(!selection.contains("BG-002"));
        assert_eq!(selection.iter().collect::<Vec<_>>(), ["BG-001", "BG-003"]);

        selection.remove("BG-001");
        assert_eq!(selection.len(), 1);
        selection.clear();
        assert!(selection.is_empty());
    }
}
