//! Board game catalog: seed data, search, and admin edits.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{models::Game, selection::SelectionSet};

/// Games the club starts each session with.
pub static SEED_GAMES: Lazy<Vec<Game>> = Lazy::new(|| {
    vec![
        seed(
            "BG-001",
            "Catan (คาทาน)",
            "catan",
            "Strategy",
            "เกมสร้างอาณานิคม ยอดนิยมระดับโลก",
        ),
        seed(
            "BG-002",
            "Splendor (สเพลนเดอร์)",
            "splendor",
            "Card Game",
            "การสะสมอัญมณีเพื่อสร้างอาณาจักร",
        ),
        seed(
            "BG-003",
            "Dixit (ดิกซิท)",
            "dixit",
            "Party",
            "เกมทายภาพจากจินตนาการและการเล่าเรื่อง",
        ),
        seed(
            "BG-004",
            "Exploding Kittens",
            "kittens",
            "Party",
            "เกมไพ่แมวระเบิดสุดฮาและตื่นเต้น",
        ),
        seed(
            "BG-005",
            "Ticket to Ride",
            "train",
            "Strategy",
            "สร้างเส้นทางรถไฟเชื่อมต่อเมืองต่างๆ",
        ),
        seed(
            "BG-006",
            "Avalon",
            "avalon",
            "Social Deduction",
            "เกมค้นหาผู้ทรยศในยุคอัศวินโต๊ะกลม",
        ),
    ]
});

fn seed(id: &str, name: &str, slug: &str, category: &str, description: &str) -> Game {
    Game {
        id: id.to_string(),
        name: name.to_string(),
        image: format!("https://picsum.photos/seed/{slug}/400/300"),
        category: category.to_string(),
        available: true,
        description: description.to_string(),
    }
}

/// Errors raised by admin catalog edits.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A required draft field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// No game with the given id exists.
    #[error("game {0} not found")]
    NotFound(String),
}

/// Field values for adding or editing a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDraft {
    /// Display name (required).
    pub name: String,
    /// Category label (required).
    pub category: String,
    /// Image URL or path.
    pub image: String,
    /// Free-text description.
    pub description: String,
    /// Availability flag.
    pub available: bool,
}

impl Default for GameDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: String::new(),
            image: String::new(),
            description: String::new(),
            available: true,
        }
    }
}

impl From<&Game> for GameDraft {
    fn from(game: &Game) -> Self {
        Self {
            name: game.name.clone(),
            category: game.category.clone(),
            image: game.image.clone(),
            description: game.description.clone(),
            available: game.available,
        }
    }
}

impl GameDraft {
    fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::MissingField("name"));
        }
        if self.category.trim().is_empty() {
            return Err(CatalogError::MissingField("category"));
        }
        Ok(())
    }

    fn into_game(self, id: String) -> Game {
        Game {
            id,
            name: self.name.trim().to_string(),
            image: self.image.trim().to_string(),
            category: self.category.trim().to_string(),
            available: self.available,
            description: self.description.trim().to_string(),
        }
    }
}

/// Cloneable handle to the session's game list.
#[derive(Debug, Clone)]
pub struct Catalog {
    inner: Arc<RwLock<Vec<Game>>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Catalog {
    /// Build a catalog from an explicit list.
    pub fn new(games: Vec<Game>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(games)),
        }
    }

    /// Catalog populated with [`SEED_GAMES`].
    pub fn seeded() -> Self {
        Self::new(SEED_GAMES.clone())
    }

    /// Snapshot of every game in catalog order.
    pub fn games(&self) -> Vec<Game> {
        self.inner.read().clone()
    }

    /// Number of games.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the catalog has no games.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Look up a game by id.
    pub fn get(&self, id: &str) -> Option<Game> {
        self.inner.read().iter().find(|game| game.id == id).cloned()
    }

    /// Selected games in catalog order.
    pub fn selected(&self, selection: &SelectionSet) -> Vec<Game> {
        self.inner
            .read()
            .iter()
            .filter(|game| selection.contains(&game.id))
            .cloned()
            .collect()
    }

    /// Names of the selected games in catalog order, joined with `", "`.
    pub fn names_for(&self, selection: &SelectionSet) -> String {
        self.selected(selection)
            .iter()
            .map(|game| game.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Case-insensitive substring search, optionally limited to available games.
    pub fn matching(&self, query: &str, available_only: bool) -> Vec<Game> {
        let needle = query.trim().to_lowercase();
        self.inner
            .read()
            .iter()
            .filter(|game| !available_only || game.available)
            .filter(|game| needle.is_empty() || game_matches(game, &needle))
            .cloned()
            .collect()
    }

    /// Add a new game and return it with its generated id.
    pub fn add(&self, draft: GameDraft) -> Result<Game, CatalogError> {
        draft.validate()?;
        let mut games = self.inner.write();
        let id = next_game_id(games.len());
        let game = draft.into_game(id);
        info!(game_id = %game.id, name = %game.name, "Game added");
        games.push(game.clone());
        Ok(game)
    }

    /// Replace the fields of an existing game.
    pub fn update(&self, id: &str, draft: GameDraft) -> Result<Game, CatalogError> {
        draft.validate()?;
        let mut games = self.inner.write();
        let slot = games
            .iter_mut()
            .find(|game| game.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        *slot = draft.into_game(id.to_string());
        info!(game_id = %id, "Game updated");
        Ok(slot.clone())
    }

    /// Delete a game, returning it.
    pub fn remove(&self, id: &str) -> Result<Game, CatalogError> {
        let mut games = self.inner.write();
        let index = games
            .iter()
            .position(|game| game.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        info!(game_id = %id, "Game removed");
        Ok(games.remove(index))
    }
}

fn game_matches(game: &Game, needle: &str) -> bool {
    [
        game.id.as_str(),
        game.name.as_str(),
        game.category.as_str(),
        game.description.as_str(),
    ]
    .iter()
    .any(|value| value.to_lowercase().contains(needle))
}

// Index prefix keeps ids readable; the random suffix keeps them unique after deletes.
fn next_game_id(current_len: usize) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("BG-{:03}-{}", current_len + 1, &suffix[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, category: &str) -> GameDraft {
        GameDraft {
            name: name.to_string(),
            category: category.to_string(),
            ..GameDraft::default()
        }
    }

    #[test]
    fn seeded_catalog_has_six_available_games() {
        let catalog = Catalog::seeded();
        assert_eq!(catalog.len(), 6);
        assert!(catalog.games().iter().all(|game| game.available));
        assert_eq!(catalog.get("BG-003").unwrap().name, "Dixit (ดิกซิท)");
    }

    #[test]
    fn names_follow_catalog_order() {
        let catalog = Catalog::seeded();
        let mut selection = SelectionSet::default();
        selection.toggle("BG-003");
        selection.toggle("BG-001");
        assert_eq!(
            catalog.names_for(&selection),
            "Catan (คาทาน), Dixit (ดิกซิท)"
        );
    }

    #[test]
    fn matching_searches_fields_and_availability() {
        let catalog = Catalog::seeded();
        let party = catalog.matching("PARTY", false);
        assert_eq!(party.len(), 2);

        let mut unavailable = GameDraft::from(&catalog.get("BG-004").unwrap());
        unavailable.available = false;
        catalog.update("BG-004", unavailable).unwrap();

        let available_party = catalog.matching("party", true);
        assert_eq!(available_party.len(), 1);
        assert_eq!(available_party[0].id, "BG-003");
        assert_eq!(catalog.matching("", true).len(), 5);
    }

    #[test]
    fn add_generates_padded_unique_ids() {
        let catalog = Catalog::seeded();
        let first = catalog.add(draft("Codenames", "Party")).unwrap();
        assert!(first.id.starts_with("BG-007-"));
        catalog.remove(&first.id).unwrap();
        let second = catalog.add(draft("Codenames", "Party")).unwrap();
        assert!(second.id.starts_with("BG-007-"));
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn drafts_require_name_and_category() {
        let catalog = Catalog::seeded();
        assert_eq!(
            catalog.add(draft("  ", "Party")),
            Err(CatalogError::MissingField("name"))
        );
        assert_eq!(
            catalog.add(draft("Codenames", "")),
            Err(CatalogError::MissingField("category"))
        );
        assert_eq!(catalog.len(), 6);
    }

    #[test]
    fn update_and_remove_unknown_ids_fail() {
        let catalog = Catalog::seeded();
        assert_eq!(
            catalog.update("BG-999", draft("X", "Y")),
            Err(CatalogError::NotFound("BG-999".to_string()))
        );
        assert!(catalog.remove("BG-999").is_err());
        let removed = catalog.remove("BG-006").unwrap();
        assert_eq!(removed.name, "Avalon");
        assert!(catalog.get("BG-006").is_none());
    }

    #[test]
    fn clones_share_state() {
        let catalog = Catalog::seeded();
        let handle = catalog.clone();
        handle.remove("BG-001").unwrap();
        assert_eq!(catalog.len(), 5);
    }
}
