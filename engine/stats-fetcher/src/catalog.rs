//! Published titles shown on the site

use crate::models::{GameMedia, UniverseId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A published game as configured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogGame {
    /// Universe id used for stats and media lookups
    pub master_id: UniverseId,

    /// Place id from the game's URL
    pub place_id: u64,

    pub title: String,
}

/// A catalogue entry with its current image URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub game: CatalogGame,
    pub thumbnail_url: String,
    pub icon_url: String,
}

impl CatalogGame {
    fn new(master_id: UniverseId, place_id: u64, title: &str) -> Self {
        Self { master_id, place_id, title: title.to_string() }
    }

    /// The studio's published titles
    pub fn published() -> Vec<Self> {
        vec![
            Self::new(5099494745, 14796733016, "Candy Land Obby"),
            Self::new(8555609933, 137821301447536, "Hide n Slash"),
            Self::new(7822380363, 89038890746934, "Slackers Company"),
            Self::new(5305947005, 15381090708, "Dream Life RP"),
            Self::new(6729783553, 130733446787074, "Destroy and Drive Spaceships"),
            Self::new(4612090657, 13225153258, "Sink Ships and Boats"),
            Self::new(4612092255, 13225157345, "Realistic Sail and Sink Ships"),
            Self::new(7631072285, 113627622022152, "Wish Master"),
        ]
    }

    pub fn play_url(&self) -> String {
        format!("https://www.roblox.com/games/{}", self.place_id)
    }

    pub fn default_thumbnail_url(&self) -> String {
        format!("https://tr.rbxcdn.com/{}/768/432/Image/Png", self.place_id)
    }

    pub fn default_icon_url(&self) -> String {
        format!("https://tr.rbxcdn.com/{}/150/150/Image/Png", self.place_id)
    }

    pub fn to_entry(&self) -> CatalogEntry {
        CatalogEntry {
            game: self.clone(),
            thumbnail_url: self.default_thumbnail_url(),
            icon_url: self.default_icon_url(),
        }
    }
}

impl CatalogEntry {
    /// Overlay fetched media, keeping the current URL for any missing field
    pub fn apply_media(&mut self, media: &GameMedia) {
        if let Some(url) = &media.thumbnail_url {
            self.thumbnail_url = url.clone();
        }
        if let Some(url) = &media.icon_url {
            self.icon_url = url.clone();
        }
    }
}

/// Build entries for `games` with any fetched media applied
pub fn with_media(games: &[CatalogGame], media: &HashMap<UniverseId, GameMedia>) -> Vec<CatalogEntry> {
    games
        .iter()
        .map(|game| {
            let mut entry = game.to_entry();
            if let Some(found) = media.get(&game.master_id) {
                entry.apply_media(found);
            }
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_ids_unique() {
        let games = CatalogGame::published();
        let mut ids: Vec<_> = games.iter().map(|g| g.master_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), games.len());
    }

    #[test]
    fn test_partial_media_keeps_defaults() {
        let games = CatalogGame::published();
        let first = &games[0];

        let mut media = HashMap::new();
        media.insert(
            first.master_id,
            GameMedia {
                master_id: first.master_id,
                thumbnail_url: Some("https://cdn/fetched.png".to_string()),
                icon_url: None,
            },
        );

        let entries = with_media(&games, &media);
        assert_eq!(entries[0].thumbnail_url, "https://cdn/fetched.png");
        assert_eq!(entries[0].icon_url, first.default_icon_url());
        assert_eq!(entries[1].thumbnail_url, games[1].default_thumbnail_url());
    }

    #[test]
    fn test_urls_from_place_id() {
        let game = CatalogGame::new(1, 14796733016, "x");
        assert_eq!(game.play_url(), "https://www.roblox.com/games/14796733016");
        assert_eq!(game.default_icon_url(), "https://tr.rbxcdn.com/14796733016/150/150/Image/Png");
    }
}
