//! Player save data.

use serde::{Deserialize, Serialize};

/// Default record key a [`PlayerRecord`] is saved under.
pub const PLAYER_RECORD_KEY: &str = "PlayerData";

/// A player's progress, saved as one structured value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub level: i32,
    pub xp: i32,
    pub gold: i32,
    pub items: Vec<ItemRecord>,
}

/// An inventory entry owned by a [`PlayerRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub name: String,
    pub count: i32,
    pub value: i32,
    pub icon: String,
}
