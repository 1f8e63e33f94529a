//! Building description model for the uploaded JSON files.

use serde::{Deserialize, Serialize};

/// Top-level wrapper of a building description file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingFile {
    pub building: Option<Building>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rooms: Vec<Room>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub cube: f64,
    #[serde(default)]
    pub heating: f64,
    #[serde(default)]
    pub light: f64,
}

impl BuildingFile {
    /// Human-readable tree of the building structure, one line per node.
    pub fn outline(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let Some(building) = &self.building else {
            return lines;
        };
        lines.push(format!("Budynek: {} (id={})", building.name, building.id));
        for level in &building.levels {
            lines.push(format!("  Poziom: {} (id={})", level.name, level.id));
            for room in &level.rooms {
                lines.push(format!(
                    "    Pomieszczenie: {} (id={}, area={}, cube={}, heating={}, light={})",
                    room.name, room.id, room.area, room.cube, room.heating, room.light
                ));
            }
        }
        lines
    }

    /// Total number of rooms across all levels.
    pub fn room_count(&self) -> usize {
        self.building
            .as_ref()
            .map(|b| b.levels.iter().map(|l| l.rooms.len()).sum())
            .unwrap_or(0)
    }
}
