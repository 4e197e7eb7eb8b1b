/* Internal */

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
    EnumString,
)]
pub enum Position {
    Zuspieler,
    #[strum(to_string = "Außenangreifer", serialize = "Aussenangreifer")]
    #[serde(rename = "Außenangreifer", alias = "Aussenangreifer")]
    Aussenangreifer,
    Mittelblocker,
    Diagonalangreifer,
    Libero,
    #[default]
    Universal,
}

/// Read-only view of a player account; accounts are managed elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub position: Position,
    pub attendance_percentage: f64,
}
