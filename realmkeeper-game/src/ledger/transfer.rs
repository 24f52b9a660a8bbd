//! Pending gold transfers between factions.
use serde::{Deserialize, Serialize};

use crate::faction::{FactionId, TransferId};

/// Gold already debited from the sender, waiting for the recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldTransfer {
    pub id: TransferId,
    pub from: FactionId,
    pub to: FactionId,
    pub amount: i64,
    #[serde(default)]
    pub claimed: bool,
    /// Turn the transfer was sent on.
    pub turn: u32,
    #[serde(default)]
    pub note: Option<String>,
}

impl GoldTransfer {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        !self.claimed
    }
}
