use thiserror::Error;

#[derive(Error, Debug)]
pub enum BattleError {
    #[error("Unknown card id: {0}")]
    UnknownCard(String),

    #[error("Invalid hand slot: {slot}")]
    InvalidHandSlot { slot: usize },

    #[error("Not enough elixir: need {cost}, have {available:.1}")]
    InsufficientElixir { cost: u8, available: f32 },

    #[error("Position ({x:.0}, {y:.0}) is outside the deploy zone")]
    OutsideSpawnZone { x: f32, y: f32 },

    #[error("Card {0} is not deployable as a unit")]
    UnplayableCategory(String),

    #[error("Battle is already finished")]
    BattleFinished,

    #[error("Invalid deck: {0}")]
    InvalidDeck(String),

    #[error("Unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("Unsupported schema version: {found}")]
    UnsupportedSchema { found: u8 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BattleError {
    /// Deploy rejections leave battle state untouched; the caller may retry.
    pub fn is_deploy_rejection(&self) -> bool {
        matches!(
            self,
            BattleError::InvalidHandSlot { .. }
                | BattleError::InsufficientElixir { .. }
                | BattleError::OutsideSpawnZone { .. }
                | BattleError::UnplayableCategory(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BattleError>;
