//! Static game data: the card catalog.

pub mod cards;
pub mod embedded;

pub use cards::{
    AttackMode, BuildingStats, CardCatalog, CardCategory, CardDefinition, CardId, CardStats,
    ChargeSpec, Rarity, SpellStats, SplashSpec, TargetDomain, TargetFilter, UnitStats,
};
pub use embedded::{catalog, CARDS_JSON};
