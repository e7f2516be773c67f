//! Card definitions and the catalog they live in.
//!
//! A card is immutable static data: identity, cost and a stats bundle
//! whose shape is fixed per category. The engine copies stats onto
//! spawned entities at deploy time and never looks back at the card.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, Result};

/// Catalog key for a card.
pub type CardId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardCategory {
    Unit,
    Spell,
    Building,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackMode {
    Melee,
    Ranged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetDomain {
    Ground,
    Air,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFilter {
    /// Units first (within aggro range), towers as fallback.
    Any,
    /// Towers only, ignoring enemy units entirely.
    Structures,
}

/// Area damage rider: victims near the primary target take reduced damage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplashSpec {
    pub radius: f32,
}

/// Charge rider: boosted speed while closing in, multiplied damage on the
/// first hit against the charged target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeSpec {
    pub trigger_distance: f32,
    pub speed: f32,
    pub damage_multiplier: f32,
}

fn default_count() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    pub hp: f32,
    pub damage: f32,
    pub hits_per_sec: f32,
    pub move_speed: f32,
    pub range: f32,
    pub radius: f32,
    pub attack: AttackMode,
    pub target_domain: TargetDomain,
    pub target_filter: TargetFilter,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub spawn_spread: f32,
    #[serde(default)]
    pub splash: Option<SplashSpec>,
    #[serde(default)]
    pub charge: Option<ChargeSpec>,
    /// Exempt from bridge routing: may cross the river band anywhere.
    #[serde(default)]
    pub crosses_river: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellStats {
    pub damage: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingStats {
    pub hp: f32,
    pub damage: f32,
    pub hits_per_sec: f32,
    pub range: f32,
    pub radius: f32,
    /// Seconds the building stands before expiring on its own.
    pub lifetime: f32,
}

/// Stats bundle, fixed shape per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardStats {
    Unit(UnitStats),
    Spell(SpellStats),
    Building(BuildingStats),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: CardId,
    pub name: String,
    pub category: CardCategory,
    pub rarity: Rarity,
    /// Elixir cost.
    pub cost: u8,
    #[serde(default)]
    pub description: String,
    pub stats: CardStats,
}

impl CardDefinition {
    pub fn unit_stats(&self) -> Option<&UnitStats> {
        match &self.stats {
            CardStats::Unit(stats) => Some(stats),
            _ => None,
        }
    }
}

/// On-disk layout of the embedded catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    cards: Vec<CardDefinition>,
    default_deck: Vec<CardId>,
}

/// Immutable card table keyed by id, loaded once at startup.
#[derive(Debug, Clone)]
pub struct CardCatalog {
    by_id: HashMap<CardId, CardDefinition>,
    order: Vec<CardId>,
    default_deck: Vec<CardId>,
}

impl CardCatalog {
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let order: Vec<CardId> = file.cards.iter().map(|c| c.id.clone()).collect();
        let by_id: HashMap<CardId, CardDefinition> =
            file.cards.into_iter().map(|c| (c.id.clone(), c)).collect();
        for id in &file.default_deck {
            if !by_id.contains_key(id) {
                return Err(BattleError::UnknownCard(id.clone()));
            }
        }
        Ok(Self {
            by_id,
            order,
            default_deck: file.default_deck,
        })
    }

    pub fn get(&self, id: &str) -> Option<&CardDefinition> {
        self.by_id.get(id)
    }

    /// All cards in catalog order.
    pub fn cards(&self) -> impl Iterator<Item = &CardDefinition> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    pub fn cards_by_rarity(&self, rarity: Rarity) -> impl Iterator<Item = &CardDefinition> {
        self.cards().filter(move |c| c.rarity == rarity)
    }

    pub fn default_deck(&self) -> &[CardId] {
        &self.default_deck
    }

    /// Average elixir cost of a deck; unknown ids count as zero.
    pub fn average_cost(&self, deck: &[CardId]) -> f32 {
        if deck.is_empty() {
            return 0.0;
        }
        let total: u32 = deck.iter().filter_map(|id| self.get(id)).map(|c| u32::from(c.cost)).sum();
        total as f32 / deck.len() as f32
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
