//! Scripted opponent agent.
//!
//! The agent polls the public battle snapshot on a throttled cadence,
//! classifies the situation as defending or attacking, scores the
//! affordable cards under the matching heuristic and deploys through the
//! same `play_card` entry point a human uses. It reads nothing a human
//! player's screen would not show: its own hand and elixir, plus the
//! visible units and towers of both sides.

use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::{AttackMode, CardCatalog, CardDefinition, TargetFilter, UnitStats};
use crate::error::BattleError;

use super::constants::arena;
use super::entity::Side;
use super::geometry;
use super::snapshot::{BattleSnapshot, TowerView, UnitView};
use super::tower::TowerKind;

/// Enemy units this far past the river count as an invasion to answer.
const DEFEND_TRIGGER_BUFFER: f32 = 50.0;
/// Wider scan used when picking which invader to answer.
const THREAT_SCAN_BUFFER: f32 = 100.0;
/// Defensive deploys track the threat's x, clamped off the arena edges.
const DEFENSE_X_MARGIN: f32 = 50.0;
/// Deploy positions keep this far inside the spawn band.
const BAND_MARGIN: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl FromStr for Difficulty {
    type Err = BattleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(BattleError::UnknownDifficulty(other.to_string())),
        }
    }
}

/// Immutable tuning bundle, fixed at agent construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiProfile {
    /// Seconds between actions.
    pub reaction_interval: f32,
    /// Holds its hand below this much elixir.
    pub min_elixir: f32,
    /// Scales the random jitter in offensive card scoring.
    pub aggressiveness: f32,
}

impl AiProfile {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                reaction_interval: 2.0,
                min_elixir: 6.0,
                aggressiveness: 0.3,
            },
            Difficulty::Normal => Self {
                reaction_interval: 1.0,
                min_elixir: 4.0,
                aggressiveness: 0.5,
            },
            Difficulty::Hard => Self {
                reaction_interval: 0.5,
                min_elixir: 3.0,
                aggressiveness: 0.7,
            },
        }
    }
}

/// A deploy the agent wants executed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeployOrder {
    pub slot: usize,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
pub struct OpponentAgent {
    side: Side,
    profile: AiProfile,
    last_action_at: Option<f32>,
}

impl OpponentAgent {
    pub fn new(side: Side, difficulty: Difficulty) -> Self {
        Self {
            side,
            profile: AiProfile::for_difficulty(difficulty),
            last_action_at: None,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn profile(&self) -> &AiProfile {
        &self.profile
    }

    /// Has the reaction interval elapsed since the last action?
    pub fn ready(&self, now: f32) -> bool {
        match self.last_action_at {
            None => true,
            Some(t) => now - t >= self.profile.reaction_interval,
        }
    }

    /// Called by the engine after a deploy actually went through.
    pub fn note_action(&mut self, now: f32) {
        self.last_action_at = Some(now);
    }

    /// Poll the battle and maybe produce a deploy order.
    pub fn decide<R: Rng>(
        &self,
        now: f32,
        snapshot: &BattleSnapshot,
        catalog: &CardCatalog,
        rng: &mut R,
    ) -> Option<DeployOrder> {
        if !self.ready(now) {
            return None;
        }
        let own = snapshot.side(self.side);
        let foe = snapshot.side(self.side.opponent());
        if own.elixir < self.profile.min_elixir {
            return None;
        }

        let playable: Vec<(usize, &CardDefinition)> = own
            .hand
            .iter()
            .enumerate()
            .filter_map(|(slot, id)| catalog.get(id).map(|card| (slot, card)))
            .filter(|(_, card)| f32::from(card.cost) <= own.elixir && card.unit_stats().is_some())
            .collect();
        if playable.is_empty() {
            return None;
        }

        let invaded = foe
            .units
            .iter()
            .any(|u| u.alive && past_river(self.side, u.y, DEFEND_TRIGGER_BUFFER));
        if invaded {
            self.defensive_order(&playable, foe, catalog, rng)
        } else {
            self.offensive_order(&playable, foe, rng)
        }
    }

    /// Counter the most dangerous invader near our half.
    fn defensive_order<R: Rng>(
        &self,
        playable: &[(usize, &CardDefinition)],
        foe: &super::snapshot::SideSnapshot,
        catalog: &CardCatalog,
        rng: &mut R,
    ) -> Option<DeployOrder> {
        let threat = foe
            .units
            .iter()
            .filter(|u| u.alive && past_river(self.side, u.y, THREAT_SCAN_BUFFER))
            .max_by(|a, b| {
                threat_weight(catalog, a)
                    .partial_cmp(&threat_weight(catalog, b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        let Some(threat) = threat else {
            // Invasion already cleared; nothing worth answering.
            return None;
        };
        let threat_attack = threat_attack_mode(catalog, threat);

        let (slot, _) = playable
            .iter()
            .map(|(slot, card)| {
                let stats = card.unit_stats().expect("playable cards are units");
                (*slot, defensive_score(stats, card.cost, threat_attack))
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

        let x = threat.x.clamp(DEFENSE_X_MARGIN, arena::WIDTH - DEFENSE_X_MARGIN);
        Some(DeployOrder {
            slot,
            x,
            y: self.band_y(rng),
        })
    }

    /// Push the weaker lane.
    fn offensive_order<R: Rng>(
        &self,
        playable: &[(usize, &CardDefinition)],
        foe: &super::snapshot::SideSnapshot,
        rng: &mut R,
    ) -> Option<DeployOrder> {
        let lane = weaker_lane(&foe.towers, rng);
        let (slot, _) = playable
            .iter()
            .map(|(slot, card)| {
                let stats = card.unit_stats().expect("playable cards are units");
                let jitter = rng.gen_range(0.0..30.0) * self.profile.aggressiveness;
                (*slot, offensive_score(stats, card.cost) + jitter)
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

        let x = geometry::lane_center(lane) + rng.gen_range(-30.0..30.0);
        Some(DeployOrder {
            slot,
            x,
            y: self.band_y(rng),
        })
    }

    /// Random y inside this side's deploy band.
    fn band_y<R: Rng>(&self, rng: &mut R) -> f32 {
        let (min_y, max_y) = if self.side.is_home() {
            (arena::HOME_SPAWN_MIN_Y, arena::HOME_SPAWN_MAX_Y)
        } else {
            (arena::AWAY_SPAWN_MIN_Y, arena::AWAY_SPAWN_MAX_Y)
        };
        rng.gen_range(min_y + BAND_MARGIN..max_y - BAND_MARGIN)
    }
}

/// Has an enemy at `y` pushed past the river toward `side`'s territory?
fn past_river(side: Side, y: f32, buffer: f32) -> bool {
    if side.is_home() {
        y > arena::RIVER_Y - buffer
    } else {
        y < arena::RIVER_Y + buffer
    }
}

/// Danger estimate: remaining health times hitting power.
fn threat_weight(catalog: &CardCatalog, unit: &UnitView) -> f32 {
    let damage = catalog
        .get(&unit.card)
        .and_then(|c| c.unit_stats().map(|s| s.damage))
        .unwrap_or(0.0);
    unit.hp * damage
}

fn threat_attack_mode(catalog: &CardCatalog, unit: &UnitView) -> AttackMode {
    catalog
        .get(&unit.card)
        .and_then(|c| c.unit_stats().map(|s| s.attack))
        .unwrap_or(AttackMode::Melee)
}

/// Defensive heuristic: ranged answers to melee threats, splash for
/// swarms, damage throughput, and a bias toward cheap answers.
fn defensive_score(stats: &UnitStats, cost: u8, threat_attack: AttackMode) -> f32 {
    let mut score = 0.0;
    if threat_attack == AttackMode::Melee && stats.attack == AttackMode::Ranged {
        score += 20.0;
    }
    if stats.splash.is_some() {
        score += 15.0;
    }
    score += stats.damage * stats.hits_per_sec / 50.0;
    score += (10.0 - f32::from(cost)) * 5.0;
    score
}

/// Offensive heuristic: tanks and tower-hunters, weighted by stat value
/// per elixir.
fn offensive_score(stats: &UnitStats, cost: u8) -> f32 {
    let mut score = 0.0;
    if stats.hp > 500.0 {
        score += 20.0;
    }
    if stats.target_filter == TargetFilter::Structures {
        score += 25.0;
    }
    score += (stats.hp + stats.damage * 10.0) / f32::from(cost).max(1.0) / 10.0;
    score
}

/// Lane to push: the one whose guard tower has less health. A lane that
/// is already open sends the push through the other one; a double breach
/// picks at random.
fn weaker_lane<R: Rng>(towers: &[TowerView], rng: &mut R) -> usize {
    let guard = |left: bool| {
        towers
            .iter()
            .find(|t| t.kind == TowerKind::Guard && (t.x < arena::WIDTH / 2.0) == left)
    };
    match (guard(true), guard(false)) {
        (Some(left), Some(right)) => {
            if !left.alive && !right.alive {
                usize::from(rng.gen::<bool>())
            } else if !left.alive {
                1
            } else if !right.alive {
                0
            } else if left.hp < right.hp {
                0
            } else {
                1
            }
        }
        _ => usize::from(rng.gen::<bool>()),
    }
}
