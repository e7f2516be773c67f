//! Battle orchestration.
//!
//! [`BattleEngine`] owns the whole battlefield for one match: both sides'
//! units, towers, hands and elixir, the projectile pool, the clock and
//! the event log. A [`BattlePlan`] seeds it; `tick` advances it through a
//! fixed sub-pass order; `snapshot` exposes it; `run_to_completion`
//! drives a headless match to its [`BattleResult`].
//!
//! Tick order (one frame of simulation):
//!
//! 1. clock / overtime transition
//! 2. elixir regeneration
//! 3. opponent agents (through the public deploy entry point)
//! 4. units, home side then away side
//! 5. unit separation (collision push-apart)
//! 6. towers, home side then away side
//! 7. projectiles
//! 8. crown accounting for towers felled this tick
//! 9. prune dead units (dead towers stay as rubble)
//! 10. win-condition evaluation
//!
//! Everything runs on one thread; the frame is the unit of atomicity, so
//! any snapshot taken between ticks is self-consistent.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::data::{catalog, AttackMode, CardCatalog, CardId, TargetFilter, UnitStats};
use crate::error::{BattleError, Result};

use super::ai::{Difficulty, OpponentAgent};
use super::constants::{elixir, gameplay, timer, towers, trophies};
use super::deck::Hand;
use super::entity::{Combatant, EntityId, EntityIdAlloc, Side};
use super::events::{BattleEvent, EventRecorder, Outcome};
use super::geometry::{self, ArenaPos};
use super::projectile::{Projectile, ProjectileStep};
use super::snapshot::{BattleSnapshot, ProjectileView, SideSnapshot, TowerView, UnitView};
use super::timestep::{MAX_TICK_DT, TICK_DT};
use super::tower::{Tower, TowerKind};
use super::unit::{Unit, UnitState};

/// Everything needed to start a battle. Same plan, same battle.
#[derive(Debug, Clone)]
pub struct BattlePlan {
    pub seed: u64,
    pub home_deck: Vec<CardId>,
    pub away_deck: Vec<CardId>,
    /// Attach an agent to a side; `None` leaves it externally driven.
    pub home_agent: Option<Difficulty>,
    pub away_agent: Option<Difficulty>,
}

impl BattlePlan {
    /// Default decks, both sides externally driven.
    pub fn new(seed: u64) -> Self {
        let deck = catalog().default_deck().to_vec();
        Self {
            seed,
            home_deck: deck.clone(),
            away_deck: deck,
            home_agent: None,
            away_agent: None,
        }
    }

    /// Human home side against an agent-driven away side.
    pub fn versus_agent(seed: u64, difficulty: Difficulty) -> Self {
        Self {
            away_agent: Some(difficulty),
            ..Self::new(seed)
        }
    }

    /// Fully automated battle, agents on both sides.
    pub fn agent_match(seed: u64, home: Difficulty, away: Difficulty) -> Self {
        Self {
            home_agent: Some(home),
            away_agent: Some(away),
            ..Self::new(seed)
        }
    }
}

/// One side's share of the battlefield.
#[derive(Debug, Clone)]
pub struct SideState {
    pub side: Side,
    pub units: Vec<Unit>,
    pub towers: Vec<Tower>,
    pub elixir: f32,
    pub crowns: u8,
    pub hand: Hand,
}

impl SideState {
    /// Resolve an entity id against this side's units and towers.
    fn combatant(&self, id: EntityId) -> Option<&Combatant> {
        self.units
            .iter()
            .map(|u| &u.combat)
            .chain(self.towers.iter().map(|t| &t.combat))
            .find(|c| c.id == id)
    }

    fn king_down(&self) -> bool {
        self.towers.iter().any(|t| t.kind == TowerKind::King && !t.combat.alive)
    }
}

/// Final report handed to the result sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    pub winner: Outcome,
    pub home_crowns: u8,
    pub away_crowns: u8,
    /// Simulated seconds from first tick to the final whistle.
    pub duration: f32,
    pub overtime: bool,
    pub home_trophies: i32,
    pub away_trophies: i32,
    /// Full action log, enough to review or replay the battle.
    pub events: Vec<BattleEvent>,
}

pub struct BattleEngine {
    rng: ChaCha8Rng,
    catalog: &'static CardCatalog,
    /// Elapsed battle seconds.
    clock: f32,
    time_remaining: f32,
    overtime: bool,
    paused: bool,
    finished: bool,
    winner: Outcome,
    /// Indexed `[home, away]`, see [`Side::index`].
    sides: [SideState; 2],
    projectiles: Vec<Projectile>,
    ids: EntityIdAlloc,
    recorder: EventRecorder,
    agents: [Option<OpponentAgent>; 2],
}

impl BattleEngine {
    pub fn new(plan: BattlePlan) -> Result<Self> {
        let catalog = catalog();
        for id in plan.home_deck.iter().chain(plan.away_deck.iter()) {
            if catalog.get(id).is_none() {
                return Err(BattleError::UnknownCard(id.clone()));
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(plan.seed);
        let mut ids = EntityIdAlloc::default();
        let home_hand = Hand::deal(&plan.home_deck, &mut rng)?;
        let away_hand = Hand::deal(&plan.away_deck, &mut rng)?;

        let sides = [
            SideState {
                side: Side::HOME,
                units: Vec::new(),
                towers: Tower::standard_lineup(&mut ids, Side::HOME),
                elixir: elixir::START,
                crowns: 0,
                hand: home_hand,
            },
            SideState {
                side: Side::AWAY,
                units: Vec::new(),
                towers: Tower::standard_lineup(&mut ids, Side::AWAY),
                elixir: elixir::START,
                crowns: 0,
                hand: away_hand,
            },
        ];
        let agents = [
            plan.home_agent.map(|d| OpponentAgent::new(Side::HOME, d)),
            plan.away_agent.map(|d| OpponentAgent::new(Side::AWAY, d)),
        ];

        Ok(Self {
            rng,
            catalog,
            clock: 0.0,
            time_remaining: timer::BATTLE_DURATION_SEC,
            overtime: false,
            paused: false,
            finished: false,
            winner: Outcome::Undetermined,
            sides,
            projectiles: Vec::new(),
            ids,
            recorder: EventRecorder::new(),
            agents,
        })
    }

    // ------------------------------------------------------------------
    // Tick driver
    // ------------------------------------------------------------------

    /// Advance the battle by one frame.
    ///
    /// `dt` is clamped to [`MAX_TICK_DT`]; a finished or paused battle
    /// ignores the call entirely.
    pub fn tick(&mut self, dt: f32) {
        if self.finished || self.paused {
            return;
        }
        let dt = dt.clamp(0.0, MAX_TICK_DT);
        if dt <= 0.0 {
            return;
        }
        self.clock += dt;

        self.advance_clock(dt);
        if self.finished {
            return;
        }
        self.regenerate_elixir(dt);
        self.agent_pass();
        self.unit_pass(Side::HOME, dt);
        self.unit_pass(Side::AWAY, dt);
        self.resolve_collisions();
        self.tower_pass(Side::HOME);
        self.tower_pass(Side::AWAY);
        self.projectile_pass(dt);
        self.settle_tower_kills();
        self.prune_dead_units();
        self.check_win_condition();
    }

    /// Drive a headless battle to its result at the canonical tick rate.
    pub fn run_to_completion(&mut self) -> BattleResult {
        self.paused = false;
        while !self.finished {
            self.tick(TICK_DT);
        }
        self.build_result()
    }

    fn advance_clock(&mut self, dt: f32) {
        self.time_remaining -= dt;
        if self.time_remaining > 0.0 {
            return;
        }
        let (home, away) = (self.sides[0].crowns, self.sides[1].crowns);
        if !self.overtime && home == away {
            self.overtime = true;
            self.time_remaining = timer::OVERTIME_DURATION_SEC;
            self.recorder.record(BattleEvent::OvertimeStarted { t: self.clock });
            log::info!("tied {home}-{away} at full time, entering overtime");
        } else {
            self.finish(outcome_from_crowns(home, away));
        }
    }

    fn regenerate_elixir(&mut self, dt: f32) {
        let rate = if self.overtime {
            elixir::OVERTIME_REGEN_PER_SEC
        } else {
            elixir::REGEN_PER_SEC
        };
        for side in self.sides.iter_mut() {
            side.elixir = (side.elixir + rate * dt).min(elixir::MAX);
        }
    }

    /// Let attached agents act through the same deploy entry point a
    /// human uses, fed only by the public snapshot.
    fn agent_pass(&mut self) {
        let now = self.clock;
        for idx in 0..2 {
            let Some(mut agent) = self.agents[idx].take() else {
                continue;
            };
            if agent.ready(now) {
                let snapshot = self.snapshot();
                if let Some(order) = agent.decide(now, &snapshot, self.catalog, &mut self.rng) {
                    if self.play_card(agent.side(), order.slot, order.x, order.y).is_ok() {
                        agent.note_action(now);
                    }
                }
            }
            self.agents[idx] = Some(agent);
        }
    }

    fn unit_pass(&mut self, side: Side, dt: f32) {
        let now = self.clock;
        let (own, foe) = split_sides(&mut self.sides, side);
        for i in 0..own.units.len() {
            let unit = &mut own.units[i];
            unit_tick(unit, foe, &mut self.projectiles, &mut self.ids, &mut self.recorder, now, dt);
        }
    }

    /// Push overlapping units apart, then clamp everyone into the arena.
    ///
    /// Overlaps are measured on a position snapshot and applied in a
    /// second phase, so resolution order cannot bias the push.
    fn resolve_collisions(&mut self) {
        let bodies: Vec<(EntityId, ArenaPos, f32)> = self
            .sides
            .iter()
            .flat_map(|s| s.units.iter())
            .filter(|u| u.combat.alive)
            .map(|u| (u.combat.id, u.combat.pos, u.combat.radius))
            .collect();

        for side in self.sides.iter_mut() {
            for unit in side.units.iter_mut().filter(|u| u.combat.alive) {
                let mut push = (0.0f32, 0.0f32);
                for &(other_id, other_pos, other_radius) in &bodies {
                    if other_id == unit.combat.id {
                        continue;
                    }
                    let dist = geometry::distance(unit.combat.pos, other_pos);
                    let min_dist = unit.combat.radius + other_radius;
                    if dist < min_dist && dist > 0.0 {
                        let overlap = min_dist - dist;
                        let dir = geometry::direction(unit.combat.pos, other_pos);
                        push.0 -= dir.0 * overlap * gameplay::COLLISION_PUSH_FORCE;
                        push.1 -= dir.1 * overlap * gameplay::COLLISION_PUSH_FORCE;
                    }
                }
                unit.combat.pos.0 += push.0;
                unit.combat.pos.1 += push.1;
                unit.combat.pos = geometry::clamp_to_arena(unit.combat.pos, unit.combat.radius);
            }
        }
    }

    fn tower_pass(&mut self, side: Side) {
        let now = self.clock;
        let (own, foe) = split_sides(&mut self.sides, side);
        let guard_down = own.towers.iter().any(|t| t.kind == TowerKind::Guard && !t.combat.alive);

        for tower in own.towers.iter_mut() {
            if !tower.combat.alive {
                continue;
            }
            if tower.kind == TowerKind::King && !tower.activated {
                // A fallen guard wakes the king; it opens fire next tick.
                if guard_down && tower.activate() {
                    self.recorder.record(BattleEvent::KingActivated { t: now, side: tower.combat.side });
                    log::info!("{} king tower activated (guard lost)", tower.combat.side.label());
                }
                continue;
            }

            // Passive acquire: nearest living intruder, re-scanned every
            // tick (towers do not hold a lock).
            let target = foe
                .units
                .iter()
                .filter(|u| u.combat.alive)
                .filter(|u| geometry::distance(tower.combat.pos, u.combat.pos) <= tower.combat.range)
                .min_by(|a, b| cmp_dist(tower.combat.pos, a.combat.pos, b.combat.pos));
            tower.combat.target = target.map(|u| u.combat.id);

            if let Some(victim) = target {
                if tower.combat.can_attack(now) {
                    tower.combat.last_attack_at = Some(now);
                    self.projectiles.push(Projectile::bolt(
                        self.ids.allocate(),
                        tower.combat.side,
                        tower.combat.pos,
                        victim.combat.id,
                        victim.combat.pos,
                        tower.combat.damage,
                    ));
                }
            }
        }
    }

    fn projectile_pass(&mut self, dt: f32) {
        let now = self.clock;
        for i in 0..self.projectiles.len() {
            let target_id = self.projectiles[i].target;
            let live_pos = locate_combatant(&self.sides, target_id)
                .filter(|c| c.alive)
                .map(|c| c.pos);
            let step = self.projectiles[i].advance(live_pos, dt);
            if step == ProjectileStep::Impact {
                if let Some(damage) = self.projectiles[i].payload {
                    // Payload lands only on a still-living target; ids are
                    // unique, so exactly one side can resolve it.
                    if live_pos.is_some() {
                        for side in self.sides.iter_mut() {
                            deal_damage(side, target_id, damage, &mut self.recorder, now);
                        }
                    }
                }
            }
        }
        self.projectiles.retain(|p| p.active);
    }

    /// Award crowns for towers felled this tick.
    fn settle_tower_kills(&mut self) {
        let now = self.clock;
        for idx in 0..2 {
            let mut felled: Vec<TowerKind> = Vec::new();
            for tower in self.sides[idx].towers.iter_mut() {
                if !tower.combat.alive && !tower.crown_awarded {
                    tower.crown_awarded = true;
                    felled.push(tower.kind);
                }
            }
            if felled.is_empty() {
                continue;
            }
            let owner = self.sides[idx].side;
            let scorer = 1 - idx;
            for kind in felled {
                let crowns = &mut self.sides[scorer].crowns;
                *crowns = match kind {
                    // A king kill is an instant three-crown finish.
                    TowerKind::King => gameplay::CROWN_CAP,
                    TowerKind::Guard => (*crowns + 1).min(gameplay::CROWN_CAP),
                };
                self.recorder.record(BattleEvent::TowerDestroyed { t: now, side: owner, tower: kind });
                log::info!(
                    "{} {:?} tower destroyed, {} now at {} crowns",
                    owner.label(),
                    kind,
                    owner.opponent().label(),
                    self.sides[scorer].crowns
                );
            }
        }
    }

    /// Dead units stay observable for one full tick before removal; dead
    /// towers are never removed.
    fn prune_dead_units(&mut self) {
        for side in self.sides.iter_mut() {
            side.units.retain(|u| u.combat.alive || !u.reaped);
            for unit in side.units.iter_mut() {
                if !unit.combat.alive {
                    unit.reaped = true;
                }
            }
        }
    }

    /// King destruction ends the battle immediately, overriding crowns.
    fn check_win_condition(&mut self) {
        if self.finished {
            return;
        }
        if self.sides[0].king_down() {
            self.finish(Outcome::Away);
        } else if self.sides[1].king_down() {
            self.finish(Outcome::Home);
        }
    }

    /// Idempotent terminal transition; nothing mutates after it.
    fn finish(&mut self, winner: Outcome) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.winner = winner;
        let (home, away) = (self.sides[0].crowns, self.sides[1].crowns);
        self.recorder.record(BattleEvent::BattleEnded {
            t: self.clock,
            winner,
            home_crowns: home,
            away_crowns: away,
        });
        log::info!("battle over after {:.1}s: {winner:?} ({home}-{away})", self.clock);
    }

    // ------------------------------------------------------------------
    // Deploy entry point
    // ------------------------------------------------------------------

    /// Deploy the card in `slot` of `side`'s hand at (x, y).
    ///
    /// The single channel through which both humans and agents act.
    /// Validation happens before any mutation: a rejected deploy leaves
    /// elixir, hand and battlefield untouched.
    pub fn play_card(&mut self, side: Side, slot: usize, x: f32, y: f32) -> Result<()> {
        if self.finished {
            return Err(BattleError::BattleFinished);
        }
        let idx = side.index();
        let card_id = self.sides[idx]
            .hand
            .card_at(slot)
            .cloned()
            .ok_or(BattleError::InvalidHandSlot { slot })?;
        let card = self.catalog.get(&card_id).ok_or_else(|| {
            // The hand is dealt from a validated deck, so a miss here is a
            // data-configuration bug, not a user error.
            debug_assert!(false, "hand holds a card missing from the catalog: {card_id}");
            BattleError::UnknownCard(card_id.clone())
        })?;
        let stats = card.unit_stats().ok_or_else(|| BattleError::UnplayableCategory(card_id.clone()))?;
        if !geometry::in_spawn_zone(side.is_home(), (x, y)) {
            return Err(BattleError::OutsideSpawnZone { x, y });
        }
        let available = self.sides[idx].elixir;
        if available < f32::from(card.cost) {
            return Err(BattleError::InsufficientElixir { cost: card.cost, available });
        }

        self.sides[idx].elixir -= f32::from(card.cost);
        self.spawn_units(side, &card_id, stats, (x, y));
        self.sides[idx].hand.rotate(slot)?;
        self.recorder.record(BattleEvent::Deploy {
            t: self.clock,
            side,
            card: card_id.clone(),
            x,
            y,
        });
        log::debug!("{} deployed {card_id} at ({x:.0}, {y:.0})", side.label());
        Ok(())
    }

    /// Instantiate a card's units, ring-spread around the deploy point.
    fn spawn_units(&mut self, side: Side, card_id: &str, stats: &UnitStats, at: ArenaPos) {
        let count = stats.count.max(1);
        for i in 0..count {
            let mut pos = at;
            if count > 1 && stats.spawn_spread > 0.0 {
                let angle = i as f32 / count as f32 * std::f32::consts::TAU;
                pos = (at.0 + angle.cos() * stats.spawn_spread, at.1 + angle.sin() * stats.spawn_spread);
            }
            let pos = geometry::clamp_to_arena(pos, stats.radius);
            let unit = Unit::from_card(self.ids.allocate(), side, pos, card_id, stats);
            self.sides[side.index()].units.push(unit);
        }
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Owned, self-consistent copy of the battle for presentation layers.
    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            elapsed: self.clock,
            time_remaining: self.time_remaining.max(0.0),
            overtime: self.overtime,
            paused: self.paused,
            finished: self.finished,
            winner: self.winner,
            sides: [snapshot_side(&self.sides[0]), snapshot_side(&self.sides[1])],
            projectiles: self
                .projectiles
                .iter()
                .filter(|p| p.active)
                .map(|p| ProjectileView {
                    id: p.id,
                    side: p.side,
                    x: p.pos.0,
                    y: p.pos.1,
                })
                .collect(),
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.clock
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_overtime(&self) -> bool {
        self.overtime
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn winner(&self) -> Outcome {
        self.winner
    }

    pub fn events(&self) -> &[BattleEvent] {
        self.recorder.events()
    }

    /// The final report, available once the battle has finished.
    pub fn result(&self) -> Option<BattleResult> {
        self.finished.then(|| self.build_result())
    }

    fn build_result(&self) -> BattleResult {
        let (home, away) = (self.sides[0].crowns, self.sides[1].crowns);
        let bonus = |crowns: u8| {
            if crowns >= gameplay::CROWN_CAP {
                trophies::THREE_CROWN_BONUS
            } else {
                0
            }
        };
        let (home_trophies, away_trophies) = match self.winner {
            Outcome::Home => (trophies::WIN + bonus(home), trophies::LOSS),
            Outcome::Away => (trophies::LOSS, trophies::WIN + bonus(away)),
            Outcome::Draw | Outcome::Undetermined => (trophies::DRAW, trophies::DRAW),
        };
        BattleResult {
            winner: self.winner,
            home_crowns: home,
            away_crowns: away,
            duration: self.clock,
            overtime: self.overtime,
            home_trophies,
            away_trophies,
            events: self.recorder.events().to_vec(),
        }
    }
}

fn outcome_from_crowns(home: u8, away: u8) -> Outcome {
    match home.cmp(&away) {
        std::cmp::Ordering::Greater => Outcome::Home,
        std::cmp::Ordering::Less => Outcome::Away,
        std::cmp::Ordering::Equal => Outcome::Draw,
    }
}

/// Split the side array into (own, foe) halves for one side's pass.
fn split_sides(sides: &mut [SideState; 2], side: Side) -> (&mut SideState, &mut SideState) {
    let (home, away) = sides.split_at_mut(1);
    if side.is_home() {
        (&mut home[0], &mut away[0])
    } else {
        (&mut away[0], &mut home[0])
    }
}

fn locate_combatant(sides: &[SideState; 2], id: EntityId) -> Option<&Combatant> {
    sides.iter().find_map(|s| s.combatant(id))
}

fn cmp_dist(from: ArenaPos, a: ArenaPos, b: ArenaPos) -> std::cmp::Ordering {
    geometry::distance(from, a)
        .partial_cmp(&geometry::distance(from, b))
        .unwrap_or(std::cmp::Ordering::Equal)
}

// ----------------------------------------------------------------------
// Unit behavior (one unit, one tick)
// ----------------------------------------------------------------------

fn unit_tick(
    unit: &mut Unit,
    foe: &mut SideState,
    projectiles: &mut Vec<Projectile>,
    ids: &mut EntityIdAlloc,
    recorder: &mut EventRecorder,
    now: f32,
    dt: f32,
) {
    if !unit.combat.alive {
        return;
    }

    // A dead or missing lock resolves to "no target" and frees the unit
    // to reacquire; a living lock is never re-evaluated.
    let lock_live = unit
        .combat
        .target
        .and_then(|id| foe.combatant(id))
        .map(|c| c.alive)
        .unwrap_or(false);
    if !lock_live {
        unit.combat.target = None;
        acquire_target(unit, foe, now);
    }

    // A charge whose victim is gone fizzles without paying out.
    if unit.charging {
        let victim_live = unit
            .charge_target
            .and_then(|id| foe.combatant(id))
            .map(|c| c.alive)
            .unwrap_or(false);
        if !victim_live {
            unit.end_charge();
        }
    }

    let target_info = unit
        .combat
        .target
        .and_then(|id| foe.combatant(id).map(|c| (id, c.pos, c.radius)));
    match target_info {
        Some((target_id, target_pos, target_radius)) => {
            let dist = geometry::distance(unit.combat.pos, target_pos);
            if let Some(charge) = unit.charge {
                // Charge arms inside the trigger window but outside
                // attack range.
                if !unit.charging && dist <= charge.trigger_distance && dist > unit.combat.range {
                    unit.begin_charge(target_id);
                }
            }
            if dist <= unit.combat.range + target_radius {
                unit.state = UnitState::Attacking;
                attempt_attack(unit, target_id, foe, projectiles, ids, recorder, now);
            } else {
                unit.state = if unit.charging { UnitState::Charging } else { UnitState::Moving };
                step_toward(unit, target_pos, dt);
            }
        }
        None => {
            unit.state = UnitState::Seeking;
            advance_down_lane(unit, dt);
        }
    }
}

/// Pick a target for an unlocked unit, throttled by the retarget
/// cooldown. Structure hunters scan towers only; everyone else prefers
/// nearby enemy units and falls back to the nearest tower.
fn acquire_target(unit: &mut Unit, foe: &SideState, now: f32) {
    if let Some(last) = unit.last_retarget_at {
        if now - last < gameplay::RETARGET_COOLDOWN_SEC {
            return;
        }
    }
    unit.last_retarget_at = Some(now);

    let pos = unit.combat.pos;
    let nearest_tower = foe
        .towers
        .iter()
        .filter(|t| t.combat.alive)
        .min_by(|a, b| cmp_dist(pos, a.combat.pos, b.combat.pos))
        .map(|t| t.combat.id);

    unit.combat.target = match unit.target_filter {
        TargetFilter::Structures => nearest_tower,
        TargetFilter::Any => foe
            .units
            .iter()
            .filter(|u| u.combat.alive)
            .filter(|u| geometry::distance(pos, u.combat.pos) <= gameplay::AGGRO_RANGE)
            .min_by(|a, b| cmp_dist(pos, a.combat.pos, b.combat.pos))
            .map(|u| u.combat.id)
            .or(nearest_tower),
    };
}

fn attempt_attack(
    unit: &mut Unit,
    target_id: EntityId,
    foe: &mut SideState,
    projectiles: &mut Vec<Projectile>,
    ids: &mut EntityIdAlloc,
    recorder: &mut EventRecorder,
    now: f32,
) {
    if !unit.combat.can_attack(now) {
        return;
    }
    unit.combat.last_attack_at = Some(now);

    let damage = unit.strike_damage(target_id);
    let primary_pos = foe.combatant(target_id).map(|c| c.pos);
    deal_damage(foe, target_id, damage, recorder, now);

    if let (Some(splash), Some(center)) = (unit.splash, primary_pos) {
        // Half damage to every other living enemy unit near the primary
        // target; towers are not splashed.
        let victims: Vec<EntityId> = foe
            .units
            .iter()
            .filter(|u| u.combat.alive && u.combat.id != target_id)
            .filter(|u| geometry::distance(center, u.combat.pos) <= splash.radius)
            .map(|u| u.combat.id)
            .collect();
        for victim in victims {
            deal_damage(foe, victim, damage * gameplay::SPLASH_FALLOFF, recorder, now);
        }
    }

    if unit.attack == AttackMode::Ranged {
        // The hit already landed; the bolt is a presentation echo and
        // carries no payload.
        let dest = primary_pos.unwrap_or(unit.combat.pos);
        projectiles.push(Projectile::echo(ids.allocate(), unit.combat.side, unit.combat.pos, target_id, dest));
    }
}

/// Apply damage to whichever entity on `side` owns `id`; unknown ids are
/// stale references and resolve to a no-op.
fn deal_damage(side: &mut SideState, id: EntityId, amount: f32, recorder: &mut EventRecorder, now: f32) {
    if let Some(unit) = side.units.iter_mut().find(|u| u.combat.id == id) {
        unit.combat.take_damage(amount);
        return;
    }
    if let Some(tower) = side.towers.iter_mut().find(|t| t.combat.id == id) {
        let hit = tower.absorb_damage(amount);
        if hit.activated_now {
            recorder.record(BattleEvent::KingActivated { t: now, side: tower.combat.side });
            log::info!("{} king tower activated (took damage)", tower.combat.side.label());
        }
        // Crowns for a destroyed tower are settled by the per-tick sweep.
    }
}

/// Move toward a point, funneling through a bridge when the next step
/// would cross the river illegally.
fn step_toward(unit: &mut Unit, target: ArenaPos, dt: f32) {
    let speed = unit.current_speed();
    let dir = geometry::direction(unit.combat.pos, target);
    if dir == (0.0, 0.0) {
        return;
    }
    let next_y = unit.combat.pos.1 + dir.1 * speed * dt;
    if !may_occupy(unit, (unit.combat.pos.0, next_y)) {
        detour_to_bridge(unit, dt);
        return;
    }
    unit.combat.pos.0 += dir.0 * speed * dt;
    unit.combat.pos.1 += dir.1 * speed * dt;
}

/// The river band is passable only on a bridge, unless the unit carries
/// the crossing exemption.
fn may_occupy(unit: &Unit, pos: ArenaPos) -> bool {
    !geometry::in_river_band(pos.1) || unit.crosses_river || geometry::on_bridge(pos)
}

fn detour_to_bridge(unit: &mut Unit, dt: f32) {
    let bridge = geometry::nearest_bridge(unit.combat.pos);
    if geometry::distance(unit.combat.pos, bridge) <= gameplay::ARRIVAL_EPSILON {
        return;
    }
    let dir = geometry::direction(unit.combat.pos, bridge);
    // The approach always runs at base speed, charging or not.
    unit.combat.pos.0 += dir.0 * unit.move_speed * dt;
    unit.combat.pos.1 += dir.1 * unit.move_speed * dt;
}

/// With no target at all, push straight down the lane toward the enemy
/// back line.
fn advance_down_lane(unit: &mut Unit, dt: f32) {
    let target_y = if unit.combat.side.is_home() {
        towers::AWAY_KING_Y
    } else {
        towers::HOME_KING_Y
    };
    let dy = target_y - unit.combat.pos.1;
    if dy.abs() <= gameplay::ARRIVAL_EPSILON {
        return;
    }
    let next_y = unit.combat.pos.1 + dy.signum() * unit.move_speed * dt;
    if !may_occupy(unit, (unit.combat.pos.0, next_y)) {
        detour_to_bridge(unit, dt);
        return;
    }
    unit.combat.pos.1 = next_y;
}

fn snapshot_side(side: &SideState) -> SideSnapshot {
    SideSnapshot {
        side: side.side,
        elixir: side.elixir,
        crowns: side.crowns,
        hand: side.hand.cards().to_vec(),
        next_card: side.hand.next_card().clone(),
        units: side
            .units
            .iter()
            .map(|u| UnitView {
                id: u.combat.id,
                card: u.card.clone(),
                x: u.combat.pos.0,
                y: u.combat.pos.1,
                hp: u.combat.hp,
                max_hp: u.combat.max_hp,
                state: u.state,
                charging: u.charging,
                alive: u.combat.alive,
            })
            .collect(),
        towers: side
            .towers
            .iter()
            .map(|t| TowerView {
                id: t.combat.id,
                kind: t.kind,
                x: t.combat.pos.0,
                y: t.combat.pos.1,
                hp: t.combat.hp,
                max_hp: t.combat.max_hp,
                alive: t.combat.alive,
                activated: t.activated,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ChargeSpec, TargetDomain};
    use crate::engine::constants::arena;

    fn engine() -> BattleEngine {
        BattleEngine::new(BattlePlan::new(7)).unwrap()
    }

    fn put_custom(
        engine: &mut BattleEngine,
        side: Side,
        card: &str,
        stats: &UnitStats,
        pos: ArenaPos,
    ) -> EntityId {
        let unit = Unit::from_card(engine.ids.allocate(), side, pos, card, stats);
        let id = unit.combat.id;
        engine.sides[side.index()].units.push(unit);
        id
    }

    fn put_unit(engine: &mut BattleEngine, side: Side, card: &str, pos: ArenaPos) -> EntityId {
        let stats = catalog().get(card).unwrap().unit_stats().unwrap().clone();
        put_custom(engine, side, card, &stats, pos)
    }

    fn unit_by_id(engine: &BattleEngine, id: EntityId) -> Option<&Unit> {
        engine.sides.iter().flat_map(|s| s.units.iter()).find(|u| u.combat.id == id)
    }

    /// Immobile, harmless punching bag.
    fn dummy_stats(hp: f32) -> UnitStats {
        UnitStats {
            hp,
            damage: 0.0,
            hits_per_sec: 1.0,
            move_speed: 0.0,
            range: 20.0,
            radius: 16.0,
            attack: AttackMode::Melee,
            target_domain: TargetDomain::Ground,
            target_filter: TargetFilter::Any,
            count: 1,
            spawn_spread: 0.0,
            splash: None,
            charge: None,
            crosses_river: false,
        }
    }

    fn run_secs(engine: &mut BattleEngine, secs: f32) {
        let ticks = (secs / TICK_DT).ceil() as u32;
        for _ in 0..ticks {
            engine.tick(TICK_DT);
        }
    }

    #[test]
    fn test_initial_state() {
        let eng = engine();
        for side in &eng.sides {
            assert_eq!(side.elixir, elixir::START);
            assert_eq!(side.crowns, 0);
            assert_eq!(side.towers.len(), 3);
            assert_eq!(side.hand.cards().len(), 4);
        }
        assert_eq!(eng.time_remaining, timer::BATTLE_DURATION_SEC);
        assert_eq!(eng.winner(), Outcome::Undetermined);
        assert!(!eng.sides[0].towers[2].activated, "king starts dormant");
    }

    #[test]
    fn test_elixir_clamps_at_max() {
        let mut eng = engine();
        let before = eng.sides[0].elixir;
        eng.tick(TICK_DT);
        let regen = eng.sides[0].elixir - before;
        assert!((regen - elixir::REGEN_PER_SEC * TICK_DT).abs() < 1e-4);

        for _ in 0..(20.0 / TICK_DT) as u32 {
            eng.tick(TICK_DT);
            for side in &eng.sides {
                assert!(side.elixir <= elixir::MAX);
                assert!(side.elixir >= 0.0);
            }
        }
        assert_eq!(eng.sides[0].elixir, elixir::MAX);
    }

    #[test]
    fn test_deploy_spends_and_rotates() {
        let mut eng = engine();
        let card_id = eng.sides[0].hand.cards()[0].clone();
        let preview = eng.sides[0].hand.next_card().clone();
        let card = catalog().get(&card_id).unwrap();
        let count = card.unit_stats().unwrap().count as usize;

        eng.play_card(Side::HOME, 0, 180.0, 500.0).unwrap();

        assert_eq!(eng.sides[0].units.len(), count);
        assert!((eng.sides[0].elixir - (elixir::START - f32::from(card.cost))).abs() < 1e-4);
        assert_eq!(eng.sides[0].hand.cards()[3], preview);
        assert!(matches!(
            eng.events().last(),
            Some(BattleEvent::Deploy { side: Side::HOME, card, .. }) if *card == card_id
        ));
    }

    #[test]
    fn test_deploy_rejections_leave_state_untouched() {
        let mut eng = engine();
        eng.sides[0].elixir = 0.5;
        let hand_before: Vec<CardId> = eng.sides[0].hand.cards().to_vec();

        let err = eng.play_card(Side::HOME, 0, 180.0, 500.0).unwrap_err();
        assert!(matches!(err, BattleError::InsufficientElixir { .. }));
        assert!(err.is_deploy_rejection());
        assert_eq!(eng.sides[0].elixir, 0.5);
        assert_eq!(eng.sides[0].hand.cards(), hand_before.as_slice());
        assert!(eng.sides[0].units.is_empty());
        assert!(eng.events().is_empty());

        // Enemy half is not a legal deploy zone for the home side.
        eng.sides[0].elixir = 10.0;
        let err = eng.play_card(Side::HOME, 0, 180.0, 100.0).unwrap_err();
        assert!(matches!(err, BattleError::OutsideSpawnZone { .. }));
        assert!(eng.sides[0].units.is_empty());

        let err = eng.play_card(Side::HOME, 9, 180.0, 500.0).unwrap_err();
        assert!(matches!(err, BattleError::InvalidHandSlot { slot: 9 }));
    }

    #[test]
    fn test_target_lock_survives_closer_enemies() {
        let mut eng = engine();
        let hunter = put_unit(&mut eng, Side::HOME, "knight", (180.0, 400.0));
        let near = put_unit(&mut eng, Side::AWAY, "knight", (180.0, 350.0));
        let far = put_unit(&mut eng, Side::AWAY, "knight", (180.0, 280.0));

        eng.tick(TICK_DT);
        assert_eq!(unit_by_id(&eng, hunter).unwrap().combat.target, Some(near));

        // Teleport the other enemy right next to the hunter: the lock
        // must hold as long as the locked target lives.
        eng.sides[1].units.iter_mut().find(|u| u.combat.id == far).unwrap().combat.pos =
            (180.0, 390.0);
        for _ in 0..30 {
            eng.tick(TICK_DT);
            assert_eq!(unit_by_id(&eng, hunter).unwrap().combat.target, Some(near));
        }
    }

    #[test]
    fn test_lock_released_when_target_dies() {
        let mut eng = engine();
        let hunter = put_unit(&mut eng, Side::HOME, "knight", (180.0, 400.0));
        let victim = put_custom(&mut eng, Side::AWAY, "dummy", &dummy_stats(10.0), (180.0, 360.0));

        eng.tick(TICK_DT);
        assert_eq!(unit_by_id(&eng, hunter).unwrap().combat.target, Some(victim));

        // Kill the lock target; the hunter falls back to a tower after
        // the retarget cooldown.
        eng.sides[1]
            .units
            .iter_mut()
            .find(|u| u.combat.id == victim)
            .unwrap()
            .combat
            .take_damage(100.0);
        run_secs(&mut eng, 1.0);
        let target = unit_by_id(&eng, hunter).unwrap().combat.target;
        assert!(target.is_some());
        assert_ne!(target, Some(victim));
    }

    #[test]
    fn test_river_crossing_funnels_through_bridge() {
        let mut eng = engine();
        // Mid-lane start: the straight line to the nearest tower crosses
        // the river between the bridges.
        let id = put_unit(&mut eng, Side::HOME, "knight", (180.0, 420.0));
        let mut touched_bridge = false;
        let mut crossed = false;
        let north_bank = arena::RIVER_Y - arena::RIVER_HEIGHT / 2.0;

        for _ in 0..(20.0 / TICK_DT) as u32 {
            eng.tick(TICK_DT);
            let Some(unit) = unit_by_id(&eng, id) else { break };
            let pos = unit.combat.pos;
            if geometry::on_bridge(pos) {
                touched_bridge = true;
            }
            if pos.1 < north_bank - 1.0 {
                crossed = true;
                break;
            }
        }
        assert!(crossed, "knight never made it across the river");
        assert!(touched_bridge, "non-exempt unit crossed without using a bridge");
    }

    #[test]
    fn test_river_exemption_crosses_anywhere() {
        let mut eng = engine();
        let id = put_unit(&mut eng, Side::HOME, "hog_rider", (180.0, 420.0));
        let mut swam = false;
        let north_bank = arena::RIVER_Y - arena::RIVER_HEIGHT / 2.0;

        for _ in 0..(20.0 / TICK_DT) as u32 {
            eng.tick(TICK_DT);
            let Some(unit) = unit_by_id(&eng, id) else { break };
            let pos = unit.combat.pos;
            if geometry::in_river_band(pos.1) && !geometry::on_bridge(pos) {
                swam = true;
            }
            if pos.1 < north_bank - 1.0 {
                break;
            }
        }
        assert!(swam, "exempt unit should cross the band off-bridge");
    }

    #[test]
    fn test_knight_fells_guard_tower_and_scores() {
        let mut eng = engine();
        // Neutralize return fire so the attack runs uninterrupted.
        for tower in eng.sides[1].towers.iter_mut() {
            tower.combat.damage = 0.0;
        }
        put_unit(&mut eng, Side::HOME, "knight", (72.0, 160.0));

        // 1400 hp / 75 damage = 19 hits at 1.2 hits/sec.
        run_secs(&mut eng, 16.0);

        let guard = &eng.sides[1].towers[0];
        assert!(!guard.combat.alive, "guard tower should be rubble");
        assert_eq!(guard.combat.hp, 0.0);
        assert_eq!(eng.sides[0].crowns, 1);
        assert!(!eng.is_finished());
        assert!(eng.events().iter().any(|e| matches!(
            e,
            BattleEvent::TowerDestroyed { side: Side::AWAY, tower: TowerKind::Guard, .. }
        )));
        // Losing a guard wakes the king.
        assert!(eng.sides[1].towers[2].activated);
        assert!(eng.events().iter().any(|e| matches!(
            e,
            BattleEvent::KingActivated { side: Side::AWAY, .. }
        )));
    }

    #[test]
    fn test_splash_halves_damage_inside_radius_only() {
        let mut eng = engine();
        // Valkyrie: 120 damage, splash radius 40.
        put_unit(&mut eng, Side::HOME, "valkyrie", (180.0, 400.0));
        let primary = put_custom(&mut eng, Side::AWAY, "dummy", &dummy_stats(660.0), (180.0, 430.0));
        let close = put_custom(&mut eng, Side::AWAY, "dummy", &dummy_stats(660.0), (180.0, 460.0));
        let outside = put_custom(&mut eng, Side::AWAY, "dummy", &dummy_stats(660.0), (180.0, 480.0));

        eng.tick(TICK_DT);

        assert_eq!(unit_by_id(&eng, primary).unwrap().combat.hp, 540.0);
        assert_eq!(unit_by_id(&eng, close).unwrap().combat.hp, 600.0);
        assert_eq!(unit_by_id(&eng, outside).unwrap().combat.hp, 660.0);
    }

    #[test]
    fn test_ranged_attack_damages_exactly_once() {
        let mut eng = engine();
        put_unit(&mut eng, Side::HOME, "musketeer", (180.0, 520.0));
        let victim = put_custom(&mut eng, Side::AWAY, "dummy", &dummy_stats(5000.0), (180.0, 420.0));

        eng.tick(TICK_DT);
        // Damage lands at attack time...
        assert_eq!(unit_by_id(&eng, victim).unwrap().combat.hp, 4900.0);
        // ...and the spawned bolt is a payload-free echo.
        assert!(eng.projectiles.iter().all(|p| p.payload.is_none()));

        // Well past the echo's impact but before the second shot.
        run_secs(&mut eng, 0.7);
        assert_eq!(unit_by_id(&eng, victim).unwrap().combat.hp, 4900.0);
    }

    #[test]
    fn test_tower_bolt_damages_on_impact() {
        let mut eng = engine();
        let knight = put_unit(&mut eng, Side::HOME, "knight", (72.0, 180.0));

        run_secs(&mut eng, 1.0);

        // One bolt fired and landed (cooldown 1.25s keeps it to one).
        assert_eq!(unit_by_id(&eng, knight).unwrap().combat.hp, 660.0 - towers::GUARD_DAMAGE);
        // The knight meanwhile chipped the guard in melee.
        assert!(eng.sides[1].towers[0].combat.hp < towers::GUARD_HP);
    }

    #[test]
    fn test_tied_timeout_enters_overtime() {
        let mut eng = engine();
        eng.sides[0].crowns = 1;
        eng.sides[1].crowns = 1;
        eng.time_remaining = 0.05;

        eng.tick(0.1);

        assert!(eng.is_overtime());
        assert!(!eng.is_finished());
        assert_eq!(eng.time_remaining, timer::OVERTIME_DURATION_SEC);
        assert!(eng.events().iter().any(|e| matches!(e, BattleEvent::OvertimeStarted { .. })));

        // Regeneration at least doubles in overtime.
        eng.sides[0].elixir = 0.0;
        eng.tick(0.1);
        assert!(eng.sides[0].elixir >= 2.0 * elixir::REGEN_PER_SEC * 0.1 - 1e-4);
    }

    #[test]
    fn test_timeout_with_lead_ends_battle() {
        let mut eng = engine();
        eng.sides[0].crowns = 2;
        eng.sides[1].crowns = 1;
        eng.time_remaining = 0.01;

        eng.tick(TICK_DT);
        assert!(eng.is_finished());
        assert_eq!(eng.winner(), Outcome::Home);

        let result = eng.result().unwrap();
        assert_eq!(result.home_trophies, trophies::WIN);
        assert_eq!(result.away_trophies, trophies::LOSS);
        assert!(!result.overtime);

        // Termination is idempotent: nothing moves afterwards.
        let elapsed = eng.elapsed();
        eng.tick(TICK_DT);
        assert_eq!(eng.elapsed(), elapsed);
        assert!(matches!(
            eng.play_card(Side::HOME, 0, 180.0, 500.0),
            Err(BattleError::BattleFinished)
        ));
    }

    #[test]
    fn test_overtime_expiry_can_draw() {
        let mut eng = engine();
        eng.overtime = true;
        eng.sides[0].crowns = 1;
        eng.sides[1].crowns = 1;
        eng.time_remaining = 0.01;

        eng.tick(TICK_DT);
        assert!(eng.is_finished());
        assert_eq!(eng.winner(), Outcome::Draw);
        let result = eng.result().unwrap();
        assert_eq!(result.home_trophies, trophies::DRAW);
        assert_eq!(result.away_trophies, trophies::DRAW);
    }

    #[test]
    fn test_king_kill_forces_three_crowns_and_wins() {
        let mut eng = engine();
        eng.sides[1].towers[2].absorb_damage(towers::KING_HP);

        eng.tick(TICK_DT);
        assert_eq!(eng.sides[0].crowns, 3, "king kill jumps straight to three crowns");
        assert!(eng.is_finished());
        assert_eq!(eng.winner(), Outcome::Home);
        let result = eng.result().unwrap();
        assert_eq!(result.home_trophies, trophies::WIN + trophies::THREE_CROWN_BONUS);
    }

    #[test]
    fn test_guard_kills_increment_crowns_up_to_two() {
        let mut eng = engine();
        eng.sides[1].towers[0].absorb_damage(towers::GUARD_HP);
        eng.tick(TICK_DT);
        assert_eq!(eng.sides[0].crowns, 1);

        eng.sides[1].towers[1].absorb_damage(towers::GUARD_HP);
        eng.tick(TICK_DT);
        assert_eq!(eng.sides[0].crowns, 2);
        assert!(!eng.is_finished(), "guards alone never end the battle");
    }

    #[test]
    fn test_dead_units_linger_for_one_tick() {
        let mut eng = engine();
        put_custom(&mut eng, Side::HOME, "dummy", &dummy_stats(10.0), (180.0, 500.0));
        eng.sides[0].units[0].combat.take_damage(50.0);

        eng.tick(TICK_DT);
        assert_eq!(eng.sides[0].units.len(), 1, "corpse observable for one tick");
        eng.tick(TICK_DT);
        assert!(eng.sides[0].units.is_empty());
    }

    #[test]
    fn test_charge_doubles_first_hit_only() {
        let mut eng = engine();
        let stats = UnitStats {
            hp: 1000.0,
            damage: 160.0,
            hits_per_sec: 1.0,
            move_speed: 55.0,
            range: 25.0,
            radius: 16.0,
            attack: AttackMode::Melee,
            target_domain: TargetDomain::Ground,
            target_filter: TargetFilter::Any,
            count: 1,
            spawn_spread: 0.0,
            splash: None,
            charge: Some(ChargeSpec {
                trigger_distance: 100.0,
                speed: 110.0,
                damage_multiplier: 2.0,
            }),
            crosses_river: false,
        };
        let charger = put_custom(&mut eng, Side::HOME, "lancer", &stats, (180.0, 560.0));
        let victim = put_custom(&mut eng, Side::AWAY, "dummy", &dummy_stats(5000.0), (180.0, 410.0));

        // Close from 150 out: walk, arm the charge at 100, hit for double.
        let mut saw_charging = false;
        let mut hp = 5000.0;
        for _ in 0..(4.0 / TICK_DT) as u32 {
            eng.tick(TICK_DT);
            if unit_by_id(&eng, charger).unwrap().charging {
                saw_charging = true;
            }
            hp = unit_by_id(&eng, victim).unwrap().combat.hp;
            if hp < 5000.0 {
                break;
            }
        }
        assert!(saw_charging, "charge never armed on approach");
        assert_eq!(hp, 5000.0 - 320.0, "charged hit must land doubled");

        // The follow-up hit is back to base damage.
        for _ in 0..(2.0 / TICK_DT) as u32 {
            eng.tick(TICK_DT);
            hp = unit_by_id(&eng, victim).unwrap().combat.hp;
            if hp < 4680.0 {
                break;
            }
        }
        assert_eq!(hp, 4680.0 - 160.0);
    }

    #[test]
    fn test_agent_plays_through_public_entry_point() {
        let mut eng = BattleEngine::new(BattlePlan::versus_agent(3, Difficulty::Hard)).unwrap();
        run_secs(&mut eng, 10.0);
        assert!(
            eng.events()
                .iter()
                .any(|e| matches!(e, BattleEvent::Deploy { side: Side::AWAY, .. })),
            "agent should have deployed within ten seconds"
        );
        // The human side stays untouched.
        assert!(!eng
            .events()
            .iter()
            .any(|e| matches!(e, BattleEvent::Deploy { side: Side::HOME, .. })));
    }

    #[test]
    fn test_pause_freezes_the_battle() {
        let mut eng = engine();
        eng.set_paused(true);
        eng.tick(TICK_DT);
        assert_eq!(eng.elapsed(), 0.0);
        eng.set_paused(false);
        eng.tick(TICK_DT);
        assert!(eng.elapsed() > 0.0);
    }

    #[test]
    fn test_headless_battle_terminates() {
        let mut eng = BattleEngine::new(BattlePlan::agent_match(11, Difficulty::Normal, Difficulty::Normal))
            .unwrap();
        let result = eng.run_to_completion();
        assert!(result.duration <= timer::BATTLE_DURATION_SEC + timer::OVERTIME_DURATION_SEC + 1.0);
        assert_ne!(result.winner, Outcome::Undetermined);
        assert!(matches!(result.events.last(), Some(BattleEvent::BattleEnded { .. })));
    }

    #[test]
    fn test_unknown_deck_card_rejected() {
        let mut plan = BattlePlan::new(1);
        plan.home_deck.push("chupacabra".to_string());
        assert!(matches!(
            BattleEngine::new(plan),
            Err(BattleError::UnknownCard(id)) if id == "chupacabra"
        ));
    }
}
