//! Battle event log.
//!
//! The engine records every externally meaningful transition as a typed
//! event with its battle-clock timestamp. The log doubles as the action
//! record handed to the result sink: the deploy entries alone are enough
//! to replay a battle against the same seed.

use serde::{Deserialize, Serialize};

use crate::data::CardId;

use super::entity::Side;
use super::tower::TowerKind;

/// Final battle outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Home,
    Away,
    Draw,
    Undetermined,
}

impl Outcome {
    pub fn winner(self) -> Option<Side> {
        match self {
            Outcome::Home => Some(Side::HOME),
            Outcome::Away => Some(Side::AWAY),
            Outcome::Draw | Outcome::Undetermined => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BattleEvent {
    /// A card was deployed at (x, y).
    Deploy {
        t: f32,
        side: Side,
        card: CardId,
        x: f32,
        y: f32,
    },
    /// `side` is the tower's owner; the opposing side scored.
    TowerDestroyed {
        t: f32,
        side: Side,
        tower: TowerKind,
    },
    KingActivated {
        t: f32,
        side: Side,
    },
    OvertimeStarted {
        t: f32,
    },
    BattleEnded {
        t: f32,
        winner: Outcome,
        home_crowns: u8,
        away_crowns: u8,
    },
}

impl BattleEvent {
    /// Battle-clock timestamp of the event.
    pub fn timestamp(&self) -> f32 {
        match self {
            BattleEvent::Deploy { t, .. }
            | BattleEvent::TowerDestroyed { t, .. }
            | BattleEvent::KingActivated { t, .. }
            | BattleEvent::OvertimeStarted { t }
            | BattleEvent::BattleEnded { t, .. } => *t,
        }
    }
}

/// Append-only event collector owned by the engine.
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    events: Vec<BattleEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn take(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = BattleEvent::Deploy {
            t: 12.5,
            side: Side::HOME,
            card: "knight".to_string(),
            x: 100.0,
            y: 500.0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "deploy");
        assert_eq!(json["side"], "home");
        assert_eq!(json["card"], "knight");

        let back: BattleEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_recorder_orders_events() {
        let mut rec = EventRecorder::new();
        rec.record(BattleEvent::OvertimeStarted { t: 180.0 });
        rec.record(BattleEvent::BattleEnded {
            t: 200.0,
            winner: Outcome::Draw,
            home_crowns: 1,
            away_crowns: 1,
        });
        assert_eq!(rec.events().len(), 2);
        assert_eq!(rec.events()[0].timestamp(), 180.0);
        let taken = rec.take();
        assert_eq!(taken.len(), 2);
        assert!(rec.events().is_empty());
    }

    #[test]
    fn test_outcome_winner() {
        assert_eq!(Outcome::Home.winner(), Some(Side::HOME));
        assert_eq!(Outcome::Draw.winner(), None);
        assert_eq!(Outcome::Undetermined.winner(), None);
    }
}
