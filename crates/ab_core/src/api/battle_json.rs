//! JSON battle API.
//!
//! String-in/string-out wrapper over the engine for host integrations
//! (game shells, tooling, servers): a request selects seed, decks and
//! agent difficulties; the response carries the result and the full
//! event log. Both sides are agent-driven here — interactive play goes
//! through [`crate::engine::BattleEngine`] directly.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::CardId;
use crate::engine::{BattleEngine, BattleEvent, BattlePlan, Difficulty, Outcome};
use crate::error::{BattleError, Result};

#[derive(Debug, Deserialize)]
pub struct BattleRequest {
    pub schema_version: u8,
    pub seed: u64,
    /// Defaults to the catalog's default deck.
    #[serde(default)]
    pub home_deck: Option<Vec<CardId>>,
    #[serde(default)]
    pub away_deck: Option<Vec<CardId>>,
    /// "easy" | "normal" | "hard"; defaults to "normal".
    #[serde(default)]
    pub home_difficulty: Option<String>,
    #[serde(default)]
    pub away_difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BattleResponse {
    pub schema_version: u8,
    pub winner: Outcome,
    pub home_crowns: u8,
    pub away_crowns: u8,
    pub duration_sec: f32,
    pub overtime: bool,
    pub home_trophies: i32,
    pub away_trophies: i32,
    pub events: Vec<BattleEvent>,
}

/// Run a fully automated battle described by `request`.
pub fn simulate_battle(request: &BattleRequest) -> Result<BattleResponse> {
    if request.schema_version != crate::SCHEMA_VERSION {
        return Err(BattleError::UnsupportedSchema {
            found: request.schema_version,
        });
    }
    let parse = |raw: &Option<String>| -> Result<Difficulty> {
        match raw.as_deref() {
            Some(s) => Difficulty::from_str(s),
            None => Ok(Difficulty::Normal),
        }
    };
    let mut plan = BattlePlan::agent_match(
        request.seed,
        parse(&request.home_difficulty)?,
        parse(&request.away_difficulty)?,
    );
    if let Some(deck) = &request.home_deck {
        plan.home_deck = deck.clone();
    }
    if let Some(deck) = &request.away_deck {
        plan.away_deck = deck.clone();
    }

    let mut engine = BattleEngine::new(plan)?;
    let result = engine.run_to_completion();
    Ok(BattleResponse {
        schema_version: crate::SCHEMA_VERSION,
        winner: result.winner,
        home_crowns: result.home_crowns,
        away_crowns: result.away_crowns,
        duration_sec: result.duration,
        overtime: result.overtime,
        home_trophies: result.home_trophies,
        away_trophies: result.away_trophies,
        events: result.events,
    })
}

/// JSON string front for [`simulate_battle`].
pub fn simulate_battle_json(input: &str) -> Result<String> {
    let request: BattleRequest = serde_json::from_str(input)?;
    let response = simulate_battle(&request)?;
    Ok(serde_json::to_string(&response)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_version_checked() {
        let request = json!({ "schema_version": 99, "seed": 1 }).to_string();
        assert!(matches!(
            simulate_battle_json(&request),
            Err(BattleError::UnsupportedSchema { found: 99 })
        ));
    }

    #[test]
    fn test_unknown_difficulty_rejected() {
        let request = json!({
            "schema_version": 1,
            "seed": 1,
            "away_difficulty": "brutal"
        })
        .to_string();
        assert!(matches!(
            simulate_battle_json(&request),
            Err(BattleError::UnknownDifficulty(d)) if d == "brutal"
        ));
    }

    #[test]
    fn test_battle_response_shape() {
        let request = json!({
            "schema_version": 1,
            "seed": 42,
            "home_difficulty": "normal",
            "away_difficulty": "hard"
        })
        .to_string();
        let raw = simulate_battle_json(&request).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["schema_version"], 1);
        assert!(parsed["home_crowns"].is_number());
        assert!(parsed["away_crowns"].is_number());
        assert!(parsed["duration_sec"].as_f64().unwrap() > 0.0);
        assert!(parsed["events"].is_array());
        let winner = parsed["winner"].as_str().unwrap();
        assert!(["home", "away", "draw"].contains(&winner), "unexpected winner: {winner}");
    }
}
