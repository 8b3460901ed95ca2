//! WebAssembly bindings for the HexHoops rules engine.
//!
//! This module exposes a single match to JavaScript through wasm-bindgen.
//! Everything crosses the boundary as JSON strings.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::actions::GameAction;
#[cfg(feature = "wasm")]
use crate::board::Team;
#[cfg(feature = "wasm")]
use crate::cards::{CardDefinition, Catalog};
#[cfg(feature = "wasm")]
use crate::engine::ActionEngine;
#[cfg(feature = "wasm")]
use crate::game::{GameState, MatchConfig};
#[cfg(feature = "wasm")]
use crate::movement::MovementResolver;
#[cfg(feature = "wasm")]
use crate::targeting::{get_valid_standard_action_targets, StandardActionKind};

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[cfg(feature = "wasm")]
fn parse_json<T: serde::de::DeserializeOwned>(what: &str, json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", what, e)))
}

#[cfg(feature = "wasm")]
fn parse_name<T: serde::de::DeserializeOwned>(what: &str, name: &str) -> Result<T, JsValue> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .map_err(|_| JsValue::from_str(&format!("Unknown {}: {}", what, name)))
}

/// WASM-exposed match wrapper
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmMatch {
    catalog: Catalog,
    state: GameState,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmMatch {
    /// Create a match from a JSON array of card definitions and a match config
    #[wasm_bindgen(constructor)]
    pub fn new(catalog_json: &str, match_json: &str) -> Result<WasmMatch, JsValue> {
        let definitions: Vec<CardDefinition> = parse_json("catalog", catalog_json)?;
        let config: MatchConfig = parse_json("match config", match_json)?;
        let catalog = Catalog::from_definitions(definitions);
        let state = GameState::new(&config, &catalog);
        Ok(WasmMatch { catalog, state })
    }

    /// Get the current match state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        self.state.to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the current phase as a string
    #[wasm_bindgen(js_name = getPhase)]
    pub fn get_phase(&self) -> String {
        serde_json::to_string(&self.state.phase()).unwrap_or_else(|_| "\"unknown\"".to_string())
    }

    #[wasm_bindgen(js_name = getActiveTeam)]
    pub fn get_active_team(&self) -> String {
        self.state.active_team().to_string()
    }

    #[wasm_bindgen(js_name = getScore)]
    pub fn get_score(&self, team: &str) -> Result<u32, JsValue> {
        let team: Team = parse_name("team", team)?;
        Ok(self.state.score(team))
    }

    /// Get board state as JSON (for rendering)
    #[wasm_bindgen(js_name = getBoard)]
    pub fn get_board(&self) -> String {
        serde_json::to_string(&self.state.board.to_json_friendly())
            .unwrap_or_else(|_| "{}".to_string())
    }

    #[wasm_bindgen(js_name = getHand)]
    pub fn get_hand(&self, team: &str) -> Result<String, JsValue> {
        let team: Team = parse_name("team", team)?;
        Ok(serde_json::to_string(self.state.hand(team)).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Get a basketball player as JSON, or "null"
    #[wasm_bindgen(js_name = getPlayer)]
    pub fn get_player(&self, player_id: &str) -> String {
        match self.state.basketball_player(player_id) {
            Some(p) => serde_json::to_string(p).unwrap_or_else(|_| "{}".to_string()),
            None => "null".to_string(),
        }
    }

    /// Positions a player can move to, as a JSON array
    #[wasm_bindgen(js_name = getValidMoves)]
    pub fn get_valid_moves(&self, player_id: &str) -> String {
        let moves = MovementResolver::new(&self.state)
            .with_catalog(&self.catalog)
            .valid_move_positions(player_id)
            .unwrap_or_default();
        serde_json::to_string(&moves).unwrap_or_else(|_| "[]".to_string())
    }

    /// Valid targets of a standard action ("shoot", "block", ...) as JSON
    #[wasm_bindgen(js_name = getValidTargets)]
    pub fn get_valid_targets(&self, actor_id: &str, kind: &str) -> Result<String, JsValue> {
        let kind: StandardActionKind = parse_name("standard action", kind)?;
        let targets = get_valid_standard_action_targets(&self.state, actor_id, kind);
        Ok(serde_json::to_string(&targets).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Apply an action from JSON; returns the logged event JSON, or the
    /// error as JSON
    #[wasm_bindgen(js_name = applyAction)]
    pub fn apply_action(&mut self, action_json: &str) -> Result<String, JsValue> {
        let to_js = |e: crate::game::GameError| {
            JsValue::from_str(&serde_json::to_string(&e).unwrap_or_else(|_| e.to_string()))
        };

        let action = GameAction::from_json(action_json).map_err(to_js)?;
        let next = ActionEngine::new(&self.catalog)
            .apply(&self.state, action)
            .map_err(to_js)?;
        self.state = next;

        let event = self.state.events().last();
        Ok(serde_json::to_string(&event).unwrap_or_else(|_| "null".to_string()))
    }
}
