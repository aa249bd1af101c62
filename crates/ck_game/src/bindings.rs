//! Raw key name to logical action table.
//!
//! Keys are identified by the debug name of winit's `KeyCode` (`"ArrowLeft"`,
//! `"KeyR"`, `"Space"`), which keeps the table plain data that can live in
//! the config file. Keys without a binding are dropped here and never reach
//! `InputState`.

use ck_core::input::Action;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    map: HashMap<String, Action>,
}

impl KeyBindings {
    pub fn from_pairs(pairs: &[(&str, Action)]) -> Self {
        Self {
            map: pairs
                .iter()
                .map(|(key, action)| (key.to_string(), *action))
                .collect(),
        }
    }

    pub fn action_for(&self, key_name: &str) -> Option<Action> {
        self.map.get(key_name).copied()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from_pairs(&[
            ("ArrowLeft", Action::MoveLeft),
            ("KeyA", Action::MoveLeft),
            ("ArrowRight", Action::MoveRight),
            ("KeyD", Action::MoveRight),
            ("ArrowUp", Action::Jump),
            ("KeyW", Action::Jump),
            ("Space", Action::Jump),
            ("ArrowDown", Action::Roll),
            ("KeyS", Action::Roll),
            ("KeyR", Action::Reset),
        ])
    }
}

/// Config form: `{ "ArrowLeft": "move_left", ... }`.
impl<'de> Deserialize<'de> for KeyBindings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw: HashMap<String, String> = HashMap::deserialize(deserializer)?;
        let mut map = HashMap::with_capacity(raw.len());
        for (key, action_name) in raw {
            let action = action_name
                .parse::<Action>()
                .map_err(serde::de::Error::custom)?;
            map.insert(key, action);
        }
        Ok(Self { map })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_arrow_keys() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.action_for("ArrowLeft"), Some(Action::MoveLeft));
        assert_eq!(bindings.action_for("ArrowRight"), Some(Action::MoveRight));
        assert_eq!(bindings.action_for("ArrowUp"), Some(Action::Jump));
        assert_eq!(bindings.action_for("ArrowDown"), Some(Action::Roll));
        assert_eq!(bindings.action_for("KeyR"), Some(Action::Reset));
    }

    #[test]
    fn unbound_key_is_filtered() {
        assert_eq!(KeyBindings::default().action_for("F3"), None);
    }

    #[test]
    fn deserializes_from_name_table() {
        let bindings: KeyBindings =
            serde_json::from_str(r#"{ "KeyJ": "jump", "KeyK": "roll" }"#).expect("parse");
        assert_eq!(bindings.action_for("KeyJ"), Some(Action::Jump));
        assert_eq!(bindings.action_for("ArrowUp"), None);
    }

    #[test]
    fn unknown_action_name_is_an_error() {
        let err = serde_json::from_str::<KeyBindings>(r#"{ "KeyJ": "fly" }"#)
            .expect_err("unknown action");
        assert!(err.to_string().contains("unknown action"));
    }
}
