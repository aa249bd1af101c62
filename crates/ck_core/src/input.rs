//! Held-action tracking for the character controller.
//!
//! Raw keys never reach this layer: the binary's key bindings translate them
//! into one of the fixed logical [`Action`]s first. The controller reads the
//! held set once per tick, so hold duration is observed by sampling and there
//! is no debouncing or key-repeat handling here.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
    Roll,
    Reset,
}

impl Action {
    pub const ALL: &'static [Action] = &[
        Action::MoveLeft,
        Action::MoveRight,
        Action::Jump,
        Action::Roll,
        Action::Reset,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::MoveLeft => "move_left",
            Self::MoveRight => "move_right",
            Self::Jump => "jump",
            Self::Roll => "roll",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("unknown action '{s}'"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Action>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
        }
    }

    pub fn press(&mut self, action: Action) {
        self.held.insert(action);
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    /// Replace the whole held set, used by replays that script input per tick.
    pub fn set_held(&mut self, actions: &[Action]) {
        self.held.clear();
        self.held.extend(actions.iter().copied());
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_sets_held() {
        let mut input = InputState::new();
        input.press(Action::Jump);
        assert!(input.is_held(Action::Jump));
        assert!(!input.is_held(Action::Roll));
    }

    #[test]
    fn repeated_press_is_idempotent() {
        let mut input = InputState::new();
        input.press(Action::MoveRight);
        input.press(Action::MoveRight);
        assert_eq!(input.held_count(), 1);
        input.release(Action::MoveRight);
        assert!(!input.is_held(Action::MoveRight));
    }

    #[test]
    fn release_without_press_is_no_op() {
        let mut input = InputState::new();
        input.release(Action::Reset);
        assert!(!input.is_held(Action::Reset));
        assert_eq!(input.held_count(), 0);
    }

    #[test]
    fn multiple_actions_independent() {
        let mut input = InputState::new();
        input.press(Action::MoveLeft);
        input.press(Action::Jump);
        input.release(Action::MoveLeft);
        assert!(!input.is_held(Action::MoveLeft));
        assert!(input.is_held(Action::Jump));
    }

    #[test]
    fn set_held_replaces_previous_set() {
        let mut input = InputState::new();
        input.press(Action::Roll);
        input.set_held(&[Action::MoveRight, Action::Jump]);
        assert!(!input.is_held(Action::Roll));
        assert!(input.is_held(Action::MoveRight));
        assert!(input.is_held(Action::Jump));
    }

    #[test]
    fn action_names_parse_back() {
        for &action in Action::ALL {
            assert_eq!(action.name().parse::<Action>(), Ok(action));
        }
        assert!("fly".parse::<Action>().is_err());
    }
}
