// Copyright 2023 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum_macros::{Display, EnumIter};

use crate::Color;

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter)]
pub enum GameMode {
    /// Both sides are played from the same board.
    #[default]
    TwoPlayer,
    /// One side is played by the random-move computer.
    VsComputer,
}

/// Session settings. Missing fields fall back to their defaults when
/// deserializing, so a saved config only needs what it changes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    pub mode: GameMode,
    pub computer_side: Color,
    pub think_delay: Duration,
}

impl GameConfig {
    pub const DEFAULT_THINK_DELAY: Duration = Duration::from_millis(500);

    pub fn two_player() -> Self {
        Self::default()
    }

    pub fn vs_computer(computer_side: Color) -> Self {
        Self {
            mode: GameMode::VsComputer,
            computer_side,
            ..Self::default()
        }
    }

    /// True if the computer is responsible for moving `turn`.
    #[inline]
    pub fn computer_plays(&self, turn: Color) -> bool {
        self.mode == GameMode::VsComputer && self.computer_side == turn
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::TwoPlayer,
            computer_side: Color::Black,
            think_delay: Self::DEFAULT_THINK_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.mode, GameMode::TwoPlayer);
        assert_eq!(config.computer_side, Color::Black);
        assert_eq!(config.think_delay, Duration::from_millis(500));
        assert!(!config.computer_plays(Color::Black));
    }
    #[test]
    fn test_computer_plays_its_side_only() {
        let config = GameConfig::vs_computer(Color::White);
        assert!(config.computer_plays(Color::White));
        assert!(!config.computer_plays(Color::Black));
    }
    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GameConfig = serde_json::from_str(r#"{"mode":"VsComputer"}"#).unwrap();
        assert_eq!(config, GameConfig::vs_computer(Color::Black));
        let config: GameConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GameConfig::two_player());
    }
    #[test]
    fn test_serde_round_trip() {
        let config = GameConfig {
            think_delay: Duration::from_millis(50),
            ..GameConfig::vs_computer(Color::White)
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<GameConfig>(&json).unwrap(), config);
    }
}
