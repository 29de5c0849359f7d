use serde::{Deserialize, Serialize};

/// The specification for the environment every worker builds locally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvSpec {
    /// Balance a pole on a cart, two discrete actions.
    CartPole { max_steps: usize },
    /// Swing up and hold an inverted pendulum, one continuous action.
    Pendulum { max_steps: usize },
}

impl Default for EnvSpec {
    fn default() -> Self {
        Self::CartPole { max_steps: 500 }
    }
}
