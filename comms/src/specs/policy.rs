use serde::{Deserialize, Serialize};

/// The specification for the policy backend, resolved once at setup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicySpec {
    /// A single affine map from observations to action outputs.
    #[default]
    Linear,
    /// A feed forward network with `tanh` hidden layers.
    Mlp { hidden: Vec<usize> },
}
