use serde::{Deserialize, Serialize};

/// Optimizer diagnostics of an iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInfo {
    /// Squared norm of the new parameters.
    pub weights_norm: f32,
    /// Squared norm of the estimated gradient.
    pub grad_norm: f32,
    pub update_ratio: f32,
    pub episodes_this_iter: usize,
    pub episodes_so_far: usize,
}

/// What a single training iteration achieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationReport {
    /// Mean of the last `report_length` evaluation means, `None` before the first evaluation.
    pub episode_reward_mean: Option<f32>,
    /// Mean length of this iteration's evaluation episodes.
    pub episode_len_mean: Option<f32>,
    pub timesteps_this_iter: usize,
    pub timesteps_total: usize,
    pub info: ReportInfo,
}

pub(crate) fn mean<T: Copy + Into<f64>>(values: &[T]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    let sum: f64 = values.iter().map(|&x| x.into()).sum();
    Some((sum / values.len() as f64) as f32)
}

pub(crate) fn squared_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(mean::<f32>(&[]), None);
        assert_eq!(mean(&[1.0f32, 2.0, 6.0]), Some(3.0));
    }

    #[test]
    fn report_serializes_missing_means_as_null() {
        let report = IterationReport {
            episode_reward_mean: None,
            episode_len_mean: Some(10.),
            timesteps_this_iter: 4,
            timesteps_total: 8,
            info: ReportInfo {
                weights_norm: 1.,
                grad_norm: 0.5,
                update_ratio: 0.1,
                episodes_this_iter: 2,
                episodes_so_far: 4,
            },
        };

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["episode_reward_mean"].is_null());
        assert_eq!(json["info"]["episodes_so_far"], 4);
    }
}
