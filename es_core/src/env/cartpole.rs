//! The classic cart and pole balancing task.
//!
//! State is `[x, x_dot, theta, theta_dot]`, action `0` pushes the cart left
//! and `1` pushes it right. Every step the pole stays up is worth `1`, the
//! episode ends once the pole tilts past 12 degrees or the cart leaves the
//! track.

use std::f32::consts::PI;

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{Action, ActionSpace, Environment, StepResult};
use crate::{EsErr, Result};

const GRAVITY: f32 = 9.8;
const MASS_CART: f32 = 1.0;
const MASS_POLE: f32 = 0.1;
const TOTAL_MASS: f32 = MASS_CART + MASS_POLE;
/// Half the pole's length.
const LENGTH: f32 = 0.5;
const POLE_MASS_LENGTH: f32 = MASS_POLE * LENGTH;
const FORCE_MAG: f32 = 10.0;
const TAU: f32 = 0.02;
const THETA_THRESHOLD: f32 = 12.0 * 2.0 * PI / 360.0;
const X_THRESHOLD: f32 = 2.4;

#[derive(Debug)]
pub struct CartPole {
    state: [f32; 4],
    steps: usize,
    max_steps: usize,
    rng: StdRng,
}

impl CartPole {
    /// Creates a new `CartPole` that truncates episodes after `max_steps`.
    pub fn new(max_steps: usize) -> Self {
        Self {
            state: [0.; 4],
            steps: 0,
            max_steps,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Euler integration of the cart-pole dynamics.
    fn physics_step(&mut self, push_right: bool) {
        let [x, x_dot, theta, theta_dot] = self.state;
        let force = if push_right { FORCE_MAG } else { -FORCE_MAG };

        let (sin_theta, cos_theta) = theta.sin_cos();

        let temp = (force + POLE_MASS_LENGTH * theta_dot * theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        let x_dot = x_dot + TAU * x_acc;
        let theta_dot = theta_dot + TAU * theta_acc;
        self.state = [x + TAU * x_dot, x_dot, theta + TAU * theta_dot, theta_dot];
    }

    fn is_terminated(&self) -> bool {
        let [x, _, theta, _] = self.state;
        x.abs() > X_THRESHOLD || theta.abs() > THETA_THRESHOLD
    }
}

impl Environment for CartPole {
    fn reset(&mut self) -> Result<Vec<f32>> {
        self.state = std::array::from_fn(|_| self.rng.random_range(-0.05..0.05));
        self.steps = 0;
        Ok(self.state.to_vec())
    }

    fn step(&mut self, action: &Action) -> Result<StepResult> {
        let push_right = match action {
            Action::Discrete(0) => false,
            Action::Discrete(1) => true,
            other => {
                return Err(EsErr::rollout(format!("invalid cartpole action {other:?}")));
            }
        };

        self.physics_step(push_right);
        self.steps += 1;

        let done = self.is_terminated() || self.steps >= self.max_steps;

        Ok(StepResult {
            observation: self.state.to_vec(),
            reward: 1.0,
            done,
        })
    }

    fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn observation_dim(&self) -> usize {
        4
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(2)
    }

    fn max_episode_steps(&self) -> Option<usize> {
        Some(self.max_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_starts_near_equilibrium() {
        let mut env = CartPole::new(500);
        env.seed(0);

        let obs = env.reset().unwrap();
        assert_eq!(obs.len(), 4);
        assert!(obs.iter().all(|x| x.abs() <= 0.05));
    }

    #[test]
    fn always_pushing_one_way_falls() {
        let mut env = CartPole::new(500);
        env.seed(1);
        env.reset().unwrap();

        let mut steps = 0;
        loop {
            steps += 1;
            let res = env.step(&Action::Discrete(1)).unwrap();
            assert_eq!(res.reward, 1.0);
            if res.done {
                break;
            }
        }

        assert!(steps < 100, "took {steps} steps");
    }

    #[test]
    fn truncates_at_max_steps() {
        let mut env = CartPole::new(3);
        env.seed(2);
        env.reset().unwrap();

        let mut action = 0;
        for _ in 0..2 {
            assert!(!env.step(&Action::Discrete(action)).unwrap().done);
            action = 1 - action;
        }
        assert!(env.step(&Action::Discrete(action)).unwrap().done);
    }

    #[test]
    fn same_seed_same_episode() {
        let mut a = CartPole::new(500);
        let mut b = CartPole::new(500);
        a.seed(9);
        b.seed(9);

        assert_eq!(a.reset().unwrap(), b.reset().unwrap());
    }

    #[test]
    fn rejects_foreign_actions() {
        let mut env = CartPole::new(10);
        env.reset().unwrap();

        assert!(env.step(&Action::Discrete(2)).is_err());
        assert!(env.step(&Action::Continuous(vec![0.5])).is_err());
    }
}
