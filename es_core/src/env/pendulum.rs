//! Swing-up of a frictionless pendulum.
//!
//! The observation is `[cos(theta), sin(theta), theta_dot]` and the single
//! continuous action is a torque in `[-2, 2]`. Rewards are never positive
//! and the episode only ends by truncation.

use std::f32::consts::PI;

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{Action, ActionSpace, Environment, StepResult};
use crate::{EsErr, Result};

const MAX_SPEED: f32 = 8.0;
const MAX_TORQUE: f32 = 2.0;
const DT: f32 = 0.05;
const G: f32 = 10.0;
const MASS: f32 = 1.0;
const LENGTH: f32 = 1.0;

#[derive(Debug)]
pub struct Pendulum {
    theta: f32,
    theta_dot: f32,
    steps: usize,
    max_steps: usize,
    rng: StdRng,
}

impl Pendulum {
    /// Creates a new `Pendulum` that truncates episodes after `max_steps`.
    pub fn new(max_steps: usize) -> Self {
        Self {
            theta: 0.,
            theta_dot: 0.,
            steps: 0,
            max_steps,
            rng: StdRng::from_os_rng(),
        }
    }

    fn observation(&self) -> Vec<f32> {
        let (sin, cos) = self.theta.sin_cos();
        vec![cos, sin, self.theta_dot]
    }
}

/// Wraps an angle into `[-pi, pi)`.
fn angle_normalize(x: f32) -> f32 {
    (x + PI).rem_euclid(2. * PI) - PI
}

impl Environment for Pendulum {
    fn reset(&mut self) -> Result<Vec<f32>> {
        self.theta = self.rng.random_range(-PI..PI);
        self.theta_dot = self.rng.random_range(-1.0..1.0);
        self.steps = 0;
        Ok(self.observation())
    }

    fn step(&mut self, action: &Action) -> Result<StepResult> {
        let u = match action {
            Action::Continuous(u) if u.len() == 1 => u[0].clamp(-MAX_TORQUE, MAX_TORQUE),
            other => {
                return Err(EsErr::rollout(format!("invalid pendulum action {other:?}")));
            }
        };

        let th = self.theta;
        let th_dot = self.theta_dot;
        let cost = angle_normalize(th).powi(2) + 0.1 * th_dot.powi(2) + 0.001 * u.powi(2);

        let th_dot = th_dot
            + (3. * G / (2. * LENGTH) * th.sin() + 3. / (MASS * LENGTH * LENGTH) * u) * DT;
        self.theta_dot = th_dot.clamp(-MAX_SPEED, MAX_SPEED);
        self.theta = th + self.theta_dot * DT;
        self.steps += 1;

        Ok(StepResult {
            observation: self.observation(),
            reward: -cost,
            done: self.steps >= self.max_steps,
        })
    }

    fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn observation_dim(&self) -> usize {
        3
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Continuous {
            low: vec![-MAX_TORQUE],
            high: vec![MAX_TORQUE],
        }
    }

    fn max_episode_steps(&self) -> Option<usize> {
        Some(self.max_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewards_are_never_positive() {
        let mut env = Pendulum::new(50);
        env.seed(4);
        env.reset().unwrap();

        for step in 1..=50 {
            let res = env.step(&Action::Continuous(vec![1.5])).unwrap();
            assert!(res.reward <= 0.);
            assert!(res.observation[2].abs() <= MAX_SPEED);
            assert_eq!(res.done, step == 50);
        }
    }

    #[test]
    fn upright_and_still_costs_nothing() {
        let mut env = Pendulum::new(10);
        env.theta = 0.;
        env.theta_dot = 0.;

        let res = env.step(&Action::Continuous(vec![0.])).unwrap();
        assert_eq!(res.reward, 0.);
    }

    #[test]
    fn angles_wrap() {
        assert!((angle_normalize(3. * PI / 2.) + PI / 2.).abs() < 1e-5);
        assert!((angle_normalize(0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn rejects_discrete_actions() {
        let mut env = Pendulum::new(10);
        env.reset().unwrap();
        assert!(env.step(&Action::Discrete(0)).is_err());
    }
}
