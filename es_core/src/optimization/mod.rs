mod adam;
mod optimizer;
mod sgd_momentum;

pub use adam::Adam;
pub use optimizer::Optimizer;
pub use sgd_momentum::SgdMomentum;

use crate::config::OptimizerSpec;

/// Builds the optimizer described by `spec` for `len` parameters.
pub fn build_optimizer(spec: OptimizerSpec, len: usize, stepsize: f32) -> Box<dyn Optimizer> {
    match spec {
        OptimizerSpec::Adam {
            beta1,
            beta2,
            epsilon,
        } => Box::new(Adam::new(len, stepsize, beta1, beta2, epsilon)),
        OptimizerSpec::SgdMomentum { momentum } => {
            Box::new(SgdMomentum::new(len, stepsize, momentum))
        }
    }
}
