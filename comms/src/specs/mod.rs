//! Wire-level specifications and records exchanged between the coordinator
//! and the worker nodes.

pub mod env;
pub mod filter;
pub mod policy;
pub mod rollout;
pub mod worker;
