//! Pure mathematical functions for the hyperdrive pool
//! All functions are deterministic, use 18-decimal fixed point and return
//! `None` instead of panicking, so they are testable in isolation.

pub mod fixed_point;
pub mod hyperdrive_math;
pub mod lp_math;
pub mod yield_space;

pub use fixed_point::*;
pub use hyperdrive_math::*;
pub use lp_math::*;
pub use yield_space::*;
