//! Switch inputs, indicator outputs, and task spawning.

pub mod indicator;
pub mod switch;
pub mod task_pin;
