pub mod chain;
pub mod effects;
pub mod stages;
