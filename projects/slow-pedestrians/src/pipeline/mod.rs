// Slow pedestrian curation pipeline

pub mod annotation;
pub mod clip;
pub mod orchestrator;
pub mod pair_worker;
pub mod selector;
pub mod speed;
pub mod types;
