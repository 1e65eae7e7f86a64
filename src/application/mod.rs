pub mod blueprint;
pub mod context_builder;
pub mod drift;
pub mod hv;
pub mod probe;
pub mod safety;
pub mod scan;
pub mod scoring;
pub mod sniper;
pub mod strategies;
pub mod term_structure;
