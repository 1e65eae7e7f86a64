pub mod breakdown;
pub mod chain;
pub mod expiry;
pub mod gate;
pub mod policy;
pub mod regime;
