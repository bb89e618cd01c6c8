pub mod domain;
pub mod threshold;
