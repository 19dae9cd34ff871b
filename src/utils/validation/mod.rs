//! Validation helpers shared by configuration and the pipeline

pub mod numeric;

pub use numeric::NumericValidator;
