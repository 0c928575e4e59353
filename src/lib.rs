pub mod clock;
pub mod config;
pub mod normalizer;
pub mod regions;
pub mod clusterer;
pub mod representative;
pub mod rules;
pub mod engine;
pub mod store;
