//! Per-unit workflows of the three pipeline stages, each fanned out on a shared pool
pub mod climatology;
pub mod counts;
pub mod indices;
