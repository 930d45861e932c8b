//! Signal extractors: UBCF, visit-transition frequency, and menu co-occurrence.
//!
//! Each is a small pure function over the CF model / raw user records rather
//! than a pluggable trait object (unlike `ranking-service`'s `RecallStrategy`
//! trait) — the three signals are fixed and always run together here; see
//! DESIGN.md.

pub mod co;
pub mod ubcf;
pub mod vf;

pub use co::co_scores;
pub use ubcf::ubcf_scores;
pub use vf::vf_scores;
