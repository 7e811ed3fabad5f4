// File: cleanplate-core/src/verifier/mod.rs

pub mod stub;

pub use cleanplate_common::traits::verifier_traits::{PlateVerdict, PlateVerifier};
pub use stub::StubPlateVerifier;
