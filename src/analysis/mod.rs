pub mod fingerprint;
pub mod spectrum;
