/// Application layer
///
/// Workflows built on top of the SCM client contract.
pub mod use_cases;
