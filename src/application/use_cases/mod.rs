pub mod detect_changes;

pub use detect_changes::{BuildScope, ChangeTarget, DetectChangesConfig, DetectChangesUseCase};
