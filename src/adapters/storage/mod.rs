//! File-backed persistence adapters (YAML on disk).

mod file_commission_repository;
mod file_trial_repository;

pub use file_commission_repository::FileCommissionRepository;
pub use file_trial_repository::FileTrialRepository;
