//! 核心层：错误与恢复

pub mod error;
pub mod recovery;

pub use error::{OrderError, RecoveryAction};
pub use recovery::RecoveryEngine;
