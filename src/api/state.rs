use derive_new::new;

use crate::database::Database;

/// Shared handler state.
#[derive(Debug, Clone, new)]
pub struct App {
    pub database: Database,
}
