use crate::config::db::{ConnectionDescriptor, PoolSettings};
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::state::app_state::AppState;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    descriptor: Option<ConnectionDescriptor>,
    pool_settings: PoolSettings,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            descriptor: None,
            pool_settings: PoolSettings::default(),
        }
    }

    pub fn with_db(mut self, descriptor: ConnectionDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    pub fn with_pool_settings(mut self, settings: PoolSettings) -> Self {
        self.pool_settings = settings;
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        if let Some(descriptor) = self.descriptor {
            // single entrypoint: pool + schema
            let conn = bootstrap_db(&descriptor, &self.pool_settings).await?;
            Ok(AppState::new(conn))
        } else {
            Ok(AppState::without_db())
        }
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
