use sea_orm::DatabaseConnection;

/// Application state containing shared resources
#[derive(Debug, Clone)]
pub struct AppState {
    /// Shared pool handle (absent for tests that never touch the store)
    db: Option<DatabaseConnection>,
}

impl AppState {
    /// Create a new AppState around the shared pool
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db: Some(db) }
    }

    /// Create a new AppState without a database connection
    pub fn without_db() -> Self {
        Self { db: None }
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }
}
