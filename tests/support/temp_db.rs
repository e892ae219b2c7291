use std::sync::Arc;

use scoreline::adapter::outbound::sqlite::{create_pool, run_migrations, SqliteReferenceStore};
use tempfile::TempDir;

/// Migrated SQLite reference store in a temporary directory.
pub struct TempDb {
    _dir: TempDir,
    path: String,
    store: Arc<SqliteReferenceStore>,
}

impl TempDb {
    pub fn create() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir
            .path()
            .join("reference.db")
            .to_string_lossy()
            .into_owned();
        let pool = create_pool(&path, 2).expect("create sqlite pool");
        run_migrations(&pool).expect("run migrations");

        Self {
            _dir: dir,
            path,
            store: Arc::new(SqliteReferenceStore::new(pool)),
        }
    }

    /// Migrated and loaded with the demo catalog.
    pub async fn seeded() -> Self {
        let db = Self::create();
        db.store.seed_demo().await.expect("seed demo catalog");
        db
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn store(&self) -> Arc<SqliteReferenceStore> {
        Arc::clone(&self.store)
    }
}
