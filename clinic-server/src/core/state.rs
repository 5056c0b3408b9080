use std::path::PathBuf;
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::Config;
use crate::facesim::FaceSimService;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub facesim: FaceSimService,
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    pub fn new(
        config: Config,
        pool: SqlitePool,
        facesim: FaceSimService,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            config,
            pool,
            facesim,
            jwt_service,
        }
    }

    pub async fn initialize(config: &Config) -> Self {
        // 1. Prepare the work directory layout
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory");

        // 2. Initialize DB
        // Use work_dir/clinic.db for database path
        let db_path = config.database_path();
        let db_path_str = db_path.to_string_lossy();

        let db_service = crate::db::DbService::new(&db_path_str)
            .await
            .expect("Failed to initialize database");
        let pool = db_service.pool;

        // 3. Initialize Services
        let facesim = FaceSimService::new(pool.clone(), PathBuf::from(&config.work_dir));
        let jwt_service = Arc::new(JwtService::default());

        Self::new(config.clone(), pool, facesim, jwt_service)
    }

    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
