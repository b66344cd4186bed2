pub mod admin_api;
pub mod consts;
pub mod error;
pub mod feed_api;
pub mod listener_api;
pub mod listening_api;
pub mod middleware;

use actix_web::web;
use crate::error::ApiError;
use application::command::listener::ListenerService;
use application::command::listening::ListeningTimeService;
use application::command::milestone::MilestoneRecorder;
use application::command::shared::IdGenerator;
use application::config::{AccrualConfig, FeedConfig};
use application::query::get_leaderboard::GetLeaderboard;
use application::query::get_listener::GetListener;
use application::query::get_milestones::GetMilestones;
use domain::listener::ListenerRepository;
use domain::milestone::MilestoneRepository;
use infra::config::AppConfigImpl;
use infra::id_generator::SnowflakeIdGenerator;
use infra::repository::in_memory::{
    listener::InMemoryListenerRepository, milestone::InMemoryMilestoneRepository,
};
use infra::repository::postgres::command::{
    listener::ListenerRepositoryImpl, milestone::MilestoneRepositoryImpl,
};
use infra::repository::postgres::query::{
    leaderboard::LeaderboardRepositoryImpl, milestone_feed::MilestoneFeedRepositoryImpl,
};
use log::{info, warn};
use model::leaderboard::LeaderboardRepository;
use model::milestone_feed::MilestoneFeedRepository;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Statement};
use std::error::Error;
use std::sync::Arc;

struct Repositories {
    listeners: Arc<dyn ListenerRepository>,
    milestones: Arc<dyn MilestoneRepository>,
    feed: Arc<dyn MilestoneFeedRepository>,
    leaderboard: Arc<dyn LeaderboardRepository>,
}

impl Repositories {
    fn postgres(db: DatabaseConnection) -> Self {
        Self {
            listeners: Arc::new(ListenerRepositoryImpl::new(db.clone())),
            milestones: Arc::new(MilestoneRepositoryImpl::new(db.clone())),
            feed: Arc::new(MilestoneFeedRepositoryImpl::new(db.clone())),
            leaderboard: Arc::new(LeaderboardRepositoryImpl::new(db)),
        }
    }

    fn in_memory() -> Self {
        let listeners = Arc::new(InMemoryListenerRepository::new());
        let milestones = Arc::new(InMemoryMilestoneRepository::new());
        Self {
            listeners: listeners.clone(),
            milestones: milestones.clone(),
            feed: milestones,
            leaderboard: listeners,
        }
    }
}

pub struct AppState {
    pub app_cfg: AppConfigImpl,
    pub listening_service: Arc<ListeningTimeService>,
    pub listener_service: Arc<ListenerService>,
    pub get_listener: GetListener,
    pub get_milestones: GetMilestones,
    pub get_leaderboard: GetLeaderboard,
}

impl AppState {
    pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
        use std::time::Duration;

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(50)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(3))
            .acquire_timeout(Duration::from_secs(8))
            .idle_timeout(Duration::from_secs(60))
            .max_lifetime(Duration::from_secs(300))
            .sqlx_logging(false)
            .sqlx_logging_level(log::LevelFilter::Info);

        let db = Database::connect(opt).await?;

        let backend = DbBackend::Postgres;
        db.execute(Statement::from_string(backend, "SELECT 1".to_owned()))
            .await?;

        info!("Database connection pool initialized successfully");
        Ok(db)
    }

    /// 配置了 `database_url` 时连接 PostgreSQL，否则使用内存存储
    pub async fn new(app_cfg: AppConfigImpl) -> Result<Self, Box<dyn Error>> {
        let database_url = app_cfg.database_url();
        let repos = if database_url.is_empty() {
            warn!("database_url is empty, listening totals are kept in memory only");
            Repositories::in_memory()
        } else {
            Repositories::postgres(Self::init_db(&database_url).await?)
        };

        let id_generator: Arc<dyn IdGenerator> =
            Arc::new(SnowflakeIdGenerator::new(app_cfg.node_id())?);
        let shared_cfg = Arc::new(app_cfg.clone());
        let accrual_cfg: Arc<dyn AccrualConfig> = shared_cfg.clone();
        let feed_cfg: Arc<dyn FeedConfig> = shared_cfg;

        let recorder = Arc::new(MilestoneRecorder::new(repos.milestones, id_generator));
        let listening_service = Arc::new(ListeningTimeService::new(
            repos.listeners.clone(),
            recorder.clone(),
            accrual_cfg,
        ));
        let listener_service = Arc::new(ListenerService::new(repos.listeners.clone(), recorder));

        Ok(Self {
            app_cfg,
            listening_service,
            listener_service,
            get_listener: GetListener::new(repos.listeners),
            get_milestones: GetMilestones::new(repos.feed, feed_cfg.clone()),
            get_leaderboard: GetLeaderboard::new(repos.leaderboard, feed_cfg),
        })
    }
}

pub fn configure_service(svc: &mut web::ServiceConfig) {
    // 提取器失败时同样返回 JSON 错误体
    let json_cfg = web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into());
    let query_cfg = web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into());
    svc.app_data(json_cfg).app_data(query_cfg).service(
        web::scope(consts::URL_PATH_API)
            .service(listening_api::scope())
            .service(listener_api::scope())
            .configure(feed_api::configure_service)
            .configure(admin_api::configure_service),
    );
}
