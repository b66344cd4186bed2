use application::config::{AccrualConfig, FeedConfig};
use config::{Config, Environment, File, FileFormat};
use domain::milestone::{CrossingPolicy, HourLadder, DEFAULT_HOUR_THRESHOLDS};
use dotenvy::dotenv;
use serde::Deserialize;
use std::error::Error;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawConfig {
    /// 为空时使用内存存储
    database_url: String,
    /// 管理接口共享密钥，为空时禁用管理接口
    admin_key: String,
    /// 雪花算法节点ID
    node_id: i64,
    server: RawServerConfig,
    accrual: RawAccrualConfig,
    milestones: RawMilestoneConfig,
    feed: RawFeedConfig,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            database_url: "".to_string(),
            admin_key: "".to_string(),
            node_id: 1,
            server: RawServerConfig::default(),
            accrual: RawAccrualConfig::default(),
            milestones: RawMilestoneConfig::default(),
            feed: RawFeedConfig::default(),
        }
    }
}

/// 服务器配置（原始配置）
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawServerConfig {
    host: String,
    port: u16,
}

impl Default for RawServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5533,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawAccrualConfig {
    /// 单次上报允许的最大秒数，默认一天
    max_report_secs: i64,
}

impl Default for RawAccrualConfig {
    fn default() -> Self {
        Self {
            max_report_secs: 24 * 3600,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawMilestoneConfig {
    thresholds_hours: Vec<i64>,
    /// lowest_only | all_crossed
    policy: String,
}

impl Default for RawMilestoneConfig {
    fn default() -> Self {
        Self {
            thresholds_hours: DEFAULT_HOUR_THRESHOLDS.to_vec(),
            policy: CrossingPolicy::default().name().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawFeedConfig {
    default_limit: u64,
    max_limit: u64,
}

impl Default for RawFeedConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 校验后的应用配置，阈值阶梯与策略在加载时解析，配置错误在启动阶段即失败
#[derive(Debug, Clone)]
pub struct AppConfigImpl {
    database_url: String,
    admin_key: String,
    node_id: i64,
    server: ServerConfig,
    max_report_secs: i64,
    hour_ladder: HourLadder,
    crossing_policy: CrossingPolicy,
    feed_default_limit: u64,
    feed_max_limit: u64,
}

impl AppConfigImpl {
    fn new(data: RawConfig) -> Result<Self, Box<dyn Error>> {
        if data.accrual.max_report_secs <= 0 {
            return Err(format!(
                "accrual.max_report_secs must be positive, got {}",
                data.accrual.max_report_secs
            )
            .into());
        }
        let hour_ladder = HourLadder::new(data.milestones.thresholds_hours)?;
        let crossing_policy: CrossingPolicy = data.milestones.policy.trim().parse()?;
        Ok(AppConfigImpl {
            database_url: data.database_url,
            admin_key: data.admin_key,
            node_id: data.node_id,
            server: ServerConfig {
                host: data.server.host,
                port: data.server.port,
            },
            max_report_secs: data.accrual.max_report_secs,
            hour_ladder,
            crossing_policy,
            feed_default_limit: data.feed.default_limit,
            feed_max_limit: data.feed.max_limit,
        })
    }

    fn environment() -> Environment {
        Environment::with_prefix("APP")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("milestones.thresholds_hours")
            .try_parsing(true)
    }

    /// `config.toml`（可选）+ `APP__*` 环境变量
    pub fn load() -> Result<AppConfigImpl, Box<dyn Error>> {
        dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Self::environment())
            .build()?;

        let raw: RawConfig = config.try_deserialize()?; // serde 自动填充默认值
        AppConfigImpl::new(raw)
    }

    pub fn from_toml_str(toml: &str) -> Result<AppConfigImpl, Box<dyn Error>> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        AppConfigImpl::new(config.try_deserialize()?)
    }

    pub fn database_url(&self) -> String {
        self.database_url.clone()
    }

    pub fn admin_key(&self) -> String {
        self.admin_key.clone()
    }

    pub fn node_id(&self) -> i64 {
        self.node_id
    }

    pub fn server(&self) -> ServerConfig {
        self.server.clone()
    }
}

impl Default for AppConfigImpl {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            admin_key: String::new(),
            node_id: 1,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5533,
            },
            max_report_secs: 24 * 3600,
            hour_ladder: HourLadder::default(),
            crossing_policy: CrossingPolicy::default(),
            feed_default_limit: 20,
            feed_max_limit: 100,
        }
    }
}

impl AccrualConfig for AppConfigImpl {
    fn max_report_secs(&self) -> i64 {
        self.max_report_secs
    }

    fn hour_ladder(&self) -> HourLadder {
        self.hour_ladder.clone()
    }

    fn crossing_policy(&self) -> CrossingPolicy {
        self.crossing_policy
    }
}

impl FeedConfig for AppConfigImpl {
    fn default_limit(&self) -> u64 {
        self.feed_default_limit
    }

    fn max_limit(&self) -> u64 {
        self.feed_max_limit
    }
}
