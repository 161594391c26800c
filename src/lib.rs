// ==========================================
// 港口成本比选系统 - 核心库
// ==========================================
// 职责: 两港出口物流成本模型 / 比选 / 盈亏平衡 / 敏感性与稳健性分析
// 技术栈: Rust + SQLite（配置存储）
// 系统定位: 决策支持（引擎同步、无状态;I/O 只在外围）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 分析配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 引擎层 - 成本模型与分析
pub mod engine;

// 距离服务接口（外部协作方）
pub mod distance;

// 导入层 - 起点清单
pub mod importer;

// API 层 - 分析接口
pub mod api;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CargoMode, CostComponent, CriticalityTier, Port, Preference, RobustnessLevel};

// 领域实体
pub use domain::{
    AnalysisEntity, BreakEvenOutcome, ComparisonResult, Coordinate, CostBreakdown, EntityRecord,
    Scenario, ScenarioVariables, SensitivityVariable, Shipment,
};

// 配置
pub use config::{AnalysisConfig, ConfigManager};

// 引擎
pub use engine::{
    BatchEvaluator, ComponentScalingRecalculator, CostModel, CostModelRecalculator, EngineError,
    PortComparator, ScenarioRecalculator, SensitivityEngine,
};

// API
pub use api::{AnalysisApi, AnalysisRequest, AnalysisResponse, ApiError};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "港口成本比选系统";
