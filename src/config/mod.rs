// ==========================================
// 港口成本比选系统 - 配置层
// ==========================================
// 职责: 分析配置对象 + config_kv 覆写
// 存储: config_kv 表
// ==========================================

pub mod analysis_config;
pub mod config_manager;
pub mod config_reader;
pub mod error;

// 重导出核心配置类型
pub use analysis_config::{
    AnalysisConfig, ClassificationThresholds, ComparisonConfig, CostModelConfig, FixedCostItem,
    MaritimeTariff, PortProfile, RangeSpec, SensitivityConfig, DEFAULT_REGION_KEY,
    VAR_LAND_TARIFF, VAR_MARITIME_FACTOR,
};
pub use config_manager::{config_keys, ConfigManager};
pub use config_reader::AnalysisConfigReader;
pub use error::{ConfigError, ConfigResult};
