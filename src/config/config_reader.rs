// ==========================================
// 港口成本比选系统 - 分析配置读取 Trait
// ==========================================
// 职责: 定义引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::analysis_config::{
    AnalysisConfig, ClassificationThresholds, ComparisonConfig, CostModelConfig, PortProfile,
    SensitivityConfig,
};
use crate::config::error::ConfigResult;
use crate::domain::types::Port;
use async_trait::async_trait;

// ==========================================
// AnalysisConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取,缺省取默认值）
#[async_trait]
pub trait AnalysisConfigReader: Send + Sync {
    /// 港口档案（代码 / 名称 / 坐标 / 校正系数 / 固定费用）
    async fn get_port_profile(&self, port: Port) -> ConfigResult<PortProfile>;

    /// 费率 / 区域系数 / 默认目的地
    async fn get_cost_model_config(&self) -> ConfigResult<CostModelConfig>;

    /// 平局默认港口 / 盈亏平衡搜索参数
    async fn get_comparison_config(&self) -> ConfigResult<ComparisonConfig>;

    /// 敏感性网格 / 场景上限
    async fn get_sensitivity_config(&self) -> ConfigResult<SensitivityConfig>;

    /// 分级阈值
    async fn get_thresholds(&self) -> ConfigResult<ClassificationThresholds>;

    /// 组装并校验完整配置
    async fn load_analysis_config(&self) -> ConfigResult<AnalysisConfig> {
        let config = AnalysisConfig {
            port_a: self.get_port_profile(Port::A).await?,
            port_b: self.get_port_profile(Port::B).await?,
            cost_model: self.get_cost_model_config().await?,
            comparison: self.get_comparison_config().await?,
            sensitivity: self.get_sensitivity_config().await?,
            thresholds: self.get_thresholds().await?,
        };
        config.validate()?;
        Ok(config)
    }
}
