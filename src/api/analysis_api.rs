// ==========================================
// 港口成本比选系统 - 分析 API
// ==========================================
// 职责: 成本计算 / 比选 / 盈亏平衡 / 批量 / 敏感性 / 稳健性
// 入口: 封闭的请求枚举 AnalysisRequest（action + context）
// 红线: 每个操作返回 ApiResult;距离服务错误原样透传
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::dto::{
    rounded_robustness, BatchView, BreakEvenView, ComparisonView, CostBreakdownView,
    OriginComparisonView,
};
use crate::api::error::{ApiError, ApiResult};
use crate::config::analysis_config::AnalysisConfig;
use crate::distance::DistanceProvider;
use crate::domain::coordinate::Coordinate;
use crate::domain::cost::Shipment;
use crate::domain::entity::{AnalysisEntity, EntityRecord, ExcludedEntity};
use crate::domain::sensitivity::{
    CriticalParameters, RobustnessEvaluation, ScenarioVariables, SensitivityAnalysis,
    SensitivityReport, SensitivityVariable,
};
use crate::engine::batch::BatchEvaluator;
use crate::engine::comparator::PortComparator;
use crate::engine::cost_model::CostModel;
use crate::engine::error::EngineError;
use crate::engine::recalc::{ComponentScalingRecalculator, CostModelRecalculator};
use crate::engine::scenario::scenario_count;
use crate::engine::sensitivity::SensitivityEngine;

mod origin;

// ==========================================
// 请求 / 响应
// ==========================================

/// 场景重算策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecalcStrategy {
    /// 按比例缩放已存储的每吨分项成本
    #[default]
    ComponentScaling,
    /// 按路线距离重跑成本模型
    CostModel,
}

/// 分析请求（封闭集合,每个操作一个强类型变体）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "context", rename_all = "snake_case")]
pub enum AnalysisRequest {
    ComputeCost {
        /// "A" / "B" 或港口代码
        port: String,
        distance_km: f64,
        shipment: Shipment,
        #[serde(default)]
        destination: Option<String>,
        #[serde(default)]
        region: Option<String>,
    },
    Compare {
        distance_a_km: f64,
        distance_b_km: f64,
        shipment: Shipment,
        #[serde(default)]
        destination: Option<String>,
        #[serde(default)]
        region: Option<String>,
    },
    BreakEven {
        fixed_distance_b_km: f64,
        shipment: Shipment,
        #[serde(default)]
        precision_km: Option<f64>,
        #[serde(default)]
        destination: Option<String>,
    },
    CompareOrigin {
        origin: Coordinate,
        shipment: Shipment,
        #[serde(default)]
        destination: Option<String>,
        #[serde(default)]
        region: Option<String>,
    },
    EvaluateBatch {
        records: Vec<EntityRecord>,
        #[serde(default)]
        destination: Option<String>,
    },
    AnalyzeSensitivity {
        records: Vec<EntityRecord>,
        #[serde(default)]
        destination: Option<String>,
        /// 为空时使用配置的默认变量网格
        #[serde(default)]
        variables: Option<Vec<SensitivityVariable>>,
        #[serde(default)]
        strategy: RecalcStrategy,
    },
    IdentifyCriticalParameters {
        reports: Vec<SensitivityReport>,
    },
    EvaluateRobustness {
        records: Vec<EntityRecord>,
        #[serde(default)]
        destination: Option<String>,
        #[serde(default)]
        variables: Option<Vec<SensitivityVariable>>,
        #[serde(default)]
        strategy: RecalcStrategy,
    },
    ScenarioCount {
        #[serde(default)]
        variables: Option<Vec<SensitivityVariable>>,
    },
}

impl AnalysisRequest {
    pub fn action(&self) -> &'static str {
        match self {
            AnalysisRequest::ComputeCost { .. } => "compute_cost",
            AnalysisRequest::Compare { .. } => "compare",
            AnalysisRequest::BreakEven { .. } => "break_even",
            AnalysisRequest::CompareOrigin { .. } => "compare_origin",
            AnalysisRequest::EvaluateBatch { .. } => "evaluate_batch",
            AnalysisRequest::AnalyzeSensitivity { .. } => "analyze_sensitivity",
            AnalysisRequest::IdentifyCriticalParameters { .. } => "identify_critical_parameters",
            AnalysisRequest::EvaluateRobustness { .. } => "evaluate_robustness",
            AnalysisRequest::ScenarioCount { .. } => "scenario_count",
        }
    }
}

/// 敏感性分析响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityResponse {
    pub destination: String,
    /// 批量计算阶段被剔除的记录
    pub batch_excluded: Vec<ExcludedEntity>,
    pub analysis: SensitivityAnalysis,
    pub critical: CriticalParameters,
}

/// 稳健性评估响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustnessResponse {
    pub destination: String,
    pub batch_excluded: Vec<ExcludedEntity>,
    pub evaluation: RobustnessEvaluation,
}

/// 场景数预估（运行前告知调用方负载）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioCountView {
    /// None 表示乘积溢出
    pub count: Option<usize>,
    pub limit: Option<usize>,
    pub within_limit: bool,
}

/// 分析响应（与请求变体一一对应）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "result", rename_all = "snake_case")]
pub enum AnalysisResponse {
    ComputeCost(CostBreakdownView),
    Compare(ComparisonView),
    BreakEven(BreakEvenView),
    CompareOrigin(OriginComparisonView),
    EvaluateBatch(BatchView),
    AnalyzeSensitivity(SensitivityResponse),
    IdentifyCriticalParameters(CriticalParameters),
    EvaluateRobustness(RobustnessResponse),
    ScenarioCount(ScenarioCountView),
}

// ==========================================
// AnalysisApi
// ==========================================

/// 分析API
///
/// 配置构造一次后注入;距离服务可选,仅起点比选需要。
pub struct AnalysisApi {
    config: Arc<AnalysisConfig>,
    distance_provider: Option<Arc<dyn DistanceProvider>>,
}

impl AnalysisApi {
    pub fn new(config: Arc<AnalysisConfig>) -> Self {
        Self {
            config,
            distance_provider: None,
        }
    }

    pub fn with_distance_provider(mut self, provider: Arc<dyn DistanceProvider>) -> Self {
        self.distance_provider = Some(provider);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// 分发请求
    #[instrument(skip(self, request), fields(action = request.action()))]
    pub async fn handle(&self, request: AnalysisRequest) -> ApiResult<AnalysisResponse> {
        let response = match request {
            AnalysisRequest::ComputeCost {
                port,
                distance_km,
                shipment,
                destination,
                region,
            } => AnalysisResponse::ComputeCost(self.compute_cost(
                &port,
                distance_km,
                &shipment,
                destination.as_deref(),
                region.as_deref(),
            )?),
            AnalysisRequest::Compare {
                distance_a_km,
                distance_b_km,
                shipment,
                destination,
                region,
            } => AnalysisResponse::Compare(self.compare(
                distance_a_km,
                distance_b_km,
                &shipment,
                destination.as_deref(),
                region.as_deref(),
            )?),
            AnalysisRequest::BreakEven {
                fixed_distance_b_km,
                shipment,
                precision_km,
                destination,
            } => AnalysisResponse::BreakEven(self.break_even(
                fixed_distance_b_km,
                &shipment,
                precision_km,
                destination.as_deref(),
            )?),
            AnalysisRequest::CompareOrigin {
                origin,
                shipment,
                destination,
                region,
            } => AnalysisResponse::CompareOrigin(
                self.compare_origin(&origin, &shipment, destination.as_deref(), region.as_deref())
                    .await?,
            ),
            AnalysisRequest::EvaluateBatch {
                records,
                destination,
            } => AnalysisResponse::EvaluateBatch(
                self.evaluate_batch(&records, destination.as_deref())?,
            ),
            AnalysisRequest::AnalyzeSensitivity {
                records,
                destination,
                variables,
                strategy,
            } => AnalysisResponse::AnalyzeSensitivity(self.analyze_sensitivity(
                &records,
                destination.as_deref(),
                variables,
                strategy,
            )?),
            AnalysisRequest::IdentifyCriticalParameters { reports } => {
                AnalysisResponse::IdentifyCriticalParameters(
                    self.identify_critical_parameters(&reports),
                )
            }
            AnalysisRequest::EvaluateRobustness {
                records,
                destination,
                variables,
                strategy,
            } => AnalysisResponse::EvaluateRobustness(self.evaluate_robustness(
                &records,
                destination.as_deref(),
                variables,
                strategy,
            )?),
            AnalysisRequest::ScenarioCount { variables } => {
                AnalysisResponse::ScenarioCount(self.scenario_count(variables)?)
            }
        };
        Ok(response)
    }

    // ==========================================
    // 成本 / 比选
    // ==========================================

    pub fn compute_cost(
        &self,
        port: &str,
        distance_km: f64,
        shipment: &Shipment,
        destination: Option<&str>,
        region: Option<&str>,
    ) -> ApiResult<CostBreakdownView> {
        let model = self.cost_model(destination)?;
        let port = self.config.resolve_port(port)?;
        let breakdown = model.compute_cost_in_region(port, distance_km, shipment, region)?;
        Ok(CostBreakdownView::from(&breakdown))
    }

    pub fn compare(
        &self,
        distance_a_km: f64,
        distance_b_km: f64,
        shipment: &Shipment,
        destination: Option<&str>,
        region: Option<&str>,
    ) -> ApiResult<ComparisonView> {
        let comparator = PortComparator::new(self.cost_model(destination)?);
        let result = comparator.compare_in_region(distance_a_km, distance_b_km, shipment, region)?;
        Ok(ComparisonView::from(&result))
    }

    /// 盈亏平衡距离（精度为空时取配置值）
    pub fn break_even(
        &self,
        fixed_distance_b_km: f64,
        shipment: &Shipment,
        precision_km: Option<f64>,
        destination: Option<&str>,
    ) -> ApiResult<BreakEvenView> {
        let comparator = PortComparator::new(self.cost_model(destination)?);
        let outcome = match precision_km {
            Some(precision) => {
                comparator.find_break_even_distance(fixed_distance_b_km, shipment, precision)?
            }
            None => comparator.find_break_even_default(fixed_distance_b_km, shipment)?,
        };
        Ok(BreakEvenView::from(&outcome))
    }

    // ==========================================
    // 批量 / 敏感性 / 稳健性
    // ==========================================

    pub fn evaluate_batch(
        &self,
        records: &[EntityRecord],
        destination: Option<&str>,
    ) -> ApiResult<BatchView> {
        let outcome = BatchEvaluator::new(self.config.clone()).evaluate(records, destination)?;
        Ok(BatchView::from_outcome(
            &outcome,
            self.config.thresholds.significance_usd_per_t,
        ))
    }

    pub fn analyze_sensitivity(
        &self,
        records: &[EntityRecord],
        destination: Option<&str>,
        variables: Option<Vec<SensitivityVariable>>,
        strategy: RecalcStrategy,
    ) -> ApiResult<SensitivityResponse> {
        let variables = self.variables(variables)?;
        let model = self.cost_model(destination)?;
        let (entities, batch_excluded) = self.prepare_entities(&model, records)?;

        let engine = self.engine(strategy, &model);
        let analysis = engine.analyze_sensitivity(&entities, &variables)?;
        let critical = engine.identify_critical_parameters(&analysis.reports);

        Ok(SensitivityResponse {
            destination: model.destination().to_string(),
            batch_excluded,
            analysis,
            critical,
        })
    }

    pub fn identify_critical_parameters(&self, reports: &[SensitivityReport]) -> CriticalParameters {
        SensitivityEngine::new(self.config.clone()).identify_critical_parameters(reports)
    }

    pub fn evaluate_robustness(
        &self,
        records: &[EntityRecord],
        destination: Option<&str>,
        variables: Option<Vec<SensitivityVariable>>,
        strategy: RecalcStrategy,
    ) -> ApiResult<RobustnessResponse> {
        let variables = self.variables(variables)?;
        let model = self.cost_model(destination)?;

        // 先做场景数检查,超限时不做任何计算
        let engine = self.engine(strategy, &model);
        engine.robustness_scenario_count(&variables)?;

        let (entities, batch_excluded) = self.prepare_entities(&model, records)?;
        let evaluation = engine.evaluate_robustness(&entities, &variables)?;

        Ok(RobustnessResponse {
            destination: model.destination().to_string(),
            batch_excluded,
            evaluation: rounded_robustness(evaluation),
        })
    }

    pub fn scenario_count(
        &self,
        variables: Option<Vec<SensitivityVariable>>,
    ) -> ApiResult<ScenarioCountView> {
        let variables = self.variables(variables)?;
        let count = scenario_count(&variables);
        let limit = self.config.sensitivity.max_scenarios;
        let within_limit = match (count, limit) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(count), Some(limit)) => count <= limit,
        };
        Ok(ScenarioCountView {
            count,
            limit,
            within_limit,
        })
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn cost_model(&self, destination: Option<&str>) -> ApiResult<CostModel> {
        let model = match destination {
            Some(dest) => CostModel::for_destination(self.config.clone(), dest)?,
            None => CostModel::new(self.config.clone())?,
        };
        Ok(model)
    }

    fn variables(&self, explicit: Option<Vec<SensitivityVariable>>) -> ApiResult<ScenarioVariables> {
        let variables = match explicit {
            Some(variables) => variables,
            None => self.config.default_sensitivity_variables()?,
        };
        Ok(ScenarioVariables::new(variables)?)
    }

    fn engine(&self, strategy: RecalcStrategy, model: &CostModel) -> SensitivityEngine {
        let engine = SensitivityEngine::new(self.config.clone());
        match strategy {
            RecalcStrategy::ComponentScaling => {
                engine.with_recalculator(ComponentScalingRecalculator::new())
            }
            RecalcStrategy::CostModel => {
                engine.with_recalculator(CostModelRecalculator::new(model.clone()))
            }
        }
    }

    /// 记录 → 分析对象（批量阶段的剔除一并返回）
    fn prepare_entities(
        &self,
        model: &CostModel,
        records: &[EntityRecord],
    ) -> ApiResult<(Vec<AnalysisEntity>, Vec<ExcludedEntity>)> {
        if records.is_empty() {
            return Err(ApiError::from(EngineError::NoEntities));
        }
        let outcome = BatchEvaluator::new(self.config.clone())
            .evaluate(records, Some(model.destination()))?;
        Ok((outcome.entities, outcome.excluded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let raw = r#"{
            "action": "compare",
            "context": {
                "distance_a_km": 300,
                "distance_b_km": 450,
                "shipment": { "tonnage_t": 1000 }
            }
        }"#;
        let request: AnalysisRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.action(), "compare");

        let unknown = serde_json::from_str::<AnalysisRequest>(r#"{"action": "delete_all", "context": {}}"#);
        assert!(unknown.is_err());
    }

    #[tokio::test]
    async fn test_handle_compare() {
        let api = AnalysisApi::new(Arc::new(AnalysisConfig::default()));
        let response = api
            .handle(AnalysisRequest::Compare {
                distance_a_km: 300.0,
                distance_b_km: 450.0,
                shipment: Shipment::bulk(1000.0),
                destination: None,
                region: None,
            })
            .await
            .unwrap();

        match response {
            AnalysisResponse::Compare(view) => {
                assert_eq!(view.port_a.total_cost, 81_000.0);
                assert_eq!(view.port_b.total_cost, 101_500.0);
                assert_eq!(view.absolute_difference, 20_500.0);
                assert_eq!(view.percent_difference, 25.31);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_scenario_count_with_limit() {
        let mut config = AnalysisConfig::default();
        config.sensitivity.max_scenarios = Some(10);
        let api = AnalysisApi::new(Arc::new(config));

        // 默认网格: 9 个陆运费率 × 9 个海运乘数
        let view = api.scenario_count(None).unwrap();
        assert_eq!(view.count, Some(81));
        assert!(!view.within_limit);
    }
}
