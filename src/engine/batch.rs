// ==========================================
// 港口成本比选系统 - 批量比选（产区 / 企业）
// ==========================================
// 职责: EntityRecord → AnalysisEntity（每吨分项成本）+ 汇总统计
// 红线: 单条记录失败只剔除该记录并计数,不中断批次
// ==========================================

use crate::config::analysis_config::AnalysisConfig;
use crate::domain::cost::Shipment;
use crate::domain::entity::{AnalysisEntity, EntityCosts, EntityRecord, EntityRoute, ExcludedEntity};
use crate::domain::sensitivity::ComponentFactors;
use crate::domain::types::{Port, Preference};
use crate::engine::cost_model::CostModel;
use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// BatchOutcome - 批量比选结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub destination: String,
    pub entities: Vec<AnalysisEntity>,
    pub excluded: Vec<ExcludedEntity>,
    pub stats: BatchStats,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub evaluated: usize,
    pub excluded: usize,
    /// 差值（A - B, USD/t）最小值,无对象时为 0
    pub min_differential: f64,
    pub max_differential: f64,
    /// 按死区分类的偏好计数
    pub port_a_preferred: usize,
    pub port_b_preferred: usize,
    pub indifferent: usize,
    /// 全部对象年节省额之和
    pub total_annual_savings: f64,
}

// ==========================================
// BatchEvaluator - 批量比选器
// ==========================================
pub struct BatchEvaluator {
    config: Arc<AnalysisConfig>,
}

impl BatchEvaluator {
    pub fn new(config: Arc<AnalysisConfig>) -> Self {
        Self { config }
    }

    /// 批量计算
    ///
    /// 记录需带有到两个港口的预取距离;缺距离 / 运量非法的记录被剔除。
    ///
    /// # 参数
    /// - destination: 目的地键,None 时取配置的默认目的地
    ///
    /// # 错误
    /// - UnknownDestination: 目的地未配置（整批拒绝）
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn evaluate(
        &self,
        records: &[EntityRecord],
        destination: Option<&str>,
    ) -> EngineResult<BatchOutcome> {
        let model = match destination {
            Some(dest) => CostModel::for_destination(self.config.clone(), dest)?,
            None => CostModel::new(self.config.clone())?,
        };

        let mut entities = Vec::with_capacity(records.len());
        let mut excluded = Vec::new();

        for record in records {
            match Self::evaluate_record(&model, record) {
                Ok(entity) => entities.push(entity),
                Err(err) => {
                    tracing::warn!(entity_id = %record.id, error = %err, "记录计算失败,已剔除");
                    excluded.push(ExcludedEntity::from_error(&record.id, &err));
                }
            }
        }

        let stats = self.stats(&entities, excluded.len());
        tracing::info!(
            destination = model.destination(),
            evaluated = stats.evaluated,
            excluded = stats.excluded,
            total_annual_savings = stats.total_annual_savings,
            "批量比选完成"
        );

        Ok(BatchOutcome {
            destination: model.destination().to_string(),
            entities,
            excluded,
            stats,
        })
    }

    /// 单条记录计算
    ///
    /// # 错误
    /// - InvalidTonnage: 年运量 ≤ 0
    /// - MissingRoute: 缺少任一港口的距离
    /// - InvalidDistance / InvalidCoordinate: 距离或坐标非法
    pub fn evaluate_record(model: &CostModel, record: &EntityRecord) -> EngineResult<AnalysisEntity> {
        let route = match (record.distance_a_km, record.distance_b_km) {
            (Some(distance_a_km), Some(distance_b_km)) => EntityRoute {
                distance_a_km,
                distance_b_km,
            },
            _ => {
                return Err(EngineError::MissingRoute {
                    entity_id: record.id.clone(),
                })
            }
        };
        if let Some(origin) = &record.origin {
            origin.validate()?;
        }

        let shipment = Shipment::bulk(record.volume_t);
        let region = record.region.as_deref();
        let identity = ComponentFactors::default();
        let costs = EntityCosts {
            port_a: model.unit_costs(Port::A, route.distance_a_km, &shipment, region, &identity)?,
            port_b: model.unit_costs(Port::B, route.distance_b_km, &shipment, region, &identity)?,
        };

        Ok(AnalysisEntity {
            id: record.id.clone(),
            name: record.name.clone(),
            region: record.region.clone(),
            volume_t: record.volume_t,
            route: Some(route),
            costs,
        })
    }

    fn stats(&self, entities: &[AnalysisEntity], excluded: usize) -> BatchStats {
        let threshold = self.config.thresholds.significance_usd_per_t;
        let mut stats = BatchStats {
            evaluated: entities.len(),
            excluded,
            ..BatchStats::default()
        };

        let mut min_differential = f64::INFINITY;
        let mut max_differential = f64::NEG_INFINITY;
        for entity in entities {
            let differential = entity.costs.differential();
            min_differential = min_differential.min(differential);
            max_differential = max_differential.max(differential);
            match entity.costs.preference(threshold) {
                Preference::PortA => stats.port_a_preferred += 1,
                Preference::PortB => stats.port_b_preferred += 1,
                Preference::Indifferent => stats.indifferent += 1,
            }
            stats.total_annual_savings += entity.annual_savings();
        }

        if !entities.is_empty() {
            stats.min_differential = min_differential;
            stats.max_differential = max_differential;
        }
        stats
    }
}
