// ==========================================
// 港口成本比选系统 - 展示层数据视图
// ==========================================
// 职责: 引擎结果 → 渲染用视图（金额保留 2 位小数）
// 红线: 只在此处四舍五入,引擎内部保持全精度
// ==========================================

use crate::distance::RouteDistance;
use crate::domain::coordinate::Coordinate;
use crate::domain::cost::{BreakEvenOutcome, ComparisonResult, CostBreakdown};
use crate::domain::entity::{AnalysisEntity, ExcludedEntity};
use crate::domain::sensitivity::RobustnessEvaluation;
use crate::domain::types::{Port, Preference};
use crate::engine::batch::{BatchOutcome, BatchStats};
use serde::{Deserialize, Serialize};

/// 金额四舍五入到分
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ==========================================
// 单港成本视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdownView {
    pub port: Port,
    pub distance_km: f64,
    pub adjusted_distance_km: f64,
    pub tonnage_t: f64,
    pub land_freight: f64,
    pub maritime_freight: f64,
    pub fixed_costs: f64,
    pub total_cost: f64,
    pub unit_cost: f64,
}

impl From<&CostBreakdown> for CostBreakdownView {
    fn from(b: &CostBreakdown) -> Self {
        Self {
            port: b.port,
            distance_km: round2(b.distance_km),
            adjusted_distance_km: round2(b.adjusted_distance_km),
            tonnage_t: b.tonnage_t,
            land_freight: round2(b.land_freight),
            maritime_freight: round2(b.maritime_freight),
            fixed_costs: round2(b.fixed_costs),
            total_cost: round2(b.total_cost),
            unit_cost: round2(b.unit_cost),
        }
    }
}

// ==========================================
// 比选视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonView {
    pub port_a: CostBreakdownView,
    pub port_b: CostBreakdownView,
    pub absolute_difference: f64,
    pub percent_difference: f64,
    pub optimal_port: Port,
    pub tie: bool,
}

impl From<&ComparisonResult> for ComparisonView {
    fn from(r: &ComparisonResult) -> Self {
        Self {
            port_a: CostBreakdownView::from(&r.port_a),
            port_b: CostBreakdownView::from(&r.port_b),
            absolute_difference: round2(r.absolute_difference),
            percent_difference: round2(r.percent_difference),
            optimal_port: r.optimal_port,
            tie: r.tie,
        }
    }
}

// ==========================================
// 盈亏平衡视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakEvenView {
    /// None 表示区间内不存在平衡点
    pub distance_km: Option<f64>,
    pub iterations: Option<u32>,
    pub always_cheaper: Option<Port>,
    pub reason: Option<String>,
    pub comparison: ComparisonView,
}

impl From<&BreakEvenOutcome> for BreakEvenView {
    fn from(outcome: &BreakEvenOutcome) -> Self {
        match outcome {
            BreakEvenOutcome::Found {
                distance_km,
                iterations,
                comparison,
            } => Self {
                distance_km: Some(round2(*distance_km)),
                iterations: Some(*iterations),
                always_cheaper: None,
                reason: None,
                comparison: ComparisonView::from(comparison),
            },
            BreakEvenOutcome::NoBreakEven {
                always_cheaper,
                reason,
                reference,
            } => Self {
                distance_km: None,
                iterations: None,
                always_cheaper: Some(*always_cheaper),
                reason: Some(reason.clone()),
                comparison: ComparisonView::from(reference),
            },
        }
    }
}

// ==========================================
// 起点比选视图（含距离服务返回的路线）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginComparisonView {
    pub origin: Coordinate,
    pub destination: String,
    pub route_a: RouteDistance,
    pub route_b: RouteDistance,
    pub comparison: ComparisonView,
}

// ==========================================
// 批量比选视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: String,
    pub name: String,
    pub region: Option<String>,
    pub volume_t: f64,
    /// 每吨总成本
    pub port_a_unit_cost: f64,
    pub port_b_unit_cost: f64,
    pub differential: f64,
    pub preference: Preference,
    pub annual_savings: f64,
}

impl EntityView {
    pub fn from_entity(entity: &AnalysisEntity, significance_threshold: f64) -> Self {
        Self {
            id: entity.id.clone(),
            name: entity.display_name().to_string(),
            region: entity.region.clone(),
            volume_t: entity.volume_t,
            port_a_unit_cost: round2(entity.costs.port_a.total()),
            port_b_unit_cost: round2(entity.costs.port_b.total()),
            differential: round2(entity.costs.differential()),
            preference: entity.costs.preference(significance_threshold),
            annual_savings: round2(entity.annual_savings()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchView {
    pub destination: String,
    pub entities: Vec<EntityView>,
    pub excluded: Vec<ExcludedEntity>,
    pub stats: BatchStats,
}

impl BatchView {
    pub fn from_outcome(outcome: &BatchOutcome, significance_threshold: f64) -> Self {
        let stats = &outcome.stats;
        Self {
            destination: outcome.destination.clone(),
            entities: outcome
                .entities
                .iter()
                .map(|e| EntityView::from_entity(e, significance_threshold))
                .collect(),
            excluded: outcome.excluded.clone(),
            stats: BatchStats {
                min_differential: round2(stats.min_differential),
                max_differential: round2(stats.max_differential),
                total_annual_savings: round2(stats.total_annual_savings),
                ..stats.clone()
            },
        }
    }
}

/// 稳健性结果中的金额取整（比例保持原值）
pub fn rounded_robustness(mut evaluation: RobustnessEvaluation) -> RobustnessEvaluation {
    for report in &mut evaluation.reports {
        report.original_savings = round2(report.original_savings);
        for adverse in &mut report.adverse_scenarios {
            adverse.new_savings = round2(adverse.new_savings);
        }
    }
    evaluation
}
