// ==========================================
// 港口成本比选系统 - 双港比选器
// ==========================================
// 职责: 双港成本差值 / 百分比差 / 最优港口 / 盈亏平衡距离
// 红线: 任一侧成本计算失败即整体失败,不返回部分结果
// 红线: 总成本完全相等时由配置的默认港口决定
// ==========================================

use crate::domain::cost::{BreakEvenOutcome, ComparisonResult, CostBreakdown, Shipment};
use crate::domain::types::Port;
use crate::engine::cost_model::CostModel;
use crate::engine::error::{ensure_finite, EngineError, EngineResult};
use crate::i18n;
use tracing::instrument;

/// 二分迭代次数上限（f64 在任意区间内收敛到相邻浮点数所需次数的上界）
const MAX_BISECTION_ITERATIONS: u32 = 200;

// ==========================================
// PortComparator - 双港比选器
// ==========================================
#[derive(Debug, Clone)]
pub struct PortComparator {
    model: CostModel,
}

impl PortComparator {
    pub fn new(model: CostModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &CostModel {
        &self.model
    }

    fn tie_break(&self) -> Port {
        self.model.config().comparison.tie_break_port
    }

    // ==========================================
    // 比选
    // ==========================================

    /// 比选两个港口
    ///
    /// # 参数
    /// - distance_a_km: 到港口A的陆运距离
    /// - distance_b_km: 到港口B的陆运距离
    pub fn compare(
        &self,
        distance_a_km: f64,
        distance_b_km: f64,
        shipment: &Shipment,
    ) -> EngineResult<ComparisonResult> {
        let port_a = self.model.compute_cost(Port::A, distance_a_km, shipment)?;
        let port_b = self.model.compute_cost(Port::B, distance_b_km, shipment)?;
        self.assemble(port_a, port_b)
    }

    /// 比选两个港口,叠加区域路线校正系数
    pub fn compare_in_region(
        &self,
        distance_a_km: f64,
        distance_b_km: f64,
        shipment: &Shipment,
        region: Option<&str>,
    ) -> EngineResult<ComparisonResult> {
        let port_a = self
            .model
            .compute_cost_in_region(Port::A, distance_a_km, shipment, region)?;
        let port_b = self
            .model
            .compute_cost_in_region(Port::B, distance_b_km, shipment, region)?;
        self.assemble(port_a, port_b)
    }

    fn assemble(
        &self,
        port_a: CostBreakdown,
        port_b: CostBreakdown,
    ) -> EngineResult<ComparisonResult> {
        let absolute_difference = (port_b.total_cost - port_a.total_cost).abs();
        let min_total = port_a.total_cost.min(port_b.total_cost);

        let percent_difference = if absolute_difference == 0.0 {
            0.0
        } else if min_total <= 0.0 {
            tracing::error!(
                total_a = port_a.total_cost,
                total_b = port_b.total_cost,
                "较低一侧总成本为 0,百分比差无定义"
            );
            return Err(EngineError::Computation(
                "较低一侧总成本为 0,无法计算百分比差".to_string(),
            ));
        } else {
            ensure_finite(absolute_difference / min_total * 100.0, "百分比差")?
        };

        let (optimal_port, tie) = if port_a.total_cost < port_b.total_cost {
            (Port::A, false)
        } else if port_b.total_cost < port_a.total_cost {
            (Port::B, false)
        } else {
            (self.tie_break(), true)
        };

        Ok(ComparisonResult {
            port_a,
            port_b,
            absolute_difference,
            percent_difference,
            optimal_port,
            tie,
        })
    }

    // ==========================================
    // 盈亏平衡距离
    // ==========================================

    /// 求到港口A的盈亏平衡距离（港口B距离固定）
    ///
    /// 搜索区间 [0, break_even_max_km]:
    /// - 距离 0 时 B 已更优 → B 始终更优
    /// - 距离上界时 A 仍更优 → A 始终更优
    /// - 否则二分,按中点的最优港口收缩区间,直到区间宽度 ≤ precision_km
    ///
    /// # 错误
    /// - InvalidPrecision: 精度 ≤ 0 或非有限数
    /// - 成本模型的输入错误原样返回
    #[instrument(skip(self, shipment), fields(tonnage = shipment.tonnage_t))]
    pub fn find_break_even_distance(
        &self,
        fixed_distance_b_km: f64,
        shipment: &Shipment,
        precision_km: f64,
    ) -> EngineResult<BreakEvenOutcome> {
        if !precision_km.is_finite() || precision_km <= 0.0 {
            return Err(EngineError::InvalidPrecision(precision_km));
        }
        let max_km = self.model.config().comparison.break_even_max_km;

        let at_origin = self.compare(0.0, fixed_distance_b_km, shipment)?;
        if at_origin.optimal_port == Port::B {
            tracing::debug!("距离 0 时港口B已更优,不存在平衡点");
            return Ok(self.no_break_even(Port::B, at_origin));
        }

        let at_limit = self.compare(max_km, fixed_distance_b_km, shipment)?;
        if at_limit.optimal_port == Port::A {
            tracing::debug!(max_km, "搜索上界处港口A仍更优,不存在平衡点");
            return Ok(self.no_break_even(Port::A, at_limit));
        }

        let mut low = 0.0_f64;
        let mut high = max_km;
        let mut iterations = 0_u32;
        while high - low > precision_km && iterations < MAX_BISECTION_ITERATIONS {
            let mid = low + (high - low) / 2.0;
            if mid <= low || mid >= high {
                break;
            }
            iterations += 1;

            let result = self.compare(mid, fixed_distance_b_km, shipment)?;
            if result.optimal_port == Port::A {
                low = mid;
            } else {
                high = mid;
            }
            tracing::debug!(iterations, low, high, "二分收缩");
        }

        let distance_km = low + (high - low) / 2.0;
        let comparison = self.compare(distance_km, fixed_distance_b_km, shipment)?;
        tracing::info!(distance_km, iterations, "盈亏平衡距离求解完成");

        Ok(BreakEvenOutcome::Found {
            distance_km,
            iterations,
            comparison,
        })
    }

    /// 使用配置的默认精度求盈亏平衡距离
    pub fn find_break_even_default(
        &self,
        fixed_distance_b_km: f64,
        shipment: &Shipment,
    ) -> EngineResult<BreakEvenOutcome> {
        let precision = self.model.config().comparison.break_even_precision_km;
        self.find_break_even_distance(fixed_distance_b_km, shipment, precision)
    }

    fn no_break_even(&self, always_cheaper: Port, reference: ComparisonResult) -> BreakEvenOutcome {
        let port_name = self.model.config().port(always_cheaper).name.as_str();
        BreakEvenOutcome::NoBreakEven {
            always_cheaper,
            reason: i18n::t_with_args("break_even.always_cheaper", &[("port", port_name)]),
            reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::analysis_config::AnalysisConfig;
    use std::sync::Arc;

    fn comparator(config: AnalysisConfig) -> PortComparator {
        PortComparator::new(CostModel::new(Arc::new(config)).unwrap())
    }

    #[test]
    fn test_compare_end_to_end() {
        let cmp = comparator(AnalysisConfig::default());
        let result = cmp.compare(300.0, 450.0, &Shipment::bulk(1000.0)).unwrap();
        assert!((result.absolute_difference - 20_500.0).abs() < 1e-6);
        assert_eq!(result.optimal_port, Port::A);
        assert!(!result.tie);
        // 20500 / 81000 × 100
        assert!((result.percent_difference - 25.308_641_975_308_64).abs() < 1e-9);
    }

    #[test]
    fn test_exact_tie_uses_configured_port() {
        let mut equal = AnalysisConfig::default();
        equal.cost_model.maritime_tariffs.insert(
            "china".to_string(),
            crate::config::analysis_config::MaritimeTariff {
                port_a: 40.0,
                port_b: 40.0,
            },
        );
        equal.comparison.tie_break_port = Port::B;
        let result = comparator(equal)
            .compare(200.0, 200.0, &Shipment::bulk(10.0))
            .unwrap();
        assert!(result.tie);
        assert_eq!(result.optimal_port, Port::B);
        assert_eq!(result.percent_difference, 0.0);
    }

    #[test]
    fn test_break_even_found() {
        let cmp = comparator(AnalysisConfig::default());
        let shipment = Shipment::bulk(1000.0);
        let outcome = cmp.find_break_even_distance(450.0, &shipment, 0.1).unwrap();
        let distance = outcome.distance_km().unwrap();
        // 0.12·d + 45 = 0.12·450 + 47.5 → d = 450 + 2.5/0.12
        assert!((distance - (450.0 + 2.5 / 0.12)).abs() <= 0.1);
    }

    #[test]
    fn test_break_even_none_when_b_always_cheaper() {
        let mut config = AnalysisConfig::default();
        config.cost_model.default_destination = "brasil".to_string(); // 25 / 24
        let cmp = comparator(config);
        let outcome = cmp
            .find_break_even_distance(0.0, &Shipment::bulk(100.0), 0.1)
            .unwrap();
        match outcome {
            BreakEvenOutcome::NoBreakEven { always_cheaper, .. } => {
                assert_eq!(always_cheaper, Port::B)
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_break_even_none_when_a_always_cheaper() {
        let cmp = comparator(AnalysisConfig::default());
        // 港口B距离远超上界: A 在 2000 km 处仍更便宜
        let outcome = cmp
            .find_break_even_distance(5000.0, &Shipment::bulk(100.0), 0.1)
            .unwrap();
        assert!(matches!(
            outcome,
            BreakEvenOutcome::NoBreakEven {
                always_cheaper: Port::A,
                ..
            }
        ));
    }

    #[test]
    fn test_break_even_rejects_bad_precision() {
        let cmp = comparator(AnalysisConfig::default());
        assert_eq!(
            cmp.find_break_even_distance(100.0, &Shipment::bulk(1.0), 0.0),
            Err(EngineError::InvalidPrecision(0.0))
        );
    }
}
