// ==========================================
// 港口成本比选系统 - 场景成本重算策略
// ==========================================
// 职责: 给定分项乘数,重算一个分析对象的双港每吨成本
// 实现:
// - ComponentScalingRecalculator: 直接缩放已存的分项成本
// - CostModelRecalculator: 用路线距离 + 缩放后的费率重跑成本模型
// 红线: 只读输入对象,返回新的成本
// ==========================================

use crate::domain::cost::Shipment;
use crate::domain::entity::{AnalysisEntity, EntityCosts, PortUnitCosts};
use crate::domain::sensitivity::ComponentFactors;
use crate::domain::types::Port;
use crate::engine::cost_model::CostModel;
use crate::engine::error::{ensure_finite, EngineError, EngineResult};

// ==========================================
// ScenarioRecalculator Trait
// ==========================================
pub trait ScenarioRecalculator: Send + Sync {
    /// 策略名称（日志用）
    fn name(&self) -> &'static str;

    fn recalculate(
        &self,
        entity: &AnalysisEntity,
        factors: &ComponentFactors,
    ) -> EngineResult<EntityCosts>;
}

// ==========================================
// ComponentScalingRecalculator
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentScalingRecalculator;

impl ComponentScalingRecalculator {
    pub fn new() -> Self {
        Self
    }

    fn scale(costs: &PortUnitCosts, factors: &ComponentFactors) -> EngineResult<PortUnitCosts> {
        let scaled = PortUnitCosts {
            land: costs.land * factors.land,
            maritime: costs.maritime * factors.maritime,
            fixed: costs.fixed * factors.fixed,
        };
        ensure_finite(scaled.total(), "场景每吨成本")?;
        Ok(scaled)
    }
}

impl ScenarioRecalculator for ComponentScalingRecalculator {
    fn name(&self) -> &'static str {
        "component_scaling"
    }

    fn recalculate(
        &self,
        entity: &AnalysisEntity,
        factors: &ComponentFactors,
    ) -> EngineResult<EntityCosts> {
        Ok(EntityCosts {
            port_a: Self::scale(&entity.costs.port_a, factors)?,
            port_b: Self::scale(&entity.costs.port_b, factors)?,
        })
    }
}

// ==========================================
// CostModelRecalculator
// ==========================================
#[derive(Debug, Clone)]
pub struct CostModelRecalculator {
    model: CostModel,
}

impl CostModelRecalculator {
    pub fn new(model: CostModel) -> Self {
        Self { model }
    }
}

impl ScenarioRecalculator for CostModelRecalculator {
    fn name(&self) -> &'static str {
        "cost_model"
    }

    fn recalculate(
        &self,
        entity: &AnalysisEntity,
        factors: &ComponentFactors,
    ) -> EngineResult<EntityCosts> {
        let route = entity.route.ok_or_else(|| EngineError::MissingRoute {
            entity_id: entity.id.clone(),
        })?;
        let shipment = Shipment::bulk(entity.volume_t);
        let region = entity.region.as_deref();

        Ok(EntityCosts {
            port_a: self.model.unit_costs(
                Port::A,
                route.distance(Port::A),
                &shipment,
                region,
                factors,
            )?,
            port_b: self.model.unit_costs(
                Port::B,
                route.distance(Port::B),
                &shipment,
                region,
                factors,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::analysis_config::AnalysisConfig;
    use crate::domain::entity::EntityRoute;
    use crate::domain::types::CostComponent;
    use std::sync::Arc;

    fn entity(route: Option<EntityRoute>) -> AnalysisEntity {
        AnalysisEntity {
            id: "S1".to_string(),
            name: None,
            region: None,
            volume_t: 1000.0,
            route,
            costs: EntityCosts {
                port_a: PortUnitCosts {
                    land: 36.0,
                    maritime: 45.0,
                    fixed: 0.0,
                },
                port_b: PortUnitCosts {
                    land: 54.0,
                    maritime: 47.5,
                    fixed: 0.0,
                },
            },
        }
    }

    #[test]
    fn test_component_scaling() {
        let mut factors = ComponentFactors::default();
        factors.scale(CostComponent::Land, 0.5);
        let costs = ComponentScalingRecalculator::new()
            .recalculate(&entity(None), &factors)
            .unwrap();
        assert_eq!(costs.port_a.land, 18.0);
        assert_eq!(costs.port_b.land, 27.0);
        assert_eq!(costs.port_b.maritime, 47.5);
    }

    #[test]
    fn test_cost_model_matches_stored_costs() {
        let model = CostModel::new(Arc::new(AnalysisConfig::default())).unwrap();
        let recalc = CostModelRecalculator::new(model);
        let route = EntityRoute {
            distance_a_km: 300.0,
            distance_b_km: 450.0,
        };
        let costs = recalc
            .recalculate(&entity(Some(route)), &ComponentFactors::default())
            .unwrap();
        assert!((costs.port_a.total() - 81.0).abs() < 1e-9);
        assert!((costs.port_b.total() - 101.5).abs() < 1e-9);
    }

    #[test]
    fn test_cost_model_requires_route() {
        let model = CostModel::new(Arc::new(AnalysisConfig::default())).unwrap();
        let result = CostModelRecalculator::new(model)
            .recalculate(&entity(None), &ComponentFactors::default());
        assert_eq!(
            result,
            Err(EngineError::MissingRoute {
                entity_id: "S1".to_string()
            })
        );
    }
}
