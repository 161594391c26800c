// ==========================================
// 港口成本比选系统 - 成本模型
// ==========================================
// 职责: 单港单票成本 = 陆运费 + 海运费 + 固定费用
// 输入: 港口 / 陆运距离 / 货物 (吨位 + 模式) / 区域
// 输出: CostBreakdown
// 红线: 纯函数,无共享可变状态;内部全精度
// ==========================================

use crate::config::analysis_config::{AnalysisConfig, MaritimeTariff};
use crate::domain::cost::{CostBreakdown, Shipment};
use crate::domain::entity::PortUnitCosts;
use crate::domain::sensitivity::ComponentFactors;
use crate::domain::types::Port;
use crate::engine::error::{ensure_finite, EngineError, EngineResult};
use std::sync::Arc;

// ==========================================
// CostModel - 成本模型（绑定一个目的地）
// ==========================================
#[derive(Debug, Clone)]
pub struct CostModel {
    config: Arc<AnalysisConfig>,
    destination: String,
    tariff: MaritimeTariff,
}

impl CostModel {
    /// 使用配置中的默认目的地
    pub fn new(config: Arc<AnalysisConfig>) -> EngineResult<Self> {
        let destination = config.cost_model.default_destination.clone();
        Self::for_destination(config, &destination)
    }

    /// 绑定指定目的地的海运费率
    ///
    /// # 错误
    /// - UnknownDestination: 目的地未配置
    pub fn for_destination(config: Arc<AnalysisConfig>, destination: &str) -> EngineResult<Self> {
        let tariff = *config.cost_model.maritime_tariff(destination)?;
        for port in [Port::A, Port::B] {
            let rate = tariff.for_port(port);
            if !rate.is_finite() || rate < 0.0 {
                return Err(EngineError::InvalidTariff {
                    port,
                    reason: format!("海运费率 {} 非法", rate),
                });
            }
        }

        Ok(Self {
            config,
            destination: destination.trim().to_lowercase(),
            tariff,
        })
    }

    pub fn config(&self) -> &Arc<AnalysisConfig> {
        &self.config
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算单港成本（不含区域校正）
    ///
    /// # 错误
    /// - InvalidDistance: 距离为负或非有限数
    /// - InvalidTonnage: 吨位 ≤ 0
    pub fn compute_cost(
        &self,
        port: Port,
        distance_km: f64,
        shipment: &Shipment,
    ) -> EngineResult<CostBreakdown> {
        self.compute_cost_scaled(port, distance_km, shipment, 1.0, &ComponentFactors::default())
    }

    /// 按港口代码计算（"A" / "B" 或配置的港口代码）
    pub fn compute_cost_by_code(
        &self,
        port_code: &str,
        distance_km: f64,
        shipment: &Shipment,
    ) -> EngineResult<CostBreakdown> {
        let port = self.config.resolve_port(port_code)?;
        self.compute_cost(port, distance_km, shipment)
    }

    /// 计算单港成本,叠加区域路线校正系数
    ///
    /// 区域为 None 时系数为 1.0;未配置的区域取 default 系数。
    pub fn compute_cost_in_region(
        &self,
        port: Port,
        distance_km: f64,
        shipment: &Shipment,
        region: Option<&str>,
    ) -> EngineResult<CostBreakdown> {
        let region_factor = self.config.cost_model.region_factor(region);
        self.compute_cost_scaled(
            port,
            distance_km,
            shipment,
            region_factor,
            &ComponentFactors::default(),
        )
    }

    /// 计算单港成本,费率按分项乘数缩放（场景重算用）
    pub fn compute_cost_scaled(
        &self,
        port: Port,
        distance_km: f64,
        shipment: &Shipment,
        region_factor: f64,
        factors: &ComponentFactors,
    ) -> EngineResult<CostBreakdown> {
        validate_inputs(distance_km, shipment)?;

        let profile = self.config.port(port);
        let land_tariff = self.config.cost_model.land_tariff_per_ton_km * factors.land;
        let maritime_tariff = self.tariff.for_port(port) * factors.maritime;
        let fixed_per_unit = profile.fixed_cost_sum() * factors.fixed;

        let adjusted_distance_km = distance_km * profile.correction_factor * region_factor;
        let tonnage_t = shipment.tonnage_t;

        let land_freight = adjusted_distance_km * land_tariff * tonnage_t;
        let maritime_freight = maritime_tariff * tonnage_t;
        let fixed_costs = fixed_per_unit * shipment.cargo_mode.fixed_cost_multiplier();
        let total_cost = ensure_finite(land_freight + maritime_freight + fixed_costs, "总成本")?;
        let unit_cost = ensure_finite(total_cost / tonnage_t, "每吨成本")?;

        tracing::trace!(
            port = %port,
            distance_km,
            adjusted_distance_km,
            tonnage_t,
            total_cost,
            "单港成本计算完成"
        );

        Ok(CostBreakdown {
            port,
            distance_km,
            adjusted_distance_km,
            tonnage_t,
            land_freight,
            maritime_freight,
            fixed_costs,
            total_cost,
            unit_cost,
        })
    }

    /// 每吨分项成本（批量分析 / 场景重算用）
    pub fn unit_costs(
        &self,
        port: Port,
        distance_km: f64,
        shipment: &Shipment,
        region: Option<&str>,
        factors: &ComponentFactors,
    ) -> EngineResult<PortUnitCosts> {
        let region_factor = self.config.cost_model.region_factor(region);
        let breakdown =
            self.compute_cost_scaled(port, distance_km, shipment, region_factor, factors)?;
        Ok(per_ton(&breakdown))
    }
}

/// 分项成本折算为每吨
pub fn per_ton(breakdown: &CostBreakdown) -> PortUnitCosts {
    let t = breakdown.tonnage_t;
    PortUnitCosts {
        land: breakdown.land_freight / t,
        maritime: breakdown.maritime_freight / t,
        fixed: breakdown.fixed_costs / t,
    }
}

fn validate_inputs(distance_km: f64, shipment: &Shipment) -> EngineResult<()> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(EngineError::InvalidDistance(distance_km));
    }
    if !shipment.tonnage_t.is_finite() || shipment.tonnage_t <= 0.0 {
        return Err(EngineError::InvalidTonnage(shipment.tonnage_t));
    }
    Ok(())
}
