// ==========================================
// 港口成本比选系统 - 成本对象
// ==========================================
// 职责: 单港成本分解 / 双港比选结果 / 盈亏平衡点
// 红线: 内部全精度,只在展示层四舍五入
// ==========================================

use crate::domain::types::{CargoMode, Port};
use serde::{Deserialize, Serialize};

// ==========================================
// Shipment - 单票货物
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    /// 吨位（必须 > 0）
    pub tonnage_t: f64,
    /// 货物模式
    #[serde(default)]
    pub cargo_mode: CargoMode,
}

impl Shipment {
    pub fn bulk(tonnage_t: f64) -> Self {
        Self {
            tonnage_t,
            cargo_mode: CargoMode::Bulk,
        }
    }

    pub fn containerized(tonnage_t: f64, containers: u32) -> Self {
        Self {
            tonnage_t,
            cargo_mode: CargoMode::Containerized { containers },
        }
    }
}

// ==========================================
// CostBreakdown - 单港单票成本分解
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub port: Port,
    pub distance_km: f64,          // 原始陆运距离
    pub adjusted_distance_km: f64, // 校正后距离
    pub tonnage_t: f64,
    pub land_freight: f64,     // 陆运费
    pub maritime_freight: f64, // 海运费
    pub fixed_costs: f64,      // 港口固定费用
    pub total_cost: f64,
    pub unit_cost: f64, // total_cost / tonnage_t
}

// ==========================================
// ComparisonResult - 双港比选结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub port_a: CostBreakdown,
    pub port_b: CostBreakdown,
    /// |total_b - total_a|
    pub absolute_difference: f64,
    /// absolute_difference / min(total_a, total_b) × 100
    pub percent_difference: f64,
    pub optimal_port: Port,
    /// 总成本完全相等,由配置的默认港口决定
    pub tie: bool,
}

impl ComparisonResult {
    /// 成本差值（港口A - 港口B）,负数表示 A 更便宜
    pub fn differential(&self) -> f64 {
        self.port_a.total_cost - self.port_b.total_cost
    }

    /// 选择最优港口带来的节省额
    pub fn savings(&self) -> f64 {
        self.absolute_difference
    }

    pub fn breakdown(&self, port: Port) -> &CostBreakdown {
        match port {
            Port::A => &self.port_a,
            Port::B => &self.port_b,
        }
    }
}

// ==========================================
// BreakEvenOutcome - 盈亏平衡点求解结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakEvenOutcome {
    /// 区间内存在平衡点
    Found {
        /// 到港口A的平衡距离（km）
        distance_km: f64,
        /// 二分迭代次数
        iterations: u32,
        /// 平衡点处的比选结果
        comparison: ComparisonResult,
    },
    /// 区间内某一港口始终更优,不存在平衡点
    NoBreakEven {
        always_cheaper: Port,
        /// 说明文字（已本地化）
        reason: String,
        /// 判定所用的端点比选结果
        reference: ComparisonResult,
    },
}

impl BreakEvenOutcome {
    pub fn distance_km(&self) -> Option<f64> {
        match self {
            BreakEvenOutcome::Found { distance_km, .. } => Some(*distance_km),
            BreakEvenOutcome::NoBreakEven { .. } => None,
        }
    }
}
