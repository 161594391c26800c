// ==========================================
// 港口成本比选系统 - 分析对象（产区 / 企业）
// ==========================================
// 职责: 批量比选 / 敏感性分析 / 稳健性评估的输入单元
// 口径: 成本按"每吨"计 (USD/t),年节省额 = |差值| × 年运量
// ==========================================

use crate::domain::coordinate::Coordinate;
use crate::domain::types::{Port, Preference};
use crate::engine::error::{EngineError, ErrorKind};
use serde::{Deserialize, Serialize};

// ==========================================
// EntityRecord - 原始对象记录（导入 / API 输入）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// 区域键（用于路线校正系数）
    #[serde(default)]
    pub region: Option<String>,
    /// 年运量（吨）
    pub volume_t: f64,
    #[serde(default)]
    pub origin: Option<Coordinate>,
    /// 预取的到港口A陆运距离（km）
    #[serde(default)]
    pub distance_a_km: Option<f64>,
    /// 预取的到港口B陆运距离（km）
    #[serde(default)]
    pub distance_b_km: Option<f64>,
    /// 来源行号（导入时填写）
    #[serde(default)]
    pub row_number: Option<usize>,
}

// ==========================================
// EntityRoute - 路线距离
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityRoute {
    pub distance_a_km: f64,
    pub distance_b_km: f64,
}

impl EntityRoute {
    pub fn distance(&self, port: Port) -> f64 {
        match port {
            Port::A => self.distance_a_km,
            Port::B => self.distance_b_km,
        }
    }
}

// ==========================================
// PortUnitCosts - 单港每吨成本分项
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PortUnitCosts {
    pub land: f64,
    pub maritime: f64,
    #[serde(default)]
    pub fixed: f64,
}

impl PortUnitCosts {
    pub fn total(&self) -> f64 {
        self.land + self.maritime + self.fixed
    }
}

// ==========================================
// EntityCosts - 双港每吨成本
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityCosts {
    pub port_a: PortUnitCosts,
    pub port_b: PortUnitCosts,
}

impl EntityCosts {
    /// 差值 = 港口A每吨成本 - 港口B每吨成本
    pub fn differential(&self) -> f64 {
        self.port_a.total() - self.port_b.total()
    }

    /// 最优港口（相等时取配置的默认港口）
    pub fn optimal_port(&self, tie_break: Port) -> Port {
        let differential = self.differential();
        if differential < 0.0 {
            Port::A
        } else if differential > 0.0 {
            Port::B
        } else {
            tie_break
        }
    }

    /// 带死区的偏好分类
    pub fn preference(&self, threshold: f64) -> Preference {
        Preference::classify(self.differential(), threshold)
    }

    pub fn for_port(&self, port: Port) -> &PortUnitCosts {
        match port {
            Port::A => &self.port_a,
            Port::B => &self.port_b,
        }
    }
}

// ==========================================
// AnalysisEntity - 已计算成本的分析对象
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEntity {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// 年运量（吨）
    pub volume_t: f64,
    /// 路线距离（按成本模型重算时需要）
    #[serde(default)]
    pub route: Option<EntityRoute>,
    /// 基准成本
    pub costs: EntityCosts,
}

impl AnalysisEntity {
    /// 年节省额 = |差值| × 年运量
    pub fn annual_savings(&self) -> f64 {
        self.costs.differential().abs() * self.volume_t
    }

    /// 显示名（无名称时用 ID）
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

// ==========================================
// ExcludedEntity - 批量计算中被剔除的对象
// ==========================================
// 单个对象失败不中断批次,剔除并计数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedEntity {
    pub entity_id: String,
    pub error_kind: ErrorKind,
    pub reason: String,
}

impl ExcludedEntity {
    pub fn from_error(entity_id: impl Into<String>, err: &EngineError) -> Self {
        Self {
            entity_id: entity_id.into(),
            error_kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn costs(a_land: f64, a_sea: f64, b_land: f64, b_sea: f64) -> EntityCosts {
        EntityCosts {
            port_a: PortUnitCosts {
                land: a_land,
                maritime: a_sea,
                fixed: 0.0,
            },
            port_b: PortUnitCosts {
                land: b_land,
                maritime: b_sea,
                fixed: 0.0,
            },
        }
    }

    #[test]
    fn test_optimal_port_with_tie_break() {
        assert_eq!(costs(30.0, 45.0, 40.0, 47.5).optimal_port(Port::B), Port::A);
        assert_eq!(costs(50.0, 45.0, 40.0, 47.5).optimal_port(Port::A), Port::B);
        // 完全相等: 取默认港口
        assert_eq!(costs(40.0, 45.0, 40.0, 45.0).optimal_port(Port::B), Port::B);
        assert_eq!(costs(40.0, 45.0, 40.0, 45.0).optimal_port(Port::A), Port::A);
    }

    #[test]
    fn test_annual_savings() {
        let entity = AnalysisEntity {
            id: "S1".to_string(),
            name: None,
            region: None,
            volume_t: 1000.0,
            route: None,
            costs: costs(30.0, 45.0, 40.0, 47.5),
        };
        assert!((entity.annual_savings() - 12_500.0).abs() < 1e-9);
        assert_eq!(entity.display_name(), "S1");
    }
}
