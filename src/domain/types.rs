// ==========================================
// 港口成本比选系统 - 领域类型定义
// ==========================================
// 职责: 港口标识 / 货物模式 / 偏好 / 稳健性等级 / 关键度分级
// 红线: 分级制,阈值由配置注入,不在此处硬编码
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 港口 (Port)
// ==========================================
// A: 河港 (默认配置为 Timbúes)
// B: 海港 (默认配置为 Lima)
// 港口名称/代码由 PortProfile 配置,这里只做槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Port {
    A,
    B,
}

impl Port {
    /// 另一侧港口
    pub fn other(&self) -> Port {
        match self {
            Port::A => Port::B,
            Port::B => Port::A,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Port::A => "A",
            Port::B => "B",
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 货物模式 (Cargo Mode)
// ==========================================
// 散货: 固定成本按票计 1 次
// 集装箱: 固定成本按箱数计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CargoMode {
    Bulk,
    Containerized { containers: u32 },
}

impl CargoMode {
    /// 固定成本乘数
    pub fn fixed_cost_multiplier(&self) -> f64 {
        match self {
            CargoMode::Bulk => 1.0,
            CargoMode::Containerized { containers } => *containers as f64,
        }
    }

    pub fn is_containerized(&self) -> bool {
        matches!(self, CargoMode::Containerized { .. })
    }
}

impl Default for CargoMode {
    fn default() -> Self {
        CargoMode::Bulk
    }
}

impl fmt::Display for CargoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CargoMode::Bulk => write!(f, "BULK"),
            CargoMode::Containerized { containers } => write!(f, "CONTAINERIZED({})", containers),
        }
    }
}

// ==========================================
// 港口偏好 (Preference)
// ==========================================
// 带死区的三态分类: 差值落在 [-threshold, +threshold] 内为无差异
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Preference {
    PortA,
    PortB,
    Indifferent,
}

impl Preference {
    /// 按差值分类 (差值 = 港口A成本 - 港口B成本)
    pub fn classify(differential: f64, threshold: f64) -> Preference {
        if differential < -threshold {
            Preference::PortA
        } else if differential > threshold {
            Preference::PortB
        } else {
            Preference::Indifferent
        }
    }

    pub fn port(&self) -> Option<Port> {
        match self {
            Preference::PortA => Some(Port::A),
            Preference::PortB => Some(Port::B),
            Preference::Indifferent => None,
        }
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preference::PortA => write!(f, "PORT_A"),
            Preference::PortB => write!(f, "PORT_B"),
            Preference::Indifferent => write!(f, "INDIFFERENT"),
        }
    }
}

// ==========================================
// 成本分项 (Cost Component)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostComponent {
    Land,     // 陆运
    Maritime, // 海运
    Fixed,    // 港口固定费用
}

impl fmt::Display for CostComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostComponent::Land => write!(f, "LAND"),
            CostComponent::Maritime => write!(f, "MARITIME"),
            CostComponent::Fixed => write!(f, "FIXED"),
        }
    }
}

// ==========================================
// 稳健性等级 (Robustness Level)
// ==========================================
// 顺序: Low < Medium < High
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RobustnessLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RobustnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobustnessLevel::Low => write!(f, "LOW"),
            RobustnessLevel::Medium => write!(f, "MEDIUM"),
            RobustnessLevel::High => write!(f, "HIGH"),
        }
    }
}

// ==========================================
// 参数关键度 (Criticality Tier)
// ==========================================
// 与稳健性等级使用同一套"高/中/低"分级语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriticalityTier {
    Stable,
    Important,
    Critical,
}

impl fmt::Display for CriticalityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriticalityTier::Stable => write!(f, "STABLE"),
            CriticalityTier::Important => write!(f, "IMPORTANT"),
            CriticalityTier::Critical => write!(f, "CRITICAL"),
        }
    }
}
