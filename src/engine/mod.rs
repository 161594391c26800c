// ==========================================
// 港口成本比选系统 - 引擎层
// ==========================================
// 职责: 成本模型 / 比选 / 场景 / 敏感性 / 稳健性 / 批量
// 红线: 引擎同步、无 I/O、无共享可变状态
// ==========================================

pub mod batch;
pub mod comparator;
pub mod cost_model;
pub mod error;
pub mod recalc;
pub mod robustness;
pub mod scenario;
pub mod sensitivity;

// 重导出核心引擎
pub use batch::{BatchEvaluator, BatchOutcome, BatchStats};
pub use comparator::PortComparator;
pub use cost_model::CostModel;
pub use error::{EngineError, EngineResult, ErrorKind};
pub use recalc::{ComponentScalingRecalculator, CostModelRecalculator, ScenarioRecalculator};
pub use scenario::{generate_scenarios, resolve_factors, scenario_count, ScenarioIter};
pub use sensitivity::SensitivityEngine;
