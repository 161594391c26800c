// ==========================================
// 港口成本比选系统 - 敏感性 / 稳健性领域对象
// ==========================================
// 职责: 变量网格 / 场景 / 分析报告
// 红线: 变量按插入顺序迭代,候选值按列出顺序迭代
// 红线: 报告只读,不回写分析对象
// ==========================================

use crate::domain::entity::ExcludedEntity;
use crate::domain::types::{CostComponent, CriticalityTier, Port, Preference, RobustnessLevel};
use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 区间生成的单变量候选值上限
pub const MAX_RANGE_CANDIDATES: usize = 1_000;

/// 区间 [min, max] 按步长生成的候选值个数（含两端）
///
/// 参数非有限、步长 ≤ 0、区间倒置或个数超过 MAX_RANGE_CANDIDATES 时返回 None。
pub fn range_candidate_count(min: f64, max: f64, step: f64) -> Option<usize> {
    if !(min.is_finite() && max.is_finite() && step.is_finite()) || step <= 0.0 || min > max {
        return None;
    }
    let steps = ((max - min) / step + 1e-9).floor();
    if !steps.is_finite() || steps >= MAX_RANGE_CANDIDATES as f64 {
        return None;
    }
    Some(steps as usize + 1)
}

// ==========================================
// SensitivityVariable - 敏感性变量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub name: String,
    /// 作用的成本分项
    pub component: CostComponent,
    /// 基准值（候选值 / 基准值 = 乘数）
    pub default_value: f64,
    /// 候选值（按列出顺序评估）
    pub candidates: Vec<f64>,
}

impl SensitivityVariable {
    pub fn new(
        name: impl Into<String>,
        component: CostComponent,
        default_value: f64,
        candidates: Vec<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            component,
            default_value,
            candidates,
        }
    }

    /// 按 [min, max] 区间和步长生成候选值（含两端）
    ///
    /// 生成值四舍五入到 1e-9,避免 0.1 + 0.2 这类累加误差进入场景。
    ///
    /// # 错误
    /// - EmptyCandidates: 参数非有限、步长 ≤ 0 或区间倒置
    /// - TooManyCandidates: 候选值个数超过 MAX_RANGE_CANDIDATES
    pub fn from_range(
        name: impl Into<String>,
        component: CostComponent,
        default_value: f64,
        min: f64,
        max: f64,
        step: f64,
    ) -> EngineResult<Self> {
        let name = name.into();
        if !(min.is_finite() && max.is_finite() && step.is_finite()) || step <= 0.0 || min > max {
            return Err(EngineError::EmptyCandidates(name));
        }

        let count = range_candidate_count(min, max, step).ok_or_else(|| {
            EngineError::TooManyCandidates {
                name: name.clone(),
                limit: MAX_RANGE_CANDIDATES,
            }
        })?;
        let candidates = (0..count)
            .map(|i| round_to_nanos(min + i as f64 * step))
            .collect();

        Ok(Self {
            name,
            component,
            default_value,
            candidates,
        })
    }

    /// 候选值相对基准值的乘数
    pub fn factor(&self, value: f64) -> f64 {
        value / self.default_value
    }

    fn validate(&self) -> EngineResult<()> {
        if !self.default_value.is_finite() || self.default_value == 0.0 {
            return Err(EngineError::InvalidDefaultValue {
                name: self.name.clone(),
                value: self.default_value,
            });
        }
        if self.candidates.is_empty() {
            return Err(EngineError::EmptyCandidates(self.name.clone()));
        }
        if let Some(bad) = self.candidates.iter().find(|v| !v.is_finite()) {
            return Err(EngineError::InvalidCandidate {
                name: self.name.clone(),
                value: *bad,
            });
        }
        Ok(())
    }
}

fn round_to_nanos(value: f64) -> f64 {
    (value * 1e9).round() / 1e9
}

// ==========================================
// ScenarioVariables - 已校验的变量集合
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScenarioVariables {
    variables: Vec<SensitivityVariable>,
}

impl ScenarioVariables {
    /// 校验并构造
    ///
    /// # 错误
    /// - NoVariables: 变量集合为空
    /// - DuplicateVariable: 变量名重复
    /// - EmptyCandidates / InvalidDefaultValue / InvalidCandidate: 单个变量非法
    pub fn new(variables: Vec<SensitivityVariable>) -> EngineResult<Self> {
        if variables.is_empty() {
            return Err(EngineError::NoVariables);
        }

        let mut seen = HashSet::new();
        for variable in &variables {
            if !seen.insert(variable.name.as_str()) {
                return Err(EngineError::DuplicateVariable(variable.name.clone()));
            }
            variable.validate()?;
        }

        Ok(Self { variables })
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensitivityVariable> {
        self.variables.iter()
    }

    pub fn get(&self, name: &str) -> Option<&SensitivityVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn as_slice(&self) -> &[SensitivityVariable] {
        &self.variables
    }
}

// ==========================================
// Scenario - 一组变量取值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioValue {
    pub variable: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scenario {
    pub values: Vec<ScenarioValue>,
}

impl Scenario {
    pub fn get(&self, variable: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.variable == variable)
            .map(|v| v.value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ==========================================
// ComponentFactors - 各成本分项的乘数
// ==========================================
// 同一分项上的多个变量相乘
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentFactors {
    pub land: f64,
    pub maritime: f64,
    pub fixed: f64,
}

impl Default for ComponentFactors {
    fn default() -> Self {
        Self {
            land: 1.0,
            maritime: 1.0,
            fixed: 1.0,
        }
    }
}

impl ComponentFactors {
    pub fn scale(&mut self, component: CostComponent, factor: f64) {
        match component {
            CostComponent::Land => self.land *= factor,
            CostComponent::Maritime => self.maritime *= factor,
            CostComponent::Fixed => self.fixed *= factor,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.land == 1.0 && self.maritime == 1.0 && self.fixed == 1.0
    }
}

// ==========================================
// 敏感性分析报告
// ==========================================

/// 偏好发生变化的对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedEntity {
    pub entity_id: String,
    pub entity_name: Option<String>,
    pub region: Option<String>,
    pub original_preference: Preference,
    pub new_preference: Preference,
    pub original_differential: f64,
    pub new_differential: f64,
}

/// 单个候选值的变化统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueChange {
    pub value: f64,
    pub changed_entities: Vec<ChangedEntity>,
    pub change_count: usize,
    /// change_count / evaluated_entities × 100
    pub change_percentage: f64,
    /// 本候选值下成功重算的对象数
    pub evaluated_entities: usize,
}

/// 单个变量的敏感性报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub variable: String,
    pub component: CostComponent,
    pub default_value: f64,
    pub values_analyzed: Vec<f64>,
    /// 与 values_analyzed 一一对应
    pub changes_per_value: Vec<ValueChange>,
    pub max_change_percentage: f64,
    /// 任一候选值下偏好变化过的对象（按首次出现顺序）
    pub affected_entity_ids: Vec<String>,
}

impl SensitivityReport {
    pub fn change_for(&self, value: f64) -> Option<&ValueChange> {
        self.changes_per_value.iter().find(|c| c.value == value)
    }

    pub fn affected_count(&self) -> usize {
        self.affected_entity_ids.len()
    }

    pub fn impact(&self) -> ParameterImpact {
        ParameterImpact {
            parameter: self.variable.clone(),
            max_change_percentage: self.max_change_percentage,
            affected_entities: self.affected_count(),
        }
    }
}

/// 参数影响摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterImpact {
    pub parameter: String,
    pub max_change_percentage: f64,
    pub affected_entities: usize,
}

/// 模型整体稳定性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelStability {
    Stable,
    HighlySensitive,
}

/// 关键参数影响范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactScope {
    Limited,
    Broad,
}

/// 敏感性摘要（最敏感 / 最不敏感的参数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityDigest {
    pub most_sensitive: Vec<ParameterImpact>,
    pub least_sensitive: Vec<ParameterImpact>,
    pub stability: ModelStability,
    pub comment: String,
}

/// 一次敏感性分析的完整结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityAnalysis {
    pub analysis_id: String,
    pub as_of: String,
    pub total_entities: usize,
    /// 偏好分类死区（USD/t）
    pub significance_threshold: f64,
    pub reports: Vec<SensitivityReport>,
    pub digest: SensitivityDigest,
    pub excluded: Vec<ExcludedEntity>,
}

impl SensitivityAnalysis {
    pub fn report(&self, variable: &str) -> Option<&SensitivityReport> {
        self.reports.iter().find(|r| r.variable == variable)
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }
}

/// 关键参数分级结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalParameters {
    pub critical: Vec<ParameterImpact>,
    pub important: Vec<ParameterImpact>,
    pub stable: Vec<ParameterImpact>,
    pub stability: ModelStability,
    /// 无关键参数时为 None
    pub scope: Option<ImpactScope>,
    pub comment: String,
}

impl CriticalParameters {
    pub fn tier_of(&self, parameter: &str) -> Option<CriticalityTier> {
        let contains = |list: &[ParameterImpact]| list.iter().any(|p| p.parameter == parameter);
        if contains(&self.critical) {
            Some(CriticalityTier::Critical)
        } else if contains(&self.important) {
            Some(CriticalityTier::Important)
        } else if contains(&self.stable) {
            Some(CriticalityTier::Stable)
        } else {
            None
        }
    }
}

// ==========================================
// 稳健性评估报告
// ==========================================

/// 推荐港口发生翻转的场景
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdverseScenario {
    pub scenario: Scenario,
    pub new_port: Port,
    /// 新场景下的年节省额
    pub new_savings: f64,
}

/// 单个对象的稳健性报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustnessReport {
    pub entity_id: String,
    pub entity_name: Option<String>,
    pub original_port: Port,
    pub original_savings: f64,
    pub scenarios_analyzed: usize,
    pub recommendation_flips: usize,
    pub robustness_percentage: f64,
    pub robustness_level: RobustnessLevel,
    pub adverse_scenarios: Vec<AdverseScenario>,
}

impl RobustnessReport {
    pub fn flip_percentage(&self) -> f64 {
        if self.scenarios_analyzed == 0 {
            0.0
        } else {
            self.recommendation_flips as f64 / self.scenarios_analyzed as f64 * 100.0
        }
    }
}

/// 稳健性总体结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RobustnessVerdict {
    MostlyHigh,
    MostlyMediumHigh,
    Fragile,
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl LevelCounts {
    pub fn record(&mut self, level: RobustnessLevel) {
        match level {
            RobustnessLevel::High => self.high += 1,
            RobustnessLevel::Medium => self.medium += 1,
            RobustnessLevel::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustnessSummary {
    pub total_entities: usize,
    pub counts: LevelCounts,
    pub high_percentage: f64,
    pub medium_percentage: f64,
    pub low_percentage: f64,
    pub verdict: RobustnessVerdict,
    pub comment: String,
}

/// 一次稳健性评估的完整结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustnessEvaluation {
    pub analysis_id: String,
    pub as_of: String,
    pub scenario_count: usize,
    pub reports: Vec<RobustnessReport>,
    pub summary: RobustnessSummary,
    pub excluded: Vec<ExcludedEntity>,
}

impl RobustnessEvaluation {
    pub fn report(&self, entity_id: &str) -> Option<&RobustnessReport> {
        self.reports.iter().find(|r| r.entity_id == entity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_range_inclusive() {
        let v = SensitivityVariable::from_range("land", CostComponent::Land, 0.12, 0.08, 0.16, 0.01)
            .unwrap();
        assert_eq!(v.candidates.len(), 9);
        assert_eq!(v.candidates[0], 0.08);
        assert_eq!(v.candidates[8], 0.16);
        assert_eq!(v.candidates[3], 0.11);

        let f = SensitivityVariable::from_range("sea", CostComponent::Maritime, 1.0, 0.8, 1.2, 0.05)
            .unwrap();
        assert_eq!(f.candidates.len(), 9);
        assert_eq!(f.candidates[4], 1.0);
    }

    #[test]
    fn test_from_range_rejects_bad_step() {
        assert!(SensitivityVariable::from_range("x", CostComponent::Land, 1.0, 0.0, 1.0, 0.0).is_err());
        assert!(SensitivityVariable::from_range("x", CostComponent::Land, 1.0, 2.0, 1.0, 0.1).is_err());
    }

    #[test]
    fn test_from_range_candidate_limit() {
        let at_limit =
            SensitivityVariable::from_range("x", CostComponent::Land, 1.0, 0.0, 999.0, 1.0).unwrap();
        assert_eq!(at_limit.candidates.len(), MAX_RANGE_CANDIDATES);

        assert_eq!(
            SensitivityVariable::from_range("x", CostComponent::Land, 1.0, 0.0, 1000.0, 1.0),
            Err(EngineError::TooManyCandidates {
                name: "x".to_string(),
                limit: MAX_RANGE_CANDIDATES,
            })
        );
        assert!(matches!(
            SensitivityVariable::from_range("x", CostComponent::Land, 1.0, 0.0, 1e12, 1e-9),
            Err(EngineError::TooManyCandidates { .. })
        ));
        assert_eq!(range_candidate_count(0.0, f64::MAX, f64::MIN_POSITIVE), None);
    }

    #[test]
    fn test_scenario_variables_validation() {
        assert_eq!(ScenarioVariables::new(vec![]), Err(EngineError::NoVariables));

        let dup = ScenarioVariables::new(vec![
            SensitivityVariable::new("a", CostComponent::Land, 1.0, vec![1.0]),
            SensitivityVariable::new("a", CostComponent::Maritime, 1.0, vec![1.0]),
        ]);
        assert_eq!(dup, Err(EngineError::DuplicateVariable("a".to_string())));

        let empty = ScenarioVariables::new(vec![SensitivityVariable::new(
            "a",
            CostComponent::Land,
            1.0,
            vec![],
        )]);
        assert_eq!(empty, Err(EngineError::EmptyCandidates("a".to_string())));

        let zero_default = ScenarioVariables::new(vec![SensitivityVariable::new(
            "a",
            CostComponent::Land,
            0.0,
            vec![1.0],
        )]);
        assert!(matches!(
            zero_default,
            Err(EngineError::InvalidDefaultValue { .. })
        ));
    }

    #[test]
    fn test_component_factors_multiply() {
        let mut factors = ComponentFactors::default();
        assert!(factors.is_identity());
        factors.scale(CostComponent::Land, 1.5);
        factors.scale(CostComponent::Land, 2.0);
        assert_eq!(factors.land, 3.0);
        assert_eq!(factors.maritime, 1.0);
    }
}
