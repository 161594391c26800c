// ==========================================
// 港口成本比选系统 - 敏感性分析引擎
// ==========================================
// 职责: 单变量扫描 / 关键参数分级 / 敏感性摘要
// 输入: 分析对象 + 变量网格 + 重算策略
// 输出: SensitivityAnalysis / CriticalParameters
// 红线: 偏好分类带死区;基准成本不被场景改写
// 红线: 单个对象重算失败只剔除该对象,不中断分析
// ==========================================

use crate::config::analysis_config::AnalysisConfig;
use crate::domain::entity::{AnalysisEntity, EntityCosts, ExcludedEntity};
use crate::domain::sensitivity::{
    ChangedEntity, ComponentFactors, CriticalParameters, ImpactScope, ModelStability,
    ParameterImpact, ScenarioVariables, SensitivityAnalysis, SensitivityDigest, SensitivityReport,
    SensitivityVariable, ValueChange,
};
use crate::domain::types::CriticalityTier;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::recalc::ScenarioRecalculator;
use crate::i18n;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

// ==========================================
// SensitivityEngine - 敏感性 / 稳健性引擎
// ==========================================
pub struct SensitivityEngine {
    pub(crate) config: Arc<AnalysisConfig>,
    recalculator: Option<Box<dyn ScenarioRecalculator>>,
}

impl SensitivityEngine {
    /// 创建引擎（未设置重算策略）
    pub fn new(config: Arc<AnalysisConfig>) -> Self {
        Self {
            config,
            recalculator: None,
        }
    }

    /// 设置重算策略
    pub fn with_recalculator<R>(mut self, recalculator: R) -> Self
    where
        R: ScenarioRecalculator + 'static,
    {
        self.recalculator = Some(Box::new(recalculator));
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// 入口校验: 对象非空 + 已设置重算策略
    pub(crate) fn prepare(
        &self,
        entities: &[AnalysisEntity],
    ) -> EngineResult<&dyn ScenarioRecalculator> {
        if entities.is_empty() {
            return Err(EngineError::NoEntities);
        }
        self.recalculator
            .as_deref()
            .ok_or(EngineError::MissingCostFunction)
    }

    /// 基准成本（单位乘数重算）,失败的对象进入剔除列表
    pub(crate) fn baseline<'e>(
        &self,
        recalculator: &dyn ScenarioRecalculator,
        entities: &'e [AnalysisEntity],
        excluded: &mut ExclusionLog,
    ) -> Vec<(&'e AnalysisEntity, EntityCosts)> {
        let identity = ComponentFactors::default();
        entities
            .iter()
            .filter_map(|entity| match recalculator.recalculate(entity, &identity) {
                Ok(costs) => Some((entity, costs)),
                Err(err) => {
                    excluded.record(&entity.id, &err);
                    None
                }
            })
            .collect()
    }

    // ==========================================
    // 敏感性分析
    // ==========================================

    /// 逐变量、逐候选值重算全部对象,统计偏好变化
    ///
    /// # 规则
    /// - 乘数 = 候选值 / 基准值,只作用于该变量对应的成本分项
    /// - change_percentage = 偏好变化数 / 该候选值下成功重算的对象数 × 100
    /// - max_change_percentage = 各候选值 change_percentage 的最大值
    ///
    /// # 错误
    /// - NoEntities: 对象为空
    /// - MissingCostFunction: 未设置重算策略
    #[instrument(skip(self, entities, variables), fields(entities = entities.len(), variables = variables.len()))]
    pub fn analyze_sensitivity(
        &self,
        entities: &[AnalysisEntity],
        variables: &ScenarioVariables,
    ) -> EngineResult<SensitivityAnalysis> {
        let recalculator = self.prepare(entities)?;
        let started = Instant::now();
        tracing::info!(strategy = recalculator.name(), "开始敏感性分析");

        let mut excluded = ExclusionLog::default();
        let baseline = self.baseline(recalculator, entities, &mut excluded);

        let reports = variables
            .iter()
            .map(|variable| self.scan_variable(recalculator, variable, &baseline, &mut excluded))
            .collect::<Vec<_>>();

        let digest = self.sensitivity_digest(&reports);
        let (analysis_id, as_of) = analysis_meta();

        tracing::info!(
            analysis_id = %analysis_id,
            evaluated = baseline.len(),
            excluded = excluded.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "敏感性分析完成"
        );

        Ok(SensitivityAnalysis {
            analysis_id,
            as_of,
            total_entities: entities.len(),
            significance_threshold: self.config.thresholds.significance_usd_per_t,
            reports,
            digest,
            excluded: excluded.into_vec(),
        })
    }

    fn scan_variable(
        &self,
        recalculator: &dyn ScenarioRecalculator,
        variable: &SensitivityVariable,
        baseline: &[(&AnalysisEntity, EntityCosts)],
        excluded: &mut ExclusionLog,
    ) -> SensitivityReport {
        let threshold = self.config.thresholds.significance_usd_per_t;
        let mut changes_per_value = Vec::with_capacity(variable.candidates.len());
        let mut affected_entity_ids: Vec<String> = Vec::new();
        let mut affected_seen: HashSet<&str> = HashSet::new();

        for &value in &variable.candidates {
            let mut factors = ComponentFactors::default();
            factors.scale(variable.component, variable.factor(value));

            let mut evaluated = 0_usize;
            let mut changed_entities = Vec::new();
            for (entity, base) in baseline {
                let scenario_costs = match recalculator.recalculate(entity, &factors) {
                    Ok(costs) => costs,
                    Err(err) => {
                        excluded.record(&entity.id, &err);
                        continue;
                    }
                };
                evaluated += 1;

                let original_preference = base.preference(threshold);
                let new_preference = scenario_costs.preference(threshold);
                if original_preference != new_preference {
                    if affected_seen.insert(entity.id.as_str()) {
                        affected_entity_ids.push(entity.id.clone());
                    }
                    changed_entities.push(ChangedEntity {
                        entity_id: entity.id.clone(),
                        entity_name: entity.name.clone(),
                        region: entity.region.clone(),
                        original_preference,
                        new_preference,
                        original_differential: base.differential(),
                        new_differential: scenario_costs.differential(),
                    });
                }
            }

            let change_count = changed_entities.len();
            let change_percentage = percentage(change_count, evaluated);
            tracing::debug!(
                variable = %variable.name,
                value,
                change_count,
                change_percentage,
                "候选值评估完成"
            );

            changes_per_value.push(ValueChange {
                value,
                changed_entities,
                change_count,
                change_percentage,
                evaluated_entities: evaluated,
            });
        }

        let max_change_percentage = changes_per_value
            .iter()
            .map(|c| c.change_percentage)
            .fold(0.0_f64, f64::max);

        SensitivityReport {
            variable: variable.name.clone(),
            component: variable.component,
            default_value: variable.default_value,
            values_analyzed: variable.candidates.clone(),
            changes_per_value,
            max_change_percentage,
            affected_entity_ids,
        }
    }

    // ==========================================
    // 敏感性摘要
    // ==========================================

    /// 最敏感的 2 个参数 + 最不敏感的 2 个参数（少于 2 个参数时后者为空）
    pub fn sensitivity_digest(&self, reports: &[SensitivityReport]) -> SensitivityDigest {
        let ranked = rank_by_impact(reports);

        let most_sensitive: Vec<ParameterImpact> = ranked.iter().take(2).cloned().collect();
        let least_sensitive = if ranked.len() >= 2 {
            ranked[ranked.len() - 2..].to_vec()
        } else {
            Vec::new()
        };

        let stability = match ranked.first() {
            Some(top) if top.max_change_percentage > self.config.thresholds.high_impact_pct => {
                ModelStability::HighlySensitive
            }
            _ => ModelStability::Stable,
        };

        SensitivityDigest {
            most_sensitive,
            least_sensitive,
            stability,
            comment: stability_comment(stability),
        }
    }

    // ==========================================
    // 关键参数识别
    // ==========================================

    /// 按 max_change_percentage 降序分级: 关键 / 重要 / 稳定
    ///
    /// 存在关键参数时模型判为高度敏感;关键参数影响的最大对象数
    /// 低于 limited_scope_entities 时附加"影响范围有限"。
    pub fn identify_critical_parameters(&self, reports: &[SensitivityReport]) -> CriticalParameters {
        let thresholds = &self.config.thresholds;
        let mut critical = Vec::new();
        let mut important = Vec::new();
        let mut stable = Vec::new();

        for impact in rank_by_impact(reports) {
            match thresholds.criticality_tier(impact.max_change_percentage) {
                CriticalityTier::Critical => critical.push(impact),
                CriticalityTier::Important => important.push(impact),
                CriticalityTier::Stable => stable.push(impact),
            }
        }

        let (stability, scope) = if critical.is_empty() {
            (ModelStability::Stable, None)
        } else {
            let widest = critical
                .iter()
                .map(|p| p.affected_entities)
                .max()
                .unwrap_or(0);
            let scope = if widest < thresholds.limited_scope_entities {
                ImpactScope::Limited
            } else {
                ImpactScope::Broad
            };
            (ModelStability::HighlySensitive, Some(scope))
        };

        let mut comment = stability_comment(stability);
        if scope == Some(ImpactScope::Limited) {
            comment.push(' ');
            comment.push_str(&i18n::t("sensitivity.limited_scope"));
        }

        tracing::info!(
            critical = critical.len(),
            important = important.len(),
            stable = stable.len(),
            "关键参数分级完成"
        );

        CriticalParameters {
            critical,
            important,
            stable,
            stability,
            scope,
            comment,
        }
    }
}

// ==========================================
// 辅助
// ==========================================

/// 按 max_change_percentage 降序排序（相同值保持变量顺序）
fn rank_by_impact(reports: &[SensitivityReport]) -> Vec<ParameterImpact> {
    let mut ranked: Vec<ParameterImpact> = reports.iter().map(SensitivityReport::impact).collect();
    ranked.sort_by(|a, b| b.max_change_percentage.total_cmp(&a.max_change_percentage));
    ranked
}

fn stability_comment(stability: ModelStability) -> String {
    match stability {
        ModelStability::Stable => i18n::t("sensitivity.stable"),
        ModelStability::HighlySensitive => i18n::t("sensitivity.highly_sensitive"),
    }
}

pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// 分析 ID + 时间戳
pub(crate) fn analysis_meta() -> (String, String) {
    (
        uuid::Uuid::new_v4().to_string(),
        chrono::Utc::now().to_rfc3339(),
    )
}

// ==========================================
// ExclusionLog - 剔除对象记录（按对象去重,保留首个原因）
// ==========================================
#[derive(Debug, Default)]
pub(crate) struct ExclusionLog {
    entries: Vec<ExcludedEntity>,
    seen: HashSet<String>,
}

impl ExclusionLog {
    pub(crate) fn record(&mut self, entity_id: &str, err: &EngineError) {
        if self.seen.insert(entity_id.to_string()) {
            tracing::warn!(entity_id, error = %err, "对象重算失败,已剔除");
            self.entries.push(ExcludedEntity::from_error(entity_id, err));
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn into_vec(self) -> Vec<ExcludedEntity> {
        self.entries
    }
}
