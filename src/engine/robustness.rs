// ==========================================
// 港口成本比选系统 - 稳健性评估
// ==========================================
// 职责: 全场景（笛卡尔积）下推荐港口是否翻转 + 总体结论
// 复杂度: O(场景数 × 对象数),场景数在运行前计算并受上限约束
// 规则: 翻转按最优港口判断（相等时取默认港口）,不使用死区
// ==========================================

use crate::domain::entity::{AnalysisEntity, EntityCosts};
use crate::domain::sensitivity::{
    AdverseScenario, ComponentFactors, LevelCounts, RobustnessEvaluation, RobustnessReport,
    RobustnessSummary, RobustnessVerdict, Scenario, ScenarioVariables,
};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::recalc::ScenarioRecalculator;
use crate::engine::scenario::{resolve_factors, scenario_count, ScenarioIter};
use crate::engine::sensitivity::{analysis_meta, percentage, ExclusionLog, SensitivityEngine};
use crate::i18n;
use std::time::Instant;
use tracing::instrument;

impl SensitivityEngine {
    /// 运行前的场景数（超过配置上限时报错）
    ///
    /// # 错误
    /// - ScenarioLimitExceeded: 场景数超过 max_scenarios
    /// - ScenarioCountOverflow: 候选值个数乘积溢出
    pub fn robustness_scenario_count(&self, variables: &ScenarioVariables) -> EngineResult<usize> {
        let count = scenario_count(variables).ok_or(EngineError::ScenarioCountOverflow)?;

        match self.config.sensitivity.max_scenarios {
            Some(limit) if count > limit => {
                Err(EngineError::ScenarioLimitExceeded { count, limit })
            }
            _ => Ok(count),
        }
    }

    /// 评估每个对象的推荐稳健性
    ///
    /// robustness_percentage = (场景数 - 翻转数) / 场景数 × 100
    ///
    /// # 错误
    /// - NoEntities: 对象为空
    /// - MissingCostFunction: 未设置重算策略
    /// - ScenarioLimitExceeded / ScenarioCountOverflow: 场景数超过上限或溢出
    #[instrument(skip(self, entities, variables), fields(entities = entities.len(), variables = variables.len()))]
    pub fn evaluate_robustness(
        &self,
        entities: &[AnalysisEntity],
        variables: &ScenarioVariables,
    ) -> EngineResult<RobustnessEvaluation> {
        let recalculator = self.prepare(entities)?;
        let scenario_count = self.robustness_scenario_count(variables)?;
        let started = Instant::now();
        tracing::info!(
            scenario_count,
            workload = scenario_count.saturating_mul(entities.len()),
            strategy = recalculator.name(),
            "开始稳健性评估"
        );

        let scenarios: Vec<(Scenario, ComponentFactors)> = ScenarioIter::new(variables)
            .map(|scenario| {
                let factors = resolve_factors(variables, &scenario);
                (scenario, factors)
            })
            .collect();

        let mut excluded = ExclusionLog::default();
        let baseline = self.baseline(recalculator, entities, &mut excluded);

        let mut reports = Vec::with_capacity(baseline.len());
        for (entity, base) in &baseline {
            match self.evaluate_entity(recalculator, entity, base, &scenarios) {
                Ok(report) => reports.push(report),
                Err(err) => excluded.record(&entity.id, &err),
            }
        }

        let summary = self.robustness_summary(&reports);
        let (analysis_id, as_of) = analysis_meta();
        tracing::info!(
            analysis_id = %analysis_id,
            evaluated = reports.len(),
            excluded = excluded.len(),
            verdict = ?summary.verdict,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "稳健性评估完成"
        );

        Ok(RobustnessEvaluation {
            analysis_id,
            as_of,
            scenario_count,
            reports,
            summary,
            excluded: excluded.into_vec(),
        })
    }

    fn evaluate_entity(
        &self,
        recalculator: &dyn ScenarioRecalculator,
        entity: &AnalysisEntity,
        base: &EntityCosts,
        scenarios: &[(Scenario, ComponentFactors)],
    ) -> EngineResult<RobustnessReport> {
        let tie_break = self.config.comparison.tie_break_port;
        let original_port = base.optimal_port(tie_break);
        let original_savings = base.differential().abs() * entity.volume_t;

        let mut adverse_scenarios = Vec::new();
        for (scenario, factors) in scenarios {
            let costs = recalculator.recalculate(entity, factors)?;
            let new_port = costs.optimal_port(tie_break);
            if new_port != original_port {
                adverse_scenarios.push(AdverseScenario {
                    scenario: scenario.clone(),
                    new_port,
                    new_savings: costs.differential().abs() * entity.volume_t,
                });
            }
        }

        let scenarios_analyzed = scenarios.len();
        let recommendation_flips = adverse_scenarios.len();
        let robustness_percentage =
            percentage(scenarios_analyzed - recommendation_flips, scenarios_analyzed);
        let robustness_level = self.config.thresholds.robustness_level(robustness_percentage);

        tracing::debug!(
            entity_id = %entity.id,
            recommendation_flips,
            robustness_percentage,
            "对象稳健性评估完成"
        );

        Ok(RobustnessReport {
            entity_id: entity.id.clone(),
            entity_name: entity.name.clone(),
            original_port,
            original_savings,
            scenarios_analyzed,
            recommendation_flips,
            robustness_percentage,
            robustness_level,
            adverse_scenarios,
        })
    }

    // ==========================================
    // 总体结论
    // ==========================================

    /// 各稳健性等级的对象数与占比 + 结论
    ///
    /// - 高稳健占比 ≥ dominance → MostlyHigh
    /// - 高 + 中占比 ≥ dominance → MostlyMediumHigh
    /// - 否则 Fragile;无对象时 NoData
    pub fn robustness_summary(&self, reports: &[RobustnessReport]) -> RobustnessSummary {
        let mut counts = LevelCounts::default();
        for report in reports {
            counts.record(report.robustness_level);
        }

        let total = counts.total();
        let high_percentage = percentage(counts.high, total);
        let medium_percentage = percentage(counts.medium, total);
        let low_percentage = percentage(counts.low, total);

        let dominance = self.config.thresholds.dominance_pct;
        let verdict = if total == 0 {
            RobustnessVerdict::NoData
        } else if high_percentage >= dominance {
            RobustnessVerdict::MostlyHigh
        } else if high_percentage + medium_percentage >= dominance {
            RobustnessVerdict::MostlyMediumHigh
        } else {
            RobustnessVerdict::Fragile
        };

        let comment = match verdict {
            RobustnessVerdict::MostlyHigh => i18n::t("robustness.mostly_high"),
            RobustnessVerdict::MostlyMediumHigh => i18n::t("robustness.mostly_medium"),
            RobustnessVerdict::Fragile => i18n::t("robustness.fragile"),
            RobustnessVerdict::NoData => i18n::t("robustness.no_data"),
        };

        RobustnessSummary {
            total_entities: total,
            counts,
            high_percentage,
            medium_percentage,
            low_percentage,
            verdict,
            comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::analysis_config::AnalysisConfig;
    use crate::domain::entity::PortUnitCosts;
    use crate::domain::sensitivity::SensitivityVariable;
    use crate::domain::types::{CostComponent, Port, RobustnessLevel};
    use crate::engine::recalc::ComponentScalingRecalculator;
    use std::sync::Arc;

    fn entity(id: &str, a_land: f64, b_land: f64) -> AnalysisEntity {
        AnalysisEntity {
            id: id.to_string(),
            name: Some(format!("{} 公司", id)),
            region: None,
            volume_t: 1000.0,
            route: None,
            costs: EntityCosts {
                port_a: PortUnitCosts {
                    land: a_land,
                    maritime: 45.0,
                    fixed: 0.0,
                },
                port_b: PortUnitCosts {
                    land: b_land,
                    maritime: 47.5,
                    fixed: 0.0,
                },
            },
        }
    }

    fn engine(config: AnalysisConfig) -> SensitivityEngine {
        SensitivityEngine::new(Arc::new(config)).with_recalculator(ComponentScalingRecalculator::new())
    }

    fn land_variable(candidates: Vec<f64>) -> ScenarioVariables {
        ScenarioVariables::new(vec![SensitivityVariable::new(
            "land",
            CostComponent::Land,
            1.0,
            candidates,
        )])
        .unwrap()
    }

    #[test]
    fn test_flip_counting() {
        // 基准: A = 85, B = 85.5 → A;陆运 ×2: A = 125, B = 123.5 → B
        let entities = vec![entity("C1", 40.0, 38.0)];
        let variables = land_variable(vec![0.5, 1.0, 1.5, 2.0]);
        let evaluation = engine(AnalysisConfig::default())
            .evaluate_robustness(&entities, &variables)
            .unwrap();

        let report = evaluation.report("C1").unwrap();
        assert_eq!(report.original_port, Port::A);
        assert_eq!(report.scenarios_analyzed, 4);
        // ×1.5: A = 105, B = 104.5 → B;×2 → B
        assert_eq!(report.recommendation_flips, 2);
        assert_eq!(report.robustness_percentage, 50.0);
        assert_eq!(report.robustness_level, RobustnessLevel::Low);
        assert_eq!(report.adverse_scenarios[0].scenario.get("land"), Some(1.5));
        assert_eq!(report.adverse_scenarios[0].new_port, Port::B);
        assert!((report.adverse_scenarios[0].new_savings - 500.0).abs() < 1e-6);
        assert!(
            (report.robustness_percentage + report.flip_percentage() - 100.0).abs() < 1e-9
        );
    }

    #[test]
    fn test_scenario_cap() {
        let mut config = AnalysisConfig::default();
        config.sensitivity.max_scenarios = Some(3);
        let variables = land_variable(vec![0.5, 1.0, 1.5, 2.0]);
        let result = engine(config).evaluate_robustness(&[entity("C1", 30.0, 40.0)], &variables);
        assert_eq!(
            result,
            Err(EngineError::ScenarioLimitExceeded { count: 4, limit: 3 })
        );
    }

    #[test]
    fn test_scenario_count_overflow() {
        // 2^128 个场景,无上限配置时也要报溢出
        let variables = ScenarioVariables::new(
            (0..128)
                .map(|i| {
                    SensitivityVariable::new(
                        format!("v{}", i),
                        CostComponent::Land,
                        1.0,
                        vec![0.9, 1.1],
                    )
                })
                .collect(),
        )
        .unwrap();
        let engine = engine(AnalysisConfig::default());
        assert_eq!(
            engine.robustness_scenario_count(&variables),
            Err(EngineError::ScenarioCountOverflow)
        );
        assert_eq!(
            engine
                .evaluate_robustness(&[entity("C1", 30.0, 40.0)], &variables)
                .unwrap_err(),
            EngineError::ScenarioCountOverflow
        );
    }

    #[test]
    fn test_summary_verdicts() {
        let engine = engine(AnalysisConfig::default());
        assert_eq!(
            engine.robustness_summary(&[]).verdict,
            RobustnessVerdict::NoData
        );

        let stable = vec![entity("C1", 10.0, 40.0), entity("C2", 12.0, 40.0)];
        let variables = land_variable(vec![0.9, 1.0, 1.1]);
        let evaluation = engine.evaluate_robustness(&stable, &variables).unwrap();
        assert_eq!(evaluation.summary.counts.high, 2);
        assert_eq!(evaluation.summary.high_percentage, 100.0);
        assert_eq!(evaluation.summary.verdict, RobustnessVerdict::MostlyHigh);
        assert!(evaluation.excluded.is_empty());
    }
}
