// ==========================================
// 港口成本比选系统 - 场景生成
// ==========================================
// 职责: 变量候选值的笛卡尔积 / 场景数 / 场景 → 分项乘数
// 复杂度: 场景数 = Π |候选值|,V 个变量各 K 个值时为 K^V
// 规则: 先变的变量在前,最后一个变量变化最快
// ==========================================

use crate::domain::sensitivity::{ComponentFactors, Scenario, ScenarioValue, ScenarioVariables};

/// 场景总数（溢出时返回 None）
pub fn scenario_count(variables: &ScenarioVariables) -> Option<usize> {
    variables
        .iter()
        .try_fold(1_usize, |acc, v| acc.checked_mul(v.candidates.len()))
}

/// 生成全部场景
pub fn generate_scenarios(variables: &ScenarioVariables) -> Vec<Scenario> {
    ScenarioIter::new(variables).collect()
}

/// 场景对应的分项乘数（同一分项上的多个变量相乘）
pub fn resolve_factors(variables: &ScenarioVariables, scenario: &Scenario) -> ComponentFactors {
    let mut factors = ComponentFactors::default();
    for entry in &scenario.values {
        if let Some(variable) = variables.get(&entry.variable) {
            factors.scale(variable.component, variable.factor(entry.value));
        }
    }
    factors
}

// ==========================================
// ScenarioIter - 惰性场景迭代器（里程表式进位）
// ==========================================
pub struct ScenarioIter<'a> {
    variables: &'a ScenarioVariables,
    cursor: Vec<usize>,
    done: bool,
}

impl<'a> ScenarioIter<'a> {
    pub fn new(variables: &'a ScenarioVariables) -> Self {
        let done = variables.is_empty() || variables.iter().any(|v| v.candidates.is_empty());
        Self {
            variables,
            cursor: vec![0; variables.len()],
            done,
        }
    }

    fn advance(&mut self) {
        let slice = self.variables.as_slice();
        for position in (0..self.cursor.len()).rev() {
            self.cursor[position] += 1;
            if self.cursor[position] < slice[position].candidates.len() {
                return;
            }
            self.cursor[position] = 0;
        }
        self.done = true;
    }
}

impl Iterator for ScenarioIter<'_> {
    type Item = Scenario;

    fn next(&mut self) -> Option<Scenario> {
        if self.done {
            return None;
        }

        let values = self
            .variables
            .iter()
            .zip(&self.cursor)
            .map(|(variable, &index)| ScenarioValue {
                variable: variable.name.clone(),
                value: variable.candidates[index],
            })
            .collect();

        self.advance();
        Some(Scenario { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sensitivity::SensitivityVariable;
    use crate::domain::types::CostComponent;

    fn vars() -> ScenarioVariables {
        ScenarioVariables::new(vec![
            SensitivityVariable::new("A", CostComponent::Land, 1.0, vec![1.0, 2.0]),
            SensitivityVariable::new("B", CostComponent::Maritime, 10.0, vec![10.0, 20.0, 30.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_count_and_order() {
        let variables = vars();
        assert_eq!(scenario_count(&variables), Some(6));

        let scenarios = generate_scenarios(&variables);
        assert_eq!(scenarios.len(), 6);
        assert_eq!(scenarios[0].get("A"), Some(1.0));
        assert_eq!(scenarios[0].get("B"), Some(10.0));
        assert_eq!(scenarios[1].get("B"), Some(20.0));
        assert_eq!(scenarios[3].get("A"), Some(2.0));
        assert_eq!(scenarios[3].get("B"), Some(10.0));
        assert_eq!(scenarios[0].values[0].variable, "A");
    }

    #[test]
    fn test_resolve_factors() {
        let variables = vars();
        let scenario = &generate_scenarios(&variables)[5]; // A=2, B=30
        let factors = resolve_factors(&variables, scenario);
        assert_eq!(factors.land, 2.0);
        assert_eq!(factors.maritime, 3.0);
        assert_eq!(factors.fixed, 1.0);
    }
}
