// ==========================================
// 港口成本比选系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写、快照
// 存储: config_kv 表 (key-value + scope)
// 规则: 未配置的键取 AnalysisConfig::default();配置值格式错误直接报错
// ==========================================

use crate::config::analysis_config::{
    AnalysisConfig, ClassificationThresholds, ComparisonConfig, CostModelConfig, PortProfile,
    SensitivityConfig,
};
use crate::config::config_reader::AnalysisConfigReader;
use crate::config::error::{ConfigError, ConfigResult};
use crate::db::{ensure_config_schema, open_sqlite_connection, GLOBAL_SCOPE_ID};
use crate::domain::types::Port;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
    defaults: AnalysisConfig,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（不存在的表会被创建）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_config_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            defaults: AnalysisConfig::default(),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 并建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = lock(&conn)?;
            crate::db::configure_sqlite_connection(&guard)?;
            ensure_config_schema(&guard)?;
        }

        Ok(Self {
            conn,
            defaults: AnalysisConfig::default(),
        })
    }

    /// 替换兜底默认值（测试或多环境部署用）
    pub fn with_defaults(mut self, defaults: AnalysisConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = lock(&self.conn)?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE_ID, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE_ID, key, value],
        )?;
        tracing::debug!(key, "配置已写入");
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON 对象,按键排序）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = lock(&self.conn)?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE_ID], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&config_map)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖同名的 global 配置
    /// - `__meta_` 前缀的键为元信息,不回写
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            if key.starts_with("__meta_") {
                continue;
            }
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
                params![GLOBAL_SCOPE_ID, key, value],
            )?;
        }

        tx.commit()?;
        tracing::info!(count, "配置快照已恢复");
        Ok(count)
    }

    // ===== 解析辅助 =====

    fn get_parsed_or<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{} ({})", e, raw),
            }),
        }
    }

    fn get_json_or<T: DeserializeOwned>(&self, key: &str, default: T) -> ConfigResult<T> {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

fn lock(conn: &Arc<Mutex<Connection>>) -> ConfigResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| ConfigError::LockPoisoned(e.to_string()))
}

// ==========================================
// AnalysisConfigReader Trait 实现
// ==========================================
#[async_trait]
impl AnalysisConfigReader for ConfigManager {
    async fn get_port_profile(&self, port: Port) -> ConfigResult<PortProfile> {
        let key = match port {
            Port::A => config_keys::PORT_A_PROFILE,
            Port::B => config_keys::PORT_B_PROFILE,
        };
        self.get_json_or(key, self.defaults.port(port).clone())
    }

    async fn get_cost_model_config(&self) -> ConfigResult<CostModelConfig> {
        let d = &self.defaults.cost_model;
        Ok(CostModelConfig {
            land_tariff_per_ton_km: self
                .get_parsed_or(config_keys::LAND_TARIFF_PER_TON_KM, d.land_tariff_per_ton_km)?,
            maritime_tariffs: self
                .get_json_or(config_keys::MARITIME_TARIFFS, d.maritime_tariffs.clone())?,
            region_factors: self.get_json_or(config_keys::REGION_FACTORS, d.region_factors.clone())?,
            default_destination: self
                .get_parsed_or(config_keys::DEFAULT_DESTINATION, d.default_destination.clone())?,
        })
    }

    async fn get_comparison_config(&self) -> ConfigResult<ComparisonConfig> {
        let d = &self.defaults.comparison;
        let tie_break_port = match self.get_global_config_value(config_keys::TIE_BREAK_PORT)? {
            None => d.tie_break_port,
            Some(raw) => match raw.trim().to_uppercase().as_str() {
                "A" => Port::A,
                "B" => Port::B,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: config_keys::TIE_BREAK_PORT.to_string(),
                        message: format!("只能为 A 或 B ({})", raw),
                    })
                }
            },
        };

        Ok(ComparisonConfig {
            tie_break_port,
            break_even_max_km: self
                .get_parsed_or(config_keys::BREAK_EVEN_MAX_KM, d.break_even_max_km)?,
            break_even_precision_km: self
                .get_parsed_or(config_keys::BREAK_EVEN_PRECISION_KM, d.break_even_precision_km)?,
        })
    }

    async fn get_sensitivity_config(&self) -> ConfigResult<SensitivityConfig> {
        let d = &self.defaults.sensitivity;
        let max_scenarios = match self.get_global_config_value(config_keys::MAX_SCENARIOS)? {
            None => d.max_scenarios,
            Some(raw) if raw.trim().is_empty() => None,
            Some(_) => Some(self.get_parsed_or::<usize>(config_keys::MAX_SCENARIOS, 0)?),
        };

        Ok(SensitivityConfig {
            land_tariff_range: self
                .get_json_or(config_keys::LAND_TARIFF_RANGE, d.land_tariff_range)?,
            maritime_factor_range: self
                .get_json_or(config_keys::MARITIME_FACTOR_RANGE, d.maritime_factor_range)?,
            max_scenarios,
        })
    }

    async fn get_thresholds(&self) -> ConfigResult<ClassificationThresholds> {
        let d = &self.defaults.thresholds;
        Ok(ClassificationThresholds {
            significance_usd_per_t: self
                .get_parsed_or(config_keys::SIGNIFICANCE_THRESHOLD, d.significance_usd_per_t)?,
            critical_change_pct: self
                .get_parsed_or(config_keys::CRITICAL_CHANGE_PCT, d.critical_change_pct)?,
            important_change_pct: self
                .get_parsed_or(config_keys::IMPORTANT_CHANGE_PCT, d.important_change_pct)?,
            robustness_high_pct: self
                .get_parsed_or(config_keys::ROBUSTNESS_HIGH_PCT, d.robustness_high_pct)?,
            robustness_medium_pct: self
                .get_parsed_or(config_keys::ROBUSTNESS_MEDIUM_PCT, d.robustness_medium_pct)?,
            high_impact_pct: self.get_parsed_or(config_keys::HIGH_IMPACT_PCT, d.high_impact_pct)?,
            dominance_pct: self.get_parsed_or(config_keys::DOMINANCE_PCT, d.dominance_pct)?,
            limited_scope_entities: self
                .get_parsed_or(config_keys::LIMITED_SCOPE_ENTITIES, d.limited_scope_entities)?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 港口档案 (JSON PortProfile)
    pub const PORT_A_PROFILE: &str = "port_a_profile";
    pub const PORT_B_PROFILE: &str = "port_b_profile";

    // 费率
    pub const LAND_TARIFF_PER_TON_KM: &str = "land_tariff_per_ton_km";
    pub const MARITIME_TARIFFS: &str = "maritime_tariffs"; // {"china": {"port_a": 45, "port_b": 47.5}}
    pub const REGION_FACTORS: &str = "region_factors"; // {"santa_fe": 1.05, "default": 1.1}
    pub const DEFAULT_DESTINATION: &str = "default_destination";

    // 比选
    pub const TIE_BREAK_PORT: &str = "tie_break_port";
    pub const BREAK_EVEN_MAX_KM: &str = "break_even_max_km";
    pub const BREAK_EVEN_PRECISION_KM: &str = "break_even_precision_km";

    // 敏感性网格 (JSON RangeSpec)
    pub const LAND_TARIFF_RANGE: &str = "land_tariff_range";
    pub const MARITIME_FACTOR_RANGE: &str = "maritime_factor_range";
    pub const MAX_SCENARIOS: &str = "max_scenarios";

    // 分级阈值
    pub const SIGNIFICANCE_THRESHOLD: &str = "significance_threshold";
    pub const CRITICAL_CHANGE_PCT: &str = "critical_change_pct";
    pub const IMPORTANT_CHANGE_PCT: &str = "important_change_pct";
    pub const ROBUSTNESS_HIGH_PCT: &str = "robustness_high_pct";
    pub const ROBUSTNESS_MEDIUM_PCT: &str = "robustness_medium_pct";
    pub const HIGH_IMPACT_PCT: &str = "high_impact_pct";
    pub const DOMINANCE_PCT: &str = "dominance_pct";
    pub const LIMITED_SCOPE_ENTITIES: &str = "limited_scope_entities";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_memory() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_empty() {
        let manager = in_memory();
        let config = manager.load_analysis_config().await.unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[tokio::test]
    async fn test_overrides_are_applied() {
        let manager = in_memory();
        manager
            .set_global_config_value(config_keys::LAND_TARIFF_PER_TON_KM, "0.15")
            .unwrap();
        manager
            .set_global_config_value(config_keys::TIE_BREAK_PORT, "b")
            .unwrap();
        manager
            .set_global_config_value(config_keys::MAX_SCENARIOS, "500")
            .unwrap();

        let config = manager.load_analysis_config().await.unwrap();
        assert_eq!(config.cost_model.land_tariff_per_ton_km, 0.15);
        assert_eq!(config.comparison.tie_break_port, Port::B);
        assert_eq!(config.sensitivity.max_scenarios, Some(500));
    }

    #[tokio::test]
    async fn test_malformed_value_is_rejected() {
        let manager = in_memory();
        manager
            .set_global_config_value(config_keys::DOMINANCE_PCT, "setenta")
            .unwrap();
        let result = manager.get_thresholds().await;
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_snapshot_round_trip_skips_meta() {
        let source = in_memory();
        source
            .set_global_config_value(config_keys::DEFAULT_DESTINATION, "europa")
            .unwrap();
        let snapshot = source.get_config_snapshot().unwrap();

        let mut map: BTreeMap<String, String> = serde_json::from_str(&snapshot).unwrap();
        map.insert("__meta_label".to_string(), "基线".to_string());

        let target = in_memory();
        let restored = target
            .restore_config_from_snapshot(&serde_json::to_string(&map).unwrap())
            .unwrap();
        assert_eq!(restored, 1);
        assert_eq!(
            target
                .get_global_config_value(config_keys::DEFAULT_DESTINATION)
                .unwrap(),
            Some("europa".to_string())
        );
        assert_eq!(target.get_global_config_value("__meta_label").unwrap(), None);
    }
}
