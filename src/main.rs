// ==========================================
// 港口成本比选系统 - 命令行入口
// ==========================================
// 用法: port-cost-compare <起点清单.csv|xlsx> [config.db] [目的地]
// 流程: 导入 → 批量比选 → 敏感性 + 关键参数 → 稳健性 → JSON 输出到 stdout
// ==========================================

use std::sync::Arc;

use anyhow::Context;
use port_cost_compare::api::{AnalysisApi, RecalcStrategy};
use port_cost_compare::config::{AnalysisConfigReader, ConfigManager};
use port_cost_compare::db::default_config_db_path;
use port_cost_compare::i18n;
use port_cost_compare::importer::EntityImporter;
use port_cost_compare::logging;
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let Some(input_path) = args.next() else {
        eprintln!("{}", i18n::t("cli.usage"));
        std::process::exit(2);
    };
    let db_path = args.next().unwrap_or_else(default_config_db_path);
    let destination = args.next();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", port_cost_compare::APP_NAME, port_cost_compare::VERSION);
    tracing::info!(config_db = %db_path, input = %input_path, "启动分析");
    tracing::info!("==================================================");

    // 配置: 默认值 + config_kv 覆写
    let config_manager =
        ConfigManager::new(&db_path).with_context(|| format!("无法打开配置库: {}", db_path))?;
    let config = Arc::new(
        config_manager
            .load_analysis_config()
            .await
            .context("配置加载失败")?,
    );

    // 导入起点清单
    let import_report = EntityImporter::new()
        .import_file(&input_path)
        .with_context(|| format!("起点清单导入失败: {}", input_path))?;
    if !import_report.rejected.is_empty() {
        tracing::warn!(
            "{}",
            i18n::t_with_args(
                "import.rows_rejected",
                &[("count", import_report.rejected.len().to_string().as_str())]
            )
        );
    }

    let api = AnalysisApi::new(config);
    let dest = destination.as_deref();
    let records = &import_report.records;

    let batch = api.evaluate_batch(records, dest).context("批量比选失败")?;
    let sensitivity = api
        .analyze_sensitivity(records, dest, None, RecalcStrategy::ComponentScaling)
        .context("敏感性分析失败")?;
    let robustness = api
        .evaluate_robustness(records, dest, None, RecalcStrategy::ComponentScaling)
        .context("稳健性评估失败")?;

    let output = json!({
        "import": {
            "total_rows": import_report.total_rows,
            "accepted": import_report.accepted(),
            "rejected": import_report.rejected,
        },
        "batch": batch,
        "sensitivity": sensitivity,
        "robustness": robustness,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
