// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别
// 日志写入 stderr,stdout 留给 JSON 结果
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 人类可读文本
    #[default]
    Text,
    /// 每行一个 JSON 对象（便于日志采集）
    Json,
}

impl LogFormat {
    /// 从环境变量 PORT_COST_LOG_FORMAT 读取（"json" 以外均为文本）
    pub fn from_env() -> Self {
        match std::env::var("PORT_COST_LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

fn env_filter() -> EnvFilter {
    // 从环境变量读取日志级别，默认为 info
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=port_cost_compare=trace
/// - PORT_COST_LOG_FORMAT: text（默认）/ json
///
/// # 示例
/// ```no_run
/// use port_cost_compare::logging;
/// logging::init();
/// ```
pub fn init() {
    init_with(LogFormat::from_env());
}

/// 按指定格式初始化（重复调用时忽略）
pub fn init_with(format: LogFormat) {
    let builder = fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
