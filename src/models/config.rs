// ============================================================================
// Compox - 配置数据模型
// ============================================================================
//
// 文件: src/models/config.rs
// 职责: 配置文件数据结构定义和操作
// 边界:
//   - ✅ 配置文件数据结构定义
//   - ✅ 配置序列化/反序列化
//   - ✅ 配置默认值
//   - ✅ 运行时参数合并
//   - ❌ 不应包含配置应用逻辑
//   - ❌ 不应包含 CLI 参数解析
//
// ============================================================================

use serde::Deserialize;
use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};

/// 全局配置管理器
static GLOBAL_CONFIG: OnceLock<Arc<RwLock<Config>>> = OnceLock::new();

/// 默认配置文件名
pub const CONFIG_FILE_NAME: &str = "compox.toml";

/// Compox 配置文件结构
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// 执行配置
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// 输出配置
    #[serde(default)]
    pub output: OutputConfig,
    /// 国际化配置
    #[serde(default)]
    pub i18n: I18nConfig,
}

/// 执行配置
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// 每个构建的最大并发任务数
    #[serde(default = "Config::default_max_concurrency")]
    pub max_concurrency: usize,
    /// 任务超时时间（秒，0 表示不限制）
    #[serde(default)]
    pub task_timeout: u32,
    /// 任一任务失败时取消整个构建
    #[serde(default)]
    pub fail_fast: bool,
}

/// 输出配置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// 是否详细输出
    #[serde(default)]
    pub verbose: bool,
    /// 是否彩色输出
    #[serde(default = "Config::default_colored")]
    pub colored: bool,
}

/// 国际化配置
#[derive(Debug, Clone, Deserialize)]
pub struct I18nConfig {
    /// 界面语言
    #[serde(default = "Config::default_language")]
    pub language: String,
}

/// CLI 运行时参数（用于覆盖配置文件）
#[derive(Debug, Clone, Default)]
pub struct RuntimeArgs {
    pub verbose: Option<bool>,
    pub colored: Option<bool>,
    pub max_concurrency: Option<usize>,
    pub task_timeout: Option<u32>,
    pub fail_fast: Option<bool>,
    pub language: Option<String>,
}

impl Config {
    fn default_max_concurrency() -> usize {
        num_cpus::get()
    }

    fn default_colored() -> bool {
        true
    }

    fn default_language() -> String {
        "en_us".to_string()
    }

    /// 初始化全局配置（程序启动时调用）
    pub fn initialize() -> anyhow::Result<()> {
        let config = Self::load_from(Path::new(CONFIG_FILE_NAME))?;
        GLOBAL_CONFIG
            .set(Arc::new(RwLock::new(config)))
            .map_err(|_| anyhow::anyhow!("Global config already initialized"))?;
        Ok(())
    }

    /// 加载配置文件，文件不存在时使用默认配置
    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(config_path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 合并运行时参数
    pub fn merge_runtime_args(args: RuntimeArgs) -> anyhow::Result<()> {
        let global_config = GLOBAL_CONFIG
            .get()
            .ok_or_else(|| anyhow::anyhow!("Global config not initialized"))?;

        let mut config = global_config
            .write()
            .map_err(|_| anyhow::anyhow!("Failed to acquire config write lock"))?;

        config.apply(args);
        Ok(())
    }

    /// 将运行时参数应用到当前配置
    pub fn apply(&mut self, args: RuntimeArgs) {
        if let Some(verbose) = args.verbose {
            self.output.verbose = verbose;
        }
        if let Some(colored) = args.colored {
            self.output.colored = colored;
        }
        if let Some(max_concurrency) = args.max_concurrency {
            self.execution.max_concurrency = max_concurrency;
        }
        if let Some(task_timeout) = args.task_timeout {
            self.execution.task_timeout = task_timeout;
        }
        if let Some(fail_fast) = args.fail_fast {
            self.execution.fail_fast = fail_fast;
        }
        if let Some(language) = args.language {
            self.i18n.language = language;
        }
    }

    /// 获取全局配置快照（未初始化时返回默认配置）
    pub fn current() -> Self {
        GLOBAL_CONFIG
            .get()
            .and_then(|config| config.read().ok().map(|guard| guard.clone()))
            .unwrap_or_default()
    }

    /// 获取界面语言
    pub fn get_language() -> anyhow::Result<String> {
        let global_config = GLOBAL_CONFIG
            .get()
            .ok_or_else(|| anyhow::anyhow!("Global config not initialized"))?;

        let config = global_config
            .read()
            .map_err(|_| anyhow::anyhow!("Failed to acquire config read lock"))?;

        Ok(config.i18n.language.clone())
    }

    /// 获取详细输出设置（带默认值）
    pub fn get_verbose() -> bool {
        Self::current().output.verbose
    }

    /// 获取是否彩色输出
    pub fn get_colored() -> bool {
        Self::current().output.colored
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrency: Config::default_max_concurrency(),
            task_timeout: 0,
            fail_fast: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            colored: Config::default_colored(),
        }
    }
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            language: Config::default_language(),
        }
    }
}
