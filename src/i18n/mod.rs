// ============================================================================
// Compox - 国际化模块
// ============================================================================
//
// 文件: src/i18n/mod.rs
// 职责: 国际化支持和翻译管理
// 边界:
//   - ✅ 翻译表选择
//   - ✅ 翻译宏定义和实现
//   - ✅ 参数化翻译支持
//   - ❌ 不应包含具体翻译内容
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

pub mod en_us;
pub mod zh_cn;

/// 获取翻译文本
pub fn get_translation(key: &str) -> String {
    // 每次都从配置获取语言设置
    let language = get_language_from_config().unwrap_or_else(|| "en_us".to_string());
    lookup(translations_for(&language), key)
}

/// 语言对应的翻译表，未知语言使用英文
fn translations_for(language: &str) -> &'static [(&'static str, &'static str)] {
    match language {
        "zh_cn" => zh_cn::TRANSLATIONS,
        _ => en_us::TRANSLATIONS,
    }
}

fn lookup(translations: &[(&str, &str)], key: &str) -> String {
    translations
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
        .unwrap_or_else(|| format!("Unknown translation key: {}", key))
}

/// 从配置获取语言设置（配置未初始化时返回 None）
fn get_language_from_config() -> Option<String> {
    crate::models::config::Config::get_language().ok()
}

/// 简单翻译宏
#[macro_export]
macro_rules! t {
    ($key:expr) => {
        $crate::i18n::get_translation($key)
    };
}

/// 带参数翻译的辅助函数
pub fn format_with_args(template: String, args: Vec<String>) -> String {
    let mut result = template;
    let mut search_from = 0;
    for arg in args.iter() {
        // 替换下一个 {} 占位符（跳过已替换的参数内容）
        if let Some(pos) = result[search_from..].find("{}") {
            let pos = search_from + pos;
            result.replace_range(pos..pos + 2, arg);
            search_from = pos + arg.len();
        }
    }
    result
}

/// 带参数的翻译宏
#[macro_export]
macro_rules! tf {
    ($key:expr, $($arg:expr),*) => {{
        let template = $crate::i18n::get_translation($key);
        let args = vec![$(format!("{}", $arg)),*];
        $crate::i18n::format_with_args(template, args)
    }};
}
