//! 翻译服务
//!
//! 编排层：持有翻译词典与三个引擎，负责加载数据、登记路径规则与数组，
//! 驱动每个 tick，并在场景切换与热重载时按固定顺序重置各组件。
//!
//! ## 热重载顺序
//!
//! 1. 模式引擎 `reset()`（只保留内置模板）
//! 2. 节点注册表 `clear()`
//! 3. 数组同步引擎 `reset()`
//! 4. 重建翻译词典与用户模板
//! 5. 重新登记路径规则、数组与子树
//!
//! 词典只在两次 tick 之间被替换，引擎内部从不修改它。
//!
//! ## 使用示例
//!
//! ```rust
//! use dyntrans::host::MemoryScene;
//! use dyntrans::translation::{EngineConfig, MonitorStrategy, TranslationService};
//!
//! let mut scene = MemoryScene::new();
//! let label = scene.add_node("GUI/HUD/Day", "Monday");
//!
//! let mut service = TranslationService::new(EngineConfig::default())?;
//! service.load_translations_str("[Day]\nMonday = 星期一\n");
//! service.add_path_rule("GUI/HUD", MonitorStrategy::Fast);
//! service.register_rules(&mut scene);
//! service.tick(&mut scene, 0.1);
//!
//! assert_eq!(scene.text_of(label), Some("星期一"));
//! # Ok::<(), dyntrans::translation::TranslationError>(())
//! ```

use std::path::Path;

use crate::host::{ArrayHost, ArrayKey, SceneHost, TextHolder};
use crate::translation::config::{ConfigManager, EngineConfig};
use crate::translation::error::TranslationResult;
use crate::translation::pipeline::{
    PatternEngine, PatternMode, PatternStats, SpecialCase, TextFilter, TranslateOutcome,
    Translator,
};
use crate::translation::storage::{LoadReport, PatternDef, TranslationData, TranslationLoader};

use super::arrays::{ArraySyncEngine, ReadinessState, SyncStats};
use super::observer::{NodeRegistry, RegistryStats, RegistryTick};
use super::strategy::{MonitorStrategy, PathRule};

/// 一次 tick 的结果
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub nodes: RegistryTick,
    pub array_items_translated: usize,
    pub readiness: ReadinessState,
}

/// 服务统计
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceStats {
    pub store_entries: usize,
    pub registry: RegistryStats,
    pub arrays: SyncStats,
    pub patterns: PatternStats,
    pub ticks: u64,
    pub reloads: u64,
}

/// 用户登记的内容，重置后据此重新登记
#[derive(Debug, Default)]
struct Registrations {
    rules: Vec<PathRule>,
    roots: Vec<String>,
    watches: Vec<(ArrayKey, String)>,
    categories: Vec<(String, Vec<String>)>,
    patterns: Vec<(String, String, PatternMode)>,
    special_cases: Vec<(String, SpecialCase)>,
}

/// 翻译服务
pub struct TranslationService {
    config: EngineConfig,
    translator: Translator,
    registry: NodeRegistry,
    arrays: ArraySyncEngine,
    registrations: Registrations,
    data_patterns: Vec<PatternDef>,
    ticks: u64,
    reloads: u64,
}

impl TranslationService {
    /// 按配置创建服务（不加载任何翻译数据）
    pub fn new(config: EngineConfig) -> TranslationResult<Self> {
        config.validate()?;

        let translator = Translator::new(
            Default::default(),
            PatternEngine::new(config.match_cache_size),
        )
        .with_filter(TextFilter::with_min_length(config.min_text_length));

        Ok(Self {
            registry: NodeRegistry::new(&config),
            arrays: ArraySyncEngine::new(&config),
            translator,
            registrations: Registrations::default(),
            data_patterns: Vec::new(),
            ticks: 0,
            reloads: 0,
            config,
        })
    }

    /// 从配置文件与环境变量创建服务，并加载配置中的翻译数据
    pub fn from_config_manager() -> TranslationResult<Self> {
        let manager = ConfigManager::new()?;
        let mut service = Self::new(manager.get_config().clone())?;

        if !service.config.translation_paths.is_empty() {
            let paths: Vec<String> = service
                .config
                .translation_paths
                .iter()
                .map(|p| shellexpand::tilde(p).into_owned())
                .collect();
            let data = TranslationLoader::new().parse_files(paths.as_slice())?;
            service.install(data);
        }

        Ok(service)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 解析并安装翻译文本，替换现有词典与数据模板
    pub fn load_translations_str(&mut self, content: &str) -> LoadReport {
        let data = TranslationLoader::new().parse_str(content);
        self.install(data)
    }

    /// 加载翻译文件，替换现有词典与数据模板
    pub fn load_translations_file(&mut self, path: impl AsRef<Path>) -> TranslationResult<LoadReport> {
        let data = TranslationLoader::new().parse_file(path)?;
        Ok(self.install(data))
    }

    /// 安装翻译数据：重置模板 → 替换词典 → 编译模板 → 定义数组分类
    fn install(&mut self, data: TranslationData) -> LoadReport {
        let TranslationData {
            store,
            patterns,
            mut report,
        } = data;

        self.translator.patterns_mut().reset();
        self.translator.replace_store(store);
        self.data_patterns = patterns;

        let rejected = self.register_patterns();
        report.rejected += rejected;

        let names: Vec<String> = self
            .translator
            .store()
            .category_names()
            .map(str::to_string)
            .collect();
        for name in names {
            self.arrays
                .define_category_from(self.translator.store(), &name);
        }
        for (name, values) in &self.registrations.categories {
            self.arrays.define_category(name, values.clone());
        }

        tracing::info!(
            "翻译数据已安装: {} 条词条, {} 个模板",
            self.translator.store().len(),
            self.translator.patterns().stats().user_patterns
        );
        report
    }

    /// 注册数据模板与用户模板，返回编译失败的数量
    ///
    /// 每条模板都插入最前：数据模板倒序插入，文件中靠前的优先；
    /// 代码登记的模板按登记顺序插入，越晚登记越优先，且整体高于数据模板。
    fn register_patterns(&mut self) -> usize {
        let mut rejected = 0;
        let engine = self.translator.patterns_mut();

        for def in self.data_patterns.iter().rev() {
            match engine.compile_definition(def) {
                Some(pattern) => {
                    engine.register(pattern, true);
                }
                None => rejected += 1,
            }
        }
        for (original, translated, mode) in &self.registrations.patterns {
            match engine.compile(original, translated, *mode) {
                Some(pattern) => {
                    engine.register(pattern, true);
                }
                None => rejected += 1,
            }
        }
        for (fragment, case) in &self.registrations.special_cases {
            engine.register_special_case(fragment, *case);
        }
        rejected
    }

    /// 登记用户模板（插入最前）
    pub fn add_pattern(&mut self, original: &str, translated: &str, mode: PatternMode) -> bool {
        let added = self.translator.patterns_mut().add(original, translated, mode);
        if added {
            self.registrations
                .patterns
                .push((original.to_string(), translated.to_string(), mode));
        }
        added
    }

    /// 登记只在路径包含 `fragment` 的节点上生效的特殊情况
    pub fn register_special_case(&mut self, fragment: &str, case: SpecialCase) -> bool {
        let added = self
            .translator
            .patterns_mut()
            .register_special_case(fragment, case);
        if added {
            self.registrations
                .special_cases
                .push((fragment.to_string(), case));
        }
        added
    }

    pub fn add_path_rule(&mut self, literal: &str, strategy: MonitorStrategy) {
        self.registry.add_path_rule(literal, strategy);
        self.registrations.rules.retain(|rule| rule.literal != literal);
        self.registrations.rules.push(PathRule {
            literal: literal.to_string(),
            strategy,
        });
    }

    /// 直接定义数组分类（不来自翻译数据）
    pub fn define_category(&mut self, name: &str, translations: Vec<String>) {
        self.arrays.define_category(name, translations.clone());
        self.registrations.categories.retain(|(n, _)| n != name);
        self.registrations
            .categories
            .push((name.to_string(), translations));
    }

    pub fn watch_array(&mut self, key: ArrayKey, category: &str) {
        self.arrays.watch(key.clone(), category);
        self.registrations.watches.retain(|(k, _)| *k != key);
        self.registrations.watches.push((key, category.to_string()));
    }

    /// 注册根路径下的节点；根路径会被记住以便场景切换后重新注册
    pub fn register_subtree<H: SceneHost + ?Sized>(&mut self, host: &mut H, root_path: &str) -> usize {
        if !self.registrations.roots.iter().any(|r| r == root_path) {
            self.registrations.roots.push(root_path.to_string());
        }
        self.registry
            .register_subtree(host, &mut self.translator, root_path)
    }

    /// 以所有路径规则为根注册节点
    pub fn register_rules<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> usize {
        self.registry.register_rules(host, &mut self.translator)
    }

    /// 安排一次数组就绪检查
    pub fn schedule_array_sync(&mut self) {
        self.arrays.schedule_sync();
    }

    /// 推进一个 tick：先节点，后数组
    pub fn tick<H: SceneHost + ArrayHost + ?Sized>(&mut self, host: &mut H, dt: f32) -> TickReport {
        self.ticks += 1;
        let nodes = self.registry.tick(host, &mut self.translator, dt);
        let array_items_translated = self.arrays.update(host, dt);

        TickReport {
            nodes,
            array_items_translated,
            readiness: self.arrays.state(),
        }
    }

    /// 立即执行一次数组同步，不经过就绪检查
    pub fn sync_arrays<H: ArrayHost + ?Sized>(&mut self, host: &mut H) -> usize {
        self.arrays.monitor_and_sync(host)
    }

    /// 场景切换：丢弃所有追踪状态，按登记内容重新注册，返回新注册的节点数
    pub fn on_scene_changed<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> usize {
        tracing::info!("场景切换，重新注册节点与数组");
        self.registry.clear();
        self.arrays.reset();
        self.reregister(host)
    }

    /// 热重载翻译数据
    pub fn reload<H: SceneHost + ?Sized>(&mut self, host: &mut H, data: TranslationData) -> LoadReport {
        tracing::info!("热重载翻译数据");
        self.reloads += 1;

        self.translator.patterns_mut().reset();
        self.registry.clear();
        self.arrays.reset();

        let report = self.install(data);
        self.reregister(host);
        report
    }

    /// 从配置中的翻译路径重新加载
    pub fn reload_from_config<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> TranslationResult<LoadReport> {
        let paths: Vec<String> = self
            .config
            .translation_paths
            .iter()
            .map(|p| shellexpand::tilde(p).into_owned())
            .collect();
        let data = TranslationLoader::new().parse_files(paths.as_slice())?;
        Ok(self.reload(host, data))
    }

    fn reregister<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> usize {
        for rule in &self.registrations.rules {
            self.registry.add_path_rule(&rule.literal, rule.strategy);
        }

        let names: Vec<String> = self
            .translator
            .store()
            .category_names()
            .map(str::to_string)
            .collect();
        for name in names {
            self.arrays
                .define_category_from(self.translator.store(), &name);
        }
        for (name, values) in &self.registrations.categories {
            self.arrays.define_category(name, values.clone());
        }
        for (key, category) in &self.registrations.watches {
            self.arrays.watch(key.clone(), category);
        }

        let mut registered = self.registry.register_rules(host, &mut self.translator);
        for root in &self.registrations.roots {
            registered += self
                .registry
                .register_subtree(host, &mut self.translator, root);
        }
        registered
    }

    /// 翻译任意文本（不经过节点追踪）
    pub fn translate_text(&mut self, text: &str, path: &str) -> TranslateOutcome {
        self.translator.translate(text, path)
    }

    /// 原地翻译适配层交来的字符串容器
    pub fn translate_holder(&mut self, holder: &mut TextHolder, path: &str) -> bool {
        self.translator.translate_holder(holder, path)
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn arrays(&self) -> &ArraySyncEngine {
        &self.arrays
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            store_entries: self.translator.store().len(),
            registry: self.registry.stats(),
            arrays: self.arrays.stats(),
            patterns: self.translator.patterns().stats(),
            ticks: self.ticks,
            reloads: self.reloads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryScene;
    use crate::translation::storage::parse_translations;

    const DATA: &str = "[UI]\n\
                        Start = 开始\n\
                        Day {0} = 第{0}天\n\
                        [day]\n\
                        Monday = MON\n\
                        Tuesday = TUE\n";

    #[test]
    fn test_load_installs_store_patterns_and_categories() {
        let mut service = TranslationService::new(EngineConfig::default()).unwrap();
        let report = service.load_translations_str(DATA);

        assert_eq!(report.entries, 3);
        assert_eq!(report.patterns, 1);
        assert_eq!(
            service.translate_text("Day 3", ""),
            TranslateOutcome::Translated("第3天".to_string())
        );
        assert_eq!(
            service.arrays().category("day").unwrap(),
            ["MON".to_string(), "TUE".to_string()]
        );
    }

    #[test]
    fn test_min_text_length_from_config() {
        let config = EngineConfig {
            min_text_length: 6,
            ..EngineConfig::default()
        };
        let mut service = TranslationService::new(config).unwrap();
        service.load_translations_str(DATA);

        assert_eq!(service.translate_text("Start", ""), TranslateOutcome::NoMatch);
        assert_eq!(
            service.translate_text("Monday", ""),
            TranslateOutcome::Translated("MON".to_string())
        );
    }

    #[test]
    fn test_file_order_is_pattern_priority() {
        let mut service = TranslationService::new(EngineConfig::default()).unwrap();
        service.load_translations_str("{0} x{1} = A:{0}{1}\n{0} x3 = B:{0}\n");
        assert_eq!(
            service.translate_text("Iron x3", ""),
            TranslateOutcome::Translated("A:Iron3".to_string())
        );
    }

    #[test]
    fn test_scene_change_reregisters() {
        let mut scene = MemoryScene::new();
        scene.add_node("GUI/Title", "Start");
        let mut service = TranslationService::new(EngineConfig::default()).unwrap();
        service.load_translations_str(DATA);
        service.add_path_rule("GUI", MonitorStrategy::Slow);
        assert_eq!(service.register_rules(&mut scene), 1);

        let mut next = MemoryScene::new();
        let title = next.add_node("GUI/Title", "Start");
        assert_eq!(service.on_scene_changed(&mut next), 1);
        assert_eq!(next.text_of(title), Some("开始"));
    }

    #[test]
    fn test_reload_replaces_translations_and_keeps_registrations() {
        let mut scene = MemoryScene::new();
        let title = scene.add_node("GUI/Title", "Start");
        let key = ArrayKey::new("Feed", 0);
        scene.set_array(key.clone(), vec!["Monday".to_string()]);

        let mut service = TranslationService::new(EngineConfig::default()).unwrap();
        service.load_translations_str(DATA);
        service.add_pattern("Hello {0}", "你好 {0}", PatternMode::Template);
        service.add_path_rule("GUI", MonitorStrategy::Slow);
        service.watch_array(key.clone(), "day");
        service.register_rules(&mut scene);

        scene.host_set_text(title, "Start");
        let report = service.reload(&mut scene, parse_translations("Start = 启动\n[day]\nMonday = 周一\n"));
        assert_eq!(report.entries, 2);
        assert_eq!(scene.text_of(title), Some("启动"));
        assert_eq!(service.stats().reloads, 1);
        assert_eq!(service.translate_text("Day 3", ""), TranslateOutcome::NoMatch);
        assert_eq!(
            service.translate_text("Hello Bob", ""),
            TranslateOutcome::Translated("你好 Bob".to_string())
        );

        assert_eq!(service.sync_arrays(&mut scene), 1);
        assert_eq!(scene.array(&key).unwrap(), ["周一".to_string()]);
    }
}
