// 集成测试公共模块
//
// 提供测试辅助工具和共享功能

use dyntrans::host::{ArrayKey, MemoryScene, NodeId};
use dyntrans::translation::{EngineConfig, MonitorStrategy, TranslationService};

/// 标准测试翻译数据
pub const SAMPLE_DATA: &str = "\
# 界面
[UI]
Start Game = 开始游戏
Options = 选项
Quit = 退出
Health = 生命

# 模板
Day {0} = 第{0}天
Found {0} x{1} = 发现 {0} ×{1}
re:(\\d+) gold = {0} {GOLD}
GOLD = 金币

[Items]
Iron = 铁
Copper = 铜

[day]
Monday = MON
Tuesday = TUE
";

/// 测试配置构建器
pub struct TestConfigBuilder {
    config: EngineConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn intervals(mut self, fast: f32, slow: f32, visibility: f32) -> Self {
        self.config.fast_interval = fast;
        self.config.slow_interval = slow;
        self.config.visibility_interval = visibility;
        self
    }

    pub fn retries(mut self, max_retries: usize, retry_interval: f32) -> Self {
        self.config.max_retries = max_retries;
        self.config.retry_interval = retry_interval;
        self
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.config.population_threshold = threshold;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

/// 测试环境：内存场景 + 已加载样例数据的服务
pub struct TestEnvironment {
    pub scene: MemoryScene,
    pub service: TranslationService,
}

impl TestEnvironment {
    pub fn new(config: EngineConfig) -> Self {
        let mut service = TranslationService::new(config).expect("配置应当有效");
        let report = service.load_translations_str(SAMPLE_DATA);
        assert_eq!(report.rejected, 0, "样例数据不应有被拒绝的行");

        Self {
            scene: MemoryScene::new(),
            service,
        }
    }

    /// 添加节点并登记路径规则
    pub fn node_with_rule(&mut self, path: &str, text: &str, rule: &str, strategy: MonitorStrategy) -> NodeId {
        let id = self.scene.add_node(path, text);
        self.service.add_path_rule(rule, strategy);
        id
    }

    pub fn register(&mut self) -> usize {
        self.service.register_rules(&mut self.scene)
    }

    pub fn tick(&mut self, dt: f32) -> dyntrans::translation::TickReport {
        self.service.tick(&mut self.scene, dt)
    }

    pub fn tick_n(&mut self, n: usize, dt: f32) {
        for _ in 0..n {
            self.tick(dt);
        }
    }

    pub fn text(&self, id: NodeId) -> String {
        self.scene.text_of(id).unwrap_or_default().to_string()
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// 测试数据生成器
pub struct TestDataGenerator;

impl TestDataGenerator {
    pub fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// 生成 `prefix0..prefixN` 的字符串数组
    pub fn numbered(prefix: &str, count: usize) -> Vec<String> {
        (0..count).map(|i| format!("{}{}", prefix, i)).collect()
    }

    pub fn array_key(location: &str, sub_index: usize) -> ArrayKey {
        ArrayKey::new(location, sub_index)
    }
}

/// 断言辅助工具
pub struct AssertionHelper;

impl AssertionHelper {
    pub fn assert_array(scene: &MemoryScene, key: &ArrayKey, expected: &[&str]) {
        let actual = scene
            .array(key)
            .unwrap_or_else(|| panic!("数组 {} 不存在", key));
        let expected = TestDataGenerator::strings(expected);
        assert_eq!(actual, expected.as_slice(), "数组 {} 内容不符", key);
    }
}
