//! 节点监控集成测试
//!
//! 测试策略解析、分级节奏、变化门控、一次性与可见性策略、场景切换

use dyntrans::host::{MemoryScene, SceneHost};
use dyntrans::translation::{
    EngineConfig, MonitorStrategy, NodeRegistry, PatternEngine, StrategyRules, TranslationStore,
    Translator,
};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{TestConfigBuilder, TestEnvironment};

fn env() -> TestEnvironment {
    TestEnvironment::new(TestConfigBuilder::new().intervals(0.1, 1.0, 0.25).build())
}

#[test]
fn test_longest_match_strategy_resolution() {
    let mut rules = StrategyRules::new();
    rules.add("GUI/HUD", MonitorStrategy::Fast);
    rules.add("GUI/HUD/Day/HUDValue", MonitorStrategy::EveryFrame);
    assert_eq!(
        rules.resolve("Canvas/GUI/HUD/Day/HUDValue"),
        Some(MonitorStrategy::EveryFrame)
    );

    let mut env = env();
    let value = env.node_with_rule("GUI/HUD/Day/HUDValue", "Day 1", "GUI/HUD", MonitorStrategy::Fast);
    let money = env.scene.add_node("GUI/HUD/Money", "Options");
    env.service
        .add_path_rule("GUI/HUD/Day/HUDValue", MonitorStrategy::EveryFrame);
    assert_eq!(env.register(), 2);

    let registry = env.service.registry();
    assert_eq!(registry.get(value).unwrap().strategy, MonitorStrategy::EveryFrame);
    assert_eq!(registry.get(money).unwrap().strategy, MonitorStrategy::Fast);
    assert_eq!(env.text(value), "第1天");
    assert_eq!(env.text(money), "选项");
}

#[test]
fn test_every_frame_rewrites_host_overwrites_each_tick() {
    let mut env = env();
    let value = env.node_with_rule("GUI/HUD/Day", "Day 1", "GUI/HUD/Day", MonitorStrategy::EveryFrame);
    env.register();

    for day in 2..5 {
        env.scene.host_set_text(value, &format!("Day {}", day));
        env.tick(0.016);
        assert_eq!(env.text(value), format!("第{}天", day));
    }
    // 注册时 1 次，之后每次宿主改写各 1 次
    assert_eq!(env.scene.write_count(value), 4);

    // 文本未变化时不再写入
    env.tick_n(3, 0.016);
    assert_eq!(env.scene.write_count(value), 4);
}

#[test]
fn test_slow_group_throttled() {
    let mut env = env();
    let label = env.node_with_rule("Menu/Label", "Options", "Menu", MonitorStrategy::Slow);
    env.register();

    env.scene.host_set_text(label, "Quit");
    env.tick_n(3, 0.25);
    assert_eq!(env.text(label), "Quit");

    env.tick(0.25);
    assert_eq!(env.text(label), "退出");
}

#[test]
fn test_one_shot_stops_tracking_after_success() {
    let mut env = env();
    let title = env.node_with_rule("Title/Text", "Start Game", "Title", MonitorStrategy::OneShot);
    assert_eq!(env.register(), 1);
    assert_eq!(env.text(title), "开始游戏");
    assert!(env.service.registry().get(title).is_none());
    assert_eq!(env.service.stats().registry.registered, 1);

    // 之后宿主的改写不再被处理，包括下一次慢节奏之前
    env.scene.host_set_text(title, "Quit");
    env.tick(0.016);
    env.tick_n(3, 1.0);
    assert_eq!(env.text(title), "Quit");
}

#[test]
fn test_late_path_rule_retried_until_registered() {
    let mut env = env();
    env.service.add_path_rule("Popup/Panel", MonitorStrategy::OneShotLate);
    assert_eq!(env.register(), 0);
    assert_eq!(env.service.registry().pending_rules().len(), 1);

    env.tick_n(3, 1.0);
    let label = env.scene.add_node("Popup/Panel/Label", "Options");
    let report = env.tick(1.0);

    assert_eq!(report.nodes.late_registered, 1);
    assert_eq!(env.text(label), "选项");
    assert!(env.service.registry().pending_rules().is_empty());
}

#[test]
fn test_visibility_strategy_acts_on_transition_only() {
    let mut env = env();
    let dialog = env.node_with_rule("Dialog/Body", "Options", "Dialog", MonitorStrategy::OnVisible);
    env.scene.set_active(dialog, false);
    env.register();
    assert_eq!(env.text(dialog), "选项");

    env.scene.host_set_text(dialog, "Quit");
    env.tick_n(4, 0.25);
    assert_eq!(env.text(dialog), "Quit");

    env.scene.set_active(dialog, true);
    env.tick(0.25);
    assert_eq!(env.text(dialog), "退出");

    // 保持可见时不再处理
    env.scene.host_set_text(dialog, "Options");
    env.tick_n(4, 0.25);
    assert_eq!(env.text(dialog), "Options");
}

#[test]
fn test_immediate_serviced_before_throttled_groups() {
    let mut env = env();
    let prompt = env.node_with_rule("HUD/Prompt", "Start Game", "HUD/Prompt", MonitorStrategy::Immediate);
    let status = env.scene.add_node("HUD/Status", "Options");
    env.service.add_path_rule("HUD/Status", MonitorStrategy::Fast);
    env.register();

    env.scene.host_set_text(prompt, "Quit");
    env.scene.host_set_text(status, "Quit");
    let report = env.tick(0.016);

    assert_eq!(env.text(prompt), "退出");
    assert_eq!(env.text(status), "Quit");
    assert_eq!(report.nodes.translated, 1);
}

#[test]
fn test_destroyed_and_failing_nodes() {
    let mut env = env();
    let a = env.node_with_rule("List/A", "Options", "List", MonitorStrategy::Immediate);
    let b = env.scene.add_node("List/B", "Options");
    let c = env.scene.add_node("List/C", "Options");
    env.register();

    env.scene.destroy(a);
    env.scene.fail_node(b);
    env.scene.host_set_text(c, "Quit");
    let report = env.tick(0.016);

    assert_eq!(report.nodes.removed, 1);
    assert!(!env.scene.is_alive(a));
    assert_eq!(env.text(c), "退出");
    assert_eq!(env.service.registry().len(), 2);
}

#[test]
fn test_scene_change_clears_and_reregisters() {
    let mut env = env();
    env.node_with_rule("GUI/Title", "Start Game", "GUI", MonitorStrategy::Slow);
    env.service.register_subtree(&mut env.scene, "Extra");
    env.register();
    assert_eq!(env.service.registry().len(), 1);

    let mut next = MemoryScene::new();
    let title = next.add_node("GUI/Title", "Quit");
    let extra = next.add_node("Extra/Label", "Options");

    assert_eq!(env.service.on_scene_changed(&mut next), 2);
    assert_eq!(next.text_of(title), Some("退出"));
    assert_eq!(next.text_of(extra), Some("选项"));
    assert_eq!(env.service.stats().registry.registered, 2);
}

#[test]
fn test_unregister_by_path_and_instance() {
    let config = EngineConfig::default();
    let mut store = TranslationStore::new();
    store.insert("ui", "Options", "选项");
    let mut translator = Translator::new(store, PatternEngine::default());
    let mut registry = NodeRegistry::new(&config);

    let mut scene = MemoryScene::new();
    let a = scene.add_node("GUI/A", "Options");
    let b1 = scene.add_node("GUI/B", "Options");
    registry.add_path_rule("GUI", MonitorStrategy::Slow);
    assert_eq!(registry.register_rules(&mut scene, &mut translator), 2);

    assert_eq!(registry.nodes_at("GUI/B"), &[b1]);
    assert_eq!(registry.unregister("GUI/B"), 1);
    assert!(registry.nodes_at("GUI/B").is_empty());

    assert!(registry.unregister_instance(a));
    assert!(!registry.unregister_instance(a));
    assert!(registry.is_empty());
    assert_eq!(registry.group_len(MonitorStrategy::Slow), 0);
}
