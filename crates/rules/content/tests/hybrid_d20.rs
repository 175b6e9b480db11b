use std::path::PathBuf;

use rules_content::{ContentFactory, RuleModuleLoader};
use rules_core::{AttributeMap, Value};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/hybrid-d20")
}

fn fighter_mage() -> AttributeMap {
    [
        ("strength", Value::from(16)),
        ("dexterity", Value::from(14)),
        ("constitution", Value::from(12)),
        ("wisdom", Value::from(10)),
        ("armor", Value::from("Chain Mail")),
        ("shield", Value::from("Buckler")),
        ("features.Dodge", Value::from(1)),
        ("features.Power Attack", Value::from(1)),
        ("features.Spellcasting", Value::from(1)),
        ("experience.Fighter", Value::from(600)),
        ("experience.Wizard", Value::from(500)),
        ("languages.Common", Value::from(1)),
        ("languages.Elven", Value::from(1)),
        ("skills.Climb", Value::from(2)),
        ("skills.Stealth", Value::from(3)),
    ]
    .into_iter()
    .collect()
}

fn number(n: i32) -> Option<Value> {
    Some(Value::from(n))
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn sample_content_loads_cleanly() {
    let content = ContentFactory::new(data_dir())
        .load()
        .expect("sample content should load");

    assert_eq!(content.config.name, "HybridD20");
    assert_eq!(content.config.engine.max_passes, 64);
    assert!(content.rules.issues().is_empty(), "{:?}", content.rules.issues());
    assert!(content.rules.cyclic_targets().is_empty());

    assert_eq!(content.rules.choices("armors")[2], "Chain Mail");
    assert_eq!(content.rules.choices("schools").len(), 4);
    assert!(content.rules.tables().contains("armorBonus"));
}

#[test]
fn modules_load_in_file_name_order() {
    let modules = RuleModuleLoader::load_dir(&data_dir().join("rules"))
        .expect("rules directory should load");

    let names: Vec<_> = modules
        .iter()
        .filter_map(|(path, _)| path.file_name()?.to_str())
        .collect();
    assert_eq!(
        names,
        ["00-abilities.ron", "10-combat.ron", "20-feats.ron", "30-magic.ron", "90-sheet.ron"]
    );
}

#[test]
fn later_modules_adjust_the_layout() {
    let rules = ContentFactory::new(data_dir())
        .load_rule_set()
        .expect("sample content should load");
    let sheet: Vec<_> = rules.layout().sheet().iter().map(|e| e.name.as_str()).collect();

    assert!(sheet.contains(&"Strength"));
    assert!(sheet.contains(&"Armor Class"));
    assert!(!sheet.contains(&"Experience Spent"));
    assert_eq!(rules.layout().editor()[0].params, ["races"]);
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn fighter_mage_sheet() {
    let content = ContentFactory::new(data_dir())
        .load()
        .expect("sample content should load");
    let eval = content.evaluator().evaluate(&fighter_mage());

    assert!(eval.converged());
    assert!(eval.diagnostics().is_empty(), "{:?}", eval.diagnostics());

    assert_eq!(eval.get("experienceTotal").cloned(), number(1100));
    assert_eq!(eval.get("level").cloned(), number(8));
    assert_eq!(eval.get("experienceSpent").cloned(), number(24));
    assert_eq!(eval.get("baseAttack").cloned(), number(6));
    assert_eq!(eval.get("meleeAttack").cloned(), number(9));
    // 10 + 2 (dexterity) + 5 (Chain Mail) + 1 (Buckler) + 1 (Dodge)
    assert_eq!(eval.get("armorClass").cloned(), number(19));
    assert_eq!(eval.get("combatManeuverDefense").cloned(), number(21));
    assert_eq!(eval.get("saveFortitude").cloned(), number(3));
    assert_eq!(eval.get("saveReflex").cloned(), number(4));
    assert_eq!(eval.get("saveWill").cloned(), number(2));
    assert_eq!(eval.get("hitPoints").cloned(), number(66));
    assert_eq!(eval.get("featCount").cloned(), number(3));
    assert_eq!(eval.get("languageCount").cloned(), number(2));
    assert_eq!(eval.get("casterLevel").cloned(), number(8));
}

#[test]
fn fighter_mage_notes() {
    let content = ContentFactory::new(data_dir())
        .load()
        .expect("sample content should load");
    let eval = content.evaluator().evaluate(&fighter_mage());

    let note = |name: &str| eval.note(name).map(|n| n.text.clone());
    assert_eq!(note("strength").as_deref(), Some("16 (3)"));
    assert_eq!(note("combatNotes.dodgeFeature").as_deref(), Some("+1 AC"));
    assert_eq!(
        note("combatNotes.powerAttackFeature").as_deref(),
        Some("-2 attack/+4 damage")
    );
    assert_eq!(
        note("magicNotes.spellcastingFeature").as_deref(),
        Some("Cast spells up to level 4, save DC 10")
    );
}

#[test]
fn missing_features_leave_notes_inactive() {
    let content = ContentFactory::new(data_dir())
        .load()
        .expect("sample content should load");
    let mut inputs = fighter_mage();
    inputs.remove("features.Power Attack");
    inputs.remove("shield");

    let eval = content.evaluator().evaluate(&inputs);
    assert!(eval.diagnostics().is_empty(), "{:?}", eval.diagnostics());
    assert_eq!(eval.get("armorClass").cloned(), number(18));
    assert_eq!(eval.get("combatNotes.powerAttackFeature"), None);

    let power_attack = eval
        .note("combatNotes.powerAttackFeature")
        .expect("note should still render");
    assert!(!power_attack.active);
    assert_eq!(power_attack.text, "- attack/+ damage");
}

// ============================================================================
// Ad-hoc directories
// ============================================================================

#[test]
fn empty_directory_uses_defaults() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    std::fs::create_dir(dir.path().join("rules")).expect("rules dir should be created");

    let content = ContentFactory::new(dir.path())
        .load()
        .expect("empty content should load");
    assert_eq!(content.config.engine.max_passes, 64);
    assert_eq!(content.rules.rule_count(), 0);
}

#[test]
fn broken_formula_is_reported_not_fatal() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let rules_dir = dir.path().join("rules");
    std::fs::create_dir(&rules_dir).expect("rules dir should be created");
    std::fs::write(
        rules_dir.join("00-broken.ron"),
        r#"#![enable(implicit_some)]
(
    rules: [
        (target: "speed", contributions: [(op: "=", expr: "30")]),
        (target: "broken", contributions: [(op: "=", expr: "floor(")]),
    ],
)"#,
    )
    .expect("module should be written");

    let rules = ContentFactory::new(dir.path())
        .load_rule_set()
        .expect("content should load");
    assert_eq!(rules.issues().len(), 1);
    assert_eq!(
        rules.apply_rules(&AttributeMap::new()).get("speed"),
        Some(&Value::from(30))
    );
}

#[test]
fn malformed_module_fails_to_load() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let rules_dir = dir.path().join("rules");
    std::fs::create_dir(&rules_dir).expect("rules dir should be created");
    std::fs::write(rules_dir.join("00-bad.ron"), "(rules: [(target: 1)])")
        .expect("module should be written");

    let error = ContentFactory::new(dir.path())
        .load()
        .expect_err("malformed RON should fail");
    assert!(error.to_string().contains("00-bad.ron"));
}

#[test]
fn missing_rules_directory_fails() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    assert!(ContentFactory::new(dir.path()).load_rule_set().is_err());
}
