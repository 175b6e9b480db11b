use rules_core::{
    AttributeMap, Diagnostic, EngineConfig, Evaluator, Formula, Operator, RuleSet, RuleSetBuilder,
    Source, Value,
};

fn character(entries: &[(&str, Value)]) -> AttributeMap {
    entries.iter().cloned().collect()
}

fn number(value: f64) -> Value {
    Value::Number(value)
}

/// A small slice of a d20 rule set: abilities, modifiers, combat, notes.
fn d20_rules() -> RuleSet {
    let mut builder = RuleSetBuilder::new();
    builder
        .define_rule(
            "strengthModifier",
            [("strength", Operator::Set, "floor((source - 10) / 2)")],
        )
        .define_rule(
            "dexterityModifier",
            [("dexterity", Operator::Set, "floor((source - 10) / 2)")],
        )
        .define_rule("meleeAttack", [("strengthModifier", Operator::Add, "source")])
        .define_rule(
            "armorClass",
            [
                ("", Operator::Set, "10"),
                ("dexterityModifier", Operator::Add, "source"),
                ("armor", Operator::Add, "table('armorBonus', source)"),
            ],
        )
        .define_rule(
            "combatNotes.dodgeFeature",
            [("features.Dodge", Operator::Set, "1")],
        )
        .define_rule("armorClass", [("combatNotes.dodgeFeature", Operator::Add, "1")])
        .define_rule("experienceTotal", [("experience.*", Operator::Add, Formula::SOURCE)])
        .define_rule(
            "level",
            [(
                "experienceTotal",
                Operator::Set,
                "floor(1 + log(source / 1000 + 1) / log(1.1))",
            )],
        )
        .define_table("armorBonus", [("Leather", 2), ("Chain Mail", 5)])
        .define_notes([
            "combatNotes.dodgeFeature:+%V AC",
            "sanityNotes.meleeAttack:%V to hit",
        ]);
    builder.build()
}

// ============================================================================
// Properties from the engine contract
// ============================================================================

#[test]
fn evaluation_is_deterministic() {
    let rules = d20_rules();
    let inputs = character(&[
        ("strength", number(16.0)),
        ("dexterity", number(13.0)),
        ("armor", "Leather".into()),
        ("features.Dodge", number(1.0)),
        ("experience.Fighter", number(600.0)),
        ("experience.Wizard", number(500.0)),
    ]);

    let first = rules.evaluate(&inputs);
    let second = rules.evaluate(&inputs);
    assert_eq!(first.attributes(), second.attributes());
    assert_eq!(first.notes(), second.notes());
    assert_eq!(first.diagnostics(), second.diagnostics());
}

#[test]
fn first_default_wins() {
    let mut builder = RuleSetBuilder::new();
    builder
        .define_rule("A", [("", Operator::Set, "1")])
        .define_rule("A", [("", Operator::Set, "2")]);
    let rules = builder.build();

    let out = rules.apply_rules(&AttributeMap::new());
    assert_eq!(out.get("A"), Some(&number(1.0)));
}

#[test]
fn family_sources_sum_every_member() {
    let mut builder = RuleSetBuilder::new();
    builder.define_rule_with(
        "Total",
        Source::parse(r"/^x\./").expect("pattern should compile"),
        Operator::Add,
        Formula::source(),
    );
    let rules = builder.build();

    let inputs = character(&[
        ("x.1", number(3.0)),
        ("x.2", number(4.5)),
        ("x.3", number(-1.0)),
        ("xy", number(100.0)),
    ]);
    assert_eq!(rules.apply_rules(&inputs).get("Total"), Some(&number(6.5)));
}

#[test]
fn max_and_min_clamp() {
    for (operator, expected) in [(Operator::Max, 5.0), (Operator::Min, 3.0)] {
        let mut builder = RuleSetBuilder::new();
        builder.define_rule("B", [("S1", operator, "5"), ("S2", operator, "3")]);
        let rules = builder.build();

        let inputs = character(&[("S1", number(1.0)), ("S2", number(1.0))]);
        assert_eq!(
            rules.apply_rules(&inputs).get("B"),
            Some(&number(expected)),
            "operator {operator}"
        );
    }
}

#[test]
fn chained_derivation_needs_no_caller_ordering() {
    let rules = d20_rules();
    let out = rules.apply_rules(&character(&[("strength", number(16.0))]));

    assert_eq!(out.get("strengthModifier"), Some(&number(3.0)));
    assert_eq!(out.get("meleeAttack"), Some(&number(3.0)));
}

#[test]
fn deep_chain_through_tables_and_families() {
    let rules = d20_rules();
    let eval = rules.evaluate(&character(&[
        ("dexterity", number(14.0)),
        ("armor", "Chain Mail".into()),
        ("features.Dodge", number(1.0)),
        ("experience.Fighter", number(600.0)),
        ("experience.Wizard", number(500.0)),
    ]));

    assert!(eval.converged());
    // 10 + 2 (dexterity) + 5 (Chain Mail) + 1 (Dodge)
    assert_eq!(eval.get("armorClass"), Some(&number(18.0)));
    assert_eq!(eval.get("experienceTotal"), Some(&number(1100.0)));
    assert_eq!(eval.get("level"), Some(&number(8.0)));
    assert_eq!(
        eval.note("combatNotes.dodgeFeature").map(ToString::to_string),
        Some("combatNotes.dodgeFeature:+1 AC".to_owned())
    );
}

#[test]
fn notes_substitute_and_blank_unresolved_values() {
    let mut builder = RuleSetBuilder::new();
    builder
        .define_rule("foo", [("bar", Operator::Set, "source")])
        .define_note("foo:+%V HP");
    let rules = builder.build();

    let resolved = rules.evaluate(&character(&[("bar", number(5.0))]));
    assert_eq!(resolved.notes()[0].to_string(), "foo:+5 HP");
    assert_eq!(resolved.active_notes().count(), 1);

    let unresolved = rules.evaluate(&AttributeMap::new());
    assert_eq!(unresolved.notes()[0].to_string(), "foo:+ HP");
    assert_eq!(unresolved.active_notes().count(), 0);
}

#[test]
fn missing_sources_leave_targets_absent() {
    let mut builder = RuleSetBuilder::new();
    builder
        .define_rule("orphan", [("neverDefined", Operator::Add, "source * 2")])
        .define_rule("usesOrphan", [("", Operator::Set, "orphan + 1")])
        .define_rule("independent", [("strength", Operator::Set, "source")])
        .define_rule("broken", [("", Operator::Set, "frobnicate(1)")]);
    let rules = builder.build();
    assert_eq!(rules.issues().len(), 1);

    let eval = rules.evaluate(&character(&[("strength", number(12.0))]));
    assert_eq!(eval.get("orphan"), None);
    assert_eq!(eval.get("usesOrphan"), None);
    assert_eq!(eval.get("broken"), None);
    assert_eq!(eval.get("independent"), Some(&number(12.0)));
    assert!(eval.converged());
}

#[test]
fn re_evaluating_output_does_not_double_count() {
    let rules = d20_rules();
    let inputs = character(&[
        ("strength", number(12.0)),
        ("dexterity", number(16.0)),
        ("experience.Rogue", number(2500.0)),
    ]);

    let first = rules.apply_rules(&inputs);
    let second = rules.apply_rules(&first);

    let accumulated = ["armorClass", "experienceTotal", "meleeAttack"];
    for (name, value) in first.iter() {
        if !accumulated.contains(&name.as_str()) {
            assert_eq!(second.get(name.as_str()), Some(value), "{name} changed");
        }
    }
    assert_eq!(second.len(), first.len());

    // An input is the base a target accumulates onto, so a fed-back
    // accumulation gains its contributions once more, and only once.
    assert_eq!(first.get("armorClass"), Some(&number(13.0)));
    assert_eq!(second.get("armorClass"), Some(&number(16.0)));
    assert_eq!(first.get("experienceTotal"), Some(&number(2500.0)));
    assert_eq!(second.get("experienceTotal"), Some(&number(5000.0)));
    assert_eq!(first.get("meleeAttack"), Some(&number(1.0)));
    assert_eq!(second.get("meleeAttack"), Some(&number(2.0)));
    assert_eq!(second.get("level"), first.get("level"));
}

#[test]
fn oversized_formula_is_an_issue_not_a_crash() {
    // Just under the length limit, far past the nesting limit.
    let chain = vec!["1"; EngineConfig::MAX_FORMULA_LEN / 2].join("+");
    assert!(chain.len() <= EngineConfig::MAX_FORMULA_LEN);

    let mut builder = RuleSetBuilder::new();
    builder
        .define_rule("huge", [("", Operator::Set, chain.as_str())])
        .define_rule("speed", [("", Operator::Set, "30")]);
    let rules = builder.build();
    assert_eq!(rules.issues().len(), 1);

    let eval = rules.evaluate(&AttributeMap::new());
    assert!(eval.converged());
    assert_eq!(eval.get("huge"), None);
    assert_eq!(eval.get("speed"), Some(&number(30.0)));
}

#[test]
fn boolean_flags_count_as_one() {
    let mut builder = RuleSetBuilder::new();
    builder
        .define_rule("featCount", [("features.*", Operator::Add, Formula::SOURCE)])
        .define_rule("bestFlag", [("features.*", Operator::Max, Formula::SOURCE)])
        .define_note("featCount:%V feats");
    let rules = builder.build();

    let one = rules.evaluate(&character(&[("features.Dodge", Value::Bool(true))]));
    assert_eq!(one.get("featCount"), Some(&number(1.0)));
    assert_eq!(one.get("bestFlag"), Some(&number(1.0)));
    assert_eq!(one.notes()[0].to_string(), "featCount:1 feats");

    let two = rules.evaluate(&character(&[
        ("features.Dodge", Value::Bool(true)),
        ("features.Power Attack", Value::Bool(true)),
    ]));
    assert_eq!(two.get("featCount"), Some(&number(2.0)));
    assert_eq!(two.get("bestFlag"), Some(&number(1.0)));
}

#[test]
fn add_without_ready_sources_stays_unset() {
    let mut builder = RuleSetBuilder::new();
    builder.define_rule("skillPoints", [("skills.*", Operator::Add, Formula::SOURCE)]);
    let rules = builder.build();

    assert_eq!(rules.apply_rules(&AttributeMap::new()).get("skillPoints"), None);
}

// ============================================================================
// Cycles
// ============================================================================

#[test]
fn settling_cycle_converges() {
    // Each side only mirrors the other, so the cycle settles on the input.
    let mut builder = RuleSetBuilder::new();
    builder
        .define_rule("hitPoints", [("maxHitPoints", Operator::Set, "source")])
        .define_rule("maxHitPoints", [("hitPoints", Operator::Set, "source")]);
    let rules = builder.build();
    assert_eq!(rules.cyclic_targets().len(), 2);

    let eval = rules.evaluate(&character(&[("hitPoints", number(8.0))]));
    assert!(eval.converged());
    assert_eq!(eval.get("maxHitPoints"), Some(&number(8.0)));
}

#[test]
fn diverging_cycle_hits_the_pass_limit() {
    let mut builder = RuleSetBuilder::new();
    builder.define_rule("counter", [("counter", Operator::Add, "source")]);
    let rules = builder.build();

    let eval = Evaluator::new(&rules)
        .with_config(EngineConfig::with_max_passes(8))
        .evaluate(&character(&[("counter", number(1.0))]));

    assert!(!eval.converged());
    assert_eq!(eval.get("counter"), Some(&number(1.0)));
    assert!(eval.diagnostics().iter().any(|d| matches!(
        d,
        Diagnostic::NonConvergent { attributes, passes: 8 } if attributes.len() == 1
    )));
    assert_eq!(eval.problems().count(), 1);
}

#[test]
fn rule_sets_are_shareable_across_threads() {
    let rules = d20_rules();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let rules = rules.clone();
            std::thread::spawn(move || {
                let inputs = character(&[("strength", number(10.0 + 2.0 * i as f64))]);
                rules.apply_rules(&inputs).get("meleeAttack").cloned()
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("evaluation thread should not panic"))
        .collect();
    assert_eq!(
        results,
        vec![
            Some(number(0.0)),
            Some(number(1.0)),
            Some(number(2.0)),
            Some(number(3.0))
        ]
    );
}
