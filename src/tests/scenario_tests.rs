//! End-to-end scenarios through the reference walk.

use pretty_assertions::assert_eq;

use crate::extension::GrammarOpts;
use crate::model::{Decl, ElementRef, Op};
use crate::walk::{generate_rule, AltSpec, ElementPosition, ElementSpec, RuleGenSpec};

fn opts() -> GrammarOpts {
    GrammarOpts { build_ast: true }
}

/// One root-position sub-rule call `R`, no rewrite: the invocation is
/// promoted to root, the root accumulator is declared, and the assign-result
/// op closes the block.
#[test]
fn test_scenario_root_rule_automatic() {
    let spec = RuleGenSpec {
        name: "start".to_string(),
        alts: vec![AltSpec {
            has_rewrite: false,
            elements: vec![ElementSpec::rule("R", ElementPosition::Root)],
        }],
    };

    let out = generate_rule(&spec, opts()).unwrap();
    let blk = &out.blocks[0];
    let r = ElementRef::rule("R");

    assert_eq!(blk.decls, vec![Decl::Root]);
    assert_eq!(
        blk.ops,
        vec![
            Op::InvokeRule { element: r.clone() },
            Op::RuleBecomeRoot { element: r, src: 0 },
            Op::AssignTreeResult,
        ]
    );
    assert_eq!(out.rule_decls, vec![]);
    assert_eq!(out.postamble, vec![Op::RuleAstCleanup]);
}

/// One leaf-position token match `T`, no rewrite: exactly one leaf-attach op
/// is gained, placed after the match op it references.
#[test]
fn test_scenario_leaf_token_automatic() {
    let spec = RuleGenSpec {
        name: "item".to_string(),
        alts: vec![AltSpec {
            has_rewrite: false,
            elements: vec![
                ElementSpec::rule("R", ElementPosition::Root),
                ElementSpec::token("T", ElementPosition::Leaf),
            ],
        }],
    };

    let out = generate_rule(&spec, opts()).unwrap();
    let blk = &out.blocks[0];
    let r = ElementRef::rule("R");
    let t = ElementRef::token("T");

    assert_eq!(
        blk.ops,
        vec![
            Op::InvokeRule { element: r.clone() },
            Op::RuleBecomeRoot { element: r, src: 0 },
            Op::MatchToken { element: t.clone() },
            Op::AddTokenLeaf { element: t, src: 2 },
            Op::AssignTreeResult,
        ]
    );
}

/// A rewrite alternative with sub-rule `X` occurring twice: one list
/// declaration, two tracking ops — one per occurrence.
#[test]
fn test_scenario_repeated_element_with_rewrite() {
    let spec = RuleGenSpec {
        name: "pair".to_string(),
        alts: vec![AltSpec {
            has_rewrite: true,
            elements: vec![
                ElementSpec::rule("X", ElementPosition::Leaf),
                ElementSpec::rule("X", ElementPosition::Leaf),
            ],
        }],
    };

    let out = generate_rule(&spec, opts()).unwrap();
    let blk = &out.blocks[0];
    let x = ElementRef::rule("X");

    // No automatic-mode artifacts at all
    assert_eq!(blk.decls, vec![]);
    assert_eq!(
        blk.ops,
        vec![
            Op::InvokeRule { element: x.clone() },
            Op::TrackRuleElement { element: x.clone(), src: 0 },
            Op::InvokeRule { element: x.clone() },
            Op::TrackRuleElement { element: x.clone(), src: 2 },
        ]
    );
    // Exactly one accumulator for X across both occurrences
    assert_eq!(out.rule_decls, vec![Decl::ElementList { element: x }]);
}

/// Mixed rewrite modes across one rule's alternatives: each alternative is
/// decided independently, and the cleanup op still appears exactly once.
#[test]
fn test_scenario_mixed_modes_one_cleanup() {
    let spec = RuleGenSpec {
        name: "mixed".to_string(),
        alts: vec![
            AltSpec {
                has_rewrite: false,
                elements: vec![ElementSpec::token("A", ElementPosition::Root)],
            },
            AltSpec {
                has_rewrite: true,
                elements: vec![ElementSpec::token("B", ElementPosition::Leaf)],
            },
        ],
    };

    let out = generate_rule(&spec, opts()).unwrap();
    let a = ElementRef::token("A");
    let b = ElementRef::token("B");

    assert_eq!(out.blocks[0].decls, vec![Decl::Root]);
    assert_eq!(
        out.blocks[0].ops,
        vec![
            Op::MatchToken { element: a.clone() },
            Op::TokenBecomeRoot { element: a, src: 0 },
            Op::AssignTreeResult,
        ]
    );

    assert_eq!(out.blocks[1].decls, vec![]);
    assert_eq!(
        out.blocks[1].ops,
        vec![
            Op::MatchToken { element: b.clone() },
            Op::TrackTokenElement { element: b.clone(), src: 0 },
        ]
    );
    assert_eq!(out.rule_decls, vec![Decl::ElementList { element: b }]);
    assert_eq!(out.postamble, vec![Op::RuleAstCleanup]);
}

/// A leaf-position string literal is woven exactly like a leaf token.
#[test]
fn test_scenario_string_literal_leaf() {
    let spec = RuleGenSpec {
        name: "sum".to_string(),
        alts: vec![AltSpec {
            has_rewrite: false,
            elements: vec![
                ElementSpec::rule("term", ElementPosition::Root),
                ElementSpec::string_lit("'+'", ElementPosition::Leaf),
                ElementSpec::rule("term2", ElementPosition::Leaf),
            ],
        }],
    };

    let out = generate_rule(&spec, opts()).unwrap();
    let plus = ElementRef::string_lit("'+'");
    assert_eq!(out.blocks[0].ops[2], Op::MatchToken { element: plus.clone() });
    assert_eq!(out.blocks[0].ops[3], Op::AddTokenLeaf { element: plus, src: 2 });
}

/// The implicit-label decision is surfaced per unlabeled occurrence, and
/// suppressed both by explicit labels and by the grammar-wide option.
#[test]
fn test_scenario_implicit_label_surface() {
    let spec = RuleGenSpec {
        name: "labels".to_string(),
        alts: vec![AltSpec {
            has_rewrite: false,
            elements: vec![
                ElementSpec::rule("R", ElementPosition::Root),
                ElementSpec::token("T", ElementPosition::Leaf).with_label("t"),
            ],
        }],
    };

    let out = generate_rule(&spec, opts()).unwrap();
    assert_eq!(out.implicit_label_elements, vec![ElementRef::rule("R")]);

    let out = generate_rule(&spec, GrammarOpts { build_ast: false }).unwrap();
    assert_eq!(out.implicit_label_elements, vec![]);
}
