//! Reference generation walk.
//!
//! The real host is a full code-generation pipeline; this module is the
//! minimal driver that honors the hook contract so the extension can be
//! exercised end-to-end:
//!
//! ```text
//! RuleGenSpec ──→ per alternative:  enter_alternative
//!                                   per element, in grammar order:
//!                                     plain op, then element_hook
//!                                   finish_alternative
//!                 once per rule:    rule_postamble
//! ```
//!
//! All state is per-rule and fully isolated, so independent rules can be
//! generated in parallel (`generate_rules`).

use rayon::prelude::*;

use crate::extension::{
    element_hook, enter_alternative, finish_alternative, needs_implicit_label, rule_postamble,
    ElementEvent, GrammarOpts, HookCtx, WeaveError,
};
use crate::model::{CodeBlock, Decl, ElementRef, ElementSource, Op, RuleFunction};

// ══════════════════════════════════════════════════════════════════════════════
// Input surface
// ══════════════════════════════════════════════════════════════════════════════

/// Position of an element within its alternative's tree shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementPosition {
    /// The element determining the top node of the alternative's tree.
    Root,
    /// A child under the established root.
    Leaf,
}

/// One grammar element of an alternative, as seen by the walk.
#[derive(Debug, Clone)]
pub struct ElementSpec {
    /// Element name as written in the grammar.
    pub name: String,
    /// Element kind.
    pub source: ElementSource,
    /// Position within the alternative's tree shape.
    pub position: ElementPosition,
    /// Explicit labels assigned by the grammar author.
    pub labels: Vec<String>,
}

impl ElementSpec {
    /// A sub-rule element with no explicit labels.
    pub fn rule(name: impl Into<String>, position: ElementPosition) -> Self {
        ElementSpec {
            name: name.into(),
            source: ElementSource::Rule,
            position,
            labels: Vec::new(),
        }
    }

    /// A named-token element with no explicit labels.
    pub fn token(name: impl Into<String>, position: ElementPosition) -> Self {
        ElementSpec {
            name: name.into(),
            source: ElementSource::Token,
            position,
            labels: Vec::new(),
        }
    }

    /// A literal-text element with no explicit labels.
    pub fn string_lit(name: impl Into<String>, position: ElementPosition) -> Self {
        ElementSpec {
            name: name.into(),
            source: ElementSource::StringLit,
            position,
            labels: Vec::new(),
        }
    }

    /// Attach an explicit label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// The element reference carried by this spec's operations.
    pub fn element_ref(&self) -> ElementRef {
        ElementRef { name: self.name.clone(), source: self.source }
    }
}

/// One alternative of a rule.
#[derive(Debug, Clone)]
pub struct AltSpec {
    /// Whether the grammar author supplied an explicit rewrite.
    pub has_rewrite: bool,
    /// Elements in grammar order.
    pub elements: Vec<ElementSpec>,
}

/// A rule to generate.
#[derive(Debug, Clone)]
pub struct RuleGenSpec {
    pub name: String,
    pub alts: Vec<AltSpec>,
}

// ══════════════════════════════════════════════════════════════════════════════
// Output
// ══════════════════════════════════════════════════════════════════════════════

/// Everything the walk produced for one rule.
#[derive(Debug, Clone)]
pub struct RuleOutput {
    pub name: String,
    /// One finished code block per alternative, in grammar order.
    pub blocks: Vec<CodeBlock>,
    /// Rule-scoped declarations (element list accumulators), in
    /// deterministic order.
    pub rule_decls: Vec<Decl>,
    /// Trailing rule operations; always ends with `RuleAstCleanup`.
    pub postamble: Vec<Op>,
    /// Element occurrences for which the implicit-label predicate answered
    /// yes. The labeling step itself happens downstream.
    pub implicit_label_elements: Vec<ElementRef>,
}

// ══════════════════════════════════════════════════════════════════════════════
// The walk
// ══════════════════════════════════════════════════════════════════════════════

/// The plain op for an element, as the upstream generator would plan it.
fn plain_op(element: &ElementRef) -> Op {
    match element.source {
        ElementSource::Rule => Op::InvokeRule { element: element.clone() },
        ElementSource::Token | ElementSource::StringLit => {
            Op::MatchToken { element: element.clone() }
        },
    }
}

/// Which extension event an element triggers.
fn event_for(spec: &ElementSpec) -> ElementEvent {
    match (spec.position, spec.source) {
        (ElementPosition::Root, ElementSource::Rule) => ElementEvent::RootRule,
        (ElementPosition::Root, ElementSource::Token)
        | (ElementPosition::Root, ElementSource::StringLit) => ElementEvent::RootToken,
        (ElementPosition::Leaf, ElementSource::Rule) => ElementEvent::LeafRule,
        (ElementPosition::Leaf, ElementSource::Token) => ElementEvent::LeafToken,
        (ElementPosition::Leaf, ElementSource::StringLit) => ElementEvent::StringRef,
    }
}

/// Generate one rule: run the contractual hook order over every alternative
/// and finish with the rule postamble.
///
/// # Errors
///
/// Propagates [`WeaveError`] unchanged; a fault halts generation for this
/// rule.
pub fn generate_rule(spec: &RuleGenSpec, opts: GrammarOpts) -> Result<RuleOutput, WeaveError> {
    let mut rf = RuleFunction::new(&spec.name);
    let mut blocks = Vec::with_capacity(spec.alts.len());
    let mut implicit_label_elements = Vec::new();

    for alt in &spec.alts {
        let ctx = HookCtx { has_rewrite: alt.has_rewrite, opts };
        let mut blk = CodeBlock::new();
        enter_alternative(ctx, &mut blk);

        for el in &alt.elements {
            let element = el.element_ref();
            // The element's own little sequence: the plain op, then whatever
            // the extension weaves in for it.
            let ops = vec![plain_op(&element)];
            let ops = element_hook(event_for(el), ctx, &mut rf, &element, ops)?;
            // Splice into the block, rebasing predecessor references to
            // block-absolute indices.
            let base = blk.ops.len();
            for op in ops {
                blk.add_op(op.rebased(base));
            }

            if needs_implicit_label(ctx, &el.labels) {
                implicit_label_elements.push(element);
            }
        }

        finish_alternative(ctx, &mut blk);
        blocks.push(blk);
    }

    // Exactly once per rule, whatever the alternatives' rewrite modes were.
    let postamble = rule_postamble(Vec::new());

    Ok(RuleOutput {
        name: spec.name.clone(),
        blocks,
        rule_decls: rf.decls().cloned().collect(),
        postamble,
        implicit_label_elements,
    })
}

/// Generate many rules in parallel.
///
/// Each rule's state is fully isolated — no mutable structures are shared
/// across rules — so rule order in the output matches input order while the
/// work itself is distributed.
pub fn generate_rules(
    specs: &[RuleGenSpec],
    opts: GrammarOpts,
) -> Result<Vec<RuleOutput>, WeaveError> {
    specs
        .par_iter()
        .map(|spec| generate_rule(spec, opts))
        .collect()
}
