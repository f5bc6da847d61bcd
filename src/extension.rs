//! The tree-construction extension: hook callbacks invoked by the upstream
//! code-generation walk.
//!
//! Per alternative the extension is in exactly one of two modes, decided
//! once at alternative entry from the rewrite flag and never changing
//! mid-alternative:
//!
//! ```text
//!               has_rewrite?
//!               ┌── false ──→ Automatic        root decl at entry,
//!  alt entry ───┤                              promote/attach per element,
//!               │                              assign result at exit
//!               └── true ───→ ExplicitRewrite  defer tree shape to the
//!                                              rewrite; only track element
//!                                              occurrences into lists
//! ```
//!
//! Independently of mode, `rule_postamble` appends exactly one
//! `RuleAstCleanup` per rule.
//!
//! Hooks are functions of `(context, input sequence) → output sequence`;
//! the only other state they touch is the rule-scoped declaration set,
//! threaded in explicitly. They never read ambient generator state.

use std::fmt;

use crate::model::{
    find_op, with_appended, CodeBlock, Decl, ElementRef, Op, OpIndex, OpKind, RuleFunction,
};

// ══════════════════════════════════════════════════════════════════════════════
// Context
// ══════════════════════════════════════════════════════════════════════════════

/// Grammar-wide option snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrammarOpts {
    /// Whether the grammar requests automatic tree output at all.
    pub build_ast: bool,
}

/// Immutable per-call context for one hook invocation.
#[derive(Debug, Clone, Copy)]
pub struct HookCtx {
    /// Whether the current alternative carries an explicit rewrite.
    pub has_rewrite: bool,
    /// Grammar-wide options.
    pub opts: GrammarOpts,
}

// ══════════════════════════════════════════════════════════════════════════════
// WeaveError
// ══════════════════════════════════════════════════════════════════════════════

/// Internal consistency faults.
///
/// These indicate a bug in the upstream generation walk, not a grammar
/// error: every element hook assumes the plain operation it augments was
/// already produced. Faults are fatal to the generation pass and are never
/// caught locally — they propagate to the invoking pipeline, which halts
/// generation for the offending rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeaveError {
    /// A hook expected a predecessor operation that is not present in the
    /// incoming sequence.
    MissingOperation { kind: OpKind, element: ElementRef },
}

impl fmt::Display for WeaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeaveError::MissingOperation { kind, element } => {
                write!(
                    f,
                    "internal error: no {} operation for element '{}' in the incoming sequence",
                    kind, element
                )
            },
        }
    }
}

impl std::error::Error for WeaveError {}

// ══════════════════════════════════════════════════════════════════════════════
// Block boundary hooks
// ══════════════════════════════════════════════════════════════════════════════

/// Alternative entry.
///
/// Automatic mode registers the block's root accumulator (idempotent, one
/// per block); with an explicit rewrite nothing is added.
pub fn enter_alternative(ctx: HookCtx, blk: &mut CodeBlock) {
    if !ctx.has_rewrite {
        blk.add_local_decl(Decl::Root);
    }
}

/// Alternative exit.
///
/// Automatic mode appends `AssignTreeResult` as the block's final op; with
/// an explicit rewrite the rewrite expression itself produces the result
/// and nothing is appended.
pub fn finish_alternative(ctx: HookCtx, blk: &mut CodeBlock) {
    if !ctx.has_rewrite {
        blk.add_op(Op::AssignTreeResult);
    }
}

/// Rule postamble, after all of the rule's alternatives are generated.
///
/// Always appends exactly one `RuleAstCleanup`, irrespective of rewrite
/// mode. Called once per rule by the upstream walk.
pub fn rule_postamble(ops: Vec<Op>) -> Vec<Op> {
    with_appended(ops, Op::RuleAstCleanup)
}

// ══════════════════════════════════════════════════════════════════════════════
// Element hooks
// ══════════════════════════════════════════════════════════════════════════════

/// A code-generation event at one element position.
///
/// The set is closed: the upstream walk produces exactly these events, and
/// dispatch is an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementEvent {
    /// Sub-rule invocation in root position.
    RootRule,
    /// Token match in root position.
    RootToken,
    /// Sub-rule invocation in leaf position.
    LeafRule,
    /// Token match in leaf position.
    LeafToken,
    /// Literal-text match in leaf position; handled identically to
    /// `LeafToken`.
    StringRef,
}

/// Dispatch an element event to its hook.
pub fn element_hook(
    event: ElementEvent,
    ctx: HookCtx,
    rf: &mut RuleFunction,
    element: &ElementRef,
    ops: Vec<Op>,
) -> Result<Vec<Op>, WeaveError> {
    match event {
        ElementEvent::RootRule => root_rule(ctx, element, ops),
        ElementEvent::RootToken => root_token(ctx, element, ops),
        ElementEvent::LeafRule => leaf_rule(ctx, rf, element, ops),
        ElementEvent::LeafToken => leaf_token(ctx, rf, element, ops),
        ElementEvent::StringRef => string_ref(ctx, rf, element, ops),
    }
}

/// Locate the plain op a hook builds upon, or fault.
fn locate(ops: &[Op], kind: OpKind, element: &ElementRef) -> Result<OpIndex, WeaveError> {
    find_op(ops, kind)
        .ok_or_else(|| WeaveError::MissingOperation { kind, element: element.clone() })
}

/// Root-position sub-rule invocation.
///
/// With a rewrite the sequence is returned unchanged — the rewrite
/// expression decides tree shape. Otherwise the invocation's result is
/// promoted to root of the accumulating tree; the new op is appended last
/// and prior order is preserved.
pub fn root_rule(
    ctx: HookCtx,
    element: &ElementRef,
    ops: Vec<Op>,
) -> Result<Vec<Op>, WeaveError> {
    if ctx.has_rewrite {
        return Ok(ops);
    }
    let src = locate(&ops, OpKind::InvokeRule, element)?;
    Ok(with_appended(ops, Op::RuleBecomeRoot { element: element.clone(), src }))
}

/// Root-position token match. Same shape as [`root_rule`] with the token
/// promotion op.
pub fn root_token(
    ctx: HookCtx,
    element: &ElementRef,
    ops: Vec<Op>,
) -> Result<Vec<Op>, WeaveError> {
    if ctx.has_rewrite {
        return Ok(ops);
    }
    let src = locate(&ops, OpKind::MatchToken, element)?;
    Ok(with_appended(ops, Op::TokenBecomeRoot { element: element.clone(), src }))
}

/// Leaf-position sub-rule invocation.
///
/// With a rewrite the element may be referenced later (possibly several
/// times) by the rewrite expression, so its result is tracked into a
/// rule-scoped list accumulator — the accumulator is declared at most once
/// per distinct element per rule function, a tracking op is appended per
/// occurrence. In automatic mode the result is attached as a leaf child
/// under the current root instead.
pub fn leaf_rule(
    ctx: HookCtx,
    rf: &mut RuleFunction,
    element: &ElementRef,
    ops: Vec<Op>,
) -> Result<Vec<Op>, WeaveError> {
    let src = locate(&ops, OpKind::InvokeRule, element)?;
    if ctx.has_rewrite {
        rf.add_local_decl(Decl::ElementList { element: element.clone() });
        Ok(with_appended(ops, Op::TrackRuleElement { element: element.clone(), src }))
    } else {
        Ok(with_appended(ops, Op::AddRuleLeaf { element: element.clone(), src }))
    }
}

/// Leaf-position token match. Same logic as [`leaf_rule`] with the token
/// op kinds.
pub fn leaf_token(
    ctx: HookCtx,
    rf: &mut RuleFunction,
    element: &ElementRef,
    ops: Vec<Op>,
) -> Result<Vec<Op>, WeaveError> {
    let src = locate(&ops, OpKind::MatchToken, element)?;
    if ctx.has_rewrite {
        rf.add_local_decl(Decl::ElementList { element: element.clone() });
        Ok(with_appended(ops, Op::TrackTokenElement { element: element.clone(), src }))
    } else {
        Ok(with_appended(ops, Op::AddTokenLeaf { element: element.clone(), src }))
    }
}

/// Literal-text reference: handled identically to a leaf token.
pub fn string_ref(
    ctx: HookCtx,
    rf: &mut RuleFunction,
    element: &ElementRef,
    ops: Vec<Op>,
) -> Result<Vec<Op>, WeaveError> {
    leaf_token(ctx, rf, element, ops)
}

// ══════════════════════════════════════════════════════════════════════════════
// Implicit-label predicate
// ══════════════════════════════════════════════════════════════════════════════

/// Whether an element needs a synthesized label so later generated code can
/// address its value: true exactly when it carries zero explicit labels and
/// the grammar has automatic tree output enabled.
///
/// Pure predicate; label synthesis itself is the caller's concern.
pub fn needs_implicit_label(ctx: HookCtx, labels: &[String]) -> bool {
    labels.is_empty() && ctx.opts.build_ast
}
