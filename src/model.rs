//! Output model for woven tree-construction code.
//!
//! Operations and declarations are *planned* code-generation actions, not
//! rendered text: the upstream walk produces the plain ops (`InvokeRule`,
//! `MatchToken`), the extension hooks append the tree-construction ops, and
//! a downstream renderer (outside this crate) turns the finished sequences
//! into target-language source. Operation order is semantically meaningful —
//! it becomes execution order in the generated parser.
//!
//! Derived ops reference the plain op whose result they build upon by index
//! within the same sequence. Indices stay valid because hooks only ever
//! append.

use std::collections::BTreeSet;
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Element references
// ══════════════════════════════════════════════════════════════════════════════

/// What kind of grammar element a reference names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementSource {
    /// A sub-rule invocation (nonterminal).
    Rule,
    /// A named token (terminal).
    Token,
    /// A literal-text match (e.g., `'+'`); behaves as a token.
    StringLit,
}

/// Reference to the grammar element an operation acts on.
///
/// `ElementList` declaration dedup is keyed on the whole reference, so two
/// occurrences of the same sub-rule within one rule function share a single
/// list accumulator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementRef {
    /// Element name as written in the grammar (e.g., "expr", "ID", "'+'").
    pub name: String,
    /// Element kind.
    pub source: ElementSource,
}

impl ElementRef {
    /// Reference to a sub-rule element.
    pub fn rule(name: impl Into<String>) -> Self {
        ElementRef { name: name.into(), source: ElementSource::Rule }
    }

    /// Reference to a named token element.
    pub fn token(name: impl Into<String>) -> Self {
        ElementRef { name: name.into(), source: ElementSource::Token }
    }

    /// Reference to a literal-text element.
    pub fn string_lit(name: impl Into<String>) -> Self {
        ElementRef { name: name.into(), source: ElementSource::StringLit }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Operations
// ══════════════════════════════════════════════════════════════════════════════

/// Index of an operation within its sequence.
pub type OpIndex = usize;

/// A single planned code-generation action.
///
/// The set of kinds is closed; all dispatch over operations is an exhaustive
/// match. The plain kinds (`InvokeRule`, `MatchToken`) are produced by the
/// upstream walk and never by this crate; everything else is woven in by the
/// extension hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Call a sub-rule. Produced upstream.
    InvokeRule { element: ElementRef },
    /// Consume a token. Produced upstream.
    MatchToken { element: ElementRef },
    /// Finalize the alternative's tree result from the root accumulator.
    AssignTreeResult,
    /// Rule postamble: normalize and finalize the rule's produced tree.
    RuleAstCleanup,
    /// Promote a sub-rule's result to be the root of the accumulating tree.
    RuleBecomeRoot { element: ElementRef, src: OpIndex },
    /// Promote a token's node to be the root of the accumulating tree.
    TokenBecomeRoot { element: ElementRef, src: OpIndex },
    /// Attach a sub-rule's result as a child under the current root.
    AddRuleLeaf { element: ElementRef, src: OpIndex },
    /// Attach a token's node as a child under the current root.
    AddTokenLeaf { element: ElementRef, src: OpIndex },
    /// Record a sub-rule occurrence into its element list accumulator, for
    /// later use by an explicit rewrite.
    TrackRuleElement { element: ElementRef, src: OpIndex },
    /// Record a token occurrence into its element list accumulator.
    TrackTokenElement { element: ElementRef, src: OpIndex },
}

impl Op {
    /// Kind discriminator for lookup and diagnostics.
    pub fn kind(&self) -> OpKind {
        match self {
            Op::InvokeRule { .. } => OpKind::InvokeRule,
            Op::MatchToken { .. } => OpKind::MatchToken,
            Op::AssignTreeResult => OpKind::AssignTreeResult,
            Op::RuleAstCleanup => OpKind::RuleAstCleanup,
            Op::RuleBecomeRoot { .. } => OpKind::RuleBecomeRoot,
            Op::TokenBecomeRoot { .. } => OpKind::TokenBecomeRoot,
            Op::AddRuleLeaf { .. } => OpKind::AddRuleLeaf,
            Op::AddTokenLeaf { .. } => OpKind::AddTokenLeaf,
            Op::TrackRuleElement { .. } => OpKind::TrackRuleElement,
            Op::TrackTokenElement { .. } => OpKind::TrackTokenElement,
        }
    }

    /// The grammar element this operation acts on, if any.
    pub fn element(&self) -> Option<&ElementRef> {
        match self {
            Op::InvokeRule { element }
            | Op::MatchToken { element }
            | Op::RuleBecomeRoot { element, .. }
            | Op::TokenBecomeRoot { element, .. }
            | Op::AddRuleLeaf { element, .. }
            | Op::AddTokenLeaf { element, .. }
            | Op::TrackRuleElement { element, .. }
            | Op::TrackTokenElement { element, .. } => Some(element),
            Op::AssignTreeResult | Op::RuleAstCleanup => None,
        }
    }

    /// The predecessor operation this one builds upon, if derived.
    pub fn src(&self) -> Option<OpIndex> {
        match self {
            Op::RuleBecomeRoot { src, .. }
            | Op::TokenBecomeRoot { src, .. }
            | Op::AddRuleLeaf { src, .. }
            | Op::AddTokenLeaf { src, .. }
            | Op::TrackRuleElement { src, .. }
            | Op::TrackTokenElement { src, .. } => Some(*src),
            _ => None,
        }
    }

    /// Shift a derived op's predecessor reference by `base`.
    ///
    /// Used when splicing an element's finished sub-sequence into an
    /// enclosing block: references stay index-valid because they become
    /// block-absolute. Plain and boundary ops are returned unchanged.
    pub fn rebased(self, base: OpIndex) -> Op {
        match self {
            Op::RuleBecomeRoot { element, src } => Op::RuleBecomeRoot { element, src: src + base },
            Op::TokenBecomeRoot { element, src } => {
                Op::TokenBecomeRoot { element, src: src + base }
            },
            Op::AddRuleLeaf { element, src } => Op::AddRuleLeaf { element, src: src + base },
            Op::AddTokenLeaf { element, src } => Op::AddTokenLeaf { element, src: src + base },
            Op::TrackRuleElement { element, src } => {
                Op::TrackRuleElement { element, src: src + base }
            },
            Op::TrackTokenElement { element, src } => {
                Op::TrackTokenElement { element, src: src + base }
            },
            other => other,
        }
    }
}

/// Operation kind, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpKind {
    InvokeRule,
    MatchToken,
    AssignTreeResult,
    RuleAstCleanup,
    RuleBecomeRoot,
    TokenBecomeRoot,
    AddRuleLeaf,
    AddTokenLeaf,
    TrackRuleElement,
    TrackTokenElement,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::InvokeRule => "InvokeRule",
            OpKind::MatchToken => "MatchToken",
            OpKind::AssignTreeResult => "AssignTreeResult",
            OpKind::RuleAstCleanup => "RuleAstCleanup",
            OpKind::RuleBecomeRoot => "RuleBecomeRoot",
            OpKind::TokenBecomeRoot => "TokenBecomeRoot",
            OpKind::AddRuleLeaf => "AddRuleLeaf",
            OpKind::AddTokenLeaf => "AddTokenLeaf",
            OpKind::TrackRuleElement => "TrackRuleElement",
            OpKind::TrackTokenElement => "TrackTokenElement",
        };
        f.write_str(name)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Declarations
// ══════════════════════════════════════════════════════════════════════════════

/// A block- or rule-scoped local variable materialized in the generated code.
///
/// Declarations live outside the operation sequence and are created once per
/// need, never duplicated for the same purpose within one scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Decl {
    /// The per-alternative tree accumulator.
    Root,
    /// List accumulator for an element that may occur more than once,
    /// feeding an explicit rewrite.
    ElementList { element: ElementRef },
}

// ══════════════════════════════════════════════════════════════════════════════
// Blocks and rule functions
// ══════════════════════════════════════════════════════════════════════════════

/// Code block for one alternative: block-scoped locals plus the ordered
/// operation list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBlock {
    pub decls: Vec<Decl>,
    pub ops: Vec<Op>,
}

impl CodeBlock {
    pub fn new() -> Self {
        CodeBlock::default()
    }

    /// Register a block-scoped declaration. Idempotent: registering the same
    /// declaration twice leaves the block unchanged. Returns whether the
    /// declaration was newly added.
    pub fn add_local_decl(&mut self, decl: Decl) -> bool {
        if self.decls.contains(&decl) {
            return false;
        }
        self.decls.push(decl);
        true
    }

    /// Append an operation to the block.
    pub fn add_op(&mut self, op: Op) {
        self.ops.push(op);
    }
}

/// The rule function currently being generated.
///
/// Owns the rule-scoped declaration set used to dedup `ElementList`
/// accumulators across an element's occurrences — one list per distinct
/// element per rule function, however many times the element occurs.
#[derive(Debug, Clone)]
pub struct RuleFunction {
    /// Rule name, used in diagnostics.
    pub name: String,
    decls: BTreeSet<Decl>,
}

impl RuleFunction {
    pub fn new(name: impl Into<String>) -> Self {
        RuleFunction { name: name.into(), decls: BTreeSet::new() }
    }

    /// Register a rule-scoped declaration. Returns whether it was newly
    /// inserted; an already-present declaration is left untouched.
    pub fn add_local_decl(&mut self, decl: Decl) -> bool {
        self.decls.insert(decl)
    }

    /// Whether the declaration is already registered.
    pub fn has_decl(&self, decl: &Decl) -> bool {
        self.decls.contains(decl)
    }

    /// Registered declarations, in deterministic order.
    pub fn decls(&self) -> impl Iterator<Item = &Decl> {
        self.decls.iter()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Sequence helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Find the first operation of the given kind, returning its index.
pub fn find_op(ops: &[Op], kind: OpKind) -> Option<OpIndex> {
    ops.iter().position(|op| op.kind() == kind)
}

/// Append one operation to a sequence, returning the extended sequence.
pub fn with_appended(mut ops: Vec<Op>, op: Op) -> Vec<Op> {
    ops.push(op);
    ops
}
