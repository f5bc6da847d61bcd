//! # treeweave — implicit tree construction for generated parsers
//!
//! A code-generation extension for a parser generator's output pipeline.
//! For each alternative of a grammar rule it decides which tree-building
//! operations must be woven into the planned operation sequence so that,
//! when the grammar author wrote no explicit tree-construction rewrite, the
//! generated parser still builds a syntax tree automatically — and
//! consistently with alternatives that do carry an explicit rewrite.
//!
//! ## Architecture
//!
//! ```text
//!  upstream walk (host generator)
//!        │  per alternative / per element
//!        ▼
//!  ┌──────────────────────────────────────────────────┐
//!  │ extension hooks                                  │
//!  │   enter/finish_alternative   block boundaries    │
//!  │   element_hook               root/leaf × rule/   │
//!  │                              token/string-ref    │
//!  │   rule_postamble             one cleanup per rule│
//!  │   needs_implicit_label       pure predicate      │
//!  └──────────────────────────────────────────────────┘
//!        │  appends Op / registers Decl
//!        ▼
//!  output model (ops + decls)  ──→  renderer (out of scope)
//! ```
//!
//! The hooks only plan: they extend operation sequences and register local
//! declarations. Rendering those plans to target-language text, parsing the
//! grammar, and compiling explicit rewrite expressions all belong to the
//! surrounding generator.
//!
//! [`walk`] ships a minimal contract-faithful driver, mostly for tests,
//! benches, and hosts that want a ready-made per-rule loop; rules are
//! independent and can be generated in parallel via [`walk::generate_rules`].

pub mod extension;
pub mod model;
pub mod walk;

#[cfg(test)]
mod tests;

pub use extension::{
    element_hook, enter_alternative, finish_alternative, leaf_rule, leaf_token,
    needs_implicit_label, root_rule, root_token, rule_postamble, string_ref, ElementEvent,
    GrammarOpts, HookCtx, WeaveError,
};
pub use model::{
    find_op, with_appended, CodeBlock, Decl, ElementRef, ElementSource, Op, OpIndex, OpKind,
    RuleFunction,
};
pub use walk::{
    generate_rule, generate_rules, AltSpec, ElementPosition, ElementSpec, RuleGenSpec, RuleOutput,
};
