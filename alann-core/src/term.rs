//! The minimal term language the control layer operates on.
//!
//! Terms are structurally hashable symbolic expressions. The control core
//! only needs a handful of operations from them: interval detection,
//! interval-stripping canonicalization, ordered component enumeration for
//! term-link templates, and query-variable unification for question
//! answering. The full grammar lives with the parser, not here.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Variable kinds, distinguished by their surface sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarKind {
    /// `$x` — universally scoped.
    Independent,
    /// `#x` — existentially scoped.
    Dependent,
    /// `?x` — question placeholder.
    Query,
}

/// Compound connectors the control layer encounters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Connector {
    /// `<a --> b>`
    Inheritance,
    /// `<a <-> b>`
    Similarity,
    /// `<a ==> b>`
    Implication,
    /// `<a <=> b>`
    Equivalence,
    /// `(&&, a, b, ...)`
    Conjunction,
    /// `(*, a, b, ...)`
    Product,
    /// `(^op, a, b, ...)` — an executable operation.
    Operation,
}

impl Connector {
    /// Whether this connector forms a statement (copula between two terms).
    #[must_use]
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            Self::Inheritance | Self::Similarity | Self::Implication | Self::Equivalence
        )
    }

    fn copula(self) -> Option<&'static str> {
        match self {
            Self::Inheritance => Some("-->"),
            Self::Similarity => Some("<->"),
            Self::Implication => Some("==>"),
            Self::Equivalence => Some("<=>"),
            _ => None,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Conjunction => "&&",
            Self::Product => "*",
            Self::Operation => "^",
            _ => "",
        }
    }
}

/// A symbolic term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// A named constant.
    Atom(String),
    /// A variable with its kind.
    Variable(VarKind, String),
    /// A temporal interval of the given duration. Positional, never
    /// conceptual.
    Interval(u64),
    /// A compound over ordered components.
    Compound(Connector, Vec<Term>),
}

impl Term {
    /// Build an atom term.
    #[must_use]
    pub fn atom(name: &str) -> Self {
        Self::Atom(name.to_string())
    }

    /// Build a query variable.
    #[must_use]
    pub fn query_var(name: &str) -> Self {
        Self::Variable(VarKind::Query, name.to_string())
    }

    /// Build an inheritance statement `<subject --> predicate>`.
    #[must_use]
    pub fn inheritance(subject: Term, predicate: Term) -> Self {
        Self::Compound(Connector::Inheritance, vec![subject, predicate])
    }

    /// Build an implication statement `<antecedent ==> consequent>`.
    #[must_use]
    pub fn implication(antecedent: Term, consequent: Term) -> Self {
        Self::Compound(Connector::Implication, vec![antecedent, consequent])
    }

    /// Build an operation term `(^name, args...)`.
    #[must_use]
    pub fn operation(name: &str, args: Vec<Term>) -> Self {
        let mut components = Vec::with_capacity(args.len() + 1);
        components.push(Self::atom(name));
        components.extend(args);
        Self::Compound(Connector::Operation, components)
    }

    /// Whether this term is an interval.
    #[must_use]
    pub fn is_interval(&self) -> bool {
        matches!(self, Self::Interval(_))
    }

    /// Whether this term is a bare variable.
    #[must_use]
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(..))
    }

    /// Whether this term is an executable operation compound.
    #[must_use]
    pub fn is_operation(&self) -> bool {
        matches!(self, Self::Compound(Connector::Operation, _))
    }

    /// Whether any variable occurs anywhere in this term.
    #[must_use]
    pub fn has_free_variable(&self) -> bool {
        match self {
            Self::Variable(..) => true,
            Self::Compound(_, components) => components.iter().any(Term::has_free_variable),
            _ => false,
        }
    }

    /// Canonical form with all interval components stripped from compounds.
    ///
    /// Concepts are keyed by this form: intervals encode position in time,
    /// not content, so `(&&, a, +3, b)` and `(&&, a, +7, b)` map to the same
    /// concept.
    #[must_use]
    pub fn replace_intervals(&self) -> Term {
        match self {
            Self::Compound(connector, components) => Self::Compound(
                *connector,
                components
                    .iter()
                    .filter(|c| !c.is_interval())
                    .map(Term::replace_intervals)
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Ordered, deduplicated direct components, intervals excluded.
    ///
    /// This is the source of a concept's term-link templates; enumeration
    /// order is the compound's component order.
    #[must_use]
    pub fn component_terms(&self) -> Vec<Term> {
        let Self::Compound(_, components) = self else {
            return Vec::new();
        };
        let mut out: Vec<Term> = Vec::with_capacity(components.len());
        for component in components {
            if component.is_interval() {
                continue;
            }
            let canonical = component.replace_intervals();
            if !out.contains(&canonical) {
                out.push(canonical);
            }
        }
        out
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(name) => write!(f, "{name}"),
            Self::Variable(kind, name) => {
                let sigil = match kind {
                    VarKind::Independent => '$',
                    VarKind::Dependent => '#',
                    VarKind::Query => '?',
                };
                write!(f, "{sigil}{name}")
            }
            Self::Interval(n) => write!(f, "+{n}"),
            Self::Compound(connector, components) => {
                if let Some(copula) = connector.copula() {
                    // statements are always binary
                    write!(f, "<")?;
                    if let Some(s) = components.first() {
                        write!(f, "{s}")?;
                    }
                    write!(f, " {copula} ")?;
                    if let Some(p) = components.get(1) {
                        write!(f, "{p}")?;
                    }
                    write!(f, ">")
                } else {
                    write!(f, "({}", connector.prefix())?;
                    for (i, component) in components.iter().enumerate() {
                        if i > 0 || *connector != Connector::Operation {
                            write!(f, ",")?;
                        }
                        write!(f, "{component}")?;
                    }
                    write!(f, ")")
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Query-variable unification
// ---------------------------------------------------------------------------

/// Unify two terms under query-variable substitution.
///
/// A query variable on either side matches any non-interval term, with
/// consistent bindings per variable name. Everything else must match
/// structurally. Returns whether a unifier exists; the bindings themselves
/// are only needed by answer formatting, which is the deriver's concern.
#[must_use]
pub fn unify_query(a: &Term, b: &Term) -> bool {
    let mut left: HashMap<String, Term> = HashMap::new();
    let mut right: HashMap<String, Term> = HashMap::new();
    unify_rec(a, b, &mut left, &mut right)
}

fn unify_rec(
    a: &Term,
    b: &Term,
    left: &mut HashMap<String, Term>,
    right: &mut HashMap<String, Term>,
) -> bool {
    match (a, b) {
        (Term::Variable(VarKind::Query, name), other) => bind(left, name, other),
        (other, Term::Variable(VarKind::Query, name)) => bind(right, name, other),
        (Term::Compound(ca, xs), Term::Compound(cb, ys)) => {
            ca == cb
                && xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys.iter())
                    .all(|(x, y)| unify_rec(x, y, left, right))
        }
        _ => a == b,
    }
}

fn bind(bindings: &mut HashMap<String, Term>, name: &str, value: &Term) -> bool {
    if value.is_interval() {
        return false;
    }
    match bindings.get(name) {
        Some(bound) => bound == value,
        None => {
            bindings.insert(name.to_string(), value.clone());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_intervals_strips_nested() {
        let term = Term::Compound(
            Connector::Conjunction,
            vec![
                Term::atom("a"),
                Term::Interval(3),
                Term::implication(Term::atom("b"), Term::atom("c")),
            ],
        );
        let canonical = term.replace_intervals();
        match &canonical {
            Term::Compound(_, components) => {
                assert_eq!(components.len(), 2);
                assert!(components.iter().all(|c| !c.is_interval()));
            }
            other => panic!("expected compound, got {other}"),
        }
    }

    #[test]
    fn component_terms_preserve_order_and_dedup() {
        let term = Term::Compound(
            Connector::Conjunction,
            vec![
                Term::atom("x"),
                Term::atom("y"),
                Term::Interval(1),
                Term::atom("x"),
            ],
        );
        let components = term.component_terms();
        assert_eq!(components, vec![Term::atom("x"), Term::atom("y")]);
    }

    #[test]
    fn atoms_have_no_components() {
        assert!(Term::atom("bird").component_terms().is_empty());
    }

    #[test]
    fn query_unification_binds_consistently() {
        let question = Term::inheritance(Term::query_var("what"), Term::atom("animal"));
        let belief = Term::inheritance(Term::atom("bird"), Term::atom("animal"));
        assert!(unify_query(&question, &belief));

        let twice = Term::Compound(
            Connector::Product,
            vec![Term::query_var("w"), Term::query_var("w")],
        );
        let same = Term::Compound(Connector::Product, vec![Term::atom("a"), Term::atom("a")]);
        let different =
            Term::Compound(Connector::Product, vec![Term::atom("a"), Term::atom("b")]);
        assert!(unify_query(&twice, &same));
        assert!(!unify_query(&twice, &different));
    }

    #[test]
    fn unification_rejects_structural_mismatch() {
        let a = Term::inheritance(Term::atom("bird"), Term::atom("animal"));
        let b = Term::implication(Term::atom("bird"), Term::atom("animal"));
        assert!(!unify_query(&a, &b));
    }

    #[test]
    fn display_round_trips_shape() {
        let term = Term::inheritance(Term::atom("bird"), Term::atom("animal"));
        assert_eq!(term.to_string(), "<bird --> animal>");
        assert_eq!(Term::operation("go", vec![Term::atom("door")]).to_string(), "(^go,door)");
    }
}
