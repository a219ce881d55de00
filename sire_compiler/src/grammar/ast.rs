//! AST node definitions
//!
//! The tree is a strict forest: every node owns its children, nothing is
//! shared and nothing is mutated after the parse. Lists that the grammar
//! requires to be non-empty are non-empty in any tree produced without
//! reported errors.

use serde::{Deserialize, Serialize};

/// A parsed program: specifications in scope of the command sequence
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tree {
    pub specs: Vec<Spec>,
    pub commands: Vec<Cmd>,
}

impl Tree {
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty() && self.commands.is_empty()
    }
}

// === NAMES AND ELEMENTS ===

/// An identifier with optional subscripts
///
/// Binders never carry subscripts. Each occurrence of a spelling is an
/// independent value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Name {
    pub text: String,
    pub subscripts: Vec<Expr>,
}

impl Name {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            subscripts: Vec::new(),
        }
    }

    /// Stand-in after a missing name
    pub fn missing() -> Self {
        Self::new("")
    }

    pub fn with_subscripts(mut self, subscripts: Vec<Expr>) -> Self {
        self.subscripts = subscripts;
        self
    }

    pub fn is_simple(&self) -> bool {
        self.subscripts.is_empty()
    }
}

/// A variable, channel or field reference: `a[i]` or `a[i].f[j]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Elem {
    pub base: Name,
    pub field: Option<Name>,
}

impl Elem {
    pub fn name(base: Name) -> Self {
        Self { base, field: None }
    }

    pub fn is_simple(&self) -> bool {
        self.field.is_none() && self.base.is_simple()
    }
}

// === SPECIFIERS ===

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecifierKind {
    Var,
    Chan,
    Call,
    Interface(Vec<Decl>),
    /// Optional type name: `process T p`
    Process(Option<Name>),
    Server(Option<Name>),
    Function(Option<Name>),
}

impl SpecifierKind {
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Var)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Var => "var",
            Self::Chan => "chan",
            Self::Call => "call",
            Self::Interface(_) => "interface",
            Self::Process(_) => "process",
            Self::Server(_) => "server",
            Self::Function(_) => "function",
        }
    }

    /// Type name carried by a named entity kind
    pub fn type_name(&self) -> Option<&Name> {
        match self {
            Self::Process(name) | Self::Server(name) | Self::Function(name) => name.as_ref(),
            _ => None,
        }
    }
}

/// Declared category of a binding
///
/// `dims` is empty when the specifier has no array suffix; a dimension
/// written `[]` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Specifier {
    pub kind: SpecifierKind,
    pub val: bool,
    pub dims: Vec<Option<Expr>>,
}

impl Specifier {
    pub fn new(kind: SpecifierKind) -> Self {
        Self {
            kind,
            val: false,
            dims: Vec::new(),
        }
    }

    pub fn variable() -> Self {
        Self::new(SpecifierKind::Var)
    }
}

/// Formal parameter group: a specifier and the names it binds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fml {
    pub spec: Specifier,
    pub names: Vec<Name>,
}

// === SPECIFICATIONS ===

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Spec {
    Decl(Decl),
    Abbr(Abbr),
    Def(Def),
    /// Mutually visible definitions joined by `&`, at least two
    Simultaneous(Vec<Def>),
}

impl Spec {
    pub fn is_definition(&self) -> bool {
        matches!(self, Self::Def(_))
    }
}

/// One `call` signature in a call declaration or interface
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSig {
    pub name: Name,
    pub formals: Vec<Fml>,
}

/// `from {spec :} interface name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HidingDecl {
    pub specs: Vec<Spec>,
    pub interface: Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decl {
    /// `var x, y`, `chan c`, `interface(...) i`
    Var { spec: Specifier, names: Vec<Name> },
    Call(Vec<CallSig>),
    Hiding(HidingDecl),
    Server { name: Name, server: Server },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Abbr {
    /// Read-only value: `val x is e`
    Val { spec: Specifier, name: Name, value: Expr },
    /// Reference to an element: `var x is a[2]`
    Ref { spec: Specifier, name: Name, target: Elem },
    Call { name: Name, formals: Vec<Fml>, target: Elem },
    /// No specifier: `x is e`
    Inferred { name: Name, value: Expr },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Def {
    Process {
        name: Name,
        formals: Vec<Fml>,
        interface: Option<Vec<Decl>>,
        body: Cmd,
    },
    Server {
        name: Name,
        formals: Vec<Fml>,
        body: Server,
    },
    InheritingServer {
        name: Name,
        formals: Vec<Fml>,
        hiding: HidingDecl,
    },
    Function {
        name: Name,
        formals: Vec<Fml>,
        body: Expr,
    },
}

impl Def {
    pub fn name(&self) -> &Name {
        match self {
            Self::Process { name, .. }
            | Self::Server { name, .. }
            | Self::InheritingServer { name, .. }
            | Self::Function { name, .. } => name,
        }
    }

    pub fn formals(&self) -> &[Fml] {
        match self {
            Self::Process { formals, .. }
            | Self::Server { formals, .. }
            | Self::InheritingServer { formals, .. }
            | Self::Function { formals, .. } => formals,
        }
    }
}

/// Server entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Server {
    /// `interface(...) to { spec ; ... }`
    Spec { interface: Vec<Decl>, specs: Vec<Spec> },
    /// `name(actuals)`
    Instance { name: Name, actuals: Vec<Expr> },
}

// === COMMANDS ===

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cmd {
    Skip,
    Stop,
    Assign { target: Elem, value: Expr },
    Input { channel: Elem, target: Elem },
    Output { channel: Elem, value: Expr },
    Connect { local: Elem, remote: Elem },
    Instance { name: Name, actuals: Vec<Expr> },
    Call { name: Name, field: Name, actuals: Vec<Expr> },
    Seq(Vec<Cmd>),
    Par(Vec<Cmd>),
    RepSeq { ranges: Vec<Range>, body: Box<Cmd> },
    RepPar { ranges: Vec<Range>, body: Box<Cmd> },
    Alt(Vec<Altn>),
    RepAlt { ranges: Vec<Range>, altn: Box<Altn> },
    Test(Vec<Choice>),
    RepTest { ranges: Vec<Range>, choice: Box<Choice> },
    IfDo { cond: Expr, body: Box<Cmd> },
    IfThenElse { cond: Expr, then: Box<Cmd>, otherwise: Box<Cmd> },
    Case { selector: Expr, selects: Vec<Select> },
    RepCase { selector: Expr, ranges: Vec<Range>, select: Box<Select> },
    While { cond: Expr, body: Box<Cmd> },
    Do { body: Box<Cmd>, cond: Expr },
    Until { cond: Expr, body: Box<Cmd> },
    /// A specification scoped over the following command
    Spec { spec: Box<Spec>, body: Box<Cmd> },
}

impl Cmd {
    pub fn scoped(spec: Spec, body: Cmd) -> Self {
        Self::Spec {
            spec: Box::new(spec),
            body: Box::new(body),
        }
    }
}

/// Guard entry of `alt`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Altn {
    /// `c ? x : cmd`
    Input { channel: Elem, target: Elem, body: Cmd },
    /// `g & c ? x : cmd`
    GuardedInput { guard: Expr, channel: Elem, target: Elem, body: Cmd },
    /// `g & skip : cmd`
    GuardedSkip { guard: Expr, body: Cmd },
    /// A nested `alt` command
    Nested(Box<Cmd>),
    Spec { spec: Box<Spec>, altn: Box<Altn> },
}

/// Guard entry of `test`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    Guarded { guard: Expr, body: Cmd },
    /// A nested `test` command
    Nested(Box<Cmd>),
    Spec { spec: Box<Spec>, choice: Box<Choice> },
}

/// Entry of `case`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Select {
    Guarded { value: Expr, body: Cmd },
    Else(Cmd),
    Spec { spec: Box<Spec>, select: Box<Select> },
}

/// Replicator index: `i = base for count [step s]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub name: Name,
    pub base: Expr,
    pub count: Expr,
    pub step: Option<Expr>,
}

// === EXPRESSIONS ===

/// Flat expression: at most one operator; nesting needs parentheses
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    Unary { op: UnaryOp, operand: Operand },
    Binary { op: BinaryOp, left: Operand, right: Operand },
    Operand(Operand),
}

impl Expr {
    /// Stand-in after a malformed expression
    pub fn missing() -> Self {
        Self::literal(Literal::DecInt(0))
    }

    pub fn literal(literal: Literal) -> Self {
        Self::Operand(Operand::Literal(literal))
    }

    pub fn elem(elem: Elem) -> Self {
        Self::Operand(Operand::Elem(elem))
    }

    /// The element when the expression is nothing but an element
    pub fn as_elem(&self) -> Option<&Elem> {
        match self {
            Self::Operand(Operand::Elem(elem)) => Some(elem),
            _ => None,
        }
    }

    pub fn into_elem(self) -> Result<Elem, Self> {
        match self {
            Self::Operand(Operand::Elem(elem)) => Ok(elem),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    Elem(Elem),
    Literal(Literal),
    /// Function application `f(a, b)`
    Apply { name: Name, actuals: Vec<Expr> },
    Paren(Box<Expr>),
    Valof { body: Box<Cmd>, result: Box<Expr> },
}

/// Literal values; integer bases are kept for printing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    DecInt(i64),
    HexInt(i64),
    OctInt(i64),
    BinInt(i64),
    Char(char),
    Bool(bool),
}

impl Literal {
    /// Integer value of a numeric literal
    pub fn value(&self) -> Option<i64> {
        match self {
            Self::DecInt(v) | Self::HexInt(v) | Self::OctInt(v) | Self::BinInt(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Not => "~",
            Self::Neg => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Xor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Shl,
    Shr,
    And,
    Or,
}

impl BinaryOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Xor => "^",
            Self::Eq => "=",
            Self::Ne => "~=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_stand_ins() {
        assert_eq!(Expr::missing(), Expr::literal(Literal::DecInt(0)));
        assert!(Name::missing().text.is_empty());
    }

    #[test]
    fn test_expression_as_element() {
        let elem = Elem::name(Name::new("c"));
        let expr = Expr::elem(elem.clone());
        assert_eq!(expr.as_elem(), Some(&elem));
        assert_eq!(expr.into_elem(), Ok(elem));
        assert!(Expr::missing().into_elem().is_err());
    }

    #[test]
    fn test_definition_accessors() {
        let def = Def::Function {
            name: Name::new("f"),
            formals: vec![],
            body: Expr::missing(),
        };
        assert_eq!(def.name().text, "f");
        assert!(def.formals().is_empty());
        assert!(Spec::Def(def).is_definition());
    }

    #[test]
    fn test_literal_values() {
        assert_eq!(Literal::HexInt(31).value(), Some(31));
        assert_eq!(Literal::Bool(true).value(), None);
    }

    #[test]
    fn test_tree_serialises_to_json() {
        let tree = Tree {
            specs: vec![],
            commands: vec![Cmd::Skip],
        };
        let json = serde_json::to_string(&tree).unwrap();
        assert_eq!(json, r#"{"specs":[],"commands":["Skip"]}"#);
    }
}
