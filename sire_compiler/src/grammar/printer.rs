//! Source-form rendering of the AST
//!
//! Program-level specifications print one per line, each closed by ` :`,
//! followed by the commands one per line. Everything nested prints on a
//! single line. The printed form of a tree parsed without errors parses
//! back to an equal tree.

use super::ast::*;
use std::fmt::{self, Display, Formatter};

/// Items separated by a fixed string
struct Joined<'a, T>(&'a [T], &'static str);

impl<T: Display> Display for Joined<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(self.1)?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

fn joined<'a, T>(items: &'a [T], separator: &'static str) -> Joined<'a, T> {
    Joined(items, separator)
}

/// Case selector; a subscripted element is parenthesised so its `[` is not
/// read back as the replicator
struct Selector<'a>(&'a Expr);

struct SelectorOperand<'a>(&'a Operand);

impl Display for Selector<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Unary { op, operand } => write!(f, "{}{}", op, SelectorOperand(operand)),
            Expr::Binary { op, left, right } => write!(
                f,
                "{} {} {}",
                SelectorOperand(left),
                op,
                SelectorOperand(right)
            ),
            Expr::Operand(operand) => write!(f, "{}", SelectorOperand(operand)),
        }
    }
}

impl Display for SelectorOperand<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Operand::Elem(elem) if has_subscripts(elem) => write!(f, "({})", elem),
            operand => write!(f, "{}", operand),
        }
    }
}

fn has_subscripts(elem: &Elem) -> bool {
    !elem.base.is_simple() || elem.field.as_ref().is_some_and(|field| !field.is_simple())
}

/// Array dimensions, `[]` for an open one
struct Dims<'a>(&'a [Option<Expr>]);

impl Display for Dims<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for dim in self.0 {
            match dim {
                Some(size) => write!(f, "[{}]", size)?,
                None => f.write_str("[]")?,
            }
        }
        Ok(())
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for spec in &self.specs {
            writeln!(f, "{} :", spec)?;
        }
        for cmd in &self.commands {
            writeln!(f, "{}", cmd)?;
        }
        Ok(())
    }
}

// === NAMES AND SPECIFIERS ===

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)?;
        for subscript in &self.subscripts {
            write!(f, "[{}]", subscript)?;
        }
        Ok(())
    }
}

impl Display for Elem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if let Some(field) = &self.field {
            write!(f, ".{}", field)?;
        }
        Ok(())
    }
}

impl Display for Specifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.val {
            f.write_str("val ")?;
        }
        match &self.kind {
            SpecifierKind::Interface(decls) => write!(f, "interface({})", joined(decls, ", "))?,
            kind => {
                f.write_str(kind.keyword())?;
                if let Some(type_name) = kind.type_name() {
                    write!(f, " {}", type_name)?;
                }
            }
        }
        write!(f, "{}", Dims(&self.dims))
    }
}

impl Display for Fml {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.spec, joined(&self.names, ", "))
    }
}

impl Display for CallSig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, joined(&self.formals, ", "))
    }
}

// === SPECIFICATIONS ===

impl Display for Spec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Spec::Decl(decl) => write!(f, "{}", decl),
            Spec::Abbr(abbr) => write!(f, "{}", abbr),
            Spec::Def(def) => write!(f, "{}", def),
            Spec::Simultaneous(defs) => write!(f, "{}", joined(defs, " & ")),
        }
    }
}

impl Display for HidingDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("from ")?;
        for spec in &self.specs {
            write!(f, "{} : ", spec)?;
        }
        write!(f, "interface {}", self.interface)
    }
}

impl Display for Decl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Decl::Var { spec, names } => write!(f, "{} {}", spec, joined(names, ", ")),
            Decl::Call(sigs) => write!(f, "call {}", joined(sigs, ", ")),
            Decl::Hiding(hiding) => write!(f, "{}", hiding),
            Decl::Server { name, server } => write!(f, "server {} is {}", name, server),
        }
    }
}

impl Display for Abbr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Abbr::Val { spec, name, value } => write!(f, "{} {} is {}", spec, name, value),
            Abbr::Ref { spec, name, target } => match &spec.kind {
                // Entity abbreviations put the dimensions after the name
                SpecifierKind::Process(_) | SpecifierKind::Server(_) | SpecifierKind::Function(_) => {
                    write!(
                        f,
                        "{} {}{} is {}",
                        spec.kind.keyword(),
                        name,
                        Dims(&spec.dims),
                        target
                    )
                }
                _ => write!(f, "{} {} is {}", spec, name, target),
            },
            Abbr::Call {
                name,
                formals,
                target,
            } => write!(f, "call {}({}) is {}", name, joined(formals, ", "), target),
            Abbr::Inferred { name, value } => write!(f, "{} is {}", name, value),
        }
    }
}

impl Display for Def {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Def::Process {
                name,
                formals,
                interface,
                body,
            } => {
                write!(f, "process {}({}) is ", name, joined(formals, ", "))?;
                if let Some(interface) = interface {
                    write!(f, "interface({}) to ", joined(interface, ", "))?;
                }
                write!(f, "{}", body)
            }
            Def::Server {
                name,
                formals,
                body,
            } => write!(f, "server {}({}) is {}", name, joined(formals, ", "), body),
            Def::InheritingServer {
                name,
                formals,
                hiding,
            } => write!(
                f,
                "server {}({}) inherits {}",
                name,
                joined(formals, ", "),
                hiding
            ),
            Def::Function {
                name,
                formals,
                body,
            } => write!(f, "function {}({}) is {}", name, joined(formals, ", "), body),
        }
    }
}

impl Display for Server {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Server::Spec { interface, specs } => write!(
                f,
                "interface({}) to {{ {} }}",
                joined(interface, ", "),
                joined(specs, " ; ")
            ),
            Server::Instance { name, actuals } => write!(f, "{}({})", name, joined(actuals, ", ")),
        }
    }
}

// === COMMANDS ===

impl Display for Cmd {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Cmd::Skip => f.write_str("skip"),
            Cmd::Stop => f.write_str("stop"),
            Cmd::Assign { target, value } => write!(f, "{} := {}", target, value),
            Cmd::Input { channel, target } => write!(f, "{} ? {}", channel, target),
            Cmd::Output { channel, value } => write!(f, "{} ! {}", channel, value),
            Cmd::Connect { local, remote } => write!(f, "connect {} to {}", local, remote),
            Cmd::Instance { name, actuals } => write!(f, "{}({})", name, joined(actuals, ", ")),
            Cmd::Call {
                name,
                field,
                actuals,
            } => write!(f, "{}.{}({})", name, field, joined(actuals, ", ")),
            Cmd::Seq(cmds) => write!(f, "{{ {} }}", joined(cmds, " ; ")),
            Cmd::Par(cmds) => write!(f, "{{ {} }}", joined(cmds, " | ")),
            Cmd::RepSeq { ranges, body } => write!(f, "seq [{}] {}", joined(ranges, ", "), body),
            Cmd::RepPar { ranges, body } => write!(f, "par [{}] {}", joined(ranges, ", "), body),
            Cmd::Alt(altns) => write!(f, "alt {{ {} }}", joined(altns, " | ")),
            Cmd::RepAlt { ranges, altn } => write!(f, "alt [{}] {}", joined(ranges, ", "), altn),
            Cmd::Test(choices) => write!(f, "test {{ {} }}", joined(choices, " | ")),
            Cmd::RepTest { ranges, choice } => {
                write!(f, "test [{}] {}", joined(ranges, ", "), choice)
            }
            Cmd::IfDo { cond, body } => write!(f, "if {} do {}", cond, body),
            Cmd::IfThenElse {
                cond,
                then,
                otherwise,
            } => write!(f, "if {} then {} else {}", cond, then, otherwise),
            Cmd::Case { selector, selects } => {
                write!(f, "case {} {{ {} }}", Selector(selector), joined(selects, " | "))
            }
            Cmd::RepCase {
                selector,
                ranges,
                select,
            } => write!(
                f,
                "case {} [{}] {}",
                Selector(selector),
                joined(ranges, ", "),
                select
            ),
            Cmd::While { cond, body } => write!(f, "while {} do {}", cond, body),
            Cmd::Do { body, cond } => write!(f, "do {} while {}", body, cond),
            Cmd::Until { cond, body } => write!(f, "until {} do {}", cond, body),
            Cmd::Spec { spec, body } => write!(f, "{} : {}", spec, body),
        }
    }
}

impl Display for Altn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Altn::Input {
                channel,
                target,
                body,
            } => write!(f, "{} ? {} : {}", channel, target, body),
            Altn::GuardedInput {
                guard,
                channel,
                target,
                body,
            } => write!(f, "{} & {} ? {} : {}", guard, channel, target, body),
            Altn::GuardedSkip { guard, body } => write!(f, "{} & skip : {}", guard, body),
            Altn::Nested(cmd) => write!(f, "{}", cmd),
            Altn::Spec { spec, altn } => write!(f, "{} : {}", spec, altn),
        }
    }
}

impl Display for Choice {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Guarded { guard, body } => write!(f, "{} : {}", guard, body),
            Choice::Nested(cmd) => write!(f, "{}", cmd),
            Choice::Spec { spec, choice } => write!(f, "{} : {}", spec, choice),
        }
    }
}

impl Display for Select {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Select::Guarded { value, body } => write!(f, "{} : {}", value, body),
            Select::Else(body) => write!(f, "else {}", body),
            Select::Spec { spec, select } => write!(f, "{} : {}", spec, select),
        }
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} for {}", self.name, self.base, self.count)?;
        if let Some(step) = &self.step {
            write!(f, " step {}", step)?;
        }
        Ok(())
    }
}

// === EXPRESSIONS ===

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Unary { op, operand } => write!(f, "{}{}", op, operand),
            Expr::Binary { op, left, right } => write!(f, "{} {} {}", left, op, right),
            Expr::Operand(operand) => write!(f, "{}", operand),
        }
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Elem(elem) => write!(f, "{}", elem),
            Operand::Literal(literal) => write!(f, "{}", literal),
            Operand::Apply { name, actuals } => write!(f, "{}({})", name, joined(actuals, ", ")),
            Operand::Paren(expr) => write!(f, "({})", expr),
            Operand::Valof { body, result } => write!(f, "valof {} result {}", body, result),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::DecInt(v) => write!(f, "{}", v),
            Literal::HexInt(v) => write!(f, "0x{:x}", v),
            Literal::OctInt(v) => write!(f, "0o{:o}", v),
            Literal::BinInt(v) => write!(f, "0b{:b}", v),
            Literal::Char(c) => match c {
                '\\' => f.write_str(r"'\\'"),
                '\'' => f.write_str(r"'\''"),
                '\t' => f.write_str(r"'\t'"),
                '\r' => f.write_str(r"'\r'"),
                '\n' => f.write_str(r"'\n'"),
                c => write!(f, "'{}'", c),
            },
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::syntax::parse_program;

    fn reparse(source: &str) -> (Tree, Tree) {
        let mut diagnostics = Diagnostics::silent();
        let tree = parse_program(source, &mut diagnostics).unwrap();
        assert!(!diagnostics.has_errors(), "{:?}", diagnostics.messages());

        let printed = tree.to_string();
        let again = parse_program(&printed, &mut diagnostics).unwrap();
        assert!(!diagnostics.has_errors(), "{}\n{:?}", printed, diagnostics.messages());
        (tree, again)
    }

    #[test]
    fn test_program_layout() {
        let mut diagnostics = Diagnostics::silent();
        let tree = parse_program("var x : x := 5", &mut diagnostics).unwrap();
        assert_eq!(tree.to_string(), "var x :\nx := 5\n");
    }

    #[test]
    fn test_literals_keep_base() {
        assert_eq!(Literal::HexInt(255).to_string(), "0xff");
        assert_eq!(Literal::OctInt(8).to_string(), "0o10");
        assert_eq!(Literal::BinInt(5).to_string(), "0b101");
        assert_eq!(Literal::Char('\n').to_string(), r"'\n'");
        assert_eq!(Literal::Char('\'').to_string(), r"'\''");
        assert_eq!(Literal::Bool(false).to_string(), "false");
    }

    #[test]
    fn test_elements_and_specifiers() {
        let elem = Elem {
            base: Name::new("a").with_subscripts(vec![Expr::literal(Literal::DecInt(1))]),
            field: Some(Name::new("f")),
        };
        assert_eq!(elem.to_string(), "a[1].f");

        let spec = Specifier {
            kind: SpecifierKind::Process(Some(Name::new("T"))),
            val: false,
            dims: vec![Some(Expr::literal(Literal::DecInt(2))), None],
        };
        assert_eq!(spec.to_string(), "process T[2][]");
    }

    #[test]
    fn test_round_trip_specifications() {
        let (tree, again) = reparse(
            "val n is 0x10 :\n\
             var[n] a, b :\n\
             chan c, d :\n\
             process P(val var x, chan out) is out ! x + 1 &\n\
             process Q(chan in) is var y : in ? y :\n\
             function sq(var v) is v * v :\n\
             server S() is interface(call get(var v)) to { var s ; var t } :\n\
             server T(chan e) inherits from var z : interface I :\n\
             process R(process U p, function g) is interface(chan k, l, call h()) to skip :\n\
             process p[2] is q :\n\
             skip",
        );
        assert_eq!(tree, again);
    }

    #[test]
    fn test_subscripted_selector_is_parenthesised() {
        let selector = Expr::Binary {
            op: BinaryOp::Add,
            left: Operand::Elem(Elem::name(
                Name::new("a").with_subscripts(vec![Expr::literal(Literal::DecInt(1))]),
            )),
            right: Operand::Elem(Elem::name(Name::new("b"))),
        };
        let cmd = Cmd::RepCase {
            selector,
            ranges: vec![Range {
                name: Name::new("i"),
                base: Expr::literal(Literal::DecInt(0)),
                count: Expr::literal(Literal::DecInt(2)),
                step: None,
            }],
            select: Box::new(Select::Else(Cmd::Skip)),
        };
        assert_eq!(cmd.to_string(), "case (a[1]) + b [i = 0 for 2] else skip");

        let mut diagnostics = Diagnostics::silent();
        let tree = parse_program(&cmd.to_string(), &mut diagnostics).unwrap();
        assert!(!diagnostics.has_errors(), "{:?}", diagnostics.messages());
        assert!(matches!(tree.commands[..], [Cmd::RepCase { .. }]));
    }

    #[test]
    fn test_round_trip_commands() {
        let (tree, again) = reparse(
            "par [i = 0 for 2] P(a[i], c)\n\
             { a[0] := sq(3) ; b[1] := -a[0] ; x is 'q' : d ! x }\n\
             alt { c ? a[0] : skip | b[0] > 1 & d ? a[1] : stop | true & skip : skip }\n\
             test { a[0] = 1 : skip | test [j = 0 for 2 step 1] a[j] ~= 0 : stop }\n\
             case (a[0]) { 1 : skip | var w : 2 : w := 1 | else stop }\n\
             case n [i = 0 for 2] i : skip\n\
             case s.f + 1 [i = 0 for 2 step 1] else skip\n\
             if (a[0] < 2) && true then skip else { skip | stop }\n\
             while 0b101 >= 0o7 do a[0] := valof skip result 1\n\
             do connect s.left to t.right while ~done\n\
             until '\\n' = k do s.put(1, 2)",
        );
        assert_eq!(tree, again);
    }
}
