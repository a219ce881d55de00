//! Recursive-descent parser with one token of lookahead
//!
//! One method per grammar rule. A malformed construct is reported through
//! `Diagnostics` and the token stream always advances by one token, so
//! every loop makes progress. A neutral node (`skip`, decimal `0`, an empty
//! name) stands in for the malformed one. Every method returns
//! `Result<_, FatalError>`; the only early exits are the error threshold,
//! `val` on a non-variable specifier, excessive nesting and trailing input.

use super::error::SyntaxError;
use crate::config::constants::MAX_NESTING_DEPTH;
use crate::diagnostics::{Diagnostics, FatalError};
use crate::grammar::ast::*;
use crate::grammar::keywords::Keyword;
use crate::lexical::Lexer;
use crate::logging::codes;
use crate::tokens::Token;
use crate::utils::Spanned;
use crate::{log_debug, log_error, log_success};

/// Minimum length of a delimited list
enum Arity {
    Any,
    /// At least one element; the error is reported for an empty list
    AtLeastOne(SyntaxError),
}

/// Element of a formal list; a bare name extends the previous group
enum FormalItem {
    Group(Fml),
    Name(Name),
    Skipped,
}

/// Element of an interface list; a bare name or signature extends the
/// previous declaration
enum InterfaceItem {
    Decl(Decl),
    Name(Name),
    Call(CallSig),
    Skipped,
}

pub struct Parser<'src, 'd> {
    lexer: Lexer<'src>,
    diagnostics: &'d mut Diagnostics,
    current: Spanned<Token>,
    depth: usize,
}

impl<'src, 'd> Parser<'src, 'd> {
    pub fn new(source: &'src str, diagnostics: &'d mut Diagnostics) -> Result<Self, FatalError> {
        let mut lexer = Lexer::new(source);
        let current = Self::pull(&mut lexer, diagnostics)?;

        Ok(Self {
            lexer,
            diagnostics,
            current,
            depth: 0,
        })
    }

    /// program = {spec (":" | {1 "&" spec} ":")} {1 cmd} EOF
    pub fn parse_program(mut self) -> Result<Tree, FatalError> {
        log_debug!("Starting parse", "line" => self.line());
        let mut tree = Tree::default();

        while self.token().starts_specification() {
            let spec = self.read_spec()?;
            match self.token() {
                Token::Colon => {
                    self.advance()?;
                    tree.specs.push(spec);
                }
                Token::Ampersand => {
                    let specs = self.read_simultaneous(spec)?;
                    tree.specs.extend(specs);
                }
                _ => {
                    self.error(SyntaxError::BadSeparator)?;
                    tree.specs.push(spec);
                }
            }
        }

        while !self.at(&Token::Eof) {
            tree.commands.push(self.read_cmd()?);
        }
        if tree.commands.is_empty() {
            self.report(SyntaxError::BadCommand)?;
        }

        if !self.at(&Token::Eof) {
            let fatal = FatalError::IncorrectTermination { line: self.line() };
            log_error!(fatal.error_code(), "Input continues after the program",
                "line" => self.line(),
                "token" => self.token().name()
            );
            return Err(fatal);
        }

        log_success!(
            codes::success::AST_CONSTRUCTION_COMPLETE,
            "Parse complete",
            "specs" => tree.specs.len(),
            "commands" => tree.commands.len(),
            "errors" => self.diagnostics.error_count()
        );
        Ok(tree)
    }

    // === TOKEN HANDLING ===

    /// Next token, skipping error tokens already reported by the lexer
    fn pull(lexer: &mut Lexer<'src>, diagnostics: &mut Diagnostics) -> Result<Spanned<Token>, FatalError> {
        loop {
            let token = lexer.next_token(diagnostics)?;
            if token.value != Token::Error {
                return Ok(token);
            }
        }
    }

    /// Move to the next token, returning the one consumed
    fn advance(&mut self) -> Result<Token, FatalError> {
        let next = Self::pull(&mut self.lexer, self.diagnostics)?;
        Ok(std::mem::replace(&mut self.current, next).value)
    }

    fn token(&self) -> &Token {
        &self.current.value
    }

    fn line(&self) -> u32 {
        self.current.line()
    }

    fn at(&self, token: &Token) -> bool {
        self.current.value == *token
    }

    fn keyword(&self) -> Option<Keyword> {
        match self.current.value {
            Token::Keyword(keyword) => Some(keyword),
            _ => None,
        }
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        self.keyword() == Some(keyword)
    }

    fn at_name(&self) -> bool {
        matches!(self.current.value, Token::Name(_))
    }

    fn eat(&mut self, token: &Token) -> Result<bool, FatalError> {
        if self.at(token) {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> Result<bool, FatalError> {
        self.eat(&Token::Keyword(keyword))
    }

    /// Report without moving
    fn report(&mut self, error: SyntaxError) -> Result<(), FatalError> {
        log_debug!("Syntax error",
            "error" => error,
            "token" => self.token().name(),
            "line" => self.line()
        );
        let line = self.line();
        let context = self.lexer.context();
        self.diagnostics
            .report(error.error_code(), line, error.to_string(), &context)
    }

    /// Report and skip the offending token
    fn error(&mut self, error: SyntaxError) -> Result<(), FatalError> {
        self.report(error)?;
        self.advance()?;
        Ok(())
    }

    /// Consume `expected`; otherwise report it missing. Advances either way.
    fn check_for(&mut self, expected: Token) -> Result<(), FatalError> {
        let spelling = expected.spelling().unwrap_or_else(|| expected.name());
        self.check_for_with(expected, SyntaxError::Missing(spelling))
    }

    fn check_for_with(&mut self, expected: Token, error: SyntaxError) -> Result<(), FatalError> {
        if !self.at(&expected) {
            self.report(error)?;
        }
        self.advance()?;
        Ok(())
    }

    fn check_for_keyword(&mut self, keyword: Keyword) -> Result<(), FatalError> {
        self.check_for(Token::Keyword(keyword))
    }

    /// Run one rule one level deeper
    fn nested<T>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Result<T, FatalError>,
    ) -> Result<T, FatalError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            let fatal = FatalError::NestingTooDeep { line: self.line() };
            log_error!(fatal.error_code(), "Nesting limit exceeded",
                "depth" => self.depth,
                "limit" => MAX_NESTING_DEPTH
            );
            return Err(fatal);
        }
        let result = rule(self);
        self.depth -= 1;
        result
    }

    /// open {0|1 separator item} close
    fn read_list<T>(
        &mut self,
        open: Token,
        close: Token,
        separator: Token,
        arity: Arity,
        mut item: impl FnMut(&mut Self) -> Result<T, FatalError>,
    ) -> Result<Vec<T>, FatalError> {
        self.check_for(open)?;
        let mut items = Vec::new();

        if self.at(&close) {
            if let Arity::AtLeastOne(error) = arity {
                self.report(error)?;
            }
            self.advance()?;
            return Ok(items);
        }

        loop {
            items.push(item(self)?);
            if !self.eat(&separator)? {
                break;
            }
        }
        self.check_for(close)?;
        Ok(items)
    }

    // === SPECIFICATIONS ===

    /// Remaining members of a top-level `&` chain
    ///
    /// A chain of definitions becomes one simultaneous specification. Any
    /// other member is reported once and the chain is kept as sequential
    /// specifications.
    fn read_simultaneous(&mut self, first: Spec) -> Result<Vec<Spec>, FatalError> {
        let mut reported = false;
        if !first.is_definition() {
            self.report(SyntaxError::SimultaneousDeclaration)?;
            reported = true;
        }

        let mut members = vec![first];
        while self.eat(&Token::Ampersand)? {
            let Some(spec) = self.read_chain_member()? else {
                continue;
            };
            if !reported && !spec.is_definition() {
                self.report(SyntaxError::SimultaneousDeclaration)?;
                reported = true;
            }
            members.push(spec);
        }
        self.check_for(Token::Colon)?;

        if reported {
            return Ok(members);
        }
        let defs = members
            .into_iter()
            .filter_map(|spec| match spec {
                Spec::Def(def) => Some(def),
                _ => None,
            })
            .collect();
        Ok(vec![Spec::Simultaneous(defs)])
    }

    fn read_chain_member(&mut self) -> Result<Option<Spec>, FatalError> {
        if self.at_name() {
            return self.read_inferred_abbr().map(Some);
        }
        if self.token().starts_specification() {
            return self.read_spec().map(Some);
        }
        self.error(SyntaxError::ExpectingDefinition)?;
        Ok(None)
    }

    /// Specifications scoping a command, alternative, choice or selection:
    /// spec {"&" spec} ":"
    ///
    /// Definitions are read and reported; an `&` chain is reported once.
    fn read_scope_prefix(
        &mut self,
        first: Spec,
        scope: &'static str,
    ) -> Result<Vec<Spec>, FatalError> {
        if first.is_definition() {
            self.report(SyntaxError::DefinitionInSpecification(scope))?;
        }
        let mut specs = vec![first];

        let mut reported = false;
        while self.eat(&Token::Ampersand)? {
            if !reported {
                self.report(SyntaxError::SimultaneousDeclaration)?;
                reported = true;
            }
            if let Some(spec) = self.read_chain_member()? {
                if spec.is_definition() {
                    self.report(SyntaxError::DefinitionInSpecification(scope))?;
                }
                specs.push(spec);
            }
        }
        self.check_for(Token::Colon)?;
        Ok(specs)
    }

    fn read_spec(&mut self) -> Result<Spec, FatalError> {
        self.nested(|p| match p.keyword() {
            Some(Keyword::Val) => p.read_val_abbr(),
            Some(Keyword::Var | Keyword::Chan | Keyword::Interface) => p.read_decl_or_abbr(),
            Some(Keyword::Call) => p.read_call_spec(),
            Some(Keyword::From) => Ok(Spec::Decl(Decl::Hiding(p.read_hiding_decl()?))),
            Some(Keyword::Process) => p.read_process(),
            Some(Keyword::Server) => p.read_server(),
            Some(Keyword::Function) => p.read_function(),
            _ => {
                p.error(SyntaxError::ExpectingDefinition)?;
                Ok(Spec::Decl(Decl::Var {
                    spec: Specifier::variable(),
                    names: vec![Name::missing()],
                }))
            }
        })
    }

    /// abbr = "val" [spef] name "is" expr
    fn read_val_abbr(&mut self) -> Result<Spec, FatalError> {
        let line = self.line();
        self.advance()?;

        let spec = if self.at_name() {
            Specifier::variable()
        } else {
            self.read_specifier()?
        };
        let spec = Self::qualify_val(spec, line)?;

        let name = self.read_name()?;
        self.check_for_keyword(Keyword::Is)?;
        let value = self.read_expr()?;
        Ok(Spec::Abbr(Abbr::Val { spec, name, value }))
    }

    fn qualify_val(mut spec: Specifier, line: u32) -> Result<Specifier, FatalError> {
        if !spec.kind.is_variable() {
            let fatal = FatalError::ValOnNonVariable { line };
            log_error!(fatal.error_code(), "val qualifier rejected",
                "kind" => spec.kind.keyword(),
                "line" => line
            );
            return Err(fatal);
        }
        spec.val = true;
        Ok(spec)
    }

    /// decl = spef name {"," name}
    /// abbr = spef name "is" elem
    fn read_decl_or_abbr(&mut self) -> Result<Spec, FatalError> {
        let spec = self.read_specifier()?;
        let name = self.read_name()?;

        match self.token() {
            Token::Keyword(Keyword::Is) => {
                self.advance()?;
                let target = self.read_elem()?;
                Ok(Spec::Abbr(Abbr::Ref { spec, name, target }))
            }
            _ => {
                let mut names = vec![name];
                while self.eat(&Token::Comma)? {
                    names.push(self.read_name()?);
                }
                Ok(Spec::Decl(Decl::Var { spec, names }))
            }
        }
    }

    /// name "is" expr, a specification without specifier
    fn read_inferred_abbr(&mut self) -> Result<Spec, FatalError> {
        let name = self.read_name()?;
        self.check_for_keyword(Keyword::Is)?;
        let value = self.read_expr()?;
        Ok(Spec::Abbr(Abbr::Inferred { name, value }))
    }

    /// "call" name ["(" fmls ")"] ("is" elem | {"," name ["(" fmls ")"]})
    fn read_call_spec(&mut self) -> Result<Spec, FatalError> {
        self.advance()?;
        let sig = self.read_call_sig()?;

        if self.eat_keyword(Keyword::Is)? {
            let target = self.read_elem()?;
            return Ok(Spec::Abbr(Abbr::Call {
                name: sig.name,
                formals: sig.formals,
                target,
            }));
        }

        let mut sigs = vec![sig];
        while self.eat(&Token::Comma)? {
            sigs.push(self.read_call_sig()?);
        }
        Ok(Spec::Decl(Decl::Call(sigs)))
    }

    fn read_call_sig(&mut self) -> Result<CallSig, FatalError> {
        let name = self.read_name()?;
        let formals = if self.at(&Token::LParen) {
            self.read_formals()?
        } else {
            Vec::new()
        };
        Ok(CallSig { name, formals })
    }

    /// hiding-decl = "from" {spec ":"} "interface" name
    fn read_hiding_decl(&mut self) -> Result<HidingDecl, FatalError> {
        self.check_for_keyword(Keyword::From)?;

        let mut specs = Vec::new();
        while self.token().starts_specification() && !self.at_keyword(Keyword::Interface) {
            specs.push(self.read_spec()?);
            self.check_for(Token::Colon)?;
        }

        self.check_for_keyword(Keyword::Interface)?;
        let interface = self.read_name()?;
        Ok(HidingDecl { specs, interface })
    }

    /// def = "process" name "(" fmls ")" "is" ["interface" "(" intfs ")" "to"] cmd
    fn read_process(&mut self) -> Result<Spec, FatalError> {
        self.advance()?;
        let name = self.read_name()?;
        if !self.at(&Token::LParen) {
            return self.read_entity_abbr(SpecifierKind::Process(None), name);
        }

        let formals = self.read_formals()?;
        self.check_for_keyword(Keyword::Is)?;
        let interface = if self.eat_keyword(Keyword::Interface)? {
            let interface = self.read_interface_list()?;
            self.check_for_keyword(Keyword::To)?;
            Some(interface)
        } else {
            None
        };
        let body = self.read_cmd()?;

        Ok(Spec::Def(Def::Process {
            name,
            formals,
            interface,
            body,
        }))
    }

    /// def  = "server" name "(" fmls ")" ("is" server-entity | "inherits" hiding-decl)
    /// decl = "server" name "is" server-entity
    fn read_server(&mut self) -> Result<Spec, FatalError> {
        self.advance()?;
        let name = self.read_name()?;

        if self.at(&Token::LParen) {
            let formals = self.read_formals()?;
            return match self.keyword() {
                Some(Keyword::Is) => {
                    self.advance()?;
                    let body = self.read_server_entity()?;
                    Ok(Spec::Def(Def::Server {
                        name,
                        formals,
                        body,
                    }))
                }
                Some(Keyword::Inherits) => {
                    self.advance()?;
                    let hiding = self.read_hiding_decl()?;
                    Ok(Spec::Def(Def::InheritingServer {
                        name,
                        formals,
                        hiding,
                    }))
                }
                _ => {
                    self.error(SyntaxError::ExpectingIsOrInherits)?;
                    Ok(Spec::Def(Def::Server {
                        name,
                        formals,
                        body: Server::Instance {
                            name: Name::missing(),
                            actuals: Vec::new(),
                        },
                    }))
                }
            };
        }

        if self.at(&Token::LBracket) {
            return self.read_entity_abbr(SpecifierKind::Server(None), name);
        }

        self.check_for_keyword(Keyword::Is)?;
        if self.at_keyword(Keyword::Interface) {
            let server = self.read_server_entity()?;
            return Ok(Spec::Decl(Decl::Server { name, server }));
        }

        let target = self.read_elem()?;
        if self.at(&Token::LParen) && target.is_simple() {
            let actuals = self.read_actuals()?;
            let server = Server::Instance {
                name: target.base,
                actuals,
            };
            return Ok(Spec::Decl(Decl::Server { name, server }));
        }
        Ok(Spec::Abbr(Abbr::Ref {
            spec: Specifier::new(SpecifierKind::Server(None)),
            name,
            target,
        }))
    }

    /// server-entity = "interface" "(" intfs ")" "to" "{" {1 ";" spec} "}"
    ///               | name "(" actuals ")"
    fn read_server_entity(&mut self) -> Result<Server, FatalError> {
        if !self.eat_keyword(Keyword::Interface)? {
            let name = self.read_name()?;
            let actuals = self.read_actuals()?;
            return Ok(Server::Instance { name, actuals });
        }

        let interface = self.read_interface_list()?;
        self.check_for_keyword(Keyword::To)?;
        let specs = self.read_list(
            Token::LBrace,
            Token::RBrace,
            Token::Semicolon,
            Arity::AtLeastOne(SyntaxError::ExpectingDefinition),
            Self::read_spec,
        )?;
        Ok(Server::Spec { interface, specs })
    }

    /// def = "function" name "(" fmls ")" "is" expr
    fn read_function(&mut self) -> Result<Spec, FatalError> {
        self.advance()?;
        let name = self.read_name()?;
        if !self.at(&Token::LParen) {
            return self.read_entity_abbr(SpecifierKind::Function(None), name);
        }

        let formals = self.read_formals()?;
        self.check_for_keyword(Keyword::Is)?;
        let body = self.read_expr()?;
        Ok(Spec::Def(Def::Function {
            name,
            formals,
            body,
        }))
    }

    /// ("process" | "server" | "function") name {dims} "is" elem
    fn read_entity_abbr(&mut self, kind: SpecifierKind, name: Name) -> Result<Spec, FatalError> {
        let dims = self.read_dims()?;
        self.check_for_keyword(Keyword::Is)?;
        let target = self.read_elem()?;
        Ok(Spec::Abbr(Abbr::Ref {
            spec: Specifier {
                kind,
                val: false,
                dims,
            },
            name,
            target,
        }))
    }

    // === SPECIFIERS AND FORMALS ===

    /// spef = kind {"[" [expr] "]"}
    fn read_specifier(&mut self) -> Result<Specifier, FatalError> {
        let kind = match self.keyword() {
            Some(Keyword::Var) => {
                self.advance()?;
                SpecifierKind::Var
            }
            Some(Keyword::Chan) => {
                self.advance()?;
                SpecifierKind::Chan
            }
            Some(Keyword::Call) => {
                self.advance()?;
                SpecifierKind::Call
            }
            Some(Keyword::Interface) => {
                self.advance()?;
                SpecifierKind::Interface(self.read_interface_list()?)
            }
            Some(Keyword::Process) => {
                self.advance()?;
                SpecifierKind::Process(self.read_type_name()?)
            }
            Some(Keyword::Server) => {
                self.advance()?;
                SpecifierKind::Server(self.read_type_name()?)
            }
            Some(Keyword::Function) => {
                self.advance()?;
                SpecifierKind::Function(self.read_type_name()?)
            }
            _ => {
                self.error(SyntaxError::InvalidSpecifier)?;
                SpecifierKind::Var
            }
        };

        let dims = self.read_dims()?;
        Ok(Specifier {
            kind,
            val: false,
            dims,
        })
    }

    fn read_type_name(&mut self) -> Result<Option<Name>, FatalError> {
        if self.at_name() {
            return self.read_name().map(Some);
        }
        Ok(None)
    }

    /// {"[" [expr] "]"}
    fn read_dims(&mut self) -> Result<Vec<Option<Expr>>, FatalError> {
        let mut dims = Vec::new();
        while self.eat(&Token::LBracket)? {
            if self.at(&Token::RBracket) {
                dims.push(None);
            } else {
                dims.push(Some(self.read_expr()?));
            }
            self.check_for(Token::RBracket)?;
        }
        Ok(dims)
    }

    /// Name bound after a specifier
    ///
    /// In `process p` the only name is the binder, not a type name.
    fn read_binder(&mut self, spec: &mut Specifier) -> Result<Name, FatalError> {
        if !self.at_name() {
            if let SpecifierKind::Process(type_name)
            | SpecifierKind::Server(type_name)
            | SpecifierKind::Function(type_name) = &mut spec.kind
            {
                if let Some(name) = type_name.take() {
                    return Ok(name);
                }
            }
        }
        self.read_name()
    }

    /// "(" {0 "," fml} ")"
    fn read_formals(&mut self) -> Result<Vec<Fml>, FatalError> {
        let items = self.read_list(
            Token::LParen,
            Token::RParen,
            Token::Comma,
            Arity::Any,
            Self::read_formal_item,
        )?;

        let mut formals: Vec<Fml> = Vec::new();
        for item in items {
            match item {
                FormalItem::Group(fml) => formals.push(fml),
                FormalItem::Name(name) => match formals.last_mut() {
                    Some(group) => group.names.push(name),
                    None => self.report(SyntaxError::InvalidArgument)?,
                },
                FormalItem::Skipped => {}
            }
        }
        Ok(formals)
    }

    /// fml = ["val"] spef name | name
    fn read_formal_item(&mut self) -> Result<FormalItem, FatalError> {
        if self.at_name() {
            return self.read_name().map(FormalItem::Name);
        }

        let line = self.line();
        let val = self.eat_keyword(Keyword::Val)?;
        let is_kind = matches!(
            self.keyword(),
            Some(
                Keyword::Var
                    | Keyword::Chan
                    | Keyword::Call
                    | Keyword::Interface
                    | Keyword::Process
                    | Keyword::Server
                    | Keyword::Function
            )
        );
        if !is_kind {
            self.error(SyntaxError::InvalidArgument)?;
            return Ok(FormalItem::Skipped);
        }

        let mut spec = self.read_specifier()?;
        if val {
            spec = Self::qualify_val(spec, line)?;
        }
        let name = self.read_binder(&mut spec)?;
        Ok(FormalItem::Group(Fml {
            spec,
            names: vec![name],
        }))
    }

    /// "(" {0 "," intf} ")"
    fn read_interface_list(&mut self) -> Result<Vec<Decl>, FatalError> {
        let items = self.read_list(
            Token::LParen,
            Token::RParen,
            Token::Comma,
            Arity::Any,
            Self::read_interface_item,
        )?;

        let mut decls: Vec<Decl> = Vec::new();
        for item in items {
            match item {
                InterfaceItem::Decl(decl) => decls.push(decl),
                InterfaceItem::Name(name) => match decls.last_mut() {
                    Some(Decl::Var { names, .. }) => names.push(name),
                    _ => self.report(SyntaxError::InvalidInterface)?,
                },
                InterfaceItem::Call(sig) => match decls.last_mut() {
                    Some(Decl::Call(sigs)) => sigs.push(sig),
                    _ => self.report(SyntaxError::InvalidInterface)?,
                },
                InterfaceItem::Skipped => {}
            }
        }
        Ok(decls)
    }

    /// intf = "chan" spef-tail name | "call" name ["(" fmls ")"]
    fn read_interface_item(&mut self) -> Result<InterfaceItem, FatalError> {
        match self.token() {
            Token::Name(_) => {
                let name = self.read_name()?;
                if self.at(&Token::LParen) {
                    let formals = self.read_formals()?;
                    return Ok(InterfaceItem::Call(CallSig { name, formals }));
                }
                Ok(InterfaceItem::Name(name))
            }
            Token::Keyword(Keyword::Chan) => {
                let spec = self.read_specifier()?;
                let name = self.read_name()?;
                Ok(InterfaceItem::Decl(Decl::Var {
                    spec,
                    names: vec![name],
                }))
            }
            Token::Keyword(Keyword::Call) => {
                self.advance()?;
                let sig = self.read_call_sig()?;
                Ok(InterfaceItem::Decl(Decl::Call(vec![sig])))
            }
            _ => {
                self.error(SyntaxError::InvalidInterface)?;
                Ok(InterfaceItem::Skipped)
            }
        }
    }

    fn read_actuals(&mut self) -> Result<Vec<Expr>, FatalError> {
        self.read_list(
            Token::LParen,
            Token::RParen,
            Token::Comma,
            Arity::Any,
            Self::read_expr,
        )
    }

    // === COMMANDS ===

    fn read_cmd(&mut self) -> Result<Cmd, FatalError> {
        self.nested(Self::read_command)
    }

    fn read_command(&mut self) -> Result<Cmd, FatalError> {
        match self.token() {
            Token::Name(_) => return self.read_name_command(),
            Token::LBrace => return self.read_block(),
            _ => {}
        }

        let Some(keyword) = self.keyword() else {
            self.error(SyntaxError::BadCommand)?;
            return Ok(Cmd::Skip);
        };

        match keyword {
            Keyword::Skip => {
                self.advance()?;
                Ok(Cmd::Skip)
            }
            Keyword::Stop => {
                self.advance()?;
                Ok(Cmd::Stop)
            }
            Keyword::Connect => {
                self.advance()?;
                let local = self.read_elem()?;
                self.check_for_keyword(Keyword::To)?;
                let remote = self.read_elem()?;
                Ok(Cmd::Connect { local, remote })
            }
            Keyword::Seq | Keyword::Par => {
                self.advance()?;
                let ranges = self.read_ranges()?;
                let body = Box::new(self.read_cmd()?);
                Ok(if keyword == Keyword::Seq {
                    Cmd::RepSeq { ranges, body }
                } else {
                    Cmd::RepPar { ranges, body }
                })
            }
            Keyword::Alt => self.read_alt(),
            Keyword::Test => self.read_test(),
            Keyword::If => self.read_if(),
            Keyword::Case => self.read_case(),
            Keyword::While => {
                self.advance()?;
                let cond = self.read_expr()?;
                self.check_for_keyword(Keyword::Do)?;
                let body = Box::new(self.read_cmd()?);
                Ok(Cmd::While { cond, body })
            }
            Keyword::Do => {
                self.advance()?;
                let body = Box::new(self.read_cmd()?);
                self.check_for_keyword(Keyword::While)?;
                let cond = self.read_expr()?;
                Ok(Cmd::Do { body, cond })
            }
            Keyword::Until => {
                self.advance()?;
                let cond = self.read_expr()?;
                self.check_for_keyword(Keyword::Do)?;
                let body = Box::new(self.read_cmd()?);
                Ok(Cmd::Until { cond, body })
            }
            k if k.starts_specification() => {
                let spec = self.read_spec()?;
                self.read_scoped_cmd(spec)
            }
            _ => {
                self.error(SyntaxError::BadCommand)?;
                Ok(Cmd::Skip)
            }
        }
    }

    /// spec ":" cmd, with the first specification already read
    fn read_scoped_cmd(&mut self, first: Spec) -> Result<Cmd, FatalError> {
        let specs = self.read_scope_prefix(first, "command")?;
        let body = self.read_cmd()?;
        Ok(specs
            .into_iter()
            .rev()
            .fold(body, |body, spec| Cmd::scoped(spec, body)))
    }

    /// Commands led by a name: assignment, input, output, instance, call,
    /// or a specifier-less abbreviation scoping a command
    fn read_name_command(&mut self) -> Result<Cmd, FatalError> {
        let name = self.read_subscripted_name()?;

        match self.token() {
            Token::LParen if name.is_simple() => {
                let actuals = self.read_actuals()?;
                Ok(Cmd::Instance { name, actuals })
            }
            Token::Keyword(Keyword::Is) if name.is_simple() => {
                self.advance()?;
                let value = self.read_expr()?;
                self.read_scoped_cmd(Spec::Abbr(Abbr::Inferred { name, value }))
            }
            Token::Dot => {
                self.advance()?;
                let field = self.read_subscripted_name()?;
                if self.at(&Token::LParen) && name.is_simple() && field.is_simple() {
                    let actuals = self.read_actuals()?;
                    return Ok(Cmd::Call {
                        name,
                        field,
                        actuals,
                    });
                }
                self.read_elem_command(Elem {
                    base: name,
                    field: Some(field),
                })
            }
            _ => self.read_elem_command(Elem::name(name)),
        }
    }

    fn read_elem_command(&mut self, elem: Elem) -> Result<Cmd, FatalError> {
        match self.token() {
            Token::Assign => {
                self.advance()?;
                let value = self.read_expr()?;
                Ok(Cmd::Assign {
                    target: elem,
                    value,
                })
            }
            Token::Question => {
                self.advance()?;
                let target = self.read_elem()?;
                Ok(Cmd::Input {
                    channel: elem,
                    target,
                })
            }
            Token::Bang => {
                self.advance()?;
                let value = self.read_expr()?;
                Ok(Cmd::Output {
                    channel: elem,
                    value,
                })
            }
            _ => {
                self.error(SyntaxError::ExpectingNameCommand)?;
                Ok(Cmd::Skip)
            }
        }
    }

    /// "{" {1 ";" cmd} "}" | "{" {1 "|" cmd} "}"
    fn read_block(&mut self) -> Result<Cmd, FatalError> {
        self.advance()?;
        let mut commands = vec![self.read_cmd()?];

        let separator = match self.token() {
            Token::Semicolon => Some(Token::Semicolon),
            Token::Bar => Some(Token::Bar),
            _ => None,
        };

        match separator {
            Some(separator) => {
                while self.eat(&separator)? {
                    commands.push(self.read_cmd()?);
                }
                self.check_for(Token::RBrace)?;
                Ok(if separator == Token::Bar {
                    Cmd::Par(commands)
                } else {
                    Cmd::Seq(commands)
                })
            }
            None => {
                self.check_for_with(Token::RBrace, SyntaxError::ExpectingSeparator)?;
                Ok(Cmd::Seq(commands))
            }
        }
    }

    /// "[" {1 "," range} "]"
    fn read_ranges(&mut self) -> Result<Vec<Range>, FatalError> {
        self.read_list(
            Token::LBracket,
            Token::RBracket,
            Token::Comma,
            Arity::AtLeastOne(SyntaxError::NameExpected),
            Self::read_range,
        )
    }

    /// range = name "=" expr "for" expr ["step" expr]
    fn read_range(&mut self) -> Result<Range, FatalError> {
        let name = self.read_name()?;
        self.check_for(Token::Equals)?;
        let base = self.read_expr()?;
        self.check_for_keyword(Keyword::For)?;
        let count = self.read_expr()?;
        let step = if self.eat_keyword(Keyword::Step)? {
            Some(self.read_expr()?)
        } else {
            None
        };
        Ok(Range {
            name,
            base,
            count,
            step,
        })
    }

    /// "alt" "{" {1 "|" altn} "}" | "alt" ranges altn
    fn read_alt(&mut self) -> Result<Cmd, FatalError> {
        self.advance()?;
        match self.token() {
            Token::LBrace => {
                let altns = self.read_list(
                    Token::LBrace,
                    Token::RBrace,
                    Token::Bar,
                    Arity::AtLeastOne(SyntaxError::ExpectingExpression),
                    Self::read_altn,
                )?;
                Ok(Cmd::Alt(altns))
            }
            Token::LBracket => {
                let ranges = self.read_ranges()?;
                let altn = Box::new(self.read_altn()?);
                Ok(Cmd::RepAlt { ranges, altn })
            }
            _ => {
                self.error(SyntaxError::ExpectingBlockOrReplicator)?;
                Ok(Cmd::Skip)
            }
        }
    }

    /// "test" "{" {1 "|" choice} "}" | "test" ranges choice
    fn read_test(&mut self) -> Result<Cmd, FatalError> {
        self.advance()?;
        match self.token() {
            Token::LBrace => {
                let choices = self.read_list(
                    Token::LBrace,
                    Token::RBrace,
                    Token::Bar,
                    Arity::AtLeastOne(SyntaxError::ExpectingExpression),
                    Self::read_choice,
                )?;
                Ok(Cmd::Test(choices))
            }
            Token::LBracket => {
                let ranges = self.read_ranges()?;
                let choice = Box::new(self.read_choice()?);
                Ok(Cmd::RepTest { ranges, choice })
            }
            _ => {
                self.error(SyntaxError::ExpectingBlockOrReplicator)?;
                Ok(Cmd::Skip)
            }
        }
    }

    /// "if" expr "do" cmd | "if" expr "then" cmd "else" cmd
    fn read_if(&mut self) -> Result<Cmd, FatalError> {
        self.advance()?;
        let cond = self.read_expr()?;

        match self.keyword() {
            Some(Keyword::Do) => {
                self.advance()?;
                let body = Box::new(self.read_cmd()?);
                Ok(Cmd::IfDo { cond, body })
            }
            Some(Keyword::Then) => {
                self.advance()?;
                let then = Box::new(self.read_cmd()?);
                self.check_for_keyword(Keyword::Else)?;
                let otherwise = Box::new(self.read_cmd()?);
                Ok(Cmd::IfThenElse {
                    cond,
                    then,
                    otherwise,
                })
            }
            _ => {
                self.error(SyntaxError::ExpectingDoOrThen)?;
                Ok(Cmd::Skip)
            }
        }
    }

    /// "case" selector "{" {1 "|" select} "}" | "case" selector ranges select
    fn read_case(&mut self) -> Result<Cmd, FatalError> {
        self.advance()?;
        let selector = self.nested(Self::read_selector)?;

        match self.token() {
            Token::LBrace => {
                let selects = self.read_list(
                    Token::LBrace,
                    Token::RBrace,
                    Token::Bar,
                    Arity::AtLeastOne(SyntaxError::ExpectingExpression),
                    Self::read_select,
                )?;
                Ok(Cmd::Case { selector, selects })
            }
            Token::LBracket => {
                let ranges = self.read_ranges()?;
                let select = Box::new(self.read_select()?);
                Ok(Cmd::RepCase {
                    selector,
                    ranges,
                    select,
                })
            }
            _ => {
                self.error(SyntaxError::ExpectingBlockOrReplicator)?;
                Ok(Cmd::Skip)
            }
        }
    }

    // === GUARD ENTRIES ===

    fn read_altn(&mut self) -> Result<Altn, FatalError> {
        self.nested(Self::read_alternative)
    }

    /// altn = alt | spec ":" altn | elem "?" elem ":" cmd
    ///      | expr "&" elem "?" elem ":" cmd | expr "&" "skip" ":" cmd
    fn read_alternative(&mut self) -> Result<Altn, FatalError> {
        if self.at_keyword(Keyword::Alt) {
            return Ok(Altn::Nested(Box::new(self.read_cmd()?)));
        }
        if self.token().starts_specification() {
            let spec = self.read_spec()?;
            let specs = self.read_scope_prefix(spec, "alternative")?;
            let altn = self.read_altn()?;
            return Ok(specs.into_iter().rev().fold(altn, |altn, spec| Altn::Spec {
                spec: Box::new(spec),
                altn: Box::new(altn),
            }));
        }

        let guard = match self.read_expr()?.into_elem() {
            Ok(channel) if self.at(&Token::Question) => {
                self.advance()?;
                let target = self.read_elem()?;
                self.check_for(Token::Colon)?;
                let body = self.read_cmd()?;
                return Ok(Altn::Input {
                    channel,
                    target,
                    body,
                });
            }
            Ok(elem) => Expr::elem(elem),
            Err(guard) => guard,
        };

        self.check_for(Token::Ampersand)?;
        if self.eat_keyword(Keyword::Skip)? {
            self.check_for(Token::Colon)?;
            let body = self.read_cmd()?;
            return Ok(Altn::GuardedSkip { guard, body });
        }

        let channel = self.read_elem()?;
        self.check_for(Token::Question)?;
        let target = self.read_elem()?;
        self.check_for(Token::Colon)?;
        let body = self.read_cmd()?;
        Ok(Altn::GuardedInput {
            guard,
            channel,
            target,
            body,
        })
    }

    fn read_choice(&mut self) -> Result<Choice, FatalError> {
        self.nested(Self::read_choice_entry)
    }

    /// choice = test | spec ":" choice | expr ":" cmd
    fn read_choice_entry(&mut self) -> Result<Choice, FatalError> {
        if self.at_keyword(Keyword::Test) {
            return Ok(Choice::Nested(Box::new(self.read_cmd()?)));
        }
        if self.token().starts_specification() {
            let spec = self.read_spec()?;
            let specs = self.read_scope_prefix(spec, "choice")?;
            let choice = self.read_choice()?;
            return Ok(specs
                .into_iter()
                .rev()
                .fold(choice, |choice, spec| Choice::Spec {
                    spec: Box::new(spec),
                    choice: Box::new(choice),
                }));
        }

        let guard = self.read_expr()?;
        self.check_for(Token::Colon)?;
        let body = self.read_cmd()?;
        Ok(Choice::Guarded { guard, body })
    }

    fn read_select(&mut self) -> Result<Select, FatalError> {
        self.nested(Self::read_select_entry)
    }

    /// select = "else" cmd | spec ":" select | expr ":" cmd
    fn read_select_entry(&mut self) -> Result<Select, FatalError> {
        if self.eat_keyword(Keyword::Else)? {
            return Ok(Select::Else(self.read_cmd()?));
        }
        if self.token().starts_specification() {
            let spec = self.read_spec()?;
            let specs = self.read_scope_prefix(spec, "selection")?;
            let select = self.read_select()?;
            return Ok(specs
                .into_iter()
                .rev()
                .fold(select, |select, spec| Select::Spec {
                    spec: Box::new(spec),
                    select: Box::new(select),
                }));
        }

        let value = self.read_expr()?;
        self.check_for(Token::Colon)?;
        let body = self.read_cmd()?;
        Ok(Select::Guarded { value, body })
    }

    // === EXPRESSIONS ===

    fn read_expr(&mut self) -> Result<Expr, FatalError> {
        self.nested(Self::read_expression)
    }

    /// expr = ("~" | "-") operand | operand [binop operand]
    fn read_expression(&mut self) -> Result<Expr, FatalError> {
        let unary = match self.token() {
            Token::Tilde => Some(UnaryOp::Not),
            Token::Minus => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = unary {
            self.advance()?;
            let operand = self.read_operand()?;
            return Ok(Expr::Unary { op, operand });
        }

        let left = self.read_operand()?;
        match binary_op(self.token()) {
            Some(op) => {
                self.advance()?;
                let right = self.read_operand()?;
                Ok(Expr::Binary { op, left, right })
            }
            None => Ok(Expr::Operand(left)),
        }
    }

    /// operand = elem | name "(" actuals ")" | literal | "(" expr ")"
    ///         | "valof" cmd "result" expr
    fn read_operand(&mut self) -> Result<Operand, FatalError> {
        if let Some(value) = literal(self.token()) {
            self.advance()?;
            return Ok(Operand::Literal(value));
        }

        match self.token() {
            Token::Name(_) => {
                let name = self.read_subscripted_name()?;
                if self.at(&Token::LParen) && name.is_simple() {
                    let actuals = self.read_actuals()?;
                    return Ok(Operand::Apply { name, actuals });
                }
                Ok(Operand::Elem(self.finish_elem(name)?))
            }
            Token::LParen => {
                self.advance()?;
                let expr = self.read_expr()?;
                self.check_for(Token::RParen)?;
                Ok(Operand::Paren(Box::new(expr)))
            }
            Token::Keyword(Keyword::Valof) => {
                self.advance()?;
                let body = Box::new(self.read_cmd()?);
                self.check_for_keyword(Keyword::Result)?;
                let result = Box::new(self.read_expr()?);
                Ok(Operand::Valof { body, result })
            }
            _ => {
                self.error(SyntaxError::ExpectingExpression)?;
                Ok(Operand::Literal(Literal::DecInt(0)))
            }
        }
    }

    /// Case selector: an expression whose names take no subscripts, so a
    /// following `[` opens the replicator. `(a[i])` selects on an element.
    fn read_selector(&mut self) -> Result<Expr, FatalError> {
        let unary = match self.token() {
            Token::Tilde => Some(UnaryOp::Not),
            Token::Minus => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = unary {
            self.advance()?;
            let operand = self.read_selector_operand()?;
            return Ok(Expr::Unary { op, operand });
        }

        let left = self.read_selector_operand()?;
        match binary_op(self.token()) {
            Some(op) => {
                self.advance()?;
                let right = self.read_selector_operand()?;
                Ok(Expr::Binary { op, left, right })
            }
            None => Ok(Expr::Operand(left)),
        }
    }

    fn read_selector_operand(&mut self) -> Result<Operand, FatalError> {
        if !self.at_name() {
            return self.read_operand();
        }
        let name = self.read_name()?;
        if self.at(&Token::LParen) {
            let actuals = self.read_actuals()?;
            return Ok(Operand::Apply { name, actuals });
        }
        let field = if self.eat(&Token::Dot)? {
            Some(self.read_name()?)
        } else {
            None
        };
        Ok(Operand::Elem(Elem { base: name, field }))
    }

    // === NAMES AND ELEMENTS ===

    fn read_name(&mut self) -> Result<Name, FatalError> {
        if self.at_name() {
            if let Token::Name(text) = self.advance()? {
                return Ok(Name::new(text));
            }
        }
        self.error(SyntaxError::NameExpected)?;
        Ok(Name::missing())
    }

    /// name {"[" expr "]"}
    fn read_subscripted_name(&mut self) -> Result<Name, FatalError> {
        let name = self.read_name()?;
        let mut subscripts = Vec::new();
        while self.eat(&Token::LBracket)? {
            subscripts.push(self.read_expr()?);
            self.check_for(Token::RBracket)?;
        }
        Ok(name.with_subscripts(subscripts))
    }

    /// elem = name {"[" expr "]"} ["." name {"[" expr "]"}]
    fn read_elem(&mut self) -> Result<Elem, FatalError> {
        if !self.at_name() {
            self.error(SyntaxError::ExpectingElement)?;
            return Ok(Elem::name(Name::missing()));
        }
        let base = self.read_subscripted_name()?;
        self.finish_elem(base)
    }

    fn finish_elem(&mut self, base: Name) -> Result<Elem, FatalError> {
        let field = if self.eat(&Token::Dot)? {
            Some(self.read_subscripted_name()?)
        } else {
            None
        };
        Ok(Elem { base, field })
    }
}

fn literal(token: &Token) -> Option<Literal> {
    Some(match token {
        Token::DecInt(v) => Literal::DecInt(*v),
        Token::HexInt(v) => Literal::HexInt(*v),
        Token::OctInt(v) => Literal::OctInt(*v),
        Token::BinInt(v) => Literal::BinInt(*v),
        Token::Char(c) => Literal::Char(*c),
        Token::Keyword(Keyword::True) => Literal::Bool(true),
        Token::Keyword(Keyword::False) => Literal::Bool(false),
        _ => return None,
    })
}

fn binary_op(token: &Token) -> Option<BinaryOp> {
    Some(match token {
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Percent => BinaryOp::Rem,
        Token::Caret => BinaryOp::Xor,
        Token::Equals => BinaryOp::Eq,
        Token::NotEquals => BinaryOp::Ne,
        Token::Less => BinaryOp::Lt,
        Token::LessEq => BinaryOp::Le,
        Token::Greater => BinaryOp::Gt,
        Token::GreaterEq => BinaryOp::Ge,
        Token::ShiftLeft => BinaryOp::Shl,
        Token::ShiftRight => BinaryOp::Shr,
        Token::AndAnd => BinaryOp::And,
        Token::OrOr => BinaryOp::Or,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn parse(source: &str) -> (Result<Tree, FatalError>, Diagnostics) {
        let mut diagnostics = Diagnostics::silent();
        let result = Parser::new(source, &mut diagnostics).and_then(Parser::parse_program);
        (result, diagnostics)
    }

    fn parse_clean(source: &str) -> Tree {
        let (result, diagnostics) = parse(source);
        assert!(!diagnostics.has_errors(), "{:?}", diagnostics.messages());
        result.unwrap()
    }

    fn elem(text: &str) -> Elem {
        Elem::name(Name::new(text))
    }

    fn dec(value: i64) -> Expr {
        Expr::literal(Literal::DecInt(value))
    }

    #[test]
    fn test_declaration_then_assignment() {
        let tree = parse_clean("var x : x := 5");
        assert_eq!(
            tree.specs,
            vec![Spec::Decl(Decl::Var {
                spec: Specifier::variable(),
                names: vec![Name::new("x")],
            })]
        );
        assert_eq!(
            tree.commands,
            vec![Cmd::Assign {
                target: elem("x"),
                value: dec(5),
            }]
        );
    }

    #[test]
    fn test_name_list_declaration() {
        let tree = parse_clean("chan a, b, c : skip");
        assert_matches!(
            &tree.specs[0],
            Spec::Decl(Decl::Var { spec, names }) if spec.kind == SpecifierKind::Chan && names.len() == 3
        );
    }

    #[test]
    fn test_array_dimensions() {
        let tree = parse_clean("var[10][] a : skip");
        assert_matches!(
            &tree.specs[0],
            Spec::Decl(Decl::Var { spec, .. }) if spec.dims == vec![Some(dec(10)), None]
        );
    }

    #[test]
    fn test_val_abbreviations() {
        let tree = parse_clean("val x is 1 : val var y is x + 1 : skip");
        assert_matches!(
            &tree.specs[0],
            Spec::Abbr(Abbr::Val { spec, name, .. }) if spec.val && name.text == "x"
        );
        assert_matches!(
            &tree.specs[1],
            Spec::Abbr(Abbr::Val { value: Expr::Binary { op: BinaryOp::Add, .. }, .. })
        );
    }

    #[test]
    fn test_val_on_channel_is_fatal() {
        let (result, _) = parse("val chan c is d : skip");
        assert_matches!(result, Err(FatalError::ValOnNonVariable { line: 1 }));
    }

    #[test]
    fn test_reference_abbreviation() {
        let tree = parse_clean("var y is a[2] : skip");
        assert_matches!(
            &tree.specs[0],
            Spec::Abbr(Abbr::Ref { target, .. }) if target.base.subscripts == vec![dec(2)]
        );
    }

    #[test]
    fn test_process_definition_with_formals() {
        let tree = parse_clean("process P(var a, b, chan c) is c ! a : P(x, y, z)");
        let Spec::Def(Def::Process { formals, body, interface, .. }) = &tree.specs[0] else {
            panic!("expected a process definition");
        };
        assert_eq!(formals.len(), 2);
        assert_eq!(formals[0].names.len(), 2);
        assert_eq!(formals[1].spec.kind, SpecifierKind::Chan);
        assert!(interface.is_none());
        assert_matches!(body, Cmd::Output { .. });
        assert_matches!(&tree.commands[0], Cmd::Instance { actuals, .. } if actuals.len() == 3);
    }

    #[test]
    fn test_empty_formals_are_accepted() {
        let tree = parse_clean("process P() is skip : P()");
        assert_matches!(&tree.specs[0], Spec::Def(def) if def.formals().is_empty());
    }

    #[test]
    fn test_named_entity_formals() {
        let tree = parse_clean("process Q(process T p, function f) is skip : skip");
        let formals = tree.specs[0].clone();
        let Spec::Def(def) = formals else {
            panic!("expected a definition");
        };
        let formals = def.formals();
        assert_eq!(
            formals[0].spec.kind,
            SpecifierKind::Process(Some(Name::new("T")))
        );
        assert_eq!(formals[0].names, vec![Name::new("p")]);
        assert_eq!(formals[1].spec.kind, SpecifierKind::Function(None));
        assert_eq!(formals[1].names, vec![Name::new("f")]);
    }

    #[test]
    fn test_process_with_interface() {
        let tree = parse_clean("process P() is interface(chan a, b, call f(var x)) to a ? x : skip");
        let Spec::Def(Def::Process { interface: Some(interface), .. }) = &tree.specs[0] else {
            panic!("expected an interface");
        };
        assert_eq!(interface.len(), 2);
        assert_matches!(&interface[0], Decl::Var { names, .. } if names.len() == 2);
        assert_matches!(&interface[1], Decl::Call(sigs) if sigs[0].formals.len() == 1);
    }

    #[test]
    fn test_function_definition() {
        let tree = parse_clean("function sq(var n) is n * n : x := sq(3)");
        assert_matches!(&tree.specs[0], Spec::Def(Def::Function { body: Expr::Binary { op: BinaryOp::Mul, .. }, .. }));
        assert_matches!(
            &tree.commands[0],
            Cmd::Assign { value: Expr::Operand(Operand::Apply { .. }), .. }
        );
    }

    #[test]
    fn test_server_forms() {
        let tree = parse_clean(
            "server S() is interface(call get(var v)) to { var x ; var y } :\n\
             server T(chan c) inherits from var z : interface I :\n\
             server s is S() :\n\
             skip",
        );
        assert_matches!(&tree.specs[0], Spec::Def(Def::Server { body: Server::Spec { specs, .. }, .. }) if specs.len() == 2);
        assert_matches!(
            &tree.specs[1],
            Spec::Def(Def::InheritingServer { hiding, .. }) if hiding.interface.text == "I" && hiding.specs.len() == 1
        );
        assert_matches!(
            &tree.specs[2],
            Spec::Decl(Decl::Server { server: Server::Instance { .. }, .. })
        );
    }

    #[test]
    fn test_hiding_declaration() {
        let tree = parse_clean("from var a : chan b : interface I : skip");
        assert_matches!(
            &tree.specs[0],
            Spec::Decl(Decl::Hiding(HidingDecl { specs, .. })) if specs.len() == 2
        );
    }

    #[test]
    fn test_call_declaration_and_abbreviation() {
        let tree = parse_clean("call f(var a), g() : call h(var b) is s.get : s.get(1)");
        assert_matches!(&tree.specs[0], Spec::Decl(Decl::Call(sigs)) if sigs.len() == 2);
        assert_matches!(&tree.specs[1], Spec::Abbr(Abbr::Call { target, .. }) if target.field.is_some());
        assert_matches!(&tree.commands[0], Cmd::Call { field, .. } if field.text == "get");
    }

    #[test]
    fn test_simultaneous_definitions() {
        let tree = parse_clean("process P() is skip & process Q() is skip : P()");
        assert_matches!(&tree.specs[..], [Spec::Simultaneous(defs)] if defs.len() == 2);
    }

    #[test]
    fn test_simultaneous_abbreviations_are_rejected() {
        let (result, diagnostics) = parse("val x is 1 & val y is 2 : skip");
        let tree = result.unwrap();
        assert_eq!(diagnostics.messages(), vec!["cannot make a simultaneous declaration"]);
        assert_eq!(tree.specs.len(), 2);
        assert!(tree.specs.iter().all(|s| matches!(s, Spec::Abbr(_))));
    }

    #[test]
    fn test_mixed_chain_reports_once() {
        let (_, diagnostics) = parse("process P() is skip & var x & var y : skip");
        assert_eq!(diagnostics.messages(), vec!["cannot make a simultaneous declaration"]);
    }

    #[test]
    fn test_inferred_abbreviation_chain_is_rejected() {
        let (result, diagnostics) = parse("x is 1 & y is 2 : skip");
        assert!(result.is_ok());
        assert_eq!(diagnostics.messages(), vec!["cannot make a simultaneous declaration"]);
    }

    #[test]
    fn test_blocks() {
        let tree = parse_clean("{ a := 1 ; b := 2 } { c ! 1 | d ? x } { skip }");
        assert_matches!(&tree.commands[0], Cmd::Seq(cmds) if cmds.len() == 2);
        assert_matches!(&tree.commands[1], Cmd::Par(cmds) if cmds.len() == 2);
        assert_matches!(&tree.commands[2], Cmd::Seq(cmds) if cmds.len() == 1);
    }

    #[test]
    fn test_replicated_commands() {
        let tree = parse_clean("par [i = 0 for n, j = 1 for 2 step 2] c[i] ! j");
        let Cmd::RepPar { ranges, body } = &tree.commands[0] else {
            panic!("expected a replicated par");
        };
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].step, Some(dec(2)));
        assert_matches!(body.as_ref(), Cmd::Output { channel, .. } if channel.base.subscripts.len() == 1);
    }

    #[test]
    fn test_empty_replicator_is_rejected() {
        let (result, diagnostics) = parse("alt [] c ? x : skip");
        assert!(result.is_ok());
        assert_eq!(diagnostics.messages(), vec!["name expected"]);
    }

    #[test]
    fn test_alternatives() {
        let tree = parse_clean(
            "alt { c ? x : skip | ready & d ? y : stop | t > 0 & skip : skip | alt { e ? z : skip } | var w : f ? w : skip }",
        );
        let Cmd::Alt(altns) = &tree.commands[0] else {
            panic!("expected alt");
        };
        assert_matches!(&altns[0], Altn::Input { .. });
        assert_matches!(&altns[1], Altn::GuardedInput { guard, .. } if guard.as_elem().is_some());
        assert_matches!(&altns[2], Altn::GuardedSkip { guard: Expr::Binary { op: BinaryOp::Gt, .. }, .. });
        assert_matches!(&altns[3], Altn::Nested(_));
        assert_matches!(&altns[4], Altn::Spec { altn, .. } if matches!(**altn, Altn::Input { .. }));
    }

    #[test]
    fn test_tests_and_conditionals() {
        let tree = parse_clean(
            "test { x = 0 : skip | test [i = 0 for 4] a[i] : stop } if x do skip if x then skip else stop",
        );
        assert_matches!(&tree.commands[0], Cmd::Test(choices) if matches!(choices[1], Choice::Nested(_)));
        assert_matches!(&tree.commands[1], Cmd::IfDo { .. });
        assert_matches!(&tree.commands[2], Cmd::IfThenElse { .. });
    }

    #[test]
    fn test_case_and_loops() {
        let tree = parse_clean(
            "case x { 1 : skip | 2 : stop | else skip } case x [i = 0 for 3] i : skip \
             while x < 10 do x := x + 1 do x := x - 1 while x > 0 until done do skip",
        );
        assert_matches!(&tree.commands[0], Cmd::Case { selects, .. } if matches!(selects[2], Select::Else(_)));
        assert_matches!(&tree.commands[1], Cmd::RepCase { .. });
        assert_matches!(&tree.commands[2], Cmd::While { .. });
        assert_matches!(&tree.commands[3], Cmd::Do { .. });
        assert_matches!(&tree.commands[4], Cmd::Until { .. });
    }

    #[test]
    fn test_replicated_case_on_a_name() {
        let tree = parse_clean("case x [i = 0 for 3] i : skip case s.f - 1 [j = 0 for 2] j : stop");
        assert_matches!(
            &tree.commands[0],
            Cmd::RepCase { selector, ranges, .. }
                if selector.as_elem() == Some(&elem("x")) && ranges.len() == 1
        );
        assert_matches!(
            &tree.commands[1],
            Cmd::RepCase { selector: Expr::Binary { op: BinaryOp::Sub, left: Operand::Elem(Elem { field: Some(_), .. }), .. }, .. }
        );
    }

    #[test]
    fn test_subscripted_selector_needs_parentheses() {
        let tree = parse_clean("case (a[1]) { 1 : skip } case f(a[1]) [i = 0 for 2] i : skip");
        assert_matches!(&tree.commands[0], Cmd::Case { selector: Expr::Operand(Operand::Paren(_)), .. });
        assert_matches!(&tree.commands[1], Cmd::RepCase { selector: Expr::Operand(Operand::Apply { .. }), .. });

        let (_, diagnostics) = parse("case a[1] { 1 : skip }");
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn test_connect_and_valof() {
        let tree = parse_clean("connect a.left to b.right x := valof { y := 1 ; y := y + 1 } result y");
        assert_matches!(&tree.commands[0], Cmd::Connect { local, .. } if local.field.is_some());
        assert_matches!(
            &tree.commands[1],
            Cmd::Assign { value: Expr::Operand(Operand::Valof { .. }), .. }
        );
    }

    #[test]
    fn test_expression_forms() {
        let tree = parse_clean("x := -y x := ~(a && b) x := 0x1F << 0b1 x := 'c'");
        assert_matches!(&tree.commands[0], Cmd::Assign { value: Expr::Unary { op: UnaryOp::Neg, .. }, .. });
        assert_matches!(
            &tree.commands[1],
            Cmd::Assign { value: Expr::Unary { op: UnaryOp::Not, operand: Operand::Paren(_) }, .. }
        );
        assert_matches!(
            &tree.commands[2],
            Cmd::Assign {
                value: Expr::Binary {
                    op: BinaryOp::Shl,
                    left: Operand::Literal(Literal::HexInt(31)),
                    right: Operand::Literal(Literal::BinInt(1)),
                },
                ..
            }
        );
        assert_matches!(&tree.commands[3], Cmd::Assign { value: Expr::Operand(Operand::Literal(Literal::Char('c'))), .. });
    }

    #[test]
    fn test_scoped_command() {
        let tree = parse_clean("{ var y : y := 1 ; skip }");
        assert_matches!(&tree.commands[0], Cmd::Seq(cmds) if matches!(cmds[0], Cmd::Spec { .. }));
    }

    #[test]
    fn test_definition_inside_command_is_reported() {
        let (result, diagnostics) = parse("{ process P() is skip : P() ; skip }");
        assert!(result.is_ok());
        assert_eq!(
            diagnostics.messages(),
            vec!["definition in specification of command"]
        );
    }

    #[test]
    fn test_missing_token_reports() {
        let (_, diagnostics) = parse("if x skip");
        assert_eq!(diagnostics.messages()[0], "expecting 'do' or 'then'");

        let (_, diagnostics) = parse("while x skip");
        assert_eq!(diagnostics.messages()[0], "'do' missing");

        let (_, diagnostics) = parse("x + 1");
        assert_eq!(
            diagnostics.messages()[0],
            "expecting assignment, input, output, instance or call"
        );
    }

    #[test]
    fn test_bad_separator() {
        let (result, diagnostics) = parse("var x ; skip");
        assert!(result.is_ok());
        assert_eq!(diagnostics.messages(), vec!["bad separator for specification"]);
    }

    #[test]
    fn test_program_without_commands() {
        let (result, diagnostics) = parse("var x :");
        assert!(result.is_ok());
        assert_eq!(diagnostics.messages(), vec!["bad command"]);
    }

    #[test]
    fn test_stray_closing_bracket_is_a_bad_command() {
        let (result, diagnostics) = parse("skip } skip");
        assert_eq!(result.unwrap().commands, vec![Cmd::Skip, Cmd::Skip, Cmd::Skip]);
        assert_eq!(diagnostics.messages(), vec!["bad command"]);
    }

    #[test]
    fn test_lexical_error_is_counted_once() {
        let (result, diagnostics) = parse("skip $ junk\nstop");
        let tree = result.unwrap();
        assert_eq!(diagnostics.messages(), vec!["illegal character"]);
        assert_eq!(tree.commands, vec![Cmd::Skip, Cmd::Stop]);
    }

    #[test]
    fn test_error_threshold() {
        let seven = "+ ".repeat(7);
        let (result, diagnostics) = parse(&format!("{}skip", seven));
        assert!(result.is_ok());
        assert_eq!(diagnostics.error_count(), 7);

        let eight = "+ ".repeat(8);
        let (result, diagnostics) = parse(&format!("{}skip", eight));
        assert_matches!(result, Err(FatalError::TooManyErrors { count: 8 }));
        assert_eq!(diagnostics.reports().len(), 8);
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("x := {}1{}", "(".repeat(MAX_NESTING_DEPTH), ")".repeat(MAX_NESTING_DEPTH));
        let result = std::thread::Builder::new()
            .stack_size(256 << 20)
            .spawn(move || parse(&deep).0)
            .unwrap()
            .join()
            .unwrap();
        assert_matches!(result, Err(FatalError::NestingTooDeep { .. }));
    }
}
