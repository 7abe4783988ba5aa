//! The analysis session.
//!
//! [`Analyzer`] owns the symbol stream, the cursor over it and everything a
//! handler needs while walking a file: the type compiler, the globals, the
//! variable scope of the routine being analyzed and the diagnostic log.
//!
//! A file is analyzed in three passes:
//!
//! - a pre-scan creates a stub for every class and interface name, so
//!   annotations can name classes declared further down;
//! - the declaration pass registers every top-level function and class
//!   header and skips their bodies;
//! - the analysis pass dispatches every statement in source order.

use std::{
    collections::{HashMap, HashSet},
    mem,
    rc::Rc,
};

use tracing::{debug, error, trace};

use crate::{
    config::Config,
    diagnostics::diagnostics::{DiagnosticLog, Logger},
    errors::errors::{Error, ErrorImpl},
    flow::status::FlowStatus,
    hierarchy::class_graph::{ClassId, ClassKind, ClassNode},
    lexer::{
        lexer::tokenize,
        symbols::{Symbol, SymbolKind},
    },
    types::{compiler::TypeCompiler, matcher::TypeMatcher, signature::Signature},
    Position,
};

use super::{
    decl::{check_class, declare_class, declare_function},
    globals::Globals,
    lookups::{create_symbol_lookups, BPLookup, BindingPower, LEDHandler, LEDLookup, NUDHandler, NUDLookup},
    stmt::parse_statements,
};

/// A local variable and the type it was declared with.
#[derive(Debug, Clone)]
pub struct Variable {
    pub ty: Rc<TypeMatcher>,
    /// Declared through an annotation rather than by first assignment.
    pub annotated: bool,
}

/// The routine whose body is being analyzed.
#[derive(Debug, Clone)]
pub struct FunctionContext {
    pub name: String,
    pub signature: Signature,
    pub class: Option<ClassId>,
    pub is_static: bool,
}

pub struct Analyzer {
    symbols: Vec<Symbol>,
    pos: usize,
    file: Rc<String>,
    pub config: Config,
    pub logger: DiagnosticLog,
    pub compiler: TypeCompiler,
    pub globals: Globals,
    nud_lookup: NUDLookup,
    led_lookup: LEDLookup,
    binding_power_lookup: BPLookup,
    scope: HashMap<String, Variable>,
    function: Option<FunctionContext>,
    class: Option<ClassId>,
    /// Number of enclosing loops and switches.
    breakable_depth: usize,
    checked_classes: HashSet<ClassId>,
}

impl Analyzer {
    pub fn new(symbols: Vec<Symbol>, file: Rc<String>, config: Config) -> Self {
        let mut compiler = TypeCompiler::new();
        let globals = match Globals::with_builtins(&mut compiler) {
            Ok(globals) => globals,
            Err(error) => {
                error!(%error, "builtin declarations failed to compile");
                Globals::new()
            }
        };

        let mut analyzer = Analyzer {
            symbols,
            pos: 0,
            file,
            logger: DiagnosticLog::new(config.min_severity),
            config,
            compiler,
            globals,
            nud_lookup: HashMap::new(),
            led_lookup: HashMap::new(),
            binding_power_lookup: HashMap::new(),
            scope: HashMap::new(),
            function: None,
            class: None,
            breakable_depth: 0,
            checked_classes: HashSet::new(),
        };
        create_symbol_lookups(&mut analyzer);
        analyzer
    }

    // Cursor

    pub fn current_symbol(&self) -> &Symbol {
        let last = self.symbols.len().saturating_sub(1);
        &self.symbols[self.pos.min(last)]
    }

    pub fn current_kind(&self) -> SymbolKind {
        self.current_symbol().kind
    }

    /// Kind of the symbol `n` places ahead of the current one.
    pub fn peek_kind(&self, n: usize) -> SymbolKind {
        self.symbols
            .get(self.pos + n)
            .map_or(SymbolKind::EOF, |symbol| symbol.kind)
    }

    pub fn peek(&self, n: usize) -> Option<&Symbol> {
        self.symbols.get(self.pos + n)
    }

    /// Consumes the current symbol and returns it. Never moves past `EOF`.
    pub fn advance(&mut self) -> Symbol {
        let symbol = self.current_symbol().clone();
        if symbol.kind != SymbolKind::EOF {
            self.pos += 1;
        }
        symbol
    }

    pub fn expect_error(&mut self, expected_kind: SymbolKind, error: Option<Error>) -> Result<Symbol, Error> {
        let symbol = self.current_symbol();
        if symbol.kind == expected_kind {
            return Ok(self.advance());
        }

        match error {
            Some(error) => Err(error),
            None => Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: symbol.value.clone(),
                    message: format!("expected {}", expected_kind),
                },
                symbol.span.start.clone(),
            )),
        }
    }

    pub fn expect(&mut self, expected_kind: SymbolKind) -> Result<Symbol, Error> {
        self.expect_error(expected_kind, None)
    }

    /// Consumes the current symbol if it has the given kind.
    pub fn accept(&mut self, kind: SymbolKind) -> bool {
        if self.current_kind() == kind {
            self.advance();
            return true;
        }
        false
    }

    pub fn has_symbols(&self) -> bool {
        self.current_kind() != SymbolKind::EOF
    }

    pub fn get_position(&self) -> Position {
        self.current_symbol().span.start.clone()
    }

    pub fn get_pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.symbols.len().saturating_sub(1));
    }

    pub fn file(&self) -> Rc<String> {
        Rc::clone(&self.file)
    }

    pub fn unexpected(&self) -> Error {
        Error::new(
            ErrorImpl::UnexpectedToken {
                token: self.current_symbol().value.clone(),
            },
            self.get_position(),
        )
    }

    /// Consumes a `{ ... }` block without analyzing it.
    pub fn skip_block(&mut self) -> Result<(), Error> {
        self.expect(SymbolKind::OpenCurly)?;
        let mut depth = 1;
        while depth > 0 {
            match self.advance().kind {
                SymbolKind::OpenCurly => depth += 1,
                SymbolKind::CloseCurly => depth -= 1,
                SymbolKind::EOF => return Err(self.unexpected()),
                _ => {}
            }
        }
        Ok(())
    }

    /// Error recovery: discards symbols up to and including a `;`, or up to
    /// a `}` closing the current nesting level.
    pub fn synchronize(&mut self, start: usize) {
        if self.pos == start {
            self.advance();
        }

        let mut depth = 0usize;
        loop {
            match self.current_kind() {
                SymbolKind::EOF => return,
                SymbolKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                SymbolKind::CloseCurly if depth == 0 => return,
                SymbolKind::OpenCurly => depth += 1,
                SymbolKind::CloseCurly => depth -= 1,
                _ => {}
            }
            self.advance();
        }
    }

    // Lookups

    pub fn get_nud_lookup(&self) -> &NUDLookup {
        &self.nud_lookup
    }

    pub fn get_led_lookup(&self) -> &LEDLookup {
        &self.led_lookup
    }

    pub fn get_bp_lookup(&self) -> &BPLookup {
        &self.binding_power_lookup
    }

    pub fn led(&mut self, kind: SymbolKind, binding_power: BindingPower, led_fn: LEDHandler) {
        self.binding_power_lookup.insert(kind, binding_power);
        self.led_lookup.insert(kind, led_fn);
    }

    pub fn nud(&mut self, kind: SymbolKind, nud_fn: NUDHandler) {
        self.nud_lookup.insert(kind, nud_fn);
    }

    // Reporting

    pub fn report(&mut self, error: ErrorImpl, position: Position) {
        self.logger.report_error(&Error::new(error, position));
    }

    pub fn report_error(&mut self, error: &Error) {
        self.logger.report_error(error);
    }

    // Types

    pub fn matcher(&mut self, descriptor: &str) -> Rc<TypeMatcher> {
        match self.compiler.compile(descriptor, &self.globals.classes) {
            Ok(matcher) => matcher,
            Err(_) => Rc::new(TypeMatcher::Mixed),
        }
    }

    pub fn mixed(&mut self) -> Rc<TypeMatcher> {
        self.matcher("mixed")
    }

    /// Compiles an annotated type. Failures are reported at `position` and
    /// yield `mixed`.
    pub fn resolve_type(&mut self, descriptor: &str, position: &Position) -> Rc<TypeMatcher> {
        let descriptor = self.expand_self(descriptor);
        match self.compiler.compile(&descriptor, &self.globals.classes) {
            Ok(matcher) => matcher,
            Err(error) => {
                self.report(
                    ErrorImpl::InvalidAnnotation {
                        reason: error.to_string(),
                    },
                    position.clone(),
                );
                self.mixed()
            }
        }
    }

    fn expand_self(&self, descriptor: &str) -> String {
        let (base, tags) = crate::types::matcher::split_index_tags(descriptor);
        match self.class {
            Some(class) if base.eq_ignore_ascii_case("self") => {
                format!("{}{}", self.globals.classes.name(class), tags)
            }
            _ => descriptor.to_string(),
        }
    }

    pub fn accepts(&self, target: &TypeMatcher, source: &TypeMatcher) -> bool {
        target.accepts(source, &self.globals.classes, self.config.strict_mixed)
    }

    /// Resolves a class name as written in code, including `self`, `static`
    /// and `parent`.
    pub fn resolve_class_name(&self, name: &str) -> Option<ClassId> {
        if name.eq_ignore_ascii_case("self") || name.eq_ignore_ascii_case("static") {
            return self.class;
        }
        if name.eq_ignore_ascii_case("parent") {
            return self.class.and_then(|class| self.globals.classes.get(class).extended);
        }
        self.globals.classes.resolve(name)
    }

    // Scope

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.scope.get(name)
    }

    pub fn declare_variable(&mut self, name: &str, ty: Rc<TypeMatcher>, annotated: bool) {
        self.scope.insert(name.to_string(), Variable { ty, annotated });
    }

    pub fn function_context(&self) -> Option<&FunctionContext> {
        self.function.as_ref()
    }

    pub fn current_class(&self) -> Option<ClassId> {
        self.class
    }

    /// Runs `body` with a fresh variable scope and the given routine and
    /// class context, restoring the enclosing ones afterwards.
    pub fn with_function<T>(
        &mut self,
        context: FunctionContext,
        body: impl FnOnce(&mut Analyzer) -> T,
    ) -> T {
        let class = context.class;
        let previous_scope = mem::take(&mut self.scope);
        let previous_function = self.function.replace(context);
        let previous_class = mem::replace(&mut self.class, class);
        let previous_depth = mem::replace(&mut self.breakable_depth, 0);

        let result = body(self);

        self.scope = previous_scope;
        self.function = previous_function;
        self.class = previous_class;
        self.breakable_depth = previous_depth;
        result
    }

    pub fn with_class<T>(&mut self, class: ClassId, body: impl FnOnce(&mut Analyzer) -> T) -> T {
        let previous_class = self.class.replace(class);
        let result = body(self);
        self.class = previous_class;
        result
    }

    /// Runs `body` inside a loop or switch.
    pub fn with_breakable<T>(&mut self, body: impl FnOnce(&mut Analyzer) -> T) -> T {
        self.breakable_depth += 1;
        let result = body(self);
        self.breakable_depth -= 1;
        result
    }

    pub fn breakable_depth(&self) -> usize {
        self.breakable_depth
    }

    pub fn mark_checked(&mut self, class: ClassId) -> bool {
        self.checked_classes.insert(class)
    }

    // Passes

    /// Creates a stub for every `class`/`interface` name in the file.
    fn pre_scan(&mut self) {
        for index in 0..self.symbols.len() {
            let kind = match self.symbols[index].kind {
                SymbolKind::Class => ClassKind::Class,
                SymbolKind::Interface => ClassKind::Interface,
                _ => continue,
            };
            if index > 0 && self.symbols[index - 1].kind == SymbolKind::DoubleColon {
                continue;
            }
            let Some(name) = self.symbols.get(index + 1).filter(|s| s.kind == SymbolKind::Identifier) else {
                continue;
            };

            let node = ClassNode::stub(&name.value, kind, name.span.start.clone());
            self.globals.classes.add(node);
        }
    }

    /// Registers top-level functions and classes, skipping everything else.
    fn declaration_pass(&mut self) -> Vec<ClassId> {
        let mut declared = vec![];
        let mut depth = 0usize;
        self.pos = 0;

        while self.has_symbols() {
            let start = self.pos;
            let kind = if self.current_kind() == SymbolKind::OpenAnnotation {
                self.kind_after_annotation()
            } else {
                self.current_kind()
            };

            if depth == 0 {
                let result = match kind {
                    SymbolKind::Function if self.is_named_function() => declare_function(self).map(|_| ()),
                    SymbolKind::Class | SymbolKind::Interface | SymbolKind::Abstract | SymbolKind::Final => {
                        declare_class(self).map(|class| declared.extend(class))
                    }
                    _ => Ok(()),
                };
                if let Err(error) = result {
                    self.report_error(&error);
                    self.synchronize(start);
                }
                if self.pos != start {
                    continue;
                }
            }

            match self.advance().kind {
                SymbolKind::OpenCurly => depth += 1,
                SymbolKind::CloseCurly => depth = depth.saturating_sub(1),
                _ => {}
            }
        }

        declared
    }

    /// Kind of the first symbol after the annotation starting here.
    pub fn kind_after_annotation(&self) -> SymbolKind {
        let mut n = 0;
        while !matches!(self.peek_kind(n), SymbolKind::CloseAnnotation | SymbolKind::EOF) {
            n += 1;
        }
        self.peek_kind(n + 1)
    }

    /// Whether the `function` keyword here (possibly after an annotation)
    /// starts a named declaration rather than a closure.
    pub fn is_named_function(&self) -> bool {
        let mut n = 0;
        if self.peek_kind(0) == SymbolKind::OpenAnnotation {
            while !matches!(self.peek_kind(n), SymbolKind::CloseAnnotation | SymbolKind::EOF) {
                n += 1;
            }
            n += 1;
        }
        self.peek_kind(n) == SymbolKind::Function && self.peek_kind(n + 1) == SymbolKind::Identifier
    }

    /// Runs all passes and returns the control-flow status of the file.
    pub fn analyze(&mut self) -> FlowStatus {
        debug!(file = %self.file, symbols = self.symbols.len(), "pre-scan");
        self.pre_scan();

        debug!(file = %self.file, "declaration pass");
        for class in self.declaration_pass() {
            check_class(self, class);
        }

        debug!(file = %self.file, "analysis pass");
        self.pos = 0;
        let status = parse_statements(self, &[]);
        trace!(flow = ?status.flow, "analyzed file");
        status
    }

    pub fn into_log(self) -> DiagnosticLog {
        self.logger
    }
}

/// Tokenizes and analyzes one source file, returning what was reported.
pub fn analyze_source(source: &str, file: Option<String>, config: Config) -> DiagnosticLog {
    let file_name = Rc::new(file.clone().unwrap_or_else(|| String::from("shell")));
    let symbols = match tokenize(source.to_string(), file) {
        Ok(symbols) => symbols,
        Err(error) => {
            let mut log = DiagnosticLog::new(config.min_severity);
            log.report_error(&error);
            return log;
        }
    };

    let mut analyzer = Analyzer::new(symbols, file_name, config);
    analyzer.analyze();
    analyzer.into_log()
}
