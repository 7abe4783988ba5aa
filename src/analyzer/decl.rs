//! Function and class declarations.
//!
//! Declarations are read twice. The declaration pass registers headers and
//! members and skips routine bodies; the analysis pass reads them again,
//! registering only what the first pass could not reach (declarations nested
//! in other statements), and analyzes the bodies.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::{
    errors::errors::{Error, ErrorImpl},
    flow::{algebra::uncovered_exceptions, status::FlowStatus},
    hierarchy::{
        class_graph::{ClassId, ClassKind, ClassNode, Constant, Method, Property, Visibility},
        resolver::unimplemented_abstract_methods,
    },
    lexer::symbols::SymbolKind,
    types::{
        matcher::{insert_index_tag, TypeMatcher},
        signature::{Parameter, Signature},
    },
    Position,
};

use super::{
    analyzer::{Analyzer, FunctionContext},
    annotations::{parse_annotation, parse_leading_annotation, read_type_descriptor, Annotation},
    expr::parse_expr,
    globals::FunctionEntry,
    lookups::BindingPower,
    stmt::parse_statements,
};

/// A parsed function or method header.
#[derive(Debug, Clone)]
pub struct FunctionHeader {
    pub name: String,
    pub position: Position,
    pub signature: Signature,
}

fn invalid_annotation(reason: &str, position: Position) -> Error {
    Error::new(
        ErrorImpl::InvalidAnnotation {
            reason: reason.to_string(),
        },
        position,
    )
}

/// Resolves the classes of a `throws` list, reporting unknown ones.
fn resolve_throws(analyzer: &mut Analyzer, classes: Vec<(String, Position)>) -> Vec<ClassId> {
    let mut throws = vec![];
    for (name, position) in classes {
        match analyzer.resolve_class_name(&name) {
            Some(class) => throws.push(class),
            None => analyzer.report(ErrorImpl::UnknownClass { class: name }, position),
        }
    }
    throws
}

fn parse_params(analyzer: &mut Analyzer) -> Result<(Vec<Parameter>, bool), Error> {
    analyzer.expect(SymbolKind::OpenParen)?;

    let mut params = vec![];
    let mut is_variadic = false;
    while analyzer.current_kind() != SymbolKind::CloseParen {
        if is_variadic {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: analyzer.current_symbol().value.clone(),
                    message: String::from("the variadic parameter must be the last one"),
                },
                analyzer.get_position(),
            ));
        }

        let declared = match analyzer.current_kind() {
            SymbolKind::OpenAnnotation => match parse_annotation(analyzer)? {
                Annotation::Type(descriptor, position) => Some(analyzer.resolve_type(&descriptor, &position)),
                _ => return Err(invalid_annotation("expected a parameter type", analyzer.get_position())),
            },
            SymbolKind::Identifier | SymbolKind::Array => {
                let position = analyzer.get_position();
                let descriptor = read_type_descriptor(analyzer)?;
                Some(analyzer.resolve_type(&descriptor, &position))
            }
            _ => None,
        };

        let by_reference = analyzer.accept(SymbolKind::Ampersand);
        if analyzer.current_kind() == SymbolKind::Dot
            && analyzer.peek_kind(1) == SymbolKind::Dot
            && analyzer.peek_kind(2) == SymbolKind::Dot
        {
            for _ in 0..3 {
                analyzer.advance();
            }
            is_variadic = true;
        }
        let name = analyzer.expect(SymbolKind::Variable)?;

        let mut has_default = is_variadic;
        let mut ty = declared.clone();
        if analyzer.accept(SymbolKind::Assignment) {
            let default = parse_expr(analyzer, BindingPower::Comma)?;
            has_default = true;
            match &declared {
                Some(declared) if !analyzer.accepts(declared, &default.ty) => analyzer.report(
                    ErrorImpl::TypeMatchError {
                        expected: declared.to_string(),
                        received: default.ty.to_string(),
                    },
                    default.position.clone(),
                ),
                Some(_) => {}
                None if matches!(default.ty.as_ref(), TypeMatcher::Null) => {}
                None => ty = Some(default.ty.clone()),
            }
        }

        params.push(Parameter {
            name: name.value,
            ty: ty.unwrap_or_else(|| analyzer.mixed()),
            has_default,
            by_reference,
        });

        if !analyzer.accept(SymbolKind::Comma) {
            break;
        }
    }

    analyzer.expect(SymbolKind::CloseParen)?;
    Ok((params, is_variadic))
}

/// Parses `function name(params) [: T] [/*. throws .. .*/]`. `leading` is
/// the annotation written before the header, if any.
pub fn parse_function_header(analyzer: &mut Analyzer, leading: Option<Annotation>) -> Result<FunctionHeader, Error> {
    analyzer.expect(SymbolKind::Function)?;
    analyzer.accept(SymbolKind::Ampersand);
    let name = analyzer.expect(SymbolKind::Identifier)?;
    let (params, is_variadic) = parse_params(analyzer)?;

    // Outer `None` means not annotated, inner `None` means `void`.
    let mut return_type: Option<Option<Rc<TypeMatcher>>> = None;
    let mut throws = vec![];
    let mut annotations = vec![];
    annotations.extend(leading);

    if analyzer.accept(SymbolKind::Colon) {
        let position = analyzer.get_position();
        let descriptor = read_type_descriptor(analyzer)?;
        if descriptor.eq_ignore_ascii_case("void") {
            annotations.push(Annotation::Void);
        } else {
            annotations.push(Annotation::Type(descriptor, position));
        }
    }
    while analyzer.current_kind() == SymbolKind::OpenAnnotation {
        annotations.push(parse_annotation(analyzer)?);
    }

    for annotation in annotations {
        match annotation {
            Annotation::Type(descriptor, position) => {
                return_type = Some(Some(analyzer.resolve_type(&descriptor, &position)));
            }
            Annotation::Void => return_type = Some(None),
            Annotation::Throws(classes) => throws.extend(resolve_throws(analyzer, classes)),
            Annotation::Unchecked => {
                analyzer.report(
                    ErrorImpl::InvalidAnnotation {
                        reason: String::from("`unchecked` only applies to classes"),
                    },
                    name.span.start.clone(),
                );
            }
        }
    }

    let return_type = match return_type {
        Some(return_type) => return_type,
        None => Some(analyzer.mixed()),
    };

    Ok(FunctionHeader {
        name: name.value,
        position: name.span.start,
        signature: Signature {
            params,
            return_type,
            throws,
            is_variadic,
        },
    })
}

/// Registers a function unless this very declaration already was.
fn register_function(analyzer: &mut Analyzer, header: &FunctionHeader) {
    if let Some(existing) = analyzer.globals.function(&header.name) {
        if existing.position != header.position {
            analyzer.report(
                ErrorImpl::FunctionAlreadyDeclared {
                    function: header.name.clone(),
                },
                header.position.clone(),
            );
        }
        return;
    }

    debug!(function = %header.name, signature = %header.signature, "declared function");
    analyzer.globals.declare_function(FunctionEntry {
        name: header.name.clone(),
        signature: header.signature.clone(),
        position: header.position.clone(),
    });
}

/// Declaration pass: registers the function at the cursor and skips its
/// body.
pub fn declare_function(analyzer: &mut Analyzer) -> Result<FunctionHeader, Error> {
    let leading = parse_leading_annotation(analyzer)?;
    let header = parse_function_header(analyzer, leading)?;
    register_function(analyzer, &header);
    analyzer.skip_block()?;
    Ok(header)
}

/// Checks how the body of a routine left it: falling off the end of a
/// routine that returns a value, and checked exceptions escaping it.
fn check_routine_exit(analyzer: &mut Analyzer, header: &FunctionHeader, status: &FlowStatus) {
    if status.can_fall_through() {
        if let Some(return_type) = &header.signature.return_type {
            if !return_type.is_mixed() {
                analyzer.report(
                    ErrorImpl::MissingReturn {
                        function: header.name.clone(),
                    },
                    header.position.clone(),
                );
            }
        }
    }

    if !analyzer.config.check_throws {
        return;
    }
    let uncovered = uncovered_exceptions(&status.raises, &header.signature.throws, &analyzer.globals.classes);
    for exception in uncovered {
        let exception = analyzer.globals.classes.name(exception).to_string();
        analyzer.report(
            ErrorImpl::UndeclaredException {
                exception,
                function: header.name.clone(),
            },
            header.position.clone(),
        );
    }
}

/// Analyzes `{ body }` of a routine in a fresh scope holding its parameters.
fn analyze_body(
    analyzer: &mut Analyzer,
    header: &FunctionHeader,
    class: Option<ClassId>,
    is_static: bool,
) -> Result<(), Error> {
    let context = FunctionContext {
        name: header.name.clone(),
        signature: header.signature.clone(),
        class,
        is_static,
    };

    let status = analyzer.with_function(context, |analyzer| -> Result<FlowStatus, Error> {
        let params = &header.signature.params;
        for (index, param) in params.iter().enumerate() {
            let ty = if header.signature.is_variadic && index + 1 == params.len() {
                analyzer.matcher(&insert_index_tag(&param.ty.to_string(), "[int]"))
            } else {
                param.ty.clone()
            };
            analyzer.declare_variable(&param.name, ty, true);
        }

        analyzer.expect(SymbolKind::OpenCurly)?;
        let status = parse_statements(analyzer, &[SymbolKind::CloseCurly]);
        analyzer.expect(SymbolKind::CloseCurly)?;
        Ok(status)
    })?;

    trace!(function = %header.name, flow = ?status.flow, "analyzed body");
    check_routine_exit(analyzer, header, &status);
    Ok(())
}

/// Analysis pass handler for `function name(..) { .. }`.
pub fn parse_fn_decl_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    let leading = parse_leading_annotation(analyzer)?;
    let header = parse_function_header(analyzer, leading)?;
    register_function(analyzer, &header);
    analyze_body(analyzer, &header, None, false)?;

    Ok(FlowStatus::falls_through())
}

/// `[abstract|final] class Name [extends ..] [implements ..]`
struct ClassHeader {
    id: ClassId,
    /// False when the node was registered by an earlier pass or by another
    /// declaration with the same name.
    fresh: bool,
}

fn resolve_parents(analyzer: &mut Analyzer, names: Vec<(String, Position)>) -> Vec<ClassId> {
    let mut parents = vec![];
    for (name, position) in names {
        match analyzer.globals.classes.resolve(&name) {
            Some(parent) => parents.push(parent),
            None => analyzer.report(ErrorImpl::UnknownClass { class: name }, position),
        }
    }
    parents
}

fn parse_name_list(analyzer: &mut Analyzer) -> Result<Vec<(String, Position)>, Error> {
    let mut names = vec![];
    loop {
        let name = analyzer.expect(SymbolKind::Identifier)?;
        names.push((name.value, name.span.start));
        if !analyzer.accept(SymbolKind::Comma) {
            break;
        }
    }
    Ok(names)
}

fn parse_class_header(analyzer: &mut Analyzer, leading: Option<Annotation>) -> Result<ClassHeader, Error> {
    let mut is_abstract = false;
    let mut is_final = false;
    loop {
        match analyzer.current_kind() {
            SymbolKind::Abstract => is_abstract = true,
            SymbolKind::Final => is_final = true,
            _ => break,
        }
        analyzer.advance();
    }

    let kind = match analyzer.advance() {
        symbol if symbol.kind == SymbolKind::Class => ClassKind::Class,
        symbol if symbol.kind == SymbolKind::Interface => ClassKind::Interface,
        symbol => return Err(Error::new(ErrorImpl::UnexpectedToken { token: symbol.value }, symbol.span.start)),
    };
    let name = analyzer.expect(SymbolKind::Identifier)?;
    let position = name.span.start.clone();

    let is_unchecked = match leading {
        Some(Annotation::Unchecked) => true,
        Some(_) => {
            analyzer.report(
                ErrorImpl::InvalidAnnotation {
                    reason: String::from("only `unchecked` applies to classes"),
                },
                position.clone(),
            );
            false
        }
        None => false,
    };

    let mut extended = vec![];
    let mut implemented = vec![];
    if analyzer.accept(SymbolKind::Extends) {
        extended = match kind {
            ClassKind::Class => {
                let parent = analyzer.expect(SymbolKind::Identifier)?;
                vec![(parent.value, parent.span.start)]
            }
            // Interfaces extend interfaces, which are recorded as implemented.
            ClassKind::Interface => parse_name_list(analyzer)?,
        };
    }
    if analyzer.accept(SymbolKind::Implements) {
        implemented = parse_name_list(analyzer)?;
    }
    if kind == ClassKind::Interface {
        extended.append(&mut implemented);
        implemented = std::mem::take(&mut extended);
    }

    let id = match analyzer.globals.classes.resolve(&name.value) {
        Some(id) => id,
        None => analyzer.globals.classes.add(ClassNode::stub(&name.value, kind, position.clone())),
    };

    let node = analyzer.globals.classes.get(id);
    if node.is_declared {
        if node.position != position {
            let class = name.value.clone();
            analyzer.report(ErrorImpl::ClassAlreadyDeclared { class }, position);
        }
        return Ok(ClassHeader { id, fresh: false });
    }

    let extended = resolve_parents(analyzer, extended).into_iter().next();
    let implemented = resolve_parents(analyzer, implemented);

    let node = analyzer.globals.classes.get_mut(id);
    node.kind = kind;
    node.is_abstract = is_abstract;
    node.is_final = is_final;
    node.is_unchecked = is_unchecked;
    node.is_declared = true;
    node.position = position;
    node.extended = extended;
    node.implemented = implemented;

    debug!(class = %name.value, "declared class");
    Ok(ClassHeader { id, fresh: true })
}

/// Modifiers and annotation written before a class member.
#[derive(Default)]
struct MemberModifiers {
    visibility: Option<Visibility>,
    is_static: bool,
    is_abstract: bool,
    is_final: bool,
    annotation: Option<Annotation>,
}

fn parse_member_modifiers(analyzer: &mut Analyzer) -> Result<MemberModifiers, Error> {
    let mut modifiers = MemberModifiers::default();
    loop {
        match analyzer.current_kind() {
            SymbolKind::Public => modifiers.visibility = Some(Visibility::Public),
            SymbolKind::Protected => modifiers.visibility = Some(Visibility::Protected),
            SymbolKind::Private => modifiers.visibility = Some(Visibility::Private),
            SymbolKind::Static => modifiers.is_static = true,
            SymbolKind::Abstract => modifiers.is_abstract = true,
            SymbolKind::Final => modifiers.is_final = true,
            SymbolKind::OpenAnnotation => {
                modifiers.annotation = Some(parse_annotation(analyzer)?);
                continue;
            }
            _ => return Ok(modifiers),
        }
        analyzer.advance();
    }
}

fn member_already_declared(analyzer: &mut Analyzer, class: ClassId, member: &str, position: Position) {
    let class = analyzer.globals.classes.name(class).to_string();
    analyzer.report(
        ErrorImpl::MemberAlreadyDeclared {
            class,
            member: member.to_string(),
        },
        position,
    );
}

fn annotated_type(analyzer: &mut Analyzer, annotation: Option<Annotation>) -> Result<Option<Rc<TypeMatcher>>, Error> {
    match annotation {
        None => Ok(None),
        Some(Annotation::Type(descriptor, position)) => Ok(Some(analyzer.resolve_type(&descriptor, &position))),
        Some(_) => Err(invalid_annotation("expected a type", analyzer.get_position())),
    }
}

/// `const A = 1, B = 2;`
fn parse_class_constant(
    analyzer: &mut Analyzer,
    header: &ClassHeader,
    modifiers: MemberModifiers,
) -> Result<(), Error> {
    analyzer.expect(SymbolKind::Const)?;
    let declared = annotated_type(analyzer, modifiers.annotation)?;

    loop {
        let name = analyzer.expect(SymbolKind::Identifier)?;
        analyzer.expect(SymbolKind::Assignment)?;
        let value = parse_expr(analyzer, BindingPower::Comma)?;
        let ty = declared.clone().unwrap_or(value.ty);

        if header.fresh {
            let node = analyzer.globals.classes.get(header.id);
            if node.own_constant(&name.value).is_some() {
                member_already_declared(analyzer, header.id, &name.value, name.span.start);
            } else {
                analyzer.globals.classes.get_mut(header.id).constants.push(Constant {
                    name: name.value,
                    visibility: modifiers.visibility.unwrap_or(Visibility::Public),
                    owner: header.id,
                    ty,
                    position: name.span.start,
                });
            }
        }

        if !analyzer.accept(SymbolKind::Comma) {
            break;
        }
    }

    analyzer.expect(SymbolKind::Semicolon)?;
    Ok(())
}

/// `[T] $a [= 1], $b;`
fn parse_property(analyzer: &mut Analyzer, header: &ClassHeader, modifiers: MemberModifiers) -> Result<(), Error> {
    let mut declared = annotated_type(analyzer, modifiers.annotation)?;
    if analyzer.current_kind() != SymbolKind::Variable {
        let position = analyzer.get_position();
        let descriptor = read_type_descriptor(analyzer)?;
        declared = Some(analyzer.resolve_type(&descriptor, &position));
    }

    loop {
        let name = analyzer.expect(SymbolKind::Variable)?;
        let mut ty = declared.clone();
        if analyzer.accept(SymbolKind::Assignment) {
            let value = parse_expr(analyzer, BindingPower::Comma)?;
            match &declared {
                Some(declared) if !analyzer.accepts(declared, &value.ty) => analyzer.report(
                    ErrorImpl::TypeMatchError {
                        expected: declared.to_string(),
                        received: value.ty.to_string(),
                    },
                    value.position.clone(),
                ),
                Some(_) => {}
                None if matches!(value.ty.as_ref(), TypeMatcher::Null) => {}
                None => ty = Some(value.ty.clone()),
            }
        }

        if header.fresh {
            let ty = ty.unwrap_or_else(|| analyzer.mixed());
            let node = analyzer.globals.classes.get(header.id);
            if node.own_property(&name.value).is_some() {
                member_already_declared(analyzer, header.id, &format!("${}", name.value), name.span.start);
            } else {
                analyzer.globals.classes.get_mut(header.id).properties.push(Property {
                    name: name.value,
                    visibility: modifiers.visibility.unwrap_or(Visibility::Public),
                    owner: header.id,
                    ty,
                    is_static: modifiers.is_static,
                    position: name.span.start,
                });
            }
        }

        if !analyzer.accept(SymbolKind::Comma) {
            break;
        }
    }

    analyzer.expect(SymbolKind::Semicolon)?;
    Ok(())
}

fn parse_method(
    analyzer: &mut Analyzer,
    header: &ClassHeader,
    modifiers: MemberModifiers,
    analyze_bodies: bool,
) -> Result<(), Error> {
    let method = parse_function_header(analyzer, modifiers.annotation)?;
    let is_interface = analyzer.globals.classes.get(header.id).is_interface();
    let is_abstract = modifiers.is_abstract || is_interface;

    if header.fresh {
        let node = analyzer.globals.classes.get(header.id);
        if node.own_method(&method.name).is_some() {
            member_already_declared(analyzer, header.id, &method.name, method.position.clone());
        } else {
            analyzer.globals.classes.get_mut(header.id).methods.push(Method {
                name: method.name.clone(),
                visibility: modifiers.visibility.unwrap_or(Visibility::Public),
                owner: header.id,
                is_abstract,
                is_static: modifiers.is_static,
                is_final: modifiers.is_final,
                signature: method.signature.clone(),
                position: method.position.clone(),
            });
        }
    }

    if analyzer.accept(SymbolKind::Semicolon) {
        return Ok(());
    }
    if is_abstract {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: analyzer.current_symbol().value.clone(),
                message: String::from("abstract methods have no body"),
            },
            analyzer.get_position(),
        ));
    }

    if analyze_bodies {
        let class = analyzer.globals.classes.name(header.id).to_string();
        let qualified = FunctionHeader {
            name: format!("{}::{}", class, method.name),
            ..method
        };
        analyze_body(analyzer, &qualified, Some(header.id), modifiers.is_static)
    } else {
        analyzer.skip_block()
    }
}

fn parse_class_body(analyzer: &mut Analyzer, header: &ClassHeader, analyze_bodies: bool) -> Result<(), Error> {
    analyzer.expect(SymbolKind::OpenCurly)?;

    while !matches!(analyzer.current_kind(), SymbolKind::CloseCurly | SymbolKind::EOF) {
        let start = analyzer.get_pos();
        let result = parse_member_modifiers(analyzer).and_then(|modifiers| match analyzer.current_kind() {
            SymbolKind::Const => parse_class_constant(analyzer, header, modifiers),
            SymbolKind::Function => parse_method(analyzer, header, modifiers, analyze_bodies),
            SymbolKind::Variable | SymbolKind::Identifier | SymbolKind::Array => {
                parse_property(analyzer, header, modifiers)
            }
            _ => Err(analyzer.unexpected()),
        });

        if let Err(error) = result {
            analyzer.report_error(&error);
            analyzer.synchronize(start);
        }
    }

    analyzer.expect(SymbolKind::CloseCurly)?;
    Ok(())
}

fn parse_class(analyzer: &mut Analyzer, analyze_bodies: bool) -> Result<ClassHeader, Error> {
    let leading = parse_leading_annotation(analyzer)?;
    let header = parse_class_header(analyzer, leading)?;
    analyzer.with_class(header.id, |analyzer| parse_class_body(analyzer, &header, analyze_bodies))?;
    Ok(header)
}

/// Declaration pass: registers the class at the cursor and its members.
/// Returns `None` when the class was registered before.
pub fn declare_class(analyzer: &mut Analyzer) -> Result<Option<ClassId>, Error> {
    let header = parse_class(analyzer, false)?;
    Ok(header.fresh.then_some(header.id))
}

/// Analysis pass handler for class and interface declarations.
pub fn parse_class_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    let header = parse_class(analyzer, true)?;
    check_class(analyzer, header.id);
    Ok(FlowStatus::falls_through())
}

/// Checks the inheritance links of a declared class once.
pub fn check_class(analyzer: &mut Analyzer, class: ClassId) {
    if !analyzer.mark_checked(class) {
        return;
    }

    let classes = &analyzer.globals.classes;
    let node = classes.get(class);
    let name = node.name.clone();
    let position = node.position.clone();

    if classes.has_cycle(class) {
        analyzer.report(ErrorImpl::CyclicInheritance { class: name }, position);
        return;
    }

    let mut errors = vec![];
    if let Some(parent) = node.extended {
        let parent = classes.get(parent);
        if !parent.is_declared {
            errors.push(ErrorImpl::UnknownClass {
                class: parent.name.clone(),
            });
        } else if parent.is_interface() {
            errors.push(ErrorImpl::InvalidParent {
                class: name.clone(),
                parent: parent.name.clone(),
                message: String::from("a class cannot extend an interface"),
            });
        } else if parent.is_final {
            errors.push(ErrorImpl::FinalClassExtended {
                class: name.clone(),
                parent: parent.name.clone(),
            });
        }
    }

    for interface in &node.implemented {
        let interface = classes.get(*interface);
        if !interface.is_declared {
            errors.push(ErrorImpl::UnknownClass {
                class: interface.name.clone(),
            });
        } else if !interface.is_interface() {
            let message = match node.kind {
                ClassKind::Class => "only interfaces can be implemented",
                ClassKind::Interface => "an interface can only extend interfaces",
            };
            errors.push(ErrorImpl::InvalidParent {
                class: name.clone(),
                parent: interface.name.clone(),
                message: String::from(message),
            });
        }
    }

    for method in unimplemented_abstract_methods(classes, class) {
        errors.push(ErrorImpl::AbstractMethodNotImplemented {
            class: name.clone(),
            method: format!("{}::{}", classes.name(method.owner), method.name),
        });
    }

    for error in errors {
        analyzer.report(error, position.clone());
    }
}
