//! Expression evaluation.
//!
//! Expressions are parsed with the same NUD/LED scheme as statements are
//! dispatched, but instead of building a tree every handler returns an
//! [`ExprInfo`]: the static type of the expression, its truth value when
//! known at analysis time and the checked exceptions it may raise.

use std::{collections::BTreeSet, rc::Rc};

use crate::{
    errors::errors::{Error, ErrorImpl},
    hierarchy::{
        class_graph::{ClassId, Member, Visibility},
        resolver::{find_constant, find_constructor, find_method, find_property},
    },
    lexer::symbols::SymbolKind,
    types::{
        matcher::{insert_index_tag, KeyKind, TypeMatcher},
        signature::Signature,
    },
    Position,
};

use super::{analyzer::Analyzer, globals::SymbolTable, lookups::BindingPower};

/// Where an assignment to the expression stores its value.
#[derive(Debug, Clone)]
pub enum Target {
    Variable(String),
    /// A property or container element of a known type.
    Typed(Rc<TypeMatcher>),
}

#[derive(Debug, Clone)]
pub struct ExprInfo {
    pub ty: Rc<TypeMatcher>,
    /// The value of the expression in a boolean context, when static.
    pub truth: Option<bool>,
    pub raises: BTreeSet<ClassId>,
    pub target: Option<Target>,
    pub position: Position,
}

impl ExprInfo {
    pub fn new(ty: Rc<TypeMatcher>, position: Position) -> Self {
        ExprInfo {
            ty,
            truth: None,
            raises: BTreeSet::new(),
            target: None,
            position,
        }
    }

    fn with_truth(mut self, truth: Option<bool>) -> Self {
        self.truth = truth;
        self
    }

    fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    fn raising(mut self, raises: impl IntoIterator<Item = ClassId>) -> Self {
        self.raises.extend(raises);
        self
    }
}

pub fn parse_expr(analyzer: &mut Analyzer, bp: BindingPower) -> Result<ExprInfo, Error> {
    // First parse NUD
    let kind = analyzer.current_kind();
    let Some(nud) = analyzer.get_nud_lookup().get(&kind).copied() else {
        return Err(analyzer.unexpected());
    };
    let mut left = nud(analyzer)?;

    // While LED and current BP is less than BP of current symbol, continue parsing lhs
    while let Some(power) = analyzer.get_bp_lookup().get(&analyzer.current_kind()).copied() {
        if power <= bp {
            break;
        }
        let Some(led) = analyzer.get_led_lookup().get(&analyzer.current_kind()).copied() else {
            return Err(analyzer.unexpected());
        };
        left = led(analyzer, left, power)?;
    }

    Ok(left)
}

/// The type both branches of a conditional can be stored in.
fn unify(analyzer: &mut Analyzer, a: &Rc<TypeMatcher>, b: &Rc<TypeMatcher>) -> Rc<TypeMatcher> {
    if a == b {
        return a.clone();
    }
    match (a.as_ref(), b.as_ref()) {
        (TypeMatcher::Null, other) if other.is_nullable() => b.clone(),
        (other, TypeMatcher::Null) if other.is_nullable() => a.clone(),
        _ => analyzer.mixed(),
    }
}

pub fn class_type(analyzer: &mut Analyzer, class: ClassId) -> Rc<TypeMatcher> {
    let name = analyzer.globals.classes.name(class).to_string();
    analyzer.matcher(&name)
}

fn return_type(analyzer: &mut Analyzer, signature: &Signature) -> Rc<TypeMatcher> {
    match &signature.return_type {
        Some(ty) => ty.clone(),
        None => analyzer.matcher("null"),
    }
}

pub fn parse_primary_expr(analyzer: &mut Analyzer) -> Result<ExprInfo, Error> {
    let symbol = analyzer.advance();
    let position = symbol.span.start.clone();

    match symbol.kind {
        SymbolKind::Number if symbol.value.contains('.') => {
            let value: f64 = symbol.value.parse().map_err(|_| {
                Error::new(ErrorImpl::NumberParseError { token: symbol.value.clone() }, position.clone())
            })?;
            Ok(ExprInfo::new(analyzer.matcher("float"), position).with_truth(Some(value != 0.0)))
        }
        SymbolKind::Number => match symbol.value.parse::<i64>() {
            Ok(value) => Ok(ExprInfo::new(analyzer.matcher("int"), position).with_truth(Some(value != 0))),
            // Integers beyond the int range are floats.
            Err(_) => {
                let value: f64 = symbol.value.parse().map_err(|_| {
                    Error::new(ErrorImpl::NumberParseError { token: symbol.value.clone() }, position.clone())
                })?;
                Ok(ExprInfo::new(analyzer.matcher("float"), position).with_truth(Some(value != 0.0)))
            }
        },
        SymbolKind::String => {
            let truth = !(symbol.value.is_empty() || symbol.value == "0");
            Ok(ExprInfo::new(analyzer.matcher("string"), position).with_truth(Some(truth)))
        }
        SymbolKind::True => Ok(ExprInfo::new(analyzer.matcher("boolean"), position).with_truth(Some(true))),
        SymbolKind::False => Ok(ExprInfo::new(analyzer.matcher("boolean"), position).with_truth(Some(false))),
        SymbolKind::Null => Ok(ExprInfo::new(analyzer.matcher("null"), position).with_truth(Some(false))),
        _ => Err(Error::new(ErrorImpl::UnexpectedToken { token: symbol.value }, position)),
    }
}

pub fn parse_variable_expr(analyzer: &mut Analyzer) -> Result<ExprInfo, Error> {
    let symbol = analyzer.advance();
    let position = symbol.span.start.clone();
    let name = symbol.value;

    if name == "this" {
        let this = analyzer
            .function_context()
            .filter(|context| !context.is_static)
            .and_then(|context| context.class);
        return match this {
            Some(class) => Ok(ExprInfo::new(class_type(analyzer, class), position).with_truth(Some(true))),
            None => {
                analyzer.report(ErrorImpl::VariableNotDeclared { variable: name }, position.clone());
                Ok(ExprInfo::new(analyzer.mixed(), position))
            }
        };
    }

    let ty = match analyzer.variable(&name) {
        Some(variable) => variable.ty.clone(),
        None => {
            // A plain assignment declares the variable.
            if analyzer.current_kind() != SymbolKind::Assignment {
                analyzer.report(ErrorImpl::VariableNotDeclared { variable: name.clone() }, position.clone());
            }
            analyzer.mixed()
        }
    };

    Ok(ExprInfo::new(ty, position).with_target(Target::Variable(name)))
}

pub fn parse_assignment_expr(analyzer: &mut Analyzer, left: ExprInfo, _bp: BindingPower) -> Result<ExprInfo, Error> {
    let operator = analyzer.advance();
    let right = parse_expr(analyzer, BindingPower::Comma)?;

    let Some(target) = left.target.clone() else {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: operator.value,
                message: String::from("the left side cannot be assigned to"),
            },
            operator.span.start,
        ));
    };

    let is_plain = operator.kind == SymbolKind::Assignment;
    let expected = match target {
        Target::Variable(name) => match analyzer.variable(&name) {
            Some(variable) => Some(variable.ty.clone()),
            None => {
                let ty = match right.ty.as_ref() {
                    TypeMatcher::Null => analyzer.mixed(),
                    _ => right.ty.clone(),
                };
                analyzer.declare_variable(&name, ty, false);
                None
            }
        },
        Target::Typed(ty) => Some(ty),
    };

    if let Some(expected) = expected.filter(|_| is_plain) {
        if !analyzer.accepts(&expected, &right.ty) {
            analyzer.report(
                ErrorImpl::TypeMatchError {
                    expected: expected.to_string(),
                    received: right.ty.to_string(),
                },
                left.position.clone(),
            );
        }
    }

    let ty = if is_plain { right.ty.clone() } else { left.ty.clone() };
    Ok(ExprInfo::new(ty, left.position)
        .raising(left.raises)
        .raising(right.raises))
}

pub fn parse_ternary_expr(analyzer: &mut Analyzer, condition: ExprInfo, _bp: BindingPower) -> Result<ExprInfo, Error> {
    analyzer.expect(SymbolKind::Question)?;

    // `a ?: b`
    let then = if analyzer.accept(SymbolKind::Colon) {
        condition.clone()
    } else {
        let then = parse_expr(analyzer, BindingPower::Assignment)?;
        analyzer.expect(SymbolKind::Colon)?;
        then
    };
    let otherwise = parse_expr(analyzer, BindingPower::Assignment)?;

    let (ty, truth) = match condition.truth {
        Some(true) => (then.ty.clone(), then.truth),
        Some(false) => (otherwise.ty.clone(), otherwise.truth),
        None => (unify(analyzer, &then.ty, &otherwise.ty), None),
    };

    Ok(ExprInfo::new(ty, condition.position.clone())
        .with_truth(truth)
        .raising(condition.raises)
        .raising(then.raises)
        .raising(otherwise.raises))
}

pub fn parse_logical_expr(analyzer: &mut Analyzer, left: ExprInfo, bp: BindingPower) -> Result<ExprInfo, Error> {
    let operator = analyzer.advance();
    let right = parse_expr(analyzer, bp)?;

    let truth = match (operator.kind, left.truth, right.truth) {
        (SymbolKind::And, Some(false), _) | (SymbolKind::And, _, Some(false)) => Some(false),
        (SymbolKind::And, Some(true), Some(true)) => Some(true),
        (SymbolKind::Or, Some(true), _) | (SymbolKind::Or, _, Some(true)) => Some(true),
        (SymbolKind::Or, Some(false), Some(false)) => Some(false),
        _ => None,
    };

    Ok(ExprInfo::new(analyzer.matcher("boolean"), left.position)
        .with_truth(truth)
        .raising(left.raises)
        .raising(right.raises))
}

pub fn parse_comparison_expr(analyzer: &mut Analyzer, left: ExprInfo, bp: BindingPower) -> Result<ExprInfo, Error> {
    analyzer.advance();
    let right = parse_expr(analyzer, bp)?;

    Ok(ExprInfo::new(analyzer.matcher("boolean"), left.position)
        .raising(left.raises)
        .raising(right.raises))
}

pub fn parse_binary_expr(analyzer: &mut Analyzer, left: ExprInfo, bp: BindingPower) -> Result<ExprInfo, Error> {
    let operator = analyzer.advance();
    let right = parse_expr(analyzer, bp)?;

    let ty = match operator.kind {
        SymbolKind::Dot => analyzer.matcher("string"),
        SymbolKind::Percent => analyzer.matcher("int"),
        SymbolKind::Slash => analyzer.matcher("float"),
        _ => match (left.ty.as_ref(), right.ty.as_ref()) {
            (TypeMatcher::Int, TypeMatcher::Int) => analyzer.matcher("int"),
            (l, r) if l.is_numeric() && r.is_numeric() => analyzer.matcher("float"),
            _ => analyzer.mixed(),
        },
    };

    Ok(ExprInfo::new(ty, left.position)
        .raising(left.raises)
        .raising(right.raises))
}

pub fn parse_instanceof_expr(analyzer: &mut Analyzer, left: ExprInfo, _bp: BindingPower) -> Result<ExprInfo, Error> {
    analyzer.advance();

    let mut raises = left.raises;
    match analyzer.current_kind() {
        SymbolKind::Identifier | SymbolKind::Static => {
            let symbol = analyzer.advance();
            if analyzer.resolve_class_name(&symbol.value).is_none() {
                analyzer.report(ErrorImpl::UnknownClass { class: symbol.value }, symbol.span.start);
            }
        }
        _ => raises.extend(parse_expr(analyzer, BindingPower::Member)?.raises),
    }

    Ok(ExprInfo::new(analyzer.matcher("boolean"), left.position).raising(raises))
}

pub fn parse_postfix_expr(analyzer: &mut Analyzer, left: ExprInfo, _bp: BindingPower) -> Result<ExprInfo, Error> {
    let operator = analyzer.advance();
    if left.target.is_none() {
        return Err(Error::new(
            ErrorImpl::UnexpectedToken { token: operator.value },
            operator.span.start,
        ));
    }

    Ok(ExprInfo::new(left.ty, left.position).raising(left.raises))
}

pub fn parse_prefix_expr(analyzer: &mut Analyzer) -> Result<ExprInfo, Error> {
    let operator = analyzer.advance();
    let position = operator.span.start.clone();
    let right = parse_expr(analyzer, BindingPower::Unary)?;

    match operator.kind {
        SymbolKind::Not => Ok(ExprInfo::new(analyzer.matcher("boolean"), position)
            .with_truth(right.truth.map(|truth| !truth))
            .raising(right.raises)),
        SymbolKind::PlusPlus | SymbolKind::MinusMinus if right.target.is_none() => Err(Error::new(
            ErrorImpl::UnexpectedToken { token: operator.value },
            position,
        )),
        _ => {
            let ty = if right.ty.is_numeric() { right.ty.clone() } else { analyzer.mixed() };
            Ok(ExprInfo::new(ty, position).raising(right.raises))
        }
    }
}

const CASTS: [(&str, &str); 10] = [
    ("int", "int"),
    ("integer", "int"),
    ("bool", "boolean"),
    ("boolean", "boolean"),
    ("float", "float"),
    ("double", "float"),
    ("real", "float"),
    ("string", "string"),
    ("array", "mixed[]"),
    ("object", "object"),
];

pub fn parse_grouping_expr(analyzer: &mut Analyzer) -> Result<ExprInfo, Error> {
    let open = analyzer.advance();

    let cast = match analyzer.current_kind() {
        SymbolKind::Identifier | SymbolKind::Array if analyzer.peek_kind(1) == SymbolKind::CloseParen => {
            let name = analyzer.current_symbol().value.to_ascii_lowercase();
            CASTS.iter().find(|(cast, _)| *cast == name).map(|(_, descriptor)| *descriptor)
        }
        _ => None,
    };

    if let Some(descriptor) = cast {
        analyzer.advance();
        analyzer.advance();
        let operand = parse_expr(analyzer, BindingPower::Unary)?;
        return Ok(ExprInfo::new(analyzer.matcher(descriptor), open.span.start).raising(operand.raises));
    }

    let mut expr = parse_expr(analyzer, BindingPower::Default)?;
    analyzer.expect(SymbolKind::CloseParen)?;
    expr.target = None;
    Ok(expr)
}

/// Parses a parenthesized argument list.
pub fn parse_arguments(analyzer: &mut Analyzer) -> Result<Vec<ExprInfo>, Error> {
    analyzer.expect(SymbolKind::OpenParen)?;

    let mut args = vec![];
    while analyzer.current_kind() != SymbolKind::CloseParen {
        if analyzer.current_kind() == SymbolKind::Comma && !args.is_empty() {
            analyzer.advance();
            continue;
        }
        args.push(parse_expr(analyzer, BindingPower::Comma)?);
        if !matches!(analyzer.current_kind(), SymbolKind::Comma | SymbolKind::CloseParen) {
            return Err(analyzer.unexpected());
        }
    }

    analyzer.expect(SymbolKind::CloseParen)?;
    Ok(args)
}

/// Checks arity and argument types of a call and returns the exceptions it
/// may raise.
pub fn check_call(
    analyzer: &mut Analyzer,
    signature: &Signature,
    args: Vec<ExprInfo>,
    position: &Position,
) -> BTreeSet<ClassId> {
    let required = signature.required_params();
    if args.len() < required {
        analyzer.report(
            ErrorImpl::MissingArguments {
                expected: required,
                received: args.len(),
            },
            position.clone(),
        );
    }
    if let Some(max) = signature.max_params().filter(|max| args.len() > *max) {
        analyzer.report(
            ErrorImpl::UnexpectedArguments {
                expected: max,
                received: args.len(),
            },
            position.clone(),
        );
    }

    let mut raises: BTreeSet<ClassId> = signature.throws.iter().copied().collect();
    for (index, arg) in args.into_iter().enumerate() {
        if let Some(param) = signature.param_for(index) {
            if !analyzer.accepts(&param.ty, &arg.ty) {
                analyzer.report(
                    ErrorImpl::ArgumentTypeMatchError {
                        expected: param.ty.to_string(),
                        received: arg.ty.to_string(),
                    },
                    arg.position.clone(),
                );
            }
        }
        raises.extend(arg.raises);
    }
    raises
}

/// Reports an access to a member the current class may not see.
fn check_visibility<M: Member>(analyzer: &mut Analyzer, member: &M, position: &Position) {
    let classes = &analyzer.globals.classes;
    let owner = member.owner();
    let allowed = match member.visibility() {
        Visibility::Public => true,
        Visibility::Private => analyzer.current_class() == Some(owner),
        Visibility::Protected => analyzer
            .current_class()
            .is_some_and(|class| classes.is_subclass_of(class, owner) || classes.is_subclass_of(owner, class)),
    };

    if !allowed {
        let error = ErrorImpl::InaccessibleMember {
            class: classes.name(owner).to_string(),
            member: member.name().to_string(),
            visibility: member.visibility().to_string(),
        };
        analyzer.report(error, position.clone());
    }
}

fn unknown_member(analyzer: &mut Analyzer, class: ClassId, member: &str, position: Position) {
    let class = analyzer.globals.classes.name(class).to_string();
    analyzer.report(
        ErrorImpl::UnknownMember {
            class,
            member: member.to_string(),
        },
        position,
    );
}

/// Calls method `name` of `class` with the arguments at the cursor.
fn parse_method_call(
    analyzer: &mut Analyzer,
    class: Option<ClassId>,
    name: &str,
    position: Position,
) -> Result<ExprInfo, Error> {
    let args = parse_arguments(analyzer)?;
    let Some(class) = class else {
        let raises: Vec<ClassId> = args.into_iter().flat_map(|arg| arg.raises).collect();
        return Ok(ExprInfo::new(analyzer.mixed(), position).raising(raises));
    };

    // Constructors do not fold into subclasses; `parent::__construct()` walks
    // the extended chain instead.
    let found = if name.eq_ignore_ascii_case("__construct") {
        find_constructor(&analyzer.globals.classes, class)
    } else {
        find_method(&analyzer.globals.classes, class, name)
    };
    let Some(method) = found.cloned() else {
        unknown_member(analyzer, class, name, position.clone());
        return Ok(ExprInfo::new(analyzer.mixed(), position));
    };

    check_visibility(analyzer, &method, &position);
    let raises = check_call(analyzer, &method.signature, args, &position);
    Ok(ExprInfo::new(return_type(analyzer, &method.signature), position).raising(raises))
}

pub fn parse_member_expr(analyzer: &mut Analyzer, left: ExprInfo, _bp: BindingPower) -> Result<ExprInfo, Error> {
    analyzer.expect(SymbolKind::Arrow)?;

    let class = match left.ty.as_ref() {
        TypeMatcher::Class { id, .. } => Some(*id),
        TypeMatcher::Mixed | TypeMatcher::Object => None,
        other => {
            analyzer.report(
                ErrorImpl::NotAnObject {
                    received: other.to_string(),
                },
                left.position.clone(),
            );
            None
        }
    };

    let symbol = analyzer.advance();
    let position = symbol.span.start.clone();
    let name = match symbol.kind {
        SymbolKind::Identifier => symbol.value,
        // `$object->$name`
        SymbolKind::Variable => {
            return Ok(ExprInfo::new(analyzer.mixed(), position).with_target(Target::Typed(analyzer.mixed())))
        }
        _ => return Err(Error::new(ErrorImpl::UnexpectedToken { token: symbol.value }, position)),
    };

    let mut result = if analyzer.current_kind() == SymbolKind::OpenParen {
        parse_method_call(analyzer, class, &name, position)?
    } else {
        let ty = match class {
            Some(class) => match find_property(&analyzer.globals.classes, class, &name).cloned() {
                Some(property) => {
                    check_visibility(analyzer, &property, &position);
                    property.ty
                }
                None => {
                    unknown_member(analyzer, class, &name, position.clone());
                    analyzer.mixed()
                }
            },
            None => analyzer.mixed(),
        };
        ExprInfo::new(ty.clone(), position).with_target(Target::Typed(ty))
    };

    result.raises.extend(left.raises);
    result.position = left.position;
    Ok(result)
}

/// `Class::member`, with the class name already consumed.
fn parse_static_access(analyzer: &mut Analyzer, class_name: &str, position: Position) -> Result<ExprInfo, Error> {
    analyzer.expect(SymbolKind::DoubleColon)?;

    let class = analyzer.resolve_class_name(class_name);
    if class.is_none() {
        analyzer.report(
            ErrorImpl::UnknownClass {
                class: class_name.to_string(),
            },
            position.clone(),
        );
    }

    let symbol = analyzer.advance();
    let member_position = symbol.span.start.clone();
    match symbol.kind {
        SymbolKind::Class => Ok(ExprInfo::new(analyzer.matcher("string"), position)),
        SymbolKind::Identifier if analyzer.current_kind() == SymbolKind::OpenParen => {
            let mut result = parse_method_call(analyzer, class, &symbol.value, member_position)?;
            result.position = position;
            Ok(result)
        }
        SymbolKind::Identifier => {
            let ty = match class {
                Some(class) => match find_constant(&analyzer.globals.classes, class, &symbol.value).cloned() {
                    Some(constant) => {
                        check_visibility(analyzer, &constant, &member_position);
                        constant.ty
                    }
                    None => {
                        unknown_member(analyzer, class, &symbol.value, member_position);
                        analyzer.mixed()
                    }
                },
                None => analyzer.mixed(),
            };
            Ok(ExprInfo::new(ty, position))
        }
        SymbolKind::Variable => {
            let ty = match class {
                Some(class) => match find_property(&analyzer.globals.classes, class, &symbol.value).cloned() {
                    Some(property) => {
                        check_visibility(analyzer, &property, &member_position);
                        property.ty
                    }
                    None => {
                        unknown_member(analyzer, class, &format!("${}", symbol.value), member_position);
                        analyzer.mixed()
                    }
                },
                None => analyzer.mixed(),
            };
            Ok(ExprInfo::new(ty.clone(), position).with_target(Target::Typed(ty)))
        }
        _ => Err(Error::new(ErrorImpl::UnexpectedToken { token: symbol.value }, member_position)),
    }
}

/// A bare name: a function call, a static member access or a constant.
pub fn parse_name_expr(analyzer: &mut Analyzer) -> Result<ExprInfo, Error> {
    let symbol = analyzer.advance();
    let position = symbol.span.start.clone();
    let name = symbol.value;

    match analyzer.current_kind() {
        SymbolKind::DoubleColon => parse_static_access(analyzer, &name, position),
        SymbolKind::OpenParen if symbol.kind == SymbolKind::Identifier => {
            let signature = analyzer.globals.resolve_function(&name).cloned();
            let args = parse_arguments(analyzer)?;
            match signature {
                Some(signature) => {
                    let raises = check_call(analyzer, &signature, args, &position);
                    Ok(ExprInfo::new(return_type(analyzer, &signature), position).raising(raises))
                }
                None => {
                    analyzer.report(ErrorImpl::FunctionNotDeclared { function: name }, position.clone());
                    let raises: Vec<ClassId> = args.into_iter().flat_map(|arg| arg.raises).collect();
                    Ok(ExprInfo::new(analyzer.mixed(), position).raising(raises))
                }
            }
        }
        _ if symbol.kind == SymbolKind::Identifier => {
            let ty = match analyzer.globals.constant(&name) {
                Some(ty) => ty.clone(),
                None => analyzer.mixed(),
            };
            Ok(ExprInfo::new(ty, position))
        }
        _ => Err(Error::new(ErrorImpl::UnexpectedToken { token: name }, position)),
    }
}

pub fn parse_array_literal_expr(analyzer: &mut Analyzer) -> Result<ExprInfo, Error> {
    let open = analyzer.advance();
    let close = if open.kind == SymbolKind::Array {
        analyzer.expect(SymbolKind::OpenParen)?;
        SymbolKind::CloseParen
    } else {
        SymbolKind::CloseBracket
    };

    let mut keys: Vec<KeyKind> = vec![];
    let mut elements: Vec<Rc<TypeMatcher>> = vec![];
    let mut raises = BTreeSet::new();

    while analyzer.current_kind() != close {
        let first = parse_expr(analyzer, BindingPower::Comma)?;
        raises.extend(first.raises.iter().copied());

        if analyzer.accept(SymbolKind::DoubleArrow) {
            let value = parse_expr(analyzer, BindingPower::Comma)?;
            keys.push(match first.ty.as_ref() {
                TypeMatcher::Int => KeyKind::Int,
                TypeMatcher::String => KeyKind::String,
                _ => KeyKind::Either,
            });
            raises.extend(value.raises.iter().copied());
            elements.push(value.ty);
        } else {
            keys.push(KeyKind::Int);
            elements.push(first.ty);
        }

        if !analyzer.accept(SymbolKind::Comma) && analyzer.current_kind() != close {
            return Err(analyzer.unexpected());
        }
    }
    analyzer.expect(close)?;

    let key = match keys.first() {
        Some(first) if keys.iter().all(|key| key == first) => *first,
        _ => KeyKind::Either,
    };
    let element = match elements.first() {
        Some(first) if elements.iter().all(|element| element == first) => first.to_string(),
        _ => String::from("mixed"),
    };

    let ty = analyzer.matcher(&insert_index_tag(&element, key.tag()));
    Ok(ExprInfo::new(ty, open.span.start)
        .with_truth(Some(!elements.is_empty()))
        .raising(raises))
}

pub fn parse_index_expr(analyzer: &mut Analyzer, left: ExprInfo, _bp: BindingPower) -> Result<ExprInfo, Error> {
    analyzer.expect(SymbolKind::OpenBracket)?;

    let key = if analyzer.current_kind() == SymbolKind::CloseBracket {
        None
    } else {
        Some(parse_expr(analyzer, BindingPower::Default)?)
    };
    analyzer.expect(SymbolKind::CloseBracket)?;

    let element = match left.ty.as_container() {
        Some((key_kind, element)) => {
            let element = element.clone();
            if let Some(key) = &key {
                let mismatch = match key_kind {
                    KeyKind::Int => matches!(key.ty.as_ref(), TypeMatcher::String),
                    KeyKind::String => matches!(key.ty.as_ref(), TypeMatcher::Int),
                    KeyKind::Either => false,
                };
                if mismatch {
                    analyzer.report(
                        ErrorImpl::InvalidKeyType {
                            expected: key_kind.tag().trim_start_matches('[').trim_end_matches(']').to_string(),
                            received: key.ty.to_string(),
                        },
                        key.position.clone(),
                    );
                }
            }
            element
        }
        None if matches!(left.ty.as_ref(), TypeMatcher::String) => left.ty.clone(),
        None => analyzer.mixed(),
    };

    let mut result = ExprInfo::new(element.clone(), left.position)
        .with_target(Target::Typed(element))
        .raising(left.raises);
    if let Some(key) = key {
        result.raises.extend(key.raises);
    }
    Ok(result)
}

pub fn parse_call_expr(analyzer: &mut Analyzer, left: ExprInfo, _bp: BindingPower) -> Result<ExprInfo, Error> {
    let args = parse_arguments(analyzer)?;
    let raises: Vec<ClassId> = args.into_iter().flat_map(|arg| arg.raises).collect();
    Ok(ExprInfo::new(analyzer.mixed(), left.position)
        .raising(left.raises)
        .raising(raises))
}

pub fn parse_new_expr(analyzer: &mut Analyzer) -> Result<ExprInfo, Error> {
    let start = analyzer.advance().span.start;

    let symbol = analyzer.advance();
    if !matches!(symbol.kind, SymbolKind::Identifier | SymbolKind::Static) {
        return Err(Error::new(ErrorImpl::UnexpectedToken { token: symbol.value }, symbol.span.start));
    }

    let args = if analyzer.current_kind() == SymbolKind::OpenParen {
        parse_arguments(analyzer)?
    } else {
        vec![]
    };

    let Some(class) = analyzer.resolve_class_name(&symbol.value) else {
        analyzer.report(ErrorImpl::UnknownClass { class: symbol.value }, symbol.span.start);
        let raises: Vec<ClassId> = args.into_iter().flat_map(|arg| arg.raises).collect();
        return Ok(ExprInfo::new(analyzer.mixed(), start).raising(raises));
    };

    let node = analyzer.globals.classes.get(class);
    if !node.is_instantiable() {
        let class = node.name.clone();
        analyzer.report(ErrorImpl::AbstractInstantiation { class }, symbol.span.start.clone());
    }

    let raises = match find_constructor(&analyzer.globals.classes, class).cloned() {
        Some(constructor) => {
            check_visibility(analyzer, &constructor, &symbol.span.start);
            check_call(analyzer, &constructor.signature, args, &symbol.span.start)
        }
        None => check_call(analyzer, &Signature::default(), args, &symbol.span.start),
    };

    Ok(ExprInfo::new(class_type(analyzer, class), start)
        .with_truth(Some(true))
        .raising(raises))
}
