use std::rc::Rc;

use tracing::trace;

use crate::{
    errors::errors::{Error, ErrorImpl},
    flow::{
        algebra::{branch_union, do_while_exit, loop_exit, sequence, switch_exit, try_catch, CatchClause},
        status::FlowStatus,
    },
    hierarchy::class_graph::ClassId,
    lexer::symbols::SymbolKind,
    types::matcher::{KeyKind, TypeMatcher},
};

use super::{
    analyzer::Analyzer,
    annotations::{parse_annotation, Annotation},
    decl::{parse_class_stmt, parse_fn_decl_stmt},
    expr::{class_type, parse_expr, ExprInfo},
    lookups::{dispatch, BindingPower},
};

/// Whether the statement at the cursor is a function or class declaration.
/// Declarations are hoisted, so they are never unreachable.
fn is_declaration(analyzer: &Analyzer) -> bool {
    let kind = match analyzer.current_kind() {
        SymbolKind::OpenAnnotation => analyzer.kind_after_annotation(),
        kind => kind,
    };
    match kind {
        SymbolKind::Function => analyzer.is_named_function(),
        SymbolKind::Class | SymbolKind::Interface | SymbolKind::Abstract | SymbolKind::Final => true,
        _ => false,
    }
}

/// Parses one statement. Errors are reported here; the cursor is then moved
/// past the broken statement and the statement counts as falling through.
pub fn parse_stmt(analyzer: &mut Analyzer) -> FlowStatus {
    let start = analyzer.get_pos();
    let handler = dispatch(analyzer.current_kind());

    match handler(analyzer) {
        Ok(status) => status,
        Err(error) => {
            trace!(error = %error, "recovering");
            analyzer.report_error(&error);
            analyzer.synchronize(start);
            FlowStatus::falls_through()
        }
    }
}

/// Parses statements until one of `terminators` (not consumed) or the end
/// of input. The first unreachable statement of the sequence is reported.
pub fn parse_statements(analyzer: &mut Analyzer, terminators: &[SymbolKind]) -> FlowStatus {
    let mut status = FlowStatus::falls_through();
    let mut reported = false;

    while analyzer.has_symbols() && !terminators.contains(&analyzer.current_kind()) {
        let position = analyzer.get_position();
        let hoisted = is_declaration(analyzer);
        let next = parse_stmt(analyzer);

        if status.can_fall_through() {
            status = sequence(status, next);
        } else if !hoisted && !reported && analyzer.config.report_unreachable {
            analyzer.report(ErrorImpl::UnreachableCode, position);
            reported = true;
        }
    }

    status
}

fn parse_condition(analyzer: &mut Analyzer) -> Result<ExprInfo, Error> {
    analyzer.expect(SymbolKind::OpenParen)?;
    let condition = parse_expr(analyzer, BindingPower::Default)?;
    analyzer.expect(SymbolKind::CloseParen)?;
    Ok(condition)
}

/// Comma separated expressions up to `terminator`, which is consumed.
fn parse_expr_list(analyzer: &mut Analyzer, terminator: SymbolKind) -> Result<Vec<ExprInfo>, Error> {
    let mut exprs = vec![];
    while analyzer.current_kind() != terminator {
        exprs.push(parse_expr(analyzer, BindingPower::Comma)?);
        if !analyzer.accept(SymbolKind::Comma) {
            break;
        }
    }
    analyzer.expect(terminator)?;
    Ok(exprs)
}

fn raises_of(exprs: &[ExprInfo]) -> Vec<ClassId> {
    exprs.iter().flat_map(|expr| expr.raises.iter().copied()).collect()
}

pub fn parse_block_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    analyzer.expect(SymbolKind::OpenCurly)?;
    let status = parse_statements(analyzer, &[SymbolKind::CloseCurly]);
    analyzer.expect(SymbolKind::CloseCurly)?;
    Ok(status)
}

pub fn parse_if_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    analyzer.expect(SymbolKind::If)?;

    let mut branches = vec![];
    let mut raises = vec![];
    // Set once a condition is statically true: later branches are dead.
    let mut decided = false;

    let mut condition = parse_condition(analyzer)?;
    loop {
        raises.extend(condition.raises.iter().copied());
        let body = parse_stmt(analyzer);
        if !decided && condition.truth != Some(false) {
            branches.push(body);
            decided = condition.truth == Some(true);
        }

        if analyzer.current_kind() == SymbolKind::ElseIf {
            analyzer.advance();
            condition = parse_condition(analyzer)?;
            continue;
        }
        break;
    }

    if analyzer.accept(SymbolKind::Else) {
        let body = parse_stmt(analyzer);
        if !decided {
            branches.push(body);
        }
    } else if !decided {
        branches.push(FlowStatus::falls_through());
    }

    Ok(branch_union(branches).with_raises(raises))
}

pub fn parse_while_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    analyzer.expect(SymbolKind::While)?;
    let condition = parse_condition(analyzer)?;

    let position = analyzer.get_position();
    let body = analyzer.with_breakable(parse_stmt);

    if condition.truth == Some(false) {
        if analyzer.config.report_unreachable {
            analyzer.report(ErrorImpl::UnreachableCode, position);
        }
        return Ok(FlowStatus::falls_through().with_raises(condition.raises));
    }

    Ok(loop_exit(body, condition.truth).with_raises(condition.raises))
}

pub fn parse_do_while_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    analyzer.expect(SymbolKind::Do)?;
    let body = analyzer.with_breakable(parse_stmt);

    analyzer.expect(SymbolKind::While)?;
    let condition = parse_condition(analyzer)?;
    analyzer.expect(SymbolKind::Semicolon)?;

    Ok(do_while_exit(body, condition.truth).with_raises(condition.raises))
}

pub fn parse_for_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    analyzer.expect(SymbolKind::For)?;
    analyzer.expect(SymbolKind::OpenParen)?;

    let init = parse_expr_list(analyzer, SymbolKind::Semicolon)?;
    let conditions = parse_expr_list(analyzer, SymbolKind::Semicolon)?;
    let step = parse_expr_list(analyzer, SymbolKind::CloseParen)?;

    // An empty condition loops forever.
    let truth = match conditions.last() {
        Some(condition) => condition.truth,
        None => Some(true),
    };

    let position = analyzer.get_position();
    let body = analyzer.with_breakable(parse_stmt);

    let mut raises = raises_of(&init);
    raises.extend(raises_of(&conditions));
    if truth == Some(false) {
        if analyzer.config.report_unreachable {
            analyzer.report(ErrorImpl::UnreachableCode, position);
        }
        return Ok(FlowStatus::falls_through().with_raises(raises));
    }

    raises.extend(raises_of(&step));
    Ok(loop_exit(body, truth).with_raises(raises))
}

/// Declares a loop variable unless it already exists.
fn declare_loop_variable(analyzer: &mut Analyzer, name: &str, ty: Rc<TypeMatcher>) {
    if analyzer.variable(name).is_none() {
        analyzer.declare_variable(name, ty, false);
    }
}

pub fn parse_foreach_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    analyzer.expect(SymbolKind::Foreach)?;
    analyzer.expect(SymbolKind::OpenParen)?;

    let subject = parse_expr(analyzer, BindingPower::Default)?;
    analyzer.expect(SymbolKind::As)?;

    let (key_type, value_type) = match subject.ty.as_container() {
        Some((key, element)) => {
            let key = match key {
                KeyKind::Int => "int",
                KeyKind::String => "string",
                KeyKind::Either => "mixed",
            };
            (analyzer.matcher(key), element.clone())
        }
        None => (analyzer.mixed(), analyzer.mixed()),
    };

    analyzer.accept(SymbolKind::Ampersand);
    let first = analyzer.expect(SymbolKind::Variable)?;
    if analyzer.accept(SymbolKind::DoubleArrow) {
        analyzer.accept(SymbolKind::Ampersand);
        let value = analyzer.expect(SymbolKind::Variable)?;
        declare_loop_variable(analyzer, &first.value, key_type);
        declare_loop_variable(analyzer, &value.value, value_type);
    } else {
        declare_loop_variable(analyzer, &first.value, value_type);
    }
    analyzer.expect(SymbolKind::CloseParen)?;

    let body = analyzer.with_breakable(parse_stmt);
    Ok(loop_exit(body, None).with_raises(subject.raises))
}

pub fn parse_switch_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    analyzer.expect(SymbolKind::Switch)?;
    let subject = parse_condition(analyzer)?;
    analyzer.expect(SymbolKind::OpenCurly)?;

    let mut groups = vec![];
    let mut has_default = false;
    let mut raises: Vec<ClassId> = subject.raises.iter().copied().collect();

    analyzer.with_breakable(|analyzer| -> Result<(), Error> {
        while analyzer.current_kind() != SymbolKind::CloseCurly {
            match analyzer.current_kind() {
                SymbolKind::Case => {
                    analyzer.advance();
                    let label = parse_expr(analyzer, BindingPower::Default)?;
                    raises.extend(label.raises);
                }
                SymbolKind::Default => {
                    analyzer.advance();
                    has_default = true;
                }
                _ => return Err(analyzer.unexpected()),
            }
            if !analyzer.accept(SymbolKind::Semicolon) {
                analyzer.expect(SymbolKind::Colon)?;
            }

            let terminators = [SymbolKind::Case, SymbolKind::Default, SymbolKind::CloseCurly];
            groups.push(parse_statements(analyzer, &terminators));
        }
        Ok(())
    })?;
    analyzer.expect(SymbolKind::CloseCurly)?;

    Ok(switch_exit(&groups, has_default).with_raises(raises))
}

/// `break` and `continue`, with an optional level counting the enclosing
/// loops and switches to leave.
fn parse_jump(analyzer: &mut Analyzer, status: fn(u32) -> FlowStatus) -> Result<FlowStatus, Error> {
    let keyword = analyzer.advance();
    let level = match analyzer.current_kind() {
        SymbolKind::Number => {
            let symbol = analyzer.advance();
            match symbol.value.parse::<u32>() {
                Ok(level) if level > 0 => level,
                _ => {
                    return Err(Error::new(
                        ErrorImpl::UnexpectedTokenDetailed {
                            message: format!("`{}` takes a positive integer level", keyword.value),
                            token: symbol.value,
                        },
                        symbol.span.start,
                    ))
                }
            }
        }
        _ => 1,
    };
    analyzer.expect(SymbolKind::Semicolon)?;

    let depth = analyzer.breakable_depth() as u32;
    if level > depth {
        let keyword_text = match level {
            1 => keyword.value,
            level => format!("{} {}", keyword.value, level),
        };
        analyzer.report(ErrorImpl::OutsideLoop { keyword: keyword_text }, keyword.span.start);
    }
    // Past the outermost construct the jump is treated as leaving that one.
    Ok(status(level.min(depth.max(1))))
}

pub fn parse_break_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    parse_jump(analyzer, FlowStatus::breaks_out)
}

pub fn parse_continue_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    parse_jump(analyzer, FlowStatus::continues_out)
}

pub fn parse_return_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    let keyword = analyzer.expect(SymbolKind::Return)?;
    let value = match analyzer.current_kind() {
        SymbolKind::Semicolon => None,
        _ => Some(parse_expr(analyzer, BindingPower::Default)?),
    };
    analyzer.expect(SymbolKind::Semicolon)?;

    let context = analyzer
        .function_context()
        .map(|context| (context.name.clone(), context.signature.return_type.clone()));

    match (context, &value) {
        // `return` at file level ends the script.
        (None, _) => {}
        (Some((function, None)), Some(_)) => {
            analyzer.report(ErrorImpl::ReturnValueInVoid { function }, keyword.span.start);
        }
        (Some((_, None)), None) => {}
        (Some((function, Some(expected))), None) => {
            if !expected.is_mixed() {
                analyzer.report(ErrorImpl::MissingReturnValue { function }, keyword.span.start);
            }
        }
        (Some((_, Some(expected))), Some(value)) => {
            if !analyzer.accepts(&expected, &value.ty) {
                analyzer.report(
                    ErrorImpl::TypeMatchError {
                        expected: expected.to_string(),
                        received: value.ty.to_string(),
                    },
                    value.position.clone(),
                );
            }
        }
    }

    let raises = value.map(|value| value.raises).unwrap_or_default();
    Ok(FlowStatus::terminates().with_raises(raises))
}

pub fn parse_throw_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    analyzer.expect(SymbolKind::Throw)?;
    let exception = parse_expr(analyzer, BindingPower::Default)?;
    analyzer.expect(SymbolKind::Semicolon)?;

    let mut status = FlowStatus::terminates().with_raises(exception.raises.iter().copied());
    match exception.ty.as_ref() {
        TypeMatcher::Class { id, .. } => {
            let throwable = analyzer.globals.classes.resolve("Throwable");
            if throwable.is_some_and(|throwable| analyzer.globals.classes.is_subclass_of(*id, throwable)) {
                status.raises.insert(*id);
            } else {
                analyzer.report(
                    ErrorImpl::NotThrowable {
                        received: exception.ty.to_string(),
                    },
                    exception.position.clone(),
                );
            }
        }
        TypeMatcher::Mixed | TypeMatcher::Object => {}
        other => analyzer.report(
            ErrorImpl::NotThrowable {
                received: other.to_string(),
            },
            exception.position.clone(),
        ),
    }

    Ok(status)
}

pub fn parse_exit_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    analyzer.expect(SymbolKind::Exit)?;

    let mut raises = vec![];
    if analyzer.accept(SymbolKind::OpenParen) {
        raises = raises_of(&parse_expr_list(analyzer, SymbolKind::CloseParen)?);
    }
    analyzer.expect(SymbolKind::Semicolon)?;

    Ok(FlowStatus::terminates().with_raises(raises))
}

fn parse_catch_clause(analyzer: &mut Analyzer) -> Result<CatchClause, Error> {
    analyzer.expect(SymbolKind::Catch)?;
    analyzer.expect(SymbolKind::OpenParen)?;

    let mut types = vec![];
    let mut named = 0;
    loop {
        let name = analyzer.expect(SymbolKind::Identifier)?;
        match analyzer.resolve_class_name(&name.value) {
            Some(class) => types.push(class),
            None => analyzer.report(ErrorImpl::UnknownClass { class: name.value }, name.span.start),
        }
        named += 1;
        if !analyzer.accept(SymbolKind::Pipe) {
            break;
        }
    }

    let variable = analyzer.expect(SymbolKind::Variable)?;
    analyzer.expect(SymbolKind::CloseParen)?;

    // `self` and `parent` are typed by the class they resolve to.
    let ty = match types.as_slice() {
        [class] if named == 1 => class_type(analyzer, *class),
        _ => analyzer.mixed(),
    };
    analyzer.declare_variable(&variable.value, ty, false);

    let body = parse_block_stmt(analyzer)?;
    Ok(CatchClause { types, body })
}

pub fn parse_try_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    let keyword = analyzer.expect(SymbolKind::Try)?;
    let body = parse_block_stmt(analyzer)?;

    let mut catches = vec![];
    while analyzer.current_kind() == SymbolKind::Catch {
        catches.push(parse_catch_clause(analyzer)?);
    }

    let finally = if analyzer.accept(SymbolKind::Finally) {
        Some(parse_block_stmt(analyzer)?)
    } else {
        None
    };

    if catches.is_empty() && finally.is_none() {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: keyword.value,
                message: String::from("expected catch or finally"),
            },
            keyword.span.start,
        ));
    }

    Ok(try_catch(body, &catches, finally, &analyzer.globals.classes))
}

pub fn parse_echo_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    analyzer.expect(SymbolKind::Echo)?;
    let values = parse_expr_list(analyzer, SymbolKind::Semicolon)?;
    Ok(FlowStatus::falls_through().with_raises(raises_of(&values)))
}

pub fn parse_empty_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    analyzer.expect(SymbolKind::Semicolon)?;
    Ok(FlowStatus::falls_through())
}

/// `const NAME = value;` at file level.
pub fn parse_const_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    analyzer.expect(SymbolKind::Const)?;

    let mut raises = vec![];
    loop {
        let name = analyzer.expect(SymbolKind::Identifier)?;
        analyzer.expect(SymbolKind::Assignment)?;
        let value = parse_expr(analyzer, BindingPower::Comma)?;
        raises.extend(value.raises);
        analyzer.globals.declare_constant(&name.value, value.ty);

        if !analyzer.accept(SymbolKind::Comma) {
            break;
        }
    }
    analyzer.expect(SymbolKind::Semicolon)?;

    Ok(FlowStatus::falls_through().with_raises(raises))
}

/// A statement starting with an annotation: an annotated declaration or
/// `/*. T .*/ $a [= value], $b;`.
pub fn parse_annotated_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    match analyzer.kind_after_annotation() {
        SymbolKind::Function => return parse_fn_decl_stmt(analyzer),
        SymbolKind::Class | SymbolKind::Interface | SymbolKind::Abstract | SymbolKind::Final => {
            return parse_class_stmt(analyzer)
        }
        _ => {}
    }

    let (descriptor, position) = match parse_annotation(analyzer)? {
        Annotation::Type(descriptor, position) => (descriptor, position),
        _ => {
            return Err(Error::new(
                ErrorImpl::InvalidAnnotation {
                    reason: String::from("expected a variable type"),
                },
                analyzer.get_position(),
            ))
        }
    };
    let ty = analyzer.resolve_type(&descriptor, &position);

    let mut raises = vec![];
    loop {
        let name = analyzer.expect(SymbolKind::Variable)?;
        analyzer.declare_variable(&name.value, ty.clone(), true);

        if analyzer.accept(SymbolKind::Assignment) {
            let value = parse_expr(analyzer, BindingPower::Comma)?;
            if !analyzer.accepts(&ty, &value.ty) {
                analyzer.report(
                    ErrorImpl::TypeMatchError {
                        expected: ty.to_string(),
                        received: value.ty.to_string(),
                    },
                    value.position.clone(),
                );
            }
            raises.extend(value.raises);
        }

        if !analyzer.accept(SymbolKind::Comma) {
            break;
        }
    }
    analyzer.expect(SymbolKind::Semicolon)?;

    Ok(FlowStatus::falls_through().with_raises(raises))
}

pub fn parse_expression_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    let expression = parse_expr(analyzer, BindingPower::Default)?;
    analyzer.expect(SymbolKind::Semicolon)?;
    Ok(FlowStatus::falls_through().with_raises(expression.raises))
}

pub fn parse_unexpected_stmt(analyzer: &mut Analyzer) -> Result<FlowStatus, Error> {
    Err(analyzer.unexpected())
}
