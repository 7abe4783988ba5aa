use std::collections::HashMap;

use crate::{errors::errors::Error, flow::status::FlowStatus, lexer::symbols::SymbolKind};

use super::{
    analyzer::Analyzer,
    decl::{parse_class_stmt, parse_fn_decl_stmt},
    expr::*,
    stmt::*,
};

#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub enum BindingPower {
    Default,
    Comma,
    Assignment,
    Ternary,
    Logical,
    Relational,
    Additive,
    Multiplicative,
    Unary,
    Call,
    Member,
    Primary,
}

pub type StmtHandler = fn(&mut Analyzer) -> Result<FlowStatus, Error>;
pub type NUDHandler = fn(&mut Analyzer) -> Result<ExprInfo, Error>;
pub type LEDHandler = fn(&mut Analyzer, ExprInfo, BindingPower) -> Result<ExprInfo, Error>;

pub fn create_symbol_lookups(analyzer: &mut Analyzer) {
    // Assignment
    analyzer.led(SymbolKind::Assignment, BindingPower::Assignment, parse_assignment_expr);
    analyzer.led(SymbolKind::PlusEquals, BindingPower::Assignment, parse_assignment_expr);
    analyzer.led(SymbolKind::MinusEquals, BindingPower::Assignment, parse_assignment_expr);
    analyzer.led(SymbolKind::StarEquals, BindingPower::Assignment, parse_assignment_expr);
    analyzer.led(SymbolKind::SlashEquals, BindingPower::Assignment, parse_assignment_expr);
    analyzer.led(SymbolKind::DotEquals, BindingPower::Assignment, parse_assignment_expr);

    analyzer.led(SymbolKind::Question, BindingPower::Ternary, parse_ternary_expr);

    // Logical
    analyzer.led(SymbolKind::And, BindingPower::Logical, parse_logical_expr);
    analyzer.led(SymbolKind::Or, BindingPower::Logical, parse_logical_expr);

    // Relational
    analyzer.led(SymbolKind::Less, BindingPower::Relational, parse_comparison_expr);
    analyzer.led(SymbolKind::LessEquals, BindingPower::Relational, parse_comparison_expr);
    analyzer.led(SymbolKind::Greater, BindingPower::Relational, parse_comparison_expr);
    analyzer.led(SymbolKind::GreaterEquals, BindingPower::Relational, parse_comparison_expr);
    analyzer.led(SymbolKind::Equals, BindingPower::Relational, parse_comparison_expr);
    analyzer.led(SymbolKind::NotEquals, BindingPower::Relational, parse_comparison_expr);
    analyzer.led(SymbolKind::Identical, BindingPower::Relational, parse_comparison_expr);
    analyzer.led(SymbolKind::NotIdentical, BindingPower::Relational, parse_comparison_expr);

    // Additive and multiplicative
    analyzer.led(SymbolKind::Plus, BindingPower::Additive, parse_binary_expr);
    analyzer.led(SymbolKind::Dash, BindingPower::Additive, parse_binary_expr);
    analyzer.led(SymbolKind::Dot, BindingPower::Additive, parse_binary_expr);
    analyzer.led(SymbolKind::Star, BindingPower::Multiplicative, parse_binary_expr);
    analyzer.led(SymbolKind::Slash, BindingPower::Multiplicative, parse_binary_expr);
    analyzer.led(SymbolKind::Percent, BindingPower::Multiplicative, parse_binary_expr);

    analyzer.led(SymbolKind::Instanceof, BindingPower::Call, parse_instanceof_expr);
    analyzer.led(SymbolKind::PlusPlus, BindingPower::Call, parse_postfix_expr);
    analyzer.led(SymbolKind::MinusMinus, BindingPower::Call, parse_postfix_expr);
    analyzer.led(SymbolKind::OpenParen, BindingPower::Call, parse_call_expr);

    // Member
    analyzer.led(SymbolKind::OpenBracket, BindingPower::Member, parse_index_expr);
    analyzer.led(SymbolKind::Arrow, BindingPower::Member, parse_member_expr);

    // Literals and symbols
    analyzer.nud(SymbolKind::Number, parse_primary_expr);
    analyzer.nud(SymbolKind::String, parse_primary_expr);
    analyzer.nud(SymbolKind::True, parse_primary_expr);
    analyzer.nud(SymbolKind::False, parse_primary_expr);
    analyzer.nud(SymbolKind::Null, parse_primary_expr);
    analyzer.nud(SymbolKind::Variable, parse_variable_expr);
    analyzer.nud(SymbolKind::Identifier, parse_name_expr);
    analyzer.nud(SymbolKind::Static, parse_name_expr);
    analyzer.nud(SymbolKind::Not, parse_prefix_expr);
    analyzer.nud(SymbolKind::Dash, parse_prefix_expr);
    analyzer.nud(SymbolKind::Plus, parse_prefix_expr);
    analyzer.nud(SymbolKind::PlusPlus, parse_prefix_expr);
    analyzer.nud(SymbolKind::MinusMinus, parse_prefix_expr);
    analyzer.nud(SymbolKind::OpenParen, parse_grouping_expr);
    analyzer.nud(SymbolKind::OpenBracket, parse_array_literal_expr);
    analyzer.nud(SymbolKind::Array, parse_array_literal_expr);
    analyzer.nud(SymbolKind::New, parse_new_expr);
}

/// Maps the kind of the symbol starting a statement to its handler.
pub fn dispatch(kind: SymbolKind) -> StmtHandler {
    match kind {
        SymbolKind::OpenCurly => parse_block_stmt,
        SymbolKind::If => parse_if_stmt,
        SymbolKind::While => parse_while_stmt,
        SymbolKind::Do => parse_do_while_stmt,
        SymbolKind::For => parse_for_stmt,
        SymbolKind::Foreach => parse_foreach_stmt,
        SymbolKind::Switch => parse_switch_stmt,
        SymbolKind::Break => parse_break_stmt,
        SymbolKind::Continue => parse_continue_stmt,
        SymbolKind::Return => parse_return_stmt,
        SymbolKind::Throw => parse_throw_stmt,
        SymbolKind::Exit => parse_exit_stmt,
        SymbolKind::Try => parse_try_stmt,
        SymbolKind::Echo => parse_echo_stmt,
        SymbolKind::Semicolon => parse_empty_stmt,
        SymbolKind::Function => parse_fn_decl_stmt,
        SymbolKind::Class | SymbolKind::Interface | SymbolKind::Abstract | SymbolKind::Final => parse_class_stmt,
        SymbolKind::Const => parse_const_stmt,
        SymbolKind::OpenAnnotation => parse_annotated_stmt,

        SymbolKind::Number
        | SymbolKind::String
        | SymbolKind::Identifier
        | SymbolKind::Variable
        | SymbolKind::OpenBracket
        | SymbolKind::OpenParen
        | SymbolKind::Not
        | SymbolKind::Dash
        | SymbolKind::Plus
        | SymbolKind::PlusPlus
        | SymbolKind::MinusMinus
        | SymbolKind::Static
        | SymbolKind::New
        | SymbolKind::True
        | SymbolKind::False
        | SymbolKind::Null
        | SymbolKind::Array => parse_expression_stmt,

        SymbolKind::EOF
        | SymbolKind::CloseAnnotation
        | SymbolKind::CloseBracket
        | SymbolKind::CloseCurly
        | SymbolKind::CloseParen
        | SymbolKind::Assignment
        | SymbolKind::Equals
        | SymbolKind::Identical
        | SymbolKind::NotEquals
        | SymbolKind::NotIdentical
        | SymbolKind::Less
        | SymbolKind::LessEquals
        | SymbolKind::Greater
        | SymbolKind::GreaterEquals
        | SymbolKind::Or
        | SymbolKind::And
        | SymbolKind::Pipe
        | SymbolKind::Ampersand
        | SymbolKind::Dot
        | SymbolKind::DotEquals
        | SymbolKind::Colon
        | SymbolKind::DoubleColon
        | SymbolKind::Question
        | SymbolKind::Comma
        | SymbolKind::Arrow
        | SymbolKind::DoubleArrow
        | SymbolKind::PlusEquals
        | SymbolKind::MinusEquals
        | SymbolKind::SlashEquals
        | SymbolKind::StarEquals
        | SymbolKind::Slash
        | SymbolKind::Star
        | SymbolKind::Percent
        | SymbolKind::Else
        | SymbolKind::ElseIf
        | SymbolKind::As
        | SymbolKind::Case
        | SymbolKind::Default
        | SymbolKind::Catch
        | SymbolKind::Finally
        | SymbolKind::Extends
        | SymbolKind::Implements
        | SymbolKind::Public
        | SymbolKind::Protected
        | SymbolKind::Private
        | SymbolKind::Instanceof => parse_unexpected_stmt,
    }
}

// Expression handler tables live inside the analyzer.
pub type NUDLookup = HashMap<SymbolKind, NUDHandler>;
pub type LEDLookup = HashMap<SymbolKind, LEDHandler>;
pub type BPLookup = HashMap<SymbolKind, BindingPower>;
