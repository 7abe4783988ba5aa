use crate::{
    errors::errors::{Error, ErrorImpl},
    lexer::symbols::SymbolKind,
    Position,
};

use super::analyzer::Analyzer;

/// The content of a `/*. ... .*/` comment.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// A type descriptor, with the position it was written at.
    Type(String, Position),
    Void,
    /// `throws A, B`
    Throws(Vec<(String, Position)>),
    /// Marks a class whose exceptions need no `throws` entry.
    Unchecked,
}

/// Parses an annotation starting at the `/*.` under the cursor.
pub fn parse_annotation(analyzer: &mut Analyzer) -> Result<Annotation, Error> {
    analyzer.expect(SymbolKind::OpenAnnotation)?;

    let symbol = analyzer.current_symbol().clone();
    let annotation = match symbol.kind {
        SymbolKind::Identifier if symbol.value.eq_ignore_ascii_case("void") => {
            analyzer.advance();
            Annotation::Void
        }
        SymbolKind::Identifier if symbol.value.eq_ignore_ascii_case("unchecked") => {
            analyzer.advance();
            Annotation::Unchecked
        }
        SymbolKind::Identifier if symbol.value.eq_ignore_ascii_case("throws") => {
            analyzer.advance();
            let mut classes = vec![];
            loop {
                let class = analyzer.expect(SymbolKind::Identifier)?;
                classes.push((class.value, class.span.start));
                if !analyzer.accept(SymbolKind::Comma) {
                    break;
                }
            }
            Annotation::Throws(classes)
        }
        _ => Annotation::Type(read_type_descriptor(analyzer)?, symbol.span.start),
    };

    analyzer.expect_error(
        SymbolKind::CloseAnnotation,
        Some(Error::new(
            ErrorImpl::InvalidAnnotation {
                reason: format!("unexpected `{}` in annotation", analyzer.current_symbol().value),
            },
            analyzer.get_position(),
        )),
    )?;
    Ok(annotation)
}

/// Parses an annotation if one starts at the cursor.
pub fn parse_leading_annotation(analyzer: &mut Analyzer) -> Result<Option<Annotation>, Error> {
    if analyzer.current_kind() != SymbolKind::OpenAnnotation {
        return Ok(None);
    }
    parse_annotation(analyzer).map(Some)
}

/// Reads the symbols of a type descriptor back into its text form, e.g.
/// `Foo[string][]`, `array[int]string` or `array`.
pub fn read_type_descriptor(analyzer: &mut Analyzer) -> Result<String, Error> {
    let base = analyzer.current_symbol().clone();
    if !matches!(base.kind, SymbolKind::Identifier | SymbolKind::Array | SymbolKind::Null) {
        return Err(Error::new(
            ErrorImpl::InvalidAnnotation {
                reason: format!("expected a type, found `{}`", base.value),
            },
            base.span.start,
        ));
    }
    analyzer.advance();

    let mut descriptor = base.value;
    while analyzer.current_kind() == SymbolKind::OpenBracket {
        analyzer.advance();
        descriptor.push('[');
        if analyzer.current_kind() == SymbolKind::Identifier {
            descriptor.push_str(&analyzer.advance().value);
        }
        analyzer.expect(SymbolKind::CloseBracket)?;
        descriptor.push(']');
    }

    // Legacy form: the element type follows the index tags.
    let has_tags = descriptor.len() > "array".len();
    if base.kind == SymbolKind::Array
        && has_tags
        && matches!(analyzer.current_kind(), SymbolKind::Identifier | SymbolKind::Array | SymbolKind::Null)
    {
        let element = read_type_descriptor(analyzer)?;
        descriptor.push_str(&element);
    }

    Ok(descriptor)
}
