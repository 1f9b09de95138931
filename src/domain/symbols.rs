//! Symbol list parsing for portfolio definitions.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SymbolListError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Split a comma-separated list into uppercase symbols, preserving order.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, SymbolListError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(SymbolListError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(SymbolListError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_uppercases() {
        let symbols = parse_symbols("aapl, GLD ,goog,xom").unwrap();
        assert_eq!(symbols, vec!["AAPL", "GLD", "GOOG", "XOM"]);
    }

    #[test]
    fn single_symbol() {
        assert_eq!(parse_symbols("spy").unwrap(), vec!["SPY"]);
    }

    #[test]
    fn rejects_empty_token() {
        assert_eq!(parse_symbols("AAPL,,GLD"), Err(SymbolListError::EmptyToken));
        assert_eq!(parse_symbols(""), Err(SymbolListError::EmptyToken));
    }

    #[test]
    fn rejects_duplicates_case_insensitively() {
        assert_eq!(
            parse_symbols("AAPL,gld,aapl"),
            Err(SymbolListError::DuplicateSymbol("AAPL".into()))
        );
    }
}
