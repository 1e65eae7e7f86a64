//! Ticker universe loader.
//!
//! One symbol per line, or the first column of a wider CSV. Blank lines,
//! `#` / `//` comments, header words and symbols with characters outside
//! `A-Z 0-9 . - _` are skipped. Order is kept, duplicates dropped.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::domain::error::DomainError;

const HEADER_WORDS: &[&str] = &["SYMBOL", "TICKER", "SYM"];

fn is_valid_symbol(sym: &str) -> bool {
    !sym.is_empty()
        && sym
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '_'))
}

pub fn load_tickers_csv(path: &Path) -> Result<Vec<String>, DomainError> {
    let file = std::fs::File::open(path)
        .map_err(|e| DomainError::NotFound(format!("tickers csv {}: {e}", path.display())))?;
    parse_tickers(file)
}

pub fn parse_tickers<R: Read>(input: R) -> Result<Vec<String>, DomainError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(None)
        .from_reader(input);

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DomainError::Parse(format!("tickers csv: {e}")))?;
        let Some(first) = record.get(0) else {
            continue;
        };
        let sym = first.trim_start_matches('\u{feff}').trim().to_uppercase();
        if sym.is_empty() || sym.starts_with('#') || sym.starts_with("//") {
            continue;
        }
        if HEADER_WORDS.contains(&sym.as_str()) || !is_valid_symbol(&sym) {
            continue;
        }
        if seen.insert(sym.clone()) {
            out.push(sym);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_noise_and_dedups() {
        let text = "\u{feff}Symbol,Name\naapl,Apple\n\n# comment\n// also comment\nBRK.B,Berkshire\nAAPL\nBAD$,x\nspy\n";
        let tickers = parse_tickers(text.as_bytes()).unwrap();
        assert_eq!(tickers, vec!["AAPL", "BRK.B", "SPY"]);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = load_tickers_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
