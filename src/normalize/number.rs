use super::text::normalize;
use crate::table::Cell;

/// Lenient amount parser: numeric cells pass through, everything else is
/// read as European- or US-formatted text. Never fails; anything
/// unparseable is 0.0 and gets dropped by the dataset post-filter.
pub fn parse_number(cell: &Cell) -> f64 {
    match cell {
        Cell::Empty => 0.0,
        Cell::Number(n) => *n,
        Cell::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        other => parse_number_text(&other.to_display_string()),
    }
}

fn parse_number_text(raw: &str) -> f64 {
    let text = raw.trim();
    if text.is_empty() {
        return 0.0;
    }
    if matches!(normalize(text).as_str(), "nan" | "none" | "null") {
        return 0.0;
    }
    let text = text.replace('€', "").replace(' ', "");
    // With both separators present, the later one is the decimal point.
    let cleaned = match (text.rfind(','), text.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => text.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => text.replace(',', ""),
        _ => text.replace(',', "."),
    };
    cleaned.parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_cells_pass_through() {
        assert_eq!(parse_number(&Cell::Number(1234.56)), 1234.56);
        assert_eq!(parse_number(&Cell::Bool(true)), 1.0);
        assert_eq!(parse_number(&Cell::Empty), 0.0);
    }

    #[test]
    fn european_format() {
        assert_eq!(parse_number(&Cell::Text("1.234,56".into())), 1234.56);
        assert_eq!(parse_number(&Cell::Text("1.234.567,89".into())), 1_234_567.89);
        assert_eq!(parse_number(&Cell::Text("123,45".into())), 123.45);
    }

    #[test]
    fn us_format() {
        assert_eq!(parse_number(&Cell::Text("1,234.56".into())), 1234.56);
        assert_eq!(parse_number(&Cell::Text("1234.56".into())), 1234.56);
    }

    #[test]
    fn currency_and_spaces() {
        assert_eq!(parse_number(&Cell::Text("1 234,56 €".into())), 1234.56);
        assert_eq!(parse_number(&Cell::Text("€100".into())), 100.0);
    }

    #[test]
    fn placeholders_and_garbage_are_zero() {
        assert_eq!(parse_number(&Cell::Text("".into())), 0.0);
        assert_eq!(parse_number(&Cell::Text("nan".into())), 0.0);
        assert_eq!(parse_number(&Cell::Text("NULL".into())), 0.0);
        assert_eq!(parse_number(&Cell::Text("n/a total".into())), 0.0);
    }
}
