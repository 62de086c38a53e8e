//! Display formatters for Brazilian field formats.
//!
//! All functions are pure. The stored value of a currency field is always the
//! number; `format_currency` / `parse_currency` are the display projection.

use chrono::NaiveDate;

/// Keep only ASCII digits
pub fn remove_formatting(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Format a value in reais, e.g. `1234.5` → `R$ 1.234,50`
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "R$ 0,00".to_string();
    }
    let cents = (value.abs() * 100.0).round() as u64;
    let units = cents / 100;
    let fraction = cents % 100;

    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}R$ {grouped},{fraction:02}")
}

/// Parse a display currency string back to reais. Unparseable input is 0.
pub fn parse_currency(value: &str) -> f64 {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '-')
        .collect();
    cleaned.replacen(',', ".", 1).parse::<f64>().unwrap_or(0.0)
}

/// `52998224725` → `529.982.247-25`. Shorter input is returned as digits only.
pub fn format_cpf(value: &str) -> String {
    let digits = remove_formatting(value);
    if digits.len() < 11 {
        return digits;
    }
    format!(
        "{}.{}.{}-{}{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11],
        &digits[11..]
    )
}

/// Landlines (10 digits) → `(11) 3456-7890`, mobiles (11 digits) → `(11) 93456-7890`
pub fn format_phone(value: &str) -> String {
    let digits = remove_formatting(value);
    match digits.len() {
        0..=9 => digits,
        10 => format!("({}) {}-{}", &digits[0..2], &digits[2..6], &digits[6..10]),
        _ => format!(
            "({}) {}-{}{}",
            &digits[0..2],
            &digits[2..7],
            &digits[7..11],
            &digits[11..]
        ),
    }
}

/// `01310100` → `01310-100`
pub fn format_zip_code(value: &str) -> String {
    let digits = remove_formatting(value);
    if digits.len() < 8 {
        return digits;
    }
    format!("{}-{}{}", &digits[0..5], &digits[5..8], &digits[8..])
}

/// ISO date → `dd/mm/yyyy`. Invalid input is returned unchanged.
pub fn format_date(value: &str) -> String {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|_| value.to_string())
}

/// Date → value accepted by the date inputs (`YYYY-MM-DD`)
pub fn format_date_for_input(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Uppercase the first character of every word
pub fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_word = false;
    for c in text.chars() {
        let is_word = c.is_alphanumeric() || c == '_';
        if is_word && !prev_is_word {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        prev_is_word = is_word;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "R$ 0,00");
        assert_eq!(format_currency(1000.0), "R$ 1.000,00");
        assert_eq!(format_currency(1234.5), "R$ 1.234,50");
        assert_eq!(format_currency(1_000_000.0), "R$ 1.000.000,00");
        assert_eq!(format_currency(999.999), "R$ 1.000,00");
        assert_eq!(format_currency(-42.1), "-R$ 42,10");
    }

    #[test]
    fn test_currency_display_is_reversible() {
        for value in [0.0, 1000.0, 1234.56, 98_765.43, 1_000_000.0] {
            assert!((parse_currency(&format_currency(value)) - value).abs() < 0.005);
        }
    }

    #[test]
    fn test_parse_currency_garbage_is_zero() {
        assert_eq!(parse_currency(""), 0.0);
        assert_eq!(parse_currency("abc"), 0.0);
        assert_eq!(parse_currency("1500"), 1500.0);
    }

    #[test]
    fn test_format_cpf() {
        assert_eq!(format_cpf("52998224725"), "529.982.247-25");
        assert_eq!(format_cpf("529.982.247-25"), "529.982.247-25");
        assert_eq!(format_cpf("5299"), "5299");
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("1134567890"), "(11) 3456-7890");
        assert_eq!(format_phone("11934567890"), "(11) 93456-7890");
        assert_eq!(format_phone("(11) 93456-7890"), "(11) 93456-7890");
        assert_eq!(format_phone("119"), "119");
    }

    #[test]
    fn test_format_zip_code() {
        assert_eq!(format_zip_code("01310100"), "01310-100");
        assert_eq!(format_zip_code("0131"), "0131");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-09"), "09/03/2024");
        assert_eq!(format_date("not a date"), "not a date");
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(format_date_for_input(d), "2024-03-09");
    }

    #[test]
    fn test_capitalize_words() {
        assert_eq!(capitalize_words("rua das flores"), "Rua Das Flores");
        assert_eq!(capitalize_words("são paulo"), "São Paulo");
        assert_eq!(capitalize_words("a-b c"), "A-B C");
    }
}
