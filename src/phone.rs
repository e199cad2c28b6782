//! Display rendering of the phone numbers kept as (ddd, numero) pairs.

fn filled(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

/// `(31) 98765-4321` for nine digits, `(31) 3456-7890` for eight, and the
/// number as it is for anything else.
pub fn format_phone(ddd: Option<&str>, numero: Option<&str>) -> String {
    let numero = match filled(numero) {
        Some(n) => n,
        None => return String::new(),
    };

    let body = match numero.len() {
        9 if numero.bytes().all(|b| b.is_ascii_digit()) => {
            format!("{}-{}", &numero[..5], &numero[5..])
        }
        8 if numero.bytes().all(|b| b.is_ascii_digit()) => {
            format!("{}-{}", &numero[..4], &numero[4..])
        }
        _ => numero.to_string(),
    };

    match filled(ddd) {
        Some(ddd) => format!("({}) {}", ddd, body),
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formats() {
        assert_eq!(format_phone(Some("31"), Some("987654321")), "(31) 98765-4321");
        assert_eq!(format_phone(Some("31"), Some("34567890")), "(31) 3456-7890");
        assert_eq!(format_phone(Some("31"), Some("1234567")), "(31) 1234567");
        assert_eq!(format_phone(None, Some("987654321")), "98765-4321");
        assert_eq!(format_phone(Some(""), Some("34567890")), "3456-7890");
        assert_eq!(format_phone(Some("31"), None), "");
        assert_eq!(format_phone(Some("31"), Some("")), "");
    }

    proptest! {
        #[test]
        fn nine_digits(ddd in "[0-9]{2}", n in "[0-9]{9}") {
            let out = format_phone(Some(&ddd), Some(&n));
            prop_assert_eq!(out, format!("({}) {}-{}", ddd, &n[..5], &n[5..]));
        }

        #[test]
        fn eight_digits(ddd in "[0-9]{2}", n in "[0-9]{8}") {
            let out = format_phone(Some(&ddd), Some(&n));
            prop_assert_eq!(out, format!("({}) {}-{}", ddd, &n[..4], &n[4..]));
        }
    }
}
