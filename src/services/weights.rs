// src/services/weights.rs
//
// Conversão de quantidade vendida para quilos, a partir da categoria do produto.

use std::{str::FromStr, sync::LazyLock};

use regex::Regex;
use rust_decimal::Decimal;

static WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*(kg|g)(?:m|rams?)?\b").expect("weight pattern is valid")
});

/// Gramas por unidade para a categoria, ou `None` se não for reconhecida.
pub fn unit_grams(category: &str) -> Option<Decimal> {
    let category = category.trim().to_lowercase();

    match category.as_str() {
        "bulk" | "550g/l" => return Some(Decimal::from(1000)),
        "tea bag" => return Some(Decimal::from(2)),
        "sample 20g" => return Some(Decimal::from(20)),
        _ => {}
    }

    let caps = WEIGHT_RE.captures(&category)?;
    let amount = Decimal::from_str(caps.get(1)?.as_str()).ok()?;
    match caps.get(2)?.as_str() {
        "kg" => Some(amount * Decimal::from(1000)),
        _ => Some(amount),
    }
}

/// Quilos correspondentes a `quantity` unidades.
/// Categorias desconhecidas devolvem a própria quantidade.
pub fn to_kilograms(category: &str, quantity: i64) -> Decimal {
    let quantity = Decimal::from(quantity);
    match unit_grams(category) {
        Some(grams) => quantity * grams / Decimal::from(1000),
        None => quantity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn named_categories() {
        assert_eq!(to_kilograms("bulk", 2), Decimal::from(2));
        assert_eq!(to_kilograms("550g/l", 3), Decimal::from(3));
        assert_eq!(to_kilograms("tea bag", 500), Decimal::from(1));
        assert_eq!(to_kilograms("sample 20g", 50), Decimal::from(1));
    }

    #[test]
    fn weights_in_the_name() {
        assert_eq!(to_kilograms("250g", 4), Decimal::from(1));
        assert_eq!(to_kilograms("1 kg", 3), Decimal::from(3));
        assert_eq!(to_kilograms("Pouch 100g", 5), "0.5".parse::<Decimal>().unwrap());
        assert_eq!(unit_grams("1.5kg"), Some(Decimal::from(1500)));
        assert_eq!(unit_grams("250gm"), Some(Decimal::from(250)));
        assert_eq!(unit_grams("500 grams"), Some(Decimal::from(500)));
        assert_eq!(unit_grams("1 gram"), Some(Decimal::from(1)));
        assert_eq!(unit_grams("250gx"), None);
    }

    #[test]
    fn matching_ignores_case_and_padding() {
        assert_eq!(unit_grams("  BULK "), Some(Decimal::from(1000)));
        assert_eq!(unit_grams("Tea Bag"), Some(Decimal::from(2)));
        assert_eq!(unit_grams("400G"), Some(Decimal::from(400)));
    }

    #[test]
    fn unknown_category_passes_quantity_through() {
        assert_eq!(unit_grams("XYZ"), None);
        assert_eq!(to_kilograms("XYZ", 7), Decimal::from(7));
        assert_eq!(to_kilograms("", 0), Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn gram_categories_scale_linearly(grams in 1i64..5000, quantity in 0i64..100_000) {
            let expected = Decimal::from(quantity * grams) / Decimal::from(1000);
            prop_assert_eq!(to_kilograms(&format!("{grams}g"), quantity), expected);
        }

        #[test]
        fn never_negative_for_non_negative_quantities(category in ".{0,20}", quantity in 0i64..100_000) {
            prop_assert!(!to_kilograms(&category, quantity).is_sign_negative());
        }
    }
}
