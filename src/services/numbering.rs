// src/services/numbering.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::common::error::AppError;

pub const INVOICE_PREFIX: &str = "INV";
pub const INVOICE_SEED: &str = "INV-25201";

pub const RECEIPT_PREFIX: &str = "REC";
pub const RECEIPT_SEED: &str = "REC-2899";

// Números informados pelo cliente: PREFIXO-NNN, até 9 dígitos
static DOCUMENT_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]+)-([0-9]{1,9})$").expect("document number pattern is valid"));

/// Confere um número informado manualmente contra o formato do prefixo.
pub fn check_document_number(prefix: &str, number: &str) -> Result<(), AppError> {
    let valid = DOCUMENT_NUMBER_RE
        .captures(number)
        .and_then(|caps| caps.get(1))
        .is_some_and(|found| found.as_str() == prefix);
    if !valid {
        return Err(AppError::BadRequest(format!(
            "Document number must look like {prefix}-12345 (up to 9 digits)"
        )));
    }
    Ok(())
}

/// Próximo número do documento: semente quando não há nenhum,
/// senão maior sufixo + 1 com 5 dígitos.
pub fn next_document_number(prefix: &str, seed: &str, highest: Option<i64>) -> Result<String, AppError> {
    match highest {
        Some(n) => {
            let next = n
                .checked_add(1)
                .ok_or_else(|| AppError::Conflict(format!("{prefix} numbering is exhausted")))?;
            Ok(format!("{prefix}-{next:05}"))
        }
        None => Ok(seed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_invoice_uses_seed() {
        assert_eq!(next_document_number(INVOICE_PREFIX, INVOICE_SEED, None).unwrap(), "INV-25201");
        assert_eq!(next_document_number(RECEIPT_PREFIX, RECEIPT_SEED, None).unwrap(), "REC-2899");
    }

    #[test]
    fn increments_highest_suffix() {
        assert_eq!(
            next_document_number(INVOICE_PREFIX, INVOICE_SEED, Some(25201)).unwrap(),
            "INV-25202"
        );
        assert_eq!(
            next_document_number(RECEIPT_PREFIX, RECEIPT_SEED, Some(2899)).unwrap(),
            "REC-02900"
        );
        assert_eq!(next_document_number(INVOICE_PREFIX, INVOICE_SEED, Some(7)).unwrap(), "INV-00008");
    }

    #[test]
    fn highest_possible_suffix_does_not_wrap() {
        let result = next_document_number(INVOICE_PREFIX, INVOICE_SEED, Some(i64::MAX));
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn supplied_numbers_must_match_the_prefix_format() {
        assert!(check_document_number(INVOICE_PREFIX, "INV-25201").is_ok());
        assert!(check_document_number(RECEIPT_PREFIX, "REC-7").is_ok());
        assert!(check_document_number(INVOICE_PREFIX, "INV-999999999").is_ok());

        for bad in [
            "INV-9223372036854775807",
            "INV-12345678901234567890",
            "INV-",
            "REC-100",
            "inv-100",
            "INV-12a",
            "INV-100 ",
        ] {
            assert!(
                matches!(check_document_number(INVOICE_PREFIX, bad), Err(AppError::BadRequest(_))),
                "{bad} should be refused"
            );
        }
    }
}
