// src/services/payment.rs
//
// Regras de pagamento de uma fatura (adiantamento e quitação).

use rust_decimal::Decimal;

use crate::{common::error::AppError, models::product::is_whole_cents};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentState {
    pub total: Decimal,
    pub advance: Decimal,
    pub is_paid: bool,
    pub is_cancelled: bool,
}

impl PaymentState {
    fn ensure_open(&self) -> Result<(), AppError> {
        if self.is_cancelled {
            return Err(AppError::InvoiceCancelled);
        }
        if self.is_paid {
            return Err(AppError::InvoiceAlreadyPaid);
        }
        Ok(())
    }

    /// Soma o adiantamento, limitado ao total. Ao atingir o total a fatura
    /// passa a paga.
    pub fn apply_advance(self, amount: Decimal) -> Result<Self, AppError> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidAmount);
        }
        if !is_whole_cents(&amount) {
            return Err(AppError::BadRequest(
                "Amount must have at most two decimal places".into(),
            ));
        }
        self.ensure_open()?;

        let advance = (self.advance + amount).min(self.total);
        Ok(Self {
            advance,
            is_paid: advance >= self.total,
            ..self
        })
    }

    /// Quitação direta. O adiantamento registrado não muda.
    pub fn mark_paid(self) -> Result<Self, AppError> {
        self.ensure_open()?;
        Ok(Self {
            is_paid: true,
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn open(total: &str) -> PaymentState {
        PaymentState {
            total: dec(total),
            advance: Decimal::ZERO,
            is_paid: false,
            is_cancelled: false,
        }
    }

    #[test]
    fn advances_accumulate_and_flip_paid_once() {
        let state = open("1000").apply_advance(dec("400")).unwrap();
        assert_eq!(state.advance, dec("400"));
        assert!(!state.is_paid);

        let state = state.apply_advance(dec("600")).unwrap();
        assert_eq!(state.advance, dec("1000"));
        assert!(state.is_paid);

        // já paga: novos adiantamentos são recusados e nada muda
        assert!(matches!(
            state.apply_advance(dec("1")),
            Err(AppError::InvoiceAlreadyPaid)
        ));
    }

    #[test]
    fn advance_is_capped_at_total() {
        let state = open("250.50").apply_advance(dec("999")).unwrap();
        assert_eq!(state.advance, dec("250.50"));
        assert!(state.is_paid);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        assert!(matches!(open("10").apply_advance(Decimal::ZERO), Err(AppError::InvalidAmount)));
        assert!(matches!(open("10").apply_advance(dec("-5")), Err(AppError::InvalidAmount)));
    }

    #[test]
    fn fractions_of_a_cent_are_rejected() {
        assert!(matches!(open("10").apply_advance(dec("0.005")), Err(AppError::BadRequest(_))));
        let state = open("10").apply_advance(dec("0.010")).unwrap();
        assert_eq!(state.advance, dec("0.01"));
    }

    #[test]
    fn cancelled_invoices_take_no_payments() {
        let cancelled = PaymentState {
            is_cancelled: true,
            ..open("10")
        };
        assert!(matches!(cancelled.apply_advance(dec("1")), Err(AppError::InvoiceCancelled)));
        assert!(matches!(cancelled.mark_paid(), Err(AppError::InvoiceCancelled)));
    }

    #[test]
    fn mark_paid_keeps_advance() {
        let state = open("100").apply_advance(dec("30")).unwrap().mark_paid().unwrap();
        assert!(state.is_paid);
        assert_eq!(state.advance, dec("30"));
        assert!(matches!(state.mark_paid(), Err(AppError::InvoiceAlreadyPaid)));
    }
}
