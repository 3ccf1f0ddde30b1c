// src/services/stock.rs
//
// Cálculo dos ajustes de estoque a partir das linhas de uma fatura.
// Os deltas são aplicados em ordem de id de produto (BTreeMap).

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::common::error::AppError;

/// Quantidade total por produto (linhas repetidas somam).
/// Soma que não cabe em `i32` é recusada.
pub fn quantities<I>(lines: I) -> Result<BTreeMap<Uuid, i32>, AppError>
where
    I: IntoIterator<Item = (Uuid, i32)>,
{
    let mut totals: BTreeMap<Uuid, i32> = BTreeMap::new();
    for (product_id, quantity) in lines {
        let total = totals.entry(product_id).or_insert(0);
        *total = total
            .checked_add(quantity)
            .ok_or_else(|| AppError::BadRequest("Total quantity for a product is too large".into()))?;
    }
    Ok(totals)
}

/// Deltas de estoque para uma venda que passa de `before` para `after`.
/// Venda nova: `before` vazio. Cancelamento: `after` vazio.
/// Produtos sem mudança líquida não aparecem.
pub fn sales_adjustments(
    before: &BTreeMap<Uuid, i32>,
    after: &BTreeMap<Uuid, i32>,
) -> BTreeMap<Uuid, i32> {
    diff(before, after)
}

/// Deltas para notas de entrada: o inverso da venda.
pub fn receipt_adjustments(
    before: &BTreeMap<Uuid, i32>,
    after: &BTreeMap<Uuid, i32>,
) -> BTreeMap<Uuid, i32> {
    diff(after, before)
}

// plus - minus, por produto (ambos os lados são somas não negativas)
fn diff(plus: &BTreeMap<Uuid, i32>, minus: &BTreeMap<Uuid, i32>) -> BTreeMap<Uuid, i32> {
    let mut deltas = plus.clone();
    for (product_id, quantity) in minus {
        *deltas.entry(*product_id).or_insert(0) -= quantity;
    }
    deltas.retain(|_, delta| *delta != 0);
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(stock: &mut BTreeMap<Uuid, i32>, deltas: &BTreeMap<Uuid, i32>) {
        for (id, delta) in deltas {
            *stock.entry(*id).or_insert(0) += delta;
        }
    }

    #[test]
    fn repeated_lines_are_summed() {
        let p = Uuid::new_v4();
        let q = quantities([(p, 2), (p, 3)]).unwrap();
        assert_eq!(q[&p], 5);
    }

    #[test]
    fn overflowing_sum_is_rejected_instead_of_wrapping() {
        let p = Uuid::new_v4();
        let result = quantities([(p, 1_500_000_000), (p, 1_500_000_000)]);
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let q = quantities([(p, i32::MAX - 1), (p, 1)]).unwrap();
        assert_eq!(q[&p], i32::MAX);
    }

    #[test]
    fn create_then_cancel_restores_stock() {
        let p = Uuid::new_v4();
        let mut stock = BTreeMap::from([(p, 10)]);
        let items = quantities([(p, 4)]).unwrap();

        let on_create = sales_adjustments(&BTreeMap::new(), &items);
        apply(&mut stock, &on_create);
        assert_eq!(stock[&p], 6);

        let on_cancel = sales_adjustments(&items, &BTreeMap::new());
        apply(&mut stock, &on_cancel);
        assert_eq!(stock[&p], 10);
    }

    #[test]
    fn update_moves_only_the_difference() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let old = quantities([(a, 5), (b, 2)]).unwrap();
        let new = quantities([(a, 3), (b, 2), (c, 1)]).unwrap();

        let deltas = sales_adjustments(&old, &new);

        assert_eq!(deltas.get(&a), Some(&2));
        assert_eq!(deltas.get(&b), None);
        assert_eq!(deltas.get(&c), Some(&-1));
    }

    #[test]
    fn receipts_move_stock_the_other_way() {
        let p = Uuid::new_v4();
        let deltas = receipt_adjustments(&quantities([(p, 10)]).unwrap(), &quantities([(p, 12)]).unwrap());
        assert_eq!(deltas[&p], 2);

        let created = receipt_adjustments(&BTreeMap::new(), &quantities([(p, 7)]).unwrap());
        assert_eq!(created[&p], 7);
    }
}
