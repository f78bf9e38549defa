//! Property-based tests for the cart calculator.
//!
//! These check the laws every cart must obey regardless of what was rung
//! up, in which order, or how it was discounted.

use proptest::prelude::*;
use tally_core::keypad::{get_price, Keypad};
use tally_core::{
    CartError, CartService, Discount, LineItem, Money, PricingPolicy, Rate, VatMode,
};

// Strategies for generating test data
fn line_strategy() -> impl Strategy<Value = (i64, u32, i64)> {
    // (unit price cents, vat bps, quantity)
    (0i64..500_000, 0u32..2_500, 1i64..50)
}

fn lines_strategy() -> impl Strategy<Value = Vec<(i64, u32, i64)>> {
    prop::collection::vec(line_strategy(), 1..20)
}

fn vat_mode_strategy() -> impl Strategy<Value = VatMode> {
    prop_oneof![Just(VatMode::Exclusive), Just(VatMode::Inclusive)]
}

fn to_item(index: usize, (price, vat, qty): (i64, u32, i64)) -> LineItem {
    let sku = format!("SKU-{}", index);
    LineItem::new(sku.clone(), sku, Money::from_cents(price), Rate::from_bps(vat), qty)
}

fn ring_up(lines: &[(i64, u32, i64)], mode: VatMode) -> CartService {
    let mut svc = CartService::new(PricingPolicy {
        vat_mode: mode,
        ..Default::default()
    });
    for (index, line) in lines.iter().enumerate() {
        svc.add_item(to_item(index, *line)).unwrap();
    }
    svc
}

// Property: subtotal is the plain sum over active lines, in any order
proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn subtotal_is_order_independent(lines in lines_strategy(), mode in vat_mode_strategy()) {
        let forward = ring_up(&lines, mode);
        let mut reversed_lines = lines.clone();
        reversed_lines.reverse();
        let reversed = ring_up(&reversed_lines, mode);

        let expected: i64 = lines.iter().map(|(price, _, qty)| price * qty).sum();
        prop_assert_eq!(forward.cart().totals().total_selling_price.cents(), expected);
        prop_assert_eq!(
            forward.cart().totals().total_selling_price,
            reversed.cart().totals().total_selling_price
        );
        prop_assert_eq!(
            forward.cart().totals().total_vat_amount,
            reversed.cart().totals().total_vat_amount
        );
    }

    #[test]
    fn removing_a_line_subtracts_exactly_its_amount(
        lines in lines_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut svc = ring_up(&lines, VatMode::Exclusive);
        let index = pick.index(lines.len());
        let before = svc.cart().totals().total_selling_price;

        let removed = svc.remove_item(index).unwrap();
        prop_assert_eq!(
            svc.cart().totals().total_selling_price,
            before - removed.total
        );
    }

    #[test]
    fn recompute_is_idempotent(
        lines in lines_strategy(),
        mode in vat_mode_strategy(),
        pct in 1u32..50,
    ) {
        let mut svc = ring_up(&lines, mode);
        let _ = svc.apply_discount(Discount::percentage("P", "P", Rate::from_percent(pct)));
        let first = svc.cart().clone();

        svc.recompute();
        prop_assert_eq!(svc.cart(), &first);
        svc.recompute();
        prop_assert_eq!(svc.cart(), &first);
    }

    #[test]
    fn void_then_restore_puts_line_back(
        lines in lines_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut svc = ring_up(&lines, VatMode::Exclusive);
        let index = pick.index(lines.len());
        let before_line = svc.cart().items()[index].clone();
        let before_totals = svc.cart().totals().clone();

        svc.void_item(index, "V-1", None).unwrap();
        prop_assert_eq!(svc.cart().items()[index].total, Money::zero());
        svc.restore_item(index).unwrap();

        let after = &svc.cart().items()[index];
        prop_assert_eq!(after.total, before_line.total);
        prop_assert_eq!(after.vat_amount, before_line.vat_amount);
        prop_assert_eq!(svc.cart().totals(), &before_totals);
    }

    #[test]
    fn discount_spread_reconciles(
        lines in lines_strategy(),
        pct in 1u32..100,
    ) {
        let mut svc = ring_up(&lines, VatMode::Exclusive);
        if svc
            .apply_discount(Discount::percentage("P", "P", Rate::from_percent(pct)))
            .is_ok()
        {
            let shared: i64 = svc
                .cart()
                .items()
                .iter()
                .map(|item| (item.total - item.discounted_total).cents())
                .sum();
            prop_assert_eq!(shared, svc.cart().totals().total_discount.cents());
            for item in svc.cart().items() {
                prop_assert!(!item.discounted_total.is_negative());
            }
        }
    }

    #[test]
    fn duplicate_discount_never_changes_totals(lines in lines_strategy(), pct in 1u32..50) {
        let mut svc = ring_up(&lines, VatMode::Exclusive);
        prop_assume!(svc.cart().totals().total_selling_price.cents() > 100);
        svc.apply_discount(Discount::percentage("DUP", "Dup", Rate::from_percent(pct)))
            .unwrap();
        let snapshot = svc.cart().clone();

        let err = svc
            .apply_discount(Discount::percentage("DUP", "Dup", Rate::from_percent(pct)))
            .unwrap_err();
        prop_assert_eq!(err, CartError::duplicate("Discount", "DUP"));
        prop_assert_eq!(svc.cart(), &snapshot);
    }

    #[test]
    fn totals_never_negative(lines in lines_strategy(), off in 1i64..1_000_000) {
        let mut svc = ring_up(&lines, VatMode::Exclusive);
        let _ = svc.apply_discount(Discount::amount("A", "A", Money::from_cents(off)));
        // Shrink the cart under the discount; it must clamp, not go negative.
        while svc.cart().items().len() > 1 {
            svc.remove_item(0).unwrap();
        }
        prop_assert!(!svc.cart().totals().total_amount.is_negative());
        prop_assert!(svc.cart().totals().total_discount <= svc.cart().totals().total_selling_price);
    }

    #[test]
    fn keypad_display_matches_cents(digits in "[1-9][0-9]{0,8}") {
        let mut keypad = Keypad::new();
        for c in digits.chars() {
            keypad.press(c);
        }
        let cents: i64 = digits.parse().unwrap();
        prop_assert_eq!(keypad.price().cents(), cents);
        prop_assert_eq!(get_price(&digits), Money::from_cents(cents).to_string());
    }
}

// Worked examples
#[test]
fn exclusive_vat_worked_example() {
    let mut svc = CartService::new(PricingPolicy::default());
    svc.add_item(LineItem::new("A", "A", Money::from_cents(10_000), Rate::from_percent(15), 1))
        .unwrap();

    assert_eq!(svc.cart().totals().total_vat_amount.to_string(), "15.00");
    assert_eq!(svc.cart().totals().total_amount.to_string(), "115.00");
}

#[test]
fn percentage_discount_worked_example() {
    let mut svc = CartService::new(PricingPolicy::default());
    svc.add_item(LineItem::new("A", "A", Money::from_cents(20_000), Rate::zero(), 1))
        .unwrap();
    svc.apply_discount(Discount::percentage("TEN", "Ten", Rate::from_percent(10)))
        .unwrap();

    assert_eq!(svc.cart().totals().total_discount.to_string(), "20.00");
    assert_eq!(svc.cart().totals().total_amount.to_string(), "180.00");
    assert!(matches!(
        svc.apply_discount(Discount::percentage("TEN", "Ten", Rate::from_percent(10))),
        Err(CartError::DuplicateApplication { .. })
    ));
}

#[test]
fn keypad_worked_example() {
    let mut keypad = Keypad::new();
    keypad.press('1');
    keypad.press('5');
    keypad.press('0');
    assert_eq!(keypad.display(), "1.50");
}
