//! # Cart Service
//!
//! The mutation API for one cart. Every operation validates its input,
//! applies the change to a copy, recomputes, and swaps the copy in.
//!
//! ## Mutation Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  service.apply_discount(d)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate(d) ───────────────────► Err  (cart untouched, no event)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  next = cart.clone()                                                   │
//! │  mutate(next) ──────────────────► Err  (copy dropped, no event)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  recalculate(next, policy)                                             │
//! │  cart = next                    ◄── single assignment                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  observers.notify(event, &cart)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One service per cart. Walk-in and every dine-in table get their own
//! instance; nothing is shared between them.

use crate::calculator::recalculate;
use crate::cart::{
    Cart, Charge, Discount, LineItem, LineItemPatch, LineStatus, NewLineItem, StatusChange, Tender,
};
use crate::error::{CartError, CartResult};
use crate::events::{CartEvent, Listener, Observers, SubscriptionId};
use crate::money::Money;
use crate::policy::PricingPolicy;
use crate::validation::{
    validate_adjustment_id, validate_adjustment_value, validate_name, validate_note,
    validate_quantity, validate_sku, validate_tender_amount, validate_unit_price,
    validate_vat_rate, validate_wallet_balance,
};

#[derive(Debug)]
pub struct CartService {
    cart: Cart,
    policy: PricingPolicy,
    observers: Observers,
}

impl CartService {
    pub fn new(policy: PricingPolicy) -> Self {
        CartService {
            cart: Cart::new(),
            policy,
            observers: Observers::new(),
        }
    }

    /// Resumes a saved cart. Totals are recomputed under `policy`.
    pub fn from_cart(mut cart: Cart, policy: PricingPolicy) -> Self {
        recalculate(&mut cart, &policy);
        CartService {
            cart,
            policy,
            observers: Observers::new(),
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Switches pricing policy (e.g. after a settings change) and recomputes.
    pub fn set_policy(&mut self, policy: PricingPolicy) {
        self.policy = policy;
        recalculate(&mut self.cart, &self.policy);
    }

    pub fn into_cart(self) -> Cart {
        self.cart
    }

    // =========================================================================
    // Observers
    // =========================================================================

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&CartEvent, &Cart) + Send + 'static,
    {
        let listener: Listener = Box::new(listener);
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    // =========================================================================
    // Lines
    // =========================================================================

    /// Adds a line and returns its index.
    ///
    /// With `merge_identical_lines` on, an identical active line that has not
    /// gone to the kitchen absorbs the quantity instead.
    pub fn add_item(&mut self, item: LineItem) -> CartResult<usize> {
        validate_sku(&item.sku)?;
        validate_name("name", &item.name)?;
        validate_quantity(item.quantity)?;
        self.check_quantity(item.quantity)?;
        validate_unit_price("price", item.unit_price)?;
        check_line_amount(&item)?;
        validate_unit_price("price with modifiers", item.unit_price_with_modifiers())?;
        validate_vat_rate(item.vat_rate)?;
        validate_note(item.note.as_deref())?;

        if self.policy.merge_identical_lines {
            let existing = self
                .cart
                .items
                .iter()
                .position(|line| line.is_active() && !line.sent_to_kot && line.same_product_as(&item));
            if let Some(index) = existing {
                let quantity = self.cart.items[index].quantity + item.quantity;
                self.check_quantity(quantity)?;
                if item.unit_price_with_modifiers().checked_mul(quantity).is_none() {
                    return Err(overflow_error(&item));
                }
                return self.commit(|cart| {
                    let line = &mut cart.items[index];
                    line.quantity = quantity;
                    let item_id = line.id.clone();
                    Ok((index, CartEvent::ItemMerged { index, item_id }))
                });
            }
        }

        if self.cart.items.len() >= self.policy.max_lines {
            return Err(CartError::CartTooLarge {
                max: self.policy.max_lines,
            });
        }

        let mut item = item;
        item.status = LineStatus::Active;
        item.amount_before_void_comp = None;

        self.commit(|cart| {
            let index = cart.items.len();
            let item_id = item.id.clone();
            cart.items.push(item);
            Ok((index, CartEvent::ItemAdded { index, item_id }))
        })
    }

    /// Adds a line from a catalog picker payload.
    pub fn add_new_item(&mut self, input: NewLineItem) -> CartResult<usize> {
        self.add_item(LineItem::from(input))
    }

    /// Edits a line.
    ///
    /// A restore in the patch is applied first, then field edits, then a
    /// void or comp. Quantity, price and modifier edits need an active line.
    pub fn update_item(&mut self, index: usize, patch: LineItemPatch) -> CartResult<()> {
        let current = self.line(index)?;

        if let Some(quantity) = patch.quantity {
            validate_quantity(quantity)?;
            self.check_quantity(quantity)?;
        }
        if let Some(price) = patch.unit_price {
            validate_unit_price("price", price)?;
        }
        if let Some(note) = &patch.note {
            validate_note(note.as_deref())?;
        }
        if let Some(StatusChange::Void { reference, .. } | StatusChange::Comp { reference, .. }) =
            &patch.status
        {
            validate_name("reference", reference)?;
        }

        let restoring = matches!(patch.status, Some(StatusChange::Restore));
        if patch.touches_amount() && !current.is_active() && !restoring {
            return Err(CartError::LineLocked {
                index,
                state: current.status.label().to_string(),
            });
        }

        self.commit(|cart| {
            let line = &mut cart.items[index];
            let LineItemPatch {
                quantity,
                unit_price,
                modifiers,
                note,
                sent_to_kot,
                status,
            } = patch;

            if restoring {
                apply_change(line, index, StatusChange::Restore)?;
            }
            if let Some(quantity) = quantity {
                line.quantity = quantity;
            }
            if let Some(price) = unit_price {
                line.unit_price = price;
            }
            if let Some(modifiers) = modifiers {
                line.modifiers = modifiers;
            }
            check_line_amount(line)?;
            validate_unit_price("price with modifiers", line.unit_price_with_modifiers())?;
            if let Some(note) = note {
                line.note = note;
            }
            if let Some(sent) = sent_to_kot {
                line.sent_to_kot = sent;
            }

            let item_id = line.id.clone();
            let event = match status {
                Some(StatusChange::Restore) => CartEvent::ItemRestored { index, item_id },
                Some(change @ StatusChange::Void { .. }) => {
                    apply_change(line, index, change)?;
                    CartEvent::ItemVoided { index, item_id }
                }
                Some(change @ StatusChange::Comp { .. }) => {
                    apply_change(line, index, change)?;
                    CartEvent::ItemComped { index, item_id }
                }
                None => CartEvent::ItemUpdated { index, item_id },
            };
            Ok(((), event))
        })
    }

    /// Deletes a line. Lines already on a kitchen ticket must be voided.
    pub fn remove_item(&mut self, index: usize) -> CartResult<LineItem> {
        if self.line(index)?.sent_to_kot {
            return Err(CartError::SentToKitchen { index });
        }
        self.commit(|cart| {
            let item = cart.items.remove(index);
            let event = CartEvent::ItemRemoved {
                index,
                item_id: item.id.clone(),
            };
            Ok((item, event))
        })
    }

    pub fn void_item(
        &mut self,
        index: usize,
        reference: impl Into<String>,
        reason: Option<String>,
    ) -> CartResult<()> {
        self.update_item(
            index,
            LineItemPatch::status(StatusChange::Void {
                reference: reference.into(),
                reason,
            }),
        )
    }

    pub fn comp_item(
        &mut self,
        index: usize,
        reference: impl Into<String>,
        reason: Option<String>,
    ) -> CartResult<()> {
        self.update_item(
            index,
            LineItemPatch::status(StatusChange::Comp {
                reference: reference.into(),
                reason,
            }),
        )
    }

    pub fn restore_item(&mut self, index: usize) -> CartResult<()> {
        self.update_item(index, LineItemPatch::status(StatusChange::Restore))
    }

    // =========================================================================
    // Discounts & Charges
    // =========================================================================

    /// Applies a discount against the current discounted subtotal.
    ///
    /// ## User Workflow
    /// ```text
    /// Subtotal 200.00
    /// Tap "10% OFF"  ──► 20.00 off ──► 180.00
    /// Tap "10% OFF"  ──► DuplicateApplication, nothing changes
    /// Tap "250 OFF"  ──► NegativeResultingTotal, nothing changes
    /// ```
    pub fn apply_discount(&mut self, discount: Discount) -> CartResult<()> {
        validate_adjustment_id(&discount.id)?;
        validate_name("name", &discount.name)?;
        validate_adjustment_value(&discount.value)?;
        if self.cart.has_discount(&discount.id) {
            return Err(CartError::duplicate("Discount", &discount.id));
        }

        let totals = &self.cart.totals;
        let running = totals.total_selling_price - totals.total_discount;
        let resulting_total = running - discount.value.amount_against(running);
        if !resulting_total.is_positive() {
            return Err(CartError::NegativeResultingTotal {
                id: discount.id,
                resulting_total,
            });
        }

        self.commit(|cart| {
            let event = CartEvent::DiscountApplied {
                id: discount.id.clone(),
            };
            cart.discounts.push(discount);
            Ok(((), event))
        })
    }

    pub fn remove_discount(&mut self, id: &str) -> CartResult<Discount> {
        let position = self
            .cart
            .discounts
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| CartError::not_applied("Discount", id))?;
        self.commit(|cart| {
            let discount = cart.discounts.remove(position);
            let event = CartEvent::DiscountRemoved {
                id: discount.id.clone(),
            };
            Ok((discount, event))
        })
    }

    pub fn apply_charge(&mut self, charge: Charge) -> CartResult<()> {
        validate_adjustment_id(&charge.id)?;
        validate_name("name", &charge.name)?;
        validate_adjustment_value(&charge.value)?;
        if let Some(rate) = charge.vat_rate {
            validate_vat_rate(rate)?;
        }
        if self.cart.has_charge(&charge.id) {
            return Err(CartError::duplicate("Charge", &charge.id));
        }

        self.commit(|cart| {
            let event = CartEvent::ChargeApplied {
                id: charge.id.clone(),
            };
            cart.charges.push(charge);
            Ok(((), event))
        })
    }

    pub fn remove_charge(&mut self, id: &str) -> CartResult<Charge> {
        let position = self
            .cart
            .charges
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CartError::not_applied("Charge", id))?;
        self.commit(|cart| {
            let charge = cart.charges.remove(position);
            let event = CartEvent::ChargeRemoved {
                id: charge.id.clone(),
            };
            Ok((charge, event))
        })
    }

    // =========================================================================
    // Payment
    // =========================================================================

    pub fn add_tender(&mut self, tender: Tender) -> CartResult<()> {
        validate_adjustment_id(&tender.id)?;
        validate_tender_amount(tender.amount)?;
        if self.cart.tenders.iter().any(|t| t.id == tender.id) {
            return Err(CartError::duplicate("Tender", &tender.id));
        }
        self.commit(|cart| {
            let event = CartEvent::TenderAdded {
                id: tender.id.clone(),
            };
            cart.tenders.push(tender);
            Ok(((), event))
        })
    }

    pub fn remove_tender(&mut self, id: &str) -> CartResult<Tender> {
        let position = self
            .cart
            .tenders
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CartError::not_applied("Tender", id))?;
        self.commit(|cart| {
            let tender = cart.tenders.remove(position);
            let event = CartEvent::TenderRemoved {
                id: tender.id.clone(),
            };
            Ok((tender, event))
        })
    }

    /// Sets the customer's available wallet balance. Zero detaches it.
    pub fn set_wallet_balance(&mut self, balance: Money) -> CartResult<()> {
        validate_wallet_balance(balance)?;
        self.commit(|cart| {
            cart.wallet_balance = balance;
            Ok(((), CartEvent::WalletChanged))
        })
    }

    // =========================================================================
    // Kitchen
    // =========================================================================

    /// Active lines that still need a kitchen ticket.
    pub fn pending_kitchen_items(&self) -> Vec<(usize, &LineItem)> {
        self.cart
            .pending_kitchen_indices()
            .into_iter()
            .map(|index| (index, &self.cart.items[index]))
            .collect()
    }

    /// Flags lines as printed on a kitchen ticket.
    pub fn mark_sent_to_kitchen(&mut self, indices: &[usize]) -> CartResult<()> {
        let mut indices = indices.to_vec();
        indices.sort_unstable();
        indices.dedup();
        if indices.is_empty() {
            return Ok(());
        }
        for &index in &indices {
            self.line(index)?;
        }
        self.commit(|cart| {
            for &index in &indices {
                cart.items[index].sent_to_kot = true;
            }
            Ok(((), CartEvent::SentToKitchen { indices }))
        })
    }

    // =========================================================================
    // Whole cart
    // =========================================================================

    /// Empties the cart after checkout or cancel.
    pub fn clear_cart(&mut self) {
        self.cart = Cart::new();
        self.observers.notify(&CartEvent::Cleared, &self.cart);
    }

    /// Re-runs the calculator. Emits no event.
    pub fn recompute(&mut self) {
        recalculate(&mut self.cart, &self.policy);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn line(&self, index: usize) -> CartResult<&LineItem> {
        self.cart
            .items
            .get(index)
            .ok_or(CartError::LineNotFound { index })
    }

    fn check_quantity(&self, quantity: i64) -> CartResult<()> {
        if quantity > self.policy.max_quantity {
            return Err(CartError::QuantityTooLarge {
                requested: quantity,
                max: self.policy.max_quantity,
            });
        }
        Ok(())
    }

    /// Runs `mutate` on a copy; on success recomputes, swaps and notifies.
    fn commit<T, F>(&mut self, mutate: F) -> CartResult<T>
    where
        F: FnOnce(&mut Cart) -> CartResult<(T, CartEvent)>,
    {
        let mut next = self.cart.clone();
        let (value, event) = mutate(&mut next)?;
        recalculate(&mut next, &self.policy);
        next.touch();
        self.cart = next;
        self.observers.notify(&event, &self.cart);
        Ok(value)
    }
}

/// Rejects a line whose amount does not fit in [`Money`].
fn check_line_amount(line: &LineItem) -> CartResult<()> {
    match line.checked_gross_amount() {
        Some(_) => Ok(()),
        None => Err(overflow_error(line)),
    }
}

fn overflow_error(line: &LineItem) -> CartError {
    CartError::InvalidAmount {
        field: "line total".to_string(),
        raw: format!("{} x {}", line.unit_price, line.quantity),
    }
}

fn apply_change(line: &mut LineItem, index: usize, change: StatusChange) -> CartResult<()> {
    line.apply_status(change)
        .map_err(|invalid| CartError::InvalidTransition {
            index,
            from: invalid.from.to_string(),
            to: invalid.to.to_string(),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
