//! Which cart lines are ticked for checkout.

use std::collections::HashSet;
use storefront_core::{Cart, CartItemId, CartLine};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    selected: HashSet<CartItemId>,
}

impl Selection {
    /// Flips one line. Returns whether it is now selected.
    pub fn toggle(&mut self, id: CartItemId) -> bool {
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    pub fn select_all(&mut self, cart: &Cart, checked: bool) {
        self.selected.clear();
        if checked {
            self.selected.extend(cart.items.iter().map(|line| line.id));
        }
    }

    pub fn all_selected(&self, cart: &Cart) -> bool {
        !cart.is_empty() && cart.items.iter().all(|line| self.selected.contains(&line.id))
    }

    pub fn is_selected(&self, id: CartItemId) -> bool {
        self.selected.contains(&id)
    }

    /// Selected lines in cart order. Ids no longer in the cart are ignored.
    pub fn selected_lines<'c>(&self, cart: &'c Cart) -> Vec<&'c CartLine> {
        cart.items
            .iter()
            .filter(|line| self.selected.contains(&line.id))
            .collect()
    }

    /// Sum of the server-computed subtotals of the selected lines.
    pub fn selected_total(&self, cart: &Cart) -> f64 {
        self.selected_lines(cart)
            .into_iter()
            .map(|line| line.subtotal)
            .sum()
    }

    /// Forgets lines that left the cart.
    pub fn retain_present(&mut self, cart: &Cart) {
        self.selected.retain(|id| cart.contains(*id));
    }
}
