// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The sender's view of a credit controlled link.
//!
//! Credits arrive from the receiver as [`Credit`] messages and are added to
//! the balance. Each object sent consumes one credit. Sending with a zero
//! balance is refused with [`FlowError::CreditExhausted`] and leaves the
//! balance unchanged.
//!
//! The balance is always `issued() - consumed()`.

use std::rc::Rc;

use ringlock_track::entity::Entity;
use ringlock_track::trace;

use crate::types::{Credit, FlowError};

pub struct CreditCounter {
    pub entity: Rc<Entity>,
    balance: usize,
    issued: usize,
    consumed: usize,
}

impl CreditCounter {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, name)),
            balance: 0,
            issued: 0,
            consumed: 0,
        }
    }

    /// Add the credits granted by the receiver.
    pub fn absorb(&mut self, credit: Credit) {
        trace!(self.entity ; "absorb {}", credit);
        self.issued += credit.0;
        self.balance += credit.0;
    }

    /// Take one credit to send one object.
    pub fn consume(&mut self) -> Result<(), FlowError> {
        if self.balance == 0 {
            trace!(self.entity ; "no credit");
            return Err(FlowError::CreditExhausted);
        }
        self.balance -= 1;
        self.consumed += 1;
        Ok(())
    }

    #[must_use]
    pub fn balance(&self) -> usize {
        self.balance
    }

    /// Total number of credits ever granted.
    #[must_use]
    pub fn issued(&self) -> usize {
        self.issued
    }

    #[must_use]
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

#[cfg(test)]
mod tests {
    use ringlock_track::entity::toplevel;
    use ringlock_track::tracker::dev_null_tracker;

    use super::*;

    #[test]
    fn exhausted_leaves_balance_at_zero() {
        let tracker = dev_null_tracker();
        let top = toplevel(&tracker, "top");
        let mut credit = CreditCounter::new(&top, "credit");

        assert_eq!(credit.consume(), Err(FlowError::CreditExhausted));
        assert_eq!(credit.balance(), 0);
        assert_eq!(credit.consumed(), 0);
    }

    #[test]
    fn balance_is_issued_minus_consumed() {
        let tracker = dev_null_tracker();
        let top = toplevel(&tracker, "top");
        let mut credit = CreditCounter::new(&top, "credit");

        credit.absorb(Credit(3));
        for _ in 0..5 {
            let _ = credit.consume();
            assert_eq!(credit.balance(), credit.issued() - credit.consumed());
        }
        credit.absorb(Credit(1));
        assert_eq!(credit.issued(), 4);
        assert_eq!(credit.consumed(), 3);
        assert_eq!(credit.balance(), 1);
    }
}
