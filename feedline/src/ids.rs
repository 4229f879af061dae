//! Request and order id allocation.

use feedline_types::{FeedlineError, OrderId, RequestId};

/// Monotonic id counter seeded from the gateway.
///
/// The counter remembers the highest id it ever issued. Reseeding (after a
/// reconnect) never moves it back below that mark, so an id is issued at most
/// once per process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdCounter {
    next: Option<i64>,
    high_water: Option<i64>,
}

impl IdCounter {
    /// An unseeded counter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: None,
            high_water: None,
        }
    }

    /// Seed from the gateway's starting value and return the effective start.
    pub fn seed(&mut self, start: i64) -> i64 {
        let effective = match self.high_water {
            Some(hw) => start.max(hw.saturating_add(1)),
            None => start,
        };
        self.next = Some(effective);
        effective
    }

    /// Forget the seed; the high-water mark survives.
    pub const fn reset(&mut self) {
        self.next = None;
    }

    /// Whether `seed` has been called since the last reset.
    #[must_use]
    pub const fn is_seeded(&self) -> bool {
        self.next.is_some()
    }

    /// The value the next call to [`IdCounter::next`] would return.
    #[must_use]
    pub const fn peek(&self) -> Option<i64> {
        self.next
    }

    /// Highest id issued so far.
    #[must_use]
    pub const fn high_water(&self) -> Option<i64> {
        self.high_water
    }

    /// Return the current value and advance.
    ///
    /// # Errors
    /// `Unseeded` before the first seed, `IdSpaceExhausted` when advancing would overflow.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<i64, FeedlineError> {
        let id = self.next.ok_or(FeedlineError::Unseeded)?;
        let following = id.checked_add(1).ok_or(FeedlineError::IdSpaceExhausted)?;
        self.next = Some(following);
        self.high_water = Some(id);
        Ok(id)
    }
}

/// The two independent id spaces of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAllocator {
    requests: IdCounter,
    orders: IdCounter,
}

impl IdAllocator {
    /// Unseeded allocator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requests: IdCounter::new(),
            orders: IdCounter::new(),
        }
    }

    /// Seed both counters from the same gateway value; returns the effective
    /// first request id.
    pub fn seed(&mut self, start: i64) -> i64 {
        self.orders.seed(start);
        self.requests.seed(start)
    }

    /// Drop both seeds at the end of a session.
    pub const fn reset(&mut self) {
        self.requests.reset();
        self.orders.reset();
    }

    /// Whether request ids can be issued.
    #[must_use]
    pub const fn is_seeded(&self) -> bool {
        self.requests.is_seeded()
    }

    /// Next request id.
    ///
    /// # Errors
    /// See [`IdCounter::next`].
    pub fn next_request(&mut self) -> Result<RequestId, FeedlineError> {
        self.requests.next().map(RequestId)
    }

    /// Next order id.
    ///
    /// # Errors
    /// See [`IdCounter::next`].
    pub fn next_order(&mut self) -> Result<OrderId, FeedlineError> {
        self.orders.next().map(OrderId)
    }

    /// Read access to the request counter.
    #[must_use]
    pub const fn requests(&self) -> &IdCounter {
        &self.requests
    }
}
