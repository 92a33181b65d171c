// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Read Strategy & Seek Planner (spec.md §4.3, §9).
//!
//! `Strategy` is the live, possibly-latched access pattern; it starts from
//! the caller's [`Fadvise`] hint and, under `Fadvise::Auto`, latches from
//! `Sequential` to `Random` the first time a seek can't be absorbed
//! in-place — a one-way transition, matching the teacher's
//! `set_expected_access_pattern`/`AccessPattern` in
//! `seekable_http_reader.rs`, generalized with the `Auto` hysteresis
//! spec.md adds on top of the teacher's two fixed patterns.

use crate::config::{Fadvise, ReadOptions};
use crate::footer::Footer;

/// The channel's live access-pattern state.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Strategy {
    Sequential,
    Random,
}

impl Strategy {
    pub fn initial(fadvise: Fadvise) -> Self {
        match fadvise {
            Fadvise::Sequential => Strategy::Sequential,
            Fadvise::Random => Strategy::Random,
            Fadvise::Auto => Strategy::Sequential,
        }
    }

    /// Apply the one-way `Auto` -> `Random` latch after a seek, per
    /// spec.md §4.3 step 4: only `Fadvise::Auto` latches, only when the
    /// seek could *not* be absorbed in-place, and never back to `Sequential`.
    pub fn after_seek(self, fadvise: Fadvise, absorbed_in_place: bool) -> Self {
        if self == Strategy::Random {
            return Strategy::Random;
        }
        if !absorbed_in_place && fadvise == Fadvise::Auto {
            Strategy::Random
        } else {
            self
        }
    }
}

/// The length of a planned range read, or `Unbounded` ("to end of object").
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PlannedRange {
    Bounded(u64),
    Unbounded,
}

/// Plan the next range to request from the RPC, per spec.md §4.3:
/// - `Sequential`: unbounded, to ride the server's own chunking.
/// - `Random`: `max(want, max(inplace_seek_limit, min_range_request_size))`.
/// - Either way, clamp into the footer's start so the footer cache (not
///   the RPC) serves the tail.
pub fn plan(
    options: &ReadOptions,
    strategy: Strategy,
    position: u64,
    want: u64,
    footer: Option<&Footer>,
) -> PlannedRange {
    let planned = match strategy {
        Strategy::Sequential => PlannedRange::Unbounded,
        Strategy::Random => {
            let floor = options.inplace_seek_limit.max(options.min_range_request_size);
            PlannedRange::Bounded(want.max(floor))
        }
    };

    let Some(footer) = footer else {
        return planned;
    };
    if footer.start_offset <= position {
        // Already at/past the footer boundary; Phase D handles this before
        // the planner is ever consulted, but guard against being called anyway.
        return planned;
    }
    let max_len = footer.start_offset - position;
    match planned {
        PlannedRange::Unbounded => PlannedRange::Bounded(max_len),
        PlannedRange::Bounded(len) if len > max_len => PlannedRange::Bounded(max_len),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn opts() -> ReadOptions {
        ReadOptions {
            min_range_request_size: 2000,
            inplace_seek_limit: 256,
            ..Default::default()
        }
    }

    #[test]
    fn sequential_unbounded_clamps_to_footer() {
        let footer = Footer::new(9000, Bytes::new());
        let planned = plan(&opts(), Strategy::Sequential, 0, 100, Some(&footer));
        assert_eq!(planned, PlannedRange::Bounded(9000));
    }

    #[test]
    fn sequential_unbounded_without_footer() {
        let planned = plan(&opts(), Strategy::Sequential, 0, 100, None);
        assert_eq!(planned, PlannedRange::Unbounded);
    }

    #[test]
    fn random_uses_max_of_want_and_floor() {
        let footer = Footer::new(9000, Bytes::new());
        // scenario 5 from spec.md §8: position 5000, want 3000.
        let planned = plan(&opts(), Strategy::Random, 5000, 3000, Some(&footer));
        assert_eq!(planned, PlannedRange::Bounded(3000));
    }

    #[test]
    fn random_floor_applies_when_want_is_small() {
        let planned = plan(&opts(), Strategy::Random, 0, 10, None);
        assert_eq!(planned, PlannedRange::Bounded(2000));
    }

    #[test]
    fn auto_latches_to_random_on_disqualifying_seek() {
        let strategy = Strategy::initial(Fadvise::Auto);
        assert_eq!(strategy, Strategy::Sequential);
        let latched = strategy.after_seek(Fadvise::Auto, false);
        assert_eq!(latched, Strategy::Random);
        // one-way: further in-place-eligible seeks don't unlatch it.
        assert_eq!(latched.after_seek(Fadvise::Auto, true), Strategy::Random);
    }

    #[test]
    fn in_place_seek_does_not_latch() {
        let strategy = Strategy::initial(Fadvise::Auto);
        assert_eq!(strategy.after_seek(Fadvise::Auto, true), Strategy::Sequential);
    }
}
