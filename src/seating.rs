//! Which device holds which seat.

use crate::action::Action;
use crate::error::SeatError;
use crate::group::DeviceId;
use crate::player::{SEATS, Seat};

/// Seat claims replayed from a game's log.
///
/// A seat is bound to the device that first claimed it with
/// [`Action::Sit`]. Every replica rebuilds the same claims from the same log
/// prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatClaims {
    holders: [Option<DeviceId>; SEATS],
}

impl SeatClaims {
    /// Returns the device holding a seat.
    #[must_use]
    pub fn holder(&self, seat: Seat) -> Option<&DeviceId> {
        self.holders.get(seat)?.as_ref()
    }

    /// Returns the seat a device holds.
    #[must_use]
    pub fn seat_of(&self, device: &DeviceId) -> Option<Seat> {
        self.holders
            .iter()
            .position(|holder| holder.as_ref() == Some(device))
    }

    /// Checks whether `device` may claim `seat`.
    ///
    /// Claiming a seat the device already holds is allowed.
    ///
    /// # Errors
    ///
    /// Returns an error if the seat does not exist, another device holds it,
    /// or the device holds a different seat.
    pub fn check_claim(&self, seat: Seat, device: &DeviceId) -> Result<(), SeatError> {
        let holder = self.holders.get(seat).ok_or(SeatError::NoSuchSeat)?;
        match holder {
            Some(holder) if holder == device => Ok(()),
            Some(_) => Err(SeatError::Taken),
            None if self.seat_of(device).is_some() => Err(SeatError::AlreadySeated),
            None => Ok(()),
        }
    }

    /// Checks whether `device` may author `action`.
    ///
    /// Seat-specific actions need the author to hold the seat; a
    /// [`Action::Sit`] needs the claim to be allowed. Other actions are open
    /// to every member.
    ///
    /// # Errors
    ///
    /// Returns the reason the author may not act.
    pub fn check_author(&self, action: &Action, device: &DeviceId) -> Result<(), SeatError> {
        match action {
            Action::Sit { seat } => self.check_claim(*seat, device),
            action => match action.seat() {
                Some(seat) if self.holder(seat) != Some(device) => Err(SeatError::NotYourSeat),
                _ => Ok(()),
            },
        }
    }

    /// Records a claim that passed [`SeatClaims::check_claim`].
    pub(crate) fn claim(&mut self, seat: Seat, device: DeviceId) {
        if let Some(holder) = self.holders.get_mut(seat) {
            *holder = Some(device);
        }
    }

    /// Releases every seat.
    pub(crate) fn clear(&mut self) {
        self.holders = Default::default();
    }
}
