//! The officer pool.
//!
//! Officers are kept in enlistment order and handed out first-idle-first, so
//! allocation is deterministic. The pool only grows; officers are never
//! removed during a session.

use precinct_types::{Officer, OfficerId, ReportId};
use rand::Rng;

use crate::error::DispatchError;

/// Every officer in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfficerPool {
    officers: Vec<Officer>,
}

impl OfficerPool {
    /// An empty pool.
    pub const fn new() -> Self {
        Self {
            officers: Vec::new(),
        }
    }

    /// Rebuild a pool from restored officers, keeping their order.
    pub const fn from_officers(officers: Vec<Officer>) -> Self {
        Self { officers }
    }

    /// Enlist `count` idle officers with IDs drawn from `rng`.
    ///
    /// Returns the new IDs in enlistment order.
    pub fn enlist<R: Rng + ?Sized>(&mut self, rng: &mut R, count: u32) -> Vec<OfficerId> {
        let ids: Vec<OfficerId> = (0..count)
            .map(|_| OfficerId::from_random_bytes(rng.random()))
            .collect();
        self.officers.extend(ids.iter().copied().map(Officer::new));
        ids
    }

    /// Add `additional` officers and return the new total.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidInput`] if `additional` is zero and
    /// [`DispatchError::ArithmeticOverflow`] if the total would not fit in a
    /// `u32`. The pool is unchanged on error.
    pub fn grow<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        additional: u32,
    ) -> Result<u32, DispatchError> {
        if additional == 0 {
            return Err(DispatchError::InvalidInput {
                reason: "pool upgrade must add at least one officer".to_owned(),
            });
        }
        let new_total = self
            .total()
            .checked_add(additional)
            .ok_or(DispatchError::ArithmeticOverflow {
                context: "officer pool size",
            })?;
        self.enlist(rng, additional);
        Ok(new_total)
    }

    /// Total officers, idle or not.
    pub fn total(&self) -> u32 {
        u32::try_from(self.officers.len()).unwrap_or(u32::MAX)
    }

    /// Officers not attached to any report.
    pub fn idle_count(&self) -> u32 {
        u32::try_from(self.available().count()).unwrap_or(u32::MAX)
    }

    /// Idle officers in enlistment order.
    pub fn available(&self) -> impl Iterator<Item = &Officer> {
        self.officers.iter().filter(|o| o.is_available())
    }

    /// The idle officer the allocator hands out next.
    pub fn first_idle(&self) -> Option<OfficerId> {
        self.available().next().map(|o| o.id)
    }

    /// Every officer in enlistment order.
    pub fn iter(&self) -> impl Iterator<Item = &Officer> {
        self.officers.iter()
    }

    /// Look up an officer.
    pub fn get(&self, id: OfficerId) -> Option<&Officer> {
        self.officers.iter().find(|o| o.id == id)
    }

    /// Attach an idle officer to `report`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NotFound`] for an unknown officer and
    /// [`DispatchError::InvalidState`] if the officer is already attached.
    pub fn attach(&mut self, id: OfficerId, report: ReportId) -> Result<&Officer, DispatchError> {
        let officer = self
            .officers
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(DispatchError::officer_not_found(id))?;
        if let Some(current) = officer.assignment {
            return Err(DispatchError::InvalidState {
                reason: format!("officer {id} is already assigned to report {current}"),
            });
        }
        officer.assignment = Some(report);
        Ok(officer)
    }

    /// Return an officer to the idle pool. Returns `false` if the officer is
    /// unknown or already idle.
    pub fn release(&mut self, id: OfficerId) -> bool {
        self.officers
            .iter_mut()
            .find(|o| o.id == id)
            .and_then(|o| o.assignment.take())
            .is_some()
    }
}
