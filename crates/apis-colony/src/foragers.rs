//! The forager pool.
//!
//! Workers that finish the in-hive stage are recruited into an age-indexed
//! pool kept outside the [`CohortLedger`](crate::cohorts::CohortLedger).
//! Foragers carry two dose vectors: oral uptake from the stores, and contact
//! exposure picked up in the field. Both are assessed by mortality and reset
//! afterwards. A forager that reaches the end of the pool dies of age.

use crate::dose::DoseArray;

/// Age-indexed foragers with their pending doses.
#[derive(Debug, Clone, PartialEq)]
pub struct ForagerPool {
    counts: Vec<u32>,
    oral: DoseArray,
    contact: DoseArray,
}

impl ForagerPool {
    /// Create an empty pool where foragers live `days` days.
    pub fn new(days: u32) -> Self {
        let len = (days as usize).max(1);
        Self {
            counts: vec![0; len],
            oral: DoseArray::new(len),
            contact: DoseArray::new(len),
        }
    }

    /// Spread `total` foragers evenly over the youngest `span` ages.
    ///
    /// Any remainder goes to the youngest ages, one each.
    pub fn seed(&mut self, total: u32, span: u32) {
        let span = (span as usize).clamp(1, self.counts.len());
        let Ok(divisor) = u32::try_from(span) else {
            return;
        };
        let share = total.checked_div(divisor).unwrap_or(0);
        let remainder = total.checked_rem(divisor).unwrap_or(0) as usize;
        for (age, slot) in self.counts.iter_mut().take(span).enumerate() {
            let extra = u32::from(age < remainder);
            *slot = slot.saturating_add(share).saturating_add(extra);
        }
    }

    /// Head counts, youngest first.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Mutable head counts, youngest first.
    pub fn counts_mut(&mut self) -> &mut [u32] {
        &mut self.counts
    }

    /// Total foragers.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Pending oral doses.
    pub const fn oral(&self) -> &DoseArray {
        &self.oral
    }

    /// Mutable pending oral doses.
    pub const fn oral_mut(&mut self) -> &mut DoseArray {
        &mut self.oral
    }

    /// Pending contact doses.
    pub const fn contact(&self) -> &DoseArray {
        &self.contact
    }

    /// Split borrows for mortality: counts with both dose arrays.
    pub fn parts_mut(&mut self) -> (&mut [u32], &mut DoseArray, &mut DoseArray) {
        (&mut self.counts, &mut self.oral, &mut self.contact)
    }

    /// Age every forager by one day. Returns the number that died of age.
    pub fn age(&mut self) -> u32 {
        let retired = match self.counts.last_mut() {
            Some(oldest) => core::mem::take(oldest),
            None => 0,
        };
        self.counts.rotate_right(1);
        self.oral.shift();
        self.contact.shift();
        retired
    }

    /// Recruit in-hive graduates at age 0 with the oral dose they carried.
    pub fn recruit(&mut self, count: u32, carried_dose: f64) {
        let Some(youngest) = self.counts.first_mut() else {
            return;
        };
        let existing = *youngest;
        *youngest = existing.saturating_add(count);
        if count == 0 {
            return;
        }
        let total = f64::from(existing) + f64::from(count);
        let blended = self
            .oral
            .get(0)
            .mul_add(f64::from(existing), carried_dose * f64::from(count))
            / total;
        if let Some(slot) = self.oral.doses_mut().first_mut() {
            *slot = blended;
        }
    }

    /// Add the same contact dose to every living forager.
    ///
    /// Returns the toxicant mass absorbed by the pool.
    pub fn expose_contact(&mut self, dose: f64) -> f64 {
        let mut mass = 0.0;
        for (slot, &count) in self.contact.doses_mut().iter_mut().zip(&self.counts) {
            if count > 0 {
                *slot += dose;
                mass += dose * f64::from(count);
            }
        }
        mass
    }

    /// Count-weighted mean oral dose.
    pub fn mean_oral_dose(&self) -> f64 {
        self.oral.weighted_mean(&self.counts)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn seed_spreads_evenly_with_remainder_to_youngest() {
        let mut pool = ForagerPool::new(10);
        pool.seed(11, 4);
        assert_eq!(pool.counts().get(..5).unwrap(), &[3, 3, 3, 2, 0]);
        assert_eq!(pool.total(), 11);
    }

    #[test]
    fn oldest_foragers_retire_on_aging() {
        let mut pool = ForagerPool::new(3);
        pool.counts_mut().copy_from_slice(&[1, 2, 3]);
        assert_eq!(pool.age(), 3);
        assert_eq!(pool.counts(), &[0, 1, 2]);
    }

    #[test]
    fn recruits_keep_their_dose() {
        let mut pool = ForagerPool::new(5);
        pool.age();
        pool.recruit(4, 2.5);
        assert_eq!(pool.counts().first(), Some(&4));
        assert!((pool.oral().get(0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn contact_exposure_only_reaches_living_foragers() {
        let mut pool = ForagerPool::new(3);
        pool.counts_mut().copy_from_slice(&[2, 0, 3]);
        let mass = pool.expose_contact(0.5);
        assert!((mass - 2.5).abs() < 1e-12);
        assert_eq!(pool.contact().doses(), &[0.5, 0.0, 0.5]);
    }
}
