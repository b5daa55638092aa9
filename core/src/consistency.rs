// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cross-artifact checks that keep a generated fixture set self-consistent.

use crate::{Slot, SpecSettings, SyncPeriod, Update};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyError {
    #[error(
        "initial sync period {initial} at slot {initial_slot} should be consistent with sync committee period {next} at slot {next_slot}"
    )]
    PeriodDrift {
        initial_slot: Slot,
        initial: SyncPeriod,
        next_slot: Slot,
        next: SyncPeriod,
    },
    #[error(
        "initial sync period {initial} should be consistent with finalized update period {finalized} (signature slot {signature_slot})"
    )]
    FinalizedPeriodMismatch {
        initial: SyncPeriod,
        finalized: SyncPeriod,
        signature_slot: Slot,
    },
    #[error("attested header slot {attested} should be greater than checkpoint slot {checkpoint}")]
    AttestedSlotNotAfterCheckpoint { attested: Slot, checkpoint: Slot },
    #[error("finalized header slot {0} is too low to select an execution header update slot")]
    FinalizedSlotTooLow(Slot),
}

/// Returns true iff both slots fall into the same sync committee period.
#[inline]
pub fn same_period(a: Slot, b: Slot, settings: &SpecSettings) -> bool {
    settings.compute_sync_period_at_slot(a) == settings.compute_sync_period_at_slot(b)
}

#[inline]
pub fn slot_after(a: Slot, b: Slot) -> bool {
    a > b
}

/// Checks that advancing from the checkpoint slot to `next_slot` does not
/// cross into the next sync committee period.
pub fn ensure_no_period_drift(
    checkpoint_slot: Slot,
    next_slot: Slot,
    settings: &SpecSettings,
) -> Result<(), ConsistencyError> {
    if same_period(checkpoint_slot, next_slot, settings) {
        return Ok(());
    }
    Err(ConsistencyError::PeriodDrift {
        initial_slot: checkpoint_slot,
        initial: settings.compute_sync_period_at_slot(checkpoint_slot),
        next_slot,
        next: settings.compute_sync_period_at_slot(next_slot),
    })
}

/// Checks a finality update against the checkpoint it follows: it has to be
/// signed within the checkpoint's sync committee period and attest a header
/// newer than the checkpoint.
pub fn ensure_finalized_update_follows(
    checkpoint_slot: Slot,
    update: &Update,
    settings: &SpecSettings,
) -> Result<(), ConsistencyError> {
    if !same_period(checkpoint_slot, update.signature_slot, settings) {
        return Err(ConsistencyError::FinalizedPeriodMismatch {
            initial: settings.compute_sync_period_at_slot(checkpoint_slot),
            finalized: settings.compute_sync_period_at_slot(update.signature_slot),
            signature_slot: update.signature_slot,
        });
    }
    if !slot_after(update.attested_header.slot, checkpoint_slot) {
        return Err(ConsistencyError::AttestedSlotNotAfterCheckpoint {
            attested: update.attested_header.slot,
            checkpoint: checkpoint_slot,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BeaconHeader;

    const MINIMAL: SpecSettings = SpecSettings::minimal();

    fn update(attested: Slot, signature: Slot) -> Update {
        Update {
            attested_header: BeaconHeader {
                slot: attested,
                ..Default::default()
            },
            signature_slot: signature,
            ..Default::default()
        }
    }

    #[test]
    fn same_period_within_and_across_boundary() {
        assert!(same_period(100, 105, &MINIMAL));
        assert!(same_period(64, 127, &MINIMAL));
        assert!(!same_period(127, 128, &MINIMAL));
        assert!(same_period(127, 128, &SpecSettings::mainnet()));
    }

    #[test]
    fn slot_after_is_strict() {
        assert!(slot_after(105, 100));
        assert!(!slot_after(100, 100));
        assert!(!slot_after(99, 100));
    }

    #[test]
    fn drift_names_both_periods() {
        assert_eq!(ensure_no_period_drift(100, 105, &MINIMAL), Ok(()));
        assert_eq!(
            ensure_no_period_drift(125, 130, &MINIMAL),
            Err(ConsistencyError::PeriodDrift {
                initial_slot: 125,
                initial: 1,
                next_slot: 130,
                next: 2,
            })
        );
    }

    #[test]
    fn finalized_update_checks() {
        assert_eq!(
            ensure_finalized_update_follows(100, &update(105, 106), &MINIMAL),
            Ok(())
        );
        assert_eq!(
            ensure_finalized_update_follows(100, &update(100, 106), &MINIMAL),
            Err(ConsistencyError::AttestedSlotNotAfterCheckpoint {
                attested: 100,
                checkpoint: 100,
            })
        );
        assert_eq!(
            ensure_finalized_update_follows(100, &update(130, 131), &MINIMAL),
            Err(ConsistencyError::FinalizedPeriodMismatch {
                initial: 1,
                finalized: 2,
                signature_slot: 131,
            })
        );
    }

    #[test]
    fn period_is_checked_before_slot_order() {
        let err = ensure_finalized_update_follows(100, &update(90, 200), &MINIMAL).unwrap_err();
        assert!(matches!(err, ConsistencyError::FinalizedPeriodMismatch { .. }));
    }
}
