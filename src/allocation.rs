// 🧭 Allocation Engine - Nearest eligible slot
//
// Pure function over caller-supplied candidates:
//   1. keep slots whose size tier >= vehicle size tier
//   2. pick the smallest distance to the entry point
//   3. ties go to the first candidate in the given order
//
// Size-match quality is never considered: a nearer large slot wins over a
// farther exact-size slot. Occupying the chosen slot is the caller's job.

use crate::entities::{EntryPoint, ParkingSlot, SizeTier};
use crate::error::ParkingError;

/// Choose the slot nearest to `entry_point` that can host `vehicle_size`
pub fn allocate<'a>(
    entry_point: EntryPoint,
    vehicle_size: SizeTier,
    candidates: &'a [ParkingSlot],
) -> Result<&'a ParkingSlot, ParkingError> {
    let mut best: Option<(&ParkingSlot, u32)> = None;

    for slot in candidates.iter().filter(|slot| slot.can_host(vehicle_size)) {
        let distance = slot
            .distance_from(entry_point)
            .ok_or(ParkingError::InvalidEntryPoint {
                entry_point,
                entry_points: slot.distances.len(),
            })?;

        // Strict comparison keeps the earliest candidate on ties
        match best {
            Some((_, best_distance)) if best_distance <= distance => {}
            _ => best = Some((slot, distance)),
        }
    }

    match best {
        Some((slot, distance)) => {
            log::debug!(
                "Allocated slot {} ({}) at distance {} from entry {} for {} vehicle",
                slot.id,
                slot.size,
                distance,
                entry_point,
                vehicle_size
            );
            Ok(slot)
        }
        None => Err(ParkingError::NoSlotAvailable { size: vehicle_size }),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn slot(id: i64, size: SizeTier, distances: &[u32]) -> ParkingSlot {
        ParkingSlot::new(id, size, distances.to_vec())
    }

    #[test]
    fn test_picks_nearest_to_entry_point() {
        let slots = vec![
            slot(1, SizeTier::Small, &[5, 1, 9, 4]),
            slot(2, SizeTier::Small, &[2, 8, 3, 4]),
            slot(3, SizeTier::Small, &[7, 3, 1, 4]),
        ];

        assert_eq!(allocate(0, SizeTier::Small, &slots).unwrap().id, 2);
        assert_eq!(allocate(1, SizeTier::Small, &slots).unwrap().id, 1);
        assert_eq!(allocate(2, SizeTier::Small, &slots).unwrap().id, 3);
    }

    #[test]
    fn test_skips_slots_too_small() {
        let slots = vec![
            slot(1, SizeTier::Small, &[1, 1, 1, 1]),
            slot(2, SizeTier::Medium, &[2, 2, 2, 2]),
            slot(3, SizeTier::Large, &[3, 3, 3, 3]),
        ];

        assert_eq!(allocate(0, SizeTier::Medium, &slots).unwrap().id, 2);
        assert_eq!(allocate(0, SizeTier::Large, &slots).unwrap().id, 3);
    }

    #[test]
    fn test_larger_slot_wins_when_nearer() {
        let slots = vec![
            slot(1, SizeTier::Small, &[6, 6, 6, 6]),
            slot(2, SizeTier::Large, &[2, 2, 2, 2]),
        ];

        assert_eq!(allocate(0, SizeTier::Small, &slots).unwrap().id, 2);
    }

    #[test]
    fn test_tie_goes_to_first_candidate() {
        let slots = vec![
            slot(9, SizeTier::Large, &[3, 0, 0, 0]),
            slot(4, SizeTier::Small, &[3, 0, 0, 0]),
            slot(1, SizeTier::Medium, &[3, 0, 0, 0]),
        ];

        assert_eq!(allocate(0, SizeTier::Small, &slots).unwrap().id, 9);
    }

    #[test]
    fn test_no_eligible_slot() {
        let slots = vec![slot(1, SizeTier::Small, &[1, 1, 1, 1])];

        let result = allocate(0, SizeTier::Large, &slots);
        assert!(matches!(
            result,
            Err(ParkingError::NoSlotAvailable { size: SizeTier::Large })
        ));

        let result = allocate(0, SizeTier::Small, &[]);
        assert!(matches!(result, Err(ParkingError::NoSlotAvailable { .. })));
    }

    #[test]
    fn test_entry_point_outside_distance_list() {
        let slots = vec![slot(1, SizeTier::Small, &[1, 1])];

        let result = allocate(3, SizeTier::Small, &slots);
        assert!(matches!(
            result,
            Err(ParkingError::InvalidEntryPoint { entry_point: 3, entry_points: 2 })
        ));
    }

    fn arb_tier() -> impl Strategy<Value = SizeTier> {
        prop_oneof![
            Just(SizeTier::Small),
            Just(SizeTier::Medium),
            Just(SizeTier::Large),
        ]
    }

    fn arb_slots() -> impl Strategy<Value = Vec<ParkingSlot>> {
        prop::collection::vec((arb_tier(), prop::collection::vec(0u32..50, 4)), 0..20).prop_map(
            |specs| {
                specs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (size, distances))| ParkingSlot::new(i as i64 + 1, size, distances))
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn prop_never_returns_undersized_slot(
            slots in arb_slots(),
            vehicle in arb_tier(),
            entry in 0usize..4,
        ) {
            if let Ok(chosen) = allocate(entry, vehicle, &slots) {
                prop_assert!(chosen.size >= vehicle);
            }
        }

        #[test]
        fn prop_result_is_first_minimum(
            slots in arb_slots(),
            vehicle in arb_tier(),
            entry in 0usize..4,
        ) {
            let eligible: Vec<&ParkingSlot> =
                slots.iter().filter(|s| s.size >= vehicle).collect();

            match allocate(entry, vehicle, &slots) {
                Ok(chosen) => {
                    let min = eligible.iter().map(|s| s.distances[entry]).min().unwrap();
                    let first = eligible.iter().find(|s| s.distances[entry] == min).unwrap();
                    prop_assert_eq!(chosen.id, first.id);

                    let again = allocate(entry, vehicle, &slots).unwrap();
                    prop_assert_eq!(chosen.id, again.id);
                }
                Err(ParkingError::NoSlotAvailable { .. }) => prop_assert!(eligible.is_empty()),
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }
}
