#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]

use frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use sp_std::marker::PhantomData;

/// Weight functions needed for pallet_staking_module.
pub trait WeightInfo {
    fn create_node_operator(k: u32) -> Weight;
    fn add_validator_keys(k: u32) -> Weight;
    fn remove_keys(k: u32) -> Weight;
    fn deposit_bond() -> Weight;
    fn normalize_queue() -> Weight;
    fn clean_deposit_queue(n: u32) -> Weight;
    fn obtain_deposit_data(n: u32, s: u32) -> Weight;
    fn update_node_operator_counters(r: u32) -> Weight;
    fn update_target_validators_limits() -> Weight;
    fn submit_withdrawal() -> Weight;
    fn submit_initial_slashing() -> Weight;
    fn report_penalty() -> Weight;
    fn settle_penalty(r: u32) -> Weight;
    fn set_key_removal_charge() -> Weight;
}

/// Default weights for pallet_staking_module
pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: frame_system::Config> WeightInfo for SubstrateWeight<T> {
    // Operator record, node operator count, ledger, queue tail.
    fn create_node_operator(_k: u32) -> Weight {
        Weight::from_parts(40_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(5))
            .saturating_add(T::DbWeight::get().writes(7))
    }

    fn add_validator_keys(_k: u32) -> Weight {
        Weight::from_parts(30_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(5))
            .saturating_add(T::DbWeight::get().writes(5))
    }

    fn remove_keys(_k: u32) -> Weight {
        Weight::from_parts(30_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(4))
            .saturating_add(T::DbWeight::get().writes(3))
    }

    fn deposit_bond() -> Weight {
        Weight::from_parts(25_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(4))
            .saturating_add(T::DbWeight::get().writes(5))
    }

    fn normalize_queue() -> Weight {
        Weight::from_parts(20_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(4))
            .saturating_add(T::DbWeight::get().writes(5))
    }

    // One slot and one operator record per visited batch.
    fn clean_deposit_queue(n: u32) -> Weight {
        Weight::from_parts(10_000_000, 0)
            .saturating_add(Weight::from_parts(8_000_000, 0).saturating_mul(n as u64))
            .saturating_add(T::DbWeight::get().reads(1))
            .saturating_add(T::DbWeight::get().reads((2_u64).saturating_mul(n as u64)))
            .saturating_add(T::DbWeight::get().writes((2_u64).saturating_mul(n as u64)))
    }

    // Worst case is one batch per requested key, plus `s` skipped batches.
    fn obtain_deposit_data(n: u32, s: u32) -> Weight {
        Weight::from_parts(15_000_000, 0)
            .saturating_add(Weight::from_parts(9_000_000, 0).saturating_mul(n as u64))
            .saturating_add(Weight::from_parts(7_000_000, 0).saturating_mul(s as u64))
            .saturating_add(T::DbWeight::get().reads(4))
            .saturating_add(T::DbWeight::get().reads((2_u64).saturating_mul(n as u64)))
            .saturating_add(T::DbWeight::get().reads((2_u64).saturating_mul(s as u64)))
            .saturating_add(T::DbWeight::get().writes(4))
            .saturating_add(T::DbWeight::get().writes((2_u64).saturating_mul(n as u64)))
            .saturating_add(T::DbWeight::get().writes((2_u64).saturating_mul(s as u64)))
    }

    fn update_node_operator_counters(r: u32) -> Weight {
        Weight::from_parts(10_000_000, 0)
            .saturating_add(Weight::from_parts(12_000_000, 0).saturating_mul(r as u64))
            .saturating_add(T::DbWeight::get().reads((3_u64).saturating_mul(r as u64)))
            .saturating_add(T::DbWeight::get().writes((5_u64).saturating_mul(r as u64)))
    }

    fn update_target_validators_limits() -> Weight {
        Weight::from_parts(20_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(4))
            .saturating_add(T::DbWeight::get().writes(5))
    }

    fn submit_withdrawal() -> Weight {
        Weight::from_parts(25_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(5))
            .saturating_add(T::DbWeight::get().writes(6))
    }

    fn submit_initial_slashing() -> Weight {
        Weight::from_parts(25_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(5))
            .saturating_add(T::DbWeight::get().writes(5))
    }

    fn report_penalty() -> Weight {
        Weight::from_parts(25_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(5))
            .saturating_add(T::DbWeight::get().writes(5))
    }

    fn settle_penalty(r: u32) -> Weight {
        Weight::from_parts(10_000_000, 0)
            .saturating_add(Weight::from_parts(20_000_000, 0).saturating_mul(r as u64))
            .saturating_add(T::DbWeight::get().reads((4_u64).saturating_mul(r as u64)))
            .saturating_add(T::DbWeight::get().writes((4_u64).saturating_mul(r as u64)))
    }

    fn set_key_removal_charge() -> Weight {
        Weight::from_parts(10_000_000, 0).saturating_add(T::DbWeight::get().writes(1))
    }
}

impl WeightInfo for () {
    fn create_node_operator(_k: u32) -> Weight {
        Weight::from_parts(40_000_000, 0)
    }

    fn add_validator_keys(_k: u32) -> Weight {
        Weight::from_parts(30_000_000, 0)
    }

    fn remove_keys(_k: u32) -> Weight {
        Weight::from_parts(30_000_000, 0)
    }

    fn deposit_bond() -> Weight {
        Weight::from_parts(25_000_000, 0)
    }

    fn normalize_queue() -> Weight {
        Weight::from_parts(20_000_000, 0)
    }

    fn clean_deposit_queue(n: u32) -> Weight {
        Weight::from_parts(10_000_000, 0)
            .saturating_add(Weight::from_parts(8_000_000, 0).saturating_mul(n as u64))
    }

    fn obtain_deposit_data(n: u32, s: u32) -> Weight {
        Weight::from_parts(15_000_000, 0)
            .saturating_add(Weight::from_parts(9_000_000, 0).saturating_mul(n as u64))
            .saturating_add(Weight::from_parts(7_000_000, 0).saturating_mul(s as u64))
    }

    fn update_node_operator_counters(r: u32) -> Weight {
        Weight::from_parts(10_000_000, 0)
            .saturating_add(Weight::from_parts(12_000_000, 0).saturating_mul(r as u64))
    }

    fn update_target_validators_limits() -> Weight {
        Weight::from_parts(20_000_000, 0)
    }

    fn submit_withdrawal() -> Weight {
        Weight::from_parts(25_000_000, 0)
    }

    fn submit_initial_slashing() -> Weight {
        Weight::from_parts(25_000_000, 0)
    }

    fn report_penalty() -> Weight {
        Weight::from_parts(25_000_000, 0)
    }

    fn settle_penalty(r: u32) -> Weight {
        Weight::from_parts(10_000_000, 0)
            .saturating_add(Weight::from_parts(20_000_000, 0).saturating_mul(r as u64))
    }

    fn set_key_removal_charge() -> Weight {
        Weight::from_parts(10_000_000, 0)
    }
}
