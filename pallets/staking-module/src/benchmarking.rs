//! Benchmarking setup for pallet-staking-module
#![cfg(feature = "runtime-benchmarks")]
use super::*;

#[allow(unused)]
use crate::Pallet as StakingModule;
use frame_benchmarking::v2::*;
use frame_support::{traits::EnsureOrigin, BoundedVec};
use frame_system::RawOrigin;
use sp_std::vec::Vec;

/// Bond deposited per key so that every created key is depositable.
const BOND_PER_KEY: u128 = 1_000_000;

fn create_operators<T: Config>(count: u32, keys_count: u32) -> Result<(), BenchmarkError> {
	for i in 0..count {
		let manager: T::AccountId = account("manager", i, 0);
		StakingModule::<T>::create_node_operator(
			RawOrigin::Signed(manager).into(),
			keys_count,
			u128::from(keys_count).saturating_mul(BOND_PER_KEY),
		)?;
	}
	Ok(())
}

fn manager_of<T: Config>(node_operator_id: NodeOperatorId) -> Result<T::AccountId, BenchmarkError> {
	Ok(StakingModule::<T>::node_operator(node_operator_id)?.manager)
}

#[benchmarks]
mod benchmarks {
	use super::*;

	#[benchmark]
	fn create_node_operator(k: Linear<1, { T::MaxKeysPerCall::get() }>) -> Result<(), BenchmarkError> {
		let caller: T::AccountId = whitelisted_caller();

		#[extrinsic_call]
		_(RawOrigin::Signed(caller), k, u128::from(k).saturating_mul(BOND_PER_KEY));

		assert_eq!(NodeOperatorsCount::<T>::get(), 1);
		Ok(())
	}

	#[benchmark]
	fn add_validator_keys(k: Linear<1, { T::MaxKeysPerCall::get() }>) -> Result<(), BenchmarkError> {
		create_operators::<T>(1, 1)?;
		let manager = manager_of::<T>(0)?;
		StakingModule::<T>::deposit_bond(
			RawOrigin::Signed(manager.clone()).into(),
			0,
			u128::from(k).saturating_mul(BOND_PER_KEY),
		)?;

		#[extrinsic_call]
		_(RawOrigin::Signed(manager), 0, k);

		assert_eq!(StakingModule::<T>::node_operator(0)?.total_added_keys, k + 1);
		Ok(())
	}

	#[benchmark]
	fn remove_keys(k: Linear<1, { T::MaxKeysPerCall::get() }>) -> Result<(), BenchmarkError> {
		create_operators::<T>(1, k)?;
		let manager = manager_of::<T>(0)?;

		#[extrinsic_call]
		_(RawOrigin::Signed(manager), 0, 0, k);

		assert_eq!(StakingModule::<T>::node_operator(0)?.total_added_keys, 0);
		Ok(())
	}

	#[benchmark]
	fn deposit_bond() -> Result<(), BenchmarkError> {
		create_operators::<T>(1, 1)?;
		let caller: T::AccountId = whitelisted_caller();

		#[extrinsic_call]
		_(RawOrigin::Signed(caller), 0, BOND_PER_KEY);

		Ok(())
	}

	#[benchmark]
	fn normalize_queue() -> Result<(), BenchmarkError> {
		create_operators::<T>(1, 2)?;
		let manager = manager_of::<T>(0)?;

		#[extrinsic_call]
		_(RawOrigin::Signed(manager), 0);

		assert!(!DepositQueue::<T>::is_empty());
		Ok(())
	}

	// Every visited batch is invalid and gets removed.
	#[benchmark]
	fn clean_deposit_queue(n: Linear<1, 100>) -> Result<(), BenchmarkError> {
		create_operators::<T>(n, 1)?;
		for node_operator_id in 0..u64::from(n) {
			NodeOperators::<T>::mutate(node_operator_id, |maybe_operator| {
				if let Some(operator) = maybe_operator {
					operator.depositable_validators_count = 0;
				}
			});
		}
		DepositableValidatorsCount::<T>::put(0);
		let caller: T::AccountId = whitelisted_caller();

		#[extrinsic_call]
		_(RawOrigin::Signed(caller), n);

		assert!(DepositQueue::<T>::is_empty());
		Ok(())
	}

	// `s` batches without depositable keys at the head, then one single-key batch per deposit.
	#[benchmark]
	fn obtain_deposit_data(
		n: Linear<1, 100>,
		s: Linear<0, { T::MaxDepositQueueWalk::get() }>,
	) -> Result<(), BenchmarkError> {
		create_operators::<T>(s, 1)?;
		for node_operator_id in 0..u64::from(s) {
			NodeOperators::<T>::mutate(node_operator_id, |maybe_operator| {
				if let Some(operator) = maybe_operator {
					operator.depositable_validators_count = 0;
				}
			});
		}
		DepositableValidatorsCount::<T>::put(0);
		create_operators::<T>(n, 1)?;
		let origin =
			T::StakingRouterOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

		#[extrinsic_call]
		_(origin as T::RuntimeOrigin, n);

		assert_eq!(TotalDepositedValidators::<T>::get(), u64::from(n));
		assert!(DepositQueue::<T>::is_empty());
		Ok(())
	}

	#[benchmark]
	fn update_node_operator_counters(
		r: Linear<1, { T::MaxReportItems::get() }>,
	) -> Result<(), BenchmarkError> {
		create_operators::<T>(r, 2)?;
		StakingModule::<T>::do_obtain_deposit_data(r.saturating_mul(2))?;
		let mut reports = Vec::new();
		for node_operator_id in 0..u64::from(r) {
			reports.push((node_operator_id, 1u32));
		}
		let reports: BoundedVec<_, T::MaxReportItems> =
			reports.try_into().map_err(|_| BenchmarkError::Weightless)?;
		let origin =
			T::StakingRouterOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

		#[extrinsic_call]
		update_stuck_validators_count(origin as T::RuntimeOrigin, reports);

		assert_eq!(StakingModule::<T>::node_operator(0)?.stuck_validators_count, 1);
		Ok(())
	}

	#[benchmark]
	fn update_target_validators_limits() -> Result<(), BenchmarkError> {
		create_operators::<T>(1, 2)?;
		let origin =
			T::StakingRouterOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

		#[extrinsic_call]
		_(origin as T::RuntimeOrigin, 0, TargetLimitMode::Soft, 1);

		assert_eq!(StakingModule::<T>::node_operator(0)?.depositable_validators_count, 1);
		Ok(())
	}

	#[benchmark]
	fn submit_withdrawal() -> Result<(), BenchmarkError> {
		create_operators::<T>(1, 2)?;
		StakingModule::<T>::do_obtain_deposit_data(1)?;
		let origin =
			T::VerifierOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

		#[extrinsic_call]
		_(origin as T::RuntimeOrigin, 0, 0, 0);

		assert!(WithdrawnKeys::<T>::get(0, 0));
		Ok(())
	}

	#[benchmark]
	fn submit_initial_slashing() -> Result<(), BenchmarkError> {
		create_operators::<T>(1, 2)?;
		StakingModule::<T>::do_obtain_deposit_data(1)?;
		let origin =
			T::VerifierOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

		#[extrinsic_call]
		_(origin as T::RuntimeOrigin, 0, 0);

		assert!(SlashedKeys::<T>::get(0, 0));
		Ok(())
	}

	#[benchmark]
	fn report_penalty() -> Result<(), BenchmarkError> {
		create_operators::<T>(1, 2)?;
		let origin =
			T::PenaltyOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

		#[extrinsic_call]
		report_el_rewards_stealing_penalty(origin as T::RuntimeOrigin, 0, BOND_PER_KEY);

		Ok(())
	}

	#[benchmark]
	fn settle_penalty(r: Linear<1, { T::MaxReportItems::get() }>) -> Result<(), BenchmarkError> {
		create_operators::<T>(r, 2)?;
		let origin =
			T::PenaltyOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
		let mut node_operator_ids = Vec::new();
		for node_operator_id in 0..u64::from(r) {
			StakingModule::<T>::report_el_rewards_stealing_penalty(
				origin.clone(),
				node_operator_id,
				BOND_PER_KEY,
			)?;
			node_operator_ids.push(node_operator_id);
		}
		let node_operator_ids: BoundedVec<_, T::MaxReportItems> =
			node_operator_ids.try_into().map_err(|_| BenchmarkError::Weightless)?;

		#[extrinsic_call]
		settle_el_rewards_stealing_penalty(origin as T::RuntimeOrigin, node_operator_ids);

		Ok(())
	}

	#[benchmark]
	fn set_key_removal_charge() -> Result<(), BenchmarkError> {
		let origin =
			T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

		#[extrinsic_call]
		_(origin as T::RuntimeOrigin, 10);

		assert_eq!(KeyRemovalCharge::<T>::get(), 10);
		Ok(())
	}

	impl_benchmark_test_suite!(StakingModule, crate::mock::new_test_ext(), crate::mock::Test);
}
