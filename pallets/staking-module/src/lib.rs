//! # Staking Module Pallet
//!
//! ## Overview
//!
//! Admits node operators into a shared staking pool and decides which of their validator keys
//! may receive a deposit next.
//!
//! Depositable capacity is kept in a FIFO deposit queue of [`Batch`]es, each one saying "N keys
//! of operator O". Whenever an operator's depositable count grows, the missing keys are appended
//! as a new batch. When it shrinks, stale batches stay in place until
//! [`Pallet::clean_deposit_queue`] walks a bounded prefix of the queue and unlinks them.
//!
//! ### Goals
//!
//! * Deposits are served in queue order and never exceed an operator's depositable count.
//! * Invalidating capacity never costs more than the caller-supplied walk depth.
//!
//! ## Interface
//!
//! ### Operator Functions
//!
//! - `create_node_operator`, `add_validator_keys`, `remove_keys`, `normalize_queue`,
//!   `compensate_el_rewards_stealing_penalty`
//!
//! ### Protocol Functions
//!
//! - Staking router: `obtain_deposit_data`, `decrease_vetted_signing_keys_count`,
//!   `update_stuck_validators_count`, `update_exited_validators_count`,
//!   `unsafe_update_validators_count`, `update_target_validators_limits`
//! - Verifier: `submit_withdrawal`, `submit_initial_slashing`
//! - Penalties: `report_el_rewards_stealing_penalty`, `cancel_el_rewards_stealing_penalty`,
//!   `settle_el_rewards_stealing_penalty`
//!
//! ### Permissionless Functions
//!
//! - `deposit_bond`, `clean_deposit_queue`

#![cfg_attr(not(feature = "std"), no_std)]

pub use pallet::*;
pub use types::*;

#[cfg(test)]
mod mock;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod batch;
pub mod queue;
pub mod traits;
mod types;
pub mod weights;

pub use batch::Batch;
pub use queue::DepositQueue;
pub use traits::{BondLedger, NodeOperatorKeys, StakingModuleInterface};
pub use weights::WeightInfo;

#[frame_support::pallet]
pub mod pallet {
	use super::*;
	use frame_support::{pallet_prelude::*, storage::with_storage_layer};
	use frame_system::pallet_prelude::*;
	use sp_std::vec::Vec;

	#[pallet::pallet]
	pub struct Pallet<T>(_);

	#[pallet::config]
	pub trait Config: frame_system::Config {
		type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

		/// Weight information for extrinsics in this pallet.
		type WeightInfo: WeightInfo;

		/// Collateral ledger deciding how many keys are bonded.
		type BondLedger: BondLedger<Self::AccountId>;

		/// Allocates deposits and reports vetting, exits and target limits.
		type StakingRouterOrigin: EnsureOrigin<Self::RuntimeOrigin>;

		/// Reports proven withdrawals and slashings.
		type VerifierOrigin: EnsureOrigin<Self::RuntimeOrigin>;

		/// Reports, cancels and settles execution layer rewards stealing penalties.
		type PenaltyOrigin: EnsureOrigin<Self::RuntimeOrigin>;

		/// Sudo/admin origin for pallet parameters.
		type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

		/// Full validator balance. Withdrawals below it are penalized by the difference.
		#[pallet::constant]
		type DepositSize: Get<u128>;

		#[pallet::constant]
		type InitialSlashingPenalty: Get<u128>;

		/// Added on top of every reported rewards stealing amount.
		#[pallet::constant]
		type ElRewardsStealingFine: Get<u128>;

		/// Max keys added or removed in a single call.
		#[pallet::constant]
		type MaxKeysPerCall: Get<u32>;

		/// Max entries in a single batched report.
		#[pallet::constant]
		type MaxReportItems: Get<u32>;

		/// Max batches without depositable keys that deposit allocation may skip in one call.
		#[pallet::constant]
		type MaxDepositQueueWalk: Get<u32>;
	}

	#[pallet::storage]
	#[pallet::getter(fn node_operators)]
	pub type NodeOperators<T: Config> =
		StorageMap<_, Blake2_128Concat, NodeOperatorId, NodeOperator<T::AccountId>, OptionQuery>;

	#[pallet::storage]
	pub type NodeOperatorsCount<T> = StorageValue<_, u64, ValueQuery>;

	/// Slot index of the next batch to be consumed.
	#[pallet::storage]
	pub type DepositQueueHead<T> = StorageValue<_, u128, ValueQuery>;

	/// Number of batches ever appended, which is also the next free slot.
	#[pallet::storage]
	pub type DepositQueueLength<T> = StorageValue<_, u128, ValueQuery>;

	#[pallet::storage]
	pub type DepositQueueItems<T> = StorageMap<_, Blake2_128Concat, u128, Batch, ValueQuery>;

	/// Sum of `depositable_validators_count` over all operators.
	#[pallet::storage]
	pub type DepositableValidatorsCount<T> = StorageValue<_, u64, ValueQuery>;

	#[pallet::storage]
	pub type TotalDepositedValidators<T> = StorageValue<_, u64, ValueQuery>;

	#[pallet::storage]
	pub type TotalExitedValidators<T> = StorageValue<_, u64, ValueQuery>;

	/// Bumped on every change the staking router should react to.
	#[pallet::storage]
	pub type ModuleNonce<T> = StorageValue<_, u64, ValueQuery>;

	/// Fee charged from the bond per removed key.
	#[pallet::storage]
	#[pallet::getter(fn key_removal_charge)]
	pub type KeyRemovalCharge<T> = StorageValue<_, u128, ValueQuery>;

	#[pallet::storage]
	pub type WithdrawnKeys<T> = StorageDoubleMap<
		_,
		Blake2_128Concat,
		NodeOperatorId,
		Blake2_128Concat,
		u32, // key index
		bool,
		ValueQuery,
	>;

	#[pallet::storage]
	pub type SlashedKeys<T> = StorageDoubleMap<
		_,
		Blake2_128Concat,
		NodeOperatorId,
		Blake2_128Concat,
		u32, // key index
		bool,
		ValueQuery,
	>;

	#[pallet::genesis_config]
	#[derive(frame_support::DefaultNoBound)]
	pub struct GenesisConfig<T: Config> {
		pub key_removal_charge: u128,
		#[serde(skip)]
		pub _config: sp_std::marker::PhantomData<T>,
	}

	#[pallet::genesis_build]
	impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
		fn build(&self) {
			KeyRemovalCharge::<T>::put(self.key_removal_charge);
		}
	}

	#[pallet::event]
	#[pallet::generate_deposit(pub(super) fn deposit_event)]
	pub enum Event<T: Config> {
		NodeOperatorAdded { node_operator_id: NodeOperatorId, manager: T::AccountId },
		TotalSigningKeysCountChanged { node_operator_id: NodeOperatorId, total_keys_count: u32 },
		VettedSigningKeysCountChanged { node_operator_id: NodeOperatorId, vetted_keys_count: u32 },
		/// Vetted keys were cut by the staking router.
		VettedSigningKeysCountDecreased { node_operator_id: NodeOperatorId },
		SigningKeysRemoved { node_operator_id: NodeOperatorId, start_index: u32, keys_count: u32 },
		DepositedSigningKeysCountChanged {
			node_operator_id: NodeOperatorId,
			deposited_keys_count: u32,
		},
		DepositableSigningKeysCountChanged {
			node_operator_id: NodeOperatorId,
			depositable_keys_count: u32,
		},
		StuckSigningKeysCountChanged { node_operator_id: NodeOperatorId, stuck_keys_count: u32 },
		ExitedSigningKeysCountChanged { node_operator_id: NodeOperatorId, exited_keys_count: u32 },
		TargetValidatorsCountChanged {
			node_operator_id: NodeOperatorId,
			mode: TargetLimitMode,
			target_limit: u32,
		},
		WithdrawalSubmitted { node_operator_id: NodeOperatorId, key_index: u32, amount: u128 },
		InitialSlashingSubmitted { node_operator_id: NodeOperatorId, key_index: u32 },
		BondDeposited { node_operator_id: NodeOperatorId, from: T::AccountId, amount: u128 },
		ElRewardsStealingPenaltyReported { node_operator_id: NodeOperatorId, amount: u128 },
		ElRewardsStealingPenaltyCancelled { node_operator_id: NodeOperatorId, amount: u128 },
		ElRewardsStealingPenaltySettled { node_operator_id: NodeOperatorId },
		ElRewardsStealingPenaltyCompensated { node_operator_id: NodeOperatorId, amount: u128 },
		/// A batch of keys was appended to the deposit queue.
		BatchEnqueued { node_operator_id: NodeOperatorId, count: u32 },
		/// Invalid batches were unlinked from the deposit queue.
		DepositQueueCleaned { removed: u32 },
		DepositDataObtained { deposits_count: u32 },
		KeyRemovalChargeSet { amount: u128 },
		NonceChanged { nonce: u64 },
	}

	#[pallet::error]
	pub enum Error<T> {
		/// The deposit queue has no batch at its head
		QueueIsEmpty,
		/// Queue walk requested with a zero depth
		QueueLookupNoLimit,
		NodeOperatorDoesNotExist,
		/// Sender is not the manager of the node operator
		SenderIsNotManager,
		/// Zero keys or more than `MaxKeysPerCall`
		InvalidKeysCount,
		KeysCountOverflow,
		/// Key range touches deposited keys or goes past the added keys
		SigningKeysInvalidOffset,
		InvalidVetKeysPointer,
		StuckKeysHigherThanNonExited,
		ExitedKeysHigherThanTotalDeposited,
		ExitedKeysDecrease,
		/// The queue cannot serve the requested number of deposits
		NotEnoughKeys,
		/// Too many batches without depositable keys at the head, clean the queue first
		DepositQueueWalkLimitReached,
		/// Withdrawal or slashing already reported for this key
		AlreadySubmitted,
		InvalidAmount,
		/// More keys would leave the queue than are accounted for the operator
		EnqueuedCountMismatch,
	}

	#[pallet::hooks]
	impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
		#[cfg(feature = "try-runtime")]
		fn try_state(_n: BlockNumberFor<T>) -> Result<(), sp_runtime::TryRuntimeError> {
			Self::do_try_state()
		}
	}

	#[pallet::call]
	impl<T: Config> Pallet<T> {
		/// Registers a new node operator managed by the sender, deposits its initial bond and
		/// uploads its first keys.
		#[pallet::call_index(0)]
		#[pallet::weight(T::WeightInfo::create_node_operator(*keys_count))]
		pub fn create_node_operator(
			origin: OriginFor<T>,
			keys_count: u32,
			bond: u128,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;

			let node_operator_id = NodeOperatorsCount::<T>::get();
			NodeOperators::<T>::insert(node_operator_id, NodeOperator::new(who.clone()));
			NodeOperatorsCount::<T>::put(node_operator_id.saturating_add(1));
			Self::deposit_event(Event::NodeOperatorAdded {
				node_operator_id,
				manager: who.clone(),
			});

			if bond > 0 {
				T::BondLedger::deposit_bond(&who, node_operator_id, bond)?;
				Self::deposit_event(Event::BondDeposited { node_operator_id, from: who, amount: bond });
			}

			Self::add_keys(node_operator_id, keys_count)
		}

		/// Uploads more keys for an existing node operator.
		#[pallet::call_index(1)]
		#[pallet::weight(T::WeightInfo::add_validator_keys(*keys_count))]
		pub fn add_validator_keys(
			origin: OriginFor<T>,
			node_operator_id: NodeOperatorId,
			keys_count: u32,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;
			Self::ensure_manager(&who, node_operator_id)?;

			Self::add_keys(node_operator_id, keys_count)
		}

		/// Removes `keys_count` not yet deposited keys starting at `start_index`.
		///
		/// Charges `KeyRemovalCharge` per key and resets vetting to all remaining keys.
		#[pallet::call_index(2)]
		#[pallet::weight(T::WeightInfo::remove_keys(*keys_count))]
		pub fn remove_keys(
			origin: OriginFor<T>,
			node_operator_id: NodeOperatorId,
			start_index: u32,
			keys_count: u32,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;
			let mut operator = Self::ensure_manager(&who, node_operator_id)?;

			ensure!(
				keys_count > 0 && keys_count <= T::MaxKeysPerCall::get(),
				Error::<T>::InvalidKeysCount
			);
			ensure!(start_index >= operator.total_deposited_keys, Error::<T>::SigningKeysInvalidOffset);
			let end = start_index.checked_add(keys_count).ok_or(Error::<T>::SigningKeysInvalidOffset)?;
			ensure!(end <= operator.total_added_keys, Error::<T>::SigningKeysInvalidOffset);

			let charge = KeyRemovalCharge::<T>::get().saturating_mul(u128::from(keys_count));
			if charge > 0 {
				T::BondLedger::charge_fee(node_operator_id, charge)?;
			}

			operator.total_added_keys = operator.total_added_keys.saturating_sub(keys_count);
			operator.total_vetted_keys = operator.total_added_keys;
			let total_keys_count = operator.total_added_keys;
			NodeOperators::<T>::insert(node_operator_id, operator);

			Self::deposit_event(Event::SigningKeysRemoved { node_operator_id, start_index, keys_count });
			Self::deposit_event(Event::TotalSigningKeysCountChanged {
				node_operator_id,
				total_keys_count,
			});
			Self::deposit_event(Event::VettedSigningKeysCountChanged {
				node_operator_id,
				vetted_keys_count: total_keys_count,
			});
			Self::increment_module_nonce();

			Self::update_depositable_validators_count(node_operator_id)
		}

		/// Tops up the bond of a node operator from the sender.
		#[pallet::call_index(3)]
		#[pallet::weight(T::WeightInfo::deposit_bond())]
		pub fn deposit_bond(
			origin: OriginFor<T>,
			node_operator_id: NodeOperatorId,
			amount: u128,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;
			Self::node_operator(node_operator_id)?;
			ensure!(amount > 0, Error::<T>::InvalidAmount);

			T::BondLedger::deposit_bond(&who, node_operator_id, amount)?;
			Self::deposit_event(Event::BondDeposited { node_operator_id, from: who, amount });

			Self::update_depositable_validators_count(node_operator_id)
		}

		/// Recomputes the depositable count and appends any keys not yet in the queue.
		#[pallet::call_index(4)]
		#[pallet::weight(T::WeightInfo::normalize_queue())]
		pub fn normalize_queue(
			origin: OriginFor<T>,
			node_operator_id: NodeOperatorId,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;
			Self::ensure_manager(&who, node_operator_id)?;

			Self::update_depositable_validators_count(node_operator_id)?;
			Self::enqueue_node_operator_keys(node_operator_id)
		}

		/// Walks up to `max_items` batches from the head and unlinks the ones no longer backed
		/// by depositable keys.
		#[pallet::call_index(5)]
		#[pallet::weight(T::WeightInfo::clean_deposit_queue(*max_items))]
		pub fn clean_deposit_queue(origin: OriginFor<T>, max_items: u32) -> DispatchResult {
			// Permissionless - anyone can clean the queue
			let _who = ensure_signed(origin)?;

			let removed = DepositQueue::<T>::clean(max_items)?;
			if removed > 0 {
				Self::deposit_event(Event::DepositQueueCleaned { removed });
			}
			Ok(())
		}

		/// Hands out the next `deposits_count` keys in queue order.
		#[pallet::call_index(6)]
		#[pallet::weight(T::WeightInfo::obtain_deposit_data(
			*deposits_count,
			T::MaxDepositQueueWalk::get()
		))]
		pub fn obtain_deposit_data(
			origin: OriginFor<T>,
			deposits_count: u32,
		) -> DispatchResultWithPostInfo {
			T::StakingRouterOrigin::ensure_origin(origin)?;

			let (_, skipped) = Self::allocate_deposits(deposits_count)?;
			Self::deposit_event(Event::DepositDataObtained { deposits_count });
			Ok(Some(T::WeightInfo::obtain_deposit_data(deposits_count, skipped)).into())
		}

		#[pallet::call_index(7)]
		#[pallet::weight(T::WeightInfo::update_node_operator_counters(reports.len() as u32))]
		pub fn decrease_vetted_signing_keys_count(
			origin: OriginFor<T>,
			reports: BoundedVec<(NodeOperatorId, u32), T::MaxReportItems>,
		) -> DispatchResult {
			T::StakingRouterOrigin::ensure_origin(origin)?;

			for (node_operator_id, vetted_keys_count) in reports {
				let mut operator = Self::node_operator(node_operator_id)?;
				ensure!(
					vetted_keys_count < operator.total_vetted_keys &&
						vetted_keys_count >= operator.total_deposited_keys,
					Error::<T>::InvalidVetKeysPointer
				);

				operator.total_vetted_keys = vetted_keys_count;
				NodeOperators::<T>::insert(node_operator_id, operator);

				Self::deposit_event(Event::VettedSigningKeysCountChanged {
					node_operator_id,
					vetted_keys_count,
				});
				Self::deposit_event(Event::VettedSigningKeysCountDecreased { node_operator_id });
				Self::update_depositable_validators_count(node_operator_id)?;
			}

			Self::increment_module_nonce();
			Ok(())
		}

		#[pallet::call_index(8)]
		#[pallet::weight(T::WeightInfo::update_node_operator_counters(reports.len() as u32))]
		pub fn update_stuck_validators_count(
			origin: OriginFor<T>,
			reports: BoundedVec<(NodeOperatorId, u32), T::MaxReportItems>,
		) -> DispatchResult {
			T::StakingRouterOrigin::ensure_origin(origin)?;

			for (node_operator_id, stuck_keys_count) in reports {
				Self::do_update_stuck_validators_count(node_operator_id, stuck_keys_count)?;
			}

			Self::increment_module_nonce();
			Ok(())
		}

		#[pallet::call_index(9)]
		#[pallet::weight(T::WeightInfo::update_node_operator_counters(reports.len() as u32))]
		pub fn update_exited_validators_count(
			origin: OriginFor<T>,
			reports: BoundedVec<(NodeOperatorId, u32), T::MaxReportItems>,
		) -> DispatchResult {
			T::StakingRouterOrigin::ensure_origin(origin)?;

			for (node_operator_id, exited_keys_count) in reports {
				Self::do_update_exited_validators_count(node_operator_id, exited_keys_count, false)?;
			}

			Self::increment_module_nonce();
			Ok(())
		}

		/// Overrides exited and stuck counters, allowing the exited count to go down.
		#[pallet::call_index(10)]
		#[pallet::weight(T::WeightInfo::update_node_operator_counters(1))]
		pub fn unsafe_update_validators_count(
			origin: OriginFor<T>,
			node_operator_id: NodeOperatorId,
			exited_keys_count: u32,
			stuck_keys_count: u32,
		) -> DispatchResult {
			T::StakingRouterOrigin::ensure_origin(origin)?;

			Self::do_update_exited_validators_count(node_operator_id, exited_keys_count, true)?;
			Self::do_update_stuck_validators_count(node_operator_id, stuck_keys_count)?;

			Self::increment_module_nonce();
			Ok(())
		}

		#[pallet::call_index(11)]
		#[pallet::weight(T::WeightInfo::update_target_validators_limits())]
		pub fn update_target_validators_limits(
			origin: OriginFor<T>,
			node_operator_id: NodeOperatorId,
			mode: TargetLimitMode,
			target_limit: u32,
		) -> DispatchResult {
			T::StakingRouterOrigin::ensure_origin(origin)?;
			let mut operator = Self::node_operator(node_operator_id)?;

			let target_limit = if mode.is_active() { target_limit } else { 0 };
			if operator.target_limit_mode == mode && operator.target_limit == target_limit {
				return Ok(());
			}

			operator.target_limit_mode = mode;
			operator.target_limit = target_limit;
			NodeOperators::<T>::insert(node_operator_id, operator);

			Self::deposit_event(Event::TargetValidatorsCountChanged {
				node_operator_id,
				mode,
				target_limit,
			});
			Self::update_depositable_validators_count(node_operator_id)?;
			Self::increment_module_nonce();
			Ok(())
		}

		/// Records the withdrawal of a deposited key. A balance below `DepositSize` is
		/// penalized by the shortfall.
		#[pallet::call_index(12)]
		#[pallet::weight(T::WeightInfo::submit_withdrawal())]
		pub fn submit_withdrawal(
			origin: OriginFor<T>,
			node_operator_id: NodeOperatorId,
			key_index: u32,
			amount: u128,
		) -> DispatchResult {
			T::VerifierOrigin::ensure_origin(origin)?;
			let mut operator = Self::node_operator(node_operator_id)?;

			ensure!(key_index < operator.total_deposited_keys, Error::<T>::SigningKeysInvalidOffset);
			ensure!(
				!WithdrawnKeys::<T>::get(node_operator_id, key_index),
				Error::<T>::AlreadySubmitted
			);

			WithdrawnKeys::<T>::insert(node_operator_id, key_index, true);
			operator.total_withdrawn_keys = operator.total_withdrawn_keys.saturating_add(1);
			NodeOperators::<T>::insert(node_operator_id, operator);
			Self::deposit_event(Event::WithdrawalSubmitted { node_operator_id, key_index, amount });

			let deposit_size = T::DepositSize::get();
			if amount < deposit_size {
				T::BondLedger::penalize(node_operator_id, deposit_size - amount)?;
			}

			Self::update_depositable_validators_count(node_operator_id)
		}

		#[pallet::call_index(13)]
		#[pallet::weight(T::WeightInfo::submit_initial_slashing())]
		pub fn submit_initial_slashing(
			origin: OriginFor<T>,
			node_operator_id: NodeOperatorId,
			key_index: u32,
		) -> DispatchResult {
			T::VerifierOrigin::ensure_origin(origin)?;
			let operator = Self::node_operator(node_operator_id)?;

			ensure!(key_index < operator.total_deposited_keys, Error::<T>::SigningKeysInvalidOffset);
			ensure!(
				!SlashedKeys::<T>::get(node_operator_id, key_index),
				Error::<T>::AlreadySubmitted
			);

			SlashedKeys::<T>::insert(node_operator_id, key_index, true);
			Self::deposit_event(Event::InitialSlashingSubmitted { node_operator_id, key_index });

			T::BondLedger::penalize(node_operator_id, T::InitialSlashingPenalty::get())?;

			Self::update_depositable_validators_count(node_operator_id)
		}

		/// Locks `amount` plus the fixed fine from the operator's bond.
		#[pallet::call_index(14)]
		#[pallet::weight(T::WeightInfo::report_penalty())]
		pub fn report_el_rewards_stealing_penalty(
			origin: OriginFor<T>,
			node_operator_id: NodeOperatorId,
			amount: u128,
		) -> DispatchResult {
			T::PenaltyOrigin::ensure_origin(origin)?;
			Self::node_operator(node_operator_id)?;
			ensure!(amount > 0, Error::<T>::InvalidAmount);

			T::BondLedger::lock_bond(
				node_operator_id,
				amount.saturating_add(T::ElRewardsStealingFine::get()),
			)?;
			Self::deposit_event(Event::ElRewardsStealingPenaltyReported { node_operator_id, amount });

			Self::update_depositable_validators_count(node_operator_id)
		}

		#[pallet::call_index(15)]
		#[pallet::weight(T::WeightInfo::report_penalty())]
		pub fn cancel_el_rewards_stealing_penalty(
			origin: OriginFor<T>,
			node_operator_id: NodeOperatorId,
			amount: u128,
		) -> DispatchResult {
			T::PenaltyOrigin::ensure_origin(origin)?;
			Self::node_operator(node_operator_id)?;

			T::BondLedger::release_locked_bond(node_operator_id, amount)?;
			Self::deposit_event(Event::ElRewardsStealingPenaltyCancelled {
				node_operator_id,
				amount,
			});

			Self::update_depositable_validators_count(node_operator_id)
		}

		#[pallet::call_index(16)]
		#[pallet::weight(T::WeightInfo::settle_penalty(node_operator_ids.len() as u32))]
		pub fn settle_el_rewards_stealing_penalty(
			origin: OriginFor<T>,
			node_operator_ids: BoundedVec<NodeOperatorId, T::MaxReportItems>,
		) -> DispatchResult {
			T::PenaltyOrigin::ensure_origin(origin)?;

			for node_operator_id in node_operator_ids {
				Self::node_operator(node_operator_id)?;
				if T::BondLedger::settle_locked_bond(node_operator_id) {
					Self::deposit_event(Event::ElRewardsStealingPenaltySettled { node_operator_id });
					Self::update_depositable_validators_count(node_operator_id)?;
				}
			}
			Ok(())
		}

		/// Pays a locked penalty from the sender instead of the bond.
		#[pallet::call_index(17)]
		#[pallet::weight(T::WeightInfo::report_penalty())]
		pub fn compensate_el_rewards_stealing_penalty(
			origin: OriginFor<T>,
			node_operator_id: NodeOperatorId,
			amount: u128,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;
			Self::ensure_manager(&who, node_operator_id)?;
			ensure!(amount > 0, Error::<T>::InvalidAmount);

			T::BondLedger::compensate_locked_bond(&who, node_operator_id, amount)?;
			Self::deposit_event(Event::ElRewardsStealingPenaltyCompensated {
				node_operator_id,
				amount,
			});

			Self::update_depositable_validators_count(node_operator_id)
		}

		#[pallet::call_index(18)]
		#[pallet::weight(T::WeightInfo::set_key_removal_charge())]
		pub fn set_key_removal_charge(origin: OriginFor<T>, amount: u128) -> DispatchResult {
			T::AdminOrigin::ensure_origin(origin)?;

			KeyRemovalCharge::<T>::put(amount);
			Self::deposit_event(Event::KeyRemovalChargeSet { amount });
			Ok(())
		}
	}

	impl<T: Config> Pallet<T> {
		pub fn node_operator(
			node_operator_id: NodeOperatorId,
		) -> Result<NodeOperator<T::AccountId>, DispatchError> {
			NodeOperators::<T>::get(node_operator_id)
				.ok_or_else(|| Error::<T>::NodeOperatorDoesNotExist.into())
		}

		fn ensure_manager(
			who: &T::AccountId,
			node_operator_id: NodeOperatorId,
		) -> Result<NodeOperator<T::AccountId>, DispatchError> {
			let operator = Self::node_operator(node_operator_id)?;
			ensure!(&operator.manager == who, Error::<T>::SenderIsNotManager);
			Ok(operator)
		}

		/// Adds keys with optimistic vetting: while nothing is unvetted, new keys are vetted
		/// right away.
		fn add_keys(node_operator_id: NodeOperatorId, keys_count: u32) -> DispatchResult {
			ensure!(
				keys_count > 0 && keys_count <= T::MaxKeysPerCall::get(),
				Error::<T>::InvalidKeysCount
			);

			let mut operator = Self::node_operator(node_operator_id)?;
			let total_keys_count = operator
				.total_added_keys
				.checked_add(keys_count)
				.ok_or(Error::<T>::KeysCountOverflow)?;

			if operator.total_vetted_keys == operator.total_added_keys {
				operator.total_vetted_keys = total_keys_count;
				Self::deposit_event(Event::VettedSigningKeysCountChanged {
					node_operator_id,
					vetted_keys_count: total_keys_count,
				});
			}
			operator.total_added_keys = total_keys_count;
			NodeOperators::<T>::insert(node_operator_id, operator);

			Self::deposit_event(Event::TotalSigningKeysCountChanged {
				node_operator_id,
				total_keys_count,
			});
			Self::increment_module_nonce();

			Self::update_depositable_validators_count(node_operator_id)
		}

		/// Recomputes the depositable count of an operator from its counters and the bond
		/// ledger. A grown count is appended to the deposit queue right away. A shrunk one is
		/// left for `clean_deposit_queue`.
		pub fn update_depositable_validators_count(
			node_operator_id: NodeOperatorId,
		) -> DispatchResult {
			let unbonded_keys = T::BondLedger::unbonded_keys_count(node_operator_id);

			let (old_count, new_count) =
				NodeOperators::<T>::try_mutate(node_operator_id, |maybe_operator| {
					let operator =
						maybe_operator.as_mut().ok_or(Error::<T>::NodeOperatorDoesNotExist)?;
					let old_count = operator.depositable_validators_count;
					let new_count = operator.compute_depositable(unbonded_keys);
					operator.depositable_validators_count = new_count;
					Ok::<_, DispatchError>((old_count, new_count))
				})?;

			if old_count == new_count {
				return Ok(());
			}

			DepositableValidatorsCount::<T>::mutate(|total| {
				*total = total.saturating_sub(u64::from(old_count)).saturating_add(u64::from(new_count))
			});
			Self::deposit_event(Event::DepositableSigningKeysCountChanged {
				node_operator_id,
				depositable_keys_count: new_count,
			});
			Self::increment_module_nonce();

			if new_count > old_count {
				Self::enqueue_node_operator_keys(node_operator_id)?;
			}
			Ok(())
		}

		/// Appends one batch covering the depositable keys the queue does not account for yet.
		pub(crate) fn enqueue_node_operator_keys(node_operator_id: NodeOperatorId) -> DispatchResult {
			let count = NodeOperators::<T>::try_mutate(node_operator_id, |maybe_operator| {
				let operator =
					maybe_operator.as_mut().ok_or(Error::<T>::NodeOperatorDoesNotExist)?;
				if operator.enqueued_count >= operator.depositable_validators_count {
					return Ok::<_, DispatchError>(0);
				}
				let count = operator.depositable_validators_count - operator.enqueued_count;
				operator.enqueued_count = operator.depositable_validators_count;
				Ok(count)
			})?;

			if count > 0 {
				DepositQueue::<T>::enqueue(node_operator_id, u64::from(count));
				Self::deposit_event(Event::BatchEnqueued { node_operator_id, count });
			}
			Ok(())
		}

		pub(crate) fn do_obtain_deposit_data(
			deposits_count: u32,
		) -> Result<Vec<DepositAllocation>, DispatchError> {
			Self::allocate_deposits(deposits_count).map(|(allocations, _)| allocations)
		}

		/// Serves `deposits_count` keys from the head of the queue. Also returns how many
		/// batches without depositable keys were dequeued on the way.
		fn allocate_deposits(
			deposits_count: u32,
		) -> Result<(Vec<DepositAllocation>, u32), DispatchError> {
			let mut allocations = Vec::new();
			if deposits_count == 0 {
				return Ok((allocations, 0));
			}

			let mut deposits_left = u64::from(deposits_count);
			let mut skipped: u32 = 0;
			loop {
				let item = DepositQueue::<T>::peek();
				if item.is_nil() {
					break;
				}

				let node_operator_id = item.operator_id();
				let keys_in_batch = item.keys();
				let mut operator = Self::node_operator(node_operator_id)?;
				let keys_count = u64::from(operator.depositable_validators_count)
					.min(keys_in_batch)
					.min(deposits_left);

				if keys_count == 0 {
					skipped = skipped.saturating_add(1);
					ensure!(
						skipped <= T::MaxDepositQueueWalk::get(),
						Error::<T>::DepositQueueWalkLimitReached
					);
				}

				if deposits_left > keys_count || keys_count == keys_in_batch {
					// Batch fully consumed, or its operator has nothing depositable left.
					DepositQueue::<T>::dequeue()?;
					DepositQueue::<T>::release_enqueued(&mut operator.enqueued_count, keys_in_batch)?;
				} else {
					// Stopped inside the batch: the remainder keeps its place at the head.
					DepositQueue::<T>::replace(
						DepositQueue::<T>::head(),
						item.with_keys(keys_in_batch - keys_count),
					);
					DepositQueue::<T>::release_enqueued(&mut operator.enqueued_count, keys_count)?;
				}

				if keys_count > 0 {
					// Bounded by `deposits_left`, which started as a u32.
					let keys_count = keys_count as u32;
					allocations.push(DepositAllocation {
						node_operator_id,
						start_index: operator.total_deposited_keys,
						keys_count,
					});
					operator.total_deposited_keys = operator
						.total_deposited_keys
						.checked_add(keys_count)
						.ok_or(Error::<T>::KeysCountOverflow)?;
					operator.depositable_validators_count =
						operator.depositable_validators_count.saturating_sub(keys_count);
					deposits_left -= u64::from(keys_count);

					Self::deposit_event(Event::DepositedSigningKeysCountChanged {
						node_operator_id,
						deposited_keys_count: operator.total_deposited_keys,
					});
				}
				NodeOperators::<T>::insert(node_operator_id, operator);

				if deposits_left == 0 {
					break;
				}
			}

			ensure!(deposits_left == 0, Error::<T>::NotEnoughKeys);

			DepositableValidatorsCount::<T>::mutate(|total| {
				*total = total.saturating_sub(u64::from(deposits_count))
			});
			TotalDepositedValidators::<T>::mutate(|total| {
				*total = total.saturating_add(u64::from(deposits_count))
			});
			Self::increment_module_nonce();

			log::info!(
				"allocated {} deposits across {} node operator batches, skipped {}",
				deposits_count,
				allocations.len(),
				skipped
			);
			Ok((allocations, skipped))
		}

		fn do_update_stuck_validators_count(
			node_operator_id: NodeOperatorId,
			stuck_keys_count: u32,
		) -> DispatchResult {
			let mut operator = Self::node_operator(node_operator_id)?;
			if stuck_keys_count == operator.stuck_validators_count {
				return Ok(());
			}

			ensure!(
				stuck_keys_count <=
					operator.total_deposited_keys.saturating_sub(operator.total_exited_keys),
				Error::<T>::StuckKeysHigherThanNonExited
			);

			operator.stuck_validators_count = stuck_keys_count;
			NodeOperators::<T>::insert(node_operator_id, operator);
			Self::deposit_event(Event::StuckSigningKeysCountChanged {
				node_operator_id,
				stuck_keys_count,
			});

			Self::update_depositable_validators_count(node_operator_id)
		}

		fn do_update_exited_validators_count(
			node_operator_id: NodeOperatorId,
			exited_keys_count: u32,
			allow_decrease: bool,
		) -> DispatchResult {
			let mut operator = Self::node_operator(node_operator_id)?;
			let old_count = operator.total_exited_keys;
			if exited_keys_count == old_count {
				return Ok(());
			}

			ensure!(
				exited_keys_count <= operator.total_deposited_keys,
				Error::<T>::ExitedKeysHigherThanTotalDeposited
			);
			ensure!(allow_decrease || exited_keys_count > old_count, Error::<T>::ExitedKeysDecrease);

			TotalExitedValidators::<T>::mutate(|total| {
				*total = total
					.saturating_sub(u64::from(old_count))
					.saturating_add(u64::from(exited_keys_count))
			});
			operator.total_exited_keys = exited_keys_count;
			NodeOperators::<T>::insert(node_operator_id, operator);
			Self::deposit_event(Event::ExitedSigningKeysCountChanged {
				node_operator_id,
				exited_keys_count,
			});

			Self::update_depositable_validators_count(node_operator_id)
		}

		fn increment_module_nonce() {
			let nonce = ModuleNonce::<T>::mutate(|nonce| {
				*nonce = nonce.wrapping_add(1);
				*nonce
			});
			Self::deposit_event(Event::NonceChanged { nonce });
		}

		pub fn non_withdrawn_keys(node_operator_id: NodeOperatorId) -> u32 {
			NodeOperators::<T>::get(node_operator_id)
				.map(|operator| operator.non_withdrawn_keys())
				.unwrap_or_default()
		}

		pub fn staking_module_summary() -> StakingModuleSummary {
			StakingModuleSummary {
				total_exited_validators: TotalExitedValidators::<T>::get(),
				total_deposited_validators: TotalDepositedValidators::<T>::get(),
				depositable_validators_count: DepositableValidatorsCount::<T>::get(),
			}
		}

		/// Checks that every operator's `enqueued_count` matches the keys of its batches linked
		/// from the head, and that the depositable aggregate matches the per-operator counts.
		#[cfg(any(feature = "try-runtime", test))]
		pub fn do_try_state() -> Result<(), sp_runtime::TryRuntimeError> {
			use sp_std::collections::btree_map::BTreeMap;

			let mut queued: BTreeMap<NodeOperatorId, u64> = BTreeMap::new();
			let mut curr = DepositQueue::<T>::head();
			loop {
				let item = DepositQueue::<T>::at(curr);
				if item.is_nil() {
					break;
				}
				ensure!(item.keys() > 0, "empty batch linked in the deposit queue");
				let keys = queued.entry(item.operator_id()).or_default();
				*keys = keys.saturating_add(item.keys());
				curr = item.next();
			}

			let mut depositable_total: u64 = 0;
			for (node_operator_id, operator) in NodeOperators::<T>::iter() {
				ensure!(
					u64::from(operator.enqueued_count) ==
						queued.get(&node_operator_id).copied().unwrap_or_default(),
					"enqueued count does not match the deposit queue"
				);
				depositable_total =
					depositable_total.saturating_add(u64::from(operator.depositable_validators_count));
			}
			ensure!(
				depositable_total == DepositableValidatorsCount::<T>::get(),
				"depositable aggregate does not match node operators"
			);
			Ok(())
		}
	}

	impl<T: Config> NodeOperatorKeys for Pallet<T> {
		fn non_withdrawn_keys(node_operator_id: NodeOperatorId) -> u32 {
			Pallet::<T>::non_withdrawn_keys(node_operator_id)
		}
	}

	impl<T: Config> StakingModuleInterface for Pallet<T> {
		fn obtain_deposit_data(
			deposits_count: u32,
		) -> Result<Vec<DepositAllocation>, DispatchError> {
			with_storage_layer(|| Self::do_obtain_deposit_data(deposits_count))
		}

		fn clean_deposit_queue(max_items: u32) -> Result<u32, DispatchError> {
			with_storage_layer(|| DepositQueue::<T>::clean(max_items))
		}

		fn normalize_queue(node_operator_id: NodeOperatorId) -> DispatchResult {
			with_storage_layer(|| {
				Self::update_depositable_validators_count(node_operator_id)?;
				Self::enqueue_node_operator_keys(node_operator_id)
			})
		}

		fn staking_module_summary() -> StakingModuleSummary {
			Pallet::<T>::staking_module_summary()
		}

		fn nonce() -> u64 {
			ModuleNonce::<T>::get()
		}
	}
}
