use crate as pallet_staking_module;
use crate::{BondLedger, NodeOperatorId};
use frame_support::{
	derive_impl, ord_parameter_types,
	pallet_prelude::ValueQuery,
	Blake2_128Concat,
	traits::{ConstU128, ConstU16, ConstU32, ConstU64, Everything},
};
use frame_system::EnsureSignedBy;
use sp_core::H256;
use sp_runtime::{
	traits::{BlakeTwo256, IdentityLookup},
	BuildStorage, DispatchError, DispatchResult,
};

type Block = frame_system::mocking::MockBlock<Test>;

pub type AccountId = u64;

/// Index of a transaction in the chain.
pub type Nonce = u32;

/// Bond required for every non-withdrawn key.
pub const BOND_PER_KEY: u128 = 2;

// Configure a mock runtime to test the pallet.
frame_support::construct_runtime!(
	pub enum Test {
		System: frame_system,
		StakingModule: pallet_staking_module,
	}
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
	type BaseCallFilter = Everything;
	type BlockWeights = ();
	type BlockLength = ();
	type DbWeight = ();
	type RuntimeOrigin = RuntimeOrigin;
	type RuntimeCall = RuntimeCall;
	type Block = Block;
	type Hash = H256;
	type Hashing = BlakeTwo256;
	type AccountId = AccountId;
	type Lookup = IdentityLookup<Self::AccountId>;
	type RuntimeEvent = RuntimeEvent;
	type BlockHashCount = ConstU64<250>;
	type Version = ();
	type PalletInfo = PalletInfo;
	type AccountData = ();
	type OnNewAccount = ();
	type OnKilledAccount = ();
	type SystemWeightInfo = ();
	type SS58Prefix = ConstU16<42>;
	type OnSetCode = ();
	type MaxConsumers = ConstU32<16>;
	type Nonce = Nonce;
}

ord_parameter_types! {
	pub const StakingRouter: AccountId = 100;
	pub const Verifier: AccountId = 101;
	pub const PenaltyReporter: AccountId = 102;
	pub const Admin: AccountId = 103;
}

#[frame_support::storage_alias]
pub type Bonds = StorageMap<MockLedger, Blake2_128Concat, NodeOperatorId, u128, ValueQuery>;

#[frame_support::storage_alias]
pub type LockedBonds = StorageMap<MockLedger, Blake2_128Concat, NodeOperatorId, u128, ValueQuery>;

#[frame_support::storage_alias]
pub type Penalties = StorageValue<MockLedger, Vec<(NodeOperatorId, u128)>, ValueQuery>;

#[frame_support::storage_alias]
pub type Fees = StorageValue<MockLedger, Vec<(NodeOperatorId, u128)>, ValueQuery>;

pub fn bond_of(node_operator_id: NodeOperatorId) -> u128 {
	Bonds::get(node_operator_id)
}

pub fn locked_of(node_operator_id: NodeOperatorId) -> u128 {
	LockedBonds::get(node_operator_id)
}

pub fn penalties() -> Vec<(NodeOperatorId, u128)> {
	Penalties::get()
}

pub fn fees() -> Vec<(NodeOperatorId, u128)> {
	Fees::get()
}

/// Flat-rate ledger: every non-withdrawn key needs `BOND_PER_KEY` of unlocked bond.
pub struct MockBondLedger;

impl BondLedger<AccountId> for MockBondLedger {
	fn unbonded_keys_count(node_operator_id: NodeOperatorId) -> u32 {
		let available = bond_of(node_operator_id).saturating_sub(locked_of(node_operator_id));
		let bonded_keys = u32::try_from(available / BOND_PER_KEY).unwrap_or(u32::MAX);
		StakingModule::non_withdrawn_keys(node_operator_id).saturating_sub(bonded_keys)
	}

	fn deposit_bond(
		_from: &AccountId,
		node_operator_id: NodeOperatorId,
		amount: u128,
	) -> DispatchResult {
		Bonds::mutate(node_operator_id, |bond| *bond = bond.saturating_add(amount));
		Ok(())
	}

	fn lock_bond(node_operator_id: NodeOperatorId, amount: u128) -> DispatchResult {
		LockedBonds::mutate(node_operator_id, |locked| *locked = locked.saturating_add(amount));
		Ok(())
	}

	fn release_locked_bond(node_operator_id: NodeOperatorId, amount: u128) -> DispatchResult {
		let locked = locked_of(node_operator_id)
			.checked_sub(amount)
			.ok_or(DispatchError::Other("not enough locked bond"))?;
		LockedBonds::insert(node_operator_id, locked);
		Ok(())
	}

	fn compensate_locked_bond(
		_from: &AccountId,
		node_operator_id: NodeOperatorId,
		amount: u128,
	) -> DispatchResult {
		Self::release_locked_bond(node_operator_id, amount)
	}

	fn settle_locked_bond(node_operator_id: NodeOperatorId) -> bool {
		let locked = locked_of(node_operator_id);
		if locked == 0 {
			return false;
		}
		Bonds::mutate(node_operator_id, |bond| *bond = bond.saturating_sub(locked));
		LockedBonds::remove(node_operator_id);
		true
	}

	fn penalize(node_operator_id: NodeOperatorId, amount: u128) -> DispatchResult {
		Bonds::mutate(node_operator_id, |bond| *bond = bond.saturating_sub(amount));
		Penalties::append((node_operator_id, amount));
		Ok(())
	}

	fn charge_fee(node_operator_id: NodeOperatorId, amount: u128) -> DispatchResult {
		Bonds::mutate(node_operator_id, |bond| *bond = bond.saturating_sub(amount));
		Fees::append((node_operator_id, amount));
		Ok(())
	}
}

impl pallet_staking_module::Config for Test {
	type RuntimeEvent = RuntimeEvent;
	type WeightInfo = ();
	type BondLedger = MockBondLedger;
	type StakingRouterOrigin = EnsureSignedBy<StakingRouter, AccountId>;
	type VerifierOrigin = EnsureSignedBy<Verifier, AccountId>;
	type PenaltyOrigin = EnsureSignedBy<PenaltyReporter, AccountId>;
	type AdminOrigin = EnsureSignedBy<Admin, AccountId>;
	type DepositSize = ConstU128<32>;
	type InitialSlashingPenalty = ConstU128<1>;
	type ElRewardsStealingFine = ConstU128<1>;
	type MaxKeysPerCall = ConstU32<100>;
	type MaxReportItems = ConstU32<10>;
	type MaxDepositQueueWalk = ConstU32<16>;
}

// Build genesis storage according to the mock runtime.
pub fn new_test_ext() -> sp_io::TestExternalities {
	new_test_ext_with_charge(0)
}

pub fn new_test_ext_with_charge(key_removal_charge: u128) -> sp_io::TestExternalities {
	let mut t = frame_system::GenesisConfig::<Test>::default().build_storage().unwrap();
	pallet_staking_module::GenesisConfig::<Test> { key_removal_charge, ..Default::default() }
		.assimilate_storage(&mut t)
		.unwrap();

	let mut ext = sp_io::TestExternalities::new(t);
	ext.execute_with(|| {
		System::set_block_number(1);
	});
	ext
}
