use sp_runtime::{DispatchError, DispatchResult};
use sp_std::vec::Vec;

use crate::types::{DepositAllocation, NodeOperatorId, StakingModuleSummary};

/// Collateral ledger backing node operator keys.
///
/// Amounts are in the ledger's smallest unit.
pub trait BondLedger<AccountId> {
	/// Non-withdrawn keys of the operator that are not covered by the current bond, net of any
	/// locked amount.
	fn unbonded_keys_count(node_operator_id: NodeOperatorId) -> u32;

	fn deposit_bond(from: &AccountId, node_operator_id: NodeOperatorId, amount: u128)
		-> DispatchResult;

	fn lock_bond(node_operator_id: NodeOperatorId, amount: u128) -> DispatchResult;

	fn release_locked_bond(node_operator_id: NodeOperatorId, amount: u128) -> DispatchResult;

	fn compensate_locked_bond(
		from: &AccountId,
		node_operator_id: NodeOperatorId,
		amount: u128,
	) -> DispatchResult;

	/// Burns the locked bond. Returns whether anything was settled.
	fn settle_locked_bond(node_operator_id: NodeOperatorId) -> bool;

	fn penalize(node_operator_id: NodeOperatorId, amount: u128) -> DispatchResult;

	fn charge_fee(node_operator_id: NodeOperatorId, amount: u128) -> DispatchResult;
}

impl<AccountId> BondLedger<AccountId> for () {
	fn unbonded_keys_count(_node_operator_id: NodeOperatorId) -> u32 {
		0
	}

	fn deposit_bond(_: &AccountId, _: NodeOperatorId, _: u128) -> DispatchResult {
		Ok(())
	}

	fn lock_bond(_: NodeOperatorId, _: u128) -> DispatchResult {
		Ok(())
	}

	fn release_locked_bond(_: NodeOperatorId, _: u128) -> DispatchResult {
		Ok(())
	}

	fn compensate_locked_bond(_: &AccountId, _: NodeOperatorId, _: u128) -> DispatchResult {
		Ok(())
	}

	fn settle_locked_bond(_: NodeOperatorId) -> bool {
		false
	}

	fn penalize(_: NodeOperatorId, _: u128) -> DispatchResult {
		Ok(())
	}

	fn charge_fee(_: NodeOperatorId, _: u128) -> DispatchResult {
		Ok(())
	}
}

/// Key counters the bond ledger needs to compute unbonded keys.
pub trait NodeOperatorKeys {
	fn non_withdrawn_keys(node_operator_id: NodeOperatorId) -> u32;
}

/// Entry points used by the staking router.
pub trait StakingModuleInterface {
	fn obtain_deposit_data(deposits_count: u32) -> Result<Vec<DepositAllocation>, DispatchError>;

	fn clean_deposit_queue(max_items: u32) -> Result<u32, DispatchError>;

	fn normalize_queue(node_operator_id: NodeOperatorId) -> DispatchResult;

	fn staking_module_summary() -> StakingModuleSummary;

	fn nonce() -> u64;
}
