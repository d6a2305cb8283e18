use codec::{Decode, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_runtime::RuntimeDebug;

pub type NodeOperatorId = u64;

/// How the target validators limit of a node operator is applied.
#[derive(
	Clone, Copy, Default, Encode, Decode, PartialEq, Eq, RuntimeDebug, TypeInfo, MaxEncodedLen,
)]
pub enum TargetLimitMode {
	#[default]
	Disabled,
	/// Limit new deposits only.
	Soft,
	/// Caps new deposits the same way as `Soft`.
	Hard,
}

impl TargetLimitMode {
	pub fn is_active(&self) -> bool {
		!matches!(self, TargetLimitMode::Disabled)
	}
}

#[derive(Clone, Encode, Decode, PartialEq, Eq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct NodeOperator<AccountId> {
	/// Account allowed to manage keys and the queue position of the operator.
	pub manager: AccountId,
	pub total_added_keys: u32,
	pub total_vetted_keys: u32,
	pub total_deposited_keys: u32,
	pub total_exited_keys: u32,
	pub total_withdrawn_keys: u32,
	pub stuck_validators_count: u32,
	pub target_limit: u32,
	pub target_limit_mode: TargetLimitMode,
	/// Keys the operator may currently have deposited.
	pub depositable_validators_count: u32,
	/// Keys represented by the operator's batches still linked in the deposit queue.
	pub enqueued_count: u32,
}

impl<AccountId> NodeOperator<AccountId> {
	pub fn new(manager: AccountId) -> Self {
		NodeOperator {
			manager,
			total_added_keys: 0,
			total_vetted_keys: 0,
			total_deposited_keys: 0,
			total_exited_keys: 0,
			total_withdrawn_keys: 0,
			stuck_validators_count: 0,
			target_limit: 0,
			target_limit_mode: TargetLimitMode::Disabled,
			depositable_validators_count: 0,
			enqueued_count: 0,
		}
	}

	/// Deposited keys that have not been withdrawn yet.
	pub fn active_keys(&self) -> u32 {
		self.total_deposited_keys.saturating_sub(self.total_withdrawn_keys)
	}

	pub fn non_withdrawn_keys(&self) -> u32 {
		self.total_added_keys.saturating_sub(self.total_withdrawn_keys)
	}

	/// Number of keys that can be deposited given `unbonded_keys` keys without collateral.
	///
	/// Vetted and not yet deposited keys, zeroed while any validator is stuck, then capped by
	/// the target limit (counted against active keys) and by the bonded, not yet deposited keys.
	pub fn compute_depositable(&self, unbonded_keys: u32) -> u32 {
		let mut count = self
			.total_vetted_keys
			.min(self.total_added_keys)
			.saturating_sub(self.total_deposited_keys);

		if self.stuck_validators_count > 0 {
			return 0;
		}

		if self.target_limit_mode.is_active() {
			count = count.min(self.target_limit.saturating_sub(self.active_keys()));
		}

		let bonded_not_deposited = self
			.non_withdrawn_keys()
			.saturating_sub(self.active_keys())
			.saturating_sub(unbonded_keys);

		count.min(bonded_not_deposited)
	}
}

/// Keys handed out by a single deposit data request for one operator.
#[derive(Clone, Encode, Decode, PartialEq, Eq, RuntimeDebug, TypeInfo)]
pub struct DepositAllocation {
	pub node_operator_id: NodeOperatorId,
	/// Index of the first allocated key within the operator's key list.
	pub start_index: u32,
	pub keys_count: u32,
}

#[derive(Clone, Default, Encode, Decode, PartialEq, Eq, RuntimeDebug, TypeInfo)]
pub struct StakingModuleSummary {
	pub total_exited_validators: u64,
	pub total_deposited_validators: u64,
	pub depositable_validators_count: u64,
}
