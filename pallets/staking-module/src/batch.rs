use codec::{Decode, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_core::U256;
use sp_runtime::RuntimeDebug;

use crate::types::NodeOperatorId;

/// A run of depositable keys belonging to one node operator, linked to the next run in the
/// deposit queue by slot index.
///
/// Packed word layout (most significant first):
/// `| operator id: 64 | keys: 64 | next: 128 |`
///
/// The all-zero value is the nil batch. It marks an unused slot or the end of the queue.
#[derive(
	Clone, Copy, Default, Encode, Decode, PartialEq, Eq, RuntimeDebug, TypeInfo, MaxEncodedLen,
)]
pub struct Batch {
	operator_id: u64,
	keys: u64,
	next: u128,
}

impl Batch {
	pub const NIL: Batch = Batch { operator_id: 0, keys: 0, next: 0 };

	/// New unlinked batch. The successor index is set when the batch is enqueued.
	pub const fn new(operator_id: NodeOperatorId, keys: u64) -> Self {
		Batch { operator_id, keys, next: 0 }
	}

	pub fn is_nil(&self) -> bool {
		*self == Self::NIL
	}

	pub const fn operator_id(&self) -> NodeOperatorId {
		self.operator_id
	}

	pub const fn keys(&self) -> u64 {
		self.keys
	}

	/// Slot index of the batch that follows this one.
	pub const fn next(&self) -> u128 {
		self.next
	}

	pub const fn with_keys(self, keys: u64) -> Self {
		Batch { keys, ..self }
	}

	/// Copies only the successor link of `from`.
	pub const fn with_next_of(self, from: &Batch) -> Self {
		Batch { next: from.next, ..self }
	}

	pub(crate) const fn with_next(self, next: u128) -> Self {
		Batch { next, ..self }
	}
}

impl From<Batch> for U256 {
	fn from(batch: Batch) -> U256 {
		(U256::from(batch.operator_id) << 192) |
			(U256::from(batch.keys) << 128) |
			U256::from(batch.next)
	}
}

impl From<U256> for Batch {
	fn from(word: U256) -> Batch {
		Batch {
			operator_id: (word >> 192).low_u64(),
			keys: (word >> 128).low_u64(),
			next: word.low_u128(),
		}
	}
}
