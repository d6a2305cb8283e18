use frame_support::ensure;
use sp_runtime::DispatchError;
use sp_std::{collections::btree_map::BTreeMap, marker::PhantomData, vec::Vec};

use crate::{
	batch::Batch,
	pallet::{
		Config, DepositQueueHead, DepositQueueItems, DepositQueueLength, Error, NodeOperators,
	},
	types::NodeOperatorId,
};

/// Keys seen so far per operator during a single queue walk.
#[derive(Default)]
pub(crate) struct QueueLookup {
	seen: BTreeMap<NodeOperatorId, u64>,
}

impl QueueLookup {
	pub(crate) fn get(&self, node_operator_id: NodeOperatorId) -> u64 {
		self.seen.get(&node_operator_id).copied().unwrap_or_default()
	}

	pub(crate) fn add(&mut self, node_operator_id: NodeOperatorId, keys: u64) {
		let seen = self.seen.entry(node_operator_id).or_default();
		*seen = seen.saturating_add(keys);
	}
}

/// Append-only linked list of [`Batch`]es kept in `DepositQueueItems`.
///
/// Slots are never freed. A batch is dropped from the chain by moving the head past it or by
/// relinking its predecessor.
pub struct DepositQueue<T>(PhantomData<T>);

impl<T: Config> DepositQueue<T> {
	pub fn head() -> u128 {
		DepositQueueHead::<T>::get()
	}

	pub fn length() -> u128 {
		DepositQueueLength::<T>::get()
	}

	/// Writes a new batch at the tail, pre-linked to the slot the next append will use.
	pub fn enqueue(node_operator_id: NodeOperatorId, keys: u64) -> Batch {
		let length = Self::length();
		let item = Batch::new(node_operator_id, keys).with_next(length.saturating_add(1));
		DepositQueueItems::<T>::insert(length, item);
		DepositQueueLength::<T>::put(length.saturating_add(1));
		item
	}

	pub fn dequeue() -> Result<Batch, DispatchError> {
		let item = Self::peek();
		ensure!(!item.is_nil(), Error::<T>::QueueIsEmpty);
		DepositQueueHead::<T>::put(item.next());
		Ok(item)
	}

	pub fn peek() -> Batch {
		Self::at(Self::head())
	}

	/// Raw slot read. Unused slots read as nil.
	pub fn at(index: u128) -> Batch {
		DepositQueueItems::<T>::get(index)
	}

	pub fn is_empty() -> bool {
		Self::peek().is_nil()
	}

	/// Unlinks `removed` by pointing the batch at `prev_index` past it.
	pub(crate) fn relink(prev_index: u128, prev: Batch, removed: &Batch) -> Batch {
		let relinked = prev.with_next_of(removed);
		DepositQueueItems::<T>::insert(prev_index, relinked);
		relinked
	}

	pub(crate) fn replace(index: u128, item: Batch) {
		DepositQueueItems::<T>::insert(index, item);
	}

	/// Linked batches from the head, at most `max_items` of them, with their slot indices.
	pub fn list(max_items: u32) -> Result<Vec<(u128, Batch)>, DispatchError> {
		ensure!(max_items > 0, Error::<T>::QueueLookupNoLimit);
		ensure!(!Self::is_empty(), Error::<T>::QueueIsEmpty);

		let mut items = Vec::new();
		let mut curr = Self::head();
		for _ in 0..max_items {
			let item = Self::at(curr);
			if item.is_nil() {
				break;
			}
			items.push((curr, item));
			curr = item.next();
		}
		Ok(items)
	}

	/// Walks at most `max_items` batches from the head and drops the ones their operator can no
	/// longer back. Returns the number of removed batches.
	///
	/// Once an operator's tally reaches its depositable count every later batch of that
	/// operator is over capacity as well, so the tally is not advanced for removed batches.
	/// A kept batch that crosses the depositable count is trimmed in place.
	pub fn clean(max_items: u32) -> Result<u32, DispatchError> {
		ensure!(max_items > 0, Error::<T>::QueueLookupNoLimit);

		let mut lookup = QueueLookup::default();
		let mut prev: Option<(u128, Batch)> = None;
		let mut curr = Self::head();
		let mut removed: u32 = 0;

		for _ in 0..max_items {
			let item = Self::at(curr);
			if item.is_nil() {
				break;
			}

			let node_operator_id = item.operator_id();
			NodeOperators::<T>::try_mutate(node_operator_id, |maybe_operator| {
				let operator =
					maybe_operator.as_mut().ok_or(Error::<T>::NodeOperatorDoesNotExist)?;
				let depositable = u64::from(operator.depositable_validators_count);
				let seen = lookup.get(node_operator_id);

				if seen >= depositable {
					match prev {
						None => {
							Self::dequeue()?;
						},
						Some((prev_index, prev_item)) => {
							let relinked = Self::relink(prev_index, prev_item, &item);
							prev = Some((prev_index, relinked));
						},
					}
					Self::release_enqueued(&mut operator.enqueued_count, item.keys())?;
					removed = removed.saturating_add(1);
				} else {
					let allowed = depositable - seen;
					let mut kept = item;
					if item.keys() > allowed {
						kept = item.with_keys(allowed);
						Self::replace(curr, kept);
						Self::release_enqueued(&mut operator.enqueued_count, item.keys() - allowed)?;
					}
					lookup.add(node_operator_id, kept.keys());
					prev = Some((curr, kept));
				}
				Ok::<(), DispatchError>(())
			})?;

			curr = item.next();
		}

		if removed > 0 {
			log::debug!("removed {} invalid batches from the deposit queue", removed);
		}
		Ok(removed)
	}

	/// Subtracts keys leaving the queue from an operator's enqueued count.
	pub(crate) fn release_enqueued(enqueued_count: &mut u32, keys: u64) -> Result<(), DispatchError> {
		let remaining = u64::from(*enqueued_count).checked_sub(keys).ok_or_else(|| {
			log::warn!("enqueued count {} is below {} keys leaving the queue", enqueued_count, keys);
			Error::<T>::EnqueuedCountMismatch
		})?;
		// `remaining` is bounded by the previous u32 value.
		*enqueued_count = remaining as u32;
		Ok(())
	}
}
