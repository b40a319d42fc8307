//! The state-change tracer: the typed storage-key forest, the raw slot
//! log, balance histories and the contract call tree of one transaction.
//!
//! The tracer lives for exactly one transaction and is discarded as a
//! whole afterwards. Value histories recorded under a frame that later
//! reverts are rolled back through the checkpoint mechanism; key
//! registrations and call-tree nodes survive, with the terminal error kept
//! on the call node.

mod call_tree;
mod state_changes;

pub use self::call_tree::{Call, CallTree};
pub use self::state_changes::{StateChanges, StorageChanges, StorageKey};

use alloc::collections::BTreeMap;
use alloc::rc::Weak;
use alloc::vec::Vec;
use core::cell::RefCell;

use evm_journal_interpreter::{ExitReason, TracerError};
use primitive_types::{H160, H256, U256};

enum UndoOp {
	/// A typed value (or balance) append on a storage key node.
	Change {
		node: Weak<RefCell<StorageKey>>,
		call_index: u64,
	},
	/// A raw slot log write, with the value it replaced.
	Raw {
		account: H160,
		slot: H256,
		call_index: u64,
		previous: Option<H256>,
	},
}

/// Records typed storage mutations and the nested call tree produced by a
/// transaction, attributing every write to the call frame that caused it.
#[derive(Default)]
pub struct Tracer {
	states: StateChanges,
	call_tree: CallTree,
	ops: Vec<UndoOp>,
	journal_errors: u64,
}

impl Tracer {
	/// Create a fresh tracer for one transaction.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The call tree recorded so far.
	#[must_use]
	pub fn call_tree(&self) -> &CallTree {
		&self.call_tree
	}

	/// The state changes recorded so far.
	#[must_use]
	pub fn state_changes(&self) -> &StateChanges {
		&self.states
	}

	/// Index of the call frame currently executing; zero outside any call.
	#[must_use]
	pub fn current_call_index(&self) -> u64 {
		self.call_tree.current_index()
	}

	/// Record entry into a call frame, returning its pre-order index.
	pub fn enter_call(
		&mut self,
		from: H160,
		to: Option<H160>,
		input: Vec<u8>,
		value: U256,
		gas: u64,
	) -> u64 {
		self.call_tree.enter(from, to, input, value, gas)
	}

	/// Record exit of the current call frame.
	pub fn exit_call(&mut self, gas_left: u64, output: Vec<u8>, error: Option<ExitReason>) {
		self.call_tree.exit(gas_left, output, error);
	}

	/// Register a storage key (see [StateChanges::save_key]).
	pub fn save_key(
		&mut self,
		account: H160,
		parent: Option<(H256, H256)>,
		slot: H256,
		offset: Option<U256>,
		type_id: H256,
		label: Vec<u8>,
	) -> Result<(), TracerError> {
		self.states
			.save_key(account, parent, slot, offset, type_id, label)
	}

	/// Journal a typed value write under the current call index.
	pub fn save_change(
		&mut self,
		account: H160,
		slot: H256,
		offset: Option<U256>,
		type_id: H256,
		new_val: Vec<u8>,
	) -> Result<(), TracerError> {
		let call_index = self.current_call_index();
		if let Some(node) =
			self.states
				.save_change(account, slot, offset, type_id, call_index, new_val)?
		{
			self.ops.push(UndoOp::Change {
				node: alloc::rc::Rc::downgrade(&node),
				call_index,
			});
		}
		Ok(())
	}

	/// Record a physical storage write in the raw log, under the current
	/// call index.
	pub fn save_raw(&mut self, account: H160, slot: H256, value: H256) {
		let call_index = self.current_call_index();
		let previous = self.states.save_raw(account, slot, call_index, value);
		self.ops.push(UndoOp::Raw {
			account,
			slot,
			call_index,
			previous,
		});
	}

	/// Journal a balance observation under the current call index.
	pub fn save_balance(&mut self, account: H160, new_balance: U256) {
		let call_index = self.current_call_index();
		if let Some(root) = self.states.save_balance(account, new_balance, call_index) {
			self.ops.push(UndoOp::Change {
				node: alloc::rc::Rc::downgrade(&root),
				call_index,
			});
		}
	}

	/// Mark the current extent of the value histories. Taken together with
	/// a state snapshot at frame entry.
	#[must_use]
	pub fn checkpoint(&self) -> usize {
		self.ops.len()
	}

	/// Roll back every value recorded since the checkpoint. Key
	/// registrations and call-tree nodes are kept.
	pub fn revert_to(&mut self, checkpoint: usize) {
		while self.ops.len() > checkpoint {
			match self.ops.pop() {
				Some(UndoOp::Change { node, call_index }) => {
					if let Some(node) = node.upgrade() {
						node.borrow_mut().undo_journal(call_index);
					}
				}
				Some(UndoOp::Raw {
					account,
					slot,
					call_index,
					previous,
				}) => {
					self.states.undo_raw(account, slot, call_index, previous);
				}
				None => break,
			}
		}
	}

	/// Count a swallowed journal failure (non-strict configuration).
	pub fn note_journal_error(&mut self) {
		self.journal_errors += 1;
	}

	/// Number of journal failures swallowed so far.
	#[must_use]
	pub fn journal_errors(&self) -> u64 {
		self.journal_errors
	}

	/// Balance history of an account.
	#[must_use]
	pub fn balance(&self, account: H160) -> Option<StorageChanges> {
		self.states.balance(account)
	}

	/// Value history of a state variable by name and nested index path.
	#[must_use]
	pub fn variable(
		&self,
		account: H160,
		name: &[u8],
		indices: &[Vec<u8>],
	) -> Option<StorageChanges> {
		self.states.variable(account, name, indices)
	}

	/// Value history of a storage key by `(slot, offset, type id)`.
	pub fn slot(
		&self,
		account: H160,
		slot: H256,
		offset: Option<U256>,
		type_id: H256,
	) -> Result<Option<StorageChanges>, TracerError> {
		self.states.slot(account, slot, offset, type_id)
	}

	/// Index labels present under a node on the label path.
	#[must_use]
	pub fn indices_of(&self, account: H160, name: &[u8], indices: &[Vec<u8>]) -> Vec<Vec<u8>> {
		self.states.indices_of(account, name, indices)
	}

	/// Raw slot log of one slot.
	#[must_use]
	pub fn raw_slot(&self, account: H160, slot: H256) -> Option<BTreeMap<u64, H256>> {
		self.states.raw_slot(account, slot)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn addr(n: u64) -> H160 {
		H160::from_low_u64_be(n)
	}

	fn h(n: u64) -> H256 {
		H256::from_low_u64_be(n)
	}

	#[test]
	fn checkpoint_rolls_back_values_but_not_keys() {
		let mut tracer = Tracer::new();
		let account = addr(1);

		tracer.enter_call(addr(9), Some(account), vec![], U256::zero(), 100);
		tracer
			.save_key(account, None, h(0), None, h(0xaa), b"x".to_vec())
			.unwrap();

		let checkpoint = tracer.checkpoint();
		tracer
			.save_change(account, h(0), None, h(0xaa), vec![9])
			.unwrap();
		tracer.save_raw(account, h(0), h(9));
		tracer.save_balance(account, U256::from(5));

		tracer.revert_to(checkpoint);

		let history = tracer.variable(account, b"x", &[]).unwrap();
		assert!(history.is_empty());
		assert!(tracer.raw_slot(account, h(0)).is_none());
		assert!(tracer.balance(account).map(|b| b.is_empty()).unwrap_or(true));

		// The key registration survives, so new writes still resolve.
		tracer
			.save_change(account, h(0), None, h(0xaa), vec![7])
			.unwrap();
		let history = tracer.variable(account, b"x", &[]).unwrap();
		assert_eq!(history.entries(0), Some(&vec![vec![7]]));
	}

	#[test]
	fn revert_restores_replaced_raw_values() {
		let mut tracer = Tracer::new();
		let account = addr(1);

		tracer.enter_call(addr(9), Some(account), vec![], U256::zero(), 100);
		tracer.save_raw(account, h(0), h(1));

		let checkpoint = tracer.checkpoint();
		tracer.save_raw(account, h(0), h(2));
		tracer.revert_to(checkpoint);

		let log = tracer.raw_slot(account, h(0)).unwrap();
		assert_eq!(log.get(&0), Some(&h(1)));
	}

	#[test]
	fn balance_history_coalesces() {
		let mut tracer = Tracer::new();
		let account = addr(1);

		tracer.save_balance(account, U256::from(5));
		tracer.save_balance(account, U256::from(5));
		tracer.save_balance(account, U256::from(7));

		let history = tracer.balance(account).unwrap();
		assert_eq!(history.entries(0).map(Vec::len), Some(2));
	}
}
