use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;

use evm_journal_interpreter::TracerError;
use primitive_types::{H160, H256, U256};

/// The typed value history of one storage key: per call index, the ordered
/// values it was journaled with. Adjacent identical values under the same
/// call index coalesce into one entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StorageChanges {
	changes: BTreeMap<u64, Vec<Vec<u8>>>,
}

impl StorageChanges {
	/// Append a value under a call index. Returns whether the value was
	/// actually appended or coalesced away.
	pub(crate) fn append(&mut self, call_index: u64, new_val: Vec<u8>) -> bool {
		let entries = self.changes.entry(call_index).or_default();
		if let Some(last) = entries.last() {
			if *last == new_val {
				return false;
			}
		}

		entries.push(new_val);
		true
	}

	/// Drop the most recent value under a call index.
	pub(crate) fn undo_append(&mut self, call_index: u64) {
		if let Some(entries) = self.changes.get_mut(&call_index) {
			entries.pop();
			if entries.is_empty() {
				self.changes.remove(&call_index);
			}
		}
	}

	/// All recorded values, per call index.
	#[must_use]
	pub fn changes(&self) -> &BTreeMap<u64, Vec<Vec<u8>>> {
		&self.changes
	}

	/// The values recorded under one call index.
	#[must_use]
	pub fn entries(&self, call_index: u64) -> Option<&Vec<Vec<u8>>> {
		self.changes.get(&call_index)
	}

	/// Whether no value was ever recorded (or every one was rolled back).
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}
}

/// A node in the per-account storage key tree.
///
/// The root anchors an account and carries its balance history; a branch
/// carries the variable name or index label along an access path; a node
/// becomes a data node the first time a value is journaled against it.
#[derive(Debug, Default, PartialEq)]
pub struct StorageKey {
	slot: Option<H256>,
	offset: u8,
	type_id: H256,
	data: Vec<u8>,
	children: BTreeMap<(H256, u8), Rc<RefCell<StorageKey>>>,
	children_index: BTreeMap<Vec<u8>, Rc<RefCell<StorageKey>>>,
	changes: Option<StorageChanges>,
}

impl StorageKey {
	/// A root key: the anchor of an account, with no slot or offset. Its
	/// changes record holds the account's balance history.
	pub(crate) fn root() -> Self {
		Self::default()
	}

	/// A branch key for a named state variable or a nested index.
	pub(crate) fn branch(slot: H256, offset: u8, type_id: H256, data: Vec<u8>) -> Self {
		Self {
			slot: Some(slot),
			offset,
			type_id,
			data,
			children: BTreeMap::new(),
			children_index: BTreeMap::new(),
			changes: None,
		}
	}

	/// The storage slot of the key; `None` on a root.
	#[must_use]
	pub fn slot(&self) -> Option<H256> {
		self.slot
	}

	/// The byte offset of the key within its slot.
	#[must_use]
	pub fn offset(&self) -> u8 {
		self.offset
	}

	/// The compiler-assigned type identifier.
	#[must_use]
	pub fn type_id(&self) -> H256 {
		self.type_id
	}

	/// The label of the key: a variable name or index bytes.
	#[must_use]
	pub fn label(&self) -> &[u8] {
		&self.data
	}

	/// The value history, if this key ever received a write.
	#[must_use]
	pub fn changes(&self) -> Option<&StorageChanges> {
		self.changes.as_ref()
	}

	/// Labels of the direct children, in label order.
	#[must_use]
	pub fn child_labels(&self) -> Vec<Vec<u8>> {
		self.children_index.keys().cloned().collect()
	}

	/// Look up a direct child by label.
	#[must_use]
	pub fn child_by_label(&self, label: &[u8]) -> Option<Rc<RefCell<StorageKey>>> {
		self.children_index.get(label).cloned()
	}

	/// Add a child under this key, keyed by `(slot, offset)` and indexed
	/// by its label. Idempotent: an existing child is returned unchanged.
	pub(crate) fn add_child(&mut self, child: StorageKey) -> Rc<RefCell<StorageKey>> {
		let slot = child.slot.unwrap_or_default();
		let offset = child.offset;

		if let Some(existing) = self.children.get(&(slot, offset)) {
			return existing.clone();
		}

		let label = child.data.clone();
		let child = Rc::new(RefCell::new(child));
		self.children.insert((slot, offset), child.clone());
		self.children_index.entry(label).or_insert_with(|| child.clone());

		child
	}

	/// Journal a value against this key, turning it into a data node.
	/// Returns whether the value was appended.
	pub(crate) fn journal(&mut self, call_index: u64, new_val: Vec<u8>) -> bool {
		self.changes
			.get_or_insert_with(StorageChanges::default)
			.append(call_index, new_val)
	}

	pub(crate) fn undo_journal(&mut self, call_index: u64) {
		if let Some(changes) = self.changes.as_mut() {
			changes.undo_append(call_index);
		}
	}
}

fn offset_u8(offset: Option<U256>) -> Result<u8, TracerError> {
	match offset {
		None => Ok(0),
		Some(offset) => {
			if offset > U256::from(31) {
				return Err(TracerError::InvalidOffset);
			}
			Ok(offset.as_u64() as u8)
		}
	}
}

/// The per-account storage key forest, the flat `(account, slot, offset,
/// type id)` index over it, and the raw slot log.
///
/// The trees own their nodes; the flat index holds non-owning handles.
#[derive(Debug, Default)]
pub struct StateChanges {
	roots: BTreeMap<H160, Rc<RefCell<StorageKey>>>,
	index: BTreeMap<(H160, H256, u8, H256), Weak<RefCell<StorageKey>>>,
	raw: BTreeMap<H160, BTreeMap<H256, BTreeMap<u64, H256>>>,
}

impl StateChanges {
	/// Register a storage key under the account root (`parent` absent) or
	/// under the parent identified by `(parent_slot, parent_type_id)`.
	/// Idempotent on repeat of an identical key.
	pub fn save_key(
		&mut self,
		account: H160,
		parent: Option<(H256, H256)>,
		slot: H256,
		offset: Option<U256>,
		type_id: H256,
		label: Vec<u8>,
	) -> Result<(), TracerError> {
		let offset = offset_u8(offset)?;
		let branch = StorageKey::branch(slot, offset, type_id, label);

		let child = match parent {
			None => {
				let root = self
					.roots
					.entry(account)
					.or_insert_with(|| Rc::new(RefCell::new(StorageKey::root())));
				root.borrow_mut().add_child(branch)
			}
			Some((parent_slot, parent_type_id)) => {
				let parent = self
					.find_key(account, parent_slot, 0, parent_type_id)
					.ok_or(TracerError::UnknownParent)?;
				let node = parent.borrow_mut().add_child(branch);
				node
			}
		};

		self.index
			.entry((account, slot, offset, type_id))
			.or_insert_with(|| Rc::downgrade(&child));

		Ok(())
	}

	/// Journal a typed value against a registered key. Returns the node
	/// when the value was appended (and not coalesced), for the undo log.
	pub fn save_change(
		&mut self,
		account: H160,
		slot: H256,
		offset: Option<U256>,
		type_id: H256,
		call_index: u64,
		new_val: Vec<u8>,
	) -> Result<Option<Rc<RefCell<StorageKey>>>, TracerError> {
		let offset = offset_u8(offset)?;

		if !self.roots.contains_key(&account) {
			return Err(TracerError::UnknownAccount);
		}

		let node = self
			.find_key(account, slot, offset, type_id)
			.ok_or(TracerError::UnknownNode)?;

		let appended = node.borrow_mut().journal(call_index, new_val);
		Ok(appended.then_some(node))
	}

	/// Record a physical storage write in the raw log, returning the value
	/// it replaced under that call index.
	pub fn save_raw(
		&mut self,
		account: H160,
		slot: H256,
		call_index: u64,
		value: H256,
	) -> Option<H256> {
		self.raw
			.entry(account)
			.or_default()
			.entry(slot)
			.or_default()
			.insert(call_index, value)
	}

	pub(crate) fn undo_raw(
		&mut self,
		account: H160,
		slot: H256,
		call_index: u64,
		previous: Option<H256>,
	) {
		if let Some(slots) = self.raw.get_mut(&account) {
			if let Some(entries) = slots.get_mut(&slot) {
				match previous {
					Some(previous) => {
						entries.insert(call_index, previous);
					}
					None => {
						entries.remove(&call_index);
					}
				}
			}
		}
	}

	/// Journal a balance observation against the account root, creating
	/// the root if needed. Returns the root when the value was appended.
	pub fn save_balance(
		&mut self,
		account: H160,
		new_balance: U256,
		call_index: u64,
	) -> Option<Rc<RefCell<StorageKey>>> {
		let root = self
			.roots
			.entry(account)
			.or_insert_with(|| Rc::new(RefCell::new(StorageKey::root())))
			.clone();

		let mut bytes = [0u8; 32];
		new_balance.to_big_endian(&mut bytes);
		let first_non_zero = bytes.iter().position(|b| *b != 0).unwrap_or(32);

		let appended = root
			.borrow_mut()
			.journal(call_index, bytes[first_non_zero..].to_vec());
		appended.then_some(root)
	}

	fn find_key(
		&self,
		account: H160,
		slot: H256,
		offset: u8,
		type_id: H256,
	) -> Option<Rc<RefCell<StorageKey>>> {
		self.index
			.get(&(account, slot, offset, type_id))
			.and_then(Weak::upgrade)
	}

	fn find_key_indices(
		&self,
		account: H160,
		name: &[u8],
		indices: &[Vec<u8>],
	) -> Option<Rc<RefCell<StorageKey>>> {
		let root = self.roots.get(&account)?;
		let mut cursor = root.borrow().child_by_label(name)?;

		for index in indices {
			let next = cursor.borrow().child_by_label(index)?;
			cursor = next;
		}

		Some(cursor)
	}

	/// Balance history of an account.
	#[must_use]
	pub fn balance(&self, account: H160) -> Option<StorageChanges> {
		self.roots
			.get(&account)
			.and_then(|root| root.borrow().changes().cloned())
	}

	/// Value history of a state variable, walking the label path
	/// `name → indices…`.
	#[must_use]
	pub fn variable(
		&self,
		account: H160,
		name: &[u8],
		indices: &[Vec<u8>],
	) -> Option<StorageChanges> {
		self.find_key_indices(account, name, indices)
			.and_then(|key| key.borrow().changes().cloned())
	}

	/// Value history of a storage key by `(slot, offset, type id)`.
	pub fn slot(
		&self,
		account: H160,
		slot: H256,
		offset: Option<U256>,
		type_id: H256,
	) -> Result<Option<StorageChanges>, TracerError> {
		let offset = offset_u8(offset)?;
		Ok(self
			.find_key(account, slot, offset, type_id)
			.and_then(|key| key.borrow().changes().cloned()))
	}

	/// Labels of the direct children of a node on the label path.
	#[must_use]
	pub fn indices_of(&self, account: H160, name: &[u8], indices: &[Vec<u8>]) -> Vec<Vec<u8>> {
		self.find_key_indices(account, name, indices)
			.map(|key| key.borrow().child_labels())
			.unwrap_or_default()
	}

	/// The raw slot log of one slot: last observed word per call index.
	#[must_use]
	pub fn raw_slot(&self, account: H160, slot: H256) -> Option<BTreeMap<u64, H256>> {
		self.raw
			.get(&account)
			.and_then(|slots| slots.get(&slot))
			.filter(|entries| !entries.is_empty())
			.cloned()
	}
}
