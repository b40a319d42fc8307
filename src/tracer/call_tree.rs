use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;

use evm_journal_interpreter::ExitReason;
use primitive_types::{H160, U256};

/// One contract invocation. Nodes are owned by the tree (children list and
/// index lookup); the parent link is weak.
#[derive(Clone, Debug, Default)]
pub struct Call {
	/// Invoking address.
	pub from: H160,
	/// Target address. `None` until a create target is known.
	pub to: Option<H160>,
	/// Input bytes (calldata, or init code for a create).
	pub input: Vec<u8>,
	/// Transferred value.
	pub value: U256,
	/// Gas given to the frame.
	pub gas: u64,
	/// Pre-order index, unique within the transaction.
	pub index: u64,
	/// Parent call.
	pub parent: Weak<RefCell<Call>>,
	/// Child calls, in entry order.
	pub children: Vec<Rc<RefCell<Call>>>,
	/// Return data recorded on exit.
	pub output: Vec<u8>,
	/// Gas remaining on exit.
	pub gas_left: u64,
	/// Terminal error, if the frame did not succeed.
	pub error: Option<ExitReason>,
}

impl Call {
	/// Whether this call is the transaction root.
	#[must_use]
	pub fn is_root(&self) -> bool {
		self.parent.upgrade().is_none()
	}
}

/// The ordered tree of contract calls of one transaction. `enter` assigns
/// pre-order indices from a monotone counter and moves the cursor; `exit`
/// records the frame results and pops the cursor. The cursor is back at
/// `None` only once the root call has exited.
#[derive(Clone, Debug, Default)]
pub struct CallTree {
	head: Option<Rc<RefCell<Call>>>,
	current: Option<Rc<RefCell<Call>>>,
	count: u64,
	lookup: BTreeMap<u64, Rc<RefCell<Call>>>,
}

impl CallTree {
	/// Create an empty call tree.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Record entry into a new call, returning its index.
	pub fn enter(
		&mut self,
		from: H160,
		to: Option<H160>,
		input: Vec<u8>,
		value: U256,
		gas: u64,
	) -> u64 {
		let index = self.count;
		let call = Rc::new(RefCell::new(Call {
			from,
			to,
			input,
			value,
			gas,
			index,
			parent: self
				.current
				.as_ref()
				.map(Rc::downgrade)
				.unwrap_or_default(),
			children: Vec::new(),
			output: Vec::new(),
			gas_left: 0,
			error: None,
		}));

		if self.head.is_none() {
			self.head = Some(call.clone());
		}
		if let Some(current) = &self.current {
			current.borrow_mut().children.push(call.clone());
		}

		self.lookup.insert(index, call.clone());
		self.current = Some(call);
		self.count += 1;

		index
	}

	/// Record exit of the current call and move the cursor to its parent.
	pub fn exit(&mut self, gas_left: u64, output: Vec<u8>, error: Option<ExitReason>) {
		let Some(current) = self.current.take() else {
			return;
		};

		{
			let mut call = current.borrow_mut();
			call.gas_left = gas_left;
			call.output = output;
			call.error = error;
		}

		self.current = current.borrow().parent.upgrade();
	}

	/// The root call, once one was entered.
	#[must_use]
	pub fn head(&self) -> Option<Rc<RefCell<Call>>> {
		self.head.clone()
	}

	/// The call the cursor points at.
	#[must_use]
	pub fn current(&self) -> Option<Rc<RefCell<Call>>> {
		self.current.clone()
	}

	/// Index of the current call, zero when no call is active.
	#[must_use]
	pub fn current_index(&self) -> u64 {
		self.current
			.as_ref()
			.map(|call| call.borrow().index)
			.unwrap_or(0)
	}

	/// Find a call by index. O(1) in tree depth.
	#[must_use]
	pub fn find(&self, index: u64) -> Option<Rc<RefCell<Call>>> {
		self.lookup.get(&index).cloned()
	}

	/// The parent of the call with the given index.
	#[must_use]
	pub fn parent_of(&self, index: u64) -> Option<Rc<RefCell<Call>>> {
		self.lookup
			.get(&index)
			.and_then(|call| call.borrow().parent.upgrade())
	}

	/// The children of the call with the given index, in entry order.
	#[must_use]
	pub fn children_of(&self, index: u64) -> Vec<Rc<RefCell<Call>>> {
		self.lookup
			.get(&index)
			.map(|call| call.borrow().children.clone())
			.unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn addr(n: u64) -> H160 {
		H160::from_low_u64_be(n)
	}

	#[test]
	fn preorder_indices() {
		let mut tree = CallTree::new();

		// a calls b, b calls d, then a calls c.
		let a = tree.enter(addr(0xe0a), Some(addr(0xa)), vec![], U256::zero(), 100);
		let b = tree.enter(addr(0xa), Some(addr(0xb)), vec![], U256::zero(), 90);
		let d = tree.enter(addr(0xb), Some(addr(0xd)), vec![], U256::zero(), 80);
		tree.exit(1, vec![], None);
		tree.exit(2, vec![], None);
		let c = tree.enter(addr(0xa), Some(addr(0xc)), vec![], U256::zero(), 70);
		tree.exit(3, vec![], None);
		tree.exit(4, vec![], None);

		assert_eq!((a, b, d, c), (0, 1, 2, 3));
		assert!(tree.current().is_none());

		assert_eq!(tree.parent_of(2).map(|p| p.borrow().index), Some(1));
		let children_of_b: Vec<u64> = tree
			.children_of(1)
			.iter()
			.map(|c| c.borrow().index)
			.collect();
		assert_eq!(children_of_b, vec![2]);
		let children_of_a: Vec<u64> = tree
			.children_of(0)
			.iter()
			.map(|c| c.borrow().index)
			.collect();
		assert_eq!(children_of_a, vec![1, 3]);

		assert!(tree.find(0).map(|c| c.borrow().is_root()).unwrap_or(false));
		assert_eq!(tree.find(3).map(|c| c.borrow().gas_left), Some(3));
	}

	#[test]
	fn cursor_tracks_nesting() {
		let mut tree = CallTree::new();
		assert_eq!(tree.current_index(), 0);

		tree.enter(addr(1), Some(addr(2)), vec![], U256::zero(), 0);
		assert_eq!(tree.current_index(), 0);
		tree.enter(addr(2), Some(addr(3)), vec![], U256::zero(), 0);
		assert_eq!(tree.current_index(), 1);
		tree.exit(0, vec![], None);
		assert_eq!(tree.current_index(), 0);
	}
}
