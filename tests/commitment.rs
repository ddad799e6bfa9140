//! Committing executed state to a Merkle-Patricia root: key-value pairs
//! materialized from the world state hash to the same root regardless of how
//! they were produced, and rolled-back writes leave the root untouched.

use ethvm::backend::{ApplyBackend, MemoryAccount, MemoryBackend, MemoryVicinity};
use ethvm::executor::stack::{MemoryStackState, StackExecutor, StackSubstateMetadata};
use ethvm::Config;
use ethvm_trie::{trie_root, KECCAK_NULL_RLP};
use primitive_types::{H160, H256, U256};
use std::collections::BTreeMap;

const CONFIG: Config = Config::istanbul();

fn vicinity() -> MemoryVicinity {
	MemoryVicinity {
		gas_price: U256::zero(),
		origin: H160::default(),
		chain_id: U256::one(),
		block_hashes: Vec::new(),
		block_number: U256::one(),
		block_coinbase: H160::default(),
		block_timestamp: U256::from(1_600_000_000u64),
		block_difficulty: U256::zero(),
		block_gas_limit: U256::from(10_000_000u64),
	}
}

fn storage_root(account: &MemoryAccount) -> H256 {
	trie_root(
		account
			.storage
			.iter()
			.map(|(k, v)| (k.as_bytes().to_vec(), ethvm_rlp::encode(v))),
	)
}

fn execute(code: Vec<u8>) -> MemoryAccount {
	let caller = H160::from_low_u64_be(0xc0ffee);
	let contract = H160::from_low_u64_be(0x1000);

	let vicinity = vicinity();
	let mut state = BTreeMap::new();
	state.insert(
		caller,
		MemoryAccount {
			balance: U256::from(1_000_000u64),
			..MemoryAccount::default()
		},
	);
	state.insert(
		contract,
		MemoryAccount {
			code,
			..MemoryAccount::default()
		},
	);
	let mut backend = MemoryBackend::new(&vicinity, state);

	let gas_limit = 100_000;
	let metadata = StackSubstateMetadata::new(gas_limit, &CONFIG);
	let stack_state = MemoryStackState::new(metadata, &backend);
	let mut executor = StackExecutor::new_with_precompiles(stack_state, &CONFIG, &());

	let _ = executor.transact_call(caller, contract, U256::zero(), Vec::new(), gas_limit);

	let (applies, logs) = executor.into_state().deconstruct();
	backend.apply(applies, logs, false);

	backend.state()[&contract].clone()
}

#[test]
fn untouched_storage_commits_to_the_empty_root() {
	// STOP
	let account = execute(vec![0x00]);
	assert_eq!(storage_root(&account), KECCAK_NULL_RLP);
}

#[test]
fn committed_writes_change_the_root() {
	// SSTORE(0, 0x2a)
	let account = execute(vec![0x60, 0x2a, 0x60, 0x00, 0x55]);
	assert_ne!(storage_root(&account), KECCAK_NULL_RLP);
}

#[test]
fn reverted_writes_leave_the_root_unchanged() {
	// SSTORE(0, 0x2a) then REVERT
	let account = execute(vec![
		0x60, 0x2a, 0x60, 0x00, 0x55, 0x60, 0x00, 0x60, 0x00, 0xfd,
	]);
	assert_eq!(storage_root(&account), KECCAK_NULL_RLP);
}

#[test]
fn root_is_a_pure_function_of_the_slots() {
	// Two writes in one order...
	let a = execute(vec![
		0x60, 0x2a, 0x60, 0x00, 0x55, // SSTORE(0, 0x2a)
		0x60, 0x07, 0x60, 0x01, 0x55, // SSTORE(1, 0x07)
	]);
	// ...and the other order.
	let b = execute(vec![
		0x60, 0x07, 0x60, 0x01, 0x55, // SSTORE(1, 0x07)
		0x60, 0x2a, 0x60, 0x00, 0x55, // SSTORE(0, 0x2a)
	]);
	assert_eq!(storage_root(&a), storage_root(&b));
}
