use criterion::{criterion_group, criterion_main, Criterion};
use ethvm::backend::{MemoryAccount, MemoryBackend, MemoryVicinity};
use ethvm::executor::stack::{MemoryStackState, StackExecutor, StackSubstateMetadata};
use ethvm::Config;
use primitive_types::{H160, U256};
use std::collections::BTreeMap;

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

/// A countdown loop: PUSH1 255, then subtract one and JUMPI back until zero.
fn loop_code() -> Vec<u8> {
	vec![
		0x60, 0xff, // PUSH1 255
		0x5b, // JUMPDEST
		0x60, 0x01, // PUSH1 1
		0x90, // SWAP1
		0x03, // SUB
		0x80, // DUP1
		0x60, 0x02, // PUSH1 2
		0x57, // JUMPI
		0x00, // STOP
	]
}

fn run_loop_contract(b: &mut Criterion) {
	let config = Config::istanbul();
	let vicinity = vicinity();

	let caller = H160::from_low_u64_be(0xc0ffee);
	let contract = H160::from_low_u64_be(0x1000);

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
			code: loop_code(),
			..MemoryAccount::default()
		},
	);
	let backend = MemoryBackend::new(&vicinity, state);

	b.bench_function("countdown loop", |b| {
		b.iter(|| {
			let gas_limit = 1_000_000;
			let metadata = StackSubstateMetadata::new(gas_limit, &config);
			let stack_state = MemoryStackState::new(metadata, &backend);
			let mut executor = StackExecutor::new_with_precompiles(stack_state, &config, &());
			let (reason, _) =
				executor.transact_call(caller, contract, U256::zero(), Vec::new(), gas_limit);
			assert!(reason.is_succeed());
		})
	});
}

criterion_group!(benches, run_loop_contract);
criterion_main!(benches);
