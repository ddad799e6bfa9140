use ethvm::backend::{Apply, ApplyBackend, MemoryAccount, MemoryBackend, MemoryVicinity};
use ethvm::executor::stack::{MemoryStackState, StackExecutor, StackSubstateMetadata};
use ethvm::{Config, ExitError, ExitReason, ExitRevert, ExitSucceed};
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

fn caller() -> H160 {
	H160::from_low_u64_be(0xc0ffee)
}

fn contract() -> H160 {
	H160::from_low_u64_be(0x1000)
}

fn account(balance: u64, code: Vec<u8>) -> MemoryAccount {
	MemoryAccount {
		nonce: U256::zero(),
		balance: U256::from(balance),
		storage: BTreeMap::new(),
		code,
	}
}

/// Run `code` installed at [`contract`], called from [`caller`] with the
/// given value and calldata, returning the exit reason, output and gas used.
fn run(
	state: BTreeMap<H160, MemoryAccount>,
	value: u64,
	data: Vec<u8>,
	gas_limit: u64,
) -> (ExitReason, Vec<u8>, u64, MemoryBackend<'static>) {
	let vicinity = Box::leak(Box::new(vicinity()));
	let mut backend = MemoryBackend::new(vicinity, state);
	let metadata = StackSubstateMetadata::new(gas_limit, &CONFIG);
	let stack_state = MemoryStackState::new(metadata, &backend);
	let mut executor = StackExecutor::new_with_precompiles(stack_state, &CONFIG, &());

	let (reason, output) =
		executor.transact_call(caller(), contract(), U256::from(value), data, gas_limit);
	let used_gas = executor.used_gas();

	let (applies, logs) = executor.into_state().deconstruct();
	backend.apply(applies, logs, false);

	(reason, output, used_gas, backend)
}

fn default_state(code: Vec<u8>) -> BTreeMap<H160, MemoryAccount> {
	let mut state = BTreeMap::new();
	state.insert(caller(), account(1_000_000, Vec::new()));
	state.insert(contract(), account(10, code));
	state
}

#[test]
fn sstore_noop_costs_the_noop_price() {
	// PUSH1 0x00 PUSH1 0x00 SSTORE against a zero slot: priced like a load,
	// not like a fresh set.
	let code = vec![0x60, 0x00, 0x60, 0x00, 0x55];
	let (reason, _, used_gas, _) = run(default_state(code), 0, Vec::new(), 100_000);

	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(used_gas, 21000 + 3 + 3 + CONFIG.gas_sload);
}

#[test]
fn sstore_set_then_clear_credits_a_refund() {
	// PUSH1 0x01 PUSH1 0x00 SSTORE PUSH1 0x00 PUSH1 0x00 SSTORE
	let code = vec![0x60, 0x01, 0x60, 0x00, 0x55, 0x60, 0x00, 0x60, 0x00, 0x55];
	let (reason, _, used_gas, backend) = run(default_state(code), 0, Vec::new(), 100_000);

	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	// 21000 intrinsic, four pushes, one fresh set, one dirty write back to
	// the original zero; the write-back refunds set-minus-load.
	let total = 21000 + 4 * 3 + CONFIG.gas_sstore_set + CONFIG.gas_sload;
	let refund = CONFIG.gas_sstore_set - CONFIG.gas_sload;
	assert_eq!(used_gas, total - refund);

	// The slot ends the transaction cleared.
	assert_eq!(
		backend.state()[&contract()].storage.get(&H256::zero()),
		None
	);
}

#[test]
fn sstore_clearing_a_preexisting_slot_refunds() {
	// PUSH1 0x00 PUSH1 0x00 SSTORE over a slot holding 1.
	let code = vec![0x60, 0x00, 0x60, 0x00, 0x55];
	let mut state = default_state(code);
	state
		.get_mut(&contract())
		.unwrap()
		.storage
		.insert(H256::zero(), H256::from_low_u64_be(1));

	let (reason, _, used_gas, _) = run(state, 0, Vec::new(), 100_000);

	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	let total = 21000 + 2 * 3 + CONFIG.gas_sstore_reset;
	// The 15000 clear refund exceeds the total/2 cap.
	assert_eq!(used_gas, total - total / 2);
}

#[test]
fn revert_discards_the_write_but_reports_gas() {
	// PUSH1 0x01 PUSH1 0x00 SSTORE PUSH1 0x00 PUSH1 0x00 REVERT
	let code = vec![0x60, 0x01, 0x60, 0x00, 0x55, 0x60, 0x00, 0x60, 0x00, 0xfd];
	let (reason, output, used_gas, backend) = run(default_state(code), 0, Vec::new(), 100_000);

	assert_eq!(reason, ExitReason::Revert(ExitRevert::Reverted));
	assert!(output.is_empty());
	// The storage write is gone...
	assert_eq!(
		backend.state()[&contract()].storage.get(&H256::zero()),
		None
	);
	// ...but the gas spent up to the REVERT is still reported, and the
	// leftover was returned rather than consumed.
	assert_eq!(used_gas, 21000 + 4 * 3 + CONFIG.gas_sstore_set);
}

#[test]
fn revert_returns_its_output_buffer() {
	// PUSH1 0x2a PUSH1 0x00 MSTORE PUSH1 0x20 PUSH1 0x00 REVERT
	let code = vec![
		0x60, 0x2a, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xfd,
	];
	let (reason, output, used_gas, _) = run(default_state(code), 0, Vec::new(), 100_000);

	assert_eq!(reason, ExitReason::Revert(ExitRevert::Reverted));
	assert_eq!(output.len(), 32);
	assert_eq!(output[31], 0x2a);
	assert!(used_gas < 100_000);
}

#[test]
fn call_to_nonexistent_account_pays_the_new_account_surcharge() {
	let target = H160::from_low_u64_be(0xdead);

	// CALL(gas=0xffff, to=target, value=1, no data, no output)
	let mut code = vec![
		0x60, 0x00, // out_len
		0x60, 0x00, // out_offset
		0x60, 0x00, // in_len
		0x60, 0x00, // in_offset
		0x60, 0x01, // value
		0x73, // PUSH20 target
	];
	code.extend_from_slice(target.as_bytes());
	code.extend_from_slice(&[0x61, 0xff, 0xff, 0xf1]); // PUSH2 0xffff CALL

	let (reason, _, used_gas, backend) = run(default_state(code), 0, Vec::new(), 100_000);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));

	// The transferred value arrived.
	assert_eq!(backend.state()[&target].balance, U256::one());

	// 7 pushes, then the call base + value transfer + new account
	// surcharges; the 2300 stipend came back unused.
	let before_call = 21000 + 7 * 3;
	let call_cost = CONFIG.gas_call + 9000 + 25000 - CONFIG.call_stipend;
	assert_eq!(used_gas, before_call + call_cost);
}

#[test]
fn jump_into_push_immediate_faults() {
	// PUSH2 0x5b5b PUSH1 0x01 JUMP: offset 1 holds the JUMPDEST byte value
	// but is immediate data.
	let code = vec![0x61, 0x5b, 0x5b, 0x60, 0x01, 0x56];
	let gas_limit = 50_000;
	let (reason, _, used_gas, _) = run(default_state(code), 0, Vec::new(), gas_limit);

	assert_eq!(reason, ExitReason::Error(ExitError::InvalidJump));
	// A frame fault forfeits everything the frame held.
	assert_eq!(used_gas, gas_limit);
}

#[test]
fn pushing_past_the_stack_limit_faults() {
	let mut code = Vec::new();
	for _ in 0..1025 {
		code.extend_from_slice(&[0x60, 0x00]);
	}
	let (reason, _, _, _) = run(default_state(code), 0, Vec::new(), 100_000);
	assert_eq!(reason, ExitReason::Error(ExitError::StackOverflow));
}

#[test]
fn gas_exhaustion_terminates_an_infinite_loop() {
	// JUMPDEST PUSH1 0x00 JUMP
	let code = vec![0x5b, 0x60, 0x00, 0x56];
	let gas_limit = 50_000;
	let (reason, _, used_gas, _) = run(default_state(code), 0, Vec::new(), gas_limit);

	assert_eq!(reason, ExitReason::Error(ExitError::OutOfGas));
	assert_eq!(used_gas, gas_limit);
}

#[test]
fn identical_runs_are_identical() {
	let code = vec![
		0x60, 0x2a, 0x60, 0x00, 0x52, 0x60, 0x01, 0x60, 0x00, 0x55, 0x60, 0x20, 0x60, 0x00,
		0xf3,
	];
	let first = run(default_state(code.clone()), 0, vec![1, 2, 3], 100_000);
	let second = run(default_state(code), 0, vec![1, 2, 3], 100_000);

	assert_eq!(first.0, second.0);
	assert_eq!(first.1, second.1);
	assert_eq!(first.2, second.2);
	assert_eq!(first.3.state(), second.3.state());
}

#[test]
fn reverted_nested_call_is_invisible_to_the_parent() {
	let child = H160::from_low_u64_be(0x2000);

	// Parent: CALL(child) with no value, then STOP.
	let mut parent_code = vec![
		0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x73,
	];
	parent_code.extend_from_slice(child.as_bytes());
	parent_code.extend_from_slice(&[0x61, 0xff, 0xff, 0xf1]);

	// Child: SSTORE(0, 1) then REVERT.
	let child_code = vec![0x60, 0x01, 0x60, 0x00, 0x55, 0x60, 0x00, 0x60, 0x00, 0xfd];

	let mut state = default_state(parent_code);
	state.insert(child, account(0, child_code));

	let (reason, _, _, backend) = run(state, 0, Vec::new(), 200_000);

	// The parent completed even though the nested call reverted.
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	// The child's write never happened as far as anyone can observe.
	assert_eq!(
		backend.state()[&child].storage.get(&H256::zero()),
		None
	);
}

#[test]
fn static_frames_reject_state_changes() {
	let child = H160::from_low_u64_be(0x2000);

	// Parent: STATICCALL(child), store the success flag, return it.
	let mut parent_code = vec![
		0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x73,
	];
	parent_code.extend_from_slice(child.as_bytes());
	parent_code.extend_from_slice(&[
		0x61, 0xff, 0xff, 0xfa, // PUSH2 0xffff STATICCALL
		0x60, 0x00, 0x52, // MSTORE flag at 0
		0x60, 0x20, 0x60, 0x00, 0xf3, // RETURN 32 bytes
	]);

	// Child tries to write storage.
	let child_code = vec![0x60, 0x01, 0x60, 0x00, 0x55];

	let mut state = default_state(parent_code);
	state.insert(child, account(0, child_code));

	let (reason, output, _, backend) = run(state, 0, Vec::new(), 200_000);

	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Returned));
	// The nested call failed: flag is zero.
	assert_eq!(output, vec![0u8; 32]);
	// And nothing was written.
	assert_eq!(
		backend.state()[&child].storage.get(&H256::zero()),
		None
	);
}

#[test]
fn logs_are_collected_on_success() {
	// MSTORE(0, 0x2a) then LOG0(0, 32)
	let code = vec![
		0x60, 0x2a, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xa0,
	];
	let (reason, _, _, backend) = run(default_state(code), 0, Vec::new(), 100_000);

	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(backend.logs().len(), 1);
	let log = &backend.logs()[0];
	assert_eq!(log.address, contract());
	assert!(log.topics.is_empty());
	assert_eq!(log.data.len(), 32);
	assert_eq!(log.data[31], 0x2a);
}

#[test]
fn selfdestruct_moves_the_balance_and_deletes_the_account() {
	let beneficiary = H160::from_low_u64_be(0xbee);

	let mut code = vec![0x73];
	code.extend_from_slice(beneficiary.as_bytes());
	code.push(0xff); // SELFDESTRUCT

	let mut state = default_state(code);
	state.insert(beneficiary, account(1, Vec::new()));

	let (reason, _, _, backend) = run(state, 0, Vec::new(), 100_000);

	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Suicided));
	assert_eq!(backend.state()[&beneficiary].balance, U256::from(11));
	assert!(!backend.state().contains_key(&contract()));
}

#[test]
fn transact_create_deploys_returned_code() {
	let vicinity = vicinity();
	let mut state = BTreeMap::new();
	state.insert(caller(), account(1_000_000, Vec::new()));
	let mut backend = MemoryBackend::new(&vicinity, state);

	let gas_limit = 200_000;
	let metadata = StackSubstateMetadata::new(gas_limit, &CONFIG);
	let stack_state = MemoryStackState::new(metadata, &backend);
	let mut executor = StackExecutor::new_with_precompiles(stack_state, &CONFIG, &());

	// Init code returning one zero byte of runtime code.
	let init_code = vec![0x60, 0x01, 0x60, 0x00, 0xf3];
	let (reason, _) = executor.transact_create(caller(), U256::zero(), init_code, gas_limit);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Returned));

	let (applies, logs) = executor.into_state().deconstruct();
	backend.apply(applies, logs, false);

	let deployed: Vec<_> = backend
		.state()
		.iter()
		.filter(|(address, acct)| **address != caller() && !acct.code.is_empty())
		.collect();
	assert_eq!(deployed.len(), 1);
	assert_eq!(deployed[0].1.code, vec![0x00]);
	// The created contract starts with nonce 1, and the caller's nonce was
	// bumped by the create.
	assert_eq!(deployed[0].1.nonce, U256::one());
	assert_eq!(backend.state()[&caller()].nonce, U256::one());
}

#[test]
fn precompile_failure_is_an_ordinary_failed_call() {
	use ethvm::executor::stack::{
		PrecompileFailure, PrecompileFn, PrecompileHandle, PrecompileOutput, PrecompileResult,
	};

	fn identity(handle: &mut dyn PrecompileHandle) -> PrecompileResult {
		let words = (handle.input().len() as u64).div_ceil(32);
		handle.record_cost(15 + 3 * words)?;
		if handle.input().is_empty() {
			return Err(PrecompileFailure::Error {
				exit_status: ExitError::Other("empty input".into()),
			});
		}
		Ok(PrecompileOutput {
			exit_status: ExitSucceed::Returned,
			output: handle.input().to_vec(),
		})
	}

	let precompile_address = H160::from_low_u64_be(4);
	let mut precompiles: BTreeMap<H160, PrecompileFn> = BTreeMap::new();
	precompiles.insert(precompile_address, identity as PrecompileFn);

	let vicinity = vicinity();
	let mut state = BTreeMap::new();
	state.insert(caller(), account(1_000_000, Vec::new()));
	let backend = MemoryBackend::new(&vicinity, state);

	let run_with = |data: Vec<u8>| {
		let gas_limit = 100_000;
		let metadata = StackSubstateMetadata::new(gas_limit, &CONFIG);
		let stack_state = MemoryStackState::new(metadata, &backend);
		let mut executor =
			StackExecutor::new_with_precompiles(stack_state, &CONFIG, &precompiles);
		executor.transact_call(caller(), precompile_address, U256::zero(), data, gas_limit)
	};

	// Well-formed input echoes back.
	let (reason, output) = run_with(vec![1, 2, 3]);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Returned));
	assert_eq!(output, vec![1, 2, 3]);

	// Malformed input is a failed call, not a crash of the executor.
	let (reason, output) = run_with(Vec::new());
	assert!(reason.is_error());
	assert!(output.is_empty());
}

#[test]
fn apply_delete_empty_prunes_emptied_accounts() {
	let vicinity = vicinity();
	let mut state = BTreeMap::new();
	state.insert(caller(), account(0, Vec::new()));
	let mut backend = MemoryBackend::new(&vicinity, state);

	backend.apply(
		vec![Apply::<BTreeMap<H256, H256>>::Modify {
			address: caller(),
			basic: ethvm::backend::Basic::default(),
			code: None,
			storage: BTreeMap::new(),
			reset_storage: false,
		}],
		Vec::new(),
		true,
	);
	assert!(!backend.state().contains_key(&caller()));
}
