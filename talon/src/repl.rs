//! A minimal line-oriented console for driving the node by hand: `status`
//! reports the chain tip and mempool size, `generate on`/`generate off`
//! toggles the miner, `quit` ends the session. Nothing here is a
//! collaborator contract the core depends on; it only calls the same
//! public methods an RPC handler would.

use talon_db::kv::MemoryDatabase;
use talon_db::BlockChainDatabase;
use talon_mempool::MemPool;
use talon_miner::Miner;

/// Handles one input line. Returns `false` when the session should end.
pub fn dispatch(line: &str, db: &BlockChainDatabase<MemoryDatabase>, mempool: &MemPool, miner: &Miner<BlockChainDatabase<MemoryDatabase>>) -> bool {
	match line {
		"" => {}
		"status" => print_status(db, mempool, miner),
		"generate on" => {
			miner.set_generate(true);
			println!("miner: generating");
		}
		"generate off" => {
			miner.set_generate(false);
			println!("miner: idle");
		}
		"quit" | "exit" => return false,
		"help" => print_help(),
		other => println!("unrecognized command {:?}; try `help`", other),
	}
	true
}

fn print_status(db: &BlockChainDatabase<MemoryDatabase>, mempool: &MemPool, miner: &Miner<BlockChainDatabase<MemoryDatabase>>) {
	let best = db.best_block();
	println!("best block:  height {}, hash {}", best.number, best.hash.to_reversed_str());
	println!("mempool:     {} transaction(s)", mempool.len());
	println!("miner:       {}", if miner.is_generating() { "generating" } else { "idle" });
	if let Some(work) = db.best_invalid_work() {
		println!("best invalid work seen: {}", work);
	}
}

fn print_help() {
	println!("commands: status | generate on | generate off | quit");
}
