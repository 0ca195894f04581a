//! Append-only segmented block storage (spec §4.1). Blocks are written as
//! `{magic:4}{len:4}{serialized block}` records into numbered segment
//! files under a data directory; a new segment is opened once the current
//! one would exceed `max_file_size`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use parking_lot::Mutex;
use talon_chain::Block;
use talon_chain::Transaction;
use talon_serialization::{deserialize, serialize};

use crate::disk_position::DiskPosition;

const MAGIC: u32 = 0x7461_6c6e; // "taln"
const DEFAULT_MAX_FILE_SIZE: u64 = 128 * 1024 * 1024;

#[derive(Debug)]
pub enum Error {
	Io(io::Error),
	Serialization(talon_serialization::Error),
	BadMagic,
}

impl From<io::Error> for Error {
	fn from(err: io::Error) -> Self {
		Error::Io(err)
	}
}

impl From<talon_serialization::Error> for Error {
	fn from(err: talon_serialization::Error) -> Self {
		Error::Serialization(err)
	}
}

struct Cursor {
	current_file: u32,
	current_size: u64,
}

/// Append-only, segment-rolling block store. Safe to share across threads:
/// the engine only ever has one writer at a time (held behind the chain
/// lock), but readers may run concurrently, so each read opens its own
/// file handle rather than sharing a cursor.
pub struct BlockFile {
	dir: PathBuf,
	max_file_size: u64,
	cursor: Mutex<Cursor>,
}

impl BlockFile {
	pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
		Self::open_with_segment_size(dir, DEFAULT_MAX_FILE_SIZE)
	}

	pub fn open_with_segment_size<P: AsRef<Path>>(dir: P, max_file_size: u64) -> Result<Self, Error> {
		let dir = dir.as_ref().to_path_buf();
		fs::create_dir_all(&dir)?;
		let current_file = Self::highest_existing_segment(&dir)?;
		let current_size = match File::open(Self::segment_path(&dir, current_file)) {
			Ok(file) => file.metadata()?.len(),
			Err(ref err) if err.kind() == io::ErrorKind::NotFound => 0,
			Err(err) => return Err(err.into()),
		};
		Ok(BlockFile {
			dir,
			max_file_size,
			cursor: Mutex::new(Cursor {
				current_file,
				current_size,
			}),
		})
	}

	fn segment_path(dir: &Path, file: u32) -> PathBuf {
		dir.join(format!("blk{:05}.dat", file))
	}

	fn highest_existing_segment(dir: &Path) -> io::Result<u32> {
		let mut highest = 0u32;
		for entry in fs::read_dir(dir)? {
			let entry = entry?;
			if let Some(name) = entry.file_name().to_str() {
				if let Some(digits) = name.strip_prefix("blk").and_then(|s| s.strip_suffix(".dat")) {
					if let Ok(n) = digits.parse::<u32>() {
						highest = highest.max(n);
					}
				}
			}
		}
		Ok(highest)
	}

	/// How much free space is left on the filesystem backing the data
	/// directory. `checkDiskSpace(n)` accepts when at least `n` bytes (plus
	/// a safety margin) are available.
	pub fn check_disk_space(&self, additional_bytes: u64) -> Result<bool, Error> {
		let available = fs2::available_space(&self.dir)?;
		Ok(available >= additional_bytes.saturating_add(DEFAULT_MAX_FILE_SIZE / 8))
	}

	/// Serializes `block`, appends it to the current segment (rolling to a
	/// new one first if it wouldn't fit), and returns where it landed.
	/// When `commit` is true the write is flushed to durable storage before
	/// returning, per spec §5's block-bytes-before-index-commit ordering.
	pub fn write_block(&self, block: &Block, commit: bool) -> Result<DiskPosition, Error> {
		let bytes = serialize(block);
		let record_len = 4 + 4 + bytes.len() as u64;

		let mut cursor = self.cursor.lock();
		if cursor.current_size > 0 && cursor.current_size + record_len > self.max_file_size {
			cursor.current_file += 1;
			cursor.current_size = 0;
		}

		let path = Self::segment_path(&self.dir, cursor.current_file);
		let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
		let offset = cursor.current_size as u32;

		file.write_u32::<LittleEndian>(MAGIC)?;
		file.write_u32::<LittleEndian>(bytes.len() as u32)?;
		file.write_all(&bytes)?;
		if commit {
			file.sync_data()?;
		}

		cursor.current_size += record_len;
		Ok(DiskPosition::for_block(cursor.current_file, offset))
	}

	fn read_record(&self, file: u32, offset: u32) -> Result<Vec<u8>, Error> {
		let path = Self::segment_path(&self.dir, file);
		let mut handle = File::open(path)?;
		handle.seek(SeekFrom::Start(offset as u64))?;
		let magic = handle.read_u32::<LittleEndian>()?;
		if magic != MAGIC {
			return Err(Error::BadMagic);
		}
		let len = handle.read_u32::<LittleEndian>()?;
		let mut buf = vec![0u8; len as usize];
		handle.read_exact(&mut buf)?;
		Ok(buf)
	}

	pub fn read_block(&self, file: u32, offset: u32) -> Result<Block, Error> {
		let bytes = self.read_record(file, offset)?;
		Ok(deserialize(&bytes)?)
	}

	/// Reads the transaction at `position.tx_offset_in_block` out of the
	/// block stored at `(position.file, position.offset)`.
	pub fn read_tx(&self, position: DiskPosition) -> Result<Transaction, Error> {
		let block = self.read_block(position.file, position.offset)?;
		block
			.transactions
			.into_iter()
			.nth(position.tx_offset_in_block as usize)
			.ok_or(Error::BadMagic)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use talon_chain::{BlockHeader, TransactionInput, TransactionOutput};
	use talon_primitives::compact::Compact;
	use talon_primitives::hash::H256;

	fn sample_block(nonce: u32) -> Block {
		Block {
			header: BlockHeader {
				version: 1,
				previous_header_hash: H256::zero(),
				merkle_root: H256::zero(),
				time: 0,
				bits: Compact::max_value(),
				nonce,
			},
			transactions: vec![Transaction {
				version: 1,
				inputs: vec![TransactionInput::coinbase(b"x".to_vec())],
				outputs: vec![TransactionOutput {
					value: 50,
					script_pubkey: vec![],
				}],
				lock_time: 0,
			}],
		}
	}

	#[test]
	fn round_trips_a_block() {
		let dir = tempfile::tempdir().unwrap();
		let store = BlockFile::open(dir.path()).unwrap();
		let block = sample_block(7);
		let pos = store.write_block(&block, true).unwrap();
		let read_back = store.read_block(pos.file, pos.offset).unwrap();
		assert_eq!(read_back, block);
	}

	#[test]
	fn reads_transaction_by_position() {
		let dir = tempfile::tempdir().unwrap();
		let store = BlockFile::open(dir.path()).unwrap();
		let block = sample_block(1);
		let pos = store.write_block(&block, true).unwrap();
		let tx_pos = DiskPosition::new(pos.file, pos.offset, 0);
		let tx = store.read_tx(tx_pos).unwrap();
		assert_eq!(tx, block.transactions[0]);
	}

	#[test]
	fn rolls_segment_when_cap_exceeded() {
		let dir = tempfile::tempdir().unwrap();
		let store = BlockFile::open_with_segment_size(dir.path(), 64).unwrap();
		let first = store.write_block(&sample_block(1), true).unwrap();
		let second = store.write_block(&sample_block(2), true).unwrap();
		assert!(second.file > first.file);
	}
}
