use anyhow::{Context, Result};
use prost::Message;

/// Encode the given model into a bytes vec.
pub fn encode_model<M: Message>(model: &M) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(model.encoded_len());
    model.encode(&mut buf).context("error serializing data model")?;
    Ok(buf)
}

/// Compute a stable 32-bit FNV-1a hash of the given bytes.
///
/// Used for segment name hashes, which must be identical across processes.
pub fn stable_hash_32(data: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in data {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// Compute a stable 64-bit FNV-1a hash of the given bytes.
///
/// Used to derive pipeline definition ids from canonical encoded configs.
pub fn stable_hash_64(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in data {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Combine a segment name hash and instance id into a segment address.
///
/// The upper 32 bits identify the segment by name, the lower 32 bits the
/// instance, so an address is meaningful without a store lookup.
pub fn encode_segment_address(name_hash: u32, instance_id: u64) -> u64 {
    (u64::from(name_hash) << 32) | (instance_id & 0xffff_ffff)
}
