//! EIP-137 name hashing and the two `eth_call` payloads needed to
//! resolve an ENS name without a contract SDK: `resolver(bytes32)` on
//! the registry, then `addr(bytes32)` on the returned resolver.

use tiny_keccak::{Hasher, Keccak};

/// The ENS registry deployment on mainnet.
pub const ENS_REGISTRY: &str = "0x00000000000c2e074ec69a0dfb2997ba6c7d2e1e";

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut out = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut out);
    out
}

fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// EIP-137 namehash: fold keccak over the labels, right to left.
///
/// Labels are ASCII-lowercased only. Full UTS-46 normalization of
/// internationalized names is intentionally out of scope; non-ASCII
/// names must be pre-normalized by the caller or they will hash to a
/// different node than ENS uses.
pub fn namehash(name: &str) -> [u8; 32] {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.to_ascii_lowercase().as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&node);
        buf[32..].copy_from_slice(&label_hash);
        node = keccak256(&buf);
    }
    node
}

/// Calldata for `resolver(bytes32)` on the registry.
pub fn resolver_call(node: &[u8; 32]) -> Vec<u8> {
    let mut data = selector("resolver(bytes32)").to_vec();
    data.extend_from_slice(node);
    data
}

/// Calldata for `addr(bytes32)` on a resolver contract.
pub fn addr_call(node: &[u8; 32]) -> Vec<u8> {
    let mut data = selector("addr(bytes32)").to_vec();
    data.extend_from_slice(node);
    data
}

/// Decode a 32-byte ABI return word holding an address.
///
/// `None` for a malformed word or the zero address — ENS contracts
/// signal "no resolver" / "no address record" with the zero address.
pub fn decode_address_word(word: &[u8]) -> Option<String> {
    if word.len() != 32 {
        return None;
    }
    let addr = &word[12..];
    if addr.iter().all(|b| *b == 0) {
        return None;
    }
    Some(format!("0x{}", hex::encode(addr)))
}
