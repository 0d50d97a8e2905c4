//! Sword/Shield storage. The file is a stream of key-addressed blocks, each
//! encrypted with an xorshift32 stream seeded from its key, wrapped in a
//! static xorpad and signed with SHA-256 over the encrypted payload.

use std::borrow::Cow;

use log::{trace, warn};
use sha2::{Digest, Sha256};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::endian::u32_le;
use crate::registry::SwishKeys;

pub const HASH_LEN: usize = 0x20;

const TYPE_BOOL1: u8 = 1;
const TYPE_BOOL2: u8 = 2;
const TYPE_BOOL3: u8 = 3;
const TYPE_OBJECT: u8 = 4;
const TYPE_ARRAY: u8 = 5;

/// Width of a single value of type `code`, for the value types 8..=17.
pub fn value_size(code: u8) -> Option<usize> {
    const SIZES: [usize; 10] = [1, 2, 4, 8, 1, 2, 4, 8, 4, 8];
    code.checked_sub(8).and_then(|i| SIZES.get(usize::from(i))).copied()
}

/// Width of one element of an array of `sub`. Bool arrays hold a byte per
/// element.
pub fn array_width(sub: u8) -> Option<usize> {
    match sub {
        TYPE_BOOL3 => Some(1),
        other => value_size(other),
    }
}

/// Keystream for one block. The seed is the block key advanced once per
/// set bit; bytes are taken from each state low byte first.
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
    counter: u32,
}

impl XorShift32 {
    pub fn new(key: u32) -> Self {
        let mut state = key;
        for _ in 0..key.count_ones() {
            state = advance(state);
        }
        Self { state, counter: 0 }
    }

    pub fn next_byte(&mut self) -> u8 {
        let byte = (self.state >> (self.counter << 3)) as u8;
        if self.counter == 3 {
            self.state = advance(self.state);
            self.counter = 0;
        } else {
            self.counter += 1;
        }
        byte
    }

    pub fn next_u32(&mut self) -> u32 {
        u32::from_le_bytes([
            self.next_byte(),
            self.next_byte(),
            self.next_byte(),
            self.next_byte(),
        ])
    }

    pub fn skip(&mut self, count: usize) {
        for _ in 0..count {
            self.next_byte();
        }
    }

    pub fn apply(&mut self, data: &mut [u8]) {
        for b in data {
            *b ^= self.next_byte();
        }
    }
}

fn advance(mut key: u32) -> u32 {
    key ^= key << 2;
    key ^= key >> 15;
    key ^= key << 13;
    key
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Bool1,
    Bool2,
    Bool3,
    /// Length-prefixed opaque bytes.
    Object,
    /// Count-prefixed run of values of the given type code.
    Array(u8),
    Value(u8),
}

impl BlockKind {
    fn code(self) -> u8 {
        match self {
            Self::Bool1 => TYPE_BOOL1,
            Self::Bool2 => TYPE_BOOL2,
            Self::Bool3 => TYPE_BOOL3,
            Self::Object => TYPE_OBJECT,
            Self::Array(_) => TYPE_ARRAY,
            Self::Value(code) => code,
        }
    }

    /// Stream bytes spent on the type and its prefix before the data.
    fn header_len(self) -> usize {
        match self {
            Self::Object => 5,
            Self::Array(_) => 6,
            _ => 1,
        }
    }
}

/// Serializes one block, encrypted.
pub fn encode_block(key: u32, kind: BlockKind, data: &[u8]) -> Vec<u8> {
    let mut out = key.to_le_bytes().to_vec();
    let body = out.len();
    out.push(kind.code());
    match kind {
        BlockKind::Object => out.extend_from_slice(&(data.len() as u32).to_le_bytes()),
        BlockKind::Array(sub) => {
            let width = array_width(sub).unwrap_or(1);
            out.extend_from_slice(&((data.len() / width) as u32).to_le_bytes());
            out.push(sub);
        }
        _ => {}
    }
    out.extend_from_slice(data);
    XorShift32::new(key).apply(&mut out[body..]);
    out
}

#[derive(Debug, Clone)]
struct Entry {
    key: u32,
    kind: BlockKind,
    start: usize,
    len: usize,
    plain: bool,
}

impl Entry {
    fn stream(&self) -> XorShift32 {
        let mut xs = XorShift32::new(self.key);
        xs.skip(self.kind.header_len());
        xs
    }
}

/// Parsed block stream. Block bodies stay encrypted in the buffer until
/// first mutable access.
#[derive(Debug, Clone)]
pub struct BlockStore {
    data: Vec<u8>,
    entries: Vec<Entry>,
}

impl BlockStore {
    /// Walks the stream; it has to end exactly at the buffer's end.
    pub fn parse(data: Vec<u8>) -> Result<Self, CoreError> {
        let parse_err = |at: usize, what: &str| {
            CoreError::new(CoreErrorCode::Parse, format!("block at {at:#x}: {what}"))
        };
        let mut entries = Vec::new();
        let mut pos = 0;
        while pos < data.len() {
            if pos + 5 > data.len() {
                return Err(parse_err(pos, "truncated header"));
            }
            let key = u32_le(&data, pos);
            let mut xs = XorShift32::new(key);
            let code = data[pos + 4] ^ xs.next_byte();
            let header = |n: usize| {
                if pos + 5 + n <= data.len() {
                    Ok(())
                } else {
                    Err(parse_err(pos, "truncated prefix"))
                }
            };
            let (kind, len) = match code {
                TYPE_BOOL1 => (BlockKind::Bool1, 0),
                TYPE_BOOL2 => (BlockKind::Bool2, 0),
                TYPE_BOOL3 => (BlockKind::Bool3, 0),
                TYPE_OBJECT => {
                    header(4)?;
                    let len = u32_le(&data, pos + 5) ^ xs.next_u32();
                    (BlockKind::Object, len as usize)
                }
                TYPE_ARRAY => {
                    header(5)?;
                    let count = u32_le(&data, pos + 5) ^ xs.next_u32();
                    let sub = data[pos + 9] ^ xs.next_byte();
                    let width = array_width(sub)
                        .ok_or_else(|| parse_err(pos, &format!("array of unknown type {sub}")))?;
                    (BlockKind::Array(sub), count as usize * width)
                }
                other => match value_size(other) {
                    Some(width) => (BlockKind::Value(other), width),
                    None => {
                        // garbage from other formats fails on the first block
                        if !entries.is_empty() {
                            warn!("unknown block type {other} at {pos:#x}");
                        }
                        return Err(parse_err(pos, &format!("unknown type {other}")));
                    }
                },
            };
            let start = pos + 4 + kind.header_len();
            let end = start
                .checked_add(len)
                .filter(|&end| end <= data.len())
                .ok_or_else(|| parse_err(pos, "body runs past the end"))?;
            trace!("block {key:08x} {kind:?} at {pos:#x}, {len} bytes");
            entries.push(Entry {
                key,
                kind,
                start,
                len,
                plain: false,
            });
            pos = end;
        }
        entries.sort_by_key(|e| e.key);
        if entries.windows(2).any(|w| w[0].key == w[1].key) {
            return Err(CoreError::new(CoreErrorCode::Parse, "duplicate block key"));
        }
        Ok(Self { data, entries })
    }

    fn find(&self, key: u32) -> Option<usize> {
        self.entries.binary_search_by_key(&key, |e| e.key).ok()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: u32) -> bool {
        self.find(key).is_some()
    }

    pub fn kind(&self, key: u32) -> Option<BlockKind> {
        self.find(key).map(|i| self.entries[i].kind)
    }

    /// Body length of block `key`.
    pub fn block_len(&self, key: u32) -> Option<usize> {
        self.find(key).map(|i| self.entries[i].len)
    }

    /// Plain body of block `key`; borrowed once the block has been opened
    /// for writing, a decrypted copy otherwise.
    pub fn get(&self, key: u32) -> Option<Cow<'_, [u8]>> {
        let e = &self.entries[self.find(key)?];
        let body = &self.data[e.start..e.start + e.len];
        if e.plain {
            return Some(Cow::Borrowed(body));
        }
        let mut copy = body.to_vec();
        e.stream().apply(&mut copy);
        Some(Cow::Owned(copy))
    }

    /// Decrypts block `key` in place on first access.
    pub fn get_mut(&mut self, key: u32) -> Option<&mut [u8]> {
        let i = self.find(key)?;
        let e = &mut self.entries[i];
        let body = &mut self.data[e.start..e.start + e.len];
        if !e.plain {
            e.stream().apply(body);
            e.plain = true;
        }
        Some(body)
    }

    /// Re-encrypts every opened block.
    pub fn seal(&mut self) {
        for e in self.entries.iter_mut().filter(|e| e.plain) {
            e.stream().apply(&mut self.data[e.start..e.start + e.len]);
            e.plain = false;
        }
    }

    /// The encrypted stream. Opened blocks are encrypted in the copy.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for e in self.entries.iter().filter(|e| e.plain) {
            e.stream().apply(&mut out[e.start..e.start + e.len]);
        }
        out
    }
}

fn xor_static(data: &mut [u8], xorpad: &[u8]) {
    for (b, k) in data.iter_mut().zip(xorpad.iter().cycle()) {
        *b ^= k;
    }
}

/// SHA-256 of intro, `payload`, outro.
pub fn image_hash(keys: &SwishKeys, payload: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(&keys.hash_intro);
    hasher.update(payload);
    hasher.update(&keys.hash_outro);
    let digest = hasher.finalize();
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&digest);
    out
}

/// Whether the trailing hash matches the rest of `image`.
pub fn is_signed(image: &[u8], keys: &SwishKeys) -> bool {
    image.len() > HASH_LEN && {
        let (payload, stored) = image.split_at(image.len() - HASH_LEN);
        image_hash(keys, payload) == stored
    }
}

/// Strips the outer layer, dropping the signature without checking it.
pub fn decrypt_image(image: &[u8], keys: &SwishKeys) -> Option<Vec<u8>> {
    if image.len() <= HASH_LEN || keys.xorpad.is_empty() {
        return None;
    }
    let mut out = image[..image.len() - HASH_LEN].to_vec();
    xor_static(&mut out, &keys.xorpad);
    Some(out)
}

/// Applies the xorpad to `payload` and appends the signature.
pub fn encrypt_image(payload: &[u8], keys: &SwishKeys) -> Vec<u8> {
    let mut out = payload.to_vec();
    xor_static(&mut out, &keys.xorpad);
    let hash = image_hash(keys, &out);
    out.extend_from_slice(&hash);
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_keys() -> SwishKeys {
        SwishKeys {
            xorpad: (0..0x80u8).map(|i| i.wrapping_mul(37) ^ 0x5A).collect(),
            hash_intro: vec![0x11; 0x40],
            hash_outro: vec![0x22; 0x40],
        }
    }

    #[test]
    fn keystream_is_seeded_by_popcount() {
        let mut xs = XorShift32::new(0);
        assert_eq!(xs.next_u32(), 0);
        let mut xs = XorShift32::new(1);
        let expected = advance(1);
        assert_eq!(xs.next_byte(), expected as u8);
        assert_eq!(xs.next_byte(), (expected >> 8) as u8);
        xs.skip(2);
        assert_eq!(xs.next_u32(), advance(expected));
    }

    #[test]
    fn bool_arrays_hold_a_byte_per_element() {
        let flags = [1, 0, 1, 1, 0];
        let mut stream = encode_block(0x0A00_0001, BlockKind::Array(3), &flags);
        stream.extend(encode_block(0x0B00_0002, BlockKind::Array(10), &[4, 3, 2, 1]));

        let store = BlockStore::parse(stream.clone()).unwrap();
        assert_eq!(store.kind(0x0A00_0001), Some(BlockKind::Array(3)));
        assert_eq!(store.block_len(0x0A00_0001), Some(flags.len()));
        assert_eq!(&*store.get(0x0A00_0001).unwrap(), &flags);
        assert_eq!(store.to_bytes(), stream);
        assert_eq!(array_width(3), Some(1));
        assert_eq!(array_width(2), None);
    }

    #[test]
    fn blocks_parse_sorted_and_open_lazily() {
        let mut stream = encode_block(0x3000_0001, BlockKind::Object, &[1, 2, 3, 4, 5]);
        stream.extend(encode_block(0x1000_0002, BlockKind::Value(10), &7u32.to_le_bytes()));
        stream.extend(encode_block(0x2000_0003, BlockKind::Bool2, &[]));
        stream.extend(encode_block(0x0F00_0004, BlockKind::Array(9), &[1, 0, 2, 0]));

        let mut store = BlockStore::parse(stream.clone()).unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(store.kind(0x2000_0003), Some(BlockKind::Bool2));
        assert_eq!(store.kind(0x0F00_0004), Some(BlockKind::Array(9)));
        assert_eq!(store.block_len(0x0F00_0004), Some(4));
        assert!(matches!(store.get(0x1000_0002).unwrap(), Cow::Owned(_)));
        assert_eq!(&*store.get(0x3000_0001).unwrap(), &[1, 2, 3, 4, 5]);

        store.get_mut(0x3000_0001).unwrap()[0] = 9;
        assert!(matches!(store.get(0x3000_0001).unwrap(), Cow::Borrowed(_)));
        let written = store.to_bytes();
        store.seal();
        assert_eq!(store.to_bytes(), written);

        let reparsed = BlockStore::parse(written).unwrap();
        assert_eq!(&*reparsed.get(0x3000_0001).unwrap(), &[9, 2, 3, 4, 5]);
        assert_eq!(&*reparsed.get(0x1000_0002).unwrap(), &7u32.to_le_bytes());
    }

    #[test]
    fn stream_must_end_on_a_block_boundary() {
        let mut stream = encode_block(0x1234, BlockKind::Object, &[0; 8]);
        stream.push(0);
        assert!(BlockStore::parse(stream.clone()).is_err());
        stream.truncate(stream.len() - 3);
        assert!(BlockStore::parse(stream).is_err());
        assert!(BlockStore::parse(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn unknown_types_and_duplicates_are_rejected() {
        let mut bad = encode_block(0x55, BlockKind::Value(8), &[1]);
        bad[4] ^= 8 ^ 30;
        assert!(BlockStore::parse(bad).is_err());

        let mut twice = encode_block(0x77, BlockKind::Bool1, &[]);
        twice.extend(encode_block(0x77, BlockKind::Bool1, &[]));
        assert!(BlockStore::parse(twice).is_err());
    }

    #[test]
    fn outer_layer_round_trips_and_signs() {
        let keys = test_keys();
        let payload: Vec<u8> = (0..0x200u32).map(|i| i as u8).collect();
        let image = encrypt_image(&payload, &keys);
        assert_eq!(image.len(), payload.len() + HASH_LEN);
        assert_ne!(&image[..payload.len()], &payload[..]);
        assert_eq!(&image[payload.len()..], &image_hash(&keys, &image[..payload.len()]));
        assert!(is_signed(&image, &keys));
        assert_eq!(decrypt_image(&image, &keys).unwrap(), payload);
        let mut tampered = image.clone();
        tampered[3] ^= 1;
        assert!(!is_signed(&tampered, &keys));
        assert!(decrypt_image(&image[..HASH_LEN], &keys).is_none());
    }
}
