//! CBC Chaining and Padding
//!
//! ## Overview
//!
//! Wraps the block cipher in CBC mode for variable-length payloads. Every
//! call draws a fresh IV and emits `IV || C0 || C1 || ...`:
//!
//! ```text
//! C0 = E(P0 ^ IV)
//! Ci = E(Pi ^ Ci-1)
//! ```
//!
//! ## Padding
//!
//! Plaintext is padded PKCS#7-style: `n` bytes of value `n`. Padding is
//! **always** added, so a block-aligned payload grows by a whole block of
//! `0x10`. The receiver depends on this, so it must not be "optimized".
//!
//! ```text
//! len 28  → 4 pad bytes of 0x04  → 32 + 16 IV = 48 bytes on the wire
//! len 32  → 16 pad bytes of 0x10 → 48 + 16 IV = 64 bytes on the wire
//! ```
//!
//! ## Padding Validation
//!
//! [`ChainCoder::decrypt`] only inspects the final plaintext byte: if it is
//! in `1..=16`, that many bytes are dropped, otherwise nothing is. A frame
//! that was not produced by this coder can therefore be silently truncated
//! instead of rejected. There is no authentication tag on the wire, so the
//! receiver cannot tell either way. [`ChainCoder::decrypt_strict`] checks
//! every padding byte and reports [`TelemetryError::PaddingInvalid`]; it
//! narrows the problem but is not an integrity check.
//!
//! ## Working Buffer
//!
//! Output lives in a fixed [`FrameBuffer`]. The coder's capacity (at most
//! [`MAX_FRAME_CAPACITY`]) is checked against `IV + padded length` before
//! any byte is written; oversized input is rejected, never truncated.
//!
//! ## IVs
//!
//! IVs come from an injected [`IvSource`]. Production code uses a CSPRNG
//! ([`RngIvSource`], or [`RngIvSource::os`] with `std`); tests can pin the
//! IV with [`FixedIv`].
//!
//! ```rust
//! use symbion_core::{ChainCoder, FixedIv, Key};
//!
//! let mut coder = ChainCoder::new(FixedIv::zero());
//! let key = Key::zero();
//!
//! let frame = coder.encrypt(b"hello", &key)?;
//! assert_eq!(frame.len(), 16 + 16);
//! assert_eq!(coder.decrypt(&frame, &key)?.as_slice(), b"hello");
//! # Ok::<(), symbion_core::TelemetryError>(())
//! ```

use heapless::Vec;
use rand::{CryptoRng, RngCore};

use crate::cipher::{decrypt_block, encrypt_block, expand_key, Block, ExpandedKey, Key};
use crate::constants::buffers::{MAX_FRAME_CAPACITY, MIN_FRAME_LEN};
use crate::constants::crypto::{BLOCK_SIZE, IV_SIZE};
use crate::errors::{TelemetryError, TelemetryResult};

/// Fixed-capacity buffer for one encrypted frame or its plaintext.
pub type FrameBuffer = Vec<u8, MAX_FRAME_CAPACITY>;

/// Plaintext length after padding. Always adds 1..=16 bytes.
pub const fn padded_len(len: usize) -> usize {
    len + (BLOCK_SIZE - len % BLOCK_SIZE)
}

/// Bytes on the wire for a plaintext of `len` bytes.
pub const fn ciphertext_len(len: usize) -> usize {
    IV_SIZE + padded_len(len)
}

/// Source of per-message initialization vectors
pub trait IvSource {
    /// Produce the IV for the next message.
    fn next_iv(&mut self) -> Block;
}

/// IVs drawn from a cryptographically secure RNG
#[derive(Debug, Clone)]
pub struct RngIvSource<R> {
    rng: R,
}

impl<R: RngCore + CryptoRng> RngIvSource<R> {
    /// Wrap a CSPRNG.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

#[cfg(feature = "std")]
impl RngIvSource<rand::rngs::OsRng> {
    /// IVs from the operating system's entropy source.
    pub fn os() -> Self {
        Self::new(rand::rngs::OsRng)
    }
}

impl<R: RngCore + CryptoRng> IvSource for RngIvSource<R> {
    fn next_iv(&mut self) -> Block {
        let mut iv = [0u8; IV_SIZE];
        self.rng.fill_bytes(&mut iv);
        iv
    }
}

/// Returns the same IV every time
///
/// For known-answer tests and replaying captured frames only. Reusing an
/// IV under one key leaks equality of plaintext prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedIv(pub Block);

impl FixedIv {
    /// The all-zero IV.
    pub const fn zero() -> Self {
        Self([0; IV_SIZE])
    }
}

impl IvSource for FixedIv {
    fn next_iv(&mut self) -> Block {
        self.0
    }
}

/// AES-128-CBC encoder/decoder with always-on padding
#[derive(Debug, Clone)]
pub struct ChainCoder<I> {
    iv_source: I,
    capacity: usize,
}

impl<I: IvSource> ChainCoder<I> {
    /// Coder with the full [`MAX_FRAME_CAPACITY`] working buffer.
    pub fn new(iv_source: I) -> Self {
        Self { iv_source, capacity: MAX_FRAME_CAPACITY }
    }

    /// Coder with a smaller frame budget (IV + padded plaintext).
    pub fn with_capacity(iv_source: I, capacity: usize) -> TelemetryResult<Self> {
        if !(MIN_FRAME_LEN..=MAX_FRAME_CAPACITY).contains(&capacity) {
            return Err(TelemetryError::InvalidConfig {
                reason: "frame capacity outside 32..=256",
            });
        }
        Ok(Self { iv_source, capacity })
    }

    /// Configured frame budget in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Largest plaintext this coder accepts.
    pub fn max_plaintext_len(&self) -> usize {
        // Padding always adds at least one byte
        (self.capacity - IV_SIZE) / BLOCK_SIZE * BLOCK_SIZE - 1
    }

    /// Encrypt `plaintext` under `key`, returning `IV || ciphertext`.
    pub fn encrypt(&mut self, plaintext: &[u8], key: &Key) -> TelemetryResult<FrameBuffer> {
        self.encrypt_with(plaintext, &expand_key(key))
    }

    /// Encrypt with an already expanded key.
    pub fn encrypt_with(
        &mut self,
        plaintext: &[u8],
        schedule: &ExpandedKey,
    ) -> TelemetryResult<FrameBuffer> {
        let padded = padded_len(plaintext.len());
        let required = IV_SIZE + padded;
        let capacity = self.capacity;
        if required > capacity {
            return Err(TelemetryError::BufferOverflowRisk { required, capacity });
        }
        let overflow = |_| TelemetryError::BufferOverflowRisk { required, capacity };

        let iv = self.iv_source.next_iv();
        let mut out = FrameBuffer::new();
        out.extend_from_slice(&iv).map_err(overflow)?;

        let pad = (padded - plaintext.len()) as u8;
        let mut prev = iv;
        for start in (0..padded).step_by(BLOCK_SIZE) {
            let mut block = [pad; BLOCK_SIZE];
            let end = plaintext.len().min(start + BLOCK_SIZE);
            if start < end {
                block[..end - start].copy_from_slice(&plaintext[start..end]);
            }
            xor_in_place(&mut block, &prev);
            prev = encrypt_block(schedule, &block);
            out.extend_from_slice(&prev).map_err(overflow)?;
        }

        Ok(out)
    }

    /// Decrypt `IV || ciphertext`, dropping padding by the last-byte rule.
    ///
    /// Input must be the IV plus at least one whole block (32 bytes or
    /// more, a multiple of 16 after the IV). An IV with no ciphertext
    /// behind it (16 bytes) is [`TelemetryError::InvalidInputLength`], not
    /// an empty plaintext: every frame [`encrypt`](Self::encrypt) produces
    /// carries at least one padding block.
    pub fn decrypt(&self, data: &[u8], key: &Key) -> TelemetryResult<FrameBuffer> {
        self.decrypt_with(data, &expand_key(key))
    }

    /// [`decrypt`](Self::decrypt) with an already expanded key.
    pub fn decrypt_with(&self, data: &[u8], schedule: &ExpandedKey) -> TelemetryResult<FrameBuffer> {
        let mut plain = self.decrypt_raw(data, schedule)?;
        if let Some(&pad) = plain.last() {
            if (1..=BLOCK_SIZE as u8).contains(&pad) {
                plain.truncate(plain.len() - pad as usize);
            }
        }
        Ok(plain)
    }

    /// Decrypt and require well-formed padding.
    ///
    /// Fails with [`TelemetryError::PaddingInvalid`] unless the final `n`
    /// bytes all equal `n` for some `n` in `1..=16`.
    pub fn decrypt_strict(&self, data: &[u8], key: &Key) -> TelemetryResult<FrameBuffer> {
        let mut plain = self.decrypt_raw(data, &expand_key(key))?;
        let pad = plain.last().copied().unwrap_or(0);
        let pad_len = pad as usize;

        let well_formed = (1..=BLOCK_SIZE).contains(&pad_len)
            && plain[plain.len() - pad_len..].iter().all(|&b| b == pad);
        if !well_formed {
            log_warn!("Rejected frame with malformed padding");
            return Err(TelemetryError::PaddingInvalid { value: pad });
        }

        plain.truncate(plain.len() - pad_len);
        Ok(plain)
    }

    /// CBC-decrypt without touching the padding.
    fn decrypt_raw(&self, data: &[u8], schedule: &ExpandedKey) -> TelemetryResult<FrameBuffer> {
        if data.len() < IV_SIZE + BLOCK_SIZE || (data.len() - IV_SIZE) % BLOCK_SIZE != 0 {
            return Err(TelemetryError::InvalidInputLength { len: data.len() });
        }
        if data.len() > self.capacity {
            return Err(TelemetryError::BufferOverflowRisk {
                required: data.len(),
                capacity: self.capacity,
            });
        }

        let (iv, body) = data.split_at(IV_SIZE);
        let mut prev = [0u8; BLOCK_SIZE];
        prev.copy_from_slice(iv);

        let mut out = FrameBuffer::new();
        for chunk in body.chunks_exact(BLOCK_SIZE) {
            let mut sealed = [0u8; BLOCK_SIZE];
            sealed.copy_from_slice(chunk);

            let mut block = decrypt_block(schedule, &sealed);
            xor_in_place(&mut block, &prev);
            out.extend_from_slice(&block).map_err(|_| TelemetryError::BufferOverflowRisk {
                required: data.len(),
                capacity: self.capacity,
            })?;
            prev = sealed;
        }

        Ok(out)
    }
}

fn xor_in_place(block: &mut Block, other: &Block) {
    for (b, o) in block.iter_mut().zip(other) {
        *b ^= o;
    }
}
