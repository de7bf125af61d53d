//! Chunked XChaCha20-Poly1305 stream format shared by the keyed privacy strategies.
//!
//! Layout:
//!
//! ```text
//! header := MAGIC(4) || strategy_id(1) || strategy_header(n) || nonce_prefix(19)
//! frame  := len(u32 BE) || ciphertext+tag(len)
//! nonce  := nonce_prefix(19) || chunk_index(u32 BE) || last_flag(1)
//! ```
//!
//! Every frame authenticates the whole header as associated data, and the
//! last-chunk flag is bound into the nonce, so truncation, reordering, header
//! tampering and a wrong key are all detected. At most one chunk is buffered.

use std::io::{self, Read};

use chacha20poly1305::aead::{Aead, Payload};
use chacha20poly1305::{KeyInit, XChaCha20Poly1305, XNonce};
use rand::RngCore;
use ss_core::content::ByteStream;
use ss_core::privacy::PrivacyError;
use zeroize::Zeroizing;

pub(crate) const MAGIC: &[u8; 4] = b"SXP1";
pub(crate) const CHUNK_SIZE: usize = 64 * 1024;
pub(crate) const KEY_LEN: usize = 32;

const NONCE_PREFIX_LEN: usize = 19;
const TAG_LEN: usize = 16;
const MAX_FRAME_LEN: usize = CHUNK_SIZE + TAG_LEN;

pub(crate) type StreamKey = Zeroizing<[u8; KEY_LEN]>;

/// Parsed stream header. `extra` is the strategy-specific part (for example a KDF salt).
pub(crate) struct StreamHeader {
    raw: Vec<u8>,
    extra_range: std::ops::Range<usize>,
    nonce_prefix: [u8; NONCE_PREFIX_LEN],
}

impl StreamHeader {
    pub(crate) fn extra(&self) -> &[u8] {
        &self.raw[self.extra_range.clone()]
    }
}

fn chunk_nonce(prefix: &[u8; NONCE_PREFIX_LEN], index: u32, last: bool) -> XNonce {
    let mut nonce = [0u8; 24];
    nonce[..NONCE_PREFIX_LEN].copy_from_slice(prefix);
    nonce[NONCE_PREFIX_LEN..NONCE_PREFIX_LEN + 4].copy_from_slice(&index.to_be_bytes());
    nonce[23] = u8::from(last);
    XNonce::clone_from_slice(&nonce)
}

fn decryption_error(msg: impl Into<String>) -> io::Error {
    io::Error::other(PrivacyError::Decryption(msg.into()))
}

/// Reads until `buf` is full or the stream ends; returns the number of bytes read.
fn read_full(inner: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match inner.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn read_chunk(inner: &mut dyn Read) -> io::Result<Vec<u8>> {
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let n = read_full(inner, &mut chunk)?;
    chunk.truncate(n);
    Ok(chunk)
}

fn new_cipher(key: &[u8; KEY_LEN]) -> Result<XChaCha20Poly1305, PrivacyError> {
    XChaCha20Poly1305::new_from_slice(key)
        .map_err(|_| PrivacyError::InvalidKey("stream key must be 32 bytes".to_string()))
}

/// Wraps `inner` into an encrypting stream. Nothing is read until the result is read.
pub(crate) fn encrypt_stream(
    inner: ByteStream,
    strategy_id: u8,
    strategy_header: &[u8],
    key: &[u8; KEY_LEN],
) -> Result<ByteStream, PrivacyError> {
    let cipher = new_cipher(key)?;

    let mut nonce_prefix = [0u8; NONCE_PREFIX_LEN];
    rand::rng().fill_bytes(&mut nonce_prefix);

    let mut header = Vec::with_capacity(MAGIC.len() + 1 + strategy_header.len() + NONCE_PREFIX_LEN);
    header.extend_from_slice(MAGIC);
    header.push(strategy_id);
    header.extend_from_slice(strategy_header);
    header.extend_from_slice(&nonce_prefix);

    Ok(Box::new(EncryptingReader {
        inner,
        cipher,
        nonce_prefix,
        out: header.clone(),
        header,
        out_pos: 0,
        chunk_index: 0,
        pending: None,
        finished: false,
    }))
}

/// Reads and checks the stream header. `extra_len` is the size of the strategy header.
pub(crate) fn read_header(
    inner: &mut dyn Read,
    strategy_id: u8,
    extra_len: usize,
) -> Result<StreamHeader, PrivacyError> {
    let total = MAGIC.len() + 1 + extra_len + NONCE_PREFIX_LEN;
    let mut raw = vec![0u8; total];
    let n = read_full(inner, &mut raw)
        .map_err(|e| PrivacyError::Decryption(format!("failed to read stream header: {e}")))?;
    if n < total {
        return Err(PrivacyError::Decryption(
            "stream is too short to carry an encryption header".to_string(),
        ));
    }
    if &raw[..MAGIC.len()] != MAGIC {
        return Err(PrivacyError::Decryption(
            "stream was not produced by a keyed privacy strategy".to_string(),
        ));
    }
    if raw[MAGIC.len()] != strategy_id {
        return Err(PrivacyError::Decryption(format!(
            "stream was encrypted with strategy {}, expected {}",
            raw[MAGIC.len()],
            strategy_id
        )));
    }

    let extra_start = MAGIC.len() + 1;
    let extra_range = extra_start..extra_start + extra_len;
    let mut nonce_prefix = [0u8; NONCE_PREFIX_LEN];
    nonce_prefix.copy_from_slice(&raw[extra_range.end..]);

    Ok(StreamHeader {
        raw,
        extra_range,
        nonce_prefix,
    })
}

/// Wraps `inner` (positioned right after the header) into a decrypting stream.
///
/// The first frame is authenticated before returning, so a wrong key or a foreign
/// stream fails here rather than on the first read.
pub(crate) fn decrypt_stream(
    inner: ByteStream,
    header: StreamHeader,
    key: &[u8; KEY_LEN],
) -> Result<ByteStream, PrivacyError> {
    let cipher = new_cipher(key)?;
    let mut reader = DecryptingReader {
        inner,
        cipher,
        header,
        out: Zeroizing::new(Vec::new()),
        out_pos: 0,
        chunk_index: 0,
        finished: false,
    };

    reader.next_frame().map_err(|e| match e.downcast::<PrivacyError>() {
        Ok(privacy) => privacy,
        Err(other) => PrivacyError::Decryption(format!("failed to read first frame: {other}")),
    })?;

    Ok(Box::new(reader))
}

struct EncryptingReader {
    inner: ByteStream,
    cipher: XChaCha20Poly1305,
    nonce_prefix: [u8; NONCE_PREFIX_LEN],
    header: Vec<u8>,
    out: Vec<u8>,
    out_pos: usize,
    chunk_index: u32,
    /// One chunk of lookahead, needed to know whether the current chunk is the last.
    pending: Option<Vec<u8>>,
    finished: bool,
}

impl EncryptingReader {
    fn next_frame(&mut self) -> io::Result<()> {
        let chunk = Zeroizing::new(match self.pending.take() {
            Some(chunk) => chunk,
            None => read_chunk(&mut self.inner)?,
        });

        let last = if chunk.len() < CHUNK_SIZE {
            true
        } else {
            let next = read_chunk(&mut self.inner)?;
            if next.is_empty() {
                true
            } else {
                self.pending = Some(next);
                false
            }
        };

        let nonce = chunk_nonce(&self.nonce_prefix, self.chunk_index, last);
        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: &chunk,
                    aad: &self.header,
                },
            )
            .map_err(|_| {
                io::Error::other(PrivacyError::Encryption("chunk encryption failed".to_string()))
            })?;

        self.chunk_index = self.chunk_index.checked_add(1).ok_or_else(|| {
            io::Error::other(PrivacyError::Encryption("stream has too many chunks".to_string()))
        })?;

        self.out.clear();
        self.out
            .extend_from_slice(&(ciphertext.len() as u32).to_be_bytes());
        self.out.extend_from_slice(&ciphertext);
        self.out_pos = 0;
        self.finished = last;
        Ok(())
    }
}

impl Read for EncryptingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.out_pos < self.out.len() {
                let n = buf.len().min(self.out.len() - self.out_pos);
                buf[..n].copy_from_slice(&self.out[self.out_pos..self.out_pos + n]);
                self.out_pos += n;
                return Ok(n);
            }
            if self.finished {
                return Ok(0);
            }
            self.next_frame()?;
        }
    }
}

struct DecryptingReader {
    inner: ByteStream,
    cipher: XChaCha20Poly1305,
    header: StreamHeader,
    out: Zeroizing<Vec<u8>>,
    out_pos: usize,
    chunk_index: u32,
    finished: bool,
}

impl DecryptingReader {
    fn next_frame(&mut self) -> io::Result<()> {
        let mut len_buf = [0u8; 4];
        let n = read_full(&mut self.inner, &mut len_buf)?;
        if n < len_buf.len() {
            return Err(decryption_error("stream is truncated"));
        }
        let frame_len = u32::from_be_bytes(len_buf) as usize;
        if !(TAG_LEN..=MAX_FRAME_LEN).contains(&frame_len) {
            return Err(decryption_error(format!("invalid frame length {frame_len}")));
        }

        let mut frame = vec![0u8; frame_len];
        if read_full(&mut self.inner, &mut frame)? < frame_len {
            return Err(decryption_error("stream is truncated"));
        }

        let (plaintext, last) = [false, true]
            .into_iter()
            .find_map(|last| {
                let nonce = chunk_nonce(&self.header.nonce_prefix, self.chunk_index, last);
                self.cipher
                    .decrypt(
                        &nonce,
                        Payload {
                            msg: &frame,
                            aad: &self.header.raw,
                        },
                    )
                    .ok()
                    .map(|plaintext| (plaintext, last))
            })
            .ok_or_else(|| {
                decryption_error("authentication failed: wrong key or corrupted content")
            })?;

        if last {
            let mut trailing = [0u8; 1];
            if read_full(&mut self.inner, &mut trailing)? != 0 {
                return Err(decryption_error("unexpected data after the final chunk"));
            }
        }

        self.chunk_index = self
            .chunk_index
            .checked_add(1)
            .ok_or_else(|| decryption_error("stream has too many chunks"))?;
        self.out = Zeroizing::new(plaintext);
        self.out_pos = 0;
        self.finished = last;
        Ok(())
    }
}

impl Read for DecryptingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.out_pos < self.out.len() {
                let n = buf.len().min(self.out.len() - self.out_pos);
                buf[..n].copy_from_slice(&self.out[self.out_pos..self.out_pos + n]);
                self.out_pos += n;
                return Ok(n);
            }
            if self.finished {
                return Ok(0);
            }
            self.next_frame()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ID: u8 = 7;

    fn key(byte: u8) -> [u8; KEY_LEN] {
        [byte; KEY_LEN]
    }

    fn seal(plaintext: &[u8], extra: &[u8], key: &[u8; KEY_LEN]) -> Vec<u8> {
        let mut out = Vec::new();
        encrypt_stream(Box::new(Cursor::new(plaintext.to_vec())), ID, extra, key)
            .expect("encrypt stream")
            .read_to_end(&mut out)
            .expect("read ciphertext");
        out
    }

    fn open(ciphertext: Vec<u8>, extra_len: usize, key: &[u8; KEY_LEN]) -> Result<Vec<u8>, PrivacyError> {
        let mut inner: ByteStream = Box::new(Cursor::new(ciphertext));
        let header = read_header(&mut inner, ID, extra_len)?;
        let mut stream = decrypt_stream(inner, header, key)?;
        let mut out = Vec::new();
        stream.read_to_end(&mut out).map_err(|e| match e.downcast::<PrivacyError>() {
            Ok(privacy) => privacy,
            Err(other) => PrivacyError::Decryption(other.to_string()),
        })?;
        Ok(out)
    }

    #[test]
    fn roundtrip_across_chunk_boundaries() {
        for len in [0, 1, CHUNK_SIZE - 1, CHUNK_SIZE, CHUNK_SIZE + 1, 3 * CHUNK_SIZE] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let sealed = seal(&plaintext, b"salt", &key(1));
            let opened = open(sealed, 4, &key(1)).expect("decrypt");
            assert_eq!(opened, plaintext, "length {len}");
        }
    }

    #[test]
    fn header_extra_is_recoverable() {
        let sealed = seal(b"data", b"0123456789abcdef", &key(1));
        let mut inner: &[u8] = &sealed;
        let header = read_header(&mut inner, ID, 16).expect("header");
        assert_eq!(header.extra(), b"0123456789abcdef");
    }

    #[test]
    fn wrong_key_fails_at_decrypt_time() {
        let sealed = seal(b"secret", &[], &key(1));
        let mut inner: ByteStream = Box::new(Cursor::new(sealed));
        let header = read_header(&mut inner, ID, 0).expect("header");
        let result = decrypt_stream(inner, header, &key(2));
        assert!(matches!(result, Err(PrivacyError::Decryption(_))));
    }

    #[test]
    fn dropping_the_final_frame_is_detected() {
        let plaintext = vec![9u8; 2 * CHUNK_SIZE];
        let sealed = seal(&plaintext, &[], &key(1));
        let header_len = MAGIC.len() + 1 + NONCE_PREFIX_LEN;
        let first_frame_len = 4 + CHUNK_SIZE + TAG_LEN;
        let truncated = sealed[..header_len + first_frame_len].to_vec();

        let err = open(truncated, 0, &key(1)).unwrap_err();
        assert!(matches!(err, PrivacyError::Decryption(_)));
    }

    #[test]
    fn tampered_header_is_detected() {
        let mut sealed = seal(b"hello", b"salt", &key(1));
        sealed[5] ^= 0x01;
        let err = open(sealed, 4, &key(1)).unwrap_err();
        assert!(matches!(err, PrivacyError::Decryption(_)));
    }

    #[test]
    fn foreign_stream_is_rejected() {
        let err = open(b"just some plain bytes that are long enough".to_vec(), 0, &key(1))
            .unwrap_err();
        assert!(matches!(err, PrivacyError::Decryption(_)));
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let mut sealed = seal(b"hello", &[], &key(1));
        sealed.push(0);
        let err = open(sealed, 0, &key(1)).unwrap_err();
        assert!(matches!(err, PrivacyError::Decryption(_)));
    }

    #[test]
    fn encryption_is_randomized() {
        let a = seal(b"same", &[], &key(1));
        let b = seal(b"same", &[], &key(1));
        assert_ne!(a, b);
    }
}
