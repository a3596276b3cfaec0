//! Byte serialization for ciphertexts and secret keys.
//!
//! Every blob is a bincode-encoded [`Envelope`] (fixed-width little-endian
//! integers, no compression): a magic number, a format version, a kind tag
//! and the parameter identifier, followed by the payload. Sizes are exact
//! and known before writing.

use crate::context::{Context, ParmsId};
use crate::error::{Error, Result};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const MAGIC: u16 = 0xB5F1;
const VERSION: u8 = 1;

/// What an envelope carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum Kind {
    Ciphertext,
    SecretKey,
}

/// Ciphertext payloads
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) enum CiphertextBody {
    /// Every polynomial written out
    Full { is_ntt: bool, polys: Vec<Vec<u64>> },
    /// Fresh symmetric encryption: c1 is regenerated from `seed`
    Seeded { c0: Vec<u64>, seed: [u8; 32] },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct Envelope<T> {
    magic: u16,
    version: u8,
    kind: Kind,
    parms_id: ParmsId,
    pub(crate) body: T,
}

impl<T: Serialize> Envelope<T> {
    pub(crate) fn new(kind: Kind, parms_id: ParmsId, body: T) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            kind,
            parms_id,
            body,
        }
    }

    /// Exact number of bytes [`Envelope::store`] writes
    pub(crate) fn size(&self) -> Result<usize> {
        Ok(options().serialized_size(self)? as usize)
    }

    /// Write into the front of `buf`, returning the number of bytes used
    pub(crate) fn store(&self, buf: &mut [u8]) -> Result<usize> {
        let required = self.size()?;
        if buf.len() < required {
            return Err(Error::BufferTooSmall {
                required,
                actual: buf.len(),
            });
        }
        options().serialize_into(&mut buf[..required], self)?;
        Ok(required)
    }

    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(options().serialize(self)?)
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Parse an envelope of the given kind produced under `context`
    pub(crate) fn load(context: &Context, kind: Kind, buf: &[u8]) -> Result<Self> {
        let envelope: Self = options().with_limit(buf.len() as u64).deserialize(buf)?;
        if envelope.magic != MAGIC {
            return Err(Error::Serialization(format!(
                "bad magic {:#06x}",
                envelope.magic
            )));
        }
        if envelope.version != VERSION {
            return Err(Error::Serialization(format!(
                "unsupported version {}",
                envelope.version
            )));
        }
        if envelope.kind != kind {
            return Err(Error::Serialization(format!(
                "expected {kind:?}, found {:?}",
                envelope.kind
            )));
        }
        context.check_parms(&envelope.parms_id)?;
        Ok(envelope)
    }
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_size() {
        let ctx = Context::create().unwrap();
        let env = Envelope::new(Kind::SecretKey, ctx.parms_id(), vec![1u64, 2, 3]);
        let size = env.size().unwrap();
        let bytes = env.to_bytes().unwrap();
        assert_eq!(bytes.len(), size);

        let mut buf = vec![0u8; size + 10];
        assert_eq!(env.store(&mut buf).unwrap(), size);
        assert_eq!(&buf[..size], &bytes[..]);

        let loaded: Envelope<Vec<u64>> = Envelope::load(&ctx, Kind::SecretKey, &buf).unwrap();
        assert_eq!(loaded.body, vec![1, 2, 3]);
    }

    #[test]
    fn test_store_short_buffer() {
        let ctx = Context::create().unwrap();
        let env = Envelope::new(Kind::SecretKey, ctx.parms_id(), vec![0u64; 4]);
        let mut buf = vec![0u8; env.size().unwrap() - 1];
        assert!(matches!(
            env.store(&mut buf),
            Err(Error::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn test_load_rejects_kind_and_truncation() {
        let ctx = Context::create().unwrap();
        let bytes = Envelope::new(Kind::SecretKey, ctx.parms_id(), vec![9u64; 4])
            .to_bytes()
            .unwrap();

        assert!(matches!(
            Envelope::<Vec<u64>>::load(&ctx, Kind::Ciphertext, &bytes),
            Err(Error::Serialization(_))
        ));
        assert!(matches!(
            Envelope::<Vec<u64>>::load(&ctx, Kind::SecretKey, &bytes[..bytes.len() - 1]),
            Err(Error::Serialization(_))
        ));

        let mut corrupt = bytes.clone();
        corrupt[0] ^= 0xff;
        assert!(Envelope::<Vec<u64>>::load(&ctx, Kind::SecretKey, &corrupt).is_err());
    }
}
