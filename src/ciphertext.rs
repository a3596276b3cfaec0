use crate::context::{Context, ParmsId};
use crate::error::{Error, Result};
use crate::plaintext::Plaintext;
use crate::serialize::{CiphertextBody, Envelope, Kind};

/// Number of polynomials in a freshly encrypted ciphertext
pub(crate) const FRESH_SIZE: usize = 2;

/// An encrypted polynomial pair (c0, c1) with c0 + c1 * s = Δm + e.
///
/// A default-constructed ciphertext is empty and only becomes usable once
/// produced by encryption, an inner product, or [`Ciphertext::load`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ciphertext {
    /// c0, c1, ... each with `limbs * n` residues
    pub(crate) polys: Vec<Vec<u64>>,
    pub(crate) parms_id: Option<ParmsId>,
    pub(crate) is_ntt: bool,
}

impl Ciphertext {
    /// Empty ciphertext
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(context: &Context, polys: Vec<Vec<u64>>, is_ntt: bool) -> Self {
        Self {
            polys,
            parms_id: Some(context.parms_id()),
            is_ntt,
        }
    }

    /// Make `self` an independent copy of `src`
    pub fn copy_from(&mut self, src: &Ciphertext) {
        self.clone_from(src);
    }

    /// Parameter set this ciphertext was produced under, if any
    pub fn parms_id(&self) -> Option<ParmsId> {
        self.parms_id
    }

    /// Number of polynomials
    pub fn size(&self) -> usize {
        self.polys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polys.is_empty()
    }

    pub fn is_ntt_form(&self) -> bool {
        self.is_ntt
    }

    /// Whether every polynomial past c0 is zero, so the ciphertext no longer
    /// hides its content. Multiplying by a zero plaintext produces one.
    pub fn is_transparent(&self) -> bool {
        !self.is_empty() && self.polys[1..].iter().all(|p| p.iter().all(|&c| c == 0))
    }

    /// Transform to NTT form in place
    pub fn to_ntt(&mut self, context: &Context) -> Result<()> {
        context.evaluator().transform_to_ntt(self)
    }

    /// Transform back to coefficient form in place
    pub fn from_ntt(&mut self, context: &Context) -> Result<()> {
        context.evaluator().transform_from_ntt(self)
    }

    /// Multiply in place by an unencrypted plaintext in the same domain
    pub fn multiply_plain(&mut self, context: &Context, plaintext: &Plaintext) -> Result<()> {
        context.evaluator().multiply_plain(self, plaintext)
    }

    /// Add another ciphertext in place
    pub fn add(&mut self, context: &Context, other: &Ciphertext) -> Result<()> {
        context.evaluator().add(self, other)
    }

    /// Set `self` to Σ ciphertexts[i] * plaintexts[i].
    ///
    /// The inputs are left untouched, and so is `self` if any term fails.
    pub fn set_inner_product(
        &mut self,
        context: &Context,
        ciphertexts: &[Ciphertext],
        plaintexts: &[Plaintext],
    ) -> Result<()> {
        *self = context.evaluator().inner_product(ciphertexts, plaintexts)?;
        Ok(())
    }

    fn envelope(&self) -> Result<Envelope<CiphertextBody>> {
        let parms_id = self
            .parms_id
            .ok_or_else(|| Error::InvalidInput("ciphertext is empty".into()))?;
        let body = CiphertextBody::Full {
            is_ntt: self.is_ntt,
            polys: self.polys.clone(),
        };
        Ok(Envelope::new(Kind::Ciphertext, parms_id, body))
    }

    /// Exact number of bytes [`Ciphertext::store`] writes
    pub fn serialize_size(&self) -> Result<usize> {
        self.envelope()?.size()
    }

    /// Serialize into the front of `buf`, returning the bytes written
    pub fn store(&self, buf: &mut [u8]) -> Result<usize> {
        self.envelope()?.store(buf)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.envelope()?.to_bytes()
    }

    /// Replace `self` with a ciphertext read from `buf`.
    ///
    /// Accepts both full and seeded encodings. On error `self` is unchanged.
    pub fn load(&mut self, context: &Context, buf: &[u8]) -> Result<()> {
        *self = Self::from_bytes(context, buf)?;
        Ok(())
    }

    pub fn from_bytes(context: &Context, buf: &[u8]) -> Result<Self> {
        let envelope = Envelope::<CiphertextBody>::load(context, Kind::Ciphertext, buf)?;
        let ring = context.ring();
        let corrupt = || Error::Serialization("ciphertext polynomial out of range".into());

        match envelope.body {
            CiphertextBody::Full { is_ntt, polys } => {
                if polys.len() < FRESH_SIZE {
                    return Err(Error::Serialization(format!(
                        "ciphertext has {} polynomials",
                        polys.len()
                    )));
                }
                if !polys.iter().all(|p| ring.is_reduced(p)) {
                    return Err(corrupt());
                }
                Ok(Self::from_parts(context, polys, is_ntt))
            }
            CiphertextBody::Seeded { c0, seed } => {
                if !ring.is_reduced(&c0) {
                    return Err(corrupt());
                }
                let c1 = ring.sample_uniform_from_seed(&seed);
                Ok(Self::from_parts(context, vec![c0, c1], false))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SecretKey;
    use crate::params::{ContextParams, SecurityLevel};

    fn encrypt_iota(ctx: &Context, key: &SecretKey) -> (Vec<u64>, Ciphertext) {
        let v: Vec<u64> = (0..ctx.degree() as u64).collect();
        let ct = key.encrypt_slice(&v).unwrap();
        (v, ct)
    }

    #[test]
    fn test_empty() {
        let ct = Ciphertext::new();
        assert!(ct.is_empty());
        assert!(!ct.is_transparent());
        assert!(ct.parms_id().is_none());
        assert!(matches!(ct.serialize_size(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_copy() {
        let ctx = Context::create().unwrap();
        let key = SecretKey::new(&ctx);
        let (v, mut ct) = encrypt_iota(&ctx, &key);

        let mut ct2 = Ciphertext::new();
        ct2.copy_from(&ct);
        assert_eq!(ct, ct2);

        // mutating the source must not leak into the copy
        ct.add(&ctx, &ct2).unwrap();
        assert_ne!(ct, ct2);
        assert_eq!(key.decrypt(&ct2).unwrap().coefficients(), &v[..]);
    }

    #[test]
    fn test_store_load() {
        let ctx = Context::create().unwrap();
        let key = SecretKey::new(&ctx);
        let (v, ct) = encrypt_iota(&ctx, &key);

        let size = ct.serialize_size().unwrap();
        let mut buf = vec![0u8; size];
        assert_eq!(ct.store(&mut buf).unwrap(), size);

        let mut ct2 = Ciphertext::new();
        ct2.load(&ctx, &buf).unwrap();
        assert_eq!(ct, ct2);
        assert_eq!(key.decrypt(&ct2).unwrap().coefficients(), &v[..]);
    }

    #[test]
    fn test_store_load_ntt() {
        let ctx = Context::create().unwrap();
        let key = SecretKey::new(&ctx);
        let (v, mut ct) = encrypt_iota(&ctx, &key);
        ct.to_ntt(&ctx).unwrap();

        let mut ct2 = Ciphertext::from_bytes(&ctx, &ct.to_bytes().unwrap()).unwrap();
        assert!(ct2.is_ntt_form());
        ct2.from_ntt(&ctx).unwrap();
        assert_eq!(key.decrypt(&ct2).unwrap().coefficients(), &v[..]);
    }

    #[test]
    fn test_store_short_buffer() {
        let ctx = Context::create().unwrap();
        let key = SecretKey::new(&ctx);
        let (_, ct) = encrypt_iota(&ctx, &key);
        let mut buf = vec![0u8; ct.serialize_size().unwrap() - 1];
        assert!(matches!(
            ct.store(&mut buf),
            Err(Error::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn test_load_failure_keeps_target() {
        let ctx = Context::create().unwrap();
        let key = SecretKey::new(&ctx);
        let (v, ct) = encrypt_iota(&ctx, &key);
        let bytes = ct.to_bytes().unwrap();

        let mut target = ct.clone();
        assert!(target.load(&ctx, &bytes[..bytes.len() / 2]).is_err());
        assert_eq!(target, ct);

        // last residue of c1 pushed past its prime
        let mut corrupt = bytes.clone();
        let tail = corrupt.len() - 8;
        corrupt[tail..].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            target.load(&ctx, &corrupt),
            Err(Error::Serialization(_))
        ));
        assert_eq!(key.decrypt(&target).unwrap().coefficients(), &v[..]);
    }

    #[test]
    fn test_load_other_context() {
        let ctx = Context::create().unwrap();
        let other = Context::new(ContextParams {
            coeff_modulus_bits: vec![40],
            security: SecurityLevel::None,
            ..Default::default()
        })
        .unwrap();
        let key = SecretKey::new(&ctx);
        let (_, ct) = encrypt_iota(&ctx, &key);

        assert!(matches!(
            Ciphertext::from_bytes(&other, &ct.to_bytes().unwrap()),
            Err(Error::ParameterMismatch)
        ));
    }
}
