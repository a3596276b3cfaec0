//! Secret key management and symmetric encryption / decryption

use crate::ciphertext::Ciphertext;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::plaintext::Plaintext;
use crate::serialize::{CiphertextBody, Envelope, Kind};
use rand::prelude::*;
use rug::Integer;
use std::fmt;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Ternary secret in NTT form
type Secret = Zeroizing<Vec<u64>>;

/// Symmetric-key encryptor bound to one secret
#[derive(Clone)]
pub struct Encryptor {
    context: Context,
    secret: Secret,
}

impl Encryptor {
    fn new(context: &Context, secret: &Secret) -> Self {
        Self {
            context: context.clone(),
            secret: secret.clone(),
        }
    }

    /// Encrypt a coefficient-form plaintext
    pub fn encrypt(&self, plaintext: &Plaintext) -> Result<Ciphertext> {
        let seed = rand::rng().random();
        let c0 = self.encrypt_seeded(plaintext, &seed)?;
        let c1 = self.context.ring().sample_uniform_from_seed(&seed);
        Ok(Ciphertext::from_parts(&self.context, vec![c0, c1], false))
    }

    /// Compute c0 = -(a * s) + e + round(Q * m / p) for a = expand(seed)
    fn encrypt_seeded(&self, plaintext: &Plaintext, seed: &[u8; 32]) -> Result<Vec<u64>> {
        self.check_plain(plaintext)?;
        let ring = self.context.ring();

        let mut c0 = ring.sample_uniform_from_seed(seed);
        ring.ntt(&mut c0);
        ring.mul_eq(&mut c0, &self.secret);
        ring.intt(&mut c0);
        ring.neg_eq(&mut c0);

        let e = ring.sample_gaussian(&mut rand::rng());
        ring.add_eq(&mut c0, &e);
        ring.add_eq(&mut c0, &self.context.scale_plain(&plaintext.data));
        Ok(c0)
    }

    fn check_plain(&self, plaintext: &Plaintext) -> Result<()> {
        if plaintext.is_ntt_form() {
            return Err(Error::DomainMismatch);
        }
        self.context.evaluator().check_plain(plaintext)
    }

    /// Envelope of a seeded encryption of `plaintext`
    fn seeded_envelope(&self, plaintext: &Plaintext) -> Result<Envelope<CiphertextBody>> {
        let seed = rand::rng().random();
        let c0 = self.encrypt_seeded(plaintext, &seed)?;
        Ok(self.envelope(c0, seed))
    }

    fn envelope(&self, c0: Vec<u64>, seed: [u8; 32]) -> Envelope<CiphertextBody> {
        Envelope::new(
            Kind::Ciphertext,
            self.context.parms_id(),
            CiphertextBody::Seeded { c0, seed },
        )
    }

    /// Exact size of [`Encryptor::encrypt_to_bytes`] output for `plaintext`
    pub fn serialize_size_for(&self, plaintext: &Plaintext) -> Result<usize> {
        self.check_plain(plaintext)?;
        self.envelope(self.context.ring().zero(), [0u8; 32]).size()
    }

    /// Encrypt straight into seeded serialized form, returning the bytes
    /// written. The output loads with [`Ciphertext::load`].
    pub fn encrypt_to_bytes(&self, plaintext: &Plaintext, buf: &mut [u8]) -> Result<usize> {
        let required = self.serialize_size_for(plaintext)?;
        if buf.len() < required {
            return Err(Error::BufferTooSmall {
                required,
                actual: buf.len(),
            });
        }
        self.seeded_envelope(plaintext)?.store(buf)
    }
}

/// Decryptor bound to one secret
#[derive(Clone)]
pub struct Decryptor {
    context: Context,
    secret: Secret,
}

impl Decryptor {
    fn new(context: &Context, secret: &Secret) -> Self {
        Self {
            context: context.clone(),
            secret: secret.clone(),
        }
    }

    /// c0 + c1 * s in coefficient form
    fn phase(&self, ct: &Ciphertext) -> Result<Vec<u64>> {
        let id = ct
            .parms_id()
            .ok_or_else(|| Error::InvalidInput("ciphertext is empty".into()))?;
        self.context.check_parms(&id)?;
        if ct.is_ntt_form() {
            return Err(Error::DomainMismatch);
        }

        let ring = self.context.ring();
        let mut phase = ring.zero();
        let mut power = self.secret.clone();
        for (k, poly) in ct.polys.iter().enumerate() {
            if k == 0 {
                ring.add_eq(&mut phase, poly);
                continue;
            }
            if k > 1 {
                ring.mul_eq(&mut power, &self.secret);
            }
            let mut term = poly.clone();
            ring.ntt(&mut term);
            ring.mul_eq(&mut term, &power);
            ring.intt(&mut term);
            ring.add_eq(&mut phase, &term);
        }
        Ok(phase)
    }

    /// Noise budget in bits of a decryption phase: the headroom left before
    /// the invariant noise reaches 1/2
    fn budget(&self, phase: &[u64]) -> u32 {
        let ring = self.context.ring();
        let mut scaled = phase.to_vec();
        ring.scalar_mul_eq(&mut scaled, self.context.plaintext_modulus());
        let norm = (0..self.context.degree())
            .map(|j| ring.compose_centered(&scaled, j).abs())
            .max()
            .unwrap_or_default();
        self.context
            .q_bits()
            .saturating_sub(norm.significant_bits())
            .saturating_sub(1)
    }

    /// Remaining invariant noise budget of `ct` in bits
    pub fn invariant_noise_budget(&self, ct: &Ciphertext) -> Result<u32> {
        Ok(self.budget(&self.phase(ct)?))
    }

    /// Decrypt a coefficient-form ciphertext.
    ///
    /// Refuses with [`Error::NoiseBudgetExhausted`] once the budget reaches
    /// zero, since the result could no longer be trusted.
    pub fn decrypt(&self, ct: &Ciphertext) -> Result<Plaintext> {
        let phase = self.phase(ct)?;
        if self.budget(&phase) == 0 {
            warn!("noise budget exhausted, refusing to decrypt");
            return Err(Error::NoiseBudgetExhausted);
        }

        let ring = self.context.ring();
        let q = ring.modulus();
        let half = Integer::from(q >> 1u32);
        let p = self.context.plaintext_modulus();
        let data = (0..self.context.degree())
            .map(|j| {
                let mut v = ring.compose(&phase, j) * p;
                v += &half;
                v /= q;
                v %= p;
                v.to_u64_wrapping()
            })
            .collect();

        Ok(Plaintext {
            data,
            parms_id: Some(self.context.parms_id()),
            is_ntt: false,
        })
    }
}

/// A secret ring element together with the encryptor and decryptor bound
/// to it.
///
/// The secret is wiped from memory on drop.
#[derive(Clone)]
pub struct SecretKey {
    context: Context,
    secret: Secret,
    encryptor: Encryptor,
    decryptor: Decryptor,
}

impl SecretKey {
    /// Sample a fresh ternary secret
    pub fn new(context: &Context) -> Self {
        let ring = context.ring();
        let mut s = ring.sample_ternary(&mut rand::rng());
        ring.ntt(&mut s);
        debug!(parms_id = %context.parms_id(), "generated secret key");
        Self::from_secret(context, Zeroizing::new(s))
    }

    fn from_secret(context: &Context, secret: Secret) -> Self {
        Self {
            context: context.clone(),
            encryptor: Encryptor::new(context, &secret),
            decryptor: Decryptor::new(context, &secret),
            secret,
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn encryptor(&self) -> &Encryptor {
        &self.encryptor
    }

    pub fn decryptor(&self) -> &Decryptor {
        &self.decryptor
    }

    /// Symmetric-key encryption of `plaintext`
    pub fn encrypt(&self, plaintext: &Plaintext) -> Result<Ciphertext> {
        self.encryptor.encrypt(plaintext)
    }

    /// Encode `values` and encrypt them
    pub fn encrypt_slice(&self, values: &[u64]) -> Result<Ciphertext> {
        self.encrypt(&Plaintext::from_values(&self.context, values)?)
    }

    /// Fresh encryption of the zero polynomial
    pub fn encrypt_zero(&self) -> Result<Ciphertext> {
        self.encrypt_slice(&vec![0u64; self.context.degree()])
    }

    /// Exact size of [`SecretKey::encrypt_to_bytes`] output for `plaintext`
    pub fn serialize_size_for(&self, plaintext: &Plaintext) -> Result<usize> {
        self.encryptor.serialize_size_for(plaintext)
    }

    /// Encrypt straight into seeded serialized form
    pub fn encrypt_to_bytes(&self, plaintext: &Plaintext, buf: &mut [u8]) -> Result<usize> {
        self.encryptor.encrypt_to_bytes(plaintext, buf)
    }

    /// Encode `values` and encrypt them into a freshly allocated buffer
    pub fn encrypt_slice_to_bytes(&self, values: &[u64]) -> Result<Vec<u8>> {
        let pt = Plaintext::from_values(&self.context, values)?;
        self.encryptor.seeded_envelope(&pt)?.to_bytes()
    }

    pub fn decrypt(&self, ct: &Ciphertext) -> Result<Plaintext> {
        self.decryptor.decrypt(ct)
    }

    pub fn invariant_noise_budget(&self, ct: &Ciphertext) -> Result<u32> {
        self.decryptor.invariant_noise_budget(ct)
    }

    /// Envelope borrowing the secret, so no unwiped copy is made
    fn envelope(&self) -> Envelope<&[u64]> {
        Envelope::new(Kind::SecretKey, self.context.parms_id(), &self.secret[..])
    }

    /// Exact number of bytes [`SecretKey::store`] writes
    pub fn serialize_size(&self) -> Result<usize> {
        self.envelope().size()
    }

    pub fn store(&self, buf: &mut [u8]) -> Result<usize> {
        self.envelope().store(buf)
    }

    pub fn to_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.envelope().to_bytes().map(Zeroizing::new)
    }

    /// Replace the secret with one read from `buf` and rebind the
    /// encryptor and decryptor to it under `context`.
    ///
    /// On error the key is unchanged.
    pub fn load(&mut self, context: &Context, buf: &[u8]) -> Result<()> {
        *self = Self::from_bytes(context, buf)?;
        Ok(())
    }

    pub fn from_bytes(context: &Context, buf: &[u8]) -> Result<Self> {
        let envelope = Envelope::<Secret>::load(context, Kind::SecretKey, buf)?;
        let secret = envelope.body;
        if !context.ring().is_reduced(&secret) {
            return Err(Error::Serialization("secret key out of range".into()));
        }
        debug!(parms_id = %context.parms_id(), "loaded secret key");
        Ok(Self::from_secret(context, secret))
    }
}

// Secret material never reaches Debug output
macro_rules! redacted_debug {
    ($($ty:ident),*) => {$(
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("parms_id", &self.context.parms_id())
                    .finish_non_exhaustive()
            }
        }
    )*};
}

redacted_debug!(Encryptor, Decryptor, SecretKey);
