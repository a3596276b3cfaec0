//! Encryption context: a validated parameter set and its derived constants

use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::params::ContextParams;
use crate::rq::Rq;
use rug::Integer;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Identifies a parameter set.
///
/// Plaintexts in NTT form, ciphertexts and keys carry the identifier of the
/// context they were produced under and are rejected by any other context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParmsId([u8; 32]);

impl ParmsId {
    fn compute(degree: usize, plain_modulus: u64, chain: &[u64]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((degree as u64).to_le_bytes());
        hasher.update(plain_modulus.to_le_bytes());
        for q in chain {
            hasher.update(q.to_le_bytes());
        }
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for ParmsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..8] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct ContextData {
    params: ContextParams,
    parms_id: ParmsId,
    ring: Rq,
    /// floor(Q/p) mod q_i
    delta: Vec<u64>,
    /// Q mod p
    q_mod_p: u64,
    /// Sum of the bit lengths of the chain
    logq: usize,
    /// Significant bits of Q
    q_bits: u32,
}

/// Holds a BFV parameter set and everything derived from it.
///
/// A context is immutable. Cloning is cheap and every clone refers to the
/// same parameters, so it can be shared freely between threads.
#[derive(Clone, Debug)]
pub struct Context {
    data: Arc<ContextData>,
}

impl Context {
    /// Build the reference context: n = 2048, p = 65537, one 38-bit prime
    pub fn create() -> Result<Self> {
        Self::new(ContextParams::default())
    }

    /// Build a context from an explicit parameter set
    pub fn new(params: ContextParams) -> Result<Self> {
        let chain = params.validate()?;
        let n = params.degree;
        let p = params.plain_modulus;
        let ring = Rq::new(n, &chain, params.noise_std_dev)?;

        let q = ring.modulus();
        let floor = Integer::from(q / p);
        let delta = chain
            .iter()
            .map(|&qi| Integer::from(&floor % qi).to_u64_wrapping())
            .collect();
        let q_mod_p = Integer::from(q % p).to_u64_wrapping();
        let q_bits = q.significant_bits();
        let logq = chain.iter().map(|q| (u64::BITS - q.leading_zeros()) as usize).sum();

        let parms_id = ParmsId::compute(n, p, &chain);
        debug!(degree = n, plain_modulus = p, ?chain, %parms_id, "created BFV context");

        Ok(Self {
            data: Arc::new(ContextData {
                params,
                parms_id,
                ring,
                delta,
                q_mod_p,
                logq,
                q_bits,
            }),
        })
    }

    /// Ring degree n
    pub fn degree(&self) -> usize {
        self.data.params.degree
    }

    /// Plaintext modulus p
    pub fn plaintext_modulus(&self) -> u64 {
        self.data.params.plain_modulus
    }

    /// Total bit length of the coefficient modulus chain
    pub fn modulus_bit_length(&self) -> usize {
        self.data.logq
    }

    /// Primes of the coefficient modulus chain
    pub fn coeff_modulus(&self) -> &[u64] {
        self.data.ring.moduli()
    }

    pub fn params(&self) -> &ContextParams {
        &self.data.params
    }

    pub fn parms_id(&self) -> ParmsId {
        self.data.parms_id
    }

    /// Whether p ≡ 1 (mod 2n), i.e. the plaintext ring splits into n slots
    pub fn supports_batching(&self) -> bool {
        self.plaintext_modulus() % (2 * self.degree() as u64) == 1
    }

    /// Human readable summary of the parameters, for debugging
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Homomorphic operations bound to this context
    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(self)
    }

    pub(crate) fn ring(&self) -> &Rq {
        &self.data.ring
    }

    pub(crate) fn q_bits(&self) -> u32 {
        self.data.q_bits
    }

    /// Fail unless `id` names this context's parameter set
    pub(crate) fn check_parms(&self, id: &ParmsId) -> Result<()> {
        if *id == self.data.parms_id {
            Ok(())
        } else {
            Err(Error::ParameterMismatch)
        }
    }

    /// Compute round(Q * m / p) in RNS form for a plaintext polynomial m
    pub(crate) fn scale_plain(&self, m: &[u64]) -> Vec<u64> {
        let ring = self.ring();
        let n = self.degree();
        let p = self.plaintext_modulus() as u128;
        let half = p >> 1;
        let mut out = ring.zero();
        for (i, &q) in ring.moduli().iter().enumerate() {
            let d = self.data.delta[i] as u128;
            let q = q as u128;
            for (o, &c) in out[i * n..(i + 1) * n].iter_mut().zip(m) {
                let fraction = (self.data.q_mod_p as u128 * c as u128 + half) / p;
                *o = ((d * c as u128 + fraction) % q) as u64;
            }
        }
        out
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BFV Encryption:")?;
        writeln!(f, "  Polynomial modulus degree: n = {}", self.degree())?;
        writeln!(f, "  Coefficient modulus: q = {}-bits", self.modulus_bit_length())?;
        writeln!(f, "  Plaintext modulus: p = {}", self.plaintext_modulus())?;
        writeln!(f, "  Batching supported: {}", self.supports_batching())?;
        write!(f, "  Parameter validation (success): valid, id {}", self.parms_id())
    }
}
