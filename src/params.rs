//! Encryption parameter configuration and validation

use crate::error::{Error, Result};
use crate::math::{gen_primes, is_prime, lcm};
use rug::Integer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default polynomial modulus degree
pub const DEFAULT_DEGREE: usize = 2048;
/// Default plaintext modulus
pub const DEFAULT_PLAIN_MODULUS: u64 = 65537;
/// Default coefficient modulus chain, as prime bit sizes
pub const DEFAULT_COEFF_MODULUS_BITS: [u32; 1] = [38];
/// Default standard deviation of the error distribution
pub const DEFAULT_NOISE_STD_DEV: f64 = 3.2;

const MIN_DEGREE: usize = 2;
const MAX_DEGREE: usize = 32768;
const MIN_MODULUS_BITS: u32 = 2;
const MAX_MODULUS_BITS: u32 = 60;

/// Security level the coefficient modulus is checked against
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityLevel {
    /// No bound on the coefficient modulus. Insecure, for tests only.
    None,
    /// 128-bit classical security per the HomomorphicEncryption.org standard
    #[default]
    Tc128,
}

impl SecurityLevel {
    /// Largest total coefficient modulus bit count allowed for `degree`
    pub fn max_coeff_modulus_bits(self, degree: usize) -> Option<u32> {
        match self {
            Self::None => Some(u32::MAX),
            Self::Tc128 => match degree {
                1024 => Some(27),
                2048 => Some(54),
                4096 => Some(109),
                8192 => Some(218),
                16384 => Some(438),
                32768 => Some(881),
                _ => None,
            },
        }
    }
}

/// BFV parameter set
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextParams {
    /// Ring degree n, a power of two
    pub degree: usize,
    /// Plaintext modulus p, prime
    pub plain_modulus: u64,
    /// Bit size of each prime in the coefficient modulus chain
    pub coeff_modulus_bits: Vec<u32>,
    /// Security bound enforced on the coefficient modulus
    pub security: SecurityLevel,
    /// Standard deviation of the error distribution
    pub noise_std_dev: f64,
}

impl Default for ContextParams {
    fn default() -> Self {
        Self {
            degree: DEFAULT_DEGREE,
            plain_modulus: DEFAULT_PLAIN_MODULUS,
            coeff_modulus_bits: DEFAULT_COEFF_MODULUS_BITS.to_vec(),
            security: SecurityLevel::default(),
            noise_std_dev: DEFAULT_NOISE_STD_DEV,
        }
    }
}

impl ContextParams {
    /// Check the parameter set and derive its coefficient modulus chain.
    ///
    /// Every prime q_i satisfies q_i ≡ 1 (mod lcm(2n, p)), so the ring
    /// supports the negacyclic NTT and Q ≡ 1 (mod p).
    pub fn validate(&self) -> Result<Vec<u64>> {
        let n = self.degree;
        if !n.is_power_of_two() || !(MIN_DEGREE..=MAX_DEGREE).contains(&n) {
            return Err(invalid(format!(
                "degree {n} must be a power of two in [{MIN_DEGREE}, {MAX_DEGREE}]"
            )));
        }

        if !(self.noise_std_dev.is_finite() && self.noise_std_dev > 0.0) {
            return Err(invalid(format!(
                "noise standard deviation {} must be positive",
                self.noise_std_dev
            )));
        }

        let p = self.plain_modulus;
        if !(2..1u64 << MAX_MODULUS_BITS).contains(&p) || !is_prime(p) {
            return Err(invalid(format!(
                "plaintext modulus {p} must be a prime below 2^{MAX_MODULUS_BITS}"
            )));
        }

        if self.coeff_modulus_bits.is_empty() {
            return Err(invalid("coefficient modulus chain is empty".into()));
        }
        if let Some(bits) = self
            .coeff_modulus_bits
            .iter()
            .find(|b| !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(*b))
        {
            return Err(invalid(format!(
                "coefficient modulus bit size {bits} outside [{MIN_MODULUS_BITS}, {MAX_MODULUS_BITS}]"
            )));
        }

        let total: u32 = self.coeff_modulus_bits.iter().sum();
        match self.security.max_coeff_modulus_bits(n) {
            Some(max) if total <= max => {}
            Some(max) => {
                return Err(invalid(format!(
                    "{total}-bit coefficient modulus exceeds the {max}-bit bound for degree {n}"
                )))
            }
            None => {
                return Err(invalid(format!(
                    "degree {n} has no {:?} security bound",
                    self.security
                )))
            }
        }

        let step = lcm(2 * n as u64, p)
            .ok_or_else(|| invalid("lcm(2n, p) overflows 64 bits".into()))?;

        let mut wanted: BTreeMap<u32, usize> = BTreeMap::new();
        for &bits in &self.coeff_modulus_bits {
            *wanted.entry(bits).or_default() += 1;
        }

        let mut used = vec![p];
        let mut pools: BTreeMap<u32, Vec<u64>> = BTreeMap::new();
        for (&bits, &count) in &wanted {
            let mut primes = gen_primes(bits, step, count, &used);
            if primes.len() < count {
                return Err(invalid(format!(
                    "not enough {bits}-bit primes congruent to 1 mod {step}"
                )));
            }
            used.extend_from_slice(&primes);
            primes.reverse();
            pools.insert(bits, primes);
        }

        let chain: Vec<u64> = self
            .coeff_modulus_bits
            .iter()
            .filter_map(|bits| pools.get_mut(bits).and_then(Vec::pop))
            .collect();

        let mut q = Integer::from(1);
        for &qi in &chain {
            q *= qi;
        }
        if q <= p {
            return Err(invalid(format!(
                "plaintext modulus {p} must be smaller than the coefficient modulus"
            )));
        }

        Ok(chain)
    }
}

fn invalid(msg: String) -> Error {
    Error::InvalidParameters(msg)
}
