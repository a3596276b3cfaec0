use crate::error::{Error, Result};
use crate::math::*;
use rand::prelude::*;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Normal};
use rug::Integer;

/// Clipping bound of the error distribution, in standard deviations
const MAX_DEVIATIONS: f64 = 6.0;

/// Defines the polynomial ring Z_Q[X]/(X^n + 1) in RNS form.
///
/// A ring element is a flat vector of `limbs * n` residues where residue
/// `i * n + j` is coefficient `j` modulo `q_i`.
#[derive(Debug)]
pub struct Rq {
    /// Polynomial degree
    n: usize,
    /// RNS primes q_i
    qi: Vec<u64>,
    /// Ciphertext modulus Q
    q: Integer,
    /// Q/2
    q_half: Integer,
    /// Q/q_i
    q_over_qi: Vec<Integer>,
    /// [Q/q_i]^-1 mod q_i
    q_over_qi_inv: Vec<u64>,
    /// [q_i]^-1 mod 2^64
    qi_inv: Vec<u64>,
    /// [n]_{q_i}^-1 in Montgomery form
    ninv: Vec<u64>,
    /// Powers of psi_i in bit-reversed order, Montgomery form
    roots: Vec<u64>,
    /// Powers of psi_i^-1 in bit-reversed order, Montgomery form
    iroots: Vec<u64>,
    /// Error distribution
    normal: Normal<f64>,
    /// Largest error magnitude accepted by the sampler
    max_dev: f64,
}

impl Rq {
    /// Initialize a polynomial ring over the given NTT-friendly primes
    pub fn new(n: usize, qi: &[u64], sigma: f64) -> Result<Self> {
        let l = qi.len();
        let nn = 2 * n as u64;
        let log_n = n.ilog2();
        let mut roots = vec![0u64; l * n];
        let mut iroots = vec![0u64; l * n];
        let mut qi_inv = Vec::with_capacity(l);
        let mut ninv = Vec::with_capacity(l);

        for (i, &q) in qi.iter().enumerate() {
            let root = find_primitive_root(q, nn).ok_or_else(|| {
                Error::InvalidParameters(format!("no primitive {nn}-th root of unity mod {q}"))
            })?;
            let iroot = modinv(root, q);

            qi_inv.push(inv(q));
            ninv.push(to_montgomery(modinv(n as u64 % q, q), q));

            let (mut power, mut ipower) = (1u64, 1u64);
            for j in 0..n {
                let index = i * n + bit_reverse(j, log_n);
                roots[index] = to_montgomery(power, q);
                iroots[index] = to_montgomery(ipower, q);
                power = modmul(power, root, q);
                ipower = modmul(ipower, iroot, q);
            }
        }

        let mut q = Integer::from(1);
        for &p in qi {
            q *= p;
        }
        let q_half = q.clone() / 2;

        let mut q_over_qi = Vec::with_capacity(l);
        let mut q_over_qi_inv = Vec::with_capacity(l);
        for &p in qi {
            let quotient = q.clone() / p;
            let residue = Integer::from(&quotient % p).to_u64_wrapping();
            q_over_qi_inv.push(modinv(residue, p));
            q_over_qi.push(quotient);
        }

        let normal = Normal::new(0.0, sigma)
            .map_err(|e| Error::InvalidParameters(format!("noise distribution: {e}")))?;

        Ok(Self {
            n,
            qi: qi.to_vec(),
            q,
            q_half,
            q_over_qi,
            q_over_qi_inv,
            qi_inv,
            ninv,
            roots,
            iroots,
            normal,
            max_dev: MAX_DEVIATIONS * sigma,
        })
    }

    /// RNS primes
    pub fn moduli(&self) -> &[u64] {
        &self.qi
    }

    /// Ciphertext modulus Q
    pub fn modulus(&self) -> &Integer {
        &self.q
    }

    /// Number of residues in one ring element
    pub fn coeff_count(&self) -> usize {
        self.qi.len() * self.n
    }

    /// Zero polynomial
    pub fn zero(&self) -> Vec<u64> {
        vec![0u64; self.coeff_count()]
    }

    /// Lift a polynomial over Z_t into RNS form, mapping coefficients
    /// above t/2 to their negative representative
    pub fn lift_centered(&self, x: &[u64], t: u64) -> Vec<u64> {
        let threshold = (t + 1) >> 1;
        let mut out = self.zero();
        for (i, &q) in self.qi.iter().enumerate() {
            for (o, &c) in out[i * self.n..(i + 1) * self.n].iter_mut().zip(x) {
                *o = if c >= threshold {
                    modneg((t - c) % q, q)
                } else {
                    c % q
                };
            }
        }
        out
    }

    /// Compute the forward NTT of every limb
    pub fn ntt(&self, x: &mut [u64]) {
        for (i, chunk) in x.chunks_exact_mut(self.n).enumerate() {
            let offset = i * self.n;
            ntt(
                &self.roots[offset..offset + self.n],
                chunk,
                self.qi[i],
                self.qi_inv[i],
            );
        }
    }

    /// Compute the inverse NTT of every limb
    pub fn intt(&self, x: &mut [u64]) {
        for (i, chunk) in x.chunks_exact_mut(self.n).enumerate() {
            let offset = i * self.n;
            intt(
                &self.iroots[offset..offset + self.n],
                chunk,
                self.qi[i],
                self.qi_inv[i],
                self.ninv[i],
            );
        }
    }

    /// Add a polynomial
    pub fn add_eq(&self, a: &mut [u64], b: &[u64]) {
        self.zip_limbs(a, b, modadd);
    }

    /// Multiply a polynomial by a scalar
    pub fn scalar_mul_eq(&self, a: &mut [u64], c: u64) {
        for (chunk, &q) in a.chunks_exact_mut(self.n).zip(&self.qi) {
            let c = c % q;
            for x in chunk.iter_mut() {
                *x = modmul(*x, c, q);
            }
        }
    }

    /// Multiply two polynomials in NTT form
    pub fn mul_eq(&self, a: &mut [u64], b: &[u64]) {
        self.zip_limbs(a, b, modmul);
    }

    /// Negate a polynomial
    pub fn neg_eq(&self, a: &mut [u64]) {
        for (chunk, &q) in a.chunks_exact_mut(self.n).zip(&self.qi) {
            for c in chunk.iter_mut() {
                *c = modneg(*c, q);
            }
        }
    }

    fn zip_limbs(&self, a: &mut [u64], b: &[u64], f: fn(u64, u64, u64) -> u64) {
        for ((x, y), &q) in a
            .chunks_exact_mut(self.n)
            .zip(b.chunks_exact(self.n))
            .zip(&self.qi)
        {
            for (u, &v) in x.iter_mut().zip(y) {
                *u = f(*u, v, q);
            }
        }
    }

    /// Returns whether every residue lies below its prime
    pub fn is_reduced(&self, x: &[u64]) -> bool {
        x.len() == self.coeff_count()
            && x
                .chunks_exact(self.n)
                .zip(&self.qi)
                .all(|(chunk, &q)| chunk.iter().all(|&c| c < q))
    }

    /// Reconstruct coefficient `j` of a coefficient-form polynomial in [0, Q)
    pub fn compose(&self, x: &[u64], j: usize) -> Integer {
        if self.qi.len() == 1 {
            return Integer::from(x[j]);
        }
        let mut u = Integer::new();
        for (i, &q) in self.qi.iter().enumerate() {
            let v = modmul(x[i * self.n + j], self.q_over_qi_inv[i], q);
            u += &self.q_over_qi[i] * Integer::from(v);
        }
        u % &self.q
    }

    /// Reconstruct coefficient `j` centered in (-Q/2, Q/2]
    pub fn compose_centered(&self, x: &[u64], j: usize) -> Integer {
        let mut u = self.compose(x, j);
        if u > self.q_half {
            u -= &self.q;
        }
        u
    }

    /// Sample a polynomial with uniformly random residues
    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<u64> {
        let mut x = self.zero();
        for (chunk, &q) in x.chunks_exact_mut(self.n).zip(&self.qi) {
            for c in chunk.iter_mut() {
                *c = rng.random_range(0..q);
            }
        }
        x
    }

    /// Expand a seed into a uniformly random polynomial
    pub fn sample_uniform_from_seed(&self, seed: &[u8; 32]) -> Vec<u64> {
        let mut rng = ChaCha20Rng::from_seed(*seed);
        self.sample_uniform(&mut rng)
    }

    /// Sample a polynomial with random coefficients in the range {-1, 0, 1}
    pub fn sample_ternary<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<u64> {
        let s: Vec<i64> = (0..self.n).map(|_| rng.random_range(-1..2)).collect();
        self.from_signed(&s)
    }

    /// Sample a polynomial with coefficients from a clipped rounded gaussian
    pub fn sample_gaussian<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<u64> {
        let s: Vec<i64> = (0..self.n)
            .map(|_| loop {
                let v = self.normal.sample(rng);
                if v.abs() <= self.max_dev {
                    break v.round() as i64;
                }
            })
            .collect();
        self.from_signed(&s)
    }

    /// Map small signed coefficients into RNS form
    fn from_signed(&self, s: &[i64]) -> Vec<u64> {
        let mut x = self.zero();
        for (chunk, &q) in x.chunks_exact_mut(self.n).zip(&self.qi) {
            for (c, &v) in chunk.iter_mut().zip(s) {
                let r = v.unsigned_abs() % q;
                *c = if v < 0 { modneg(r, q) } else { r };
            }
        }
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 256;
    const SIGMA: f64 = 3.2;

    fn ring(limbs: usize) -> Rq {
        let qi = gen_primes(40, 2 * N as u64, limbs, &[]);
        Rq::new(N, &qi, SIGMA).unwrap()
    }

    #[test]
    fn test_compose() {
        let r = ring(3);
        let v: Vec<u64> = (0..N).map(|_| rand::rng().random_range(0..65537)).collect();
        // every value sits below t/2, so the centered lift keeps it positive
        let x = r.lift_centered(&v, 1 << 20);
        for (j, &c) in v.iter().enumerate() {
            assert_eq!(r.compose(&x, j), c);
        }
    }

    #[test]
    fn test_lift_centered() {
        let r = ring(2);
        let t = 17;
        let v: Vec<u64> = (0..N as u64).map(|j| j % t).collect();
        let x = r.lift_centered(&v, t);
        for (j, &c) in v.iter().enumerate() {
            let expected = if c > t / 2 {
                Integer::from(c) - t
            } else {
                Integer::from(c)
            };
            assert_eq!(r.compose_centered(&x, j), expected);
        }
    }

    #[test]
    fn test_ntt_roundtrip() {
        let r = ring(2);
        let x = r.sample_uniform(&mut rand::rng());
        let mut y = x.clone();
        r.ntt(&mut y);
        r.intt(&mut y);
        assert_eq!(x, y);
    }

    #[test]
    fn test_mul_by_monomial() {
        let r = ring(2);
        let mut coeffs = vec![0u64; N];
        coeffs[N - 1] = 1;
        let mut a = r.lift_centered(&coeffs, 3);
        let mut x = a.clone();
        r.ntt(&mut a);
        r.ntt(&mut x);
        // X^(n-1) * X^(n-1) = X^(2n-2) = -X^(n-2)
        r.mul_eq(&mut a, &x);
        r.intt(&mut a);
        assert_eq!(r.compose_centered(&a, N - 2), -1);
        assert_eq!((0..N).filter(|&j| r.compose(&a, j) != 0).count(), 1);
    }

    #[test]
    fn test_add_neg() {
        let r = ring(2);
        let mut rng = rand::rng();
        let a = r.sample_uniform(&mut rng);
        let b = r.sample_uniform(&mut rng);

        let mut c = a.clone();
        r.add_eq(&mut c, &b);
        let mut minus_b = b.clone();
        r.neg_eq(&mut minus_b);
        r.add_eq(&mut c, &minus_b);
        assert_eq!(c, a);

        let mut d = a.clone();
        r.neg_eq(&mut d);
        r.add_eq(&mut d, &a);
        assert_eq!(d, r.zero());
    }

    #[test]
    fn test_scalar_mul() {
        let r = ring(2);
        let v: Vec<u64> = (0..N as u64).map(|j| j % 17).collect();
        let mut x = r.lift_centered(&v, 17);
        r.scalar_mul_eq(&mut x, 65537);
        for (j, &c) in v.iter().enumerate() {
            let c = if c > 8 { Integer::from(c) - 17 } else { Integer::from(c) };
            assert_eq!(r.compose_centered(&x, j), c * 65537u64);
        }
    }

    #[test]
    fn test_samplers() {
        let r = ring(2);
        let mut rng = rand::rng();
        let bound = (MAX_DEVIATIONS * SIGMA).round() as i64;

        let e = r.sample_gaussian(&mut rng);
        assert!(r.is_reduced(&e));
        for j in 0..N {
            let c = r.compose_centered(&e, j);
            assert!(c.to_i64().unwrap().abs() <= bound);
        }

        let s = r.sample_ternary(&mut rng);
        for j in 0..N {
            let c = r.compose_centered(&s, j).to_i64().unwrap();
            assert!((-1..=1).contains(&c));
        }
    }

    #[test]
    fn test_seeded_uniform() {
        let r = ring(2);
        let seed = [7u8; 32];
        let a = r.sample_uniform_from_seed(&seed);
        assert_eq!(a, r.sample_uniform_from_seed(&seed));
        assert_ne!(a, r.sample_uniform_from_seed(&[8u8; 32]));
        assert!(r.is_reduced(&a));
    }
}
