use rug::integer::IsPrime;
use rug::Integer;

/// Miller-Rabin repetitions used when testing candidate moduli
const PRIME_REPS: u32 = 40;

/// Returns a * b mod m
pub fn modmul(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

/// Returns a + b mod m for a, b < m
pub fn modadd(a: u64, b: u64, m: u64) -> u64 {
    let s = a + b;
    if s >= m {
        s - m
    } else {
        s
    }
}

/// Returns a - b mod m for a, b < m
pub fn modsub(a: u64, b: u64, m: u64) -> u64 {
    if a >= b {
        a - b
    } else {
        a + m - b
    }
}

/// Returns -a mod m for a < m
pub fn modneg(a: u64, m: u64) -> u64 {
    if a == 0 {
        0
    } else {
        m - a
    }
}

/// Returns a^b mod m
pub fn modexp(x: u64, y: u64, m: u64) -> u64 {
    let (mut i, mut r, mut z) = (y, 1u64 % m, x % m);
    while i != 0 {
        if i & 1 == 1 {
            r = modmul(r, z, m);
        }
        z = modmul(z, z, m);
        i >>= 1;
    }
    r
}

/// Returns a^-1 mod m for prime m
pub fn modinv(a: u64, m: u64) -> u64 {
    modexp(a, m - 2, m)
}

/// Returns a * 2^64 mod m
pub fn to_montgomery(a: u64, m: u64) -> u64 {
    (((a as u128) << 64) % m as u128) as u64
}

/// Returns the low and high bits of a * b
pub fn mul64(a: u64, b: u64) -> (u64, u64) {
    let c = a as u128 * b as u128;
    (c as u64, (c >> 64) as u64)
}

/// Returns a^-1 mod 2^64 for odd a
pub fn inv(a: u64) -> u64 {
    let (mut r, mut m) = (1u64, 2u64);
    while m != 0 {
        r |= a.wrapping_mul(r) & m;
        m <<= 1;
    }
    r
}

/// Montgomery product a * b * 2^-64 mod q, with b already in Montgomery form
#[inline]
fn montmul(a: u64, b: u64, q: u64, qinv: u64) -> u64 {
    let (lo, hi) = mul64(a, b);
    let (_, carry) = mul64(lo.wrapping_mul(qinv), q);
    if hi < carry {
        hi + q - carry
    } else {
        hi - carry
    }
}

/// Greatest common divisor
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Least common multiple, `None` on overflow
pub fn lcm(a: u64, b: u64) -> Option<u64> {
    (a / gcd(a, b)).checked_mul(b)
}

/// Probabilistic primality test backed by GMP
pub fn is_prime(p: u64) -> bool {
    Integer::from(p).is_probably_prime(PRIME_REPS) != IsPrime::No
}

/// Returns up to `count` distinct `bits`-bit primes of the form
/// p = k * m + 1, largest first, skipping any listed in `exclude`
pub fn gen_primes(bits: u32, m: u64, count: usize, exclude: &[u64]) -> Vec<u64> {
    let mut out = Vec::with_capacity(count);
    if !(2..=62).contains(&bits) || m == 0 {
        return out;
    }
    let lower = 1u64 << (bits - 1);
    let upper = 1u64 << bits;
    let mut k = (upper - 2) / m;
    while out.len() < count && k > 0 {
        let candidate = k * m + 1;
        if candidate < lower {
            break;
        }
        if !exclude.contains(&candidate) && is_prime(candidate) {
            out.push(candidate);
        }
        k -= 1;
    }
    out
}

/// Returns a primitive m-th root of unity mod prime q, with m a power of two
/// dividing q - 1
pub fn find_primitive_root(q: u64, m: u64) -> Option<u64> {
    if m < 2 || !m.is_power_of_two() || (q - 1) % m != 0 {
        return None;
    }
    let cofactor = (q - 1) / m;
    // r has order exactly m iff r^(m/2) = -1, i.e. g is a non-residue
    (2..q).find_map(|g| {
        let r = modexp(g, cofactor, q);
        (modexp(r, m >> 1, q) == q - 1).then_some(r)
    })
}

/// Reverses the low `log_n` bits of `j`
pub fn bit_reverse(j: usize, log_n: u32) -> usize {
    if log_n == 0 {
        return 0;
    }
    j.reverse_bits() >> (usize::BITS - log_n)
}

/// Compute the forward negacyclic NTT in place.
///
/// `roots[k]` holds psi^bitrev(k) in Montgomery form; output is in
/// bit-reversed order.
pub fn ntt(roots: &[u64], x: &mut [u64], q: u64, qinv: u64) {
    let n = x.len();
    let (mut m, mut t) = (1usize, n >> 1);
    while m < n {
        let mut k = 0;
        for i in 0..m {
            let s = roots[m + i];
            for j in k..k + t {
                let v = montmul(x[j + t], s, q, qinv);
                let u = x[j];
                x[j] = modadd(u, v, q);
                x[j + t] = modsub(u, v, q);
            }
            k += t << 1;
        }
        m <<= 1;
        t >>= 1;
    }
}

/// Compute the inverse negacyclic NTT in place.
///
/// `iroots[k]` holds psi^-bitrev(k) and `ninv` holds n^-1, both in
/// Montgomery form. Input is expected in bit-reversed order.
pub fn intt(iroots: &[u64], x: &mut [u64], q: u64, qinv: u64, ninv: u64) {
    let n = x.len();
    let (mut m, mut t) = (n >> 1, 1usize);
    while m > 0 {
        let mut k = 0;
        for i in 0..m {
            let s = iroots[m + i];
            for j in k..k + t {
                let u = x[j];
                let v = x[j + t];
                x[j] = modadd(u, v, q);
                x[j + t] = montmul(modsub(u, v, q), s, q, qinv);
            }
            k += t << 1;
        }
        m >>= 1;
        t <<= 1;
    }

    for c in x.iter_mut() {
        *c = montmul(*c, ninv, q, qinv);
    }
}
