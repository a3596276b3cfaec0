//! A minimal symmetric-key BFV layer over Z_Q[X]/(X^n + 1)
//!
//! A [`Context`] fixes the ring degree, the plaintext modulus and an RNS
//! coefficient modulus chain. Values are encrypted under a [`SecretKey`],
//! combined with [`Ciphertext::add`], [`Ciphertext::multiply_plain`] and
//! [`Ciphertext::set_inner_product`], and serialized to bytes.
//!
//! # Example
//!```rust
//! use rand::prelude::*;
//! use rlwe::{Context, SecretKey};
//!
//! let ctx = Context::create().unwrap();
//! let key = SecretKey::new(&ctx);
//! let n = ctx.degree();
//! let p = ctx.plaintext_modulus();
//!
//! let mut rng = rand::rng();
//! let m1: Vec<u64> = (0..n).map(|_| rng.random_range(0..p)).collect();
//! let m2: Vec<u64> = (0..n).map(|_| rng.random_range(0..p)).collect();
//! let sum: Vec<u64> = (0..n).map(|i| rlwe::math::modadd(m1[i], m2[i], p)).collect();
//!
//! let mut x = key.encrypt_slice(&m1).unwrap();
//! let y = key.encrypt_slice(&m2).unwrap();
//! x.add(&ctx, &y).unwrap();
//!
//! let m3 = key.decrypt(&x).unwrap();
//! assert_eq!(m3.coefficients(), &sum[..]);
//!```

pub mod math;
pub mod rq;

mod ciphertext;
mod context;
mod error;
mod evaluator;
mod keys;
mod params;
mod plaintext;
mod serialize;

pub use ciphertext::Ciphertext;
pub use context::{Context, ParmsId};
pub use error::{Error, Result};
pub use evaluator::Evaluator;
pub use keys::{Decryptor, Encryptor, SecretKey};
pub use params::{ContextParams, SecurityLevel};
pub use plaintext::Plaintext;
