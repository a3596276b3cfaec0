//! Homomorphic operations: NTT transforms, addition, plain multiplication
//! and the weighted inner product.

use crate::ciphertext::Ciphertext;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::plaintext::Plaintext;
use tracing::{debug, trace};

/// Stateless operation surface over one [`Context`]
#[derive(Clone, Copy, Debug)]
pub struct Evaluator<'a> {
    context: &'a Context,
}

impl<'a> Evaluator<'a> {
    pub fn new(context: &'a Context) -> Self {
        Self { context }
    }

    /// Fail unless `ct` is a non-empty ciphertext of this context
    fn check(&self, ct: &Ciphertext) -> Result<()> {
        let id = ct
            .parms_id
            .ok_or_else(|| Error::InvalidInput("ciphertext is empty".into()))?;
        self.context.check_parms(&id)
    }

    /// Transform every polynomial of `ct` to NTT form
    pub fn transform_to_ntt(&self, ct: &mut Ciphertext) -> Result<()> {
        self.check(ct)?;
        if ct.is_ntt {
            return Err(Error::InvalidInput("ciphertext is already in NTT form".into()));
        }
        let ring = self.context.ring();
        for poly in ct.polys.iter_mut() {
            ring.ntt(poly);
        }
        ct.is_ntt = true;
        Ok(())
    }

    /// Transform every polynomial of `ct` back to coefficient form
    pub fn transform_from_ntt(&self, ct: &mut Ciphertext) -> Result<()> {
        self.check(ct)?;
        if !ct.is_ntt {
            return Err(Error::InvalidInput("ciphertext is not in NTT form".into()));
        }
        let ring = self.context.ring();
        for poly in ct.polys.iter_mut() {
            ring.intt(poly);
        }
        ct.is_ntt = false;
        Ok(())
    }

    /// Fail unless `pt` belongs to this context and holds a full set of
    /// coefficients, each below p while in coefficient form
    pub(crate) fn check_plain(&self, pt: &Plaintext) -> Result<()> {
        if let Some(id) = pt.parms_id {
            self.context.check_parms(&id)?;
        }
        let expected = if pt.is_ntt {
            self.context.ring().coeff_count()
        } else {
            self.context.degree()
        };
        if pt.data.len() != expected {
            return Err(Error::SlotCount {
                expected,
                actual: pt.data.len(),
            });
        }
        if pt.is_ntt {
            return Ok(());
        }
        let p = self.context.plaintext_modulus();
        match pt.data.iter().position(|&v| v >= p) {
            Some(index) => Err(Error::ValueOutOfRange {
                index,
                value: pt.data[index],
                modulus: p,
            }),
            None => Ok(()),
        }
    }

    /// Lift a coefficient-form plaintext into the ring and transform it
    pub fn transform_plain_to_ntt(&self, pt: &mut Plaintext) -> Result<()> {
        if pt.is_ntt_form() {
            return Err(Error::InvalidInput("plaintext is already in NTT form".into()));
        }
        self.check_plain(pt)?;
        pt.data = self.ntt_weight(&pt.data);
        pt.parms_id = Some(self.context.parms_id());
        pt.is_ntt = true;
        Ok(())
    }

    /// Centered lift of plaintext coefficients, in NTT form
    fn ntt_weight(&self, values: &[u64]) -> Vec<u64> {
        let ring = self.context.ring();
        let mut w = ring.lift_centered(values, self.context.plaintext_modulus());
        ring.ntt(&mut w);
        w
    }

    /// `ct += other`
    pub fn add(&self, ct: &mut Ciphertext, other: &Ciphertext) -> Result<()> {
        self.check(ct)?;
        self.check(other)?;
        if ct.is_ntt != other.is_ntt {
            return Err(Error::DomainMismatch);
        }
        if ct.size() != other.size() {
            return Err(Error::InvalidInput(format!(
                "ciphertext sizes differ: {} and {}",
                ct.size(),
                other.size()
            )));
        }
        trace!(ntt = ct.is_ntt, "add");
        let ring = self.context.ring();
        for (a, b) in ct.polys.iter_mut().zip(&other.polys) {
            ring.add_eq(a, b);
        }
        Ok(())
    }

    /// `ct *= pt`, with both operands in the same domain.
    ///
    /// A zero weight yields a transparent ciphertext, which is returned as a
    /// normal value.
    pub fn multiply_plain(&self, ct: &mut Ciphertext, pt: &Plaintext) -> Result<()> {
        self.check(ct)?;
        if ct.is_ntt != pt.is_ntt_form() {
            return Err(Error::DomainMismatch);
        }
        self.check_plain(pt)?;
        trace!(ntt = ct.is_ntt, "multiply_plain");
        let ring = self.context.ring();
        if pt.is_ntt {
            for poly in ct.polys.iter_mut() {
                ring.mul_eq(poly, &pt.data);
            }
        } else {
            let w = self.ntt_weight(&pt.data);
            for poly in ct.polys.iter_mut() {
                ring.ntt(poly);
                ring.mul_eq(poly, &w);
                ring.intt(poly);
            }
        }

        if ct.is_transparent() {
            debug!("plain multiplication produced a transparent ciphertext");
        }
        Ok(())
    }

    /// Compute Σ ciphertexts[i] * plaintexts[i], accumulating left to right
    pub fn inner_product(
        &self,
        ciphertexts: &[Ciphertext],
        plaintexts: &[Plaintext],
    ) -> Result<Ciphertext> {
        if ciphertexts.len() != plaintexts.len() {
            return Err(Error::InvalidInput(format!(
                "{} ciphertexts but {} plaintexts",
                ciphertexts.len(),
                plaintexts.len()
            )));
        }
        let mut terms = ciphertexts.iter().zip(plaintexts);
        let (ct, pt) = terms
            .next()
            .ok_or_else(|| Error::InvalidInput("inner product of zero terms".into()))?;
        trace!(len = ciphertexts.len(), "inner_product");

        let mut out = ct.clone();
        self.multiply_plain(&mut out, pt)?;
        for (ct, pt) in terms {
            let mut tmp = ct.clone();
            self.multiply_plain(&mut tmp, pt)?;
            self.add(&mut out, &tmp)?;
        }
        Ok(out)
    }
}
