use crate::context::{Context, ParmsId};
use crate::error::{Error, Result};

/// An encoded integer vector over the plaintext modulus.
///
/// Starts out in coefficient form holding one value in [0, p) per ring
/// coefficient. [`Plaintext::to_ntt`] moves it, one way, into the NTT form
/// used as the weight operand of plain multiplication.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plaintext {
    pub(crate) data: Vec<u64>,
    /// Parameter set the values were checked against
    pub(crate) parms_id: Option<ParmsId>,
    pub(crate) is_ntt: bool,
}

impl Plaintext {
    /// Empty plaintext in coefficient form
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a plaintext from raw values
    pub fn from_values(context: &Context, values: &[u64]) -> Result<Self> {
        let mut pt = Self::new();
        pt.set(context, values)?;
        Ok(pt)
    }

    /// Replace the contents with `values`, which must hold exactly n
    /// entries, each below the plaintext modulus.
    ///
    /// Values are never reduced; an out-of-range value is an error and
    /// leaves the plaintext untouched.
    pub fn set(&mut self, context: &Context, values: &[u64]) -> Result<()> {
        let n = context.degree();
        if values.len() != n {
            return Err(Error::SlotCount {
                expected: n,
                actual: values.len(),
            });
        }
        let p = context.plaintext_modulus();
        if let Some((index, &value)) = values.iter().enumerate().find(|&(_, &v)| v >= p) {
            return Err(Error::ValueOutOfRange {
                index,
                value,
                modulus: p,
            });
        }

        self.data.clear();
        self.data.extend_from_slice(values);
        self.parms_id = Some(context.parms_id());
        self.is_ntt = false;
        Ok(())
    }

    /// Copy the coefficients into `out`, zero-filling any remaining entries
    pub fn dump(&self, out: &mut [u64]) -> Result<()> {
        if out.len() < self.data.len() {
            return Err(Error::BufferTooSmall {
                required: self.data.len(),
                actual: out.len(),
            });
        }
        let (head, tail) = out.split_at_mut(self.data.len());
        head.copy_from_slice(&self.data);
        tail.fill(0);
        Ok(())
    }

    /// Transform to NTT form in place. There is no way back.
    pub fn to_ntt(&mut self, context: &Context) -> Result<()> {
        context.evaluator().transform_plain_to_ntt(self)
    }

    /// Current coefficients (RNS residues once in NTT form)
    pub fn coefficients(&self) -> &[u64] {
        &self.data
    }

    pub fn coeff_count(&self) -> usize {
        self.data.len()
    }

    /// Parameter set this plaintext was built under, if any
    pub fn parms_id(&self) -> Option<ParmsId> {
        self.parms_id
    }

    pub fn is_ntt_form(&self) -> bool {
        self.is_ntt
    }

    /// Whether every coefficient is zero
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&c| c == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn test_set_dump() {
        let ctx = Context::create().unwrap();
        let n = ctx.degree();
        let p = ctx.plaintext_modulus();
        let mut rng = rand::rng();
        let v: Vec<u64> = (0..n).map(|_| rng.random_range(0..p)).collect();

        let pt = Plaintext::from_values(&ctx, &v).unwrap();
        assert_eq!(pt.coeff_count(), n);
        assert!(!pt.is_ntt_form());
        assert_eq!(pt.parms_id(), Some(ctx.parms_id()));

        let mut out = vec![u64::MAX; n + 5];
        pt.dump(&mut out).unwrap();
        assert_eq!(&out[..n], &v[..]);
        assert!(out[n..].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_dump_short_buffer() {
        let ctx = Context::create().unwrap();
        let pt = Plaintext::from_values(&ctx, &vec![1u64; ctx.degree()]).unwrap();
        let mut out = vec![0u64; ctx.degree() - 1];
        assert!(matches!(
            pt.dump(&mut out),
            Err(Error::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn test_set_wrong_count() {
        let ctx = Context::create().unwrap();
        let mut pt = Plaintext::new();
        let err = pt.set(&ctx, &[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            Error::SlotCount {
                expected: 2048,
                actual: 3
            }
        ));
        assert_eq!(pt.coeff_count(), 0);
    }

    #[test]
    fn test_set_out_of_range() {
        let ctx = Context::create().unwrap();
        let p = ctx.plaintext_modulus();
        let mut v = vec![0u64; ctx.degree()];
        let mut pt = Plaintext::from_values(&ctx, &v).unwrap();

        v[17] = p;
        let err = pt.set(&ctx, &v).unwrap_err();
        assert!(matches!(
            err,
            Error::ValueOutOfRange {
                index: 17,
                value,
                modulus,
            } if value == p && modulus == p
        ));
        assert!(pt.is_zero());
    }

    #[test]
    fn test_to_ntt() {
        let ctx = Context::create().unwrap();
        let mut v = vec![0u64; ctx.degree()];
        v[0] = 3;
        let mut pt = Plaintext::from_values(&ctx, &v).unwrap();
        pt.to_ntt(&ctx).unwrap();
        assert!(pt.is_ntt_form());
        // a constant transforms to the same constant in every slot
        assert!(pt.coefficients().iter().all(|&c| c == 3));
        assert!(matches!(pt.to_ntt(&ctx), Err(Error::InvalidInput(_))));
    }
}
