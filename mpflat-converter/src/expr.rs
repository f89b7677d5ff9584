//! Linear and quadratic terms of flat constraints.
//!
//! Terms are kept as parallel coefficient and variable arrays. Hashing
//! treats `-0.0` and `0.0` alike so that structurally equal expressions
//! collide in the functional-constraint maps.

use crate::var::VarId;
use std::hash::{Hash, Hasher};

/// Hash an `f64` so that values comparing equal hash equally.
pub(crate) fn hash_f64<H: Hasher>(x: f64, state: &mut H) {
    let bits = if x == 0.0 { 0u64 } else { x.to_bits() };
    bits.hash(state);
}

/// Sum of `coef * var` terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinTerms {
    coefs: Vec<f64>,
    vars: Vec<VarId>,
}

impl Eq for LinTerms {}

impl Hash for LinTerms {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coefs.len().hash(state);
        for (&c, v) in self.coefs.iter().zip(&self.vars) {
            hash_f64(c, state);
            v.hash(state);
        }
    }
}

impl LinTerms {
    /// Empty sum.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parallel arrays.
    #[must_use]
    pub fn from_parts(coefs: Vec<f64>, vars: Vec<VarId>) -> Self {
        assert_eq!(coefs.len(), vars.len(), "coefficient and variable counts differ");
        Self { coefs, vars }
    }

    /// Build from `(coef, var)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, VarId)>) -> Self {
        let (coefs, vars) = pairs.into_iter().unzip();
        Self { coefs, vars }
    }

    /// Single term `coef * var`.
    #[must_use]
    pub fn single(coef: f64, var: VarId) -> Self {
        Self {
            coefs: vec![coef],
            vars: vec![var],
        }
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.coefs.len()
    }

    /// Whether there are no terms.
    pub fn is_empty(&self) -> bool {
        self.coefs.is_empty()
    }

    /// Coefficients.
    pub fn coefs(&self) -> &[f64] {
        &self.coefs
    }

    /// Variables.
    pub fn vars(&self) -> &[VarId] {
        &self.vars
    }

    /// Iterate over `(coef, var)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, VarId)> + '_ {
        self.coefs.iter().copied().zip(self.vars.iter().copied())
    }

    /// Append a term.
    pub fn add_term(&mut self, coef: f64, var: VarId) {
        self.coefs.push(coef);
        self.vars.push(var);
    }

    /// Append all terms of `other`.
    pub fn add(&mut self, other: &LinTerms) {
        self.coefs.extend_from_slice(&other.coefs);
        self.vars.extend_from_slice(&other.vars);
    }

    /// Multiply every coefficient by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for c in &mut self.coefs {
            *c *= factor;
        }
    }

    /// Negate every coefficient.
    pub fn negate(&mut self) {
        self.scale(-1.0);
    }

    /// Sort by variable, merge duplicates and drop zero coefficients.
    pub fn sort_terms(&mut self) {
        let mut pairs: Vec<(VarId, f64)> = self.vars.iter().copied().zip(self.coefs.iter().copied()).collect();
        pairs.sort_by_key(|&(v, _)| v);
        self.coefs.clear();
        self.vars.clear();
        for (v, c) in pairs {
            if self.vars.last() == Some(&v) {
                if let Some(last) = self.coefs.last_mut() {
                    *last += c;
                }
            } else {
                self.vars.push(v);
                self.coefs.push(c);
            }
        }
        let mut k = 0;
        for i in 0..self.coefs.len() {
            if self.coefs[i] != 0.0 {
                self.coefs[k] = self.coefs[i];
                self.vars[k] = self.vars[i];
                k += 1;
            }
        }
        self.coefs.truncate(k);
        self.vars.truncate(k);
    }

    /// Sorted copy.
    #[must_use]
    pub fn sorted(mut self) -> Self {
        self.sort_terms();
        self
    }
}

/// Sum of `coef * var1 * var2` terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadTerms {
    coefs: Vec<f64>,
    vars1: Vec<VarId>,
    vars2: Vec<VarId>,
}

impl Eq for QuadTerms {}

impl Hash for QuadTerms {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coefs.len().hash(state);
        for i in 0..self.coefs.len() {
            hash_f64(self.coefs[i], state);
            self.vars1[i].hash(state);
            self.vars2[i].hash(state);
        }
    }
}

impl QuadTerms {
    /// Empty sum.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(coef, var1, var2)` triples.
    pub fn from_triples(triples: impl IntoIterator<Item = (f64, VarId, VarId)>) -> Self {
        let mut q = Self::new();
        for (c, a, b) in triples {
            q.add_term(c, a, b);
        }
        q
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.coefs.len()
    }

    /// Whether there are no terms.
    pub fn is_empty(&self) -> bool {
        self.coefs.is_empty()
    }

    /// Iterate over `(coef, var1, var2)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (f64, VarId, VarId)> + '_ {
        (0..self.coefs.len()).map(move |i| (self.coefs[i], self.vars1[i], self.vars2[i]))
    }

    /// Append a term.
    pub fn add_term(&mut self, coef: f64, var1: VarId, var2: VarId) {
        self.coefs.push(coef);
        self.vars1.push(var1);
        self.vars2.push(var2);
    }

    /// Append all terms of `other`.
    pub fn add(&mut self, other: &QuadTerms) {
        self.coefs.extend_from_slice(&other.coefs);
        self.vars1.extend_from_slice(&other.vars1);
        self.vars2.extend_from_slice(&other.vars2);
    }

    /// Multiply every coefficient by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for c in &mut self.coefs {
            *c *= factor;
        }
    }

    /// Negate every coefficient.
    pub fn negate(&mut self) {
        self.scale(-1.0);
    }

    /// Order each pair, sort, merge duplicates and drop zeros.
    pub fn sort_terms(&mut self) {
        let mut triples: Vec<((VarId, VarId), f64)> = self
            .iter()
            .map(|(c, a, b)| (if a <= b { (a, b) } else { (b, a) }, c))
            .collect();
        triples.sort_by_key(|&(k, _)| k);
        self.coefs.clear();
        self.vars1.clear();
        self.vars2.clear();
        let mut last: Option<(VarId, VarId)> = None;
        for ((a, b), c) in triples {
            if last == Some((a, b)) {
                if let Some(lc) = self.coefs.last_mut() {
                    *lc += c;
                }
            } else {
                self.add_term(c, a, b);
                last = Some((a, b));
            }
        }
        let kept: Vec<(f64, VarId, VarId)> = self.iter().filter(|t| t.0 != 0.0).collect();
        *self = Self::from_triples(kept);
    }

    /// Every variable appearing in a term, with repetitions.
    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.vars1.iter().chain(self.vars2.iter()).copied()
    }
}

/// Linear plus quadratic terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QuadAndLinTerms {
    /// Linear part
    pub lin: LinTerms,
    /// Quadratic part
    pub quad: QuadTerms,
}

impl QuadAndLinTerms {
    /// Combine parts.
    #[must_use]
    pub fn new(lin: LinTerms, quad: QuadTerms) -> Self {
        Self { lin, quad }
    }

    /// Negate all coefficients.
    pub fn negate(&mut self) {
        self.lin.negate();
        self.quad.negate();
    }

    /// Sort both parts.
    pub fn sort_terms(&mut self) {
        self.lin.sort_terms();
        self.quad.sort_terms();
    }

    /// Every variable appearing, with repetitions.
    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.lin.vars().iter().copied().chain(self.quad.vars())
    }
}

/// Linear terms plus a constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffineExpr {
    /// Linear part
    pub terms: LinTerms,
    /// Constant term
    pub constant: f64,
}

impl Eq for AffineExpr {}

impl Hash for AffineExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.terms.hash(state);
        hash_f64(self.constant, state);
    }
}

impl AffineExpr {
    /// Combine parts.
    #[must_use]
    pub fn new(terms: LinTerms, constant: f64) -> Self {
        Self { terms, constant }
    }

    /// Constant expression.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(LinTerms::new(), value)
    }

    /// Expression `1 * var`.
    #[must_use]
    pub fn variable(var: VarId) -> Self {
        Self::new(LinTerms::single(1.0, var), 0.0)
    }

    /// Whether there are no terms.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// The variable if the expression is exactly `1 * var + 0`.
    pub fn as_variable(&self) -> Option<VarId> {
        (self.constant == 0.0 && self.terms.len() == 1 && self.terms.coefs()[0] == 1.0)
            .then(|| self.terms.vars()[0])
    }

    /// Add another affine expression.
    pub fn add(&mut self, other: &AffineExpr) {
        self.terms.add(&other.terms);
        self.constant += other.constant;
    }

    /// Multiply by a constant.
    pub fn scale(&mut self, factor: f64) {
        self.terms.scale(factor);
        self.constant *= factor;
    }

    /// Negate.
    pub fn negate(&mut self) {
        self.scale(-1.0);
    }

    /// Sort the terms.
    pub fn sort_terms(&mut self) {
        self.terms.sort_terms();
    }
}

/// Quadratic and linear terms plus a constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadraticExpr {
    /// Linear and quadratic terms
    pub terms: QuadAndLinTerms,
    /// Constant term
    pub constant: f64,
}

impl Eq for QuadraticExpr {}

impl Hash for QuadraticExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.terms.hash(state);
        hash_f64(self.constant, state);
    }
}

impl From<AffineExpr> for QuadraticExpr {
    fn from(a: AffineExpr) -> Self {
        Self {
            terms: QuadAndLinTerms::new(a.terms, QuadTerms::new()),
            constant: a.constant,
        }
    }
}

impl QuadraticExpr {
    /// Combine parts.
    #[must_use]
    pub fn new(terms: QuadAndLinTerms, constant: f64) -> Self {
        Self { terms, constant }
    }

    /// Whether the quadratic part is empty.
    pub fn is_affine(&self) -> bool {
        self.terms.quad.is_empty()
    }

    /// Split off the affine part if there are no quadratic terms.
    pub fn into_affine(self) -> Result<AffineExpr, Self> {
        if self.is_affine() {
            Ok(AffineExpr::new(self.terms.lin, self.constant))
        } else {
            Err(self)
        }
    }

    /// Add another quadratic expression.
    pub fn add(&mut self, other: &QuadraticExpr) {
        self.terms.lin.add(&other.terms.lin);
        self.terms.quad.add(&other.terms.quad);
        self.constant += other.constant;
    }

    /// Multiply by a constant.
    pub fn scale(&mut self, factor: f64) {
        self.terms.lin.scale(factor);
        self.terms.quad.scale(factor);
        self.constant *= factor;
    }

    /// Negate.
    pub fn negate(&mut self) {
        self.scale(-1.0);
    }

    /// Sort both parts.
    pub fn sort_terms(&mut self) {
        self.terms.sort_terms();
    }

    /// Product of two affine expressions.
    #[must_use]
    pub fn product(a: &AffineExpr, b: &AffineExpr) -> Self {
        let mut out = QuadraticExpr::default();
        for (ca, va) in a.terms.iter() {
            for (cb, vb) in b.terms.iter() {
                out.terms.quad.add_term(ca * cb, va, vb);
            }
            out.terms.lin.add_term(ca * b.constant, va);
        }
        for (cb, vb) in b.terms.iter() {
            out.terms.lin.add_term(a.constant * cb, vb);
        }
        out.constant = a.constant * b.constant;
        out.sort_terms();
        out
    }
}
