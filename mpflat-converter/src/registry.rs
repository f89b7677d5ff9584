//! Converter trait and the per-kind registry.

use crate::constraint::{Constraint, ConstraintKind};
use crate::context::ConversionContext;
use crate::convert;
use mpflat_core::Result;
use rustc_hash::FxHashMap;
use std::fmt;

/// Rewrites one constraint kind into other constraints.
pub trait ConstraintConverter: fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Whether an instance must be converted although its kind is accepted.
    fn needs_conversion(&self, ctx: &ConversionContext<'_>, con: &Constraint) -> bool {
        let _ = (ctx, con);
        false
    }

    /// Add the replacement of `con`, stored at `index` in its keeper.
    ///
    /// The caller marks `con` as bridged afterwards and links everything
    /// created here to its value slot.
    fn convert(&self, ctx: &mut ConversionContext<'_>, con: &Constraint, index: usize) -> Result<()>;
}

/// Converters keyed by the kind they rewrite.
#[derive(Debug, Default)]
pub struct ConverterRegistry {
    converters: FxHashMap<ConstraintKind, Box<dyn ConstraintConverter>>,
}

impl ConverterRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in converters.
    #[must_use]
    pub fn with_default_converters() -> Self {
        use ConstraintKind::*;
        let mut r = Self::new();
        for k in [LinRange, QuadRange] {
            r.register(k, Box::new(convert::range::RangeConverter));
        }
        for k in [LinearFunctional, QuadraticFunctional] {
            r.register(k, Box::new(convert::functional::FunctionalConverter));
        }
        for k in [IndicatorLinLE, IndicatorLinEQ, IndicatorLinGE, IndicatorQuadLE, IndicatorQuadEQ, IndicatorQuadGE] {
            r.register(k, Box::new(convert::indicator::IndicatorConverter));
        }
        for k in [ComplementarityLinear, ComplementarityQuadratic] {
            r.register(k, Box::new(convert::complementarity::ComplementarityConverter));
        }
        for k in [Max, Min] {
            r.register(k, Box::new(convert::maxmin::MaxMinConverter));
        }
        r.register(Abs, Box::new(convert::maxmin::AbsConverter));
        for k in [And, Or, Not] {
            r.register(k, Box::new(convert::logical::LogicalConverter));
        }
        for k in [IfThen, Implication] {
            r.register(k, Box::new(convert::logical::IfThenConverter));
        }
        for k in [
            CondLinEQ, CondLinLE, CondLinLT, CondLinGE, CondLinGT, CondQuadEQ, CondQuadLE, CondQuadLT,
            CondQuadGE, CondQuadGT,
        ] {
            r.register(k, Box::new(convert::conditional::ConditionalConverter));
        }
        for k in [Count, NumberofConst, NumberofVar] {
            r.register(k, Box::new(convert::counting::CountingConverter));
        }
        r.register(AllDiff, Box::new(convert::counting::AllDiffConverter));
        r.register(Pow, Box::new(convert::pow::PowConverter));
        r.register(Pl, Box::new(convert::pl::PlConverter));
        for k in [Sos1, Sos2] {
            r.register(k, Box::new(convert::sos::SosConverter));
        }
        for k in [QuadraticCone, RotatedQuadraticCone] {
            r.register(k, Box::new(convert::cones::ConeConverter));
        }
        r
    }

    /// Install or replace the converter of `kind`.
    pub fn register(&mut self, kind: ConstraintKind, converter: Box<dyn ConstraintConverter>) {
        self.converters.insert(kind, converter);
    }

    /// Remove the converter of `kind`.
    pub fn unregister(&mut self, kind: ConstraintKind) -> Option<Box<dyn ConstraintConverter>> {
        self.converters.remove(&kind)
    }

    /// Converter of `kind`.
    pub fn get(&self, kind: ConstraintKind) -> Option<&dyn ConstraintConverter> {
        self.converters.get(&kind).map(|c| c.as_ref())
    }

    /// Number of kinds with a converter.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Whether no converter is registered.
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_covers_rewritable_kinds() {
        let r = ConverterRegistry::with_default_converters();
        for k in [ConstraintKind::LinRange, ConstraintKind::Max, ConstraintKind::CondQuadGT, ConstraintKind::Sos2] {
            assert!(r.get(k).is_some(), "{k} has no converter");
        }
        assert!(r.get(ConstraintKind::LinLE).is_none());
        assert!(r.get(ConstraintKind::Exp).is_none());
    }

    #[test]
    fn test_unregister() {
        let mut r = ConverterRegistry::with_default_converters();
        let n = r.len();
        assert!(r.unregister(ConstraintKind::Abs).is_some());
        assert_eq!(r.len(), n - 1);
        assert!(ConverterRegistry::new().is_empty());
    }
}
