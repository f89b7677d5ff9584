//! mpflat core - expressions, errors and configuration
//!
//! This crate holds the pieces shared by the conversion layer:
//! - Arena-allocated expression trees with typed handles ([`expr`])
//! - The conversion error type ([`FlatError`])
//! - Keyed warning collection ([`WarningLog`])
//! - Converter options and acceptance levels ([`ConverterConfig`])
//!
//! # Examples
//!
//! ```
//! use mpflat_core::expr::{ExprFactory, Kind};
//!
//! let mut f = ExprFactory::new();
//! let x = f.make_variable(0);
//! let two = f.make_numeric_constant(2.0);
//! let prod = f.make_binary(Kind::Mul, x, two);
//! let le = f.make_relational(Kind::Le, prod, two);
//! assert_eq!(f.kind(le), Kind::Le);
//! assert_eq!(le.lhs(&f), prod.into());
//! ```
//!
//! ```
//! use mpflat_core::ConverterConfig;
//!
//! let mut cfg = ConverterConfig::default();
//! cfg.set_option("cvt:bigM", "1e4").unwrap();
//! assert_eq!(cfg.big_m(), Some(1e4));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod expr;

pub use config::{AcceptanceLevel, ConverterConfig, OptionInfo, OptionType};
pub use diagnostics::{Diagnostic, Severity, WarningLog};
pub use error::{FlatError, Result};
pub use expr::{Expr, ExprFactory, ExprHandle, Kind, LogicalExpr, NumericExpr};
