//! Public air-conditioning models.
//!
//! # Organization
//!
//! Models are organized into domain-specific submodules. The only domain
//! today is [`airco`], which covers moist-air processes and the sizing of
//! CAV and VAV systems built from them.
//!
//! # Model structure
//!
//! Each computation is a pure function of its declared inputs and returns a
//! new immutable result. Where a computation is useful as a black box (a
//! process chain evaluated for an inlet stream), it is also exposed as a
//! [`twine_core::Model`] adapter that delegates to the domain API.

pub mod airco;
