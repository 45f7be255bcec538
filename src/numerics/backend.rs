//! Evaluation backend detection and selection.
//!
//! The exp/diode kernels can run on several interchangeable backends:
//! - `Reference` - element-wise `mapv`, the numerical reference
//! - `Vectorized` - fixed-width lane kernel over contiguous memory
//! - `Parallel` - rayon work-stealing over the array (feature `parallel`)
//!
//! `Parallel` evaluates the reference expression and matches it bit for bit.
//! `Vectorized` uses the straight-line `expm1` of the `lanes` module and agrees with
//! the reference to a few ulps. A request for a backend that is not
//! available degrades to `Reference` and is reported through
//! [`BackendResolution::downgraded`] instead of failing.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use ndarray::{Array, ArrayBase, Data, Dimension};

use super::expm1::{diode_current_scalar, safe_expm1_scalar};
use super::lanes;
use crate::error::{JunctionError, Result};

/// Concrete evaluation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Plain element-wise evaluation
    Reference,
    /// Chunked lane kernel
    Vectorized,
    /// Multi-core evaluation
    Parallel,
}

impl Backend {
    /// Order in which `auto` tries the accelerated backends.
    pub const PRIORITY: [Backend; 2] = [Backend::Vectorized, Backend::Parallel];

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Reference => "reference",
            Backend::Vectorized => "vectorized",
            Backend::Parallel => "parallel",
        }
    }

    /// Parse a concrete backend name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "reference" => Some(Backend::Reference),
            "vectorized" => Some(Backend::Vectorized),
            "parallel" => Some(Backend::Parallel),
            _ => None,
        }
    }

    /// Apply `op` to every element, returning an array of the input's shape.
    ///
    /// On `Vectorized`, contiguous arrays go through `lane_op` instead;
    /// strided layouts fall back to `op`.
    fn map<S, D, F, L>(&self, input: &ArrayBase<S, D>, op: F, lane_op: L) -> Array<f64, D>
    where
        S: Data<Elem = f64>,
        D: Dimension,
        F: Fn(f64) -> f64 + Send + Sync,
        L: Fn(&mut [f64]),
    {
        let mut out = input.to_owned();
        match self {
            Backend::Reference => out.mapv_inplace(&op),
            Backend::Vectorized => match out.as_slice_memory_order_mut() {
                Some(values) => lane_op(values),
                None => out.mapv_inplace(&op),
            },
            Backend::Parallel => map_parallel(&mut out, &op),
        }
        out
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "parallel")]
fn map_parallel<D, F>(out: &mut Array<f64, D>, op: &F)
where
    D: Dimension,
    F: Fn(f64) -> f64 + Send + Sync,
{
    out.par_mapv_inplace(op);
}

#[cfg(not(feature = "parallel"))]
fn map_parallel<D, F>(out: &mut Array<f64, D>, op: &F)
where
    D: Dimension,
    F: Fn(f64) -> f64 + Send + Sync,
{
    out.mapv_inplace(op);
}

/// Which accelerated backends this process can use.
///
/// Computed once by [`Capabilities::global`], or built by hand to make
/// selection deterministic in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub vectorized: bool,
    pub parallel: bool,
}

impl Capabilities {
    /// Detect capabilities from the compiled-in features.
    pub fn detect() -> Self {
        Self {
            vectorized: cfg!(feature = "vectorized"),
            parallel: cfg!(feature = "parallel"),
        }
    }

    /// Process-wide capabilities, detected on first use.
    pub fn global() -> Self {
        static CAPABILITIES: OnceLock<Capabilities> = OnceLock::new();
        *CAPABILITIES.get_or_init(Self::detect)
    }

    /// Only the reference backend.
    pub fn reference_only() -> Self {
        Self {
            vectorized: false,
            parallel: false,
        }
    }

    /// Every backend.
    pub fn all() -> Self {
        Self {
            vectorized: true,
            parallel: true,
        }
    }

    /// Check whether `backend` can be used.
    pub fn supports(&self, backend: Backend) -> bool {
        match backend {
            Backend::Reference => true,
            Backend::Vectorized => self.vectorized,
            Backend::Parallel => self.parallel,
        }
    }

    /// Fastest available accelerated backend, if any.
    pub fn best(&self) -> Option<Backend> {
        Backend::PRIORITY.into_iter().find(|b| self.supports(*b))
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

/// A backend request as given by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendRequest {
    /// Fastest available backend
    #[default]
    Auto,
    /// A specific backend
    Explicit(Backend),
}

impl FromStr for BackendRequest {
    type Err = JunctionError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(BackendRequest::Auto);
        }
        Backend::from_name(s)
            .map(BackendRequest::Explicit)
            .ok_or_else(|| JunctionError::UnknownBackend {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for BackendRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendRequest::Auto => f.write_str("auto"),
            BackendRequest::Explicit(b) => b.fmt(f),
        }
    }
}

/// Outcome of resolving a [`BackendRequest`] against [`Capabilities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendResolution {
    /// What the caller asked for.
    pub requested: BackendRequest,
    /// What will actually run.
    pub chosen: Backend,
    /// True when no backend of the requested quality was available and
    /// `Reference` was substituted.
    pub downgraded: bool,
}

/// A kind of kernel that can be bound to a backend.
pub trait KernelKind: Copy {
    /// Kernel name used in diagnostics.
    const NAME: &'static str;

    /// Bind the kernel to a backend.
    fn with_backend(backend: Backend) -> Self;

    /// Backend this kernel runs on.
    fn backend(&self) -> Backend;
}

/// `safe_expm1` bound to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expm1Kernel {
    backend: Backend,
}

impl Expm1Kernel {
    /// Evaluate `exp(x) - 1` with the argument clipped to `max_arg`.
    pub fn eval<S, D>(&self, x: &ArrayBase<S, D>, max_arg: f64) -> Array<f64, D>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.backend.map(
            x,
            move |v| safe_expm1_scalar(v, max_arg),
            |values| lanes::expm1_in_place(values, max_arg),
        )
    }

    /// Single-value evaluation with the reference expression.
    pub fn eval_scalar(&self, x: f64, max_arg: f64) -> f64 {
        safe_expm1_scalar(x, max_arg)
    }
}

impl KernelKind for Expm1Kernel {
    const NAME: &'static str = "expm1";

    fn with_backend(backend: Backend) -> Self {
        Self { backend }
    }

    fn backend(&self) -> Backend {
        self.backend
    }
}

/// Ideal diode current `I_s * safe_expm1(V / V_T)` bound to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiodeCurrentKernel {
    backend: Backend,
}

impl DiodeCurrentKernel {
    /// Evaluate the diode current for every voltage sample.
    pub fn eval<S, D>(&self, voltage: &ArrayBase<S, D>, i_s: f64, v_t: f64, max_arg: f64) -> Array<f64, D>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.backend.map(
            voltage,
            move |v| diode_current_scalar(v, i_s, v_t, max_arg),
            |values| lanes::diode_current_in_place(values, i_s, v_t, max_arg),
        )
    }

    /// Single-value evaluation with the reference expression.
    pub fn eval_scalar(&self, voltage: f64, i_s: f64, v_t: f64, max_arg: f64) -> f64 {
        diode_current_scalar(voltage, i_s, v_t, max_arg)
    }
}

impl KernelKind for DiodeCurrentKernel {
    const NAME: &'static str = "diode_current";

    fn with_backend(backend: Backend) -> Self {
        Self { backend }
    }

    fn backend(&self) -> Backend {
        self.backend
    }
}

/// A kernel together with how its backend was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<K> {
    pub kernel: K,
    pub resolution: BackendResolution,
}

/// Chooses backends for kernels from a fixed set of [`Capabilities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccelerationSelector {
    capabilities: Capabilities,
}

impl AccelerationSelector {
    /// Create a selector over the given capabilities.
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    /// Selector over the process-wide capabilities.
    pub fn global() -> Self {
        Self::new(Capabilities::global())
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Resolve a request to a concrete backend. Never fails.
    pub fn resolve(&self, requested: BackendRequest) -> BackendResolution {
        let (chosen, downgraded) = match requested {
            BackendRequest::Auto => match self.capabilities.best() {
                Some(backend) => (backend, false),
                None => {
                    log::warn!("No accelerated backend available, using reference implementation");
                    (Backend::Reference, true)
                }
            },
            BackendRequest::Explicit(backend) if self.capabilities.supports(backend) => {
                (backend, false)
            }
            BackendRequest::Explicit(backend) => {
                log::warn!("{} backend not available, falling back to reference", backend);
                (Backend::Reference, true)
            }
        };
        log::debug!("Backend request '{}' resolved to '{}'", requested, chosen);
        BackendResolution {
            requested,
            chosen,
            downgraded,
        }
    }

    /// Bind a kernel of kind `K` to the backend resolved for `requested`.
    pub fn select_request<K: KernelKind>(&self, requested: BackendRequest) -> Selection<K> {
        let resolution = self.resolve(requested);
        Selection {
            kernel: K::with_backend(resolution.chosen),
            resolution,
        }
    }

    /// Parse `name` and select a kernel of kind `K`.
    ///
    /// Fails only for an unknown backend name.
    pub fn select<K: KernelKind>(&self, name: &str) -> Result<Selection<K>> {
        let requested: BackendRequest = name.parse()?;
        Ok(self.select_request(requested))
    }
}

/// Select a kernel of kind `K` using the process-wide capabilities.
pub fn select_backend<K: KernelKind>(name: &str) -> Result<Selection<K>> {
    AccelerationSelector::global().select(name)
}
