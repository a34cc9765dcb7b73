//! Coordinate-addressed random streams.
//!
//! Every work unit `(m, k, j)` owns its own [`AddressedStream`], derived from
//! the seed and the coordinate alone:
//!
//! ```text
//! key     = [seed_lo, seed_hi]
//! counter = [block, obligor_id, mk_lo, mk_hi]      mk = m * K + k
//! ```
//!
//! The stream advances only its `block` word, so drawing more variates for
//! one obligor can never reach another obligor's (or another scenario-draw
//! pair's) counter space. Nothing is shared between streams, so workers need
//! no synchronisation and results do not depend on execution order.

use credit_core::math::inverse_norm_cdf;
use credit_core::types::ObligorId;
use credit_core::OutOfRangeError;
use rand::RngCore;

use super::philox::philox4x32_10;

/// 2^-52, the spacing of 52-bit uniforms.
const UNIFORM_SCALE: f64 = 1.0 / 4_503_599_627_370_496.0;

/// Declared bounds of the scenario-draw coordinate space.
///
/// # Examples
///
/// ```rust
/// use credit_kernel::rng::StreamDomain;
///
/// let domain = StreamDomain::new(3, 2);
/// assert_eq!(domain.size(), 6);
/// assert_eq!(domain.linear_index(2, 1).unwrap(), 5);
/// assert_eq!(domain.split(5), (2, 1));
/// assert!(domain.linear_index(3, 0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamDomain {
    n_scenarios: usize,
    draws_per_scenario: usize,
}

impl StreamDomain {
    /// Declares a domain of `n_scenarios` x `draws_per_scenario` pairs.
    #[inline]
    pub fn new(n_scenarios: usize, draws_per_scenario: usize) -> Self {
        Self {
            n_scenarios,
            draws_per_scenario,
        }
    }

    /// Number of scenarios `M`.
    #[inline]
    pub fn n_scenarios(&self) -> usize {
        self.n_scenarios
    }

    /// Idiosyncratic draws per scenario `K`.
    #[inline]
    pub fn draws_per_scenario(&self) -> usize {
        self.draws_per_scenario
    }

    /// Number of scenario-draw pairs `M * K` (saturating).
    #[inline]
    pub fn size(&self) -> usize {
        self.n_scenarios.saturating_mul(self.draws_per_scenario)
    }

    /// Linearised index `m * K + k`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `m >= M` or `k >= K`.
    #[inline]
    pub fn linear_index(&self, m: usize, k: usize) -> Result<usize, OutOfRangeError> {
        if m >= self.n_scenarios {
            return Err(OutOfRangeError {
                axis: "scenario",
                index: m as u64,
                bound: self.n_scenarios as u64,
            });
        }
        if k >= self.draws_per_scenario {
            return Err(OutOfRangeError {
                axis: "draw",
                index: k as u64,
                bound: self.draws_per_scenario as u64,
            });
        }
        Ok(m * self.draws_per_scenario + k)
    }

    /// Inverse of [`linear_index`](Self::linear_index): `mk -> (m, k)`.
    #[inline]
    pub fn split(&self, mk: usize) -> (usize, usize) {
        let k = self.draws_per_scenario.max(1);
        (mk / k, mk % k)
    }

    /// Checks a pre-linearised index against `M * K`.
    #[inline]
    pub fn check_linear(&self, mk: usize) -> Result<(), OutOfRangeError> {
        if mk >= self.size() {
            return Err(OutOfRangeError {
                axis: "scenario_draw",
                index: mk as u64,
                bound: self.size() as u64,
            });
        }
        Ok(())
    }
}

/// Factory of coordinate-addressed streams for one seed and domain.
///
/// Cheap to copy and freely shared across worker threads.
///
/// # Examples
///
/// ```rust
/// use credit_core::types::ObligorId;
/// use credit_kernel::rng::{RandomStreams, StreamDomain};
///
/// let streams = RandomStreams::new(2024, StreamDomain::new(3, 2));
///
/// let a = streams.stream(1, 1, ObligorId::new(7)).unwrap().next_normal();
/// let b = streams.stream(1, 1, ObligorId::new(7)).unwrap().next_normal();
/// assert_eq!(a.to_bits(), b.to_bits());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomStreams {
    seed: u64,
    domain: StreamDomain,
}

impl RandomStreams {
    /// Creates a stream factory.
    #[inline]
    pub fn new(seed: u64, domain: StreamDomain) -> Self {
        Self { seed, domain }
    }

    /// Global seed.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Declared domain.
    #[inline]
    pub fn domain(&self) -> StreamDomain {
        self.domain
    }

    /// Stream for work unit `(m, k, obligor)`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `m`, `k` or the obligor id fall outside
    /// the domain (ids must fit the 32-bit sub-stream selector).
    pub fn stream(
        &self,
        m: usize,
        k: usize,
        obligor: ObligorId,
    ) -> Result<AddressedStream, OutOfRangeError> {
        let mk = self.domain.linear_index(m, k)?;
        self.stream_at(mk, obligor)
    }

    /// Stream for a pre-linearised scenario-draw index `mk = m * K + k`.
    pub fn stream_at(&self, mk: usize, obligor: ObligorId) -> Result<AddressedStream, OutOfRangeError> {
        self.domain.check_linear(mk)?;
        let selector = obligor.stream_selector().ok_or(OutOfRangeError {
            axis: "obligor",
            index: obligor.get(),
            bound: u64::from(u32::MAX) + 1,
        })?;
        Ok(self.stream_unchecked(mk as u64, selector))
    }

    /// Stream without bounds checks; the engine validates the whole work
    /// domain before entering the parallel section.
    #[inline(always)]
    pub(crate) fn stream_unchecked(&self, mk: u64, selector: u32) -> AddressedStream {
        AddressedStream::new(self.seed, mk, selector)
    }
}

/// Random variate source owned by a single work unit.
///
/// Produces 32-bit words from successive Philox blocks of its private
/// counter space. Implements [`RngCore`] so `rand_distr` distributions can
/// sample from it.
#[derive(Clone, Debug)]
pub struct AddressedStream {
    key: [u32; 2],
    counter: [u32; 4],
    buffer: [u32; 4],
    cursor: usize,
}

impl AddressedStream {
    #[inline(always)]
    fn new(seed: u64, mk: u64, selector: u32) -> Self {
        Self {
            key: [seed as u32, (seed >> 32) as u32],
            counter: [0, selector, mk as u32, (mk >> 32) as u32],
            buffer: [0; 4],
            cursor: 4,
        }
    }

    #[inline(always)]
    fn refill(&mut self) {
        self.buffer = philox4x32_10(self.counter, self.key);
        self.counter[0] = self.counter[0].wrapping_add(1);
        self.cursor = 0;
    }

    /// Next 32-bit word.
    #[inline]
    pub fn next_word(&mut self) -> u32 {
        if self.cursor == 4 {
            self.refill();
        }
        let word = self.buffer[self.cursor];
        self.cursor += 1;
        word
    }

    /// Next 64-bit value: low word first, then high word.
    #[inline]
    pub fn next_wide(&mut self) -> u64 {
        let lo = u64::from(self.next_word());
        let hi = u64::from(self.next_word());
        (hi << 32) | lo
    }

    /// Uniform variate in the open interval `(0, 1)` with 52 bits of precision.
    ///
    /// Every step is exact, so the result lies in `[2^-53, 1 - 2^-53]`.
    #[inline]
    pub fn next_uniform(&mut self) -> f64 {
        ((self.next_wide() >> 12) as f64 + 0.5) * UNIFORM_SCALE
    }

    /// Standard normal variate by inversion; consumes exactly one 64-bit value.
    #[inline]
    pub fn next_normal(&mut self) -> f64 {
        inverse_norm_cdf(self.next_uniform())
    }
}

impl RngCore for AddressedStream {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.next_wide()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut chunks = dest.chunks_exact_mut(4);
        for chunk in &mut chunks {
            chunk.copy_from_slice(&self.next_word().to_le_bytes());
        }
        let rest = chunks.into_remainder();
        if !rest.is_empty() {
            let bytes = self.next_word().to_le_bytes();
            rest.copy_from_slice(&bytes[..rest.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
