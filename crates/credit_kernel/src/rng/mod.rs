//! # Random Stream Addressing
//!
//! Random numbers are addressed by the identity of the work unit that
//! consumes them, never by call order:
//!
//! - [`philox4x32_10`]: the counter-based block function
//! - [`StreamDomain`]: declared `(M, K)` bounds and `mk = m * K + k`
//! - [`RandomStreams`]: seed + domain; hands out one stream per `(m, k, j)`
//! - [`AddressedStream`]: the per-unit generator (also a `rand::RngCore`)
//!
//! For a fixed seed, `(m, k, j)` always yields the same variates, whatever
//! the portfolio size, thread count or requested scenario-draw subset.
//!
//! ## Usage Example
//!
//! ```rust
//! use credit_core::types::ObligorId;
//! use credit_kernel::rng::{RandomStreams, StreamDomain};
//!
//! let streams = RandomStreams::new(42, StreamDomain::new(1_000, 10));
//! let mut stream = streams.stream(17, 3, ObligorId::new(5)).unwrap();
//!
//! let u = stream.next_uniform();
//! assert!(u > 0.0 && u < 1.0);
//! let z = stream.next_normal();
//! assert!(z.is_finite());
//! ```

mod philox;
mod stream;

pub use philox::{philox4x32_10, PHILOX_ROUNDS};
pub use stream::{AddressedStream, RandomStreams, StreamDomain};
