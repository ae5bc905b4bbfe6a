/*
 * u-blox UBX raw message decoder
 *
 * Feeds on the raw byte stream of a u-blox receiver (serial, USB, TCP,
 * file replay - the transport is the caller's business), synchronizes on
 * UBX frame boundaries, validates each frame and decodes raw measurement,
 * navigation subframe and time messages into observation batches,
 * broadcast ephemerides, SBAS messages and ion/UTC parameters.
 *
 * The other direction generates well-formed CFG frames from a textual
 * command ("CFG-MSG 1 1 0 0 0 0 0 0", "CFG-VALSET 0 1 0 0 CFG-RATE-MEAS
 * 100", ...), see gen::gen_ubx.
 *
 * A bad frame never kills the stream. Length and checksum errors reset
 * the synchronizer, bad measurements and bad subframes are skipped, and
 * everything is reported through the log facade only.
 */

pub mod bytefield;
pub mod checksum;
pub mod cid;
pub mod error;
pub mod frame;
pub mod gen;
pub mod gnss;
mod navtime;
mod opt;
pub mod raw;
mod rxm;
mod sfrbx;
mod sig;
#[cfg(feature = "trk")]
mod trk;
pub mod valset;

pub use crate::error::Error;
pub use crate::gen::{gen_frame, gen_ubx, FieldType};
pub use crate::raw::{Decoded, NavData, Obs, ObsBatch, RawUbx, MAXOBS, MAXRAWLEN};
