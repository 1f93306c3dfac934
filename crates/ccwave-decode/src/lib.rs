//! CC1101 SPI decoding: transaction reassembly and register semantics.

pub mod cc1101;
pub mod decoder;
pub mod spi;

pub use cc1101::{Register, StatusRegister};
pub use decoder::{alternate_name, register_name, DecodeError, Decoder, RunningState, DEFAULT_XOSC_HZ};
pub use spi::{FrameKind, OutputFrame, Reassembler, SpiTransfer, TransferKind};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start_s: f64,
    pub end_s: f64,
}

impl TimeSpan {
    pub fn new(start_s: f64, end_s: f64) -> Self {
        Self { start_s, end_s }
    }
}
