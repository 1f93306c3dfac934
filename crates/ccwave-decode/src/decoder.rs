//! Register decoder: turns one transaction's MOSI/MISO buffers into text.
//!
//! Output tokens are consumed by people reading traces, so spacing and case
//! are kept stable: `W TXFIFO AA BB`, `R CMD SIDLE`, `W FREQ0 .FREQ:914999969`.

use std::fmt::Write;

use thiserror::Error;

use crate::cc1101::{
    num_preamble, LengthConfig, MarcState, ModFormat, PacketFormat, Register, StatusRegister,
    ADDRESS_MASK, BURST_FLAG, READ_FLAG,
};

/// Crystal frequency used when the configured one is unusable.
pub const DEFAULT_XOSC_HZ: u64 = 26_000_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("transaction carries no bytes")]
    Empty,
    #[error("MOSI/MISO length mismatch: {tx} vs {rx}")]
    LengthMismatch { tx: usize, rx: usize },
}

/// Values cached from earlier register bytes. Multi-register fields may be
/// written across separate transactions, so this survives between them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningState {
    /// FREQ2..FREQ0 accumulator, 24 bits.
    pub freq_word: u32,
    /// MDMCFG4.DRATE_E
    pub datarate_exponent: u8,
    /// MDMCFG1.CHANSPC_E
    pub chanspc_exponent: u8,
}

#[derive(Debug, Clone)]
pub struct Decoder {
    f_xosc: u64,
    state: RunningState,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(DEFAULT_XOSC_HZ)
    }
}

impl Decoder {
    pub fn new(f_xosc: u64) -> Self {
        Self {
            f_xosc,
            state: RunningState::default(),
        }
    }

    pub fn f_xosc(&self) -> u64 {
        self.f_xosc
    }

    pub fn state(&self) -> &RunningState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = RunningState::default();
    }

    /// Renders one closed transaction. `tx[0]` is the header byte.
    pub fn decode_transaction(&mut self, tx: &[u8], rx: &[u8]) -> Result<String, DecodeError> {
        let Some(&header) = tx.first() else {
            return Err(DecodeError::Empty);
        };
        if tx.len() != rx.len() {
            return Err(DecodeError::LengthMismatch {
                tx: tx.len(),
                rx: rx.len(),
            });
        }

        let addr = header & ADDRESS_MASK;
        let burst = header & BURST_FLAG != 0;
        let read = header & READ_FLAG != 0;
        // Data phase: what the chip drove on reads, what the host drove on writes.
        let payload = if read { &rx[1..] } else { &tx[1..] };

        let text = match Register::from_address(addr) {
            Register::Patable => hex_dump(if read { "R PATABLE" } else { "W PATABLE" }, payload),
            Register::Fifo => hex_dump(if read { "R RXFIFO" } else { "W TXFIFO" }, payload),
            _ if burst => {
                let mut text = String::from(if read { "R" } else { "W" });
                for (offset, &value) in payload.iter().enumerate() {
                    let reg = usize::from(addr) + offset;
                    text.push(' ');
                    match u8::try_from(reg) {
                        Ok(reg) => {
                            text.push_str(&alternate_name(reg));
                            text.push_str(&self.value_annotation(reg, value));
                        }
                        // Past 0xFF there is nothing to name or cache.
                        Err(_) => {
                            let _ = write!(text, "{reg:02X}:{value:02X}");
                        }
                    }
                }
                text
            }
            reg => match (read, payload.first()) {
                (true, None) => format!("R CMD {reg}"),
                (true, Some(&value)) => format!("R {reg}{}", self.value_annotation(addr, value)),
                (false, None) => format!("CMD {reg}"),
                (false, Some(&value)) => format!("W {reg}{}", self.value_annotation(addr, value)),
            },
        };
        Ok(text)
    }

    /// Field breakdown for one register byte. Updates the running state when
    /// `addr` is one of FREQ2, FREQ1, MDMCFG4 or MDMCFG1.
    pub fn value_annotation(&mut self, addr: u8, value: u8) -> String {
        let xosc = self.f_xosc as f64;
        let fields = match Register::from_address(addr) {
            Register::Pktctrl1 => format!(
                ".PQT:{:#x} {}{}.ADDR_CHK:{:#x}",
                value >> 5,
                flag(value, 3, ".CRC_AUTOFLUSH "),
                flag(value, 2, ".APPEND_STATUS "),
                value & 0b11,
            ),
            Register::Pktctrl0 => format!(
                "{}.PKT_FORMAT:{} {}.LENGTH_CONFIG:{}",
                flag(value, 6, ".WHITE_DATA "),
                PacketFormat::from_bits(value >> 4).as_str(),
                flag(value, 2, ".CRC_EN "),
                LengthConfig::from_bits(value).as_str(),
            ),
            Register::Freq2 => {
                self.state.freq_word = u32::from(value) << 16;
                format!(":{value:02X}")
            }
            Register::Freq1 => {
                self.state.freq_word |= u32::from(value) << 8;
                format!(":{value:02X}")
            }
            Register::Freq0 => {
                let freq_reg = self.state.freq_word | u32::from(value);
                let freq = f64::from(freq_reg) * (xosc / 65_536.0);
                format!(".FREQ:{}", freq as u64)
            }
            Register::Mdmcfg4 => {
                self.state.datarate_exponent = value & 0x0F;
                format!(":{value:02X}")
            }
            Register::Mdmcfg3 => {
                let scaled = (256 + u64::from(value)) << self.state.datarate_exponent;
                let rate = scaled as f64 / 268_435_456.0 * xosc;
                format!(".DATARATE:{}", rate as u64)
            }
            Register::Mdmcfg2 => format!(
                "{}.MOD_FORMAT:{} {}.SYNC_MODE:{:#x}",
                flag(value, 7, ".DEM_DCFILT_OFF "),
                ModFormat::from_bits(value >> 4),
                flag(value, 3, ".MANCHESTER_EN "),
                value & 0b111,
            ),
            Register::Mdmcfg1 => {
                self.state.chanspc_exponent = value & 0b11;
                format!(
                    "{}.NUM_PREAMBLE:{} ",
                    flag(value, 7, ".FEC_EN "),
                    num_preamble(value >> 4),
                )
            }
            Register::Mdmcfg0 => {
                let spacing = (xosc / 262_144.0)
                    * f64::from(256 + u32::from(value))
                    * f64::from(1u32 << self.state.chanspc_exponent);
                format!(".CHANSPC:{}", spacing as u64)
            }
            Register::Deviatn => {
                let exponent = (value >> 4) & 0b111;
                let mantissa = value & 0b111;
                let deviation = (xosc / 131_072.0)
                    * f64::from(8 + mantissa)
                    * f64::from(1u32 << exponent);
                format!(".DEV:{}", deviation as u64)
            }
            _ if StatusRegister::from_address(addr) == Some(StatusRegister::Marcstate) => {
                // Values past TXFIFO_UNDER have no name; render nothing after the space.
                MarcState::from_value(value)
                    .map(|state| state.as_str().to_string())
                    .unwrap_or_default()
            }
            _ => return format!(":{value:02X}"),
        };
        format!(" {fields}")
    }
}

/// Documented name of a configuration register or command strobe, or the
/// address as two hex digits.
pub fn register_name(addr: u8) -> String {
    Register::from_address(addr).to_string()
}

/// Name used in burst listings: status registers shadow strobes at 0x30..=0x3D.
pub fn alternate_name(addr: u8) -> String {
    match StatusRegister::from_address(addr) {
        Some(status) => status.name().to_string(),
        None => register_name(addr),
    }
}

fn flag(value: u8, bit: u8, label: &'static str) -> &'static str {
    if value & (1 << bit) != 0 {
        label
    } else {
        ""
    }
}

fn hex_dump(prefix: &str, bytes: &[u8]) -> String {
    let mut text = String::from(prefix);
    for byte in bytes {
        let _ = write!(text, " {byte:02X}");
    }
    text
}
