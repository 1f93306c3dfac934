//! CC1101 register map and the enumerated sub-fields the decoder renders.

use std::fmt;

/// Address byte flags. The low six bits select the register.
pub const ADDRESS_MASK: u8 = 0x3F;
pub const BURST_FLAG: u8 = 0x40;
pub const READ_FLAG: u8 = 0x80;

/// Configuration registers and command strobes with a known name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Iocfg2,
    Iocfg1,
    Iocfg0,
    Fifothr,
    Sync1,
    Sync0,
    Pktlen,
    Pktctrl1,
    Pktctrl0,
    Chan,
    Freq2,
    Freq1,
    Freq0,
    Mdmcfg4,
    Mdmcfg3,
    Mdmcfg2,
    Mdmcfg1,
    Mdmcfg0,
    Deviatn,
    Fstest,
    Sres,
    Sfstxon,
    Scal,
    Srx,
    Stx,
    Sidle,
    Sfrx,
    Sftx,
    Patable,
    Fifo,
    Other(u8),
}

impl Register {
    pub fn from_address(addr: u8) -> Self {
        match addr {
            0x00 => Self::Iocfg2,
            0x01 => Self::Iocfg1,
            0x02 => Self::Iocfg0,
            0x03 => Self::Fifothr,
            0x04 => Self::Sync1,
            0x05 => Self::Sync0,
            0x06 => Self::Pktlen,
            0x07 => Self::Pktctrl1,
            0x08 => Self::Pktctrl0,
            0x0A => Self::Chan,
            0x0D => Self::Freq2,
            0x0E => Self::Freq1,
            0x0F => Self::Freq0,
            0x10 => Self::Mdmcfg4,
            0x11 => Self::Mdmcfg3,
            0x12 => Self::Mdmcfg2,
            0x13 => Self::Mdmcfg1,
            0x14 => Self::Mdmcfg0,
            0x15 => Self::Deviatn,
            0x29 => Self::Fstest,
            0x30 => Self::Sres,
            0x31 => Self::Sfstxon,
            0x33 => Self::Scal,
            0x34 => Self::Srx,
            0x35 => Self::Stx,
            0x36 => Self::Sidle,
            0x3A => Self::Sfrx,
            0x3B => Self::Sftx,
            0x3E => Self::Patable,
            0x3F => Self::Fifo,
            other => Self::Other(other),
        }
    }

    pub fn address(&self) -> u8 {
        match self {
            Self::Iocfg2 => 0x00,
            Self::Iocfg1 => 0x01,
            Self::Iocfg0 => 0x02,
            Self::Fifothr => 0x03,
            Self::Sync1 => 0x04,
            Self::Sync0 => 0x05,
            Self::Pktlen => 0x06,
            Self::Pktctrl1 => 0x07,
            Self::Pktctrl0 => 0x08,
            Self::Chan => 0x0A,
            Self::Freq2 => 0x0D,
            Self::Freq1 => 0x0E,
            Self::Freq0 => 0x0F,
            Self::Mdmcfg4 => 0x10,
            Self::Mdmcfg3 => 0x11,
            Self::Mdmcfg2 => 0x12,
            Self::Mdmcfg1 => 0x13,
            Self::Mdmcfg0 => 0x14,
            Self::Deviatn => 0x15,
            Self::Fstest => 0x29,
            Self::Sres => 0x30,
            Self::Sfstxon => 0x31,
            Self::Scal => 0x33,
            Self::Srx => 0x34,
            Self::Stx => 0x35,
            Self::Sidle => 0x36,
            Self::Sfrx => 0x3A,
            Self::Sftx => 0x3B,
            Self::Patable => 0x3E,
            Self::Fifo => 0x3F,
            Self::Other(addr) => *addr,
        }
    }

    /// `None` for addresses without a documented name.
    pub fn name(&self) -> Option<&'static str> {
        Some(match self {
            Self::Iocfg2 => "IOCFG2",
            Self::Iocfg1 => "IOCFG1",
            Self::Iocfg0 => "IOCFG0",
            Self::Fifothr => "FIFOTHR",
            Self::Sync1 => "SYNC1",
            Self::Sync0 => "SYNC0",
            Self::Pktlen => "PKTLEN",
            Self::Pktctrl1 => "PKTCTRL1",
            Self::Pktctrl0 => "PKTCTRL0",
            Self::Chan => "CHAN",
            Self::Freq2 => "FREQ2",
            Self::Freq1 => "FREQ1",
            Self::Freq0 => "FREQ0",
            Self::Mdmcfg4 => "MDMCFG4",
            Self::Mdmcfg3 => "MDMCFG3",
            Self::Mdmcfg2 => "MDMCFG2",
            Self::Mdmcfg1 => "MDMCFG1",
            Self::Mdmcfg0 => "MDMCFG0",
            Self::Deviatn => "DEVIATN",
            Self::Fstest => "FSTEST",
            Self::Sres => "SRES",
            Self::Sfstxon => "SFSTXON",
            Self::Scal => "SCAL",
            Self::Srx => "SRX",
            Self::Stx => "STX",
            Self::Sidle => "SIDLE",
            Self::Sfrx => "SFRX",
            Self::Sftx => "SFTX",
            Self::Patable => "PATABLE",
            Self::Fifo => "FIFO",
            Self::Other(_) => return None,
        })
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:02X}", self.address()),
        }
    }
}

/// Read-only status registers, reachable at 0x30..=0x3D with the burst bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRegister {
    Partnum,
    Version,
    Freqest,
    Lqi,
    Rssi,
    Marcstate,
    Wortime1,
    Wortime0,
    Pktstatus,
    VcoVcDac,
    Txbytes,
    Rxbytes,
    Rcctrl1,
    Rcctrl0,
}

impl StatusRegister {
    const ALL: [StatusRegister; 14] = [
        Self::Partnum,
        Self::Version,
        Self::Freqest,
        Self::Lqi,
        Self::Rssi,
        Self::Marcstate,
        Self::Wortime1,
        Self::Wortime0,
        Self::Pktstatus,
        Self::VcoVcDac,
        Self::Txbytes,
        Self::Rxbytes,
        Self::Rcctrl1,
        Self::Rcctrl0,
    ];

    pub fn from_address(addr: u8) -> Option<Self> {
        let index = addr.checked_sub(0x30)?;
        Self::ALL.get(usize::from(index)).copied()
    }

    pub fn address(&self) -> u8 {
        0x30 + *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Partnum => "PARTNUM",
            Self::Version => "VERSION",
            Self::Freqest => "FREQEST",
            Self::Lqi => "LQI",
            Self::Rssi => "RSSI",
            Self::Marcstate => "MARCSTATE",
            Self::Wortime1 => "WORTIME1",
            Self::Wortime0 => "WORTIME0",
            Self::Pktstatus => "PKTSTATUS",
            Self::VcoVcDac => "VCO_VC_DAC",
            Self::Txbytes => "TXBYTES",
            Self::Rxbytes => "RXBYTES",
            Self::Rcctrl1 => "RCCTRL1",
            Self::Rcctrl0 => "RCCTRL0",
        }
    }
}

/// PKTCTRL0.PKT_FORMAT, bits 5:4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketFormat {
    Normal,
    SyncGdo,
    Pn9,
    AsyncGdo,
}

impl PacketFormat {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Normal,
            0b01 => Self::SyncGdo,
            0b10 => Self::Pn9,
            _ => Self::AsyncGdo,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORM",
            Self::SyncGdo => "SYNC_GDO",
            Self::Pn9 => "PN9",
            Self::AsyncGdo => "ASYNC_GDO",
        }
    }
}

/// PKTCTRL0.LENGTH_CONFIG, bits 1:0. The fourth encoding is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthConfig {
    Fixed,
    Variable,
    Infinite,
    Reserved,
}

impl LengthConfig {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Fixed,
            0b01 => Self::Variable,
            0b10 => Self::Infinite,
            _ => Self::Reserved,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "FIX",
            Self::Variable => "VAR",
            Self::Infinite => "INF",
            Self::Reserved => "3",
        }
    }
}

/// MDMCFG2.MOD_FORMAT, bits 6:4. Reserved encodings keep their number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModFormat {
    Fsk2,
    Gfsk,
    Reserved(u8),
    Ook,
    Fsk4,
    Msk,
}

impl ModFormat {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Self::Fsk2,
            0b001 => Self::Gfsk,
            0b011 => Self::Ook,
            0b100 => Self::Fsk4,
            0b111 => Self::Msk,
            reserved => Self::Reserved(reserved),
        }
    }
}

impl fmt::Display for ModFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fsk2 => f.write_str("2FSK"),
            Self::Gfsk => f.write_str("GFSK"),
            Self::Reserved(n) => write!(f, "{n}"),
            Self::Ook => f.write_str("OOK"),
            Self::Fsk4 => f.write_str("4FSK"),
            Self::Msk => f.write_str("MSK"),
        }
    }
}

/// Minimum preamble bytes selected by MDMCFG1.NUM_PREAMBLE, bits 6:4.
pub fn num_preamble(bits: u8) -> u8 {
    const TABLE: [u8; 8] = [2, 3, 4, 6, 8, 12, 16, 24];
    TABLE[usize::from(bits & 0b111)]
}

/// Main radio control state machine state, as reported by MARCSTATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarcState {
    Sleep,
    Idle,
    Xoff,
    VcoonMc,
    RegonMc,
    Mancal,
    Vcoon,
    Regon,
    Startcal,
    Bwboost,
    FsLock,
    Ifadcon,
    Endcal,
    Rx,
    RxEnd,
    RxRst,
    TxrxSw,
    RxfifoOver,
    Fstxon,
    Tx,
    TxEnd,
    RxtxSw,
    TxfifoUnder,
}

impl MarcState {
    const ALL: [MarcState; 23] = [
        Self::Sleep,
        Self::Idle,
        Self::Xoff,
        Self::VcoonMc,
        Self::RegonMc,
        Self::Mancal,
        Self::Vcoon,
        Self::Regon,
        Self::Startcal,
        Self::Bwboost,
        Self::FsLock,
        Self::Ifadcon,
        Self::Endcal,
        Self::Rx,
        Self::RxEnd,
        Self::RxRst,
        Self::TxrxSw,
        Self::RxfifoOver,
        Self::Fstxon,
        Self::Tx,
        Self::TxEnd,
        Self::RxtxSw,
        Self::TxfifoUnder,
    ];

    pub fn from_value(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sleep => "SLEEP",
            Self::Idle => "IDLE",
            Self::Xoff => "XOFF",
            Self::VcoonMc => "VCOON_MC",
            Self::RegonMc => "REGON_MC",
            Self::Mancal => "MANCAL",
            Self::Vcoon => "VCOON",
            Self::Regon => "REGON",
            Self::Startcal => "STARTCAL",
            Self::Bwboost => "BWBOOST",
            Self::FsLock => "FS_LOCK",
            Self::Ifadcon => "IFADCON",
            Self::Endcal => "ENDCAL",
            Self::Rx => "RX",
            Self::RxEnd => "RX_END",
            Self::RxRst => "RX_RST",
            Self::TxrxSw => "TXRX_SW",
            Self::RxfifoOver => "RXFIFO_OVER",
            Self::Fstxon => "FSTXON",
            Self::Tx => "TX",
            Self::TxEnd => "TX_END",
            Self::RxtxSw => "RXTX_SW",
            Self::TxfifoUnder => "TXFIFO_UNDER",
        }
    }
}
