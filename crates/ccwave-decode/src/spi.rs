//! Groups SPI byte transfers into chip-select transactions by gap timing.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::decoder::Decoder;
use crate::TimeSpan;

/// Frame types produced by the upstream SPI analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Result,
    Enable,
    Disable,
    Error,
}

/// One SPI exchange as reported by the byte-level decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiTransfer {
    pub kind: TransferKind,
    pub mosi: Option<Vec<u8>>,
    pub miso: Option<Vec<u8>>,
    pub span: TimeSpan,
}

impl SpiTransfer {
    pub fn result(mosi: Vec<u8>, miso: Vec<u8>, span: TimeSpan) -> Self {
        Self {
            kind: TransferKind::Result,
            mosi: Some(mosi),
            miso: Some(miso),
            span,
        }
    }

    /// MOSI/MISO bytes when this transfer carries data, `None` for framing
    /// artifacts the reassembler must skip.
    fn data(&self) -> Option<(&[u8], &[u8])> {
        if self.kind != TransferKind::Result {
            return None;
        }
        let (mosi, miso) = (self.mosi.as_deref()?, self.miso.as_deref()?);
        if mosi.is_empty() || miso.is_empty() || mosi.len() != miso.len() {
            return None;
        }
        Some((mosi, miso))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Message,
    Error,
}

/// Decoded text for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFrame {
    pub kind: FrameKind,
    pub span: TimeSpan,
    pub text: String,
}

impl OutputFrame {
    pub const ERROR_TEXT: &'static str = "Error!";

    pub fn message(span: TimeSpan, text: String) -> Self {
        Self {
            kind: FrameKind::Message,
            span,
            text,
        }
    }

    pub fn error(span: TimeSpan) -> Self {
        Self {
            kind: FrameKind::Error,
            span,
            text: Self::ERROR_TEXT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Transaction {
    tx: Vec<u8>,
    rx: Vec<u8>,
    span: TimeSpan,
}

pub struct Reassembler {
    packet_timeout: Duration,
    decoder: Decoder,
    open: Option<Transaction>,
}

impl Reassembler {
    pub fn new(packet_timeout: Duration, decoder: Decoder) -> Self {
        Self {
            packet_timeout,
            decoder,
            open: None,
        }
    }

    pub fn packet_timeout(&self) -> Duration {
        self.packet_timeout
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Absorbs one transfer. Returns the previous transaction's frame when the
    /// gap since its last byte exceeds the packet timeout.
    pub fn ingest(&mut self, transfer: &SpiTransfer) -> Option<OutputFrame> {
        let Some((mosi, miso)) = transfer.data() else {
            debug!("skipping {:?} transfer at {:.9}s", transfer.kind, transfer.span.start_s);
            return None;
        };

        if let Some(open) = self.open.as_mut() {
            // Compare in whole nanoseconds so a gap equal to the timeout
            // survives f64 subtraction rounding.
            let gap_ns = ((transfer.span.start_s - open.span.end_s) * 1e9).round();
            if gap_ns <= self.packet_timeout.as_nanos() as f64 {
                open.tx.extend_from_slice(mosi);
                open.rx.extend_from_slice(miso);
                open.span.end_s = transfer.span.end_s;
                return None;
            }
        }

        let frame = self.open.take().and_then(|closed| self.close(closed));

        self.open = Some(Transaction {
            tx: mosi.to_vec(),
            rx: miso.to_vec(),
            span: transfer.span,
        });
        frame
    }

    /// Closes the in-progress transaction at end of stream.
    pub fn finish(&mut self) -> Option<OutputFrame> {
        let open = self.open.take()?;
        self.close(open)
    }

    fn close(&mut self, transaction: Transaction) -> Option<OutputFrame> {
        if transaction.tx.is_empty() {
            return None;
        }
        let frame = match self.decoder.decode_transaction(&transaction.tx, &transaction.rx) {
            Ok(text) => OutputFrame::message(transaction.span, text),
            Err(e) => {
                debug!("transaction at {:.9}s: {e}", transaction.span.start_s);
                OutputFrame::error(transaction.span)
            }
        };
        debug!(
            "closed transaction {:.9}s..{:.9}s ({} bytes)",
            transaction.span.start_s,
            transaction.span.end_s,
            transaction.tx.len()
        );
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_micros(10);

    fn reassembler() -> Reassembler {
        Reassembler::new(TIMEOUT, Decoder::default())
    }

    /// One byte pair spanning 1 µs starting at `start_us`.
    fn byte(start_us: f64, mosi: u8, miso: u8) -> SpiTransfer {
        let start = start_us * 1e-6;
        SpiTransfer::result(vec![mosi], vec![miso], TimeSpan::new(start, start + 1e-6))
    }

    fn run(transfers: &[SpiTransfer]) -> Vec<OutputFrame> {
        let mut r = reassembler();
        let mut frames: Vec<_> = transfers.iter().filter_map(|t| r.ingest(t)).collect();
        frames.extend(r.finish());
        frames
    }

    #[test]
    fn contiguous_bytes_form_one_transaction() {
        let last = byte(4.0, 0xBB, 0x0F);
        let frames = run(&[byte(0.0, 0x3F, 0x0F), byte(2.0, 0xAA, 0x0F), last.clone()]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Message);
        assert_eq!(frames[0].text, "W TXFIFO AA BB");
        assert_eq!(frames[0].span.start_s, 0.0);
        assert_eq!(frames[0].span.end_s, last.span.end_s);
    }

    #[test]
    fn first_transfer_is_not_duplicated() {
        let frames = run(&[byte(0.0, 0x3F, 0x0F), byte(2.0, 0xAA, 0x0F)]);
        assert_eq!(frames[0].text, "W TXFIFO AA");
    }

    #[test]
    fn gap_beyond_timeout_splits() {
        let mut r = reassembler();
        assert_eq!(r.ingest(&byte(0.0, 0x36, 0x0F)), None);
        let next = byte(50.0, 0x3F, 0x0F);
        let frame = r.ingest(&next).unwrap();
        assert_eq!(frame.text, "CMD SIDLE");
        assert_eq!(frame.span, TimeSpan::new(0.0, 1e-6));
        assert_eq!(r.ingest(&byte(52.0, 0x01, 0x0F)), None);
        let last = r.finish().unwrap();
        assert_eq!(last.text, "W TXFIFO 01");
        assert_eq!(last.span.start_s, next.span.start_s);
        assert_eq!(r.finish(), None);
    }

    #[test]
    fn gap_equal_to_timeout_continues() {
        let mut r = reassembler();
        let first = SpiTransfer::result(
            vec![0x3F],
            vec![0x0F],
            TimeSpan::new(0.000008, 0.000008 + 0.000002),
        );
        let second = SpiTransfer::result(vec![0x2A], vec![0x0F], TimeSpan::new(0.000020, 0.000021));
        assert_eq!(r.ingest(&first), None);
        assert_eq!(r.ingest(&second), None);
        let frame = r.finish().unwrap();
        assert_eq!(frame.text, "W TXFIFO 2A");
        assert_eq!(frame.span, TimeSpan::new(0.000008, 0.000021));
    }

    #[test]
    fn gap_one_nanosecond_past_timeout_splits() {
        let mut r = reassembler();
        let first = SpiTransfer::result(vec![0x36], vec![0x0F], TimeSpan::new(0.000008, 0.000010));
        let second = SpiTransfer::result(vec![0x3B], vec![0x0F], TimeSpan::new(0.000020001, 0.000021));
        assert_eq!(r.ingest(&first), None);
        assert_eq!(r.ingest(&second).unwrap().text, "CMD SIDLE");
        assert_eq!(r.finish().unwrap().text, "CMD SFTX");
    }

    #[test]
    fn each_split_is_decoded_on_its_own() {
        let frames = run(&[
            byte(0.0, 0x0D, 0x0F),
            byte(2.0, 0x21, 0x0F),
            byte(100.0, 0x0E, 0x0F),
            byte(102.0, 0x65, 0x0F),
            byte(200.0, 0x0F, 0x0F),
            byte(202.0, 0x6A, 0x0F),
            byte(300.0, 0xB6, 0x0F),
        ]);
        let texts: Vec<_> = frames.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(
            texts,
            [
                "W FREQ2 :21",
                "W FREQ1 :65",
                "W FREQ0 .FREQ:868299865",
                "R CMD SIDLE",
            ]
        );
    }

    #[test]
    fn multi_byte_transfers_are_concatenated() {
        let frames = run(&[
            SpiTransfer::result(vec![0xF0, 0x00], vec![0x0F, 0x00], TimeSpan::new(0.0, 2e-6)),
            SpiTransfer::result(vec![0x00], vec![0x14], TimeSpan::new(3e-6, 4e-6)),
        ]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].text, "R PARTNUM:00 VERSION:14");
    }

    #[test]
    fn framing_artifacts_are_ignored() {
        let mut r = reassembler();
        assert_eq!(r.ingest(&byte(0.0, 0x36, 0x0F)), None);
        let artifacts = [
            SpiTransfer {
                kind: TransferKind::Disable,
                mosi: None,
                miso: None,
                span: TimeSpan::new(100e-6, 100e-6),
            },
            SpiTransfer {
                kind: TransferKind::Result,
                mosi: Some(vec![0x3F]),
                miso: None,
                span: TimeSpan::new(200e-6, 201e-6),
            },
            SpiTransfer::result(vec![], vec![], TimeSpan::new(300e-6, 301e-6)),
            SpiTransfer::result(vec![0x01, 0x02], vec![0x0F], TimeSpan::new(400e-6, 401e-6)),
        ];
        for artifact in &artifacts {
            assert_eq!(r.ingest(artifact), None);
        }
        // The open transaction was neither extended nor closed.
        let frame = r.finish().unwrap();
        assert_eq!(frame.text, "CMD SIDLE");
        assert_eq!(frame.span, TimeSpan::new(0.0, 1e-6));
    }

    #[test]
    fn empty_stream_flushes_nothing() {
        assert_eq!(reassembler().finish(), None);
    }

    #[test]
    fn running_state_crosses_transactions() {
        let mut r = Reassembler::new(TIMEOUT, Decoder::new(27_000_000));
        assert_eq!(r.packet_timeout(), TIMEOUT);
        assert_eq!(r.decoder().f_xosc(), 27_000_000);
        r.ingest(&byte(0.0, 0x10, 0x0F));
        r.ingest(&byte(1.0, 0xC8, 0x0F));
        assert_eq!(r.ingest(&byte(100.0, 0x11, 0x0F)).unwrap().text, "W MDMCFG4 :C8");
        assert_eq!(r.decoder().state().datarate_exponent, 8);

        let frames = run(&[
            byte(0.0, 0x10, 0x0F),
            byte(1.0, 0xC8, 0x0F),
            byte(100.0, 0x11, 0x0F),
            byte(101.0, 0x75, 0x0F),
        ]);
        assert_eq!(frames[1].text, "W MDMCFG3 .DATARATE:9248");
    }

    #[test]
    fn frames_serialize_with_lowercase_kind() {
        let frame = OutputFrame::error(TimeSpan::new(0.0, 1.0));
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["text"], "Error!");
    }
}
