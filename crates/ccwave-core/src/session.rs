use ccwave_decode::{Decoder, OutputFrame, Reassembler, SpiTransfer};
use log::info;

use crate::config::ResolvedSettings;
use crate::logbuf::FrameLog;

/// One capture run: reassembles transfers and keeps every decoded frame.
pub struct Session {
    reassembler: Reassembler,
    log: FrameLog,
    transfers: usize,
    frames: usize,
}

impl Session {
    pub fn new(settings: ResolvedSettings, max_entries: usize) -> Self {
        Self {
            reassembler: Reassembler::new(
                settings.packet_timeout,
                Decoder::new(settings.f_xosc_hz),
            ),
            log: FrameLog::new(max_entries),
            transfers: 0,
            frames: 0,
        }
    }

    /// Feeds one transfer; returns the frame it closed, if any.
    pub fn feed(&mut self, transfer: &SpiTransfer) -> Option<OutputFrame> {
        self.transfers += 1;
        let frame = self.reassembler.ingest(transfer)?;
        self.record(&frame);
        Some(frame)
    }

    /// Flushes the transaction still open at end of capture.
    pub fn finish(&mut self) -> Option<OutputFrame> {
        let frame = self.reassembler.finish();
        if let Some(frame) = &frame {
            self.record(frame);
        }
        info!("{} transfers decoded into {} frames", self.transfers, self.frames);
        frame
    }

    /// Frames produced so far, including any the log has already dropped.
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    fn record(&mut self, frame: &OutputFrame) {
        self.frames += 1;
        self.log.push(frame.clone());
    }

    pub fn log(&self) -> &FrameLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut FrameLog {
        &mut self.log
    }
}
