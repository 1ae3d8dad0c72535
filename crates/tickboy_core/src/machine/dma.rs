use super::System;
use crate::fault::Fault;
use crate::scheduler::{Callback, EventId};

pub(crate) const DMA: u16 = 0xFF46;
const OAM_START: usize = 0xFE00;
const OAM_LEN: usize = 0xA0;
/// 160 M-cycles plus the startup delay.
pub(crate) const OAM_DMA_TICKS: u64 = 644;

impl System {
    /// DMA write: the copy lands when the transfer finishes. A restart
    /// replaces the pending transfer.
    pub(super) fn start_oam_dma(&mut self, value: u8) -> Result<(), Fault> {
        self.dma_source = value;
        self.scheduler.cancel_events_by_id(EventId::OamDma);
        self.scheduler
            .add_event_relative(EventId::OamDma, OAM_DMA_TICKS, Callback::OamDma)
    }

    /// `OamDma` event: copy 160 bytes from XX00..XX9F to FE00..FE9F.
    pub(super) fn finish_oam_dma(&mut self) {
        let base = usize::from(self.dma_source) << 8;
        // Sources above 0xDFFF read the echo of work RAM.
        let base = if base >= 0xE000 { base - 0x2000 } else { base };
        self.memory
            .copy_within(base..base + OAM_LEN, OAM_START);
    }
}
