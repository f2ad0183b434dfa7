//! The CPU-visible system bus.
//!
//! One decode table over the 16-bit address splits traffic between internal
//! RAM, the PPU register file, the controller ports, and PRG-ROM:
//!
//! ```text
//! $0000-$1FFF  2KB internal RAM, mirrored every $0800
//! $2000-$3FFF  PPU registers, mirrored every 8 bytes
//! $4014        OAM DMA trigger
//! $4016        controller 1 data / strobe for both pads
//! $4017        controller 2 data
//! $4000-$4017  everything else is the APU: reads 0, writes dropped
//! $4018-$7FFF  unmapped: reads 0, writes dropped
//! $8000-$FFFF  PRG-ROM (writes dropped)
//! ```

use crate::controller::Controller;
use ferricom_cart::Cartridge;
use ferricom_cpu::Bus;
use ferricom_ppu::Ppu;

/// System bus owning every CPU-addressable component except the CPU itself.
pub struct SystemBus {
    /// 2KB internal RAM.
    ram: [u8; 0x0800],
    /// Picture processor.
    pub ppu: Ppu,
    /// Cartridge image.
    pub cart: Cartridge,
    /// Controller ports 1 and 2.
    pub controllers: [Controller; 2],
    /// Page latched by a $4014 write, serviced before the next instruction.
    dma_page: Option<u8>,
}

impl SystemBus {
    /// Assemble the bus around a cartridge.
    #[must_use]
    pub fn new(cart: Cartridge) -> Self {
        Self {
            ram: [0; 0x0800],
            ppu: Ppu::new(cart.mirroring()),
            cart,
            controllers: [Controller::new(), Controller::new()],
            dma_page: None,
        }
    }

    /// Zero RAM and return every component to power-up state.
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.ppu.reset();
        self.controllers[0].reset();
        self.controllers[1].reset();
        self.dma_page = None;
    }

    /// Advance the PPU three dots for each CPU cycle elapsed.
    ///
    /// Returns true when the PPU raised an NMI request during the window.
    pub fn tick_ppu(&mut self, cpu_cycles: u16) -> bool {
        let mut nmi = false;
        for _ in 0..u32::from(cpu_cycles) * 3 {
            self.ppu.clock(&self.cart);
            nmi |= self.ppu.take_nmi_request();
        }
        nmi
    }

    /// A $4014 write is waiting to be serviced.
    #[must_use]
    pub fn dma_pending(&self) -> bool {
        self.dma_page.is_some()
    }

    /// Copy the latched page into OAM.
    ///
    /// Returns the CPU cycles consumed: 513, or 514 when the write landed
    /// on an odd CPU cycle.
    pub fn run_dma(&mut self, cpu_cycles: u64) -> u16 {
        let Some(page) = self.dma_page.take() else {
            return 0;
        };

        let base = u16::from(page) << 8;
        let mut buffer = [0u8; 256];
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = self.read(base.wrapping_add(i as u16));
        }
        self.ppu.oam_dma(&buffer);

        if cpu_cycles % 2 == 1 { 514 } else { 513 }
    }
}

impl Bus for SystemBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.read_register(addr, &self.cart),
            0x4016 => self.controllers[0].read(),
            0x4017 => self.controllers[1].read(),
            // APU and unmapped space
            0x4000..=0x7FFF => 0,
            0x8000..=0xFFFF => self.cart.prg_read(addr),
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = value,
            0x2000..=0x3FFF => self.ppu.write_register(addr, value, &mut self.cart),
            0x4014 => self.dma_page = Some(value),
            // The strobe line feeds both pads
            0x4016 => {
                self.controllers[0].write_strobe(value);
                self.controllers[1].write_strobe(value);
            }
            // APU, unmapped space, and ROM writes all drop silently
            0x4000..=0x7FFF | 0x8000..=0xFFFF => {}
        }
    }
}
