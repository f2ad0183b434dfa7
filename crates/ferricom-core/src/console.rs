//! The console: CPU plus system bus, stepped under the fixed clock ratio.
//!
//! Each CPU instruction runs atomically, then the PPU catches up with three
//! dots per consumed CPU cycle. NMI requests raised by the PPU during the
//! catch-up window are handed to the CPU and observed before its next
//! fetch.

use crate::bus::SystemBus;
use ferricom_cart::{Cartridge, RomError};
use ferricom_cpu::{Bus, Cpu, CpuError};

/// Faults surfaced to the driver.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The ROM image could not be loaded.
    #[error("ROM load failed: {0}")]
    Rom(#[from] RomError),
    /// The CPU hit a fault (illegal opcode).
    #[error("CPU fault: {0}")]
    Cpu(#[from] CpuError),
}

/// Host window abstraction. The framebuffer reference is only valid for
/// the duration of the call; copy it before the next frame starts.
pub trait Screen {
    /// Present a completed 256x240 ARGB frame, row-major, top-left origin.
    fn blit(&mut self, framebuffer: &[u32]);
}

/// Host input abstraction, polled once per frame per controller port.
pub trait InputSource {
    /// Current button mask for a port (0 or 1), in A, B, Select, Start,
    /// Up, Down, Left, Right bit order.
    fn poll(&mut self, port: usize) -> u8;
}

/// A complete NES, minus the host-facing collaborators.
pub struct Console {
    cpu: Cpu,
    bus: SystemBus,
    frame_count: u64,
    pc_zero_reported: bool,
}

impl Console {
    /// Build a console around a loaded cartridge and reset it.
    #[must_use]
    pub fn new(cart: Cartridge) -> Self {
        let mut console = Self {
            cpu: Cpu::new(),
            bus: SystemBus::new(cart),
            frame_count: 0,
            pc_zero_reported: false,
        };
        console.reset();
        console
    }

    /// Build a console straight from `.nes` file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Rom`] when the file is malformed or violates
    /// NROM constraints.
    pub fn from_rom_bytes(data: &[u8]) -> Result<Self, ConsoleError> {
        Ok(Self::new(Cartridge::load(data)?))
    }

    /// Power-cycle: RAM zeroed, components to power-up state, PC loaded
    /// from the reset vector.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
        self.frame_count = 0;
        self.pc_zero_reported = false;
    }

    /// Run one CPU instruction (or service pending OAM DMA), then advance
    /// the PPU three dots per consumed cycle.
    ///
    /// Returns the CPU cycles consumed.
    ///
    /// # Errors
    ///
    /// Propagates the CPU's [`CpuError`] (illegal opcode).
    pub fn step(&mut self) -> Result<u16, ConsoleError> {
        let cycles = if self.bus.dma_pending() {
            let dma_cycles = self.bus.run_dma(self.cpu.cycles);
            self.cpu.cycles += u64::from(dma_cycles);
            dma_cycles
        } else {
            u16::from(self.cpu.step(&mut self.bus)?)
        };

        if self.bus.tick_ppu(cycles) {
            self.cpu.request_nmi();
        }

        // Many test ROMs jump through $0000 to signal a crash.
        if self.cpu.pc == 0 && !self.pc_zero_reported {
            self.pc_zero_reported = true;
            log::warn!("PC reached $0000; test-ROM crash convention");
        }

        Ok(cycles)
    }

    /// Step until the PPU finishes the current frame, then hand out the
    /// framebuffer.
    ///
    /// # Errors
    ///
    /// Propagates the CPU's [`CpuError`].
    pub fn step_frame(&mut self) -> Result<&[u32], ConsoleError> {
        loop {
            self.step()?;
            if self.bus.ppu.take_frame_done() {
                break;
            }
        }
        self.frame_count += 1;
        Ok(self.bus.ppu.framebuffer())
    }

    /// One full frame against the host collaborators: poll input, emulate,
    /// present.
    ///
    /// # Errors
    ///
    /// Propagates the CPU's [`CpuError`].
    pub fn run_frame(
        &mut self,
        input: &mut impl InputSource,
        screen: &mut impl Screen,
    ) -> Result<(), ConsoleError> {
        self.bus.controllers[0].set_state(input.poll(0));
        self.bus.controllers[1].set_state(input.poll(1));
        let framebuffer = self.step_frame()?;
        screen.blit(framebuffer);
        Ok(())
    }

    /// Set a controller's button mask directly (port 0 or 1).
    pub fn set_controller(&mut self, port: usize, mask: u8) {
        self.bus.controllers[port].set_state(mask);
    }

    /// Frames completed since the last reset.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// CPU view, for driver diagnostics and tests.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Bus view.
    #[must_use]
    pub fn bus(&self) -> &SystemBus {
        &self.bus
    }

    /// Mutable bus access, for drivers that need to poke memory.
    pub fn bus_mut(&mut self) -> &mut SystemBus {
        &mut self.bus
    }

    /// Read a byte off the bus (carries normal read side effects).
    pub fn read(&mut self, addr: u16) -> u8 {
        self.bus.read(addr)
    }
}
