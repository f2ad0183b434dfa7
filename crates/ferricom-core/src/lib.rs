//! NES emulation core: the integration layer.
//!
//! This crate wires the CPU, PPU, cartridge, and controllers together:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                   Console                     │
//! │  ┌─────────────────────────────────────────┐  │
//! │  │                SystemBus                │  │
//! │  │  ┌─────┐  ┌─────┐  ┌──────┐  ┌───────┐  │  │
//! │  │  │ RAM │  │ PPU │  │ Cart │  │ Pads  │  │  │
//! │  │  │ 2KB │  │     │  │ NROM │  │ x2    │  │  │
//! │  │  └─────┘  └─────┘  └──────┘  └───────┘  │  │
//! │  └─────────────────────────────────────────┘  │
//! │                      ▲                        │
//! │                 ┌────┴────┐                   │
//! │                 │   CPU   │                   │
//! │                 │  6502   │                   │
//! │                 └─────────┘                   │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! The driver loop is cooperative: one CPU instruction, then three PPU dots
//! per consumed cycle, repeated until the PPU flags the frame complete.
//! Host windowing and input are reached through the [`Screen`] and
//! [`InputSource`] traits; audio register traffic is dropped.
//!
//! ```no_run
//! use ferricom_core::Console;
//!
//! let rom = std::fs::read("game.nes").expect("read ROM");
//! let mut console = Console::from_rom_bytes(&rom).expect("load ROM");
//!
//! loop {
//!     console.set_controller(0, 0x00);
//!     let framebuffer = console.step_frame().expect("cpu fault");
//!     // hand `framebuffer` to the screen collaborator
//!     let _ = framebuffer;
//! }
//! ```

mod bus;
mod console;
mod controller;

pub use bus::SystemBus;
pub use console::{Console, ConsoleError, InputSource, Screen};
pub use controller::{Button, Controller};

// The component crates re-exported for drivers
pub use ferricom_cart::{Cartridge, Mirroring, Rom, RomError, RomHeader};
pub use ferricom_cpu::{Cpu, CpuError};
pub use ferricom_ppu::Ppu;

/// Screen geometry shared with the host.
pub mod screen {
    /// Frame width in pixels.
    pub const WIDTH: usize = 256;
    /// Frame height in pixels.
    pub const HEIGHT: usize = 240;
    /// Pixels per frame.
    pub const PIXELS: usize = WIDTH * HEIGHT;
}
