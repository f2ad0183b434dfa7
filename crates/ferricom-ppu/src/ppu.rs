//! The PPU proper: register interface, dot clock, and pixel multiplexing.
//!
//! The PPU walks 341 dots per scanline over 262 scanlines. Scanlines 0-239
//! emit pixels, 240 idles, 241-260 are VBlank, 261 is the pre-render line
//! that rewinds the scroll registers for the next frame. The system driver
//! calls [`Ppu::clock`] three times per CPU cycle.

use crate::background::Background;
use crate::oam::Oam;
use crate::palette;
use crate::scroll::Scroll;
use crate::sprite::ScanlineSprites;
use crate::vram::Vram;
use crate::{Ctrl, Mask, PpuStatus};
use ferricom_cart::{Cartridge, Mirroring};

/// Framebuffer width in pixels.
pub const FRAME_WIDTH: usize = 256;
/// Framebuffer height in pixels.
pub const FRAME_HEIGHT: usize = 240;

const DOTS_PER_SCANLINE: u16 = 341;
const SCANLINES_PER_FRAME: u16 = 262;
const VBLANK_SCANLINE: u16 = 241;
const PRE_RENDER_SCANLINE: u16 = 261;

/// Ricoh 2C02 PPU.
pub struct Ppu {
    ctrl: Ctrl,
    mask: Mask,
    status: PpuStatus,
    scroll: Scroll,
    vram: Vram,
    oam: Oam,

    background: Background,
    sprites: ScanlineSprites,

    framebuffer: Vec<u32>,
    read_buffer: u8,
    nmi_request: bool,

    scanline: u16,
    dot: u16,
    frame: u64,
    frame_done: bool,
}

impl Ppu {
    /// Create a PPU wired for the cartridge's nametable mirroring.
    #[must_use]
    pub fn new(mirroring: Mirroring) -> Self {
        Self {
            ctrl: Ctrl::empty(),
            mask: Mask::empty(),
            status: PpuStatus::empty(),
            scroll: Scroll::new(),
            vram: Vram::new(mirroring),
            oam: Oam::new(),
            background: Background::new(),
            sprites: ScanlineSprites::new(),
            framebuffer: vec![0xFF00_0000; FRAME_WIDTH * FRAME_HEIGHT],
            read_buffer: 0,
            nmi_request: false,
            scanline: 0,
            dot: 0,
            frame: 0,
            frame_done: false,
        }
    }

    // ------------------------------------------------------------------
    // CPU-visible registers ($2000-$2007, mirrored through $3FFF)
    // ------------------------------------------------------------------

    /// Read a PPU register. Write-only registers read back as 0.
    pub fn read_register(&mut self, addr: u16, cart: &Cartridge) -> u8 {
        match addr & 0x07 {
            // PPUSTATUS: side effects on every read
            2 => {
                let value = self.status.bits();
                self.status.remove(PpuStatus::VBLANK);
                self.scroll.reset_toggle();
                self.nmi_request = false;
                value
            }

            // OAMDATA: no pointer increment on reads
            4 => self.oam.read(),

            // PPUDATA: buffered, except palette addresses
            7 => {
                let addr = self.scroll.addr() & 0x3FFF;
                let value = if addr >= 0x3F00 {
                    // Palette reads bypass the buffer; the buffer refills
                    // from the nametable underneath the palette region.
                    self.read_buffer = self.vram.nametable_read(addr - 0x1000);
                    self.vram.palette_read(addr) & 0x3F
                } else {
                    let buffered = self.read_buffer;
                    self.read_buffer = self.mem_read(cart, addr);
                    buffered
                };
                self.scroll.increment(self.ctrl.vram_increment());
                value
            }

            _ => 0,
        }
    }

    /// Write a PPU register.
    pub fn write_register(&mut self, addr: u16, value: u8, cart: &mut Cartridge) {
        match addr & 0x07 {
            0 => {
                self.ctrl = Ctrl::from_bits_truncate(value);
                self.scroll.write_ctrl(value);
                // Enabling NMI while the VBlank flag is still set raises
                // the interrupt immediately.
                if self.ctrl.nmi_enabled() && self.status.in_vblank() {
                    self.nmi_request = true;
                }
            }
            1 => self.mask = Mask::from_bits_truncate(value),
            2 => {} // read-only
            3 => self.oam.set_addr(value),
            4 => self.oam.write(value),
            5 => self.scroll.write_scroll(value),
            6 => self.scroll.write_addr(value),
            7 => {
                let addr = self.scroll.addr() & 0x3FFF;
                self.mem_write(cart, addr, value);
                self.scroll.increment(self.ctrl.vram_increment());
            }
            _ => unreachable!(),
        }
    }

    /// Bulk OAM fill from a DMA page, starting at the current OAMADDR.
    pub fn oam_dma(&mut self, page: &[u8; 256]) {
        self.oam.dma(page);
    }

    fn mem_read(&self, cart: &Cartridge, addr: u16) -> u8 {
        match addr & 0x3FFF {
            0x0000..=0x1FFF => cart.chr_read(addr),
            0x2000..=0x3EFF => self.vram.nametable_read(addr),
            addr => self.vram.palette_read(addr),
        }
    }

    fn mem_write(&mut self, cart: &mut Cartridge, addr: u16, value: u8) {
        match addr & 0x3FFF {
            0x0000..=0x1FFF => cart.chr_write(addr, value),
            0x2000..=0x3EFF => self.vram.nametable_write(addr, value),
            addr => self.vram.palette_write(addr, value),
        }
    }

    // ------------------------------------------------------------------
    // Dot clock
    // ------------------------------------------------------------------

    /// Advance the PPU by one dot.
    pub fn clock(&mut self, cart: &Cartridge) {
        let scanline = self.scanline;
        let dot = self.dot;
        let rendering = self.mask.rendering_enabled();

        if scanline == VBLANK_SCANLINE && dot == 1 {
            self.status.insert(PpuStatus::VBLANK);
            if self.ctrl.nmi_enabled() {
                self.nmi_request = true;
            }
        }

        if scanline == PRE_RENDER_SCANLINE && dot == 1 {
            self.status.remove(
                PpuStatus::VBLANK | PpuStatus::SPRITE_ZERO_HIT | PpuStatus::SPRITE_OVERFLOW,
            );
            self.nmi_request = false;
        }

        let on_render_line = scanline < 240 || scanline == PRE_RENDER_SCANLINE;

        if rendering && on_render_line {
            self.render_dot(cart, scanline, dot);
        } else if scanline < 240 && (1..=256).contains(&dot) {
            // Rendering disabled: the screen shows the backdrop color.
            let index = self.vram.palette_entry(0);
            self.framebuffer[usize::from(scanline) * FRAME_WIDTH + usize::from(dot) - 1] =
                palette::argb(index);
        }

        self.advance(rendering);
    }

    /// One dot of the background/sprite machinery on a rendering scanline.
    fn render_dot(&mut self, cart: &Cartridge, scanline: u16, dot: u16) {
        let fetch_dot = (1..=256).contains(&dot) || (321..=336).contains(&dot);

        // Pixel output reads the shifters before they advance.
        if scanline < 240 && (1..=256).contains(&dot) {
            self.emit_pixel(scanline, dot - 1);
        }

        if fetch_dot {
            self.background.shift();
            match dot % 8 {
                1 => {
                    let tile = self.vram.nametable_read(self.scroll.tile_addr());
                    self.background.set_tile_index(tile);
                }
                3 => {
                    let byte = self.vram.nametable_read(self.scroll.attribute_addr());
                    self.background
                        .set_attribute(byte, self.scroll.coarse_x(), self.scroll.coarse_y());
                }
                5 => {
                    let addr = self.bg_pattern_addr();
                    self.background.set_pattern_lo(cart.chr_read(addr));
                }
                7 => {
                    let addr = self.bg_pattern_addr();
                    self.background.set_pattern_hi(cart.chr_read(addr + 8));
                }
                0 => {
                    self.background.reload();
                    self.scroll.increment_x();
                }
                _ => {}
            }
        }

        if dot == 256 {
            self.scroll.increment_y();
        }
        if dot == 257 {
            self.scroll.copy_horizontal();

            // Evaluate sprites for the next scanline in one pass.
            let next = if scanline == PRE_RENDER_SCANLINE {
                0
            } else {
                scanline + 1
            };
            if next < 240 {
                self.sprites.evaluate(&self.oam, cart, next, self.ctrl);
                if self.sprites.overflow {
                    self.status.insert(PpuStatus::SPRITE_OVERFLOW);
                }
            } else {
                self.sprites.clear();
            }
        }
        if scanline == PRE_RENDER_SCANLINE && (280..=304).contains(&dot) {
            self.scroll.copy_vertical();
        }
    }

    fn bg_pattern_addr(&self) -> u16 {
        self.ctrl.bg_table()
            + u16::from(self.background.tile_index()) * 16
            + u16::from(self.scroll.fine_y())
    }

    /// Select and store the color for screen position (x, scanline).
    fn emit_pixel(&mut self, scanline: u16, x: u16) {
        let mut bg_pattern = 0;
        let mut bg_palette = 0;
        if self.mask.show_background() && (x >= 8 || self.mask.background_left()) {
            let (pattern, pal) = self.background.pixel(self.scroll.fine_x());
            bg_pattern = pattern;
            bg_palette = pal;
        }

        let sprite = if self.mask.show_sprites() && (x >= 8 || self.mask.sprites_left()) {
            self.sprites.pixel_at(x)
        } else {
            None
        };

        let palette_index = match (bg_pattern, sprite) {
            (0, None) => 0,
            (0, Some(sp)) => sp.palette << 2 | sp.pattern,
            (_, None) => bg_palette << 2 | bg_pattern,
            (_, Some(sp)) => {
                if sp.is_sprite_zero && x != 255 {
                    self.status.insert(PpuStatus::SPRITE_ZERO_HIT);
                }
                if sp.behind_background {
                    bg_palette << 2 | bg_pattern
                } else {
                    sp.palette << 2 | sp.pattern
                }
            }
        };

        let color_index = self.vram.palette_entry(palette_index) & 0x3F;
        self.framebuffer[usize::from(scanline) * FRAME_WIDTH + usize::from(x)] =
            palette::argb(color_index);
    }

    /// Advance the dot/scanline counters, handling the odd-frame skip.
    fn advance(&mut self, rendering: bool) {
        self.dot += 1;

        // Odd frames drop the last dot of the pre-render line when
        // rendering is enabled.
        if self.scanline == PRE_RENDER_SCANLINE
            && self.dot == DOTS_PER_SCANLINE - 1
            && rendering
            && self.frame & 1 == 1
        {
            self.dot += 1;
        }

        if self.dot >= DOTS_PER_SCANLINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline >= SCANLINES_PER_FRAME {
                self.scanline = 0;
                self.frame += 1;
                self.frame_done = true;
                log::trace!("frame {} complete", self.frame);
            }
        }
    }

    // ------------------------------------------------------------------
    // Driver handshakes
    // ------------------------------------------------------------------

    /// The completed 256x240 ARGB framebuffer, row-major from the top-left.
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    /// True once per frame, at the wrap back to scanline 0. Clears on read.
    pub fn take_frame_done(&mut self) -> bool {
        std::mem::take(&mut self.frame_done)
    }

    /// Pending NMI request, cleared on read.
    pub fn take_nmi_request(&mut self) -> bool {
        std::mem::take(&mut self.nmi_request)
    }

    /// Current scanline (0-261).
    #[must_use]
    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    /// Current dot within the scanline (0-340).
    #[must_use]
    pub fn dot(&self) -> u16 {
        self.dot
    }

    /// Frames completed since power-on.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Power-up state. Mirroring wiring is preserved.
    pub fn reset(&mut self) {
        self.ctrl = Ctrl::empty();
        self.mask = Mask::empty();
        self.status = PpuStatus::empty();
        self.scroll = Scroll::new();
        self.vram.reset();
        self.oam.reset();
        self.background.reset();
        self.sprites.clear();
        self.framebuffer.fill(0xFF00_0000);
        self.read_buffer = 0;
        self.nmi_request = false;
        self.scanline = 0;
        self.dot = 0;
        self.frame = 0;
        self.frame_done = false;
    }
}
