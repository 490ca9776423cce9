extern crate sdl2;

use chip8vm::chip8::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use chip8vm::{disassemble, Chip8, CollisionFlag, Config, MachineState, Step};
use clap::Parser;
use log::{error, info};
use sdl2::event::Event;
use sdl2::gfx::primitives::DrawRenderer;
use sdl2::keyboard::{Keycode, Scancode};
use sdl2::pixels;
use sdl2::render::Canvas;
use sdl2::video::Window;
use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};

// timers tick once per frame
static FRAME: Duration = Duration::from_micros(16_667);

const BLACK: pixels::Color = pixels::Color {
    r: 0,
    g: 0,
    b: 0,
    a: 0xFF,
};
const WHITE: pixels::Color = pixels::Color {
    r: 0xFF,
    g: 0xFF,
    b: 0xFF,
    a: 0xFF,
};

/// Host keys for CHIP-8 keys 0x0-0xF, four rows down the left of the keyboard.
const KEYMAP: [Scancode; 16] = [
    Scancode::Num1,
    Scancode::Num2,
    Scancode::Num3,
    Scancode::Num4,
    Scancode::Q,
    Scancode::W,
    Scancode::E,
    Scancode::R,
    Scancode::A,
    Scancode::S,
    Scancode::D,
    Scancode::F,
    Scancode::Z,
    Scancode::X,
    Scancode::C,
    Scancode::V,
];

#[derive(Parser, Debug)]
#[command(name = "chip8vm", about = "Runs a CHIP-8 ROM in an SDL2 window.")]
struct Args {
    /// ROM image to load at 0x200.
    rom: PathBuf,

    /// Window pixels per CHIP-8 pixel.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
    scale: u32,

    /// Instructions executed per 60Hz frame.
    #[arg(long, default_value_t = 10)]
    cycles_per_frame: u32,

    /// Fixed seed for RND.
    #[arg(long)]
    seed: Option<u64>,

    /// Set VF when any sprite pixel is erased, not just the last one drawn.
    #[arg(long, default_value_t = false)]
    any_pixel_collision: bool,

    /// Print the ROM as instructions and exit without opening a window.
    #[arg(long, default_value_t = false)]
    disassemble: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    if args.disassemble {
        let rom = std::fs::read(&args.rom)?;
        for line in listing(&rom) {
            println!("{}", line);
        }
        return Ok(());
    }

    let mut config = Config::default();
    config.seed = args.seed;
    if args.any_pixel_collision {
        config = config.with_collision(CollisionFlag::AnyPixel);
    }
    info!("starting with {:?}", config);

    let mut emu = Chip8::with_config(config);
    emu.load_game(&args.rom)?;
    info!("loaded {}", args.rom.display());

    let sdl_ctx = sdl2::init()?;
    let video = sdl_ctx.video()?;

    let window = video
        .window(
            "CHIP-8",
            DISPLAY_WIDTH as u32 * args.scale,
            DISPLAY_HEIGHT as u32 * args.scale,
        )
        .position_centered()
        .build()?;
    let mut canvas = window.into_canvas().build()?;

    canvas.set_draw_color(BLACK);
    canvas.clear();
    canvas.present();

    let mut event_pump = sdl_ctx.event_pump()?;

    'main: loop {
        let frame_start = Instant::now();

        for e in event_pump.poll_iter() {
            match e {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'main,
                _ => {}
            }
        }

        let keyboard = event_pump.keyboard_state();
        for (key, scancode) in KEYMAP.iter().enumerate() {
            emu.state_mut()
                .set_key(key, keyboard.is_scancode_pressed(*scancode));
        }

        let mut redraw = false;
        for _ in 0..args.cycles_per_frame {
            match emu.step() {
                Ok(Step::Executed(_)) => redraw |= emu.state().draw_flag(),
                // nothing more to do until the keyboard changes
                Ok(Step::AwaitingKey) => break,
                Err(e) => {
                    error!("halting: {}", e);
                    return Err(e.into());
                }
            }
        }

        if redraw {
            draw(&mut canvas, emu.state(), args.scale)?;
        }
        emu.state_mut().tick_timers();

        if let Some(rest) = FRAME.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    Ok(())
}

fn listing(rom: &[u8]) -> Vec<String> {
    disassemble(rom)
        .map(|(addr, op, inst)| match inst {
            Some(inst) => format!("{:#05X}: {:04X}  {}", addr, op, inst),
            None => format!("{:#05X}: {:04X}  ???", addr, op),
        })
        .collect()
}

fn draw(canvas: &mut Canvas<Window>, state: &MachineState, scale: u32) -> Result<(), String> {
    canvas.set_draw_color(BLACK);
    canvas.clear();
    let s = scale as i16;
    for (i, p) in state.gfx().iter().enumerate() {
        if *p == 0 {
            continue;
        }
        let x = (i % DISPLAY_WIDTH) as i16 * s;
        let y = (i / DISPLAY_WIDTH) as i16 * s;
        canvas.box_(x, y, x + s - 1, y + s - 1, WHITE)?;
    }
    canvas.present();
    Ok(())
}
