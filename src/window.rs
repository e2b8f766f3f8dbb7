//! The render unit: a winit event loop blitting composed frames onto a
//! softbuffer surface.
//!
//! This is the main thread's loop. It never touches the network; it
//! reads whatever snapshot the poll thread last published, redraws on a
//! fixed tick and on window events, and reports resizes back so panels
//! can be sized against the real window.

use std::num::NonZeroU32;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use tokio::sync::watch;
use tracing::{debug, info};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

use crate::error::Result;
use crate::view::frame::FrameRenderer;
use crate::view::snapshot::ViewSnapshot;

/// Window size at startup; the window stays resizable.
pub const INITIAL_SIZE: (u32, u32) = (800, 600);

/// Fixed redraw cadence, independent of the server's update rate.
const RENDER_TICK: Duration = Duration::from_millis(200);

/// Open the viewer window and run the event loop until quit.
///
/// Returns once the user closes the window or presses Escape or `q`.
/// The caller is responsible for flipping the cancel flag and joining
/// the poll thread afterwards.
pub fn run(
    title: &str,
    renderer: FrameRenderer,
    snapshot: watch::Receiver<Option<Arc<ViewSnapshot>>>,
    window_size: watch::Sender<(u32, u32)>,
) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let window = Rc::new(
        WindowBuilder::new()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(INITIAL_SIZE.0, INITIAL_SIZE.1))
            .with_resizable(true)
            .build(&event_loop)?,
    );

    let context = softbuffer::Context::new(window.clone())?;
    let mut surface = softbuffer::Surface::new(&context, window.clone())?;
    let size = window.inner_size();
    if let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
        surface.resize(w, h)?;
    }
    info!(width = size.width, height = size.height, "window opened");

    let mut next_tick = Instant::now() + RENDER_TICK;
    let mut needs_redraw = true;

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => {
                debug!("close requested");
                elwt.exit();
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    logical_key, state, ..
                },
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                match &logical_key {
                    Key::Named(NamedKey::Escape) if pressed => elwt.exit(),
                    Key::Character(s) if pressed && s.eq_ignore_ascii_case("q") => elwt.exit(),
                    _ => {}
                }
            }
            WindowEvent::Resized(size) => {
                if let (Some(w), Some(h)) =
                    (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                {
                    let _ = surface.resize(w, h);
                    window_size.send_replace((size.width, size.height));
                    needs_redraw = true;
                }
            }
            WindowEvent::RedrawRequested => {
                if let Ok(mut buffer) = surface.buffer_mut() {
                    let (w, h) = (buffer.width().get(), buffer.height().get());
                    let current = snapshot.borrow().clone();
                    let frame = renderer.render((w, h), current.as_deref());
                    pack_frame(&frame, &mut buffer);
                    if buffer.present().is_err() {
                        elwt.exit();
                    }
                } else {
                    elwt.exit();
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            let now = Instant::now();
            if now >= next_tick {
                next_tick = now + RENDER_TICK;
                needs_redraw = true;
            }
            elwt.set_control_flow(ControlFlow::WaitUntil(next_tick));
            if needs_redraw {
                window.request_redraw();
                needs_redraw = false;
            }
        }
        _ => {}
    })?;

    Ok(())
}

/// Pack an RGBA frame into softbuffer's 0RGB pixel layout. The frame is
/// rendered at the buffer's own size, so the pixel streams line up.
fn pack_frame(frame: &RgbaImage, buffer: &mut [u32]) {
    for (dst, pixel) in buffer.iter_mut().zip(frame.pixels()) {
        let [r, g, b, _] = pixel.0;
        *dst = u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b);
    }
}
