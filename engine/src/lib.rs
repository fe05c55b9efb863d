#![allow(
    dead_code,
    clippy::too_many_arguments,
    clippy::missing_safety_doc
)]

use anyhow::Result;
use log::*;
use renderer::Renderer;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::Window;

pub mod config;
pub mod error;
mod renderer;
mod vulkan;
pub mod window;

pub use config::{Config, ConfigError, DEFAULT_CONFIG_PATH};
pub use error::{RenderError, ShaderError};
use window::WindowSpec;

#[derive(Debug)]
pub struct Engine {
    window: Window,
    renderer: Renderer,
    event_loop: EventLoop<()>,
}

impl Engine {
    pub fn new(config: &Config) -> Result<Engine> {
        info!("Root directory: {}", config.root_dir);

        // Window
        let event_loop = EventLoop::new()?;
        let window = WindowSpec::from_config(config).build(&event_loop)?;

        let renderer = unsafe { Renderer::create(&window, &config.spirv_path)? };

        Ok(Engine {
            window,
            renderer,
            event_loop,
        })
    }

    /// Draws until the window is closed or Escape is pressed. A failed frame
    /// ends the loop and is returned once everything is torn down.
    pub fn run(self) -> Result<()> {
        let Engine {
            window,
            mut renderer,
            event_loop,
        } = self;
        let mut failure = None;

        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run(|event, elwt| match event {
            // Request a redraw when all events were processed.
            Event::AboutToWait => window.request_redraw(),
            Event::WindowEvent { event, .. } => match event {
                // Render a frame if we are not shutting down.
                WindowEvent::RedrawRequested if !elwt.exiting() => {
                    if let Err(e) = unsafe { renderer.render() } {
                        error!("{:#}", e);
                        failure = Some(e);
                        elwt.exit();
                    }
                }
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::KeyboardInput { event, .. }
                    if event.state == ElementState::Pressed
                        && event.logical_key == Key::Named(NamedKey::Escape) =>
                {
                    elwt.exit()
                }
                _ => {}
            },
            Event::LoopExiting => {
                info!("Shutting down.");
                unsafe { renderer.destroy() };
            }
            _ => {}
        })?;

        failure.map_or(Ok(()), Err)
    }
}
