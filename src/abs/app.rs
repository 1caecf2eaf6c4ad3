//! SDL2 and OpenGL application management.
//!
//! This module defines the [`App`] struct which encapsulates the SDL2
//! and OpenGL context necessary for creating a windowed application.

use std::sync::Arc;

use crate::settings::WindowSettings;

/// The [`App`] struct encapsulates the SDL2 and OpenGL context.
pub struct App {
    pub sdl: sdl2::Sdl,
    pub video_subsystem: sdl2::VideoSubsystem,
    pub window: sdl2::video::Window,
    pub gl_context: sdl2::video::GLContext,
    pub gl: Arc<glow::Context>,
    pub event_pump: sdl2::EventPump,
}

impl App {
    /// Creates a new [`App`] with an OpenGL 3.3 core context.
    /// The width and height settings are ignored if `fullscreen` is set.
    pub fn new(settings: &WindowSettings) -> Result<Self, String> {
        let sdl = sdl2::init()?;
        let video_subsystem = sdl.video()?;
        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
        gl_attr.set_context_version(3, 3);
        gl_attr.set_depth_size(24);

        let (width, height) = if settings.fullscreen {
            let display_mode = video_subsystem.current_display_mode(0)?;
            (display_mode.w as u32, display_mode.h as u32)
        } else {
            (settings.width, settings.height)
        };

        let mut builder = video_subsystem.window(&settings.title, width, height);
        builder.opengl().resizable();
        if settings.hidden {
            builder.hidden();
        }
        let mut window = builder.build().map_err(|e| e.to_string())?;
        window.set_fullscreen(if settings.fullscreen {
            sdl2::video::FullscreenType::Desktop
        } else {
            sdl2::video::FullscreenType::Off
        })?;

        let gl_context = window.gl_create_context()?;
        window.gl_make_current(&gl_context)?;
        let swap_interval = if settings.vsync {
            sdl2::video::SwapInterval::VSync
        } else {
            sdl2::video::SwapInterval::Immediate
        };
        if let Err(err) = video_subsystem.gl_set_swap_interval(swap_interval) {
            log::warn!("could not set swap interval: {err}");
        }

        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                video_subsystem.gl_get_proc_address(s) as *const _
            })
        };
        let event_pump = sdl.event_pump()?;
        log::info!("created {}x{} window '{}'", width, height, settings.title);

        Ok(Self {
            sdl,
            video_subsystem,
            window,
            gl_context,
            gl: Arc::new(gl),
            event_pump,
        })
    }

    /// Returns the drawable size of the window as a width / height ratio.
    pub fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.window.drawable_size();
        width as f32 / height.max(1) as f32
    }
}
