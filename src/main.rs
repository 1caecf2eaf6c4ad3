use std::{path::PathBuf, process::ExitCode, time::Instant};

use glam::{Mat3, Mat4};
use glow::HasContext;
use sdl2::{
    event::{Event, WindowEvent},
    keyboard::Keycode,
};

use lumen3d::{
    abs::{App, ShaderProgram},
    cache::AssetCache,
    camera::Camera,
    frame::{FrameClock, FrameContext},
    input::{self, KeyboardState, MouseState},
    lighting::{Material, SceneLights},
    logging,
    model::Model,
    settings::{CameraSettings, Settings},
};

fn main() -> ExitCode {
    let settings_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = match Settings::load_or_default(settings_path.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = logging::init(&settings.logging) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::new(&settings.window)?;

    unsafe {
        app.gl.enable(glow::DEPTH_TEST);
    }

    let (program, shader_error) = ShaderProgram::from_files_lossy(
        &app.gl,
        &settings.scene.vertex_shader,
        &settings.scene.fragment_shader,
    )?;
    if shader_error.is_some() {
        log::warn!("the scene will not be visible until the shaders are fixed");
    }

    let mut cache = AssetCache::new(&app.gl, settings.assets.texture_options())
        .with_import_options(settings.assets.import_options());
    let model = Model::load(&app.gl, &settings.scene.model, &mut cache)?;

    let mut camera = Camera::new(settings.camera.position());
    camera.set_fov(settings.camera.fov);
    let mut lights = SceneLights::default();
    let material = Material::default();

    let mut keyboard = KeyboardState::default();
    let mut mouse = MouseState::default();
    let mut clock = FrameClock::new(Instant::now());

    let mut grabbed = true;
    app.sdl.mouse().set_relative_mouse_mode(grabbed);

    'running: loop {
        let delta_time = clock.tick(Instant::now());

        input::begin_frame(&mut keyboard, &mut mouse);
        for event in app.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => break 'running,
                Event::Window {
                    win_event: WindowEvent::SizeChanged(width, height),
                    ..
                } => unsafe {
                    app.gl.viewport(0, 0, width, height);
                },
                _ => {}
            }
            input::handle_event(&mut keyboard, &mut mouse, &event);
        }

        if keyboard.pressed.contains(&Keycode::Escape) {
            grabbed = !grabbed;
            app.sdl.mouse().set_relative_mouse_mode(grabbed);
        }
        if keyboard.pressed.contains(&Keycode::F) {
            lights.spot_enabled = !lights.spot_enabled;
        }

        let ctx = FrameContext::new(&keyboard, &mouse, &clock, delta_time, app.aspect_ratio());
        update(&mut camera, &mut lights, &ctx, &settings.camera, grabbed);
        draw(
            &app.gl,
            &program,
            &model,
            &camera,
            &lights,
            &material,
            &ctx,
            settings.scene.clear_color,
        );

        app.window.gl_swap_window();
    }

    log::info!("exiting after {} frames", clock.frame());
    Ok(())
}

fn update(
    camera: &mut Camera,
    lights: &mut SceneLights,
    ctx: &FrameContext,
    settings: &CameraSettings,
    grabbed: bool,
) {
    if grabbed {
        // Screen y grows downwards, pitch grows upwards.
        camera.apply_look_delta(ctx.mouse.delta.x, -ctx.mouse.delta.y, settings.sensitivity);
        camera.apply_zoom(ctx.mouse.scroll_delta.y);
    }
    camera.apply_move(ctx.keyboard.movement(), settings.speed * ctx.delta_time);
    lights.spot.follow(camera);
}

#[allow(clippy::too_many_arguments)]
fn draw(
    gl: &glow::Context,
    program: &ShaderProgram,
    model: &Model,
    camera: &Camera,
    lights: &SceneLights,
    material: &Material,
    ctx: &FrameContext,
    clear_color: [f32; 3],
) {
    unsafe {
        gl.clear_color(clear_color[0], clear_color[1], clear_color[2], 1.0);
        gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
    }

    let transform = Mat4::IDENTITY;
    program.use_program();
    program.set_uniform("projection", camera.projection(ctx.aspect_ratio));
    program.set_uniform("view", camera.view());
    program.set_uniform("model", transform);
    program.set_uniform("normalMatrix", Mat3::from_mat4(transform).inverse().transpose());
    program.set_uniform("viewPos", camera.position);
    lights.apply(program);
    material.apply(program, "material");

    model.draw(program);
}
