//! Keyboard and mouse state gathered from SDL events once per frame.

use std::collections::HashSet;

use glam::Vec2;
use sdl2::{event::Event, keyboard::Keycode, mouse::MouseButton};

use crate::camera::Movement;

/// The current state of the keyboard.
#[derive(Default)]
pub struct KeyboardState {
    pub down: HashSet<Keycode>,
    pub pressed: HashSet<Keycode>,
    pub released: HashSet<Keycode>,
}

impl KeyboardState {
    /// Maps WASD, space and left shift to camera movement.
    pub fn movement(&self) -> Movement {
        Movement {
            forward: self.down.contains(&Keycode::W),
            backward: self.down.contains(&Keycode::S),
            left: self.down.contains(&Keycode::A),
            right: self.down.contains(&Keycode::D),
            up: self.down.contains(&Keycode::Space),
            down: self.down.contains(&Keycode::LShift),
        }
    }
}

/// The current state of the mouse.
#[derive(Default)]
pub struct MouseState {
    pub position: Vec2,
    pub delta: Vec2,
    pub down: HashSet<MouseButton>,
    pub pressed: HashSet<MouseButton>,
    pub released: HashSet<MouseButton>,
    pub scroll_delta: Vec2,
}

/// Clears per-frame edges (pressed/released/deltas) before a new batch of events.
pub fn begin_frame(keyboard: &mut KeyboardState, mouse: &mut MouseState) {
    keyboard.pressed.clear();
    keyboard.released.clear();
    mouse.delta = Vec2::ZERO;
    mouse.scroll_delta = Vec2::ZERO;
    mouse.pressed.clear();
    mouse.released.clear();
}

/// Folds one SDL event into the input state.
pub fn handle_event(keyboard: &mut KeyboardState, mouse: &mut MouseState, event: &Event) {
    match *event {
        Event::MouseMotion {
            x, y, xrel, yrel, ..
        } => {
            mouse.position = Vec2::new(x as f32, y as f32);
            mouse.delta += Vec2::new(xrel as f32, yrel as f32);
        }
        Event::MouseWheel { x, y, .. } => {
            mouse.scroll_delta += Vec2::new(x as f32, y as f32);
        }
        Event::MouseButtonDown { mouse_btn, .. } => {
            mouse.down.insert(mouse_btn);
            mouse.pressed.insert(mouse_btn);
        }
        Event::MouseButtonUp { mouse_btn, .. } => {
            mouse.down.remove(&mouse_btn);
            mouse.released.insert(mouse_btn);
        }
        Event::KeyDown {
            keycode: Some(keycode),
            repeat: false,
            ..
        } => {
            keyboard.down.insert(keycode);
            keyboard.pressed.insert(keycode);
        }
        Event::KeyUp {
            keycode: Some(keycode),
            repeat: false,
            ..
        } => {
            keyboard.down.remove(&keycode);
            keyboard.released.insert(keycode);
        }
        _ => {}
    }
}
