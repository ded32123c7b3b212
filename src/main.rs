mod audio;
mod engine;
mod renderer;
mod utils;

use nannou::prelude::*;

use audio::SourcePipe;
use engine::{ColorPair, FrameDriver, CYAN, LIME, MAGENTA};
use renderer::Scene;
use utils::Config;

/// FFT sizes the F key cycles through.
const FFT_SIZES: [usize; 3] = [512, 1024, 2048];

/// Color pair presets the C key cycles through: (artifact, cage).
const COLOR_PRESETS: [(ColorPair, ColorPair); 3] = [
    (
        ColorPair {
            a: LIME,
            b: 0x80e0ff,
        },
        ColorPair { a: MAGENTA, b: CYAN },
    ),
    (
        ColorPair { a: CYAN, b: MAGENTA },
        ColorPair { a: LIME, b: 0xffffff },
    ),
    (
        ColorPair {
            a: 0xff6600,
            b: 0xffdd00,
        },
        ColorPair {
            a: 0x4400ff,
            b: 0x00ffcc,
        },
    ),
];

fn main() {
    SourcePipe::list_devices();

    nannou::app(model).update(update).run();
}

struct Model {
    source: SourcePipe,
    driver: FrameDriver,
    scene: Scene,
    preset_idx: usize,
}

fn model(app: &App) -> Model {
    let config = Config::load();

    app.new_window()
        .view(view)
        .key_pressed(key_pressed)
        .size(1280, 720)
        .build()
        .unwrap();

    Model {
        source: SourcePipe::new(),
        driver: FrameDriver::new(config.fft_size(), config.modulation_state()),
        scene: Scene::new(),
        preset_idx: 0,
    }
}

fn update(_app: &App, model: &mut Model, update: Update) {
    let samples = model.source.stream();
    let dt = update.since_last.as_secs_f32();

    model.scene.update();
    model.driver.tick(dt, &samples);
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    model.scene.draw(&draw, app.window_rect(), &model.driver);
    draw.to_frame(app, &frame).unwrap();
}

/// Persist the driver's current tunables for the next run.
fn remember(model: &Model) {
    let mut config = Config::load();
    config.remember_state(model.driver.state(), model.driver.fft_size());
}

fn key_pressed(app: &App, model: &mut Model, key: Key) {
    if key == Key::Q {
        app.quit();
        return;
    }

    let shift = app.keys.mods.shift();
    // Shifted letter raises a value, plain lowers it
    let dir = if shift { 1.0 } else { -1.0 };

    match key {
        Key::G => {
            let gain = (model.driver.state().gain + dir * 0.1).max(0.0);
            model.driver.apply_gain(gain);
            model.scene.show_notification(format!("Gain: {:.1}", gain));
            remember(model);
        }
        Key::R => {
            let reactivity = (model.driver.state().reactivity + dir * 0.1).max(0.0);
            model.driver.apply_reactivity(reactivity);
            model
                .scene
                .show_notification(format!("Reactivity: {:.1}", reactivity));
            remember(model);
        }
        Key::S => {
            let speed = (model.driver.state().deform_speed + dir * 0.1).clamp(0.0, 4.0);
            model.driver.apply_deform_speed(speed);
            model
                .scene
                .show_notification(format!("Deform speed: {:.1}", speed));
            remember(model);
        }
        Key::B => {
            let state = model.driver.state();
            let strength = (state.bloom_strength + dir * 0.05).max(0.0);
            model.driver.apply_bloom(strength, state.bloom_radius);
            model
                .scene
                .show_notification(format!("Glow strength: {:.2}", strength));
            remember(model);
        }
        Key::V => {
            let state = model.driver.state();
            let radius = (state.bloom_radius + dir * 0.05).max(0.0);
            model.driver.apply_bloom(state.bloom_strength, radius);
            model
                .scene
                .show_notification(format!("Glow radius: {:.2}", radius));
            remember(model);
        }
        Key::F => {
            let current = model.driver.fft_size();
            let idx = FFT_SIZES.iter().position(|&s| s == current).unwrap_or(1);
            let next = FFT_SIZES[(idx + 1) % FFT_SIZES.len()];
            model.driver.set_resolution(next);
            model
                .scene
                .show_notification(format!("FFT: {} ({} bins)", next, next / 2));
            remember(model);
        }
        Key::C => {
            model.preset_idx = (model.preset_idx + 1) % COLOR_PRESETS.len();
            let (artifact, cage) = COLOR_PRESETS[model.preset_idx];
            model.driver.apply_colors(artifact, cage);
            model
                .scene
                .show_notification(format!("Colors: preset {}", model.preset_idx + 1));
            remember(model);
        }
        _ => handle_device_key(app, model, key),
    }
}

fn handle_device_key(app: &App, model: &mut Model, key: Key) {
    let num_devices = model.source.device_count();
    if num_devices == 0 {
        return;
    }

    let shift_offset = if app.keys.mods.shift() { 10 } else { 0 };

    let index = match key {
        Key::Key0 => Some(shift_offset),
        Key::Key1 => Some(1 + shift_offset),
        Key::Key2 => Some(2 + shift_offset),
        Key::Key3 => Some(3 + shift_offset),
        Key::Key4 => Some(4 + shift_offset),
        Key::Key5 => Some(5 + shift_offset),
        Key::Key6 => Some(6 + shift_offset),
        Key::Key7 => Some(7 + shift_offset),
        Key::Key8 => Some(8 + shift_offset),
        Key::Key9 => Some(9 + shift_offset),
        _ => None,
    };

    if let Some(idx) = index {
        if let Some((name, success)) = model.source.select_device(idx) {
            let msg = if success {
                format!("[{}] {}", idx, name)
            } else {
                format!("[{}] {} - FAILED", idx, name)
            };
            model.scene.show_notification(msg);
        }
    }
}
