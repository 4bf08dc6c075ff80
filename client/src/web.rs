//! JavaScript-facing engine handle.
//!
//! One engine lives per page in a thread-local slot. DOM listeners and the
//! animation-frame callback reach it through that slot, and host callbacks
//! are always invoked after the slot is released so they may call back in.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use js_sys::{Function, JSON};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Event, EventTarget, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent,
    TouchEvent, Window,
};
use web_time::Instant;
use winit::keyboard::KeyCode;

use crate::audio::Audio;
use crate::config::{JOYSTICK_PAD_BOTTOM, JOYSTICK_PAD_LEFT};
use crate::driver::{FrameDriver, FrameReport};
use crate::error::EngineError;
use crate::game::{GameEvent, GameState};
use crate::level::LevelKind;
use crate::presence::{Appearance, parse_players};
use crate::render::Renderer;
use crate::render::labels::LabelLayer;
use crate::settings::GameSettings;

thread_local! {
    static STATE: RefCell<Option<Engine>> = const { RefCell::new(None) };
    static FRAME: RefCell<Option<Closure<dyn FnMut(f64)>>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn run() {
    std::panic::set_hook(Box::new(|info| {
        web_sys::console::error_1(&info.to_string().into())
    }));
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
}

/// A registered DOM listener, detached when dropped.
struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, EngineError> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
            .map_err(|_| EngineError::Dom(format!("cannot listen for {kind}")))?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

struct HostCallbacks {
    on_pause: Function,
    on_win: Function,
    on_position: Function,
}

impl HostCallbacks {
    fn deliver(&self, report: &FrameReport) {
        for event in &report.events {
            let result = match event {
                GameEvent::Won => self.on_win.call0(&JsValue::NULL),
                GameEvent::PauseRequested => self.on_pause.call0(&JsValue::NULL),
                _ => continue,
            };
            if let Err(e) = result {
                log::error!("Host callback for {:?} threw: {:?}", event, e);
            }
        }

        let Some(sample) = &report.sync else {
            return;
        };
        let position = serde_json::to_string(&sample.position)
            .ok()
            .and_then(|json| JSON::parse(&json).ok());
        if let Some(position) = position
            && let Err(e) = self.on_position.call2(
                &JsValue::NULL,
                &position,
                &JsValue::from_f64(sample.rotation as f64),
            )
        {
            log::error!("Position callback threw: {:?}", e);
        }
    }
}

struct Engine {
    driver: FrameDriver,
    renderer: Renderer,
    audio: Audio,
    labels: LabelLayer,
    callbacks: Rc<HostCallbacks>,
    container: HtmlElement,
    listeners: Vec<Listener>,
    started: Instant,
    last_frame: Option<Instant>,
    raf_id: Option<i32>,
}

impl Engine {
    fn css_size(&self) -> (f64, f64) {
        (
            self.container.client_width().max(1) as f64,
            self.container.client_height().max(1) as f64,
        )
    }

    fn apply_quality(&mut self) {
        let (w, h) = self.css_size();
        let quality = self.driver.game.settings.render_quality(device_pixel_ratio());
        self.renderer.set_quality(quality, w, h);
    }

    fn frame(&mut self) -> FrameReport {
        let now = Instant::now();
        let elapsed = self
            .last_frame
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last_frame = Some(now);
        let clock = now.duration_since(self.started).as_secs_f64();

        let report = self.driver.advance(elapsed, clock);
        for event in &report.events {
            match event {
                GameEvent::Sound(cue) => self.audio.play(*cue),
                GameEvent::PointerReleased => {
                    if let Some(doc) = document() {
                        doc.exit_pointer_lock();
                    }
                }
                _ => {}
            }
        }

        match self.renderer.render_frame(&self.driver.game) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.renderer.recover_surface()
            }
            Err(e) => log::error!("Render error: {:?}", e),
        }

        let game = &self.driver.game;
        let (w, h) = self.css_size();
        self.labels.update(
            &game.labels(),
            self.renderer.view_proj(game),
            game.settings.fov_radians(),
            w as f32,
            h as f32,
        );
        report
    }

    fn cancel_frame(&mut self) {
        if let Some(id) = self.raf_id.take()
            && let Some(window) = web_sys::window()
        {
            let _ = window.cancel_animation_frame(id);
        }
    }

    fn dispose(mut self) {
        self.driver.shutdown();
        self.cancel_frame();
        self.listeners.clear();
        self.audio.close();
        self.labels.remove();
        self.renderer.ctx.canvas.remove();
        // GPU resources go with `self`.
    }
}

fn document() -> Option<Document> {
    web_sys::window().and_then(|w| w.document())
}

fn device_pixel_ratio() -> f32 {
    web_sys::window().map_or(1.0, |w| w.device_pixel_ratio() as f32)
}

fn with_engine<R>(f: impl FnOnce(&mut Engine) -> R) -> Option<R> {
    STATE.with(|s| {
        let Ok(mut guard) = s.try_borrow_mut() else {
            log::warn!("Engine busy, dropping reentrant call");
            return None;
        };
        guard.as_mut().map(f)
    })
}

fn request_frame() -> Option<i32> {
    let window = web_sys::window()?;
    FRAME.with(|f| {
        let mut slot = f.borrow_mut();
        let closure = slot.get_or_insert_with(|| {
            Closure::wrap(Box::new(|_: f64| on_animation_frame()) as Box<dyn FnMut(f64)>)
        });
        window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .map_err(|e| log::error!("requestAnimationFrame failed: {:?}", e))
            .ok()
    })
}

fn on_animation_frame() {
    let Some((report, callbacks)) = with_engine(|engine| {
        engine.raf_id = None;
        (engine.frame(), engine.callbacks.clone())
    }) else {
        return;
    };

    callbacks.deliver(&report);

    // Callbacks may have stopped or disposed the engine.
    with_engine(|engine| {
        if engine.driver.is_running() && engine.raf_id.is_none() {
            engine.raf_id = request_frame();
        }
    });
}

fn key_from_code(code: &str) -> Option<KeyCode> {
    match code {
        "KeyW" => Some(KeyCode::KeyW),
        "KeyA" => Some(KeyCode::KeyA),
        "KeyS" => Some(KeyCode::KeyS),
        "KeyD" => Some(KeyCode::KeyD),
        "Space" => Some(KeyCode::Space),
        "Escape" => Some(KeyCode::Escape),
        _ => None,
    }
}

/// Touch position relative to the container plus the stick pad center.
fn touch_frame(container: &HtmlElement) -> (Vec2, f32, Vec2) {
    let rect = container.get_bounding_client_rect();
    let origin = Vec2::new(rect.left() as f32, rect.top() as f32);
    let width = rect.width() as f32;
    let pad = Vec2::new(JOYSTICK_PAD_LEFT, rect.height() as f32 - JOYSTICK_PAD_BOTTOM);
    (origin, width, pad)
}

fn for_each_changed_touch(event: &Event, mut f: impl FnMut(i32, Vec2)) {
    let Some(touch_event) = event.dyn_ref::<TouchEvent>() else {
        return;
    };
    let touches = touch_event.changed_touches();
    for i in 0..touches.length() {
        if let Some(touch) = touches.get(i) {
            f(
                touch.identifier(),
                Vec2::new(touch.client_x() as f32, touch.client_y() as f32),
            );
        }
    }
}

fn install_listeners(window: &Window, doc: &Document, container: &HtmlElement) -> Result<Vec<Listener>, EngineError> {
    let mut listeners = Vec::new();

    listeners.push(Listener::attach(doc, "keydown", |event| {
        let Some(key) = event.dyn_ref::<KeyboardEvent>().and_then(|e| key_from_code(&e.code())) else {
            return;
        };
        with_engine(|engine| engine.driver.handle_key_press(key));
    })?);

    listeners.push(Listener::attach(doc, "keyup", |event| {
        let Some(key) = event.dyn_ref::<KeyboardEvent>().and_then(|e| key_from_code(&e.code())) else {
            return;
        };
        with_engine(|engine| engine.driver.handle_key_release(key));
    })?);

    listeners.push(Listener::attach(doc, "mousemove", |event| {
        let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
            return;
        };
        let (dx, dy) = (mouse.movement_x() as f32, mouse.movement_y() as f32);
        with_engine(|engine| engine.driver.game.handle_mouse_move(dx, dy));
    })?);

    listeners.push(Listener::attach(doc, "pointerlockchange", |_| {
        let locked = document().is_some_and(|d| d.pointer_lock_element().is_some());
        with_engine(|engine| engine.driver.game.set_pointer_captured(locked));
    })?);

    let touch_root = container.clone();
    listeners.push(Listener::attach(container, "touchstart", move |event| {
        event.prevent_default();
        let (origin, width, pad) = touch_frame(&touch_root);
        for_each_changed_touch(&event, |id, point| {
            with_engine(|engine| engine.driver.game.touch_start(id, point - origin, width, pad));
        });
    })?);

    let touch_root = container.clone();
    listeners.push(Listener::attach(container, "touchmove", move |event| {
        event.prevent_default();
        let (origin, _, _) = touch_frame(&touch_root);
        for_each_changed_touch(&event, |id, point| {
            with_engine(|engine| engine.driver.game.touch_move(id, point - origin));
        });
    })?);

    for kind in ["touchend", "touchcancel"] {
        listeners.push(Listener::attach(container, kind, |event| {
            for_each_changed_touch(&event, |id, _| {
                with_engine(|engine| engine.driver.game.touch_end(id));
            });
        })?);
    }

    listeners.push(Listener::attach(window, "resize", |_| {
        with_engine(Engine::apply_quality);
    })?);

    Ok(listeners)
}

/// Handle held by the host page. All state lives in the page's engine slot,
/// so calls after `dispose` are no-ops.
#[wasm_bindgen]
pub struct ObbyEngine {
    _private: (),
}

#[wasm_bindgen]
impl ObbyEngine {
    /// Build the engine inside `container`. The position callback receives
    /// `({x, y, z}, rotation)` roughly every 100 ms while running.
    pub async fn create(
        container: HtmlElement,
        user_id: String,
        username: String,
        on_pause: Function,
        on_win: Function,
        on_position: Function,
    ) -> Result<ObbyEngine, JsValue> {
        if let Some(previous) = STATE.with(|s| s.borrow_mut().take()) {
            log::warn!("Replacing an engine that was never disposed");
            previous.dispose();
        }

        let callbacks = HostCallbacks {
            on_pause,
            on_win,
            on_position,
        };
        let engine = build_engine(container, user_id, username, callbacks)
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        STATE.with(|s| *s.borrow_mut() = Some(engine));
        Ok(ObbyEngine { _private: () })
    }

    /// Unknown ids fall back to the default course.
    pub fn load_level(&self, level_id: &str) {
        let kind = LevelKind::from_id(level_id);
        with_engine(|engine| engine.driver.game.load_level(kind));
    }

    pub fn set_appearance(&self, skin: String, shirt: String, pants: String) {
        let appearance = Appearance { skin, shirt, pants };
        with_engine(|engine| engine.driver.game.set_appearance(&appearance));
    }

    pub fn update_settings(&self, settings: JsValue) -> Result<(), JsValue> {
        let json: String = JSON::stringify(&settings)?.into();
        let settings = GameSettings::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        with_engine(|engine| {
            engine.driver.game.settings = settings;
            engine.audio.set_volume(settings.gain());
            engine.apply_quality();
        });
        Ok(())
    }

    /// Presence snapshot, keyed by player id or as an array of records.
    pub fn update_remote_players(&self, players: JsValue) {
        let json: String = match JSON::stringify(&players) {
            Ok(json) => json.into(),
            Err(_) => {
                log::warn!("Presence snapshot is not serializable");
                return;
            }
        };
        let players = parse_players(&json);
        with_engine(|engine| engine.driver.game.update_remote_players(players));
    }

    pub fn set_controls_active(&self, active: bool) {
        with_engine(|engine| engine.driver.game.set_controls_active(active));
    }

    pub fn set_joystick(&self, x: f32, y: f32) {
        with_engine(|engine| engine.driver.game.set_joystick(x, y));
    }

    pub fn move_camera(&self, dx: f32, dy: f32) {
        with_engine(|engine| engine.driver.game.move_camera(dx, dy));
    }

    pub fn jump(&self) {
        with_engine(|engine| engine.driver.request_jump());
    }

    pub fn request_pointer_lock(&self) {
        with_engine(|engine| engine.container.request_pointer_lock());
    }

    pub fn start(&self) {
        with_engine(|engine| {
            if engine.driver.start().is_none() {
                return;
            }
            if engine.raf_id.is_none() {
                engine.last_frame = None;
                engine.raf_id = request_frame();
            }
        });
    }

    pub fn stop(&self) {
        with_engine(|engine| {
            engine.driver.stop();
            engine.cancel_frame();
        });
    }

    /// Tear everything down. Safe to call more than once.
    pub fn dispose(&self) {
        if let Some(engine) = STATE.with(|s| s.borrow_mut().take()) {
            engine.dispose();
        }
    }
}

async fn build_engine(
    container: HtmlElement,
    user_id: String,
    username: String,
    callbacks: HostCallbacks,
) -> Result<Engine, EngineError> {
    let window = web_sys::window().ok_or_else(|| EngineError::Dom("no window".into()))?;
    let doc = window
        .document()
        .ok_or_else(|| EngineError::Dom("no document".into()))?;

    if container.style().get_property_value("position").unwrap_or_default().is_empty() {
        let _ = container.style().set_property("position", "relative");
    }

    let canvas = doc
        .create_element("canvas")
        .ok()
        .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        .ok_or_else(|| EngineError::Dom("cannot create canvas".into()))?;
    canvas
        .style()
        .set_css_text("width: 100%; height: 100%; display: block; touch-action: none;");
    container
        .append_child(&canvas)
        .map_err(|_| EngineError::Dom("cannot attach canvas".into()))?;

    let game = GameState::new(user_id, username);
    let quality = game.settings.render_quality(window.device_pixel_ratio() as f32);
    let (css_w, css_h) = (
        container.client_width().max(1) as f64,
        container.client_height().max(1) as f64,
    );
    canvas.set_width((css_w * quality.pixel_ratio as f64).round() as u32);
    canvas.set_height((css_h * quality.pixel_ratio as f64).round() as u32);

    let renderer = match Renderer::new(canvas.clone(), quality).await {
        Ok(renderer) => renderer,
        Err(e) => {
            canvas.remove();
            return Err(e);
        }
    };
    let labels = match LabelLayer::new(&doc, &container) {
        Ok(labels) => labels,
        Err(e) => {
            canvas.remove();
            return Err(e);
        }
    };
    let listeners = match install_listeners(&window, &doc, &container) {
        Ok(listeners) => listeners,
        Err(e) => {
            labels.remove();
            canvas.remove();
            return Err(e);
        }
    };
    let audio = Audio::new(game.settings.gain());

    log::info!("Engine ready");
    Ok(Engine {
        driver: FrameDriver::new(game),
        renderer,
        audio,
        labels,
        callbacks: Rc::new(callbacks),
        container,
        listeners,
        started: Instant::now(),
        last_frame: None,
        raf_id: None,
    })
}
