use glam::{Mat4, Vec3};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

use crate::error::EngineError;

const LABEL_STYLE: &str = "position: absolute; left: 0; top: 0; pointer-events: none; \
    white-space: nowrap; color: white; font-weight: bold; \
    font-family: 'Segoe UI', Arial, sans-serif; \
    text-shadow: -2px -2px 0 #000, 2px -2px 0 #000, -2px 2px 0 #000, 2px 2px 0 #000;";

/// World height of a name tag, used to size the text with distance.
const LABEL_WORLD_HEIGHT: f32 = 1.0;

/// Floating name tags drawn as DOM elements over the canvas. Always on top.
pub struct LabelLayer {
    document: Document,
    root: HtmlElement,
    pool: Vec<HtmlElement>,
}

fn set_visible(el: &HtmlElement, visible: bool) {
    let _ = el
        .style()
        .set_property("display", if visible { "block" } else { "none" });
}

impl LabelLayer {
    pub fn new(document: &Document, container: &HtmlElement) -> Result<Self, EngineError> {
        let root = create_div(document)?;
        root.style()
            .set_css_text("position: absolute; inset: 0; overflow: hidden; pointer-events: none;");
        container
            .append_child(&root)
            .map_err(|_| EngineError::Dom("cannot attach label layer".into()))?;
        Ok(Self {
            document: document.clone(),
            root,
            pool: Vec::new(),
        })
    }

    /// Position one tag per `(text, anchor)`; unused tags are hidden.
    pub fn update(&mut self, labels: &[(&str, Vec3)], view_proj: Mat4, fov_y: f32, width: f32, height: f32) {
        while self.pool.len() < labels.len() {
            let Ok(el) = create_div(&self.document) else {
                log::warn!("Failed to create name label");
                return;
            };
            el.style().set_css_text(LABEL_STYLE);
            if self.root.append_child(&el).is_err() {
                return;
            }
            self.pool.push(el);
        }

        let focal = height / (2.0 * (fov_y / 2.0).tan());
        for (i, el) in self.pool.iter().enumerate() {
            let Some(&(text, anchor)) = labels.get(i) else {
                set_visible(el, false);
                continue;
            };
            let clip = view_proj * anchor.extend(1.0);
            if clip.w <= 0.0 {
                set_visible(el, false);
                continue;
            }
            let ndc = clip.truncate() / clip.w;
            let x = (ndc.x * 0.5 + 0.5) * width;
            let y = (0.5 - ndc.y * 0.5) * height;
            let font = (focal * LABEL_WORLD_HEIGHT / clip.w * 0.6).clamp(8.0, 48.0);

            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
            let style = el.style();
            let _ = style.set_property(
                "transform",
                &format!("translate({x:.1}px, {y:.1}px) translate(-50%, -50%)"),
            );
            let _ = style.set_property("font-size", &format!("{font:.1}px"));
            set_visible(el, true);
        }
    }

    pub fn remove(&self) {
        self.root.remove();
    }
}

fn create_div(document: &Document) -> Result<HtmlElement, EngineError> {
    document
        .create_element("div")
        .ok()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .ok_or_else(|| EngineError::Dom("cannot create element".into()))
}
