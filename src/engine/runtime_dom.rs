// DOM用のランタイム（WASM環境）
//
// 1. 全ユニットを非表示スタイルで描画してコンテナへ流し込む
// 2. [data-reveal] 要素をアンカーとして DomWatcher に登録する
// 3. IntersectionObserver の通知で表示したユニットのスタイルだけ差し替える
// 4. data-action 付き要素のクリックを SiteEvent として処理する

use super::runtime::SiteRuntime;
use crate::dom_renderer::DomRenderer;
use crate::reveal::IntersectionEntry;
use crate::reveal::dom_watcher::{DomWatcher, EntryHandler};
use crate::site::page::Page;
use crate::site::{SiteConfig, UiEffect};
use crate::ui::viewport::Viewport;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, MouseEvent, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition, window};

struct DomSite {
    runtime: SiteRuntime<DomWatcher>,
    renderer: DomRenderer,
    anchors: Vec<Option<Element>>,
    faq_count: usize,
}

type SharedSite = Rc<RefCell<Option<DomSite>>>;

/// マウント済みのページ。破棄（またはunmount）で全登録を解除する
pub struct DomSession {
    site: SharedSite,
    container: Element,
    click: Closure<dyn FnMut(MouseEvent)>,
}

fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn window_viewport() -> Viewport {
    let Some(window_obj) = window() else {
        return Viewport::default();
    };
    let width = window_obj
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1280.0) as f32;
    let height = window_obj
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0) as f32;
    Viewport::new(width, height)
}

pub fn run_dom(config: SiteConfig, container_id: &str) -> Result<DomSession, String> {
    log::info!("Starting DOM site in #{}...", container_id);

    let site: SharedSite = Rc::new(RefCell::new(None));

    // 交差通知のハンドラ（サイト本体へは弱参照）
    let weak = Rc::downgrade(&site);
    let handler: EntryHandler = Rc::new(move |entries: Vec<IntersectionEntry>| {
        let Some(site) = weak.upgrade() else {
            return;
        };
        let Ok(mut guard) = site.try_borrow_mut() else {
            log::warn!("intersection callback re-entered, dropping {} entries", entries.len());
            return;
        };
        let Some(site) = guard.as_mut() else {
            log::trace!("intersection callback after unmount ignored");
            return;
        };

        site.runtime.set_clock(now_ms());
        for index in site.runtime.dispatch_revealed(&entries) {
            if let Some(anchor) = &site.anchors[index] {
                site.renderer.apply_style(anchor, &site.runtime.style(index, None));
            }
        }
    });

    // 初回描画（全ユニット非表示）
    let page = Page::compose(&config, window_viewport());
    let transition = config.reveal.transition();
    let hidden: Vec<String> = page
        .units
        .iter()
        .map(|u| transition.css(false, u.delay_ms))
        .collect();
    let mut renderer = DomRenderer::with_container(container_id);
    renderer.render_page(&config, &page, &Default::default(), &hidden);
    renderer.mount()?;

    let anchors: Vec<Option<Element>> = (0..page.units.len()).map(|i| renderer.anchor(i)).collect();
    let missing = anchors.iter().filter(|a| a.is_none()).count();
    if missing > 0 {
        log::warn!("{} reveal anchors were not found in the DOM", missing);
    }

    let faq_count = config.faq_items().len();
    let runtime = SiteRuntime::mount(config, page, DomWatcher::new(handler), |index, _| anchors[index].clone())?;
    *site.borrow_mut() = Some(DomSite {
        runtime,
        renderer,
        anchors,
        faq_count,
    });

    // クリックは data-action 属性で振り分ける
    let container = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(container_id))
        .ok_or_else(|| format!("container #{} not found", container_id))?;

    let site_clone = Rc::clone(&site);
    let click = Closure::wrap(Box::new(move |event: MouseEvent| {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        let Some(action) = target
            .closest("[data-action]")
            .ok()
            .flatten()
            .and_then(|el| el.get_attribute("data-action"))
        else {
            return;
        };
        // 連絡先リンクはブラウザの既定動作（新しいタブ）に任せる
        if action != "contact" {
            event.prevent_default();
        }
        handle_action(&site_clone, &action);
    }) as Box<dyn FnMut(MouseEvent)>);
    container
        .add_event_listener_with_callback("click", click.as_ref().unchecked_ref())
        .map_err(|e| format!("failed to register click listener: {:?}", e))?;

    log::info!("DOM site mounted");
    Ok(DomSession { site, container, click })
}

fn handle_action(site: &SharedSite, action: &str) {
    let Ok(mut guard) = site.try_borrow_mut() else {
        return;
    };
    let Some(site) = guard.as_mut() else {
        return;
    };

    if !site.runtime.push_action(action) {
        return;
    }
    let effects = site.runtime.process_events();
    site.renderer.sync_ui(site.runtime.ui(), site.faq_count);

    for effect in effects {
        match effect {
            UiEffect::ScrollTo(id) => scroll_to_section(&id),
            UiEffect::OpenContact => {
                log::info!("contact link opened: {}", site.runtime.config().contact.url);
            }
        }
    }
}

fn scroll_to_section(id: &str) {
    let Some(section) = window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
    else {
        log::debug!("section #{} not in the DOM", id);
        return;
    };
    let options = ScrollIntoViewOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    options.set_block(ScrollLogicalPosition::Start);
    section.scroll_into_view_with_scroll_into_view_options(&options);
}

impl DomSession {
    /// 全コントローラをアンマウントしてObserverを切断する（冪等）
    pub fn unmount(&mut self) {
        let taken = self.site.borrow_mut().take();
        if let Some(mut site) = taken {
            site.runtime.unmount_all();
            let _ = self
                .container
                .remove_event_listener_with_callback("click", self.click.as_ref().unchecked_ref());
            // ここでDomWatcherがdropされObserverも切断される
        }
    }

    pub fn revealed_count(&self) -> usize {
        self.site
            .borrow()
            .as_ref()
            .map_or(0, |site| site.runtime.revealed_count())
    }
}

impl Drop for DomSession {
    fn drop(&mut self) {
        self.unmount();
    }
}
