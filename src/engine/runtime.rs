// ========================================
// サイトランタイム
// ========================================
//
// 構成済みページの各ユニットに RevealController を1つずつマウントし、
// ウォッチャーからの通知を Subscription → ユニット番号 の表で配送する。
// ネイティブでは ScrollWatcher でスクロールを再現してスナップショットを書き出し、
// WASMでは runtime_dom が DomWatcher と組み合わせて使う。

use crate::dom_renderer::DomRenderer;
use crate::reveal::{
    IntersectionEntry, IntersectionWatcher, RevealController, RevealTransition, ScrollWatcher, Subscription,
};
use crate::site::page::{NAV_HEIGHT, Page, RevealUnit};
use crate::site::{SiteConfig, UiEffect, UiState};
use crate::ui::event::{EventQueue, SiteEvent};
use crate::ui::viewport::Viewport;
use std::collections::HashMap;

/// スクロール1ステップあたりに進める時間
pub const SCROLL_FRAME_MS: f64 = 16.0;
pub const DEFAULT_SCROLL_STEP: f32 = 100.0;
/// scroll_through 1回あたりの最大フレーム数
pub const MAX_SCROLL_STEPS: usize = 10_000;

pub struct SiteRuntime<W: IntersectionWatcher> {
    config: SiteConfig,
    page: Page,
    watcher: W,
    controllers: Vec<RevealController>,
    routes: HashMap<Subscription, usize>,
    transition: RevealTransition,
    ui: UiState,
    event_queue: EventQueue,
    clock_ms: f64,
}

impl<W: IntersectionWatcher> SiteRuntime<W> {
    /// 全ユニットをマウントする。anchor_for が None を返したユニットは非表示のまま
    pub fn mount<F>(config: SiteConfig, page: Page, mut watcher: W, anchor_for: F) -> Result<Self, String>
    where
        F: Fn(usize, &RevealUnit) -> Option<W::Anchor>,
    {
        let options = config.reveal.observe_options()?;
        let transition = config.reveal.transition();

        let mut controllers = Vec::with_capacity(page.units.len());
        let mut routes = HashMap::new();
        for (index, unit) in page.units.iter().enumerate() {
            let anchor = anchor_for(index, unit);
            let controller = RevealController::mount(unit.delay_ms, anchor.as_ref(), &options, &mut watcher);
            if let Some(subscription) = controller.subscription() {
                routes.insert(subscription, index);
            }
            controllers.push(controller);
        }

        log::info!(
            "mounted {} reveal units ({} observed, threshold {}, rootMargin {})",
            controllers.len(),
            routes.len(),
            options.threshold,
            options.root_margin
        );

        Ok(Self {
            config,
            page,
            watcher,
            controllers,
            routes,
            transition,
            ui: UiState::new(),
            event_queue: EventQueue::new(),
            clock_ms: 0.0,
        })
    }

    /// 通知を各コントローラへ配送し、新たに表示したユニット数を返す
    pub fn dispatch(&mut self, entries: &[IntersectionEntry]) -> usize {
        self.dispatch_revealed(entries).len()
    }

    /// 通知を配送し、新たに表示したユニット番号を返す
    pub fn dispatch_revealed(&mut self, entries: &[IntersectionEntry]) -> Vec<usize> {
        let mut revealed = Vec::new();
        for entry in entries {
            let Some(&index) = self.routes.get(&entry.subscription) else {
                log::trace!("dropped entry for unknown {}", entry.subscription);
                continue;
            };
            if self.controllers[index].on_intersect(entry, self.clock_ms, &mut self.watcher) {
                self.routes.remove(&entry.subscription);
                revealed.push(index);
            }
        }
        revealed
    }

    /// 全コントローラをアンマウントする（冪等）
    pub fn unmount_all(&mut self) {
        for controller in &mut self.controllers {
            controller.unmount(&mut self.watcher);
        }
        self.routes.clear();
        log::info!(
            "unmounted {} reveal units, {} registrations left",
            self.controllers.len(),
            self.watcher.active_registrations()
        );
    }

    /// data-action 属性値をイベントキューへ積む
    pub fn push_action(&mut self, action: &str) -> bool {
        match SiteEvent::from_action(action) {
            Some(event) => {
                self.event_queue.push(event);
                true
            }
            None => {
                log::warn!("unknown action '{}'", action);
                false
            }
        }
    }

    /// キューのイベントをUI状態へ適用し、ホスト側で行う効果を返す
    pub fn process_events(&mut self) -> Vec<UiEffect> {
        let page = &self.page;
        let mut effects = Vec::new();
        for event in self.event_queue.drain() {
            log::debug!("event: {:?}", event);
            if let Some(effect) = self.ui.apply(&event, |id| page.section_offset(id).is_some()) {
                effects.push(effect);
            }
        }
        effects
    }

    /// ユニットごとのインラインスタイル
    /// sample_at を指定するとその時刻の見た目、省略時はCSSトランジションを出力する
    pub fn styles(&self, sample_at: Option<f64>) -> Vec<String> {
        (0..self.controllers.len()).map(|i| self.style(i, sample_at)).collect()
    }

    pub fn style(&self, index: usize, sample_at: Option<f64>) -> String {
        let controller = &self.controllers[index];
        match sample_at {
            Some(now) => {
                let elapsed = controller.revealed_at().map_or(0.0, |at| now - at);
                self.transition
                    .sample(controller.is_visible(), controller.delay_ms(), elapsed)
                    .css()
            }
            None => self.transition.css(controller.is_visible(), controller.delay_ms()),
        }
    }

    pub fn render(&self, renderer: &mut DomRenderer, sample_at: Option<f64>) {
        let styles = self.styles(sample_at);
        renderer.render_page(&self.config, &self.page, &self.ui, &styles);
    }

    pub fn set_clock(&mut self, now_ms: f64) {
        self.clock_ms = now_ms;
    }

    pub fn now_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn controllers(&self) -> &[RevealController] {
        &self.controllers
    }

    pub fn revealed_count(&self) -> usize {
        self.controllers.iter().filter(|c| c.is_visible()).count()
    }

    pub fn active_registrations(&self) -> usize {
        self.watcher.active_registrations()
    }

    pub fn report(&self) -> SnapshotReport {
        SnapshotReport {
            units: self.controllers.len(),
            revealed: self.revealed_count(),
            active_registrations: self.active_registrations(),
            content_height: self.page.content_height,
        }
    }
}

impl SiteRuntime<ScrollWatcher> {
    /// ScrollWatcher上にページを構成してマウントし、初回評価まで行う
    pub fn preview(config: SiteConfig, viewport: Viewport) -> Result<Self, String> {
        let page = Page::compose(&config, viewport);
        let watcher = ScrollWatcher::new(viewport);
        let mut runtime = Self::mount(config, page, watcher, |_, unit| Some(unit.rect))?;
        let entries = runtime.watcher.evaluate();
        runtime.dispatch(&entries);
        Ok(runtime)
    }

    pub fn scroll_offset(&self) -> f32 {
        self.watcher.viewport().scroll_offset[1]
    }

    /// 1フレーム分時間を進めてスクロールする
    pub fn scroll_to(&mut self, y: f32) -> usize {
        let y = y.clamp(0.0, self.page.max_scroll());
        self.clock_ms += SCROLL_FRAME_MS;
        let entries = self.watcher.scroll_to(y);
        self.dispatch(&entries)
    }

    /// step 以下の等間隔で target までスクロールする（最後は必ず target ちょうど）
    ///
    /// フレーム数は MAX_SCROLL_STEPS で打ち切り、超える場合は間隔を広げる。
    pub fn scroll_through(&mut self, target: f32, step: f32) -> usize {
        let target = target.clamp(0.0, self.page.max_scroll());
        let step = if step > 0.0 { step } else { DEFAULT_SCROLL_STEP };
        let start = self.scroll_offset();
        let distance = target - start;
        // 位置を加算で進めるとf32の丸めで止まるので、毎回 start から補間する
        let frames = ((distance.abs() / step).ceil() as usize).min(MAX_SCROLL_STEPS);
        let mut revealed = 0;

        for i in 1..frames {
            let position = start + distance * (i as f32 / frames as f32);
            revealed += self.scroll_to(position);
        }
        revealed += self.scroll_to(target);
        revealed
    }

    /// 効果を適用する（セクション移動は画面上部のナビ分を空けてスクロール）
    pub fn apply_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            match effect {
                UiEffect::ScrollTo(id) => {
                    if let Some(top) = self.page.section_offset(&id) {
                        let revealed = self.scroll_through(top - NAV_HEIGHT, DEFAULT_SCROLL_STEP);
                        log::debug!("scrolled to #{} ({} revealed on the way)", id, revealed);
                    }
                }
                UiEffect::OpenContact => {
                    log::info!("open contact link: {}", self.config.contact.url);
                }
            }
        }
    }
}

/// スナップショット実行の条件
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotOptions {
    pub viewport: Viewport,
    pub scroll: f32,
    pub step: f32,
    /// 最後のスクロールからの経過時間。None ならCSSトランジションを出力
    pub at_ms: Option<f64>,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            scroll: 0.0,
            step: DEFAULT_SCROLL_STEP,
            at_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotReport {
    pub units: usize,
    pub revealed: usize,
    pub active_registrations: usize,
    pub content_height: f32,
}

/// スクロールを再現してHTMLスナップショットを書き出す
#[cfg(not(target_arch = "wasm32"))]
pub fn run_snapshot(config: &SiteConfig, options: &SnapshotOptions, out: &str) -> Result<SnapshotReport, String> {
    let mut runtime = SiteRuntime::preview(config.clone(), options.viewport)?;
    runtime.scroll_through(options.scroll, options.step);

    let sample_at = options.at_ms.map(|ms| runtime.now_ms() + ms);
    let mut renderer = DomRenderer::new();
    runtime.render(&mut renderer, sample_at);
    renderer
        .save_to_file(out)
        .map_err(|e| format!("Failed to write {}: {}", out, e))?;

    let report = runtime.report();
    runtime.unmount_all();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn preview() -> SiteRuntime<ScrollWatcher> {
        SiteRuntime::preview(SiteConfig::embedded().unwrap(), Viewport::default()).unwrap()
    }

    fn revealed_keys(runtime: &SiteRuntime<ScrollWatcher>) -> Vec<String> {
        runtime
            .controllers()
            .iter()
            .zip(&runtime.page().units)
            .filter(|(c, _)| c.is_visible())
            .map(|(_, u)| u.key.clone())
            .collect()
    }

    #[test]
    fn test_only_above_the_fold_reveals_at_top() {
        let runtime = preview();
        assert_eq!(
            revealed_keys(&runtime),
            vec!["section-0/hero/0".to_string(), "section-0/portrait/0".to_string()]
        );
        assert_eq!(runtime.active_registrations(), runtime.page().units.len() - 2);
    }

    #[test]
    fn test_scrolling_to_bottom_reveals_everything() {
        let mut runtime = preview();
        let bottom = runtime.page().max_scroll();
        let revealed = runtime.scroll_through(bottom, DEFAULT_SCROLL_STEP);

        assert_eq!(revealed, runtime.page().units.len() - 2);
        assert_eq!(runtime.revealed_count(), runtime.page().units.len());
        assert_eq!(runtime.active_registrations(), 0);

        // 戻っても表示状態は変わらない
        assert_eq!(runtime.scroll_through(0.0, 250.0), 0);
        assert_eq!(runtime.revealed_count(), runtime.page().units.len());
    }

    #[test]
    fn test_scroll_through_frames_per_step() {
        let mut runtime = preview();
        assert_eq!(runtime.scroll_offset(), 0.0);
        let before = runtime.now_ms();

        runtime.scroll_through(10.0, 0.5);
        assert_eq!(runtime.scroll_offset(), 10.0);
        assert_eq!(runtime.now_ms() - before, 20.0 * SCROLL_FRAME_MS);
    }

    #[test]
    fn test_tiny_step_is_capped_and_finishes() {
        let mut runtime = preview();
        let bottom = runtime.page().max_scroll();
        let before = runtime.now_ms();

        // f32 の刻み幅より小さい step でも終わる
        runtime.scroll_through(bottom, 0.0001);
        assert_eq!(runtime.scroll_offset(), bottom);
        assert_eq!(runtime.now_ms() - before, MAX_SCROLL_STEPS as f64 * SCROLL_FRAME_MS);
        assert_eq!(runtime.revealed_count(), runtime.page().units.len());

        // 同じ位置なら1フレームだけ
        let before = runtime.now_ms();
        runtime.scroll_through(bottom, 0.0001);
        assert_eq!(runtime.now_ms() - before, SCROLL_FRAME_MS);
    }

    #[test]
    fn test_unmount_all_releases_registrations() {
        let mut runtime = preview();
        runtime.unmount_all();
        assert_eq!(runtime.active_registrations(), 0);
        assert!(runtime.controllers().iter().all(|c| c.is_unmounted()));

        // アンマウント後の通知は無視される
        let bottom = runtime.page().max_scroll();
        assert_eq!(runtime.scroll_through(bottom, DEFAULT_SCROLL_STEP), 0);
        assert_eq!(runtime.revealed_count(), 2);

        runtime.unmount_all();
        assert_eq!(runtime.active_registrations(), 0);
    }

    #[test]
    fn test_nav_action_scrolls_and_reveals_target() {
        let mut runtime = preview();
        assert!(runtime.push_action("menu"));
        assert!(runtime.push_action("section:faq"));
        assert!(!runtime.push_action("teleport"));

        let effects = runtime.process_events();
        assert_eq!(effects, vec![UiEffect::ScrollTo("faq".to_string())]);
        assert!(!runtime.ui().nav.menu_open);

        runtime.apply_effects(effects);
        let faq_section = runtime
            .page()
            .sections
            .iter()
            .position(|s| s.id.as_deref() == Some("faq"))
            .unwrap();
        let all_faq_revealed = runtime
            .page()
            .units_in_section(faq_section)
            .all(|(i, _)| runtime.controllers()[i].is_visible());
        assert!(all_faq_revealed);
    }

    #[test]
    fn test_sampled_styles_follow_delays() {
        let runtime = preview();
        let styles = runtime.styles(Some(runtime.now_ms() + 200.0));

        let hero = runtime.page().units.iter().position(|u| u.key == "section-0/hero/0").unwrap();
        let portrait = runtime.page().units.iter().position(|u| u.key == "section-0/portrait/0").unwrap();
        // 遅延200msのポートレートはまだ動き出していない
        assert_eq!(styles[portrait], "opacity: 0; transform: translateY(48px);");
        assert_ne!(styles[hero], styles[portrait]);
        // 未表示ユニットは隠れた見た目
        assert_eq!(styles[portrait + 1], "opacity: 0; transform: translateY(48px);");

        let css = runtime.styles(None);
        assert!(css[hero].starts_with("opacity: 1;"));
        assert!(css[portrait].contains("transition-delay: 200ms;"));
    }

    #[test]
    fn test_run_snapshot_writes_html() {
        let path = std::env::temp_dir().join("luna_site_runtime_test.html");
        let out = path.to_string_lossy().to_string();
        let options = SnapshotOptions {
            scroll: 100_000.0,
            ..Default::default()
        };
        let report = run_snapshot(&SiteConfig::embedded().unwrap(), &options, &out).unwrap();
        assert_eq!(report.revealed, report.units);
        assert_eq!(report.active_registrations, 0);

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("data-reveal=\"25\""));
        let _ = std::fs::remove_file(&path);
    }
}
