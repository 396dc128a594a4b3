// ========================================
// スクロールシミュレーション用ウォッチャー
// ========================================
//
// ネイティブ環境でのプレビューとテスト用。
// 登録された全アンカー（ドキュメント座標のRect）を1つのウォッチャーで多重化し、
// スクロール位置が評価されたときだけ同期的に交差通知を生成する。
// IntersectionObserverと同様に、登録直後の最初の評価では必ず通知を出し、
// 以後はしきい値判定が変化したときだけ通知する。

use super::geometry::{intersection_sample, Rect};
use super::watcher::{IntersectionEntry, IntersectionWatcher, ObserveOptions, Subscription};
use crate::ui::viewport::Viewport;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Registration {
    anchor: Rect,
    options: ObserveOptions,
    /// 前回の判定結果（未評価ならNone）
    last: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ScrollWatcher {
    viewport: Viewport,
    registrations: BTreeMap<Subscription, Registration>,
    next_id: u64,
    total_registered: usize,
}

impl ScrollWatcher {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            registrations: BTreeMap::new(),
            next_id: 0,
            total_registered: 0,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// これまでに発行した登録の総数
    pub fn total_registered(&self) -> usize {
        self.total_registered
    }

    /// スクロールして交差判定を行い、変化のあった通知を返す
    pub fn scroll_to(&mut self, y: f32) -> Vec<IntersectionEntry> {
        self.viewport = self.viewport.scrolled_to(y);
        self.evaluate()
    }

    pub fn resize(&mut self, width: f32, height: f32) -> Vec<IntersectionEntry> {
        self.viewport.size = [width, height];
        self.evaluate()
    }

    /// 現在のビューポートで全登録を評価する（Subscription順で配送）
    pub fn evaluate(&mut self) -> Vec<IntersectionEntry> {
        let viewport = self.viewport;
        let mut entries = Vec::new();

        for (subscription, registration) in self.registrations.iter_mut() {
            let root = viewport.root(&registration.options.root_margin);
            let sample = intersection_sample(&registration.anchor, &root);
            let qualifies = registration.options.qualifies(sample.ratio, sample.touching);

            if registration.last != Some(qualifies) {
                registration.last = Some(qualifies);
                entries.push(IntersectionEntry::new(*subscription, qualifies, sample.ratio));
            }
        }

        if !entries.is_empty() {
            log::trace!(
                "scroll {:.0}px: {} intersection change(s)",
                viewport.scroll_offset[1],
                entries.len()
            );
        }
        entries
    }
}

impl IntersectionWatcher for ScrollWatcher {
    type Anchor = Rect;

    fn register(&mut self, anchor: &Rect, options: &ObserveOptions) -> Option<Subscription> {
        self.next_id += 1;
        self.total_registered += 1;
        let subscription = Subscription(self.next_id);
        self.registrations.insert(
            subscription,
            Registration {
                anchor: *anchor,
                options: *options,
                last: None,
            },
        );
        Some(subscription)
    }

    fn deregister(&mut self, subscription: Subscription) {
        self.registrations.remove(&subscription);
    }

    fn is_registered(&self, subscription: Subscription) -> bool {
        self.registrations.contains_key(&subscription)
    }

    fn active_registrations(&self) -> usize {
        self.registrations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reveal::controller::RevealController;
    use crate::reveal::watcher::RootMargin;

    fn dispatch(
        controller: &mut RevealController,
        entries: &[IntersectionEntry],
        now_ms: f64,
        watcher: &mut ScrollWatcher,
    ) -> usize {
        entries
            .iter()
            .filter(|entry| controller.on_intersect(entry, now_ms, watcher))
            .count()
    }

    #[test]
    fn test_initial_evaluation_reports_every_registration() {
        let mut watcher = ScrollWatcher::new(Viewport::new(1000.0, 800.0));
        let options = ObserveOptions::default();
        watcher.register(&Rect::new(0.0, 100.0, 500.0, 200.0), &options);
        watcher.register(&Rect::new(0.0, 3000.0, 500.0, 200.0), &options);

        let entries = watcher.evaluate();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_intersecting);
        assert!(!entries[1].is_intersecting);

        // 変化が無ければ通知は出ない
        assert!(watcher.evaluate().is_empty());
    }

    #[test]
    fn test_scroll_until_fifteen_percent_reveals_once() {
        // 高さ800のビューポート、下端50px縮めたルートの下端は scroll + 750
        let mut watcher = ScrollWatcher::new(Viewport::new(1000.0, 800.0));
        let anchor = Rect::new(0.0, 2000.0, 1000.0, 400.0);
        let mut controller =
            RevealController::mount(0, Some(&anchor), &ObserveOptions::default(), &mut watcher);

        let mut transitions = 0;
        transitions += dispatch(&mut controller, &watcher.evaluate(), 0.0, &mut watcher);
        assert_eq!(transitions, 0);

        // 5% だけ入った位置ではまだ発火しない
        let entries = watcher.scroll_to(2000.0 - 750.0 + 20.0);
        transitions += dispatch(&mut controller, &entries, 1.0, &mut watcher);
        assert_eq!(transitions, 0);
        assert!(!controller.is_visible());

        // 15% (60px) 入ったところで発火
        let entries = watcher.scroll_to(2000.0 - 750.0 + 60.0);
        transitions += dispatch(&mut controller, &entries, 2.0, &mut watcher);
        assert_eq!(transitions, 1);
        assert!(controller.is_visible());
        assert_eq!(watcher.active_registrations(), 0);

        // 完全に見える位置を越えてスクロールしても追加の遷移は無い
        for y in [1500.0, 1800.0, 2100.0, 2600.0, 1000.0, 2200.0] {
            let entries = watcher.scroll_to(y);
            transitions += dispatch(&mut controller, &entries, 3.0, &mut watcher);
        }
        assert_eq!(transitions, 1);
        assert_eq!(controller.revealed_at(), Some(2.0));
    }

    #[test]
    fn test_unmount_before_visible_leaves_no_subscription() {
        let mut watcher = ScrollWatcher::new(Viewport::new(1000.0, 800.0));
        let anchor = Rect::new(0.0, 5000.0, 1000.0, 300.0);
        let mut controller =
            RevealController::mount(0, Some(&anchor), &ObserveOptions::default(), &mut watcher);
        assert_eq!(watcher.active_registrations(), 1);

        let _ = watcher.evaluate();
        controller.unmount(&mut watcher);
        assert_eq!(watcher.active_registrations(), 0);

        // アンマウント後にスクロールしても何も届かない
        assert!(watcher.scroll_to(4800.0).is_empty());
        assert!(!controller.is_visible());
    }

    #[test]
    fn test_stale_entry_after_deregistration_is_noop() {
        let mut watcher = ScrollWatcher::new(Viewport::new(1000.0, 800.0));
        let anchor = Rect::new(0.0, 0.0, 1000.0, 300.0);
        let mut controller =
            RevealController::mount(0, Some(&anchor), &ObserveOptions::default(), &mut watcher);

        let entries = watcher.evaluate();
        // 同じ通知を二重に配送しても遷移は1回
        let doubled: Vec<_> = entries.iter().chain(entries.iter()).copied().collect();
        assert_eq!(dispatch(&mut controller, &doubled, 0.0, &mut watcher), 1);
    }

    #[test]
    fn test_zero_margin_triggers_later_than_negative_margin() {
        let anchor = Rect::new(0.0, 1000.0, 1000.0, 100.0);
        let default_options = ObserveOptions::default();
        let flush_options = ObserveOptions::new(0.1, RootMargin::zero());

        let mut watcher = ScrollWatcher::new(Viewport::new(1000.0, 800.0));
        let with_margin = watcher.register(&anchor, &default_options).unwrap();
        let flush = watcher.register(&anchor, &flush_options).unwrap();
        let _ = watcher.evaluate();

        // 要素の20pxが文字通りのビューポート内（10%超）だが、縮めたルートには入っていない
        let entries = watcher.scroll_to(1000.0 - 800.0 + 20.0);
        assert!(entries.iter().any(|e| e.subscription == flush && e.is_intersecting));
        assert!(!entries.iter().any(|e| e.subscription == with_margin));
    }
}
