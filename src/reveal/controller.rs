// ========================================
// Reveal Controller
// ========================================
//
// コンテンツブロック1つにつき1インスタンス。
// アンカーがビューポートに入った最初の瞬間に一度だけ表示状態へ移行し、
// 以後その判断を保持する。
//
//   mount(anchor)           交差通知
//   ─────────▶ Observing ──────────────▶ Revealed
//   mount(None) ─▶ Inert
//   どの状態からも unmount ─▶ Unmounted
//
// 表示へ移行した同じ処理ステップの中で登録を解除するので、
// ウォッチャーが解除前に複数の通知を送ってきても再発火しない。

use super::watcher::{IntersectionEntry, IntersectionWatcher, ObserveOptions, Subscription};

/// コントローラの内部状態
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevealPhase {
    /// アンカーが無く観測できない（永久に非表示）
    Inert,
    /// ウォッチャーに登録済みで交差待ち
    Observing(Subscription),
    /// 表示済み（at_ms は表示判定が下った時刻）
    Revealed { at_ms: f64 },
    /// アンマウント済み。以後の通知はすべて無視
    Unmounted { revealed_at: Option<f64> },
}

/// レンダラーが参照する表示状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Hidden,
    Revealed,
}

#[derive(Debug, Clone)]
pub struct RevealController {
    delay_ms: u32,
    phase: RevealPhase,
}

impl RevealController {
    /// マウント時にアンカーをウォッチャーへ登録する
    ///
    /// アンカーが無い場合や登録に失敗した場合はエラーにせず、
    /// 「表示されないブロック」として扱う。
    pub fn mount<W: IntersectionWatcher>(
        delay_ms: u32,
        anchor: Option<&W::Anchor>,
        options: &ObserveOptions,
        watcher: &mut W,
    ) -> Self {
        let phase = match anchor.and_then(|a| watcher.register(a, options)) {
            Some(subscription) => {
                log::trace!("reveal mounted: {} (delay {}ms)", subscription, delay_ms);
                RevealPhase::Observing(subscription)
            }
            None => {
                log::debug!("reveal mounted without anchor, staying hidden");
                RevealPhase::Inert
            }
        };

        Self { delay_ms, phase }
    }

    /// ウォッチャーからの通知を処理する
    ///
    /// 表示状態へ移行した場合のみtrueを返す。
    pub fn on_intersect<W: IntersectionWatcher>(
        &mut self,
        entry: &IntersectionEntry,
        now_ms: f64,
        watcher: &mut W,
    ) -> bool {
        let subscription = match self.phase {
            RevealPhase::Observing(subscription) => subscription,
            _ => {
                log::trace!("ignored {} for settled reveal", entry.subscription);
                return false;
            }
        };

        if entry.subscription != subscription || !entry.is_intersecting {
            return false;
        }

        // 同じステップ内で解除してから状態を確定する
        watcher.deregister(subscription);
        self.phase = RevealPhase::Revealed { at_ms: now_ms };
        log::debug!(
            "revealed {} at {:.0}ms (ratio {:.2}, delay {}ms)",
            subscription,
            now_ms,
            entry.ratio,
            self.delay_ms
        );
        true
    }

    /// アンマウント。未表示でも登録が残っていれば必ず解除する（冪等）
    pub fn unmount<W: IntersectionWatcher>(&mut self, watcher: &mut W) {
        let revealed_at = match self.phase {
            RevealPhase::Observing(subscription) => {
                watcher.deregister(subscription);
                None
            }
            RevealPhase::Revealed { at_ms } => Some(at_ms),
            RevealPhase::Inert => None,
            RevealPhase::Unmounted { .. } => return,
        };
        self.phase = RevealPhase::Unmounted { revealed_at };
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn is_visible(&self) -> bool {
        self.revealed_at().is_some()
    }

    /// ウォッチャーに登録中か
    pub fn is_observed(&self) -> bool {
        matches!(self.phase, RevealPhase::Observing(_))
    }

    pub fn is_unmounted(&self) -> bool {
        matches!(self.phase, RevealPhase::Unmounted { .. })
    }

    pub fn subscription(&self) -> Option<Subscription> {
        match self.phase {
            RevealPhase::Observing(subscription) => Some(subscription),
            _ => None,
        }
    }

    pub fn revealed_at(&self) -> Option<f64> {
        match self.phase {
            RevealPhase::Revealed { at_ms } => Some(at_ms),
            RevealPhase::Unmounted { revealed_at } => revealed_at,
            _ => None,
        }
    }

    /// 視覚的なトランジションが始まる時刻（表示時刻 + 遅延）
    pub fn transition_start_ms(&self) -> Option<f64> {
        self.revealed_at().map(|at| at + self.delay_ms as f64)
    }

    pub fn presentation(&self) -> Presentation {
        if self.is_visible() {
            Presentation::Revealed
        } else {
            Presentation::Hidden
        }
    }
}
