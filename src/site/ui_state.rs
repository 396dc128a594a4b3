/// ナビゲーション・FAQの開閉など、ページ上の単純なUI状態

use crate::ui::event::SiteEvent;

/// モバイルメニュー
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavState {
    pub menu_open: bool,
}

impl NavState {
    pub fn toggle(&mut self) {
        self.menu_open = !self.menu_open;
    }

    pub fn close(&mut self) {
        self.menu_open = false;
    }
}

/// FAQアコーディオン（同時に開けるのは1項目のみ）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaqState {
    pub open: Option<usize>,
}

impl FaqState {
    /// 開いている項目を押すと閉じ、それ以外は開き直す
    pub fn toggle(&mut self, index: usize) {
        self.open = if self.open == Some(index) { None } else { Some(index) };
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.open == Some(index)
    }
}

/// イベント適用の結果としてホストが行うこと
#[derive(Debug, Clone, PartialEq)]
pub enum UiEffect {
    /// 指定セクションへスムーズスクロール
    ScrollTo(String),
    /// 連絡先ディープリンクを開く
    OpenContact,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub nav: NavState,
    pub faq: FaqState,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// イベントを適用する。section_exists で存在しないセクションへの移動は無視する
    pub fn apply<F>(&mut self, event: &SiteEvent, section_exists: F) -> Option<UiEffect>
    where
        F: Fn(&str) -> bool,
    {
        match event {
            SiteEvent::MenuToggled => {
                self.nav.toggle();
                None
            }
            SiteEvent::SectionRequested { id } => {
                if !section_exists(id) {
                    log::debug!("ignored scroll request to unknown section '{}'", id);
                    return None;
                }
                self.nav.close();
                Some(UiEffect::ScrollTo(id.clone()))
            }
            SiteEvent::FaqToggled { index } => {
                self.faq.toggle(*index);
                None
            }
            SiteEvent::ContactOpened => Some(UiEffect::OpenContact),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(id: &str) -> bool {
        matches!(id, "quem-sou" | "sobre" | "faq")
    }

    #[test]
    fn test_faq_toggle_semantics() {
        let mut faq = FaqState::default();
        faq.toggle(1);
        assert!(faq.is_open(1));
        faq.toggle(2);
        assert_eq!(faq.open, Some(2));
        faq.toggle(2);
        assert_eq!(faq.open, None);
    }

    #[test]
    fn test_section_request_closes_menu() {
        let mut ui = UiState::new();
        ui.apply(&SiteEvent::MenuToggled, known);
        assert!(ui.nav.menu_open);

        let effect = ui.apply(&SiteEvent::SectionRequested { id: "sobre".to_string() }, known);
        assert_eq!(effect, Some(UiEffect::ScrollTo("sobre".to_string())));
        assert!(!ui.nav.menu_open);
    }

    #[test]
    fn test_unknown_section_is_ignored() {
        let mut ui = UiState::new();
        ui.apply(&SiteEvent::MenuToggled, known);
        let effect = ui.apply(&SiteEvent::SectionRequested { id: "nowhere".to_string() }, known);
        assert_eq!(effect, None);
        // メニューも開いたまま
        assert!(ui.nav.menu_open);
    }

    #[test]
    fn test_contact_effect() {
        let mut ui = UiState::new();
        assert_eq!(ui.apply(&SiteEvent::ContactOpened, known), Some(UiEffect::OpenContact));
        assert_eq!(ui, UiState::new());
    }
}
