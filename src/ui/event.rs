#[derive(Debug, Clone, PartialEq)]
pub enum SiteEvent {
    /// モバイルメニューの開閉ボタン
    MenuToggled,
    /// ナビゲーションやボタンからのセクション移動要求
    SectionRequested { id: String },
    /// FAQの質問をクリック
    FaqToggled { index: usize },
    /// 連絡先リンクのクリック
    ContactOpened,
}

use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct EventQueue {
    pub queue: VecDeque<SiteEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { queue: VecDeque::new() }
    }
    pub fn push(&mut self, event: SiteEvent) {
        self.queue.push_back(event);
    }
    pub fn pop(&mut self) -> Option<SiteEvent> {
        self.queue.pop_front()
    }
    pub fn drain(&mut self) -> Vec<SiteEvent> {
        self.queue.drain(..).collect()
    }
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl SiteEvent {
    /// DOMの data-action 属性値から復元（"menu" / "section:faq" / "faq:2" / "contact"）
    pub fn from_action(action: &str) -> Option<Self> {
        match action.split_once(':') {
            None if action == "menu" => Some(SiteEvent::MenuToggled),
            None if action == "contact" => Some(SiteEvent::ContactOpened),
            Some(("section", id)) if !id.is_empty() => Some(SiteEvent::SectionRequested { id: id.to_string() }),
            Some(("faq", index)) => index.parse().ok().map(|index| SiteEvent::FaqToggled { index }),
            _ => None,
        }
    }

    /// from_action の逆変換
    pub fn action(&self) -> String {
        match self {
            SiteEvent::MenuToggled => "menu".to_string(),
            SiteEvent::SectionRequested { id } => format!("section:{}", id),
            SiteEvent::FaqToggled { index } => format!("faq:{}", index),
            SiteEvent::ContactOpened => "contact".to_string(),
        }
    }
}
